//! SIMD 距离计算实现
//!
//! 检测运行时 CPU 并选择最优实现（NEON for ARM, SSE/AVX2 for x86）
//!
//! Dispatch depends only on the CPU, so every caller in a process gets the
//! same kernel and identical inputs give bit-identical distances.

/// CPU 特性检测
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimdLevel {
    Scalar,
    NEON,
    SSE,
    AVX2,
}

/// 获取当前 CPU 支持的最高 SIMD 级别
#[cfg(target_arch = "x86_64")]
pub fn detect_simd_level() -> SimdLevel {
    #[cfg(feature = "simd")]
    {
        if std::is_x86_feature_detected!("avx2") {
            return SimdLevel::AVX2;
        }
        if std::is_x86_feature_detected!("sse2") {
            return SimdLevel::SSE;
        }
    }
    SimdLevel::Scalar
}

#[cfg(target_arch = "aarch64")]
pub fn detect_simd_level() -> SimdLevel {
    #[cfg(feature = "simd")]
    {
        if std::arch::is_aarch64_feature_detected!("neon") {
            return SimdLevel::NEON;
        }
    }
    SimdLevel::Scalar
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
pub fn detect_simd_level() -> SimdLevel {
    SimdLevel::Scalar
}

/// L2 欧氏距离（自动选择最优实现）
#[inline]
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    l2_squared(a, b).sqrt()
}

/// 平方 L2 距离
#[inline]
pub fn l2_squared(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vector dimensions must match");

    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    {
        if std::is_x86_feature_detected!("avx2") {
            // SAFETY: avx2 support checked above
            return unsafe { l2_sq_avx2(a, b) };
        }
        if std::is_x86_feature_detected!("sse2") {
            // SAFETY: sse2 support checked above
            return unsafe { l2_sq_sse(a, b) };
        }
    }
    #[cfg(all(feature = "simd", target_arch = "aarch64"))]
    {
        if std::arch::is_aarch64_feature_detected!("neon") {
            // SAFETY: neon support checked above
            return unsafe { l2_sq_neon(a, b) };
        }
    }
    l2_sq_scalar(a, b)
}

#[inline]
pub fn l2_sq_scalar(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
}

#[inline]
pub fn l2_scalar(a: &[f32], b: &[f32]) -> f32 {
    l2_sq_scalar(a, b).sqrt()
}

/// 平方 L2（SSE2）
#[cfg(all(feature = "simd", target_arch = "x86_64"))]
#[target_feature(enable = "sse2")]
unsafe fn l2_sq_sse(a: &[f32], b: &[f32]) -> f32 {
    use std::arch::x86_64::*;
    let n = a.len().min(b.len());
    let chunks = n / 4;
    let mut sum = _mm_setzero_ps();

    for i in 0..chunks {
        let va = _mm_loadu_ps(a.as_ptr().add(i * 4));
        let vb = _mm_loadu_ps(b.as_ptr().add(i * 4));
        let diff = _mm_sub_ps(va, vb);
        sum = _mm_add_ps(sum, _mm_mul_ps(diff, diff));
    }

    let mut result = hsum_ps(sum);
    for i in (chunks * 4)..n {
        let diff = a[i] - b[i];
        result += diff * diff;
    }
    result
}

/// 平方 L2（AVX2）
#[cfg(all(feature = "simd", target_arch = "x86_64"))]
#[target_feature(enable = "avx2")]
unsafe fn l2_sq_avx2(a: &[f32], b: &[f32]) -> f32 {
    use std::arch::x86_64::*;
    let n = a.len().min(b.len());
    let chunks = n / 8;
    let mut sum = _mm256_setzero_ps();

    for i in 0..chunks {
        let va = _mm256_loadu_ps(a.as_ptr().add(i * 8));
        let vb = _mm256_loadu_ps(b.as_ptr().add(i * 8));
        let diff = _mm256_sub_ps(va, vb);
        sum = _mm256_add_ps(sum, _mm256_mul_ps(diff, diff));
    }

    // fold the two 128-bit halves, then reduce horizontally
    let high = _mm256_extractf128_ps(sum, 1);
    let low = _mm256_castps256_ps128(sum);
    let mut result = hsum_ps(_mm_add_ps(low, high));

    for i in (chunks * 8)..n {
        let diff = a[i] - b[i];
        result += diff * diff;
    }
    result
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
#[target_feature(enable = "sse2")]
unsafe fn hsum_ps(v: std::arch::x86_64::__m128) -> f32 {
    use std::arch::x86_64::*;
    let shuf = _mm_movehl_ps(v, v);
    let sums = _mm_add_ps(v, shuf);
    let shuf = _mm_shuffle_ps(sums, sums, 0x55);
    _mm_cvtss_f32(_mm_add_ss(sums, shuf))
}

/// 平方 L2（NEON）
#[cfg(all(feature = "simd", target_arch = "aarch64"))]
#[target_feature(enable = "neon")]
unsafe fn l2_sq_neon(a: &[f32], b: &[f32]) -> f32 {
    use std::arch::aarch64::*;
    let n = a.len().min(b.len());
    let chunks = n / 4;
    let mut sum = vdupq_n_f32(0.0);

    for i in 0..chunks {
        let va = vld1q_f32(a.as_ptr().add(i * 4));
        let vb = vld1q_f32(b.as_ptr().add(i * 4));
        let diff = vsubq_f32(va, vb);
        sum = vaddq_f32(sum, vmulq_f32(diff, diff));
    }

    let mut result = vaddvq_f32(sum);
    for i in (chunks * 4)..n {
        let diff = a[i] - b[i];
        result += diff * diff;
    }
    result
}
