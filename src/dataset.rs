//! Dataset 定义
//!
//! 行主序（N x D）的 f32 矩阵，用于输入点集和初始质心。

use crate::api::{KmeansError, Result};

/// 向量数据集
///
/// Points are immutable once built; the engine only ever borrows them.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// 向量数据（扁平存储，行主序）
    vectors: Vec<f32>,
    /// 向量维度
    dim: usize,
    /// 向量数量
    num_vectors: usize,
}

impl Dataset {
    /// 从 N x D 行主序数组创建数据集
    pub fn from_vectors(vectors: Vec<f32>, dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(KmeansError::InvalidArg("dimension must be > 0".into()));
        }
        if vectors.len() % dim != 0 {
            return Err(KmeansError::InvalidArg(format!(
                "data length {} is not a multiple of dim {}",
                vectors.len(),
                dim
            )));
        }
        let num_vectors = vectors.len() / dim;
        Ok(Self {
            vectors,
            dim,
            num_vectors,
        })
    }

    /// 从 D x N 数组创建（每列一个向量）
    pub fn from_columns(data: &[f32], dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(KmeansError::InvalidArg("dimension must be > 0".into()));
        }
        if data.len() % dim != 0 {
            return Err(KmeansError::InvalidArg(format!(
                "data length {} is not a multiple of dim {}",
                data.len(),
                dim
            )));
        }
        let n = data.len() / dim;
        let mut vectors = vec![0.0f32; data.len()];
        for j in 0..dim {
            for i in 0..n {
                vectors[i * dim + j] = data[j * n + i];
            }
        }
        Self::from_vectors(vectors, dim)
    }

    /// 转换为 D x N（每列一个向量）
    pub fn to_columns(&self) -> Vec<f32> {
        let n = self.num_vectors;
        let mut out = vec![0.0f32; self.vectors.len()];
        for i in 0..n {
            for j in 0..self.dim {
                out[j * n + i] = self.vectors[i * self.dim + j];
            }
        }
        out
    }

    /// 检查所有值为有限数
    pub fn check_finite(&self, what: &'static str) -> Result<()> {
        match self.vectors.iter().position(|v| !v.is_finite()) {
            Some(index) => Err(KmeansError::NonFinite { what, index }),
            None => Ok(()),
        }
    }

    pub fn num_vectors(&self) -> usize {
        self.num_vectors
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn vectors(&self) -> &[f32] {
        &self.vectors
    }

    pub fn into_vectors(self) -> Vec<f32> {
        self.vectors
    }

    /// 获取第 i 个向量
    #[inline]
    pub fn vector(&self, i: usize) -> &[f32] {
        &self.vectors[i * self.dim..(i + 1) * self.dim]
    }

    pub fn get_vector(&self, i: usize) -> Option<&[f32]> {
        if i < self.num_vectors {
            Some(self.vector(i))
        } else {
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        self.num_vectors == 0
    }
}
