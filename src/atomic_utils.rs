//! 原子操作工具
//!
//! Stage workers share these across rayon threads. Relaxed ordering is
//! enough: every stage ends in a rayon join, which publishes all writes
//! before the next stage reads them.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::stats::PruneStats;

/// 原子计数器
#[derive(Debug)]
pub struct AtomicCounter {
    count: AtomicU64,
}

impl AtomicCounter {
    pub fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
        }
    }

    pub fn add(&self, n: u64) {
        if n > 0 {
            self.count.fetch_add(n, Ordering::Relaxed);
        }
    }

    pub fn get(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

impl Default for AtomicCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// 原子标志数组（每个聚类一个）
#[derive(Debug)]
pub struct AtomicFlags {
    flags: Vec<AtomicBool>,
}

impl AtomicFlags {
    pub fn new(len: usize) -> Self {
        Self {
            flags: (0..len).map(|_| AtomicBool::new(false)).collect(),
        }
    }

    pub fn set(&self, i: usize) {
        self.flags[i].store(true, Ordering::Relaxed);
    }

    pub fn get(&self, i: usize) -> bool {
        self.flags[i].load(Ordering::Relaxed)
    }

    pub fn clear_all(&self) {
        for f in &self.flags {
            f.store(false, Ordering::Relaxed);
        }
    }

    pub fn count_set(&self) -> usize {
        self.flags
            .iter()
            .filter(|f| f.load(Ordering::Relaxed))
            .count()
    }

    pub fn to_vec(&self) -> Vec<bool> {
        self.flags.iter().map(|f| f.load(Ordering::Relaxed)).collect()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

/// 距离计算计数（计算 / 剪枝）
#[derive(Debug, Default)]
pub struct PruneCounters {
    pub computed: AtomicCounter,
    pub pruned: AtomicCounter,
}

impl PruneCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> PruneStats {
        PruneStats {
            distance_computations: self.computed.get(),
            distances_pruned: self.pruned.get(),
        }
    }
}
