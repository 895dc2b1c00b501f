use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 缓存性能监控器
#[derive(Clone)]
pub struct CachePerformanceMonitor {
    backend: &'static str,
    metrics: Arc<CacheMetrics>,
}

/// 缓存指标
#[derive(Default)]
pub struct CacheMetrics {
    /// 缓存命中次数
    pub cache_hits: AtomicUsize,
    /// 缓存未命中次数
    pub cache_misses: AtomicUsize,
    /// 缓存写入次数
    pub cache_writes: AtomicUsize,
    /// 缓存错误次数
    pub cache_errors: AtomicUsize,
}

/// 缓存性能报告
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachePerformanceReport {
    pub backend: String,
    /// 缓存命中率
    pub hit_rate: f64,
    /// 总查询次数
    pub total_lookups: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub cache_writes: usize,
    pub cache_errors: usize,
}

impl CachePerformanceMonitor {
    pub fn new(backend: &'static str) -> Self {
        Self {
            backend,
            metrics: Arc::new(CacheMetrics::default()),
        }
    }

    /// 记录缓存命中
    pub fn record_cache_hit(&self, key: &str) {
        self.metrics.cache_hits.fetch_add(1, Ordering::Relaxed);
        tracing::info!("   💰 风格缓存命中 [{}] - 跳过风格分析", key);
    }

    /// 记录缓存未命中
    pub fn record_cache_miss(&self, key: &str) {
        self.metrics.cache_misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("   ⌛ 风格缓存未命中 [{}]", key);
    }

    /// 记录缓存写入
    pub fn record_cache_write(&self, key: &str) {
        self.metrics.cache_writes.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("   💾 风格缓存写入 [{}]", key);
    }

    /// 记录缓存错误
    pub fn record_cache_error(&self, key: &str, error: &str) {
        self.metrics.cache_errors.fetch_add(1, Ordering::Relaxed);
        tracing::warn!("   ❌ 风格缓存错误 [{}]: {}", key, error);
    }

    /// 生成性能报告
    pub fn generate_report(&self) -> CachePerformanceReport {
        let hits = self.metrics.cache_hits.load(Ordering::Relaxed);
        let misses = self.metrics.cache_misses.load(Ordering::Relaxed);
        let writes = self.metrics.cache_writes.load(Ordering::Relaxed);
        let errors = self.metrics.cache_errors.load(Ordering::Relaxed);
        let total_lookups = hits + misses;

        let hit_rate = if total_lookups > 0 {
            hits as f64 / total_lookups as f64
        } else {
            0.0
        };

        CachePerformanceReport {
            backend: self.backend.to_string(),
            hit_rate,
            total_lookups,
            cache_hits: hits,
            cache_misses: misses,
            cache_writes: writes,
            cache_errors: errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_hit_rate() {
        let monitor = CachePerformanceMonitor::new("memory");
        let clone = monitor.clone();
        monitor.record_cache_hit("a.test");
        monitor.record_cache_hit("a.test");
        clone.record_cache_miss("b.test");
        monitor.record_cache_miss("c.test");
        monitor.record_cache_write("b.test");
        monitor.record_cache_error("d.test", "disk full");

        let report = monitor.generate_report();
        assert_eq!(report.backend, "memory");
        assert_eq!(report.total_lookups, 4);
        assert_eq!(report.cache_hits, 2);
        assert_eq!(report.cache_writes, 1);
        assert_eq!(report.cache_errors, 1);
        assert!((report.hit_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_report() {
        let report = CachePerformanceMonitor::new("file").generate_report();
        assert_eq!(report.hit_rate, 0.0);
        assert_eq!(report.total_lookups, 0);
    }
}
