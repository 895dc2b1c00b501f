use std::sync::Arc;

use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

use crate::config::RateLimitConfig;
use crate::utils::throttle::WindowThrottle;

/// 所有流水线共享的推理调用限流器
///
/// 同时限制在途调用数与每分钟调用总数；达到上限时排队等待。
#[derive(Clone)]
pub struct RateLimiter {
    permits: Arc<Semaphore>,
    window: WindowThrottle,
    max_concurrent: usize,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        let max_concurrent = config.max_concurrent.max(1);
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent)),
            window: WindowThrottle::per_minute(config.requests_per_minute),
            max_concurrent,
        }
    }

    /// 获取一次调用的许可，许可在释放前占用一个并发名额
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, AcquireError> {
        let permit = self.permits.clone().acquire_owned().await?;
        self.window.acquire().await;
        Ok(permit)
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}
