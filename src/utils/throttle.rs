use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// 滑动窗口节流器
///
/// 在任意一个`window`长度的时间段内最多放行`max_requests`次；额度用尽时排队等待而不是报错。
/// `max_requests`为0表示不限制。克隆后共享同一窗口。
#[derive(Clone)]
pub struct WindowThrottle {
    max_requests: usize,
    window: Duration,
    stamps: Arc<Mutex<VecDeque<Instant>>>,
}

impl WindowThrottle {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            stamps: Arc::new(Mutex::new(VecDeque::with_capacity(max_requests))),
        }
    }

    /// 每分钟上限
    pub fn per_minute(max_requests: usize) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }

    pub fn is_unlimited(&self) -> bool {
        self.max_requests == 0
    }

    /// 占用一个额度，必要时等待窗口滑动
    pub async fn acquire(&self) {
        if self.is_unlimited() {
            return;
        }

        loop {
            let wait = {
                let mut stamps = self.stamps.lock().await;
                let now = Instant::now();
                while let Some(oldest) = stamps.front() {
                    if now.duration_since(*oldest) >= self.window {
                        stamps.pop_front();
                    } else {
                        break;
                    }
                }

                if stamps.len() < self.max_requests {
                    stamps.push_back(now);
                    return;
                }

                match stamps.front() {
                    Some(oldest) => (*oldest + self.window).saturating_duration_since(now),
                    None => Duration::ZERO,
                }
            };

            tracing::debug!("⏳ 已达到速率上限，等待 {:?} 后重试", wait);
            tokio::time::sleep(wait).await;
        }
    }

    /// 当前窗口内已占用的额度
    pub async fn in_window(&self) -> usize {
        let stamps = self.stamps.lock().await;
        let now = Instant::now();
        stamps
            .iter()
            .filter(|stamp| now.duration_since(**stamp) < self.window)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unlimited_never_waits() {
        let throttle = WindowThrottle::per_minute(0);
        for _ in 0..1000 {
            throttle.acquire().await;
        }
        assert_eq!(throttle.in_window().await, 0);
    }

    #[tokio::test]
    async fn test_queues_when_window_is_full() {
        let throttle = WindowThrottle::new(2, Duration::from_millis(150));
        let started = Instant::now();

        throttle.acquire().await;
        throttle.acquire().await;
        assert!(started.elapsed() < Duration::from_millis(100));

        throttle.acquire().await;
        assert!(started.elapsed() >= Duration::from_millis(140));
    }

    #[tokio::test]
    async fn test_clones_share_window() {
        let throttle = WindowThrottle::new(3, Duration::from_secs(60));
        let clone = throttle.clone();
        throttle.acquire().await;
        clone.acquire().await;
        assert_eq!(throttle.in_window().await, 2);
    }
}
