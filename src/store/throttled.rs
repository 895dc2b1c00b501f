use async_trait::async_trait;

use crate::store::{
    BlogSourceRecord, GeneratedContentRecord, RecordStore, StoreError, StyleGuideRecord,
};
use crate::types::SourceIdentity;
use crate::utils::throttle::WindowThrottle;

/// 为记录存储加上每分钟请求上限，超限时排队
pub struct ThrottledRecordStore<S> {
    inner: S,
    throttle: WindowThrottle,
}

impl<S: RecordStore> ThrottledRecordStore<S> {
    pub fn new(inner: S, requests_per_minute: usize) -> Self {
        Self {
            inner,
            throttle: WindowThrottle::per_minute(requests_per_minute),
        }
    }

    pub fn with_throttle(inner: S, throttle: WindowThrottle) -> Self {
        Self { inner, throttle }
    }
}

#[async_trait]
impl<S: RecordStore> RecordStore for ThrottledRecordStore<S> {
    async fn get_style_guide(
        &self,
        source: &SourceIdentity,
    ) -> Result<Option<StyleGuideRecord>, StoreError> {
        self.throttle.acquire().await;
        self.inner.get_style_guide(source).await
    }

    async fn put_style_guide(&self, record: StyleGuideRecord) -> Result<(), StoreError> {
        self.throttle.acquire().await;
        self.inner.put_style_guide(record).await
    }

    async fn append_generated_content(
        &self,
        record: GeneratedContentRecord,
    ) -> Result<(), StoreError> {
        self.throttle.acquire().await;
        self.inner.append_generated_content(record).await
    }

    async fn list_generated_content(&self) -> Result<Vec<GeneratedContentRecord>, StoreError> {
        self.throttle.acquire().await;
        self.inner.list_generated_content().await
    }

    async fn get_blog_source(
        &self,
        source: &SourceIdentity,
    ) -> Result<Option<BlogSourceRecord>, StoreError> {
        self.throttle.acquire().await;
        self.inner.get_blog_source(source).await
    }

    async fn put_blog_source(&self, record: BlogSourceRecord) -> Result<(), StoreError> {
        self.throttle.acquire().await;
        self.inner.put_blog_source(record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRecordStore;
    use std::time::Duration;
    use tokio::time::Instant;

    #[tokio::test]
    async fn test_calls_queue_beyond_window_limit() {
        let store = ThrottledRecordStore::with_throttle(
            MemoryRecordStore::new(),
            WindowThrottle::new(2, Duration::from_millis(120)),
        );
        let source = SourceIdentity::parse("example-blog.test").unwrap();
        let started = Instant::now();

        for _ in 0..3 {
            assert!(store.get_blog_source(&source).await.unwrap().is_none());
        }

        assert!(started.elapsed() >= Duration::from_millis(110));
    }
}
