//! 记录存储：Style_Guides、Generated_Content、Blog_Sources 三张逻辑表的读写契约

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::RecordStoreConfig;
use crate::types::SourceIdentity;

pub mod json_file;
pub mod memory;
pub mod records;
pub mod throttled;

pub use json_file::JsonFileRecordStore;
pub use memory::MemoryRecordStore;
pub use records::{
    BlogSourceRecord, ContentStatus, GeneratedContentRecord, StyleGuideRecord,
};
pub use throttled::ThrottledRecordStore;

/// 记录存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store is unavailable: {0}")]
    Unavailable(String),
    #[error("record store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("record store data is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// 记录存储接口，只提供简单的get/put/append，不暴露查询逻辑
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get_style_guide(
        &self,
        source: &SourceIdentity,
    ) -> Result<Option<StyleGuideRecord>, StoreError>;

    /// 按域名覆盖写入
    async fn put_style_guide(&self, record: StyleGuideRecord) -> Result<(), StoreError>;

    /// 只追加
    async fn append_generated_content(
        &self,
        record: GeneratedContentRecord,
    ) -> Result<(), StoreError>;

    async fn list_generated_content(&self) -> Result<Vec<GeneratedContentRecord>, StoreError>;

    async fn get_blog_source(
        &self,
        source: &SourceIdentity,
    ) -> Result<Option<BlogSourceRecord>, StoreError>;

    /// 按域名覆盖写入
    async fn put_blog_source(&self, record: BlogSourceRecord) -> Result<(), StoreError>;
}

/// 按配置创建带节流的本地记录存储，未启用时返回None
pub fn build_record_store(config: &RecordStoreConfig) -> Option<Arc<dyn RecordStore>> {
    if !config.enabled {
        return None;
    }
    let store = JsonFileRecordStore::new(config.path.clone());
    Some(Arc::new(ThrottledRecordStore::new(
        store,
        config.requests_per_minute,
    )))
}
