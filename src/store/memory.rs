use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::store::{
    BlogSourceRecord, GeneratedContentRecord, RecordStore, StoreError, StyleGuideRecord,
};
use crate::types::SourceIdentity;

#[derive(Default)]
struct Tables {
    style_guides: HashMap<String, StyleGuideRecord>,
    generated_content: Vec<GeneratedContentRecord>,
    blog_sources: HashMap<String, BlogSourceRecord>,
}

/// 进程内记录存储
#[derive(Default)]
pub struct MemoryRecordStore {
    tables: RwLock<Tables>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get_style_guide(
        &self,
        source: &SourceIdentity,
    ) -> Result<Option<StyleGuideRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.style_guides.get(source.as_key()).cloned())
    }

    async fn put_style_guide(&self, record: StyleGuideRecord) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.style_guides.insert(record.domain.clone(), record);
        Ok(())
    }

    async fn append_generated_content(
        &self,
        record: GeneratedContentRecord,
    ) -> Result<(), StoreError> {
        self.tables.write().await.generated_content.push(record);
        Ok(())
    }

    async fn list_generated_content(&self) -> Result<Vec<GeneratedContentRecord>, StoreError> {
        Ok(self.tables.read().await.generated_content.clone())
    }

    async fn get_blog_source(
        &self,
        source: &SourceIdentity,
    ) -> Result<Option<BlogSourceRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.blog_sources.get(source.as_key()).cloned())
    }

    async fn put_blog_source(&self, record: BlogSourceRecord) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.blog_sources.insert(record.domain.clone(), record);
        Ok(())
    }
}
