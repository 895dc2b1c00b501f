use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;

use crate::store::{
    BlogSourceRecord, GeneratedContentRecord, RecordStore, StoreError, StyleGuideRecord,
};
use crate::types::SourceIdentity;

/// 记录文件的整体结构
#[derive(Debug, Default, Serialize, Deserialize)]
struct RecordDocument {
    #[serde(rename = "Style_Guides", default)]
    style_guides: BTreeMap<String, StyleGuideRecord>,
    #[serde(rename = "Generated_Content", default)]
    generated_content: Vec<GeneratedContentRecord>,
    #[serde(rename = "Blog_Sources", default)]
    blog_sources: BTreeMap<String, BlogSourceRecord>,
}

/// 以单个JSON文件保存三张表的记录存储
///
/// 每次操作都完整读写文件，互斥锁保证同一进程内的读改写不交错。
pub struct JsonFileRecordStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileRecordStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<RecordDocument, StoreError> {
        match fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(RecordDocument::default()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(RecordDocument::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, document: &RecordDocument) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let content = serde_json::to_string_pretty(document)?;
        fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for JsonFileRecordStore {
    async fn get_style_guide(
        &self,
        source: &SourceIdentity,
    ) -> Result<Option<StyleGuideRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        let mut document = self.load().await?;
        Ok(document.style_guides.remove(source.as_key()))
    }

    async fn put_style_guide(&self, record: StyleGuideRecord) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut document = self.load().await?;
        document.style_guides.insert(record.domain.clone(), record);
        self.save(&document).await
    }

    async fn append_generated_content(
        &self,
        record: GeneratedContentRecord,
    ) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut document = self.load().await?;
        document.generated_content.push(record);
        self.save(&document).await
    }

    async fn list_generated_content(&self) -> Result<Vec<GeneratedContentRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.generated_content)
    }

    async fn get_blog_source(
        &self,
        source: &SourceIdentity,
    ) -> Result<Option<BlogSourceRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        let mut document = self.load().await?;
        Ok(document.blog_sources.remove(source.as_key()))
    }

    async fn put_blog_source(&self, record: BlogSourceRecord) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut document = self.load().await?;
        document.blog_sources.insert(record.domain.clone(), record);
        self.save(&document).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ContentStatus;
    use crate::types::AnalysisQuality;
    use chrono::Utc;
    use tempfile::TempDir;

    fn style_record(tone: &str) -> StyleGuideRecord {
        StyleGuideRecord {
            domain: "example-blog.test".to_string(),
            last_updated: Utc::now(),
            tone: tone.to_string(),
            heading_style: "H2 questions".to_string(),
            list_style: "bullets".to_string(),
            style_guide_text: "Write plainly.".to_string(),
            analysis_quality: AnalysisQuality::High,
        }
    }

    #[tokio::test]
    async fn test_style_guide_is_overwritten_per_domain() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileRecordStore::new(temp_dir.path().join("nested/records.json"));
        let source = SourceIdentity::parse("https://www.example-blog.test").unwrap();

        assert!(store.get_style_guide(&source).await.unwrap().is_none());

        store.put_style_guide(style_record("formal")).await.unwrap();
        store.put_style_guide(style_record("playful")).await.unwrap();

        let loaded = store.get_style_guide(&source).await.unwrap().unwrap();
        assert_eq!(loaded.tone, "playful");

        let raw = std::fs::read_to_string(temp_dir.path().join("nested/records.json")).unwrap();
        assert!(raw.contains("\"Style_Guides\""));
        assert!(raw.contains("\"Heading_Style\""));
    }

    #[tokio::test]
    async fn test_generated_content_is_append_only() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileRecordStore::new(temp_dir.path().join("records.json"));

        for (idx, status) in [ContentStatus::Completed, ContentStatus::Failed]
            .into_iter()
            .enumerate()
        {
            store
                .append_generated_content(GeneratedContentRecord {
                    id: format!("req-{}", idx),
                    topic: "remote work productivity".to_string(),
                    source_blog: "example-blog.test".to_string(),
                    date_created: Utc::now(),
                    status,
                    final_content: String::new(),
                    seo_score: None,
                    word_count: None,
                    user_notes: String::new(),
                })
                .await
                .unwrap();
        }

        let rows = store.list_generated_content().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "req-0");
        assert_eq!(rows[1].status, ContentStatus::Failed);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = JsonFileRecordStore::new(path);

        let result = store.list_generated_content().await;
        assert!(matches!(result, Err(StoreError::Corrupt(_))));
    }
}
