//! 风格缓存：参考来源身份 -> 风格画像

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;

use crate::config::{CacheBackend, CacheConfig};
use crate::store::{RecordStore, StyleGuideRecord};
use crate::types::{SourceIdentity, StyleProfile};

pub mod performance_monitor;
pub use performance_monitor::{CachePerformanceMonitor, CachePerformanceReport};

/// 风格缓存接口
///
/// `get`只做查询，从不触发分析；`put`按身份覆盖写入，后写者胜出。
#[async_trait]
pub trait StyleGuideCache: Send + Sync {
    async fn get(&self, source: &SourceIdentity) -> Result<Option<StyleProfile>>;

    async fn put(&self, source: &SourceIdentity, profile: StyleProfile) -> Result<()>;

    fn performance(&self) -> Option<CachePerformanceReport> {
        None
    }
}

/// 进程内缓存
pub struct MemoryStyleGuideCache {
    entries: RwLock<HashMap<String, StyleProfile>>,
    performance_monitor: CachePerformanceMonitor,
}

impl MemoryStyleGuideCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            performance_monitor: CachePerformanceMonitor::new("memory"),
        }
    }
}

impl Default for MemoryStyleGuideCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StyleGuideCache for MemoryStyleGuideCache {
    async fn get(&self, source: &SourceIdentity) -> Result<Option<StyleProfile>> {
        let entries = self.entries.read().await;
        match entries.get(source.as_key()) {
            Some(profile) => {
                self.performance_monitor.record_cache_hit(source.as_key());
                Ok(Some(profile.clone()))
            }
            None => {
                self.performance_monitor.record_cache_miss(source.as_key());
                Ok(None)
            }
        }
    }

    async fn put(&self, source: &SourceIdentity, profile: StyleProfile) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(source.as_key().to_string(), profile);
        self.performance_monitor.record_cache_write(source.as_key());
        Ok(())
    }

    fn performance(&self) -> Option<CachePerformanceReport> {
        Some(self.performance_monitor.generate_report())
    }
}

/// 缓存条目
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: T,
    /// 写入时间（Unix秒）
    pub timestamp: i64,
    /// 来源身份，用于校验哈希文件名没有串号
    pub key: String,
}

/// 文件缓存，每个来源身份一个JSON文件
pub struct FileStyleGuideCache {
    cache_dir: PathBuf,
    performance_monitor: CachePerformanceMonitor,
}

impl FileStyleGuideCache {
    const CATEGORY: &'static str = "style_guides";

    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            performance_monitor: CachePerformanceMonitor::new("file"),
        }
    }

    /// 生成key的MD5哈希
    pub fn hash_key(&self, key: &str) -> String {
        let mut hasher = Md5::new();
        hasher.update(key.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// 获取缓存文件路径
    fn get_cache_path(&self, key: &str) -> PathBuf {
        self.cache_dir
            .join(Self::CATEGORY)
            .join(format!("{}.json", self.hash_key(key)))
    }
}

#[async_trait]
impl StyleGuideCache for FileStyleGuideCache {
    async fn get(&self, source: &SourceIdentity) -> Result<Option<StyleProfile>> {
        let key = source.as_key();
        let cache_path = self.get_cache_path(key);

        if !fs::try_exists(&cache_path).await.unwrap_or(false) {
            self.performance_monitor.record_cache_miss(key);
            return Ok(None);
        }

        let content = match fs::read_to_string(&cache_path).await {
            Ok(content) => content,
            Err(e) => {
                self.performance_monitor
                    .record_cache_error(key, &format!("读取文件失败: {}", e));
                return Err(e.into());
            }
        };

        match serde_json::from_str::<CacheEntry<StyleProfile>>(&content) {
            Ok(entry) if entry.key == key => {
                self.performance_monitor.record_cache_hit(key);
                Ok(Some(entry.data))
            }
            Ok(_) => {
                self.performance_monitor.record_cache_miss(key);
                Ok(None)
            }
            Err(e) => {
                // 损坏的条目按未命中处理，下次分析完成后会被覆盖
                self.performance_monitor
                    .record_cache_error(key, &format!("反序列化失败: {}", e));
                Ok(None)
            }
        }
    }

    async fn put(&self, source: &SourceIdentity, profile: StyleProfile) -> Result<()> {
        let key = source.as_key();
        let cache_path = self.get_cache_path(key);

        // 确保目录存在
        if let Some(parent) = cache_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let entry = CacheEntry {
            timestamp: profile.last_updated.timestamp(),
            data: profile,
            key: key.to_string(),
        };

        match serde_json::to_string_pretty(&entry) {
            Ok(content) => match fs::write(&cache_path, content).await {
                Ok(_) => {
                    self.performance_monitor.record_cache_write(key);
                    Ok(())
                }
                Err(e) => {
                    self.performance_monitor
                        .record_cache_error(key, &format!("写入文件失败: {}", e));
                    Err(e.into())
                }
            },
            Err(e) => {
                self.performance_monitor
                    .record_cache_error(key, &format!("序列化失败: {}", e));
                Err(e.into())
            }
        }
    }

    fn performance(&self) -> Option<CachePerformanceReport> {
        Some(self.performance_monitor.generate_report())
    }
}

/// 以记录存储的Style_Guides表作为缓存
pub struct RecordStoreStyleGuideCache {
    store: Arc<dyn RecordStore>,
    performance_monitor: CachePerformanceMonitor,
}

impl RecordStoreStyleGuideCache {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            performance_monitor: CachePerformanceMonitor::new("record_store"),
        }
    }
}

#[async_trait]
impl StyleGuideCache for RecordStoreStyleGuideCache {
    async fn get(&self, source: &SourceIdentity) -> Result<Option<StyleProfile>> {
        let key = source.as_key();
        let record = match self.store.get_style_guide(source).await {
            Ok(record) => record,
            Err(e) => {
                self.performance_monitor.record_cache_error(key, &e.to_string());
                return Err(e.into());
            }
        };

        match record {
            Some(record) => {
                let profile = StyleProfile::try_from(record)?;
                self.performance_monitor.record_cache_hit(key);
                Ok(Some(profile))
            }
            None => {
                self.performance_monitor.record_cache_miss(key);
                Ok(None)
            }
        }
    }

    async fn put(&self, source: &SourceIdentity, profile: StyleProfile) -> Result<()> {
        let key = source.as_key();
        let mut record = StyleGuideRecord::from(&profile);
        record.domain = key.to_string();
        match self.store.put_style_guide(record).await {
            Ok(()) => {
                self.performance_monitor.record_cache_write(key);
                Ok(())
            }
            Err(e) => {
                self.performance_monitor.record_cache_error(key, &e.to_string());
                Err(e.into())
            }
        }
    }

    fn performance(&self) -> Option<CachePerformanceReport> {
        Some(self.performance_monitor.generate_report())
    }
}

/// 缓存关闭时使用：永远未命中，写入直接丢弃
pub struct DisabledStyleGuideCache;

#[async_trait]
impl StyleGuideCache for DisabledStyleGuideCache {
    async fn get(&self, _source: &SourceIdentity) -> Result<Option<StyleProfile>> {
        Ok(None)
    }

    async fn put(&self, _source: &SourceIdentity, _profile: StyleProfile) -> Result<()> {
        Ok(())
    }
}

/// 按配置创建风格缓存
pub fn build_style_cache(
    config: &CacheConfig,
    record_store: Option<Arc<dyn RecordStore>>,
) -> Result<Arc<dyn StyleGuideCache>> {
    if !config.enabled {
        return Ok(Arc::new(DisabledStyleGuideCache));
    }
    match config.backend {
        CacheBackend::Memory => Ok(Arc::new(MemoryStyleGuideCache::new())),
        CacheBackend::File => Ok(Arc::new(FileStyleGuideCache::new(config.cache_dir.clone()))),
        CacheBackend::RecordStore => {
            let store = record_store.ok_or_else(|| {
                anyhow!("cache backend `record_store` requires the record store to be enabled")
            })?;
            Ok(Arc::new(RecordStoreStyleGuideCache::new(store)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRecordStore;
    use crate::types::AnalysisQuality;
    use chrono::Utc;
    use tempfile::TempDir;

    fn profile(source: &SourceIdentity, tone: &str) -> StyleProfile {
        StyleProfile {
            source_identity: source.clone(),
            tone: tone.to_string(),
            heading_style: "sentence-case H2".to_string(),
            list_style: "numbered steps".to_string(),
            guide_text: "Short paragraphs, concrete examples.".to_string(),
            analysis_quality: AnalysisQuality::High,
            last_updated: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_memory_cache_last_writer_wins() {
        let cache = MemoryStyleGuideCache::new();
        let source = SourceIdentity::parse("example-blog.test").unwrap();

        assert!(cache.get(&source).await.unwrap().is_none());
        cache.put(&source, profile(&source, "formal")).await.unwrap();
        cache.put(&source, profile(&source, "casual")).await.unwrap();

        let cached = cache.get(&source).await.unwrap().unwrap();
        assert_eq!(cached.tone, "casual");

        let report = cache.performance().unwrap();
        assert_eq!(report.cache_hits, 1);
        assert_eq!(report.cache_misses, 1);
        assert_eq!(report.cache_writes, 2);
    }

    #[tokio::test]
    async fn test_file_cache_round_trip_and_equivalent_keys() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileStyleGuideCache::new(temp_dir.path().to_path_buf());
        let bare = SourceIdentity::parse("example-blog.test").unwrap();
        let full = SourceIdentity::parse("https://www.example-blog.test/blog").unwrap();

        cache.put(&bare, profile(&bare, "witty")).await.unwrap();
        let cached = cache.get(&full).await.unwrap().unwrap();
        assert_eq!(cached.tone, "witty");

        let expected = temp_dir
            .path()
            .join("style_guides")
            .join(format!("{}.json", cache.hash_key("example-blog.test")));
        assert!(expected.exists());
    }

    #[tokio::test]
    async fn test_file_cache_treats_corrupt_entry_as_miss() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileStyleGuideCache::new(temp_dir.path().to_path_buf());
        let source = SourceIdentity::parse("example-blog.test").unwrap();

        let path = cache.get_cache_path(source.as_key());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ broken").unwrap();

        assert!(cache.get(&source).await.unwrap().is_none());
        assert_eq!(cache.performance().unwrap().cache_errors, 1);
    }

    #[tokio::test]
    async fn test_record_store_cache_uses_style_guides_table() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let cache = RecordStoreStyleGuideCache::new(store.clone());
        let source = SourceIdentity::parse("https://example-blog.test").unwrap();

        cache.put(&source, profile(&source, "upbeat")).await.unwrap();

        let row = store.get_style_guide(&source).await.unwrap().unwrap();
        assert_eq!(row.domain, "example-blog.test");
        assert_eq!(row.tone, "upbeat");
        assert_eq!(cache.get(&source).await.unwrap().unwrap().tone, "upbeat");
    }

    #[test]
    fn test_record_store_backend_requires_store() {
        let config = CacheConfig {
            backend: CacheBackend::RecordStore,
            ..Default::default()
        };
        assert!(build_style_cache(&config, None).is_err());

        let disabled = CacheConfig {
            enabled: false,
            backend: CacheBackend::RecordStore,
            ..Default::default()
        };
        assert!(build_style_cache(&disabled, None).is_ok());
    }
}
