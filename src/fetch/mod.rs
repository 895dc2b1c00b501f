//! 参考站点内容抓取，为风格分析提供样本正文

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Url, redirect::Policy};
use thiserror::Error;

use crate::config::FetchConfig;
use crate::types::SourceIdentity;
use crate::utils::text::{strip_html, truncate_at_char_boundary};

pub mod guard;

pub use guard::UrlGuard;

/// 抓取错误
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FetchError {
    /// 目标地址不安全，属于输入错误
    #[error("destination rejected: {0}")]
    Rejected(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
}

/// 参考内容抓取器
#[async_trait]
pub trait ReferenceFetcher: Send + Sync {
    /// 返回参考站点首页的纯文本样本
    async fn fetch(&self, source: &SourceIdentity) -> Result<String, FetchError>;
}

/// 基于reqwest的抓取实现，不跟随重定向
pub struct HttpReferenceFetcher {
    client: reqwest::Client,
    guard: UrlGuard,
    max_bytes: usize,
}

impl HttpReferenceFetcher {
    pub fn new(config: &FetchConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("blogsmith/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            guard: UrlGuard::new(config.allow_private_hosts),
            max_bytes: config.max_bytes,
        })
    }
}

#[async_trait]
impl ReferenceFetcher for HttpReferenceFetcher {
    async fn fetch(&self, source: &SourceIdentity) -> Result<String, FetchError> {
        let url = Url::parse(source.url()).map_err(|e| FetchError::Rejected(e.to_string()))?;
        self.guard.check_resolved(&url).await?;

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?
        {
            body.extend_from_slice(&chunk);
            if body.len() >= self.max_bytes {
                break;
            }
        }

        let markup = String::from_utf8_lossy(&body);
        let markup = truncate_at_char_boundary(&markup, self.max_bytes);
        Ok(strip_html(markup))
    }
}
