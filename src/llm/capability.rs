//! 推理能力抽象：给定提示词与输出结构，返回结构化结果或失败信号

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::generator::stages::StageKind;
use crate::types::ModelTier;

/// 一次推理请求
#[derive(Debug, Clone)]
pub struct CapabilityRequest {
    pub stage: StageKind,
    pub tier: ModelTier,
    pub system_prompt: String,
    pub user_prompt: String,
    /// 期望输出的JSON Schema
    pub output_schema: Value,
}

/// 推理服务返回的失败信号
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CapabilityError {
    #[error("rate limited by reasoning service")]
    RateLimited { retry_after: Option<Duration> },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("rejected by content policy: {0}")]
    PolicyRejected(String),
    #[error("reasoning call timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed output: {0}")]
    MalformedOutput(String),
}

/// 外部推理能力，流水线的每个阶段都通过它完成
#[async_trait]
pub trait ReasoningCapability: Send + Sync {
    async fn reason(&self, request: &CapabilityRequest) -> Result<Value, CapabilityError>;
}
