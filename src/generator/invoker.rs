//! 统一的阶段调用器：限流、超时、重试与输出结构校验

use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::InvokerConfig;
use crate::generator::stages::{StageInput, StagePayload};
use crate::llm::capability::{CapabilityError, CapabilityRequest, ReasoningCapability};
use crate::llm::limiter::RateLimiter;
use crate::types::ModelTier;

/// 失败类型
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    RateLimited,
    Network,
    MalformedOutput,
    SchemaInvalid,
    InputRejected,
    PolicyRejected,
    Cancelled,
}

/// 错误分类
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Transient,
    SchemaInvalid,
    InputRejected,
    DependencyUnavailable,
    Cancelled,
}

impl FailureKind {
    /// 是否值得带退避地重试
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FailureKind::Timeout
                | FailureKind::RateLimited
                | FailureKind::Network
                | FailureKind::MalformedOutput
        )
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            FailureKind::Timeout
            | FailureKind::RateLimited
            | FailureKind::Network
            | FailureKind::MalformedOutput => ErrorCategory::Transient,
            FailureKind::SchemaInvalid => ErrorCategory::SchemaInvalid,
            FailureKind::InputRejected | FailureKind::PolicyRejected => {
                ErrorCategory::InputRejected
            }
            FailureKind::Cancelled => ErrorCategory::Cancelled,
        }
    }
}

impl Display for FailureKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FailureKind::Timeout => "timeout",
            FailureKind::RateLimited => "rate_limited",
            FailureKind::Network => "network",
            FailureKind::MalformedOutput => "malformed_output",
            FailureKind::SchemaInvalid => "schema_invalid",
            FailureKind::InputRejected => "input_rejected",
            FailureKind::PolicyRejected => "policy_rejected",
            FailureKind::Cancelled => "cancelled",
        };
        write!(f, "{}", name)
    }
}

impl From<&CapabilityError> for FailureKind {
    fn from(error: &CapabilityError) -> Self {
        match error {
            CapabilityError::RateLimited { .. } => FailureKind::RateLimited,
            CapabilityError::InvalidInput(_) => FailureKind::InputRejected,
            CapabilityError::PolicyRejected(_) => FailureKind::PolicyRejected,
            CapabilityError::Timeout => FailureKind::Timeout,
            CapabilityError::Network(_) => FailureKind::Network,
            CapabilityError::MalformedOutput(_) => FailureKind::MalformedOutput,
        }
    }
}

/// 单次阶段调用的结果
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutput {
    Success(StagePayload),
    Failure { kind: FailureKind, detail: String },
}

impl StageOutput {
    pub fn failure(kind: FailureKind, detail: impl Into<String>) -> Self {
        StageOutput::Failure {
            kind,
            detail: detail.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StageOutput::Success(_))
    }
}

/// 单次尝试的结果：成功、可重试失败（附带最少等待时间）或终止
enum Attempt {
    Done(StagePayload),
    Retry {
        kind: FailureKind,
        detail: String,
        wait_at_least: Option<Duration>,
    },
    SchemaMismatch(String),
    Fatal {
        kind: FailureKind,
        detail: String,
    },
}

/// 阶段调用器，与具体阶段无关
#[derive(Clone)]
pub struct AgentInvoker {
    capability: Arc<dyn ReasoningCapability>,
    limiter: RateLimiter,
    config: InvokerConfig,
}

impl AgentInvoker {
    pub fn new(
        capability: Arc<dyn ReasoningCapability>,
        limiter: RateLimiter,
        config: InvokerConfig,
    ) -> Self {
        Self {
            capability,
            limiter,
            config,
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// 调用一个阶段，瞬时错误带退避重试，结构不合法时额外重试`schema_retries`次
    pub async fn invoke(&self, input: &StageInput, tier: ModelTier) -> StageOutput {
        let kind = input.kind();
        let request = CapabilityRequest {
            stage: kind,
            tier,
            system_prompt: input.system_prompt(),
            user_prompt: input.user_prompt(),
            output_schema: kind.output_schema(),
        };

        let max_attempts = self.config.max_attempts.max(1);
        let mut transient_failures = 0u32;
        let mut schema_failures = 0u32;

        loop {
            match self.attempt(&request).await {
                Attempt::Done(payload) => return StageOutput::Success(payload),
                Attempt::Fatal { kind: failure, detail } => {
                    tracing::warn!("❌ 阶段 [{}] 不可重试的失败 ({}): {}", kind, failure, detail);
                    return StageOutput::failure(failure, detail);
                }
                Attempt::SchemaMismatch(detail) => {
                    schema_failures += 1;
                    if schema_failures > self.config.schema_retries {
                        tracing::warn!("❌ 阶段 [{}] 输出结构仍不合法: {}", kind, detail);
                        return StageOutput::failure(FailureKind::SchemaInvalid, detail);
                    }
                    tracing::warn!(
                        "⚠️ 阶段 [{}] 输出结构不合法，重新请求 ({}/{}): {}",
                        kind,
                        schema_failures,
                        self.config.schema_retries,
                        detail
                    );
                }
                Attempt::Retry {
                    kind: failure,
                    detail,
                    wait_at_least,
                } => {
                    transient_failures += 1;
                    if transient_failures >= max_attempts {
                        tracing::warn!(
                            "❌ 阶段 [{}] 尝试 {} 次均失败 ({}): {}",
                            kind,
                            transient_failures,
                            failure,
                            detail
                        );
                        return StageOutput::failure(failure, detail);
                    }

                    let backoff = self.config.backoff_for(transient_failures);
                    let wait = wait_at_least.map_or(backoff, |min| backoff.max(min));
                    tracing::warn!(
                        "⚠️ 阶段 [{}] 调用失败 ({})，{:?} 后重试 (第 {} / {} 次尝试): {}",
                        kind,
                        failure,
                        wait,
                        transient_failures,
                        max_attempts,
                        detail
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    async fn attempt(&self, request: &CapabilityRequest) -> Attempt {
        // 排队等待限流额度不计入单次调用超时
        let _permit = match self.limiter.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                return Attempt::Fatal {
                    kind: FailureKind::Network,
                    detail: format!("rate limiter closed: {}", e),
                };
            }
        };

        let timeout = self.config.call_timeout();
        let result = match tokio::time::timeout(timeout, self.capability.reason(request)).await {
            Ok(result) => result,
            Err(_) => {
                return Attempt::Retry {
                    kind: FailureKind::Timeout,
                    detail: format!("call exceeded {:?}", timeout),
                    wait_at_least: None,
                };
            }
        };

        match result {
            Ok(value) => match StagePayload::validate(request.stage, value) {
                Ok(payload) => Attempt::Done(payload),
                Err(detail) => Attempt::SchemaMismatch(detail),
            },
            Err(error) => {
                let kind = FailureKind::from(&error);
                let detail = error.to_string();
                if kind.is_transient() {
                    let wait_at_least = match error {
                        CapabilityError::RateLimited { retry_after } => retry_after,
                        _ => None,
                    };
                    Attempt::Retry {
                        kind,
                        detail,
                        wait_at_least,
                    }
                } else {
                    Attempt::Fatal { kind, detail }
                }
            }
        }
    }
}
