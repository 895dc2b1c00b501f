//! LLM客户端 - 基于rig的推理能力实现

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::config::LLMConfig;
use crate::llm::capability::{CapabilityError, CapabilityRequest, ReasoningCapability};

mod providers;
pub mod utils;

use providers::ProviderClient;
use utils::{classify_provider_error, extract_json, model_for_tier};

/// LLM客户端 - 提供统一的LLM服务接口
#[derive(Clone)]
pub struct LLMClient {
    config: LLMConfig,
    client: ProviderClient,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: &LLMConfig) -> Result<Self> {
        let client = ProviderClient::new(config)?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// 检查模型连接和功能是否正常
    pub async fn check_connection(&self) -> Result<()> {
        println!("🔄 正在检查模型连接...");
        let agent = self.client.create_agent(
            &self.config.model_efficient,
            "You are a helpful assistant.",
            &self.config,
        );
        match agent.prompt("Hello").await {
            Ok(_) => {
                println!("✅ 模型连接正常");
                Ok(())
            }
            Err(e) => {
                eprintln!("❌ 模型连接失败: {}", e);
                Err(e.into())
            }
        }
    }

    fn system_prompt_with_schema(request: &CapabilityRequest) -> String {
        let schema = serde_json::to_string_pretty(&request.output_schema)
            .unwrap_or_else(|_| request.output_schema.to_string());
        format!(
            "{}\n\nRespond with a single JSON object only, no prose and no markdown fences. \
             The object must conform to this JSON Schema:\n{}",
            request.system_prompt, schema
        )
    }
}

#[async_trait]
impl ReasoningCapability for LLMClient {
    async fn reason(&self, request: &CapabilityRequest) -> Result<Value, CapabilityError> {
        let model = model_for_tier(&self.config, request.tier);
        let system_prompt = Self::system_prompt_with_schema(request);
        let agent = self
            .client
            .create_agent(model, &system_prompt, &self.config);

        let raw = agent
            .prompt(&request.user_prompt)
            .await
            .map_err(|e| classify_provider_error(&e.to_string()))?;

        extract_json(&raw)
    }
}
