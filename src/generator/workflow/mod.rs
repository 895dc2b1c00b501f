use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::generator::aggregator::ResultBundle;
use crate::generator::context::GeneratorContext;
use crate::generator::ideation::{
    IdeationError, IdeationRequest, IdeationResult, TopicIdeaGenerator,
};
use crate::generator::orchestrator::PipelineOrchestrator;
use crate::generator::outlet;
use crate::llm::client::LLMClient;
use crate::types::PipelineRequest;

/// 执行一次生成并交付结果
pub async fn execute(
    context: &GeneratorContext,
    request: PipelineRequest,
    cancel: CancellationToken,
) -> ResultBundle {
    let orchestrator = PipelineOrchestrator::new(context.clone());
    let bundle = orchestrator.run(request, cancel).await;

    outlet::save(context, &bundle).await;

    if let Some(report) = context.cache_report() {
        tracing::info!(
            "📊 风格缓存 [{}] 命中率 {:.1}%（命中 {} / 查询 {}，写入 {}，错误 {}）",
            report.backend,
            report.hit_rate * 100.0,
            report.cache_hits,
            report.total_lookups,
            report.cache_writes,
            report.cache_errors
        );
    }
    bundle
}

/// 生成选题并保存
pub async fn ideate(
    context: &GeneratorContext,
    request: &IdeationRequest,
    cancel: CancellationToken,
) -> Result<IdeationResult, IdeationError> {
    let generator = TopicIdeaGenerator::new(context.clone());
    let result = generator.generate(request, &cancel).await?;

    if let Err(e) = outlet::save_ideas(context, &result).await {
        tracing::warn!("⚠️ 保存选题失败: {:#}", e);
    }
    Ok(result)
}

async fn prepare_context(config: &Config) -> Result<GeneratorContext> {
    let client = LLMClient::new(&config.llm)?;

    // verbose模式下先检查模型连接
    if config.verbose {
        client.check_connection().await?;
    }

    GeneratorContext::new(config.clone(), Arc::new(client))
}

/// Ctrl-C时取消令牌
fn watch_interrupt(cancel: &CancellationToken) -> tokio::task::JoinHandle<()> {
    let cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n⏹️ 收到中断信号，当前阶段结束前取消生成...");
            cancel.cancel();
        }
    })
}

/// 启动文章生成工作流
pub async fn launch(config: &Config, request: PipelineRequest) -> Result<ResultBundle> {
    let context = prepare_context(config).await?;

    let cancel = CancellationToken::new();
    let interrupt = watch_interrupt(&cancel);

    println!("🚀 开始生成文章: {}", request.topic());
    let bundle = execute(&context, request, cancel).await;
    interrupt.abort();

    Ok(bundle)
}

/// 启动选题工作流
pub async fn launch_ideation(config: &Config, request: IdeationRequest) -> Result<IdeationResult> {
    let context = prepare_context(config).await?;

    let cancel = CancellationToken::new();
    let interrupt = watch_interrupt(&cancel);

    println!("💡 开始生成选题: {}", request.reference_source);
    let result = ideate(&context, &request, cancel).await;
    interrupt.abort();

    Ok(result?)
}
