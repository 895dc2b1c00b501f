use anyhow::Result;
use blogsmith::cli::Args;
use blogsmith::generator::aggregator::CompletionStatus;
use blogsmith::{launch, launch_ideation};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let config = args.to_config()?;

    if let Some(request) = args.to_ideation_request(&config)? {
        let result = launch_ideation(&config, request).await?;
        println!();
        println!(
            "✅ 为 {} 生成了 {} 个选题",
            result.source_identity.domain(),
            result.ideas.len()
        );
        for (index, idea) in result.ideas.iter().enumerate() {
            println!("  {}. {} [{}]", index + 1, idea.title, idea.content_type);
        }
        println!("📁 输出目录: {}", config.output_path.join("ideas").display());
        return Ok(());
    }

    let request = args.to_request(&config)?;

    let bundle = launch(&config, request).await?;

    println!();
    match &bundle.completion_status {
        CompletionStatus::Completed => {
            println!("✅ 文章生成完成: {}", bundle.topic);
            if let Some(report) = &bundle.seo_report {
                println!("📈 SEO评分: {:.1}，字数: {}", report.score, report.word_count);
            }
        }
        CompletionStatus::Failed {
            stage,
            kind,
            detail,
        } => {
            eprintln!("❌ 生成在 {} 阶段失败 ({}): {}", stage, kind, detail);
            if !bundle.stages_completed.is_empty() {
                eprintln!("💡 已保留部分结果，完成的阶段: {:?}", bundle.stages_completed);
            }
        }
        CompletionStatus::Cancelled { at } => {
            eprintln!("⏹️ 生成在 {} 阶段被取消", at);
        }
    }
    println!(
        "📁 输出目录: {}",
        config
            .output_path
            .join(bundle.request_id.to_string())
            .display()
    );

    if !bundle.completion_status.is_completed() {
        std::process::exit(1);
    }
    Ok(())
}
