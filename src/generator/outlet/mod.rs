use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::fs;

use crate::generator::aggregator::{CompletionStatus, ResultBundle};
use crate::generator::context::GeneratorContext;
use crate::generator::ideation::IdeationResult;
use crate::store::{BlogSourceRecord, ContentStatus, GeneratedContentRecord};
use crate::utils::text::word_count;

/// 交付结果：写磁盘并同步记录存储，任何失败都只记录日志
pub async fn save(context: &GeneratorContext, bundle: &ResultBundle) {
    if let Err(e) = DiskOutlet.save(context, bundle).await {
        tracing::warn!("⚠️ 保存结果文件失败: {:#}", e);
    }
    if let Err(e) = RecordOutlet.save(context, bundle).await {
        tracing::warn!("⚠️ 同步记录存储失败: {:#}", e);
    }
}

/// 写入 `output_path/ideas/<domain>-<时间戳>/` 下的 ideas.md 与 ideas.json
pub async fn save_ideas(context: &GeneratorContext, result: &IdeationResult) -> Result<PathBuf> {
    let output_dir = context.config.output_path.join("ideas").join(format!(
        "{}-{}",
        result.source_identity.domain(),
        Utc::now().format("%Y%m%d%H%M%S")
    ));
    fs::create_dir_all(&output_dir)
        .await
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    fs::write(output_dir.join("ideas.md"), result.to_markdown()).await?;
    fs::write(
        output_dir.join("ideas.json"),
        serde_json::to_string_pretty(result)?,
    )
    .await?;

    tracing::info!("💾 已保存选题: {}", output_dir.display());
    Ok(output_dir)
}

pub trait Outlet {
    async fn save(&self, context: &GeneratorContext, bundle: &ResultBundle) -> Result<()>;
}

/// 写入 `output_path/<request-id>/` 下的 article.md 与 result.json
pub struct DiskOutlet;

impl Outlet for DiskOutlet {
    async fn save(&self, context: &GeneratorContext, bundle: &ResultBundle) -> Result<()> {
        let output_dir = context
            .config
            .output_path
            .join(bundle.request_id.to_string());
        fs::create_dir_all(&output_dir)
            .await
            .with_context(|| format!("failed to create {}", output_dir.display()))?;

        let article_path = output_dir.join("article.md");
        fs::write(&article_path, bundle.to_markdown()).await?;

        let result_path = output_dir.join("result.json");
        fs::write(&result_path, serde_json::to_string_pretty(bundle)?).await?;

        tracing::info!("💾 已保存结果: {}", output_dir.display());
        Ok(())
    }
}

/// 追加 Generated_Content，完成时更新 Blog_Sources
pub struct RecordOutlet;

impl RecordOutlet {
    fn content_record(bundle: &ResultBundle) -> GeneratedContentRecord {
        let (status, user_notes) = match &bundle.completion_status {
            CompletionStatus::Completed => (ContentStatus::Completed, String::new()),
            CompletionStatus::Failed {
                stage,
                kind,
                detail,
            } => (
                ContentStatus::Failed,
                format!("failed at {} ({}): {}", stage, kind, detail),
            ),
            CompletionStatus::Cancelled { at } => {
                (ContentStatus::Cancelled, format!("cancelled at {}", at))
            }
        };

        let final_content = bundle.final_content.clone().unwrap_or_default();
        let word_count = match (&bundle.seo_report, &bundle.final_content) {
            (Some(report), _) => Some(report.word_count),
            (None, Some(content)) => Some(word_count(content) as u32),
            (None, None) => None,
        };

        GeneratedContentRecord {
            id: bundle.request_id.to_string(),
            topic: bundle.topic.clone(),
            source_blog: bundle
                .source_identity
                .as_ref()
                .map(|source| source.domain().to_string())
                .unwrap_or_default(),
            date_created: Utc::now(),
            status,
            final_content,
            seo_score: bundle.seo_report.as_ref().map(|report| report.score),
            word_count,
            user_notes,
        }
    }
}

impl Outlet for RecordOutlet {
    async fn save(&self, context: &GeneratorContext, bundle: &ResultBundle) -> Result<()> {
        let Some(store) = &context.record_store else {
            return Ok(());
        };

        store
            .append_generated_content(Self::content_record(bundle))
            .await?;

        if !bundle.completion_status.is_completed() {
            return Ok(());
        }
        let (Some(source), Some(profile)) = (&bundle.source_identity, &bundle.style_profile)
        else {
            return Ok(());
        };

        let mut record = store
            .get_blog_source(source)
            .await?
            .unwrap_or_else(|| BlogSourceRecord::new(source.domain()));
        record.success_count += 1;
        record.last_analyzed = Some(profile.last_updated);
        record.quality_rating = Some(profile.analysis_quality);
        store.put_blog_source(record).await?;

        tracing::debug!("📒 已更新 {} 的来源记录", source);
        Ok(())
    }
}
