//! 流水线编排器：按固定顺序驱动各阶段，持有单个请求的状态

use std::future::Future;
use std::time::Instant;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::fetch::{FetchError, UrlGuard};
use crate::generator::aggregator::{ResultAggregator, ResultBundle};
use crate::generator::context::GeneratorContext;
use crate::generator::duplication::DuplicationGate;
use crate::generator::invoker::{FailureKind, StageOutput};
use crate::generator::stages::{
    EditingInput, LinkingInput, ResearchInput, SeoAnalysisInput, StageInput, StageKind,
    StagePayload, StyleAnalysisInput, WritingInput,
};
use crate::generator::state::{PipelinePhase, PipelineState, StageRecord};
use crate::types::{PipelineRequest, StyleProfile};

/// 单个阶段的执行结论
enum StepOutcome {
    Advanced { attempts: u32, skipped: bool },
    Failed { kind: FailureKind, detail: String, attempts: u32 },
    Cancelled,
}

impl StepOutcome {
    fn rejected(detail: impl Into<String>) -> Self {
        StepOutcome::Failed {
            kind: FailureKind::InputRejected,
            detail: detail.into(),
            attempts: 0,
        }
    }

    fn missing(what: &str) -> Self {
        StepOutcome::Failed {
            kind: FailureKind::InputRejected,
            detail: format!("{} is not available", what),
            attempts: 0,
        }
    }
}

/// 阶段级重试的结论
enum StageRun {
    Success { payload: StagePayload, attempts: u32 },
    Failure { kind: FailureKind, detail: String, attempts: u32 },
    Cancelled,
}

/// 流水线编排器，可以在多个并发请求之间共享
#[derive(Clone)]
pub struct PipelineOrchestrator {
    context: GeneratorContext,
}

impl PipelineOrchestrator {
    pub fn new(context: GeneratorContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &GeneratorContext {
        &self.context
    }

    /// 执行一个生成请求，总是返回结果（失败与取消也会带上部分产出）
    pub async fn run(&self, request: PipelineRequest, cancel: CancellationToken) -> ResultBundle {
        let started = Instant::now();
        tracing::info!(
            "🚀 开始生成 [{}] 主题: {}，参考来源: {}",
            request.id(),
            request.topic(),
            request.reference_source()
        );

        let mut state = PipelineState::new(request);
        state.advance();

        while let Some(stage) = state.phase().stage() {
            if cancel.is_cancelled() {
                tracing::warn!("⏹️ 请求 [{}] 在 {} 阶段前被取消", state.request().id(), stage);
                state.cancel();
                break;
            }

            let stage_started = Instant::now();
            let outcome = match stage {
                StageKind::StyleAnalysis => self.analyze_style(&mut state, &cancel).await,
                StageKind::DuplicationCheck => self.check_duplication(&mut state, &cancel).await,
                StageKind::Research => self.research(&mut state, &cancel).await,
                StageKind::Writing => self.write(&mut state, &cancel).await,
                StageKind::Linking => self.link(&mut state, &cancel).await,
                StageKind::Editing => self.edit(&mut state, &cancel).await,
                StageKind::SeoAnalysis => self.analyze_seo(&mut state, &cancel).await,
                StageKind::TopicIdeation => {
                    StepOutcome::rejected("topic ideation is not part of the article pipeline")
                }
            };
            let elapsed = stage_started.elapsed();

            match outcome {
                StepOutcome::Advanced { attempts, skipped } => {
                    tracing::info!(
                        "✅ 阶段 [{}] 完成，耗时 {:.2}s{}",
                        stage,
                        elapsed.as_secs_f64(),
                        if skipped { "（使用缓存）" } else { "" }
                    );
                    state.record(StageRecord {
                        stage,
                        attempts,
                        elapsed,
                        skipped,
                    });
                    state.advance();
                }
                StepOutcome::Failed {
                    kind,
                    detail,
                    attempts,
                } => {
                    tracing::error!("❌ 阶段 [{}] 失败 ({}): {}", stage, kind, detail);
                    state.record(StageRecord {
                        stage,
                        attempts,
                        elapsed,
                        skipped: false,
                    });
                    state.fail(stage, kind, detail);
                }
                StepOutcome::Cancelled => {
                    tracing::warn!("⏹️ 请求 [{}] 在 {} 阶段被取消", state.request().id(), stage);
                    state.cancel();
                }
            }
        }

        if state.phase() == PipelinePhase::Completed {
            self.write_back_style(&state).await;
        }

        let bundle = ResultAggregator::assemble(&state);
        let attempts: u32 = state.history().iter().map(|record| record.attempts).sum();
        tracing::info!(
            "🏁 请求 [{}] 结束: {}，共执行 {} 次阶段调用，总耗时 {:.2}s",
            bundle.request_id,
            state.phase(),
            attempts,
            started.elapsed().as_secs_f64()
        );
        bundle
    }

    /// 带阶段级重试执行一次阶段调用，在途调用可被取消
    async fn run_stage<F, Fut>(
        &self,
        stage: StageKind,
        cancel: &CancellationToken,
        operation: F,
    ) -> StageRun
    where
        F: Fn() -> Fut,
        Fut: Future<Output = StageOutput>,
    {
        let max_runs = self.context.config.orchestrator.stage_retries + 1;
        let mut attempts = 0;

        loop {
            attempts += 1;
            let output = tokio::select! {
                biased;
                _ = cancel.cancelled() => return StageRun::Cancelled,
                output = operation() => output,
            };

            match output {
                StageOutput::Success(payload) => return StageRun::Success { payload, attempts },
                StageOutput::Failure { kind, detail } => {
                    let retryable = kind.is_transient() || kind == FailureKind::SchemaInvalid;
                    if !retryable || attempts >= max_runs {
                        return StageRun::Failure {
                            kind,
                            detail,
                            attempts,
                        };
                    }
                    tracing::warn!(
                        "🔁 阶段 [{}] 失败 ({})，重新执行整个阶段 ({}/{})",
                        stage,
                        kind,
                        attempts,
                        max_runs - 1
                    );
                }
            }
        }
    }

    /// 把阶段结论写入状态；`commit`返回false表示输出与阶段不匹配
    fn settle<C>(state: &mut PipelineState, stage: StageKind, run: StageRun, commit: C) -> StepOutcome
    where
        C: FnOnce(&mut PipelineState, StagePayload) -> bool,
    {
        match run {
            StageRun::Success { payload, attempts } => {
                if commit(state, payload) {
                    StepOutcome::Advanced {
                        attempts,
                        skipped: false,
                    }
                } else {
                    StepOutcome::Failed {
                        kind: FailureKind::SchemaInvalid,
                        detail: format!("unexpected payload for stage {}", stage),
                        attempts,
                    }
                }
            }
            StageRun::Failure {
                kind,
                detail,
                attempts,
            } => StepOutcome::Failed {
                kind,
                detail,
                attempts,
            },
            StageRun::Cancelled => StepOutcome::Cancelled,
        }
    }

    /// 本次请求实际使用的风格（应用语气覆盖，不影响缓存）
    fn effective_style(state: &PipelineState) -> Option<StyleProfile> {
        let tone = state.request().options().tone_override.as_deref();
        state
            .style_profile()
            .map(|profile| profile.with_tone_override(tone))
    }

    fn differentiation(state: &PipelineState) -> Option<String> {
        state
            .duplication()
            .and_then(|verdict| verdict.recommended_differentiation.clone())
    }

    async fn analyze_style(
        &self,
        state: &mut PipelineState,
        cancel: &CancellationToken,
    ) -> StepOutcome {
        let request = state.request().clone();
        let options = request.options();

        let guard = UrlGuard::new(self.context.config.fetch.allow_private_hosts);
        let source = match guard.check_source(request.reference_source()) {
            Ok(source) => source,
            Err(e) => return StepOutcome::rejected(e.to_string()),
        };
        state.commit_source(source.clone());

        if options.force_style_refresh {
            tracing::info!("🔄 强制重新分析 {} 的写作风格", source);
        } else {
            match self.context.style_cache.get(&source).await {
                Ok(Some(profile)) => {
                    if profile.is_reusable(Utc::now(), self.context.config.cache.freshness()) {
                        tracing::info!("💾 复用 {} 的风格画像", source);
                        state.commit_style(profile, true);
                        return StepOutcome::Advanced {
                            attempts: 0,
                            skipped: true,
                        };
                    }
                    tracing::info!(
                        "♻️ {} 的缓存画像不可复用（质量 {}，更新于 {}），重新分析",
                        source,
                        profile.analysis_quality,
                        profile.last_updated
                    );
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("⚠️ 读取风格缓存失败，按未命中处理: {}", e),
            }
        }

        let sample = match &self.context.fetcher {
            Some(fetcher) => {
                let fetched = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return StepOutcome::Cancelled,
                    fetched = fetcher.fetch(&source) => fetched,
                };
                match fetched {
                    Ok(text) if !text.trim().is_empty() => Some(text),
                    Ok(_) => None,
                    Err(FetchError::Rejected(detail)) => return StepOutcome::rejected(detail),
                    Err(e) => {
                        tracing::warn!("⚠️ 抓取 {} 失败，仅凭站点信息分析风格: {}", source, e);
                        None
                    }
                }
            }
            None => None,
        };

        let input = StageInput::StyleAnalysis(StyleAnalysisInput {
            source: source.clone(),
            sample,
            high_performing_pages: options.high_performing_pages.clone(),
        });
        let tier = request.desired_model();
        let run = self
            .run_stage(StageKind::StyleAnalysis, cancel, || {
                self.context.invoker.invoke(&input, tier)
            })
            .await;

        Self::settle(state, StageKind::StyleAnalysis, run, |state, payload| {
            match payload {
                StagePayload::StyleAnalysis(output) => {
                    state.commit_style(StyleProfile::from_analysis(source, output, Utc::now()), false);
                    true
                }
                _ => false,
            }
        })
    }

    async fn check_duplication(
        &self,
        state: &mut PipelineState,
        cancel: &CancellationToken,
    ) -> StepOutcome {
        let corpus = self
            .context
            .existing_topics(&state.request().options().existing_posts_to_avoid)
            .await;
        let corpus = if corpus.is_empty() {
            None
        } else {
            Some(corpus.as_slice())
        };
        let gate = DuplicationGate::new(
            self.context.invoker.clone(),
            self.context.config.duplication.clone(),
        );
        let topic = state.request().topic().to_string();
        let tier = state.request().desired_model();

        let run = self
            .run_stage(StageKind::DuplicationCheck, cancel, || {
                gate.check(&topic, corpus, tier)
            })
            .await;

        Self::settle(state, StageKind::DuplicationCheck, run, |state, payload| {
            match payload {
                StagePayload::DuplicationCheck(verdict) => {
                    if verdict.is_duplicate {
                        tracing::info!("🧭 主题与已有内容相似: {}", verdict.similarity_notes);
                    }
                    state.commit_duplication(verdict);
                    true
                }
                _ => false,
            }
        })
    }

    async fn research(&self, state: &mut PipelineState, cancel: &CancellationToken) -> StepOutcome {
        let Some(style) = Self::effective_style(state) else {
            return StepOutcome::missing("style profile");
        };
        let request = state.request();
        let options = request.options();
        let input = StageInput::Research(ResearchInput {
            topic: request.topic().to_string(),
            style,
            writing_requirements: options.writing_requirements.clone(),
            target_product_urls: options.target_product_urls.clone(),
            seo_keywords: options.seo_keywords.clone(),
            differentiation: Self::differentiation(state),
        });
        let tier = request.desired_model();

        let run = self
            .run_stage(StageKind::Research, cancel, || {
                self.context.invoker.invoke(&input, tier)
            })
            .await;

        Self::settle(state, StageKind::Research, run, |state, payload| match payload {
            StagePayload::Research(research) => {
                state.commit_research(research);
                true
            }
            _ => false,
        })
    }

    async fn write(&self, state: &mut PipelineState, cancel: &CancellationToken) -> StepOutcome {
        let Some(style) = Self::effective_style(state) else {
            return StepOutcome::missing("style profile");
        };
        let Some(research) = state.research().cloned() else {
            return StepOutcome::missing("research bundle");
        };
        let request = state.request();
        let options = request.options();
        let input = StageInput::Writing(WritingInput {
            topic: request.topic().to_string(),
            style,
            research,
            writing_requirements: options.writing_requirements.clone(),
            word_count_target: options.word_count_target,
            seo_keywords: options.seo_keywords.clone(),
            differentiation: Self::differentiation(state),
            target_language: options.target_language,
        });
        let tier = request.desired_model();

        let run = self
            .run_stage(StageKind::Writing, cancel, || {
                self.context.invoker.invoke(&input, tier)
            })
            .await;

        Self::settle(state, StageKind::Writing, run, |state, payload| match payload {
            StagePayload::Writing(article) => {
                state.commit_draft(article.content);
                true
            }
            _ => false,
        })
    }

    async fn link(&self, state: &mut PipelineState, cancel: &CancellationToken) -> StepOutcome {
        let Some(draft_body) = state.draft.as_ref().map(|draft| draft.body().to_string()) else {
            return StepOutcome::missing("draft");
        };
        let Some(source) = state.source().cloned() else {
            return StepOutcome::missing("reference source");
        };
        let request = state.request();
        let options = request.options();
        let input = StageInput::Linking(LinkingInput {
            topic: request.topic().to_string(),
            source,
            draft_body,
            link_density: options.link_density,
            target_language: options.target_language,
        });
        let tier = request.desired_model();

        let run = self
            .run_stage(StageKind::Linking, cancel, || {
                self.context.invoker.invoke(&input, tier)
            })
            .await;

        Self::settle(state, StageKind::Linking, run, |state, payload| match payload {
            StagePayload::Linking(article) => state.commit_linked(article.content),
            _ => false,
        })
    }

    async fn edit(&self, state: &mut PipelineState, cancel: &CancellationToken) -> StepOutcome {
        let Some(style) = Self::effective_style(state) else {
            return StepOutcome::missing("style profile");
        };
        let Some(linked_body) = state.linked.as_ref().map(|linked| linked.body().to_string())
        else {
            return StepOutcome::missing("linked draft");
        };
        let request = state.request();
        let options = request.options();
        let input = StageInput::Editing(EditingInput {
            style,
            linked_body,
            seo_keywords: options.seo_keywords.clone(),
            target_language: options.target_language,
        });
        let tier = request.desired_model();

        let run = self
            .run_stage(StageKind::Editing, cancel, || {
                self.context.invoker.invoke(&input, tier)
            })
            .await;

        Self::settle(state, StageKind::Editing, run, |state, payload| match payload {
            StagePayload::Editing(article) => state.commit_edited(article.content),
            _ => false,
        })
    }

    async fn analyze_seo(
        &self,
        state: &mut PipelineState,
        cancel: &CancellationToken,
    ) -> StepOutcome {
        let Some(edited_body) = state.edited().map(|edited| edited.body().to_string()) else {
            return StepOutcome::missing("edited article");
        };
        let Some(source) = state.source().cloned() else {
            return StepOutcome::missing("reference source");
        };
        let request = state.request();
        let input = StageInput::SeoAnalysis(SeoAnalysisInput {
            topic: request.topic().to_string(),
            source,
            edited_body,
            seo_keywords: request.options().seo_keywords.clone(),
        });
        let tier = request.desired_model();

        let run = self
            .run_stage(StageKind::SeoAnalysis, cancel, || {
                self.context.invoker.invoke(&input, tier)
            })
            .await;

        Self::settle(state, StageKind::SeoAnalysis, run, |state, payload| match payload {
            StagePayload::SeoAnalysis(report) => {
                state.commit_seo(report);
                true
            }
            _ => false,
        })
    }

    /// 完成后写回风格画像；写入失败不影响本次结果
    async fn write_back_style(&self, state: &PipelineState) {
        let Some(profile) = state.style_profile() else {
            return;
        };
        if let Err(e) = self
            .context
            .style_cache
            .put(&profile.source_identity, profile.clone())
            .await
        {
            tracing::warn!(
                "⚠️ 写入 {} 的风格缓存失败: {}",
                profile.source_identity,
                e
            );
        }
    }
}
