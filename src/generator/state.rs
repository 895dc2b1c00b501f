//! 单个请求的流水线状态机

use std::fmt::{Display, Formatter};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::generator::invoker::FailureKind;
use crate::generator::stages::StageKind;
use crate::types::{
    ContentSnapshot, DraftContent, DuplicationVerdict, EditedContent, LinkedContent,
    PipelineRequest, ResearchBundle, SeoReport, SourceIdentity, StyleProfile,
};

/// 流水线阶段
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    Received,
    StyleAnalyzing,
    DuplicationChecking,
    Researching,
    Writing,
    Linking,
    Editing,
    SEOAnalyzing,
    Completed,
    Failed,
    Cancelled,
}

impl PipelinePhase {
    /// 成功路径上的下一个阶段；终态没有下一个阶段
    pub fn next(&self) -> Option<PipelinePhase> {
        match self {
            PipelinePhase::Received => Some(PipelinePhase::StyleAnalyzing),
            PipelinePhase::StyleAnalyzing => Some(PipelinePhase::DuplicationChecking),
            PipelinePhase::DuplicationChecking => Some(PipelinePhase::Researching),
            PipelinePhase::Researching => Some(PipelinePhase::Writing),
            PipelinePhase::Writing => Some(PipelinePhase::Linking),
            PipelinePhase::Linking => Some(PipelinePhase::Editing),
            PipelinePhase::Editing => Some(PipelinePhase::SEOAnalyzing),
            PipelinePhase::SEOAnalyzing => Some(PipelinePhase::Completed),
            PipelinePhase::Completed | PipelinePhase::Failed | PipelinePhase::Cancelled => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelinePhase::Completed | PipelinePhase::Failed | PipelinePhase::Cancelled
        )
    }

    /// 该状态对应的阶段
    pub fn stage(&self) -> Option<StageKind> {
        match self {
            PipelinePhase::StyleAnalyzing => Some(StageKind::StyleAnalysis),
            PipelinePhase::DuplicationChecking => Some(StageKind::DuplicationCheck),
            PipelinePhase::Researching => Some(StageKind::Research),
            PipelinePhase::Writing => Some(StageKind::Writing),
            PipelinePhase::Linking => Some(StageKind::Linking),
            PipelinePhase::Editing => Some(StageKind::Editing),
            PipelinePhase::SEOAnalyzing => Some(StageKind::SeoAnalysis),
            _ => None,
        }
    }
}

impl Display for PipelinePhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// 阶段失败记录
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StageFailure {
    pub stage: StageKind,
    pub kind: FailureKind,
    pub detail: String,
}

/// 单个阶段的执行记录，仅用于日志
#[derive(Debug, Clone, PartialEq)]
pub struct StageRecord {
    pub stage: StageKind,
    pub attempts: u32,
    pub elapsed: Duration,
    pub skipped: bool,
}

/// 单个请求的状态信封，只由编排器持有，请求结束即销毁
#[derive(Debug, Clone)]
pub struct PipelineState {
    pub(crate) request: PipelineRequest,
    pub(crate) phase: PipelinePhase,
    pub(crate) source: Option<SourceIdentity>,
    pub(crate) style_profile: Option<StyleProfile>,
    pub(crate) style_from_cache: bool,
    pub(crate) duplication: Option<DuplicationVerdict>,
    pub(crate) research: Option<ResearchBundle>,
    pub(crate) draft: Option<DraftContent>,
    pub(crate) linked: Option<LinkedContent>,
    pub(crate) edited: Option<EditedContent>,
    pub(crate) seo_report: Option<SeoReport>,
    pub(crate) failure: Option<StageFailure>,
    pub(crate) cancelled_at: Option<PipelinePhase>,
    pub(crate) history: Vec<StageRecord>,
}

impl PipelineState {
    pub fn new(request: PipelineRequest) -> Self {
        Self {
            request,
            phase: PipelinePhase::Received,
            source: None,
            style_profile: None,
            style_from_cache: false,
            duplication: None,
            research: None,
            draft: None,
            linked: None,
            edited: None,
            seo_report: None,
            failure: None,
            cancelled_at: None,
            history: Vec::new(),
        }
    }

    pub fn request(&self) -> &PipelineRequest {
        &self.request
    }

    pub fn phase(&self) -> PipelinePhase {
        self.phase
    }

    pub fn source(&self) -> Option<&SourceIdentity> {
        self.source.as_ref()
    }

    pub fn style_profile(&self) -> Option<&StyleProfile> {
        self.style_profile.as_ref()
    }

    pub fn style_from_cache(&self) -> bool {
        self.style_from_cache
    }

    pub fn duplication(&self) -> Option<&DuplicationVerdict> {
        self.duplication.as_ref()
    }

    pub fn research(&self) -> Option<&ResearchBundle> {
        self.research.as_ref()
    }

    pub fn edited(&self) -> Option<&EditedContent> {
        self.edited.as_ref()
    }

    pub fn seo_report(&self) -> Option<&SeoReport> {
        self.seo_report.as_ref()
    }

    pub fn failure(&self) -> Option<&StageFailure> {
        self.failure.as_ref()
    }

    pub fn cancelled_at(&self) -> Option<PipelinePhase> {
        self.cancelled_at
    }

    pub fn history(&self) -> &[StageRecord] {
        &self.history
    }

    /// 正文链上最新的快照
    pub fn latest_snapshot(&self) -> Option<ContentSnapshot> {
        if let Some(edited) = &self.edited {
            return Some(ContentSnapshot::Edited(edited.clone()));
        }
        if let Some(linked) = &self.linked {
            return Some(ContentSnapshot::Linked(linked.clone()));
        }
        self.draft.clone().map(ContentSnapshot::Draft)
    }

    /// 已完成的阶段（按执行顺序）
    pub fn stages_completed(&self) -> Vec<StageKind> {
        StageKind::ALL
            .into_iter()
            .filter(|stage| match stage {
                StageKind::StyleAnalysis => self.style_profile.is_some(),
                StageKind::DuplicationCheck => self.duplication.is_some(),
                StageKind::Research => self.research.is_some(),
                StageKind::Writing => self.draft.is_some(),
                StageKind::Linking => self.linked.is_some(),
                StageKind::Editing => self.edited.is_some(),
                StageKind::SeoAnalysis => self.seo_report.is_some(),
                StageKind::TopicIdeation => false,
            })
            .collect()
    }

    /// 沿成功路径前进一个阶段
    pub(crate) fn advance(&mut self) {
        if let Some(next) = self.phase.next() {
            tracing::debug!("➡️ {} -> {}", self.phase, next);
            self.phase = next;
        }
    }

    pub(crate) fn fail(&mut self, stage: StageKind, kind: FailureKind, detail: String) {
        self.failure = Some(StageFailure {
            stage,
            kind,
            detail,
        });
        self.phase = PipelinePhase::Failed;
    }

    pub(crate) fn cancel(&mut self) {
        self.cancelled_at = Some(self.phase);
        self.phase = PipelinePhase::Cancelled;
    }

    pub(crate) fn record(&mut self, record: StageRecord) {
        self.history.push(record);
    }

    pub(crate) fn commit_source(&mut self, source: SourceIdentity) {
        self.source = Some(source);
    }

    pub(crate) fn commit_style(&mut self, profile: StyleProfile, from_cache: bool) {
        self.style_profile = Some(profile);
        self.style_from_cache = from_cache;
    }

    pub(crate) fn commit_duplication(&mut self, verdict: DuplicationVerdict) {
        self.duplication = Some(verdict);
    }

    pub(crate) fn commit_research(&mut self, research: ResearchBundle) {
        self.research = Some(research);
    }

    pub(crate) fn commit_draft(&mut self, body: String) {
        self.draft = Some(DraftContent::new(self.request.id(), body));
    }

    /// 基于初稿生成内链快照；没有初稿时返回false
    pub(crate) fn commit_linked(&mut self, body: String) -> bool {
        match &self.draft {
            Some(draft) => {
                self.linked = Some(LinkedContent::from_draft(draft, body));
                true
            }
            None => false,
        }
    }

    pub(crate) fn commit_edited(&mut self, body: String) -> bool {
        match &self.linked {
            Some(linked) => {
                self.edited = Some(EditedContent::from_linked(linked, body));
                true
            }
            None => false,
        }
    }

    pub(crate) fn commit_seo(&mut self, report: SeoReport) {
        self.seo_report = Some(report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ModelTier, RequestOptions};

    fn state() -> PipelineState {
        PipelineState::new(PipelineRequest::new(
            "remote work productivity",
            "https://example-blog.test",
            ModelTier::Tier2,
            RequestOptions::default(),
        ))
    }

    #[test]
    fn test_transition_table_walks_all_stages() {
        let mut phase = PipelinePhase::Received;
        let mut stages = Vec::new();
        while let Some(next) = phase.next() {
            if let Some(stage) = next.stage() {
                stages.push(stage);
            }
            phase = next;
        }
        assert_eq!(phase, PipelinePhase::Completed);
        assert_eq!(stages, StageKind::ALL.to_vec());
        assert!(PipelinePhase::Failed.next().is_none());
        assert!(PipelinePhase::Cancelled.is_terminal());
    }

    #[test]
    fn test_snapshots_form_linear_chain() {
        let mut state = state();
        assert!(!state.commit_linked("too early".to_string()));

        state.commit_draft("draft".to_string());
        assert!(state.commit_linked("linked".to_string()));
        assert!(state.commit_edited("edited".to_string()));

        let draft = state.draft.clone().unwrap();
        let linked = state.linked.clone().unwrap();
        let edited = state.edited.clone().unwrap();
        assert_eq!(linked.parent(), draft.id());
        assert_eq!(edited.parent(), linked.id());
        assert_eq!(draft.request_id(), state.request().id());
        assert_eq!(state.latest_snapshot().unwrap().body(), "edited");
    }

    #[test]
    fn test_fail_preserves_prior_outputs() {
        let mut state = state();
        state.advance();
        state.commit_research(ResearchBundle::default());
        state.fail(StageKind::Writing, FailureKind::SchemaInvalid, "bad".to_string());

        assert_eq!(state.phase(), PipelinePhase::Failed);
        assert!(state.research().is_some());
        assert_eq!(state.failure().unwrap().stage, StageKind::Writing);
        assert_eq!(state.stages_completed(), vec![StageKind::Research]);
    }

    #[test]
    fn test_cancel_records_phase() {
        let mut state = state();
        state.advance();
        state.advance();
        state.cancel();
        assert_eq!(state.cancelled_at(), Some(PipelinePhase::DuplicationChecking));
        assert!(state.phase().is_terminal());
    }
}
