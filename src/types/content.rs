use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::request::RequestId;

/// 查重门的判定结果（建议性质，不阻断流水线）
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct DuplicationVerdict {
    /// 是否已存在高度相似的内容
    pub is_duplicate: bool,
    /// 与哪些已有内容相似、相似在哪里
    pub similarity_notes: String,
    /// 建议的差异化角度；不重复时可以为空
    #[serde(default)]
    pub recommended_differentiation: Option<String>,
}

/// 带出处的论据
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct SourcedClaim {
    pub claim: String,
    #[serde(default)]
    pub source: Option<String>,
}

/// 调研结果
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default, JsonSchema)]
pub struct ResearchBundle {
    /// 按重要性排序的论据
    pub facts: Vec<SourcedClaim>,
    /// 引用来源集合
    #[serde(default)]
    pub citations: BTreeSet<String>,
}

/// SEO分析报告
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct SeoReport {
    /// 0-100 的综合评分
    pub score: f64,
    pub word_count: u32,
    /// 按优先级排列的改进建议
    pub recommendations: Vec<String>,
}

/// 写作、内链、编辑三个阶段共用的正文输出
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct ArticleBody {
    /// Markdown 格式的完整文章
    pub content: String,
}

/// 正文快照标识
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapshotId(Uuid);

impl SnapshotId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for SnapshotId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 初稿快照，正文链的起点
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DraftContent {
    id: SnapshotId,
    request_id: RequestId,
    body: String,
}

impl DraftContent {
    pub fn new(request_id: RequestId, body: impl Into<String>) -> Self {
        Self {
            id: SnapshotId::new(),
            request_id,
            body: body.into(),
        }
    }

    pub fn id(&self) -> SnapshotId {
        self.id
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

/// 加入内链后的快照
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LinkedContent {
    id: SnapshotId,
    request_id: RequestId,
    parent: SnapshotId,
    body: String,
}

impl LinkedContent {
    pub fn from_draft(draft: &DraftContent, body: impl Into<String>) -> Self {
        Self {
            id: SnapshotId::new(),
            request_id: draft.request_id,
            parent: draft.id,
            body: body.into(),
        }
    }

    pub fn id(&self) -> SnapshotId {
        self.id
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn parent(&self) -> SnapshotId {
        self.parent
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

/// 编辑润色后的最终快照
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EditedContent {
    id: SnapshotId,
    request_id: RequestId,
    parent: SnapshotId,
    body: String,
}

impl EditedContent {
    pub fn from_linked(linked: &LinkedContent, body: impl Into<String>) -> Self {
        Self {
            id: SnapshotId::new(),
            request_id: linked.request_id,
            parent: linked.id,
            body: body.into(),
        }
    }

    pub fn id(&self) -> SnapshotId {
        self.id
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn parent(&self) -> SnapshotId {
        self.parent
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

/// 正文链上任意一个快照
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum ContentSnapshot {
    Draft(DraftContent),
    Linked(LinkedContent),
    Edited(EditedContent),
}

impl ContentSnapshot {
    pub fn id(&self) -> SnapshotId {
        match self {
            ContentSnapshot::Draft(c) => c.id(),
            ContentSnapshot::Linked(c) => c.id(),
            ContentSnapshot::Edited(c) => c.id(),
        }
    }

    pub fn body(&self) -> &str {
        match self {
            ContentSnapshot::Draft(c) => c.body(),
            ContentSnapshot::Linked(c) => c.body(),
            ContentSnapshot::Edited(c) => c.body(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshots_form_linear_chain() {
        let request_id = RequestId::new();
        let draft = DraftContent::new(request_id, "draft");
        let linked = LinkedContent::from_draft(&draft, "linked");
        let edited = EditedContent::from_linked(&linked, "edited");

        assert_eq!(linked.parent(), draft.id());
        assert_eq!(edited.parent(), linked.id());
        assert_eq!(edited.request_id(), request_id);
        assert_ne!(draft.id(), linked.id());
        assert_eq!(draft.body(), "draft");
        assert_eq!(ContentSnapshot::Edited(edited).body(), "edited");
    }

    #[test]
    fn test_verdict_differentiation_is_optional() {
        let verdict: DuplicationVerdict =
            serde_json::from_str(r#"{"is_duplicate": false, "similarity_notes": "none"}"#).unwrap();
        assert!(verdict.recommended_differentiation.is_none());
    }

    #[test]
    fn test_research_citations_deduplicate() {
        let bundle: ResearchBundle = serde_json::from_str(
            r#"{"facts": [{"claim": "x"}], "citations": ["b", "a", "b"]}"#,
        )
        .unwrap();
        assert_eq!(bundle.citations.len(), 2);
        assert_eq!(bundle.citations.iter().next().unwrap(), "a");
        assert!(bundle.facts[0].source.is_none());
    }
}
