pub mod content;
pub mod request;
pub mod style;
pub mod topic;

pub use content::{
    ArticleBody, ContentSnapshot, DraftContent, DuplicationVerdict, EditedContent, LinkedContent,
    ResearchBundle, SeoReport, SnapshotId, SourcedClaim,
};
pub use request::{
    LinkDensity, ModelTier, PipelineRequest, RequestId, RequestOptions, SourceError,
    SourceIdentity,
};
pub use style::{AnalysisQuality, StyleAnalysisOutput, StyleProfile};
pub use topic::{ContentType, TopicIdea, TopicIdeaList};
