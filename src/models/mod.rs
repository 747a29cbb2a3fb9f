pub mod analytics;
pub mod overrides;
pub mod report;
pub mod template;

pub use analytics::AnalyticsRecord;
pub use overrides::{ActionOverride, OverrideDocument};
pub use report::{ActionFailure, ActionOutcome, ActionStatus, ExecutionReport, Overall};
pub use template::{Action, RevisionInfo, Template, TemplateDraft, TemplateKind, TemplateSummary};
