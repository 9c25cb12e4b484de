pub mod phase;
pub mod spec;
pub mod task;
pub mod validation;

pub use phase::{DocumentType, Phase};
pub use spec::{check_feature_name, content_checksum, Approval, Specification};
pub use task::{normalize_task_id, ClauseRef, Progress, Task, TaskList, TaskStatus};
pub use validation::{Destination, Finding, FindingCategory, Severity, ValidationReport};
