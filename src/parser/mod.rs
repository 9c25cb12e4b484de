pub mod requirements;
pub mod task_grammar;
pub mod tasks;

pub use requirements::{Clause, RequirementCatalog};
pub use task_grammar::{tokenize_line, LineToken};
pub use tasks::{parse_tasks, ParsedTasks, ProseBlock};
