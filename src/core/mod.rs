pub mod comment;
pub mod commit_prompt;
pub mod diff;
pub mod generator;

pub use comment::post_comment;
pub use commit_prompt::CommitPromptBuilder;
pub use diff::{fetch_diff, ChangeRef};
pub use generator::{generate, GenerationRequest};
