pub mod anthropic;
pub mod github;
pub mod llm;
pub mod openai;

pub use anthropic::AnthropicAdapter;
pub use github::{GitHubClient, RepoHost};
pub use openai::OpenAIAdapter;
