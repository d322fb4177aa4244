pub const SYSTEM_PROMPT: &str = r#"You are an expert at writing concise, meaningful commit messages following the Conventional Commits specification.

Rules:
- Use the format: type(scope): description
- Types: feat, fix, refactor, docs, style, test, chore, perf, ci, build
- Keep the first line under 72 characters
- Add a blank line then a body with bullet points explaining key changes
- Focus on WHY, not WHAT (the diff shows what)
- Be specific, not generic"#;

pub struct CommitPromptBuilder;

impl CommitPromptBuilder {
    /// Returns the `(system, user)` prompt pair for a diff.
    pub fn build_commit_prompt(
        diff: &str,
        language: &str,
        custom_prompt: Option<&str>,
    ) -> (String, String) {
        (
            SYSTEM_PROMPT.to_string(),
            Self::build_user_prompt(diff, language, custom_prompt),
        )
    }

    pub fn build_user_prompt(diff: &str, language: &str, custom_prompt: Option<&str>) -> String {
        let mut prompt = format!(
            "Generate a commit message for the following diff. Write in {}.\n\n```diff\n{}\n```",
            language, diff
        );

        if let Some(extra) = custom_prompt.filter(|extra| !extra.is_empty()) {
            prompt.push_str("\n\nAdditional instructions: ");
            prompt.push_str(extra);
        }

        prompt
    }
}
