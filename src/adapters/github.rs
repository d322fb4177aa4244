use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const DIFF_MEDIA_TYPE: &str = "application/vnd.github.diff";
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";

#[derive(Error, Debug)]
pub enum GitHubError {
    #[error("GitHub API error ({status}): {body}")]
    Api { status: u16, body: String },
}

/// Repository hosting operations the pipeline depends on.
#[async_trait]
pub trait RepoHost: Send + Sync {
    async fn pull_request_diff(&self, number: u64) -> Result<String>;
    async fn commit_diff(&self, sha: &str) -> Result<String>;
    async fn create_comment(&self, number: u64, body: &str) -> Result<()>;
}

pub struct GitHubClient {
    client: Client,
    api_url: String,
    owner: String,
    repo: String,
    token: Option<String>,
}

#[derive(Serialize)]
struct CreateCommentRequest<'a> {
    body: &'a str,
}

impl GitHubClient {
    pub fn new(
        api_url: &str,
        owner: impl Into<String>,
        repo: impl Into<String>,
        token: Option<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("commitsense/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            owner: owner.into(),
            repo: repo.into(),
            token,
        })
    }

    fn repo_url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}/{}", self.api_url, self.owner, self.repo, path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header("X-GitHub-Api-Version", API_VERSION);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get_diff(&self, path: &str) -> Result<String> {
        let url = self.repo_url(path);
        let response = self
            .authorize(self.client.get(&url))
            .header("Accept", DIFF_MEDIA_TYPE)
            .send()
            .await
            .with_context(|| format!("Failed to request diff from {}", url))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read GitHub response body")?;
        if !status.is_success() {
            return Err(GitHubError::Api {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        Ok(body)
    }
}

#[async_trait]
impl RepoHost for GitHubClient {
    async fn pull_request_diff(&self, number: u64) -> Result<String> {
        self.get_diff(&format!("pulls/{}", number)).await
    }

    async fn commit_diff(&self, sha: &str) -> Result<String> {
        self.get_diff(&format!("commits/{}", sha)).await
    }

    async fn create_comment(&self, number: u64, body: &str) -> Result<()> {
        let url = self.repo_url(&format!("issues/{}/comments", number));
        let response = self
            .authorize(self.client.post(&url))
            .header("Accept", JSON_MEDIA_TYPE)
            .json(&CreateCommentRequest { body })
            .send()
            .await
            .with_context(|| format!("Failed to post comment to {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GitHubError::Api {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn client(server: &mockito::Server, token: Option<&str>) -> GitHubClient {
        GitHubClient::new(&server.url(), "octo", "widgets", token.map(str::to_string)).unwrap()
    }

    #[tokio::test]
    async fn fetches_pull_request_diff_with_diff_media_type() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/octo/widgets/pulls/42")
            .match_header("accept", DIFF_MEDIA_TYPE)
            .match_header("authorization", "Bearer gh-token")
            .match_header("user-agent", Matcher::Regex("^commitsense/".to_string()))
            .with_status(200)
            .with_body("diff --git a/a.rs b/a.rs\n")
            .create_async()
            .await;

        let diff = client(&server, Some("gh-token"))
            .pull_request_diff(42)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(diff, "diff --git a/a.rs b/a.rs\n");
    }

    #[tokio::test]
    async fn fetches_commit_diff_without_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/octo/widgets/commits/abc123")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body("commit diff")
            .create_async()
            .await;

        let diff = client(&server, None).commit_diff("abc123").await.unwrap();

        mock.assert_async().await;
        assert_eq!(diff, "commit diff");
    }

    #[tokio::test]
    async fn diff_failure_reports_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/octo/widgets/pulls/7")
            .with_status(404)
            .with_body(r#"{"message":"Not Found"}"#)
            .create_async()
            .await;

        let err = client(&server, None).pull_request_diff(7).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"GitHub API error (404): {"message":"Not Found"}"#
        );
    }

    #[tokio::test]
    async fn creates_issue_comment() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/repos/octo/widgets/issues/42/comments")
            .match_header("authorization", "Bearer gh-token")
            .match_body(Matcher::Json(json!({"body": "hello"})))
            .with_status(201)
            .with_body(r#"{"id":1}"#)
            .create_async()
            .await;

        client(&server, Some("gh-token"))
            .create_comment(42, "hello")
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn comment_failure_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/repos/octo/widgets/issues/42/comments")
            .with_status(403)
            .with_body("Resource not accessible by integration")
            .create_async()
            .await;

        let err = client(&server, None)
            .create_comment(42, "hello")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("403"));
    }
}
