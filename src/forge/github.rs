//! forge::github
//!
//! GitHub forge implementation over the Git Data REST API.
//!
//! # Design
//!
//! Every `Forge` operation maps to exactly one REST call:
//!
//! | operation | endpoint |
//! |---|---|
//! | `get_branch` | `GET /repos/{owner}/{repo}/branches/{branch}` |
//! | `get_tree` | `GET /repos/{owner}/{repo}/git/trees/{sha}?recursive=1` |
//! | `get_blob` | `GET /repos/{owner}/{repo}/git/blobs/{sha}` |
//! | `create_blob` | `POST /repos/{owner}/{repo}/git/blobs` |
//! | `create_tree` | `POST /repos/{owner}/{repo}/git/trees` |
//! | `create_commit` | `POST /repos/{owner}/{repo}/git/commits` |
//! | `update_ref` | `PATCH /repos/{owner}/{repo}/git/refs/heads/{branch}` |
//! | `delete_path` | `DELETE /repos/{owner}/{repo}/contents/{path}` |
//!
//! # Errors and Retries
//!
//! Nothing is retried here, including auth failures and rate limits.
//! A 422 from a non-forced ref update and a 409 from a delete are reported
//! as `ForgeError::RefConflict`.
//!
//! # Example
//!
//! ```ignore
//! use ghfs::auth::StaticToken;
//! use ghfs::forge::github::GitHubForge;
//! use std::sync::Arc;
//!
//! let forge = GitHubForge::new(Arc::new(StaticToken::new(token)), "octocat", "site");
//! let head = forge.get_branch(&BranchName::new("main")?).await?;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::traits::{Blob, BlobEncoding, DeleteResult, Forge, ForgeError, TreeItem};
use crate::auth::{AuthError, TokenProvider};
use crate::core::types::{BranchName, BranchState, Entry, EntryKind, FileMode, Oid};

/// Default GitHub API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "ghfs";

/// GitHub forge implementation.
///
/// Bound to one repository. The token provider is asked for a bearer token
/// on every request.
pub struct GitHubForge {
    /// HTTP client for making requests
    client: Client,
    /// Source of bearer tokens
    token_provider: Arc<dyn TokenProvider>,
    /// Repository owner (user or organization)
    owner: String,
    /// Repository name
    repo: String,
    /// API base URL (configurable for GitHub Enterprise)
    api_base: String,
}

// Custom Debug to keep the provider out of logs
impl std::fmt::Debug for GitHubForge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubForge")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GitHubForge {
    /// Create a forge for `owner/repo` on github.com.
    pub fn new(
        provider: Arc<dyn TokenProvider>,
        owner: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        Self::with_api_base(provider, owner, repo, DEFAULT_API_BASE)
    }

    /// Create a forge against a custom API base URL.
    ///
    /// Use this for GitHub Enterprise (e.g. `https://github.example.com/api/v3`)
    /// and for tests against a local mock server.
    pub fn with_api_base(
        provider: Arc<dyn TokenProvider>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        let api_base: String = api_base.into();
        Self {
            client: Client::new(),
            token_provider: provider,
            owner: owner.into(),
            repo: repo.into(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Build common headers for API requests.
    async fn headers(&self) -> Result<HeaderMap, ForgeError> {
        let token = self
            .token_provider
            .bearer_token()
            .await
            .map_err(|e| match e {
                AuthError::NotAuthenticated => ForgeError::AuthRequired,
            })?;

        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ForgeError::AuthFailed("token is not a valid header value".into()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// Build URL for a repository endpoint.
    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.owner, self.repo, path
        )
    }

    /// Build a contents URL with each path segment percent-encoded.
    fn contents_url(&self, path: &str) -> Result<Url, ForgeError> {
        let mut url = Url::parse(&self.repo_url("contents"))
            .map_err(|e| ForgeError::NetworkError(format!("invalid API URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ForgeError::NetworkError("API URL cannot be a base".into()))?
            .extend(path.split('/'));
        Ok(url)
    }

    /// Attach headers, send, and decode the JSON response.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ForgeError> {
        let response = request
            .headers(self.headers().await?)
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;
        self.handle_response(response).await
    }

    /// Handle API response, mapping errors appropriately.
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> Result<T, ForgeError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| ForgeError::ApiError {
                status: status.as_u16(),
                message: format!("Failed to parse response: {}", e),
            })
        } else {
            Err(self.error_from_response(response, status).await)
        }
    }

    /// Map an error response to a `ForgeError`.
    async fn error_from_response(&self, response: Response, status: StatusCode) -> ForgeError {
        let headers = response.headers();
        let rate_exhausted = headers
            .get("X-RateLimit-Remaining")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == "0");
        let required_permissions = headers
            .get("X-Accepted-GitHub-Permissions")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let message = match response.json::<GitHubErrorResponse>().await {
            Ok(err) => err.message,
            Err(_) => "Unknown error".to_string(),
        };

        match status {
            StatusCode::UNAUTHORIZED => ForgeError::AuthFailed("Invalid or expired token".into()),
            StatusCode::FORBIDDEN if rate_exhausted => ForgeError::RateLimited,
            StatusCode::FORBIDDEN => {
                let mut err_msg = format!("Permission denied: {}", message);
                if let Some(perms) = required_permissions.filter(|p| !p.is_empty()) {
                    err_msg.push_str(&format!(" [required: {}]", perms));
                }
                ForgeError::AuthFailed(err_msg)
            }
            StatusCode::NOT_FOUND => ForgeError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => ForgeError::RateLimited,
            _ if status.is_server_error() => ForgeError::ApiError {
                status: status.as_u16(),
                message: format!("GitHub server error: {}", message),
            },
            _ => ForgeError::ApiError {
                status: status.as_u16(),
                message,
            },
        }
    }
}

fn parse_oid(sha: String) -> Result<Oid, ForgeError> {
    Oid::new(sha).map_err(|e| ForgeError::Decode(e.to_string()))
}

#[async_trait]
impl Forge for GitHubForge {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn get_branch(&self, branch: &BranchName) -> Result<BranchState, ForgeError> {
        let url = self.repo_url(&format!("branches/{}", branch));
        let gh: GitHubBranch = self.send(self.client.get(&url)).await?;

        Ok(BranchState {
            name: branch.clone(),
            head_commit: parse_oid(gh.commit.sha)?,
            head_tree: parse_oid(gh.commit.commit.tree.sha)?,
        })
    }

    async fn get_tree(&self, tree: &Oid, recursive: bool) -> Result<Vec<Entry>, ForgeError> {
        let mut url = self.repo_url(&format!("git/trees/{}", tree));
        if recursive {
            url.push_str("?recursive=1");
        }
        let gh: GitHubTree = self.send(self.client.get(&url)).await?;

        // A partial listing would drop the missing entries on the next commit.
        if gh.truncated {
            return Err(ForgeError::TruncatedTree(tree.clone()));
        }

        let mut entries = Vec::with_capacity(gh.tree.len());
        for item in gh.tree {
            let kind = match item.kind.parse::<EntryKind>() {
                Ok(kind) => kind,
                Err(_) => {
                    // Submodules are listed as commits; they have no filesystem view.
                    tracing::debug!(path = %item.path, kind = %item.kind, "skipping entry");
                    continue;
                }
            };
            let mode = if kind == EntryKind::Tree {
                FileMode::Directory
            } else {
                item.mode
                    .parse::<FileMode>()
                    .map_err(|e| ForgeError::Decode(format!("{}: {}", item.path, e)))?
            };
            entries.push(Entry {
                path: item.path,
                kind,
                mode,
                oid: Some(parse_oid(item.sha)?),
                size: item.size,
            });
        }
        Ok(entries)
    }

    async fn get_blob(&self, blob: &Oid) -> Result<Blob, ForgeError> {
        let url = self.repo_url(&format!("git/blobs/{}", blob));
        let gh: GitHubBlob = self.send(self.client.get(&url)).await?;

        let encoding = match gh.encoding.as_str() {
            "base64" => BlobEncoding::Base64,
            "utf-8" | "utf8" => BlobEncoding::Utf8,
            other => {
                return Err(ForgeError::Decode(format!(
                    "unsupported blob encoding '{}'",
                    other
                )))
            }
        };
        Ok(Blob {
            content: gh.content,
            encoding,
        })
    }

    async fn create_blob(&self, content: &[u8]) -> Result<Oid, ForgeError> {
        let url = self.repo_url("git/blobs");
        let encoded = Blob::encode(content);
        let body = CreateBlobBody {
            content: &encoded.content,
            encoding: "base64",
        };
        let created: GitHubSha = self.send(self.client.post(&url).json(&body)).await?;
        parse_oid(created.sha)
    }

    async fn create_tree(&self, items: &[TreeItem]) -> Result<Oid, ForgeError> {
        let url = self.repo_url("git/trees");
        let body = CreateTreeBody {
            tree: items
                .iter()
                .map(|item| CreateTreeItem {
                    path: &item.path,
                    mode: item.mode.as_str(),
                    kind: item.kind.as_str(),
                    sha: item.oid.as_str(),
                })
                .collect(),
        };
        let created: GitHubSha = self.send(self.client.post(&url).json(&body)).await?;
        parse_oid(created.sha)
    }

    async fn create_commit(
        &self,
        message: &str,
        tree: &Oid,
        parent: &Oid,
    ) -> Result<Oid, ForgeError> {
        let url = self.repo_url("git/commits");
        let body = CreateCommitBody {
            message,
            tree: tree.as_str(),
            parents: vec![parent.as_str()],
        };
        let created: GitHubSha = self.send(self.client.post(&url).json(&body)).await?;
        parse_oid(created.sha)
    }

    async fn update_ref(
        &self,
        branch: &BranchName,
        commit: &Oid,
        force: bool,
    ) -> Result<(), ForgeError> {
        let url = self.repo_url(&format!("git/refs/heads/{}", branch));
        let body = UpdateRefBody {
            sha: commit.as_str(),
            force,
        };
        let result: Result<serde_json::Value, ForgeError> =
            self.send(self.client.patch(&url).json(&body)).await;

        match result {
            Ok(_) => Ok(()),
            Err(ForgeError::ApiError {
                status: 422,
                message,
            }) => Err(ForgeError::RefConflict(message)),
            Err(e) => Err(e),
        }
    }

    async fn delete_path(
        &self,
        path: &str,
        blob: &Oid,
        branch: &BranchName,
        message: &str,
    ) -> Result<DeleteResult, ForgeError> {
        let url = self.contents_url(path)?;
        let body = DeleteContentsBody {
            message,
            sha: blob.as_str(),
            branch: branch.as_str(),
        };
        let result: Result<GitHubDeleteResponse, ForgeError> =
            self.send(self.client.delete(url).json(&body)).await;

        match result {
            Ok(deleted) => Ok(DeleteResult {
                commit: parse_oid(deleted.commit.sha)?,
                tree: parse_oid(deleted.commit.tree.sha)?,
            }),
            Err(ForgeError::ApiError {
                status: 409,
                message,
            }) => Err(ForgeError::RefConflict(message)),
            Err(e) => Err(e),
        }
    }
}

// --------------------------------------------------------------------------
// API Request/Response Types
// --------------------------------------------------------------------------

#[derive(Serialize)]
struct CreateBlobBody<'a> {
    content: &'a str,
    encoding: &'a str,
}

#[derive(Serialize)]
struct CreateTreeBody<'a> {
    tree: Vec<CreateTreeItem<'a>>,
}

#[derive(Serialize)]
struct CreateTreeItem<'a> {
    path: &'a str,
    mode: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    sha: &'a str,
}

#[derive(Serialize)]
struct CreateCommitBody<'a> {
    message: &'a str,
    tree: &'a str,
    parents: Vec<&'a str>,
}

#[derive(Serialize)]
struct UpdateRefBody<'a> {
    sha: &'a str,
    force: bool,
}

#[derive(Serialize)]
struct DeleteContentsBody<'a> {
    message: &'a str,
    sha: &'a str,
    branch: &'a str,
}

/// GitHub error response format.
#[derive(Deserialize)]
struct GitHubErrorResponse {
    message: String,
}

/// Any response where only the created object's sha matters.
#[derive(Deserialize)]
struct GitHubSha {
    sha: String,
}

#[derive(Deserialize)]
struct GitHubBranch {
    commit: GitHubBranchCommit,
}

#[derive(Deserialize)]
struct GitHubBranchCommit {
    sha: String,
    commit: GitHubCommitDetail,
}

#[derive(Deserialize)]
struct GitHubCommitDetail {
    tree: GitHubSha,
}

#[derive(Deserialize)]
struct GitHubTree {
    tree: Vec<GitHubTreeItem>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Deserialize)]
struct GitHubTreeItem {
    path: String,
    mode: String,
    #[serde(rename = "type")]
    kind: String,
    sha: String,
    size: Option<u64>,
}

#[derive(Deserialize)]
struct GitHubBlob {
    content: String,
    encoding: String,
}

#[derive(Deserialize)]
struct GitHubDeleteResponse {
    commit: GitHubDeleteCommit,
}

#[derive(Deserialize)]
struct GitHubDeleteCommit {
    sha: String,
    tree: GitHubSha,
}
