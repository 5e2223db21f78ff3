//! GitHub contents API backend.
//!
//! Blob tokens are the git blob SHAs GitHub reports for each file.

use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Blob, RemoteStore, StoreError};

/// Public GitHub REST endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const USER_AGENT: &str = concat!("nwl-manager/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
#[error("Invalid GitHub repository URL: {0}")]
pub struct RepoUrlError(pub String);

/// Owner and name of a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLocation {
    pub owner: String,
    pub repo: String,
}

impl RepoLocation {
    /// Parses `https://github.com/<owner>/<repo>[/...]`. Any other scheme
    /// or host is rejected.
    pub fn parse(url: &str) -> Result<Self, RepoUrlError> {
        let rest = url
            .trim()
            .strip_prefix("https://")
            .ok_or_else(|| RepoUrlError(url.to_string()))?;
        let (host, path) = rest.split_once('/').unwrap_or((rest, ""));
        if !host.eq_ignore_ascii_case("github.com") {
            return Err(RepoUrlError(url.to_string()));
        }

        let mut segments = path.split('/').filter(|s| !s.is_empty());
        match (segments.next(), segments.next()) {
            (Some(owner), Some(repo)) => {
                let repo = repo.strip_suffix(".git").unwrap_or(repo);
                if repo.is_empty() {
                    return Err(RepoUrlError(url.to_string()));
                }
                Ok(Self {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            _ => Err(RepoUrlError(url.to_string())),
        }
    }
}

impl std::fmt::Display for RepoLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

#[derive(Debug, Deserialize)]
struct FileResponse {
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DirectoryEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
struct WriteResponse {
    content: WrittenFile,
}

#[derive(Debug, Deserialize)]
struct WrittenFile {
    sha: String,
}

#[derive(Debug, Serialize)]
struct PutBody<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct DeleteBody<'a> {
    message: &'a str,
    sha: &'a str,
}

/// Store backed by one folder tree of a GitHub repository.
///
/// Reads work anonymously (for public repositories); writes need a token and
/// fail with [`StoreError::AuthRequired`] without one.
#[derive(Debug, Clone)]
pub struct GitHubStore {
    http: reqwest::Client,
    api_base: String,
    location: RepoLocation,
    token: Option<String>,
}

impl GitHubStore {
    /// Creates a store for `location`. An empty token counts as no token.
    pub fn new(
        api_base: impl Into<String>,
        location: RepoLocation,
        token: Option<String>,
    ) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            location,
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn location(&self) -> &RepoLocation {
        &self.location
    }

    /// Whether write operations can be attempted.
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Builds the contents API URL for a path, encoding each segment.
    fn contents_url(&self, path: &str) -> String {
        let encoded: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| urlencoding::encode(s).into_owned())
            .collect();

        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base,
            urlencoding::encode(&self.location.owner),
            urlencoding::encode(&self.location.repo),
            encoded.join("/")
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, self.contents_url(path))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");

        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn require_token(&self, operation: &'static str, path: &str) -> Result<(), StoreError> {
        if self.token.is_none() {
            return Err(StoreError::AuthRequired {
                operation,
                path: path.to_string(),
            });
        }
        Ok(())
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        builder: RequestBuilder,
    ) -> Result<Response, StoreError> {
        let response = builder
            .send()
            .await
            .map_err(|e| StoreError::Transport(format!("{} {}: {}", method, path, e)))?;
        tracing::debug!(%method, path, status = %response.status(), "github contents request");
        Ok(response)
    }
}

/// Turns a non-success response into a transport error carrying the body.
async fn unexpected(method: Method, path: &str, response: Response) -> StoreError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    StoreError::Transport(format!(
        "{} {} returned {}: {}",
        method,
        path,
        status,
        body.trim()
    ))
}

fn decode_content(path: &str, file: &FileResponse) -> Result<Vec<u8>, StoreError> {
    match file.encoding.as_deref() {
        None | Some("base64") => {}
        Some(other) => {
            return Err(StoreError::Transport(format!(
                "{} has unsupported content encoding '{}'",
                path, other
            )))
        }
    }

    let cleaned: String = file.content.split_whitespace().collect();
    STANDARD
        .decode(cleaned)
        .map_err(|e| StoreError::Transport(format!("{} has invalid base64 content: {}", path, e)))
}

impl RemoteStore for GitHubStore {
    async fn list(&self, directory: &str) -> Result<Vec<String>, StoreError> {
        let response = self
            .send(Method::GET, directory, self.request(Method::GET, directory))
            .await?;

        if !response.status().is_success() {
            return Err(unexpected(Method::GET, directory, response).await);
        }

        let entries: Vec<DirectoryEntry> = response.json().await.map_err(|e| {
            StoreError::Transport(format!("{} is not a directory listing: {}", directory, e))
        })?;
        Ok(entries.into_iter().map(|entry| entry.name).collect())
    }

    async fn get(&self, path: &str) -> Result<Blob, StoreError> {
        let response = self
            .send(Method::GET, path, self.request(Method::GET, path))
            .await?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => {
                return Err(StoreError::NotFound {
                    path: path.to_string(),
                })
            }
            _ => return Err(unexpected(Method::GET, path, response).await),
        }

        let file: FileResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Transport(format!("{} is not a file: {}", path, e)))?;
        let content = decode_content(path, &file)?;

        Ok(Blob {
            content,
            token: file.sha,
        })
    }

    async fn put(
        &self,
        path: &str,
        content: &[u8],
        expected_token: Option<&str>,
        message: &str,
    ) -> Result<String, StoreError> {
        self.require_token("write", path)?;

        let body = PutBody {
            message,
            content: STANDARD.encode(content),
            sha: expected_token,
        };
        let response = self
            .send(Method::PUT, path, self.request(Method::PUT, path).json(&body))
            .await?;

        match (response.status(), expected_token) {
            (status, _) if status.is_success() => {}
            (StatusCode::NOT_FOUND, _) => {
                return Err(StoreError::NotFound {
                    path: path.to_string(),
                })
            }
            (StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY, Some(expected)) => {
                return Err(StoreError::Conflict {
                    path: path.to_string(),
                    expected: expected.to_string(),
                    actual: None,
                })
            }
            // Creating without a sha over an existing file is rejected as 422.
            (StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY, None) => {
                return Err(StoreError::AlreadyExists {
                    path: path.to_string(),
                })
            }
            _ => return Err(unexpected(Method::PUT, path, response).await),
        }

        let written: WriteResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Transport(format!("unexpected PUT response: {}", e)))?;
        tracing::info!(path, sha = %written.content.sha, "wrote file");
        Ok(written.content.sha)
    }

    async fn delete(
        &self,
        path: &str,
        expected_token: &str,
        message: &str,
    ) -> Result<(), StoreError> {
        self.require_token("delete", path)?;

        let body = DeleteBody {
            message,
            sha: expected_token,
        };
        let response = self
            .send(
                Method::DELETE,
                path,
                self.request(Method::DELETE, path).json(&body),
            )
            .await?;

        match response.status() {
            status if status.is_success() => {
                tracing::info!(path, "deleted file");
                Ok(())
            }
            StatusCode::NOT_FOUND => Err(StoreError::NotFound {
                path: path.to_string(),
            }),
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => Err(StoreError::Conflict {
                path: path.to_string(),
                expected: expected_token.to_string(),
                actual: None,
            }),
            _ => Err(unexpected(Method::DELETE, path, response).await),
        }
    }
}
