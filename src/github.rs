//! # GitHub client
//!
//! Implements the remote contract in [`crate::contract`] against the GitHub REST API:
//!
//! - `GET  /user` validates credentials on login
//! - `GET  /repos/{owner}/{repo}` resolves a repository
//! - `GET  /repos/{owner}/{repo}/git/trees/{branch}?recursive=1` lists every tracked path
//! - `PUT  /repos/{owner}/{repo}/contents/{path}` creates or updates a file
//! - `POST /repos/{owner}/{repo}/merges` merges one branch into another
//!
//! All requests use HTTP basic auth with the publisher's username and secret. The API
//! base URL is configurable so the client can target GitHub Enterprise or a test server.

use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::contract::{
    CommitInfo, Credentials, MergeOutcome, RemoteHost, RemoteRepository, RemoteSession,
    TreeEntry,
};
use crate::error::RemoteError;

const USER_AGENT: &str = concat!("bakery-publish/", env!("CARGO_PKG_VERSION"));
const ACCEPT: &str = "application/vnd.github+json";

/// Connects to a GitHub API endpoint.
#[derive(Debug, Clone)]
pub struct GitHubHost {
    client: Client,
    api_url: Url,
}

impl GitHubHost {
    pub fn new(api_url: &str) -> Result<Self, RemoteError> {
        let api_url = Url::parse(api_url)
            .map_err(|e| RemoteError::Config(format!("invalid API URL {api_url:?}: {e}")))?;
        if api_url.cannot_be_a_base() {
            return Err(RemoteError::Config(format!(
                "API URL {api_url} cannot be used as a base"
            )));
        }
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client, api_url })
    }
}

#[async_trait]
impl RemoteHost for GitHubHost {
    async fn login(
        &self,
        credentials: &Credentials,
    ) -> Result<Box<dyn RemoteSession>, RemoteError> {
        let api = ApiClient {
            client: self.client.clone(),
            api_url: self.api_url.clone(),
            credentials: credentials.clone(),
        };

        let url = api.url(&["user"]);
        let response = api.request(api.client.get(url)).send().await?;
        let response = check(response, "authenticated user").await?;
        let user: UserResponse = decode(response).await?;
        info!(login = %user.login, "Logged in to GitHub");

        Ok(Box::new(GitHubSession { api }))
    }
}

#[derive(Debug, Clone)]
struct ApiClient {
    client: Client,
    api_url: Url,
    credentials: Credentials,
}

impl ApiClient {
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.api_url.clone();
        // cannot_be_a_base was rejected in GitHubHost::new
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .basic_auth(&self.credentials.username, Some(&self.credentials.secret))
            .header(reqwest::header::ACCEPT, ACCEPT)
    }
}

struct GitHubSession {
    api: ApiClient,
}

#[async_trait]
impl RemoteSession for GitHubSession {
    async fn repository(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Box<dyn RemoteRepository>, RemoteError> {
        let url = self.api.url(&["repos", owner, name]);
        let response = self.api.request(self.api.client.get(url)).send().await?;
        let response = check(response, &format!("repository {owner}/{name}")).await?;
        let repo: RepositoryResponse = decode(response).await?;
        debug!(repository = %repo.full_name, "Resolved GitHub repository");

        Ok(Box::new(GitHubRepository {
            api: self.api.clone(),
            owner: owner.to_string(),
            name: name.to_string(),
            full_name: repo.full_name,
        }))
    }
}

/// A repository resolved through [`GitHubHost`].
pub struct GitHubRepository {
    api: ApiClient,
    owner: String,
    name: String,
    full_name: String,
}

impl GitHubRepository {
    fn url(&self, rest: &[&str]) -> Url {
        let mut segments = vec!["repos", self.owner.as_str(), self.name.as_str()];
        segments.extend_from_slice(rest);
        self.api.url(&segments)
    }

    async fn put_contents(&self, path: &str, body: &ContentsRequest<'_>) -> Result<CommitInfo, RemoteError> {
        let mut segments = vec!["contents"];
        segments.extend(path.split('/'));
        let url = self.url(&segments);

        let response = self
            .api
            .request(self.api.client.put(url))
            .json(body)
            .send()
            .await?;
        let response = check(response, &format!("{}:{path}", self.full_name)).await?;
        let result: ContentsResponse = decode(response).await?;

        Ok(CommitInfo {
            commit_sha: result.commit.sha,
            content_sha: result.content.map(|c| c.sha),
        })
    }
}

#[async_trait]
impl RemoteRepository for GitHubRepository {
    fn name(&self) -> String {
        self.full_name.clone()
    }

    async fn tree(&self, branch: &str) -> Result<Vec<TreeEntry>, RemoteError> {
        let mut url = self.url(&["git", "trees", branch]);
        url.query_pairs_mut().append_pair("recursive", "1");

        let response = self.api.request(self.api.client.get(url)).send().await?;
        let response = check(response, &format!("{} tree {branch}", self.full_name)).await?;
        let tree: TreeResponse = decode(response).await?;
        if tree.truncated {
            warn!(repository = %self.full_name, branch, "GitHub truncated the tree listing");
        }

        Ok(tree
            .tree
            .into_iter()
            .map(|e| TreeEntry {
                path: e.path,
                sha: e.sha,
                kind: e.kind,
            })
            .collect())
    }

    async fn create_file(
        &self,
        path: &str,
        message: &str,
        content: &str,
        branch: &str,
    ) -> Result<CommitInfo, RemoteError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(content);
        let body = ContentsRequest {
            message,
            content: &encoded,
            branch,
            sha: None,
        };
        self.put_contents(path, &body).await
    }

    async fn update_file(
        &self,
        path: &str,
        message: &str,
        content: &str,
        sha: &str,
        branch: &str,
    ) -> Result<CommitInfo, RemoteError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(content);
        let body = ContentsRequest {
            message,
            content: &encoded,
            branch,
            sha: Some(sha),
        };
        self.put_contents(path, &body).await
    }

    async fn merge(&self, base: &str, head: &str) -> Result<MergeOutcome, RemoteError> {
        let url = self.url(&["merges"]);
        let response = self
            .api
            .request(self.api.client.post(url))
            .json(&MergeRequest { base, head })
            .send()
            .await?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(MergeOutcome::UpToDate),
            StatusCode::CONFLICT => Err(RemoteError::MergeConflict {
                base: base.to_string(),
                head: head.to_string(),
            }),
            _ => {
                let response =
                    check(response, &format!("{} branches {base}/{head}", self.full_name)).await?;
                let merged: MergeResponse = decode(response).await?;
                Ok(MergeOutcome::Merged { sha: merged.sha })
            }
        }
    }
}

/// Passes successful responses through and maps failures to [`RemoteError`].
async fn check(response: Response, what: &str) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.message)
        .unwrap_or(body);

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::Auth(message),
        StatusCode::NOT_FOUND => RemoteError::NotFound(what.to_string()),
        _ => RemoteError::Api {
            status: status.as_u16(),
            message,
        },
    })
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| RemoteError::Decode(e.to_string()))
}

#[derive(Deserialize)]
struct UserResponse {
    login: String,
}

#[derive(Deserialize)]
struct RepositoryResponse {
    full_name: String,
}

#[derive(Deserialize)]
struct TreeResponse {
    tree: Vec<TreeEntryResponse>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Deserialize)]
struct TreeEntryResponse {
    path: String,
    sha: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Serialize)]
struct ContentsRequest<'a> {
    message: &'a str,
    content: &'a str,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Deserialize)]
struct ContentsResponse {
    content: Option<ShaRef>,
    commit: ShaRef,
}

#[derive(Deserialize)]
struct ShaRef {
    sha: String,
}

#[derive(Serialize)]
struct MergeRequest<'a> {
    base: &'a str,
    head: &'a str,
}

#[derive(Deserialize)]
struct MergeResponse {
    sha: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    message: String,
}
