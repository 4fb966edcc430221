//! forge::github
//!
//! GitHub forge implementation using the GraphQL API.
//!
//! # Design
//!
//! Two queries cover everything the pipeline needs:
//! - repository metadata (creation date, language, fork flag, star count)
//! - the stargazer connection, paged `first: 100` and ordered by
//!   `STARRED_AT ASC`, following `pageInfo.endCursor` while
//!   `hasNextPage` is set
//!
//! GraphQL timestamps are truncated to their UTC calendar date.
//!
//! # Rate Limiting
//!
//! GitHub has rate limits. This implementation:
//! - Returns `ForgeError::RateLimited` when limits are hit
//! - Does not implement automatic retry (caller's responsibility)
//!
//! # Example
//!
//! ```ignore
//! use starcast::forge::github::GitHubForge;
//! use starcast::forge::Forge;
//!
//! let forge = GitHubForge::new(Some(token));
//! let info = forge.fetch_repository(&slug).await?;
//! let stars = forge.fetch_stargazers(&slug).await?;
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::traits::{Forge, ForgeError, RepositoryInfo};
use crate::core::model::StarGazer;
use crate::core::types::RepoSlug;

/// Default GitHub GraphQL endpoint.
pub const DEFAULT_GRAPHQL_ENDPOINT: &str = "https://api.github.com/graphql";

/// Largest page GitHub serves for a connection.
pub const MAX_PAGE_SIZE: u32 = 100;

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "starcast-cli";

const REPOSITORY_QUERY: &str = r#"query($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) {
    nameWithOwner
    url
    createdAt
    isFork
    stargazerCount
    primaryLanguage { name }
  }
}"#;

const STARGAZERS_QUERY: &str = r#"query($owner: String!, $name: String!, $first: Int!, $after: String) {
  repository(owner: $owner, name: $name) {
    stargazers(first: $first, after: $after, orderBy: {field: STARRED_AT, direction: ASC}) {
      pageInfo { endCursor hasNextPage }
      edges { starredAt node { id } }
    }
  }
}"#;

/// GitHub forge implementation.
pub struct GitHubForge {
    /// HTTP client for making requests
    client: Client,
    /// Personal access token
    token: Option<String>,
    /// GraphQL endpoint (configurable for GitHub Enterprise and tests)
    endpoint: String,
    /// Stargazers per page
    page_size: u32,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for GitHubForge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubForge")
            .field("has_token", &self.token.is_some())
            .field("endpoint", &self.endpoint)
            .field("page_size", &self.page_size)
            .finish()
    }
}

impl GitHubForge {
    /// Create a forge against the public GitHub API.
    pub fn new(token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            token,
            endpoint: DEFAULT_GRAPHQL_ENDPOINT.to_string(),
            page_size: MAX_PAGE_SIZE,
        }
    }

    /// Use a different GraphQL endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the stargazer page size, clamped to `1..=100`.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Build common headers for API requests.
    fn headers(&self) -> Result<HeaderMap, ForgeError> {
        let token = self.token.as_deref().ok_or(ForgeError::AuthRequired)?;
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ForgeError::AuthFailed("token contains invalid characters".into()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        Ok(headers)
    }

    /// Run a GraphQL query and return its `data`.
    async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, ForgeError> {
        let body = serde_json::json!({
            "query": query,
            "variables": variables,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_from_response(response, status).await);
        }

        let result: GraphQLResponse<T> = response.json().await.map_err(|e| ForgeError::ApiError {
            status: status.as_u16(),
            message: format!("Failed to parse GraphQL response: {}", e),
        })?;

        if let Some(error) = result.errors.and_then(|errors| errors.into_iter().next()) {
            return Err(match error.kind.as_deref() {
                Some("NOT_FOUND") => ForgeError::NotFound(error.message),
                Some("RATE_LIMITED") => ForgeError::RateLimited,
                _ => ForgeError::ApiError {
                    status: status.as_u16(),
                    message: error.message,
                },
            });
        }

        result.data.ok_or_else(|| ForgeError::ApiError {
            status: status.as_u16(),
            message: "GraphQL response has no data".into(),
        })
    }

    /// Map a non-success HTTP response to an error.
    async fn error_from_response(response: Response, status: StatusCode) -> ForgeError {
        let rate_limit_exhausted = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim() == "0");

        // Try to get error message from body
        let message = match response.json::<GitHubErrorResponse>().await {
            Ok(err) => err.message,
            Err(_) => "Unknown error".to_string(),
        };

        match status {
            StatusCode::UNAUTHORIZED => ForgeError::AuthFailed("Invalid or expired token".into()),
            StatusCode::FORBIDDEN if rate_limit_exhausted => ForgeError::RateLimited,
            StatusCode::FORBIDDEN => ForgeError::AuthFailed(format!("Permission denied: {}", message)),
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

#[async_trait]
impl Forge for GitHubForge {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn fetch_repository(&self, slug: &RepoSlug) -> Result<RepositoryInfo, ForgeError> {
        let data: RepositoryData = self
            .graphql(
                REPOSITORY_QUERY,
                serde_json::json!({ "owner": slug.owner(), "name": slug.name() }),
            )
            .await?;

        let node = data
            .repository
            .ok_or_else(|| ForgeError::NotFound(slug.to_string()))?;
        Ok(node.into_info(slug))
    }

    async fn fetch_stargazers(&self, slug: &RepoSlug) -> Result<Vec<StarGazer>, ForgeError> {
        let mut events = Vec::new();
        let mut cursor: Option<String> = None;
        let mut page = 0usize;

        loop {
            let data: StargazersData = self
                .graphql(
                    STARGAZERS_QUERY,
                    serde_json::json!({
                        "owner": slug.owner(),
                        "name": slug.name(),
                        "first": self.page_size,
                        "after": cursor,
                    }),
                )
                .await?;

            let connection = data
                .repository
                .ok_or_else(|| ForgeError::NotFound(slug.to_string()))?
                .stargazers;

            page += 1;
            events.extend(connection.edges.into_iter().map(|edge| StarGazer {
                date_starred: edge.starred_at.date_naive(),
                user_id: edge.node.id,
            }));
            debug!(%slug, page, fetched = events.len(), "fetched stargazer page");

            match connection.page_info {
                PageInfo {
                    has_next_page: true,
                    end_cursor: Some(next),
                } => cursor = Some(next),
                _ => break,
            }
        }

        Ok(events)
    }
}

// GitHub API response types

#[derive(Deserialize)]
struct GitHubErrorResponse {
    message: String,
}

/// GraphQL response wrapper.
#[derive(Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLError>>,
}

/// GraphQL error format.
#[derive(Deserialize)]
struct GraphQLError {
    message: String,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Deserialize)]
struct RepositoryData {
    repository: Option<RepositoryNode>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryNode {
    name_with_owner: String,
    url: String,
    created_at: DateTime<Utc>,
    is_fork: bool,
    stargazer_count: u64,
    primary_language: Option<LanguageNode>,
}

#[derive(Deserialize)]
struct LanguageNode {
    name: String,
}

impl RepositoryNode {
    /// Convert to domain metadata. Keeps the requested slug if GitHub's
    /// canonical name cannot be parsed.
    fn into_info(self, requested: &RepoSlug) -> RepositoryInfo {
        RepositoryInfo {
            slug: RepoSlug::parse(&self.name_with_owner).unwrap_or_else(|_| requested.clone()),
            url: self.url,
            date_created: self.created_at.date_naive(),
            primary_language: self.primary_language.map(|l| l.name),
            is_fork: self.is_fork,
            stargazer_count: self.stargazer_count,
        }
    }
}

#[derive(Deserialize)]
struct StargazersData {
    repository: Option<StargazerRepository>,
}

#[derive(Deserialize)]
struct StargazerRepository {
    stargazers: StargazerConnection,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StargazerConnection {
    page_info: PageInfo,
    edges: Vec<StargazerEdge>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    end_cursor: Option<String>,
    has_next_page: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StargazerEdge {
    starred_at: DateTime<Utc>,
    node: UserNode,
}

#[derive(Deserialize)]
struct UserNode {
    id: String,
}
