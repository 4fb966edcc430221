//! Integration tests for the GitHub star source.
//!
//! The GraphQL client runs against a local wiremock server; resolution is
//! exercised with both the mock and the real client. Live GitHub API tests
//! are behind the `live_github_tests` feature flag.

use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use starcast::core::model::{Episode, Podcast, Reference, StarGazer};
use starcast::core::types::RepoSlug;
use starcast::forge::github::GitHubForge;
use starcast::forge::mock::{FailOn, MockForge};
use starcast::forge::{resolve_podcast, Forge, ForgeError, RepositoryInfo};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn repository_body() -> serde_json::Value {
    json!({
        "data": {
            "repository": {
                "nameWithOwner": "psf/black",
                "url": "https://github.com/psf/black",
                "createdAt": "2018-03-14T19:54:45Z",
                "isFork": false,
                "stargazerCount": 3,
                "primaryLanguage": { "name": "Python" }
            }
        }
    })
}

fn stargazer_page(edges: &[(&str, &str)], next: Option<&str>) -> serde_json::Value {
    let edges: Vec<_> = edges
        .iter()
        .map(|(at, id)| json!({ "starredAt": at, "node": { "id": id } }))
        .collect();
    json!({
        "data": {
            "repository": {
                "stargazers": {
                    "pageInfo": { "endCursor": next, "hasNextPage": next.is_some() },
                    "edges": edges
                }
            }
        }
    })
}

async fn forge_for(server: &MockServer) -> GitHubForge {
    GitHubForge::new(Some("test-token".into())).with_endpoint(server.uri())
}

// =============================================================================
// GraphQL client
// =============================================================================

mod graphql_client {
    use super::*;

    #[tokio::test]
    async fn fetch_repository_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_string_contains("nameWithOwner"))
            .respond_with(ResponseTemplate::new(200).set_body_json(repository_body()))
            .expect(1)
            .mount(&server)
            .await;

        let forge = forge_for(&server).await;
        let slug = RepoSlug::parse("psf/black").unwrap();
        let info = forge.fetch_repository(&slug).await.unwrap();

        assert_eq!(info.slug, slug);
        assert_eq!(info.date_created, date(2018, 3, 14));
        assert_eq!(info.primary_language.as_deref(), Some("Python"));
        assert!(!info.is_fork);
        assert_eq!(info.stargazer_count, 3);
    }

    #[tokio::test]
    async fn stargazers_follow_cursor_across_pages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "variables": { "after": null } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(stargazer_page(
                &[("2019-01-01T10:00:00Z", "u1"), ("2019-01-01T23:59:59Z", "u2")],
                Some("c1"),
            )))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "variables": { "after": "c1" } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(stargazer_page(
                &[("2019-01-03T00:00:00Z", "u3")],
                None,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let forge = forge_for(&server).await.with_page_size(2);
        let slug = RepoSlug::parse("psf/black").unwrap();
        let events = forge.fetch_stargazers(&slug).await.unwrap();

        assert_eq!(
            events,
            vec![
                StarGazer {
                    date_starred: date(2019, 1, 1),
                    user_id: "u1".into()
                },
                StarGazer {
                    date_starred: date(2019, 1, 1),
                    user_id: "u2".into()
                },
                StarGazer {
                    date_starred: date(2019, 1, 3),
                    user_id: "u3".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn page_size_sent_as_first() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "variables": { "first": 100 } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(stargazer_page(&[], None)))
            .expect(1)
            .mount(&server)
            .await;

        let forge = forge_for(&server).await.with_page_size(500);
        let slug = RepoSlug::parse("a/b").unwrap();
        assert!(forge.fetch_stargazers(&slug).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn graphql_not_found_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "repository": null },
                "errors": [{
                    "type": "NOT_FOUND",
                    "message": "Could not resolve to a Repository with the name 'a/gone'."
                }]
            })))
            .mount(&server)
            .await;

        let forge = forge_for(&server).await;
        let result = forge
            .fetch_repository(&RepoSlug::parse("a/gone").unwrap())
            .await;
        assert!(matches!(result, Err(ForgeError::NotFound(_))));
    }

    #[tokio::test]
    async fn null_repository_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "data": { "repository": null } })),
            )
            .mount(&server)
            .await;

        let forge = forge_for(&server).await;
        assert_eq!(
            forge
                .fetch_repository(&RepoSlug::parse("a/gone").unwrap())
                .await,
            Err(ForgeError::NotFound("a/gone".into()))
        );
    }

    #[tokio::test]
    async fn other_graphql_errors_are_api_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": [{ "message": "Field 'nope' doesn't exist" }]
            })))
            .mount(&server)
            .await;

        let forge = forge_for(&server).await;
        let result = forge.fetch_repository(&RepoSlug::parse("a/b").unwrap()).await;
        assert!(matches!(result, Err(ForgeError::ApiError { status: 200, .. })));
    }

    #[tokio::test]
    async fn missing_token_fails_before_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let forge = GitHubForge::new(None).with_endpoint(server.uri());
        assert_eq!(
            forge.fetch_repository(&RepoSlug::parse("a/b").unwrap()).await,
            Err(ForgeError::AuthRequired)
        );
    }
}

// =============================================================================
// HTTP status mapping
// =============================================================================

mod status_mapping {
    use super::*;

    async fn fetch_with_status(template: ResponseTemplate) -> Result<RepositoryInfo, ForgeError> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(template)
            .mount(&server)
            .await;
        forge_for(&server)
            .await
            .fetch_repository(&RepoSlug::parse("a/b").unwrap())
            .await
    }

    #[tokio::test]
    async fn unauthorized() {
        let result = fetch_with_status(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Bad credentials" })),
        )
        .await;
        assert!(matches!(result, Err(ForgeError::AuthFailed(_))));
    }

    #[tokio::test]
    async fn forbidden_with_exhausted_quota_is_rate_limited() {
        let result = fetch_with_status(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .set_body_json(json!({ "message": "API rate limit exceeded" })),
        )
        .await;
        assert_eq!(result, Err(ForgeError::RateLimited));
    }

    #[tokio::test]
    async fn forbidden_otherwise_is_auth_failure() {
        let result = fetch_with_status(
            ResponseTemplate::new(403).set_body_json(json!({ "message": "Resource not accessible" })),
        )
        .await;
        match result {
            Err(ForgeError::AuthFailed(message)) => {
                assert!(message.contains("Resource not accessible"))
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[tokio::test]
    async fn not_found() {
        let result = fetch_with_status(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })),
        )
        .await;
        assert_eq!(result, Err(ForgeError::NotFound("Not Found".into())));
    }

    #[tokio::test]
    async fn too_many_requests() {
        let result = fetch_with_status(ResponseTemplate::new(429)).await;
        assert_eq!(result, Err(ForgeError::RateLimited));
    }

    #[tokio::test]
    async fn server_error() {
        let result = fetch_with_status(ResponseTemplate::new(502)).await;
        match result {
            Err(ForgeError::ApiError { status, message }) => {
                assert_eq!(status, 502);
                assert!(message.contains("server error"));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }
}

// =============================================================================
// Resolution
// =============================================================================

mod resolution {
    use super::*;

    fn podcast(urls: &[&str]) -> Podcast {
        Podcast {
            name: "Talk Python".into(),
            author: "Michael Kennedy".into(),
            url: "https://talkpython.fm/episodes/all".into(),
            start_date: date(2015, 3, 1),
            manually_modified: None,
            episodes: vec![Episode {
                number: 200,
                title: "Black".into(),
                url: None,
                guests: vec![],
                date_published: date(2019, 2, 1),
                manually_modified: None,
                references: urls
                    .iter()
                    .map(|u| Reference {
                        text: String::new(),
                        url: (*u).into(),
                        date_referenced: None,
                        manually_modified: None,
                        repository: None,
                    })
                    .collect(),
            }],
        }
    }

    #[tokio::test]
    async fn resolve_through_graphql_client() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("nameWithOwner"))
            .respond_with(ResponseTemplate::new(200).set_body_json(repository_body()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("stargazers("))
            .respond_with(ResponseTemplate::new(200).set_body_json(stargazer_page(
                &[
                    ("2019-01-01T10:00:00Z", "u1"),
                    ("2019-01-02T10:00:00Z", "u2"),
                    ("2019-02-02T10:00:00Z", "u3"),
                ],
                None,
            )))
            .mount(&server)
            .await;

        let forge = forge_for(&server).await;
        let (pod, report) =
            resolve_podcast(podcast(&["https://github.com/psf/black"]), &forge, date(2020, 1, 1))
                .await;

        assert_eq!(report.resolved, 1);
        assert!(report.count_mismatches.is_empty());
        let repo = pod.episodes[0].references[0].repository.as_ref().unwrap();
        assert_eq!(repo.owner(), "psf");
        assert_eq!(repo.stargazers.len(), 3);
        assert_eq!(repo.date_requested, date(2020, 1, 1));
    }

    #[tokio::test]
    async fn mock_failure_leaves_reference_unresolved() {
        let forge = MockForge::new().fail_on(FailOn::FetchStargazers(ForgeError::RateLimited));
        let slug = RepoSlug::parse("psf/black").unwrap();
        let forge = forge.with_repository(
            RepositoryInfo {
                slug: slug.clone(),
                url: slug.url(),
                date_created: date(2018, 3, 14),
                primary_language: None,
                is_fork: false,
                stargazer_count: 0,
            },
            vec![],
        );

        let (pod, report) =
            resolve_podcast(podcast(&["https://github.com/psf/black"]), &forge, date(2020, 1, 1))
                .await;

        assert!(pod.episodes[0].references[0].repository.is_none());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].error, ForgeError::RateLimited);
    }
}

#[cfg(feature = "live_github_tests")]
mod live_tests {
    use super::*;

    fn get_test_token() -> Option<String> {
        std::env::var("GITHUB_TOKEN").ok()
    }

    #[tokio::test]
    async fn live_fetch_known_repository() {
        let Some(token) = get_test_token() else {
            eprintln!("Skipping: GITHUB_TOKEN not set");
            return;
        };

        let forge = GitHubForge::new(Some(token));
        let info = forge
            .fetch_repository(&RepoSlug::parse("rust-lang/rust").unwrap())
            .await
            .unwrap();
        assert_eq!(info.date_created, date(2010, 6, 16));
        assert!(info.stargazer_count > 0);
    }

    #[tokio::test]
    async fn live_nonexistent_repository() {
        let Some(token) = get_test_token() else {
            eprintln!("Skipping: GITHUB_TOKEN not set");
            return;
        };

        let forge = GitHubForge::new(Some(token));
        let result = forge
            .fetch_repository(&RepoSlug::parse("definitely-not-a-user-xyz/nope-123").unwrap())
            .await;
        assert!(result.is_err());
    }
}
