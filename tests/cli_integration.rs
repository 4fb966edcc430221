//! Integration tests for the starcast binary.
//!
//! Every run gets its own HOME and config locations so the developer's own
//! configuration never leaks in.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use starcast::core::model::Podcast;

/// Get a command for running starcast inside `dir`.
fn starcast(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("starcast").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir.join("home"))
        .env("XDG_CONFIG_HOME", dir.join("xdg"))
        .env("STARCAST_CONFIG", dir.join("no-such-config.toml"))
        .env_remove("RUST_LOG")
        .env_remove("GITHUB_TOKEN");
    cmd
}

fn resolved_podcast() -> serde_json::Value {
    json!({
        "name": "Example Cast",
        "start_date": "2019-01-01",
        "episodes": [{
            "number": 7,
            "title": "Formatting, again",
            "date_published": "2019-06-01",
            "references": [{
                "url": "https://github.com/psf/black",
                "repository": {
                    "slug": "psf/black",
                    "url": "https://github.com/psf/black",
                    "date_created": "2019-01-01",
                    "primary_language": "Python",
                    "date_requested": "2019-01-10",
                    "stargazer_count": 1,
                    "stargazers": [{ "date_starred": "2019-01-05", "user_id": "u1" }]
                }
            }]
        }]
    })
}

fn unresolved_podcast() -> serde_json::Value {
    json!({
        "name": "Example Cast",
        "start_date": "2019-01-01",
        "episodes": [{
            "number": 1,
            "title": "Pilot",
            "date_published": "2019-06-01",
            "references": [
                { "url": "https://github.com/psf/black" },
                { "url": "https://example.com" }
            ]
        }]
    })
}

fn write_json(dir: &Path, name: &str, value: &serde_json::Value) {
    fs::write(dir.join(name), serde_json::to_string_pretty(value).unwrap()).unwrap();
}

#[test]
fn help_flag_works() {
    let dir = TempDir::new().unwrap();
    starcast(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("star-history"));
}

#[test]
fn version_flag_works() {
    let dir = TempDir::new().unwrap();
    starcast(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("starcast"));
}

mod expand_command {
    use super::*;

    #[test]
    fn csv_to_stdout() {
        let dir = TempDir::new().unwrap();
        write_json(dir.path(), "pod.json", &resolved_podcast());

        // floor = 365 + (2019-01-10 - 2019-01-01) = 374 days
        let output = starcast(dir.path())
            .args(["expand", "pod.json"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let text = String::from_utf8(output).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("date,accumulated_count,daily_delta,"));
        assert_eq!(lines.count(), 374);
        // The title contains a comma and is quoted
        assert!(text.contains("\"Formatting, again\""));
    }

    #[test]
    fn jsonl_to_file_with_backfill_override() {
        let dir = TempDir::new().unwrap();
        write_json(dir.path(), "pod.json", &resolved_podcast());

        starcast(dir.path())
            .args([
                "expand",
                "pod.json",
                "--format",
                "jsonl",
                "-o",
                "rows.jsonl",
                "--backfill-days",
                "0",
            ])
            .assert()
            .success()
            .stderr(predicate::str::contains("Wrote 9 rows"));

        let text = fs::read_to_string(dir.path().join("rows.jsonl")).unwrap();
        assert_eq!(text.lines().count(), 9);
        let last: serde_json::Value = serde_json::from_str(text.lines().last().unwrap()).unwrap();
        assert_eq!(last["date"], "2019-01-10");
        assert_eq!(last["accumulated_count"], 1);
        assert_eq!(last["repository_primary_language"], "Python");
    }

    #[test]
    fn quiet_suppresses_summary() {
        let dir = TempDir::new().unwrap();
        write_json(dir.path(), "pod.json", &resolved_podcast());

        starcast(dir.path())
            .args(["--quiet", "expand", "pod.json", "-o", "rows.csv"])
            .assert()
            .success()
            .stderr(predicate::str::is_empty());
    }

    #[test]
    fn project_config_applies() {
        let dir = TempDir::new().unwrap();
        write_json(dir.path(), "pod.json", &resolved_podcast());
        fs::create_dir_all(dir.path().join(".starcast")).unwrap();
        fs::write(
            dir.path().join(".starcast/config.toml"),
            "[expand]\nbackfill_days = 0\n",
        )
        .unwrap();

        starcast(dir.path())
            .args(["expand", "pod.json", "-o", "rows.csv"])
            .assert()
            .success();
        let text = fs::read_to_string(dir.path().join("rows.csv")).unwrap();
        assert_eq!(text.lines().count(), 10);
    }

    #[test]
    fn missing_input_fails() {
        let dir = TempDir::new().unwrap();
        starcast(dir.path())
            .args(["expand", "nope.json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to read podcast"));
    }

    #[test]
    fn negative_backfill_rejected() {
        let dir = TempDir::new().unwrap();
        write_json(dir.path(), "pod.json", &resolved_podcast());
        starcast(dir.path())
            .args(["expand", "pod.json", "--backfill-days=-1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("must not be negative"));
    }

    #[test]
    fn oversized_backfill_rejected() {
        let dir = TempDir::new().unwrap();
        write_json(dir.path(), "pod.json", &resolved_podcast());
        starcast(dir.path())
            .args(["expand", "pod.json", "--backfill-days", "9223372036854775807"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("must be at most 36500"));
    }
}

mod dataset_command {
    use super::*;

    #[test]
    fn writes_three_splits() {
        let dir = TempDir::new().unwrap();
        write_json(dir.path(), "pod.json", &resolved_podcast());

        starcast(dir.path())
            .args([
                "dataset",
                "pod.json",
                "--out-dir",
                "data",
                "--cutoff",
                "2020-01-01",
            ])
            .assert()
            .success()
            .stderr(predicate::str::contains("training.csv"));

        for split in ["training", "validation", "test"] {
            assert!(dir.path().join(format!("data/{}.csv", split)).exists());
        }
        // A single episode is all training. The snapshot predates the
        // mention, so only pre-mention days survive the window.
        let training = fs::read_to_string(dir.path().join("data/training.csv")).unwrap();
        assert!(training.lines().count() > 1);
        assert_eq!(fs::read_to_string(dir.path().join("data/test.csv")).unwrap(), "");
    }

    #[test]
    fn invalid_fraction_fails() {
        let dir = TempDir::new().unwrap();
        write_json(dir.path(), "pod.json", &resolved_podcast());

        starcast(dir.path())
            .args([
                "dataset",
                "pod.json",
                "--out-dir",
                "data",
                "--holdout-fraction",
                "0.7",
            ])
            .assert()
            .failure()
            .stderr(predicate::str::contains("fraction"));
    }
}

mod config_command {
    use super::*;

    #[test]
    fn list_shows_defaults() {
        let dir = TempDir::new().unwrap();
        starcast(dir.path())
            .args(["config", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("expand.backfill_days = 365"))
            .stdout(predicate::str::contains("github.token_env = GITHUB_TOKEN"))
            .stdout(predicate::str::contains("dataset.anchor_date = 2019-01-01"));
    }

    #[test]
    fn set_then_get_project_value() {
        let dir = TempDir::new().unwrap();
        starcast(dir.path())
            .args(["config", "set", "dataset.holdout_fraction", "0.1"])
            .assert()
            .success();
        assert!(dir.path().join(".starcast/config.toml").exists());

        starcast(dir.path())
            .args(["config", "get", "dataset.holdout_fraction"])
            .assert()
            .success()
            .stdout("0.1\n");

        starcast(dir.path())
            .args(["config", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("dataset.holdout_fraction = 0.1  # project"));
    }

    #[test]
    fn set_global_writes_home_config() {
        let dir = TempDir::new().unwrap();
        starcast(dir.path())
            .args(["config", "set", "--global", "github.page_size", "50"])
            .assert()
            .success();

        let text = fs::read_to_string(dir.path().join("home/.starcast/config.toml")).unwrap();
        assert!(text.contains("page_size = 50"));
        assert!(!dir.path().join(".starcast/config.toml").exists());

        starcast(dir.path())
            .args(["config", "get", "github.page_size"])
            .assert()
            .success()
            .stdout("50\n");
    }

    #[test]
    fn unknown_key_fails() {
        let dir = TempDir::new().unwrap();
        starcast(dir.path())
            .args(["config", "get", "expand.nope"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unknown configuration key"));
    }

    #[test]
    fn invalid_value_fails() {
        let dir = TempDir::new().unwrap();
        starcast(dir.path())
            .args(["config", "set", "expand.backfill_days", "--", "-3"])
            .assert()
            .failure();
        assert!(!dir.path().join(".starcast/config.toml").exists());
    }
}

mod fetch_command {
    use super::*;

    #[test]
    fn requires_token() {
        let dir = TempDir::new().unwrap();
        write_json(dir.path(), "pod.json", &unresolved_podcast());

        starcast(dir.path())
            .args(["fetch", "pod.json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No GitHub token found"));
    }

    #[tokio::test]
    async fn resolves_against_graphql_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("nameWithOwner"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "repository": {
                    "nameWithOwner": "psf/black",
                    "url": "https://github.com/psf/black",
                    "createdAt": "2018-03-14T19:54:45Z",
                    "isFork": false,
                    "stargazerCount": 1,
                    "primaryLanguage": { "name": "Python" }
                }}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("stargazers("))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "repository": { "stargazers": {
                    "pageInfo": { "endCursor": null, "hasNextPage": false },
                    "edges": [{ "starredAt": "2019-01-01T00:00:00Z", "node": { "id": "u1" } }]
                }}}
            })))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        write_json(dir.path(), "pod.json", &unresolved_podcast());
        let endpoint = server.uri();

        starcast(dir.path())
            .env("GITHUB_TOKEN", "test-token")
            .args([
                "fetch",
                "pod.json",
                "-o",
                "resolved.json",
                "--endpoint",
                endpoint.as_str(),
                "--requested-on",
                "2020-01-01",
            ])
            .assert()
            .success();

        let podcast = Podcast::read_from(&dir.path().join("resolved.json")).unwrap();
        let repo = podcast.episodes[0].references[0]
            .repository
            .as_ref()
            .unwrap();
        assert_eq!(repo.stargazers.len(), 1);
        assert_eq!(repo.date_requested.to_string(), "2020-01-01");
        assert!(podcast.episodes[0].references[1].repository.is_none());
    }

    #[tokio::test]
    async fn strict_fails_on_unresolved_references() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        write_json(dir.path(), "pod.json", &unresolved_podcast());
        let endpoint = server.uri();

        starcast(dir.path())
            .env("GITHUB_TOKEN", "test-token")
            .args(["fetch", "pod.json", "--strict", "--endpoint", endpoint.as_str()])
            .assert()
            .failure()
            .stderr(predicate::str::contains("could not be resolved"));
    }
}
