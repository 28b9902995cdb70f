use bakery_publish::config::RemoteSettings;
use bakery_publish::contract::{Credentials, MergeOutcome, PublishAction, Publisher, RemoteHost};
use bakery_publish::error::{PublishError, RemoteError};
use bakery_publish::github::GitHubHost;
use bakery_publish::hooks::PublishHooks;
use bakery_publish::locate::{FileLocator, FileQuery};
use bakery_publish::publish::RemotePublisher;
use serde_json::json;
use std::fs;
use tempfile::tempdir;
use wiremock::matchers::{basic_auth, body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REPO: &str = "/repos/openelections/openelections-results-ny";

fn credentials() -> Credentials {
    Credentials::new("results-bot", "s3cret")
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/user"))
        .and(basic_auth("results-bot", "s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "login": "results-bot" })))
        .mount(server)
        .await;
}

async fn mount_repository(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(REPO))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "full_name": "openelections/openelections-results-ny",
            "default_branch": "master"
        })))
        .mount(server)
        .await;
}

async fn mount_tree(server: &MockServer, entries: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("{REPO}/git/trees/master")))
        .and(query_param("recursive", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sha": "7ree",
            "tree": entries,
            "truncated": false
        })))
        .mount(server)
        .await;
}

fn publisher_for(server: &MockServer, results_dir: &std::path::Path) -> RemotePublisher<GitHubHost> {
    let settings = RemoteSettings {
        api_url: server.uri(),
        ..RemoteSettings::default()
    };
    RemotePublisher::new(
        GitHubHost::new(&settings.api_url).unwrap(),
        credentials(),
        FileLocator::with_results_dir(results_dir),
        settings,
    )
}

#[tokio::test]
async fn publishes_new_file_through_github_api() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_repository(&server).await;
    mount_tree(&server, json!([{ "path": "README.md", "sha": "r", "type": "blob" }])).await;

    Mock::given(method("PUT"))
        .and(path(format!("{REPO}/contents/clean/20140101__ny__precinct.csv")))
        .and(body_json(json!({
            "message": "Create file clean/20140101__ny__precinct.csv",
            "content": "Y291bnR5LHZvdGVzCkFsYmFueSwxMAo=",
            "branch": "master"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "content": { "sha": "b10b", "path": "clean/20140101__ny__precinct.csv" },
            "commit": { "sha": "c0ffee" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("{REPO}/merges")))
        .and(body_json(json!({ "base": "gh-pages", "head": "master" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": "m3rge" })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    fs::write(dir.path().join("20140101__ny__precinct.csv"), "county,votes\nAlbany,10\n").unwrap();

    let report = publisher_for(&server, dir.path())
        .publish(&FileQuery::new("ny"), &PublishHooks::new())
        .await
        .expect("publish should succeed");

    assert_eq!(report.repository, "openelections/openelections-results-ny");
    assert_eq!(report.files.len(), 1);
    assert_eq!(report.files[0].action, PublishAction::Created);
    assert_eq!(report.merge, MergeOutcome::Merged { sha: "m3rge".to_string() });
}

#[tokio::test]
async fn updates_existing_file_with_its_sha() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_repository(&server).await;
    mount_tree(
        &server,
        json!([
            { "path": "clean", "sha": "d1r", "type": "tree" },
            { "path": "clean/20140101__ny__precinct.csv", "sha": "0ld5ha", "type": "blob" }
        ]),
    )
    .await;

    Mock::given(method("PUT"))
        .and(path(format!("{REPO}/contents/clean/20140101__ny__precinct.csv")))
        .and(body_json(json!({
            "message": "Update file clean/20140101__ny__precinct.csv",
            "content": "bmV3IGNvbnRlbnQ=",
            "branch": "master",
            "sha": "0ld5ha"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": { "sha": "n3w" },
            "commit": { "sha": "c0ffee" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("{REPO}/merges")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    fs::write(dir.path().join("20140101__ny__precinct.csv"), "new content").unwrap();

    let report = publisher_for(&server, dir.path())
        .publish(&FileQuery::new("NY"), &PublishHooks::new())
        .await
        .expect("publish should succeed");

    assert_eq!(report.files[0].action, PublishAction::Updated);
    assert_eq!(report.merge, MergeOutcome::UpToDate);
}

#[tokio::test]
async fn bad_credentials_surface_as_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Bad credentials" })),
        )
        .mount(&server)
        .await;

    let host = GitHubHost::new(&server.uri()).unwrap();
    let err = host.login(&credentials()).await.err().expect("login should fail");
    match err {
        RemoteError::Auth(message) => assert_eq!(message, "Bad credentials"),
        other => panic!("expected Auth error, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_repository_surfaces_as_not_found() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/repos/openelections/openelections-results-zz"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let err = publisher_for(&server, dir.path())
        .publish(&FileQuery::new("zz"), &PublishHooks::new())
        .await
        .unwrap_err();

    assert!(
        matches!(err, PublishError::Remote(RemoteError::NotFound(_))),
        "got {err:?}"
    );
}

#[tokio::test]
async fn merge_conflict_surfaces_as_merge_conflict() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_repository(&server).await;
    Mock::given(method("POST"))
        .and(path(format!("{REPO}/merges")))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({ "message": "Merge conflict" })))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let err = publisher_for(&server, dir.path())
        .publish(&FileQuery::new("ny"), &PublishHooks::new())
        .await
        .unwrap_err();

    match err {
        PublishError::Remote(RemoteError::MergeConflict { base, head }) => {
            assert_eq!(base, "gh-pages");
            assert_eq!(head, "master");
        }
        other => panic!("expected MergeConflict, got {other:?}"),
    }
}

#[tokio::test]
async fn unexpected_status_carries_api_message() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_repository(&server).await;
    mount_tree(&server, json!([])).await;
    Mock::given(method("PUT"))
        .and(path(format!("{REPO}/contents/clean/20140101__ny__precinct.csv")))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({ "message": "Invalid request." })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{REPO}/merges")))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": "m" })))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    fs::write(dir.path().join("20140101__ny__precinct.csv"), "x").unwrap();

    let err = publisher_for(&server, dir.path())
        .publish(&FileQuery::new("ny"), &PublishHooks::new())
        .await
        .unwrap_err();

    match err {
        PublishError::Remote(RemoteError::Api { status, message }) => {
            assert_eq!(status, 422);
            assert_eq!(message, "Invalid request.");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}
