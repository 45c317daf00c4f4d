//! Integration tests for content sources
//!
//! `GitHubSource` runs against a local wiremock server shaped like the
//! GitHub REST API and raw-content host. `LocalSource` runs against a
//! temporary checkout.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p solmap-source --test integration_tests
//! ```

mod fixtures;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use solmap_core::GitHubConfig;
use solmap_source::{
    list_solution_json_paths, list_solutions, ContentSource, FetchError, FetchStage, GitHubSource, LocalSource,
    MockSourceBuilder, RepositoryRef,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Helper Functions
// =============================================================================

fn repo() -> RepositoryRef {
    RepositoryRef::new(fixtures::OWNER, fixtures::REPO)
}

fn github_source(server: &MockServer) -> GitHubSource {
    let config = GitHubConfig {
        api_base_url: server.uri(),
        raw_base_url: server.uri(),
        token_env: "SOLMAP_INTEGRATION_TOKEN_NEVER_SET".to_string(),
        ..GitHubConfig::default()
    };
    GitHubSource::from_config(&config).unwrap()
}

async fn mount_json(server: &MockServer, route: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_tree(server: &MockServer, truncated: bool) {
    mount_json(
        server,
        "/repos/Azure/Azure-Sentinel/branches/master",
        fixtures::branch_response(fixtures::TREE_SHA),
    )
    .await;

    Mock::given(method("GET"))
        .and(path(format!("/repos/Azure/Azure-Sentinel/git/trees/{}", fixtures::TREE_SHA)))
        .and(query_param("recursive", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::tree_response(truncated)))
        .mount(server)
        .await;
}

fn write_checkout(root: &std::path::Path) {
    for (rel, value) in fixtures::solution_files() {
        let file = root.join(rel);
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(file, value.to_string()).unwrap();
    }
    std::fs::create_dir_all(root.join("Solutions/Empty")).unwrap();
    std::fs::write(root.join("Solutions/README.md"), "# Solutions").unwrap();
    std::fs::create_dir_all(root.join(".git")).unwrap();
    std::fs::write(root.join(".git/config.json"), "{}").unwrap();
}

// =============================================================================
// GitHub Source Tests
// =============================================================================

#[tokio::test]
async fn test_github_list_solutions_keeps_directories_sorted() {
    let server = MockServer::start().await;
    mount_json(&server, "/repos/Azure/Azure-Sentinel/contents/Solutions", fixtures::contents_response()).await;

    let names = list_solutions(&github_source(&server), &repo(), "Solutions").await.unwrap();
    assert_eq!(names, vec!["apache", "Contoso", "Zscaler"]);
}

#[tokio::test]
async fn test_github_contents_error_names_stage() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/Azure/Azure-Sentinel/contents/Solutions"))
        .respond_with(ResponseTemplate::new(403).set_body_string("API rate limit exceeded"))
        .mount(&server)
        .await;

    let err = list_solutions(&github_source(&server), &repo(), "Solutions").await.unwrap_err();
    assert_eq!(err.to_string(), "GitHub API error 403: API rate limit exceeded");
}

#[tokio::test]
async fn test_github_solution_json_paths() {
    let server = MockServer::start().await;
    mount_tree(&server, false).await;

    let listing = list_solution_json_paths(&github_source(&server), &repo(), "master", "Solutions", "Contoso")
        .await
        .unwrap();

    assert_eq!(
        listing.paths,
        vec![
            "Solutions/Contoso/Workbooks/Overview.JSON",
            "Solutions/Contoso/Data Connectors/ContosoCCF.json",
            "Solutions/Contoso/Data Connectors/dcr.json",
            "Solutions/Contoso/Package/mainTemplate.json",
        ]
    );
    assert!(!listing.truncated);
}

#[tokio::test]
async fn test_github_truncated_tree_is_reported() {
    let server = MockServer::start().await;
    mount_tree(&server, true).await;

    let listing = list_solution_json_paths(&github_source(&server), &repo(), "master", "Solutions", "Contoso")
        .await
        .unwrap();
    assert!(listing.truncated);
}

#[tokio::test]
async fn test_github_branch_without_tree_sha() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/repos/Azure/Azure-Sentinel/branches/master",
        json!({"name": "master", "commit": {"sha": "abc"}}),
    )
    .await;

    let err = github_source(&server).resolve_tree_root(&repo(), "master").await.unwrap_err();
    assert_eq!(err, FetchError::InvalidResponse("Could not resolve branch tree SHA.".to_string()));
}

#[tokio::test]
async fn test_github_missing_branch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/Azure/Azure-Sentinel/branches/nope"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Branch not found"))
        .mount(&server)
        .await;

    let err = github_source(&server).resolve_tree_root(&repo(), "nope").await.unwrap_err();
    assert!(matches!(err, FetchError::Status { stage: FetchStage::BranchApi, status: 404, .. }));
    assert!(err.to_string().starts_with("Branch API error 404"));
}

#[tokio::test]
async fn test_github_trees_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/Azure/Azure-Sentinel/git/trees/deadbeef"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = github_source(&server).list_tree(&repo(), "deadbeef").await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert!(err.to_string().contains("Trees API error 500"));
}

#[tokio::test]
async fn test_github_fetch_raw_encodes_path_segments() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Azure/Azure-Sentinel/master/Solutions/Contoso/Data%20Connectors/ContosoCCF.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"kind":"Customizable"}"#))
        .mount(&server)
        .await;

    let bytes = github_source(&server)
        .fetch_raw(&repo(), "master", "Solutions/Contoso/Data Connectors/ContosoCCF.json")
        .await
        .unwrap();
    assert_eq!(bytes, br#"{"kind":"Customizable"}"#.to_vec());
}

#[tokio::test]
async fn test_github_fetch_raw_not_found() {
    let server = MockServer::start().await;

    let err = github_source(&server)
        .fetch_raw(&repo(), "master", "Solutions/Contoso/missing.json")
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Status { stage: FetchStage::RawContent, status: 404, .. }));
}

#[tokio::test]
async fn test_github_sends_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/Azure/Azure-Sentinel/contents/Solutions"))
        .and(header("Authorization", "token s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::contents_response()))
        .expect(1)
        .mount(&server)
        .await;

    let source = github_source(&server).with_token(Some("s3cret".to_string()));
    let names = list_solutions(&source, &repo(), "Solutions").await.unwrap();
    assert_eq!(names.len(), 3);
}

// =============================================================================
// Local Source Tests
// =============================================================================

#[tokio::test]
async fn test_local_list_solutions() {
    let dir = tempfile::tempdir().unwrap();
    write_checkout(dir.path());

    let source = LocalSource::new(dir.path());
    let names = list_solutions(&source, &repo(), "Solutions").await.unwrap();
    assert_eq!(names, vec!["Contoso", "Empty"]);
}

#[tokio::test]
async fn test_local_solution_json_paths() {
    let dir = tempfile::tempdir().unwrap();
    write_checkout(dir.path());

    let source = LocalSource::new(dir.path());
    let listing = list_solution_json_paths(&source, &repo(), "ignored-branch", "Solutions", "Contoso")
        .await
        .unwrap();

    assert_eq!(
        listing.paths,
        vec![
            "Solutions/Contoso/Data Connectors/ContosoCCF.json",
            "Solutions/Contoso/Data Connectors/dcr.json",
            "Solutions/Contoso/Package/mainTemplate.json",
        ]
    );

    let tree = source.list_tree(&repo(), ".").await.unwrap();
    assert!(tree.entries.iter().all(|e| !e.path.starts_with(".git")));
}

#[tokio::test]
async fn test_local_fetch_raw() {
    let dir = tempfile::tempdir().unwrap();
    write_checkout(dir.path());

    let source = LocalSource::new(dir.path());
    let bytes = source
        .fetch_raw(&repo(), "master", "Solutions/Contoso/Package/mainTemplate.json")
        .await
        .unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["parameters"]["solutionName"]["defaultValue"], "Contoso");

    let missing = source.fetch_raw(&repo(), "master", "Solutions/Contoso/none.json").await;
    assert!(matches!(missing, Err(FetchError::NotFound(_))));
}

#[tokio::test]
async fn test_local_missing_root() {
    let dir = tempfile::tempdir().unwrap();
    let source = LocalSource::new(dir.path().join("not-there"));

    assert!(source.resolve_tree_root(&repo(), "master").await.is_err());
    assert!(list_solutions(&source, &repo(), "Solutions").await.is_err());
}

// =============================================================================
// Mock Source Tests
// =============================================================================

#[tokio::test]
async fn test_mock_source_basic_workflow() {
    let mut builder = MockSourceBuilder::new();
    for (path, value) in fixtures::solution_files() {
        builder = builder.with_json(path, value);
    }
    let source = builder.build();

    let names = list_solutions(&source, &repo(), "Solutions").await.unwrap();
    assert_eq!(names, vec!["Contoso"]);

    let listing = list_solution_json_paths(&source, &repo(), "master", "Solutions", "Contoso").await.unwrap();
    assert_eq!(listing.paths.len(), 3);

    for path in &listing.paths {
        source.fetch_raw(&repo(), "master", path).await.unwrap();
    }
    assert_eq!(source.total_fetches(), 3);
}
