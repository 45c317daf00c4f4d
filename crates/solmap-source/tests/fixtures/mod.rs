//! Test fixtures for content source integration tests
//!
//! Response bodies shaped like the GitHub REST API, plus a small solution
//! tree that both the HTTP and the on-disk tests use.

#![allow(dead_code)]

use serde_json::{json, Value};

pub const OWNER: &str = "Azure";
pub const REPO: &str = "Azure-Sentinel";
pub const TREE_SHA: &str = "3f2a9c0d";

/// Files of a small solution, as (path, contents)
pub fn solution_files() -> Vec<(&'static str, Value)> {
    vec![
        (
            "Solutions/Contoso/Data Connectors/ContosoCCF.json",
            json!({
                "kind": "Customizable",
                "properties": {"connectorUiConfig": {"title": "Contoso Logs", "publisherName": "Contoso"}}
            }),
        ),
        (
            "Solutions/Contoso/Data Connectors/dcr.json",
            json!({
                "name": "contoso-dcr",
                "type": "Microsoft.Insights/dataCollectionRules",
                "properties": {"dataFlows": [{"streams": ["Custom-ContosoLogs"]}]}
            }),
        ),
        (
            "Solutions/Contoso/Package/mainTemplate.json",
            json!({"parameters": {"solutionName": {"defaultValue": "Contoso"}}}),
        ),
    ]
}

/// `GET /repos/{owner}/{repo}/contents/Solutions`
pub fn contents_response() -> Value {
    json!([
        {"name": "Zscaler", "path": "Solutions/Zscaler", "type": "dir"},
        {"name": "README.md", "path": "Solutions/README.md", "type": "file"},
        {"name": "Contoso", "path": "Solutions/Contoso", "type": "dir"},
        {"name": "apache", "path": "Solutions/apache", "type": "dir"}
    ])
}

/// `GET /repos/{owner}/{repo}/branches/{branch}`
pub fn branch_response(tree_sha: &str) -> Value {
    json!({
        "name": "master",
        "commit": {"sha": "abc123", "commit": {"tree": {"sha": tree_sha}}}
    })
}

/// `GET /repos/{owner}/{repo}/git/trees/{sha}?recursive=1`
pub fn tree_response(truncated: bool) -> Value {
    let mut tree = vec![
        json!({"path": "Solutions", "type": "tree"}),
        json!({"path": "Solutions/Contoso", "type": "tree"}),
        json!({"path": "Solutions/Contoso/Data Connectors/README.md", "type": "blob"}),
        json!({"path": "Solutions/ContosoOther/x.json", "type": "blob"}),
        json!({"path": "Solutions/Contoso/Workbooks/Overview.JSON", "type": "blob"}),
        json!({"path": "Solutions/Contoso/folder.json", "type": "tree"}),
    ];
    tree.extend(
        solution_files()
            .into_iter()
            .map(|(path, _)| json!({"path": path, "type": "blob"})),
    );

    json!({"sha": TREE_SHA, "tree": tree, "truncated": truncated})
}
