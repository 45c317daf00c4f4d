//! Visualization pipeline for one solution
//!
//! Runs sequentially: list the solution's JSON files, then fetch, parse and
//! route each one in turn, then de-duplicate, enrich and assemble. Listing
//! failures abort the request. A file that cannot be fetched or parsed is
//! skipped with a diagnostic and the pass continues.

use crate::assembler::{partition_duplicates, GraphAssembler};
use crate::enrichment::enrich;
use solmap_artifact::{
    is_main_template_path, is_query_path, Artifact, ArtifactRouter, QueryArtifact, SolutionMetadata,
    RULESET_VERSION,
};
use solmap_core::{Config, Diagnostic, DiagnosticCode, Location, Report};
use solmap_source::{list_solution_json_paths, list_solutions, ContentSource, FetchError, RepositoryRef};
use std::sync::Arc;

/// Fatal pipeline errors
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Directory listing or tree resolution failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Pipeline over one content source
pub struct SolutionPipeline {
    source: Arc<dyn ContentSource>,
    config: Config,
}

impl SolutionPipeline {
    pub fn new(source: Arc<dyn ContentSource>, config: Config) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    fn diagnostic(&self, code: DiagnosticCode, message: impl Into<String>) -> Diagnostic {
        Diagnostic::from_code(code, message).with_severity(self.config.severity_for(code))
    }

    /// Solution directory names under the configured solutions root
    pub async fn solutions(&self, repo: &RepositoryRef) -> Result<Vec<String>, PipelineError> {
        let root = &self.config.repository.solutions_root;
        tracing::info!(repo = %repo, root = %root, source = self.source.name(), "loading solutions");

        let names = list_solutions(self.source.as_ref(), repo, root).await?;
        tracing::info!(count = names.len(), "loaded solutions");
        Ok(names)
    }

    /// Build the report and graph for one solution
    pub async fn visualize(&self, repo: &RepositoryRef, branch: &str, solution: &str) -> Result<Report, PipelineError> {
        let solution = solution.trim();
        if solution.is_empty() {
            return Err(PipelineError::InvalidRequest("Pick a solution from the list first".to_string()));
        }

        let root = &self.config.repository.solutions_root;
        tracing::info!(repo = %repo, branch = %branch, solution = %solution, "resolving branch tree");

        let listing = list_solution_json_paths(self.source.as_ref(), repo, branch, root, solution).await?;

        let mut report = Report::new(solution);
        report.summary.files_listed = listing.paths.len();

        if listing.truncated {
            report.add_diagnostic(self.diagnostic(
                DiagnosticCode::TreeTruncated,
                "Repository tree listing was truncated; some files may be missing.",
            ));
        }

        if listing.paths.is_empty() {
            report.add_diagnostic(self.diagnostic(DiagnosticCode::NoJsonFiles, "No JSON files found in this solution."));
            return Ok(report);
        }

        tracing::info!(files = listing.paths.len(), "fetching solution files");

        let mut router = ArtifactRouter::new(solution);
        let mut queries: Vec<QueryArtifact> = Vec::new();
        let mut metadata: Option<SolutionMetadata> = None;
        let mut filtered = 0;

        for path in &listing.paths {
            if self.config.filter.is_skipped(path) {
                tracing::debug!(path = %path, "skipped by path filter");
                filtered += 1;
                continue;
            }

            let bytes = match self.source.fetch_raw(repo, branch, path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "skip");
                    report.summary.files_skipped += 1;
                    let location = match e.status() {
                        Some(status) => Location::with_status(path.as_str(), status),
                        None => Location::new(path.as_str()),
                    };
                    report.add_diagnostic(
                        self.diagnostic(DiagnosticCode::FetchSkipped, e.to_string())
                            .with_location(location),
                    );
                    continue;
                }
            };

            let artifact = match Artifact::parse(path.as_str(), &bytes) {
                Ok(artifact) => artifact,
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "bad json");
                    report.summary.files_skipped += 1;
                    report.add_diagnostic(
                        self.diagnostic(DiagnosticCode::ParseSkipped, e.to_string())
                            .with_location(Location::new(path.as_str())),
                    );
                    continue;
                }
            };

            report.summary.files_processed += 1;
            router.route(&artifact);

            if is_query_path(path) {
                if let Some(query) = QueryArtifact::from_artifact(&artifact) {
                    queries.push(query);
                }
            }

            if metadata.is_none() && is_main_template_path(path) {
                metadata = Some(SolutionMetadata::from_artifact(&artifact));
            }
        }

        if filtered > 0 {
            report.add_diagnostic(self.diagnostic(
                DiagnosticCode::Info,
                format!("{} files matched filter.skip_paths and were not fetched.", filtered),
            ));
        }

        let routed = router.finish();
        let (mut connectors, duplicates) = partition_duplicates(routed.connectors);
        for duplicate in &duplicates {
            report.add_diagnostic(
                self.diagnostic(
                    DiagnosticCode::Warning,
                    format!("Duplicate connector '{}' ignored; the first definition is kept.", duplicate.name),
                )
                .with_location(Location::new(duplicate.path.as_str())),
            );
        }
        enrich(&mut connectors, &queries);

        tracing::info!(
            connectors = connectors.len(),
            dependencies = routed.dependencies.len(),
            queries = queries.len(),
            "routed solution files"
        );

        report.summary.connectors = connectors.len();
        report.summary.dependencies = routed.dependencies.len();
        report.summary.queries = queries.len();
        report.summary.query_hits = connectors.iter().map(|c| c.hit_count()).sum();

        if connectors.is_empty() {
            report.add_diagnostic(self.diagnostic(
                DiagnosticCode::NoConnectors,
                "No connector definitions found in this solution.",
            ));
        }
        if routed.dependencies.is_empty() {
            report.add_diagnostic(self.diagnostic(
                DiagnosticCode::NoDependencies,
                "No data collection rules found in this solution.",
            ));
        }
        if metadata.is_none() {
            report.add_diagnostic(self.diagnostic(
                DiagnosticCode::MainTemplateMissing,
                "mainTemplate.json not found or could not be parsed.",
            ));
        }

        let assembler = GraphAssembler::new(self.config.graph.node_ids).with_default_solution_name(solution);
        let graph = assembler.assemble(&connectors, metadata.as_ref());
        report.set_graph(graph);
        report.metadata = metadata.as_ref().and_then(|m| serde_json::to_value(m).ok());
        report.ruleset = Some(RULESET_VERSION);

        tracing::info!("{}", report.status_line());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solmap_source::MockSource;

    #[tokio::test]
    async fn blank_solution_is_rejected() {
        let pipeline = SolutionPipeline::new(Arc::new(MockSource::new()), Config::default());
        let result = pipeline.visualize(&RepositoryRef::new("o", "r"), "master", "  ").await;
        assert!(matches!(result, Err(PipelineError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn empty_solution_reports_no_json_files() {
        let pipeline = SolutionPipeline::new(Arc::new(MockSource::new()), Config::default());
        let report = pipeline
            .visualize(&RepositoryRef::new("o", "r"), "master", "Nothing")
            .await
            .unwrap();

        assert_eq!(report.summary.files_listed, 0);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].code, DiagnosticCode::NoJsonFiles);
        assert!(report.graph.nodes.is_empty());
    }
}
