use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use solmap_artifact::{
    is_main_template_path, is_query_path, Artifact, ArtifactRouter, MechanismClassifier, QueryArtifact,
    RouteOutcome, SolutionMetadata, RULESET_VERSION,
};
use solmap_core::{Config, DiagnosticCode, Graph, NodeKind, Report, Severity};
use solmap_engine::{dedup_connectors, enrich, GraphAssembler, SolutionPipeline};
use solmap_source::{ContentSource, GitHubSource, LocalSource, RepositoryRef};

const DEFAULT_CONFIG_FILE: &str = "solmap.toml";

/// Solmap - maps security solution packages to their ingestion graph
#[derive(Parser)]
#[command(name = "solmap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: solmap.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the solutions of a repository
    Solutions {
        /// Repository as owner/name (overrides config)
        #[arg(short, long)]
        repo: Option<String>,

        /// Read a local checkout instead of GitHub
        #[arg(short, long)]
        local: Option<PathBuf>,
    },

    /// Build the connector graph of one solution
    Visualize {
        /// Solution directory name
        solution: String,

        /// Repository as owner/name (overrides config)
        #[arg(short, long)]
        repo: Option<String>,

        /// Branch to read (overrides config)
        #[arg(short, long)]
        branch: Option<String>,

        /// Read a local checkout instead of GitHub
        #[arg(short, long)]
        local: Option<PathBuf>,

        /// Output file for the report JSON
        #[arg(short, long, default_value = "graph.json")]
        output: PathBuf,

        /// Also output markdown report
        #[arg(short, long)]
        markdown: Option<PathBuf>,
    },

    /// Classify local artifact files without fetching anything
    Classify {
        /// JSON files to classify
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Solution name (default: graph.default_solution_name from config)
        #[arg(short, long)]
        solution: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref(), cli.verbose)?;

    match cli.command {
        Commands::Solutions { repo, local } => solutions_command(config, repo.as_deref(), local).await,
        Commands::Visualize {
            solution,
            repo,
            branch,
            local,
            output,
            markdown,
        } => {
            visualize_command(
                config,
                &solution,
                repo.as_deref(),
                branch.as_deref(),
                local,
                &output,
                markdown.as_deref(),
            )
            .await
        }
        Commands::Classify { files, solution } => classify_command(&config, &files, solution.as_deref()),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>, verbose: bool) -> Result<Config> {
    if let Some(path) = path {
        return Config::from_file(path).with_context(|| format!("Failed to load config {}", path.display()));
    }

    let default_path = Path::new(DEFAULT_CONFIG_FILE);
    if default_path.exists() {
        return Config::from_file(default_path).with_context(|| format!("Failed to load {}", DEFAULT_CONFIG_FILE));
    }

    if verbose {
        eprintln!("{}", "No config file found, using defaults".yellow());
    }
    Ok(Config::default())
}

fn repository(config: &Config, repo: Option<&str>) -> Result<RepositoryRef> {
    match repo {
        Some(repo) => RepositoryRef::parse(repo).context("Invalid --repo"),
        None => Ok(RepositoryRef::new(
            config.repository.owner.as_str(),
            config.repository.name.as_str(),
        )),
    }
}

fn content_source(config: &Config, local: Option<PathBuf>) -> Result<Arc<dyn ContentSource>> {
    match local {
        Some(root) => Ok(Arc::new(LocalSource::new(root))),
        None => {
            let source = GitHubSource::from_config(&config.github).context("Failed to create GitHub client")?;
            if !source.has_token() {
                tracing::debug!(env = %config.github.token_env, "no token set, using anonymous GitHub access");
            }
            Ok(Arc::new(source))
        }
    }
}

/// Solutions command - list solution directories
async fn solutions_command(config: Config, repo: Option<&str>, local: Option<PathBuf>) -> Result<()> {
    let repo = repository(&config, repo)?;
    let source = content_source(&config, local)?;
    let pipeline = SolutionPipeline::new(source, config);

    let names = pipeline.solutions(&repo).await.context("Failed to load solutions")?;

    if names.is_empty() {
        eprintln!(
            "{} {}",
            format!("[{}]", DiagnosticCode::NoSolutions).yellow(),
            "No solutions found."
        );
        return Ok(());
    }

    for name in &names {
        println!("{}", name);
    }
    eprintln!("{} {} solutions", "Loaded".green(), names.len());

    Ok(())
}

/// Visualize command - run the pipeline for one solution
async fn visualize_command(
    config: Config,
    solution: &str,
    repo: Option<&str>,
    branch: Option<&str>,
    local: Option<PathBuf>,
    output: &Path,
    markdown: Option<&Path>,
) -> Result<()> {
    let repo = repository(&config, repo)?;
    let branch = branch.unwrap_or(config.repository.branch.as_str()).to_string();
    let source = content_source(&config, local)?;
    let pipeline = SolutionPipeline::new(source, config);

    let report = pipeline
        .visualize(&repo, &branch, solution)
        .await
        .with_context(|| format!("Failed to visualize {}", solution))?;

    report
        .save_to_file(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if let Some(md_path) = markdown {
        std::fs::write(md_path, generate_markdown_report(&report))
            .with_context(|| format!("Failed to write {}", md_path.display()))?;
    }

    print_report_summary(&report);
    eprintln!("{} {}", "Report saved to:".green(), output.display());

    Ok(())
}

/// Classify command - route local files offline
fn classify_command(config: &Config, files: &[PathBuf], solution: Option<&str>) -> Result<()> {
    let classifier = MechanismClassifier::default();
    let mut router = ArtifactRouter::with_classifier(solution.unwrap_or(""), classifier);
    let mut queries = Vec::new();
    let mut metadata = None;

    for file in files {
        let display = file.display().to_string();
        let bytes = std::fs::read(file).with_context(|| format!("Failed to read {}", display))?;
        let artifact = match Artifact::parse(display.as_str(), &bytes) {
            Ok(artifact) => artifact,
            Err(e) => {
                println!("{} {}", "skip".yellow(), e);
                continue;
            }
        };

        let classification = classifier.classify(&artifact);
        let outcome = match router.route(&artifact) {
            RouteOutcome::Connector => "connector".green(),
            RouteOutcome::Dependency => "dependency".cyan(),
            RouteOutcome::Unclassified => "unclassified".dimmed(),
        };

        println!(
            "{:<12} {} ({}, {}, rule: {})",
            outcome,
            display,
            classification.mechanism,
            classification.direction,
            classification.rule.unwrap_or("default")
        );

        let path = display.replace('\\', "/");
        if is_query_path(&path) {
            if let Some(query) = QueryArtifact::from_artifact(&artifact) {
                println!("             query: {}", query.name);
                queries.push(query);
            }
        }
        if metadata.is_none() && is_main_template_path(&path) {
            println!("             solution template");
            metadata = Some(SolutionMetadata::from_artifact(&artifact));
        }
    }

    let graph = assemble_offline(config, router, &queries, metadata.as_ref(), solution);

    println!();
    println!("{} (rules v{})", "Graph:".bold(), RULESET_VERSION);
    for node in graph.layered_nodes() {
        let indent = "  ".repeat(usize::from(node.kind.layer()) + 1);
        println!("{}{} {}", indent, format!("[{}]", node.kind).dimmed(), node.label);
    }
    println!("{} nodes / {} links", graph.nodes.len(), graph.edges.len());

    Ok(())
}

/// Finish routing and build the graph of files classified offline
fn assemble_offline(
    config: &Config,
    router: ArtifactRouter,
    queries: &[QueryArtifact],
    metadata: Option<&SolutionMetadata>,
    solution: Option<&str>,
) -> Graph {
    let routed = router.finish();
    let mut connectors = dedup_connectors(routed.connectors);
    enrich(&mut connectors, queries);

    let solution_name = solution
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(config.graph.default_solution_name.as_str());

    GraphAssembler::new(config.graph.node_ids)
        .with_default_solution_name(solution_name)
        .assemble(&connectors, metadata)
}

/// Print report summary to stdout
fn print_report_summary(report: &Report) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{} {}", "Solution Graph Report:".bold().bright_blue(), report.solution.bold());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("Version: {}", report.version);
    println!("Timestamp: {}", report.timestamp);
    if let Some(ruleset) = report.ruleset {
        println!("Mechanism rules: v{}", ruleset);
    }
    println!();

    let summary = &report.summary;
    println!("{}", "Summary:".bold());
    println!(
        "  Files:        {} listed, {} processed, {} skipped",
        summary.files_listed, summary.files_processed, summary.files_skipped
    );
    println!("  Connectors:   {}", summary.connectors);
    println!("  Dependencies: {}", summary.dependencies);
    println!("  Queries:      {} ({} hits)", summary.queries, summary.query_hits);
    println!("  Graph:        {} nodes / {} links", summary.nodes, summary.edges);

    if summary.errors > 0 {
        println!("  Errors:   {}", summary.errors.to_string().red().bold());
    }
    if summary.warnings > 0 {
        println!("  Warnings: {}", summary.warnings.to_string().yellow());
    }
    println!();

    let connectors = report.graph.nodes_of_kind(NodeKind::Connector);
    if !connectors.is_empty() {
        println!("{}", "Connectors:".bold());
        for node in connectors {
            let mechanism = node.meta.get("mechanism").and_then(|v| v.as_str()).unwrap_or("?");
            let hits = node.meta.get("hitCount").and_then(|v| v.as_u64()).unwrap_or(0);
            println!("  {} [{}] {} hits", node.label.green(), mechanism, hits);
        }
        println!();
    }

    if report.diagnostics.is_empty() {
        println!("{}", "✓ No issues found!".green().bold());
    } else {
        println!("{}", "Diagnostics:".bold());
        for diag in &report.diagnostics {
            let severity_str = match diag.severity {
                Severity::Error => "ERROR".red().bold(),
                Severity::Warn => "WARN".yellow().bold(),
                Severity::Info => "INFO".cyan(),
            };

            println!("  [{}] {}: {}", severity_str, diag.code, diag.message);

            if let Some(loc) = &diag.location {
                match loc.status {
                    Some(status) => println!("    at {} (HTTP {})", loc.path, status),
                    None => println!("    at {}", loc.path),
                }
            }
        }
    }

    println!();
    println!("{}", report.status_line());
    println!("{}", "=".repeat(60).bright_blue());
}

/// Generate markdown report
fn generate_markdown_report(report: &Report) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Solution Graph Report: {}\n\n", report.solution));
    md.push_str(&format!("**Version:** {}\n\n", report.version));
    md.push_str(&format!("**Timestamp:** {}\n\n", report.timestamp));
    if let Some(ruleset) = report.ruleset {
        md.push_str(&format!("**Mechanism rules:** v{}\n\n", ruleset));
    }

    let summary = &report.summary;
    md.push_str("## Summary\n\n");
    md.push_str(&format!(
        "- Files: {} listed, {} processed, {} skipped\n",
        summary.files_listed, summary.files_processed, summary.files_skipped
    ));
    md.push_str(&format!("- Connectors: {}\n", summary.connectors));
    md.push_str(&format!("- Dependencies: {}\n", summary.dependencies));
    md.push_str(&format!("- Queries: {} ({} hits)\n", summary.queries, summary.query_hits));
    md.push_str(&format!("- Graph: {} nodes / {} links\n", summary.nodes, summary.edges));
    md.push('\n');

    let connectors = report.graph.nodes_of_kind(NodeKind::Connector);
    if !connectors.is_empty() {
        md.push_str("## Connectors\n\n");
        md.push_str("| Connector | Data source | Mechanism | Direction | Hits |\n");
        md.push_str("|-----------|-------------|-----------|-----------|------|\n");
        for node in connectors {
            let field = |key: &str| node.meta.get(key).and_then(|v| v.as_str()).unwrap_or("").to_string();
            let hits = node.meta.get("hitCount").and_then(|v| v.as_u64()).unwrap_or(0);
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                node.label,
                field("dataSource"),
                field("mechanism"),
                field("direction"),
                hits
            ));
        }
        md.push('\n');
    }

    if report.diagnostics.is_empty() {
        md.push_str("✅ **No issues found!**\n");
    } else {
        md.push_str("## Diagnostics\n\n");

        for diag in &report.diagnostics {
            let severity_emoji = match diag.severity {
                Severity::Error => "❌",
                Severity::Warn => "⚠️",
                Severity::Info => "ℹ️",
            };

            md.push_str(&format!("### {} {} - {}\n\n", severity_emoji, diag.severity, diag.code));
            md.push_str(&format!("{}\n\n", diag.message));

            if let Some(loc) = &diag.location {
                md.push_str(&format!("**Location:** `{}`", loc.path));
                if let Some(status) = loc.status {
                    md.push_str(&format!(" (HTTP {})", status));
                }
                md.push_str("\n\n");
            }
        }
    }

    md
}
