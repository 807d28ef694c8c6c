use clap::{Parser, Subcommand};
use colored::Colorize;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cubegraph_builder::{BuildOutcome, GraphBuilder};
use cubegraph_core::{Config, Diagnostic, Report, Severity};
use cubegraph_model::{MetadataModel, ModelValidator};
use cubegraph_sql::{SqlAstWalker, SqlParser};
use cubegraph_sync::{ApiCredentials, FileSync, GraphSync, SyncRequest};

/// cubegraph - dependency graphs from cube metadata models
#[derive(Parser)]
#[command(name = "cubegraph")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: cubegraph.toml)
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
    /// Build the graph from a model snapshot
    Build {
        /// Path to the evaluated model snapshot
        #[arg(short, long, default_value = "model.json")]
        model: PathBuf,

        /// Output file for the graph
        #[arg(short, long, default_value = "graph.json")]
        output: PathBuf,

        /// Also write report.json
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// Build the graph and write the sync payload for the graph catalog
    Export {
        /// Path to the evaluated model snapshot
        #[arg(short, long, default_value = "model.json")]
        model: PathBuf,

        /// Output file for the payload
        #[arg(short, long, default_value = "sync-payload.json")]
        output: PathBuf,
    },

    /// List the tables a SQL statement or a cube reads
    Tables {
        /// SQL statement to analyze
        #[arg(long, conflicts_with_all = ["model", "cube"])]
        sql: Option<String>,

        /// Path to the evaluated model snapshot
        #[arg(short, long, requires = "cube")]
        model: Option<PathBuf>,

        /// Cube key or display name
        #[arg(long)]
        cube: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    init_tracing(cli.verbose);

    // Load config if specified
    let config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else if Path::new("cubegraph.toml").exists() {
        Config::from_file(Path::new("cubegraph.toml"))?
    } else {
        if cli.verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    if cli.verbose {
        eprintln!("{} dialect: {:?}", "Using".cyan(), config.dialect);
    }

    match cli.command {
        Commands::Build { model, output, report } => {
            build_command(&config, &model, &output, report.as_deref(), cli.verbose)
        }
        Commands::Export { model, output } => {
            export_command(&config, &model, &output, cli.verbose).await
        }
        Commands::Tables { sql, model, cube } => {
            tables_command(&config, sql.as_deref(), model.as_deref(), cube.as_deref())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Load the model and, unless disabled, validate it
fn load_model(config: &Config, path: &Path, verbose: bool) -> Result<(MetadataModel, Vec<Diagnostic>)> {
    if !path.exists() {
        return Err(anyhow::anyhow!(
            "Model snapshot not found at {}. Export the evaluated cube model first.",
            path.display()
        ));
    }

    if verbose {
        eprintln!("{} {}", "Loading model from:".cyan(), path.display());
    }

    let model = MetadataModel::from_file(path)?;

    let findings = if config.validate_model {
        ModelValidator::ensure_valid(&model)?
    } else {
        Vec::new()
    };

    Ok((model, findings))
}

fn build(config: &Config, model: &MetadataModel, verbose: bool) -> BuildOutcome {
    if verbose {
        eprintln!("{} {} cubes...", "Building graph from".cyan(), model.cubes().len());
    }

    GraphBuilder::from_config(config.clone()).build_with_diagnostics(model)
}

/// Validation findings followed by build diagnostics, with graph counts
fn build_report(findings: Vec<Diagnostic>, outcome: &BuildOutcome) -> Report {
    let mut report = Report::from_diagnostics(findings).with_graph_stats(&outcome.graph);
    for diagnostic in &outcome.diagnostics {
        report.add_diagnostic(diagnostic.clone());
    }
    report
}

/// Build command - write the graph (and optionally a report)
fn build_command(
    config: &Config,
    model_path: &Path,
    output: &Path,
    report_path: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let (model, findings) = load_model(config, model_path, verbose)?;
    let outcome = build(config, &model, verbose);

    std::fs::write(output, outcome.graph.to_json()?)?;

    let report = build_report(findings, &outcome);
    print_summary(&report, outcome.cubes_failed);
    println!("{} {}", "Graph written to:".green(), output.display());

    if let Some(path) = report_path {
        report.save_to_file(path)?;
        println!("{} {}", "Report written to:".green(), path.display());
    }

    Ok(())
}

/// Export command - hand the graph to the file sync
async fn export_command(config: &Config, model_path: &Path, output: &Path, verbose: bool) -> Result<()> {
    let (model, findings) = load_model(config, model_path, verbose)?;
    let outcome = build(config, &model, verbose);

    let report = build_report(findings, &outcome);
    print_summary(&report, outcome.cubes_failed);

    let credentials = match ApiCredentials::from_env() {
        Ok(credentials) => credentials,
        Err(e) => {
            eprintln!("{} {}", "Exporting without credentials:".yellow(), e);
            ApiCredentials::default()
        }
    };

    let request = SyncRequest::new(credentials, config.workspaces.clone(), outcome.graph);
    let sync = FileSync::new(output);

    if verbose {
        eprintln!("{} {}", "Syncing with:".cyan(), sync.name());
    }

    let summary = sync.sync(&request).await?;

    println!(
        "{} {} components, {} references to {}",
        "Exported".green(),
        summary.components,
        summary.references,
        summary.target
    );

    Ok(())
}

/// Tables command - print the qualified tables a statement reads
fn tables_command(
    config: &Config,
    sql: Option<&str>,
    model_path: Option<&Path>,
    cube: Option<&str>,
) -> Result<()> {
    let sql = match (sql, model_path, cube) {
        (Some(sql), _, _) => sql.to_string(),
        (None, Some(path), Some(cube)) => {
            let model = MetadataModel::from_file(path)?;
            let definition = model
                .get_cube(cube)
                .or_else(|| model.find_cube_by_name(cube).map(|(_, c)| c))
                .ok_or_else(|| anyhow::anyhow!("Cube '{}' not found in {}", cube, path.display()))?;
            definition.sql_text().to_string()
        }
        _ => return Err(anyhow::anyhow!("Pass either --sql, or --model with --cube")),
    };

    let parsed = SqlParser::from_dialect(&config.dialect).parse(&sql)?;
    tracing::debug!(statements = parsed.statement_count(), "Parsed SQL");
    let (tables, stats) = SqlAstWalker::from_config(config).table_refs(&parsed);

    if stats.ignored {
        println!("{}", "Not a single SELECT statement; no tables extracted".yellow());
        return Ok(());
    }

    let mut seen = std::collections::HashSet::new();
    for table in tables.iter().filter(|t| seen.insert(t.key())) {
        println!("{}", table.key());
    }

    if stats.unqualified > 0 {
        eprintln!("{} {} unqualified reference(s)", "Skipped".dimmed(), stats.unqualified);
    }
    if stats.truncated {
        eprintln!("{}", "Depth limit reached; some nested queries were not walked".yellow());
    }

    Ok(())
}

fn print_summary(report: &Report, cubes_failed: usize) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "Graph Build Summary".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    let summary = &report.summary;
    println!("{} {}", "Cubes:".bold(), summary.cubes);
    println!("{} {}", "Tables:".bold(), summary.tables);
    println!("{} {}", "Join references:".bold(), summary.joins);
    println!("{} {}", "Lineage references:".bold(), summary.lineage_edges);
    println!();

    for diagnostic in &report.diagnostics {
        let label = match diagnostic.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warn => "warn".yellow().bold(),
            Severity::Info => "info".blue(),
        };
        println!("  {} [{}] {}", label, diagnostic.code, diagnostic.message);
    }

    if cubes_failed > 0 {
        println!();
        println!(
            "{}",
            format!("⚠ {} cube(s) had unparsable SQL; their lineage is missing", cubes_failed)
                .yellow()
                .bold()
        );
    } else if report.diagnostics.is_empty() {
        println!("{}", "✓ No issues".green());
    }

    println!();
    println!("{}", "=".repeat(60).bright_blue());
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubegraph_core::DiagnosticCode;
    use cubegraph_model::{CubeDefinition, JoinEdge};

    #[test]
    fn report_combines_validation_and_build_diagnostics() {
        let mut model = MetadataModel::default();
        model
            .cube_evaluator
            .evaluated_cubes
            .insert("orders".to_string(), CubeDefinition::new("Orders", "SELECT * FROM db1.orders"));
        model
            .cube_evaluator
            .evaluated_cubes
            .insert("broken".to_string(), CubeDefinition::new("Broken", "SELEC x FROM"));
        model
            .join_graph
            .edges
            .insert("Orders-Ghost".to_string(), JoinEdge::new("Orders", "Ghost"));

        let findings = ModelValidator::validate(&model);
        let outcome = build(&Config::default(), &model, false);
        let report = build_report(findings, &outcome);

        let codes: Vec<DiagnosticCode> = report.diagnostics.iter().map(|d| d.code).collect();
        assert_eq!(codes, vec![DiagnosticCode::ModelDanglingJoin, DiagnosticCode::SqlParseError]);
        assert_eq!(report.summary.warnings, 2);
        assert_eq!(report.summary.cubes, 2);
        assert_eq!(report.summary.lineage_edges, 1);
        assert_eq!(outcome.cubes_failed, 1);
    }
}
