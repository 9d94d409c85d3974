use anyhow::{Context, Result};
use buildgraph::build::{ci, standard_graph};
use buildgraph::cli::commands::{GenerateCiCommand, ListCommand, PlanCommand, RunCommand};
use buildgraph::cli::output::*;
use buildgraph::cli::{Cli, Command};
use buildgraph::core::{BuildConfig, BuildContext, TargetGraph};
use buildgraph::execution::{ExecutionEngine, ExecutionEvent};
use buildgraph::vcs::{discover_version, RepositoryInfo};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Environment variable overriding the log filter
const LOG_ENV: &str = "BUILDGRAPH_LOG";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(log_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    let root = cli
        .root
        .canonicalize()
        .with_context(|| format!("Build root {} does not exist", cli.root.display()))?;
    let config = BuildConfig::load(&root, cli.config.as_deref())
        .context("Failed to load build configuration")?;
    let graph = standard_graph(&config).context("Invalid target registry")?;

    // Execute command
    match &cli.command {
        Command::Run(cmd) => run_targets(cmd, root, config, graph).await?,
        Command::Plan(cmd) => plan_targets(cmd, &graph)?,
        Command::List(cmd) => list_targets(cmd, &graph)?,
        Command::GenerateCi(cmd) => generate_ci(cmd, &root, &config, &graph)?,
    }

    Ok(())
}

async fn run_targets(
    cmd: &RunCommand,
    root: PathBuf,
    config: BuildConfig,
    graph: TargetGraph,
) -> Result<()> {
    let repository = RepositoryInfo::discover(&root).await;
    let version = discover_version(&root).await;
    debug!("Build root {}, version {}", root.display(), version);

    let mut ctx = BuildContext::new(root, config)
        .with_repository(repository)
        .with_version(version)
        .with_api_key(cmd.api_key.clone());
    if let Some(configuration) = cmd.configuration {
        ctx = ctx.with_configuration(configuration.into());
    }

    let mut engine = ExecutionEngine::new(Arc::new(graph));
    let plan = engine.plan(&cmd.targets)?;

    let progress = if cmd.json {
        None
    } else {
        println!("{}", banner(&format!("{} ({})", plan.goals.join(", "), ctx.configuration)));
        Some(create_progress_bar(plan.len()))
    };

    if let Some(progress) = progress.clone() {
        engine.add_event_handler(move |event| {
            progress.println(format_execution_event(event));
            match event {
                ExecutionEvent::TargetStarted { name, .. } => progress.set_message(name.clone()),
                ExecutionEvent::TargetSucceeded { .. }
                | ExecutionEvent::TargetFailed { .. }
                | ExecutionEvent::TargetSkipped { .. }
                | ExecutionEvent::TargetAborted { .. } => progress.inc(1),
                _ => {}
            }
        });
    }

    let result = engine.execute(&plan, &ctx).await;

    if let Some(progress) = progress {
        progress.finish_and_clear();
        println!("\n{}", format_run_report(&result));
        let artifacts = result.artifacts();
        if !artifacts.is_empty() {
            println!("\n{} Artifacts:", INFO);
            for path in artifacts {
                println!("  {}", style(path.display()).dim());
            }
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    if !result.is_success() {
        std::process::exit(result.exit_code());
    }

    Ok(())
}

fn plan_targets(cmd: &PlanCommand, graph: &TargetGraph) -> Result<()> {
    let plan = buildgraph::execution::resolve_order(graph, &cmd.targets)?;
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        println!("{}", format_plan(&plan));
    }
    Ok(())
}

fn list_targets(cmd: &ListCommand, graph: &TargetGraph) -> Result<()> {
    if cmd.json {
        let targets: Vec<_> = graph
            .targets()
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "description": t.description,
                    "depends_on": t.depends_on,
                    "before": t.before,
                    "after": t.after,
                    "requires": t.requirements.iter().map(|c| &c.description).collect::<Vec<_>>(),
                    "only_when": t.only_when.as_ref().map(|c| &c.description),
                    "skip_behavior": t.skip_behavior,
                    "proceed_after_failure": t.proceed_after_failure,
                })
            })
            .collect();
        let data = serde_json::json!({
            "default": graph.default_target(),
            "targets": targets,
        });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    println!("{} Targets:", INFO);
    println!("{}", format_target_list(graph));
    Ok(())
}

fn generate_ci(
    cmd: &GenerateCiCommand,
    root: &Path,
    config: &BuildConfig,
    graph: &TargetGraph,
) -> Result<()> {
    ci::validate_workflows(config, graph)?;
    let dir = cmd
        .output
        .clone()
        .unwrap_or_else(|| root.join(ci::WORKFLOWS_DIR));
    for path in ci::write_workflows(config, &dir)? {
        println!("{} Wrote {}", CHECK, style(path.display()).bold());
    }
    Ok(())
}
