//! CLI output formatting

use crate::{
    core::{ExecutionStatus, RunResult, TargetGraph, TargetStatus},
    execution::{ExecutionEvent, ExecutionPlan},
};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

const DEFAULT_WIDTH: usize = 80;

/// Create a progress bar
pub fn create_progress_bar(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    progress.set_style(style);
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// A title line padded with rules to the terminal width
pub fn banner(title: &str) -> String {
    let width = term_size::dimensions_stdout()
        .map(|(w, _)| w)
        .unwrap_or(DEFAULT_WIDTH);
    let text = format!(" {} ", title);
    let rule = width.saturating_sub(text.chars().count() + 3).max(3);
    format!("{}{}{}", "───", style(text).bold(), "─".repeat(rule))
}

/// Format a run status for display
pub fn format_status(status: ExecutionStatus) -> String {
    match status {
        ExecutionStatus::Pending => style("PENDING").dim().to_string(),
        ExecutionStatus::Running => style("RUNNING").yellow().to_string(),
        ExecutionStatus::Completed => style("SUCCEEDED").green().to_string(),
        ExecutionStatus::Failed => style("FAILED").red().to_string(),
    }
}

/// Format a target status for display
pub fn format_target_status(status: &TargetStatus) -> String {
    match status {
        TargetStatus::Pending => style("PENDING").dim().to_string(),
        TargetStatus::Succeeded { .. } => style("SUCCEEDED").green().to_string(),
        TargetStatus::Failed { proceeded: true, .. } => {
            style("FAILED (proceeded)").red().to_string()
        }
        TargetStatus::Failed { .. } => style("FAILED").red().to_string(),
        TargetStatus::Skipped { .. } => style("SKIPPED").dim().to_string(),
        TargetStatus::Aborted { .. } => style("ABORTED").yellow().to_string(),
    }
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::RunStarted {
            execution_id,
            goals,
            total,
        } => format!(
            "{} Building {} ({} targets, {})",
            ROCKET,
            style(goals.join(", ")).bold(),
            total,
            style(&execution_id.to_string()[..8]).dim()
        ),
        ExecutionEvent::TargetStarted {
            name,
            position,
            total,
        } => format!(
            "{} [{}/{}] {}",
            SPINNER,
            style(position).cyan(),
            style(total).dim(),
            style(name).bold()
        ),
        ExecutionEvent::TargetSucceeded { name, duration } => format!(
            "{} {} {}",
            CHECK,
            style(name).green(),
            style(format_duration(*duration)).dim()
        ),
        ExecutionEvent::TargetFailed {
            name,
            error,
            proceeding,
        } => {
            let suffix = if *proceeding { " (proceeding)" } else { "" };
            format!(
                "{} {}{}: {}",
                CROSS,
                style(name).red(),
                suffix,
                style(error).dim()
            )
        }
        ExecutionEvent::TargetSkipped { name, reason } => {
            format!("{} {} ({})", SKIP, style(name).dim(), reason)
        }
        ExecutionEvent::TargetAborted { name, reason } => {
            format!("{} {} ({})", WARN, style(name).yellow(), reason)
        }
        ExecutionEvent::RunFinished {
            execution_id,
            status,
        } => format!(
            "{} Build ({}) {}",
            INFO,
            style(&execution_id.to_string()[..8]).dim(),
            format_status(*status)
        ),
    }
}

/// Per-target summary table printed after a run
pub fn format_run_report(result: &RunResult) -> String {
    let width = result
        .targets
        .iter()
        .map(|t| t.name.len())
        .max()
        .unwrap_or(0);

    let mut lines = vec![banner("Build summary")];
    for record in &result.targets {
        let detail = match &record.status {
            TargetStatus::Succeeded { .. } => record
                .status
                .duration()
                .map(format_duration)
                .unwrap_or_default(),
            TargetStatus::Failed { error, .. } => error.clone(),
            TargetStatus::Skipped { reason, .. } | TargetStatus::Aborted { reason, .. } => {
                reason.clone()
            }
            TargetStatus::Pending => String::new(),
        };
        lines.push(format!(
            "  {:<width$}  {}  {}",
            record.name,
            format_target_status(&record.status),
            style(detail).dim(),
            width = width
        ));
    }

    if let Some(abort) = &result.abort {
        lines.push(format!(
            "{} Aborted by {}: {}",
            WARN,
            style(&abort.target).bold(),
            abort.requirement
        ));
    }

    let total = result
        .duration()
        .map(format_duration)
        .unwrap_or_else(|| "-".to_string());
    lines.push(format!(
        "{} {} in {}",
        if result.is_success() { CHECK } else { CROSS },
        format_status(result.status),
        total
    ));
    lines.join("\n")
}

/// Numbered execution order
pub fn format_plan(plan: &ExecutionPlan) -> String {
    let mut lines = vec![format!(
        "{} Plan for {}:",
        INFO,
        style(plan.goals.join(", ")).bold()
    )];
    for (i, name) in plan.order.iter().enumerate() {
        lines.push(format!("  {}. {}", style(i + 1).dim(), name));
    }
    lines.join("\n")
}

/// One line per target with its relations
pub fn format_target_list(graph: &TargetGraph) -> String {
    let mut lines = Vec::new();
    for target in graph.targets() {
        let mut line = format!("  {}", style(&target.name).bold());
        if graph.default_target() == Some(target.name.as_str()) {
            line.push_str(&format!(" {}", style("(default)").cyan()));
        }
        if let Some(description) = &target.description {
            line.push_str(&format!(" - {}", description));
        }
        lines.push(line);

        for (label, names) in [
            ("depends on", &target.depends_on),
            ("before", &target.before),
            ("after", &target.after),
        ] {
            if !names.is_empty() {
                lines.push(format!("      {} {}", style(label).dim(), names.join(", ")));
            }
        }
    }
    lines.join("\n")
}

pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    let secs = duration.as_secs();
    if secs == 0 {
        format!("{}ms", millis)
    } else if secs < 60 {
        format!("{:.1}s", duration.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
