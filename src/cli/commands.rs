//! Command dispatch: thin wrappers around `TrackerService`

use std::io;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::cli::tree_view::TreeNodeConvert;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{CompletionChange, DisciplinePath, DisciplineTree};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::SelectionItem;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli, container: &ServiceContainer) -> CliResult<()> {
    match &cli.command {
        None => cmd_next(container, false),
        Some(Commands::Next { no_prompt }) => cmd_next(container, *no_prompt),
        Some(Commands::List { incomplete }) => cmd_list(container, *incomplete),
        Some(Commands::Tree) => cmd_tree(container),
        Some(Commands::Reset { paths }) => cmd_reset(container, paths),
        Some(Commands::Done { path }) => cmd_done(container, path),
        Some(Commands::Select) => cmd_select(container),
        Some(Commands::Scan) => cmd_scan(container),
        Some(Commands::Status) => cmd_status(container),
        Some(Commands::Config { command }) => cmd_config(container, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
    }
}

fn parse_path(raw: &str) -> CliResult<DisciplinePath> {
    let path: DisciplinePath = raw
        .parse()
        .map_err(|_| CliError::InvalidArgs(format!("bad discipline path: {raw}")))?;
    if path.is_empty() {
        return Err(CliError::InvalidArgs(format!(
            "empty discipline path: '{raw}'"
        )));
    }
    Ok(path)
}

fn print_tree(tree: &DisciplineTree) {
    for rendered in tree.to_tree_strings() {
        print!("{}", rendered);
    }
}

/// Print the next incomplete discipline and where it lives; false when none is left.
fn report_next(container: &ServiceContainer, tree: &DisciplineTree) -> CliResult<bool> {
    let Some(next) = tree.incomplete_leaves().next() else {
        output::success("All disciplines are complete. Use `distrack reset` to reopen some.");
        return Ok(false);
    };
    output::action("Next discipline", &next);
    let disk_path = container.tracker.disk_path(tree, next.segments())?;
    output::detail(&format!("path: {}", disk_path.display()));
    Ok(true)
}

fn report_change(path: &DisciplinePath, change: &CompletionChange, state: &str) {
    match change {
        CompletionChange::Renamed { from, to } => {
            output::success_detail(&format!("{path}: {} -> {}", from.display(), to.display()))
        }
        CompletionChange::Unchanged => {
            output::success_detail(&format!("{path}: already {state}"))
        }
    }
}

/// Mark `path` complete, persist, and show what is left.
fn complete_and_report(
    container: &ServiceContainer,
    tree: &mut DisciplineTree,
    path: &DisciplinePath,
) -> CliResult<()> {
    let change = container
        .tracker
        .set_completion(tree, path.segments(), true)?;
    container.tracker.save(tree)?;
    output::success(&format!("Marked complete: {path}"));
    report_change(path, &change, "complete");

    let remaining = tree.summary().incomplete;
    output::info(&format!("{remaining} incomplete disciplines remaining"));
    report_next(container, tree)?;
    Ok(())
}

#[instrument(skip(container))]
fn cmd_next(container: &ServiceContainer, no_prompt: bool) -> CliResult<()> {
    output::header("Discipline hierarchy");
    let mut tree = container.tracker.build_tree()?;
    print_tree(&tree);
    container.tracker.save(&tree)?;

    let incomplete = tree.summary().incomplete;
    output::info(&format!("\n{incomplete} incomplete disciplines"));
    if !report_next(container, &tree)? || no_prompt {
        return Ok(());
    }

    let confirmed = container
        .prompt
        .confirm("Mark this discipline as complete?")
        .map_err(|e| InfraError::io("read answer", e))?;
    if !confirmed {
        debug!("next: user declined");
        return Ok(());
    }

    let Some(next) = tree.incomplete_leaves().next() else {
        return Ok(());
    };
    complete_and_report(container, &mut tree, &next)
}

#[instrument(skip(container))]
fn cmd_list(container: &ServiceContainer, incomplete_only: bool) -> CliResult<()> {
    let tree = container.tracker.build_tree()?;
    output::header("Leaf disciplines");
    for (path, completed) in tree
        .all_leaves()
        .filter(|(_, completed)| !incomplete_only || !completed)
    {
        output::info(&format!("- {} ({})", path, output::status(completed)));
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_tree(container: &ServiceContainer) -> CliResult<()> {
    let tree = container.tracker.build_tree()?;
    print_tree(&tree);
    Ok(())
}

#[instrument(skip(container))]
fn cmd_reset(container: &ServiceContainer, raw_paths: &[String]) -> CliResult<()> {
    let source: &[String] = if raw_paths.is_empty() {
        &container.settings.reset_paths
    } else {
        raw_paths
    };
    if source.is_empty() {
        return Err(CliError::Usage(
            "no paths given and no reset_paths configured".to_string(),
        ));
    }
    let paths = source
        .iter()
        .map(|p| parse_path(p))
        .collect::<CliResult<Vec<_>>>()?;

    let mut tree = container.tracker.load_or_build()?;
    let report = container.tracker.reset(&mut tree, &paths);
    container.tracker.save(&tree)?;

    output::header("Marked incomplete");
    for (path, change) in &report.changed {
        report_change(path, change, "incomplete");
    }
    for (path, err) in &report.failed {
        output::failure(&format!("{path}: {err}"));
    }

    if report.is_success() {
        Ok(())
    } else {
        Err(CliError::ResetIncomplete {
            failed: report.failed.len(),
            total: paths.len(),
        })
    }
}

#[instrument(skip(container))]
fn cmd_done(container: &ServiceContainer, raw_path: &str) -> CliResult<()> {
    let path = parse_path(raw_path)?;
    let mut tree = container.tracker.load_or_build()?;
    complete_and_report(container, &mut tree, &path)
}

#[instrument(skip(container))]
fn cmd_select(container: &ServiceContainer) -> CliResult<()> {
    let mut tree = container.tracker.build_tree()?;
    let items: Vec<SelectionItem> = tree
        .incomplete_leaves()
        .map(|path| SelectionItem {
            display: path.to_string(),
            value: path.to_slash_string(),
        })
        .collect();
    if items.is_empty() {
        output::success("All disciplines are complete.");
        return Ok(());
    }

    let selected = container
        .selector
        .select_one(&items, "discipline> ")
        .map_err(|message| InfraError::Selector { message })?;
    match selected {
        Some(item) => complete_and_report(container, &mut tree, &parse_path(&item.value)?),
        None => {
            output::info("Nothing selected.");
            Ok(())
        }
    }
}

#[instrument(skip(container))]
fn cmd_scan(container: &ServiceContainer) -> CliResult<()> {
    let tree = container.tracker.build_tree()?;
    container.tracker.save(&tree)?;
    let summary = tree.summary();
    output::success(&format!(
        "Saved {} ({} disciplines, {} leaves)",
        container.tracker.store().path().display(),
        tree.len(),
        summary.total
    ));
    Ok(())
}

#[instrument(skip(container))]
fn cmd_status(container: &ServiceContainer) -> CliResult<()> {
    let tree = container.tracker.load_or_build()?;
    let summary = tree.summary();
    let percent = if summary.total == 0 {
        100.0
    } else {
        summary.completed as f64 * 100.0 / summary.total as f64
    };
    output::header("Progress");
    output::detail(&format!("base dir:   {}", container.settings.base_dir.display()));
    output::detail(&format!("leaves:     {}", summary.total));
    output::detail(&format!("complete:   {}", summary.completed));
    output::detail(&format!("incomplete: {}", summary.incomplete));
    output::detail(&format!("progress:   {percent:.1}%"));
    report_next(container, &tree)?;
    Ok(())
}

fn cmd_config(container: &ServiceContainer, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&container.settings.to_toml()?),
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("global", &path.display()),
                None => output::warning("no global config directory on this platform"),
            }
            let cwd = std::env::current_dir()
                .map_err(|e| InfraError::io("determine working directory", e))?;
            output::action("local", &local_config_path(&cwd).display());
        }
    }
    Ok(())
}
