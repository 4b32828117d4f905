//! Command dispatch: maps parsed arguments onto services

use std::io;
use std::path::Path;

use clap::CommandFactory;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::services::{EditOutcome, EvaluationReport, NodePatch, RequirementDraft};
use crate::application::ApplicationError;
use crate::cli::args::{
    Cli, Commands, ConfigCommands, EvalCommands, MetaArgs, NodeCommands, TxCommands,
};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{Node, NodeKind, Source, TransactionMeta, TreeArena};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};
use crate::infrastructure::InfraError;

/// Execute the parsed command.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage("no command given, see --help".to_string()));
    };

    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        clap_complete::generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let settings = Settings::load(cli.store.as_deref())?;
    debug!("store_dir: {}", settings.store_dir.display());

    match command {
        Commands::Config { command } => cmd_config(command, &settings),
        other => {
            let container = ServiceContainer::new(settings);
            match other {
                Commands::Tx { command } => cmd_tx(command, &container),
                Commands::Node { command } => cmd_node(command, &container),
                Commands::Eval { command } => cmd_eval(command, &container),
                Commands::Config { .. } | Commands::Completion { .. } => Ok(()),
            }
        }
    }
}

// ============================================================
// tx
// ============================================================

#[instrument(level = "debug", skip(container))]
fn cmd_tx(command: &TxCommands, container: &ServiceContainer) -> CliResult<()> {
    let authoring = &container.authoring;
    match command {
        TxCommands::List => {
            let keys = authoring.list()?;
            if keys.is_empty() {
                output::warning(&format!(
                    "no transactions in {}",
                    container.settings.store_dir.display()
                ));
            }
            for key in keys {
                output::info(&key);
            }
            Ok(())
        }
        TxCommands::Init { key, meta } => {
            authoring.create_transaction(key, meta_from_args(TransactionMeta::default(), meta))?;
            output::success(&format!("created transaction {}", key));
            Ok(())
        }
        TxCommands::Show { key, json } => {
            let tree = authoring.load(key)?;
            if *json {
                output::info(&to_json(&tree)?);
                return Ok(());
            }
            if let Some(condition) = tree.as_condition() {
                let meta = &condition.meta;
                output::header(&format!("{} ({})", key, published_label(meta.published)));
                if let Some(service) = &meta.service {
                    output::detail(&format!("service:  {}", service));
                }
                if let Some(category) = &meta.category {
                    output::detail(&format!("category: {}", category));
                }
                if let Some(fee) = meta.fee {
                    output::detail(&format!("fee:      {:.2}", fee));
                }
                if let Some(duration) = &meta.duration {
                    output::detail(&format!("duration: {}", duration));
                }
            }
            let arena = TreeArena::from_tree(&tree).map_err(ApplicationError::from)?;
            output::detail(&format!(
                "nodes:    {} ({} requirements, depth {})",
                arena.len(),
                arena.requirement_ids().len(),
                arena.depth()
            ));
            output::info(&output::render_tree(&tree));
            Ok(())
        }
        TxCommands::Meta { key, meta } => {
            let tree = authoring.load(key)?;
            let current = tree
                .as_condition()
                .map(|c| c.meta.clone())
                .unwrap_or_default();
            let outcome = authoring.set_meta(key, meta_from_args(current, meta))?;
            report_edit(outcome, &format!("metadata of {}", key));
            Ok(())
        }
        TxCommands::Publish { key, unpublish } => {
            let outcome = authoring.publish(key, !unpublish)?;
            report_edit(outcome, &format!("{} {}", key, published_label(!unpublish)));
            Ok(())
        }
    }
}

fn meta_from_args(mut meta: TransactionMeta, args: &MetaArgs) -> TransactionMeta {
    if let Some(fee) = args.fee {
        meta.fee = Some(fee);
    }
    if let Some(duration) = &args.duration {
        meta.duration = Some(duration.clone());
    }
    if let Some(service) = &args.service {
        meta.service = Some(service.clone());
    }
    if let Some(category) = &args.category {
        meta.category = Some(category.clone());
    }
    meta
}

fn published_label(published: bool) -> &'static str {
    if published {
        "published"
    } else {
        "draft"
    }
}

// ============================================================
// node
// ============================================================

#[instrument(level = "debug", skip(container))]
fn cmd_node(command: &NodeCommands, container: &ServiceContainer) -> CliResult<()> {
    let authoring = &container.authoring;
    match command {
        NodeCommands::AddCondition {
            key,
            parent,
            name,
            mode,
        } => {
            let id = authoring.add_condition(key, parent, name, (*mode).into())?;
            output::action("added condition", &format!("{} [{}]", name, id));
            Ok(())
        }
        NodeCommands::AddRequirement {
            key,
            parent,
            name,
            note,
            group,
            optional,
            source_label,
            source_link,
        } => {
            let source = match (source_label, source_link) {
                (Some(label), Some(link)) => Some(Source {
                    label: label.clone(),
                    link: link.clone(),
                }),
                (None, None) => None,
                _ => {
                    return Err(CliError::InvalidArgs(
                        "--source-label and --source-link go together".to_string(),
                    ))
                }
            };
            let draft = RequirementDraft {
                name: name.clone(),
                note: note.clone(),
                group: group.clone(),
                optional: *optional,
                source,
            };
            let id = authoring.add_requirement(key, parent, draft)?;
            output::action("added requirement", &format!("{} [{}]", name, id));
            Ok(())
        }
        NodeCommands::Update {
            key,
            id,
            name,
            mode,
            note,
            group,
            clear_group,
            optional,
        } => {
            let patch = NodePatch {
                name: name.clone(),
                selection_mode: mode.map(Into::into),
                note: note.clone(),
                group: if *clear_group {
                    Some(None)
                } else {
                    group.clone().map(Some)
                },
                optional: *optional,
                source: None,
            };
            if patch == NodePatch::default() {
                return Err(CliError::InvalidArgs("nothing to update".to_string()));
            }
            let outcome = authoring.update(key, id, &patch)?;
            report_edit(outcome, &format!("node {}", id));
            Ok(())
        }
        NodeCommands::Remove { key, id } => {
            let outcome = authoring.remove(key, id)?;
            report_edit(outcome, &format!("removed {}", id));
            Ok(())
        }
        NodeCommands::Parent { key, id } => match authoring.parent_of(key, id)? {
            Some(parent) => {
                output::info(&describe(&parent));
                Ok(())
            }
            None => Err(CliError::Usage(format!("{} has no parent in {}", id, key))),
        },
        NodeCommands::Get { key, id } => match authoring.find(key, id)? {
            Some(node) => {
                output::info(&to_json(&node)?);
                Ok(())
            }
            None => Err(CliError::Usage(format!("no node {} in {}", id, key))),
        },
    }
}

fn report_edit(outcome: EditOutcome, what: &str) {
    match outcome {
        EditOutcome::Applied => output::success(what),
        EditOutcome::Unchanged => output::warning(&format!("{}: nothing changed", what)),
    }
}

/// One-line summary of a node without its subtree.
fn describe(node: &Node) -> String {
    match &node.kind {
        NodeKind::Condition(c) => format!("{} ({} children)", node, c.children.len()),
        NodeKind::Requirement(_) => node.to_string(),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> CliResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CliError::Usage(format!("cannot render JSON: {}", e)))
}

// ============================================================
// eval
// ============================================================

#[instrument(level = "debug", skip(container))]
fn cmd_eval(command: &EvalCommands, container: &ServiceContainer) -> CliResult<()> {
    let evaluation = &container.evaluation;
    match command {
        EvalCommands::Run {
            key,
            picks,
            checked,
            json,
        } => {
            let report = evaluation.evaluate(key, picks, checked)?;
            if *json {
                output::info(&to_json(&report)?);
            } else {
                print_report(key, &report, checked);
            }
            Ok(())
        }
        EvalCommands::Wizard { key } => {
            let arena = evaluation.load_arena(key)?;
            let checklist = evaluation.interactive(
                &arena,
                container.selector.as_ref(),
                &container.settings.wizard,
            )?;
            let Some(checklist) = checklist else {
                output::warning("wizard cancelled");
                return Ok(());
            };
            let checked: Vec<String> = checklist.checked().iter().cloned().collect();
            let report = evaluation.report(checklist.requirements().to_vec(), &checked);
            print_report(key, &report, &checked);
            Ok(())
        }
    }
}

fn print_report(key: &str, report: &EvaluationReport, checked: &[String]) {
    output::header(&format!("Requirements for {}", key));
    if report.requirements.is_empty() {
        output::detail("(none)");
    }
    for entry in &report.requirements {
        output::requirement(entry, checked.contains(&entry.id));
    }
    if report.complete {
        output::success("complete");
    } else {
        let names = report.missing.iter().map(|r| r.name.as_str()).unique().join(", ");
        output::warning(&format!("missing {}: {}", report.missing.len(), names));
    }
}

// ============================================================
// config
// ============================================================

fn cmd_config(command: &ConfigCommands, settings: &Settings) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("global", &path.display()),
                None => output::warning("no config directory on this platform"),
            }
            output::action("local", &local_config_path(&settings.store_dir).display());
            Ok(())
        }
        ConfigCommands::Init { global } => {
            let path = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("no config directory on this platform".to_string())
                })?
            } else {
                local_config_path(&settings.store_dir)
            };
            write_config_template(&RealFileSystem, &path)?;
            output::action("created", &path.display());
            Ok(())
        }
        ConfigCommands::Template => {
            output::info(&Settings::template());
            Ok(())
        }
    }
}

/// Writes the config template to `path`, refusing to overwrite.
fn write_config_template(fs: &dyn FileSystem, path: &Path) -> CliResult<()> {
    if fs.exists(path) {
        return Err(CliError::Usage(format!(
            "config already exists: {}",
            path.display()
        )));
    }
    if let Some(dir) = path.parent() {
        fs.create_dir_all(dir)
            .map_err(|e| InfraError::io(format!("create {}", dir.display()), e))?;
    }
    fs.write(path, &Settings::template())
        .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
    Ok(())
}
