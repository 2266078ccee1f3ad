//! Command dispatch: one function per subcommand.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tracing::{debug, instrument};

use crate::application::sectioned::{Formatting, SectionStyle};
use crate::application::serialize_to_sectioned_text;
use crate::application::services::{get_leaf, set_leaf, Discipline};
use crate::cli::args::{Cli, Commands, ConfigCommands, OrderArg};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{render, Aircraft, Branch, TraversalOrder, TreeNodeConvert, TreePath, Value};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let command = cli
        .command
        .as_ref()
        .ok_or_else(|| CliError::Usage("no command given, try --help".to_string()))?;

    // commands that must work even with a broken config
    match command {
        Commands::Completion { shell } => return completion(*shell),
        Commands::Config {
            command: ConfigCommands::Template,
        } => {
            output::info(&Settings::template());
            return Ok(());
        }
        _ => {}
    }

    let work_dir = work_dir(cli);
    let settings = Settings::load(work_dir.as_deref())?;
    debug!(?settings, "settings loaded");
    let container = ServiceContainer::new(settings);

    match command {
        Commands::Export {
            input,
            output,
            order,
            raw,
            stdout,
        } => export(&container, input.as_deref(), output.as_deref(), *order, *raw, *stdout),
        Commands::Show { input, order } => show(&container, input.as_deref(), *order),
        Commands::Paths { input, order, values } => paths(&container, input.as_deref(), *order, *values),
        Commands::Get { path, input } => get(&container, path, input.as_deref()),
        Commands::Set {
            path,
            value,
            input,
            output,
        } => set(&container, path, value, input, output.as_deref()),
        Commands::Run { input, output } => run(&container, input.as_deref(), output.as_deref()),
        Commands::Config { command } => config(&container, command, work_dir.as_deref()),
        Commands::Info => info(&container, work_dir.as_deref()),
        Commands::Completion { .. } => Ok(()),
    }
}

fn work_dir(cli: &Cli) -> Option<PathBuf> {
    cli.work_dir.clone().or_else(|| std::env::current_dir().ok())
}

fn order_or_default(container: &ServiceContainer, order: Option<OrderArg>) -> TraversalOrder {
    order
        .map(TraversalOrder::from)
        .unwrap_or(container.settings.export.order)
}

fn parse_path(path: &str) -> CliResult<TreePath> {
    path.parse()
        .map_err(|e| CliError::InvalidArgs(format!("{}", e)))
}

/// Load `input` or build a fresh aircraft.
fn load_or_new(container: &ServiceContainer, input: Option<&Path>) -> CliResult<Aircraft> {
    match input {
        Some(path) => {
            let (aircraft, report) = container.persistence.load_aircraft(path)?;
            for missing in &report.missing {
                output::warning(&format!("ignored unknown entry {}", missing));
            }
            Ok(aircraft)
        }
        None => Ok(Aircraft::new(container.settings.aircraft_name.clone())),
    }
}

#[instrument(skip(container))]
fn export(
    container: &ServiceContainer,
    input: Option<&Path>,
    dest: Option<&Path>,
    order: Option<OrderArg>,
    raw: bool,
    stdout: bool,
) -> CliResult<()> {
    let aircraft = load_or_new(container, input)?;
    let mut style = container.persistence.style();
    style.order = order_or_default(container, order);
    if raw {
        style.formatting = Formatting::Raw;
    }

    if stdout {
        let text = serialize_to_sectioned_text(&aircraft.to_tree(), &style)?;
        io::stdout()
            .lock()
            .write_all(text.as_bytes())
            .map_err(|e| InfraError::io("write sectioned text to stdout", e))?;
        return Ok(());
    }
    let path = container.persistence.export_aircraft(&aircraft, dest, &style)?;
    output::success(&format!("exported {}", path.display()));
    Ok(())
}

#[instrument(skip(container))]
fn show(container: &ServiceContainer, input: Option<&Path>, order: Option<OrderArg>) -> CliResult<()> {
    let aircraft = load_or_new(container, input)?;
    output::info(&aircraft.to_tree_string(order_or_default(container, order)));
    Ok(())
}

#[instrument(skip(container))]
fn paths(
    container: &ServiceContainer,
    input: Option<&Path>,
    order: Option<OrderArg>,
    values: bool,
) -> CliResult<()> {
    let aircraft = load_or_new(container, input)?;
    for (path, value) in aircraft.flatten(order_or_default(container, order)).iter() {
        if values {
            output::info(&format!("{} = {}", path, render(value)));
        } else {
            output::info(path);
        }
    }
    Ok(())
}

#[instrument(skip(container))]
fn get(container: &ServiceContainer, path: &str, input: Option<&Path>) -> CliResult<()> {
    let path = parse_path(path)?;
    let aircraft = load_or_new(container, input)?;
    output::info(&get_leaf(&aircraft, &path)?);
    Ok(())
}

#[instrument(skip(container))]
fn set(
    container: &ServiceContainer,
    path: &str,
    value: &str,
    input: &Path,
    dest: Option<&Path>,
) -> CliResult<()> {
    let path = parse_path(path)?;
    let mut aircraft = load_or_new(container, Some(input))?;
    let old = get_leaf(&aircraft, &path)?;
    set_leaf(&mut aircraft, &path, Value::parse(value))?;
    let new = get_leaf(&aircraft, &path)?;

    // rewrite exactly; rendering would round every leaf of the file
    let style = SectionStyle {
        formatting: Formatting::Raw,
        ..container.persistence.style()
    };
    let target = dest.unwrap_or(input);
    container
        .persistence
        .export_aircraft(&aircraft, Some(target), &style)?;
    output::action("set", &format!("{}: {} -> {}", path, old, new));
    Ok(())
}

#[instrument(skip(container))]
fn run(container: &ServiceContainer, input: Option<&Path>, dest: Option<&Path>) -> CliResult<()> {
    let mut aircraft = load_or_new(container, input)?;
    let before = aircraft.flatten(TraversalOrder::Declaration);
    let chain = container.mdo.standard_chain()?;
    chain.execute(&mut aircraft)?;
    let after = aircraft.flatten(TraversalOrder::Declaration);

    output::header(&format!("{} ({})", aircraft.name, chain.names().join(" -> ")));
    for path in before.diff(&after) {
        if let Some(value) = after.get(&path) {
            output::action(&path.to_string(), &render(value));
        }
    }
    if let Some(path) = dest {
        container
            .persistence
            .export_aircraft(&aircraft, Some(path), &container.persistence.style())?;
        output::success(&format!("exported {}", path.display()));
    }
    Ok(())
}

fn config(container: &ServiceContainer, command: &ConfigCommands, work_dir: Option<&Path>) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&container.settings.to_toml()?),
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => {
            let mark = |p: &Path| if p.exists() { "" } else { " (not found)" };
            match global_config_path() {
                Some(p) => output::action("global", &format!("{}{}", p.display(), mark(p.as_path()))),
                None => output::action("global", &"unavailable"),
            }
            if let Some(dir) = work_dir {
                let p = local_config_path(dir);
                output::action("local", &format!("{}{}", p.display(), mark(p.as_path())));
            }
        }
    }
    Ok(())
}

fn info(container: &ServiceContainer, work_dir: Option<&Path>) -> CliResult<()> {
    let cmd = Cli::command();
    output::header(&format!(
        "{} {}",
        cmd.get_name(),
        cmd.get_version().unwrap_or_default()
    ));
    if let Some(p) = global_config_path() {
        output::detail(&format!("global config: {}", p.display()));
    }
    if let Some(dir) = work_dir {
        output::detail(&format!("local config:  {}", local_config_path(dir).display()));
    }
    output::detail(&format!(
        "output dir:    {}",
        container.settings.output_dir.display()
    ));
    let leaves = Aircraft::default().flatten(TraversalOrder::Declaration).len();
    output::detail(&format!("model leaves:  {}", leaves));
    Ok(())
}

fn completion(shell: Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}
