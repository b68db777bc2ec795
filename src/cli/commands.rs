//! Command dispatch

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::services::{BattleService, LoadReport, RosterService};
use crate::application::ApplicationError;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{CombatKind, DiceRoller, DomainError, NameOrder, Roster, Unit};
use crate::infrastructure::traits::Prompt;
use crate::infrastructure::{InfraError, ServiceContainer};
use crate::tree_traits::TreeNodeConvert;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    // completions need neither config nor roster
    if let Some(Commands::Completion { shell }) = &cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let project_dir = resolve_project_dir(cli.project_dir.as_deref())?;
    let settings = load_settings(cli, &project_dir)?;
    let container = ServiceContainer::new(settings);

    match &cli.command {
        Some(Commands::List) => _list(&container, &project_dir),
        Some(Commands::Show { name }) => _show(&container, &project_dir, name),
        Some(Commands::Tree { check }) => _tree(&container, &project_dir, *check),
        Some(Commands::Fight {
            attacker,
            defender,
            kind,
            rounds,
            seed,
        }) => _fight(&container, &project_dir, attacker, defender, *kind, *rounds, *seed),
        Some(Commands::Play { seed }) => _play(&container, &project_dir, *seed),
        Some(Commands::Config { command }) => _config(&container, &project_dir, command),
        Some(Commands::Completion { .. }) => Ok(()),
        None => Err(CliError::Usage(
            "no command given, see 'muster --help'".to_string(),
        )),
    }
}

fn resolve_project_dir(dir: Option<&Path>) -> CliResult<PathBuf> {
    match dir {
        Some(d) => Ok(d.to_path_buf()),
        None => std::env::current_dir()
            .map_err(|e| CliError::from(InfraError::io("determine current directory", e))),
    }
}

/// Layered settings plus command line overrides.
fn load_settings(cli: &Cli, project_dir: &Path) -> CliResult<Settings> {
    let mut settings = Settings::load(Some(project_dir))?;
    if let Some(roster) = &cli.roster {
        settings.roster = roster.clone();
    }
    if cli.ignore_case {
        settings.name_matching = NameOrder::CaseInsensitive;
    }
    debug!("effective settings: {:?}", settings);
    Ok(settings)
}

fn load_roster(container: &ServiceContainer, project_dir: &Path) -> CliResult<LoadReport> {
    let path = container.settings.roster_path(project_dir);
    let report = container
        .roster_service
        .load(&path, container.settings.name_matching)?;
    for name in &report.duplicates {
        output::warning(&format!("duplicate unit '{name}' ignored"));
    }
    Ok(report)
}

#[instrument(skip(container))]
fn _list(container: &ServiceContainer, project_dir: &Path) -> CliResult<()> {
    let report = load_roster(container, project_dir)?;
    output::header(&format!(
        "{} unit(s) in {}",
        report.roster.len(),
        report.path.display()
    ));
    for unit in &report.roster {
        output::info(unit);
    }
    Ok(())
}

#[instrument(skip(container))]
fn _show(container: &ServiceContainer, project_dir: &Path, name: &str) -> CliResult<()> {
    let report = load_roster(container, project_dir)?;
    let unit = RosterService::find(&report.roster, name)?;
    output::info(unit);
    Ok(())
}

#[instrument(skip(container))]
fn _tree(container: &ServiceContainer, project_dir: &Path, check: bool) -> CliResult<()> {
    let report = load_roster(container, project_dir)?;
    let roster = &report.roster;
    output::info(&roster.to_tree_string());

    if check {
        roster.validate()?;
        output::success(&format!(
            "{} unit(s), height {}: ordered and balanced",
            roster.len(),
            roster.height()
        ));
    }
    Ok(())
}

#[instrument(skip(container))]
fn _fight(
    container: &ServiceContainer,
    project_dir: &Path,
    attacker: &str,
    defender: &str,
    kind: CombatKind,
    rounds: Option<u32>,
    seed: Option<u64>,
) -> CliResult<()> {
    let report = load_roster(container, project_dir)?;
    let mut dice = container.dice(seed);
    let battle = match rounds {
        Some(r) => BattleService::new(r),
        None => BattleService::new(container.battle_service.max_rounds()),
    };

    let result = battle.battle(&report.roster, attacker, defender, kind, dice.as_mut())?;
    for attack in &result.attacks {
        output::info(attack);
        output::info(&"");
    }
    output::action(
        &format!("After {} round(s)", result.rounds),
        &result.outcome,
    );
    Ok(())
}

#[instrument(skip(container))]
fn _play(container: &ServiceContainer, project_dir: &Path, seed: Option<u64>) -> CliResult<()> {
    let report = load_roster(container, project_dir)?;
    let mut dice = container.dice(seed);
    play_session(
        container.prompt.as_ref(),
        &report.roster,
        &container.battle_service,
        dice.as_mut(),
    )
}

#[instrument(skip(container))]
fn _config(
    container: &ServiceContainer,
    project_dir: &Path,
    command: &ConfigCommands,
) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&container.settings.to_toml()?);
        }
        ConfigCommands::Init { global } => {
            let path = if *global {
                global_config_path().ok_or_else(|| ApplicationError::Config {
                    message: "cannot determine global config directory".to_string(),
                })?
            } else {
                local_config_path(project_dir)
            };
            if container.fs.exists(&path) {
                return Err(CliError::Usage(format!(
                    "config already exists: {}",
                    path.display()
                )));
            }
            container
                .fs
                .ensure_parent(&path)
                .map_err(|e| InfraError::io(format!("create {}", path.display()), e))?;
            container
                .fs
                .write(&path, &Settings::template())
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::action("Created", &path.display());
        }
        ConfigCommands::Path => {
            let local = local_config_path(project_dir);
            match global_config_path() {
                Some(global) => print_config_path("global", &global, container),
                None => output::failure(&"global: no config directory available"),
            }
            print_config_path("local", &local, container);
        }
    }
    Ok(())
}

fn print_config_path(label: &str, path: &Path, container: &ServiceContainer) {
    if container.fs.exists(path) {
        output::success(&format!("{label}: {}", path.display()));
    } else {
        output::failure(&format!("{label}: {} (not found)", path.display()));
    }
}

fn console_err(e: io::Error) -> CliError {
    InfraError::Console(e).into()
}

/// Ask until the answer names a unit of the roster; `None` at end of input.
fn ask_unit<'r>(
    prompt: &dyn Prompt,
    roster: &'r Roster,
    question: &str,
) -> CliResult<Option<&'r Unit>> {
    let mut question = question.to_string();
    loop {
        let Some(answer) = prompt.ask(&question).map_err(console_err)? else {
            return Ok(None);
        };
        if let Some(unit) = roster.lookup(answer.trim()) {
            return Ok(Some(unit));
        }
        question = "You'll have to enter their name exactly... Try again: ".to_string();
    }
}

fn ask_kind(prompt: &dyn Prompt) -> CliResult<Option<CombatKind>> {
    let mut question = "Attack kind (ranged, melee or psychic): ";
    loop {
        let Some(answer) = prompt.ask(question).map_err(console_err)? else {
            return Ok(None);
        };
        match answer.parse() {
            Ok(kind) => return Ok(Some(kind)),
            Err(_) => question = "Please enter ranged, melee or psychic: ",
        }
    }
}

/// Interactive session: show the roster, then pick attacker, defender and attack kind.
///
/// End of input ends the session quietly.
pub fn play_session(
    prompt: &dyn Prompt,
    roster: &Roster,
    battle: &BattleService,
    dice: &mut dyn DiceRoller,
) -> CliResult<()> {
    let say = |line: &str| prompt.say(line).map_err(console_err);

    say(&format!("Your army has {} unit(s):", roster.len()))?;
    say("")?;
    for unit in roster {
        say(&unit.to_string())?;
    }
    say("")?;

    loop {
        let Some(attacker) = ask_unit(prompt, roster, "Who initiates the attack? ")? else {
            return Ok(());
        };

        let defender = loop {
            let Some(defender) = ask_unit(prompt, roster, "Who do you want to attack? ")? else {
                return Ok(());
            };
            if defender.name() != attacker.name() {
                break defender;
            }
            say("Please make sure you choose a different unit.")?;
        };

        loop {
            let Some(kind) = ask_kind(prompt)? else {
                return Ok(());
            };
            match battle.attack(roster, attacker.name(), defender.name(), kind, dice) {
                Ok(report) => {
                    say("Combat begins!")?;
                    say(&report.to_string())?;
                    break;
                }
                Err(ApplicationError::Domain(
                    e @ (DomainError::NotPsyker(_) | DomainError::NoWeapons(_)),
                )) => say(&e.to_string())?,
                Err(e) => return Err(e.into()),
            }
        }

        match prompt.ask("Fight again? [y/N] ").map_err(console_err)? {
            Some(answer) if answer.trim().eq_ignore_ascii_case("y") => continue,
            _ => return Ok(()),
        }
    }
}
