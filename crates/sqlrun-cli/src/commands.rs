//! Subcommand implementations

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use sqlrun_config::{Settings, SettingsStore, discover_scripts};
use sqlrun_core::{Decision, DecisionRequest, Driver, ScriptSource, SqlRunError};
use sqlrun_driver_sqlite::SqliteDriver;
use sqlrun_exec::{Controller, RunEvent};

use crate::args::{ConnectionArgs, OnError, RunArgs, SaveConfigArgs};

enum Step {
    Event(Option<RunEvent>),
    Interrupted,
}

/// Execute the selected scripts and print progress as the run unfolds.
///
/// Exit codes: 0 for a clean run, 1 when any unit failed or the run
/// stopped early, 2 when the connection could not be opened.
pub async fn run(args: RunArgs, config: Option<PathBuf>) -> anyhow::Result<ExitCode> {
    let store = settings_store(config.as_deref())?;
    let settings = apply_overrides(store.load().await?, &args.connection);
    let params = settings.connection_params()?;

    let sources: Vec<ScriptSource> = if args.scripts.is_empty() {
        let folder = resolve_folder(args.folder.clone(), &settings)?;
        let sources = discover_scripts(&folder).await?;
        if sources.is_empty() {
            println!("no .sql scripts in {}", folder.display());
            return Ok(ExitCode::SUCCESS);
        }
        sources
    } else {
        args.scripts
            .into_iter()
            .map(ScriptSource::from_path)
            .collect()
    };

    let controller = Controller::new(Arc::new(SqliteDriver::new()));
    let mut handle = controller.start(sources, params)?;

    loop {
        let step = tokio::select! {
            event = handle.next_event() => Step::Event(event),
            _ = tokio::signal::ctrl_c() => Step::Interrupted,
        };

        match step {
            Step::Event(Some(RunEvent::ScriptStarted { script_name })) => {
                println!("==> {script_name}");
            }
            Step::Event(Some(RunEvent::UnitSucceeded { unit, .. })) => {
                println!("  [OK] unit {}", unit.ordinal);
            }
            Step::Event(Some(RunEvent::UnitFailed { unit, error, .. })) => match unit {
                Some(unit) => println!("  [ERROR] unit {}: {error}", unit.ordinal),
                None => println!("  [ERROR] {error}"),
            },
            Step::Event(Some(RunEvent::DecisionRequired(request))) => {
                let decision = match args.on_error {
                    OnError::Ask => prompt_decision(&request).await?,
                    OnError::Ignore => Decision::Ignore,
                    OnError::IgnoreAll => Decision::IgnoreAllRemaining,
                    OnError::Stop => Decision::Stop,
                };
                if let Err(error) = handle.respond(decision) {
                    // Cancelled while the prompt was open; the run has
                    // already moved on.
                    tracing::debug!(error = %error, "decision no longer deliverable");
                }
            }
            Step::Event(Some(RunEvent::RunFinished(_))) => break,
            Step::Event(None) => break,
            Step::Interrupted => {
                eprintln!("interrupt received; stopping at the next unit boundary");
                handle.cancel();
            }
        }
    }

    let report = match handle.wait().await {
        Ok(report) => report,
        Err(SqlRunError::Connection(error)) => {
            eprintln!("could not connect: {error}");
            return Ok(ExitCode::from(2));
        }
        Err(error) => return Err(error.into()),
    };

    let summary = report.summary;
    let stopped = if summary.stopped { " (stopped)" } else { "" };
    println!(
        "done: {} succeeded, {} failed{stopped}",
        summary.success_count, summary.error_count
    );

    if summary.error_count > 0 || summary.stopped {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

pub async fn list(folder: Option<PathBuf>, config: Option<PathBuf>) -> anyhow::Result<()> {
    let store = settings_store(config.as_deref())?;
    let settings = store.load().await?;
    let folder = resolve_folder(folder, &settings)?;

    let sources = discover_scripts(&folder).await?;
    if sources.is_empty() {
        println!("no .sql scripts in {}", folder.display());
        return Ok(());
    }
    for source in &sources {
        println!("{}", source.display_name);
    }
    Ok(())
}

pub async fn test(connection: ConnectionArgs, config: Option<PathBuf>) -> anyhow::Result<ExitCode> {
    let store = settings_store(config.as_deref())?;
    let settings = apply_overrides(store.load().await?, &connection);
    let params = settings.connection_params()?;

    let driver = SqliteDriver::new();
    println!(
        "testing connection to {} ({})",
        params.endpoint(),
        driver.name()
    );
    match driver.test_connection(&params).await {
        Ok(()) => {
            println!("connection ok");
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            eprintln!("connection failed: {error}");
            Ok(ExitCode::from(2))
        }
    }
}

pub async fn save_config(args: SaveConfigArgs, config: Option<PathBuf>) -> anyhow::Result<()> {
    let store = settings_store(config.as_deref())?;
    let mut settings = apply_overrides(store.load().await?, &args.connection);
    if let Some(folder) = &args.folder {
        settings.folder = folder.to_string_lossy().into_owned();
    }

    store.save(&settings).await?;
    println!("settings saved to {}", store.path().display());
    Ok(())
}

/// Prompt on stderr and read one answer line from stdin.
///
/// EOF counts as Stop: with stdin closed there is nobody left to answer.
async fn prompt_decision(request: &DecisionRequest) -> anyhow::Result<Decision> {
    match &request.failed_unit {
        Some(unit) => eprintln!(
            "unit {} of {} failed: {}",
            unit.ordinal, request.script_name, request.error_message
        ),
        None => eprintln!("{} failed: {}", request.script_name, request.error_message),
    }

    loop {
        eprint!("[i]gnore, ignore [a]ll remaining, [s]top? ");
        let (bytes, line) = tokio::task::spawn_blocking(|| {
            use std::io::BufRead;
            let mut line = String::new();
            let bytes = std::io::stdin().lock().read_line(&mut line)?;
            std::io::Result::Ok((bytes, line))
        })
        .await??;

        if bytes == 0 {
            eprintln!();
            return Ok(Decision::Stop);
        }
        match line.trim().to_ascii_lowercase().as_str() {
            "i" | "ignore" => return Ok(Decision::Ignore),
            "a" | "all" => return Ok(Decision::IgnoreAllRemaining),
            "s" | "stop" => return Ok(Decision::Stop),
            other => eprintln!("unrecognized answer '{other}'"),
        }
    }
}

fn settings_store(config: Option<&Path>) -> anyhow::Result<SettingsStore> {
    Ok(match config {
        Some(path) => SettingsStore::new(path),
        None => SettingsStore::default_location()?,
    })
}

/// Layer command line overrides over the stored settings.
fn apply_overrides(mut settings: Settings, connection: &ConnectionArgs) -> Settings {
    if let Some(user) = &connection.user {
        settings.user = user.clone();
    }
    if let Some(password) = &connection.password {
        settings.password = password.clone();
    }
    if let Some(host) = &connection.host {
        settings.host = host.clone();
    }
    if let Some(port) = &connection.port {
        settings.port = port.clone();
    }
    if let Some(service) = &connection.service {
        settings.service = service.clone();
    }
    settings
}

fn resolve_folder(folder: Option<PathBuf>, settings: &Settings) -> anyhow::Result<PathBuf> {
    if let Some(folder) = folder {
        return Ok(folder);
    }
    if !settings.folder.trim().is_empty() {
        return Ok(PathBuf::from(settings.folder.trim()));
    }
    anyhow::bail!("no script folder given; pass one or save it with `sqlrun save-config --folder`")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overrides(user: Option<&str>, service: Option<&str>) -> ConnectionArgs {
        ConnectionArgs {
            user: user.map(String::from),
            password: None,
            host: None,
            port: None,
            service: service.map(String::from),
        }
    }

    #[test]
    fn test_overrides_replace_only_given_fields() {
        let settings = Settings {
            user: "saved".into(),
            password: "kept".into(),
            ..Settings::default()
        };
        let merged = apply_overrides(settings, &overrides(Some("cli"), Some("app.db")));
        assert_eq!(merged.user, "cli");
        assert_eq!(merged.password, "kept");
        assert_eq!(merged.service, "app.db");
        assert_eq!(merged.host, "localhost");
    }

    #[test]
    fn test_folder_falls_back_to_settings() {
        let settings = Settings {
            folder: "  /srv/scripts  ".into(),
            ..Settings::default()
        };
        let folder = resolve_folder(None, &settings).unwrap();
        assert_eq!(folder, PathBuf::from("/srv/scripts"));

        let folder = resolve_folder(Some(PathBuf::from("override")), &settings).unwrap();
        assert_eq!(folder, PathBuf::from("override"));
    }

    #[test]
    fn test_missing_folder_is_an_error() {
        let error = resolve_folder(None, &Settings::default()).unwrap_err();
        assert!(error.to_string().contains("no script folder"));
    }
}
