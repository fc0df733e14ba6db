mod cli;
mod paths;
mod run;

use std::path::Path;

use anyhow::Result;
use cli::{Command, ConfigAction};
use paths::{AppPaths, ENV_CONFIG_DIR};

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Config(config_cmd)) => {
            handle_config_command(config_cmd.action, cli.run.config.as_deref())
        }
        None => run::run(cli.run),
    }
}

fn handle_config_command(action: ConfigAction, explicit: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Where => run_config_where(explicit),
        ConfigAction::Check => run_config_check(explicit),
    }
}

fn run_config_where(explicit: Option<&Path>) -> Result<()> {
    let paths = AppPaths::discover()?;
    let file = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| paths.config_file());
    println!("Configuration:");
    println!("  dir:    {}", paths.config_dir().display());
    println!(
        "  file:   {} ({})",
        file.display(),
        if file.exists() { "present" } else { "missing" }
    );
    println!("  env:    {ENV_CONFIG_DIR} overrides the directory");
    Ok(())
}

fn run_config_check(explicit: Option<&Path>) -> Result<()> {
    let explicit = explicit.map(Path::to_path_buf);
    let (path, config) = run::load_config(explicit.as_ref())?;
    if !path.exists() {
        println!("{} not found; built-in defaults apply", path.display());
        return Ok(());
    }
    println!("{} is valid", path.display());
    for (key, value) in config.assigned() {
        println!("  {key:<20} {value}");
    }
    Ok(())
}
