mod cli_args;
mod commands;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use log;
use std::path::Path;
use std::process;

use cli_args::{Cli, ProjectConfigOpts};
use srcpack_core::{AppError, CollectConfig, FileConfig, JsonStyle, ReadErrorPolicy};

fn main() {
    let cli_args = Cli::parse();

    setup_logging(cli_args.quiet, cli_args.verbose);

    log::debug!("CLI args parsed: {:?}", cli_args);

    let exit_code = match run_app(cli_args) {
        Ok(_) => {
            log::info!("Application finished successfully.");
            0
        }
        Err(e) => {
            let exit_code = exit_code_for(&e);
            // Failures are always reported; -q only silences logs.
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            exit_code
        }
    };
    log::debug!("Exiting with code {}", exit_code);
    process::exit(exit_code);
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<AppError>() {
        Some(AppError::Config(_)) => 1,
        Some(AppError::TomlParse(_)) => 1,
        Some(AppError::Io(_)) => 2,
        Some(AppError::RootDir { .. }) => 2,
        Some(AppError::FileRead { .. }) => 2,
        Some(AppError::Decode { .. }) => 2,
        Some(AppError::FileWrite { .. }) => 2,
        Some(AppError::WalkDir(_)) => 2,
        Some(AppError::JsonSerialize(_)) => 6,
        Some(_) => 1,
        None => 1,
    }
}

fn setup_logging(quiet: bool, verbose: u8) {
    let log_level = if quiet {
        log::LevelFilter::Off
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();
    log::trace!("Logger initialized with level: {:?}", log_level);
}

fn run_app(cli: Cli) -> Result<()> {
    if let Some(shell) = cli.completion {
        log::debug!("Generating {} completions...", shell);
        return commands::completion::handle_completion(shell);
    }
    log::debug!("Executing pack...");
    commands::pack::handle_pack_command(&cli)
}

/// Builds the collector config and JSON style: defaults, then the TOML file,
/// then command-line flags. Exclude lists from every layer are unioned.
pub fn load_config_for_command(
    project_root: &Path,
    project_opts: &ProjectConfigOpts,
    cli: &Cli,
) -> Result<(CollectConfig, JsonStyle)> {
    let config_path = CollectConfig::resolve_config_path(
        project_root,
        project_opts.config.as_ref(),
        project_opts.no_config,
    )
    .context("Failed to resolve configuration path")?;

    let file_config = match &config_path {
        Some(path) => FileConfig::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => FileConfig::default(),
    };

    Ok(merge_config_with_cli_overrides(&file_config, cli))
}

fn merge_config_with_cli_overrides(file_config: &FileConfig, cli: &Cli) -> (CollectConfig, JsonStyle) {
    log::trace!("Applying CLI overrides to config...");
    let mut config = CollectConfig::from_file_config(file_config);

    if let Some(manifest) = &cli.collect.manifest {
        config.manifest_path = manifest.clone();
    }
    config.add_excludes(cli.collect.exclude.iter().cloned());
    if cli.collect.skip_unreadable {
        config.read_error_policy = ReadErrorPolicy::Skip;
    }

    let mut style = JsonStyle::default();
    if let Some(escape) = file_config.escape_unicode {
        style.escape_non_ascii = escape;
    }
    if cli.output.unicode {
        style.escape_non_ascii = false;
    }

    log::trace!("Config after CLI overrides: {:?}, {:?}", config, style);
    (config, style)
}
