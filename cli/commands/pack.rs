use crate::cli_args::Cli;
use crate::load_config_for_command;
use crate::output;
use anyhow::{Context, Result};
use log;
use srcpack_core::{CollectConfig, gather_contracts};

pub fn handle_pack_command(cli: &Cli) -> Result<()> {
    let project_root = CollectConfig::determine_project_root(cli.project_config.root.as_ref())
        .context("Failed to determine project root")?;
    log::info!("Project root determined: {}", project_root.display());

    let (config, style) = load_config_for_command(&project_root, &cli.project_config, cli)
        .context("Failed to load configuration")?;

    let document = gather_contracts(&project_root, &config).with_context(|| {
        format!("Failed to collect sources under {}", project_root.display())
    })?;

    // Rendered in full before anything is written, so a failure leaves no partial output.
    let rendered = document
        .to_json(style)
        .context("Failed to serialize bundle document")?;

    output::print_bundle_or_save(&rendered, cli.output.output.as_deref(), cli.quiet)
}
