use clap::{Args, Parser};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct ProjectConfigOpts {
    #[arg(
        long,
        help = "Directory to pack (default: $PROJECT_ROOT, then the current dir).",
        help_heading = "Project Setup",
        value_name = "PATH"
    )]
    pub root: Option<PathBuf>,

    #[arg(
        long,
        help = "Path of a TOML config file (default: <root>/srcpack.toml if present).",
        value_name = "CONFIG_FILE",
        conflicts_with = "no_config",
        help_heading = "Project Setup"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        help = "Do not load any TOML config file.",
        conflicts_with = "config",
        help_heading = "Project Setup"
    )]
    pub no_config: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CollectOpts {
    #[arg(
        long,
        help = "Manifest path written to the `manifest-path` field [default: Cargo.toml].",
        value_name = "PATH",
        help_heading = "Collection"
    )]
    pub manifest: Option<String>,

    #[arg(
        long,
        num_args = 1..,
        help = "Directory names to skip at any depth, in addition to .idea, .git and target.",
        value_name = "NAME",
        help_heading = "Collection"
    )]
    pub exclude: Vec<String>,

    #[arg(
        long,
        help = "Warn about and skip files that cannot be read as text instead of aborting.",
        help_heading = "Collection"
    )]
    pub skip_unreadable: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct OutputOpts {
    #[arg(
        short = 'o',
        long,
        help = "Write the document to FILE instead of standard output.",
        value_name = "FILE",
        help_heading = "Output Control"
    )]
    pub output: Option<PathBuf>,

    #[arg(
        long,
        help = "Emit non-ASCII characters as-is instead of \\uXXXX escapes.",
        help_heading = "Output Control"
    )]
    pub unicode: bool,
}

#[derive(Parser, Debug)]
#[command(
    name = "srcpack",
    author,
    version,
    about = "Pack a contract source tree into a single JSON document.",
    long_about = "srcpack walks a project directory, collects every .rs, .toml and Cargo.lock file \n(skipping .idea, .git, target and any --exclude directories) and prints one JSON \ndocument mapping relative paths to file contents, plus the manifest path.",
    help_template = "{about-section}\nUsage: {usage}\n\n{all-args}{after-help}",
    after_help = "EXAMPLES:\n  srcpack > contract.json\n  srcpack --manifest contracts/vault/Cargo.toml --exclude vendor deployments\n  srcpack --root ~/work/vault -o build/vault.json"
)]
pub struct Cli {
    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,
    #[clap(flatten)]
    pub collect: CollectOpts,
    #[clap(flatten)]
    pub output: OutputOpts,

    #[arg(
        long,
        value_enum,
        value_name = "SHELL",
        help = "Print a shell completion script and exit."
    )]
    pub completion: Option<Shell>,

    #[arg(short, long, action = clap::ArgAction::Count, help = "Increase message verbosity (-v, -vv, -vvv).")]
    pub verbose: u8,

    #[arg(short, long, help = "Silence informational messages and warnings.")]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_leave_everything_unset() {
        let cli = Cli::try_parse_from(["srcpack"]).unwrap();
        assert_eq!(cli.collect.manifest, None);
        assert!(cli.collect.exclude.is_empty());
        assert!(!cli.collect.skip_unreadable);
        assert_eq!(cli.output.output, None);
        assert!(cli.completion.is_none());
    }

    #[test]
    fn exclude_takes_several_names_and_repeats() {
        let cli = Cli::try_parse_from([
            "srcpack",
            "--exclude",
            "vendor",
            "deployments",
            "--manifest",
            "ink/Cargo.toml",
            "--exclude",
            "node_modules",
        ])
        .unwrap();
        assert_eq!(cli.collect.exclude, vec!["vendor", "deployments", "node_modules"]);
        assert_eq!(cli.collect.manifest.as_deref(), Some("ink/Cargo.toml"));
    }

    #[test]
    fn exclude_requires_a_value() {
        assert!(Cli::try_parse_from(["srcpack", "--exclude"]).is_err());
    }

    #[test]
    fn config_flags_conflict() {
        assert!(Cli::try_parse_from(["srcpack", "--config", "a.toml", "--no-config"]).is_err());
    }
}
