use crate::error::{AppError, Result};
use log;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const DEFAULT_MANIFEST_PATH: &str = "Cargo.toml";
pub const DEFAULT_CONFIG_FILENAME: &str = "srcpack.toml";
pub const PROJECT_ROOT_ENV: &str = "PROJECT_ROOT";

/// Directory names pruned wherever they appear in the tree.
pub const BUILTIN_EXCLUDED_DIRS: &[&str] = &[".idea", ".git", "target"];
/// Suffixes matched against the full file name, not just the extension.
pub const MATCHED_EXTENSIONS: &[&str] = &["rs", "toml"];
pub const MATCHED_FILE_NAMES: &[&str] = &["Cargo.lock"];

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReadErrorPolicy {
    #[default]
    Abort,
    Skip,
}

/// Optional `srcpack.toml` read from the project root (or `--config`).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub manifest: Option<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub on_read_error: Option<ReadErrorPolicy>,
    #[serde(default)]
    pub escape_unicode: Option<bool>,
}

impl FileConfig {
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        log::info!("Loading configuration from: {}", config_path.display());
        let toml_content = fs::read_to_string(config_path).map_err(|e| AppError::FileRead {
            path: config_path.to_path_buf(),
            source: e,
        })?;
        toml::from_str::<FileConfig>(&toml_content).map_err(|e| {
            AppError::TomlParse(format!(
                "Error parsing config file '{}': {}. Check TOML syntax and structure.",
                config_path.display(),
                e
            ))
        })
    }
}

/// Everything the collector needs to know. Built once, never mutated during a walk.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectConfig {
    pub manifest_path: String,
    pub excluded_dir_names: BTreeSet<String>,
    pub matched_extensions: Vec<String>,
    pub matched_file_names: Vec<String>,
    pub read_error_policy: ReadErrorPolicy,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            manifest_path: DEFAULT_MANIFEST_PATH.to_string(),
            excluded_dir_names: BUILTIN_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect(),
            matched_extensions: MATCHED_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            matched_file_names: MATCHED_FILE_NAMES.iter().map(|s| s.to_string()).collect(),
            read_error_policy: ReadErrorPolicy::default(),
        }
    }
}

impl CollectConfig {
    pub fn new<I, S>(manifest_path: impl Into<String>, extra_excludes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = Self {
            manifest_path: manifest_path.into(),
            ..Self::default()
        };
        config.add_excludes(extra_excludes);
        config
    }

    pub fn from_file_config(file_config: &FileConfig) -> Self {
        let mut config = Self::default();
        if let Some(manifest) = &file_config.manifest {
            config.manifest_path = manifest.clone();
        }
        config.add_excludes(file_config.exclude.iter().cloned());
        if let Some(policy) = file_config.on_read_error {
            config.read_error_policy = policy;
        }
        config
    }

    /// Unions `names` into the excluded set. Blank names are ignored.
    pub fn add_excludes<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            let trimmed = name.trim_end_matches(['/', '\\']);
            if trimmed.is_empty() {
                log::warn!("Ignoring empty exclude entry");
                continue;
            }
            if self.excluded_dir_names.insert(trimmed.to_string()) {
                log::trace!("Added excluded directory name: {}", trimmed);
            }
        }
    }

    pub fn is_excluded_dir(&self, dir_name: &str) -> bool {
        self.excluded_dir_names.contains(dir_name)
    }

    pub fn matches_file(&self, file_name: &str) -> bool {
        self.matched_extensions
            .iter()
            .any(|ext| file_name.ends_with(ext.as_str()))
            || self.matched_file_names.iter().any(|name| name == file_name)
    }

    /// Resolves the directory to pack: CLI value, then `PROJECT_ROOT`, then the
    /// current directory. The result must exist and be a directory.
    pub fn determine_project_root(cli_project_root: Option<&PathBuf>) -> Result<PathBuf> {
        let path_str_opt = cli_project_root
            .map(|p| p.to_string_lossy().to_string())
            .or_else(|| env::var(PROJECT_ROOT_ENV).ok().filter(|s| !s.is_empty()));

        let path_to_resolve = match path_str_opt {
            Some(p_str) => PathBuf::from(shellexpand::tilde(&p_str).as_ref()),
            None => env::current_dir().map_err(AppError::Io)?,
        };

        let resolved = path_to_resolve
            .canonicalize()
            .map_err(|e| AppError::RootDir {
                path: path_to_resolve.clone(),
                source: e,
            })?;
        if !resolved.is_dir() {
            return Err(AppError::RootDir {
                path: resolved,
                source: io::Error::new(io::ErrorKind::NotADirectory, "not a directory"),
            });
        }
        Ok(resolved)
    }

    pub fn resolve_config_path(
        project_root: &Path,
        cli_config_file: Option<&PathBuf>,
        cli_disable_config: bool,
    ) -> Result<Option<PathBuf>> {
        if cli_disable_config {
            log::debug!("Config file loading disabled via CLI flag.");
            return Ok(None);
        }

        match cli_config_file {
            Some(path) => {
                let expanded = PathBuf::from(
                    shellexpand::tilde(&path.to_string_lossy()).as_ref(),
                );
                if !expanded.is_file() {
                    return Err(AppError::Config(format!(
                        "Specified config file not found at path: {}",
                        expanded.display()
                    )));
                }
                log::debug!("Using specified config file path: {}", expanded.display());
                Ok(Some(expanded))
            }
            None => {
                let default_path = project_root.join(DEFAULT_CONFIG_FILENAME);
                if default_path.is_file() {
                    log::debug!("Using default config file path: {}", default_path.display());
                    Ok(Some(default_path))
                } else {
                    log::debug!(
                        "No config file specified and default not found at: {}",
                        default_path.display()
                    );
                    Ok(None)
                }
            }
        }
    }
}
