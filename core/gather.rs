use crate::config::{CollectConfig, ReadErrorPolicy};
use crate::error::{AppError, Result};
use crate::output_formats::BundleDocument;
use byte_unit::{Byte, UnitType};
use log;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone)]
pub struct FileInfo {
    pub path: PathBuf,
    pub relative_path: String,
    pub content: String,
}

/// Walks `project_root` and collects every matching, non-empty text file.
///
/// Excluded directory names are pruned before descent at any depth. Symlinked
/// directories are never entered; symlinked files are read through. Per-entry
/// failures abort the run unless the config asks to skip them.
pub fn gather_contracts(project_root: &Path, config: &CollectConfig) -> Result<BundleDocument> {
    check_root(project_root)?;
    log::info!("Walking project directory: {}", project_root.display());
    log::debug!(
        "Excluded directories: {:?}, extensions: {:?}, file names: {:?}",
        config.excluded_dir_names,
        config.matched_extensions,
        config.matched_file_names
    );

    let mut contracts = BTreeMap::new();
    let mut skipped = 0usize;

    let walker = WalkDir::new(project_root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_pruned_dir(entry, config));

    for entry_result in walker {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("failed to walk root directory"));
                return Err(AppError::RootDir {
                    path: project_root.to_path_buf(),
                    source,
                });
            }
            Err(e) => {
                apply_read_policy(AppError::from(e), config.read_error_policy, &mut skipped)?;
                continue;
            }
        };

        if !is_candidate_file(&entry) {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();
        if !config.matches_file(&file_name) {
            log::trace!("Excluding file: {}", entry.path().display());
            continue;
        }

        match read_file(entry.path(), project_root) {
            Ok(Some(info)) => {
                log::trace!("Including file: {}", info.relative_path);
                contracts.insert(info.relative_path, info.content);
            }
            Ok(None) => {
                log::debug!("Skipping empty file: {}", entry.path().display());
            }
            Err(e) => apply_read_policy(e, config.read_error_policy, &mut skipped)?,
        }
    }

    let document = BundleDocument::new(config.manifest_path.clone(), contracts);
    let total_size = Byte::from_u64(document.total_bytes())
        .get_appropriate_unit(UnitType::Binary)
        .to_string();
    log::info!(
        "Collected {} files ({}) from {}",
        document.file_count(),
        total_size,
        project_root.display()
    );
    if skipped > 0 {
        log::warn!("Skipped {} unreadable entries", skipped);
    }
    Ok(document)
}

/// Reads one file as UTF-8 text. `Ok(None)` means the file was empty.
pub fn read_file(path: &Path, project_root: &Path) -> Result<Option<FileInfo>> {
    let bytes = fs::read(path).map_err(|e| AppError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    if bytes.is_empty() {
        return Ok(None);
    }
    let content = String::from_utf8(bytes).map_err(|_| AppError::Decode {
        path: path.to_path_buf(),
    })?;
    let relative = pathdiff::diff_paths(path, project_root).unwrap_or_else(|| path.to_path_buf());
    Ok(Some(FileInfo {
        path: path.to_path_buf(),
        relative_path: normalize_relative_path(&relative),
        content,
    }))
}

/// Root-relative key: `/`-separated, with no leading `./`.
pub fn normalize_relative_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn check_root(project_root: &Path) -> Result<()> {
    let metadata = fs::metadata(project_root).map_err(|e| AppError::RootDir {
        path: project_root.to_path_buf(),
        source: e,
    })?;
    if !metadata.is_dir() {
        return Err(AppError::RootDir {
            path: project_root.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotADirectory, "not a directory"),
        });
    }
    Ok(())
}

fn is_pruned_dir(entry: &DirEntry, config: &CollectConfig) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let pruned = entry
        .file_name()
        .to_str()
        .is_some_and(|name| config.is_excluded_dir(name));
    if pruned {
        log::trace!("Pruning excluded directory: {}", entry.path().display());
    }
    pruned
}

fn is_candidate_file(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    if file_type.is_file() {
        return true;
    }
    if file_type.is_symlink() {
        // Dangling links stay candidates so the read reports them.
        if entry.path().is_dir() {
            log::trace!("Not following directory symlink: {}", entry.path().display());
            return false;
        }
        return true;
    }
    false
}

fn apply_read_policy(err: AppError, policy: ReadErrorPolicy, skipped: &mut usize) -> Result<()> {
    match policy {
        ReadErrorPolicy::Skip if err.is_per_file() => {
            log::warn!("Skipping unreadable entry: {}", err);
            *skipped += 1;
            Ok(())
        }
        _ => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, path: &str, content: &[u8]) -> PathBuf {
        let file_path = dir.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }

    fn keys(document: &BundleDocument) -> Vec<&str> {
        document.contracts.keys().map(String::as_str).collect()
    }

    fn sample_tree() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "Cargo.toml", b"[package]\nname=\"x\"");
        create_test_file(root, "src/lib.rs", b"fn main(){}");
        create_test_file(root, "target/debug/out.rs", b"junk");
        create_test_file(root, "Cargo.lock", b"lockdata");
        create_test_file(root, "notes.txt", b"hello");
        temp_dir
    }

    #[test]
    fn collects_matching_files_and_skips_excluded_dirs() {
        let temp_dir = sample_tree();
        let document = gather_contracts(temp_dir.path(), &CollectConfig::default()).unwrap();

        assert_eq!(keys(&document), vec!["Cargo.lock", "Cargo.toml", "src/lib.rs"]);
        assert_eq!(document.contracts["Cargo.toml"], "[package]\nname=\"x\"");
        assert_eq!(document.contracts["src/lib.rs"], "fn main(){}");
        assert_eq!(document.contracts["Cargo.lock"], "lockdata");
        assert_eq!(document.manifest_path, "Cargo.toml");
    }

    #[test]
    fn empty_files_are_skipped_but_whitespace_is_kept() {
        let temp_dir = TempDir::new().unwrap();
        create_test_file(temp_dir.path(), "empty.rs", b"");
        create_test_file(temp_dir.path(), "blank.rs", b" \n");
        let document = gather_contracts(temp_dir.path(), &CollectConfig::default()).unwrap();

        assert_eq!(keys(&document), vec!["blank.rs"]);
        assert_eq!(document.contracts["blank.rs"], " \n");
        assert!(document.contracts.values().all(|c| !c.is_empty()));
    }

    #[test]
    fn builtin_excludes_apply_at_any_depth() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, ".git/hooks/pre-commit.rs", b"x");
        create_test_file(root, ".idea/workspace.toml", b"x");
        create_test_file(root, "contracts/vault/target/ink/vault.rs", b"x");
        create_test_file(root, "contracts/vault/.git/config.toml", b"x");
        create_test_file(root, "contracts/vault/lib.rs", b"mod vault;");
        let document = gather_contracts(root, &CollectConfig::default()).unwrap();

        assert_eq!(keys(&document), vec!["contracts/vault/lib.rs"]);
    }

    #[test]
    fn user_excludes_prune_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "vendor/dep/lib.rs", b"x");
        create_test_file(root, "crates/a/vendor/lib.rs", b"x");
        create_test_file(root, "crates/a/src/lib.rs", b"pub fn a() {}");
        let config = CollectConfig::new("Cargo.toml", ["vendor"]);
        let document = gather_contracts(root, &config).unwrap();

        assert_eq!(keys(&document), vec!["crates/a/src/lib.rs"]);
    }

    #[test]
    fn excluded_names_only_prune_directories() {
        let temp_dir = TempDir::new().unwrap();
        create_test_file(temp_dir.path(), "target.rs", b"// a file named like a dir");
        let config = CollectConfig::new("Cargo.toml", ["target.rs"]);
        let document = gather_contracts(temp_dir.path(), &config).unwrap();

        assert_eq!(keys(&document), vec!["target.rs"]);
    }

    #[test]
    fn hidden_directories_keep_their_leading_dot() {
        let temp_dir = TempDir::new().unwrap();
        create_test_file(temp_dir.path(), ".cargo/config.toml", b"[build]");
        let document = gather_contracts(temp_dir.path(), &CollectConfig::default()).unwrap();

        assert_eq!(keys(&document), vec![".cargo/config.toml"]);
    }

    #[test]
    fn manifest_path_is_copied_verbatim() {
        let temp_dir = sample_tree();
        let config = CollectConfig::new("does/not/exist.toml", Vec::<String>::new());
        let document = gather_contracts(temp_dir.path(), &config).unwrap();

        assert_eq!(document.manifest_path, "does/not/exist.toml");
    }

    #[test]
    fn repeated_runs_are_identical() {
        let temp_dir = sample_tree();
        let config = CollectConfig::default();
        let first = gather_contracts(temp_dir.path(), &config).unwrap();
        let second = gather_contracts(temp_dir.path(), &config).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn missing_root_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let err = gather_contracts(&temp_dir.path().join("gone"), &CollectConfig::default())
            .unwrap_err();
        assert!(matches!(err, AppError::RootDir { .. }));
    }

    #[test]
    fn file_root_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let file = create_test_file(temp_dir.path(), "lib.rs", b"x");
        let err = gather_contracts(&file, &CollectConfig::default()).unwrap_err();
        assert!(matches!(err, AppError::RootDir { .. }));
    }

    #[test]
    fn non_utf8_file_aborts_by_default() {
        let temp_dir = TempDir::new().unwrap();
        create_test_file(temp_dir.path(), "ok.rs", b"fn ok() {}");
        create_test_file(temp_dir.path(), "bad.rs", &[0xff, 0xfe, 0x00]);
        let err = gather_contracts(temp_dir.path(), &CollectConfig::default()).unwrap_err();

        match err {
            AppError::Decode { path } => assert!(path.ends_with("bad.rs")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_utf8_file_is_skipped_under_skip_policy() {
        let temp_dir = TempDir::new().unwrap();
        create_test_file(temp_dir.path(), "ok.rs", b"fn ok() {}");
        create_test_file(temp_dir.path(), "bad.rs", &[0xff, 0xfe, 0x00]);
        let config = CollectConfig {
            read_error_policy: ReadErrorPolicy::Skip,
            ..CollectConfig::default()
        };
        let document = gather_contracts(temp_dir.path(), &config).unwrap();

        assert_eq!(keys(&document), vec!["ok.rs"]);
    }

    #[test]
    fn unmatched_binary_files_are_never_read() {
        let temp_dir = TempDir::new().unwrap();
        create_test_file(temp_dir.path(), "logo.png", &[0x89, 0x50, 0x4e, 0x47, 0xff]);
        create_test_file(temp_dir.path(), "lib.rs", b"x");
        let document = gather_contracts(temp_dir.path(), &CollectConfig::default()).unwrap();

        assert_eq!(keys(&document), vec!["lib.rs"]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_files_are_read_and_symlinked_dirs_are_not_entered() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(outside.path(), "shared/lib.rs", b"pub mod shared;");
        create_test_file(root, "src/real.rs", b"pub fn real() {}");
        symlink(outside.path().join("shared"), root.join("linked_dir")).unwrap();
        symlink(root.join("src/real.rs"), root.join("alias.rs")).unwrap();
        let document = gather_contracts(root, &CollectConfig::default()).unwrap();

        assert_eq!(keys(&document), vec!["alias.rs", "src/real.rs"]);
        assert_eq!(document.contracts["alias.rs"], "pub fn real() {}");
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_follows_read_policy() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        symlink(root.join("missing.rs"), root.join("dangling.rs")).unwrap();
        assert!(matches!(
            gather_contracts(root, &CollectConfig::default()),
            Err(AppError::FileRead { .. })
        ));

        let config = CollectConfig {
            read_error_policy: ReadErrorPolicy::Skip,
            ..CollectConfig::default()
        };
        assert!(gather_contracts(root, &config).unwrap().contracts.is_empty());
    }

    #[test]
    fn normalize_strips_current_dir_prefix() {
        assert_eq!(normalize_relative_path(Path::new("./src/lib.rs")), "src/lib.rs");
        assert_eq!(normalize_relative_path(Path::new("Cargo.toml")), "Cargo.toml");
        assert_eq!(
            normalize_relative_path(&Path::new("a").join("b").join("c.rs")),
            "a/b/c.rs"
        );
    }
}
