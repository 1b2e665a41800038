use anyhow::{Context, Result};
use colored::*;
use srcpack_core::AppError;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

pub fn print_bundle_or_save(rendered: &str, output_path: Option<&Path>, quiet: bool) -> Result<()> {
    match output_path {
        Some(path) => {
            write_to_file(path, rendered)?;
            if !quiet {
                eprintln!(
                    "{} Bundle saved to: {}",
                    "✅".green(),
                    path.display().to_string().blue()
                );
            }
        }
        None => write_to_stdout(rendered)?,
    }
    Ok(())
}

fn write_to_file(path: &Path, content: &str) -> Result<()> {
    let write_err = |source: io::Error| AppError::FileWrite {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| AppError::FileWrite {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let mut file = File::create(path).map_err(write_err)?;
    file.write_all(content.as_bytes()).map_err(write_err)?;
    log::debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

fn write_to_stdout(content: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(content.as_bytes())
        .context("Failed to write to stdout")?;
    if !content.ends_with('\n') {
        handle
            .write_all(b"\n")
            .context("Failed to write newline to stdout")?;
    }
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}
