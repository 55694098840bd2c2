//! Writing the rules source, building it and installing the result.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::fs;

use crate::config::Config;
use crate::errors::{Error, HyperError, Result};
use crate::source::{generate_source, try_parse_source};
use crate::store::EditorStore;

/// The external steps that turn the rules source into the installed consumer file.
pub trait Toolchain {
    fn build(&self) -> impl Future<Output = Error>;
    fn install(&self) -> impl Future<Output = Error>;
}

/// Builds with a shell command inside the project and copies the artifact into place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellToolchain {
    pub project_dir: PathBuf,
    pub build_command: String,
    /// Relative to `project_dir`.
    pub artifact: PathBuf,
    pub install_path: PathBuf,
}

impl Toolchain for ShellToolchain {
    async fn build(&self) -> Error {
        tracing::info!("running `{}`", self.build_command);
        let output = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(&self.build_command)
            .current_dir(&self.project_dir)
            .stdin(Stdio::null())
            .output()
            .await?;
        if output.status.success() {
            return Ok(());
        }
        Err(HyperError::Build {
            command: self.build_command.clone(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        })
    }

    async fn install(&self) -> Error {
        let artifact = self.project_dir.join(&self.artifact);
        let install = |source| HyperError::Install {
            path: self.install_path.display().to_string(),
            source,
        };
        if let Some(parent) = self.install_path.parent() {
            fs::create_dir_all(parent).await.map_err(install)?;
        }
        fs::copy(&artifact, &self.install_path)
            .await
            .map_err(install)?;
        tracing::info!("installed {}", self.install_path.display());
        Ok(())
    }
}

/// Reads the layout from a rules source file. A missing file, or one without the entry point,
/// yields `None`. A file that cannot be parsed is an error and is left untouched.
pub async fn load_source(path: &Path) -> Result<Option<Config>> {
    match fs::read_to_string(path).await {
        Ok(text) => try_parse_source(&text),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("no rules source at {}", path.display());
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

/// Generates, builds and installs the live layout, then marks it saved.
///
/// The store is only marked saved when every step succeeded. A failed build can leave the new
/// source on disk, which the next attempt simply overwrites.
pub async fn apply<T: Toolchain>(store: &mut EditorStore, source_path: &Path, toolchain: &T) -> Error {
    let source = generate_source(store.config());
    if let Some(parent) = source_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(source_path, source).await?;
    tracing::debug!("wrote {}", source_path.display());

    toolchain.build().await?;
    toolchain.install().await?;
    store.mark_saved();
    Ok(())
}
