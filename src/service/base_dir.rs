// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anchoring of relative settings paths.

use crate::domain::{ConfigError, Result};
use directories::ProjectDirs;
use std::env;
use std::path::{Path, PathBuf};

/// The directory relative settings paths are resolved against.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BaseDirectory {
    /// The directory holding the running executable.
    #[default]
    Executable,
    /// The process working directory at load time.
    CurrentDir,
    /// An explicit directory.
    Fixed(PathBuf),
}

impl BaseDirectory {
    /// The OS-appropriate configuration directory for an application.
    ///
    /// # Arguments
    ///
    /// * `app_name` - The application name (e.g., "myapp")
    /// * `qualifier` - The organization/qualifier (e.g., "com.example")
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SourceError`] if no home directory can be found.
    pub fn project_config(app_name: &str, qualifier: &str) -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from(qualifier, "", app_name).ok_or_else(|| ConfigError::SourceError {
                source_name: "base-directory".to_string(),
                message: "Failed to determine project directories".to_string(),
                source: None,
            })?;
        Ok(BaseDirectory::Fixed(proj_dirs.config_dir().to_path_buf()))
    }

    /// Resolves the directory itself.
    pub fn resolve(&self) -> Result<PathBuf> {
        match self {
            BaseDirectory::Executable => {
                let exe = env::current_exe()?;
                exe.parent().map(Path::to_path_buf).ok_or_else(|| {
                    ConfigError::SourceError {
                        source_name: "base-directory".to_string(),
                        message: format!("Executable path has no parent: {}", exe.display()),
                        source: None,
                    }
                })
            }
            BaseDirectory::CurrentDir => Ok(env::current_dir()?),
            BaseDirectory::Fixed(dir) => Ok(dir.clone()),
        }
    }

    /// Returns `path` unchanged if it is absolute, otherwise joined onto the
    /// base directory.
    pub fn anchor(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        Ok(self.resolve()?.join(path))
    }
}
