// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Section-based `batc.toml` loading shared by the batc binaries.
//!
//! One `batc.toml` holds a table per consumer; each config type names its
//! table through [`ConfigFile::SECTION`] and ignores the rest of the file.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("config file {path} has no [{section}] table")]
    MissingSection {
        path: PathBuf,
        section: &'static str,
    },
}

/// `batc.toml` lookup order: working directory, XDG config dir, `/etc`.
fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("batc.toml")];
    if let Some(base) = dirs::config_dir() {
        paths.push(base.join("batc").join("batc.toml"));
    }
    paths.push(PathBuf::from("/etc/batc/batc.toml"));
    paths
}

/// Parse `path` and deserialize its `C::SECTION` table, `None` when the
/// file has no such table.
fn read_section<C: ConfigFile>(path: &Path) -> Result<Option<C>, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let table: toml::Table = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    match table.get(C::SECTION) {
        Some(value) => value
            .clone()
            .try_into()
            .map(Some)
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }),
        None => Ok(None),
    }
}

/// A config type stored as one table of `batc.toml`.
pub trait ConfigFile: Sized + Default + DeserializeOwned {
    /// Table header this type is read from (e.g. `"batc-server"`).
    const SECTION: &'static str;

    /// Load from a specific file, which must contain the table.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        read_section(path)?.ok_or_else(|| ConfigError::MissingSection {
            path: path.to_path_buf(),
            section: Self::SECTION,
        })
    }

    /// Walk the default search paths and load from the first file carrying
    /// the table. Falls back to `Default` when nothing matches; the path
    /// the config came from is reported alongside.
    fn load_from_default_paths() -> Result<(Self, Option<PathBuf>), ConfigError> {
        for path in search_paths() {
            if !path.exists() {
                continue;
            }
            if let Some(config) = read_section(&path)? {
                return Ok((config, Some(path)));
            }
        }
        Ok((Self::default(), None))
    }
}
