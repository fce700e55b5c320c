// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs::read_to_string;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::db::DEFAULT_MAX_LOG_ROWS;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::error::invalid;
use crate::overview::DEFAULT_OVERVIEW_SESSIONS;

#[derive(Deserialize, Clone, PartialEq, Debug)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// The address the HTTP server listens on.
    pub bind: String,
    /// Path to the SQLite database.
    pub database: PathBuf,
    /// The most session log rows kept before the oldest are deleted.
    pub max_log_rows: usize,
    /// How many recent sessions an overview covers.
    pub overview_sessions: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
            database: PathBuf::from("flipdeck.db"),
            max_log_rows: DEFAULT_MAX_LOG_ROWS,
            overview_sessions: DEFAULT_OVERVIEW_SESSIONS,
        }
    }
}

impl Config {
    /// Load the configuration file at the given path, or the defaults if no
    /// path is given.
    pub fn load(path: Option<&Path>) -> Fallible<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return fail(format!("config file does not exist: {}", path.display()));
        }
        let content = read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        if config.max_log_rows == 0 {
            return invalid("max_log_rows must be positive");
        }
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn database_path(&self) -> Fallible<&str> {
        self.database
            .to_str()
            .ok_or_else(|| ErrorReport::new("invalid database path"))
    }
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use tempfile::tempdir;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_defaults_without_file() -> Fallible<()> {
        let config = Config::load(None)?;
        assert_eq!(config, Config::default());
        assert_eq!(config.max_log_rows, 50_000);
        assert_eq!(config.overview_sessions, 3);
        Ok(())
    }

    #[test]
    fn test_partial_file() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("flipdeck.toml");
        write(&path, "bind = \"0.0.0.0:9000\"\nmax_log_rows = 10\n")?;
        let config = Config::load(Some(&path))?;
        assert_eq!(config.bind, "0.0.0.0:9000");
        assert_eq!(config.max_log_rows, 10);
        assert_eq!(config.database, PathBuf::from("flipdeck.db"));
        Ok(())
    }

    #[test]
    fn test_unknown_key() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("flipdeck.toml");
        write(&path, "port = 9000\n")?;
        let err = Config::load(Some(&path)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let result = Config::load(Some(Path::new("./derpherp.toml")));
        assert!(result.is_err());
    }
}
