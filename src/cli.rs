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

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;

use crate::api::server::start_server;
use crate::config::Config;
use crate::db::Database;
use crate::error::Fallible;
use crate::overview::session_overview;
use crate::repository::SessionLogRepository;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Serve the study session API.
    Serve {
        /// Path to the configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the address to listen on.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Print an overview of a user's recent sessions.
    Overview {
        /// The user whose sessions to summarize.
        #[arg(long)]
        user: String,
        /// Only consider sessions over this deck.
        #[arg(long)]
        deck: Option<String>,
        /// Path to the configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the log entries of a session.
    Logs {
        session_id: String,
        /// Path to the configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

pub async fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Serve { config, bind } => {
            let mut config = Config::load(config.as_deref())?;
            if let Some(bind) = bind {
                config.bind = bind;
            }
            start_server(config).await
        }
        Command::Overview { user, deck, config } => {
            let config = Config::load(config.as_deref())?;
            let db = open(&config)?;
            let overviews =
                session_overview(&db, &user, deck.as_deref(), config.overview_sessions)?;
            print_json(&overviews)
        }
        Command::Logs { session_id, config } => {
            let config = Config::load(config.as_deref())?;
            let db = open(&config)?;
            let entries = db.entries_for_session(&session_id)?;
            print_json(&entries)
        }
    }
}

fn open(config: &Config) -> Fallible<Database> {
    Database::new(config.database_path()?, config.max_log_rows)
}

fn print_json<T: Serialize>(value: &T) -> Fallible<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_command_definition() {
        Command::command().debug_assert();
    }

    #[test]
    fn test_parse_serve() {
        let cli = Command::try_parse_from(["flipdeck", "serve", "--bind", "0.0.0.0:9000"]).unwrap();
        match cli {
            Command::Serve { config, bind } => {
                assert_eq!(config, None);
                assert_eq!(bind.as_deref(), Some("0.0.0.0:9000"));
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_overview_requires_user() {
        assert!(Command::try_parse_from(["flipdeck", "overview"]).is_err());
    }
}
