// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::env;
use std::net::SocketAddr;
use std::path::Path;
use tracing::{debug, warn};

const DEFAULT_DB_URL: &str = "sqlite://database/salon.db";
const DEFAULT_PORT: u16 = 3000;

/// Runtime settings. Business hours are not configurable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
}

impl Config {
    /// Loads a `.env` file into the environment, then reads it. Without an
    /// explicit path the file is searched from the working directory up.
    /// Variables already set in the process are never overridden.
    pub fn load(env_file: Option<&Path>) -> Self {
        let loaded = match env_file {
            Some(path) => dotenvy::from_path(path).map(|()| path.to_path_buf()),
            None => dotenvy::dotenv(),
        };
        match loaded {
            Ok(path) => debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => debug!("No .env file found."),
            Err(e) => warn!("Ignoring unreadable .env file: {}", e),
        }
        Self::from_env()
    }

    /// Reads `DATABASE_URL` and `PORT`, falling back to the defaults.
    pub fn from_env() -> Self {
        Self::from_vars(env::var("DATABASE_URL").ok(), env::var("PORT").ok())
    }

    fn from_vars(database_url: Option<String>, port: Option<String>) -> Self {
        Self {
            database_url: database_url
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DB_URL.to_string()),
            port: port
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or(DEFAULT_PORT),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}
