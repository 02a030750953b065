// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: resolves the control-plane root and merges
//! `deacon/config.json` over `DeaconConfig::default()`.

use std::path::PathBuf;

use fleet_core::DeaconConfig;
use fleet_store::{DeaconStateStore, FleetPaths};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not create control-plane directory {0}: {1}")]
    CreateRoot(PathBuf, #[source] std::io::Error),
}

/// Resolved daemon configuration, analogous to the teacher's per-process
/// `Config::load()` but rooted at `FleetPaths` instead of a socket/WAL
/// layout.
#[derive(Debug, Clone)]
pub struct Config {
    pub paths: FleetPaths,
    pub log_path: PathBuf,
    pub lock_path: PathBuf,
    pub deacon: DeaconConfig,
}

impl Config {
    /// Resolves `FLEET_HOME` (or `~/.fleet`), creates it if absent, and
    /// merges `deacon/config.json` over defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let paths = FleetPaths::from_env();
        std::fs::create_dir_all(paths.root())
            .map_err(|e| ConfigError::CreateRoot(paths.root().to_path_buf(), e))?;

        let deacon = DeaconStateStore::new(paths.clone()).read_config();
        let log_path = paths.deacon_dir().join("fleetd.log");
        let lock_path = paths.deacon_dir().join("fleetd.pid");

        Ok(Self {
            paths,
            log_path,
            lock_path,
            deacon,
        })
    }
}
