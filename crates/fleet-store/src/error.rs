// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store errors, converted into `fleet_core::FleetError` at crate boundaries.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no such agent: {0}")]
    NoSuchAgent(String),

    #[error("reorder does not match current item set")]
    ReorderMismatch,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("lock error: {0}")]
    Lock(String),
}

impl From<StoreError> for fleet_core::FleetError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NoSuchAgent(id) => fleet_core::FleetError::NoSuchAgent(id),
            StoreError::ReorderMismatch => fleet_core::FleetError::ReorderMismatch,
            StoreError::Io(e) => fleet_core::FleetError::Io(e),
            StoreError::Json(e) => fleet_core::FleetError::Serde(e),
            StoreError::Lock(msg) => fleet_core::FleetError::Precondition(msg),
        }
    }
}
