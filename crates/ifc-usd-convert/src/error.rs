// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for a conversion run
//!
//! Only the fatal classes live here: opening the source, preparing the
//! destination, reading settings. Per-element problems become warning
//! events instead.

use ifc_usd_model::ParseError;
use std::path::PathBuf;
use thiserror::Error;

/// Conversion result type
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Fatal conversion errors
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Source file could not be read
    #[error("Error opening IFC: {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source content is not a readable STEP model
    #[error("Error opening IFC: {0}")]
    Parse(#[from] ParseError),

    /// Destination could not be prepared (stale file removal, parent directory)
    #[error("Cannot prepare destination {path}: {source}")]
    Destination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stage could not be written
    #[error("Failed to save {path}: {message}")]
    Save { path: PathBuf, message: String },

    /// Settings file could not be read
    #[error("Cannot read settings {path}: {source}")]
    SettingsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings file is not valid JSON for the settings schema
    #[error("Invalid settings {path}: {source}")]
    SettingsParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
