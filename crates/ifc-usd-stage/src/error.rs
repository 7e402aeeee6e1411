// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for stage output

use std::path::PathBuf;
use thiserror::Error;

/// Stage result type
pub type Result<T> = std::result::Result<T, StageError>;

/// Errors raised while writing a stage
#[derive(Error, Debug)]
pub enum StageError {
    /// Writing to a stream failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Writing the layer file failed
    #[error("Failed to save {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
