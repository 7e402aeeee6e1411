// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Log subscriber setup
//!
//! Logs go to stderr; stdout carries only the JSON event stream.

use tracing_subscriber::EnvFilter;

/// Environment variable overriding `RUST_LOG` for this tool
pub const LOG_ENV: &str = "IFC2USD_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Filter directives: explicit level, then `IFC2USD_LOG`, then `RUST_LOG`
pub fn filter(level: Option<&str>) -> EnvFilter {
    let directives = level
        .map(str::to_string)
        .or_else(|| std::env::var(LOG_ENV).ok())
        .or_else(|| std::env::var(EnvFilter::DEFAULT_ENV).ok())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string());

    EnvFilter::try_new(&directives).unwrap_or_else(|e| {
        eprintln!("Ignoring invalid log filter {:?}: {}", directives, e);
        EnvFilter::new(DEFAULT_FILTER)
    })
}

/// Install the global subscriber; a second call is a no-op
pub fn init(level: Option<&str>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
