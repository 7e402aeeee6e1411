// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ifc2usd
//!
//! Converts an IFC file to a USDA stage. Progress is printed to stdout as
//! one JSON object per line:
//!
//! ```text
//! {"type":"progress","percentage":20,"message":"Opening IFC file..."}
//! {"type":"success","output":"model.usda"}
//! ```
//!
//! Logs go to stderr, filtered by `--log-level`, `IFC2USD_LOG` or `RUST_LOG`.

mod logging;
mod pipeline;

use clap::Parser;
use ifc_usd_convert::{ConvertSettings, JsonLinesSink, ProgressEvent, ProgressSink};
use std::path::PathBuf;
use std::process::ExitCode;

/// Convert IFC building models to USD
#[derive(Parser, Debug)]
#[command(name = "ifc2usd", version)]
#[command(about = "Convert an IFC file to a USD stage with materials and BIM metadata")]
struct Args {
    /// Input IFC file path
    input: PathBuf,

    /// Output USD (.usda) file path
    output: PathBuf,

    /// JSON settings file
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Keep geometry in element-local coordinates
    #[arg(long)]
    no_world_coords: bool,

    /// Log filter, e.g. `debug` or `ifc_usd_convert=trace`
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.log_level.as_deref());

    let mut events = JsonLinesSink::new(std::io::stdout());

    let mut settings = match &args.config {
        Some(path) => match ConvertSettings::from_file(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("{}", e);
                events.emit(ProgressEvent::error(e.to_string()));
                return ExitCode::FAILURE;
            }
        },
        None => ConvertSettings::default(),
    };
    if args.no_world_coords {
        settings.world_coords = false;
    }
    log::debug!("Settings: {:?}", settings);

    match pipeline::convert_file(&args.input, &args.output, &settings, &mut events) {
        Ok(report) => {
            log::info!("{} -> {}: {}", args.input.display(), args.output.display(), report);
            ExitCode::SUCCESS
        }
        Err(_) => ExitCode::FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "ifc2usd",
            "house.ifc",
            "out/house.usda",
            "--no-world-coords",
            "--config",
            "settings.json",
        ])
        .unwrap();

        assert_eq!(args.input, PathBuf::from("house.ifc"));
        assert_eq!(args.output, PathBuf::from("out/house.usda"));
        assert!(args.no_world_coords);
        assert_eq!(args.config, Some(PathBuf::from("settings.json")));
    }

    #[test]
    fn test_output_is_required() {
        assert!(Args::try_parse_from(["ifc2usd", "house.ifc"]).is_err());
    }
}
