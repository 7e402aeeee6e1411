// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! File-to-file conversion with progress events
//!
//! Geometry stays in file units; the stage's `metersPerUnit` carries the
//! model's length unit instead.

use ifc_usd_convert::{
    convert_model, ConversionReport, ConvertError, ConvertSettings, ProgressEvent, ProgressSink,
    Result,
};
use ifc_usd_geometry::GeometryRouter;
use ifc_usd_model::IfcModel;
use ifc_usd_parser::ParsedModel;
use ifc_usd_stage::Stage;
use std::fs;
use std::path::Path;

/// Convert `input` to a USDA file at `output`
///
/// A fatal failure is reported once as an error event and returned.
pub fn convert_file(
    input: &Path,
    output: &Path,
    settings: &ConvertSettings,
    events: &mut dyn ProgressSink,
) -> Result<ConversionReport> {
    let result = run(input, output, settings, events);
    if let Err(e) = &result {
        log::error!("{}", e);
        events.emit(ProgressEvent::error(e.to_string()));
    }
    result
}

fn run(
    input: &Path,
    output: &Path,
    settings: &ConvertSettings,
    events: &mut dyn ProgressSink,
) -> Result<ConversionReport> {
    events.progress(0, "Starting conversion...");

    events.progress(10, "Initializing IFC geometry engine...");
    let router = GeometryRouter::with_default_processors();

    events.progress(20, "Opening IFC file...");
    let content = fs::read_to_string(input).map_err(|source| ConvertError::Open {
        path: input.to_path_buf(),
        source,
    })?;
    let model = ParsedModel::parse(&content)?;
    log::info!(
        "Opened {} ({}, {} entities, unit scale {})",
        input.display(),
        model.metadata().schema_version,
        model.resolver().entity_count(),
        model.unit_scale()
    );

    events.progress(30, "Creating USD stage...");
    prepare_destination(output)?;
    let mut stage = Stage::new();
    stage.set_default_prim(&settings.default_prim);
    stage.set_meters_per_unit(model.unit_scale());
    if let Some(name) = input.file_name() {
        stage.set_doc(&format!("Converted from {}", name.to_string_lossy()));
    }

    events.progress(40, "Processing elements...");
    let report = convert_model(model.resolver(), &router, &mut stage, events, settings);

    events.progress(95, "Saving USD file...");
    stage.save(output).map_err(|e| ConvertError::Save {
        path: output.to_path_buf(),
        message: e.to_string(),
    })?;

    events.progress(100, "Conversion complete!");
    events.emit(ProgressEvent::success(output.display().to_string()));
    Ok(report)
}

/// Remove a stale output file and create missing parent directories
fn prepare_destination(output: &Path) -> Result<()> {
    let destination_error = |source| ConvertError::Destination {
        path: output.to_path_buf(),
        source,
    };

    if output.exists() {
        log::debug!("Removing existing {}", output.display());
        fs::remove_file(output).map_err(destination_error)?;
    }
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(destination_error)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_usd_convert::NullSink;
    use tempfile::TempDir;

    const MODEL: &str = r#"ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [CoordinationView]'),'2;1');
FILE_NAME('box.ifc','2024-01-01T00:00:00',(''),(''),'','','');
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCPROJECT('0YvctVUKr0kugbFTf53O9L',$,'Project',$,$,$,$,$,#2);
#2=IFCUNITASSIGNMENT((#3));
#3=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);
#4=IFCBUILDINGSTOREY('1YvctVUKr0kugbFTf53O9L',$,'Ground',$,$,$,$,$,.ELEMENT.,0.);
#5=IFCRELAGGREGATES('2YvctVUKr0kugbFTf53O9L',$,$,$,#1,(#4));
#10=IFCCARTESIANPOINT((0.,0.,0.));
#11=IFCAXIS2PLACEMENT3D(#10,$,$);
#12=IFCRECTANGLEPROFILEDEF(.AREA.,$,$,1000.,200.);
#13=IFCDIRECTION((0.,0.,1.));
#14=IFCEXTRUDEDAREASOLID(#12,#11,#13,3000.);
#15=IFCSHAPEREPRESENTATION(#99,'Body','SweptSolid',(#14));
#16=IFCPRODUCTDEFINITIONSHAPE($,$,(#15));
#20=IFCWALL('3YvctVUKr0kugbFTf53O9L',$,'Wall',$,$,$,#16,$,$);
#21=IFCRELCONTAINEDINSPATIALSTRUCTURE('4YvctVUKr0kugbFTf53O9L',$,$,$,(#20),#4);
ENDSEC;
END-ISO-10303-21;
"#;

    fn write_model(dir: &TempDir) -> std::path::PathBuf {
        let input = dir.path().join("box.ifc");
        fs::write(&input, MODEL).unwrap();
        input
    }

    fn percentages(events: &[ProgressEvent]) -> Vec<u8> {
        events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Progress { percentage, .. } => Some(*percentage),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_converts_model_to_usda() {
        let dir = TempDir::new().unwrap();
        let input = write_model(&dir);
        let output = dir.path().join("out").join("box.usda");
        let mut events: Vec<ProgressEvent> = Vec::new();

        let report = convert_file(&input, &output, &ConvertSettings::default(), &mut events).unwrap();
        assert_eq!(report.nodes, 3);
        assert_eq!(report.meshes, 1);

        let usda = fs::read_to_string(&output).unwrap();
        assert!(usda.starts_with("#usda 1.0"));
        assert!(usda.contains("defaultPrim = \"World\""));
        assert!(usda.contains("metersPerUnit = 0.001"));
        assert!(usda.contains("upAxis = \"Z\""));
        assert!(usda.contains("def Mesh \"Geometry\""));
        assert!(usda.contains("string ifc:GlobalId = \"3YvctVUKr0kugbFTf53O9L\""));

        let steps = percentages(&events);
        assert_eq!(&steps[..5], &[0, 10, 20, 30, 40]);
        assert_eq!(&steps[steps.len() - 2..], &[95, 100]);
        assert!(steps.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(
            events.last(),
            Some(&ProgressEvent::success(output.display().to_string()))
        );
    }

    #[test]
    fn test_existing_output_is_replaced() {
        let dir = TempDir::new().unwrap();
        let input = write_model(&dir);
        let output = dir.path().join("box.usda");
        fs::write(&output, "stale").unwrap();

        convert_file(&input, &output, &ConvertSettings::default(), &mut NullSink).unwrap();
        let usda = fs::read_to_string(&output).unwrap();
        assert!(!usda.contains("stale"));
    }

    #[test]
    fn test_missing_input_reports_error_event() {
        let dir = TempDir::new().unwrap();
        let mut events: Vec<ProgressEvent> = Vec::new();

        let err = convert_file(
            &dir.path().join("missing.ifc"),
            &dir.path().join("out.usda"),
            &ConvertSettings::default(),
            &mut events,
        )
        .unwrap_err();

        assert!(matches!(err, ConvertError::Open { .. }));
        let errors: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Error { .. }))
            .collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_json().contains("Error opening IFC"));
        assert!(!events.iter().any(|e| matches!(e, ProgressEvent::Success { .. })));
        assert!(!dir.path().join("out.usda").exists());
    }

    #[test]
    fn test_invalid_content_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("notes.ifc");
        fs::write(&input, "just some text").unwrap();

        let err = convert_file(
            &input,
            &dir.path().join("out.usda"),
            &ConvertSettings::default(),
            &mut NullSink,
        )
        .unwrap_err();
        assert!(matches!(err, ConvertError::Parse(_)));
    }

    #[test]
    fn test_unpreparable_destination_is_fatal() {
        let dir = TempDir::new().unwrap();
        let input = write_model(&dir);
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file, not a directory").unwrap();

        let err = convert_file(
            &input,
            &blocker.join("box.usda"),
            &ConvertSettings::default(),
            &mut NullSink,
        )
        .unwrap_err();
        assert!(matches!(err, ConvertError::Destination { .. }));
    }

    #[test]
    fn test_local_coordinates_setting() {
        let dir = TempDir::new().unwrap();
        let input = write_model(&dir);
        let output = dir.path().join("local.usda");
        let settings = ConvertSettings {
            world_coords: false,
            ..ConvertSettings::default()
        };

        let report = convert_file(&input, &output, &settings, &mut NullSink).unwrap();
        assert_eq!(report.meshes, 1);
    }
}
