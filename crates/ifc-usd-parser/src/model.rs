// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ParsedModel - Main IFC model implementation

use crate::resolver::ResolverImpl;
use crate::scanner::parse_header;
use crate::units::extract_unit_scale;

use ifc_usd_model::{
    EntityResolver, IfcModel, ModelMetadata, ParseError, ProgressCallback, Result,
};
use std::sync::Arc;

/// Parsed IFC model implementing the `IfcModel` trait
///
/// Owns the resolver (entity lookups, type and inverse indexes), the length
/// unit scale and the header metadata.
pub struct ParsedModel {
    resolver: Arc<ResolverImpl>,
    unit_scale: f64,
    metadata: ModelMetadata,
}

impl ParsedModel {
    /// Parse IFC content and create a model
    pub fn parse(content: &str) -> Result<Self> {
        Self::parse_with_progress(content, Box::new(|_, _| {}))
    }

    /// Parse with progress reporting
    pub fn parse_with_progress(content: &str, on_progress: ProgressCallback) -> Result<Self> {
        validate(content)?;
        on_progress("Reading header", 0.0);

        let header = parse_header(content);
        let metadata = ModelMetadata {
            schema_version: header.schema_version,
            originating_system: header.originating_system,
            preprocessor_version: header.preprocessor_version,
            file_name: header.file_name,
            file_description: header.file_description,
            author: header.author,
            organization: header.organization,
            timestamp: header.timestamp,
        };
        on_progress("Indexing entities", 10.0);

        let resolver = Arc::new(ResolverImpl::new(content.to_string()));
        log::debug!(
            "Indexed {} entities ({})",
            resolver.entity_count(),
            metadata.schema_version
        );
        on_progress("Extracting units", 90.0);

        let unit_scale = extract_unit_scale(resolver.as_ref());

        on_progress("Complete", 100.0);

        Ok(Self {
            resolver,
            unit_scale,
            metadata,
        })
    }

    /// Get the resolver (for geometry processing, etc.)
    pub fn resolver_arc(&self) -> Arc<ResolverImpl> {
        self.resolver.clone()
    }
}

/// Reject content that is not an ISO 10303-21 exchange structure
fn validate(content: &str) -> Result<()> {
    let trimmed = content.trim_start_matches('\u{feff}').trim_start();
    if !trimmed.starts_with("ISO-10303-21") {
        return Err(ParseError::format("missing ISO-10303-21 signature"));
    }
    if !content.contains("DATA;") {
        return Err(ParseError::format("missing DATA section"));
    }
    Ok(())
}

impl IfcModel for ParsedModel {
    fn resolver(&self) -> &dyn EntityResolver {
        self.resolver.as_ref()
    }

    fn unit_scale(&self) -> f64 {
        self.unit_scale
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ifc_usd_model::EntityResolverExt;
    use std::sync::Mutex;

    const TEST_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [CoordinationView]'),'2;1');
FILE_NAME('test.ifc','2024-01-01T00:00:00',('Author'),('Org'),'Preprocessor','App','');
FILE_SCHEMA(('IFC2X3'));
ENDSEC;
DATA;
#1=IFCPROJECT('0YvctVUKr0kugbFTf53O9L',$,'Test Project',$,$,$,$,$,#2);
#2=IFCUNITASSIGNMENT((#3));
#3=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);
#4=IFCSITE('1YvctVUKr0kugbFTf53O9L',$,'Site',$,$,$,$,$,$,$,$,$,$,$);
#5=IFCRELAGGREGATES('2YvctVUKr0kugbFTf53O9L',$,$,$,#1,(#4));
#6=IFCBUILDING('3YvctVUKr0kugbFTf53O9L',$,'Building',$,$,$,$,$,$,$,$,$);
#7=IFCRELAGGREGATES('4YvctVUKr0kugbFTf53O9L',$,$,$,#4,(#6));
#8=IFCBUILDINGSTOREY('5YvctVUKr0kugbFTf53O9L',$,'Ground Floor',$,$,$,$,$,.ELEMENT.,0.0);
#9=IFCRELAGGREGATES('6YvctVUKr0kugbFTf53O9L',$,$,$,#6,(#8));
#10=IFCWALL('7YvctVUKr0kugbFTf53O9L',$,'Wall 1',$,$,$,$,$);
#11=IFCRELCONTAINEDINSPATIALSTRUCTURE('8YvctVUKr0kugbFTf53O9L',$,$,$,(#10),#8);
ENDSEC;
END-ISO-10303-21;
"#;

    #[test]
    fn test_parse_model() {
        let model = ParsedModel::parse(TEST_IFC).unwrap();

        assert_eq!(model.metadata().schema_version, "IFC2X3");
        assert_eq!(model.metadata().file_name.as_deref(), Some("test.ifc"));
        assert_eq!(model.metadata().originating_system.as_deref(), Some("App"));
        assert_eq!(
            model.metadata().file_description.as_deref(),
            Some("ViewDefinition [CoordinationView]")
        );
        assert_relative_eq!(model.unit_scale(), 0.001);

        let walls = model.resolver().find_by_type_name("IFCWALL");
        assert_eq!(walls.len(), 1);
        assert_eq!(walls[0].name(), Some("Wall 1"));
    }

    #[test]
    fn test_spatial_navigation() {
        let model = ParsedModel::parse(TEST_IFC).unwrap();
        let resolver = model.resolver();

        let project = resolver.find_by_type_name("IfcProject").remove(0);
        let site: Vec<_> = resolver
            .inverse_of(&project, "IsDecomposedBy")
            .iter()
            .flat_map(|rel| resolver.attr_entities(rel, "RelatedObjects"))
            .collect();
        assert_eq!(site.len(), 1);
        assert_eq!(site[0].name(), Some("Site"));

        let storey = resolver.find_by_type_name("IfcBuildingStorey").remove(0);
        let contained: Vec<_> = resolver
            .inverse_of(&storey, "ContainsElements")
            .iter()
            .flat_map(|rel| resolver.attr_entities(rel, "RelatedElements"))
            .collect();
        assert_eq!(contained.len(), 1);
        assert_eq!(contained[0].global_id(), Some("7YvctVUKr0kugbFTf53O9L"));
    }

    #[test]
    fn test_rejects_non_step_content() {
        assert!(matches!(
            ParsedModel::parse("not an ifc file"),
            Err(ParseError::InvalidFormat(_))
        ));
        assert!(matches!(
            ParsedModel::parse("ISO-10303-21;\nHEADER;\nENDSEC;\n"),
            Err(ParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_progress_reported() {
        let phases = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&phases);
        ParsedModel::parse_with_progress(
            TEST_IFC,
            Box::new(move |phase, pct| sink.lock().unwrap().push((phase.to_string(), pct))),
        )
        .unwrap();

        let phases = phases.lock().unwrap();
        assert_eq!(phases.first().map(|p| p.1), Some(0.0));
        assert_eq!(phases.last().map(|p| p.0.as_str()), Some("Complete"));
    }
}
