// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! USDA text writer
//!
//! Output is deterministic: prims, properties and dictionary entries are
//! written in definition order.

use crate::stage::{Attribute, Prim, Stage, UsdValue};
use ifc_usd_model::{MetadataMap, MetadataValue, PrimPath};

/// Builder for USDA output
pub struct UsdaWriter {
    output: String,
    indent: usize,
}

impl UsdaWriter {
    pub fn new() -> Self {
        Self {
            output: String::new(),
            indent: 0,
        }
    }

    /// Render a whole stage
    pub fn write(mut self, stage: &Stage) -> String {
        self.write_header(stage);

        for name in stage.root_names() {
            let path = PrimPath::root(name);
            if let Some(prim) = stage.prim(&path) {
                self.write_line("");
                self.write_prim(stage, &path, prim);
            }
        }

        self.output
    }

    fn write_header(&mut self, stage: &Stage) {
        let metadata = stage.metadata();
        self.output.push_str("#usda 1.0\n");
        self.output.push_str("(\n");
        if let Some(name) = &metadata.default_prim {
            self.output
                .push_str(&format!("    defaultPrim = \"{}\"\n", escape_string(name)));
        }
        if let Some(doc) = &metadata.doc {
            self.output
                .push_str(&format!("    doc = \"{}\"\n", escape_string(doc)));
        }
        self.output.push_str(&format!(
            "    metersPerUnit = {}\n",
            format_double(metadata.meters_per_unit)
        ));
        self.output
            .push_str(&format!("    upAxis = \"{}\"\n", metadata.up_axis));
        self.output.push_str(")\n");
    }

    fn write_prim(&mut self, stage: &Stage, path: &PrimPath, prim: &Prim) {
        let header = match prim.kind.schema_name() {
            Some(schema) => format!("def {} \"{}\"", schema, path.name()),
            None => format!("def \"{}\"", path.name()),
        };

        if has_prim_metadata(prim) {
            self.write_line(&format!("{} (", header));
            self.indent += 1;
            self.write_prim_metadata(prim);
            self.indent -= 1;
            self.write_line(")");
        } else {
            self.write_line(&header);
        }
        self.write_line("{");
        self.indent += 1;

        for (name, attribute) in &prim.attributes {
            self.write_attribute(name, attribute);
        }
        for (name, target) in &prim.relationships {
            self.write_line(&format!("rel {} = <{}>", name, target));
        }

        for child in stage.children(path) {
            if let Some(child_prim) = stage.prim(&child) {
                self.write_line("");
                self.write_prim(stage, &child, child_prim);
            }
        }

        self.indent -= 1;
        self.write_line("}");
    }

    fn write_prim_metadata(&mut self, prim: &Prim) {
        if !prim.active {
            self.write_line("active = false");
        }
        if !prim.api_schemas.is_empty() {
            let schemas: Vec<String> = prim
                .api_schemas
                .iter()
                .map(|s| format!("\"{}\"", s))
                .collect();
            self.write_line(&format!("prepend apiSchemas = [{}]", schemas.join(", ")));
        }
        if !prim.asset_info.is_empty() {
            self.write_dictionary("assetInfo = {", &prim.asset_info);
        }
        if !prim.custom_data.is_empty() {
            self.write_dictionary("customData = {", &prim.custom_data);
        }
    }

    fn write_dictionary(&mut self, opening: &str, map: &MetadataMap) {
        self.write_line(opening);
        self.indent += 1;
        for (key, value) in map {
            let key = dictionary_key(key);
            match value {
                MetadataValue::Map(nested) => {
                    self.write_dictionary(&format!("dictionary {} = {{", key), nested);
                }
                MetadataValue::String(s) => {
                    self.write_line(&format!("string {} = \"{}\"", key, escape_string(s)));
                }
                MetadataValue::Int(i) => {
                    let type_name = if i32::try_from(*i).is_ok() { "int" } else { "int64" };
                    self.write_line(&format!("{} {} = {}", type_name, key, i));
                }
                MetadataValue::Float(v) => {
                    self.write_line(&format!("double {} = {}", key, format_double(*v)));
                }
                MetadataValue::Bool(b) => {
                    self.write_line(&format!("bool {} = {}", key, b));
                }
            }
        }
        self.indent -= 1;
        self.write_line("}");
    }

    fn write_attribute(&mut self, name: &str, attribute: &Attribute) {
        let mut declaration = String::new();
        if attribute.custom {
            declaration.push_str("custom ");
        }
        if attribute.uniform {
            declaration.push_str("uniform ");
        }
        declaration.push_str(attribute.value.type_name());
        declaration.push(' ');

        match &attribute.value {
            UsdValue::Connection(target) => {
                self.write_line(&format!("{}{}.connect = <{}>", declaration, name, target));
            }
            // Declared outputs carry no value
            UsdValue::Token(t) if t.is_empty() => {
                self.write_line(&format!("{}{}", declaration, name));
            }
            UsdValue::Point3fArray(values) | UsdValue::Normal3fArray(values) => {
                self.write_line(&format!("{}{} = [", declaration, name));
                self.indent += 1;
                let count = values.len() / 3;
                for (i, v) in values.chunks_exact(3).enumerate() {
                    let comma = if i + 1 < count { "," } else { "" };
                    self.write_line(&format!("{}{}", format_vec3([v[0], v[1], v[2]]), comma));
                }
                self.indent -= 1;
                self.write_line("]");
            }
            value => {
                self.write_line(&format!("{}{} = {}", declaration, name, format_value(value)));
            }
        }
    }

    fn write_line(&mut self, line: &str) {
        if !line.is_empty() {
            for _ in 0..self.indent {
                self.output.push_str("    ");
            }
        }
        self.output.push_str(line);
        self.output.push('\n');
    }
}

impl Default for UsdaWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn has_prim_metadata(prim: &Prim) -> bool {
    !prim.active
        || !prim.api_schemas.is_empty()
        || !prim.asset_info.is_empty()
        || !prim.custom_data.is_empty()
}

fn format_value(value: &UsdValue) -> String {
    match value {
        UsdValue::String(s) | UsdValue::Token(s) => format!("\"{}\"", escape_string(s)),
        UsdValue::Float(v) => format_real(*v as f64),
        UsdValue::Color3f(rgb) => format_vec3(*rgb),
        UsdValue::Float3Array(values) => {
            let items: Vec<String> = values.iter().map(|v| format_vec3(*v)).collect();
            format!("[{}]", items.join(", "))
        }
        UsdValue::IntArray(values) => {
            let items: Vec<String> = values.iter().map(|i| i.to_string()).collect();
            format!("[{}]", items.join(", "))
        }
        UsdValue::Point3fArray(values) | UsdValue::Normal3fArray(values) => {
            let items: Vec<String> = values
                .chunks_exact(3)
                .map(|v| format_vec3([v[0], v[1], v[2]]))
                .collect();
            format!("[{}]", items.join(", "))
        }
        UsdValue::Connection(target) => format!("<{}>", target),
    }
}

fn format_vec3(v: [f32; 3]) -> String {
    format!(
        "({}, {}, {})",
        format_real(v[0] as f64),
        format_real(v[1] as f64),
        format_real(v[2] as f64)
    )
}

/// Format a single-precision value
fn format_real(value: f64) -> String {
    if !value.is_finite() {
        return format_special(value);
    }
    if value == 0.0 {
        "0".to_string()
    } else if value.abs() < 0.0001 || value.abs() >= 1e6 {
        format!("{:e}", value)
    } else if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        let s = format!("{:.6}", value);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Format a double-precision value with its shortest exact representation
fn format_double(value: f64) -> String {
    if value.is_finite() {
        format!("{}", value)
    } else {
        format_special(value)
    }
}

fn format_special(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value > 0.0 {
        "inf".to_string()
    } else {
        "-inf".to_string()
    }
}

/// Dictionary keys that are not identifiers are quoted
fn dictionary_key(key: &str) -> String {
    let is_identifier = key
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if is_identifier {
        key.to_string()
    } else {
        format!("\"{}\"", escape_string(key))
    }
}

/// Escape a string for USDA output
fn escape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_usd_model::{MeshData, SceneSink, ShaderInput};

    #[test]
    fn test_format_real() {
        assert_eq!(format_real(0.0), "0");
        assert_eq!(format_real(1.0), "1");
        assert_eq!(format_real(0.35), "0.35");
        assert_eq!(format_real(f64::NAN), "nan");
        assert_eq!(format_double(0.001), "0.001");
    }

    #[test]
    fn test_dictionary_keys() {
        assert_eq!(dictionary_key("GlobalId"), "GlobalId");
        assert_eq!(dictionary_key("Fire Rating"), "\"Fire Rating\"");
        assert_eq!(dictionary_key("3D"), "\"3D\"");
    }

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string("say \"hi\""), "say \\\"hi\\\"");
        assert_eq!(escape_string("line1\nline2"), "line1\\nline2");
    }

    #[test]
    fn test_write_empty_stage() {
        let usda = Stage::new().to_usda();
        assert!(usda.starts_with("#usda 1.0\n(\n"));
        assert!(usda.contains("    upAxis = \"Z\""));
        assert!(usda.contains("    metersPerUnit = 1"));
    }

    #[test]
    fn test_write_stage() {
        let mut stage = Stage::new();
        stage.set_default_prim("World");
        stage.set_meters_per_unit(0.001);

        let world = PrimPath::root("World");
        let space = world.child("IfcSpace_abc_7");
        let mesh = space.child("Geometry");
        let material = world.child("Materials").child("Glass");

        stage.define_xform(&world);
        stage.define_xform(&space);
        stage.set_active(&space, false);
        stage.set_attribute(&space, "ifc:Name", "Room \"1\"");

        let mut identity = MetadataMap::new();
        identity.insert("Name".into(), "Room".into());
        identity.insert("Area m2".into(), 12.5.into());
        stage.set_custom_data(&space, "ifcIdentity", MetadataValue::Map(identity));

        stage.define_mesh(
            &mesh,
            &MeshData {
                positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
                normals: Vec::new(),
                indices: vec![0, 1, 2],
            },
        );
        stage.define_scope(&world.child("Materials"));
        stage.define_material(&material, &[ShaderInput::color("diffuseColor", [0.5, 0.5, 1.0])]);
        stage.bind_material(&mesh, &material);

        let usda = stage.to_usda();
        let expected_fragments = [
            "    defaultPrim = \"World\"",
            "    metersPerUnit = 0.001",
            "def Xform \"World\"",
            "    def Xform \"IfcSpace_abc_7\" (",
            "        active = false",
            "            string Name = \"Room\"",
            "            double \"Area m2\" = 12.5",
            "        custom string ifc:Name = \"Room \\\"1\\\"\"",
            "        def Mesh \"Geometry\" (",
            "            prepend apiSchemas = [\"MaterialBindingAPI\"]",
            "            int[] faceVertexIndices = [0, 1, 2]",
            "            rel material:binding = </World/Materials/Glass>",
            "    def Scope \"Materials\"",
            "        def Material \"Glass\"",
            "            token outputs:surface.connect = </World/Materials/Glass/PreviewSurface.outputs:surface>",
            "                uniform token info:id = \"UsdPreviewSurface\"",
            "                color3f inputs:diffuseColor = (0.5, 0.5, 1)",
            "                token outputs:surface\n",
        ];
        for fragment in expected_fragments {
            assert!(usda.contains(fragment), "missing {:?} in\n{}", fragment, usda);
        }

        // The space comes before the materials scope, as defined
        assert!(usda.find("IfcSpace_abc_7").unwrap() < usda.find("def Scope").unwrap());
    }

    #[test]
    fn test_save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.usda");

        let mut stage = Stage::new();
        stage.define_xform(&PrimPath::root("World"));
        stage.save(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, stage.to_usda());
    }

    #[test]
    fn test_save_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.usda");
        let err = Stage::new().save(&path).unwrap_err();
        assert!(matches!(err, crate::StageError::Save { .. }));
    }
}
