// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory USD stage
//!
//! Prims are stored in definition order and addressed by [`PrimPath`].
//! Defining a prim also defines any missing ancestors as typeless prims,
//! the way `UsdStage::DefinePrim` does.

use crate::error::{Result, StageError};
use crate::usda::UsdaWriter;
use ifc_usd_model::{
    MeshData, MetadataMap, MetadataValue, PrimPath, SceneSink, ShaderInput, ShaderValue,
};
use indexmap::IndexMap;
use std::io::Write;
use std::path::Path;

/// Name of the surface shader created under each material
pub const SURFACE_SHADER: &str = "PreviewSurface";

/// Schema type of a prim
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimKind {
    /// Ancestor created implicitly, no schema
    Untyped,
    Xform,
    Scope,
    Mesh,
    Material,
    Shader,
    GeomSubset,
}

impl PrimKind {
    /// Schema name as written in USDA, `None` for typeless prims
    pub fn schema_name(&self) -> Option<&'static str> {
        match self {
            PrimKind::Untyped => None,
            PrimKind::Xform => Some("Xform"),
            PrimKind::Scope => Some("Scope"),
            PrimKind::Mesh => Some("Mesh"),
            PrimKind::Material => Some("Material"),
            PrimKind::Shader => Some("Shader"),
            PrimKind::GeomSubset => Some("GeomSubset"),
        }
    }
}

/// Typed attribute value
#[derive(Clone, Debug, PartialEq)]
pub enum UsdValue {
    String(String),
    Token(String),
    Float(f32),
    Color3f([f32; 3]),
    /// Flattened xyz triples
    Point3fArray(Vec<f32>),
    /// Flattened xyz triples
    Normal3fArray(Vec<f32>),
    /// Two corners of an axis-aligned box
    Float3Array(Vec<[f32; 3]>),
    IntArray(Vec<i32>),
    /// Connection to another prim's property (`<path.property>`)
    Connection(String),
}

impl UsdValue {
    /// USDA type name
    pub fn type_name(&self) -> &'static str {
        match self {
            UsdValue::String(_) => "string",
            UsdValue::Token(_) | UsdValue::Connection(_) => "token",
            UsdValue::Float(_) => "float",
            UsdValue::Color3f(_) => "color3f",
            UsdValue::Point3fArray(_) => "point3f[]",
            UsdValue::Normal3fArray(_) => "normal3f[]",
            UsdValue::Float3Array(_) => "float3[]",
            UsdValue::IntArray(_) => "int[]",
        }
    }
}

/// Authored attribute
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub value: UsdValue,
    /// Uniform (non-animatable) variability
    pub uniform: bool,
    /// Not part of the prim's schema
    pub custom: bool,
}

impl Attribute {
    fn schema(value: UsdValue) -> Self {
        Self {
            value,
            uniform: false,
            custom: false,
        }
    }

    fn uniform(value: UsdValue) -> Self {
        Self {
            value,
            uniform: true,
            custom: false,
        }
    }
}

/// A prim and everything authored on it
#[derive(Clone, Debug)]
pub struct Prim {
    pub kind: PrimKind,
    /// Child names in definition order
    pub children: Vec<String>,
    pub api_schemas: Vec<&'static str>,
    pub attributes: IndexMap<String, Attribute>,
    pub relationships: IndexMap<String, PrimPath>,
    pub custom_data: MetadataMap,
    pub asset_info: MetadataMap,
    pub active: bool,
}

impl Prim {
    fn new(kind: PrimKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
            api_schemas: Vec::new(),
            attributes: IndexMap::new(),
            relationships: IndexMap::new(),
            custom_data: MetadataMap::new(),
            asset_info: MetadataMap::new(),
            active: true,
        }
    }

    /// Attribute value by name
    pub fn attribute(&self, name: &str) -> Option<&UsdValue> {
        self.attributes.get(name).map(|a| &a.value)
    }

    /// Target of a relationship
    pub fn relationship(&self, name: &str) -> Option<&PrimPath> {
        self.relationships.get(name)
    }

    fn apply_api(&mut self, schema: &'static str) {
        if !self.api_schemas.contains(&schema) {
            self.api_schemas.push(schema);
        }
    }
}

/// Layer-level metadata
#[derive(Clone, Debug, PartialEq)]
pub struct StageMetadata {
    pub up_axis: &'static str,
    pub meters_per_unit: f64,
    pub default_prim: Option<String>,
    pub doc: Option<String>,
}

impl Default for StageMetadata {
    fn default() -> Self {
        Self {
            up_axis: "Z",
            meters_per_unit: 1.0,
            default_prim: None,
            doc: None,
        }
    }
}

/// In-memory USD stage with a single root layer
#[derive(Clone, Debug, Default)]
pub struct Stage {
    metadata: StageMetadata,
    prims: IndexMap<PrimPath, Prim>,
    /// Top-level prim names in definition order
    roots: Vec<String>,
}

impl Stage {
    /// Create an empty Z-up stage measured in meters
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metadata(&self) -> &StageMetadata {
        &self.metadata
    }

    pub fn set_meters_per_unit(&mut self, meters_per_unit: f64) {
        self.metadata.meters_per_unit = meters_per_unit;
    }

    pub fn set_default_prim(&mut self, name: &str) {
        self.metadata.default_prim = Some(name.to_string());
    }

    pub fn set_doc(&mut self, doc: &str) {
        self.metadata.doc = Some(doc.to_string());
    }

    /// Prim at `path`
    pub fn prim(&self, path: &PrimPath) -> Option<&Prim> {
        self.prims.get(path)
    }

    /// All prims in definition order
    pub fn prims(&self) -> impl Iterator<Item = (&PrimPath, &Prim)> {
        self.prims.iter()
    }

    pub fn prim_count(&self) -> usize {
        self.prims.len()
    }

    /// Top-level prim names in definition order
    pub fn root_names(&self) -> &[String] {
        &self.roots
    }

    /// Paths of the direct children of `path`
    pub fn children(&self, path: &PrimPath) -> Vec<PrimPath> {
        self.prims
            .get(path)
            .map(|prim| prim.children.iter().map(|name| path.child(name)).collect())
            .unwrap_or_default()
    }

    /// Number of prims of a given kind
    pub fn count_kind(&self, kind: PrimKind) -> usize {
        self.prims.values().filter(|p| p.kind == kind).count()
    }

    /// Define a prim, creating typeless ancestors as needed
    ///
    /// An existing prim keeps its contents; a typeless one takes the new type.
    pub fn define(&mut self, path: &PrimPath, kind: PrimKind) -> &mut Prim {
        if !self.prims.contains_key(path) {
            match path.parent() {
                Some(parent) => {
                    if !self.prims.contains_key(&parent) {
                        self.define(&parent, PrimKind::Untyped);
                    }
                    if let Some(parent_prim) = self.prims.get_mut(&parent) {
                        parent_prim.children.push(path.name().to_string());
                    }
                }
                None => self.roots.push(path.name().to_string()),
            }
            self.prims.insert(path.clone(), Prim::new(kind));
        }

        let prim = self.prims.entry(path.clone()).or_insert_with(|| Prim::new(kind));
        if prim.kind == PrimKind::Untyped {
            prim.kind = kind;
        }
        prim
    }

    fn prim_mut(&mut self, path: &PrimPath) -> Option<&mut Prim> {
        let prim = self.prims.get_mut(path);
        if prim.is_none() {
            log::debug!("No prim at {}", path);
        }
        prim
    }

    /// Render the stage as USDA text
    pub fn to_usda(&self) -> String {
        UsdaWriter::new().write(self)
    }

    /// Write USDA text to a stream
    pub fn write_usda<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(self.to_usda().as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// Save the stage as a `.usda` layer
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_usda()).map_err(|source| StageError::Save {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Saved {} prims to {}", self.prims.len(), path.display());
        Ok(())
    }
}

fn shader_attribute(input: &ShaderInput) -> (String, Attribute) {
    let value = match input.value {
        ShaderValue::Color(rgb) => UsdValue::Color3f(rgb),
        ShaderValue::Float(v) => UsdValue::Float(v),
    };
    (format!("inputs:{}", input.name), Attribute::schema(value))
}

fn extent(positions: &[f32]) -> Option<Vec<[f32; 3]>> {
    let mut points = positions.chunks_exact(3);
    let first = points.next()?;
    let mut min = [first[0], first[1], first[2]];
    let mut max = min;
    for p in points {
        for axis in 0..3 {
            min[axis] = min[axis].min(p[axis]);
            max[axis] = max[axis].max(p[axis]);
        }
    }
    Some(vec![min, max])
}

impl SceneSink for Stage {
    fn define_xform(&mut self, path: &PrimPath) {
        self.define(path, PrimKind::Xform);
    }

    fn define_scope(&mut self, path: &PrimPath) {
        self.define(path, PrimKind::Scope);
    }

    fn define_mesh(&mut self, path: &PrimPath, mesh: &MeshData) {
        let prim = self.define(path, PrimKind::Mesh);
        if prim.attributes.contains_key("points") {
            return;
        }

        let counts = vec![3; mesh.indices.len() / 3];
        let indices = mesh.indices.iter().map(|&i| i as i32).collect();

        if let Some(extent) = extent(&mesh.positions) {
            prim.attributes
                .insert("extent".into(), Attribute::schema(UsdValue::Float3Array(extent)));
        }
        prim.attributes.insert(
            "faceVertexCounts".into(),
            Attribute::schema(UsdValue::IntArray(counts)),
        );
        prim.attributes.insert(
            "faceVertexIndices".into(),
            Attribute::schema(UsdValue::IntArray(indices)),
        );
        if !mesh.normals.is_empty() && mesh.normals.len() == mesh.positions.len() {
            prim.attributes.insert(
                "normals".into(),
                Attribute::schema(UsdValue::Normal3fArray(mesh.normals.clone())),
            );
            prim.attributes.insert(
                "normals:interpolation".into(),
                Attribute::uniform(UsdValue::Token("vertex".into())),
            );
        }
        prim.attributes.insert(
            "points".into(),
            Attribute::schema(UsdValue::Point3fArray(mesh.positions.clone())),
        );
        prim.attributes.insert(
            "subdivisionScheme".into(),
            Attribute::uniform(UsdValue::Token("none".into())),
        );
    }

    fn define_material(&mut self, path: &PrimPath, inputs: &[ShaderInput]) {
        if self.prims.get(path).is_some_and(|p| p.kind == PrimKind::Material) {
            return;
        }
        let shader_path = path.child(SURFACE_SHADER);

        let material = self.define(path, PrimKind::Material);
        material.attributes.insert(
            "outputs:surface".into(),
            Attribute::schema(UsdValue::Connection(format!(
                "{}.outputs:surface",
                shader_path
            ))),
        );

        let shader = self.define(&shader_path, PrimKind::Shader);
        shader.attributes.insert(
            "info:id".into(),
            Attribute::uniform(UsdValue::Token("UsdPreviewSurface".into())),
        );
        shader.attributes.extend(inputs.iter().map(shader_attribute));
        shader.attributes.insert(
            "outputs:surface".into(),
            Attribute::schema(UsdValue::Token(String::new())),
        );
    }

    fn bind_material(&mut self, prim: &PrimPath, material: &PrimPath) {
        if let Some(target) = self.prim_mut(prim) {
            target.apply_api("MaterialBindingAPI");
            target
                .relationships
                .insert("material:binding".into(), material.clone());
        }
    }

    fn create_face_subset(
        &mut self,
        mesh: &PrimPath,
        name: &str,
        faces: &[u32],
        material: &PrimPath,
    ) -> PrimPath {
        if let Some(mesh_prim) = self.prim_mut(mesh) {
            mesh_prim.apply_api("MaterialBindingAPI");
            mesh_prim.attributes.insert(
                "subsetFamily:materialBind:familyType".into(),
                Attribute::uniform(UsdValue::Token("nonOverlapping".into())),
            );
        }

        let path = mesh.child(name);
        let subset = self.define(&path, PrimKind::GeomSubset);
        subset.attributes.insert(
            "elementType".into(),
            Attribute::uniform(UsdValue::Token("face".into())),
        );
        subset.attributes.insert(
            "familyName".into(),
            Attribute::uniform(UsdValue::Token("materialBind".into())),
        );
        subset.attributes.insert(
            "indices".into(),
            Attribute::schema(UsdValue::IntArray(faces.iter().map(|&f| f as i32).collect())),
        );
        self.bind_material(&path, material);
        path
    }

    fn set_attribute(&mut self, path: &PrimPath, name: &str, value: &str) {
        if let Some(prim) = self.prim_mut(path) {
            prim.attributes.insert(
                name.to_string(),
                Attribute {
                    value: UsdValue::String(value.to_string()),
                    uniform: false,
                    custom: true,
                },
            );
        }
    }

    fn set_custom_data(&mut self, path: &PrimPath, key: &str, value: MetadataValue) {
        if let Some(prim) = self.prim_mut(path) {
            prim.custom_data.insert(key.to_string(), value);
        }
    }

    fn set_asset_info(&mut self, path: &PrimPath, info: MetadataMap) {
        if let Some(prim) = self.prim_mut(path) {
            prim.asset_info = info;
        }
    }

    fn set_active(&mut self, path: &PrimPath, active: bool) {
        if let Some(prim) = self.prim_mut(path) {
            prim.active = active;
        }
    }

    fn has_prim(&self, path: &PrimPath) -> bool {
        self.prims.contains_key(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> MeshData {
        MeshData {
            positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 2.0, 0.5],
            normals: Vec::new(),
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn test_define_creates_typeless_ancestors() {
        let mut stage = Stage::new();
        let wall = PrimPath::root("World").child("Site").child("Wall");
        stage.define_xform(&wall);

        assert_eq!(stage.prim_count(), 3);
        assert_eq!(stage.root_names(), ["World"]);
        assert_eq!(stage.prim(&PrimPath::root("World")).unwrap().kind, PrimKind::Untyped);

        // A later definition types the ancestor without touching its children
        stage.define_xform(&PrimPath::root("World"));
        let world = stage.prim(&PrimPath::root("World")).unwrap();
        assert_eq!(world.kind, PrimKind::Xform);
        assert_eq!(world.children, ["Site"]);
    }

    #[test]
    fn test_define_is_idempotent() {
        let mut stage = Stage::new();
        let path = PrimPath::root("World").child("Wall");
        stage.define_xform(&path);
        stage.set_attribute(&path, "ifc:Name", "Wall");
        stage.define_xform(&path);
        stage.define_scope(&path);

        let prim = stage.prim(&path).unwrap();
        assert_eq!(prim.kind, PrimKind::Xform);
        assert_eq!(prim.attribute("ifc:Name"), Some(&UsdValue::String("Wall".into())));
        assert_eq!(stage.children(&PrimPath::root("World")), vec![path]);
    }

    #[test]
    fn test_mesh_attributes() {
        let mut stage = Stage::new();
        let path = PrimPath::root("World").child("Geometry");
        stage.define_mesh(&path, &triangle());

        let prim = stage.prim(&path).unwrap();
        assert_eq!(prim.attribute("faceVertexCounts"), Some(&UsdValue::IntArray(vec![3])));
        assert_eq!(
            prim.attribute("faceVertexIndices"),
            Some(&UsdValue::IntArray(vec![0, 1, 2]))
        );
        assert_eq!(
            prim.attribute("extent"),
            Some(&UsdValue::Float3Array(vec![[0.0, 0.0, 0.0], [1.0, 2.0, 0.5]]))
        );
        // Normals are only authored when present for every vertex
        assert!(prim.attribute("normals").is_none());
    }

    #[test]
    fn test_material_and_binding() {
        let mut stage = Stage::new();
        let material = PrimPath::root("World").child("Materials").child("Concrete");
        stage.define_material(&material, &[ShaderInput::float("opacity", 0.5)]);
        // A second definition keeps the first shader inputs
        stage.define_material(&material, &[ShaderInput::float("opacity", 1.0)]);

        let shader = stage.prim(&material.child(SURFACE_SHADER)).unwrap();
        assert_eq!(shader.kind, PrimKind::Shader);
        assert_eq!(shader.attribute("inputs:opacity"), Some(&UsdValue::Float(0.5)));

        let mesh = PrimPath::root("World").child("Geometry");
        stage.define_mesh(&mesh, &triangle());
        stage.bind_material(&mesh, &material);
        let prim = stage.prim(&mesh).unwrap();
        assert_eq!(prim.api_schemas, ["MaterialBindingAPI"]);
        assert_eq!(prim.relationship("material:binding"), Some(&material));
    }

    #[test]
    fn test_face_subset() {
        let mut stage = Stage::new();
        let mesh = PrimPath::root("World").child("Geometry");
        let material = PrimPath::root("World").child("Materials").child("Glass");
        stage.define_mesh(&mesh, &triangle());
        stage.define_material(&material, &[]);

        let subset = stage.create_face_subset(&mesh, "Glass", &[0], &material);
        assert_eq!(subset, mesh.child("Glass"));

        let prim = stage.prim(&subset).unwrap();
        assert_eq!(prim.kind, PrimKind::GeomSubset);
        assert_eq!(prim.attribute("elementType"), Some(&UsdValue::Token("face".into())));
        assert_eq!(prim.attribute("indices"), Some(&UsdValue::IntArray(vec![0])));
        assert_eq!(prim.relationship("material:binding"), Some(&material));
    }

    #[test]
    fn test_metadata_on_missing_prim_is_ignored() {
        let mut stage = Stage::new();
        let path = PrimPath::root("Nowhere");
        stage.set_active(&path, false);
        stage.set_custom_data(&path, "ifcIdentity", "x".into());
        assert!(!stage.has_prim(&path));
        assert_eq!(stage.prim_count(), 0);
    }
}
