// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scene sink trait: the narrow interface the converter writes its output through
//!
//! A sink holds a hierarchy of prims addressed by absolute paths. Prim
//! definition is idempotent per path; metadata is limited to scalars and
//! nested scalar mappings.

use crate::MeshData;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Absolute prim path such as `/World/IfcWall_2O2Fr_12`
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PrimPath(String);

impl PrimPath {
    /// Path of a top-level prim
    pub fn root(name: &str) -> Self {
        PrimPath(format!("/{}", prim_name(name)))
    }

    /// Path of a child prim
    pub fn child(&self, name: &str) -> Self {
        PrimPath(format!("{}/{}", self.0, prim_name(name)))
    }

    /// Last path element
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    /// Parent path, `None` for top-level prims
    pub fn parent(&self) -> Option<PrimPath> {
        let (parent, _) = self.0.rsplit_once('/')?;
        if parent.is_empty() {
            None
        } else {
            Some(PrimPath(parent.to_string()))
        }
    }

    /// Number of path elements
    pub fn depth(&self) -> usize {
        self.0.matches('/').count()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrimPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Prim names are identifiers: they cannot be empty or start with a digit.
fn prim_name(name: &str) -> String {
    match name.chars().next() {
        None => "_".to_string(),
        Some(c) if c.is_ascii_digit() => format!("_{}", name),
        Some(_) => name.to_string(),
    }
}

/// Ordered metadata mapping
pub type MetadataMap = IndexMap<String, MetadataValue>;

/// Scalar or nested-mapping metadata value
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetadataValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Map(MetadataMap),
}

impl MetadataValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MetadataMap> {
        match self {
            MetadataValue::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::String(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Int(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Float(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

impl From<MetadataMap> for MetadataValue {
    fn from(value: MetadataMap) -> Self {
        MetadataValue::Map(value)
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => f.write_str(s),
            MetadataValue::Int(i) => write!(f, "{}", i),
            MetadataValue::Float(v) => write!(f, "{}", v),
            MetadataValue::Bool(b) => write!(f, "{}", b),
            MetadataValue::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Value of a named shader input
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ShaderValue {
    Color([f32; 3]),
    Float(f32),
}

/// Named shader input
#[derive(Clone, Debug, PartialEq)]
pub struct ShaderInput {
    pub name: String,
    pub value: ShaderValue,
}

impl ShaderInput {
    pub fn color(name: &str, rgb: [f32; 3]) -> Self {
        Self {
            name: name.to_string(),
            value: ShaderValue::Color(rgb),
        }
    }

    pub fn float(name: &str, value: f32) -> Self {
        Self {
            name: name.to_string(),
            value: ShaderValue::Float(value),
        }
    }
}

/// Hierarchical output scene
///
/// Every `define_*` call is idempotent per path: defining an existing prim
/// leaves its contents in place.
pub trait SceneSink {
    /// Transform prim grouping children
    fn define_xform(&mut self, path: &PrimPath);

    /// Untransformed grouping prim
    fn define_scope(&mut self, path: &PrimPath);

    /// Triangle mesh prim
    fn define_mesh(&mut self, path: &PrimPath, mesh: &MeshData);

    /// Material with a surface shader carrying `inputs`
    fn define_material(&mut self, path: &PrimPath, inputs: &[ShaderInput]);

    /// Bind a material to a whole prim
    fn bind_material(&mut self, prim: &PrimPath, material: &PrimPath);

    /// Face subset of a mesh bound to a material; returns the subset path
    fn create_face_subset(
        &mut self,
        mesh: &PrimPath,
        name: &str,
        faces: &[u32],
        material: &PrimPath,
    ) -> PrimPath;

    /// String-valued prim attribute
    fn set_attribute(&mut self, path: &PrimPath, name: &str, value: &str);

    /// Entry in the prim's custom data dictionary
    fn set_custom_data(&mut self, path: &PrimPath, key: &str, value: MetadataValue);

    /// Replace the prim's asset info dictionary
    fn set_asset_info(&mut self, path: &PrimPath, info: MetadataMap);

    /// Toggle whether the prim takes part in default traversal
    fn set_active(&mut self, path: &PrimPath, active: bool);

    /// Whether a prim exists at `path`
    fn has_prim(&self, path: &PrimPath) -> bool;
}
