// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tessellation trait and its result types

use crate::{DecodedEntity, EntityId, EntityResolver, GeometryError, MeshData};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Options passed to a [`Tessellator`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TessellationSettings {
    /// Apply the product's placement chain so vertices land in world space
    pub use_world_coords: bool,
}

impl Default for TessellationSettings {
    fn default() -> Self {
        Self {
            use_world_coords: true,
        }
    }
}

/// Appearance attached to a group of faces by the geometry itself
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialHint {
    /// Style name, or a synthetic `<EntityType>-<id>` token for unnamed styles
    pub name: String,
    /// Style entity the hint came from, when known
    pub style: Option<EntityId>,
}

impl MaterialHint {
    /// Hint for an unnamed style entity
    pub fn synthetic(type_name: &str, id: EntityId) -> Self {
        Self {
            name: format!("{}-{}", type_name, id.0),
            style: Some(id),
        }
    }
}

/// Triangulated product geometry
#[derive(Clone, Debug, Default)]
pub struct TessellatedShape {
    /// Flat triangle list
    pub mesh: MeshData,
    /// Distinct styles found on the product's geometry items
    pub material_hints: Vec<MaterialHint>,
    /// One entry per triangle indexing `material_hints`; -1 marks unstyled faces
    pub face_materials: Option<Vec<i32>>,
}

impl TessellatedShape {
    /// Number of triangles
    pub fn face_count(&self) -> usize {
        self.mesh.triangle_count()
    }

    /// Faces grouped by material index in ascending index order
    ///
    /// Indices without a matching hint (including -1) are left out, so an
    /// empty map means the shape carries no usable per-face materials.
    pub fn faces_by_material(&self) -> BTreeMap<usize, Vec<u32>> {
        let mut groups: BTreeMap<usize, Vec<u32>> = BTreeMap::new();
        let Some(face_materials) = &self.face_materials else {
            return groups;
        };
        for (face, &index) in face_materials.iter().enumerate() {
            if index >= 0 && (index as usize) < self.material_hints.len() {
                groups.entry(index as usize).or_default().push(face as u32);
            }
        }
        groups
    }
}

/// Produces triangle meshes for products
pub trait Tessellator {
    /// Tessellate a product's body representation
    ///
    /// Fails with [`GeometryError::NoRepresentation`] or
    /// [`GeometryError::NoGeometry`] when there is nothing to draw.
    fn tessellate(
        &self,
        entity: &DecodedEntity,
        resolver: &dyn EntityResolver,
        settings: &TessellationSettings,
    ) -> std::result::Result<TessellatedShape, GeometryError>;
}
