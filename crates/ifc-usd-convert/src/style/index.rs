// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Material style index, built once before traversal
//!
//! Two exporter conventions attach appearance to materials:
//!
//! - [`RenderingConvention::DefinitionRepresentation`]: each `IfcMaterial`
//!   has an `IfcMaterialDefinitionRepresentation` whose styled items carry
//!   the surface style.
//! - [`RenderingConvention::GeometryEmbedded`]: styles only live on the
//!   geometry of elements that use the material.
//!
//! The second is consulted only when the first yields no rendering at all.

use super::presentation::{geometry_styles, rendering_of, styled_item_styles};
use ifc_usd_model::{DecodedEntity, EntityId, EntityResolver, EntityResolverExt, IfcType};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Strategy that produced the name index
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderingConvention {
    DefinitionRepresentation,
    GeometryEmbedded,
}

/// Read-only lookup tables for material appearance
#[derive(Clone, Debug, Default)]
pub struct MaterialIndex {
    /// `IfcMaterial` -> first surface style of its definition representation
    style_by_material: FxHashMap<EntityId, EntityId>,
    /// Material name -> rendering
    rendering_by_name: IndexMap<String, EntityId>,
    /// Rendering -> material name
    name_by_rendering: FxHashMap<EntityId, String>,
    convention: Option<RenderingConvention>,
}

impl MaterialIndex {
    /// Run both build phases
    pub fn build(resolver: &dyn EntityResolver) -> Self {
        MaterialIndexBuilder::new(resolver)
            .index_material_styles()
            .index_renderings()
    }

    /// Surface style recorded for a material
    pub fn style_for_material(&self, material: EntityId) -> Option<EntityId> {
        self.style_by_material.get(&material).copied()
    }

    /// Rendering indexed under a material name
    pub fn rendering_for_name(&self, name: &str) -> Option<EntityId> {
        self.rendering_by_name.get(name).copied()
    }

    /// Material name a rendering was indexed under
    pub fn name_for_rendering(&self, rendering: EntityId) -> Option<&str> {
        self.name_by_rendering.get(&rendering).map(String::as_str)
    }

    /// Convention that produced the name index, `None` when it is empty
    pub fn convention(&self) -> Option<RenderingConvention> {
        self.convention
    }

    pub fn styled_material_count(&self) -> usize {
        self.style_by_material.len()
    }
}

/// Two-phase builder for [`MaterialIndex`]
pub struct MaterialIndexBuilder<'a> {
    resolver: &'a dyn EntityResolver,
    style_by_material: FxHashMap<EntityId, EntityId>,
}

impl<'a> MaterialIndexBuilder<'a> {
    pub fn new(resolver: &'a dyn EntityResolver) -> Self {
        Self {
            resolver,
            style_by_material: FxHashMap::default(),
        }
    }

    /// Phase one: material -> surface style from definition representations
    pub fn index_material_styles(mut self) -> Self {
        let resolver = self.resolver;
        for definition in resolver.instances_of(&IfcType::IfcMaterialDefinitionRepresentation) {
            let Some(material) = definition.attr_ref("RepresentedMaterial") else {
                continue;
            };
            if self.style_by_material.contains_key(&material) {
                continue;
            }
            let style = resolver
                .attr_entities(&definition, "Representations")
                .iter()
                .flat_map(|rep| resolver.attr_entities(rep, "Items"))
                .filter(|item| item.ifc_type == IfcType::IfcStyledItem)
                .find_map(|item| styled_item_styles(&item, resolver).into_iter().next());
            if let Some(style) = style {
                self.style_by_material.insert(material, style.id);
            }
        }
        log::debug!("Indexed styles for {} materials", self.style_by_material.len());
        self
    }

    /// Phase two: material name <-> rendering, choosing the convention
    pub fn index_renderings(self) -> MaterialIndex {
        let mut names = NameIndex::default();
        let mut convention = None;

        self.index_by_definition_representation(&mut names);
        if !names.is_empty() {
            convention = Some(RenderingConvention::DefinitionRepresentation);
        } else {
            self.index_by_geometry(&mut names);
            if !names.is_empty() {
                convention = Some(RenderingConvention::GeometryEmbedded);
            }
        }
        log::debug!(
            "Indexed {} material renderings ({:?})",
            names.by_name.len(),
            convention
        );

        MaterialIndex {
            style_by_material: self.style_by_material,
            rendering_by_name: names.by_name,
            name_by_rendering: names.by_rendering,
            convention,
        }
    }

    fn index_by_definition_representation(&self, names: &mut NameIndex) {
        for material in self.resolver.instances_of(&IfcType::IfcMaterial) {
            let rendering = self
                .style_by_material
                .get(&material.id)
                .and_then(|&style| self.resolver.get(style))
                .and_then(|style| rendering_of(&style, self.resolver));
            if let Some(rendering) = rendering {
                names.insert(&material, &rendering);
            }
        }
    }

    fn index_by_geometry(&self, names: &mut NameIndex) {
        let resolver = self.resolver;
        for rel in resolver.instances_of(&IfcType::IfcRelAssociatesMaterial) {
            let Some(material) = resolver
                .attr_entity(&rel, "RelatingMaterial")
                .filter(|m| m.ifc_type == IfcType::IfcMaterial)
            else {
                continue;
            };
            // One sampled element stands for every user of the material
            let Some(element) = resolver.attr_entities(&rel, "RelatedObjects").into_iter().next()
            else {
                continue;
            };
            let rendering = geometry_styles(&element, resolver)
                .iter()
                .find_map(|style| rendering_of(style, resolver));
            if let Some(rendering) = rendering {
                names.insert(&material, &rendering);
            }
        }
    }
}

#[derive(Default)]
struct NameIndex {
    by_name: IndexMap<String, EntityId>,
    by_rendering: FxHashMap<EntityId, String>,
}

impl NameIndex {
    fn insert(&mut self, material: &DecodedEntity, rendering: &Arc<DecodedEntity>) {
        let Some(name) = material.name().filter(|n| !n.is_empty()) else {
            return;
        };
        self.by_name.entry(name.to_string()).or_insert(rendering.id);
        self.by_rendering
            .entry(rendering.id)
            .or_insert_with(|| name.to_string());
    }

    fn is_empty(&self) -> bool {
        self.by_rendering.is_empty()
    }
}
