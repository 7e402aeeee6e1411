// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Style resolution engine
//!
//! Maps material containers, elements and tessellator material hints to
//! renderings, and renderings to cached [`ShadingParameters`]. Missing style
//! information is never an error: it yields the default material.

use super::container::MaterialContainer;
use super::index::MaterialIndex;
use super::presentation::{geometry_styles, rendering_of};
use super::shading::{ResolvedStyle, ShadingParameters};
use crate::naming::material_key;
use ifc_usd_model::{DecodedEntity, EntityId, EntityResolver, MaterialHint};
use indexmap::IndexMap;
use std::sync::Arc;

/// Name of the material bound when nothing else is known
pub const DEFAULT_MATERIAL: &str = "DefaultMaterial";

/// Surface style found on an element's own geometry
#[derive(Clone, Debug)]
pub struct EmbeddedStyle {
    pub style: Arc<DecodedEntity>,
    pub rendering: Arc<DecodedEntity>,
}

impl EmbeddedStyle {
    /// Style name, or `<Type>-<id>` for unnamed styles
    pub fn material_name(&self) -> String {
        match self.style.name().filter(|n| !n.trim().is_empty()) {
            Some(name) => name.to_string(),
            None => MaterialHint::synthetic(self.style.ifc_type.name(), self.style.id).name,
        }
    }
}

pub struct StyleEngine<'a> {
    resolver: &'a dyn EntityResolver,
    index: MaterialIndex,
    /// Sanitized material name -> shading, in creation order
    cache: IndexMap<String, Arc<ShadingParameters>>,
}

impl<'a> StyleEngine<'a> {
    /// Build the material index and start with an empty cache
    pub fn new(resolver: &'a dyn EntityResolver) -> Self {
        Self::with_index(resolver, MaterialIndex::build(resolver))
    }

    pub fn with_index(resolver: &'a dyn EntityResolver, index: MaterialIndex) -> Self {
        Self {
            resolver,
            index,
            cache: IndexMap::new(),
        }
    }

    pub fn index(&self) -> &MaterialIndex {
        &self.index
    }

    /// Surface style of the first material in the container that has one
    pub fn style_for_container(&self, container: &MaterialContainer) -> Option<Arc<DecodedEntity>> {
        container
            .materials(self.resolver)
            .iter()
            .filter_map(|material| self.index.style_for_material(material.id))
            .find_map(|style| self.resolver.get(style))
    }

    /// Rendering of [`Self::style_for_container`]
    pub fn rendering_for_container(
        &self,
        container: &MaterialContainer,
    ) -> Option<Arc<DecodedEntity>> {
        let style = self.style_for_container(container)?;
        rendering_of(&style, self.resolver)
    }

    /// First style with a rendering on the element's own geometry
    pub fn embedded_style(&self, element: &DecodedEntity) -> Option<EmbeddedStyle> {
        geometry_styles(element, self.resolver)
            .into_iter()
            .find_map(|style| {
                let rendering = rendering_of(&style, self.resolver)?;
                Some(EmbeddedStyle { style, rendering })
            })
    }

    /// Rendering on the element's own geometry
    pub fn rendering_from_element(&self, element: &DecodedEntity) -> Option<Arc<DecodedEntity>> {
        self.embedded_style(element).map(|embedded| embedded.rendering)
    }

    /// Rendering for a tessellator material hint
    ///
    /// Tries the hint name as a material name, then the style the hint
    /// carries, then the id in a synthetic `<Type>-<id>` name. The entity
    /// found may be a rendering or a style wrapping one.
    pub fn rendering_from_geometry_hint(&self, hint: &MaterialHint) -> Option<Arc<DecodedEntity>> {
        if let Some(rendering) = self
            .index
            .rendering_for_name(&hint.name)
            .and_then(|id| self.resolver.get(id))
        {
            return Some(rendering);
        }

        let id = hint.style.or_else(|| {
            let (_, digits) = hint.name.rsplit_once('-')?;
            digits.trim().parse::<u32>().ok().map(EntityId)
        })?;
        let entity = self.resolver.get(id)?;
        rendering_of(&entity, self.resolver)
    }

    /// Shading parameters for a material name, computed once per sanitized name
    ///
    /// Later calls with the same name return the cached value whatever
    /// rendering they pass.
    pub fn build_shading_parameters(
        &mut self,
        name: &str,
        rendering: Option<&DecodedEntity>,
    ) -> Arc<ShadingParameters> {
        let key = material_key(name);
        if let Some(cached) = self.cache.get(&key) {
            return Arc::clone(cached);
        }

        let style = rendering
            .map(|r| ResolvedStyle::from_rendering(r, self.resolver))
            .unwrap_or_default();
        let params = Arc::new(ShadingParameters::from_style(&style));
        log::debug!("Material {}: {:?}", key, params);
        self.cache.insert(key, Arc::clone(&params));
        params
    }

    /// Name of the first named material in the container
    ///
    /// Falls back to `<Type>-<id>` of the container, then to
    /// [`DEFAULT_MATERIAL`] without a container.
    pub fn resolve_material_name(&self, container: Option<&MaterialContainer>) -> String {
        let Some(container) = container else {
            return DEFAULT_MATERIAL.to_string();
        };
        container
            .materials(self.resolver)
            .iter()
            .find_map(|m| m.name().filter(|n| !n.trim().is_empty()).map(str::to_string))
            .unwrap_or_else(|| {
                let entity = container.entity();
                MaterialHint::synthetic(entity.ifc_type.name(), entity.id).name
            })
    }

    /// Number of distinct materials built so far
    pub fn material_count(&self) -> usize {
        self.cache.len()
    }

    /// Whether a material has been built under this name
    pub fn is_cached(&self, name: &str) -> bool {
        self.cache.contains_key(&material_key(name))
    }
}
