// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry Router - Dynamic dispatch to geometry processors
//!
//! Routes IFC representation items to the processor registered for their
//! type, follows mapped items into their representation maps, and records
//! which surface style each item carries so faces can be grouped by material.

use crate::placement::placement_matrix;
use crate::{Error, Mesh, Result};
use ifc_usd_model::{
    DecodedEntity, EntityId, EntityResolver, EntityResolverExt, GeometryError, IfcType,
    MaterialHint, TessellatedShape, TessellationSettings, Tessellator,
};
use nalgebra::Matrix4;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::sync::Arc;

/// Representation identifiers that describe an element's visible body
const BODY_IDENTIFIERS: &[&str] = &["Body", "Facetation", "Mesh"];

/// Mapped items nested deeper than this are ignored
const MAX_MAPPING_DEPTH: usize = 8;

/// Geometry processor trait
///
/// Each processor handles one or more types of IFC geometry representations.
/// Processors use the `EntityResolver` trait for entity lookups, making them
/// independent of any specific parser implementation.
pub trait GeometryProcessor: Send + Sync {
    /// Process entity into a mesh in the item's own coordinate system
    fn process(&self, entity: &DecodedEntity, resolver: &dyn EntityResolver) -> Result<Mesh>;

    /// Get supported IFC types
    fn supported_types(&self) -> Vec<IfcType>;
}

/// Mesh produced by one representation item, with the surface style it carries
#[derive(Debug, Clone)]
struct StyledMesh {
    mesh: Mesh,
    style: Option<EntityId>,
}

/// Geometry router - routes entities to processors
///
/// Also caches the tessellated contents of representation maps, so types
/// instanced through IfcMappedItem are triangulated once.
pub struct GeometryRouter {
    /// Registered processors by type
    processors: FxHashMap<IfcType, Arc<dyn GeometryProcessor>>,
    /// IfcRepresentationMap id -> items in the map's own coordinates
    mapped_item_cache: RefCell<FxHashMap<u32, Arc<Vec<StyledMesh>>>>,
    /// Unit scale factor (e.g., 0.001 for millimeters -> meters)
    unit_scale: f64,
}

impl GeometryRouter {
    /// Create new router without any processors registered
    pub fn new() -> Self {
        Self {
            processors: FxHashMap::default(),
            mapped_item_cache: RefCell::new(FxHashMap::default()),
            unit_scale: 1.0,
        }
    }

    /// Create router with default processors registered
    ///
    /// Registers the following processors:
    /// - `ExtrudedAreaSolidProcessor` (IfcExtrudedAreaSolid)
    /// - `TriangulatedFaceSetProcessor` (IfcTriangulatedFaceSet)
    /// - `PolygonalFaceSetProcessor` (IfcPolygonalFaceSet)
    /// - `FacetedBrepProcessor` (IfcFacetedBrep)
    pub fn with_default_processors() -> Self {
        use crate::processors::{
            ExtrudedAreaSolidProcessor, FacetedBrepProcessor, PolygonalFaceSetProcessor,
            TriangulatedFaceSetProcessor,
        };

        let mut router = Self::new();
        router.register(Arc::new(ExtrudedAreaSolidProcessor::new()));
        router.register(Arc::new(TriangulatedFaceSetProcessor::new()));
        router.register(Arc::new(PolygonalFaceSetProcessor::new()));
        router.register(Arc::new(FacetedBrepProcessor::new()));
        router
    }

    /// Create router with default processors and specific unit scale
    pub fn with_default_processors_and_unit_scale(unit_scale: f64) -> Self {
        let mut router = Self::with_default_processors();
        router.unit_scale = unit_scale;
        router
    }

    /// Get the current unit scale factor
    pub fn unit_scale(&self) -> f64 {
        self.unit_scale
    }

    /// Set the unit scale factor
    pub fn set_unit_scale(&mut self, scale: f64) {
        self.unit_scale = scale;
    }

    /// Register a geometry processor
    pub fn register(&mut self, processor: Arc<dyn GeometryProcessor>) {
        for ifc_type in processor.supported_types() {
            self.processors.insert(ifc_type, Arc::clone(&processor));
        }
    }

    /// Check if a type has a registered processor
    pub fn has_processor(&self, ifc_type: &IfcType) -> bool {
        self.processors.contains_key(ifc_type)
    }

    /// Process a product's body geometry
    ///
    /// Follows Product -> ProductDefinitionShape -> ShapeRepresentation ->
    /// Items, keeping only body representations.
    pub fn process_element(
        &self,
        element: &DecodedEntity,
        resolver: &dyn EntityResolver,
        settings: &TessellationSettings,
    ) -> std::result::Result<TessellatedShape, GeometryError> {
        let Some(product_shape) = resolver.attr_entity(element, "Representation") else {
            return Err(GeometryError::NoRepresentation(element.id));
        };

        let mut pieces = Vec::new();
        let mut first_error = None;

        for shape_rep in resolver.attr_entities(&product_shape, "Representations") {
            if let Some(identifier) = shape_rep.attr_str("RepresentationIdentifier") {
                if !BODY_IDENTIFIERS.contains(&identifier) {
                    continue;
                }
            }
            let items = resolver.attr_entities(&shape_rep, "Items");
            let (meshes, error) = self.process_items(&items, resolver, 0);
            pieces.extend(meshes);
            if first_error.is_none() {
                first_error = error;
            }
        }

        let mut shape = assemble(pieces, resolver);
        if shape.mesh.is_empty() {
            return Err(match first_error {
                Some(error) => error.for_entity(element.id),
                None => GeometryError::NoGeometry(element.id),
            });
        }
        if let Some(error) = first_error {
            log::debug!("Partial geometry for #{}: {}", element.id.0, error);
        }

        if settings.use_world_coords {
            if let Some(placement) = resolver.attr_entity(element, "ObjectPlacement") {
                shape.mesh.transform(&placement_matrix(&placement, resolver));
            }
        }
        shape.mesh.scale(self.unit_scale);

        Ok(TessellatedShape {
            mesh: shape.mesh.into_mesh_data(),
            material_hints: shape.material_hints,
            face_materials: shape.face_materials,
        })
    }

    /// Process a list of representation items
    ///
    /// Returns every mesh that could be built and the first error met.
    fn process_items(
        &self,
        items: &[Arc<DecodedEntity>],
        resolver: &dyn EntityResolver,
        depth: usize,
    ) -> (Vec<StyledMesh>, Option<Error>) {
        let mut meshes = Vec::new();
        let mut first_error = None;

        for item in items {
            match self.process_representation_item(item, resolver, depth) {
                Ok(produced) => meshes.extend(produced),
                Err(e) => {
                    log::debug!("Skipping representation item #{}: {}", item.id.0, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        (meshes, first_error)
    }

    /// Process a single representation item
    fn process_representation_item(
        &self,
        item: &DecodedEntity,
        resolver: &dyn EntityResolver,
        depth: usize,
    ) -> Result<Vec<StyledMesh>> {
        let style = surface_style(item, resolver);

        if item.ifc_type == IfcType::IfcMappedItem {
            return self.process_mapped_item(item, style, resolver, depth);
        }

        let processor = self
            .processors
            .get(&item.ifc_type)
            .ok_or_else(|| Error::unsupported_type(item.ifc_type.name()))?;

        let mesh = processor.process(item, resolver)?;
        Ok(vec![StyledMesh { mesh, style }])
    }

    /// Instance a representation map: MappingOrigin then MappingTarget
    fn process_mapped_item(
        &self,
        item: &DecodedEntity,
        style: Option<EntityId>,
        resolver: &dyn EntityResolver,
        depth: usize,
    ) -> Result<Vec<StyledMesh>> {
        if depth >= MAX_MAPPING_DEPTH {
            return Err(Error::geometry("Mapped item nesting too deep"));
        }

        let source_id = item
            .attr_ref("MappingSource")
            .ok_or_else(|| Error::missing(item.id, "MappingSource"))?;
        let source = resolver
            .get(source_id)
            .ok_or_else(|| Error::entity_not_found(source_id))?;

        let contents = match self.cached_mapped_item(source_id) {
            Some(cached) => cached,
            None => {
                let items = resolver
                    .attr_entity(&source, "MappedRepresentation")
                    .map(|rep| resolver.attr_entities(&rep, "Items"))
                    .unwrap_or_default();
                let (meshes, error) = self.process_items(&items, resolver, depth + 1);
                if meshes.is_empty() {
                    if let Some(error) = error {
                        return Err(error);
                    }
                }
                let meshes = Arc::new(meshes);
                self.mapped_item_cache
                    .borrow_mut()
                    .insert(source_id.0, Arc::clone(&meshes));
                meshes
            }
        };

        let origin = resolver
            .attr_entity(&source, "MappingOrigin")
            .map(|p| placement_matrix(&p, resolver))
            .unwrap_or_else(Matrix4::identity);
        let target = resolver
            .attr_entity(item, "MappingTarget")
            .map(|t| placement_matrix(&t, resolver))
            .unwrap_or_else(Matrix4::identity);
        let transform = target * origin;

        Ok(contents
            .iter()
            .map(|piece| {
                let mut mesh = piece.mesh.clone();
                mesh.transform(&transform);
                StyledMesh {
                    mesh,
                    style: piece.style.or(style),
                }
            })
            .collect())
    }

    fn cached_mapped_item(&self, source_id: EntityId) -> Option<Arc<Vec<StyledMesh>>> {
        self.mapped_item_cache.borrow().get(&source_id.0).cloned()
    }

    /// Clear all caches
    pub fn clear_caches(&self) {
        self.mapped_item_cache.borrow_mut().clear();
    }
}

impl Default for GeometryRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl Tessellator for GeometryRouter {
    fn tessellate(
        &self,
        entity: &DecodedEntity,
        resolver: &dyn EntityResolver,
        settings: &TessellationSettings,
    ) -> std::result::Result<TessellatedShape, GeometryError> {
        self.process_element(entity, resolver, settings)
    }
}

/// Merged item meshes before placement and unit scaling
struct Assembled {
    mesh: Mesh,
    material_hints: Vec<MaterialHint>,
    face_materials: Option<Vec<i32>>,
}

/// Merge item meshes, numbering distinct styles in encounter order
fn assemble(pieces: Vec<StyledMesh>, resolver: &dyn EntityResolver) -> Assembled {
    let mut mesh = Mesh::new();
    let mut material_hints: Vec<MaterialHint> = Vec::new();
    let mut face_materials = Vec::new();
    let mut any_styled = false;

    for piece in pieces {
        if piece.mesh.is_empty() {
            continue;
        }
        let index = match piece.style {
            Some(style) => {
                any_styled = true;
                match material_hints.iter().position(|h| h.style == Some(style)) {
                    Some(existing) => existing as i32,
                    None => {
                        material_hints.push(material_hint(style, resolver));
                        (material_hints.len() - 1) as i32
                    }
                }
            }
            None => -1,
        };
        face_materials.extend(std::iter::repeat(index).take(piece.mesh.triangle_count()));
        mesh.merge(&piece.mesh);
    }

    Assembled {
        mesh,
        material_hints,
        face_materials: any_styled.then_some(face_materials),
    }
}

/// Hint for a surface style: its name, or `IfcSurfaceStyle-<id>` when unnamed
fn material_hint(style: EntityId, resolver: &dyn EntityResolver) -> MaterialHint {
    let entity = resolver.get(style);
    match entity.as_deref().and_then(|s| s.name()).filter(|n| !n.is_empty()) {
        Some(name) => MaterialHint {
            name: name.to_string(),
            style: Some(style),
        },
        None => {
            let type_name = entity
                .as_deref()
                .map(|s| s.ifc_type.name().to_string())
                .unwrap_or_else(|| IfcType::IfcSurfaceStyle.name().to_string());
            MaterialHint::synthetic(&type_name, style)
        }
    }
}

/// First surface style attached to a representation item through IfcStyledItem
///
/// Handles both the IFC4 direct form and the IFC2X3 presentation style
/// assignment wrapper.
pub fn surface_style(item: &DecodedEntity, resolver: &dyn EntityResolver) -> Option<EntityId> {
    resolver
        .inverse_of(item, "StyledByItem")
        .iter()
        .flat_map(|styled| resolver.attr_entities(styled, "Styles"))
        .find_map(|style| match style.ifc_type {
            IfcType::IfcSurfaceStyle => Some(style.id),
            IfcType::IfcPresentationStyleAssignment => resolver
                .attr_entities(&style, "Styles")
                .iter()
                .find(|s| s.ifc_type == IfcType::IfcSurfaceStyle)
                .map(|s| s.id),
            _ => None,
        })
}
