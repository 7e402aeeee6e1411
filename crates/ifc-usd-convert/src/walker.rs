// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hierarchy walker
//!
//! Depth-first traversal from every `IfcProject` through spatial containment
//! and aggregation. Each entity becomes one transform prim named after its
//! sanitized identity; a prim is never created twice for the same identity.
//! After the primary pass, spaces the traversal missed are walked again
//! under a shared reconciliation root.
//!
//! Traversal order is part of the output: it decides which parent keeps a
//! node reached twice, the order of subsets and which rendering a shared
//! material name is built from.

use crate::events::ProgressSink;
use crate::metadata::MetadataExtractor;
use crate::naming::{material_key, node_name};
use crate::settings::ConvertSettings;
use crate::style::{MaterialContainer, StyleEngine, DEFAULT_MATERIAL};
use ifc_usd_model::{
    DecodedEntity, EntityResolver, EntityResolverExt, IfcType, MetadataValue, PrimPath,
    SceneSink, TessellatedShape, Tessellator,
};
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Name of the mesh prim under an entity's node
pub const GEOMETRY_PRIM: &str = "Geometry";

/// Custom data keys of the metadata records
pub const IDENTITY_KEY: &str = "ifcIdentity";
pub const PROPERTY_SETS_KEY: &str = "ifcPropertySets";
pub const RELATIONSHIPS_KEY: &str = "ifcRelationships";
pub const LAYERS_KEY: &str = "ifcPresentationLayers";

/// Progress range covered by the traversal
const PROGRESS_START: u8 = 40;
const PROGRESS_SPAN: usize = 50;

/// Counters of one conversion run
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ConversionReport {
    /// Entity nodes created
    pub nodes: usize,
    /// Geometry prims created
    pub meshes: usize,
    /// Distinct materials built
    pub materials: usize,
    /// Face subsets bound
    pub subsets: usize,
    /// Elements whose geometry failed unexpectedly
    pub warnings: usize,
    /// Spaces attached under the reconciliation root
    pub reconciled: usize,
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} nodes, {} meshes, {} materials, {} subsets, {} warnings, {} reconciled spaces",
            self.nodes, self.meshes, self.materials, self.subsets, self.warnings, self.reconciled
        )
    }
}

/// Convert a whole model into `sink`
///
/// Per-element failures become warning events; nothing here aborts the run.
pub fn convert_model(
    resolver: &dyn EntityResolver,
    tessellator: &dyn Tessellator,
    sink: &mut dyn SceneSink,
    events: &mut dyn ProgressSink,
    settings: &ConvertSettings,
) -> ConversionReport {
    RunContext::new(resolver, tessellator, sink, events, settings).run()
}

/// State owned by one conversion run
pub struct RunContext<'a> {
    resolver: &'a dyn EntityResolver,
    tessellator: &'a dyn Tessellator,
    sink: &'a mut dyn SceneSink,
    events: &'a mut dyn ProgressSink,
    settings: &'a ConvertSettings,
    styles: StyleEngine<'a>,
    metadata: MetadataExtractor<'a>,
    /// Sanitized identities of every node produced so far
    produced: FxHashSet<String>,
    world: PrimPath,
    reconciliation_root: Option<PrimPath>,
    report: ConversionReport,
    total_products: usize,
    last_progress: u8,
}

impl<'a> RunContext<'a> {
    pub fn new(
        resolver: &'a dyn EntityResolver,
        tessellator: &'a dyn Tessellator,
        sink: &'a mut dyn SceneSink,
        events: &'a mut dyn ProgressSink,
        settings: &'a ConvertSettings,
    ) -> Self {
        Self {
            resolver,
            tessellator,
            sink,
            events,
            settings,
            styles: StyleEngine::new(resolver),
            metadata: MetadataExtractor::new(resolver),
            produced: FxHashSet::default(),
            world: PrimPath::root(&settings.default_prim),
            reconciliation_root: None,
            report: ConversionReport::default(),
            total_products: resolver.instances_of(&IfcType::IfcProduct).len(),
            last_progress: PROGRESS_START,
        }
    }

    /// Primary traversal, then reconciliation
    pub fn run(mut self) -> ConversionReport {
        self.sink.define_xform(&self.world);

        let world = self.world.clone();
        let projects = self.resolver.instances_of(&IfcType::IfcProject);
        if projects.is_empty() {
            log::warn!("Model has no IfcProject; only unreached spaces will be converted");
        }
        for project in &projects {
            self.walk(project, &world);
        }

        self.reconcile();

        self.report.materials = self.styles.material_count();
        log::info!("Conversion finished: {}", self.report);
        self.report
    }

    /// Whether a node with this entity's identity exists
    pub fn is_produced(&self, entity: &DecodedEntity) -> bool {
        self.produced.contains(&node_name(entity))
    }

    fn walk(&mut self, entity: &DecodedEntity, parent: &PrimPath) {
        let name = node_name(entity);
        if !self.produced.insert(name.clone()) {
            log::debug!("{} already converted, skipping under {}", name, parent);
            return;
        }

        let path = parent.child(&name);
        log::debug!("Visiting {} {} at {}", entity.ifc_type, entity.id, path);
        self.sink.define_xform(&path);
        self.report.nodes += 1;

        self.attach_metadata(entity, &path);
        if entity.ifc_type.is_spatial_enclosure() {
            self.sink.set_active(&path, false);
        }
        self.attach_geometry(entity, &path);
        self.report_progress();

        for child in self.children(entity) {
            self.walk(&child, &path);
        }
    }

    /// Contained elements, then decomposition parts, each in source order
    fn children(&self, entity: &DecodedEntity) -> Vec<Arc<DecodedEntity>> {
        let contained = self
            .resolver
            .inverse_of(entity, "ContainsElements")
            .into_iter()
            .flat_map(|rel| self.resolver.attr_entities(&rel, "RelatedElements"));
        let parts = self
            .resolver
            .inverse_of(entity, "IsDecomposedBy")
            .into_iter()
            .flat_map(|rel| self.resolver.attr_entities(&rel, "RelatedObjects"));
        contained.chain(parts).collect()
    }

    fn attach_metadata(&mut self, entity: &DecodedEntity, path: &PrimPath) {
        if let Some(global_id) = entity.global_id() {
            self.sink.set_attribute(path, "ifc:GlobalId", global_id);
        }
        self.sink.set_attribute(path, "ifc:Type", entity.ifc_type.name());
        if let Some(name) = entity.name() {
            self.sink.set_attribute(path, "ifc:Name", name);
        }

        let identity = self.metadata.identity_and_classification(entity);
        self.sink
            .set_custom_data(path, IDENTITY_KEY, MetadataValue::Map(identity));

        let records = [
            (PROPERTY_SETS_KEY, self.metadata.property_sets(entity)),
            (RELATIONSHIPS_KEY, self.metadata.relationships(entity)),
            (LAYERS_KEY, self.metadata.presentation_layers(entity)),
        ];
        for (key, record) in records {
            if !record.is_empty() {
                self.sink.set_custom_data(path, key, MetadataValue::Map(record));
            }
        }

        if let Some(provenance) = self.metadata.provenance(entity) {
            self.sink.set_asset_info(path, provenance);
        }
    }

    fn attach_geometry(&mut self, entity: &DecodedEntity, path: &PrimPath) {
        let settings = self.settings.tessellation();
        let shape = match self.tessellator.tessellate(entity, self.resolver, &settings) {
            Ok(shape) if !shape.mesh.is_empty() => shape,
            Ok(_) => return,
            Err(e) if e.is_expected() => {
                log::debug!("No geometry for {} {}: {}", entity.ifc_type, entity.id, e);
                return;
            }
            Err(e) => {
                let message = format!(
                    "Skipping geometry of {} {}: {}",
                    entity.ifc_type, entity.id, e
                );
                log::warn!("{}", message);
                self.events.warning(&message);
                self.report.warnings += 1;
                return;
            }
        };

        let geometry = path.child(GEOMETRY_PRIM);
        self.sink.define_mesh(&geometry, &shape.mesh);
        self.report.meshes += 1;

        // Faces outside every subset fall back to the mesh binding
        let covered = self.bind_face_subsets(&shape, &geometry);
        if covered < shape.face_count() {
            self.bind_single_material(entity, &geometry);
        }
    }

    /// One subset per hinted material, in ascending hint index
    ///
    /// Returns the number of faces placed in a subset.
    fn bind_face_subsets(&mut self, shape: &TessellatedShape, geometry: &PrimPath) -> usize {
        let mut subset_names = FxHashSet::default();
        let mut covered = 0;
        for (index, faces) in shape.faces_by_material() {
            let Some(hint) = shape.material_hints.get(index) else {
                continue;
            };
            let rendering = self.styles.rendering_from_geometry_hint(hint);
            let material = self.material(&hint.name, rendering.as_deref());

            let mut subset = material_key(&hint.name);
            if !subset_names.insert(subset.clone()) {
                subset = format!("{}_{}", subset, index);
                subset_names.insert(subset.clone());
            }
            self.sink
                .create_face_subset(geometry, &subset, &faces, &material);
            self.report.subsets += 1;
            covered += faces.len();
        }
        covered
    }

    /// Whole-mesh binding: element geometry style first, then the associated material
    fn bind_single_material(&mut self, entity: &DecodedEntity, geometry: &PrimPath) {
        let container = MaterialContainer::for_element(entity, self.resolver);
        let embedded = self.styles.embedded_style(entity);

        let name = match (&container, &embedded) {
            (Some(container), _) => self.styles.resolve_material_name(Some(container)),
            (None, Some(embedded)) => embedded.material_name(),
            (None, None) => DEFAULT_MATERIAL.to_string(),
        };
        let rendering = match embedded {
            Some(embedded) => Some(embedded.rendering),
            None => container
                .as_ref()
                .and_then(|c| self.styles.rendering_for_container(c)),
        };

        let material = self.material(&name, rendering.as_deref());
        self.sink.bind_material(geometry, &material);
    }

    /// Material prim for a name, defined on first use
    fn material(&mut self, name: &str, rendering: Option<&DecodedEntity>) -> PrimPath {
        let params = self.styles.build_shading_parameters(name, rendering);
        let scope = self.world.child(&self.settings.materials_scope);
        let path = scope.child(&material_key(name));
        if !self.sink.has_prim(&path) {
            self.sink.define_scope(&scope);
            self.sink.define_material(&path, &params.shader_inputs());
        }
        path
    }

    /// Walk every space the primary pass did not reach
    fn reconcile(&mut self) {
        for space in self.resolver.instances_of(&IfcType::IfcSpace) {
            if self.is_produced(&space) {
                continue;
            }
            log::debug!("Reconciling unreached space {}", space.id);
            let root = self.reconciliation_root();
            self.walk(&space, &root);
            self.report.reconciled += 1;
        }
    }

    fn reconciliation_root(&mut self) -> PrimPath {
        if let Some(root) = &self.reconciliation_root {
            return root.clone();
        }
        let root = self.world.child(&self.settings.reconciliation_root);
        self.sink.define_xform(&root);
        self.reconciliation_root = Some(root.clone());
        root
    }

    fn report_progress(&mut self) {
        let interval = self.settings.progress_interval.max(1);
        if self.report.nodes % interval != 0 {
            return;
        }
        let total = self.total_products.max(1);
        let done = self.report.nodes.min(total);
        let percentage = PROGRESS_START + (done * PROGRESS_SPAN / total) as u8;
        // Percentages never decrease, even when reconciliation revisits the range
        let percentage = percentage.max(self.last_progress);
        self.last_progress = percentage;
        self.events.progress(
            percentage,
            &format!("Processing elements ({}/{})...", done, total),
        );
    }
}
