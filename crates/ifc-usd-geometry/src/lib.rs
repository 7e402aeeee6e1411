// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IFC-USD Geometry Tessellation
//!
//! Turns IFC body representations into triangle meshes for the scene
//! builder. The crate looks entities up through the `EntityResolver` trait
//! from `ifc-usd-model`, so it does not depend on a particular parser.
//!
//! ## Overview
//!
//! - **Profiles**: rectangle, circle, hollow circle and arbitrary closed profiles
//! - **Extrusion**: swept solids along an arbitrary direction
//! - **Face sets**: triangulated and polygonal face sets, faceted breps
//! - **Placement**: local placement chains and mapped item operators
//! - **Styles**: per-face material hints from `IfcStyledItem`
//!
//! ## Architecture
//!
//! - `GeometryProcessor`: one processor per representation item type
//! - `GeometryRouter`: dispatches items and implements `Tessellator`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ifc_usd_geometry::{GeometryRouter, Tessellator, TessellationSettings};
//!
//! let router = GeometryRouter::with_default_processors_and_unit_scale(0.001);
//! let shape = router.tessellate(&wall, &resolver, &TessellationSettings::default())?;
//!
//! println!("Generated {} triangles", shape.face_count());
//! ```

pub mod error;
pub mod extrusion;
pub mod mesh;
pub mod placement;
pub mod processors;
pub mod profile;
pub mod router;
pub mod triangulation;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix3, Matrix4, Point2, Point3, Vector2, Vector3};

// Re-export the tessellation contract
pub use ifc_usd_model::{MaterialHint, TessellatedShape, TessellationSettings, Tessellator};

// Re-export main types
pub use error::{Error, Result};
pub use extrusion::extrude_profile;
pub use mesh::Mesh;
pub use placement::{local_placement, placement_matrix};
pub use profile::{calculate_circle_segments, Profile2D, Triangulation};
pub use router::{surface_style, GeometryProcessor, GeometryRouter};
pub use triangulation::{
    calculate_polygon_normal, project_to_2d, project_to_2d_with_basis, triangulate_face,
    triangulate_polygon, triangulate_polygon_with_holes,
};

// Re-export processors
pub use processors::{
    ExtrudedAreaSolidProcessor, FacetedBrepProcessor, PolygonalFaceSetProcessor,
    TriangulatedFaceSetProcessor,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_extrusion() {
        let profile = Profile2D::rectangle(10.0, 5.0);
        let mesh = extrude_profile(&profile, &Vector3::z(), 20.0).unwrap();

        assert!(mesh.vertex_count() > 0);
        assert_eq!(mesh.triangle_count(), 12);
    }

    #[test]
    fn test_mesh_to_mesh_data() {
        let profile = Profile2D::rectangle(1.0, 1.0);
        let mesh = extrude_profile(&profile, &Vector3::z(), 1.0).unwrap();
        let (positions, normals, indices) =
            (mesh.positions.len(), mesh.normals.len(), mesh.indices.len());
        let mesh_data = mesh.into_mesh_data();

        assert_eq!(mesh_data.positions.len(), positions);
        assert_eq!(mesh_data.normals.len(), normals);
        assert_eq!(mesh_data.indices.len(), indices);
    }
}
