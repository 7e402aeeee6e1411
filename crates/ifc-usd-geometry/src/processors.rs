// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry Processors - Implementations for various IFC geometry types
//!
//! Each processor handles one or more types of IFC geometry representations.
//! Processors use the `EntityResolver` trait for entity lookups and return
//! meshes in the item's own coordinate system.

use crate::{
    extrusion::extrude_profile,
    placement::{
        axis2_placement_2d, axis2_placement_3d, cartesian_point, coordinates, direction, to_2d,
    },
    profile::Profile2D,
    triangulation::triangulate_face,
    Error, Mesh, Result,
};
use ifc_usd_model::{AttributeValue, DecodedEntity, EntityResolver, EntityResolverExt, IfcType};
use nalgebra::{Point2, Point3};

use super::router::GeometryProcessor;

/// Resolve a required entity-valued attribute
fn required(
    entity: &DecodedEntity,
    name: &'static str,
    resolver: &dyn EntityResolver,
) -> Result<std::sync::Arc<DecodedEntity>> {
    let id = entity
        .attr_ref(name)
        .ok_or_else(|| Error::missing(entity.id, name))?;
    resolver.get(id).ok_or_else(|| Error::entity_not_found(id))
}

/// ExtrudedAreaSolid processor
///
/// Handles IfcExtrudedAreaSolid - the most common IFC geometry type.
/// Extrudes 2D profiles along a direction vector.
pub struct ExtrudedAreaSolidProcessor;

impl ExtrudedAreaSolidProcessor {
    /// Create new processor
    pub fn new() -> Self {
        Self
    }

    /// Extract a 2D profile from an IFC profile definition
    fn extract_profile(
        &self,
        profile_entity: &DecodedEntity,
        resolver: &dyn EntityResolver,
    ) -> Result<Profile2D> {
        let mut profile = match profile_entity.ifc_type {
            IfcType::IfcRectangleProfileDef => {
                let x_dim = profile_entity
                    .attr_float("XDim")
                    .ok_or_else(|| Error::missing(profile_entity.id, "XDim"))?;
                let y_dim = profile_entity
                    .attr_float("YDim")
                    .ok_or_else(|| Error::missing(profile_entity.id, "YDim"))?;
                Profile2D::rectangle(x_dim, y_dim)
            }
            IfcType::IfcCircleProfileDef => {
                let radius = profile_entity
                    .attr_float("Radius")
                    .ok_or_else(|| Error::missing(profile_entity.id, "Radius"))?;
                Profile2D::circle(radius, None)
            }
            IfcType::IfcCircleHollowProfileDef => {
                let radius = profile_entity
                    .attr_float("Radius")
                    .ok_or_else(|| Error::missing(profile_entity.id, "Radius"))?;
                let wall_thickness = profile_entity
                    .attr_float("WallThickness")
                    .ok_or_else(|| Error::missing(profile_entity.id, "WallThickness"))?;
                Profile2D::hollow_circle(radius, wall_thickness)?
            }
            IfcType::IfcArbitraryClosedProfileDef | IfcType::IfcArbitraryProfileDefWithVoids => {
                self.extract_arbitrary_profile(profile_entity, resolver)?
            }
            _ => {
                return Err(Error::unsupported_type(profile_entity.ifc_type.name()));
            }
        };

        // Parameterized profiles carry an optional 2D position
        if let Some(position) = resolver.attr_entity(profile_entity, "Position") {
            profile.transform(&axis2_placement_2d(&position, resolver));
        }

        Ok(profile)
    }

    /// Arbitrary closed profile, with inner curves as holes when present
    fn extract_arbitrary_profile(
        &self,
        entity: &DecodedEntity,
        resolver: &dyn EntityResolver,
    ) -> Result<Profile2D> {
        let outer_curve = required(entity, "OuterCurve", resolver)?;
        let outer_points = curve_points_2d(&outer_curve, resolver)?;
        if outer_points.len() < 3 {
            return Err(Error::profile("Profile must have at least 3 points"));
        }

        let mut profile = Profile2D::new(outer_points);

        for inner in resolver.attr_entities(entity, "InnerCurves") {
            match curve_points_2d(&inner, resolver) {
                Ok(points) if points.len() >= 3 => profile.add_hole(points),
                Ok(_) => {}
                Err(e) => log::debug!("Skipping inner curve #{}: {}", inner.id.0, e),
            }
        }

        Ok(profile)
    }
}

impl Default for ExtrudedAreaSolidProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometryProcessor for ExtrudedAreaSolidProcessor {
    fn process(&self, entity: &DecodedEntity, resolver: &dyn EntityResolver) -> Result<Mesh> {
        let profile_entity = required(entity, "SweptArea", resolver)?;
        let profile = self.extract_profile(&profile_entity, resolver)?;

        let extrusion_direction = required(entity, "ExtrudedDirection", resolver)
            .ok()
            .and_then(|d| direction(&d))
            .ok_or_else(|| Error::missing(entity.id, "ExtrudedDirection"))?;

        let depth = entity
            .attr_float("Depth")
            .ok_or_else(|| Error::missing(entity.id, "Depth"))?;

        let mut mesh = extrude_profile(&profile, &extrusion_direction, depth)?;

        if let Some(position) = resolver.attr_entity(entity, "Position") {
            mesh.transform(&axis2_placement_3d(&position, resolver));
        }

        Ok(mesh)
    }

    fn supported_types(&self) -> Vec<IfcType> {
        vec![IfcType::IfcExtrudedAreaSolid]
    }
}

/// Points of a bounded 2D curve, without the closing duplicate
fn curve_points_2d(curve: &DecodedEntity, resolver: &dyn EntityResolver) -> Result<Vec<Point2<f64>>> {
    let mut points: Vec<Point2<f64>> = match curve.ifc_type {
        IfcType::IfcPolyline => resolver
            .attr_entities(curve, "Points")
            .iter()
            .filter_map(|p| cartesian_point(p))
            .map(|p| to_2d(&p))
            .collect(),
        IfcType::IfcIndexedPolyCurve => indexed_poly_curve_points(curve, resolver)?
            .iter()
            .map(to_2d)
            .collect(),
        _ => return Err(Error::unsupported_type(curve.ifc_type.name())),
    };

    if points.len() > 1 {
        let first = points[0];
        let last = points[points.len() - 1];
        if (first - last).norm() < 1e-10 {
            points.pop();
        }
    }

    Ok(points)
}

/// Points of an IfcIndexedPolyCurve in segment order
///
/// Arc segments contribute their three control points; no arc sampling.
fn indexed_poly_curve_points(
    curve: &DecodedEntity,
    resolver: &dyn EntityResolver,
) -> Result<Vec<Point3<f64>>> {
    let point_list = required(curve, "Points", resolver)?;
    let coords: Vec<Point3<f64>> = point_list
        .attr("CoordList")
        .and_then(|v| v.as_list())
        .ok_or_else(|| Error::missing(point_list.id, "CoordList"))?
        .iter()
        .filter_map(|c| c.as_list().map(coordinates))
        .collect();

    let Some(segments) = curve.attr("Segments").and_then(|v| v.as_list()) else {
        return Ok(coords);
    };

    let mut points: Vec<Point3<f64>> = Vec::with_capacity(coords.len());
    let mut last_index = None;
    for segment in segments {
        // IFCLINEINDEX((1,2)) / IFCARCINDEX((2,3,4))
        let indices = match segment {
            AttributeValue::TypedValue(_, args) => args.first().and_then(|a| a.as_list()),
            AttributeValue::List(items) => Some(items.as_slice()),
            _ => None,
        };
        for index in indices.unwrap_or_default().iter().filter_map(|v| v.as_integer()) {
            if Some(index) == last_index {
                continue;
            }
            last_index = Some(index);
            if let Some(point) = usize::try_from(index - 1).ok().and_then(|i| coords.get(i)) {
                points.push(*point);
            }
        }
    }

    Ok(points)
}

/// Read an IfcCartesianPointList3D
fn point_list_3d(list: &DecodedEntity) -> Result<Vec<Point3<f64>>> {
    Ok(list
        .attr("CoordList")
        .and_then(|v| v.as_list())
        .ok_or_else(|| Error::missing(list.id, "CoordList"))?
        .iter()
        .filter_map(|c| c.as_list().map(coordinates))
        .collect())
}

/// 1-based index list to 0-based, dropping anything out of range
fn zero_based(values: &[AttributeValue], vertex_count: usize) -> Option<Vec<usize>> {
    values
        .iter()
        .map(|v| {
            v.as_integer()
                .and_then(|i| usize::try_from(i - 1).ok())
                .filter(|&i| i < vertex_count)
        })
        .collect()
}

/// TriangulatedFaceSet processor
///
/// Handles IfcTriangulatedFaceSet - explicit triangle meshes (IFC4+)
pub struct TriangulatedFaceSetProcessor;

impl TriangulatedFaceSetProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TriangulatedFaceSetProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometryProcessor for TriangulatedFaceSetProcessor {
    fn process(&self, entity: &DecodedEntity, resolver: &dyn EntityResolver) -> Result<Mesh> {
        let coordinates = required(entity, "Coordinates", resolver)?;
        let points = point_list_3d(&coordinates)?;

        let faces = entity
            .attr("CoordIndex")
            .and_then(|v| v.as_list())
            .ok_or_else(|| Error::missing(entity.id, "CoordIndex"))?;

        let mut mesh = Mesh::with_capacity(points.len(), faces.len() * 3);
        for point in &points {
            mesh.add_position(point);
        }

        for face in faces {
            match face.as_list().and_then(|f| zero_based(f, points.len())) {
                Some(tri) if tri.len() == 3 => {
                    mesh.add_triangle(tri[0] as u32, tri[1] as u32, tri[2] as u32)
                }
                _ => log::debug!("Skipping malformed triangle in #{}", entity.id.0),
            }
        }

        Ok(mesh)
    }

    fn supported_types(&self) -> Vec<IfcType> {
        vec![IfcType::IfcTriangulatedFaceSet]
    }
}

/// PolygonalFaceSet processor
///
/// Handles IfcPolygonalFaceSet - indexed planar polygons (IFC4+)
pub struct PolygonalFaceSetProcessor;

impl PolygonalFaceSetProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PolygonalFaceSetProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometryProcessor for PolygonalFaceSetProcessor {
    fn process(&self, entity: &DecodedEntity, resolver: &dyn EntityResolver) -> Result<Mesh> {
        let coordinates = required(entity, "Coordinates", resolver)?;
        let points = point_list_3d(&coordinates)?;

        let mut mesh = Mesh::new();
        for face in resolver.attr_entities(entity, "Faces") {
            let Some(polygon) = face
                .attr("CoordIndex")
                .and_then(|v| v.as_list())
                .and_then(|indices| zero_based(indices, points.len()))
            else {
                continue;
            };
            if polygon.len() < 3 {
                continue;
            }

            let outer: Vec<Point3<f64>> = polygon.iter().map(|&i| points[i]).collect();
            append_face(&mut mesh, &outer, &[]);
        }

        Ok(mesh)
    }

    fn supported_types(&self) -> Vec<IfcType> {
        vec![IfcType::IfcPolygonalFaceSet]
    }
}

/// Triangulate one planar face into `mesh`
fn append_face(mesh: &mut Mesh, outer: &[Point3<f64>], holes: &[Vec<Point3<f64>>]) {
    let (points, indices) = triangulate_face(outer, holes);
    let base = mesh.vertex_count() as u32;
    for point in &points {
        mesh.add_position(point);
    }
    for tri in indices.chunks_exact(3) {
        mesh.add_triangle(
            base + tri[0] as u32,
            base + tri[1] as u32,
            base + tri[2] as u32,
        );
    }
}

/// FacetedBrep processor
///
/// Handles IfcFacetedBrep - explicit mesh with faces.
/// Supports faces with inner bounds (holes).
pub struct FacetedBrepProcessor;

impl FacetedBrepProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Extract polygon points from an IfcPolyLoop
    fn extract_loop_points(
        &self,
        loop_entity: &DecodedEntity,
        resolver: &dyn EntityResolver,
    ) -> Option<Vec<Point3<f64>>> {
        let points: Vec<Point3<f64>> = resolver
            .attr_entities(loop_entity, "Polygon")
            .iter()
            .filter_map(|p| cartesian_point(p))
            .collect();

        (points.len() >= 3).then_some(points)
    }
}

impl Default for FacetedBrepProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometryProcessor for FacetedBrepProcessor {
    fn process(&self, entity: &DecodedEntity, resolver: &dyn EntityResolver) -> Result<Mesh> {
        let shell = required(entity, "Outer", resolver)?;
        let mut mesh = Mesh::new();

        for face in resolver.attr_entities(&shell, "CfsFaces") {
            let mut outer_points: Option<Vec<Point3<f64>>> = None;
            let mut hole_points: Vec<Vec<Point3<f64>>> = Vec::new();

            for bound in resolver.attr_entities(&face, "Bounds") {
                let Some(loop_entity) = resolver.attr_entity(&bound, "Bound") else {
                    continue;
                };
                let Some(mut points) = self.extract_loop_points(&loop_entity, resolver) else {
                    continue;
                };

                let orientation = bound
                    .attr("Orientation")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(true);
                if !orientation {
                    points.reverse();
                }

                // First bound stands in as outer until an explicit outer bound shows up
                let is_outer = bound.ifc_type == IfcType::IfcFaceOuterBound;
                if is_outer {
                    if let Some(previous) = outer_points.replace(points) {
                        hole_points.push(previous);
                    }
                } else if outer_points.is_none() {
                    outer_points = Some(points);
                } else {
                    hole_points.push(points);
                }
            }

            if let Some(outer) = outer_points {
                append_face(&mut mesh, &outer, &hole_points);
            }
        }

        Ok(mesh)
    }

    fn supported_types(&self) -> Vec<IfcType> {
        vec![IfcType::IfcFacetedBrep]
    }
}
