// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extrusion operations - converting 2D profiles to 3D meshes

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::profile::{Profile2D, Triangulation};
use nalgebra::{Point2, Point3, Vector3};

/// Extrude a 2D profile along `direction` by `depth`
///
/// The profile lies in the XY plane of the solid's position; the direction is
/// expressed in the same frame and need not be normalized.
pub fn extrude_profile(profile: &Profile2D, direction: &Vector3<f64>, depth: f64) -> Result<Mesh> {
    if depth <= 0.0 {
        return Err(Error::geometry("Extrusion depth must be positive"));
    }
    let direction = direction
        .try_normalize(1e-12)
        .ok_or_else(|| Error::geometry("Extrusion direction has zero length"))?;
    if direction.z.abs() < 1e-9 {
        return Err(Error::geometry("Extrusion direction lies in the profile plane"));
    }

    let offset = direction * depth;
    let triangulation = profile.triangulate()?;

    let side_vertices: usize =
        (profile.outer.len() + profile.holes.iter().map(|h| h.len()).sum::<usize>()) * 4;
    let mut mesh = Mesh::with_capacity(
        triangulation.points.len() * 2 + side_vertices,
        triangulation.indices.len() * 2 + side_vertices / 4 * 6,
    );

    // Caps face away from the solid
    let sweep_up = offset.z > 0.0;
    create_cap_mesh(&triangulation, &Vector3::zeros(), !sweep_up, &mut mesh);
    create_cap_mesh(&triangulation, &offset, sweep_up, &mut mesh);

    create_side_walls(&profile.outer, &offset, &mut mesh);
    for hole in &profile.holes {
        create_side_walls(hole, &offset, &mut mesh);
    }

    Ok(mesh)
}

/// Create a cap mesh from a triangulation shifted by `offset`
#[inline]
fn create_cap_mesh(
    triangulation: &Triangulation,
    offset: &Vector3<f64>,
    facing_up: bool,
    mesh: &mut Mesh,
) {
    let base_index = mesh.vertex_count() as u32;
    let normal = if facing_up {
        Vector3::new(0.0, 0.0, 1.0)
    } else {
        Vector3::new(0.0, 0.0, -1.0)
    };

    for point in &triangulation.points {
        mesh.add_vertex(Point3::new(point.x, point.y, 0.0) + offset, normal);
    }

    for tri in triangulation.indices.chunks_exact(3) {
        let i0 = base_index + tri[0] as u32;
        let i1 = base_index + tri[1] as u32;
        let i2 = base_index + tri[2] as u32;

        if facing_up {
            mesh.add_triangle(i0, i1, i2);
        } else {
            mesh.add_triangle(i0, i2, i1);
        }
    }
}

/// Create side walls for one profile boundary
#[inline]
fn create_side_walls(boundary: &[Point2<f64>], offset: &Vector3<f64>, mesh: &mut Mesh) {
    for i in 0..boundary.len() {
        let p0 = &boundary[i];
        let p1 = &boundary[(i + 1) % boundary.len()];

        let edge = Vector3::new(p1.x - p0.x, p1.y - p0.y, 0.0);
        let Some(normal) = edge.cross(offset).try_normalize(1e-10) else {
            continue; // duplicate consecutive points
        };

        let v0_bottom = Point3::new(p0.x, p0.y, 0.0);
        let v1_bottom = Point3::new(p1.x, p1.y, 0.0);
        let v0_top = v0_bottom + offset;
        let v1_top = v1_bottom + offset;

        let idx = mesh.vertex_count() as u32;
        mesh.add_vertex(v0_bottom, normal);
        mesh.add_vertex(v1_bottom, normal);
        mesh.add_vertex(v1_top, normal);
        mesh.add_vertex(v0_top, normal);

        mesh.add_triangle(idx, idx + 1, idx + 2);
        mesh.add_triangle(idx, idx + 2, idx + 3);
    }
}
