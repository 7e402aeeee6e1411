// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh data structures

use ifc_usd_model::MeshData;
use nalgebra::{Matrix4, Point3, Vector3};

/// Triangle mesh
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Vertex positions (x, y, z)
    pub positions: Vec<f32>,
    /// Vertex normals (nx, ny, nz); empty when the source carries none
    pub normals: Vec<f32>,
    /// Triangle indices (i0, i1, i2)
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh with capacity
    pub fn with_capacity(vertex_count: usize, index_count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_count * 3),
            normals: Vec::with_capacity(vertex_count * 3),
            indices: Vec::with_capacity(index_count),
        }
    }

    /// Add a vertex with normal
    #[inline]
    pub fn add_vertex(&mut self, position: Point3<f64>, normal: Vector3<f64>) {
        self.positions.push(position.x as f32);
        self.positions.push(position.y as f32);
        self.positions.push(position.z as f32);

        self.normals.push(normal.x as f32);
        self.normals.push(normal.y as f32);
        self.normals.push(normal.z as f32);
    }

    /// Add a vertex without normal
    #[inline]
    pub fn add_position(&mut self, position: &Point3<f64>) {
        self.positions.push(position.x as f32);
        self.positions.push(position.y as f32);
        self.positions.push(position.z as f32);
    }

    /// Add a triangle
    #[inline]
    pub fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32) {
        self.indices.push(i0);
        self.indices.push(i1);
        self.indices.push(i2);
    }

    /// Merge another mesh into this one
    ///
    /// Normals are dropped for the whole mesh when either side lacks them,
    /// so positions and normals stay parallel.
    pub fn merge(&mut self, other: &Mesh) {
        if other.is_empty() {
            return;
        }

        let vertex_offset = self.vertex_count() as u32;
        let keep_normals =
            (self.positions.is_empty() || self.has_normals()) && other.has_normals();

        self.positions.extend_from_slice(&other.positions);
        if keep_normals {
            self.normals.extend_from_slice(&other.normals);
        } else {
            self.normals.clear();
        }
        self.indices
            .extend(other.indices.iter().map(|&i| i + vertex_offset));
    }

    /// Get vertex count
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Get triangle count
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check if mesh is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.is_empty()
    }

    fn has_normals(&self) -> bool {
        !self.normals.is_empty() && self.normals.len() == self.positions.len()
    }

    /// Apply a transformation matrix to positions and normals
    pub fn transform(&mut self, transform: &Matrix4<f64>) {
        self.positions.chunks_exact_mut(3).for_each(|chunk| {
            let point = Point3::new(chunk[0] as f64, chunk[1] as f64, chunk[2] as f64);
            let transformed = transform.transform_point(&point);
            chunk[0] = transformed.x as f32;
            chunk[1] = transformed.y as f32;
            chunk[2] = transformed.z as f32;
        });

        // Inverse transpose keeps normals perpendicular under non-uniform scale
        let normal_matrix = transform.try_inverse().unwrap_or(*transform).transpose();

        self.normals.chunks_exact_mut(3).for_each(|chunk| {
            let normal = Vector3::new(chunk[0] as f64, chunk[1] as f64, chunk[2] as f64);
            let transformed = (normal_matrix * normal.to_homogeneous()).xyz();
            let transformed = transformed.try_normalize(1e-12).unwrap_or(transformed);
            chunk[0] = transformed.x as f32;
            chunk[1] = transformed.y as f32;
            chunk[2] = transformed.z as f32;
        });
    }

    /// Scale positions uniformly (file units to meters)
    pub fn scale(&mut self, factor: f64) {
        if factor != 1.0 {
            let factor = factor as f32;
            self.positions.iter_mut().for_each(|p| *p *= factor);
        }
    }

    /// Convert into the shared buffer type handed to scene sinks
    pub fn into_mesh_data(self) -> MeshData {
        MeshData {
            positions: self.positions,
            normals: self.normals,
            indices: self.indices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn triangle(offset: f64) -> Mesh {
        let mut mesh = Mesh::new();
        let up = Vector3::new(0.0, 0.0, 1.0);
        mesh.add_vertex(Point3::new(offset, 0.0, 0.0), up);
        mesh.add_vertex(Point3::new(offset + 1.0, 0.0, 0.0), up);
        mesh.add_vertex(Point3::new(offset, 1.0, 0.0), up);
        mesh.add_triangle(0, 1, 2);
        mesh
    }

    #[test]
    fn test_merge_offsets_indices() {
        let mut mesh = triangle(0.0);
        mesh.merge(&triangle(5.0));
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(mesh.normals.len(), mesh.positions.len());
    }

    #[test]
    fn test_merge_without_normals_drops_them() {
        let mut mesh = triangle(0.0);
        let mut bare = triangle(1.0);
        bare.normals.clear();
        mesh.merge(&bare);
        assert_eq!(mesh.vertex_count(), 6);
        assert!(mesh.normals.is_empty());
    }

    #[test]
    fn test_transform_translates_positions_only() {
        let mut mesh = triangle(0.0);
        mesh.transform(&Matrix4::new_translation(&Vector3::new(1.0, 2.0, 3.0)));
        assert_relative_eq!(mesh.positions[0], 1.0);
        assert_relative_eq!(mesh.positions[1], 2.0);
        assert_relative_eq!(mesh.positions[2], 3.0);
        assert_relative_eq!(mesh.normals[2], 1.0);
    }

    #[test]
    fn test_scale_and_convert() {
        let mut mesh = triangle(1000.0);
        mesh.scale(0.001);
        let data = mesh.into_mesh_data();
        assert_relative_eq!(data.positions[0], 1.0);
        assert_eq!(data.triangle_count(), 1);
    }
}
