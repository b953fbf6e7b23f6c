//! # Heightmap Mesh Builder
//!
//! Converts a [`HeightField`] into a triangulated surface.
//!
//! ## Layout
//!
//! ```text
//!   x ->      0     s     2s
//!   y   0     v0 -- v1 -- v2        Z = (N-1)/2 - y
//!   |         |  \  |  \  |         X = x - (N-1)/2
//!   v   s     v3 -- v4 -- v5        Y = curve(h) * multiplier
//! ```
//!
//! The grid is centred on the origin. Each quad emits two triangles,
//! `(v, v+w+1, v+w)` and `(v+w+1, v, v+1)`, whose right-handed face normals
//! point up (+Y) on flat ground. Vertex normals are the normalized,
//! area-weighted sum of the adjacent face normals.
//!
//! ## Level of detail
//!
//! A stride `s > 1` samples every `s`-th cell along each axis. The vertex
//! count per line is `ceil(N / s)`; when `s` divides `N - 1` the last sample
//! sits on the chunk edge and the world extent is unchanged.

use bytemuck::{Pod, Zeroable};
use tessera_shared::{Vec2, Vec3};

use crate::curve::HeightCurve;
use crate::noise::HeightField;

/// Interleaved vertex for direct GPU upload.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    /// Position in chunk-local space [x, y, z]
    pub position: [f32; 3],
    /// Unit normal [nx, ny, nz]
    pub normal: [f32; 3],
    /// Texture coordinates [u, v]
    pub uv: [f32; 2],
}

/// Geometry for one (chunk, LOD) pair. Immutable once built.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshPayload {
    positions: Vec<Vec3>,
    uvs: Vec<Vec2>,
    normals: Vec<Vec3>,
    indices: Vec<u32>,
    vertices_per_line: usize,
    stride: usize,
}

impl MeshPayload {
    /// Vertex positions, row-major.
    #[must_use]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Texture coordinates, one per vertex.
    #[must_use]
    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    /// Unit normals, one per vertex.
    #[must_use]
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    /// Triangle list indices.
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Vertices along one row.
    #[must_use]
    pub const fn vertices_per_line(&self) -> usize {
        self.vertices_per_line
    }

    /// Sampling stride the mesh was built with.
    #[must_use]
    pub const fn stride(&self) -> usize {
        self.stride
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check if mesh is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Packs positions, normals and UVs into one vertex buffer.
    #[must_use]
    pub fn interleaved(&self) -> Vec<MeshVertex> {
        self.positions
            .iter()
            .zip(&self.normals)
            .zip(&self.uvs)
            .map(|((p, n), uv)| MeshVertex {
                position: p.to_array(),
                normal: n.to_array(),
                uv: uv.to_array(),
            })
            .collect()
    }
}

/// Number of samples taken along an axis of `len` cells at `stride`.
#[inline]
#[must_use]
pub fn samples_per_line(len: usize, stride: usize) -> usize {
    let stride = stride.max(1);
    (len + stride - 1) / stride
}

/// Builds the mesh for `field` at the given sampling `stride`.
///
/// Heights pass through `curve` and are then scaled by `height_multiplier`.
/// A stride of zero is treated as one.
#[must_use]
pub fn build(field: &HeightField, height_multiplier: f32, curve: &HeightCurve, stride: usize) -> MeshPayload {
    let stride = stride.max(1);
    let width = field.width();
    let height = field.height();

    let per_line = samples_per_line(width, stride);
    let lines = samples_per_line(height, stride);
    let vertex_count = per_line * lines;
    let quad_count = per_line.saturating_sub(1) * lines.saturating_sub(1);

    let mut positions = Vec::with_capacity(vertex_count);
    let mut uvs = Vec::with_capacity(vertex_count);
    let mut indices = Vec::with_capacity(quad_count * 6);

    let top_left_x = (width as f32 - 1.0) / -2.0;
    let top_left_z = (height as f32 - 1.0) / 2.0;

    for (row, y) in (0..height).step_by(stride).enumerate() {
        for (col, x) in (0..width).step_by(stride).enumerate() {
            let elevation = curve.evaluate(field.get(x, y)) * height_multiplier;
            positions.push(Vec3::new(top_left_x + x as f32, elevation, top_left_z - y as f32));
            uvs.push(Vec2::new(x as f32 / width as f32, y as f32 / height as f32));

            if col + 1 < per_line && row + 1 < lines {
                let v = (row * per_line + col) as u32;
                let w = per_line as u32;
                indices.extend_from_slice(&[v, v + w + 1, v + w]);
                indices.extend_from_slice(&[v + w + 1, v, v + 1]);
            }
        }
    }

    let normals = recalculate_normals(&positions, &indices);

    MeshPayload {
        positions,
        uvs,
        normals,
        indices,
        vertices_per_line: per_line,
        stride,
    }
}

/// Area-weighted vertex normals from triangle topology.
///
/// Vertices touched by no triangle get +Y.
#[must_use]
pub fn recalculate_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut sums = vec![Vec3::ZERO; positions.len()];

    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        // Unnormalized cross product = twice the triangle area
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        sums[a] += face;
        sums[b] += face;
        sums[c] += face;
    }

    sums.into_iter().map(|n| n.normalize_or(Vec3::Y)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::{generate, NoiseParameters};

    fn flat(n: usize) -> HeightField {
        HeightField::from_samples(n, n, vec![0.5; n * n]).unwrap()
    }

    #[test]
    fn test_full_resolution_counts() {
        let mesh = build(&flat(9), 10.0, &HeightCurve::linear(), 1);
        assert_eq!(mesh.vertex_count(), 81);
        assert_eq!(mesh.indices().len(), 6 * 8 * 8);
        assert_eq!(mesh.uvs().len(), 81);
        assert_eq!(mesh.normals().len(), 81);
    }

    #[test]
    fn test_stride_counts() {
        for (stride, per_line) in [(1, 9), (2, 5), (4, 3)] {
            let mesh = build(&flat(9), 1.0, &HeightCurve::linear(), stride);
            assert_eq!(mesh.vertices_per_line(), per_line);
            assert_eq!(mesh.vertex_count(), per_line * per_line);
            assert_eq!(mesh.indices().len(), 6 * (per_line - 1) * (per_line - 1));
        }
    }

    #[test]
    fn test_stride_keeps_extent() {
        let full = build(&flat(9), 1.0, &HeightCurve::linear(), 1);
        let coarse = build(&flat(9), 1.0, &HeightCurve::linear(), 4);
        assert_eq!(full.positions()[0], coarse.positions()[0]);
        assert_eq!(full.positions().last(), coarse.positions().last());
        assert_eq!(coarse.positions()[0], Vec3::new(-4.0, 0.5, 4.0));
    }

    #[test]
    fn test_indices_in_bounds() {
        let mesh = build(&flat(17), 1.0, &HeightCurve::linear(), 2);
        let count = mesh.vertex_count() as u32;
        assert!(mesh.indices().iter().all(|&i| i < count));
    }

    #[test]
    fn test_flat_ground_faces_up() {
        let mesh = build(&flat(5), 3.0, &HeightCurve::linear(), 1);
        for n in mesh.normals() {
            assert!((n.y - 1.0).abs() < 1e-6, "normal {n:?} should point up");
        }
    }

    #[test]
    fn test_slope_normals_lean_downhill() {
        // Height rises with x, so normals tilt towards -X
        let n = 5;
        let samples = (0..n * n).map(|i| (i % n) as f32 / (n - 1) as f32).collect();
        let field = HeightField::from_samples(n, n, samples).unwrap();
        let mesh = build(&field, 4.0, &HeightCurve::linear(), 1);
        for normal in mesh.normals() {
            assert!(normal.x < 0.0 && normal.y > 0.0);
            assert!(normal.z.abs() < 1e-5);
        }
    }

    #[test]
    fn test_mesh_is_centered() {
        for n in [2, 3, 8, 9, 33] {
            let field = generate(n, n, &NoiseParameters::default());
            let mesh = build(&field, 20.0, &HeightCurve::default(), 1);
            let count = mesh.vertex_count() as f64;
            let mean_x: f64 = mesh.positions().iter().map(|p| f64::from(p.x)).sum::<f64>() / count;
            let mean_z: f64 = mesh.positions().iter().map(|p| f64::from(p.z)).sum::<f64>() / count;
            assert!(mean_x.abs() < 1e-9, "mean x {mean_x} for n={n}");
            assert!(mean_z.abs() < 1e-9, "mean z {mean_z} for n={n}");
        }
    }

    #[test]
    fn test_height_goes_through_curve() {
        let field = HeightField::from_samples(2, 2, vec![0.2, 0.2, 1.0, 1.0]).unwrap();
        let mesh = build(&field, 10.0, &HeightCurve::water_table(0.4), 1);
        assert_eq!(mesh.positions()[0].y, 0.0);
        assert_eq!(mesh.positions()[2].y, 10.0);
    }

    #[test]
    fn test_uvs() {
        let mesh = build(&flat(4), 1.0, &HeightCurve::linear(), 1);
        assert_eq!(mesh.uvs()[0], Vec2::new(0.0, 0.0));
        assert_eq!(mesh.uvs()[3], Vec2::new(0.75, 0.0));
        assert_eq!(mesh.uvs()[15], Vec2::new(0.75, 0.75));
    }

    #[test]
    fn test_interleaved_matches_arrays() {
        let mesh = build(&flat(3), 1.0, &HeightCurve::linear(), 1);
        let verts = mesh.interleaved();
        assert_eq!(verts.len(), mesh.vertex_count());
        assert_eq!(verts[4].position, mesh.positions()[4].to_array());
        assert_eq!(bytemuck::cast_slice::<MeshVertex, u8>(&verts).len(), verts.len() * 32);
    }

    #[test]
    fn test_empty_field() {
        let field = HeightField::from_samples(0, 0, Vec::new()).unwrap();
        let mesh = build(&field, 1.0, &HeightCurve::linear(), 1);
        assert!(mesh.is_empty());
        assert_eq!(mesh.triangle_count(), 0);
    }
}
