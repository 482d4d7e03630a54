//! Box geometry for chain segments.
//!
//! Every segment is drawn as an axis-aligned box centred on its pivot. Boxes differ
//! only in where their corners sit. Normals and triangle indices are identical
//! for every size, so one normal buffer and one index buffer serve all segments.
//!
//! # Layout
//!
//! Each face owns four vertices so it can carry a flat normal:
//!
//! | Vertices | Face | Normal |
//! |----------|------|--------|
//! | 0–3      | front  | +Z |
//! | 4–7      | back   | −Z |
//! | 8–11     | top    | +Y |
//! | 12–15    | bottom | −Y |
//! | 16–19    | right  | +X |
//! | 20–23    | left   | −X |
//!
//! Triangles wind counter-clockwise when seen from outside the box.

use glam::Vec3;

/// Vertices per box (four per face).
pub const BOX_VERTEX_COUNT: usize = 24;

/// Indices per box (two triangles per face).
pub const BOX_INDEX_COUNT: usize = 36;

/// Unit-box corners for each face, in counter-clockwise order seen from outside.
#[rustfmt::skip]
const FACES: [([f32; 3], [[f32; 3]; 4]); 6] = [
    // Front face (Z+)
    ([ 0.0,  0.0,  1.0], [[-1.0, -1.0,  1.0], [ 1.0, -1.0,  1.0], [ 1.0,  1.0,  1.0], [-1.0,  1.0,  1.0]]),
    // Back face (Z-)
    ([ 0.0,  0.0, -1.0], [[ 1.0, -1.0, -1.0], [-1.0, -1.0, -1.0], [-1.0,  1.0, -1.0], [ 1.0,  1.0, -1.0]]),
    // Top face (Y+)
    ([ 0.0,  1.0,  0.0], [[-1.0,  1.0,  1.0], [ 1.0,  1.0,  1.0], [ 1.0,  1.0, -1.0], [-1.0,  1.0, -1.0]]),
    // Bottom face (Y-)
    ([ 0.0, -1.0,  0.0], [[-1.0, -1.0, -1.0], [ 1.0, -1.0, -1.0], [ 1.0, -1.0,  1.0], [-1.0, -1.0,  1.0]]),
    // Right face (X+)
    ([ 1.0,  0.0,  0.0], [[ 1.0, -1.0,  1.0], [ 1.0, -1.0, -1.0], [ 1.0,  1.0, -1.0], [ 1.0,  1.0,  1.0]]),
    // Left face (X-)
    ([-1.0,  0.0,  0.0], [[-1.0, -1.0, -1.0], [-1.0, -1.0,  1.0], [-1.0,  1.0,  1.0], [-1.0,  1.0, -1.0]]),
];

/// CPU-side box geometry, ready for upload.
#[derive(Clone, Debug, PartialEq)]
pub struct BoxGeometry {
    /// Corner positions, scaled to the box's extent.
    pub positions: Vec<[f32; 3]>,
    /// Per-vertex face normals. Independent of extent.
    pub normals: Vec<[f32; 3]>,
    /// Triangle list indices. Independent of extent.
    pub indices: Vec<u16>,
}

impl BoxGeometry {
    /// Generates a `width × height × depth` box centred on the origin.
    pub fn new(width: f32, height: f32, depth: f32) -> Self {
        let half = Vec3::new(width, height, depth) * 0.5;

        let mut positions = Vec::with_capacity(BOX_VERTEX_COUNT);
        let mut normals = Vec::with_capacity(BOX_VERTEX_COUNT);
        for (normal, corners) in FACES {
            for corner in corners {
                positions.push((Vec3::from(corner) * half).to_array());
                normals.push(normal);
            }
        }

        let indices = (0..6u16)
            .flat_map(|face| {
                let base = face * 4;
                [base, base + 1, base + 2, base + 2, base + 3, base]
            })
            .collect();

        Self {
            positions,
            normals,
            indices,
        }
    }

    /// Box sized by an extent vector.
    pub fn from_extent(extent: Vec3) -> Self {
        Self::new(extent.x, extent.y, extent.z)
    }

    /// Axis-aligned bounds as `(min, max)`.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);

        for p in &self.positions {
            let p = Vec3::from(*p);
            min = min.min(p);
            max = max.max(p);
        }

        (min, max)
    }
}
