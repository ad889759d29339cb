use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use tilelight_common::AtlasLayout;

use crate::RenderError;

/// Vertices written per quad: two triangles, no shared index buffer.
pub const VERTS_PER_QUAD: usize = 6;

/// Interleaved per-vertex data: position, atlas coordinate, normal.
///
/// 8 floats, 32-byte stride. The field order is the attribute layout the
/// backends bind (position at offset 0, uv at 12, normal at 20).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub normal: [f32; 3],
}

/// Number of `f32` scalars in one [`Vertex`].
pub const FLOATS_PER_VERTEX: usize = std::mem::size_of::<Vertex>() / std::mem::size_of::<f32>();

/// Four corners of a planar quad plus its facing and atlas tile.
///
/// Corners are ordered so that (1, 2, 3) and (2, 3, 4) are the two triangles:
/// corners 1 and 2 take the top edge of the tile, 3 and 4 the bottom edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub corners: [Vec3; 4],
    pub normal: Vec3,
    pub tile: u32,
}

impl Quad {
    fn vertices(&self, u: f32, u2: f32) -> [Vertex; VERTS_PER_QUAD] {
        let n = self.normal.to_array();
        let [c1, c2, c3, c4] = self.corners.map(|c| c.to_array());
        let v = |position: [f32; 3], uv: [f32; 2]| Vertex {
            position,
            uv,
            normal: n,
        };
        [
            v(c1, [u, 0.0]),
            v(c2, [u2, 0.0]),
            v(c3, [u, 1.0]),
            v(c2, [u2, 0.0]),
            v(c3, [u, 1.0]),
            v(c4, [u2, 1.0]),
        ]
    }
}

/// Fixed-capacity vertex store shared by static level geometry and
/// per-frame dynamic geometry.
///
/// # Invariants
/// - `level_verts <= capacity` and `verts <= capacity`.
/// - Appends only write at `verts`, so once a frame has reset to the static
///   count, `[0, level_verts)` is never overwritten.
/// - The backing store never reallocates.
#[derive(Debug, Clone)]
pub struct GeometryBuffer {
    vertices: Vec<Vertex>,
    level_verts: usize,
    verts: usize,
}

impl GeometryBuffer {
    /// Allocate a zeroed store of `capacity` vertices.
    pub fn new(capacity: usize) -> Self {
        Self {
            vertices: vec![Vertex::zeroed(); capacity],
            level_verts: 0,
            verts: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.vertices.len()
    }

    /// Current vertex count (static prefix plus this frame's appends).
    pub fn len(&self) -> usize {
        self.verts
    }

    pub fn is_empty(&self) -> bool {
        self.verts == 0
    }

    /// Length of the static level prefix.
    pub fn level_len(&self) -> usize {
        self.level_verts
    }

    /// Record how many leading vertices are permanent level geometry.
    pub fn set_static_vertex_count(&mut self, n: usize) -> Result<(), RenderError> {
        if n > self.capacity() {
            return Err(RenderError::CapacityExceeded {
                requested: n,
                capacity: self.capacity(),
            });
        }
        self.level_verts = n;
        Ok(())
    }

    /// Discard everything appended since the static prefix.
    pub fn reset_to_static(&mut self) {
        self.verts = self.level_verts;
    }

    /// Discard all geometry, including the static prefix.
    pub fn clear(&mut self) {
        self.verts = 0;
        self.level_verts = 0;
    }

    /// Append one quad, mapped onto its atlas tile.
    pub fn append_quad(&mut self, atlas: &AtlasLayout, quad: &Quad) -> Result<(), RenderError> {
        self.append_quads(atlas, std::slice::from_ref(quad))
    }

    /// Append several quads. Either every quad is written or, on error,
    /// none is and the count is unchanged.
    pub fn append_quads(&mut self, atlas: &AtlasLayout, quads: &[Quad]) -> Result<(), RenderError> {
        let requested = self.verts + quads.len() * VERTS_PER_QUAD;
        if requested > self.capacity() {
            return Err(RenderError::CapacityExceeded {
                requested,
                capacity: self.capacity(),
            });
        }

        let mut ranges = Vec::with_capacity(quads.len());
        for quad in quads {
            let range = atlas
                .u_range(quad.tile)
                .ok_or(RenderError::TileOutOfRange {
                    tile: quad.tile,
                    tiles_per_row: atlas.tiles_per_row(),
                })?;
            ranges.push(range);
        }

        for (quad, (u, u2)) in quads.iter().zip(ranges) {
            let start = self.verts;
            self.vertices[start..start + VERTS_PER_QUAD].copy_from_slice(&quad.vertices(u, u2));
            self.verts += VERTS_PER_QUAD;
        }
        Ok(())
    }

    /// Vertices that will be drawn this frame.
    pub fn active(&self) -> &[Vertex] {
        &self.vertices[..self.verts]
    }

    /// The whole store, including the unused tail.
    pub fn all(&self) -> &[Vertex] {
        &self.vertices
    }

    /// The whole store as raw bytes for upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}
