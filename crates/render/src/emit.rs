//! Primitive emitters: floors, blocks and billboard sprites expanded into
//! quads on the 8×8 cell grid.
//!
//! The `*_quad(s)` functions are pure shape expansion; the `emit_*` functions
//! append the result to a [`GeometryBuffer`].

use glam::Vec3;
use tilelight_common::AtlasLayout;

use crate::geometry::{GeometryBuffer, Quad};
use crate::lights::{CULL_DISTANCE, CullOutcome, within_camera_range};
use crate::RenderError;

/// Horizontal size of one level cell.
pub const CELL_SIZE: f32 = 8.0;

/// Height used by blocks unless the caller overrides it.
pub const DEFAULT_BLOCK_HEIGHT: f32 = 8.0;

/// Width and height of a billboard sprite.
pub const SPRITE_SIZE: f32 = 6.0;

/// Flat floor tile at height 0 covering `[x, x+8] × [z, z+8]`.
pub fn floor_quad(x: f32, z: f32, tile: u32) -> Quad {
    let x2 = x + CELL_SIZE;
    let z2 = z + CELL_SIZE;
    Quad {
        corners: [
            Vec3::new(x, 0.0, z),
            Vec3::new(x2, 0.0, z),
            Vec3::new(x, 0.0, z2),
            Vec3::new(x2, 0.0, z2),
        ],
        normal: Vec3::Y,
        tile,
    }
}

/// Top, right (+x), front (+z) and left (-x) faces of a block.
///
/// The back face (-z) always points away from the fixed camera and is
/// never emitted.
pub fn block_quads(x: f32, z: f32, height: f32, top_tile: u32, side_tile: u32) -> [Quad; 4] {
    let x2 = x + CELL_SIZE;
    let z2 = z + CELL_SIZE;
    let y = height;
    [
        Quad {
            corners: [
                Vec3::new(x, y, z),
                Vec3::new(x2, y, z),
                Vec3::new(x, y, z2),
                Vec3::new(x2, y, z2),
            ],
            normal: Vec3::Y,
            tile: top_tile,
        },
        Quad {
            corners: [
                Vec3::new(x2, y, z),
                Vec3::new(x2, y, z2),
                Vec3::new(x2, 0.0, z),
                Vec3::new(x2, 0.0, z2),
            ],
            normal: Vec3::X,
            tile: side_tile,
        },
        Quad {
            corners: [
                Vec3::new(x, y, z2),
                Vec3::new(x2, y, z2),
                Vec3::new(x, 0.0, z2),
                Vec3::new(x2, 0.0, z2),
            ],
            normal: Vec3::Z,
            tile: side_tile,
        },
        Quad {
            corners: [
                Vec3::new(x, y, z),
                Vec3::new(x, y, z2),
                Vec3::new(x, 0.0, z),
                Vec3::new(x, 0.0, z2),
            ],
            normal: Vec3::NEG_X,
            tile: side_tile,
        },
    ]
}

/// Camera-facing sprite quad, or `None` when the sprite is out of range.
///
/// The bottom edge is pushed towards the camera by
/// `tilt = 3 + (camera.z + z) / 12`, a tuned stand-in for perspective
/// correction of flat billboards.
pub fn sprite_quad(position: Vec3, tile: u32, camera: Vec3) -> Option<Quad> {
    if !within_camera_range(position, camera, CULL_DISTANCE) {
        return None;
    }
    let Vec3 { x, y, z } = position;
    let tilt = 3.0 + (camera.z + z) / 12.0;
    Some(Quad {
        corners: [
            Vec3::new(x, y + SPRITE_SIZE, z),
            Vec3::new(x + SPRITE_SIZE, y + SPRITE_SIZE, z),
            Vec3::new(x, y, z + tilt),
            Vec3::new(x + SPRITE_SIZE, y, z + tilt),
        ],
        normal: Vec3::Z,
        tile,
    })
}

pub fn emit_floor_tile(
    buffer: &mut GeometryBuffer,
    atlas: &AtlasLayout,
    x: f32,
    z: f32,
    tile: u32,
) -> Result<(), RenderError> {
    buffer.append_quad(atlas, &floor_quad(x, z, tile))
}

pub fn emit_block(
    buffer: &mut GeometryBuffer,
    atlas: &AtlasLayout,
    x: f32,
    z: f32,
    height: f32,
    top_tile: u32,
    side_tile: u32,
) -> Result<(), RenderError> {
    buffer.append_quads(atlas, &block_quads(x, z, height, top_tile, side_tile))
}

/// Emit a sprite if it survives distance culling. A culled sprite writes
/// nothing and is not an error.
pub fn emit_sprite(
    buffer: &mut GeometryBuffer,
    atlas: &AtlasLayout,
    position: Vec3,
    tile: u32,
    camera: Vec3,
) -> Result<CullOutcome, RenderError> {
    match sprite_quad(position, tile, camera) {
        Some(quad) => {
            buffer.append_quad(atlas, &quad)?;
            Ok(CullOutcome::Accepted)
        }
        None => Ok(CullOutcome::OutOfRange),
    }
}
