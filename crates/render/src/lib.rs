//! Frame batching core: backend-agnostic geometry and light bookkeeping.
//!
//! One frame is `begin_frame` → any number of emitter and light calls →
//! `end_frame`, which hands a single vertex store, the light array and a
//! vertex count to a [`RenderBackend`] for one triangle-list draw.
//!
//! # Invariants
//! - Buffers are sized once from the configuration and never reallocate.
//! - Static level geometry occupies the front of the vertex store and is
//!   never overwritten by per-frame emitters.
//! - Writes past capacity fail with [`RenderError::CapacityExceeded`];
//!   culling rejections are silent outcomes, not errors.
//! - The camera is an explicit argument, never global state.

mod backend;
pub mod demo;
mod emit;
mod error;
mod frame;
mod geometry;
mod lights;

pub use backend::{FrameSubmission, RecordedFrame, RecordingBackend, RenderBackend};
pub use emit::{
    CELL_SIZE, DEFAULT_BLOCK_HEIGHT, SPRITE_SIZE, block_quads, emit_block, emit_floor_tile,
    emit_sprite, floor_quad, sprite_quad,
};
pub use error::RenderError;
pub use frame::{
    CAMERA_OFFSET, FrameController, FrameState, FrameStats, LevelBuilder, camera_translation,
};
pub use geometry::{FLOATS_PER_VERTEX, GeometryBuffer, Quad, VERTS_PER_QUAD, Vertex};
pub use lights::{CULL_DISTANCE, CullOutcome, FLOATS_PER_LIGHT, Light, LightStore, within_camera_range};

pub fn crate_info() -> &'static str {
    "tilelight-render v0.1.0"
}
