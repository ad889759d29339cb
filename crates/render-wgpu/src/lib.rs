//! wgpu render backend for the tilelight frame batcher.
//!
//! Draws the whole frame with one pipeline and one non-indexed draw: the
//! vertex store is rewritten in full each frame, the camera translation and
//! light array travel in a single uniform buffer, and the atlas is sampled
//! with nearest filtering.
//!
//! # Invariants
//! - Buffers are sized once from the validated `RenderConfig`.
//! - The backend never touches frame state; it only consumes submissions.

mod gpu;
mod shaders;
mod texture;

pub use gpu::{WgpuBackend, WgpuFrame, pack_uniforms};
pub use shaders::{light_vec4s, world_shader};
pub use texture::{AtlasImage, TextureError};
