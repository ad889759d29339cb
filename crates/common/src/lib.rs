//! Shared types for the tilelight renderer.
//!
//! # Invariants
//! - A `RenderConfig` is validated before any buffer is sized from it.
//! - Atlas coordinates for a valid tile always lie within `[0, 1]`.

mod atlas;
mod types;

pub use atlas::AtlasLayout;
pub use types::{ConfigError, MAX_LIGHT_FLOATS, MAX_VERTICES, RenderConfig};

pub fn crate_info() -> &'static str {
    "tilelight-common v0.1.0"
}
