use tilelight_common::ConfigError;

/// Errors from building or submitting a frame.
///
/// Culling rejections are not errors; see [`CullOutcome`](crate::CullOutcome).
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("capacity exceeded: {requested} slots requested, capacity is {capacity}")]
    CapacityExceeded { requested: usize, capacity: usize },
    #[error("tile {tile} is outside the atlas row of {tiles_per_row} tiles")]
    TileOutOfRange { tile: u32, tiles_per_row: u32 },
    #[error("a frame is already being built")]
    FrameInProgress,
    #[error("no frame is being built")]
    NoFrameInProgress,
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}
