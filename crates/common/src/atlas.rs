/// Texture atlas layout: a single row of square tiles across the atlas width.
///
/// Each tile's u-range is inset by half a texel on both sides so nearest
/// sampling never bleeds into the neighbouring tile. The v-range always
/// covers the full atlas height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtlasLayout {
    texture_size: u32,
    tile_size: u32,
    tile_fraction: f32,
    px_nudge: f32,
}

impl Default for AtlasLayout {
    fn default() -> Self {
        Self::new(1024, 16)
    }
}

impl AtlasLayout {
    /// Callers are expected to have validated the sizes through
    /// [`RenderConfig::validate`](crate::RenderConfig::validate).
    pub fn new(texture_size: u32, tile_size: u32) -> Self {
        Self {
            texture_size,
            tile_size,
            tile_fraction: tile_size as f32 / texture_size as f32,
            px_nudge: 0.5 / texture_size as f32,
        }
    }

    pub fn from_config(config: &crate::RenderConfig) -> Self {
        Self::new(config.texture_size, config.tile_size)
    }

    pub fn texture_size(&self) -> u32 {
        self.texture_size
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn half_tile_size(&self) -> f32 {
        self.tile_size as f32 / 2.0
    }

    /// Share of the atlas width covered by one tile.
    pub fn tile_fraction(&self) -> f32 {
        self.tile_fraction
    }

    /// Half a texel in normalized coordinates.
    pub fn px_nudge(&self) -> f32 {
        self.px_nudge
    }

    pub fn tiles_per_row(&self) -> u32 {
        self.texture_size / self.tile_size
    }

    /// Inset u-range `(u_min, u_max)` of a tile, or `None` when the tile lies
    /// outside the atlas row.
    pub fn u_range(&self, tile: u32) -> Option<(f32, f32)> {
        if tile >= self.tiles_per_row() {
            return None;
        }
        let u = tile as f32 * self.tile_fraction + self.px_nudge;
        let u2 = u + self.tile_fraction - 2.0 * self.px_nudge;
        Some((u, u2))
    }
}
