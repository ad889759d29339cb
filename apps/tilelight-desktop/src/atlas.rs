//! Procedural atlas for the demo dungeon, so the viewer runs without any
//! asset files. The atlas is one row of tiles: `texture_size` wide and one
//! tile tall.

use tilelight_common::AtlasLayout;
use tilelight_render::demo::{CREATURE_TILE, FLOOR_TILE, TORCH_TILE, WALL_SIDE_TILE, WALL_TOP_TILE};
use tilelight_render_wgpu::{AtlasImage, TextureError};

const CLEAR: [u8; 4] = [0, 0, 0, 0];

fn noise(x: u32, y: u32, tile: u32) -> u8 {
    let h = x.wrapping_mul(73_856_093) ^ y.wrapping_mul(19_349_663) ^ tile.wrapping_mul(83_492_791);
    (h % 24) as u8
}

fn stone(base: u8, x: u32, y: u32, tile: u32) -> [u8; 4] {
    let v = base + noise(x, y, tile);
    [v, v, v + 8, 255]
}

fn brick(x: u32, y: u32, size: u32, tile: u32) -> [u8; 4] {
    let row = y / (size / 4).max(1);
    let offset = if row % 2 == 0 { 0 } else { size / 4 };
    let mortar = y % (size / 4).max(1) == 0 || (x + offset) % (size / 2).max(1) == 0;
    if mortar {
        [50, 45, 45, 255]
    } else {
        let v = noise(x, y, tile);
        [120 + v, 70 + v / 2, 60, 255]
    }
}

/// A round green creature with two glowing eyes.
fn creature(x: u32, y: u32, size: u32) -> [u8; 4] {
    let c = size as f32 / 2.0;
    let dx = x as f32 + 0.5 - c;
    let dy = y as f32 + 0.5 - c * 1.2;
    if dx * dx + dy * dy > c * c * 0.7 {
        return CLEAR;
    }
    let eye_y = size / 2;
    if y == eye_y && (x == size / 3 || x == size - 1 - size / 3) {
        // saturated red-orange with no blue is drawn unlit by the shader
        return [255, 80, 0, 255];
    }
    [40, 150 + (y * 4).min(80) as u8, 60, 255]
}

/// A torch: wooden handle with a flame that ignores lighting.
fn torch(x: u32, y: u32, size: u32) -> [u8; 4] {
    let mid = size / 2;
    if y > size / 2 {
        if x + 1 >= mid && x <= mid {
            return [110, 70, 30, 255];
        }
        return CLEAR;
    }
    let spread = (y / 2).min(mid);
    if x + spread >= mid && x <= mid + spread / 2 && y >= size / 8 {
        return [255, 200, 0, 255];
    }
    CLEAR
}

fn texel(tile: u32, x: u32, y: u32, size: u32) -> [u8; 4] {
    match tile {
        FLOOR_TILE => stone(70, x, y, tile),
        WALL_TOP_TILE => stone(110, x, y, tile),
        WALL_SIDE_TILE => brick(x, y, size, tile),
        CREATURE_TILE => creature(x, y, size),
        TORCH_TILE => torch(x, y, size),
        _ => CLEAR,
    }
}

pub fn demo_atlas(layout: &AtlasLayout) -> Result<AtlasImage, TextureError> {
    let width = layout.texture_size();
    let size = layout.tile_size();
    let mut rgba = Vec::with_capacity(width as usize * size as usize * 4);
    for y in 0..size {
        for x in 0..width {
            let tile = x / size;
            rgba.extend_from_slice(&texel(tile, x % size, y, size));
        }
    }
    AtlasImage::from_rgba8(width, size, rgba)
}
