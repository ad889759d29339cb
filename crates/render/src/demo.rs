//! A small hand-made dungeon used by the CLI, the desktop viewer and the
//! benchmarks to drive full frames.

use glam::Vec3;

use crate::emit::{CELL_SIZE, DEFAULT_BLOCK_HEIGHT};
use crate::frame::{FrameController, LevelBuilder};
use crate::lights::{CullOutcome, Light};
use crate::RenderError;

pub const FLOOR_TILE: u32 = 1;
pub const WALL_TOP_TILE: u32 = 2;
pub const WALL_SIDE_TILE: u32 = 3;
pub const CREATURE_TILE: u32 = 8;
pub const TORCH_TILE: u32 = 9;

/// `#` wall, `.` floor, `c` creature on floor, `t` torch on floor.
const MAP: &[&str] = &[
    "################",
    "#..............#",
    "#.t....##....t.#",
    "#......##......#",
    "#..c........c..#",
    "#....######....#",
    "#..............#",
    "#.t..c....c..t.#",
    "#..............#",
    "################",
];

/// Parsed demo map.
#[derive(Debug, Clone)]
pub struct DemoScene {
    walls: Vec<(f32, f32)>,
    floors: Vec<(f32, f32)>,
    creatures: Vec<Vec3>,
    torches: Vec<Vec3>,
    width: usize,
    depth: usize,
}

impl Default for DemoScene {
    fn default() -> Self {
        Self::parse(MAP)
    }
}

impl DemoScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scene from rows of map characters.
    pub fn parse(rows: &[&str]) -> Self {
        let mut scene = Self {
            walls: Vec::new(),
            floors: Vec::new(),
            creatures: Vec::new(),
            torches: Vec::new(),
            width: rows.iter().map(|r| r.len()).max().unwrap_or(0),
            depth: rows.len(),
        };
        for (row, line) in rows.iter().enumerate() {
            for (col, ch) in line.chars().enumerate() {
                let x = col as f32 * CELL_SIZE;
                let z = row as f32 * CELL_SIZE;
                let center = Vec3::new(x + 1.0, 0.0, z + 2.0);
                match ch {
                    '#' => scene.walls.push((x, z)),
                    '.' => scene.floors.push((x, z)),
                    'c' => {
                        scene.floors.push((x, z));
                        scene.creatures.push(center);
                    }
                    't' => {
                        scene.floors.push((x, z));
                        scene.torches.push(center);
                    }
                    _ => {}
                }
            }
        }
        scene
    }

    pub fn wall_count(&self) -> usize {
        self.walls.len()
    }

    pub fn floor_count(&self) -> usize {
        self.floors.len()
    }

    pub fn creature_count(&self) -> usize {
        self.creatures.len()
    }

    pub fn torch_count(&self) -> usize {
        self.torches.len()
    }

    /// Camera vector that centers the map. The camera holds the negated
    /// point of interest.
    pub fn start_camera(&self) -> Vec3 {
        let cx = self.width as f32 * CELL_SIZE / 2.0;
        let cz = self.depth as f32 * CELL_SIZE / 2.0;
        Vec3::new(-cx, 0.0, -cz)
    }

    /// Emit walls and floors as static level geometry.
    pub fn build_level(&self, level: &mut LevelBuilder<'_>) -> Result<(), RenderError> {
        for &(x, z) in &self.floors {
            level.floor_tile(x, z, FLOOR_TILE)?;
        }
        for &(x, z) in &self.walls {
            level.block(x, z, DEFAULT_BLOCK_HEIGHT, WALL_TOP_TILE, WALL_SIDE_TILE)?;
        }
        Ok(())
    }

    /// Emit this frame's sprites and lights at time `t` seconds. Returns the
    /// number of sprites that survived culling.
    pub fn emit_frame(&self, frames: &mut FrameController, t: f32) -> Result<usize, RenderError> {
        let mut drawn = 0;
        for (i, &pos) in self.creatures.iter().enumerate() {
            let bob = (t * 4.0 + i as f32).sin().abs();
            let pos = pos + Vec3::new((t + i as f32).sin() * 2.0, bob, 0.0);
            if frames.emit_sprite(pos, CREATURE_TILE)? == CullOutcome::Accepted {
                drawn += 1;
            }
        }
        for (i, &pos) in self.torches.iter().enumerate() {
            if frames.emit_sprite(pos, TORCH_TILE)? == CullOutcome::Accepted {
                drawn += 1;
            }
            let flicker = 0.9 + 0.1 * (t * 13.0 + i as f32 * 1.7).sin();
            let light = Light::new(
                pos + Vec3::new(3.0, 6.0, 1.0),
                Vec3::new(1.0, 0.6, 0.3) * flicker,
                0.08,
            );
            frames.push_light(light)?;
        }
        Ok(drawn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingBackend;
    use tilelight_common::RenderConfig;

    #[test]
    fn parse_counts_cells() {
        let scene = DemoScene::parse(&["#.", "ct"]);
        assert_eq!(scene.wall_count(), 1);
        assert_eq!(scene.floor_count(), 3);
        assert_eq!(scene.creature_count(), 1);
        assert_eq!(scene.torch_count(), 1);
        assert_eq!(scene.start_camera(), Vec3::new(-8.0, 0.0, -8.0));
    }

    #[test]
    fn demo_frame_matches_vertex_budget() {
        let scene = DemoScene::new();
        let mut frames = FrameController::new(RenderConfig::default()).unwrap();
        let level = frames.build_level(|level| scene.build_level(level)).unwrap();
        assert_eq!(level, scene.floor_count() * 6 + scene.wall_count() * 24);

        let mut backend = RecordingBackend::new();
        frames.begin_frame(scene.start_camera()).unwrap();
        let sprites = scene.emit_frame(&mut frames, 0.0).unwrap();
        let stats = frames.end_frame(&mut backend).unwrap();

        // the whole map fits inside the culling window
        assert_eq!(sprites, scene.creature_count() + scene.torch_count());
        assert_eq!(stats.vertices, level + sprites * 6);
        assert_eq!(stats.lights, scene.torch_count());
    }
}
