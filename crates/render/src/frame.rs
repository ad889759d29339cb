use glam::Vec3;
use tilelight_common::{AtlasLayout, RenderConfig};

use crate::backend::{FrameSubmission, RenderBackend};
use crate::emit;
use crate::geometry::{GeometryBuffer, Quad};
use crate::lights::{CullOutcome, Light, LightStore};
use crate::RenderError;

/// Offset from the camera vector to the translation uniform. Pairs with the
/// `-x - camera.x` culling convention.
pub const CAMERA_OFFSET: Vec3 = Vec3::new(0.0, -10.0, -30.0);

/// Translation uniform for a camera vector.
pub fn camera_translation(camera: Vec3) -> Vec3 {
    camera + CAMERA_OFFSET
}

/// Where the controller is in its per-frame cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameState {
    Idle,
    Building { camera: Vec3 },
}

/// Counts reported after a frame is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    pub frame: u64,
    pub vertices: usize,
    pub level_vertices: usize,
    pub lights: usize,
}

impl FrameStats {
    /// Vertices emitted during the frame itself.
    pub fn dynamic_vertices(&self) -> usize {
        self.vertices - self.level_vertices
    }
}

/// Owns the geometry buffer and light store and drives the
/// begin → emit* → end cycle.
///
/// # Invariants
/// - Emitters and lights are only accepted while a frame is being built.
/// - Every frame starts from exactly the static level geometry and no lights.
/// - A failed emitter leaves the frame open; the caller either keeps emitting
///   smaller content or calls [`abandon_frame`](Self::abandon_frame).
pub struct FrameController {
    config: RenderConfig,
    atlas: AtlasLayout,
    geometry: GeometryBuffer,
    lights: LightStore,
    state: FrameState,
    frames_submitted: u64,
}

impl FrameController {
    pub fn new(config: RenderConfig) -> Result<Self, RenderError> {
        config.validate()?;
        Ok(Self {
            atlas: AtlasLayout::from_config(&config),
            geometry: GeometryBuffer::new(config.max_vertices),
            lights: LightStore::new(config.max_lights),
            state: FrameState::Idle,
            frames_submitted: 0,
            config,
        })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn atlas(&self) -> &AtlasLayout {
        &self.atlas
    }

    pub fn geometry(&self) -> &GeometryBuffer {
        &self.geometry
    }

    pub fn lights(&self) -> &LightStore {
        &self.lights
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn frames_submitted(&self) -> u64 {
        self.frames_submitted
    }

    /// Change the atlas dimensions. Only allowed between frames; geometry
    /// already in the buffer keeps the coordinates it was built with.
    pub fn set_atlas_size(&mut self, texture_size: u32, tile_size: u32) -> Result<(), RenderError> {
        self.require_idle()?;
        let config = RenderConfig {
            texture_size,
            tile_size,
            ..self.config
        };
        config.validate()?;
        self.config = config;
        self.atlas = AtlasLayout::from_config(&config);
        tracing::debug!(
            texture_size,
            tile_size,
            tiles_per_row = self.atlas.tiles_per_row(),
            "atlas resized"
        );
        Ok(())
    }

    /// Rebuild the static level geometry.
    ///
    /// Everything `build` emits becomes the prefix every later frame starts
    /// from. If `build` fails the static prefix is left empty.
    pub fn build_level<F>(&mut self, build: F) -> Result<usize, RenderError>
    where
        F: FnOnce(&mut LevelBuilder<'_>) -> Result<(), RenderError>,
    {
        let _span = tracing::debug_span!("build_level").entered();
        self.require_idle()?;
        self.geometry.clear();

        let mut builder = LevelBuilder {
            geometry: &mut self.geometry,
            atlas: &self.atlas,
        };
        if let Err(err) = build(&mut builder) {
            self.geometry.clear();
            return Err(err);
        }

        let level_verts = self.geometry.len();
        self.geometry.set_static_vertex_count(level_verts)?;
        tracing::debug!(level_verts, "level geometry built");
        Ok(level_verts)
    }

    /// Start a frame viewed from `camera`.
    pub fn begin_frame(&mut self, camera: Vec3) -> Result<(), RenderError> {
        self.require_idle()?;
        self.geometry.reset_to_static();
        self.lights.clear();
        self.lights.reset_slots();
        self.state = FrameState::Building { camera };
        Ok(())
    }

    pub fn emit_floor_tile(&mut self, x: f32, z: f32, tile: u32) -> Result<(), RenderError> {
        self.require_building()?;
        emit::emit_floor_tile(&mut self.geometry, &self.atlas, x, z, tile)
    }

    pub fn emit_block(
        &mut self,
        x: f32,
        z: f32,
        height: f32,
        top_tile: u32,
        side_tile: u32,
    ) -> Result<(), RenderError> {
        self.require_building()?;
        emit::emit_block(&mut self.geometry, &self.atlas, x, z, height, top_tile, side_tile)
    }

    pub fn emit_sprite(&mut self, position: Vec3, tile: u32) -> Result<CullOutcome, RenderError> {
        let camera = self.require_building()?;
        emit::emit_sprite(&mut self.geometry, &self.atlas, position, tile, camera)
    }

    /// Append an arbitrary quad to this frame.
    pub fn emit_quad(&mut self, quad: &Quad) -> Result<(), RenderError> {
        self.require_building()?;
        self.geometry.append_quad(&self.atlas, quad)
    }

    /// Offer a light to this frame's culler.
    pub fn push_light(&mut self, light: Light) -> Result<CullOutcome, RenderError> {
        let camera = self.require_building()?;
        Ok(self.lights.try_add(light, camera))
    }

    /// Submit the frame to `backend` and return to idle.
    pub fn end_frame<B>(&mut self, backend: &mut B) -> Result<FrameStats, RenderError>
    where
        B: RenderBackend + ?Sized,
    {
        let camera = self.require_building()?;
        let _span = tracing::trace_span!("end_frame", frame = self.frames_submitted).entered();

        let vertex_count = self.geometry.len();
        let draw_count = u32::try_from(vertex_count).map_err(|_| RenderError::CapacityExceeded {
            requested: vertex_count,
            capacity: u32::MAX as usize,
        })?;
        backend.submit(&FrameSubmission {
            camera_translation: camera_translation(camera),
            lights: self.lights.as_floats(),
            vertices: self.geometry.all(),
            vertex_count: draw_count,
        });

        let stats = FrameStats {
            frame: self.frames_submitted,
            vertices: vertex_count,
            level_vertices: self.geometry.level_len(),
            lights: self.lights.len(),
        };
        tracing::trace!(
            vertices = stats.vertices,
            lights = stats.lights,
            "frame submitted"
        );

        self.frames_submitted += 1;
        self.state = FrameState::Idle;
        Ok(stats)
    }

    /// Drop the frame being built without drawing anything.
    pub fn abandon_frame(&mut self) {
        if let FrameState::Building { .. } = self.state {
            tracing::warn!(
                frame = self.frames_submitted,
                vertices = self.geometry.len(),
                "frame abandoned"
            );
            self.geometry.reset_to_static();
            self.lights.clear();
            self.state = FrameState::Idle;
        }
    }

    fn require_idle(&self) -> Result<(), RenderError> {
        match self.state {
            FrameState::Idle => Ok(()),
            FrameState::Building { .. } => Err(RenderError::FrameInProgress),
        }
    }

    fn require_building(&self) -> Result<Vec3, RenderError> {
        match self.state {
            FrameState::Building { camera } => Ok(camera),
            FrameState::Idle => Err(RenderError::NoFrameInProgress),
        }
    }
}

/// Emitter handle used while building static level geometry.
pub struct LevelBuilder<'a> {
    geometry: &'a mut GeometryBuffer,
    atlas: &'a AtlasLayout,
}

impl LevelBuilder<'_> {
    pub fn floor_tile(&mut self, x: f32, z: f32, tile: u32) -> Result<(), RenderError> {
        emit::emit_floor_tile(self.geometry, self.atlas, x, z, tile)
    }

    pub fn block(
        &mut self,
        x: f32,
        z: f32,
        height: f32,
        top_tile: u32,
        side_tile: u32,
    ) -> Result<(), RenderError> {
        emit::emit_block(self.geometry, self.atlas, x, z, height, top_tile, side_tile)
    }

    pub fn quad(&mut self, quad: &Quad) -> Result<(), RenderError> {
        self.geometry.append_quad(self.atlas, quad)
    }

    /// Vertices emitted so far.
    pub fn len(&self) -> usize {
        self.geometry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometry.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingBackend;
    use crate::emit::DEFAULT_BLOCK_HEIGHT;

    fn controller(max_vertices: usize, max_lights: usize) -> FrameController {
        FrameController::new(RenderConfig {
            max_vertices,
            max_lights,
            ..RenderConfig::default()
        })
        .unwrap()
    }

    fn two_tile_level(level: &mut LevelBuilder<'_>) -> Result<(), RenderError> {
        level.floor_tile(0.0, 0.0, 1)?;
        level.floor_tile(8.0, 0.0, 1)
    }

    #[test]
    fn rejects_invalid_config() {
        let result = FrameController::new(RenderConfig {
            max_lights: 0,
            ..RenderConfig::default()
        });
        assert!(matches!(result, Err(RenderError::Config(_))));
    }

    #[test]
    fn frame_cycle_reports_counts() {
        let mut frames = controller(1024, 4);
        assert_eq!(frames.build_level(two_tile_level).unwrap(), 12);

        let mut backend = RecordingBackend::new();
        frames.begin_frame(Vec3::ZERO).unwrap();
        frames.emit_floor_tile(16.0, 0.0, 2).unwrap();
        frames.emit_block(0.0, 8.0, DEFAULT_BLOCK_HEIGHT, 3, 4).unwrap();
        assert!(frames.emit_sprite(Vec3::new(4.0, 0.0, 4.0), 5).unwrap().is_accepted());
        assert!(!frames.emit_sprite(Vec3::new(500.0, 0.0, 4.0), 5).unwrap().is_accepted());
        let stats = frames.end_frame(&mut backend).unwrap();

        // level 12 + floor 6 + block 24 + one accepted sprite 6
        assert_eq!(stats.vertices, 12 + 6 + 24 + 6);
        assert_eq!(stats.dynamic_vertices(), 36);
        assert_eq!(stats.frame, 0);
        assert_eq!(frames.state(), FrameState::Idle);
        assert_eq!(frames.frames_submitted(), 1);
        assert_eq!(backend.last().unwrap().drawn.len(), 48);
    }

    #[test]
    fn begin_frame_resets_to_level_geometry() {
        let mut frames = controller(1024, 4);
        frames.build_level(two_tile_level).unwrap();
        let mut backend = RecordingBackend::new();

        frames.begin_frame(Vec3::ZERO).unwrap();
        for i in 0..10 {
            frames.emit_floor_tile(i as f32 * 8.0, 64.0, 0).unwrap();
        }
        frames.end_frame(&mut backend).unwrap();

        frames.begin_frame(Vec3::ZERO).unwrap();
        assert_eq!(frames.geometry().len(), 12);
        let stats = frames.end_frame(&mut backend).unwrap();
        assert_eq!(stats.vertices, 12);

        // the static prefix is identical in both frames
        let frames_seen = backend.frames();
        assert_eq!(frames_seen[0].drawn[..12], frames_seen[1].drawn[..]);
    }

    #[test]
    fn lights_reset_every_frame() {
        let mut frames = controller(64, 3);
        let mut backend = RecordingBackend::new();

        frames.begin_frame(Vec3::ZERO).unwrap();
        let light = Light::new(Vec3::new(10.0, 4.0, 10.0), Vec3::new(1.0, 0.5, 0.2), 0.05);
        assert!(frames.push_light(light).unwrap().is_accepted());
        frames.end_frame(&mut backend).unwrap();
        assert_eq!(&backend.last().unwrap().lights[..7], &[10.0, 4.0, 10.0, 1.0, 0.5, 0.2, 0.05]);
        assert!(backend.last().unwrap().lights[7..].iter().all(|&f| f == 1.0));

        frames.begin_frame(Vec3::ZERO).unwrap();
        assert!(frames.lights().is_empty());
        assert!(frames.lights().as_floats().iter().all(|&f| f == 1.0));
        frames.end_frame(&mut backend).unwrap();
        assert_eq!(backend.last().unwrap().lights.len(), 21);
    }

    #[test]
    fn light_culling_follows_frame_camera() {
        let mut frames = controller(64, 16);
        let light = Light::new(Vec3::new(200.0, 0.0, 0.0), Vec3::ONE, 0.01);

        frames.begin_frame(Vec3::ZERO).unwrap();
        assert_eq!(frames.push_light(light).unwrap(), CullOutcome::Accepted);
        frames.abandon_frame();

        frames.begin_frame(Vec3::new(0.0, 0.0, 300.0)).unwrap();
        assert_eq!(frames.push_light(light).unwrap(), CullOutcome::OutOfRange);
        assert!(frames.lights().is_empty());
    }

    #[test]
    fn submission_carries_camera_translation() {
        let mut frames = controller(64, 2);
        let mut backend = RecordingBackend::new();
        frames.begin_frame(Vec3::new(-40.0, 0.0, -56.0)).unwrap();
        frames.end_frame(&mut backend).unwrap();

        let frame = backend.last().unwrap();
        assert_eq!(frame.camera_translation, Vec3::new(-40.0, -10.0, -86.0));
        assert_eq!(frame.uploaded_vertices, 64);
    }

    #[test]
    fn state_machine_rejects_out_of_order_calls() {
        let mut frames = controller(64, 2);
        let mut backend = RecordingBackend::new();

        assert!(matches!(
            frames.emit_floor_tile(0.0, 0.0, 0),
            Err(RenderError::NoFrameInProgress)
        ));
        assert!(matches!(
            frames.push_light(Light::NEUTRAL),
            Err(RenderError::NoFrameInProgress)
        ));
        assert!(matches!(
            frames.end_frame(&mut backend),
            Err(RenderError::NoFrameInProgress)
        ));

        frames.begin_frame(Vec3::ZERO).unwrap();
        assert!(matches!(
            frames.begin_frame(Vec3::ZERO),
            Err(RenderError::FrameInProgress)
        ));
        assert!(matches!(
            frames.build_level(|_| Ok(())),
            Err(RenderError::FrameInProgress)
        ));
        assert!(matches!(
            frames.set_atlas_size(512, 16),
            Err(RenderError::FrameInProgress)
        ));
        assert!(backend.frames().is_empty());
    }

    #[test]
    fn overflow_then_abandon() {
        let mut frames = controller(18, 2);
        frames.build_level(|level| level.floor_tile(0.0, 0.0, 0)).unwrap();
        let mut backend = RecordingBackend::new();

        frames.begin_frame(Vec3::ZERO).unwrap();
        frames.emit_floor_tile(8.0, 0.0, 0).unwrap();
        let err = frames.emit_block(16.0, 0.0, 8.0, 0, 0).unwrap_err();
        assert!(matches!(
            err,
            RenderError::CapacityExceeded {
                requested: 36,
                capacity: 18
            }
        ));
        assert_eq!(frames.geometry().len(), 12);

        frames.abandon_frame();
        assert_eq!(frames.state(), FrameState::Idle);
        assert_eq!(frames.geometry().len(), 6);
        assert!(backend.frames().is_empty());

        frames.begin_frame(Vec3::ZERO).unwrap();
        let stats = frames.end_frame(&mut backend).unwrap();
        assert_eq!(stats.vertices, 6);
        assert_eq!(stats.frame, 0);
    }

    #[test]
    fn failed_level_build_leaves_no_static_geometry() {
        let mut frames = controller(6, 2);
        let err = frames
            .build_level(|level| {
                level.floor_tile(0.0, 0.0, 0)?;
                level.floor_tile(8.0, 0.0, 0)
            })
            .unwrap_err();
        assert!(matches!(err, RenderError::CapacityExceeded { .. }));
        assert_eq!(frames.geometry().level_len(), 0);

        frames.begin_frame(Vec3::ZERO).unwrap();
        assert!(frames.geometry().is_empty());
    }

    #[test]
    fn atlas_resize_changes_tile_range() {
        let mut frames = controller(64, 2);
        frames.set_atlas_size(256, 32).unwrap();
        assert_eq!(frames.atlas().tiles_per_row(), 8);
        assert_eq!(frames.config().texture_size, 256);

        frames.begin_frame(Vec3::ZERO).unwrap();
        assert!(matches!(
            frames.emit_floor_tile(0.0, 0.0, 8),
            Err(RenderError::TileOutOfRange {
                tile: 8,
                tiles_per_row: 8
            })
        ));
        frames.abandon_frame();

        assert!(frames.set_atlas_size(16, 32).is_err());
        assert_eq!(frames.atlas().tiles_per_row(), 8);
    }

    #[test]
    fn emit_quad_checks_frame_and_tile() {
        let mut frames = controller(64, 2);
        let quad = emit::floor_quad(0.0, 0.0, 3);
        assert!(matches!(
            frames.emit_quad(&quad),
            Err(RenderError::NoFrameInProgress)
        ));

        frames.begin_frame(Vec3::ZERO).unwrap();
        frames.emit_quad(&quad).unwrap();
        assert_eq!(frames.geometry().len(), 6);

        let tiles = frames.atlas().tiles_per_row();
        assert!(matches!(
            frames.emit_quad(&emit::floor_quad(8.0, 0.0, tiles)),
            Err(RenderError::TileOutOfRange { tile, .. }) if tile == tiles
        ));
        assert_eq!(frames.geometry().len(), 6);

        let mut backend = RecordingBackend::new();
        let stats = frames.end_frame(&mut backend).unwrap();
        assert_eq!(stats.vertices, 6);
        assert_eq!(backend.last().unwrap().drawn, frames.geometry().all()[..6]);
    }

    #[test]
    fn rejects_config_past_buffer_limits() {
        let result = FrameController::new(RenderConfig {
            max_vertices: tilelight_common::MAX_VERTICES + 1,
            ..RenderConfig::default()
        });
        assert!(matches!(result, Err(RenderError::Config(_))));
    }

    #[test]
    fn level_builder_quad() {
        let mut frames = controller(64, 2);
        let n = frames
            .build_level(|level| {
                level.quad(&emit::floor_quad(0.0, 0.0, 0))?;
                assert_eq!(level.len(), 6);
                level.block(8.0, 0.0, 16.0, 1, 2)
            })
            .unwrap();
        assert_eq!(n, 30);
    }
}
