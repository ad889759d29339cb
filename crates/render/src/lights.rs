use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Base culling radius around the camera, in world units.
pub const CULL_DISTANCE: f32 = 128.0;

/// A point light: position, color and falloff (inverse attenuation).
///
/// 7 floats, packed with no padding so a slice of lights is the flat array
/// the shader indexes in strides of 7.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Light {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub falloff: f32,
}

/// Number of `f32` scalars in one [`Light`].
pub const FLOATS_PER_LIGHT: usize = std::mem::size_of::<Light>() / std::mem::size_of::<f32>();

impl Light {
    /// Value written into unused slots. Every field is 1.0.
    pub const NEUTRAL: Self = Self {
        position: [1.0; 3],
        color: [1.0; 3],
        falloff: 1.0,
    };

    pub fn new(position: Vec3, color: Vec3, falloff: f32) -> Self {
        Self {
            position: position.to_array(),
            color: color.to_array(),
            falloff,
        }
    }

    /// Culling radius: a wider window for lights that fall off slowly.
    pub fn max_distance(&self) -> f32 {
        CULL_DISTANCE + 1.0 / self.falloff
    }
}

/// Result of offering a light or sprite to the culler.
///
/// Rejection is an expected outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullOutcome {
    Accepted,
    OutOfRange,
    StoreFull,
}

impl CullOutcome {
    pub fn is_accepted(self) -> bool {
        self == Self::Accepted
    }
}

/// Camera-relative range check on the horizontal plane.
///
/// World geometry is drawn offset by the camera vector, so a point at world
/// `x` sits at `x + camera.x` on screen; `|-x - camera.x|` is that distance.
/// The same convention feeds the camera-translation uniform and must change
/// together with it.
pub fn within_camera_range(position: Vec3, camera: Vec3, max_distance: f32) -> bool {
    (-position.x - camera.x).abs() < max_distance && (-position.z - camera.z).abs() < max_distance
}

/// Fixed-capacity light slots, re-populated every frame.
///
/// # Invariants
/// - `count <= capacity`; the slot array never reallocates.
/// - After [`reset_slots`](Self::reset_slots), slots at or beyond `count`
///   hold [`Light::NEUTRAL`].
#[derive(Debug, Clone)]
pub struct LightStore {
    slots: Vec<Light>,
    count: usize,
}

impl LightStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![Light::NEUTRAL; capacity],
            count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of active lights this frame.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn clear(&mut self) {
        self.count = 0;
    }

    /// Overwrite every slot with the neutral light, regardless of `count`.
    pub fn reset_slots(&mut self) {
        self.slots.fill(Light::NEUTRAL);
    }

    /// Add `light` if a slot is free and it is near enough to `camera`.
    pub fn try_add(&mut self, light: Light, camera: Vec3) -> CullOutcome {
        if self.count >= self.capacity() {
            return CullOutcome::StoreFull;
        }
        if !within_camera_range(Vec3::from_array(light.position), camera, light.max_distance()) {
            return CullOutcome::OutOfRange;
        }
        self.slots[self.count] = light;
        self.count += 1;
        CullOutcome::Accepted
    }

    /// Active lights.
    pub fn lights(&self) -> &[Light] {
        &self.slots[..self.count]
    }

    /// Every slot as the flat float array uploaded to the shader.
    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.slots)
    }
}
