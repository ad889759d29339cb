use glam::Vec3;
use std::collections::VecDeque;

use crate::geometry::Vertex;

/// Everything a backend needs to draw one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameSubmission<'a> {
    /// Translation added to every vertex position before the fixed view.
    pub camera_translation: Vec3,
    /// Every light slot as a flat array of `7 × max_lights` floats.
    pub lights: &'a [f32],
    /// The full vertex store, unused tail included.
    pub vertices: &'a [Vertex],
    /// Number of leading vertices to draw as a triangle list.
    pub vertex_count: u32,
}

impl FrameSubmission<'_> {
    /// The vertices that will actually be drawn.
    pub fn drawn(&self) -> &[Vertex] {
        &self.vertices[..self.vertex_count as usize]
    }
}

/// Graphics backend interface. All backends implement this trait.
///
/// Submission is fire-and-forget: the backend uploads the camera, the light
/// array and the vertex store, then issues one non-indexed triangle-list
/// draw. Frame pacing and GPU back-pressure are the backend's concern.
pub trait RenderBackend {
    fn submit(&mut self, frame: &FrameSubmission<'_>);
}

/// A submitted frame, as seen by [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedFrame {
    pub camera_translation: Vec3,
    pub lights: Vec<f32>,
    pub uploaded_vertices: usize,
    pub drawn: Vec<Vertex>,
}

/// Backend that keeps submissions in memory instead of drawing.
///
/// Used by headless tooling and tests to observe exactly what a GPU backend
/// would have received. With a retention limit only the most recent frames
/// are kept; older ones are dropped as new ones arrive.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    frames: VecDeque<RecordedFrame>,
    retain: Option<usize>,
    submitted: u64,
}

impl RecordingBackend {
    /// Keep every submitted frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most the `n` most recent frames (at least one).
    pub fn keep_last(n: usize) -> Self {
        Self {
            frames: VecDeque::with_capacity(n.max(1)),
            retain: Some(n.max(1)),
            submitted: 0,
        }
    }

    /// Retained frames, oldest first.
    pub fn frames(&self) -> &VecDeque<RecordedFrame> {
        &self.frames
    }

    pub fn last(&self) -> Option<&RecordedFrame> {
        self.frames.back()
    }

    /// Frames submitted over the backend's lifetime, retained or not.
    pub fn submitted(&self) -> u64 {
        self.submitted
    }

    /// Human-readable summary of the most recent frame.
    pub fn describe(&self) -> String {
        let Some(frame) = self.last() else {
            return "=== no frames submitted ===\n".to_string();
        };
        let mut out = String::new();
        out.push_str(&format!("=== Frame {} ===\n", self.submitted - 1));
        out.push_str(&format!(
            "Camera translation: ({:.1}, {:.1}, {:.1})\n",
            frame.camera_translation.x, frame.camera_translation.y, frame.camera_translation.z
        ));
        out.push_str(&format!(
            "Vertices: {} drawn / {} uploaded ({} quads)\n",
            frame.drawn.len(),
            frame.uploaded_vertices,
            frame.drawn.len() / crate::VERTS_PER_QUAD
        ));
        for (i, light) in frame.lights.chunks(crate::FLOATS_PER_LIGHT).enumerate() {
            if light.iter().all(|&f| f == 1.0) {
                continue;
            }
            out.push_str(&format!(
                "  light[{i}] pos=({:.1}, {:.1}, {:.1}) color=({:.2}, {:.2}, {:.2}) falloff={:.3}\n",
                light[0], light[1], light[2], light[3], light[4], light[5], light[6]
            ));
        }
        out
    }
}

impl RenderBackend for RecordingBackend {
    fn submit(&mut self, frame: &FrameSubmission<'_>) {
        if let Some(retain) = self.retain {
            while self.frames.len() >= retain {
                self.frames.pop_front();
            }
        }
        self.submitted += 1;
        self.frames.push_back(RecordedFrame {
            camera_translation: frame.camera_translation,
            lights: frame.lights.to_vec(),
            uploaded_vertices: frame.vertices.len(),
            drawn: frame.drawn().to_vec(),
        });
    }
}
