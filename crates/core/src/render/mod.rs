use serde::{Deserialize, Serialize};

use crate::{config::RenderConfig, FrameSize, JointId, Point, Pose};

/// Joint pairs connected by a bone segment.
pub const SKELETON_EDGES: [(JointId, JointId); 12] = [
    (JointId::LeftShoulder, JointId::LeftElbow),
    (JointId::LeftElbow, JointId::LeftWrist),
    (JointId::RightShoulder, JointId::RightElbow),
    (JointId::RightElbow, JointId::RightWrist),
    (JointId::LeftHip, JointId::LeftKnee),
    (JointId::LeftKnee, JointId::LeftAnkle),
    (JointId::RightHip, JointId::RightKnee),
    (JointId::RightKnee, JointId::RightAnkle),
    (JointId::LeftShoulder, JointId::RightShoulder),
    (JointId::LeftHip, JointId::RightHip),
    (JointId::LeftShoulder, JointId::LeftHip),
    (JointId::RightShoulder, JointId::RightHip),
];

/// Stroke/fill parameters passed to the surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: u32,
    pub width: f32,
}

/// Minimal 2D drawing backend the overlay renders onto.
pub trait DrawSurface {
    /// Current backing-store size.
    fn size(&self) -> FrameSize;
    /// Changes the backing-store size. Implementations may drop their
    /// contents, so callers only resize when the size actually changes.
    fn resize(&mut self, size: FrameSize);
    fn clear(&mut self);
    fn stroke_line(&mut self, from: Point, to: Point, stroke: Stroke);
    fn fill_circle(&mut self, center: Point, radius: f32, color: u32);
}

/// A recorded drawing operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawCommand {
    Clear,
    Line { from: Point, to: Point, stroke: Stroke },
    Circle { center: Point, radius: f32, color: u32 },
}

/// Surface that records commands since the last clear. Used headless and in
/// tests; a real backend would rasterise instead.
#[derive(Debug, Default, Clone)]
pub struct CommandSurface {
    size: FrameSize,
    commands: Vec<DrawCommand>,
    resize_count: usize,
}

impl CommandSurface {
    pub fn new(size: FrameSize) -> Self {
        Self {
            size,
            commands: Vec::new(),
            resize_count: 0,
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn line_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|cmd| matches!(cmd, DrawCommand::Line { .. }))
            .count()
    }

    pub fn circle_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|cmd| matches!(cmd, DrawCommand::Circle { .. }))
            .count()
    }

    /// Number of times the backing store was actually resized.
    pub fn resize_count(&self) -> usize {
        self.resize_count
    }
}

impl DrawSurface for CommandSurface {
    fn size(&self) -> FrameSize {
        self.size
    }

    fn resize(&mut self, size: FrameSize) {
        self.size = size;
        self.commands.clear();
        self.resize_count += 1;
    }

    fn clear(&mut self) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear);
    }

    fn stroke_line(&mut self, from: Point, to: Point, stroke: Stroke) {
        self.commands.push(DrawCommand::Line { from, to, stroke });
    }

    fn fill_circle(&mut self, center: Point, radius: f32, color: u32) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            color,
        });
    }
}

/// What a single render call put on the surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderStats {
    pub edges: usize,
    pub markers: usize,
}

/// Draws the skeleton of a mapped pose.
#[derive(Debug, Clone)]
pub struct SkeletonRenderer {
    threshold: f32,
    stroke: Stroke,
    marker_radius: f32,
}

impl SkeletonRenderer {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            threshold: config.confidence_threshold,
            stroke: Stroke {
                color: config.color,
                width: config.line_width,
            },
            marker_radius: config.marker_radius,
        }
    }

    /// Clears the whole surface, then draws every edge whose endpoints both
    /// clear the threshold and a marker at every joint that does. `None`
    /// leaves the surface cleared.
    pub fn draw<S: DrawSurface + ?Sized>(&self, surface: &mut S, pose: Option<&Pose>) -> RenderStats {
        surface.clear();
        let mut stats = RenderStats::default();
        let Some(pose) = pose else {
            return stats;
        };

        for (a, b) in SKELETON_EDGES {
            let from = pose.get(a).filter(|kp| kp.confidence > self.threshold);
            let to = pose.get(b).filter(|kp| kp.confidence > self.threshold);
            if let (Some(from), Some(to)) = (from, to) {
                surface.stroke_line(from.position(), to.position(), self.stroke);
                stats.edges += 1;
            }
        }

        for kp in pose.keypoints.iter().filter(|kp| kp.confidence > self.threshold) {
            surface.fill_circle(kp.position(), self.marker_radius, self.stroke.color);
            stats.markers += 1;
        }

        stats
    }
}

impl Default for SkeletonRenderer {
    fn default() -> Self {
        Self::new(&RenderConfig::default())
    }
}
