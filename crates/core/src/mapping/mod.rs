use serde::{Deserialize, Serialize};

use crate::{Keypoint, PoseLabError, Pose, Result};

/// Pixel dimensions of a frame or drawing surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// On-screen size of the overlay plus the device pixel ratio it is shown at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayGeometry {
    pub css_width: f32,
    pub css_height: f32,
    pub device_pixel_ratio: f32,
}

impl DisplayGeometry {
    pub fn new(css_width: f32, css_height: f32, device_pixel_ratio: f32) -> Self {
        Self {
            css_width,
            css_height,
            device_pixel_ratio,
        }
    }

    /// Geometry whose backing store exactly matches `size` at a ratio of 1.
    pub fn native(size: FrameSize) -> Self {
        Self::new(size.width as f32, size.height as f32, 1.0)
    }

    /// Actual pixel dimensions of the surface after DPR scaling.
    pub fn backing_size(&self) -> FrameSize {
        let dpr = if self.device_pixel_ratio.is_finite() && self.device_pixel_ratio > 0.0 {
            self.device_pixel_ratio
        } else {
            1.0
        };
        let scale = |css: f32| (css.max(0.0) * dpr).round() as u32;
        FrameSize::new(scale(self.css_width), scale(self.css_height))
    }
}

/// Rescales poses from the source's intrinsic resolution to a surface's
/// backing store. Mapping is pure: equal inputs always give equal outputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    source: FrameSize,
    target: FrameSize,
    mirror: bool,
}

impl CoordinateMapper {
    pub fn new(source: FrameSize, target: FrameSize) -> Result<Self> {
        if source.is_empty() {
            return Err(PoseLabError::InvalidInput(
                "source resolution must be non-zero",
            ));
        }

        Ok(Self {
            source,
            target,
            mirror: false,
        })
    }

    /// Flips x around the target's vertical centre line, for front-facing
    /// capture shown as a mirror image.
    pub fn mirrored(mut self, mirror: bool) -> Self {
        self.mirror = mirror;
        self
    }

    pub fn source(&self) -> FrameSize {
        self.source
    }

    pub fn target(&self) -> FrameSize {
        self.target
    }

    pub fn scale(&self) -> (f32, f32) {
        (
            self.target.width as f32 / self.source.width as f32,
            self.target.height as f32 / self.source.height as f32,
        )
    }

    /// Mapper going back from target to source space.
    pub fn inverse(&self) -> Result<Self> {
        Ok(Self::new(self.target, self.source)?.mirrored(self.mirror))
    }

    pub fn map_keypoint(&self, keypoint: &Keypoint) -> Keypoint {
        let (sx, sy) = self.scale();
        let x = if self.mirror {
            self.target.width as f32 - keypoint.x * sx
        } else {
            keypoint.x * sx
        };
        Keypoint {
            name: keypoint.name,
            x,
            y: keypoint.y * sy,
            confidence: keypoint.confidence,
        }
    }

    pub fn map_pose(&self, pose: &Pose) -> Pose {
        Pose::new(
            pose.keypoints
                .iter()
                .map(|kp| self.map_keypoint(kp))
                .collect(),
        )
    }
}
