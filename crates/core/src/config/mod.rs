use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{pose::Side, PoseLabError, Result};

const DEFAULT_NOMINAL_FPS: f64 = 30.0;

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pipeline: PipelineConfig,
    pub render: RenderConfig,
    pub analysis: AnalysisConfig,
    pub feedback: FeedbackConfig,
}

impl AppConfig {
    /// Reads a JSON configuration file. Fields absent from the file keep
    /// their default values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.pipeline.validate()
    }
}

/// How sampling ticks are paced while the source is playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FramePacing {
    /// Use "new frame displayed" notifications when the source offers them,
    /// falling back to animation ticks otherwise.
    Auto,
    /// Always pace on animation ticks.
    AnimationTick,
}

/// Configuration of the frame scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Frame rate assumed for stepping when the source does not expose one.
    pub nominal_fps: f64,
    /// Stepping never lands closer than this to the end of the media.
    pub seek_epsilon_seconds: f64,
    pub pacing: FramePacing,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.nominal_fps.is_finite() && self.nominal_fps > 0.0) {
            return Err(PoseLabError::InvalidInput(
                "pipeline.nominal_fps must be a positive number",
            ));
        }
        if !(self.seek_epsilon_seconds.is_finite() && self.seek_epsilon_seconds >= 0.0) {
            return Err(PoseLabError::InvalidInput(
                "pipeline.seek_epsilon_seconds must not be negative",
            ));
        }
        Ok(())
    }

    /// Nominal frame rate, or the default when the configured one is unusable.
    pub fn frame_rate(&self) -> f64 {
        if self.nominal_fps.is_finite() && self.nominal_fps > 0.0 {
            self.nominal_fps
        } else {
            DEFAULT_NOMINAL_FPS
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            nominal_fps: DEFAULT_NOMINAL_FPS,
            seek_epsilon_seconds: 0.001,
            pacing: FramePacing::Auto,
        }
    }
}

/// Configuration of the skeleton overlay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub confidence_threshold: f32,
    pub line_width: f32,
    pub marker_radius: f32,
    /// Packed `0xRRGGBB` colour used for edges and markers.
    pub color: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.3,
            line_width: 2.0,
            marker_radius: 3.0,
            color: 0xFFFFFF,
        }
    }
}

/// Configuration of the metrics engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Keypoints below this confidence are treated as missing.
    pub confidence_threshold: f32,
    /// Arm measured for the throwing sports.
    pub trailing_side: Side,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.3,
            trailing_side: Side::Right,
        }
    }
}

/// Whether feedback shares one rate-limit gate or keeps one per severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThrottleScope {
    Shared,
    PerSeverity,
}

/// Configuration of the feedback throttle and display list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    pub min_interval_ms: u64,
    pub capacity: usize,
    pub scope: ThrottleScope,
}

impl FeedbackConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 1_100,
            capacity: 6,
            scope: ThrottleScope::Shared,
        }
    }
}
