//! Core library for PoseLab.
//!
//! Overlays a skeleton on a playing, paused or seeking video and turns the
//! detected joints into biomechanical metrics. Each module owns one stage:
//! the playback scheduler (`timeline`), coordinate mapping (`mapping`),
//! skeleton drawing (`render`), the metrics engine (`analysis`) and the
//! feedback throttle (`feedback`). `pipeline` wires them into a single tick
//! handler driven by media events and estimation results.

pub mod analysis;
pub mod config;
pub mod error;
pub mod feedback;
pub mod mapping;
pub mod pipeline;
pub mod pose;
pub mod profile;
pub mod render;
pub mod source;
pub mod timeline;

pub use analysis::{
    angle_deg, asymmetry_pct, overall_score, MetricReading, MetricValue, MetricsEngine,
    SessionContext, SessionMetrics, TickAnalysis, Unit,
};
pub use config::{AppConfig, FeedbackConfig, PipelineConfig, RenderConfig};
pub use error::{PoseLabError, Result};
pub use feedback::{Cue, FeedbackEvent, FeedbackLog, FeedbackRequest, FeedbackThrottle, Severity};
pub use mapping::{CoordinateMapper, DisplayGeometry, FrameSize};
pub use pipeline::{Directive, MetricBoard, Pipeline, PipelineStatus, SourceKind, StillReport, TickOutcome};
pub use pose::{JointId, Keypoint, Point, Pose, Side};
pub use profile::{SportId, SportProfile};
pub use render::{CommandSurface, DrawCommand, DrawSurface, RenderStats, SkeletonRenderer, SKELETON_EDGES};
pub use source::{KeypointSource, RecordedTrack, TrackFrame};
pub use timeline::{
    EstimateRequest, FrameScheduler, MediaCommand, MediaEvent, MediaMetadata, PlaybackState,
    PlaybackStatus, SampleKind, SchedulerAction, Ticket,
};
