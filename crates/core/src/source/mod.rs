use std::{cmp::Ordering, path::Path};

use serde::{Deserialize, Serialize};

use crate::{EstimateRequest, MediaMetadata, PoseLabError, Pose, Result};

/// External pose estimator. Coordinates are in source pixel space; `None`
/// means nobody was detected.
pub trait KeypointSource {
    fn estimate(&mut self, request: &EstimateRequest) -> Result<Option<Pose>>;
}

/// One recorded estimator output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackFrame {
    pub time: f64,
    #[serde(default)]
    pub pose: Option<Pose>,
    /// Replays an estimator failure at this frame.
    #[serde(default)]
    pub fail: bool,
}

/// Pre-recorded keypoints for a clip, sampled at or before the requested
/// media time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedTrack {
    pub metadata: MediaMetadata,
    frames: Vec<TrackFrame>,
}

impl RecordedTrack {
    pub fn new(metadata: MediaMetadata, mut frames: Vec<TrackFrame>) -> Result<Self> {
        if metadata.width == 0 || metadata.height == 0 {
            return Err(PoseLabError::InvalidInput(
                "track resolution must be non-zero",
            ));
        }
        if frames.iter().any(|frame| !frame.time.is_finite()) {
            return Err(PoseLabError::InvalidInput(
                "track frame times must be finite",
            ));
        }
        frames.sort_by(|a, b| a.time.total_cmp(&b.time));
        Ok(Self { metadata, frames })
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let track: RecordedTrack = serde_json::from_str(raw)?;
        Self::new(track.metadata, track.frames)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn frames(&self) -> &[TrackFrame] {
        &self.frames
    }

    /// Latest frame whose time is not after `time`.
    pub fn sample_at(&self, time: f64) -> Option<&TrackFrame> {
        match self
            .frames
            .binary_search_by(|frame| frame.time.partial_cmp(&time).unwrap_or(Ordering::Equal))
        {
            Ok(index) => self.frames.get(index),
            Err(0) => None,
            Err(index) => self.frames.get(index - 1),
        }
    }
}

impl KeypointSource for RecordedTrack {
    fn estimate(&mut self, request: &EstimateRequest) -> Result<Option<Pose>> {
        match self.sample_at(request.media_time) {
            Some(frame) if frame.fail => Err(PoseLabError::estimation(format!(
                "recorded failure at {:.3}s",
                frame.time
            ))),
            Some(frame) => Ok(frame.pose.clone()),
            None => Ok(None),
        }
    }
}
