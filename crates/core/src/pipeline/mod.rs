//! Tick handler wiring the scheduler, mapper, renderer and metrics engine.
//!
//! [`Pipeline`] is the single writer of the session state, the metric board
//! and the drawing surface. Drivers feed it media events and transport calls,
//! forward the returned [`Directive`]s, and report estimation results through
//! [`Pipeline::complete_estimate`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    analysis::{MetricReading, MetricValue, SessionContext, TickAnalysis, Unit},
    config::AppConfig,
    profile::{LABEL_LEFT_KNEE, LABEL_RIGHT_KNEE},
    CoordinateMapper, DisplayGeometry, DrawSurface, EstimateRequest, FeedbackEvent, FeedbackLog,
    FrameScheduler, FrameSize, MediaCommand, MediaEvent, MetricsEngine, PlaybackStatus, Pose,
    PoseLabError, RenderStats, Result, SampleKind, SchedulerAction, SkeletonRenderer, SportId,
    Ticket,
};

/// Where frames come from. Live capture is shown mirrored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Upload,
    LiveCapture,
}

/// Work the driver must carry out on the pipeline's behalf.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Directive {
    Estimate(EstimateRequest),
    Media(MediaCommand),
}

/// User-facing status line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Idle,
    Playback(PlaybackStatus),
    NoPersonDetected,
    PermissionDenied(String),
}

impl PipelineStatus {
    /// Blocking statuses stop the flow until the user acts.
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            PipelineStatus::PermissionDenied(_)
                | PipelineStatus::Playback(PlaybackStatus::MediaError { .. })
        )
    }
}

/// What happened when an estimate completed.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The request was cancelled before it resolved.
    Discarded,
    /// The estimator failed; the tick was skipped.
    Failed,
    /// The estimator found nobody; the overlay was cleared.
    NoSubject,
    Rendered {
        kind: SampleKind,
        stats: RenderStats,
        analysis: Option<TickAnalysis>,
        feedback: Vec<FeedbackEvent>,
    },
}

/// Ordered label → value display, initialised from the sport profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricBoard {
    entries: Vec<MetricReading>,
}

impl MetricBoard {
    pub fn for_sport(sport: SportId) -> Self {
        Self {
            entries: sport
                .profile()
                .labels
                .iter()
                .map(|label| MetricReading::unavailable(label))
                .collect(),
        }
    }

    pub fn update(&mut self, reading: MetricReading) {
        match self.entries.iter_mut().find(|entry| entry.label == reading.label) {
            Some(entry) => entry.value = reading.value,
            None => self.entries.push(reading),
        }
    }

    pub fn get(&self, label: &str) -> Option<MetricValue> {
        self.entries
            .iter()
            .find(|entry| entry.label == label)
            .map(|entry| entry.value)
    }

    pub fn entries(&self) -> &[MetricReading] {
        &self.entries
    }
}

/// Result of analysing a single still image.
#[derive(Debug, Clone, PartialEq)]
pub struct StillReport {
    pub stats: RenderStats,
    pub analysis: Option<TickAnalysis>,
}

impl StillReport {
    /// Short knee/asymmetry tags, empty when the knees were not found.
    pub fn kpi_tags(&self) -> Vec<String> {
        let Some(analysis) = &self.analysis else {
            return Vec::new();
        };
        [
            MetricReading::degrees(LABEL_LEFT_KNEE, Some(analysis.left_knee)),
            MetricReading::degrees(LABEL_RIGHT_KNEE, Some(analysis.right_knee)),
            MetricReading::new("Asym", Some(analysis.asymmetry_pct), Unit::Percent),
        ]
        .into_iter()
        .map(|reading| format!("{}: {}", reading.label, reading.value))
        .collect()
    }
}

pub struct Pipeline<S: DrawSurface> {
    config: AppConfig,
    scheduler: FrameScheduler,
    renderer: SkeletonRenderer,
    engine: MetricsEngine,
    surface: S,
    display: DisplayGeometry,
    source: SourceKind,
    session: SessionContext,
    board: MetricBoard,
    feedback: FeedbackLog,
    status: PipelineStatus,
    subject_missing: bool,
    estimation_failures: u64,
    last_render: RenderStats,
}

impl<S: DrawSurface> Pipeline<S> {
    pub fn new(config: AppConfig, sport: SportId, surface: S, display: DisplayGeometry) -> Self {
        let mut pipeline = Self {
            scheduler: FrameScheduler::new(config.pipeline.clone()),
            renderer: SkeletonRenderer::new(&config.render),
            engine: MetricsEngine::new(&config.analysis),
            session: SessionContext::new(sport, &config.feedback),
            board: MetricBoard::for_sport(sport),
            feedback: FeedbackLog::new(config.feedback.capacity),
            config,
            surface,
            display,
            source: SourceKind::Upload,
            status: PipelineStatus::Idle,
            subject_missing: false,
            estimation_failures: 0,
            last_render: RenderStats::default(),
        };
        pipeline.sync_surface_size();
        pipeline
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn board(&self) -> &MetricBoard {
        &self.board
    }

    pub fn feedback(&self) -> &FeedbackLog {
        &self.feedback
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn source(&self) -> SourceKind {
        self.source
    }

    pub fn last_render(&self) -> RenderStats {
        self.last_render
    }

    pub fn estimation_failures(&self) -> u64 {
        self.estimation_failures
    }

    pub fn status(&self) -> PipelineStatus {
        if self.subject_missing && !self.status.is_blocking() {
            PipelineStatus::NoPersonDetected
        } else {
            self.status.clone()
        }
    }

    /// Switches sport. A new sport starts a fresh session.
    pub fn set_sport(&mut self, sport: SportId) {
        if sport == self.session.sport() {
            return;
        }
        tracing::info!(sport = %sport, "starting new analysis session");
        self.session = SessionContext::new(sport, &self.config.feedback);
        self.board = MetricBoard::for_sport(sport);
        self.feedback.clear();
    }

    /// Updates the on-screen geometry. The surface is only resized when its
    /// backing-store size actually changes.
    pub fn set_display(&mut self, display: DisplayGeometry) {
        self.display = display;
        self.sync_surface_size();
    }

    fn sync_surface_size(&mut self) {
        let backing = self.display.backing_size();
        if backing != self.surface.size() {
            tracing::debug!(width = backing.width, height = backing.height, "resizing overlay");
            self.surface.resize(backing);
        }
    }

    /// Starts loading a new uploaded media source.
    pub fn assign_upload(&mut self) -> Vec<Directive> {
        self.source = SourceKind::Upload;
        self.handle_media(MediaEvent::SourceAssigned)
    }

    /// Starts the live capture flow. Keypoints are requested mirrored.
    pub fn begin_capture(&mut self) -> Vec<Directive> {
        self.source = SourceKind::LiveCapture;
        self.handle_media(MediaEvent::SourceAssigned)
    }

    /// Capture access was refused: the capture flow ends, the rest of the
    /// pipeline stays usable for an upload.
    pub fn capture_denied(&mut self, reason: impl Into<String>) -> PoseLabError {
        let reason = reason.into();
        tracing::warn!(%reason, "camera permission denied");
        self.scheduler = FrameScheduler::new(self.config.pipeline.clone());
        self.renderer.draw(&mut self.surface, None);
        self.status = PipelineStatus::PermissionDenied(reason.clone());
        PoseLabError::PermissionDenied(reason)
    }

    pub fn handle_media(&mut self, event: MediaEvent) -> Vec<Directive> {
        let actions = self.scheduler.handle(event);
        self.absorb(actions)
    }

    pub fn play(&mut self) -> Vec<Directive> {
        let actions = self.scheduler.play();
        self.absorb(actions)
    }

    pub fn pause(&mut self) -> Vec<Directive> {
        let actions = self.scheduler.pause();
        self.absorb(actions)
    }

    pub fn seek(&mut self, time: f64) -> Vec<Directive> {
        let actions = self.scheduler.seek(time);
        self.absorb(actions)
    }

    pub fn step(&mut self, frames: i32) -> Vec<Directive> {
        let actions = self.scheduler.step(frames);
        self.absorb(actions)
    }

    fn absorb(&mut self, actions: Vec<SchedulerAction>) -> Vec<Directive> {
        let mut directives = Vec::with_capacity(actions.len());
        for action in actions {
            match action {
                SchedulerAction::Estimate(request) => directives.push(Directive::Estimate(request)),
                SchedulerAction::Media(command) => directives.push(Directive::Media(command)),
                SchedulerAction::Status(status) => {
                    if matches!(status, PlaybackStatus::Loading) {
                        self.subject_missing = false;
                    }
                    self.status = PipelineStatus::Playback(status);
                }
            }
        }
        directives
    }

    /// Applies the result of the estimate identified by `ticket`. All
    /// per-tick failures end here as an outcome; none are returned as errors.
    pub fn complete_estimate(
        &mut self,
        ticket: Ticket,
        result: Result<Option<Pose>>,
        now: Duration,
    ) -> TickOutcome {
        let Some(kind) = self.scheduler.complete(ticket) else {
            return TickOutcome::Discarded;
        };

        let pose = match result {
            Ok(pose) => pose,
            Err(err) => {
                self.estimation_failures += 1;
                tracing::debug!(error = %err, "estimate failed, skipping tick");
                return TickOutcome::Failed;
            }
        };

        let Some(pose) = pose else {
            self.subject_missing = true;
            self.last_render = self.renderer.draw(&mut self.surface, None);
            return TickOutcome::NoSubject;
        };

        let mapper = match self.mapper() {
            Ok(mapper) => mapper,
            Err(err) => {
                self.estimation_failures += 1;
                tracing::debug!(error = %err, "cannot map pose without source metadata");
                return TickOutcome::Failed;
            }
        };

        self.subject_missing = false;
        let mapped = mapper.map_pose(&pose);
        let (stats, analysis, feedback) = self.render_and_analyze(&mapped, now);
        TickOutcome::Rendered {
            kind,
            stats,
            analysis,
            feedback,
        }
    }

    /// Runs one mapping/render/analysis pass over a still image shown at its
    /// natural resolution. The playback state machine is not involved.
    pub fn analyze_still(
        &mut self,
        pose: &Pose,
        resolution: FrameSize,
        now: Duration,
    ) -> Result<StillReport> {
        self.set_display(DisplayGeometry::native(resolution));
        let mapped = CoordinateMapper::new(resolution, self.surface.size())?.map_pose(pose);
        let (stats, analysis, _) = self.render_and_analyze(&mapped, now);
        Ok(StillReport { stats, analysis })
    }

    fn mapper(&self) -> Result<CoordinateMapper> {
        let source = self
            .scheduler
            .metadata()
            .map(|meta| meta.resolution())
            .ok_or(PoseLabError::InvalidInput("media metadata not loaded"))?;
        Ok(CoordinateMapper::new(source, self.surface.size())?
            .mirrored(self.source == SourceKind::LiveCapture))
    }

    fn render_and_analyze(
        &mut self,
        mapped: &Pose,
        now: Duration,
    ) -> (RenderStats, Option<TickAnalysis>, Vec<FeedbackEvent>) {
        let stats = self.renderer.draw(&mut self.surface, Some(mapped));
        self.last_render = stats;

        let Some(analysis) = self.engine.analyze(&mut self.session, mapped) else {
            return (stats, None, Vec::new());
        };

        for reading in &analysis.readings {
            self.board.update(reading.clone());
        }

        let mut accepted = Vec::new();
        for request in &analysis.feedback {
            if let Some(event) = self.session.offer_feedback(request.clone(), now) {
                tracing::info!(severity = ?event.severity, text = %event.message, "feedback");
                self.feedback.push(event.clone());
                accepted.push(event);
            }
        }

        (stats, Some(analysis), accepted)
    }
}

impl<S: DrawSurface + std::fmt::Debug> std::fmt::Debug for Pipeline<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("state", &self.scheduler.state())
            .field("sport", &self.session.sport())
            .field("source", &self.source)
            .field("status", &self.status)
            .field("surface", &self.surface)
            .finish()
    }
}
