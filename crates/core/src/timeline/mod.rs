//! Playback state machine that paces pose sampling against a media source.
//!
//! The scheduler never performs estimation itself. It hands out
//! [`EstimateRequest`]s and is told about their completion through
//! [`FrameScheduler::complete`], which decides whether the result may still
//! be applied. Every transition away from `Playing` bumps a generation
//! counter; completions from an older generation are discarded.

use serde::{Deserialize, Serialize};

use crate::{
    config::{FramePacing, PipelineConfig},
    FrameSize,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    Seeking,
    Ended,
    Errored,
}

/// What the media source reports once its metadata is known.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub width: u32,
    pub height: u32,
    pub duration_seconds: f64,
    /// Native frame rate, when the source exposes one.
    #[serde(default)]
    pub frame_rate: Option<f64>,
    /// Whether the source notifies each newly displayed frame.
    #[serde(default)]
    pub frame_callbacks: bool,
}

impl MediaMetadata {
    pub fn resolution(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }
}

/// Notifications coming from the media source. Times are media seconds.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    SourceAssigned,
    LoadedMetadata(MediaMetadata),
    Play,
    Pause,
    Seeking { time: f64 },
    Seeked { time: f64 },
    Ended,
    Stalled,
    Waiting,
    Error { code: u16, message: String },
    TimeUpdate { time: f64 },
    /// A new frame reached the screen.
    FrameDisplayed { time: f64 },
    /// Generic per-display-refresh callback.
    AnimationTick,
}

/// Commands the driver must forward to the media source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaCommand {
    Play,
    Pause,
    Seek { time: f64 },
}

/// Identifies one estimation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticket {
    generation: u64,
    sequence: u64,
}

impl Ticket {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleKind {
    /// Regular sample taken by the playback loop.
    Playback,
    /// Single render of a frozen or freshly landed frame.
    Still,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimateRequest {
    pub ticket: Ticket,
    pub media_time: f64,
    pub kind: SampleKind,
}

/// Coarse playback status surfaced to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStatus {
    Loading,
    Ready,
    Playing,
    Paused,
    Seeking,
    Buffering,
    Ended,
    MediaError { code: u16, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerAction {
    Estimate(EstimateRequest),
    Media(MediaCommand),
    Status(PlaybackStatus),
}

#[derive(Debug, Clone)]
pub struct FrameScheduler {
    config: PipelineConfig,
    state: PlaybackState,
    metadata: Option<MediaMetadata>,
    current_time: f64,
    generation: u64,
    sequence: u64,
    in_flight: Option<EstimateRequest>,
    skipped_ticks: u64,
    /// The source keeps playing through a seek started while playing.
    resume_after_seek: bool,
    buffering: bool,
}

impl FrameScheduler {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            state: PlaybackState::Idle,
            metadata: None,
            current_time: 0.0,
            generation: 0,
            sequence: 0,
            in_flight: None,
            skipped_ticks: 0,
            resume_after_seek: false,
            buffering: false,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn metadata(&self) -> Option<&MediaMetadata> {
        self.metadata.as_ref()
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// The request whose result would currently be applied, if any.
    pub fn in_flight(&self) -> Option<&EstimateRequest> {
        self.in_flight.as_ref()
    }

    /// Sampling ticks dropped because a request was still outstanding.
    pub fn skipped_ticks(&self) -> u64 {
        self.skipped_ticks
    }

    /// Seconds per frame, from the source when known, else the nominal rate.
    pub fn frame_duration(&self) -> f64 {
        let rate = self
            .metadata
            .and_then(|meta| meta.frame_rate)
            .filter(|rate| rate.is_finite() && *rate > 0.0)
            .unwrap_or_else(|| self.config.frame_rate());
        1.0 / rate
    }

    fn paced_by_frames(&self) -> bool {
        self.config.pacing == FramePacing::Auto
            && self.metadata.map(|meta| meta.frame_callbacks).unwrap_or(false)
    }

    fn duration(&self) -> f64 {
        self.metadata
            .map(|meta| meta.duration_seconds)
            .filter(|d| d.is_finite())
            .unwrap_or(0.0)
            .max(0.0)
    }

    /// Applies a media source event.
    pub fn handle(&mut self, event: MediaEvent) -> Vec<SchedulerAction> {
        let mut actions = Vec::new();
        self.transition(event, &mut actions);
        actions
    }

    /// Transport "play".
    pub fn play(&mut self) -> Vec<SchedulerAction> {
        let mut actions = Vec::new();
        if self.can_play() {
            actions.push(SchedulerAction::Media(MediaCommand::Play));
            self.transition(MediaEvent::Play, &mut actions);
        }
        actions
    }

    /// Transport "pause". During a seek started while playing, this keeps
    /// the source paused once the seek lands.
    pub fn pause(&mut self) -> Vec<SchedulerAction> {
        let mut actions = Vec::new();
        let seeking_to_resume =
            self.state == PlaybackState::Seeking && self.resume_after_seek;
        if self.state == PlaybackState::Playing || seeking_to_resume {
            actions.push(SchedulerAction::Media(MediaCommand::Pause));
            self.transition(MediaEvent::Pause, &mut actions);
        }
        actions
    }

    /// Transport "seek"; the target is clamped to the media duration.
    pub fn seek(&mut self, time: f64) -> Vec<SchedulerAction> {
        let mut actions = Vec::new();
        if self.can_seek() {
            let time = time.clamp(0.0, self.duration());
            actions.push(SchedulerAction::Media(MediaCommand::Seek { time }));
            self.transition(MediaEvent::Seeking { time }, &mut actions);
        }
        actions
    }

    /// Moves by `frames` frames (negative steps back). Playback is paused
    /// without a render, then a seek is issued; the landed frame renders
    /// once the source reports the seek finished.
    pub fn step(&mut self, frames: i32) -> Vec<SchedulerAction> {
        let mut actions = Vec::new();
        if !self.can_seek() {
            return actions;
        }

        if self.state == PlaybackState::Playing
            || (self.state == PlaybackState::Seeking && self.resume_after_seek)
        {
            actions.push(SchedulerAction::Media(MediaCommand::Pause));
            self.teardown();
            self.state = PlaybackState::Paused;
            self.resume_after_seek = false;
        }

        let end = (self.duration() - self.config.seek_epsilon_seconds).max(0.0);
        let target = (self.current_time + f64::from(frames) * self.frame_duration()).clamp(0.0, end);
        actions.push(SchedulerAction::Media(MediaCommand::Seek { time: target }));
        self.transition(MediaEvent::Seeking { time: target }, &mut actions);
        actions
    }

    /// Reports that `ticket` resolved. Returns the kind of sample when its
    /// result should be applied, `None` when it is stale.
    pub fn complete(&mut self, ticket: Ticket) -> Option<SampleKind> {
        match self.in_flight {
            Some(request) if request.ticket == ticket => {
                self.in_flight = None;
                Some(request.kind)
            }
            _ => {
                tracing::trace!(sequence = ticket.sequence, "discarding stale estimate");
                None
            }
        }
    }

    fn can_play(&self) -> bool {
        matches!(
            self.state,
            PlaybackState::Ready | PlaybackState::Paused | PlaybackState::Ended
        )
    }

    fn can_seek(&self) -> bool {
        matches!(
            self.state,
            PlaybackState::Ready
                | PlaybackState::Playing
                | PlaybackState::Paused
                | PlaybackState::Seeking
                | PlaybackState::Ended
        )
    }

    fn transition(&mut self, event: MediaEvent, actions: &mut Vec<SchedulerAction>) {
        use PlaybackState as S;

        let before = self.state;
        match event {
            MediaEvent::SourceAssigned => {
                self.teardown();
                self.metadata = None;
                self.current_time = 0.0;
                self.resume_after_seek = false;
                self.enter(S::Loading, PlaybackStatus::Loading, actions);
            }
            MediaEvent::LoadedMetadata(meta) => {
                self.metadata = Some(meta);
                if matches!(self.state, S::Idle | S::Loading) {
                    self.enter(S::Ready, PlaybackStatus::Ready, actions);
                    self.request_still(actions);
                }
            }
            MediaEvent::Play => {
                if self.state == S::Seeking {
                    self.resume_after_seek = true;
                } else if self.can_play() {
                    if self.state == S::Ended {
                        self.current_time = 0.0;
                    }
                    self.teardown();
                    self.enter(S::Playing, PlaybackStatus::Playing, actions);
                }
            }
            MediaEvent::Pause => {
                if self.state == S::Seeking {
                    self.resume_after_seek = false;
                } else if self.state == S::Playing {
                    self.teardown();
                    self.enter(S::Paused, PlaybackStatus::Paused, actions);
                    self.request_still(actions);
                }
            }
            MediaEvent::Seeking { time } => {
                if self.can_seek() {
                    match self.state {
                        S::Seeking => {}
                        S::Playing => self.resume_after_seek = true,
                        _ => self.resume_after_seek = false,
                    }
                    self.teardown();
                    self.current_time = time;
                    self.enter(S::Seeking, PlaybackStatus::Seeking, actions);
                }
            }
            MediaEvent::Seeked { time } => {
                if self.state == S::Seeking {
                    self.current_time = time;
                    if std::mem::take(&mut self.resume_after_seek) {
                        self.enter(S::Playing, PlaybackStatus::Playing, actions);
                    } else {
                        self.enter(S::Ready, PlaybackStatus::Ready, actions);
                    }
                    // The landed frame renders once; loop ticks are skipped
                    // until it resolves.
                    self.request_still(actions);
                }
            }
            MediaEvent::Ended => {
                if self.state == S::Playing {
                    self.teardown();
                    self.current_time = self.duration();
                    self.enter(S::Ended, PlaybackStatus::Ended, actions);
                }
            }
            MediaEvent::Error { code, message } => {
                tracing::warn!(code, detail = %message, "media source error");
                self.teardown();
                self.enter(S::Errored, PlaybackStatus::MediaError { code, message }, actions);
            }
            MediaEvent::Stalled | MediaEvent::Waiting => {
                if self.state == S::Playing && !self.buffering {
                    self.buffering = true;
                    actions.push(SchedulerAction::Status(PlaybackStatus::Buffering));
                }
            }
            MediaEvent::TimeUpdate { time } => {
                if !matches!(self.state, S::Idle | S::Errored) {
                    self.current_time = time;
                }
                self.resume_from_buffering(actions);
            }
            MediaEvent::FrameDisplayed { time } => {
                if !matches!(self.state, S::Idle | S::Errored) {
                    self.current_time = time;
                }
                self.resume_from_buffering(actions);
                if self.state == S::Playing && self.paced_by_frames() {
                    self.sample_tick(actions);
                }
            }
            MediaEvent::AnimationTick => {
                if self.state == S::Playing && !self.paced_by_frames() {
                    self.sample_tick(actions);
                }
            }
        }

        if before != self.state {
            tracing::debug!(from = ?before, to = ?self.state, "playback transition");
        }
    }

    fn enter(
        &mut self,
        state: PlaybackState,
        status: PlaybackStatus,
        actions: &mut Vec<SchedulerAction>,
    ) {
        self.state = state;
        self.buffering = false;
        actions.push(SchedulerAction::Status(status));
    }

    /// Progress while playing means the source is no longer buffering.
    fn resume_from_buffering(&mut self, actions: &mut Vec<SchedulerAction>) {
        if self.buffering && self.state == PlaybackState::Playing {
            self.buffering = false;
            actions.push(SchedulerAction::Status(PlaybackStatus::Playing));
        }
    }

    /// Cancels the playback loop: outstanding requests become stale.
    fn teardown(&mut self) {
        self.generation += 1;
        self.in_flight = None;
    }

    fn sample_tick(&mut self, actions: &mut Vec<SchedulerAction>) {
        if self.in_flight.is_some() {
            self.skipped_ticks += 1;
            tracing::trace!(time = self.current_time, "estimate outstanding, skipping tick");
            return;
        }
        self.issue(SampleKind::Playback, actions);
    }

    fn request_still(&mut self, actions: &mut Vec<SchedulerAction>) {
        self.issue(SampleKind::Still, actions);
    }

    fn issue(&mut self, kind: SampleKind, actions: &mut Vec<SchedulerAction>) {
        self.sequence += 1;
        let request = EstimateRequest {
            ticket: Ticket {
                generation: self.generation,
                sequence: self.sequence,
            },
            media_time: self.current_time,
            kind,
        };
        self.in_flight = Some(request);
        actions.push(SchedulerAction::Estimate(request));
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(frame_callbacks: bool) -> MediaMetadata {
        MediaMetadata {
            width: 640,
            height: 480,
            duration_seconds: 10.0,
            frame_rate: None,
            frame_callbacks,
        }
    }

    fn estimates(actions: &[SchedulerAction]) -> Vec<EstimateRequest> {
        actions
            .iter()
            .filter_map(|action| match action {
                SchedulerAction::Estimate(request) => Some(*request),
                _ => None,
            })
            .collect()
    }

    fn ready(frame_callbacks: bool) -> FrameScheduler {
        let mut scheduler = FrameScheduler::default();
        scheduler.handle(MediaEvent::SourceAssigned);
        let actions = scheduler.handle(MediaEvent::LoadedMetadata(metadata(frame_callbacks)));
        let still = estimates(&actions);
        assert_eq!(still.len(), 1);
        assert_eq!(still[0].kind, SampleKind::Still);
        assert_eq!(scheduler.complete(still[0].ticket), Some(SampleKind::Still));
        scheduler
    }

    #[test]
    fn loading_then_metadata_renders_once() {
        let mut scheduler = FrameScheduler::default();
        assert_eq!(scheduler.state(), PlaybackState::Idle);
        assert!(scheduler.play().is_empty());

        scheduler.handle(MediaEvent::SourceAssigned);
        assert_eq!(scheduler.state(), PlaybackState::Loading);

        let actions = scheduler.handle(MediaEvent::LoadedMetadata(metadata(false)));
        assert_eq!(scheduler.state(), PlaybackState::Ready);
        assert_eq!(estimates(&actions).len(), 1);
        assert!(actions.contains(&SchedulerAction::Status(PlaybackStatus::Ready)));
    }

    #[test]
    fn outstanding_request_skips_ticks_instead_of_queueing() {
        let mut scheduler = ready(false);
        let actions = scheduler.play();
        assert_eq!(actions[0], SchedulerAction::Media(MediaCommand::Play));
        assert_eq!(scheduler.state(), PlaybackState::Playing);

        let first = estimates(&scheduler.handle(MediaEvent::AnimationTick));
        assert_eq!(first.len(), 1);
        assert!(estimates(&scheduler.handle(MediaEvent::AnimationTick)).is_empty());
        assert!(estimates(&scheduler.handle(MediaEvent::AnimationTick)).is_empty());
        assert_eq!(scheduler.skipped_ticks(), 2);

        assert_eq!(scheduler.complete(first[0].ticket), Some(SampleKind::Playback));
        let second = estimates(&scheduler.handle(MediaEvent::AnimationTick));
        assert_eq!(second.len(), 1);
        assert!(second[0].ticket.sequence() > first[0].ticket.sequence());
    }

    #[test]
    fn pause_with_outstanding_request_renders_frozen_frame_once() {
        let mut scheduler = ready(false);
        scheduler.play();
        scheduler.handle(MediaEvent::TimeUpdate { time: 2.5 });
        let loop_request = estimates(&scheduler.handle(MediaEvent::AnimationTick))[0];

        let actions = scheduler.pause();
        let stills = estimates(&actions);
        assert_eq!(scheduler.state(), PlaybackState::Paused);
        assert_eq!(stills.len(), 1);
        assert_eq!(stills[0].kind, SampleKind::Still);
        assert_eq!(stills[0].media_time, 2.5);

        // The source echoes the pause; nothing more is rendered.
        assert!(estimates(&scheduler.handle(MediaEvent::Pause)).is_empty());
        assert!(estimates(&scheduler.handle(MediaEvent::AnimationTick)).is_empty());

        assert_eq!(scheduler.complete(loop_request.ticket), None);
        assert_eq!(scheduler.complete(stills[0].ticket), Some(SampleKind::Still));
    }

    #[test]
    fn seek_cancels_without_render_and_renders_on_landing() {
        let mut scheduler = ready(false);
        scheduler.play();
        let loop_request = estimates(&scheduler.handle(MediaEvent::AnimationTick))[0];

        let actions = scheduler.seek(4.0);
        assert!(estimates(&actions).is_empty());
        assert!(actions.contains(&SchedulerAction::Media(MediaCommand::Seek { time: 4.0 })));
        assert_eq!(scheduler.state(), PlaybackState::Seeking);
        assert_eq!(scheduler.complete(loop_request.ticket), None);

        let landed = estimates(&scheduler.handle(MediaEvent::Seeked { time: 4.0 }));
        assert_eq!(landed.len(), 1);
        assert_eq!(landed[0].kind, SampleKind::Still);
        assert_eq!(landed[0].media_time, 4.0);
        assert!(estimates(&scheduler.handle(MediaEvent::Seeked { time: 4.0 })).is_empty());
    }

    #[test]
    fn seek_from_ready_lands_in_ready() {
        let mut scheduler = ready(false);
        scheduler.seek(3.0);
        let landed = estimates(&scheduler.handle(MediaEvent::Seeked { time: 3.0 }));

        assert_eq!(scheduler.state(), PlaybackState::Ready);
        assert_eq!(landed.len(), 1);
        assert!(estimates(&scheduler.handle(MediaEvent::AnimationTick)).is_empty());
    }

    #[test]
    fn seek_while_playing_resumes_sampling_after_landing() {
        let mut scheduler = ready(false);
        scheduler.play();
        let actions = scheduler.seek(4.0);
        assert!(!actions.contains(&SchedulerAction::Media(MediaCommand::Pause)));

        let actions = scheduler.handle(MediaEvent::Seeked { time: 4.0 });
        assert_eq!(scheduler.state(), PlaybackState::Playing);
        assert!(actions.contains(&SchedulerAction::Status(PlaybackStatus::Playing)));
        let landed = estimates(&actions)[0];
        assert_eq!(landed.kind, SampleKind::Still);

        // The landed frame is pending, so the next tick waits for it.
        assert!(estimates(&scheduler.handle(MediaEvent::AnimationTick)).is_empty());
        assert_eq!(scheduler.complete(landed.ticket), Some(SampleKind::Still));
        let next = estimates(&scheduler.handle(MediaEvent::AnimationTick));
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].kind, SampleKind::Playback);

        scheduler.handle(MediaEvent::Ended);
        assert_eq!(scheduler.state(), PlaybackState::Ended);
    }

    #[test]
    fn pause_during_playing_seek_lands_paused_frame() {
        let mut scheduler = ready(false);
        scheduler.play();
        scheduler.seek(4.0);

        let actions = scheduler.pause();
        assert!(actions.contains(&SchedulerAction::Media(MediaCommand::Pause)));
        // Paused while seeking: the still arrives with the landing instead.
        assert!(estimates(&actions).is_empty());
        assert_eq!(scheduler.state(), PlaybackState::Seeking);

        scheduler.handle(MediaEvent::Pause);
        let landed = estimates(&scheduler.handle(MediaEvent::Seeked { time: 4.0 }));
        assert_eq!(scheduler.state(), PlaybackState::Ready);
        assert_eq!(landed.len(), 1);
    }

    #[test]
    fn source_play_during_seek_resumes_after_landing() {
        let mut scheduler = ready(false);
        scheduler.seek(2.0);
        scheduler.handle(MediaEvent::Play);
        assert_eq!(scheduler.state(), PlaybackState::Seeking);

        scheduler.handle(MediaEvent::Seeked { time: 2.0 });
        assert_eq!(scheduler.state(), PlaybackState::Playing);
    }

    #[test]
    fn step_pauses_and_clamps_to_media_bounds() {
        let mut scheduler = ready(false);
        scheduler.play();
        scheduler.handle(MediaEvent::TimeUpdate { time: 9.99 });

        let actions = scheduler.step(1);
        assert_eq!(actions[0], SchedulerAction::Media(MediaCommand::Pause));
        assert!(estimates(&actions).is_empty());
        assert_eq!(scheduler.state(), PlaybackState::Seeking);
        assert!((scheduler.current_time() - 9.999).abs() < 1e-9);

        scheduler.handle(MediaEvent::Pause);
        assert_eq!(scheduler.state(), PlaybackState::Seeking);
        let landed = estimates(&scheduler.handle(MediaEvent::Seeked { time: 9.999 }));
        assert_eq!(landed.len(), 1);

        scheduler.handle(MediaEvent::TimeUpdate { time: 0.01 });
        scheduler.step(-1);
        assert_eq!(scheduler.current_time(), 0.0);
    }

    #[test]
    fn step_uses_source_frame_rate_when_known() {
        let mut scheduler = FrameScheduler::default();
        scheduler.handle(MediaEvent::SourceAssigned);
        scheduler.handle(MediaEvent::LoadedMetadata(MediaMetadata {
            frame_rate: Some(25.0),
            ..metadata(false)
        }));

        assert!((scheduler.frame_duration() - 0.04).abs() < 1e-12);
        scheduler.step(2);
        assert!((scheduler.current_time() - 0.08).abs() < 1e-12);
    }

    #[test]
    fn zero_nominal_rate_still_steps_one_frame() {
        let mut scheduler = FrameScheduler::new(PipelineConfig {
            nominal_fps: 0.0,
            ..PipelineConfig::default()
        });
        scheduler.handle(MediaEvent::SourceAssigned);
        scheduler.handle(MediaEvent::LoadedMetadata(metadata(false)));

        scheduler.step(1);
        assert!((scheduler.current_time() - 1.0 / 30.0).abs() < 1e-12);
    }

    #[test]
    fn ended_stops_loop_and_play_restarts() {
        let mut scheduler = ready(false);
        scheduler.play();
        let loop_request = estimates(&scheduler.handle(MediaEvent::AnimationTick))[0];
        scheduler.handle(MediaEvent::Ended);

        assert_eq!(scheduler.state(), PlaybackState::Ended);
        assert_eq!(scheduler.complete(loop_request.ticket), None);
        assert!(estimates(&scheduler.handle(MediaEvent::AnimationTick)).is_empty());

        scheduler.play();
        assert_eq!(scheduler.state(), PlaybackState::Playing);
        assert_eq!(scheduler.current_time(), 0.0);
    }

    #[test]
    fn error_stops_sampling_until_new_source() {
        let mut scheduler = ready(false);
        scheduler.play();
        let actions = scheduler.handle(MediaEvent::Error {
            code: 3,
            message: "decode".into(),
        });

        assert_eq!(scheduler.state(), PlaybackState::Errored);
        assert!(actions.iter().any(|action| matches!(
            action,
            SchedulerAction::Status(PlaybackStatus::MediaError { code: 3, .. })
        )));
        assert!(scheduler.play().is_empty());
        assert!(scheduler.seek(1.0).is_empty());

        scheduler.handle(MediaEvent::SourceAssigned);
        assert_eq!(scheduler.state(), PlaybackState::Loading);
    }

    #[test]
    fn frame_callbacks_pace_sampling_when_available() {
        let mut scheduler = ready(true);
        scheduler.play();

        assert!(estimates(&scheduler.handle(MediaEvent::AnimationTick)).is_empty());
        let request = estimates(&scheduler.handle(MediaEvent::FrameDisplayed { time: 0.5 }));
        assert_eq!(request.len(), 1);
        assert_eq!(request[0].media_time, 0.5);
    }

    #[test]
    fn animation_pacing_can_be_forced() {
        let mut scheduler = FrameScheduler::new(PipelineConfig {
            pacing: FramePacing::AnimationTick,
            ..PipelineConfig::default()
        });
        scheduler.handle(MediaEvent::SourceAssigned);
        let still = estimates(&scheduler.handle(MediaEvent::LoadedMetadata(metadata(true))))[0];
        scheduler.complete(still.ticket);
        scheduler.play();

        assert!(estimates(&scheduler.handle(MediaEvent::FrameDisplayed { time: 0.1 })).is_empty());
        assert_eq!(estimates(&scheduler.handle(MediaEvent::AnimationTick)).len(), 1);
    }

    #[test]
    fn buffering_keeps_state() {
        let mut scheduler = ready(false);
        scheduler.play();
        let actions = scheduler.handle(MediaEvent::Stalled);

        assert_eq!(actions, vec![SchedulerAction::Status(PlaybackStatus::Buffering)]);
        assert_eq!(scheduler.state(), PlaybackState::Playing);
        assert!(scheduler.handle(MediaEvent::Waiting).is_empty());
    }

    #[test]
    fn progress_after_buffering_restores_playing_status() {
        let mut scheduler = ready(false);
        scheduler.play();
        scheduler.handle(MediaEvent::Waiting);

        let actions = scheduler.handle(MediaEvent::TimeUpdate { time: 1.0 });
        assert_eq!(actions, vec![SchedulerAction::Status(PlaybackStatus::Playing)]);
        assert!(scheduler.handle(MediaEvent::TimeUpdate { time: 1.1 }).is_empty());
    }
}
