//! Headless driver that plays a recorded keypoint track through the
//! pipeline with a simulated media element and display clock.

use std::{collections::VecDeque, time::Duration};

use poselab_core::{
    Directive, EstimateRequest, KeypointSource, MediaCommand, MediaEvent, Pipeline,
    PipelineStatus, PlaybackState, PoseLabError, RecordedTrack, Result, SessionMetrics, Severity,
    SportId, TickOutcome,
};
use serde::Serialize;

const DISPLAY_HZ: f64 = 60.0;

/// Scripted transport calls applied while replaying.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayScript {
    pub pause_at: Option<f64>,
    /// Seek while still playing once the media reaches this time.
    pub seek_at: Option<f64>,
    /// Seek target. Without `seek_at` the seek happens once playback stops.
    pub seek_to: Option<f64>,
    /// Display ticks an estimate takes to resolve.
    pub latency_ticks: u32,
}

#[derive(Debug, Serialize)]
pub struct ReplaySummary {
    pub sport: SportId,
    pub final_state: PlaybackState,
    pub status: PipelineStatus,
    pub session: SessionMetrics,
    pub metrics: Vec<(String, String)>,
    pub feedback: Vec<(Severity, String)>,
    pub requests: u64,
    pub rendered: u64,
    pub discarded: u64,
    pub failed: u64,
    pub skipped_ticks: u64,
}

/// Media element stand-in: tracks a play head and echoes commands back as
/// events on the next tick.
#[derive(Debug, Default)]
struct SimulatedMedia {
    time: f64,
    playing: bool,
    events: VecDeque<MediaEvent>,
}

impl SimulatedMedia {
    fn apply(&mut self, command: MediaCommand) {
        match command {
            MediaCommand::Play => {
                self.playing = true;
                self.events.push_back(MediaEvent::Play);
            }
            MediaCommand::Pause => {
                self.playing = false;
                self.events.push_back(MediaEvent::Pause);
            }
            MediaCommand::Seek { time } => {
                self.time = time;
                self.events.push_back(MediaEvent::Seeking { time });
                self.events.push_back(MediaEvent::Seeked { time });
            }
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    requests: u64,
    rendered: u64,
    discarded: u64,
    failed: u64,
}

pub fn run<S: poselab_core::DrawSurface>(
    pipeline: &mut Pipeline<S>,
    track: &mut RecordedTrack,
    script: ReplayScript,
) -> Result<ReplaySummary> {
    let metadata = track.metadata;
    if !(metadata.duration_seconds.is_finite() && metadata.duration_seconds >= 0.0) {
        return Err(PoseLabError::InvalidInput(
            "replay needs a finite clip duration",
        ));
    }
    let frame_rate = metadata.frame_rate.filter(|rate| *rate > 0.0).unwrap_or(30.0);
    let tick = 1.0 / DISPLAY_HZ;
    let mut media = SimulatedMedia::default();
    let mut in_flight: VecDeque<(EstimateRequest, u64)> = VecDeque::new();
    let mut counters = Counters::default();
    let mut pause_done = script.pause_at.is_none();
    let mut seek_done = script.seek_to.is_none();
    let mut last_frame = -1i64;

    let mut directives = pipeline.assign_upload();
    directives.extend(pipeline.handle_media(MediaEvent::LoadedMetadata(metadata)));
    directives.extend(pipeline.play());

    // Generous bound so a stuck script cannot spin forever.
    let max_ticks = ((metadata.duration_seconds + 2.0) * DISPLAY_HZ * 4.0) as u64;
    for frame_tick in 0..max_ticks {
        for directive in directives.drain(..) {
            match directive {
                Directive::Estimate(request) => {
                    counters.requests += 1;
                    in_flight.push_back((request, frame_tick + u64::from(script.latency_ticks)));
                }
                Directive::Media(command) => media.apply(command),
            }
        }

        while let Some(event) = media.events.pop_front() {
            directives.extend(pipeline.handle_media(event));
        }

        while in_flight
            .front()
            .map(|(_, due)| *due <= frame_tick)
            .unwrap_or(false)
        {
            let Some((request, _)) = in_flight.pop_front() else {
                break;
            };
            let now = Duration::from_secs_f64(frame_tick as f64 * tick);
            let result = track.estimate(&request);
            match pipeline.complete_estimate(request.ticket, result, now) {
                TickOutcome::Discarded => counters.discarded += 1,
                TickOutcome::Failed => counters.failed += 1,
                TickOutcome::NoSubject | TickOutcome::Rendered { .. } => counters.rendered += 1,
            }
        }

        if media.playing {
            media.time += tick;
            if media.time >= metadata.duration_seconds {
                media.time = metadata.duration_seconds;
                media.playing = false;
                directives.extend(pipeline.handle_media(MediaEvent::Ended));
                continue;
            }
            directives.extend(pipeline.handle_media(MediaEvent::TimeUpdate { time: media.time }));
            let frame = (media.time * frame_rate) as i64;
            if frame != last_frame {
                last_frame = frame;
                directives.extend(
                    pipeline.handle_media(MediaEvent::FrameDisplayed { time: media.time }),
                );
            }
            directives.extend(pipeline.handle_media(MediaEvent::AnimationTick));
        }

        if !pause_done && script.pause_at.map(|t| media.time >= t).unwrap_or(false) {
            pause_done = true;
            tracing::info!(time = media.time, "pausing");
            directives.extend(pipeline.pause());
        } else if !seek_done {
            let stopped = pause_done && !media.playing;
            let reached = script
                .seek_at
                .map(|t| media.playing && media.time >= t)
                .unwrap_or(false);
            if stopped || reached {
                seek_done = true;
                if let Some(target) = script.seek_to {
                    tracing::info!(target, playing = media.playing, "seeking");
                    directives.extend(pipeline.seek(target));
                }
            }
        }

        let settled = directives.is_empty() && in_flight.is_empty() && media.events.is_empty();
        let finished = matches!(
            pipeline.scheduler().state(),
            PlaybackState::Ended | PlaybackState::Errored
        ) || (pause_done && seek_done && !media.playing);
        if settled && finished {
            break;
        }
    }

    Ok(ReplaySummary {
        sport: pipeline.session().sport(),
        final_state: pipeline.scheduler().state(),
        status: pipeline.status(),
        session: pipeline.session().metrics().clone(),
        metrics: pipeline
            .board()
            .entries()
            .iter()
            .map(|reading| (reading.label.clone(), reading.value.to_string()))
            .collect(),
        feedback: pipeline
            .feedback()
            .iter()
            .map(|event| (event.severity, event.message.clone()))
            .collect(),
        requests: counters.requests,
        rendered: counters.rendered,
        discarded: counters.discarded,
        failed: counters.failed,
        skipped_ticks: pipeline.scheduler().skipped_ticks(),
    })
}
