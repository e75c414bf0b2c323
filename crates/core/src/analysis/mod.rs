//! Joint-angle geometry and the per-tick metrics engine.
//!
//! The engine is synchronous and stateless apart from the
//! [`SessionContext`] handed to every call, so it can be driven by the
//! pipeline tick handler and by tests alike.

mod sport;

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

pub use sport::{strategy_for, SportInput, SportReport, SportStrategy};

use crate::{
    config::{AnalysisConfig, FeedbackConfig},
    profile::{LABEL_ASYMMETRY, LABEL_OVERALL, LABEL_REPS},
    FeedbackEvent, FeedbackRequest, FeedbackThrottle, JointId, Point, Pose, Severity, Side,
    SportId, SportProfile,
};

const ANGLE_EPSILON: f32 = 1e-9;
const ASYMMETRY_EPSILON: f32 = 1e-3;
const SCORE_TARGET_FLEXION: f32 = 10.0;
const SCORE_ASYMMETRY_WEIGHT: f32 = 0.2;
const SCORE_MIN: f32 = 10.0;
const SCORE_MAX: f32 = 98.0;

/// Angle at `b` formed by `a` and `c`, in degrees within [0, 180].
pub fn angle_deg(a: Point, b: Point, c: Point) -> f32 {
    let (abx, aby) = (a.x - b.x, a.y - b.y);
    let (cbx, cby) = (c.x - b.x, c.y - b.y);
    let dot = abx * cbx + aby * cby;
    let magnitudes = abx.hypot(aby) * cbx.hypot(cby);
    (dot / (magnitudes + ANGLE_EPSILON))
        .clamp(-1.0, 1.0)
        .acos()
        .to_degrees()
}

/// Angle at joint `b`, absent when any of the three joints is missing.
pub fn joint_angle(
    pose: &Pose,
    a: JointId,
    b: JointId,
    c: JointId,
    min_confidence: f32,
) -> Option<f32> {
    let angle = angle_deg(
        pose.point(a, min_confidence)?,
        pose.point(b, min_confidence)?,
        pose.point(c, min_confidence)?,
    );
    angle.is_finite().then_some(angle)
}

/// Normalised left/right difference in percent.
pub fn asymmetry_pct(left: f32, right: f32) -> f32 {
    100.0 * (left - right).abs() / (0.5 * (left + right) + ASYMMETRY_EPSILON)
}

/// Orientation of the line from `from` to `to`, in degrees.
pub fn line_angle_deg(from: Point, to: Point) -> f32 {
    (to.y - from.y).atan2(to.x - from.x).to_degrees()
}

/// Deviation of the `top`→`bottom` segment from vertical, in degrees.
pub fn lean_from_vertical_deg(top: Point, bottom: Point) -> f32 {
    let dx = top.x - bottom.x;
    let dy = bottom.y - top.y;
    dx.atan2(dy).to_degrees().abs()
}

/// Smallest absolute difference between two orientations, in [0, 180].
/// Lines at 170° and -170° are 20° apart, not 340°.
pub fn orientation_gap_deg(a: f32, b: f32) -> f32 {
    let gap = (a - b).abs() % 360.0;
    if gap > 180.0 {
        360.0 - gap
    } else {
        gap
    }
}

/// Heuristic 10–98 score from left knee extension and symmetry.
pub fn overall_score(left_knee: f32, asymmetry: f32) -> f32 {
    let flexion = 180.0 - left_knee;
    (100.0 - (SCORE_TARGET_FLEXION - flexion).abs() - SCORE_ASYMMETRY_WEIGHT * asymmetry)
        .clamp(SCORE_MIN, SCORE_MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Degrees,
    Percent,
    Pixels,
    Count,
    Score,
}

/// Displayed value of a metric. `Unavailable` is shown explicitly rather
/// than keeping a stale number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricValue {
    Available { value: f32, unit: Unit },
    Unavailable,
}

impl MetricValue {
    pub fn value(&self) -> Option<f32> {
        match self {
            MetricValue::Available { value, .. } => Some(*value),
            MetricValue::Unavailable => None,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Available { value, unit } => match unit {
                Unit::Degrees => write!(f, "{value:.1}°"),
                Unit::Percent => write!(f, "{value:.1}%"),
                Unit::Pixels => write!(f, "{value:.1} px"),
                Unit::Count => write!(f, "{value:.0}"),
                Unit::Score => write!(f, "{value:.1}"),
            },
            MetricValue::Unavailable => f.write_str("—"),
        }
    }
}

/// A label → value update for the metric display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricReading {
    pub label: String,
    pub value: MetricValue,
}

impl MetricReading {
    pub fn new(label: &str, value: Option<f32>, unit: Unit) -> Self {
        let value = match value {
            Some(value) if value.is_finite() => MetricValue::Available { value, unit },
            _ => MetricValue::Unavailable,
        };
        Self {
            label: label.to_string(),
            value,
        }
    }

    pub fn degrees(label: &str, value: Option<f32>) -> Self {
        Self::new(label, value, Unit::Degrees)
    }

    pub fn unavailable(label: &str) -> Self {
        Self::new(label, None, Unit::Score)
    }
}

/// Aggregate state of one analysis session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionMetrics {
    pub rep_count: u32,
    /// `None` until a pose with both knee angles has been analysed.
    pub overall_score: Option<f32>,
    pub last_feedback_at: Option<Duration>,
}

/// Counts a repetition each time the tracked angle dips below `bottom` and
/// comes back above `top`.
#[derive(Debug, Clone)]
struct RepCounter {
    bottom: f32,
    top: f32,
    at_bottom: bool,
}

impl RepCounter {
    fn new(bottom: f32, top: f32) -> Self {
        Self {
            bottom,
            top,
            at_bottom: false,
        }
    }

    fn update(&mut self, angle: f32) -> bool {
        if angle < self.bottom {
            self.at_bottom = true;
        } else if self.at_bottom && angle > self.top {
            self.at_bottom = false;
            return true;
        }
        false
    }
}

/// Everything that belongs to the currently selected sport. Created on
/// sport selection and replaced wholesale when the sport changes.
#[derive(Debug, Clone)]
pub struct SessionContext {
    sport: SportId,
    metrics: SessionMetrics,
    throttle: FeedbackThrottle,
    reps: RepCounter,
}

impl SessionContext {
    pub fn new(sport: SportId, feedback: &FeedbackConfig) -> Self {
        let thresholds = sport.profile().thresholds;
        Self {
            sport,
            metrics: SessionMetrics::default(),
            throttle: FeedbackThrottle::new(feedback),
            reps: RepCounter::new(thresholds.rep_bottom_deg, thresholds.rep_top_deg),
        }
    }

    pub fn sport(&self) -> SportId {
        self.sport
    }

    pub fn profile(&self) -> &'static SportProfile {
        self.sport.profile()
    }

    pub fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }

    /// Passes `request` through the session's throttle.
    pub fn offer_feedback(
        &mut self,
        request: FeedbackRequest,
        now: Duration,
    ) -> Option<FeedbackEvent> {
        let event = self.throttle.offer(request, now)?;
        self.metrics.last_feedback_at = Some(event.timestamp);
        Some(event)
    }
}

/// Result of analysing one pose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickAnalysis {
    pub left_knee: f32,
    pub right_knee: f32,
    pub asymmetry_pct: f32,
    pub overall_score: f32,
    pub readings: Vec<MetricReading>,
    /// Joints the active sport needs that this pose lacks.
    pub missing_joints: Vec<JointId>,
    /// Sport-specific requests come before the generic asymmetry request.
    pub feedback: Vec<FeedbackRequest>,
}

impl TickAnalysis {
    pub fn reading(&self, label: &str) -> Option<&MetricReading> {
        self.readings.iter().find(|reading| reading.label == label)
    }
}

/// Turns a mapped pose into metric readings and feedback requests.
#[derive(Debug, Clone)]
pub struct MetricsEngine {
    min_confidence: f32,
    trailing_side: Side,
}

impl MetricsEngine {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            min_confidence: config.confidence_threshold,
            trailing_side: config.trailing_side,
        }
    }

    /// Analyses one pose. Returns `None`, leaving `session` untouched, when
    /// either knee angle cannot be computed.
    pub fn analyze(&self, session: &mut SessionContext, pose: &Pose) -> Option<TickAnalysis> {
        let knee = |side: Side| {
            joint_angle(
                pose,
                side.hip(),
                side.knee(),
                side.ankle(),
                self.min_confidence,
            )
        };
        let (Some(left_knee), Some(right_knee)) = (knee(Side::Left), knee(Side::Right)) else {
            tracing::trace!(sport = %session.sport, "knee angles unavailable, skipping analysis");
            return None;
        };

        let profile = session.profile();
        let thresholds = &profile.thresholds;
        let asymmetry = asymmetry_pct(left_knee, right_knee);

        let strategy = strategy_for(session.sport);
        let missing_joints = strategy.missing_joints(pose, self.min_confidence);
        if !missing_joints.is_empty() {
            tracing::trace!(sport = %session.sport, missing = ?missing_joints, "partial pose");
        }
        let report = strategy.evaluate(&SportInput {
            pose,
            min_confidence: self.min_confidence,
            left_knee,
            right_knee,
            thresholds,
            trailing_side: self.trailing_side,
        });

        let mut readings = vec![MetricReading::new(
            LABEL_ASYMMETRY,
            Some(asymmetry),
            Unit::Percent,
        )];
        readings.extend(report.readings);

        if strategy.counts_reps() {
            if session.reps.update(0.5 * (left_knee + right_knee)) {
                session.metrics.rep_count += 1;
                tracing::debug!(reps = session.metrics.rep_count, "repetition completed");
            }
            readings.push(MetricReading::new(
                LABEL_REPS,
                Some(session.metrics.rep_count as f32),
                Unit::Count,
            ));
        }

        let score = overall_score(left_knee, asymmetry);
        session.metrics.overall_score = Some(score);
        readings.push(MetricReading::new(LABEL_OVERALL, Some(score), Unit::Score));

        let mut feedback = report.feedback;
        feedback.push(if asymmetry <= thresholds.max_asymmetry_pct {
            FeedbackRequest::new(Severity::Good, "Left/right knee angles are balanced")
        } else {
            FeedbackRequest::new(
                Severity::Warning,
                format!("Knee asymmetry {asymmetry:.1}% exceeds {:.0}%", thresholds.max_asymmetry_pct),
            )
        });

        Some(TickAnalysis {
            left_knee,
            right_knee,
            asymmetry_pct: asymmetry,
            overall_score: score,
            readings,
            missing_joints,
            feedback,
        })
    }
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self::new(&AnalysisConfig::default())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{profile::LABEL_HIP_DEPTH, Keypoint};

    pub(crate) fn legs(left: [(f32, f32); 3], right: [(f32, f32); 3]) -> Pose {
        let mut keypoints = Vec::new();
        for (side, points) in [(Side::Left, left), (Side::Right, right)] {
            for (joint, (x, y)) in [side.hip(), side.knee(), side.ankle()].into_iter().zip(points) {
                keypoints.push(Keypoint::new(joint, x, y, 0.9));
            }
        }
        Pose::new(keypoints)
    }

    fn session(sport: SportId) -> SessionContext {
        SessionContext::new(sport, &FeedbackConfig::default())
    }

    #[test]
    fn right_angle_is_ninety_degrees() {
        let angle = angle_deg(Point::new(0.0, 1.0), Point::new(0.0, 0.0), Point::new(1.0, 0.0));
        assert!((angle - 90.0).abs() < 0.01);
    }

    #[test]
    fn opposite_points_are_straight() {
        let angle = angle_deg(Point::new(-1.0, 0.0), Point::new(0.0, 0.0), Point::new(1.0, 0.0));
        assert!((angle - 180.0).abs() < 0.01);
    }

    #[test]
    fn coincident_points_stay_finite() {
        let p = Point::new(3.0, 3.0);
        let angle = angle_deg(p, p, p);
        assert!(angle.is_finite());
        assert!((0.0..=180.0).contains(&angle));
    }

    #[test]
    fn asymmetry_is_non_negative_and_side_independent() {
        for (l, r) in [(170.0, 150.0), (90.0, 90.0), (10.0, 179.0), (0.0, 0.0)] {
            let forward = asymmetry_pct(l, r);
            assert!(forward >= 0.0);
            assert_eq!(forward, asymmetry_pct(r, l));
        }
        assert_eq!(asymmetry_pct(120.0, 120.0), 0.0);
    }

    #[test]
    fn score_is_clamped() {
        assert_eq!(overall_score(170.0, 0.0), 98.0);
        assert_eq!(overall_score(0.0, 100.0), 10.0);
        let mid = overall_score(150.0, 10.0);
        assert!((mid - 78.0).abs() < 1e-4);
    }

    #[test]
    fn orientation_gap_wraps() {
        assert!((orientation_gap_deg(170.0, -170.0) - 20.0).abs() < 1e-4);
        assert!((orientation_gap_deg(30.0, -20.0) - 50.0).abs() < 1e-4);
    }

    #[test]
    fn collinear_legs_are_straight_and_not_deep() {
        let pose = legs(
            [(0.0, 0.0), (0.0, 1.0), (0.0, 2.0)],
            [(4.0, 0.0), (4.0, 1.0), (4.0, 2.0)],
        );
        let mut ctx = session(SportId::Squat);
        let analysis = MetricsEngine::default().analyze(&mut ctx, &pose).unwrap();

        assert!((analysis.left_knee - 180.0).abs() < 0.01);
        assert!((analysis.right_knee - 180.0).abs() < 0.01);
        assert!(analysis.asymmetry_pct.abs() < 1e-3);
        assert!(analysis
            .feedback
            .iter()
            .all(|f| !f.message.contains("Depth reached")));
        assert!(analysis.reading(LABEL_HIP_DEPTH).is_some());
    }

    #[test]
    fn missing_ankle_aborts_the_tick() {
        let mut pose = legs(
            [(0.0, 0.0), (0.0, 1.0), (0.0, 2.0)],
            [(4.0, 0.0), (4.0, 1.0), (4.0, 2.0)],
        );
        pose.keypoints.retain(|kp| kp.name != JointId::RightAnkle);

        let mut ctx = session(SportId::Sprint);
        assert!(MetricsEngine::default().analyze(&mut ctx, &pose).is_none());
        assert_eq!(ctx.metrics(), &SessionMetrics::default());
    }

    #[test]
    fn legs_only_pose_lists_missing_upper_body_joints() {
        let pose = legs(
            [(0.0, 0.0), (0.0, 1.0), (0.0, 2.0)],
            [(4.0, 0.0), (4.0, 1.0), (4.0, 2.0)],
        );
        let engine = MetricsEngine::default();

        let golf = engine.analyze(&mut session(SportId::Golf), &pose).unwrap();
        assert_eq!(
            golf.missing_joints,
            vec![JointId::LeftShoulder, JointId::RightShoulder]
        );

        let squat = engine.analyze(&mut session(SportId::Squat), &pose).unwrap();
        assert!(squat.missing_joints.is_empty());
    }

    #[test]
    fn score_is_unknown_until_first_analysis() {
        let mut ctx = session(SportId::Tennis);
        assert_eq!(ctx.metrics().overall_score, None);

        let pose = legs(
            [(0.0, 0.0), (0.0, 1.0), (0.0, 2.0)],
            [(4.0, 0.0), (4.0, 1.0), (4.0, 2.0)],
        );
        MetricsEngine::default().analyze(&mut ctx, &pose).unwrap();
        let score = ctx.metrics().overall_score.unwrap();
        assert!((score - 90.0).abs() < 1e-3);
    }

    #[test]
    fn squat_counts_a_rep_after_bottom_and_stand() {
        let standing = legs(
            [(0.0, 0.0), (0.0, 1.0), (0.0, 2.0)],
            [(4.0, 0.0), (4.0, 1.0), (4.0, 2.0)],
        );
        // Thigh horizontal, shin pointing back up: knees well below 90°.
        let bottom = legs(
            [(1.0, 1.0), (0.0, 1.0), (1.0, 1.5)],
            [(5.0, 1.0), (4.0, 1.0), (5.0, 1.5)],
        );

        let engine = MetricsEngine::default();
        let mut ctx = session(SportId::Squat);
        engine.analyze(&mut ctx, &standing).unwrap();
        engine.analyze(&mut ctx, &bottom).unwrap();
        engine.analyze(&mut ctx, &bottom).unwrap();
        assert_eq!(ctx.metrics().rep_count, 0);
        let analysis = engine.analyze(&mut ctx, &standing).unwrap();
        assert_eq!(ctx.metrics().rep_count, 1);
        assert_eq!(
            analysis.reading(LABEL_REPS).unwrap().value.value(),
            Some(1.0)
        );
    }

    #[test]
    fn metric_values_format_with_units() {
        assert_eq!(MetricReading::degrees("a", Some(172.44)).value.to_string(), "172.4°");
        assert_eq!(
            MetricReading::new("b", Some(12.0), Unit::Percent).value.to_string(),
            "12.0%"
        );
        assert_eq!(MetricReading::degrees("c", Some(f32::NAN)).value.to_string(), "—");
        assert_eq!(MetricReading::unavailable("d").value, MetricValue::Unavailable);
    }

    #[test]
    fn session_records_last_accepted_feedback() {
        let mut ctx = session(SportId::Golf);
        let now = Duration::from_secs(3);
        ctx.offer_feedback(FeedbackRequest::new(Severity::Info, "hello"), now)
            .unwrap();
        assert!(ctx
            .offer_feedback(FeedbackRequest::new(Severity::Error, "dropped"), now)
            .is_none());
        assert_eq!(ctx.metrics().last_feedback_at, Some(now));
    }
}
