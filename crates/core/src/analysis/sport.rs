use crate::{
    analysis::{
        joint_angle, lean_from_vertical_deg, line_angle_deg, orientation_gap_deg, MetricReading,
        Unit,
    },
    profile::{
        SportThresholds, LABEL_CONTACT_HEIGHT, LABEL_ELBOW_ANGLE, LABEL_FORWARD_LEAN,
        LABEL_HIP_DEPTH, LABEL_HIP_TURN, LABEL_KNEE_BEND, LABEL_KNEE_DRIVE_LEFT,
        LABEL_KNEE_DRIVE_RIGHT, LABEL_LEFT_KNEE, LABEL_RACKET_SPEED, LABEL_RIGHT_KNEE,
        LABEL_SHOULDER_TURN, LABEL_X_FACTOR,
    },
    FeedbackRequest, JointId, Point, Pose, Severity, Side, SportId,
};

const LEG_JOINTS: [JointId; 6] = [
    JointId::LeftHip,
    JointId::LeftKnee,
    JointId::LeftAnkle,
    JointId::RightHip,
    JointId::RightKnee,
    JointId::RightAnkle,
];

/// Inputs shared by every sport strategy for one tick.
#[derive(Debug, Clone, Copy)]
pub struct SportInput<'a> {
    pub pose: &'a Pose,
    pub min_confidence: f32,
    pub left_knee: f32,
    pub right_knee: f32,
    pub thresholds: &'a SportThresholds,
    pub trailing_side: Side,
}

impl SportInput<'_> {
    fn point(&self, joint: JointId) -> Option<Point> {
        self.pose.point(joint, self.min_confidence)
    }

    fn midpoint(&self, a: JointId, b: JointId) -> Option<Point> {
        self.pose.midpoint(a, b, self.min_confidence)
    }

    fn line_angle(&self, from: JointId, to: JointId) -> Option<f32> {
        Some(line_angle_deg(self.point(from)?, self.point(to)?))
    }
}

/// Readings and feedback produced by one strategy for one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SportReport {
    pub readings: Vec<MetricReading>,
    pub feedback: Vec<FeedbackRequest>,
}

impl SportReport {
    fn reading(&mut self, reading: MetricReading) {
        self.readings.push(reading);
    }

    fn feedback(&mut self, severity: Severity, message: impl Into<String>) {
        self.feedback.push(FeedbackRequest::new(severity, message));
    }
}

/// Sport-specific metric computation. Knee angles are always available by
/// the time a strategy runs; any other joint may be missing, in which case
/// only the metrics depending on it become unavailable.
pub trait SportStrategy: Sync {
    fn sport(&self) -> SportId;

    /// Joints the strategy reads. Any of them missing from a pose leaves
    /// at least one of its metrics unavailable.
    fn required_joints(&self) -> &'static [JointId];

    /// Required joints absent or below `min_confidence` in `pose`.
    fn missing_joints(&self, pose: &Pose, min_confidence: f32) -> Vec<JointId> {
        self.required_joints()
            .iter()
            .copied()
            .filter(|joint| pose.find(*joint, min_confidence).is_none())
            .collect()
    }

    fn counts_reps(&self) -> bool {
        false
    }

    fn evaluate(&self, input: &SportInput<'_>) -> SportReport;
}

pub fn strategy_for(sport: SportId) -> &'static dyn SportStrategy {
    match sport {
        SportId::Sprint => &Sprint,
        SportId::Squat => &Squat,
        SportId::Golf => &Golf,
        SportId::Cricket => &CRICKET,
        SportId::Baseball => &BASEBALL,
        SportId::Tennis => &Tennis,
    }
}

struct Sprint;

impl SportStrategy for Sprint {
    fn sport(&self) -> SportId {
        SportId::Sprint
    }

    fn required_joints(&self) -> &'static [JointId] {
        &[
            JointId::LeftShoulder,
            JointId::RightShoulder,
            JointId::LeftHip,
            JointId::LeftKnee,
            JointId::LeftAnkle,
            JointId::RightHip,
            JointId::RightKnee,
            JointId::RightAnkle,
        ]
    }

    fn evaluate(&self, input: &SportInput<'_>) -> SportReport {
        let mut report = SportReport::default();
        report.reading(MetricReading::degrees(
            LABEL_KNEE_DRIVE_LEFT,
            Some(180.0 - input.left_knee),
        ));
        report.reading(MetricReading::degrees(
            LABEL_KNEE_DRIVE_RIGHT,
            Some(180.0 - input.right_knee),
        ));

        let lean = input
            .midpoint(JointId::LeftShoulder, JointId::RightShoulder)
            .zip(input.midpoint(JointId::LeftHip, JointId::RightHip))
            .map(|(shoulders, hips)| lean_from_vertical_deg(shoulders, hips));
        report.reading(MetricReading::degrees(LABEL_FORWARD_LEAN, lean));

        if let Some(lean) = lean {
            if lean < input.thresholds.min_forward_lean_deg {
                report.feedback(
                    Severity::Warning,
                    format!("Lean into the run: torso only {lean:.1}° from vertical"),
                );
            }
        }
        report
    }
}

struct Squat;

impl SportStrategy for Squat {
    fn sport(&self) -> SportId {
        SportId::Squat
    }

    fn required_joints(&self) -> &'static [JointId] {
        &LEG_JOINTS
    }

    fn counts_reps(&self) -> bool {
        true
    }

    fn evaluate(&self, input: &SportInput<'_>) -> SportReport {
        let mut report = SportReport::default();
        report.reading(MetricReading::degrees(LABEL_LEFT_KNEE, Some(input.left_knee)));
        report.reading(MetricReading::degrees(
            LABEL_RIGHT_KNEE,
            Some(input.right_knee),
        ));

        let depth = input
            .midpoint(JointId::LeftHip, JointId::RightHip)
            .zip(input.midpoint(JointId::LeftKnee, JointId::RightKnee))
            .map(|(hips, knees)| knees.y - hips.y);
        report.reading(MetricReading::new(LABEL_HIP_DEPTH, depth, Unit::Pixels));

        let target = input.thresholds.squat_depth_deg;
        if input.left_knee < target && input.right_knee < target {
            report.feedback(
                Severity::Good,
                format!("Depth reached: both knees below {target:.0}°"),
            );
        }
        report
    }
}

struct Golf;

impl SportStrategy for Golf {
    fn sport(&self) -> SportId {
        SportId::Golf
    }

    fn required_joints(&self) -> &'static [JointId] {
        &[
            JointId::LeftShoulder,
            JointId::RightShoulder,
            JointId::LeftHip,
            JointId::RightHip,
        ]
    }

    fn evaluate(&self, input: &SportInput<'_>) -> SportReport {
        let mut report = SportReport::default();
        let shoulders = input.line_angle(JointId::LeftShoulder, JointId::RightShoulder);
        let hips = input.line_angle(JointId::LeftHip, JointId::RightHip);
        let x_factor = shoulders
            .zip(hips)
            .map(|(shoulders, hips)| orientation_gap_deg(shoulders, hips));

        report.reading(MetricReading::degrees(LABEL_X_FACTOR, x_factor));
        report.reading(MetricReading::degrees(LABEL_SHOULDER_TURN, shoulders));
        report.reading(MetricReading::degrees(LABEL_HIP_TURN, hips));

        if let Some(x_factor) = x_factor {
            if x_factor > input.thresholds.min_x_factor_deg {
                report.feedback(
                    Severity::Good,
                    format!("Strong shoulder-hip separation (X-factor {x_factor:.1}°)"),
                );
            } else {
                report.feedback(
                    Severity::Warning,
                    format!("Turn the shoulders further past the hips (X-factor {x_factor:.1}°)"),
                );
            }
        }
        report
    }
}

/// Elbow check on the trailing arm, shared by cricket and baseball.
struct Throwing {
    sport: SportId,
}

const CRICKET: Throwing = Throwing {
    sport: SportId::Cricket,
};
const BASEBALL: Throwing = Throwing {
    sport: SportId::Baseball,
};

impl SportStrategy for Throwing {
    fn sport(&self) -> SportId {
        self.sport
    }

    /// Both arms, since the trailing side is a configuration choice.
    fn required_joints(&self) -> &'static [JointId] {
        &[
            JointId::LeftShoulder,
            JointId::LeftElbow,
            JointId::LeftWrist,
            JointId::RightShoulder,
            JointId::RightElbow,
            JointId::RightWrist,
        ]
    }

    fn evaluate(&self, input: &SportInput<'_>) -> SportReport {
        let mut report = SportReport::default();
        let side = input.trailing_side;
        let elbow = joint_angle(
            input.pose,
            side.shoulder(),
            side.elbow(),
            side.wrist(),
            input.min_confidence,
        );
        report.reading(MetricReading::degrees(LABEL_ELBOW_ANGLE, elbow));

        if let Some(elbow) = elbow {
            if elbow < input.thresholds.min_elbow_deg {
                report.feedback(
                    Severity::Error,
                    format!("Elbow angle {elbow:.1}° is under 90°: injury risk"),
                );
            } else {
                report.feedback(
                    Severity::Good,
                    format!("Elbow angle {elbow:.1}° is in a safe range"),
                );
            }
        }
        report
    }
}

struct Tennis;

impl SportStrategy for Tennis {
    fn sport(&self) -> SportId {
        SportId::Tennis
    }

    fn required_joints(&self) -> &'static [JointId] {
        &LEG_JOINTS
    }

    fn evaluate(&self, input: &SportInput<'_>) -> SportReport {
        let mut report = SportReport::default();
        report.reading(MetricReading::degrees(
            LABEL_KNEE_BEND,
            Some(180.0 - input.left_knee),
        ));
        // Racket tracking is not part of the keypoint set.
        report.reading(MetricReading::unavailable(LABEL_RACKET_SPEED));
        report.reading(MetricReading::unavailable(LABEL_CONTACT_HEIGHT));
        report
    }
}
