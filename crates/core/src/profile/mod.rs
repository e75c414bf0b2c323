use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::PoseLabError;

pub const LABEL_LEFT_KNEE: &str = "Left knee";
pub const LABEL_RIGHT_KNEE: &str = "Right knee";
pub const LABEL_ASYMMETRY: &str = "Asymmetry";
pub const LABEL_OVERALL: &str = "Overall score";
pub const LABEL_KNEE_DRIVE_LEFT: &str = "Knee drive (L)";
pub const LABEL_KNEE_DRIVE_RIGHT: &str = "Knee drive (R)";
pub const LABEL_FORWARD_LEAN: &str = "Forward lean";
pub const LABEL_HIP_DEPTH: &str = "Hip depth";
pub const LABEL_REPS: &str = "Reps";
pub const LABEL_X_FACTOR: &str = "X-factor";
pub const LABEL_SHOULDER_TURN: &str = "Shoulder turn";
pub const LABEL_HIP_TURN: &str = "Hip turn";
pub const LABEL_ELBOW_ANGLE: &str = "Elbow angle";
pub const LABEL_KNEE_BEND: &str = "Knee bend";
pub const LABEL_RACKET_SPEED: &str = "Racket speed";
pub const LABEL_CONTACT_HEIGHT: &str = "Contact height";

/// Sports the metrics engine has a strategy for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SportId {
    Golf,
    Sprint,
    Cricket,
    Baseball,
    Tennis,
    Squat,
}

impl SportId {
    pub const ALL: [SportId; 6] = [
        SportId::Golf,
        SportId::Sprint,
        SportId::Cricket,
        SportId::Baseball,
        SportId::Tennis,
        SportId::Squat,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SportId::Golf => "golf",
            SportId::Sprint => "sprint",
            SportId::Cricket => "cricket",
            SportId::Baseball => "baseball",
            SportId::Tennis => "tennis",
            SportId::Squat => "squat",
        }
    }

    pub fn profile(self) -> &'static SportProfile {
        match self {
            SportId::Golf => &GOLF,
            SportId::Sprint => &SPRINT,
            SportId::Cricket => &CRICKET,
            SportId::Baseball => &BASEBALL,
            SportId::Tennis => &TENNIS,
            SportId::Squat => &SQUAT,
        }
    }
}

impl fmt::Display for SportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SportId {
    type Err = PoseLabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SportId::ALL
            .into_iter()
            .find(|sport| sport.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PoseLabError::UnknownSport(s.to_string()))
    }
}

/// Angles are in degrees, asymmetry in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SportThresholds {
    pub max_asymmetry_pct: f32,
    pub min_forward_lean_deg: f32,
    pub squat_depth_deg: f32,
    pub min_x_factor_deg: f32,
    pub min_elbow_deg: f32,
    pub rep_bottom_deg: f32,
    pub rep_top_deg: f32,
}

const THRESHOLDS: SportThresholds = SportThresholds {
    max_asymmetry_pct: 15.0,
    min_forward_lean_deg: 3.0,
    squat_depth_deg: 90.0,
    min_x_factor_deg: 45.0,
    min_elbow_deg: 90.0,
    rep_bottom_deg: 90.0,
    rep_top_deg: 160.0,
};

/// Static per-sport display and threshold table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SportProfile {
    pub id: SportId,
    pub title: &'static str,
    pub labels: &'static [&'static str],
    pub thresholds: SportThresholds,
}

static GOLF: SportProfile = SportProfile {
    id: SportId::Golf,
    title: "Golf swing",
    labels: &[
        LABEL_X_FACTOR,
        LABEL_SHOULDER_TURN,
        LABEL_HIP_TURN,
        LABEL_ASYMMETRY,
        LABEL_OVERALL,
    ],
    thresholds: THRESHOLDS,
};

static SPRINT: SportProfile = SportProfile {
    id: SportId::Sprint,
    title: "Sprint mechanics",
    labels: &[
        LABEL_KNEE_DRIVE_LEFT,
        LABEL_KNEE_DRIVE_RIGHT,
        LABEL_FORWARD_LEAN,
        LABEL_ASYMMETRY,
        LABEL_OVERALL,
    ],
    thresholds: THRESHOLDS,
};

static CRICKET: SportProfile = SportProfile {
    id: SportId::Cricket,
    title: "Cricket bowling",
    labels: &[LABEL_ELBOW_ANGLE, LABEL_ASYMMETRY, LABEL_OVERALL],
    thresholds: THRESHOLDS,
};

static BASEBALL: SportProfile = SportProfile {
    id: SportId::Baseball,
    title: "Baseball pitching",
    labels: &[LABEL_ELBOW_ANGLE, LABEL_ASYMMETRY, LABEL_OVERALL],
    thresholds: THRESHOLDS,
};

static TENNIS: SportProfile = SportProfile {
    id: SportId::Tennis,
    title: "Tennis serve",
    labels: &[
        LABEL_KNEE_BEND,
        LABEL_RACKET_SPEED,
        LABEL_CONTACT_HEIGHT,
        LABEL_ASYMMETRY,
        LABEL_OVERALL,
    ],
    thresholds: THRESHOLDS,
};

static SQUAT: SportProfile = SportProfile {
    id: SportId::Squat,
    title: "Squat",
    labels: &[
        LABEL_LEFT_KNEE,
        LABEL_RIGHT_KNEE,
        LABEL_ASYMMETRY,
        LABEL_HIP_DEPTH,
        LABEL_REPS,
        LABEL_OVERALL,
    ],
    thresholds: THRESHOLDS,
};

/// All profiles in display order.
pub fn profiles() -> impl Iterator<Item = &'static SportProfile> {
    SportId::ALL.into_iter().map(SportId::profile)
}
