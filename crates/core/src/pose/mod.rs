//! Keypoint and pose types shared by every stage of the pipeline.

use serde::{Deserialize, Serialize};

/// The 17 landmarks reported by single-subject COCO style estimators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointId {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl JointId {
    pub const COUNT: usize = 17;

    pub const ALL: [JointId; Self::COUNT] = [
        JointId::Nose,
        JointId::LeftEye,
        JointId::RightEye,
        JointId::LeftEar,
        JointId::RightEar,
        JointId::LeftShoulder,
        JointId::RightShoulder,
        JointId::LeftElbow,
        JointId::RightElbow,
        JointId::LeftWrist,
        JointId::RightWrist,
        JointId::LeftHip,
        JointId::RightHip,
        JointId::LeftKnee,
        JointId::RightKnee,
        JointId::LeftAnkle,
        JointId::RightAnkle,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            JointId::Nose => "nose",
            JointId::LeftEye => "left_eye",
            JointId::RightEye => "right_eye",
            JointId::LeftEar => "left_ear",
            JointId::RightEar => "right_ear",
            JointId::LeftShoulder => "left_shoulder",
            JointId::RightShoulder => "right_shoulder",
            JointId::LeftElbow => "left_elbow",
            JointId::RightElbow => "right_elbow",
            JointId::LeftWrist => "left_wrist",
            JointId::RightWrist => "right_wrist",
            JointId::LeftHip => "left_hip",
            JointId::RightHip => "right_hip",
            JointId::LeftKnee => "left_knee",
            JointId::RightKnee => "right_knee",
            JointId::LeftAnkle => "left_ankle",
            JointId::RightAnkle => "right_ankle",
        }
    }
}

/// Body side used to pick paired joints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn shoulder(self) -> JointId {
        match self {
            Side::Left => JointId::LeftShoulder,
            Side::Right => JointId::RightShoulder,
        }
    }

    pub fn elbow(self) -> JointId {
        match self {
            Side::Left => JointId::LeftElbow,
            Side::Right => JointId::RightElbow,
        }
    }

    pub fn wrist(self) -> JointId {
        match self {
            Side::Left => JointId::LeftWrist,
            Side::Right => JointId::RightWrist,
        }
    }

    pub fn hip(self) -> JointId {
        match self {
            Side::Left => JointId::LeftHip,
            Side::Right => JointId::RightHip,
        }
    }

    pub fn knee(self) -> JointId {
        match self {
            Side::Left => JointId::LeftKnee,
            Side::Right => JointId::RightKnee,
        }
    }

    pub fn ankle(self) -> JointId {
        match self {
            Side::Left => JointId::LeftAnkle,
            Side::Right => JointId::RightAnkle,
        }
    }
}

/// 2D position in whatever pixel space the owning pose is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }
}

fn full_confidence() -> f32 {
    1.0
}

/// A single named landmark. Estimators that omit `score` are trusted fully.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub name: JointId,
    pub x: f32,
    pub y: f32,
    #[serde(rename = "score", alias = "confidence", default = "full_confidence")]
    pub confidence: f32,
}

impl Keypoint {
    pub fn new(name: JointId, x: f32, y: f32, confidence: f32) -> Self {
        Self {
            name,
            x,
            y,
            confidence,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// All keypoints detected for one subject at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub keypoints: Vec<Keypoint>,
}

impl Pose {
    pub fn new(keypoints: Vec<Keypoint>) -> Self {
        Self { keypoints }
    }

    /// Returns the keypoint for `joint` regardless of its confidence.
    pub fn get(&self, joint: JointId) -> Option<&Keypoint> {
        self.keypoints.iter().find(|kp| kp.name == joint)
    }

    /// Returns the keypoint for `joint` only when it clears `min_confidence`.
    pub fn find(&self, joint: JointId, min_confidence: f32) -> Option<&Keypoint> {
        self.get(joint)
            .filter(|kp| kp.confidence >= min_confidence && kp.x.is_finite() && kp.y.is_finite())
    }

    pub fn point(&self, joint: JointId, min_confidence: f32) -> Option<Point> {
        self.find(joint, min_confidence).map(Keypoint::position)
    }

    /// Midpoint of two joints, absent when either joint is.
    pub fn midpoint(&self, a: JointId, b: JointId, min_confidence: f32) -> Option<Point> {
        Some(self.point(a, min_confidence)?.midpoint(self.point(b, min_confidence)?))
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_respects_confidence() {
        let pose = Pose::new(vec![
            Keypoint::new(JointId::LeftKnee, 1.0, 2.0, 0.9),
            Keypoint::new(JointId::RightKnee, 3.0, 4.0, 0.1),
        ]);

        assert!(pose.find(JointId::LeftKnee, 0.3).is_some());
        assert!(pose.find(JointId::RightKnee, 0.3).is_none());
        assert!(pose.get(JointId::RightKnee).is_some());
        assert!(pose.find(JointId::Nose, 0.0).is_none());
    }

    #[test]
    fn midpoint_requires_both_joints() {
        let pose = Pose::new(vec![
            Keypoint::new(JointId::LeftHip, 0.0, 10.0, 1.0),
            Keypoint::new(JointId::RightHip, 4.0, 20.0, 1.0),
        ]);

        let mid = pose
            .midpoint(JointId::LeftHip, JointId::RightHip, 0.3)
            .unwrap();
        assert_eq!(mid, Point::new(2.0, 15.0));
        assert!(pose
            .midpoint(JointId::LeftHip, JointId::LeftKnee, 0.3)
            .is_none());
    }

    #[test]
    fn missing_score_defaults_to_full_confidence() {
        let pose: Pose = serde_json::from_str(
            r#"{ "keypoints": [
                { "name": "left_shoulder", "x": 10.0, "y": 20.0 },
                { "name": "right_shoulder", "x": 30.0, "y": 20.0, "score": 0.25 }
            ] }"#,
        )
        .unwrap();

        assert_eq!(pose.get(JointId::LeftShoulder).unwrap().confidence, 1.0);
        assert_eq!(pose.get(JointId::RightShoulder).unwrap().confidence, 0.25);
    }

    #[test]
    fn joint_names_match_serde_names() {
        for joint in JointId::ALL {
            let encoded = serde_json::to_string(&joint).unwrap();
            assert_eq!(encoded, format!("\"{}\"", joint.as_str()));
        }
    }
}
