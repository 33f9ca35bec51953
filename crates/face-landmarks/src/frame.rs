//! Landmark frame types

use crate::error::LandmarkError;
use crate::geometry::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;

/// Named facial-feature roles consumed by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeaturePoint {
    LeftEyeOuter,
    LeftEyeUpperOuter,
    LeftEyeUpperInner,
    LeftEyeInner,
    LeftEyeLowerInner,
    LeftEyeLowerOuter,
    RightEyeInner,
    RightEyeUpperInner,
    RightEyeUpperOuter,
    RightEyeOuter,
    RightEyeLowerOuter,
    RightEyeLowerInner,
    MouthLeft,
    MouthRight,
    MouthTop,
    MouthBottom,
    LeftBrowInner,
    LeftBrowOuter,
    RightBrowInner,
    RightBrowOuter,
    LeftCheek,
    RightCheek,
}

impl FeaturePoint {
    pub const COUNT: usize = 22;

    pub const ALL: [FeaturePoint; Self::COUNT] = [
        FeaturePoint::LeftEyeOuter,
        FeaturePoint::LeftEyeUpperOuter,
        FeaturePoint::LeftEyeUpperInner,
        FeaturePoint::LeftEyeInner,
        FeaturePoint::LeftEyeLowerInner,
        FeaturePoint::LeftEyeLowerOuter,
        FeaturePoint::RightEyeInner,
        FeaturePoint::RightEyeUpperInner,
        FeaturePoint::RightEyeUpperOuter,
        FeaturePoint::RightEyeOuter,
        FeaturePoint::RightEyeLowerOuter,
        FeaturePoint::RightEyeLowerInner,
        FeaturePoint::MouthLeft,
        FeaturePoint::MouthRight,
        FeaturePoint::MouthTop,
        FeaturePoint::MouthBottom,
        FeaturePoint::LeftBrowInner,
        FeaturePoint::LeftBrowOuter,
        FeaturePoint::RightBrowInner,
        FeaturePoint::RightBrowOuter,
        FeaturePoint::LeftCheek,
        FeaturePoint::RightCheek,
    ];

    /// Position in `ALL` (and in the frame's storage)
    pub fn index(self) -> usize {
        self as usize
    }

    /// Index of this role in the MediaPipe 468-point face mesh
    pub fn mesh_index(self) -> usize {
        match self {
            FeaturePoint::LeftEyeOuter => 33,
            FeaturePoint::LeftEyeUpperOuter => 160,
            FeaturePoint::LeftEyeUpperInner => 158,
            FeaturePoint::LeftEyeInner => 133,
            FeaturePoint::LeftEyeLowerInner => 153,
            FeaturePoint::LeftEyeLowerOuter => 144,
            FeaturePoint::RightEyeInner => 362,
            FeaturePoint::RightEyeUpperInner => 385,
            FeaturePoint::RightEyeUpperOuter => 387,
            FeaturePoint::RightEyeOuter => 263,
            FeaturePoint::RightEyeLowerOuter => 373,
            FeaturePoint::RightEyeLowerInner => 380,
            FeaturePoint::MouthLeft => 61,
            FeaturePoint::MouthRight => 291,
            FeaturePoint::MouthTop => 13,
            FeaturePoint::MouthBottom => 14,
            FeaturePoint::LeftBrowInner => 70,
            FeaturePoint::LeftBrowOuter => 105,
            FeaturePoint::RightBrowInner => 300,
            FeaturePoint::RightBrowOuter => 334,
            FeaturePoint::LeftCheek => 234,
            FeaturePoint::RightCheek => 454,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FeaturePoint::LeftEyeOuter => "left_eye_outer",
            FeaturePoint::LeftEyeUpperOuter => "left_eye_upper_outer",
            FeaturePoint::LeftEyeUpperInner => "left_eye_upper_inner",
            FeaturePoint::LeftEyeInner => "left_eye_inner",
            FeaturePoint::LeftEyeLowerInner => "left_eye_lower_inner",
            FeaturePoint::LeftEyeLowerOuter => "left_eye_lower_outer",
            FeaturePoint::RightEyeInner => "right_eye_inner",
            FeaturePoint::RightEyeUpperInner => "right_eye_upper_inner",
            FeaturePoint::RightEyeUpperOuter => "right_eye_upper_outer",
            FeaturePoint::RightEyeOuter => "right_eye_outer",
            FeaturePoint::RightEyeLowerOuter => "right_eye_lower_outer",
            FeaturePoint::RightEyeLowerInner => "right_eye_lower_inner",
            FeaturePoint::MouthLeft => "mouth_left",
            FeaturePoint::MouthRight => "mouth_right",
            FeaturePoint::MouthTop => "mouth_top",
            FeaturePoint::MouthBottom => "mouth_bottom",
            FeaturePoint::LeftBrowInner => "left_brow_inner",
            FeaturePoint::LeftBrowOuter => "left_brow_outer",
            FeaturePoint::RightBrowInner => "right_brow_inner",
            FeaturePoint::RightBrowOuter => "right_brow_outer",
            FeaturePoint::LeftCheek => "left_cheek",
            FeaturePoint::RightCheek => "right_cheek",
        }
    }
}

impl fmt::Display for FeaturePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which eye
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EyeSide {
    Left,
    Right,
}

/// The six contour points of one eye
#[derive(Debug, Clone, Copy)]
pub struct EyeContour {
    pub outer: Point,
    pub inner: Point,
    pub upper_outer: Point,
    pub lower_outer: Point,
    pub upper_inner: Point,
    pub lower_inner: Point,
}

/// One detection cycle's keypoints. Every role is present and finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<FeaturePoint, Point>",
    into = "BTreeMap<FeaturePoint, Point>"
)]
pub struct LandmarkFrame {
    points: [Point; FeaturePoint::COUNT],
}

impl LandmarkFrame {
    /// Build a frame from named points; rejects missing roles and non-finite values
    pub fn from_points<I>(points: I) -> Result<Self, LandmarkError>
    where
        I: IntoIterator<Item = (FeaturePoint, Point)>,
    {
        let mut slots: [Option<Point>; FeaturePoint::COUNT] = [None; FeaturePoint::COUNT];
        for (role, point) in points {
            if !point.is_finite() {
                return Err(LandmarkError::NonFinite { point: role });
            }
            slots[role.index()] = Some(point);
        }

        let mut resolved = [Point::default(); FeaturePoint::COUNT];
        for role in FeaturePoint::ALL {
            resolved[role.index()] = slots[role.index()].ok_or(LandmarkError::MissingPoint(role))?;
        }

        Ok(Self { points: resolved })
    }

    /// Build a frame from a full MediaPipe face mesh (468 or 478 points)
    pub fn from_face_mesh(mesh: &[Point]) -> Result<Self, LandmarkError> {
        let expected = FeaturePoint::ALL
            .iter()
            .map(|role| role.mesh_index())
            .max()
            .unwrap_or(0)
            + 1;
        if mesh.len() < expected {
            return Err(LandmarkError::MeshTooShort {
                expected,
                actual: mesh.len(),
            });
        }

        Self::from_points(FeaturePoint::ALL.iter().map(|&role| (role, mesh[role.mesh_index()])))
    }

    pub fn get(&self, role: FeaturePoint) -> Point {
        self.points[role.index()]
    }

    /// Iterate `(role, point)` pairs in role order
    pub fn iter(&self) -> impl Iterator<Item = (FeaturePoint, Point)> + '_ {
        FeaturePoint::ALL.iter().map(move |&role| (role, self.get(role)))
    }

    pub fn eye(&self, side: EyeSide) -> EyeContour {
        use FeaturePoint::*;
        match side {
            EyeSide::Left => EyeContour {
                outer: self.get(LeftEyeOuter),
                inner: self.get(LeftEyeInner),
                upper_outer: self.get(LeftEyeUpperOuter),
                lower_outer: self.get(LeftEyeLowerOuter),
                upper_inner: self.get(LeftEyeUpperInner),
                lower_inner: self.get(LeftEyeLowerInner),
            },
            EyeSide::Right => EyeContour {
                outer: self.get(RightEyeOuter),
                inner: self.get(RightEyeInner),
                upper_outer: self.get(RightEyeUpperOuter),
                lower_outer: self.get(RightEyeLowerOuter),
                upper_inner: self.get(RightEyeUpperInner),
                lower_inner: self.get(RightEyeLowerInner),
            },
        }
    }
}

impl Index<FeaturePoint> for LandmarkFrame {
    type Output = Point;

    fn index(&self, role: FeaturePoint) -> &Point {
        &self.points[role.index()]
    }
}

impl TryFrom<BTreeMap<FeaturePoint, Point>> for LandmarkFrame {
    type Error = LandmarkError;

    fn try_from(map: BTreeMap<FeaturePoint, Point>) -> Result<Self, Self::Error> {
        Self::from_points(map)
    }
}

impl From<LandmarkFrame> for BTreeMap<FeaturePoint, Point> {
    fn from(frame: LandmarkFrame) -> Self {
        frame.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_set() -> Vec<(FeaturePoint, Point)> {
        FeaturePoint::ALL
            .iter()
            .enumerate()
            .map(|(i, &role)| (role, Point::new(i as f64, 2.0 * i as f64)))
            .collect()
    }

    #[test]
    fn test_all_roles_in_index_order() {
        for (i, role) in FeaturePoint::ALL.iter().enumerate() {
            assert_eq!(role.index(), i);
        }
    }

    #[test]
    fn test_from_points_complete() {
        let frame = LandmarkFrame::from_points(full_set()).unwrap();
        assert_eq!(frame.get(FeaturePoint::MouthTop), Point::new(14.0, 28.0));
        assert_eq!(frame[FeaturePoint::RightCheek].x, 21.0);
    }

    #[test]
    fn test_missing_point_rejected() {
        let points: Vec<_> = full_set()
            .into_iter()
            .filter(|(role, _)| *role != FeaturePoint::LeftBrowOuter)
            .collect();
        assert_eq!(
            LandmarkFrame::from_points(points),
            Err(LandmarkError::MissingPoint(FeaturePoint::LeftBrowOuter))
        );
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut points = full_set();
        points[3].1 = Point::new(f64::NAN, 1.0);
        assert_eq!(
            LandmarkFrame::from_points(points),
            Err(LandmarkError::NonFinite { point: FeaturePoint::LeftEyeInner })
        );
    }

    #[test]
    fn test_face_mesh_mapping() {
        let mesh: Vec<Point> = (0..468).map(|i| Point::new(i as f64, 0.0)).collect();
        let frame = LandmarkFrame::from_face_mesh(&mesh).unwrap();
        assert_eq!(frame.get(FeaturePoint::LeftEyeOuter).x, 33.0);
        assert_eq!(frame.get(FeaturePoint::RightCheek).x, 454.0);
        assert_eq!(frame.get(FeaturePoint::MouthRight).x, 291.0);
    }

    #[test]
    fn test_face_mesh_too_short() {
        let mesh = vec![Point::default(); 100];
        assert_eq!(
            LandmarkFrame::from_face_mesh(&mesh),
            Err(LandmarkError::MeshTooShort { expected: 455, actual: 100 })
        );
    }

    #[test]
    fn test_json_map_form() {
        let frame = LandmarkFrame::from_points(full_set()).unwrap();
        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.contains("\"mouth_left\""));

        let parsed: LandmarkFrame = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, frame);

        let incomplete = r#"{"mouth_left": {"x": 1.0, "y": 2.0}}"#;
        assert!(serde_json::from_str::<LandmarkFrame>(incomplete).is_err());
    }
}
