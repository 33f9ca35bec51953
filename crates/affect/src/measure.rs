//! Per-frame facial geometry

use face_landmarks::{ratio, EyeContour, EyeSide, FeaturePoint, LandmarkFrame};
use serde::{Deserialize, Serialize};

/// Scale-normalized measurements taken from one landmark frame.
///
/// Each field is `None` when the reference segment it divides by is
/// degenerate, so one corrupt segment only knocks out the metrics built on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceMeasurements {
    /// Left eye aspect ratio
    pub left_ear: Option<f64>,
    /// Right eye aspect ratio
    pub right_ear: Option<f64>,
    /// Mean of both eyes (needs both)
    pub ear: Option<f64>,
    /// Cheek-to-cheek distance in image units
    pub face_width: Option<f64>,
    /// Mouth height / mouth width
    pub mouth_openness: Option<f64>,
    /// Mouth width / face width
    pub mouth_width: Option<f64>,
    /// Corner height above mouth center / face width (negative = frown)
    pub corner_lift: Option<f64>,
    /// Vertical corner mismatch / face width
    pub corner_asymmetry: Option<f64>,
    /// Brow-to-upper-lid distance / face width
    pub brow_distance: Option<f64>,
    /// Eye-center to eye-center distance / face width
    pub eye_distance: Option<f64>,
}

impl FaceMeasurements {
    pub fn from_landmarks(frame: &LandmarkFrame) -> Self {
        use FeaturePoint::*;

        let left_ear = eye_aspect_ratio(&frame.eye(EyeSide::Left));
        let right_ear = eye_aspect_ratio(&frame.eye(EyeSide::Right));
        let ear = match (left_ear, right_ear) {
            (Some(l), Some(r)) => Some((l + r) / 2.0),
            _ => None,
        };

        let face_width = frame[LeftCheek].distance(&frame[RightCheek]);
        let per_face = |value: f64| ratio(value, face_width);

        let (mouth_left, mouth_right) = (frame[MouthLeft], frame[MouthRight]);
        let (mouth_top, mouth_bottom) = (frame[MouthTop], frame[MouthBottom]);
        let mouth_width = mouth_left.distance(&mouth_right);
        let mouth_height = mouth_top.distance(&mouth_bottom);

        // Image y grows downward, so a lifted corner sits above the center
        let center_y = (mouth_top.y + mouth_bottom.y) / 2.0;
        let lift = ((center_y - mouth_left.y) + (center_y - mouth_right.y)) / 2.0;
        let asymmetry = (mouth_left.y - mouth_right.y).abs();

        let brow = |inner: FeaturePoint, outer: FeaturePoint, eye: &EyeContour| {
            let brow_mid = frame[inner].midpoint(&frame[outer]);
            let lid_mid = eye.upper_inner.midpoint(&eye.upper_outer);
            brow_mid.distance(&lid_mid)
        };
        let left_eye = frame.eye(EyeSide::Left);
        let right_eye = frame.eye(EyeSide::Right);
        let brow_gap = (brow(LeftBrowInner, LeftBrowOuter, &left_eye)
            + brow(RightBrowInner, RightBrowOuter, &right_eye))
            / 2.0;

        let left_center = left_eye.outer.midpoint(&left_eye.inner);
        let right_center = right_eye.outer.midpoint(&right_eye.inner);

        Self {
            left_ear,
            right_ear,
            ear,
            face_width: (face_width >= face_landmarks::MIN_SEGMENT).then_some(face_width),
            mouth_openness: ratio(mouth_height, mouth_width),
            mouth_width: per_face(mouth_width),
            corner_lift: per_face(lift),
            corner_asymmetry: per_face(asymmetry),
            brow_distance: per_face(brow_gap),
            eye_distance: per_face(left_center.distance(&right_center)),
        }
    }
}

/// `(v1 + v2) / (2 * h)` for one eye
pub fn eye_aspect_ratio(eye: &EyeContour) -> Option<f64> {
    let v1 = eye.upper_outer.distance(&eye.lower_outer);
    let v2 = eye.upper_inner.distance(&eye.lower_inner);
    let h = eye.outer.distance(&eye.inner);
    ratio(v1 + v2, 2.0 * h)
}
