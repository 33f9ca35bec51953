//! Synthetic faces
//!
//! Builds landmark frames with known geometry. Used by the demo frame source,
//! the benches and the tests.

use face_landmarks::{FeaturePoint, LandmarkFrame, Point};

/// Reference face width in image units before scaling
const FACE_WIDTH: f64 = 200.0;
const EYE_Y: f64 = 80.0;
const EYE_HALF_WIDTH: f64 = 20.0;
const MOUTH_Y: f64 = 150.0;
/// Parameters are clamped to this magnitude so every coordinate stays finite
const MAX_PARAM: f64 = 1.0e6;

/// Non-finite values fall back to the neutral face's value
fn finite_or(value: f64, neutral: f64) -> f64 {
    if value.is_finite() {
        value.clamp(-MAX_PARAM, MAX_PARAM)
    } else {
        neutral
    }
}

/// Parametric face. Ratios are relative to face width unless noted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceBuilder {
    /// Eye aspect ratio of both eyes
    pub ear: f64,
    pub mouth_width: f64,
    /// Mouth height / mouth width
    pub mouth_openness: f64,
    pub corner_lift: f64,
    pub corner_asymmetry: f64,
    pub brow_distance: f64,
    /// Overall image scale (distance from the camera)
    pub scale: f64,
    /// Horizontal shift in image units
    pub offset_x: f64,
    collapsed_cheeks: bool,
}

impl Default for FaceBuilder {
    fn default() -> Self {
        Self::neutral()
    }
}

impl FaceBuilder {
    /// Relaxed, eyes open, mouth closed
    pub fn neutral() -> Self {
        Self {
            ear: 0.3,
            mouth_width: 0.35,
            mouth_openness: 0.1,
            corner_lift: 0.0,
            corner_asymmetry: 0.0,
            brow_distance: 0.07,
            scale: 1.0,
            offset_x: 0.0,
            collapsed_cheeks: false,
        }
    }

    pub fn ear(mut self, ear: f64) -> Self {
        self.ear = ear;
        self
    }

    pub fn mouth_width(mut self, ratio: f64) -> Self {
        self.mouth_width = ratio;
        self
    }

    pub fn mouth_openness(mut self, ratio: f64) -> Self {
        self.mouth_openness = ratio;
        self
    }

    pub fn corner_lift(mut self, ratio: f64) -> Self {
        self.corner_lift = ratio;
        self
    }

    pub fn corner_asymmetry(mut self, ratio: f64) -> Self {
        self.corner_asymmetry = ratio;
        self
    }

    pub fn brow_distance(mut self, ratio: f64) -> Self {
        self.brow_distance = ratio;
        self
    }

    pub fn scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn offset_x(mut self, offset: f64) -> Self {
        self.offset_x = offset;
        self
    }

    /// Both cheek points on top of each other (zero face width)
    pub fn collapsed_cheeks(mut self) -> Self {
        self.collapsed_cheeks = true;
        self
    }

    /// Broad smile: lifted, widened corners
    pub fn smiling(self) -> Self {
        self.corner_lift(0.03).mouth_width(0.46)
    }

    /// Wide eyes and a dropped jaw
    pub fn surprised(self) -> Self {
        self.ear(0.4).mouth_openness(0.7)
    }

    /// Lowered brows and a lopsided frown
    pub fn confused(self) -> Self {
        self.brow_distance(0.05).corner_lift(-0.015).corner_asymmetry(0.02)
    }

    pub fn eyes_closed(self) -> Self {
        self.ear(0.05)
    }

    /// Parameters with every value finite and bounded
    fn sanitized(&self) -> Self {
        let neutral = Self::neutral();
        Self {
            ear: finite_or(self.ear, neutral.ear),
            mouth_width: finite_or(self.mouth_width, neutral.mouth_width),
            mouth_openness: finite_or(self.mouth_openness, neutral.mouth_openness),
            corner_lift: finite_or(self.corner_lift, neutral.corner_lift),
            corner_asymmetry: finite_or(self.corner_asymmetry, neutral.corner_asymmetry),
            brow_distance: finite_or(self.brow_distance, neutral.brow_distance),
            scale: finite_or(self.scale, neutral.scale),
            offset_x: finite_or(self.offset_x, neutral.offset_x),
            collapsed_cheeks: self.collapsed_cheeks,
        }
    }

    /// Lay out the face. Non-finite parameters are replaced by neutral ones.
    pub fn build(&self) -> LandmarkFrame {
        use FeaturePoint::*;

        let face = self.sanitized();
        let w = FACE_WIDTH;
        let lid = face.ear * EYE_HALF_WIDTH;
        let brow_y = EYE_Y - lid - face.brow_distance * w;

        let mouth_half = face.mouth_width * w / 2.0;
        let mouth_half_height = face.mouth_openness * face.mouth_width * w / 2.0;
        let corner_y = MOUTH_Y - face.corner_lift * w;
        let skew = face.corner_asymmetry * w / 2.0;

        let (left_cheek, right_cheek) = if face.collapsed_cheeks {
            ((w / 2.0, 100.0), (w / 2.0, 100.0))
        } else {
            ((0.0, 100.0), (w, 100.0))
        };

        let raw = [
            (LeftEyeOuter, (40.0, EYE_Y)),
            (LeftEyeInner, (80.0, EYE_Y)),
            (LeftEyeUpperOuter, (53.0, EYE_Y - lid)),
            (LeftEyeLowerOuter, (53.0, EYE_Y + lid)),
            (LeftEyeUpperInner, (67.0, EYE_Y - lid)),
            (LeftEyeLowerInner, (67.0, EYE_Y + lid)),
            (RightEyeInner, (120.0, EYE_Y)),
            (RightEyeOuter, (160.0, EYE_Y)),
            (RightEyeUpperInner, (133.0, EYE_Y - lid)),
            (RightEyeLowerInner, (133.0, EYE_Y + lid)),
            (RightEyeUpperOuter, (147.0, EYE_Y - lid)),
            (RightEyeLowerOuter, (147.0, EYE_Y + lid)),
            (MouthLeft, (w / 2.0 - mouth_half, corner_y - skew)),
            (MouthRight, (w / 2.0 + mouth_half, corner_y + skew)),
            (MouthTop, (w / 2.0, MOUTH_Y - mouth_half_height)),
            (MouthBottom, (w / 2.0, MOUTH_Y + mouth_half_height)),
            (LeftBrowInner, (75.0, brow_y)),
            (LeftBrowOuter, (45.0, brow_y)),
            (RightBrowInner, (125.0, brow_y)),
            (RightBrowOuter, (155.0, brow_y)),
            (LeftCheek, left_cheek),
            (RightCheek, right_cheek),
        ];

        let points = raw.into_iter().map(|(role, (x, y))| {
            (role, Point::new(x * face.scale + face.offset_x, y * face.scale))
        });

        match LandmarkFrame::from_points(points) {
            Ok(frame) => frame,
            // Every role is listed above and bounded parameters keep coordinates finite
            Err(e) => unreachable!("synthetic face is always complete: {e}"),
        }
    }
}

pub fn neutral_face() -> LandmarkFrame {
    FaceBuilder::neutral().build()
}
