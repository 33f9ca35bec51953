//! Frame sources standing in for the camera and landmark model

use crate::MonitorError;
use affect::synthetic::FaceBuilder;
use affect::Detection;
use face_landmarks::{LandmarkFrame, Point};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use tracing::{info, warn};

/// Produces one detection per capture cycle
pub trait FrameSource {
    /// Next detection, `None` once the source is exhausted
    fn next_detection(&mut self) -> Option<Detection>;
}

/// One line of a replay file. A line with neither field is a no-face frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    /// Named feature points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmarks: Option<LandmarkFrame>,
    /// Raw face mesh in model index order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<Vec<Point>>,
}

impl DetectionRecord {
    fn into_detection(self) -> Result<Detection, face_landmarks::LandmarkError> {
        match (self.landmarks, self.mesh) {
            (Some(frame), _) => Ok(Detection::Face(frame)),
            (None, Some(mesh)) => LandmarkFrame::from_face_mesh(&mesh).map(Detection::Face),
            (None, None) => Ok(Detection::NoFace),
        }
    }
}

/// JSON-lines replay. Lines that fail to parse are skipped and counted.
pub struct ReplaySource<R> {
    lines: Lines<R>,
    line_no: u64,
    rejected: u64,
}

impl ReplaySource<BufReader<File>> {
    /// Opening failure is fatal for the session
    pub fn open(path: &Path) -> Result<Self, MonitorError> {
        let file = File::open(path).map_err(|source| MonitorError::SourceOpen {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Replay source opened");
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> ReplaySource<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            rejected: 0,
        }
    }

    pub fn rejected(&self) -> u64 {
        self.rejected
    }
}

impl<R: BufRead> FrameSource for ReplaySource<R> {
    fn next_detection(&mut self) -> Option<Detection> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, line = self.line_no + 1, "Replay read failed");
                    return None;
                }
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }

            let parsed = serde_json::from_str::<DetectionRecord>(&line)
                .map_err(|e| e.to_string())
                .and_then(|record| record.into_detection().map_err(|e| e.to_string()));
            match parsed {
                Ok(detection) => return Some(detection),
                Err(error) => {
                    self.rejected += 1;
                    warn!(line = self.line_no, %error, "Replay line rejected");
                }
            }
        }
    }
}

/// Scripted demo: attentive, smiling, dozing off, confused, out of frame
pub struct SyntheticSource {
    frame: u64,
    frames: u64,
}

impl SyntheticSource {
    /// Create a new source yielding `frames` scripted detections
    pub fn new(frames: u64) -> Self {
        Self { frame: 0, frames }
    }

    fn scripted(i: u64) -> Detection {
        let face = match i % 900 {
            // One closed-eye frame every ~3 s
            n @ 0..=299 if n % 100 == 99 => FaceBuilder::neutral().eyes_closed(),
            0..=299 => FaceBuilder::neutral(),
            300..=449 => FaceBuilder::neutral().smiling(),
            450..=599 => FaceBuilder::neutral().eyes_closed(),
            600..=749 => FaceBuilder::neutral().confused(),
            750..=779 => return Detection::NoFace,
            _ => FaceBuilder::neutral().surprised(),
        };
        Detection::Face(face.build())
    }
}

impl FrameSource for SyntheticSource {
    fn next_detection(&mut self) -> Option<Detection> {
        if self.frame >= self.frames {
            return None;
        }
        let detection = Self::scripted(self.frame);
        self.frame += 1;
        Some(detection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use affect::synthetic::neutral_face;
    use face_landmarks::FeaturePoint;
    use std::io::Cursor;

    fn mesh_from(frame: &LandmarkFrame) -> Vec<Point> {
        let mut mesh = vec![Point::default(); 468];
        for (role, point) in frame.iter() {
            mesh[role.mesh_index()] = point;
        }
        mesh
    }

    #[test]
    fn test_replay_parses_all_record_kinds() {
        let face = neutral_face();
        let lines = [
            serde_json::to_string(&DetectionRecord {
                landmarks: Some(face.clone()),
                mesh: None,
            })
            .unwrap(),
            "{}".to_string(),
            serde_json::to_string(&DetectionRecord {
                landmarks: None,
                mesh: Some(mesh_from(&face)),
            })
            .unwrap(),
        ];
        let mut source = ReplaySource::from_reader(Cursor::new(lines.join("\n")));

        assert_eq!(source.next_detection(), Some(Detection::Face(face.clone())));
        assert_eq!(source.next_detection(), Some(Detection::NoFace));
        assert_eq!(source.next_detection(), Some(Detection::Face(face)));
        assert_eq!(source.next_detection(), None);
        assert_eq!(source.rejected(), 0);
    }

    #[test]
    fn test_replay_skips_bad_lines() {
        let good = serde_json::to_string(&DetectionRecord {
            landmarks: Some(neutral_face()),
            mesh: None,
        })
        .unwrap();
        let missing_point = {
            let mut value = serde_json::to_value(&DetectionRecord {
                landmarks: Some(neutral_face()),
                mesh: None,
            })
            .unwrap();
            value["landmarks"]
                .as_object_mut()
                .unwrap()
                .remove(FeaturePoint::MouthTop.as_str());
            value.to_string()
        };
        let input = format!("not json\n{missing_point}\n\n{{\"mesh\": []}}\n{good}\n");
        let mut source = ReplaySource::from_reader(Cursor::new(input));

        assert!(source.next_detection().unwrap().is_face());
        assert_eq!(source.rejected(), 3);
        assert_eq!(source.next_detection(), None);
    }

    #[test]
    fn test_open_missing_file_is_fatal() {
        let result = ReplaySource::open(Path::new("/nonexistent/edugaze/replay.jsonl"));
        assert!(matches!(result, Err(MonitorError::SourceOpen { .. })));
    }

    #[test]
    fn test_synthetic_source_is_finite() {
        let mut source = SyntheticSource::new(800);
        let detections: Vec<_> = std::iter::from_fn(|| source.next_detection()).collect();
        assert_eq!(detections.len(), 800);
        assert!(detections[..750].iter().all(Detection::is_face));
        assert_eq!(detections[760], Detection::NoFace);
    }
}
