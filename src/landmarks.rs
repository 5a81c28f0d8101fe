// Landmark adapter. Like segmentation this is a trait seam: the pipeline asks
// for 0..max_faces normalized landmark sets per frame and does not care who
// produced them. The built-in detector is a cheap skin-region estimator that
// yields an oval of synthetic keypoints around the dominant skin patch; a
// real face-mesh model slots in behind the same trait.

use crate::error::Error;
use crate::types::{FrameBuffer, LandmarkSet};

/// Fraction of frame pixels that must look like skin before we report a face,
/// at the default 0.5 detection confidence. Scales with the configured value.
const BASE_COVERAGE: f32 = 0.004;

/// Sampling stride while scanning the frame. Landmark precision does not need
/// every pixel and this quarters the work.
const SCAN_STRIDE: usize = 2;

/// Detector tuning, mirroring the knobs a hosted face-mesh model exposes.
#[derive(Clone, Copy, Debug)]
pub struct DetectorConfig {
    /// Hard cap on returned landmark sets; extra detections are discarded,
    /// never queued. Typical values are 1 (single user) or 10 (group shot).
    pub max_faces: usize,
    pub min_detection_confidence: f32,
    /// Emit a denser keypoint oval when set.
    pub refine_landmarks: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self { max_faces: 1, min_detection_confidence: 0.5, refine_landmarks: true }
    }
}

pub trait LandmarkDetector {
    /// False while the capability is still loading. The render loop skips
    /// overlay work until the detector reports ready.
    fn is_ready(&self) -> bool {
        true
    }

    /// Detect faces in `frame`. Never returns more than the configured
    /// maximum number of landmark sets.
    fn detect(&mut self, frame: &FrameBuffer) -> Result<Vec<LandmarkSet>, Error>;
}

/// Detector that never finds anything. Used when face decoration is
/// deliberately disabled and as a stand-in while a real model loads.
pub struct NullDetector;

impl LandmarkDetector for NullDetector {
    fn detect(&mut self, _frame: &FrameBuffer) -> Result<Vec<LandmarkSet>, Error> {
        Ok(Vec::new())
    }
}

pub struct SkinRegionDetector {
    config: DetectorConfig,
}

impl SkinRegionDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }
}

impl LandmarkDetector for SkinRegionDetector {
    fn detect(&mut self, frame: &FrameBuffer) -> Result<Vec<LandmarkSet>, Error> {
        if self.config.max_faces == 0 || frame.width == 0 || frame.height == 0 {
            return Ok(Vec::new());
        }

        // 1) Collect candidate skin pixels on a coarse grid.
        let mut xs: Vec<u32> = Vec::new();
        let mut ys: Vec<u32> = Vec::new();
        for y in (0..frame.height).step_by(SCAN_STRIDE) {
            let row = y * frame.width;
            for x in (0..frame.width).step_by(SCAN_STRIDE) {
                if looks_like_skin(frame.pixels[row + x]) {
                    xs.push(x as u32);
                    ys.push(y as u32);
                }
            }
        }

        // 2) Coverage check doubles as the detection-confidence gate.
        let sampled = (frame.width / SCAN_STRIDE).max(1) * (frame.height / SCAN_STRIDE).max(1);
        let coverage = xs.len() as f32 / sampled as f32;
        let needed = BASE_COVERAGE * (self.config.min_detection_confidence / 0.5);
        if coverage < needed {
            return Ok(Vec::new()); // no face this frame; not an error
        }

        // 3) Percentile-trim the point cloud so a stray arm or highlight
        //    doesn't stretch the box across the frame.
        xs.sort_unstable();
        ys.sort_unstable();
        let lo = |v: &[u32]| v[(v.len() - 1) * 2 / 100] as f32;
        let hi = |v: &[u32]| v[(v.len() - 1) * 98 / 100] as f32;
        let (min_x, max_x) = (lo(&xs), hi(&xs));
        let (min_y, max_y) = (lo(&ys), hi(&ys));
        if max_x <= min_x || max_y <= min_y {
            return Ok(Vec::new());
        }

        // 4) Synthesize an oval of normalized keypoints spanning the region.
        let w = frame.width as f32;
        let h = frame.height as f32;
        let cx = (min_x + max_x) * 0.5 / w;
        let cy = (min_y + max_y) * 0.5 / h;
        let rx = (max_x - min_x) * 0.5 / w;
        let ry = (max_y - min_y) * 0.5 / h;
        let count = if self.config.refine_landmarks { 24 } else { 16 };

        let mut points = Vec::with_capacity(count);
        for i in 0..count {
            let t = (i as f32 / count as f32) * std::f32::consts::TAU;
            let px = (cx + rx * t.cos()).clamp(0.0, 1.0);
            let py = (cy + ry * t.sin()).clamp(0.0, 1.0);
            points.push((px, py));
        }

        let mut sets = vec![LandmarkSet { points }];
        sets.truncate(self.config.max_faces);
        Ok(sets)
    }
}

/// Classic RGB skin-tone rule: warm, red-dominant, not too dark.
#[inline]
fn looks_like_skin(px: u32) -> bool {
    let r = ((px >> 16) & 0xFF) as i32;
    let g = ((px >> 8) & 0xFF) as i32;
    let b = (px & 0xFF) as i32;
    r > 95 && g > 40 && b > 20 && r > g && r > b && (r - g) > 15 && (r.max(g).max(b) - r.min(g).min(b)) > 15
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::face_bounding_box;

    const SKIN: u32 = 0x00_D0_90_70;
    const DARK: u32 = 0x00_10_10_18;

    fn frame_with_skin_patch(w: usize, h: usize, x0: usize, y0: usize, pw: usize, ph: usize) -> FrameBuffer {
        let mut f = FrameBuffer::filled(w, h, DARK);
        for y in y0..(y0 + ph) {
            for x in x0..(x0 + pw) {
                f.pixels[y * w + x] = SKIN;
            }
        }
        f
    }

    #[test]
    fn dark_frame_has_no_detection() {
        let mut det = SkinRegionDetector::new(DetectorConfig::default());
        let frame = FrameBuffer::filled(64, 48, DARK);
        assert!(det.detect(&frame).unwrap().is_empty());
    }

    #[test]
    fn skin_patch_yields_one_normalized_landmark_set() {
        let mut det = SkinRegionDetector::new(DetectorConfig::default());
        let frame = frame_with_skin_patch(160, 120, 40, 30, 60, 50);
        let sets = det.detect(&frame).unwrap();
        assert_eq!(sets.len(), 1);
        for &(x, y) in &sets[0].points {
            assert!((0.0..=1.0).contains(&x) && (0.0..=1.0).contains(&y));
        }
    }

    #[test]
    fn detected_box_roughly_matches_the_patch() {
        let mut det = SkinRegionDetector::new(DetectorConfig::default());
        let frame = frame_with_skin_patch(160, 120, 40, 30, 60, 50);
        let sets = det.detect(&frame).unwrap();
        let b = face_bounding_box(&sets[0], 160, 120).unwrap();
        // Oval keypoints span the trimmed region; allow slack for stride and
        // percentile trimming.
        assert!((b.min_x - 40.0).abs() < 10.0, "min_x = {}", b.min_x);
        assert!((b.max_x - 100.0).abs() < 10.0, "max_x = {}", b.max_x);
        assert!((b.min_y - 30.0).abs() < 10.0, "min_y = {}", b.min_y);
        assert!((b.max_y - 80.0).abs() < 10.0, "max_y = {}", b.max_y);
    }

    #[test]
    fn max_faces_zero_discards_all_detections() {
        let config = DetectorConfig { max_faces: 0, ..DetectorConfig::default() };
        let mut det = SkinRegionDetector::new(config);
        let frame = frame_with_skin_patch(160, 120, 40, 30, 60, 50);
        assert!(det.detect(&frame).unwrap().is_empty());
    }

    #[test]
    fn refine_flag_controls_keypoint_density() {
        let coarse = DetectorConfig { refine_landmarks: false, ..DetectorConfig::default() };
        let fine = DetectorConfig { refine_landmarks: true, ..DetectorConfig::default() };
        let frame = frame_with_skin_patch(160, 120, 40, 30, 60, 50);
        let a = SkinRegionDetector::new(coarse).detect(&frame).unwrap();
        let b = SkinRegionDetector::new(fine).detect(&frame).unwrap();
        assert_eq!(a[0].points.len(), 16);
        assert_eq!(b[0].points.len(), 24);
    }

    #[test]
    fn null_detector_never_detects() {
        let frame = frame_with_skin_patch(160, 120, 40, 30, 60, 50);
        assert!(NullDetector.detect(&frame).unwrap().is_empty());
    }
}
