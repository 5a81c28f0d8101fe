// Segmentation adapter. The pipeline only sees the `Segmenter` trait and
// treats it as an opaque capability: not ready means no background
// replacement this iteration, never an error that stops the loop.
//
// The built-in implementation is median background subtraction: record N
// frames of the empty scene, build a per-pixel median reference, then label
// any pixel that moved far enough from the reference as person. An external
// model can be dropped in behind the same trait.

use crate::error::Error;
use crate::types::{FrameBuffer, SegMask};

/// Frames recorded for calibration (~1-2 seconds at 30 FPS).
pub const CALIBRATION_FRAME_COUNT: usize = 35;

/// Sum of absolute per-channel differences above which a pixel counts as
/// person. Tuned by eye against indoor webcam noise.
pub const DEFAULT_DIFF_THRESHOLD: u32 = 60;

pub trait Segmenter {
    /// False while the capability is still loading/calibrating. The render
    /// loop falls back to drawing the frame unmodified until this is true.
    fn is_ready(&self) -> bool;

    /// Classify every pixel of `frame`. Only called when `is_ready()`.
    fn segment(&mut self, frame: &FrameBuffer) -> Result<SegMask, Error>;
}

/// Calibration progress for HUD display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CalibrationState {
    Collecting { have: usize, want: usize },
    Ready,
}

pub struct BackgroundSubtractionSegmenter {
    reference: Option<FrameBuffer>, // per-pixel median of the empty scene
    pending: Vec<FrameBuffer>,      // frames collected during calibration
    threshold: u32,
}

impl BackgroundSubtractionSegmenter {
    pub fn new() -> Self {
        Self { reference: None, pending: Vec::new(), threshold: DEFAULT_DIFF_THRESHOLD }
    }

    /// Drop the reference and start collecting calibration frames again.
    /// Bound to a key so the user can step out of frame and recalibrate.
    pub fn begin_calibration(&mut self) {
        self.reference = None;
        self.pending.clear();
        log::info!("segmenter: calibration started, stay out of frame");
    }

    /// Feed one frame while calibrating. No-op once the reference exists.
    pub fn observe(&mut self, frame: &FrameBuffer) -> Result<(), Error> {
        if self.reference.is_some() {
            return Ok(());
        }
        if let Some(first) = self.pending.first() {
            if first.width != frame.width || first.height != frame.height {
                // Resolution changed mid-calibration; start over.
                self.pending.clear();
            }
        }
        self.pending.push(frame.clone());
        if self.pending.len() >= CALIBRATION_FRAME_COUNT {
            let reference = median_reference(&self.pending)?;
            self.pending.clear();
            log::info!("segmenter: reference built, background replacement live");
            self.reference = Some(reference);
        }
        Ok(())
    }

    pub fn state(&self) -> CalibrationState {
        if self.reference.is_some() {
            CalibrationState::Ready
        } else {
            CalibrationState::Collecting { have: self.pending.len(), want: CALIBRATION_FRAME_COUNT }
        }
    }
}

impl Segmenter for BackgroundSubtractionSegmenter {
    fn is_ready(&self) -> bool {
        self.reference.is_some()
    }

    fn segment(&mut self, frame: &FrameBuffer) -> Result<SegMask, Error> {
        let reference = self
            .reference
            .as_ref()
            .ok_or_else(|| Error::Segmentation("segment called before calibration".into()))?;
        if reference.width != frame.width || reference.height != frame.height {
            return Err(Error::Segmentation("frame size differs from reference".into()));
        }

        let mut mask = SegMask::new(frame.width, frame.height);
        for i in 0..frame.len() {
            let a = frame.pixels[i];
            let b = reference.pixels[i];
            let dr = ((a >> 16) & 0xFF).abs_diff((b >> 16) & 0xFF);
            let dg = ((a >> 8) & 0xFF).abs_diff((b >> 8) & 0xFF);
            let db = (a & 0xFF).abs_diff(b & 0xFF);
            mask.person[i] = dr + dg + db > self.threshold;
        }
        Ok(mask)
    }
}

/// Per-pixel, per-channel median across the calibration frames. Moving
/// objects that crossed the scene during calibration drop out of the result.
fn median_reference(frames: &[FrameBuffer]) -> Result<FrameBuffer, Error> {
    if frames.is_empty() {
        return Err(Error::Segmentation("median reference: no frames".into()));
    }
    let w = frames[0].width;
    let h = frames[0].height;
    for f in frames {
        if f.width != w || f.height != h {
            return Err(Error::Segmentation("median reference: mixed frame sizes".into()));
        }
    }

    let k = frames.len();
    let mut rbuf = vec![0u8; k];
    let mut gbuf = vec![0u8; k];
    let mut bbuf = vec![0u8; k];
    let mut out = Vec::with_capacity(w * h);

    for idx in 0..(w * h) {
        for (i, f) in frames.iter().enumerate() {
            let px = f.pixels[idx];
            rbuf[i] = ((px >> 16) & 0xFF) as u8;
            gbuf[i] = ((px >> 8) & 0xFF) as u8;
            bbuf[i] = (px & 0xFF) as u8;
        }
        // k is small (~35); sorting three tiny buffers per pixel is fine.
        rbuf.sort_unstable();
        gbuf.sort_unstable();
        bbuf.sort_unstable();
        let mid = k / 2;
        out.push(((rbuf[mid] as u32) << 16) | ((gbuf[mid] as u32) << 8) | (bbuf[mid] as u32));
    }

    Ok(FrameBuffer { width: w, height: h, pixels: out })
}

/// Nearest-neighbor rescale of a mask, used when the output surface size
/// differs from the camera's native resolution (window resized).
pub fn scale_mask_nearest(src: &SegMask, dst_w: usize, dst_h: usize) -> SegMask {
    if src.width == dst_w && src.height == dst_h {
        return SegMask { width: src.width, height: src.height, person: src.person.clone() };
    }
    let mut dst = SegMask::new(dst_w, dst_h);
    if src.width == 0 || src.height == 0 || dst_w == 0 || dst_h == 0 {
        return dst;
    }
    for y in 0..dst_h {
        let sy = y * src.height / dst_h;
        for x in 0..dst_w {
            let sx = x * src.width / dst_w;
            dst.person[y * dst_w + x] = src.person[sy * src.width + sx];
        }
    }
    dst
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: usize, h: usize, color: u32) -> FrameBuffer {
        FrameBuffer::filled(w, h, color)
    }

    #[test]
    fn not_ready_until_enough_frames_observed() {
        let mut seg = BackgroundSubtractionSegmenter::new();
        let frame = solid(8, 8, 0x00_40_40_40);
        for i in 0..CALIBRATION_FRAME_COUNT {
            assert!(!seg.is_ready(), "ready too early at frame {i}");
            seg.observe(&frame).unwrap();
        }
        assert!(seg.is_ready());
        assert_eq!(seg.state(), CalibrationState::Ready);
    }

    #[test]
    fn median_rejects_transient_foreground() {
        // Mostly gray scene, with a few bright outlier frames mixed in.
        let mut frames = vec![solid(4, 4, 0x00_40_40_40); 9];
        frames[2] = solid(4, 4, 0x00_FF_FF_FF);
        frames[6] = solid(4, 4, 0x00_FF_FF_FF);
        let reference = median_reference(&frames).unwrap();
        assert!(reference.pixels.iter().all(|&p| p == 0x00_40_40_40));
    }

    #[test]
    fn changed_pixels_label_as_person() {
        let mut seg = BackgroundSubtractionSegmenter::new();
        let empty = solid(8, 8, 0x00_40_40_40);
        for _ in 0..CALIBRATION_FRAME_COUNT {
            seg.observe(&empty).unwrap();
        }

        // Person walks in: left half turns bright.
        let mut live = empty.clone();
        for y in 0..8 {
            for x in 0..4 {
                live.pixels[y * 8 + x] = 0x00_E0_C0_A0;
            }
        }
        let mask = seg.segment(&live).unwrap();
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(mask.person[y * 8 + x], x < 4, "({x},{y})");
            }
        }
    }

    #[test]
    fn segment_before_ready_is_an_error() {
        let mut seg = BackgroundSubtractionSegmenter::new();
        let frame = solid(4, 4, 0);
        assert!(seg.segment(&frame).is_err());
    }

    #[test]
    fn recalibration_clears_readiness() {
        let mut seg = BackgroundSubtractionSegmenter::new();
        let frame = solid(4, 4, 0x00_10_10_10);
        for _ in 0..CALIBRATION_FRAME_COUNT {
            seg.observe(&frame).unwrap();
        }
        assert!(seg.is_ready());
        seg.begin_calibration();
        assert!(!seg.is_ready());
    }

    #[test]
    fn mask_scaling_preserves_halves() {
        let mut m = SegMask::new(4, 4);
        for y in 0..4 {
            for x in 0..4 {
                m.person[y * 4 + x] = x < 2;
            }
        }
        let scaled = scale_mask_nearest(&m, 8, 8);
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(scaled.person[y * 8 + x], x < 4, "({x},{y})");
            }
        }
    }
}
