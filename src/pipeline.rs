// One render iteration, pulled out of main so the whole composite path is
// testable without a camera or a window. The loop body is stable: readiness
// is a state checked at the top of each iteration, never a swap of the loop
// function itself, and each adapter has an explicit request-pending guard so
// only one inference of each kind can ever be in flight.

use std::path::Path;

use crate::background::BackgroundStore;
use crate::compose::{compose, scale_nearest};
use crate::error::Error;
use crate::gamma::GammaLut;
use crate::landmarks::LandmarkDetector;
use crate::overlay;
use crate::segment::{Segmenter, scale_mask_nearest};
use crate::types::{BackgroundKind, FrameBuffer, Selection};

/// Hard upper bound on faces decorated per iteration, whatever the detector
/// claims. Detections beyond it are discarded, not queued.
pub const MAX_FACES_LIMIT: usize = 10;

pub struct RenderPipeline {
    lut: GammaLut,
    backgrounds: BackgroundStore,
    output: FrameBuffer,
    bg_scratch: FrameBuffer,
    // Single-in-flight guards. The adapters here resolve synchronously, but
    // the guard keeps the invariant structural for a model with real
    // concurrency: a second request of the same kind is never issued while
    // one is pending.
    seg_pending: bool,
    landmark_pending: bool,
    faces_this_iteration: usize,
}

impl RenderPipeline {
    pub fn new(width: usize, height: usize, backgrounds: BackgroundStore) -> Self {
        Self {
            lut: GammaLut::new(),
            backgrounds,
            output: FrameBuffer::new(width, height),
            bg_scratch: FrameBuffer::new(width, height),
            seg_pending: false,
            landmark_pending: false,
            faces_this_iteration: 0,
        }
    }

    /// Run one iteration: segmentation + landmarks on the native frame,
    /// background + composite + overlays at the output size. Per-iteration
    /// failures degrade (identity composite, no overlays) and never abort.
    pub fn run_iteration(
        &mut self,
        frame: &FrameBuffer,
        selection: Selection,
        segmenter: &mut dyn Segmenter,
        detector: &mut dyn LandmarkDetector,
        out_width: usize,
        out_height: usize,
    ) -> Result<(), Error> {
        // Window resized: new output surface; everything derived from the old
        // dimensions is recomputed below, nothing is cached.
        if self.output.width != out_width || self.output.height != out_height {
            self.output = FrameBuffer::new(out_width, out_height);
            self.bg_scratch = FrameBuffer::new(out_width, out_height);
        }

        // Adapters run at the camera's native resolution; results are scaled
        // to the output surface along with the frame.
        let mask = if selection.background != BackgroundKind::None
            && segmenter.is_ready()
            && !self.seg_pending
        {
            self.seg_pending = true;
            let result = segmenter.segment(frame);
            self.seg_pending = false;
            match result {
                Ok(m) => Some(scale_mask_nearest(&m, out_width, out_height)),
                Err(e) => {
                    // Capability hiccup: draw the frame unmodified this turn.
                    log::warn!("segmentation failed, compositing without mask: {e}");
                    None
                }
            }
        } else {
            None
        };

        let mut faces = if detector.is_ready() && !self.landmark_pending {
            self.landmark_pending = true;
            let result = detector.detect(frame);
            self.landmark_pending = false;
            match result {
                Ok(sets) => sets,
                Err(e) => {
                    log::warn!("landmark detection failed, skipping overlays: {e}");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };
        faces.truncate(MAX_FACES_LIMIT);
        self.faces_this_iteration = faces.len();

        let scaled = scale_nearest(frame, out_width, out_height);

        // Background + composite. No mask (or background off) means identity.
        match &mask {
            Some(m) => {
                self.backgrounds.draw(selection.background, &mut self.bg_scratch);
                compose(&scaled, &self.bg_scratch, Some(m), &mut self.output)?;
            }
            None => compose(&scaled, &self.bg_scratch, None, &mut self.output)?,
        }

        // Overlays, one per detected face, then the sticker on the very top.
        for set in &faces {
            overlay::render(&mut self.output, &scaled, set, &selection, &self.lut);
        }
        if selection.sticker {
            overlay::render_sticker(&mut self.output);
        }

        Ok(())
    }

    /// The composited surface from the latest iteration.
    pub fn output(&self) -> &FrameBuffer {
        &self.output
    }

    /// Mutable access for HUD/banner text drawn after compositing.
    pub fn output_mut(&mut self) -> &mut FrameBuffer {
        &mut self.output
    }

    pub fn last_face_count(&self) -> usize {
        self.faces_this_iteration
    }

    /// Export the current output surface as a PNG. This is the whole capture
    /// path the core owes the outside world; uploading/mailing the file is
    /// someone else's job.
    pub fn export_png(&self, path: &Path) -> Result<(), Error> {
        let w = self.output.width as u32;
        let h = self.output.height as u32;
        let mut img = image::RgbImage::new(w, h);
        for (i, px) in self.output.pixels.iter().enumerate() {
            let x = (i % self.output.width) as u32;
            let y = (i / self.output.width) as u32;
            img.put_pixel(
                x,
                y,
                image::Rgb([((px >> 16) & 0xFF) as u8, ((px >> 8) & 0xFF) as u8, (px & 0xFF) as u8]),
            );
        }
        img.save(path).map_err(|e| Error::Snapshot(format!("save {}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::NullDetector;
    use crate::types::{LandmarkSet, OverlayKind, SegMask};

    const RED: u32 = 0x00_FF_00_00;

    /// Segmenter with a fixed answer, standing in for an external model.
    struct FixedSegmenter {
        ready: bool,
        person: bool,
    }

    impl Segmenter for FixedSegmenter {
        fn is_ready(&self) -> bool {
            self.ready
        }
        fn segment(&mut self, frame: &FrameBuffer) -> Result<SegMask, Error> {
            Ok(SegMask::uniform(frame.width, frame.height, self.person))
        }
    }

    struct FailingSegmenter;

    impl Segmenter for FailingSegmenter {
        fn is_ready(&self) -> bool {
            true
        }
        fn segment(&mut self, _frame: &FrameBuffer) -> Result<SegMask, Error> {
            Err(Error::Segmentation("model exploded".into()))
        }
    }

    struct ManyFacesDetector(usize);

    impl LandmarkDetector for ManyFacesDetector {
        fn detect(&mut self, _frame: &FrameBuffer) -> Result<Vec<LandmarkSet>, Error> {
            Ok(vec![LandmarkSet { points: vec![(0.4, 0.4), (0.6, 0.6)] }; self.0])
        }
    }

    fn no_overlay_selection(background: BackgroundKind) -> Selection {
        Selection { overlay: OverlayKind::None, background, ..Selection::default() }
    }

    fn pipeline(w: usize, h: usize) -> RenderPipeline {
        RenderPipeline::new(w, h, BackgroundStore::with_seed(7))
    }

    #[test]
    fn all_person_mask_passes_the_frame_through() {
        let mut p = pipeline(16, 12);
        let frame = FrameBuffer::filled(16, 12, RED);
        let mut seg = FixedSegmenter { ready: true, person: true };
        p.run_iteration(&frame, no_overlay_selection(BackgroundKind::Flat), &mut seg, &mut NullDetector, 16, 12)
            .unwrap();
        assert!(p.output().pixels.iter().all(|&px| px == RED));
    }

    #[test]
    fn all_background_mask_shows_only_the_background() {
        let mut p = pipeline(16, 12);
        let frame = FrameBuffer::filled(16, 12, RED);
        let mut seg = FixedSegmenter { ready: true, person: false };
        p.run_iteration(&frame, no_overlay_selection(BackgroundKind::Flat), &mut seg, &mut NullDetector, 16, 12)
            .unwrap();
        // Flat background color everywhere, no red left.
        let first = p.output().pixels[0];
        assert_ne!(first, RED);
        assert!(p.output().pixels.iter().all(|&px| px == first));
    }

    #[test]
    fn unready_segmenter_degrades_to_identity() {
        let mut p = pipeline(16, 12);
        let frame = FrameBuffer::filled(16, 12, RED);
        let mut seg = FixedSegmenter { ready: false, person: false };
        p.run_iteration(&frame, no_overlay_selection(BackgroundKind::Mars), &mut seg, &mut NullDetector, 16, 12)
            .unwrap();
        assert!(p.output().pixels.iter().all(|&px| px == RED));
    }

    #[test]
    fn segmentation_failure_degrades_without_aborting() {
        let mut p = pipeline(16, 12);
        let frame = FrameBuffer::filled(16, 12, RED);
        p.run_iteration(&frame, no_overlay_selection(BackgroundKind::Flat), &mut FailingSegmenter, &mut NullDetector, 16, 12)
            .unwrap();
        assert!(p.output().pixels.iter().all(|&px| px == RED));
    }

    #[test]
    fn background_none_skips_replacement_entirely() {
        let mut p = pipeline(16, 12);
        let frame = FrameBuffer::filled(16, 12, RED);
        let mut seg = FixedSegmenter { ready: true, person: false };
        p.run_iteration(&frame, no_overlay_selection(BackgroundKind::None), &mut seg, &mut NullDetector, 16, 12)
            .unwrap();
        assert!(p.output().pixels.iter().all(|&px| px == RED));
    }

    #[test]
    fn resize_reallocates_the_output_surface() {
        let mut p = pipeline(16, 12);
        let frame = FrameBuffer::filled(16, 12, RED);
        let mut seg = FixedSegmenter { ready: true, person: true };
        p.run_iteration(&frame, no_overlay_selection(BackgroundKind::Flat), &mut seg, &mut NullDetector, 32, 20)
            .unwrap();
        assert_eq!(p.output().width, 32);
        assert_eq!(p.output().height, 20);
        assert!(p.output().pixels.iter().all(|&px| px == RED));
    }

    #[test]
    fn detections_beyond_the_cap_are_discarded() {
        let mut p = pipeline(16, 12);
        let frame = FrameBuffer::filled(16, 12, RED);
        let mut seg = FixedSegmenter { ready: false, person: false };
        let mut det = ManyFacesDetector(MAX_FACES_LIMIT + 5);
        p.run_iteration(&frame, no_overlay_selection(BackgroundKind::None), &mut seg, &mut det, 16, 12)
            .unwrap();
        assert_eq!(p.last_face_count(), MAX_FACES_LIMIT);
    }

    #[test]
    fn export_png_writes_a_file() {
        let mut p = pipeline(8, 8);
        let frame = FrameBuffer::filled(8, 8, RED);
        let mut seg = FixedSegmenter { ready: false, person: false };
        p.run_iteration(&frame, no_overlay_selection(BackgroundKind::None), &mut seg, &mut NullDetector, 8, 8)
            .unwrap();

        let path = std::env::temp_dir().join("astro-booth-test-snapshot.png");
        p.export_png(&path).unwrap();
        assert!(path.exists());
        let _ = std::fs::remove_file(&path);
    }
}
