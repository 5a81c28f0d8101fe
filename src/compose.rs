// Compositor: merges the live frame, the selected background, and the person
// mask into the output surface. This is a per-pixel *select*, not a blend:
// person pixels come straight from the frame, everything else keeps the
// background. The hard edge at the mask boundary is the intended look; do not
// feather it here.

use crate::error::Error;
use crate::types::{FaceBox, FrameBuffer, LandmarkSet, SegMask};

/// Composite `frame` over `background` under `mask`, writing into `out`.
///
/// With a mask: `out[i] = frame[i]` where the mask says person, otherwise the
/// background pixel, untouched. The surface is opaque by construction (the
/// 0x00RRGGBB packing carries no alpha), so person pixels land fully solid.
///
/// With no mask (segmenter absent or not yet calibrated): identity fallback,
/// the frame is drawn directly and the background is ignored.
pub fn compose(
    frame: &FrameBuffer,
    background: &FrameBuffer,
    mask: Option<&SegMask>,
    out: &mut FrameBuffer,
) -> Result<(), Error> {
    if frame.width != out.width || frame.height != out.height {
        return Err(Error::SizeMismatch("compose: frame vs output".into()));
    }

    let mask = match mask {
        Some(m) => m,
        None => {
            out.pixels.copy_from_slice(&frame.pixels);
            return Ok(());
        }
    };

    if background.width != out.width || background.height != out.height {
        return Err(Error::SizeMismatch("compose: background vs output".into()));
    }
    if mask.width != out.width || mask.height != out.height {
        return Err(Error::SizeMismatch("compose: mask vs output".into()));
    }

    for i in 0..out.len() {
        out.pixels[i] = if mask.person[i] { frame.pixels[i] } else { background.pixels[i] };
    }
    Ok(())
}

/// Pixel-space bounding box over a landmark set, or `None` when there is
/// nothing usable (no landmarks, or only non-finite points). Coordinates are
/// snapped to whole pixels. Callers recompute this every iteration so window
/// resizes are picked up without any cache invalidation.
pub fn face_bounding_box(set: &LandmarkSet, width: usize, height: usize) -> Option<FaceBox> {
    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;

    for &(nx, ny) in &set.points {
        if !nx.is_finite() || !ny.is_finite() {
            continue; // a bad point must not poison the whole box
        }
        min_x = min_x.min(nx);
        min_y = min_y.min(ny);
        max_x = max_x.max(nx);
        max_y = max_y.max(ny);
    }

    if !min_x.is_finite() || !min_y.is_finite() {
        return None; // empty set, or every point was NaN/Inf
    }

    Some(FaceBox {
        min_x: (min_x * width as f32).round(),
        min_y: (min_y * height as f32).round(),
        max_x: (max_x * width as f32).round(),
        max_y: (max_y * height as f32).round(),
    })
}

/// Nearest-neighbor rescale of a frame to the current output size. Used when
/// the window has been resized and the camera keeps delivering its native
/// resolution. Quality is fine for a live preview.
pub fn scale_nearest(src: &FrameBuffer, dst_w: usize, dst_h: usize) -> FrameBuffer {
    if src.width == dst_w && src.height == dst_h {
        return src.clone();
    }
    let mut dst = FrameBuffer::new(dst_w, dst_h);
    if src.width == 0 || src.height == 0 || dst_w == 0 || dst_h == 0 {
        return dst;
    }
    for y in 0..dst_h {
        let sy = y * src.height / dst_h;
        let src_row = sy * src.width;
        let dst_row = y * dst_w;
        for x in 0..dst_w {
            let sx = x * src.width / dst_w;
            dst.pixels[dst_row + x] = src.pixels[src_row + sx];
        }
    }
    dst
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: u32 = 0x00_FF_00_00;
    const BLUE: u32 = 0x00_00_00_FF;
    const GREEN: u32 = 0x00_00_FF_00;

    fn checker_mask(w: usize, h: usize) -> SegMask {
        let mut m = SegMask::new(w, h);
        for y in 0..h {
            for x in 0..w {
                m.person[y * w + x] = (x + y) % 2 == 0;
            }
        }
        m
    }

    #[test]
    fn person_pixels_select_frame_others_select_background() {
        let w = 8;
        let h = 6;
        let frame = FrameBuffer::filled(w, h, RED);
        let bg = FrameBuffer::filled(w, h, BLUE);
        let mask = checker_mask(w, h);
        let mut out = FrameBuffer::new(w, h);
        compose(&frame, &bg, Some(&mask), &mut out).unwrap();
        for i in 0..out.len() {
            let want = if mask.person[i] { RED } else { BLUE };
            assert_eq!(out.pixels[i], want, "pixel {i}");
        }
    }

    #[test]
    fn absent_mask_is_identity_fallback() {
        let w = 5;
        let h = 5;
        let frame = FrameBuffer::filled(w, h, GREEN);
        let bg = FrameBuffer::filled(w, h, BLUE);
        let mut out = FrameBuffer::new(w, h);
        compose(&frame, &bg, None, &mut out).unwrap();
        assert_eq!(out.pixels, frame.pixels);
    }

    #[test]
    fn background_switch_changes_only_non_person_pixels() {
        let w = 8;
        let h = 8;
        let frame = FrameBuffer::filled(w, h, RED);
        let mask = checker_mask(w, h);

        let mut out_blue = FrameBuffer::new(w, h);
        let mut out_green = FrameBuffer::new(w, h);
        compose(&frame, &FrameBuffer::filled(w, h, BLUE), Some(&mask), &mut out_blue).unwrap();
        compose(&frame, &FrameBuffer::filled(w, h, GREEN), Some(&mask), &mut out_green).unwrap();

        for i in 0..(w * h) {
            if mask.person[i] {
                assert_eq!(out_blue.pixels[i], out_green.pixels[i]);
            } else {
                assert_eq!(out_blue.pixels[i], BLUE);
                assert_eq!(out_green.pixels[i], GREEN);
            }
        }
    }

    #[test]
    fn mismatched_sizes_are_rejected() {
        let frame = FrameBuffer::new(4, 4);
        let bg = FrameBuffer::new(4, 4);
        let mask = SegMask::new(4, 4);
        let mut out = FrameBuffer::new(5, 4);
        assert!(compose(&frame, &bg, Some(&mask), &mut out).is_err());
    }

    #[test]
    fn bounding_box_matches_known_span_exactly() {
        // x in [0.2, 0.8], y in [0.1, 0.6] on a 640x480 surface.
        let set = LandmarkSet {
            points: vec![(0.2, 0.1), (0.5, 0.3), (0.8, 0.6), (0.4, 0.2)],
        };
        let b = face_bounding_box(&set, 640, 480).unwrap();
        assert_eq!((b.min_x, b.min_y, b.max_x, b.max_y), (128.0, 48.0, 512.0, 288.0));
    }

    #[test]
    fn empty_landmarks_yield_no_box() {
        let set = LandmarkSet { points: vec![] };
        assert!(face_bounding_box(&set, 640, 480).is_none());
    }

    #[test]
    fn non_finite_landmarks_yield_no_box() {
        let set = LandmarkSet { points: vec![(f32::NAN, 0.5), (0.5, f32::INFINITY)] };
        assert!(face_bounding_box(&set, 640, 480).is_none());
    }

    #[test]
    fn single_point_box_is_degenerate_not_nan() {
        let set = LandmarkSet { points: vec![(0.5, 0.5)] };
        let b = face_bounding_box(&set, 640, 480).unwrap();
        assert!(b.is_degenerate());
        assert!(b.width().is_finite() && b.height().is_finite());
    }

    #[test]
    fn scale_nearest_preserves_solid_fill() {
        let src = FrameBuffer::filled(4, 4, RED);
        let dst = scale_nearest(&src, 9, 7);
        assert_eq!(dst.width, 9);
        assert_eq!(dst.height, 7);
        assert!(dst.pixels.iter().all(|&p| p == RED));
    }
}
