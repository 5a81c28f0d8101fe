// Background store: named backgrounds the compositor paints behind the
// person. The static image is loaded once from disk; the starfield is
// procedural and redrawn with fresh randomness every call, so the stars
// twinkle/jitter frame to frame by design.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::compose::scale_nearest;
use crate::types::{BackgroundKind, FrameBuffer};

/// How many stars the procedural starfield plots per call.
pub const STAR_COUNT: usize = 100;

/// Shown when the static image is selected but hasn't loaded (dusty red).
pub const IMAGE_FALLBACK_COLOR: u32 = 0x00_B0_5A_3C;

const STARFIELD_SKY: u32 = 0x00_05_07_12;
const STAR_COLOR: u32 = 0x00_FF_FF_FF;
const FLAT_COLOR: u32 = 0x00_20_28_38;

/// Deterministic xorshift32; plenty for visual noise and seedable in tests.
struct Rng32 {
    state: u32,
}

impl Rng32 {
    fn from_seed(seed: u32) -> Self {
        Self { state: seed | 1 }
    }

    #[inline]
    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform integer in [0, bound).
    #[inline]
    fn below(&mut self, bound: usize) -> usize {
        (self.next_u32() as usize) % bound.max(1)
    }
}

pub struct BackgroundStore {
    image: Option<FrameBuffer>,           // static image at its native size
    scaled: Option<FrameBuffer>,          // cached rescale for the current output size
    rng: Rng32,
}

impl BackgroundStore {
    /// Store with no static image loaded; the image slot falls back to a flat
    /// color until `load_image` succeeds.
    pub fn new() -> Self {
        // Seed from the clock so each run gets a different star pattern.
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0x5EED);
        Self { image: None, scaled: None, rng: Rng32::from_seed(seed) }
    }

    /// Seeded constructor for tests (deterministic starfields).
    pub fn with_seed(seed: u32) -> Self {
        Self { image: None, scaled: None, rng: Rng32::from_seed(seed) }
    }

    /// Try to load the static background image. Failure is non-fatal: we log
    /// and keep the flat fallback, per the degrade-never-halt rule.
    pub fn load_image(&mut self, path: &Path) {
        match image::open(path) {
            Ok(img) => {
                let rgb = img.to_rgb8();
                let (w, h) = rgb.dimensions();
                let mut pixels = Vec::with_capacity((w as usize) * (h as usize));
                for p in rgb.pixels() {
                    pixels.push(((p[0] as u32) << 16) | ((p[1] as u32) << 8) | (p[2] as u32));
                }
                log::info!("background image loaded from {} ({w}x{h})", path.display());
                self.image = Some(FrameBuffer { width: w as usize, height: h as usize, pixels });
                self.scaled = None;
            }
            Err(e) => {
                log::warn!("background image {} not loaded: {e}", path.display());
            }
        }
    }

    /// Paint the selected background across the whole output surface.
    /// `BackgroundKind::None` never reaches here; the pipeline skips
    /// background replacement entirely for it.
    pub fn draw(&mut self, kind: BackgroundKind, out: &mut FrameBuffer) {
        match kind {
            BackgroundKind::None => {}
            BackgroundKind::Mars => self.draw_image(out),
            BackgroundKind::Starfield => self.draw_starfield(out),
            BackgroundKind::Flat => out.pixels.fill(FLAT_COLOR),
        }
    }

    fn draw_image(&mut self, out: &mut FrameBuffer) {
        let Some(img) = &self.image else {
            // Not loaded (yet): flat fallback color instead of stale pixels.
            out.pixels.fill(IMAGE_FALLBACK_COLOR);
            return;
        };

        // Rescale lazily and reuse until the output size changes.
        let stale = match &self.scaled {
            Some(s) => s.width != out.width || s.height != out.height,
            None => true,
        };
        if stale {
            self.scaled = Some(scale_nearest(img, out.width, out.height));
        }
        if let Some(s) = &self.scaled {
            out.pixels.copy_from_slice(&s.pixels);
        }
    }

    fn draw_starfield(&mut self, out: &mut FrameBuffer) {
        out.pixels.fill(STARFIELD_SKY);
        if out.len() == 0 {
            return;
        }
        // Fresh positions every call; stars are deliberately not stable
        // across frames.
        for _ in 0..STAR_COUNT {
            let idx = self.rng.below(out.len());
            out.pixels[idx] = STAR_COLOR;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_background_is_uniform() {
        let mut store = BackgroundStore::with_seed(7);
        let mut out = FrameBuffer::new(16, 16);
        store.draw(BackgroundKind::Flat, &mut out);
        assert!(out.pixels.iter().all(|&p| p == FLAT_COLOR));
    }

    #[test]
    fn unloaded_image_uses_fallback_color() {
        let mut store = BackgroundStore::with_seed(7);
        let mut out = FrameBuffer::new(16, 16);
        store.draw(BackgroundKind::Mars, &mut out);
        assert!(out.pixels.iter().all(|&p| p == IMAGE_FALLBACK_COLOR));
    }

    #[test]
    fn starfield_plots_stars_on_dark_sky() {
        let mut store = BackgroundStore::with_seed(42);
        let mut out = FrameBuffer::new(64, 64);
        store.draw(BackgroundKind::Starfield, &mut out);
        let stars = out.pixels.iter().filter(|&&p| p == STAR_COLOR).count();
        let sky = out.pixels.iter().filter(|&&p| p == STARFIELD_SKY).count();
        // Collisions can merge dots, but never exceed the configured count.
        assert!(stars >= 1 && stars <= STAR_COUNT);
        assert_eq!(stars + sky, out.len());
    }

    #[test]
    fn starfield_twinkles_between_calls() {
        let mut store = BackgroundStore::with_seed(42);
        let mut a = FrameBuffer::new(64, 64);
        let mut b = FrameBuffer::new(64, 64);
        store.draw(BackgroundKind::Starfield, &mut a);
        store.draw(BackgroundKind::Starfield, &mut b);
        assert_ne!(a.pixels, b.pixels);
    }
}
