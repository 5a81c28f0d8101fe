// Astro Booth — webcam novelty effects.
// • Live camera is always the base image.
// • R calibrates the segmenter (step out of frame); after that, the selected
//   background replaces everything that isn't you.
// • 1/2/3 pick the overlay: none / space helmet / alien.
// • H flips helmet style, C cycles helmet color, V cycles alien color.
// • B cycles the background, M toggles the landmark mesh debug view,
//   T toggles the corner sticker, S saves a PNG snapshot. ESC quits.

mod background;
mod camera;
mod compose;
mod draw;
mod error;
mod gamma;
mod landmarks;
mod overlay;
mod palette;
mod pipeline;
mod segment;
mod types;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use minifb::Key;

use background::BackgroundStore;
use camera::CameraCapture;
use draw::{Drawer, draw_banner, draw_text_5x7};
use error::Error;
use landmarks::{DetectorConfig, SkinRegionDetector};
use pipeline::RenderPipeline;
use segment::{BackgroundSubtractionSegmenter, CalibrationState};
use types::{BackgroundKind, FrameBuffer, HelmetStyle, OverlayKind, Selection};

const TARGET_WIDTH: usize = 640;
const TARGET_HEIGHT: usize = 480;
const BACKGROUND_IMAGE: &str = "assets/mars_background.jpeg";

fn main() -> Result<(), Error> {
    env_logger::init();

    /* --- Window first, so a camera failure still has somewhere to show --- */
    let mut drawer = Drawer::new("Astro Booth", TARGET_WIDTH, TARGET_HEIGHT)?;

    /* --- Camera: denial is visible, not fatal ---
       The loop keeps running with a banner; every toggle still works. */
    let mut camera = match CameraCapture::new(0, TARGET_WIDTH as u32, TARGET_HEIGHT as u32) {
        Ok(cam) => {
            let (w, h) = cam.resolution();
            log::info!("camera streaming at {w}x{h}");
            Some(cam)
        }
        Err(e) => {
            log::error!("camera unavailable: {e}");
            None
        }
    };

    /* --- Backgrounds + pipeline + adapters --- */
    let mut backgrounds = BackgroundStore::new();
    backgrounds.load_image(Path::new(BACKGROUND_IMAGE));
    let mut booth = RenderPipeline::new(TARGET_WIDTH, TARGET_HEIGHT, backgrounds);
    let mut segmenter = BackgroundSubtractionSegmenter::new();
    let mut detector = SkinRegionDetector::new(DetectorConfig::default());

    /* --- Selection snapshot; key handlers build a fresh one each frame --- */
    let mut selection = Selection::default();

    /* --- FPS bookkeeping for the HUD --- */
    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;
    let mut hud_fps = String::from("FPS 0.0");

    log::info!("astro booth starting at {TARGET_WIDTH}x{TARGET_HEIGHT}");

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() && !drawer.esc_pressed() {
        // 1) Inputs: derive the next selection snapshot, handle one-shot keys.
        selection = next_selection(&drawer, selection);
        if drawer.key_pressed_once(Key::R) {
            segmenter.begin_calibration();
        }
        let snapshot_requested = drawer.key_pressed_once(Key::S);

        let (win_w, win_h) = drawer.size();
        let win_w = win_w.max(1);
        let win_h = win_h.max(1);

        // 2) Camera gone entirely: banner screen, stay interactive.
        let Some(cam) = camera.as_mut() else {
            let mut screen = FrameBuffer::filled(win_w, win_h, 0x00_10_14_1C);
            draw_banner(&mut screen, 12, "CAMERA UNAVAILABLE - CHECK PERMISSIONS", 0x00_7A_1C_1C, 0x00_FF_FF_FF);
            drawer.present(&screen)?;
            continue;
        };

        // 3) Frame, or skip this iteration while the device warms up.
        let frame = match cam.poll_frame() {
            Ok(Some(f)) => f,
            Ok(None) => {
                drawer.present(booth.output())?;
                continue;
            }
            Err(e) => {
                // A bad frame is a skipped iteration, not a shutdown.
                log::warn!("{e}");
                drawer.present(booth.output())?;
                continue;
            }
        };

        // 4) Feed the segmenter while it's calibrating.
        if let Err(e) = segmenter.observe(&frame) {
            log::warn!("calibration frame dropped: {e}");
        }

        // 5) Composite + overlays for this frame.
        if let Err(e) = booth.run_iteration(&frame, selection, &mut segmenter, &mut detector, win_w, win_h) {
            log::warn!("iteration skipped: {e}");
            drawer.present(booth.output())?;
            continue;
        }

        // 6) HUD + calibration banner on top of the finished surface.
        let hud = hud_line(&selection, booth.last_face_count(), &hud_fps);
        draw_text_5x7(booth.output_mut(), 8, 8, &hud, 0x00_FF_FF_FF);
        if let CalibrationState::Collecting { have, want } = segmenter.state() {
            let msg = format!("CALIBRATING {have} OF {want} - STAY OUT OF FRAME - PRESS R TO RESTART");
            draw_banner(booth.output_mut(), (win_h as i32) - 16, &msg, 0x00_14_32_14, 0x00_D0_FF_D0);
        }

        // 7) Snapshot on demand; failure is a warning, never a halt.
        if snapshot_requested {
            let path = snapshot_path();
            match booth.export_png(&path) {
                Ok(()) => log::info!("snapshot saved to {}", path.display()),
                Err(e) => log::warn!("{e}"),
            }
        }

        // 8) Present.
        drawer.present(booth.output())?;

        // 9) FPS once per second.
        frames_this_second += 1;
        let now = Instant::now();
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let secs = now.duration_since(last_fps_time).as_secs_f32();
            let fps = frames_this_second as f32 / secs;
            log::debug!("fps {fps:.1}");
            hud_fps = format!("FPS {fps:.1}");
            frames_this_second = 0;
            last_fps_time = now;
        }
    }

    Ok(())
}

/// Build the next selection snapshot from this frame's key presses. The
/// snapshot is the only thing the pipeline reads, so a key landing mid-frame
/// can never produce a half-applied state.
fn next_selection(drawer: &Drawer, current: Selection) -> Selection {
    let mut next = current;
    if drawer.key_pressed_once(Key::Key1) {
        next.overlay = OverlayKind::None;
    }
    if drawer.key_pressed_once(Key::Key2) {
        next.overlay = OverlayKind::Helmet;
    }
    if drawer.key_pressed_once(Key::Key3) {
        next.overlay = OverlayKind::Alien;
    }
    if drawer.key_pressed_once(Key::H) {
        next.helmet_style = next.helmet_style.toggled();
    }
    if drawer.key_pressed_once(Key::C) {
        next.helmet_color = next.helmet_color.cycled();
    }
    if drawer.key_pressed_once(Key::V) {
        next.alien_color = next.alien_color.cycled();
    }
    if drawer.key_pressed_once(Key::B) {
        next.background = next.background.cycled();
    }
    if drawer.key_pressed_once(Key::M) {
        next.mesh_debug = !next.mesh_debug;
    }
    if drawer.key_pressed_once(Key::T) {
        next.sticker = !next.sticker;
    }
    next
}

fn hud_line(selection: &Selection, faces: usize, fps: &str) -> String {
    let overlay = match selection.overlay {
        OverlayKind::None if selection.mesh_debug => "MESH DEBUG".to_string(),
        OverlayKind::None => "NO OVERLAY".to_string(),
        OverlayKind::Helmet => {
            let style = match selection.helmet_style {
                HelmetStyle::Classic => "CLASSIC",
                HelmetStyle::Modern => "MODERN",
            };
            format!("HELMET {style} {}", selection.helmet_color.label())
        }
        OverlayKind::Alien => format!("ALIEN {}", selection.alien_color.label()),
    };
    let background = match selection.background {
        BackgroundKind::None => "OFF",
        BackgroundKind::Mars => "MARS",
        BackgroundKind::Starfield => "STARS",
        BackgroundKind::Flat => "FLAT",
    };
    format!("{overlay} | BG {background} | FACES {faces} | {fps}")
}

fn snapshot_path() -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    PathBuf::from(format!("astro-booth-{stamp}.png"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::{AlienColorId, HelmetColorId};

    #[test]
    fn hud_line_describes_the_selection() {
        let selection = Selection {
            overlay: OverlayKind::Alien,
            alien_color: AlienColorId::Cyan,
            background: BackgroundKind::Starfield,
            ..Selection::default()
        };
        let line = hud_line(&selection, 2, "FPS 30.0");
        assert_eq!(line, "ALIEN CYAN | BG STARS | FACES 2 | FPS 30.0");
    }

    #[test]
    fn hud_line_shows_helmet_style_and_color() {
        let selection = Selection {
            overlay: OverlayKind::Helmet,
            helmet_style: HelmetStyle::Modern,
            helmet_color: HelmetColorId::Gold,
            background: BackgroundKind::Mars,
            ..Selection::default()
        };
        let line = hud_line(&selection, 1, "FPS 12.5");
        assert_eq!(line, "HELMET MODERN GOLD | BG MARS | FACES 1 | FPS 12.5");
    }

    #[test]
    fn background_cycle_visits_every_kind_once() {
        let mut kind = BackgroundKind::None;
        let mut seen = Vec::new();
        for _ in 0..4 {
            kind = kind.cycled();
            seen.push(kind);
        }
        assert_eq!(seen.len(), 4);
        assert_eq!(kind, BackgroundKind::None);
    }
}
