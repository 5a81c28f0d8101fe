// Overlay renderer: procedural face decorations anchored to a landmark
// bounding box. Everything here is immediate-mode software drawing onto the
// composited output surface; geometry is derived fresh from the box every
// iteration so resizes and head movement just work.
//
// Every draw stays inside the box inflated by MAX_OVERLAY_PAD times its
// larger dimension, and every entry point skips degenerate boxes outright,
// so no NaN or zero-size radius ever reaches a primitive.

use crate::compose::face_bounding_box;
use crate::draw::{draw_line, put_pixel};
use crate::gamma::GammaLut;
use crate::palette::{AlienPalette, HelmetPalette};
use crate::types::{FaceBox, FrameBuffer, HelmetStyle, LandmarkSet, OverlayKind, Selection};

/// Maximum padding factor: no overlay pixel is touched outside the face box
/// inflated by this factor times max(box width, box height) on every side.
pub const MAX_OVERLAY_PAD: f32 = 1.25;

/// Alien skin pass opacities (base/accent/highlight), tuned by eye.
const ALIEN_BASE_ALPHA: f32 = 0.55;
const ALIEN_ACCENT_ALPHA: f32 = 0.35;
const ALIEN_HIGHLIGHT_ALPHA: f32 = 0.45;

/// Antenna tips rise above the box top by box_width / this ratio.
const ANTENNA_RISE_RATIO: f32 = 2.5;

/// The clip region an overlay may draw into, in integer pixels.
pub fn overlay_bounds(b: &FaceBox) -> (i32, i32, i32, i32) {
    let pad = MAX_OVERLAY_PAD * b.width().max(b.height());
    (
        (b.min_x - pad).floor() as i32,
        (b.min_y - pad).floor() as i32,
        (b.max_x + pad).ceil() as i32,
        (b.max_y + pad).ceil() as i32,
    )
}

/// Draw the selected decoration for one detected face. `frame` is the live
/// (already rescaled) camera image; the classic visor re-draws it through the
/// visor clip, which is how the see-through effect works.
pub fn render(
    out: &mut FrameBuffer,
    frame: &FrameBuffer,
    set: &LandmarkSet,
    selection: &Selection,
    lut: &GammaLut,
) {
    let Some(face) = face_bounding_box(set, out.width, out.height) else {
        return; // no usable landmarks this frame
    };

    match selection.overlay {
        OverlayKind::None => {
            if selection.mesh_debug {
                render_mesh_debug(out, set);
            }
        }
        OverlayKind::Helmet => {
            let palette = selection.helmet_color.palette();
            match selection.helmet_style {
                HelmetStyle::Classic => render_helmet_classic(out, frame, &face, palette, lut),
                HelmetStyle::Modern => render_helmet_modern(out, &face, palette, lut),
            }
        }
        OverlayKind::Alien => {
            let palette = selection.alien_color.palette();
            render_alien_skin(out, &face, palette);
            render_alien_antennas(out, &face, palette);
        }
    }
}

/* ------------------------------- helmet: classic ------------------------------- */

/// Rounded-rectangle shell inflated from the box (extra headroom on top for
/// the dome), half-circle dome arc, a see-through visor, ventilation dots and
/// side tick marks.
pub fn render_helmet_classic(
    out: &mut FrameBuffer,
    frame: &FrameBuffer,
    face: &FaceBox,
    palette: &HelmetPalette,
    lut: &GammaLut,
) {
    if face.is_degenerate() {
        return;
    }
    let w = face.width();
    let h = face.height();
    let cx = face.center_x();

    // Shell: fixed side padding, more above for the dome.
    let body_w = w * 1.36;
    let body_x0 = cx - body_w * 0.5;
    let body_y0 = face.min_y - 0.45 * h;
    let body_y1 = face.max_y + 0.15 * h;
    let body_h = body_y1 - body_y0;
    let corner = 0.18 * body_w.min(body_h);

    fill_rounded_rect(out, body_x0, body_y0, body_w, body_h, corner, palette.base);
    stroke_rounded_rect(out, body_x0, body_y0, body_w, body_h, corner, palette.stroke);

    // Dome: half-circle arc over the crown.
    let dome_r = body_w * 0.3;
    let dome_cy = body_y0 + 4.0;
    stroke_upper_arc(out, cx, dome_cy, dome_r, 3.0, palette.highlight);

    // Visor: rounded rect filled by redrawing the live frame at reduced
    // opacity under a palette tint. This is literally the camera pixels
    // again, clipped, not any kind of transparency.
    let visor_x0 = face.min_x - 0.05 * w;
    let visor_w = w * 1.10;
    let visor_y0 = face.min_y - 0.05 * h;
    let visor_h = 0.80 * h;
    let visor_corner = 0.15 * visor_w.min(visor_h);
    fill_visor(
        out, frame, visor_x0, visor_y0, visor_w, visor_h, visor_corner, palette, lut,
    );
    stroke_rounded_rect(out, visor_x0, visor_y0, visor_w, visor_h, visor_corner, palette.stroke);

    // Ventilation dots under the visor, shadow color.
    let vent_y = body_y1 - 0.35 * (body_y1 - (visor_y0 + visor_h));
    let vent_r = (0.018 * body_w).max(1.5);
    for k in 0..4 {
        let fx = 0.30 + 0.40 * (k as f32 / 3.0);
        fill_circle(out, body_x0 + fx * body_w, vent_y, vent_r, palette.shadow);
    }

    // Side tick marks, three per side.
    let tick_len = 0.06 * body_w;
    for k in 0..3 {
        let ty = (face.min_y + 0.2 * h + k as f32 * 0.18 * h) as i32;
        draw_line(out, (body_x0 + 2.0) as i32, ty, (body_x0 + 2.0 + tick_len) as i32, ty, palette.shadow);
        draw_line(
            out,
            (body_x0 + body_w - 2.0 - tick_len) as i32,
            ty,
            (body_x0 + body_w - 2.0) as i32,
            ty,
            palette.shadow,
        );
    }
}

/* ------------------------------- helmet: modern ------------------------------- */

/// Circular shell sized by the box's minimum dimension: dark translucent
/// visor disc, colored accent ring, two small antenna side discs, and a ring
/// of decorative dots at fixed angular offsets.
pub fn render_helmet_modern(
    out: &mut FrameBuffer,
    face: &FaceBox,
    palette: &HelmetPalette,
    lut: &GammaLut,
) {
    if face.is_degenerate() {
        return;
    }
    let m = face.width().min(face.height());
    let r = 0.72 * m;
    let cx = face.center_x();
    let cy = face.center_y();

    // Shell annulus.
    fill_annulus(out, cx, cy, 0.84 * r, r, palette.base);
    stroke_circle(out, cx, cy, r, 2.0, palette.stroke);

    // Dark visor disc, translucent so the face stays visible behind it.
    fill_circle_blend(out, cx, cy, 0.78 * r, 0x00_10_12_1A, 0.55, lut);

    // Accent ring at the visor edge.
    stroke_circle(out, cx, cy, 0.78 * r, 2.0, palette.highlight);

    // Two antenna side discs just outside the shell.
    let side_r = 0.10 * r;
    fill_circle(out, cx - 1.15 * r, cy - 0.10 * r, side_r, palette.shadow);
    fill_circle(out, cx + 1.15 * r, cy - 0.10 * r, side_r, palette.shadow);

    // Decorative dot ring at fixed angular offsets.
    let dot_r = (0.035 * r).max(1.0);
    for k in 0..8 {
        let a = (k as f32 + 0.5) * std::f32::consts::FRAC_PI_4;
        let dx = cx + 0.90 * r * a.cos();
        let dy = cy + 0.90 * r * a.sin();
        fill_circle(out, dx, dy, dot_r, palette.highlight);
    }
}

/* ---------------------------------- alien ---------------------------------- */

/// Skin-tone shift: clip to an ellipse inflated 1.2x over the box and run
/// three sequential fills (base via multiply, accent via overlay, highlight
/// via soft-light). Approximates recoloring without per-pixel color-space
/// conversion while keeping skin texture visible under the tint.
pub fn render_alien_skin(out: &mut FrameBuffer, face: &FaceBox, palette: &AlienPalette) {
    if face.is_degenerate() {
        return;
    }
    let cx = face.center_x();
    let cy = face.center_y();
    let rx = face.width() * 0.5 * 1.2;
    let ry = face.height() * 0.5 * 1.2;

    let x0 = ((cx - rx).floor() as i32).max(0);
    let x1 = ((cx + rx).ceil() as i32).min(out.width as i32 - 1);
    let y0 = ((cy - ry).floor() as i32).max(0);
    let y1 = ((cy + ry).ceil() as i32).min(out.height as i32 - 1);

    for y in y0..=y1 {
        for x in x0..=x1 {
            let ex = (x as f32 - cx) / rx;
            let ey = (y as f32 - cy) / ry;
            if ex * ex + ey * ey > 1.0 {
                continue; // outside the elliptical clip
            }
            let idx = y as usize * out.width + x as usize;
            let mut px = out.pixels[idx];
            px = blend_pass(px, palette.base, BlendMode::Multiply, ALIEN_BASE_ALPHA);
            px = blend_pass(px, palette.overlay, BlendMode::Overlay, ALIEN_ACCENT_ALPHA);
            px = blend_pass(px, palette.texture, BlendMode::SoftLight, ALIEN_HIGHLIGHT_ALPHA);
            out.pixels[idx] = px;
        }
    }
}

/// Two antenna stalks rising from just above the box top, angled outward,
/// each ending in a filled tip plus a larger soft glow disc.
pub fn render_alien_antennas(out: &mut FrameBuffer, face: &FaceBox, palette: &AlienPalette) {
    if face.is_degenerate() {
        return;
    }
    let w = face.width();
    let cx = face.center_x();
    let base_y = face.min_y - 2.0;
    let rise = w / ANTENNA_RISE_RATIO;
    let lean = 0.15 * w;
    let tip_r = (0.045 * w).max(2.0);

    for side in [-1.0f32, 1.0] {
        let base_x = cx + side * 0.22 * w;
        let tip_x = base_x + side * lean;
        let tip_y = base_y - rise;

        // Stalk, drawn a few pixels thick.
        for off in -1..=1 {
            draw_line(
                out,
                (base_x + off as f32) as i32,
                base_y as i32,
                (tip_x + off as f32) as i32,
                tip_y as i32,
                palette.antenna,
            );
        }

        // Glow first so the solid tip sits on top of it.
        draw_glow_disc(out, tip_x, tip_y, 2.2 * tip_r, palette.glow, 0.8);
        fill_circle(out, tip_x, tip_y, tip_r, palette.antenna);
    }
}

/* ------------------------------- diagnostics ------------------------------- */

/// Landmark mesh debug view: keypoints joined in order plus a dot per point.
/// Only reachable with overlay off; colors follow the usual mesh diagnostic
/// convention (green connectors, red points).
pub fn render_mesh_debug(out: &mut FrameBuffer, set: &LandmarkSet) {
    let w = out.width as f32;
    let h = out.height as f32;
    let n = set.points.len();
    if n == 0 {
        return;
    }

    let px = |i: usize| -> (i32, i32) {
        let (nx, ny) = set.points[i];
        ((nx * w) as i32, (ny * h) as i32)
    };

    for i in 0..n {
        let (x0, y0) = px(i);
        let (x1, y1) = px((i + 1) % n);
        draw_line(out, x0, y0, x1, y1, 0x00_00_FF_00);
    }
    for i in 0..n {
        let (x, y) = px(i);
        fill_circle(out, x as f32, y as f32, 1.5, 0x00_FF_00_00);
    }
}

/// Secondary decorative overlay: a small badge pinned to the bottom-right
/// corner, drawn unconditionally on top of everything when enabled. Not
/// anchored to any face.
pub fn render_sticker(out: &mut FrameBuffer) {
    let r = 18.0;
    let cx = out.width as f32 - r - 8.0;
    let cy = out.height as f32 - r - 8.0;
    if cx < r || cy < r {
        return; // window too small for the badge
    }
    fill_circle(out, cx, cy, r, 0x00_1A_23_33);
    stroke_circle(out, cx, cy, r, 2.0, 0x00_E8_B8_4A);
    // Three dots across the middle (a belt of stars).
    for k in -1..=1 {
        fill_circle(out, cx + k as f32 * 6.0, cy + k as f32 * 2.0, 1.8, 0x00_FF_FF_FF);
    }
}

/* ----------------------------- shape primitives ----------------------------- */

fn fill_circle(fb: &mut FrameBuffer, cx: f32, cy: f32, r: f32, color: u32) {
    if r <= 0.0 {
        return;
    }
    let r2 = r * r;
    for y in ((cy - r).floor() as i32)..=((cy + r).ceil() as i32) {
        for x in ((cx - r).floor() as i32)..=((cx + r).ceil() as i32) {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            if dx * dx + dy * dy <= r2 {
                put_pixel(fb, x, y, color);
            }
        }
    }
}

/// Translucent disc fill, mixed in linear light.
fn fill_circle_blend(fb: &mut FrameBuffer, cx: f32, cy: f32, r: f32, color: u32, alpha: f32, lut: &GammaLut) {
    if r <= 0.0 {
        return;
    }
    let r2 = r * r;
    for y in ((cy - r).floor() as i32)..=((cy + r).ceil() as i32) {
        for x in ((cx - r).floor() as i32)..=((cx + r).ceil() as i32) {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            if dx * dx + dy * dy > r2 {
                continue;
            }
            if x < 0 || y < 0 || x >= fb.width as i32 || y >= fb.height as i32 {
                continue;
            }
            let idx = y as usize * fb.width + x as usize;
            fb.pixels[idx] = lut.mix_over(fb.pixels[idx], color, alpha);
        }
    }
}

fn fill_annulus(fb: &mut FrameBuffer, cx: f32, cy: f32, r_in: f32, r_out: f32, color: u32) {
    if r_out <= 0.0 || r_out <= r_in {
        return;
    }
    let ro2 = r_out * r_out;
    let ri2 = r_in * r_in;
    for y in ((cy - r_out).floor() as i32)..=((cy + r_out).ceil() as i32) {
        for x in ((cx - r_out).floor() as i32)..=((cx + r_out).ceil() as i32) {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            let d2 = dx * dx + dy * dy;
            if d2 <= ro2 && d2 >= ri2 {
                put_pixel(fb, x, y, color);
            }
        }
    }
}

fn stroke_circle(fb: &mut FrameBuffer, cx: f32, cy: f32, r: f32, thickness: f32, color: u32) {
    let half = thickness * 0.5;
    fill_annulus(fb, cx, cy, (r - half).max(0.0), r + half, color);
}

/// Upper-half arc stroke (the dome): annulus restricted to y above center.
fn stroke_upper_arc(fb: &mut FrameBuffer, cx: f32, cy: f32, r: f32, thickness: f32, color: u32) {
    if r <= 0.0 {
        return;
    }
    let half = thickness * 0.5;
    let ro2 = (r + half) * (r + half);
    let ri2 = ((r - half).max(0.0)) * ((r - half).max(0.0));
    for y in ((cy - r - half).floor() as i32)..=(cy.ceil() as i32) {
        for x in ((cx - r - half).floor() as i32)..=((cx + r + half).ceil() as i32) {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            if dy > 0.0 {
                continue; // lower half: not part of the dome
            }
            let d2 = dx * dx + dy * dy;
            if d2 <= ro2 && d2 >= ri2 {
                put_pixel(fb, x, y, color);
            }
        }
    }
}

/// True when (x,y) lies inside the rounded rect (x0,y0)..(x0+w,y0+h) with
/// corner radius `r`.
#[inline]
fn in_rounded_rect(x: f32, y: f32, x0: f32, y0: f32, w: f32, h: f32, r: f32) -> bool {
    if x < x0 || y < y0 || x > x0 + w || y > y0 + h {
        return false;
    }
    let qx = (x - (x0 + r)).min(0.0) + (x - (x0 + w - r)).max(0.0);
    let qy = (y - (y0 + r)).min(0.0) + (y - (y0 + h - r)).max(0.0);
    qx * qx + qy * qy <= r * r
}

fn fill_rounded_rect(fb: &mut FrameBuffer, x0: f32, y0: f32, w: f32, h: f32, r: f32, color: u32) {
    if w <= 0.0 || h <= 0.0 {
        return;
    }
    let r = r.min(w * 0.5).min(h * 0.5).max(0.0);
    for y in (y0.floor() as i32)..=((y0 + h).ceil() as i32) {
        for x in (x0.floor() as i32)..=((x0 + w).ceil() as i32) {
            if in_rounded_rect(x as f32, y as f32, x0, y0, w, h, r) {
                put_pixel(fb, x, y, color);
            }
        }
    }
}

/// One-pixel outline: inside the rect but not inside the rect shrunk by 1.
fn stroke_rounded_rect(fb: &mut FrameBuffer, x0: f32, y0: f32, w: f32, h: f32, r: f32, color: u32) {
    if w <= 2.0 || h <= 2.0 {
        return;
    }
    let r = r.min(w * 0.5).min(h * 0.5).max(0.0);
    let ri = (r - 1.0).max(0.0);
    for y in (y0.floor() as i32)..=((y0 + h).ceil() as i32) {
        for x in (x0.floor() as i32)..=((x0 + w).ceil() as i32) {
            let fx = x as f32;
            let fy = y as f32;
            if in_rounded_rect(fx, fy, x0, y0, w, h, r)
                && !in_rounded_rect(fx, fy, x0 + 1.0, y0 + 1.0, w - 2.0, h - 2.0, ri)
            {
                put_pixel(fb, x, y, color);
            }
        }
    }
}

/// Visor fill: every pixel inside the rounded clip is the live camera pixel
/// redrawn over the shell at reduced opacity, then tinted toward the palette
/// stroke color.
fn fill_visor(
    fb: &mut FrameBuffer,
    frame: &FrameBuffer,
    x0: f32,
    y0: f32,
    w: f32,
    h: f32,
    r: f32,
    palette: &HelmetPalette,
    lut: &GammaLut,
) {
    if w <= 0.0 || h <= 0.0 {
        return;
    }
    let r = r.min(w * 0.5).min(h * 0.5).max(0.0);
    for y in (y0.floor() as i32)..=((y0 + h).ceil() as i32) {
        for x in (x0.floor() as i32)..=((x0 + w).ceil() as i32) {
            if !in_rounded_rect(x as f32, y as f32, x0, y0, w, h, r) {
                continue;
            }
            if x < 0 || y < 0 || x >= fb.width as i32 || y >= fb.height as i32 {
                continue;
            }
            let idx = y as usize * fb.width + x as usize;
            let live = if (x as usize) < frame.width && (y as usize) < frame.height {
                frame.pixels[y as usize * frame.width + x as usize]
            } else {
                palette.shadow
            };
            // Camera at 0.85 over the shell, then an 18% tint.
            let seen = lut.mix_over(fb.pixels[idx], live, 0.85);
            fb.pixels[idx] = lut.mix_over(seen, palette.stroke, 0.18);
        }
    }
}

/// Soft additive glow disc with gaussian falloff (used for antenna tips).
fn draw_glow_disc(fb: &mut FrameBuffer, cx: f32, cy: f32, r: f32, color: u32, strength: f32) {
    if r <= 0.0 {
        return;
    }
    let base_r = ((color >> 16) & 0xFF) as f32;
    let base_g = ((color >> 8) & 0xFF) as f32;
    let base_b = (color & 0xFF) as f32;
    let r2 = r * r;
    let sigma = r * 0.5;
    let denom = 2.0 * sigma * sigma;

    for y in ((cy - r).floor() as i32)..=((cy + r).ceil() as i32) {
        for x in ((cx - r).floor() as i32)..=((cx + r).ceil() as i32) {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            let d2 = dx * dx + dy * dy;
            if d2 > r2 {
                continue;
            }
            if x < 0 || y < 0 || x >= fb.width as i32 || y >= fb.height as i32 {
                continue;
            }
            let wgt = (-d2 / denom).exp() * strength;
            let idx = y as usize * fb.width + x as usize;
            let old = fb.pixels[idx];
            let nr = (((old >> 16) & 0xFF) as f32 + base_r * wgt).min(255.0) as u32;
            let ng = (((old >> 8) & 0xFF) as f32 + base_g * wgt).min(255.0) as u32;
            let nb = ((old & 0xFF) as f32 + base_b * wgt).min(255.0) as u32;
            fb.pixels[idx] = (nr << 16) | (ng << 8) | nb;
        }
    }
}

/* ------------------------------- blend modes ------------------------------- */

#[derive(Clone, Copy)]
enum BlendMode {
    Multiply,
    Overlay,
    SoftLight,
}

/// Apply one blend-mode fill pass over a packed pixel with coverage `alpha`,
/// in sRGB space per channel (matching how layered canvas fills behave).
fn blend_pass(dst: u32, tone: u32, mode: BlendMode, alpha: f32) -> u32 {
    let mut out = 0u32;
    for shift in [16u32, 8, 0] {
        let d = (((dst >> shift) & 0xFF) as f32) / 255.0;
        let s = (((tone >> shift) & 0xFF) as f32) / 255.0;
        let blended = match mode {
            BlendMode::Multiply => d * s,
            BlendMode::Overlay => {
                if d < 0.5 {
                    2.0 * d * s
                } else {
                    1.0 - 2.0 * (1.0 - d) * (1.0 - s)
                }
            }
            BlendMode::SoftLight => {
                if s <= 0.5 {
                    d - (1.0 - 2.0 * s) * d * (1.0 - d)
                } else {
                    let g = if d <= 0.25 {
                        ((16.0 * d - 12.0) * d + 4.0) * d
                    } else {
                        d.sqrt()
                    };
                    d + (2.0 * s - 1.0) * (g - d)
                }
            }
        };
        let mixed = d + (blended - d) * alpha;
        out |= (((mixed.clamp(0.0, 1.0) * 255.0).round()) as u32) << shift;
    }
    out
}
