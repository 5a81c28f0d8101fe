// Core pixel/geometry types shared by every stage of the pipeline.

use crate::palette::{AlienColorId, HelmetColorId};

/// One frame's worth of packed pixels, ready for the window.
#[derive(Clone)]
pub struct FrameBuffer {
    pub width: usize,      // pixels across
    pub height: usize,     // pixels down
    pub pixels: Vec<u32>,  // each entry is 0x00RRGGBB for minifb
}

impl FrameBuffer {
    /// Allocate a black frame of the given size.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![0u32; width * height] }
    }

    /// Allocate a frame pre-filled with one color (flat backgrounds, tests).
    pub fn filled(width: usize, height: usize, color: u32) -> Self {
        Self { width, height, pixels: vec![color; width * height] }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.width * self.height
    }
}

/// Per-pixel person/background classification at frame resolution.
/// Produced fresh each iteration and consumed once; never carried over,
/// since the person will have moved by the next frame.
pub struct SegMask {
    pub width: usize,
    pub height: usize,
    pub person: Vec<bool>, // length = width * height; true = person pixel
}

impl SegMask {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, person: vec![false; width * height] }
    }

    /// Uniform mask; handy for tests and identity checks.
    pub fn uniform(width: usize, height: usize, person: bool) -> Self {
        Self { width, height, person: vec![person; width * height] }
    }
}

/// Ordered facial keypoints for one detected face.
/// Coordinates are normalized to [0,1] in both axes and must be scaled by the
/// output surface size before any drawing happens.
#[derive(Clone, Debug)]
pub struct LandmarkSet {
    pub points: Vec<(f32, f32)>,
}

/// Axis-aligned box around a landmark set, in output-surface pixels
/// (snapped to whole pixels). Derived every iteration from fresh landmarks;
/// never cached across frames, so window resizes pick up automatically.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceBox {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl FaceBox {
    #[inline]
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    #[inline]
    pub fn center_x(&self) -> f32 {
        (self.min_x + self.max_x) * 0.5
    }

    #[inline]
    pub fn center_y(&self) -> f32 {
        (self.min_y + self.max_y) * 0.5
    }

    /// True when the box has no usable area. Overlay code must skip drawing
    /// such boxes rather than feed zero sizes into circle/ellipse math.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.width() < 1.0 || self.height() < 1.0
    }
}

/// Which decoration is active. Mutually exclusive; switching takes effect on
/// the next iteration with no transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayKind {
    None,
    Helmet,
    Alien,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HelmetStyle {
    Classic,
    Modern,
}

impl HelmetStyle {
    pub fn toggled(self) -> Self {
        match self {
            HelmetStyle::Classic => HelmetStyle::Modern,
            HelmetStyle::Modern => HelmetStyle::Classic,
        }
    }
}

/// Which background fills the non-person region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackgroundKind {
    None,      // raw camera feed, no replacement
    Mars,      // static image stretched to the surface
    Starfield, // procedural dots, redrawn with fresh randomness per call
    Flat,      // single solid color
}

impl BackgroundKind {
    pub fn cycled(self) -> Self {
        match self {
            BackgroundKind::None => BackgroundKind::Mars,
            BackgroundKind::Mars => BackgroundKind::Starfield,
            BackgroundKind::Starfield => BackgroundKind::Flat,
            BackgroundKind::Flat => BackgroundKind::None,
        }
    }
}

/// Immutable snapshot of everything the user has selected, taken once at the
/// top of each iteration. Input handlers build a new snapshot instead of
/// poking fields mid-frame, so one iteration always sees one consistent state.
#[derive(Clone, Copy, Debug)]
pub struct Selection {
    pub overlay: OverlayKind,
    pub helmet_style: HelmetStyle,
    pub helmet_color: HelmetColorId,
    pub alien_color: AlienColorId,
    pub background: BackgroundKind,
    pub mesh_debug: bool, // landmark mesh diagnostic, only drawn when overlay == None
    pub sticker: bool,    // secondary decorative overlay, always on top
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            overlay: OverlayKind::Helmet,
            helmet_style: HelmetStyle::Classic,
            helmet_color: HelmetColorId::White,
            alien_color: AlienColorId::Green,
            background: BackgroundKind::Mars,
            mesh_debug: false,
            sticker: false,
        }
    }
}
