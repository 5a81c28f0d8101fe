// Named, fixed color sets for the overlay variants. Defined once at startup
// (const tables); the selection snapshot carries only the id.

/// Color roles for a helmet render.
#[derive(Clone, Copy, Debug)]
pub struct HelmetPalette {
    pub base: u32,      // shell fill
    pub highlight: u32, // dome sheen, accent ring
    pub shadow: u32,    // underside shading, tick marks
    pub stroke: u32,    // outlines, visor tint
}

/// Color roles for the alien effect.
#[derive(Clone, Copy, Debug)]
pub struct AlienPalette {
    pub base: u32,    // skin base tone (multiply pass)
    pub overlay: u32, // accent tone (overlay pass)
    pub texture: u32, // highlight tone (soft-light pass)
    pub antenna: u32, // antenna stalks and tips
    pub glow: u32,    // blurred glow discs behind the tips
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HelmetColorId {
    White,
    Crimson,
    Azure,
    Gold,
}

impl HelmetColorId {
    pub fn cycled(self) -> Self {
        match self {
            HelmetColorId::White => HelmetColorId::Crimson,
            HelmetColorId::Crimson => HelmetColorId::Azure,
            HelmetColorId::Azure => HelmetColorId::Gold,
            HelmetColorId::Gold => HelmetColorId::White,
        }
    }

    /// Short tag for the HUD line.
    pub fn label(self) -> &'static str {
        match self {
            HelmetColorId::White => "WHITE",
            HelmetColorId::Crimson => "CRIMSON",
            HelmetColorId::Azure => "AZURE",
            HelmetColorId::Gold => "GOLD",
        }
    }

    pub fn palette(self) -> &'static HelmetPalette {
        match self {
            HelmetColorId::White => &HELMET_WHITE,
            HelmetColorId::Crimson => &HELMET_CRIMSON,
            HelmetColorId::Azure => &HELMET_AZURE,
            HelmetColorId::Gold => &HELMET_GOLD,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlienColorId {
    Green,
    Violet,
    Cyan,
}

impl AlienColorId {
    pub fn cycled(self) -> Self {
        match self {
            AlienColorId::Green => AlienColorId::Violet,
            AlienColorId::Violet => AlienColorId::Cyan,
            AlienColorId::Cyan => AlienColorId::Green,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AlienColorId::Green => "GREEN",
            AlienColorId::Violet => "VIOLET",
            AlienColorId::Cyan => "CYAN",
        }
    }

    pub fn palette(self) -> &'static AlienPalette {
        match self {
            AlienColorId::Green => &ALIEN_GREEN,
            AlienColorId::Violet => &ALIEN_VIOLET,
            AlienColorId::Cyan => &ALIEN_CYAN,
        }
    }
}

const HELMET_WHITE: HelmetPalette = HelmetPalette {
    base: 0x00_F2_F2_F2,
    highlight: 0x00_FF_FF_FF,
    shadow: 0x00_B8_BE_C6,
    stroke: 0x00_3A_3F_46,
};

const HELMET_CRIMSON: HelmetPalette = HelmetPalette {
    base: 0x00_C6_28_28,
    highlight: 0x00_E5_73_73,
    shadow: 0x00_7F_16_16,
    stroke: 0x00_2B_0A_0A,
};

const HELMET_AZURE: HelmetPalette = HelmetPalette {
    base: 0x00_1E_6F_D9,
    highlight: 0x00_7F_B3_F0,
    shadow: 0x00_10_3D_78,
    stroke: 0x00_0A_1E_3C,
};

const HELMET_GOLD: HelmetPalette = HelmetPalette {
    base: 0x00_D9_A8_1E,
    highlight: 0x00_F0_D8_7F,
    shadow: 0x00_78_5C_10,
    stroke: 0x00_3C_2E_0A,
};

const ALIEN_GREEN: AlienPalette = AlienPalette {
    base: 0x00_3F_A3_4D,
    overlay: 0x00_2E_7D_32,
    texture: 0x00_81_C7_84,
    antenna: 0x00_1B_5E_20,
    glow: 0x00_B9_F6_CA,
};

const ALIEN_VIOLET: AlienPalette = AlienPalette {
    base: 0x00_8E_4D_A3,
    overlay: 0x00_6A_1B_9A,
    texture: 0x00_CE_93_D8,
    antenna: 0x00_4A_14_8C,
    glow: 0x00_EA_80_FC,
};

const ALIEN_CYAN: AlienPalette = AlienPalette {
    base: 0x00_26_A6_A6,
    overlay: 0x00_00_83_8F,
    texture: 0x00_80_DE_EA,
    antenna: 0x00_00_60_64,
    glow: 0x00_84_FF_FF,
};
