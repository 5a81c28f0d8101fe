// Gamma-correct pixel mixing via lookup tables instead of powf per channel.
// The visor tint and alien skin fills blend dozens of thousands of pixels per
// frame, so the conversion cost matters.

pub struct GammaLut {
    // sRGB(0..255) -> linear (0..1) as f32
    srgb_to_linear: [f32; 256],
    // linear(0..1) -> sRGB(0..255) via 4096-step quantization
    // (index = (linear * 4095).round())
    linear_to_srgb: [u8; 4096],
}

impl GammaLut {
    /// Build both tables once at startup.
    pub fn new() -> Self {
        // sRGB -> linear
        let mut s2l = [0.0f32; 256];
        for v in 0..=255 {
            let c = v as f32 / 255.0;
            s2l[v] = if c <= 0.04045 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) };
        }

        // linear -> sRGB (quantized to 4096 steps)
        let mut l2s = [0u8; 4096];
        for i in 0..4096 {
            let l = (i as f32) / 4095.0; // 0..1
            let s = if l <= 0.003_130_8 { 12.92 * l } else { 1.055 * l.powf(1.0 / 2.4) - 0.055 };
            l2s[i] = (s * 255.0).round().clamp(0.0, 255.0) as u8;
        }

        Self { srgb_to_linear: s2l, linear_to_srgb: l2s }
    }

    #[inline]
    pub fn srgb_u8_to_linear(&self, v: u8) -> f32 {
        self.srgb_to_linear[v as usize]
    }

    #[inline]
    pub fn linear_to_srgb_u8(&self, l: f32) -> u8 {
        // Quantize to 0..4095 index
        let idx = (l.clamp(0.0, 1.0) * 4095.0).round() as usize;
        self.linear_to_srgb[idx]
    }

    /// Mix `src` over `dst` (both 0x00RRGGBB) with coverage `alpha` in [0,1],
    /// blending in linear light so tinted edges don't go muddy.
    #[inline]
    pub fn mix_over(&self, dst: u32, src: u32, alpha: f32) -> u32 {
        let a = alpha.clamp(0.0, 1.0);
        if a <= 0.0 {
            return dst;
        }
        if a >= 1.0 {
            return src;
        }
        let inv = 1.0 - a;
        let mut out = 0u32;
        for shift in [16u32, 8, 0] {
            let d = self.srgb_u8_to_linear(((dst >> shift) & 0xFF) as u8);
            let s = self.srgb_u8_to_linear(((src >> shift) & 0xFF) as u8);
            let m = self.linear_to_srgb_u8(a * s + inv * d) as u32;
            out |= m << shift;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_is_stable() {
        let lut = GammaLut::new();
        for v in [0u8, 1, 63, 128, 200, 254, 255] {
            let lin = lut.srgb_u8_to_linear(v);
            assert_eq!(lut.linear_to_srgb_u8(lin), v);
        }
    }

    #[test]
    fn mix_over_endpoints_pass_through() {
        let lut = GammaLut::new();
        let a = 0x00_12_34_56;
        let b = 0x00_FE_DC_BA;
        assert_eq!(lut.mix_over(a, b, 0.0), a);
        assert_eq!(lut.mix_over(a, b, 1.0), b);
    }
}
