/// Color in HSB space: hue in degrees (0-360), saturation, brightness and
/// alpha on 0-100 scales.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsba {
    pub hue: f64,
    pub saturation: f64,
    pub brightness: f64,
    pub alpha: f64,
}

impl Hsba {
    pub const fn new(hue: f64, saturation: f64, brightness: f64, alpha: f64) -> Self {
        Self {
            hue,
            saturation,
            brightness,
            alpha,
        }
    }

    /// RGB channels in 0.0-255.0.
    pub fn to_rgb(self) -> [f32; 3] {
        hsb_to_rgb(self.hue, self.saturation, self.brightness)
    }

    /// Alpha as a 0.0-1.0 blend factor. Values above 100 saturate.
    pub fn opacity(self) -> f32 {
        if self.alpha.is_nan() {
            return 0.0;
        }
        (self.alpha / 100.0).clamp(0.0, 1.0) as f32
    }
}

/// HSB (a.k.a. HSV) to RGB. Hue wraps; saturation and brightness clamp to 0-100.
pub fn hsb_to_rgb(hue: f64, saturation: f64, brightness: f64) -> [f32; 3] {
    let h = if hue.is_finite() { hue.rem_euclid(360.0) } else { 0.0 };
    let s = (saturation / 100.0).clamp(0.0, 1.0);
    let v = (brightness / 100.0).clamp(0.0, 1.0);

    let c = v * s;
    let hp = h / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = v - c;
    [
        ((r + m) * 255.0) as f32,
        ((g + m) * 255.0) as f32,
        ((b + m) * 255.0) as f32,
    ]
}

/// Pack 0-255 channels into minifb's 0RGB layout.
#[inline]
pub fn pack_rgb(rgb: [u8; 3]) -> u32 {
    (rgb[0] as u32) << 16 | (rgb[1] as u32) << 8 | rgb[2] as u32
}
