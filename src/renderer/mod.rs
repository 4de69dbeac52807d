mod color;
mod font;

// Re-export public API
pub use color::{hsb_to_rgb, Hsba};
pub use font::render_status;
pub(crate) use font::{draw_text, draw_text_sized, FONT_HEIGHT, STATUS_BAR_HEIGHT};

use glam::DVec2;

/// Drawing sink for the simulation. Coordinates are viewport pixels.
pub trait Canvas {
    /// Paint a translucent wash of `color` over the whole surface.
    fn fade(&mut self, color: Hsba);

    /// Alpha-blended segment from `from` to `to`.
    fn line(&mut self, from: DVec2, to: DVec2, color: Hsba, weight: f64);

    /// Opaque fill.
    fn clear(&mut self, color: Hsba) {
        self.fade(Hsba { alpha: 100.0, ..color });
    }
}

/// Dynamic render layout computed from window pixel size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderConfig {
    pub display_width: usize,
    pub display_height: usize,
    pub frame_width: usize,
    pub frame_height: usize,
    pub status_height: usize,
}

impl RenderConfig {
    /// Split a window into the particle area and, optionally, the status bar
    /// underneath. Display dimensions may be zero for a collapsed window.
    pub fn fit(pixel_width: usize, pixel_height: usize, status_bar: bool) -> Self {
        let status_height = if status_bar && pixel_height > STATUS_BAR_HEIGHT {
            STATUS_BAR_HEIGHT
        } else {
            0
        };
        Self {
            display_width: pixel_width,
            display_height: pixel_height - status_height,
            frame_width: pixel_width,
            frame_height: pixel_height,
            status_height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.frame_width == 0 || self.frame_height == 0
    }
}

/// Persistent trail buffer. Channels are kept as f32 so a 2% fade keeps
/// converging on the background instead of stalling at 8-bit rounding.
pub struct Framebuffer {
    width: usize,
    height: usize,
    background: [f32; 3],
    pixels: Vec<[f32; 3]>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize, background: Hsba) -> Self {
        let background = background.to_rgb();
        Self {
            width,
            height,
            background,
            pixels: vec![background; width * height],
        }
    }

    #[cfg(test)]
    pub fn width(&self) -> usize {
        self.width
    }

    #[cfg(test)]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Reallocate and clear to the background. No-op when the size is unchanged.
    pub fn resize(&mut self, width: usize, height: usize) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width * height, self.background);
    }

    #[cfg(test)]
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let p = self.pixels[y * self.width + x];
        Some([to_byte(p[0]), to_byte(p[1]), to_byte(p[2])])
    }

    #[inline]
    fn blend(&mut self, x: isize, y: isize, rgb: [f32; 3], alpha: f32) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let p = &mut self.pixels[y as usize * self.width + x as usize];
        for c in 0..3 {
            p[c] += (rgb[c] - p[c]) * alpha;
        }
    }

    /// Copy into the display area of an RGBA frame laid out by `cfg`.
    /// The buffer is resized as needed; rows outside the scene stay black.
    pub fn compose_into(&self, buf: &mut Vec<u8>, cfg: &RenderConfig) {
        let fw = cfg.frame_width;
        let needed = fw * cfg.frame_height * 4;
        buf.clear();
        buf.resize(needed, 0);
        for px in buf.chunks_exact_mut(4) {
            px[3] = 255;
        }
        let w = self.width.min(cfg.display_width);
        let h = self.height.min(cfg.display_height);
        for y in 0..h {
            for x in 0..w {
                let p = self.pixels[y * self.width + x];
                let off = (y * fw + x) * 4;
                buf[off] = to_byte(p[0]);
                buf[off + 1] = to_byte(p[1]);
                buf[off + 2] = to_byte(p[2]);
            }
        }
    }
}

#[inline]
fn to_byte(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

impl Canvas for Framebuffer {
    fn fade(&mut self, color: Hsba) {
        let rgb = color.to_rgb();
        let alpha = color.opacity();
        if alpha <= 0.0 {
            return;
        }
        for p in self.pixels.iter_mut() {
            for c in 0..3 {
                p[c] += (rgb[c] - p[c]) * alpha;
            }
        }
    }

    fn line(&mut self, from: DVec2, to: DVec2, color: Hsba, weight: f64) {
        let alpha = color.opacity();
        if alpha <= 0.0 || !from.x.is_finite() || !from.y.is_finite() || !to.x.is_finite() || !to.y.is_finite() {
            return;
        }
        let rgb = color.to_rgb();
        // Fractional weight above one pixel thickens the stroke with a partially
        // covered second row/column.
        let extra = ((weight - 1.0).clamp(0.0, 1.0)) as f32 * alpha;
        draw_line_blended(
            self,
            from.x.floor() as isize,
            from.y.floor() as isize,
            to.x.floor() as isize,
            to.y.floor() as isize,
            rgb,
            alpha,
            extra,
        );
    }
}

/// Bresenham line drawing with alpha-blended color. Pixels outside the
/// buffer are skipped.
#[allow(clippy::too_many_arguments)]
fn draw_line_blended(
    fb: &mut Framebuffer,
    x0: isize, y0: isize, x1: isize, y1: isize,
    color: [f32; 3], alpha: f32, extra: f32,
) {
    let mut cx = x0;
    let mut cy = y0;
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx: isize = if x0 < x1 { 1 } else { -1 };
    let sy: isize = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    // Thicken across the minor axis.
    let (ox, oy) = if dx >= -dy { (0, 1) } else { (1, 0) };

    loop {
        fb.blend(cx, cy, color, alpha);
        if extra > 0.0 {
            fb.blend(cx + ox, cy + oy, color, extra);
        }
        if cx == x1 && cy == y1 { break; }
        let e2 = 2 * err;
        if e2 >= dy { err += dy; cx += sx; }
        if e2 <= dx { err += dx; cy += sy; }
    }
}

/// Convert an RGBA frame into minifb's 0RGB u32 buffer.
pub fn rgba_to_argb(rgba: &[u8], out: &mut Vec<u32>) {
    out.clear();
    out.extend(
        rgba.chunks_exact(4)
            .map(|px| color::pack_rgb([px[0], px[1], px[2]])),
    );
}

/// Test double that records every draw call.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingCanvas {
    pub fades: Vec<Hsba>,
    pub lines: Vec<(DVec2, DVec2, Hsba, f64)>,
}

#[cfg(test)]
impl Canvas for RecordingCanvas {
    fn fade(&mut self, color: Hsba) {
        self.fades.push(color);
    }

    fn line(&mut self, from: DVec2, to: DVec2, color: Hsba, weight: f64) {
        self.lines.push((from, to, color, weight));
    }
}
