use crate::params::VisualPreset;
use crate::renderer::{self, hsb_to_rgb, FONT_HEIGHT};

/// Number of gauge rows, particle count included.
const ROW_COUNT: usize = 5;

const GAUGE_WIDTH: usize = 10;

/// HUD panel state.
#[derive(Default)]
pub struct OverlayState {
    pub visible: bool,
}

impl OverlayState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }
}

/// Values shown on the HUD for one frame.
#[derive(Clone, Copy, Debug)]
pub struct HudData {
    pub current: VisualPreset,
    pub target: VisualPreset,
    pub particles: usize,
    pub target_particles: usize,
    /// Score attached to manually injected signals.
    pub manual_score: f64,
}

/// One gauge row: value range plus how to read it from a preset.
pub struct GaugeDef {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
    pub decimals: usize,
    pub get: fn(&VisualPreset) -> f64,
}

pub const GAUGE_DEFS: [GaugeDef; ROW_COUNT - 1] = [
    GaugeDef { name: "hue", min: 0.0, max: 360.0, decimals: 0, get: |p| p.hue },
    GaugeDef { name: "sat", min: 0.0, max: 100.0, decimals: 0, get: |p| p.saturation },
    GaugeDef { name: "speed", min: 0.0, max: 0.01, decimals: 4, get: |p| p.speed },
    GaugeDef { name: "inten", min: 0.0, max: 2.25, decimals: 2, get: |p| p.intensity },
];

/// Upper end of the particle gauge.
const PARTICLE_GAUGE_MAX: f64 = 500.0;

/// Colors used in the overlay panel.
mod colors {
    pub const BORDER: [u8; 3] = [0x44, 0x44, 0x44];
    pub const HEADER: [u8; 3] = [0x00, 0xBB, 0xBB];
    pub const LABEL: [u8; 3] = [0x88, 0x88, 0x88];
    pub const VALUE: [u8; 3] = [0xCC, 0xCC, 0xCC];
    pub const TARGET: [u8; 3] = [0x66, 0x66, 0x66];
    pub const MARKER: [u8; 3] = [0xFF, 0xFF, 0xFF];
    pub const TRACK: [u8; 3] = [0x22, 0x22, 0x22];
    pub const HINT: [u8; 3] = [0x44, 0x88, 0x88];
}

fn ratio(value: f64, min: f64, max: f64) -> f64 {
    if (max - min).abs() > f64::EPSILON && value.is_finite() {
        ((value - min) / (max - min)).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[inline]
fn set_px(buf: &mut [u8], frame_width: usize, x: usize, y: usize, color: [u8; 3]) {
    let off = (y * frame_width + x) * 4;
    if x < frame_width && off + 3 < buf.len() {
        buf[off] = color[0];
        buf[off + 1] = color[1];
        buf[off + 2] = color[2];
        buf[off + 3] = 255;
    }
}

/// Darken a rectangular region of the buffer by multiplying RGB by `factor`.
fn darken_rect(buf: &mut [u8], frame_width: usize, x0: usize, y0: usize, w: usize, h: usize, factor: f64) {
    for y in y0..y0 + h {
        for x in x0..(x0 + w).min(frame_width) {
            let off = (y * frame_width + x) * 4;
            if off + 3 < buf.len() {
                for c in &mut buf[off..off + 3] {
                    *c = (*c as f64 * factor) as u8;
                }
            }
        }
    }
}

/// Draw a 1px border rectangle.
fn draw_rect_border(buf: &mut [u8], frame_width: usize, x0: usize, y0: usize, w: usize, h: usize, color: [u8; 3]) {
    if w == 0 || h == 0 {
        return;
    }
    for x in x0..x0 + w {
        set_px(buf, frame_width, x, y0, color);
        set_px(buf, frame_width, x, y0 + h - 1, color);
    }
    for y in y0..y0 + h {
        set_px(buf, frame_width, x0, y, color);
        set_px(buf, frame_width, x0 + w - 1, y, color);
    }
}

/// Gauge with a solid `fill` up to `ratio` and a 1px marker at `target_ratio`.
#[allow(clippy::too_many_arguments)]
fn draw_gauge(
    buf: &mut [u8], frame_width: usize, x: usize, y: usize,
    ratio: f64, target_ratio: f64, width: usize, height: usize, fill: [u8; 3],
) {
    let filled = ((ratio * width as f64).round() as usize).min(width);
    let marker = ((target_ratio * (width - 1) as f64).round() as usize).min(width - 1);
    for dy in 0..height {
        for dx in 0..width {
            let color = if dx == marker {
                colors::MARKER
            } else if dx < filled {
                fill
            } else {
                colors::TRACK
            };
            set_px(buf, frame_width, x + dx, y + dy, color);
        }
    }
}

fn rgb_bytes(rgb: [f32; 3]) -> [u8; 3] {
    [rgb[0] as u8, rgb[1] as u8, rgb[2] as u8]
}

/// Render the HUD onto the frame buffer's display area.
/// Does nothing if `state.visible` is false.
pub fn render_overlay(
    buf: &mut [u8],
    frame_width: usize,
    display_width: usize,
    display_height: usize,
    state: &OverlayState,
    data: &HudData,
) {
    if !state.visible {
        return;
    }

    let cw: usize = 7;
    let ch: usize = 9;
    let sc = cw + cw / 5 + 1;
    let row_h = ch + 4;
    let pad = 10;

    // "speed  [gauge]  0.0050 > 0.0080"
    let content_chars = 36;
    let panel_w = (content_chars * sc + pad * 2).min(display_width.saturating_sub(4));
    let panel_h = (pad + row_h + 4 + ROW_COUNT * row_h + 6 + FONT_HEIGHT + 2 + pad)
        .min(display_height.saturating_sub(4));
    if panel_w < 2 || panel_h < 2 {
        return;
    }
    let px = 2;
    let py = 2;

    darken_rect(buf, frame_width, px, py, panel_w, panel_h, 0.25);
    draw_rect_border(buf, frame_width, px, py, panel_w, panel_h, colors::BORDER);

    let left = px + pad;
    let mut cy = py + pad;
    renderer::draw_text_sized(buf, frame_width, left, cy, "aura", colors::HEADER, cw, ch);
    cy += row_h + 4;

    let gauge_x = left + 6 * sc;
    let gauge_w = GAUGE_WIDTH * sc;
    let value_x = gauge_x + gauge_w + sc;

    for def in &GAUGE_DEFS {
        let cur = (def.get)(&data.current);
        let tgt = (def.get)(&data.target);
        let fill = if def.name == "hue" {
            rgb_bytes(hsb_to_rgb(cur, 80.0, 80.0))
        } else {
            [0x00, 0x99, 0x99]
        };
        renderer::draw_text_sized(buf, frame_width, left, cy, def.name, colors::LABEL, cw, ch);
        draw_gauge(
            buf, frame_width, gauge_x, cy,
            ratio(cur, def.min, def.max), ratio(tgt, def.min, def.max),
            gauge_w, ch, fill,
        );
        let cx = renderer::draw_text_sized(
            buf, frame_width, value_x, cy,
            &format!("{:.*}", def.decimals, cur), colors::VALUE, cw, ch,
        );
        renderer::draw_text_sized(
            buf, frame_width, cx + sc, cy,
            &format!("> {:.*}", def.decimals, tgt), colors::TARGET, cw, ch,
        );
        cy += row_h;
    }

    renderer::draw_text_sized(buf, frame_width, left, cy, "count", colors::LABEL, cw, ch);
    draw_gauge(
        buf, frame_width, gauge_x, cy,
        ratio(data.particles as f64, 0.0, PARTICLE_GAUGE_MAX),
        ratio(data.target_particles as f64, 0.0, PARTICLE_GAUGE_MAX),
        gauge_w, ch, [0x00, 0x99, 0x99],
    );
    let cx = renderer::draw_text_sized(
        buf, frame_width, value_x, cy, &data.particles.to_string(), colors::VALUE, cw, ch,
    );
    renderer::draw_text_sized(
        buf, frame_width, cx + sc, cy,
        &format!("> {}", data.target_particles), colors::TARGET, cw, ch,
    );
    cy += row_h + 6;

    renderer::draw_text(
        buf,
        frame_width,
        left,
        cy,
        &format!("1=pos 2=neg 3=neu  []=score {:.2}  space=close", data.manual_score),
        colors::HINT,
    );
}
