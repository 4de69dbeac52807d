use super::RenderConfig;

/// Status bar layout constants.
pub(crate) const FONT_WIDTH: usize = 5;
pub(crate) const FONT_HEIGHT: usize = 7;
pub(crate) const STATUS_PAD_TOP: usize = 3;
pub(crate) const STATUS_PAD_BOTTOM: usize = 2;
pub(crate) const STATUS_BAR_HEIGHT: usize = STATUS_PAD_TOP + FONT_HEIGHT + STATUS_PAD_BOTTOM;

const CHAR_STEP: usize = FONT_WIDTH + 1;
const STATUS_BG: [u8; 3] = [0x0D, 0x0D, 0x0D];
const STATUS_SEPARATOR: [u8; 3] = [0x33, 0x33, 0x33];
const STATUS_TEXT: [u8; 3] = [0x88, 0x88, 0x88];

/// 5x7 bitmap glyphs, lower 5 bits per row (bit4 = left). Upper-case
/// letters render with their lower-case shapes.
pub(crate) const fn glyph(ch: u8) -> [u8; FONT_HEIGHT] {
    match ch.to_ascii_lowercase() {
        b' ' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
        b'.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0x00],
        b',' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
        b':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        b'-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        b'+' => [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00],
        b'_' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F],
        b'%' => [0x18, 0x19, 0x02, 0x04, 0x08, 0x13, 0x03],
        b'/' => [0x01, 0x02, 0x02, 0x04, 0x08, 0x08, 0x10],
        b'<' => [0x01, 0x02, 0x04, 0x08, 0x04, 0x02, 0x01],
        b'>' => [0x10, 0x08, 0x04, 0x02, 0x04, 0x08, 0x10],
        b'=' => [0x00, 0x00, 0x1F, 0x00, 0x1F, 0x00, 0x00],
        b'(' => [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02],
        b')' => [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08],
        b'[' => [0x0E, 0x08, 0x08, 0x08, 0x08, 0x08, 0x0E],
        b']' => [0x0E, 0x02, 0x02, 0x02, 0x02, 0x02, 0x0E],
        b'|' => [0x04, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        b'0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        b'1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        b'2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        b'3' => [0x0E, 0x11, 0x01, 0x06, 0x01, 0x11, 0x0E],
        b'4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        b'5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        b'6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        b'7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        b'8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        b'9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        b'a' => [0x00, 0x00, 0x0E, 0x01, 0x0F, 0x11, 0x0F],
        b'b' => [0x10, 0x10, 0x16, 0x19, 0x11, 0x11, 0x1E],
        b'c' => [0x00, 0x00, 0x0E, 0x10, 0x10, 0x11, 0x0E],
        b'd' => [0x01, 0x01, 0x0D, 0x13, 0x11, 0x11, 0x0F],
        b'e' => [0x00, 0x00, 0x0E, 0x11, 0x1F, 0x10, 0x0E],
        b'f' => [0x06, 0x09, 0x08, 0x1C, 0x08, 0x08, 0x08],
        b'g' => [0x00, 0x00, 0x0F, 0x11, 0x0F, 0x01, 0x0E],
        b'h' => [0x10, 0x10, 0x16, 0x19, 0x11, 0x11, 0x11],
        b'i' => [0x04, 0x00, 0x0C, 0x04, 0x04, 0x04, 0x0E],
        b'j' => [0x02, 0x00, 0x06, 0x02, 0x02, 0x12, 0x0C],
        b'k' => [0x10, 0x10, 0x12, 0x14, 0x18, 0x14, 0x12],
        b'l' => [0x0C, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        b'm' => [0x00, 0x00, 0x1A, 0x15, 0x15, 0x11, 0x11],
        b'n' => [0x00, 0x00, 0x16, 0x19, 0x11, 0x11, 0x11],
        b'o' => [0x00, 0x00, 0x0E, 0x11, 0x11, 0x11, 0x0E],
        b'p' => [0x00, 0x00, 0x1E, 0x11, 0x1E, 0x10, 0x10],
        b'q' => [0x00, 0x00, 0x0D, 0x13, 0x0F, 0x01, 0x01],
        b'r' => [0x00, 0x00, 0x16, 0x19, 0x10, 0x10, 0x10],
        b's' => [0x00, 0x00, 0x0E, 0x10, 0x0E, 0x01, 0x1E],
        b't' => [0x08, 0x08, 0x1C, 0x08, 0x08, 0x09, 0x06],
        b'u' => [0x00, 0x00, 0x11, 0x11, 0x11, 0x13, 0x0D],
        b'v' => [0x00, 0x00, 0x11, 0x11, 0x11, 0x0A, 0x04],
        b'w' => [0x00, 0x00, 0x11, 0x11, 0x15, 0x15, 0x0A],
        b'x' => [0x00, 0x00, 0x11, 0x0A, 0x04, 0x0A, 0x11],
        b'y' => [0x00, 0x00, 0x11, 0x11, 0x0F, 0x01, 0x0E],
        b'z' => [0x00, 0x00, 0x1F, 0x02, 0x04, 0x08, 0x1F],
        _ => [0x00; FONT_HEIGHT],
    }
}

#[inline]
fn put_pixel(buf: &mut [u8], frame_width: usize, x: usize, y: usize, color: [u8; 3]) {
    if x >= frame_width {
        return;
    }
    let offset = (y * frame_width + x) * 4;
    if offset + 3 < buf.len() {
        buf[offset] = color[0];
        buf[offset + 1] = color[1];
        buf[offset + 2] = color[2];
        buf[offset + 3] = 255;
    }
}

pub(crate) fn draw_char(buf: &mut [u8], frame_width: usize, x: usize, y: usize, ch: u8, color: [u8; 3]) {
    let g = glyph(ch);
    for (row, bits) in g.iter().enumerate() {
        for col in 0..FONT_WIDTH {
            if bits & (1 << (FONT_WIDTH - 1 - col)) != 0 {
                put_pixel(buf, frame_width, x + col, y + row, color);
            }
        }
    }
}

/// Draw a string of text at (x, y). Returns the x position after the last character.
pub(crate) fn draw_text(buf: &mut [u8], frame_width: usize, x: usize, y: usize, text: &str, color: [u8; 3]) -> usize {
    let mut cx = x;
    for &ch in text.as_bytes() {
        draw_char(buf, frame_width, cx, y, ch, color);
        cx += CHAR_STEP;
    }
    cx
}

/// Draw text with each glyph resized to (cw x ch) pixels via nearest-neighbor.
/// Returns the x position after the last character.
#[allow(clippy::too_many_arguments)]
pub(crate) fn draw_text_sized(buf: &mut [u8], frame_width: usize, x: usize, y: usize, text: &str, color: [u8; 3], cw: usize, ch: usize) -> usize {
    let step = cw + cw / 5 + 1;
    let mut cx = x;
    for &byte in text.as_bytes() {
        let g = glyph(byte);
        for py in 0..ch {
            let bits = g[py * FONT_HEIGHT / ch];
            for px in 0..cw {
                if bits & (1 << (FONT_WIDTH - 1 - px * FONT_WIDTH / cw)) != 0 {
                    put_pixel(buf, frame_width, cx + px, y + py, color);
                }
            }
        }
        cx += step;
    }
    cx
}

/// Pixel width `draw_text` would use for `text`.
pub(crate) fn text_width(text: &str) -> usize {
    text.len() * CHAR_STEP
}

/// Draw the status bar below the scene: `left` from the left edge, `right`
/// right-aligned. `left` is truncated so the two never overlap.
pub fn render_status(buf: &mut [u8], cfg: &RenderConfig, left: &str, right: &str) {
    if cfg.status_height == 0 {
        return;
    }
    let fw = cfg.frame_width;
    let y_start = cfg.display_height;

    for y in y_start..cfg.frame_height {
        for x in 0..fw {
            put_pixel(buf, fw, x, y, STATUS_BG);
        }
    }
    for x in 0..fw {
        put_pixel(buf, fw, x, y_start, STATUS_SEPARATOR);
    }

    let text_y = y_start + STATUS_PAD_TOP;
    let right_x = fw.saturating_sub(4 + text_width(right));
    if !right.is_empty() && right_x > 4 {
        draw_text(buf, fw, right_x, text_y, right, STATUS_TEXT);
    }

    let limit = if right.is_empty() { fw } else { right_x.saturating_sub(CHAR_STEP) };
    let mut cx = 4;
    for &ch in left.as_bytes() {
        if cx + FONT_WIDTH > limit {
            break;
        }
        draw_char(buf, fw, cx, text_y, ch, STATUS_TEXT);
        cx += CHAR_STEP;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> RenderConfig {
        RenderConfig::fit(400, 300, true)
    }

    fn lit_in(buf: &[u8], fw: usize, xs: std::ops::Range<usize>, ys: std::ops::Range<usize>) -> bool {
        ys.into_iter()
            .any(|y| xs.clone().any(|x| buf[(y * fw + x) * 4] == STATUS_TEXT[0]))
    }

    #[test]
    fn test_status_punctuation_glyphs() {
        for ch in [b':', b',', b'%', b'(', b')', b'+'] {
            assert!(glyph(ch).iter().any(|&row| row != 0), "'{}' glyph should have bits", ch as char);
        }
    }

    #[test]
    fn test_uppercase_uses_lowercase_shape() {
        assert_eq!(glyph(b'F'), glyph(b'f'));
        assert_eq!(glyph(b'Q'), glyph(b'q'));
    }

    #[test]
    fn test_draw_text_returns_end_position() {
        let cfg = test_config();
        let mut buf = vec![0u8; cfg.frame_width * cfg.frame_height * 4];
        let end_x = draw_text(&mut buf, cfg.frame_width, 10, 10, "hello", [0xFF, 0xFF, 0xFF]);
        assert_eq!(end_x, 10 + text_width("hello"), "draw_text should return cursor position after text");

        let found = (10..10 + FONT_HEIGHT)
            .any(|y| (10..end_x).any(|x| buf[(y * cfg.frame_width + x) * 4] != 0));
        assert!(found, "draw_text should have drawn some pixels");
    }

    #[test]
    fn test_draw_text_clips_at_right_edge() {
        let mut buf = vec![0u8; 10 * 10 * 4];
        // would run off the 10px row; must not wrap onto the next one
        draw_text(&mut buf, 10, 6, 0, "mm", [0xFF, 0xFF, 0xFF]);
        for y in 0..FONT_HEIGHT {
            assert_eq!(buf[(y * 10) * 4], 0, "row {} wrapped into column 0", y);
        }
    }

    #[test]
    fn test_render_status_separator_line() {
        let cfg = test_config();
        let mut buf = vec![0u8; cfg.frame_width * cfg.frame_height * 4];
        render_status(&mut buf, &cfg, "positive 0.90", "p=440");

        let sep_offset = cfg.display_height * cfg.frame_width * 4;
        assert_eq!(buf[sep_offset], 0x33);
        assert_eq!(buf[sep_offset + 1], 0x33);
        assert_eq!(buf[sep_offset + 2], 0x33);
    }

    #[test]
    fn test_render_status_draws_both_sides() {
        let cfg = test_config();
        let fw = cfg.frame_width;
        let mut buf = vec![0u8; fw * cfg.frame_height * 4];
        render_status(&mut buf, &cfg, "neutral", "60 fps");
        let ys = cfg.display_height..cfg.frame_height;
        assert!(lit_in(&buf, fw, 0..fw / 2, ys.clone()), "left text missing");
        assert!(lit_in(&buf, fw, fw / 2..fw, ys), "right text missing");
    }

    #[test]
    fn test_render_status_leaves_scene_alone() {
        let cfg = test_config();
        let mut buf = vec![0u8; cfg.frame_width * cfg.frame_height * 4];
        render_status(&mut buf, &cfg, "text", "");
        let scene = &buf[..cfg.display_height * cfg.frame_width * 4];
        assert!(scene.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_render_status_disabled() {
        let cfg = RenderConfig::fit(200, 100, false);
        let mut buf = vec![0u8; cfg.frame_width * cfg.frame_height * 4];
        render_status(&mut buf, &cfg, "text", "right");
        assert!(buf.iter().all(|&b| b == 0));
    }
}
