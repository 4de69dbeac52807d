use glam::DVec2;

use crate::field::FieldGrid;
use crate::renderer::{Canvas, Hsba};

/// Per-frame stroke settings shared by every particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    pub hue: f64,
    pub saturation: f64,
    pub brightness: f64,
    pub weight: f64,
}

/// A single point following the flow field and leaving a trail.
#[derive(Clone, Debug)]
pub struct Particle {
    pub pos: DVec2,
    pub vel: DVec2,
    pub acc: DVec2,
    /// Trail anchor: where the last drawn segment ended.
    pub prev: DVec2,
    pub max_speed: f64,
    /// Stroke alpha on a 0-100 scale, fixed at spawn.
    pub alpha: f64,
}

impl Particle {
    pub fn new(pos: DVec2, max_speed: f64, alpha: f64) -> Self {
        Self {
            pos,
            vel: DVec2::ZERO,
            acc: DVec2::ZERO,
            prev: pos,
            max_speed,
            alpha,
        }
    }

    /// Integrate one step. Top speed scales with the global intensity.
    pub fn update(&mut self, intensity: f64) {
        self.vel += self.acc;
        self.vel = self.vel.clamp_length_max((self.max_speed * intensity).max(0.0));
        self.pos += self.vel;
        self.acc = DVec2::ZERO;
    }

    /// Add the force of the cell under the particle, if there is one.
    pub fn follow(&mut self, grid: &FieldGrid, scale: f64) {
        if let Some(force) = cell_of(self.pos, scale).and_then(|(c, r)| grid.get(c, r)) {
            self.apply_force(force);
        }
    }

    pub fn apply_force(&mut self, force: DVec2) {
        self.acc += force;
    }

    /// Wrap around the viewport. Each wrap moves the trail anchor too so no
    /// segment is drawn across the screen.
    pub fn edges(&mut self, width: f64, height: f64) {
        if self.pos.x > width {
            self.pos.x = 0.0;
            self.reset_trail();
        }
        if self.pos.x < 0.0 {
            self.pos.x = width;
            self.reset_trail();
        }
        if self.pos.y > height {
            self.pos.y = 0.0;
            self.reset_trail();
        }
        if self.pos.y < 0.0 {
            self.pos.y = height;
            self.reset_trail();
        }
    }

    /// Emit the segment travelled since the last draw, then move the anchor.
    pub fn draw(&mut self, canvas: &mut dyn Canvas, stroke: &Stroke) {
        let color = Hsba::new(stroke.hue, stroke.saturation, stroke.brightness, self.alpha);
        canvas.line(self.prev, self.pos, color, stroke.weight);
        self.reset_trail();
    }

    fn reset_trail(&mut self) {
        self.prev = self.pos;
    }
}

/// Grid cell containing `pos`, or `None` for negative / non-finite positions.
fn cell_of(pos: DVec2, scale: f64) -> Option<(usize, usize)> {
    let cx = (pos.x / scale).floor();
    let cy = (pos.y / scale).floor();
    if !cx.is_finite() || !cy.is_finite() || cx < 0.0 || cy < 0.0 {
        return None;
    }
    Some((cx as usize, cy as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::RecordingCanvas;

    fn stroke() -> Stroke {
        Stroke {
            hue: 200.0,
            saturation: 50.0,
            brightness: 80.0,
            weight: 1.5,
        }
    }

    #[test]
    fn test_new_particle_at_rest() {
        let p = Particle::new(DVec2::new(10.0, 20.0), 2.0, 75.0);
        assert_eq!(p.vel, DVec2::ZERO);
        assert_eq!(p.acc, DVec2::ZERO);
        assert_eq!(p.prev, p.pos);
    }

    #[test]
    fn test_update_integrates_and_clears_acceleration() {
        let mut p = Particle::new(DVec2::new(10.0, 10.0), 2.0, 75.0);
        p.apply_force(DVec2::new(0.5, 0.0));
        p.update(1.0);
        assert_eq!(p.vel, DVec2::new(0.5, 0.0));
        assert_eq!(p.pos, DVec2::new(10.5, 10.0));
        assert_eq!(p.acc, DVec2::ZERO, "acceleration should reset after update");
    }

    #[test]
    fn test_update_speed_limit_scales_with_intensity() {
        let mut p = Particle::new(DVec2::new(100.0, 100.0), 2.0, 75.0);
        for _ in 0..20 {
            p.apply_force(DVec2::new(0.5, 0.5));
            p.update(1.5);
        }
        assert!((p.vel.length() - 3.0).abs() < 1e-9, "speed should cap at 2 * 1.5, got {}", p.vel.length());

        p.apply_force(DVec2::ZERO);
        p.update(0.5);
        assert!((p.vel.length() - 1.0).abs() < 1e-9, "speed should cap at 2 * 0.5, got {}", p.vel.length());
    }

    #[test]
    fn test_update_negative_intensity_stops_particle() {
        let mut p = Particle::new(DVec2::new(50.0, 50.0), 2.0, 75.0);
        p.apply_force(DVec2::new(1.0, 0.0));
        p.update(-1.0);
        assert_eq!(p.vel, DVec2::ZERO, "a negative limit should not reverse the velocity");
        assert_eq!(p.pos, DVec2::new(50.0, 50.0));
    }

    #[test]
    fn test_follow_adds_cell_force() {
        let mut grid = FieldGrid::new(4, 4);
        let mut f = crate::field::NoiseField::new(&crate::config::FieldConfig::default(), 5);
        f.regenerate(&mut grid, 0.0);
        let mut p = Particle::new(DVec2::new(45.0, 25.0), 2.0, 75.0);
        p.follow(&grid, 20.0);
        assert_eq!(Some(p.acc), grid.get(2, 1));
    }

    #[test]
    fn test_follow_out_of_range_is_noop() {
        let grid = FieldGrid::new(4, 4);
        for pos in [
            DVec2::new(80.0, 10.0),
            DVec2::new(10.0, 80.0),
            DVec2::new(-1.0, 10.0),
            DVec2::new(10.0, -0.5),
            DVec2::new(f64::NAN, 10.0),
            DVec2::new(5000.0, 5000.0),
        ] {
            let mut p = Particle::new(pos, 2.0, 75.0);
            p.follow(&grid, 20.0);
            assert_eq!(p.acc, DVec2::ZERO, "lookup at {:?} should apply no force", pos);
        }
    }

    #[test]
    fn test_edges_wrap_right_to_left_resets_anchor() {
        let mut p = Particle::new(DVec2::new(99.0, 50.0), 2.0, 75.0);
        p.pos = DVec2::new(101.0, 50.0);
        p.edges(100.0, 80.0);
        assert_eq!(p.pos.x, 0.0);
        assert_eq!(p.prev, p.pos, "trail anchor should follow the wrap");
    }

    #[test]
    fn test_edges_wrap_all_sides() {
        let mut p = Particle::new(DVec2::new(-0.5, 40.0), 2.0, 75.0);
        p.edges(100.0, 80.0);
        assert_eq!(p.pos, DVec2::new(100.0, 40.0));

        let mut p = Particle::new(DVec2::new(40.0, 80.5), 2.0, 75.0);
        p.edges(100.0, 80.0);
        assert_eq!(p.pos, DVec2::new(40.0, 0.0));

        let mut p = Particle::new(DVec2::new(40.0, -3.0), 2.0, 75.0);
        p.edges(100.0, 80.0);
        assert_eq!(p.pos, DVec2::new(40.0, 80.0));
        assert_eq!(p.prev, p.pos);
    }

    #[test]
    fn test_edges_inside_keeps_anchor() {
        let mut p = Particle::new(DVec2::new(10.0, 10.0), 2.0, 75.0);
        p.pos = DVec2::new(11.0, 11.0);
        p.edges(100.0, 80.0);
        assert_eq!(p.prev, DVec2::new(10.0, 10.0));
    }

    #[test]
    fn test_draw_emits_segment_and_moves_anchor() {
        let mut canvas = RecordingCanvas::default();
        let mut p = Particle::new(DVec2::new(10.0, 10.0), 2.0, 75.0);
        p.pos = DVec2::new(12.0, 11.0);
        p.draw(&mut canvas, &stroke());

        assert_eq!(canvas.lines.len(), 1);
        let (from, to, color, weight) = canvas.lines[0];
        assert_eq!(from, DVec2::new(10.0, 10.0));
        assert_eq!(to, DVec2::new(12.0, 11.0));
        assert_eq!(color, Hsba::new(200.0, 50.0, 80.0, 75.0));
        assert_eq!(weight, 1.5);
        assert_eq!(p.prev, p.pos);
    }

    #[test]
    fn test_wrap_then_draw_is_zero_length() {
        let mut canvas = RecordingCanvas::default();
        let mut p = Particle::new(DVec2::new(99.5, 50.0), 2.0, 75.0);
        p.apply_force(DVec2::new(1.0, 0.0));
        p.update(1.0);
        p.edges(100.0, 80.0);
        p.draw(&mut canvas, &stroke());
        let (from, to, _, _) = canvas.lines[0];
        assert_eq!(from, to, "no line should cross the screen after a wrap");
        assert_eq!(to.x, 0.0);
    }
}
