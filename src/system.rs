use glam::DVec2;
use rand::rngs::SmallRng;
use rand::Rng;
use serde::Deserialize;

use crate::config::ParticleConfig;
use crate::field::FieldGrid;
use crate::particle::{Particle, Stroke};
use crate::renderer::Canvas;

/// How the live particle collection moves toward its target size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrowthPolicy {
    /// One particle added or removed per frame.
    #[default]
    Gradual,
    /// Whole difference applied as soon as the target changes.
    Bulk,
}

/// Valid drawing area in pixels. Both sides are always positive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    /// `None` for zero, negative or non-finite geometry.
    pub fn new(width: f64, height: f64) -> Option<Self> {
        if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
            Some(Self { width, height })
        } else {
            None
        }
    }

    pub fn from_pixels(width: i64, height: i64) -> Option<Self> {
        Self::new(width as f64, height as f64)
    }
}

/// Owns every particle plus the flow-field grid they sample.
pub struct ParticleSystem {
    particles: Vec<Particle>,
    grid: FieldGrid,
    scale: f64,
    viewport: Viewport,
    target_count: usize,
    growth: GrowthPolicy,
    max_speed: f64,
    alpha_min: f64,
    alpha_max: f64,
    rng: SmallRng,
}

impl ParticleSystem {
    pub fn new(cfg: &ParticleConfig, scale: f64, viewport: Viewport, rng: SmallRng) -> Self {
        let (cols, rows) = FieldGrid::dims_for(viewport.width, viewport.height, scale);
        let mut system = Self {
            particles: Vec::with_capacity(cfg.initial_count),
            grid: FieldGrid::new(cols, rows),
            scale,
            viewport,
            target_count: cfg.initial_count,
            growth: cfg.growth,
            max_speed: cfg.max_speed,
            alpha_min: cfg.alpha_min.min(cfg.alpha_max),
            alpha_max: cfg.alpha_max.max(cfg.alpha_min),
            rng,
        };
        for _ in 0..cfg.initial_count {
            let p = system.spawn();
            system.particles.push(p);
        }
        system
    }

    #[cfg(test)]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn target_count(&self) -> usize {
        self.target_count
    }

    pub fn grid(&self) -> &FieldGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut FieldGrid {
        &mut self.grid
    }

    /// Adopt a new viewport: recompute grid dimensions and reallocate it.
    /// Particles left outside are wrapped back in by the next step.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        let (cols, rows) = FieldGrid::dims_for(viewport.width, viewport.height, self.scale);
        self.grid.resize(cols, rows);
    }

    pub fn set_target_count(&mut self, n: usize) {
        self.target_count = n;
        if self.growth == GrowthPolicy::Bulk {
            self.converge();
        }
    }

    /// Advance one frame: follow, update, edges, draw for every particle.
    pub fn step(&mut self, intensity: f64, stroke: &Stroke, canvas: &mut dyn Canvas) {
        self.converge();

        let Viewport { width, height } = self.viewport;
        let grid = &self.grid;
        let scale = self.scale;
        for p in self.particles.iter_mut() {
            p.follow(grid, scale);
            p.update(intensity);
            p.edges(width, height);
            p.draw(canvas, stroke);
        }
    }

    fn converge(&mut self) {
        let limit = match self.growth {
            GrowthPolicy::Gradual => 1,
            GrowthPolicy::Bulk => usize::MAX,
        };
        let mut changed = 0;
        while changed < limit && self.particles.len() < self.target_count {
            let p = self.spawn();
            self.particles.push(p);
            changed += 1;
        }
        while changed < limit && self.particles.len() > self.target_count {
            self.particles.pop();
            changed += 1;
        }
    }

    fn spawn(&mut self) -> Particle {
        let x = self.rng.random_range(0.0..self.viewport.width);
        let y = self.rng.random_range(0.0..self.viewport.height);
        let alpha = self.rng.random_range(self.alpha_min..=self.alpha_max);
        Particle::new(DVec2::new(x, y), self.max_speed, alpha)
    }
}
