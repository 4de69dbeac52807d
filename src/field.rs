use std::f64::consts::TAU;

use glam::DVec2;
use noise::{NoiseFn, Perlin};

use crate::config::FieldConfig;

/// Largest f64 strictly below 1.0, so normalized noise stays in [0, 1).
const BELOW_ONE: f64 = 1.0 - f64::EPSILON;

/// Flow-field storage: one vector per `scale`-sized cell of the viewport.
pub struct FieldGrid {
    cols: usize,
    rows: usize,
    cells: Vec<DVec2>,
}

impl FieldGrid {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            cells: vec![DVec2::ZERO; cols * rows],
        }
    }

    /// Grid dimensions for a viewport: `floor(w / scale) x floor(h / scale)`.
    pub fn dims_for(width: f64, height: f64, scale: f64) -> (usize, usize) {
        if !(scale > 0.0) || !(width > 0.0) || !(height > 0.0) {
            return (0, 0);
        }
        ((width / scale).floor() as usize, (height / scale).floor() as usize)
    }

    /// Reallocate to new dimensions. Content is discarded.
    pub fn resize(&mut self, cols: usize, rows: usize) {
        self.cols = cols;
        self.rows = rows;
        self.cells.clear();
        self.cells.resize(cols * rows, DVec2::ZERO);
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Cell lookup; `None` for anything outside the current dimensions.
    pub fn get(&self, col: usize, row: usize) -> Option<DVec2> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.cells.get(row * self.cols + col).copied()
    }

    fn set(&mut self, col: usize, row: usize, v: DVec2) {
        let i = row * self.cols + col;
        self.cells[i] = v;
    }
}

/// Coherent-noise direction generator.
///
/// Each cell's direction comes from 3D Perlin noise sampled at
/// `(col * noise_step, row * noise_step, depth)`. `depth` is the per-frame
/// offset that drifts by the smoothed speed parameter, which is what makes
/// the flow evolve over time.
pub struct NoiseField {
    perlin: Perlin,
    noise_step: f64,
    angle_multiplier: f64,
    magnitude: f64,
    depth: f64,
}

impl NoiseField {
    pub fn new(cfg: &FieldConfig, seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            noise_step: cfg.noise_step,
            angle_multiplier: cfg.angle_multiplier,
            magnitude: cfg.magnitude,
            depth: 0.0,
        }
    }

    /// Depth offset the next `regenerate` will sample at.
    #[cfg(test)]
    pub fn depth(&self) -> f64 {
        self.depth
    }

    /// Noise value at a cell, normalized to [0, 1).
    pub fn noise01(&self, depth: f64, col: usize, row: usize) -> f64 {
        let raw = self.perlin.get([
            col as f64 * self.noise_step,
            row as f64 * self.noise_step,
            depth,
        ]);
        (raw * 0.5 + 0.5).clamp(0.0, BELOW_ONE)
    }

    /// Flow angle at a cell in [0, angle_multiplier * 2pi).
    pub fn sample(&self, depth: f64, col: usize, row: usize) -> f64 {
        self.noise01(depth, col, row) * TAU * self.angle_multiplier
    }

    /// Fixed-magnitude flow vector at a cell.
    pub fn vector(&self, depth: f64, col: usize, row: usize) -> DVec2 {
        DVec2::from_angle(self.sample(depth, col, row)) * self.magnitude
    }

    /// Overwrite every cell for the current depth, then advance depth by `speed`.
    pub fn regenerate(&mut self, grid: &mut FieldGrid, speed: f64) {
        let depth = self.depth;
        for row in 0..grid.rows() {
            for col in 0..grid.cols() {
                let v = self.vector(depth, col, row);
                grid.set(col, row, v);
            }
        }
        if speed.is_finite() {
            self.depth += speed;
        }
    }
}
