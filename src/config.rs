use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::ConfigError;
use crate::params::VisualPreset;
use crate::system::GrowthPolicy;

/// Default config file looked up in the working directory.
pub const DEFAULT_PATH: &str = "aura.yaml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub display: DisplayConfig,
    pub field: FieldConfig,
    pub particles: ParticleConfig,
    pub smoothing: SmoothingConfig,
    pub presets: PresetConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: usize,
    pub height: usize,
    pub target_fps: usize,
    pub status_bar: bool,
    /// Background as (hue, saturation, brightness) on 360/100/100 scales.
    pub background: [f64; 3],
    /// Alpha (0-100) of the translucent background painted every frame.
    pub fade_alpha: f64,
    /// Trail brightness (0-100), constant across sentiments.
    pub brightness: f64,
    pub stroke_weight: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Cell size in pixels.
    pub scale: f64,
    /// Noise-space distance between neighbouring cells.
    pub noise_step: f64,
    /// Number of full turns the [0,1) noise value is stretched over.
    pub angle_multiplier: f64,
    pub magnitude: f64,
    pub seed: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    pub initial_count: usize,
    pub base_count: usize,
    pub count_spread: usize,
    pub max_speed: f64,
    pub alpha_min: f64,
    pub alpha_max: f64,
    pub growth: GrowthPolicy,
    pub seed: Option<u64>,
}

/// Per-frame exponential smoothing rates, one per visual parameter.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub hue: f64,
    pub saturation: f64,
    pub speed: f64,
    pub intensity: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PresetConfig {
    pub initial: VisualPreset,
    pub positive: VisualPreset,
    pub negative: VisualPreset,
    pub neutral: VisualPreset,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            display: DisplayConfig::default(),
            field: FieldConfig::default(),
            particles: ParticleConfig::default(),
            smoothing: SmoothingConfig::default(),
            presets: PresetConfig::default(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            target_fps: 60,
            status_bar: true,
            background: [0.0, 0.0, 10.0],
            fade_alpha: 2.0,
            brightness: 80.0,
            stroke_weight: 1.5,
        }
    }
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            scale: 20.0,
            noise_step: 0.1,
            angle_multiplier: 4.0,
            magnitude: 0.5,
            seed: None,
        }
    }
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            initial_count: 300,
            base_count: 200,
            count_spread: 300,
            max_speed: 2.0,
            alpha_min: 50.0,
            alpha_max: 150.0,
            growth: GrowthPolicy::Gradual,
            seed: None,
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            hue: 0.05,
            saturation: 0.05,
            speed: 0.02,
            intensity: 0.03,
        }
    }
}

impl Default for PresetConfig {
    fn default() -> Self {
        Self {
            initial: VisualPreset::NEUTRAL,
            positive: VisualPreset::POSITIVE,
            negative: VisualPreset::NEGATIVE,
            neutral: VisualPreset::NEUTRAL,
        }
    }
}

/// `value` if it is finite and satisfies `ok`, otherwise `default`.
fn repair(value: f64, default: f64, ok: impl Fn(f64) -> bool) -> f64 {
    if value.is_finite() && ok(value) {
        value
    } else {
        default
    }
}

impl Config {
    /// Pull hand-edited values back into ranges the engine can run with.
    pub fn sanitize(mut self) -> Self {
        let display = DisplayConfig::default();
        self.display.width = self.display.width.max(1);
        self.display.height = self.display.height.max(1);
        self.display.target_fps = self.display.target_fps.max(1);
        self.display.fade_alpha = repair(self.display.fade_alpha, display.fade_alpha, |_| true).clamp(0.0, 100.0);
        self.display.brightness = repair(self.display.brightness, display.brightness, |_| true).clamp(0.0, 100.0);
        self.display.stroke_weight = repair(self.display.stroke_weight, display.stroke_weight, |_| true).max(1.0);
        for (channel, default) in self.display.background.iter_mut().zip(display.background) {
            *channel = repair(*channel, default, |_| true);
        }

        let field = FieldConfig::default();
        self.field.scale = repair(self.field.scale, field.scale, |v| v >= 1.0);
        self.field.noise_step = repair(self.field.noise_step, field.noise_step, |v| v > 0.0);
        self.field.magnitude = repair(self.field.magnitude, field.magnitude, |v| v > 0.0);
        self.field.angle_multiplier = repair(self.field.angle_multiplier, field.angle_multiplier, |_| true);

        let particles = ParticleConfig::default();
        self.particles.max_speed = repair(self.particles.max_speed, particles.max_speed, |_| true).max(0.0);
        self.particles.alpha_min = repair(self.particles.alpha_min, particles.alpha_min, |_| true);
        self.particles.alpha_max = repair(self.particles.alpha_max, particles.alpha_max, |_| true);
        if self.particles.alpha_min > self.particles.alpha_max {
            std::mem::swap(&mut self.particles.alpha_min, &mut self.particles.alpha_max);
        }

        let smoothing = SmoothingConfig::default();
        self.smoothing.hue = repair(self.smoothing.hue, smoothing.hue, |_| true);
        self.smoothing.saturation = repair(self.smoothing.saturation, smoothing.saturation, |_| true);
        self.smoothing.speed = repair(self.smoothing.speed, smoothing.speed, |_| true);
        self.smoothing.intensity = repair(self.smoothing.intensity, smoothing.intensity, |_| true);

        for preset in [
            &mut self.presets.initial,
            &mut self.presets.positive,
            &mut self.presets.negative,
            &mut self.presets.neutral,
        ] {
            *preset = preset.normalized();
        }
        self
    }
}

/// Read and parse a config file without any fallback.
pub fn try_load(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&contents)?;
    Ok(cfg.sanitize())
}

/// Load config from `path`, using defaults when the file is absent or broken.
pub fn load(path: &Path) -> Config {
    if !path.exists() {
        debug!(path = %path.display(), "no config file; using defaults");
        return Config::default();
    }
    match try_load(path) {
        Ok(cfg) => {
            info!(path = %path.display(), "loaded config");
            cfg
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "config unusable; using defaults");
            Config::default()
        }
    }
}
