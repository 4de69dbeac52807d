use serde::Deserialize;
use tracing::info;

use crate::config::{Config, PresetConfig, SmoothingConfig};
use crate::sentiment::{Sentiment, SentimentSignal};

/// Smoothing rates are kept strictly inside (0, 1): zero would freeze a
/// parameter and one would snap it to the target in a single frame.
const MIN_RATE: f64 = 0.001;
const MAX_RATE: f64 = 0.999;

/// Guards `floor` against results like 319.99999999999994 for score 0.7.
const COUNT_EPSILON: f64 = 1e-9;

/// A point in visual-parameter space.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct VisualPreset {
    /// Degrees, wrapped into [0, 360).
    pub hue: f64,
    /// 0-100.
    pub saturation: f64,
    /// Depth advance per frame.
    pub speed: f64,
    /// Multiplier on particle top speed.
    pub intensity: f64,
}

impl VisualPreset {
    pub const POSITIVE: Self = Self::new(50.0, 80.0, 0.008, 1.5);
    pub const NEGATIVE: Self = Self::new(240.0, 70.0, 0.003, 0.7);
    pub const NEUTRAL: Self = Self::new(200.0, 50.0, 0.005, 1.0);

    pub const fn new(hue: f64, saturation: f64, speed: f64, intensity: f64) -> Self {
        Self {
            hue,
            saturation,
            speed,
            intensity,
        }
    }

    /// Wrap hue, clamp saturation to 0-100 and intensity to >= 0. Non-finite
    /// fields fall back to the neutral preset's value.
    pub fn normalized(self) -> Self {
        let or_neutral = |v: f64, fallback: f64| if v.is_finite() { v } else { fallback };
        Self {
            hue: or_neutral(self.hue, Self::NEUTRAL.hue).rem_euclid(360.0),
            saturation: or_neutral(self.saturation, Self::NEUTRAL.saturation).clamp(0.0, 100.0),
            speed: or_neutral(self.speed, Self::NEUTRAL.speed),
            intensity: or_neutral(self.intensity, Self::NEUTRAL.intensity).max(0.0),
        }
    }
}

impl Default for VisualPreset {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// One exponentially smoothed scalar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smoothed {
    current: f64,
    target: f64,
    rate: f64,
}

impl Smoothed {
    pub fn new(value: f64, rate: f64) -> Self {
        let rate = if rate.is_finite() { rate.clamp(MIN_RATE, MAX_RATE) } else { MIN_RATE };
        Self {
            current: value,
            target: value,
            rate,
        }
    }

    #[cfg(test)]
    pub fn current(&self) -> f64 {
        self.current
    }

    #[cfg(test)]
    pub fn target(&self) -> f64 {
        self.target
    }

    #[cfg(test)]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    /// Move a fixed fraction of the remaining distance. Never crosses the target.
    pub fn tick(&mut self) {
        let next = self.current + (self.target - self.current) * self.rate;
        self.current = if self.target >= self.current {
            next.min(self.target)
        } else {
            next.max(self.target)
        };
    }
}

/// Current/target pairs for every parameter the sentiment drives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualParameters {
    pub hue: Smoothed,
    pub saturation: Smoothed,
    pub speed: Smoothed,
    pub intensity: Smoothed,
}

impl VisualParameters {
    pub fn new(initial: VisualPreset, rates: &SmoothingConfig) -> Self {
        let initial = initial.normalized();
        Self {
            hue: Smoothed::new(initial.hue, rates.hue),
            saturation: Smoothed::new(initial.saturation, rates.saturation),
            speed: Smoothed::new(initial.speed, rates.speed),
            intensity: Smoothed::new(initial.intensity, rates.intensity),
        }
    }

    pub fn tick(&mut self) {
        self.hue.tick();
        self.hue.current = self.hue.current.rem_euclid(360.0);
        self.saturation.tick();
        self.speed.tick();
        self.intensity.tick();
    }

    pub fn set_targets(&mut self, preset: VisualPreset) {
        self.hue.set_target(preset.hue);
        self.saturation.set_target(preset.saturation);
        self.speed.set_target(preset.speed);
        self.intensity.set_target(preset.intensity);
    }

    pub fn current(&self) -> VisualPreset {
        VisualPreset::new(
            self.hue.current,
            self.saturation.current,
            self.speed.current,
            self.intensity.current,
        )
    }

    pub fn target(&self) -> VisualPreset {
        VisualPreset::new(
            self.hue.target,
            self.saturation.target,
            self.speed.target,
            self.intensity.target,
        )
    }
}

/// How far a score sits from the undecided midpoint, in [0, 1].
pub fn confidence_factor(score: f64) -> f64 {
    (SentimentSignal::normalize_score(score) - 0.5).abs() * 2.0
}

/// Maps sentiment events to parameter targets and eases the current values
/// toward them once per frame.
pub struct ParameterController {
    params: VisualParameters,
    presets: PresetConfig,
    base_count: usize,
    count_spread: usize,
    desired_count: Option<usize>,
    last_signal: Option<SentimentSignal>,
}

impl ParameterController {
    pub fn new(cfg: &Config) -> Self {
        Self {
            params: VisualParameters::new(cfg.presets.initial, &cfg.smoothing),
            presets: cfg.presets.clone(),
            base_count: cfg.particles.base_count,
            count_spread: cfg.particles.count_spread,
            desired_count: None,
            last_signal: None,
        }
    }

    pub fn tick(&mut self) {
        self.params.tick();
    }

    /// Retarget from a sentiment signal and return the particle count it asks for.
    pub fn apply_sentiment(&mut self, signal: &SentimentSignal) -> usize {
        let preset = self.preset_for(signal.sentiment).normalized();
        let confidence = confidence_factor(signal.score);
        let target = VisualPreset {
            intensity: preset.intensity * (0.5 + confidence),
            ..preset
        };
        self.params.set_targets(target);

        let count = desired_count(self.base_count, self.count_spread, confidence);
        self.desired_count = Some(count);
        self.last_signal = Some(signal.clone());

        info!(
            sentiment = %signal.sentiment,
            score = signal.score,
            confidence,
            intensity = target.intensity,
            count,
            "sentiment applied"
        );
        count
    }

    pub fn preset_for(&self, sentiment: Sentiment) -> VisualPreset {
        match sentiment {
            Sentiment::Positive => self.presets.positive,
            Sentiment::Negative => self.presets.negative,
            Sentiment::Neutral => self.presets.neutral,
        }
    }

    pub fn current(&self) -> VisualPreset {
        self.params.current()
    }

    pub fn target(&self) -> VisualPreset {
        self.params.target()
    }

    /// Particle count requested by the latest sentiment, if any arrived yet.
    pub fn desired_count(&self) -> Option<usize> {
        self.desired_count
    }

    pub fn last_signal(&self) -> Option<&SentimentSignal> {
        self.last_signal.as_ref()
    }
}

fn desired_count(base: usize, spread: usize, confidence: f64) -> usize {
    let n = base as f64 + confidence * spread as f64;
    (n + COUNT_EPSILON).floor().max(0.0) as usize
}
