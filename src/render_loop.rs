//! Per-frame driver tying the controller, noise field and particles together.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::field::NoiseField;
use crate::params::ParameterController;
use crate::particle::Stroke;
use crate::renderer::{Canvas, Hsba};
use crate::sentiment::SentimentSignal;
use crate::system::{ParticleSystem, Viewport};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    /// No valid viewport seen yet; nothing is simulated or drawn.
    Uninitialized,
    Running,
    /// All simulation state released. Terminal.
    TornDown,
}

/// Shared flag another thread (e.g. a signal handler) can use to stop the loop.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything owned while the loop is alive. Dropped as a unit on teardown.
struct Context {
    controller: ParameterController,
    noise: NoiseField,
    system: Option<ParticleSystem>,
    /// False while the latest resize reported unusable geometry.
    viewport_valid: bool,
    /// Set on the first valid measurement; the canvas gets an opaque clear.
    needs_clear: bool,
}

pub struct RenderLoop {
    cfg: Config,
    ctx: Option<Box<Context>>,
    stop: StopHandle,
    frames: u64,
}

impl RenderLoop {
    pub fn new(cfg: Config) -> Self {
        let field_seed = cfg.field.seed.unwrap_or_else(rand::random);
        debug!(field_seed, "creating render loop");
        let ctx = Context {
            controller: ParameterController::new(&cfg),
            noise: NoiseField::new(&cfg.field, field_seed),
            system: None,
            viewport_valid: false,
            needs_clear: false,
        };
        Self {
            cfg,
            ctx: Some(Box::new(ctx)),
            stop: StopHandle::default(),
            frames: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        match &self.ctx {
            None => LoopState::TornDown,
            Some(ctx) if ctx.system.is_some() => LoopState::Running,
            Some(_) => LoopState::Uninitialized,
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Frames drawn while running.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn controller(&self) -> Option<&ParameterController> {
        self.ctx.as_ref().map(|ctx| &ctx.controller)
    }

    /// Live particle count, 0 before the first viewport and after teardown.
    pub fn particle_count(&self) -> usize {
        self.system().map_or(0, ParticleSystem::len)
    }

    /// Count the collection is converging to.
    pub fn target_count(&self) -> usize {
        match &self.ctx {
            Some(ctx) => match &ctx.system {
                Some(system) => system.target_count(),
                None => ctx
                    .controller
                    .desired_count()
                    .unwrap_or(self.cfg.particles.initial_count),
            },
            None => 0,
        }
    }

    pub fn system(&self) -> Option<&ParticleSystem> {
        self.ctx.as_ref().and_then(|ctx| ctx.system.as_ref())
    }

    /// First size report from the host. Invalid geometry leaves the loop
    /// uninitialized; a later report may still start it.
    pub fn on_viewport_measured(&mut self, width: i64, height: i64) {
        let cfg = &self.cfg;
        let Some(ctx) = self.ctx.as_mut() else {
            debug!("viewport measured after teardown; ignored");
            return;
        };
        let Some(viewport) = Viewport::from_pixels(width, height) else {
            warn!(width, height, "unusable viewport; waiting for a valid size");
            ctx.viewport_valid = false;
            return;
        };
        if let Some(system) = ctx.system.as_mut() {
            system.resize(viewport);
            ctx.viewport_valid = true;
            return;
        }

        let rng = SmallRng::seed_from_u64(cfg.particles.seed.unwrap_or_else(rand::random));
        let mut system = ParticleSystem::new(&cfg.particles, cfg.field.scale, viewport, rng);
        if let Some(n) = ctx.controller.desired_count() {
            system.set_target_count(n);
        }
        info!(
            width,
            height,
            cols = system.grid().cols(),
            rows = system.grid().rows(),
            particles = system.len(),
            "render loop running"
        );
        ctx.system = Some(system);
        ctx.viewport_valid = true;
        ctx.needs_clear = true;
    }

    /// Size change from the host. Before the first measurement a valid size
    /// doubles as that measurement.
    pub fn on_viewport_resize(&mut self, width: i64, height: i64) {
        match self.state() {
            LoopState::TornDown => {
                debug!("resize after teardown; ignored");
                return;
            }
            LoopState::Uninitialized => {
                self.on_viewport_measured(width, height);
                return;
            }
            LoopState::Running => {}
        }
        let Some(ctx) = self.ctx.as_mut() else { return };
        let Some(system) = ctx.system.as_mut() else { return };
        match Viewport::from_pixels(width, height) {
            Some(viewport) => {
                system.resize(viewport);
                ctx.viewport_valid = true;
                debug!(width, height, cols = system.grid().cols(), rows = system.grid().rows(), "viewport resized");
            }
            None => {
                warn!(width, height, "unusable viewport; pausing simulation");
                ctx.viewport_valid = false;
            }
        }
    }

    /// Retarget from an untrusted label/score pair. Latest call wins.
    pub fn on_sentiment_update(&mut self, sentiment: &str, score: f64, emotions: Vec<String>) {
        self.apply_signal(&SentimentSignal::from_parts(sentiment, score, emotions));
    }

    pub fn apply_signal(&mut self, signal: &SentimentSignal) {
        let Some(ctx) = self.ctx.as_mut() else {
            debug!("sentiment after teardown; ignored");
            return;
        };
        let count = ctx.controller.apply_sentiment(signal);
        if let Some(system) = ctx.system.as_mut() {
            system.set_target_count(count);
        }
    }

    /// Advance one frame: fade, smooth parameters, regenerate the field with
    /// the smoothed speed, step and draw every particle.
    ///
    /// Returns `false` once the loop is torn down, including when the stop
    /// handle was flipped since the previous frame.
    pub fn tick(&mut self, canvas: &mut dyn Canvas) -> bool {
        if self.stop.is_stopped() && self.ctx.is_some() {
            self.teardown();
        }
        let display = &self.cfg.display;
        let Some(ctx) = self.ctx.as_mut() else {
            return false;
        };
        let Some(system) = ctx.system.as_mut() else {
            return true;
        };

        let [bh, bs, bb] = display.background;
        let background = Hsba::new(bh, bs, bb, display.fade_alpha);
        if ctx.needs_clear {
            canvas.clear(background);
            ctx.needs_clear = false;
        }
        canvas.fade(background);

        ctx.controller.tick();
        if ctx.viewport_valid {
            let current = ctx.controller.current();
            ctx.noise.regenerate(system.grid_mut(), current.speed);
            let stroke = Stroke {
                hue: current.hue,
                saturation: current.saturation,
                brightness: display.brightness,
                weight: display.stroke_weight,
            };
            system.step(current.intensity, &stroke, canvas);
        }
        self.frames += 1;
        true
    }

    /// Release all simulation state and halt. Safe to call repeatedly and
    /// before the first frame.
    pub fn teardown(&mut self) {
        self.stop.stop();
        if self.ctx.take().is_some() {
            info!(frames = self.frames, "render loop torn down");
        }
    }
}

impl Drop for RenderLoop {
    fn drop(&mut self) {
        self.teardown();
    }
}
