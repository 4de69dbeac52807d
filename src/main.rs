mod config;
mod error;
mod feed;
mod field;
mod overlay;
mod params;
mod particle;
mod render_loop;
mod renderer;
mod sentiment;
mod system;

use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use minifb::{Key, KeyRepeat, Window, WindowOptions};
use tracing::{info, warn};

use config::Config;
use error::AppError;
use overlay::{HudData, OverlayState};
use render_loop::{RenderLoop, StopHandle};
use renderer::{Framebuffer, Hsba, RenderConfig};
use sentiment::{Sentiment, SentimentSignal};

struct Defaults;

impl Defaults {
    /// Score attached to keyboard-injected signals until adjusted.
    const MANUAL_SCORE: f64 = 0.9;
    const MANUAL_SCORE_STEP: f64 = 0.05;
    /// How often headless mode logs a status line.
    const HEADLESS_STATUS_INTERVAL: Duration = Duration::from_secs(1);
}

/// Command-line options.
#[derive(Debug, Clone, PartialEq)]
struct Args {
    headless: bool,
    /// Stop after this many frames.
    frames: Option<u64>,
    /// Read sentiment JSON lines from stdin.
    stdin: bool,
    config_path: PathBuf,
}

impl Args {
    fn parse(args: &[String]) -> Self {
        let value_of = |name: &str| {
            args.windows(2)
                .find(|w| w[0] == name)
                .map(|w| w[1].as_str())
        };
        let frames = value_of("--frames").and_then(|v| match v.parse::<u64>() {
            Ok(n) => Some(n),
            Err(_) => {
                warn!(value = v, "ignoring invalid --frames");
                None
            }
        });
        Self {
            headless: args.iter().any(|a| a == "--headless"),
            frames,
            stdin: args.iter().any(|a| a == "--stdin"),
            config_path: value_of("--config")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(config::DEFAULT_PATH)),
        }
    }
}

/// Score used by the `1`/`2`/`3` keys, nudged with `[` and `]`.
struct ManualInput {
    score: f64,
}

impl ManualInput {
    fn new() -> Self {
        Self { score: Defaults::MANUAL_SCORE }
    }

    fn adjust(&mut self, steps: i32) {
        let next = self.score + steps as f64 * Defaults::MANUAL_SCORE_STEP;
        // snap to the step grid so repeated presses don't drift
        self.score = ((next / Defaults::MANUAL_SCORE_STEP).round() * Defaults::MANUAL_SCORE_STEP).clamp(0.0, 1.0);
    }

    fn signal(&self, sentiment: Sentiment) -> SentimentSignal {
        let emotions = sentiment.emotions().iter().map(|e| e.to_string()).collect();
        SentimentSignal::new(sentiment, self.score, emotions)
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Ctrl+C flips the loop's stop handle; the next tick tears it down.
fn install_stop_handler(stop: StopHandle) -> Result<(), AppError> {
    ctrlc::set_handler(move || stop.stop())?;
    Ok(())
}

fn background(cfg: &Config) -> Hsba {
    let [h, s, b] = cfg.display.background;
    Hsba::new(h, s, b, 100.0)
}

/// Apply everything the feed queued since the last frame; only the newest counts.
fn drain_feed(rx: Option<&mpsc::Receiver<SentimentSignal>>, render_loop: &mut RenderLoop) {
    if let Some(signal) = rx.and_then(feed::drain_latest) {
        render_loop.apply_signal(&signal);
    }
}

/// Status bar text: (left, right).
fn format_status(render_loop: &RenderLoop, fps: u32, hud_visible: bool) -> (String, String) {
    let left = match render_loop.controller().and_then(|c| c.last_signal()) {
        Some(s) if hud_visible => format!("{} {:.2}", s.sentiment, s.score),
        Some(s) => format!("{} {:.2} | {}", s.sentiment, s.score, s.emotions.join(",")),
        None => "waiting for sentiment | 1=pos 2=neg 3=neu space=hud".to_string(),
    };
    let hue = render_loop.controller().map_or(0.0, |c| c.current().hue);
    let right = format!(
        "hue={:.0} p={}/{} {} fps",
        hue,
        render_loop.particle_count(),
        render_loop.target_count(),
        fps,
    );
    (left, right)
}

fn hud_data(render_loop: &RenderLoop, manual: &ManualInput) -> Option<HudData> {
    let controller = render_loop.controller()?;
    Some(HudData {
        current: controller.current(),
        target: controller.target(),
        particles: render_loop.particle_count(),
        target_particles: render_loop.target_count(),
        manual_score: manual.score,
    })
}

fn main() -> Result<(), AppError> {
    init_tracing();
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let args = Args::parse(&argv);
    let cfg = config::load(&args.config_path);
    info!(
        width = cfg.display.width,
        height = cfg.display.height,
        fps = cfg.display.target_fps,
        growth = ?cfg.particles.growth,
        headless = args.headless,
        "starting aura"
    );

    if args.headless {
        run_headless(cfg, &args)
    } else {
        run_gui(cfg, &args)
    }
}

fn run_gui(cfg: Config, args: &Args) -> Result<(), AppError> {
    let mut render_cfg = RenderConfig::fit(cfg.display.width, cfg.display.height, cfg.display.status_bar);
    let mut w = render_cfg.frame_width;
    let mut h = render_cfg.frame_height;

    let mut window = Window::new(
        "aura",
        w,
        h,
        WindowOptions {
            resize: true,
            ..WindowOptions::default()
        },
    )?;
    window.set_target_fps(cfg.display.target_fps);

    let mut scene = Framebuffer::new(render_cfg.display_width, render_cfg.display_height, background(&cfg));
    let mut render_loop = RenderLoop::new(cfg.clone());
    install_stop_handler(render_loop.stop_handle())?;
    let signals = args.stdin.then(feed::spawn_stdin);
    render_loop.on_viewport_measured(render_cfg.display_width as i64, render_cfg.display_height as i64);

    let mut hud = OverlayState::new();
    let mut manual = ManualInput::new();
    let mut rgba_buf: Vec<u8> = Vec::new();
    let mut framebuf: Vec<u32> = Vec::new();
    let mut frame_count = 0u32;
    let mut display_fps = 0u32;
    let mut last_fps_time = Instant::now();

    while window.is_open() {
        // --- Keyboard handling ---
        if window.is_key_pressed(Key::Escape, KeyRepeat::No) {
            break;
        }
        if window.is_key_pressed(Key::Space, KeyRepeat::No) {
            hud.toggle();
        }
        for (key, sentiment) in [
            (Key::Key1, Sentiment::Positive),
            (Key::Key2, Sentiment::Negative),
            (Key::Key3, Sentiment::Neutral),
        ] {
            if window.is_key_pressed(key, KeyRepeat::No) {
                let s = manual.signal(sentiment);
                render_loop.on_sentiment_update(s.sentiment.as_str(), s.score, s.emotions);
            }
        }
        if window.is_key_pressed(Key::LeftBracket, KeyRepeat::Yes) {
            manual.adjust(-1);
        }
        if window.is_key_pressed(Key::RightBracket, KeyRepeat::Yes) {
            manual.adjust(1);
        }

        drain_feed(signals.as_ref(), &mut render_loop);

        // --- Check for window resize ---
        let (new_w, new_h) = window.get_size();
        if new_w != w || new_h != h {
            render_cfg = RenderConfig::fit(new_w, new_h, cfg.display.status_bar);
            w = render_cfg.frame_width;
            h = render_cfg.frame_height;
            scene.resize(render_cfg.display_width, render_cfg.display_height);
            render_loop.on_viewport_resize(render_cfg.display_width as i64, render_cfg.display_height as i64);
        }

        if !render_loop.tick(&mut scene) {
            break;
        }

        if render_cfg.is_empty() {
            window.update();
            continue;
        }

        let (left, right) = format_status(&render_loop, display_fps, hud.visible);
        scene.compose_into(&mut rgba_buf, &render_cfg);
        renderer::render_status(&mut rgba_buf, &render_cfg, &left, &right);
        if let Some(data) = hud_data(&render_loop, &manual) {
            overlay::render_overlay(
                &mut rgba_buf,
                render_cfg.frame_width,
                render_cfg.display_width,
                render_cfg.display_height,
                &hud,
                &data,
            );
        }
        renderer::rgba_to_argb(&rgba_buf, &mut framebuf);
        window.update_with_buffer(&framebuf, w, h)?;

        frame_count += 1;
        let now = Instant::now();
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            display_fps = frame_count;
            frame_count = 0;
            last_fps_time = now;
            window.set_title(&format!("aura - {display_fps} fps"));
        }
    }

    render_loop.teardown();
    Ok(())
}

fn run_headless(cfg: Config, args: &Args) -> Result<(), AppError> {
    let render_cfg = RenderConfig::fit(cfg.display.width, cfg.display.height, false);
    let frame_interval = Duration::from_secs_f64(1.0 / cfg.display.target_fps as f64);

    let mut scene = Framebuffer::new(render_cfg.display_width, render_cfg.display_height, background(&cfg));
    let mut render_loop = RenderLoop::new(cfg);
    install_stop_handler(render_loop.stop_handle())?;
    let signals = args.stdin.then(feed::spawn_stdin);
    render_loop.on_viewport_measured(render_cfg.display_width as i64, render_cfg.display_height as i64);

    let ticks = headless_loop(&mut render_loop, &mut scene, signals.as_ref(), frame_interval, args.frames);

    info!(ticks, frames = render_loop.frames(), "headless run finished");
    render_loop.teardown();
    Ok(())
}

/// Drive the loop on a sleep-paced ticker. `limit` counts driver ticks, so it
/// holds even while the loop is still waiting for a usable viewport.
fn headless_loop(
    render_loop: &mut RenderLoop,
    scene: &mut Framebuffer,
    signals: Option<&mpsc::Receiver<SentimentSignal>>,
    frame_interval: Duration,
    limit: Option<u64>,
) -> u64 {
    let mut ticks = 0u64;
    let mut frame_count = 0u32;
    let mut last_status = Instant::now();

    while limit.is_none_or(|n| ticks < n) {
        let frame_start = Instant::now();

        drain_feed(signals, render_loop);
        if !render_loop.tick(scene) {
            break;
        }
        ticks += 1;
        frame_count += 1;

        let now = Instant::now();
        if now.duration_since(last_status) >= Defaults::HEADLESS_STATUS_INTERVAL {
            let (left, right) = format_status(render_loop, frame_count, true);
            info!(fps = frame_count, particles = render_loop.particle_count(), "{left} | {right}");
            frame_count = 0;
            last_status = now;
        }

        // Sleep-paced ticker
        let elapsed = frame_start.elapsed();
        if elapsed < frame_interval {
            std::thread::sleep(frame_interval - elapsed);
        }
    }
    ticks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Args {
        let owned: Vec<String> = list.iter().map(|s| s.to_string()).collect();
        Args::parse(&owned)
    }

    #[test]
    fn test_args_defaults() {
        let a = args(&[]);
        assert!(!a.headless);
        assert!(!a.stdin);
        assert_eq!(a.frames, None);
        assert_eq!(a.config_path, PathBuf::from("aura.yaml"));
    }

    #[test]
    fn test_args_all_flags() {
        let a = args(&["--headless", "--frames", "120", "--stdin", "--config", "custom.yaml"]);
        assert!(a.headless);
        assert!(a.stdin);
        assert_eq!(a.frames, Some(120));
        assert_eq!(a.config_path, PathBuf::from("custom.yaml"));
    }

    #[test]
    fn test_args_bad_frames_ignored() {
        assert_eq!(args(&["--frames", "lots"]).frames, None);
        assert_eq!(args(&["--frames"]).frames, None, "flag without value");
    }

    #[test]
    fn test_manual_score_clamps_and_snaps() {
        let mut m = ManualInput::new();
        m.adjust(1);
        m.adjust(1);
        m.adjust(1);
        assert_eq!(m.score, 1.0);
        for _ in 0..30 {
            m.adjust(-1);
        }
        assert_eq!(m.score, 0.0);
        m.adjust(3);
        assert!((m.score - 0.15).abs() < 1e-12, "score should stay on the 0.05 grid, got {}", m.score);
    }

    #[test]
    fn test_manual_signal_carries_backend_emotions() {
        let m = ManualInput::new();
        let s = m.signal(Sentiment::Negative);
        assert_eq!(s.sentiment, Sentiment::Negative);
        assert_eq!(s.score, 0.9);
        assert_eq!(s.emotions, vec!["angry", "sad", "frustrated"]);
    }

    #[test]
    fn test_drain_feed_applies_newest() {
        let mut cfg = Config::default();
        cfg.field.seed = Some(3);
        cfg.particles.seed = Some(4);
        let mut render_loop = RenderLoop::new(cfg);
        let (tx, rx) = mpsc::channel();
        tx.send(SentimentSignal::new(Sentiment::Positive, 1.0, vec![])).unwrap();
        tx.send(SentimentSignal::new(Sentiment::Negative, 0.5, vec![])).unwrap();
        drain_feed(Some(&rx), &mut render_loop);
        let last = render_loop.controller().unwrap().last_signal().unwrap();
        assert_eq!(last.sentiment, Sentiment::Negative);
        assert_eq!(render_loop.target_count(), 200);
    }

    #[test]
    fn test_format_status() {
        let mut cfg = Config::default();
        cfg.field.seed = Some(3);
        cfg.particles.seed = Some(4);
        let mut render_loop = RenderLoop::new(cfg);
        let (left, _) = format_status(&render_loop, 0, false);
        assert!(left.starts_with("waiting"), "got {}", left);

        render_loop.on_viewport_measured(320, 240);
        render_loop.on_sentiment_update("positive", 0.9, vec!["happy".into(), "excited".into()]);
        let (left, right) = format_status(&render_loop, 60, false);
        assert_eq!(left, "positive 0.90 | happy,excited");
        assert_eq!(right, "hue=200 p=300/440 60 fps");
    }

    #[test]
    fn test_headless_frame_limit() {
        let mut cfg = Config::default();
        cfg.field.seed = Some(3);
        cfg.particles.seed = Some(4);
        let mut render_loop = RenderLoop::new(cfg);
        let mut scene = Framebuffer::new(64, 48, Hsba::new(0.0, 0.0, 10.0, 100.0));
        render_loop.on_viewport_measured(64, 48);
        let ticks = headless_loop(&mut render_loop, &mut scene, None, Duration::ZERO, Some(5));
        assert_eq!(ticks, 5);
        assert_eq!(render_loop.frames(), 5);
    }

    #[test]
    fn test_headless_frame_limit_without_viewport() {
        let mut render_loop = RenderLoop::new(Config::default());
        let mut scene = Framebuffer::new(0, 0, Hsba::new(0.0, 0.0, 10.0, 100.0));
        render_loop.on_viewport_measured(0, 720);
        let ticks = headless_loop(&mut render_loop, &mut scene, None, Duration::ZERO, Some(20));
        assert_eq!(ticks, 20, "the limit must hold while the loop waits for a viewport");
        assert_eq!(render_loop.frames(), 0);
    }

    #[test]
    fn test_zero_width_config_still_runs() {
        let cfg: Config = serde_yaml::from_str("display:\n  width: 0\n").unwrap();
        let cfg = cfg.sanitize();
        let render_cfg = RenderConfig::fit(cfg.display.width, cfg.display.height, false);
        let mut scene = Framebuffer::new(render_cfg.display_width, render_cfg.display_height, background(&cfg));
        let mut render_loop = RenderLoop::new(cfg);
        render_loop.on_viewport_measured(render_cfg.display_width as i64, render_cfg.display_height as i64);
        let ticks = headless_loop(&mut render_loop, &mut scene, None, Duration::ZERO, Some(3));
        assert_eq!(ticks, 3);
        assert_eq!(render_loop.frames(), 3);
    }

    #[test]
    fn test_hud_data_after_teardown() {
        let mut render_loop = RenderLoop::new(Config::default());
        assert!(hud_data(&render_loop, &ManualInput::new()).is_some());
        render_loop.teardown();
        assert!(hud_data(&render_loop, &ManualInput::new()).is_none());
    }
}
