// Copyright (c) 2026 rezky_nightky

mod canvas;
mod cell;
mod charset;
mod config;
mod error;
mod frame;
mod palette;
mod particles;
mod rain;
mod rng;
mod runtime;
mod schedule;
mod stage;
mod surface;
mod terminal;

use std::env;
use std::fs::OpenOptions;
use std::path::Path;
use std::time::{Duration, Instant};

#[cfg(unix)]
use std::thread;

use clap::builder::styling::{AnsiColor as ClapAnsiColor, Color as ClapColor};
use clap::builder::styling::{Effects as ClapEffects, Style as ClapStyle};
use clap::builder::Styles as ClapStyles;
use clap::{CommandFactory, FromArgMatches};
use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers, MouseEventKind};
use glam::Vec2;

#[cfg(unix)]
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;

use crate::canvas::{Canvas, CellMetrics};
use crate::config::{
    color_enabled_stdout, color_mode_label, default_params_usage_for_help, detect_color_mode_auto,
    print_list_charsets, resolve_color_mode, Args, Settings,
};
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::palette::background;
use crate::particles::ParticleField;
use crate::rain::{CodeRain, RainSettings};
use crate::rng::seeded;
use crate::runtime::ColorMode;
use crate::schedule::Scheduler;
use crate::stage::{Stage, Viewport};
use crate::terminal::{restore_terminal_best_effort, Terminal};

const HELP_TEMPLATE_PLAIN: &str = "\
{before-help}{about-with-newline}
USAGE:
  {usage}

{all-args}{after-help}";

const HELP_TEMPLATE_COLOR: &str = "\
{before-help}{about-with-newline}
\x1b[1;36mUSAGE:\x1b[0m
  {usage}

{all-args}{after-help}";

/// The particle layer sits dimmed under the rain.
const PARTICLE_LAYER_OPACITY: f32 = 0.4;

fn build_info() -> &'static str {
    env!("NEONFIELD_BUILD")
}

fn clap_styles() -> ClapStyles {
    ClapStyles::styled()
        .header(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Cyan))),
        )
        .usage(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Green))),
        )
        .literal(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Yellow))))
        .placeholder(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Magenta))))
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let mut builder = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let mut b = env_logger::Builder::from_env(
                env_logger::Env::default().default_filter_or("info"),
            );
            b.target(env_logger::Target::Pipe(Box::new(file)));
            b
        }
        // Stderr shares the alternate screen, so stay quiet unless asked.
        None => env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")),
    };
    builder
        .format_timestamp_millis()
        .try_init()
        .map_err(|e| Error::Logger(e.to_string()))
}

fn layer_opacity(name: &str) -> f32 {
    match name {
        "particles" => PARTICLE_LAYER_OPACITY,
        _ => 1.0,
    }
}

fn viewport_for(cols: u16, rows: u16, cell: CellMetrics) -> Viewport {
    Viewport::new(
        (cols as f32 * cell.width) as u32,
        (rows as f32 * cell.height) as u32,
    )
}

fn cell_center(col: u16, row: u16, cell: CellMetrics) -> Vec2 {
    Vec2::new(
        (col as f32 + 0.5) * cell.width,
        (row as f32 + 0.5) * cell.height,
    )
}

fn build_stage(settings: &Settings, viewport: Viewport, now: Instant) -> Stage<Canvas> {
    let mut stage = Stage::new(Scheduler::new(settings.frame_period()), viewport);
    if settings.scene.has_particles() {
        let field = ParticleField::new(
            Canvas::new(settings.cell),
            settings.particles.clone(),
            seeded(settings.seed),
        );
        stage.mount(Box::new(field), now);
    }
    if let Some(variant) = settings.scene.rain_variant() {
        let rain = CodeRain::new(
            Canvas::new(settings.cell),
            settings.rain.apply(RainSettings::for_variant(variant)),
            seeded(settings.seed.map(|s| s.wrapping_add(1))),
        );
        stage.mount(Box::new(rain), now);
    }
    stage
}

/// Earliest of the next frame, the next effect tick and the end of the run.
fn next_wake(next_frame: Instant, tick_due: Option<Instant>, end: Option<Instant>) -> Instant {
    [tick_due, end]
        .into_iter()
        .flatten()
        .fold(next_frame, |a, b| a.min(b))
}

fn compose(stage: &Stage<Canvas>, frame: &mut Frame, gain: f32, mode: ColorMode) {
    frame.wipe();
    for (name, canvas) in stage.layers() {
        canvas.paint_into(frame, layer_opacity(name), gain, mode);
    }
}

#[derive(Debug, Default)]
struct PerfStats {
    frames: u64,
    drawn_frames: u64,
    work_sum_s: f64,
    work_max_s: f64,
}

impl PerfStats {
    fn record(&mut self, drew: bool, work: Duration) {
        self.frames = self.frames.saturating_add(1);
        if drew {
            self.drawn_frames = self.drawn_frames.saturating_add(1);
        }
        let s = work.as_secs_f64();
        self.work_sum_s += s;
        self.work_max_s = self.work_max_s.max(s);
    }

    fn print(&self, elapsed: Duration, target_fps: f64, ticks: u64) {
        let elapsed_s = elapsed.as_secs_f64().max(0.000_001);
        let frames = self.frames.max(1) as f64;
        println!("PERF STATS:");
        println!("  elapsed_s: {:.3}", elapsed_s);
        println!("  target_fps: {:.3}", target_fps);
        println!("  avg_fps: {:.3}", self.frames as f64 / elapsed_s);
        println!("  frames: {}", self.frames);
        println!(
            "  drawn_frames: {} ({:.1}%)",
            self.drawn_frames,
            self.drawn_frames as f64 / frames * 100.0
        );
        println!("  effect_ticks: {}", ticks);
        println!("  avg_work_ms: {:.3}", self.work_sum_s / frames * 1000.0);
        println!("  max_work_ms: {:.3}", self.work_max_s * 1000.0);
    }
}

fn run(settings: Settings) -> Result<()> {
    let mut term = Terminal::new(settings.mouse)?;
    let (cols, rows) = term.size()?;
    let cell = settings.cell;
    let bg = background(settings.color_mode, settings.terminal_default_bg);

    let start_time = Instant::now();
    let mut stage = build_stage(&settings, viewport_for(cols, rows, cell), start_time);
    let mut frame = Frame::new(cols, rows, bg);
    log::info!(
        "scene {:?} on {}x{} cells, {} mode, {:.0} fps",
        settings.scene,
        cols,
        rows,
        color_mode_label(settings.color_mode),
        settings.fps
    );

    let end_time = settings.duration.map(|d| start_time + d);
    let frame_period = settings.frame_period();
    let mut next_frame = start_time;
    let mut running = true;
    let mut paused = false;
    let mut dirty = false;
    let mut perf = PerfStats::default();

    while running {
        if end_time.is_some_and(|end| Instant::now() >= end) {
            break;
        }
        let tick_due = if paused { None } else { stage.next_deadline() };
        let wake = next_wake(next_frame, tick_due, end_time);
        let mut pending_resize: Option<(u16, u16)> = None;

        loop {
            while Terminal::poll_event(Duration::from_millis(0))? {
                match Terminal::read_event()? {
                    Event::Resize(nw, nh) => pending_resize = Some((nw, nh)),
                    Event::Mouse(m)
                        if matches!(m.kind, MouseEventKind::Moved | MouseEventKind::Drag(_)) =>
                    {
                        stage.pointer_moved(cell_center(m.column, m.row, cell));
                    }
                    Event::Key(k) if k.kind == KeyEventKind::Press => {
                        if settings.screensaver {
                            running = false;
                            break;
                        }
                        match (k.code, k.modifiers) {
                            (KeyCode::Esc, _) | (KeyCode::Char('q'), _) => running = false,
                            (KeyCode::Char('c'), m) if m.contains(KeyModifiers::CONTROL) => {
                                running = false
                            }
                            (KeyCode::Char(' '), _) => stage.remount_all(Instant::now()),
                            (KeyCode::Char('p'), _) => {
                                paused = !paused;
                                log::info!("{}", if paused { "paused" } else { "resumed" });
                            }
                            _ => {}
                        }
                    }
                    _ => {}
                }
            }

            if !running || pending_resize.is_some() {
                break;
            }

            let now = Instant::now();
            if now >= wake {
                break;
            }
            let _ = Terminal::poll_event(wake - now)?;
        }

        if !running {
            break;
        }

        let now = Instant::now();
        if let Some((nw, nh)) = pending_resize {
            frame = Frame::new(nw, nh, bg);
            stage.resize(viewport_for(nw, nh, cell), now);
            dirty = true;
        }

        // Effect ticks follow their own deadlines; drawing stays frame-paced.
        let work_start = Instant::now();
        if !paused && stage.run_due(now) > 0 {
            dirty = true;
        }
        if now < next_frame {
            continue;
        }

        let drew = dirty;
        if drew {
            compose(&stage, &mut frame, settings.brightness, settings.color_mode);
            term.draw(&frame)?;
            dirty = false;
        }
        if settings.perf_stats {
            perf.record(drew, work_start.elapsed());
        }

        next_frame += frame_period;
        let now = Instant::now();
        if now > next_frame {
            next_frame = now;
        }
    }

    drop(term);
    stage.unmount_all();
    let elapsed = start_time.elapsed();
    log::info!(
        "stopped after {:.1}s, {} effect ticks",
        elapsed.as_secs_f64(),
        stage.total_ticks()
    );
    if settings.perf_stats {
        perf.print(elapsed, settings.fps, stage.total_ticks());
    }
    Ok(())
}

fn print_bitcolor(args: &Args) -> Result<()> {
    let colorterm = env::var("COLORTERM").unwrap_or_default();
    let term = env::var("TERM").unwrap_or_default();
    let effective = resolve_color_mode(args.colormode)?;

    println!("BITCOLOR CHECK:");
    println!(
        "  COLORTERM: {}",
        if colorterm.is_empty() {
            "(unset)"
        } else {
            &colorterm
        }
    );
    println!(
        "  TERM: {}",
        if term.is_empty() { "(unset)" } else { &term }
    );
    println!(
        "  auto_detected: {}",
        color_mode_label(detect_color_mode_auto())
    );
    if args.colormode.is_some() {
        println!("  forced: {}", color_mode_label(effective));
    }
    println!("  effective: {}", color_mode_label(effective));
    Ok(())
}

fn exit_with(e: Error) -> ! {
    restore_terminal_best_effort();
    eprintln!("{}", e);
    std::process::exit(1);
}

fn main() {
    std::panic::set_hook(Box::new(|info| {
        restore_terminal_best_effort();
        eprintln!("{}", info);
    }));

    #[cfg(unix)]
    {
        if let Ok(mut signals) = Signals::new([SIGINT, SIGTERM, SIGHUP]) {
            thread::spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    restore_terminal_best_effort();
                    std::process::exit(128 + sig);
                }
            });
        }
    }

    #[cfg(windows)]
    {
        if let Err(e) = ctrlc::set_handler(|| {
            restore_terminal_best_effort();
            std::process::exit(130);
        }) {
            eprintln!("failed to install Ctrl-C handler: {}", e);
        }
    }

    let mut cmd = Args::command();
    cmd = cmd.styles(clap_styles());
    cmd = cmd.before_help(default_params_usage_for_help());
    let help_template = if color_enabled_stdout() {
        HELP_TEMPLATE_COLOR
    } else {
        HELP_TEMPLATE_PLAIN
    };
    cmd = cmd.help_template(help_template);
    cmd.build();

    if cmd.get_arguments().any(|a| a.get_id().as_str() == "help") {
        cmd = cmd.mut_arg("help", |a| a.help_heading("HELP"));
    }
    cmd.build();

    let matches = cmd.get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    if args.list_charsets {
        print_list_charsets();
        return;
    }

    if args.check_bitcolor {
        if let Err(e) = print_bitcolor(&args) {
            exit_with(e);
        }
        return;
    }

    if args.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return;
    }

    if args.info {
        println!("Version: v{}", env!("CARGO_PKG_VERSION"));
        println!("Build: {}", build_info());
        println!("Commit: {}", env!("NEONFIELD_GIT_SHA"));
        println!("Copyright: (c) 2026 {}", env!("CARGO_PKG_AUTHORS"));
        println!("License: {}", env!("CARGO_PKG_LICENSE"));
        return;
    }

    let settings = match Settings::from_args(&args) {
        Ok(s) => s,
        Err(e) => exit_with(e),
    };
    if let Err(e) = init_logging(settings.log_file.as_deref()) {
        exit_with(e);
    }
    log::debug!("settings: {:?}", settings);

    if let Err(e) = run(settings) {
        exit_with(e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RainOverrides;
    use crate::particles::ParticleSettings;
    use crate::runtime::Scene;

    fn settings(scene: Scene) -> Settings {
        Settings {
            scene,
            color_mode: ColorMode::TrueColor,
            fps: 60.0,
            duration: None,
            screensaver: false,
            mouse: true,
            seed: Some(11),
            particles: ParticleSettings::default(),
            rain: RainOverrides::default(),
            brightness: 3.0,
            cell: CellMetrics::default(),
            terminal_default_bg: false,
            log_file: None,
            perf_stats: false,
        }
    }

    #[test]
    fn hero_scene_stacks_rain_over_particles() {
        let t0 = Instant::now();
        let stage = build_stage(&settings(Scene::Hero), Viewport::new(800, 480), t0);
        let names: Vec<_> = stage.layers().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["particles", "rain"]);
    }

    #[test]
    fn viewport_and_pointer_use_cell_metrics() {
        let cell = CellMetrics::default();
        assert_eq!(viewport_for(100, 30, cell), Viewport::new(800, 480));
        assert_eq!(cell_center(0, 0, cell), Vec2::new(4.0, 8.0));
    }

    #[test]
    fn composed_frame_shows_both_layers() {
        let t0 = Instant::now();
        let mut stage = build_stage(&settings(Scene::Hero), viewport_for(100, 30, CellMetrics::default()), t0);
        for step in 0..200u64 {
            stage.run_due(t0 + Duration::from_millis(16 * step));
        }
        let mut frame = Frame::new(100, 30, None);
        compose(&stage, &mut frame, 3.0, ColorMode::TrueColor);
        assert!(frame.visible_cells() > 0);
    }

    #[test]
    fn wake_picks_the_earliest_deadline() {
        let t0 = Instant::now();
        let ms = Duration::from_millis;
        assert_eq!(next_wake(t0 + ms(100), None, None), t0 + ms(100));
        assert_eq!(next_wake(t0 + ms(100), Some(t0 + ms(35)), None), t0 + ms(35));
        assert_eq!(
            next_wake(t0 + ms(100), Some(t0 + ms(35)), Some(t0 + ms(10))),
            t0 + ms(10)
        );
    }

    #[test]
    fn rain_keeps_its_interval_at_a_slow_frame_rate() {
        let t0 = Instant::now();
        let period = Duration::from_millis(100);
        let mut stage = build_stage(&settings(Scene::Rain), Viewport::new(800, 480), t0);

        let end = t0 + Duration::from_secs(1);
        let mut next_frame = t0;
        let mut frames = 0;
        loop {
            let now = next_wake(next_frame, stage.next_deadline(), Some(end));
            if now >= end {
                break;
            }
            stage.run_due(now);
            if now >= next_frame {
                frames += 1;
                next_frame += period;
            }
        }
        assert_eq!(frames, 10);
        // 35 ms ticks at 0, 35, ..., 980 ms.
        assert_eq!(stage.total_ticks(), 29);
    }

    #[test]
    fn tiny_terminal_parks_effects() {
        let t0 = Instant::now();
        let mut stage = build_stage(&settings(Scene::Rain), viewport_for(0, 0, CellMetrics::default()), t0);
        assert_eq!(stage.layers().count(), 0);
        stage.resize(viewport_for(10, 5, CellMetrics::default()), t0);
        assert_eq!(stage.layers().count(), 1);
    }
}
