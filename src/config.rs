// Copyright (c) 2026 rezky_nightky

use std::io::IsTerminal;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::Parser;

use crate::canvas::CellMetrics;
use crate::charset::{build_glyphs, glyph_set_from_str, PRESETS};
use crate::error::{Error, Result};
use crate::particles::ParticleSettings;
use crate::rain::RainSettings;
use crate::runtime::{ColorMode, Scene};
use crate::surface::Rgba;

pub const DEFAULT_PARAMS_USAGE: &str = "DEFAULT PARAMS USAGE:\n  neonfield --scene hero --particles 100 --link-distance 100 --repel-radius 150 --repel-strength 3 --fps 60 --brightness 3 --cell-px 8,16";

pub fn color_enabled_stdout() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if matches!(std::env::var("CLICOLOR").ok().as_deref(), Some("0")) {
        return false;
    }
    std::io::stdout().is_terminal()
}

fn colorize_usage(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 32);
    for chunk in text.split_inclusive('\n') {
        let (line, nl) = chunk
            .strip_suffix('\n')
            .map(|l| (l, "\n"))
            .unwrap_or((chunk, ""));

        if !line.starts_with(' ') && line.ends_with(':') {
            out.push_str("\x1b[1;36m");
            out.push_str(line);
            out.push_str("\x1b[0m");
        } else if let Some(rest) = line.strip_prefix("  neonfield") {
            out.push_str("  \x1b[1;34mneonfield\x1b[0m");
            out.push_str(rest);
        } else {
            out.push_str(line);
        }
        out.push_str(nl);
    }
    out
}

pub fn default_params_usage_for_help() -> String {
    if color_enabled_stdout() {
        colorize_usage(DEFAULT_PARAMS_USAGE)
    } else {
        DEFAULT_PARAMS_USAGE.to_string()
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorBg {
    #[value(name = "black")]
    Black,
    #[value(name = "default-background")]
    DefaultBackground,
    #[value(name = "transparent")]
    Transparent,
}

/// Virtual pixel size of one terminal cell, given as `W,H`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellPx {
    pub width: u16,
    pub height: u16,
}

impl FromStr for CellPx {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bad = || Error::InvalidPair(s.to_string());
        let (a, b) = s.split_once(',').ok_or_else(bad)?;
        let width: u16 = a.trim().parse().map_err(|_| bad())?;
        let height: u16 = b.trim().parse().map_err(|_| bad())?;
        Ok(Self { width, height })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "neonfield", version, disable_version_flag = true)]
pub struct Args {
    #[arg(
        long = "scene",
        default_value_t = Scene::Hero,
        value_enum,
        help_heading = "GENERAL",
        help = "What to show: hero (particles under dense rain), particles, rain, ambient-rain"
    )]
    pub scene: Scene,

    #[arg(
        long = "duration",
        help_heading = "GENERAL",
        help = "Stop after N seconds (min 0.1 max 86400; <=0 disables)"
    )]
    pub duration: Option<f64>,

    #[arg(
        short = 's',
        long = "screensaver",
        help_heading = "GENERAL",
        help = "Screensaver mode (exit on keypress)"
    )]
    pub screensaver: bool,

    #[arg(
        long = "seed",
        help_heading = "GENERAL",
        help = "Seed the random source for a reproducible run"
    )]
    pub seed: Option<u64>,

    #[arg(
        long = "no-mouse",
        help_heading = "GENERAL",
        help = "Do not capture the mouse (disables particle repulsion)"
    )]
    pub no_mouse: bool,

    #[arg(
        long = "log-file",
        help_heading = "GENERAL",
        help = "Write logs to this file (filter with RUST_LOG, default info)"
    )]
    pub log_file: Option<PathBuf>,

    #[arg(
        short = 'n',
        long = "particles",
        default_value_t = 100,
        help_heading = "PARTICLES",
        help = "Particle count (min 1 max 2000)"
    )]
    pub particles: u32,

    #[arg(
        long = "link-distance",
        default_value_t = 100.0,
        help_heading = "PARTICLES",
        help = "Link particles closer than this many px (min 0 max 1000)"
    )]
    pub link_distance: f32,

    #[arg(
        long = "repel-radius",
        default_value_t = 150.0,
        help_heading = "PARTICLES",
        help = "Pointer repulsion radius in px (min 0 max 2000)"
    )]
    pub repel_radius: f32,

    #[arg(
        long = "repel-strength",
        default_value_t = 3.0,
        help_heading = "PARTICLES",
        help = "Pointer repulsion strength (min 0 max 50)"
    )]
    pub repel_strength: f32,

    #[arg(
        long = "cell-size",
        help_heading = "RAIN",
        help = "Glyph cell size in px (min 4 max 128; default per scene)"
    )]
    pub cell_size: Option<f32>,

    #[arg(
        long = "interval-ms",
        help_heading = "RAIN",
        help = "Milliseconds between rain ticks (min 5 max 1000; default per scene)"
    )]
    pub interval_ms: Option<u32>,

    #[arg(
        long = "reset-pct",
        help_heading = "RAIN",
        help = "Chance per tick that a finished column restarts, in percent (min 0 max 100)"
    )]
    pub reset_pct: Option<f32>,

    #[arg(
        long = "charset",
        help_heading = "RAIN",
        help = "Glyph preset (see --list-charsets; default per scene)"
    )]
    pub charset: Option<String>,

    #[arg(
        short = 'c',
        long = "color",
        help_heading = "RAIN",
        help = "Glyph color as #rgb or #rrggbb (default #ff0c00)"
    )]
    pub color: Option<String>,

    #[arg(
        short = 'f',
        long = "fps",
        default_value_t = 60.0,
        help_heading = "DISPLAY",
        help = "Target FPS (min 1 max 240)"
    )]
    pub fps: f64,

    #[arg(
        long = "colormode",
        help_heading = "DISPLAY",
        help = "Force color mode (allowed: 0,16,8/256,24/32). Default: 24-bit if supported (COLORTERM), else 8-bit"
    )]
    pub colormode: Option<u16>,

    #[arg(
        long = "color-bg",
        default_value_t = ColorBg::Black,
        value_enum,
        help_heading = "DISPLAY",
        help = "Background mode (black, default-background, transparent)"
    )]
    pub color_bg: ColorBg,

    #[arg(
        long = "brightness",
        default_value_t = 3.0,
        help_heading = "DISPLAY",
        help = "Light gain applied when painting to the terminal (min 0.1 max 10)"
    )]
    pub brightness: f32,

    #[arg(
        long = "cell-px",
        default_value = "8,16",
        help_heading = "DISPLAY",
        help = "Virtual pixels per terminal cell: W,H (min 1 max 64 each)"
    )]
    pub cell_px: CellPx,

    #[arg(
        long = "perf-stats",
        help_heading = "DISPLAY",
        help = "Print tick and frame statistics on exit"
    )]
    pub perf_stats: bool,

    #[arg(
        long = "list-charsets",
        help_heading = "HELP",
        help = "List available charset presets and exit"
    )]
    pub list_charsets: bool,

    #[arg(
        long = "check-bitcolor",
        help_heading = "HELP",
        help = "Print detected terminal color capability and exit"
    )]
    pub check_bitcolor: bool,

    #[arg(
        long = "info",
        short = 'i',
        help_heading = "HELP",
        help = "Print version info and exit"
    )]
    pub info: bool,

    #[arg(
        long = "version",
        short = 'v',
        help_heading = "HELP",
        help = "Print version and exit"
    )]
    pub version: bool,
}

fn require_range<T>(name: &'static str, v: T, min: T, max: T) -> Result<T>
where
    T: Into<f64> + Copy,
{
    let (fv, fmin, fmax) = (v.into(), min.into(), max.into());
    if !fv.is_finite() {
        return Err(Error::NotFinite { name });
    }
    if fv < fmin || fv > fmax {
        return Err(Error::OutOfRange {
            name,
            value: fv,
            min: fmin,
            max: fmax,
        });
    }
    Ok(v)
}

pub fn color_mode_from_env(colorterm: &str, term: &str) -> ColorMode {
    let colorterm = colorterm.to_ascii_lowercase();
    if colorterm.contains("truecolor") || colorterm.contains("24bit") {
        return ColorMode::TrueColor;
    }
    let term = term.to_ascii_lowercase();
    if term == "dumb" {
        return ColorMode::Mono;
    }
    ColorMode::Color256
}

pub fn detect_color_mode_auto() -> ColorMode {
    color_mode_from_env(
        &std::env::var("COLORTERM").unwrap_or_default(),
        &std::env::var("TERM").unwrap_or_default(),
    )
}

pub fn resolve_color_mode(forced: Option<u16>) -> Result<ColorMode> {
    match forced {
        None => Ok(detect_color_mode_auto()),
        Some(0) => Ok(ColorMode::Mono),
        Some(16) => Ok(ColorMode::Color16),
        Some(8) | Some(256) => Ok(ColorMode::Color256),
        Some(24) | Some(32) => Ok(ColorMode::TrueColor),
        Some(m) => Err(Error::InvalidColorMode(m)),
    }
}

pub fn color_mode_label(m: ColorMode) -> &'static str {
    match m {
        ColorMode::TrueColor => "24-bit truecolor",
        ColorMode::Color256 => "8-bit (256-color)",
        ColorMode::Color16 => "16-color",
        ColorMode::Mono => "mono",
    }
}

/// Command-line changes layered over a rain variant's defaults.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RainOverrides {
    pub cell_size: Option<f32>,
    pub interval: Option<Duration>,
    pub reset_chance: Option<f32>,
    pub glyphs: Option<Vec<char>>,
    pub color: Option<Rgba>,
}

impl RainOverrides {
    pub fn apply(&self, mut base: RainSettings) -> RainSettings {
        if let Some(v) = self.cell_size {
            base.cell_size = v;
        }
        if let Some(v) = self.interval {
            base.interval = v;
        }
        if let Some(v) = self.reset_chance {
            base.reset_chance = v;
        }
        if let Some(v) = &self.glyphs {
            base.glyphs = v.clone();
        }
        if let Some(v) = self.color {
            base.color = v;
        }
        base
    }
}

/// Validated run configuration.
#[derive(Clone, Debug)]
pub struct Settings {
    pub scene: Scene,
    pub color_mode: ColorMode,
    pub fps: f64,
    pub duration: Option<Duration>,
    pub screensaver: bool,
    pub mouse: bool,
    pub seed: Option<u64>,
    pub particles: ParticleSettings,
    pub rain: RainOverrides,
    pub brightness: f32,
    pub cell: CellMetrics,
    pub terminal_default_bg: bool,
    pub log_file: Option<PathBuf>,
    pub perf_stats: bool,
}

impl Settings {
    pub fn from_args(args: &Args) -> Result<Self> {
        let fps = require_range("--fps", args.fps, 1.0, 240.0)?;
        let duration = match args.duration {
            Some(s) if !s.is_finite() => return Err(Error::NotFinite { name: "--duration" }),
            Some(s) if s > 0.0 => Some(Duration::from_secs_f64(require_range(
                "--duration",
                s,
                0.1,
                86400.0,
            )?)),
            _ => None,
        };

        let particles = ParticleSettings {
            count: require_range("--particles", args.particles, 1, 2000)? as usize,
            link_distance: require_range("--link-distance", args.link_distance, 0.0, 1000.0)?,
            repel_radius: require_range("--repel-radius", args.repel_radius, 0.0, 2000.0)?,
            repel_strength: require_range("--repel-strength", args.repel_strength, 0.0, 50.0)?,
            ..ParticleSettings::default()
        };

        let rain = RainOverrides {
            cell_size: args
                .cell_size
                .map(|v| require_range("--cell-size", v, 4.0, 128.0))
                .transpose()?,
            interval: args
                .interval_ms
                .map(|v| require_range("--interval-ms", v, 5, 1000))
                .transpose()?
                .map(|ms| Duration::from_millis(ms as u64)),
            reset_chance: args
                .reset_pct
                .map(|v| require_range("--reset-pct", v, 0.0, 100.0))
                .transpose()?
                .map(|pct| pct / 100.0),
            glyphs: args
                .charset
                .as_deref()
                .map(glyph_set_from_str)
                .transpose()?
                .map(build_glyphs),
            color: args.color.as_deref().map(Rgba::hex).transpose()?,
        };

        let cell = CellMetrics {
            width: require_range("--cell-px width", args.cell_px.width, 1, 64)? as f32,
            height: require_range("--cell-px height", args.cell_px.height, 1, 64)? as f32,
        };

        Ok(Self {
            scene: args.scene,
            color_mode: resolve_color_mode(args.colormode)?,
            fps,
            duration,
            screensaver: args.screensaver,
            mouse: !args.no_mouse,
            seed: args.seed,
            particles,
            rain,
            brightness: require_range("--brightness", args.brightness, 0.1, 10.0)?,
            cell,
            terminal_default_bg: matches!(
                args.color_bg,
                ColorBg::DefaultBackground | ColorBg::Transparent
            ),
            log_file: args.log_file.clone(),
            perf_stats: args.perf_stats,
        })
    }

    pub fn frame_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps)
    }
}

pub fn print_list_charsets() {
    if color_enabled_stdout() {
        println!("\x1b[1;36mAVAILABLE CHARSET PRESETS:\x1b[0m");
        println!("\x1b[2mNOTE: Use only the VALUE (left side) with --charset.\x1b[0m");
    } else {
        println!("AVAILABLE CHARSET PRESETS:");
        println!("NOTE: Use only the VALUE (left side) with --charset.");
    }
    println!();
    println!("VALUE        DESCRIPTION");
    for (name, about) in PRESETS {
        println!("{:<12} {}", name, about);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rain::FallSpeed;

    fn parse(argv: &[&str]) -> Args {
        let mut full = vec!["neonfield"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    #[test]
    fn defaults_validate() {
        let s = Settings::from_args(&parse(&["--colormode", "24"])).unwrap();
        assert_eq!(s.scene, Scene::Hero);
        assert_eq!(s.color_mode, ColorMode::TrueColor);
        assert_eq!(s.particles, ParticleSettings::default());
        assert_eq!(s.rain, RainOverrides::default());
        assert_eq!(s.cell, CellMetrics::default());
        assert_eq!(s.duration, None);
        assert!(s.mouse);
        assert!(!s.terminal_default_bg);
    }

    #[test]
    fn out_of_range_values_are_reported() {
        let err = Settings::from_args(&parse(&["--fps", "500"])).unwrap_err();
        assert_eq!(err.to_string(), "failed to apply --fps 500 (min 1 max 240)");

        let err = Settings::from_args(&parse(&["-n", "0"])).unwrap_err();
        assert!(matches!(err, Error::OutOfRange { name: "--particles", .. }));

        let err = Settings::from_args(&parse(&["--cell-px", "0,16"])).unwrap_err();
        assert!(matches!(err, Error::OutOfRange { name: "--cell-px width", .. }));
    }

    #[test]
    fn non_positive_duration_disables_the_timer() {
        let s = Settings::from_args(&parse(&["--duration", "0"])).unwrap();
        assert_eq!(s.duration, None);
        let s = Settings::from_args(&parse(&["--duration", "2.5"])).unwrap();
        assert_eq!(s.duration, Some(Duration::from_millis(2500)));
        assert!(Settings::from_args(&parse(&["--duration", "0.01"])).is_err());
    }

    #[test]
    fn rain_overrides_layer_on_variant_defaults() {
        let s = Settings::from_args(&parse(&[
            "--scene",
            "ambient-rain",
            "--cell-size",
            "20",
            "--interval-ms",
            "50",
            "--reset-pct",
            "10",
            "--charset",
            "hex",
            "-c",
            "#0f0",
        ]))
        .unwrap();
        assert_eq!(s.scene, Scene::AmbientRain);

        let rain = s.rain.apply(RainSettings::ambient());
        assert_eq!(rain.cell_size, 20.0);
        assert_eq!(rain.interval, Duration::from_millis(50));
        assert!((rain.reset_chance - 0.1).abs() < 1e-6);
        assert_eq!(rain.glyphs.len(), 16);
        assert_eq!(rain.color, Rgba::opaque(0, 255, 0));
        // Untouched fields keep the variant's values.
        assert_eq!(rain.max_columns, Some(80));
        assert!(matches!(rain.speed, FallSpeed::Random { .. }));
    }

    #[test]
    fn bad_rain_inputs_fail() {
        assert!(matches!(
            Settings::from_args(&parse(&["--charset", "runic"])),
            Err(Error::UnknownCharset(_))
        ));
        assert!(matches!(
            Settings::from_args(&parse(&["-c", "red"])),
            Err(Error::InvalidColor(_))
        ));
        assert!(matches!(
            Settings::from_args(&parse(&["--colormode", "7"])),
            Err(Error::InvalidColorMode(7))
        ));
    }

    #[test]
    fn cell_px_needs_two_numbers() {
        assert_eq!(
            "6, 12".parse::<CellPx>().unwrap(),
            CellPx {
                width: 6,
                height: 12
            }
        );
        assert!("8".parse::<CellPx>().is_err());
        assert!(Args::try_parse_from(["neonfield", "--cell-px", "a,b"]).is_err());
    }

    #[test]
    fn color_mode_detection_reads_terminal_hints() {
        assert_eq!(color_mode_from_env("truecolor", "xterm"), ColorMode::TrueColor);
        assert_eq!(color_mode_from_env("", "dumb"), ColorMode::Mono);
        assert_eq!(color_mode_from_env("", "xterm-256color"), ColorMode::Color256);
    }

    #[test]
    fn color_bg_can_keep_the_terminal_background() {
        for mode in ["default-background", "transparent"] {
            let s = Settings::from_args(&parse(&["--color-bg", mode])).unwrap();
            assert!(s.terminal_default_bg);
        }
        let s = Settings::from_args(&parse(&["--color-bg", "black"])).unwrap();
        assert!(!s.terminal_default_bg);
    }

    #[test]
    fn frame_period_follows_fps() {
        let s = Settings::from_args(&parse(&["--fps", "50"])).unwrap();
        assert_eq!(s.frame_period(), Duration::from_millis(20));
    }
}
