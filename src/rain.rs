// Copyright (c) 2026 rezky_nightky

//! Column-based falling glyph rain with a fading trail.
//!
//! The surface is never cleared. Each tick dims it with a translucent
//! black rectangle, then draws one glyph per column at that column's
//! counter row and advances the counter.

use std::time::Duration;

use glam::Vec2;
use rand::rngs::StdRng;

use crate::charset::{build_glyphs, GlyphSet};
use crate::palette::RAIN_RED;
use crate::rng::RandomSource;
use crate::schedule::Cadence;
use crate::stage::{Effect, Environment, Viewport};
use crate::surface::{Rgba, Surface};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RainVariant {
    /// Full-width rain over the hero section.
    Dense,
    /// Calmer binary rain with fewer, slower columns.
    Ambient,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FallSpeed {
    Constant(f32),
    /// Redrawn per column on every tick.
    Random { low: f32, high: f32 },
}

/// How far above the top edge the counters start.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Stagger {
    /// `floor(U * -rows)`.
    Rows(f32),
    /// `floor(U * -(screens * visible rows))`.
    Screens(f32),
}

#[derive(Clone, Debug, PartialEq)]
pub struct RainSettings {
    pub cell_size: f32,
    pub glyphs: Vec<char>,
    pub color: Rgba,
    pub fade: Rgba,
    pub interval: Duration,
    /// Per-tick probability that a column past the bottom restarts.
    pub reset_chance: f32,
    pub min_opacity: f32,
    pub max_opacity: f32,
    pub speed: FallSpeed,
    pub stagger: Stagger,
    pub max_columns: Option<usize>,
    /// Spread columns across the full width instead of packing them.
    pub spread: bool,
}

impl RainSettings {
    pub fn dense() -> Self {
        Self {
            cell_size: 16.0,
            glyphs: build_glyphs(GlyphSet::Alnum),
            color: RAIN_RED,
            fade: Rgba::BLACK.with_alpha(0.05),
            interval: Duration::from_millis(35),
            reset_chance: 0.025,
            min_opacity: 0.5,
            max_opacity: 1.0,
            speed: FallSpeed::Constant(1.0),
            stagger: Stagger::Rows(100.0),
            max_columns: None,
            spread: false,
        }
    }

    pub fn ambient() -> Self {
        Self {
            cell_size: 12.0,
            glyphs: build_glyphs(GlyphSet::Binary),
            interval: Duration::from_millis(60),
            reset_chance: 0.02,
            min_opacity: 1.0,
            speed: FallSpeed::Random {
                low: 0.5,
                high: 1.0,
            },
            stagger: Stagger::Screens(2.0),
            max_columns: Some(80),
            spread: true,
            ..Self::dense()
        }
    }

    pub fn for_variant(variant: RainVariant) -> Self {
        match variant {
            RainVariant::Dense => Self::dense(),
            RainVariant::Ambient => Self::ambient(),
        }
    }

    pub fn column_count(&self, width: u32) -> usize {
        if !(self.cell_size > 0.0) {
            return 0;
        }
        let n = (width as f32 / self.cell_size).floor() as usize;
        match self.max_columns {
            Some(cap) => n.min(cap),
            None => n,
        }
    }
}

pub struct CodeRain<S, R = StdRng> {
    surface: S,
    settings: RainSettings,
    rng: R,
    columns: Vec<f32>,
    resets: u64,
    mounted: bool,
}

impl<S: Surface, R: RandomSource> CodeRain<S, R> {
    pub fn new(surface: S, settings: RainSettings, rng: R) -> Self {
        Self {
            surface,
            settings,
            rng,
            columns: Vec::new(),
            resets: 0,
            mounted: false,
        }
    }

    /// Fall counters in rows, one per column.
    #[cfg(test)]
    pub fn columns(&self) -> &[f32] {
        &self.columns
    }

    /// Column restarts since construction.
    #[cfg(test)]
    pub fn resets(&self) -> u64 {
        self.resets
    }

    fn stagger_depth(&self, height: u32) -> f32 {
        match self.settings.stagger {
            Stagger::Rows(rows) => rows,
            Stagger::Screens(screens) => {
                let visible = (height as f32 / self.settings.cell_size).ceil();
                screens * visible
            }
        }
    }

    fn rebuild(&mut self, width: u32, height: u32) {
        let count = self.settings.column_count(width);
        let depth = self.stagger_depth(height);
        let mut columns = Vec::with_capacity(count);
        for _ in 0..count {
            columns.push((self.rng.next_unit() * -depth).floor());
        }
        self.columns = columns;
        log::debug!("code rain: {} columns on {}x{}", count, width, height);
    }

    fn column_x(&self, i: usize, width: f32) -> f32 {
        if self.settings.spread && !self.columns.is_empty() {
            i as f32 * (width / self.columns.len() as f32)
        } else {
            i as f32 * self.settings.cell_size
        }
    }

    fn step(&mut self) {
        let (w, h) = self.surface.size();
        let (w, h) = (w as f32, h as f32);
        let cell = self.settings.cell_size;

        self.surface.fill_rect(0.0, 0.0, w, h, self.settings.fade);

        for i in 0..self.columns.len() {
            let row = self.columns[i];
            let glyph = if self.settings.glyphs.is_empty() {
                ' '
            } else {
                self.settings.glyphs[self.rng.index(self.settings.glyphs.len())]
            };
            let alpha = if row > 0.0 {
                self.rng
                    .range(self.settings.min_opacity, self.settings.max_opacity)
            } else {
                1.0
            };
            self.surface.set_global_alpha(alpha);
            let at = Vec2::new(self.column_x(i, w), row * cell);
            self.surface.fill_glyph(glyph, at, cell, self.settings.color);

            let mut next = row;
            if row * cell > h && self.rng.chance(self.settings.reset_chance) {
                next = 0.0;
                self.resets += 1;
                log::trace!("code rain: column {} restarts", i);
            }
            next += match self.settings.speed {
                FallSpeed::Constant(v) => v,
                FallSpeed::Random { low, high } => self.rng.range(low, high),
            };
            self.columns[i] = next;
        }

        self.surface.set_global_alpha(1.0);
    }
}

impl<S: Surface, R: RandomSource> Effect for CodeRain<S, R> {
    type Surface = S;

    fn name(&self) -> &'static str {
        "rain"
    }

    fn cadence(&self) -> Cadence {
        Cadence::Every(self.settings.interval)
    }

    fn mount(&mut self, env: &Environment) -> bool {
        if env.viewport.is_empty() {
            return false;
        }
        self.surface.resize(env.viewport.width, env.viewport.height);
        self.rebuild(env.viewport.width, env.viewport.height);
        self.mounted = true;
        true
    }

    fn resize(&mut self, viewport: Viewport) {
        self.surface.resize(viewport.width, viewport.height);
        self.rebuild(viewport.width, viewport.height);
    }

    fn tick(&mut self) {
        if self.mounted {
            self.step();
        }
    }

    fn unmount(&mut self) {
        self.mounted = false;
        self.columns.clear();
        log::debug!("code rain: {} resets before unmount", self.resets);
    }

    fn is_mounted(&self) -> bool {
        self.mounted
    }

    fn surface(&self) -> &S {
        &self.surface
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use proptest::prelude::*;

    use super::*;
    use crate::rng::{seeded, Scripted};
    use crate::schedule::Scheduler;
    use crate::stage::Stage;
    use crate::surface::recording::{Op, Recorder};

    fn env(w: u32, h: u32) -> Environment {
        Environment {
            viewport: Viewport::new(w, h),
        }
    }

    fn dense_rain<R: RandomSource>(w: u32, h: u32, rng: R) -> (CodeRain<Recorder, R>, Recorder) {
        let log = Recorder::new();
        let mut rain = CodeRain::new(log.clone(), RainSettings::dense(), rng);
        assert!(rain.mount(&env(w, h)));
        (rain, log)
    }

    #[test]
    fn column_count_follows_width() {
        let (mut rain, _) = dense_rain(800, 600, seeded(Some(3)));
        assert_eq!(rain.columns().len(), 50);
        assert!(rain.columns().iter().all(|c| (-100.0..=0.0).contains(c)));

        rain.tick();
        rain.resize(Viewport::new(1000, 600));
        assert_eq!(rain.columns().len(), 62);
        assert!(rain.columns().iter().all(|c| (-100.0..=0.0).contains(c)));
    }

    #[test]
    fn tick_fades_then_draws_each_column() {
        let (mut rain, log) = dense_rain(64, 64, Scripted::constant(0.0));
        log.take();
        rain.tick();
        let ops = log.ops();

        assert_eq!(
            ops[0],
            Op::Rect {
                x: 0.0,
                y: 0.0,
                w: 64.0,
                h: 64.0,
                color: Rgba::BLACK.with_alpha(0.05)
            }
        );
        let glyphs: Vec<_> = ops
            .iter()
            .filter_map(|op| match op {
                Op::Glyph { glyph, at, .. } => Some((*glyph, *at)),
                _ => None,
            })
            .collect();
        assert_eq!(glyphs.len(), 4);
        for (i, (glyph, at)) in glyphs.iter().enumerate() {
            assert_eq!(*glyph, '0');
            assert_eq!(*at, Vec2::new(i as f32 * 16.0, 0.0));
        }
        assert_eq!(ops.last(), Some(&Op::Alpha(1.0)));
        assert!(rain.columns().iter().all(|c| *c == 1.0));
    }

    #[test]
    fn visible_rows_get_random_opacity() {
        let (mut rain, log) = dense_rain(16, 600, Scripted::constant(0.5));
        // Counter starts at floor(0.5 * -100) = -50.
        assert_eq!(rain.columns(), &[-50.0]);
        for _ in 0..51 {
            rain.tick();
        }
        log.take();
        rain.tick();
        let alpha = log.ops().iter().find_map(|op| match op {
            Op::Glyph { alpha, .. } => Some(*alpha),
            _ => None,
        });
        assert_eq!(alpha, Some(0.75));
    }

    #[test]
    fn reset_always_source_keeps_counters_on_screen() {
        let (mut rain, _) = dense_rain(800, 600, Scripted::constant(0.0));
        let rows = (600.0f32 / 16.0).ceil();
        for _ in 0..1000 {
            rain.tick();
            assert!(rain.columns().iter().all(|c| (-100.0..=rows).contains(c)));
        }
        assert!(rain.resets() > 0);
    }

    #[test]
    fn seeded_run_resets_and_stays_bounded() {
        let (mut rain, _) = dense_rain(800, 600, seeded(Some(2024)));
        let rows = (600.0f32 / 16.0).ceil();
        for _ in 0..1000 {
            rain.tick();
        }
        assert_eq!(rain.columns().len(), 50);
        assert!(rain.resets() > 0);
        assert!(rain
            .columns()
            .iter()
            .all(|c| (-100.0..=rows + 600.0).contains(c)));
    }

    #[test]
    fn columns_past_the_bottom_keep_falling_until_the_roll_succeeds() {
        let (mut rain, _) = dense_rain(16, 32, Scripted::constant(0.99));
        assert_eq!(rain.columns(), &[-99.0]);
        for _ in 0..200 {
            rain.tick();
        }
        assert_eq!(rain.resets(), 0);
        assert_eq!(rain.columns(), &[101.0]);
    }

    #[test]
    fn ambient_caps_and_spreads_columns() {
        let log = Recorder::new();
        let mut rain = CodeRain::new(log.clone(), RainSettings::ambient(), Scripted::constant(0.0));
        assert!(rain.mount(&env(1920, 120)));
        assert_eq!(rain.columns().len(), 80);

        log.take();
        rain.tick();
        let xs: Vec<f32> = log
            .ops()
            .iter()
            .filter_map(|op| match op {
                Op::Glyph { at, .. } => Some(at.x),
                _ => None,
            })
            .collect();
        assert_eq!(xs.len(), 80);
        assert_eq!(xs[1], 24.0);
        assert_eq!(xs[79], 79.0 * 24.0);
        // Random step with a zero sample is the low bound.
        assert!(rain.columns().iter().all(|c| *c == 0.5));
    }

    #[test]
    fn ambient_stagger_scales_with_height() {
        let log = Recorder::new();
        let mut rain = CodeRain::new(log, RainSettings::ambient(), Scripted::constant(0.5));
        assert!(rain.mount(&env(120, 120)));
        // rows = 10, depth = 20
        assert!(rain.columns().iter().all(|c| *c == -10.0));
    }

    #[test]
    fn narrow_surface_has_no_columns() {
        let (mut rain, log) = dense_rain(10, 100, seeded(Some(1)));
        assert!(rain.columns().is_empty());
        log.take();
        rain.tick();
        let ops = log.ops();
        assert!(matches!(ops[0], Op::Rect { .. }));
        assert!(!ops.iter().any(|op| matches!(op, Op::Glyph { .. })));
    }

    #[test]
    fn empty_viewport_does_not_mount() {
        let mut rain = CodeRain::new(Recorder::new(), RainSettings::dense(), seeded(Some(1)));
        assert!(!rain.mount(&env(0, 600)));
        assert!(!rain.is_mounted());
    }

    #[test]
    fn no_drawing_after_unmount() {
        let t0 = Instant::now();
        let log = Recorder::new();
        let rain = CodeRain::new(log.clone(), RainSettings::dense(), seeded(Some(5)));
        let mut stage: Stage<Recorder> =
            Stage::new(Scheduler::new(Duration::from_millis(16)), Viewport::new(320, 240));
        let id = stage.mount(Box::new(rain), t0);

        assert_eq!(stage.run_due(t0), 1);
        assert_eq!(stage.run_due(t0 + Duration::from_millis(35)), 1);
        stage.unmount(id);
        let before = log.len();
        for step in 2..100 {
            assert_eq!(stage.run_due(t0 + Duration::from_millis(35 * step)), 0);
        }
        assert_eq!(log.len(), before);
    }

    proptest! {
        #[test]
        fn column_count_is_floor_of_width(w in 0u32..5000, w2 in 1u32..5000) {
            let mut rain = CodeRain::new(Recorder::new(), RainSettings::dense(), seeded(Some(9)));
            if rain.mount(&env(w, 600)) {
                prop_assert_eq!(rain.columns().len(), (w / 16) as usize);
            }
            rain.resize(Viewport::new(w2, 600));
            prop_assert_eq!(rain.columns().len(), (w2 / 16) as usize);
        }
    }
}
