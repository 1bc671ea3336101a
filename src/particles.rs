// Copyright (c) 2026 rezky_nightky

//! Drifting point field with proximity links and pointer repulsion.
//!
//! Every tick clears the surface, integrates and wraps each particle,
//! draws the points, links every unordered pair closer than
//! `link_distance`, then nudges particles near the pointer away from it.
//! The link pass is a plain O(n²) scan; at around a hundred particles that
//! is cheaper than maintaining a spatial grid.

use glam::Vec2;
use rand::rngs::StdRng;

use crate::palette::NEON;
use crate::rng::RandomSource;
use crate::schedule::Cadence;
use crate::stage::{Effect, Environment, Viewport};
use crate::surface::{Rgba, Surface};

/// How far inside the far edge a particle re-enters after leaving
/// through the near edge.
const EDGE_INSET: f32 = 0.001;

#[derive(Clone, Debug, PartialEq)]
pub struct ParticleSettings {
    pub count: usize,
    pub min_radius: f32,
    pub max_radius: f32,
    /// Each velocity component is drawn from `[-max_speed, max_speed)`.
    pub max_speed: f32,
    pub palette: Vec<Rgba>,
    pub link_distance: f32,
    pub link_width: f32,
    pub repel_radius: f32,
    pub repel_strength: f32,
}

impl Default for ParticleSettings {
    fn default() -> Self {
        Self {
            count: 100,
            min_radius: 0.5,
            max_radius: 2.5,
            max_speed: 0.25,
            palette: NEON.to_vec(),
            link_distance: 100.0,
            link_width: 0.2,
            repel_radius: 150.0,
            repel_strength: 3.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub color: Rgba,
}

pub struct ParticleField<S, R = StdRng> {
    surface: S,
    settings: ParticleSettings,
    rng: R,
    particles: Vec<Particle>,
    pointer: Option<Vec2>,
    mounted: bool,
}

fn wrap(v: f32, max: f32) -> f32 {
    if !(max > 0.0) || !v.is_finite() || v >= max {
        return 0.0;
    }
    if v < 0.0 {
        let inset = max - EDGE_INSET;
        // Large extents swallow the inset; fall back to the previous float.
        return if inset < max {
            inset.max(0.0)
        } else {
            f32::from_bits(max.to_bits() - 1)
        };
    }
    v
}

fn wrap_into(p: Vec2, width: f32, height: f32) -> Vec2 {
    Vec2::new(wrap(p.x, width), wrap(p.y, height))
}

/// One-tick push away from `pointer`, fading linearly to zero at `radius`.
fn repel(position: Vec2, pointer: Vec2, radius: f32, strength: f32) -> Vec2 {
    let away = position - pointer;
    let d = away.length();
    if !(d > f32::EPSILON) || d >= radius {
        return position;
    }
    position + away / d * ((radius - d) / radius) * strength
}

impl<S: Surface, R: RandomSource> ParticleField<S, R> {
    pub fn new(surface: S, settings: ParticleSettings, rng: R) -> Self {
        Self {
            surface,
            settings,
            rng,
            particles: Vec::new(),
            pointer: None,
            mounted: false,
        }
    }

    #[cfg(test)]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    fn spawn(&mut self, width: f32, height: f32) -> Particle {
        let s = &self.settings;
        let x = self.rng.next_unit() * width;
        let y = self.rng.next_unit() * height;
        let radius = self.rng.range(s.min_radius, s.max_radius);
        let vx = self.rng.range(-s.max_speed, s.max_speed);
        let vy = self.rng.range(-s.max_speed, s.max_speed);
        let color = if s.palette.is_empty() {
            NEON[0]
        } else {
            s.palette[self.rng.index(s.palette.len())]
        };
        Particle {
            position: wrap_into(Vec2::new(x, y), width, height),
            velocity: Vec2::new(vx, vy),
            radius,
            color,
        }
    }

    /// Index pairs `(i, j)` with `i < j` closer than the link distance.
    pub fn links(&self) -> Vec<(usize, usize)> {
        let max = self.settings.link_distance;
        let mut out = Vec::new();
        for (i, a) in self.particles.iter().enumerate() {
            for (j, b) in self.particles.iter().enumerate().skip(i + 1) {
                if a.position.distance(b.position) < max {
                    out.push((i, j));
                }
            }
        }
        out
    }

    fn step(&mut self) {
        let (w, h) = self.surface.size();
        if w == 0 || h == 0 {
            return;
        }
        let (w, h) = (w as f32, h as f32);

        self.surface.clear();

        for p in &mut self.particles {
            p.position = wrap_into(p.position + p.velocity, w, h);
        }

        for p in &self.particles {
            self.surface.fill_circle(p.position, p.radius, p.color);
        }

        for (i, j) in self.links() {
            let (a, b) = (&self.particles[i], &self.particles[j]);
            self.surface
                .stroke_line(a.position, b.position, self.settings.link_width, a.color);
        }

        if let Some(pointer) = self.pointer {
            let (radius, strength) = (self.settings.repel_radius, self.settings.repel_strength);
            for p in &mut self.particles {
                let pushed = repel(p.position, pointer, radius, strength);
                p.position = wrap_into(pushed, w, h);
            }
        }
    }
}

impl<S: Surface, R: RandomSource> Effect for ParticleField<S, R> {
    type Surface = S;

    fn name(&self) -> &'static str {
        "particles"
    }

    fn cadence(&self) -> Cadence {
        Cadence::Frame
    }

    fn mount(&mut self, env: &Environment) -> bool {
        if env.viewport.is_empty() {
            return false;
        }
        self.surface.resize(env.viewport.width, env.viewport.height);
        let (w, h) = (env.viewport.width as f32, env.viewport.height as f32);
        self.particles.clear();
        for _ in 0..self.settings.count {
            let p = self.spawn(w, h);
            self.particles.push(p);
        }
        self.pointer = None;
        self.mounted = true;
        log::debug!(
            "particle field: {} particles on {}x{}",
            self.particles.len(),
            env.viewport.width,
            env.viewport.height
        );
        true
    }

    fn resize(&mut self, viewport: Viewport) {
        // Positions are kept; the next wrap pulls stragglers back in.
        self.surface.resize(viewport.width, viewport.height);
    }

    fn wants_pointer(&self) -> bool {
        true
    }

    fn pointer_moved(&mut self, at: Vec2) {
        if self.mounted {
            self.pointer = Some(at);
        }
    }

    fn tick(&mut self) {
        if self.mounted {
            self.step();
        }
    }

    fn unmount(&mut self) {
        self.mounted = false;
        self.pointer = None;
        self.particles.clear();
    }

    fn is_mounted(&self) -> bool {
        self.mounted
    }

    fn surface(&self) -> &S {
        &self.surface
    }
}
