// Copyright (c) 2026 rezky_nightky

use crate::rain::RainVariant;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    Mono,
    Color16,
    Color256,
    TrueColor,
}

/// Which effects get mounted, bottom layer first.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scene {
    /// Particle field under the dense code rain.
    #[value(name = "hero")]
    Hero,
    #[value(name = "particles")]
    Particles,
    #[value(name = "rain")]
    Rain,
    #[value(name = "ambient-rain")]
    AmbientRain,
}

impl Scene {
    pub fn has_particles(self) -> bool {
        matches!(self, Scene::Hero | Scene::Particles)
    }

    pub fn rain_variant(self) -> Option<RainVariant> {
        match self {
            Scene::Hero | Scene::Rain => Some(RainVariant::Dense),
            Scene::AmbientRain => Some(RainVariant::Ambient),
            Scene::Particles => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hero_layers_particles_under_dense_rain() {
        assert!(Scene::Hero.has_particles());
        assert_eq!(Scene::Hero.rain_variant(), Some(RainVariant::Dense));
        assert!(!Scene::AmbientRain.has_particles());
        assert_eq!(Scene::Particles.rain_variant(), None);
    }
}
