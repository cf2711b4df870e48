use std::ops::RangeInclusive;

use bevy::math::Vec2;
use bevy::prelude::{FromWorld, Resource, World};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SimulationParams;

/// The only source of randomness in a simulation; every draw comes from a
/// single seeded stream so runs replay exactly.
#[derive(Resource, Debug, Clone)]
pub struct SimulationRng {
    seed: u64,
    rng: StdRng,
}

impl SimulationRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn gen_range(&mut self, range: RangeInclusive<u32>) -> u32 {
        self.rng.gen_range(range)
    }

    pub fn gen_f32(&mut self, range: RangeInclusive<f32>) -> f32 {
        self.rng.gen_range(range)
    }

    /// Uniform offset inside a square of half-width `spread`.
    pub fn jitter(&mut self, spread: f32) -> Vec2 {
        if spread <= 0.0 {
            return Vec2::ZERO;
        }
        Vec2::new(
            self.gen_f32(-spread..=spread),
            self.gen_f32(-spread..=spread),
        )
    }
}

impl FromWorld for SimulationRng {
    fn from_world(world: &mut World) -> Self {
        let seed = world
            .get_resource::<SimulationParams>()
            .cloned()
            .unwrap_or_default()
            .seed;
        Self::new(seed)
    }
}
