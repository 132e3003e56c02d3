use fastnoise_lite::{FastNoiseLite, NoiseType};

use crate::worldgen::{NoiseKind, NoiseParams};

/// Seeded coherent noise shared by every stage of one generator.
pub struct NoiseSampler {
    seed: u64,
    noise: FastNoiseLite,
}

impl NoiseSampler {
    /// The seed is truncated to the low 32 bits, the width FastNoiseLite works in.
    pub fn new(seed: u64, params: &NoiseParams) -> Self {
        let mut noise = FastNoiseLite::with_seed(seed as i32);
        noise.set_noise_type(Some(match params.noise_type {
            NoiseKind::OpenSimplex2 => NoiseType::OpenSimplex2,
            NoiseKind::Perlin => NoiseType::Perlin,
            NoiseKind::Value => NoiseType::Value,
        }));
        noise.set_frequency(Some(params.frequency));
        Self { seed, noise }
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// 2D sample in `[-1, 1]`.
    #[inline]
    pub fn sample(&self, x: i32, z: i32) -> f32 {
        self.noise.get_noise_2d(x as f32, z as f32).clamp(-1.0, 1.0)
    }

    #[inline]
    pub fn sample_3d(&self, x: i32, y: i32, z: i32) -> f32 {
        self.noise
            .get_noise_3d(x as f32, y as f32, z as f32)
            .clamp(-1.0, 1.0)
    }
}
