//! Seeded parameter initialisation.
//!
//! Affine and recurrent weights are drawn uniformly from
//! `±1/sqrt(fan_in)`; embedding rows are standard normal. Gaussian draws
//! use the Box-Muller transform to avoid a `rand_distr` dependency.

use ndarray::Array2;
use rand::Rng;

/// Uniform samples in `[-bound, bound)`.
pub fn uniform<R: Rng + ?Sized>(rows: usize, cols: usize, bound: f32, rng: &mut R) -> Array2<f32> {
    Array2::from_shape_simple_fn((rows, cols), || {
        let u: f32 = rng.random();
        (u * 2.0 - 1.0) * bound
    })
}

/// Standard-normal samples.
pub fn standard_normal<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Array2<f32> {
    Array2::from_shape_simple_fn((rows, cols), || box_muller(rng) as f32)
}

/// The `1/sqrt(fan_in)` bound for a layer with `fan_in` inputs.
pub fn fan_in_bound(fan_in: usize) -> f32 {
    1.0 / (fan_in.max(1) as f32).sqrt()
}

fn box_muller<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1: f64 = rng.random::<f64>().max(1e-300); // avoid ln(0)
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn uniform_respects_bound() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let w = uniform(16, 16, 0.25, &mut rng);
        assert_eq!(w.dim(), (16, 16));
        assert!(w.iter().all(|v| v.abs() <= 0.25));
    }

    #[test]
    fn same_seed_same_values() {
        let a = standard_normal(4, 3, &mut ChaCha8Rng::seed_from_u64(1));
        let b = standard_normal(4, 3, &mut ChaCha8Rng::seed_from_u64(1));
        let c = standard_normal(4, 3, &mut ChaCha8Rng::seed_from_u64(2));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn normal_samples_are_roughly_centred() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let w = standard_normal(100, 100, &mut rng);
        let mean = w.mean().unwrap();
        assert!(mean.abs() < 0.05, "mean {mean}");
    }
}
