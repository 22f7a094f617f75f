//! The single seeded random stream shared by the sampler and the composer.
//!
//! Every draw a simulation makes goes through [`SimulationStream`], and the
//! order of those draws is part of the output contract: the same seed yields
//! the same dataset on every platform. ChaCha8 is used because its output for
//! a given seed is fixed by the algorithm, unlike `StdRng`.

use crate::schema::ParameterRange;
use rand::distributions::Open01;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use std::f64::consts::TAU;

#[derive(Debug, Clone)]
pub struct SimulationStream {
    rng: ChaCha8Rng,
}

/// The three draws consumed for one monthly row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowDraws {
    /// Standard normal, scaled later by noise sigma and budget
    pub noise: f64,
    pub shock_flag: bool,
    /// Standard Laplace, scaled later by shock scale and budget
    pub shock: f64,
}

impl SimulationStream {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Uniform draw on `[low, high)`; a degenerate range returns `low` but
    /// still consumes one draw.
    pub fn uniform(&mut self, range: ParameterRange) -> f64 {
        let u: f64 = self.rng.gen();
        range.low + (range.high - range.low) * u
    }

    /// Uniform angle on `[0, 2π)`.
    pub fn uniform_phase(&mut self) -> f64 {
        let u: f64 = self.rng.gen();
        TAU * u
    }

    pub fn standard_normal(&mut self) -> f64 {
        StandardNormal.sample(&mut self.rng)
    }

    /// Bernoulli trial that always consumes exactly one uniform, including
    /// for `p` of 0 or 1.
    pub fn bernoulli(&mut self, p: f64) -> bool {
        let u: f64 = self.rng.gen();
        u < p
    }

    /// Laplace(0, 1) by inverse CDF on an open-interval uniform.
    pub fn standard_laplace(&mut self) -> f64 {
        let u: f64 = self.rng.sample(Open01);
        if u < 0.5 {
            (2.0 * u).ln()
        } else {
            -(2.0 - 2.0 * u).ln()
        }
    }

    /// Draws the randomness for one row: noise, then shock flag, then shock
    /// magnitude. The magnitude is drawn even when the flag is false.
    pub fn row_draws(&mut self, shock_probability: f64) -> RowDraws {
        let noise = self.standard_normal();
        let shock_flag = self.bernoulli(shock_probability);
        let shock = self.standard_laplace();
        RowDraws {
            noise,
            shock_flag,
            shock,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = SimulationStream::new(42);
        let mut b = SimulationStream::new(42);
        for _ in 0..100 {
            assert_eq!(a.row_draws(0.3), b.row_draws(0.3));
        }
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = SimulationStream::new(1);
        let mut b = SimulationStream::new(2);
        let xs: Vec<f64> = (0..10).map(|_| a.standard_normal()).collect();
        let ys: Vec<f64> = (0..10).map(|_| b.standard_normal()).collect();
        assert_ne!(xs, ys);
    }

    #[test]
    fn test_uniform_stays_in_range() {
        let mut stream = SimulationStream::new(7);
        let range = ParameterRange::new(-0.25, 0.75);
        for _ in 0..1000 {
            let x = stream.uniform(range);
            assert!(x >= -0.25 && x < 0.75);
        }
    }

    #[test]
    fn test_degenerate_range_still_consumes_a_draw() {
        let mut a = SimulationStream::new(9);
        let mut b = SimulationStream::new(9);

        assert_eq!(a.uniform(ParameterRange::fixed(3.0)), 3.0);
        b.uniform(ParameterRange::new(0.0, 1.0));

        assert_eq!(a.standard_normal(), b.standard_normal());
    }

    #[test]
    fn test_certain_bernoulli_keeps_stream_aligned() {
        let mut a = SimulationStream::new(11);
        let mut b = SimulationStream::new(11);

        assert!(a.bernoulli(1.0));
        assert!(!b.bernoulli(0.0));

        assert_eq!(a.standard_laplace(), b.standard_laplace());
    }

    #[test]
    fn test_phase_in_unit_circle() {
        let mut stream = SimulationStream::new(3);
        for _ in 0..1000 {
            let phase = stream.uniform_phase();
            assert!((0.0..TAU).contains(&phase));
        }
    }

    #[test]
    fn test_laplace_is_finite_and_centered() {
        let mut stream = SimulationStream::new(5);
        let n = 20_000;
        let samples: Vec<f64> = (0..n).map(|_| stream.standard_laplace()).collect();
        assert!(samples.iter().all(|x| x.is_finite()));

        let mean: f64 = samples.iter().sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.1, "mean {}", mean);

        // Var(Laplace(0, 1)) = 2
        let var: f64 = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
        assert!((var - 2.0).abs() < 0.3, "variance {}", var);
    }

    #[test]
    fn test_row_draws_order() {
        let mut sequenced = SimulationStream::new(21);
        let mut manual = SimulationStream::new(21);

        let draws = sequenced.row_draws(0.5);
        let noise = manual.standard_normal();
        let flag = manual.bernoulli(0.5);
        let shock = manual.standard_laplace();

        assert_eq!(draws.noise, noise);
        assert_eq!(draws.shock_flag, flag);
        assert_eq!(draws.shock, shock);
    }
}
