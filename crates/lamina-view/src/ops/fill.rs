//! Generated Fills
//!
//! Fills a view from a generator closure or from a random distribution.
//! Values are drawn in view order (linear for vectors, row-major for
//! matrices) and written through the kernel in one pass.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::cmp::Ordering;

use rand::distributions::uniform::SampleUniform;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal, Uniform};

use lamina_core::{Error, Float, Result};

use crate::matrix::Matrix;
use crate::vector::Vector;

fn uniform<T: Float + SampleUniform>(low: T, high: T) -> Result<Uniform<T>> {
    if low.partial_cmp(&high) != Some(Ordering::Less) || !(high - low).is_finite() {
        return Err(Error::invalid_operation("uniform fill needs finite low < high"));
    }
    Ok(Uniform::new(low, high))
}

// =============================================================================
// Vector Fills
// =============================================================================

impl<T: Float> Vector<T> {
    /// Fills the vector with successive values of `generator`.
    ///
    /// # Arguments
    /// * `generator` - Called once per element, in view order
    pub fn fill_with(&self, mut generator: impl FnMut() -> T) -> Result<()> {
        let data: Vec<T> = (0..self.len()).map(|_| generator()).collect();
        self.copy_from_slice(&data)
    }

    /// Fills the vector with values drawn uniformly from `[low, high)`.
    ///
    /// # Arguments
    /// * `rng` - Random source
    /// * `low` - Inclusive lower bound
    /// * `high` - Exclusive upper bound
    pub fn fill_rnd<R: Rng + ?Sized>(&self, rng: &mut R, low: T, high: T) -> Result<()>
    where
        T: SampleUniform,
    {
        let dist = uniform(low, high)?;
        self.fill_with(|| dist.sample(rng))
    }

    /// Fills the vector with standard normal samples (mean 0, std 1).
    pub fn fill_randn<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<()>
    where
        StandardNormal: Distribution<T>,
    {
        self.fill_with(|| StandardNormal.sample(rng))
    }
}

// =============================================================================
// Matrix Fills
// =============================================================================

impl<T: Float> Matrix<T> {
    /// Fills the matrix row by row with successive values of `generator`.
    pub fn fill_with(&self, generator: impl FnMut() -> T) -> Result<()> {
        self.flat().fill_with(generator)
    }

    /// Fills the matrix with values drawn uniformly from `[low, high)`.
    pub fn fill_rnd<R: Rng + ?Sized>(&self, rng: &mut R, low: T, high: T) -> Result<()>
    where
        T: SampleUniform,
    {
        self.flat().fill_rnd(rng, low, high)
    }

    /// Fills the matrix with standard normal samples.
    pub fn fill_randn<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<()>
    where
        StandardNormal: Distribution<T>,
    {
        self.flat().fill_randn(rng)
    }
}

// =============================================================================
// Tests
// =============================================================================
