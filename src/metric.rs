//! PSF interpolation quality metric
//!
//! The Q metric compares a sample of interpolated PSF images to the true PSF
//! images at the same field positions, derived from eq.8 of Mandelbaum et al.,
//! GREAT3 results I, 2015, MNRAS, 450, 2963:
//!
//! ```text
//! Q = η / √( σ² + 1/m Σᵢ [ (Δe1ᵢ/α)² + (Δe2ᵢ/α)² + (ΔR²ᵢ/(β<R²>ᵗʳᵘᵉ))² ] )
//! ```
//!
//! where `α` is the target ellipticity stability, `β` the target size
//! stability and `<R²>ᵗʳᵘᵉ` the mean squared size of the true PSFs

use std::ops::Deref;

use itertools::izip;
use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::shape::{ShapeError, ShapeEstimator, ShapeVector};

#[derive(thiserror::Error, Debug)]
pub enum MetricError {
    #[error("PSF image sequences are empty")]
    Empty,
    #[error("PSF sequence length mismatch: {0} interpolated vs. {1} true")]
    LengthMismatch(usize, usize),
    #[error("{0} must be positive, got {1}")]
    NonPositiveTarget(&'static str, f64),
    #[error("mean squared size of the true PSFs is zero")]
    ZeroMeanSize,
    #[error("failed to measure a PSF shape")]
    Shape(#[from] ShapeError),
}

type Result<T> = std::result::Result<T, MetricError>;

/// Q metric normalization parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MetricParameters {
    /// Target PSF ellipticity stability (α)
    pub target_ellipticity: f64,
    /// Target PSF size stability (β)
    pub target_size: f64,
    /// Normalization parameter (η)
    pub eta: f64,
    /// Dispersion due to pixel noise (σ²)
    pub sigma_squared: f64,
}
impl Default for MetricParameters {
    fn default() -> Self {
        Self {
            target_ellipticity: 2e-4,
            target_size: 1e-3,
            eta: 2e3,
            sigma_squared: 1f64,
        }
    }
}
impl MetricParameters {
    fn validate(&self) -> Result<()> {
        if self.target_ellipticity <= 0f64 {
            return Err(MetricError::NonPositiveTarget(
                "target ellipticity stability",
                self.target_ellipticity,
            ));
        }
        if self.target_size <= 0f64 {
            return Err(MetricError::NonPositiveTarget(
                "target size stability",
                self.target_size,
            ));
        }
        Ok(())
    }
}

/// Measured PSF shapes, index-aligned with the source image sequence
#[derive(Debug, Clone)]
pub struct ShapeCollection(Vec<ShapeVector>);
impl Deref for ShapeCollection {
    type Target = Vec<ShapeVector>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl From<Vec<ShapeVector>> for ShapeCollection {
    fn from(shapes: Vec<ShapeVector>) -> Self {
        Self(shapes)
    }
}
impl ShapeCollection {
    /// Measures the shape of every image, preserving the image order
    ///
    /// Estimation runs in parallel across images; a single failing image
    /// aborts the whole collection
    pub fn from_images<E: ShapeEstimator>(
        images: &[DMatrix<f64>],
        estimator: &E,
    ) -> std::result::Result<Self, ShapeError> {
        images
            .par_iter()
            .map(|image| estimator.estimate(image))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Self)
    }
    /// Mean squared size `<R²>` over the collection
    pub fn mean_r2(&self) -> f64 {
        self.iter().map(|shape| shape.r2).sum::<f64>() / self.len() as f64
    }
}

/// Computes the Q metric from two sequences of PSF images
///
/// `interpolated[i]` and `true_images[i]` must sample the same field
/// position; positional correspondence is the caller's responsibility
pub fn compute_q<E: ShapeEstimator>(
    interpolated: &[DMatrix<f64>],
    true_images: &[DMatrix<f64>],
    estimator: &E,
    params: &MetricParameters,
) -> Result<f64> {
    check_lengths(interpolated.len(), true_images.len())?;
    params.validate()?;
    let shapes_int = ShapeCollection::from_images(interpolated, estimator)?;
    let shapes_true = ShapeCollection::from_images(true_images, estimator)?;
    q_from_shapes(&shapes_int, &shapes_true, params)
}

/// Computes the Q metric from already measured shape collections
pub fn q_from_shapes(
    interpolated: &ShapeCollection,
    true_shapes: &ShapeCollection,
    params: &MetricParameters,
) -> Result<f64> {
    check_lengths(interpolated.len(), true_shapes.len())?;
    params.validate()?;

    // normalized by the true PSFs mean size, not the interpolated ones
    let mean_r2_true = true_shapes.mean_r2();
    if mean_r2_true == 0f64 {
        return Err(MetricError::ZeroMeanSize);
    }

    let mse = izip!(interpolated.iter(), true_shapes.iter())
        .map(|(int, tru)| {
            let a = (int.e1 - tru.e1) / params.target_ellipticity;
            let b = (int.e2 - tru.e2) / params.target_ellipticity;
            let c = (int.r2 - tru.r2) / (params.target_size * mean_r2_true);
            a * a + b * b + c * c
        })
        .sum::<f64>()
        / interpolated.len() as f64;

    Ok(params.eta / (params.sigma_squared + mse).sqrt())
}

fn check_lengths(n_int: usize, n_true: usize) -> Result<()> {
    if n_int == 0 || n_true == 0 {
        return Err(MetricError::Empty);
    }
    if n_int != n_true {
        return Err(MetricError::LengthMismatch(n_int, n_true));
    }
    Ok(())
}
