//! PSF shape measurement
//!
//! Derives the ellipticity components `(e1, e2)` and the squared size `R²`
//! of a 2D image from its central second moments

use nalgebra::DMatrix;

#[derive(thiserror::Error, Debug)]
pub enum ShapeError {
    #[error("image has non-positive total flux ({0})")]
    ZeroFlux(f64),
    #[error("image contains non-finite pixel values")]
    NonFinite,
    #[error("second moment trace is non-positive ({0})")]
    DegenerateMoments(f64),
}

type Result<T> = std::result::Result<T, ShapeError>;

/// Ellipticity and size of a single PSF image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeVector {
    pub e1: f64,
    pub e2: f64,
    pub r2: f64,
}

/// PSF shape measurement interface
///
/// Implementations map a 2D pixel grid to a [`ShapeVector`]; the mapping must
/// be pure and deterministic so the metric stays a function of its inputs
pub trait ShapeEstimator: Sync {
    fn estimate(&self, image: &DMatrix<f64>) -> Result<ShapeVector>;
}

/// Shape estimator based on unweighted image moments
///
/// The ellipticity components and the squared size follow from the flux
/// weighted central second moments `q`:
///
/// ```text
/// e1 = (qxx - qyy) / (qxx + qyy)
/// e2 =     2 qxy   / (qxx + qyy)
/// R² =  qxx + qyy
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct Moments;

impl ShapeEstimator for Moments {
    fn estimate(&self, image: &DMatrix<f64>) -> Result<ShapeVector> {
        let (nrows, ncols) = image.shape();

        let mut m00 = 0f64;
        let mut m10 = 0f64;
        let mut m01 = 0f64;
        for row in 0..nrows {
            for col in 0..ncols {
                let p = image[(row, col)];
                if !p.is_finite() {
                    return Err(ShapeError::NonFinite);
                }
                m00 += p;
                m10 += col as f64 * p;
                m01 += row as f64 * p;
            }
        }
        if m00 <= 0f64 {
            return Err(ShapeError::ZeroFlux(m00));
        }

        let xc = m10 / m00;
        let yc = m01 / m00;

        let mut qxx = 0f64;
        let mut qyy = 0f64;
        let mut qxy = 0f64;
        for row in 0..nrows {
            for col in 0..ncols {
                let p = image[(row, col)];
                let dx = col as f64 - xc;
                let dy = row as f64 - yc;
                qxx += dx * dx * p;
                qyy += dy * dy * p;
                qxy += dx * dy * p;
            }
        }
        qxx /= m00;
        qyy /= m00;
        qxy /= m00;

        let r2 = qxx + qyy;
        if r2 <= 0f64 {
            return Err(ShapeError::DegenerateMoments(r2));
        }

        Ok(ShapeVector {
            e1: (qxx - qyy) / r2,
            e2: 2f64 * qxy / r2,
            r2,
        })
    }
}
