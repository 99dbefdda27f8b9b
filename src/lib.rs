/*!
# PSF Interpolation Quality Metric

Assesses the quality of interpolated Point Spread Function (PSF) images
against the true PSF images at the same field positions with a single scalar
Q value, a normalized inverse RMS error of the PSF shapes.

## Key Components

- [`ShapeEstimator`] - PSF shape measurement interface, with the
  moments-based [`Moments`] implementation
- [`ShapeCollection`] - measured shapes of an image sequence
- [`compute_q`]/[`q_from_shapes`] - the Q metric itself
- [`PsfStack`] - 3D numpy array loader for PSF image stacks

## Usage

```no_run
use psf_metric::{compute_q, MetricParameters, Moments, PsfStack};

# fn main() -> Result<(), Box<dyn std::error::Error>> {
let psf_int = PsfStack::load("psf_int.npy")?;
let psf_true = PsfStack::load("psf_true.npy")?;
let q = compute_q(&psf_int, &psf_true, &Moments, &MetricParameters::default())?;
println!("Q Value: {q}");
# Ok(())
# }
```
*/

mod error;
pub mod metric;
pub mod shape;
pub mod stack;

pub use error::Error;
pub use metric::{compute_q, q_from_shapes, MetricParameters, ShapeCollection};
pub use shape::{Moments, ShapeEstimator, ShapeVector};
pub use stack::PsfStack;
