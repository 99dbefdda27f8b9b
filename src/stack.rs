//! PSF image stack loading
//!
//! Reads a 3D numpy array of 2D PSF images (images x rows x columns) from a
//! `.npy` file or from the first array of a `.npz` archive

use std::{
    fs::File,
    io::{self, BufReader},
    ops::Deref,
    path::Path,
};

use nalgebra::DMatrix;
use npyz::npz::NpzArchive;

#[derive(thiserror::Error, Debug)]
pub enum StackError {
    #[error("failed to read the PSF file")]
    Io(#[from] io::Error),
    #[error("expected a 3D array of 2D images, got a {0}D array")]
    Rank(usize),
    #[error("PSF array has a zero-sized dimension: {0} x {1} x {2}")]
    EmptyDimension(usize, usize, usize),
    #[error("the npz archive {0:?} holds no array")]
    EmptyArchive(std::path::PathBuf),
    #[error("unsupported PSF file extension: {0:?} (expected .npy or .npz)")]
    Extension(std::path::PathBuf),
}

type Result<T> = std::result::Result<T, StackError>;

/// A stack of 2D PSF images loaded from a numpy file
#[derive(Debug)]
pub struct PsfStack(Vec<DMatrix<f64>>);
impl Deref for PsfStack {
    type Target = Vec<DMatrix<f64>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl PsfStack {
    /// Loads a PSF stack from a `.npy` or `.npz` file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("npy") => {
                let npy = npyz::NpyFile::new(BufReader::new(File::open(path)?))?;
                Self::from_npy(npy)
            }
            Some("npz") => {
                let mut npz = NpzArchive::open(path)?;
                let name = npz
                    .array_names()
                    .next()
                    .ok_or_else(|| StackError::EmptyArchive(path.to_path_buf()))?
                    .to_string();
                let npy = npz
                    .by_name(&name)?
                    .ok_or_else(|| StackError::EmptyArchive(path.to_path_buf()))?;
                Self::from_npy(npy)
            }
            _ => Err(StackError::Extension(path.to_path_buf())),
        }
    }
    fn from_npy<R: io::Read>(npy: npyz::NpyFile<R>) -> Result<Self> {
        let shape: Vec<usize> = npy.shape().iter().map(|&n| n as usize).collect();
        let &[n_psf, n_rows, n_cols] = shape.as_slice() else {
            return Err(StackError::Rank(shape.len()));
        };
        if n_psf == 0 || n_rows == 0 || n_cols == 0 {
            return Err(StackError::EmptyDimension(n_psf, n_rows, n_cols));
        }
        let data = npy.into_vec::<f64>()?;
        debug_assert_eq!(data.len(), n_psf * n_rows * n_cols);
        Ok(Self(
            data.chunks(n_rows * n_cols)
                .map(|pixels| DMatrix::from_row_slice(n_rows, n_cols, pixels))
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use npyz::WriterBuilder;
    use std::io::Cursor;

    fn npy_bytes(shape: &[u64], data: &[f64]) -> Vec<u8> {
        let mut bytes = Vec::new();
        let mut writer = npyz::WriteOptions::new()
            .default_dtype()
            .shape(shape)
            .writer(Cursor::new(&mut bytes))
            .begin_nd()
            .unwrap();
        writer.extend(data.iter().copied()).unwrap();
        writer.finish().unwrap();
        bytes
    }

    #[test]
    fn stack_from_npy() {
        let bytes = npy_bytes(&[2, 2, 3], &(0..12).map(|x| x as f64).collect::<Vec<_>>());
        let npy = npyz::NpyFile::new(Cursor::new(bytes)).unwrap();
        let stack = PsfStack::from_npy(npy).unwrap();
        assert_eq!(stack.len(), 2);
        assert_eq!(stack[0].shape(), (2, 3));
        // row-major layout: first image row is 0,1,2
        assert_eq!(stack[0][(0, 2)], 2f64);
        assert_eq!(stack[1][(0, 0)], 6f64);
    }

    #[test]
    fn wrong_rank_is_rejected() {
        let bytes = npy_bytes(&[4, 3], &(0..12).map(|x| x as f64).collect::<Vec<_>>());
        let npy = npyz::NpyFile::new(Cursor::new(bytes)).unwrap();
        let err = PsfStack::from_npy(npy).unwrap_err();
        assert!(matches!(err, StackError::Rank(2)));
    }

    #[test]
    fn zero_sized_dimension_is_rejected() {
        let bytes = npy_bytes(&[2, 0, 5], &[]);
        let npy = npyz::NpyFile::new(Cursor::new(bytes)).unwrap();
        let err = PsfStack::from_npy(npy).unwrap_err();
        assert!(matches!(err, StackError::EmptyDimension(2, 0, 5)));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = PsfStack::load("psfs.fits").unwrap_err();
        assert!(matches!(err, StackError::Extension(_)));
    }
}
