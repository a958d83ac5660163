//! Resizable benchmark payload buffers.
//!
//! `BufferStore` owns the 1-D spectrum buffer and the 2-D image buffer. Each
//! buffer sits behind its own `parking_lot::RwLock`; the two are never locked
//! together.
//!
//! Resizing is "configure and reset": the buffer is reallocated and filled
//! with its element index (`i` for the spectrum, `r * cols + c` for the
//! image) even when the size does not change. The replacement buffer is built
//! before the lock is taken, so readers never see a partially filled buffer.

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::error::{BenchmarkError, Result};

/// Maximum spectrum length.
pub const MAX_SPECTRUM_LENGTH: usize = 4096;

/// Maximum image rows and columns.
pub const MAX_IMAGE_DIM: usize = 4096;

/// Smallest accepted dimension for either buffer.
pub const MIN_DIM: usize = 1;

/// Dense row-major 2-D payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageFrame {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl ImageFrame {
    /// Builds a frame from row-major data.
    ///
    /// Fails with `ShapeMismatch` if `data.len() != rows * cols` or the
    /// product overflows.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        match rows.checked_mul(cols) {
            Some(len) if len == data.len() => Ok(Self { rows, cols, data }),
            Some(len) => Err(BenchmarkError::shape_mismatch(
                format!("{} elements ({}x{})", len, rows, cols),
                format!("{} elements", data.len()),
            )),
            None => Err(BenchmarkError::shape_mismatch(
                format!("{}x{} (overflows usize)", rows, cols),
                format!("{} elements", data.len()),
            )),
        }
    }

    /// Builds a frame from nested rows. Ragged input is rejected.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != cols) {
            return Err(BenchmarkError::shape_mismatch(
                format!("{} columns in every row", cols),
                format!("{} columns in row {}", row.len(), i),
            ));
        }
        let n_rows = rows.len();
        let data = rows.into_iter().flatten().collect();
        Ok(Self {
            rows: n_rows,
            cols,
            data,
        })
    }

    /// Frame whose elements equal their row-major index.
    fn indexed(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: (0..rows * cols).map(|i| i as f64).collect(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Row-major elements.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    /// Element at `(row, col)`, or `None` outside the frame.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.data.get(row * self.cols + col).copied()
    }

    /// Copies the frame out as nested rows.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        if self.cols == 0 {
            return vec![Vec::new(); self.rows];
        }
        self.data.chunks(self.cols).map(<[f64]>::to_vec).collect()
    }
}

/// Checks a requested dimension against `[MIN_DIM, max]`.
fn checked_dim(what: &'static str, value: i64, max: usize) -> Result<usize> {
    match usize::try_from(value) {
        Ok(v) if (MIN_DIM..=max).contains(&v) => Ok(v),
        _ => Err(BenchmarkError::out_of_range(
            what,
            value,
            MIN_DIM as i64,
            max as i64,
        )),
    }
}

fn saturating_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn indexed_spectrum(length: usize) -> Vec<f64> {
    (0..length).map(|i| i as f64).collect()
}

/// Owner of the spectrum and image benchmark buffers.
#[derive(Debug)]
pub struct BufferStore {
    spectrum: RwLock<Vec<f64>>,
    image: RwLock<ImageFrame>,
}

impl BufferStore {
    /// Creates both buffers with index-derived content.
    pub fn new(spectrum_length: usize, image_rows: usize, image_cols: usize) -> Result<Self> {
        let length = checked_dim(
            "spectrum length",
            saturating_i64(spectrum_length),
            MAX_SPECTRUM_LENGTH,
        )?;
        let rows = checked_dim("image rows", saturating_i64(image_rows), MAX_IMAGE_DIM)?;
        let cols = checked_dim("image cols", saturating_i64(image_cols), MAX_IMAGE_DIM)?;

        Ok(Self {
            spectrum: RwLock::new(indexed_spectrum(length)),
            image: RwLock::new(ImageFrame::indexed(rows, cols)),
        })
    }

    /// Reallocates the spectrum to `length` elements, element `i = i`.
    #[instrument(skip(self))]
    pub fn set_spectrum_length(&self, length: i64) -> Result<()> {
        let length = checked_dim("spectrum length", length, MAX_SPECTRUM_LENGTH)?;
        let fresh = indexed_spectrum(length);
        *self.spectrum.write() = fresh;
        info!("Spectrum resized to {}", length);
        Ok(())
    }

    /// Reallocates the image to `rows x cols`, element `(r, c) = r * cols + c`.
    #[instrument(skip(self))]
    pub fn set_image_size(&self, rows: i64, cols: i64) -> Result<()> {
        let rows = checked_dim("image rows", rows, MAX_IMAGE_DIM)?;
        let cols = checked_dim("image cols", cols, MAX_IMAGE_DIM)?;
        let fresh = ImageFrame::indexed(rows, cols);
        *self.image.write() = fresh;
        info!("Image resized to {}x{}", rows, cols);
        Ok(())
    }

    /// Configured spectrum length.
    pub fn spectrum_length(&self) -> usize {
        self.spectrum.read().len()
    }

    /// Configured image `(rows, cols)`.
    pub fn image_size(&self) -> (usize, usize) {
        self.image.read().shape()
    }

    /// Copy of the spectrum contents.
    pub fn read_spectrum(&self) -> Vec<f64> {
        self.spectrum.read().clone()
    }

    /// Copy of the image contents.
    pub fn read_image(&self) -> ImageFrame {
        self.image.read().clone()
    }

    /// Replaces the spectrum contents. The length must match exactly.
    pub fn write_spectrum(&self, values: Vec<f64>) -> Result<()> {
        let mut spectrum = self.spectrum.write();
        if values.len() != spectrum.len() {
            return Err(BenchmarkError::shape_mismatch(
                format!("[{}]", spectrum.len()),
                format!("[{}]", values.len()),
            ));
        }
        *spectrum = values;
        debug!("Spectrum written ({} elements)", spectrum.len());
        Ok(())
    }

    /// Replaces the image contents. Rows and columns must match exactly.
    pub fn write_image(&self, frame: ImageFrame) -> Result<()> {
        let mut image = self.image.write();
        if frame.shape() != image.shape() {
            return Err(BenchmarkError::shape_mismatch(
                format!("{}x{}", image.rows, image.cols),
                format!("{}x{}", frame.rows, frame.cols),
            ));
        }
        *image = frame;
        debug!("Image written ({}x{})", image.rows, image.cols);
        Ok(())
    }
}
