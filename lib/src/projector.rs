//! Spectral projection of lag products
//!
//! Forward FFT of the lag buffer, unnormalized (scale factor 1). The real
//! part of the first `fft_length / 2` bins forms one distribution column:
//! row 0 is DC, row `fft_length / 2 - 1` lies just below Nyquist.

use crate::error::PwvdError;
use crate::lag::LagScratch;
use crate::Result;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Transforms lag buffers into half-spectrum columns
pub struct SpectralProjector {
    fft: Arc<dyn Fft<f64>>,
    fft_length: usize,
    rows: usize,
}

impl SpectralProjector {
    /// `fft_length` must be a power of two
    pub fn new(fft_length: usize) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(fft_length);

        Self {
            fft,
            fft_length,
            rows: fft_length / 2,
        }
    }

    pub fn fft_length(&self) -> usize {
        self.fft_length
    }

    /// Number of rows written per column
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// FFT scratch length a `LagScratch` needs for this projector
    pub fn scratch_length(&self) -> usize {
        self.fft.get_inplace_scratch_len()
    }

    /// Allocate a scratch sized for this projector
    pub fn make_scratch(&self) -> Result<LagScratch> {
        LagScratch::new(self.fft_length(), self.scratch_length())
    }

    /// Transform the lag buffer in place and write the real half spectrum
    pub fn project(&self, scratch: &mut LagScratch, column: &mut [f64]) -> Result<()> {
        if column.len() != self.rows {
            return Err(PwvdError::Computation(format!(
                "column has {} rows, expected {}",
                column.len(),
                self.rows
            )));
        }

        let (lags, fft_scratch) = scratch.buffers_mut();
        if lags.len() != self.fft_length() || fft_scratch.len() < self.scratch_length() {
            return Err(PwvdError::Computation(format!(
                "scratch sized {}/{} for FFT length {}",
                lags.len(),
                fft_scratch.len(),
                self.fft_length()
            )));
        }

        self.fft
            .process_with_scratch(lags, &mut fft_scratch[..self.scratch_length()]);

        for (value, bin) in column.iter_mut().zip(lags.iter()) {
            *value = bin.re;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;
    use std::f64::consts::PI;

    #[test]
    fn test_delta_gives_flat_column() {
        let projector = SpectralProjector::new(8);
        assert_eq!(projector.rows(), 4);

        let mut scratch = projector.make_scratch().unwrap();
        {
            let (lags, _) = scratch.buffers_mut();
            lags[0] = Complex64::new(2.5, 0.0);
        }
        let mut column = vec![0.0; 4];
        projector.project(&mut scratch, &mut column).unwrap();
        assert!(column.iter().all(|&v| (v - 2.5).abs() < 1e-12));
    }

    #[test]
    fn test_hermitian_exponential_peaks_at_its_bin() {
        let n = 32;
        let projector = SpectralProjector::new(n);
        let mut scratch = projector.make_scratch().unwrap();
        {
            let (lags, _) = scratch.buffers_mut();
            for (m, lag) in lags.iter_mut().enumerate() {
                *lag = Complex64::from_polar(1.0, 2.0 * PI * 5.0 * m as f64 / n as f64);
            }
        }
        let mut column = vec![0.0; n / 2];
        projector.project(&mut scratch, &mut column).unwrap();

        assert!((column[5] - n as f64).abs() < 1e-9);
        for (k, &v) in column.iter().enumerate() {
            if k != 5 {
                assert!(v.abs() < 1e-9, "bin {} = {}", k, v);
            }
        }
    }

    #[test]
    fn test_rejects_wrong_column() {
        let projector = SpectralProjector::new(16);
        let mut scratch = projector.make_scratch().unwrap();
        let mut column = vec![0.0; 5];
        assert!(matches!(
            projector.project(&mut scratch, &mut column),
            Err(PwvdError::Computation(_))
        ));
    }
}
