//! Lag-product construction
//!
//! For each center time the builder writes the windowed, conjugate-symmetric
//! lag product into a zero-padded buffer of FFT length: lag `m` at index `m`,
//! lag `-m` at index `fft_length - m`.

use crate::config::PwvdParams;
use crate::error::PwvdError;
use crate::interpolate::Interpolator;
use crate::signal::Signal;
use crate::window::lag_taper;
use crate::Result;
use num_complex::Complex64;

const ZERO: Complex64 = Complex64::new(0.0, 0.0);

/// Per-worker scratch: the lag buffer plus FFT working space
///
/// A scratch must never be shared between concurrently evaluated instants.
/// `LagProductBuilder::build` re-zeroes the lag buffer on every call; the FFT
/// scratch is owned by the transform and needs no clearing.
pub struct LagScratch {
    lags: Vec<Complex64>,
    fft_scratch: Vec<Complex64>,
}

impl LagScratch {
    pub fn new(fft_length: usize, fft_scratch_length: usize) -> Result<Self> {
        Ok(Self {
            lags: zeroed_buffer(fft_length)?,
            fft_scratch: zeroed_buffer(fft_scratch_length)?,
        })
    }

    /// Lag buffer as last written (or transformed in place)
    pub fn lags(&self) -> &[Complex64] {
        &self.lags
    }

    pub(crate) fn buffers_mut(&mut self) -> (&mut [Complex64], &mut [Complex64]) {
        (&mut self.lags, &mut self.fft_scratch)
    }
}

fn zeroed_buffer(length: usize) -> Result<Vec<Complex64>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(length)
        .map_err(|_| PwvdError::Allocation {
            rows: length,
            cols: 1,
        })?;
    buffer.resize(length, ZERO);
    Ok(buffer)
}

/// Builds lag products for one signal and parameter set
pub struct LagProductBuilder<'a> {
    interpolator: Interpolator<'a>,
    taper: Vec<f64>,
    max_lag: usize,
    fft_length: usize,
}

impl<'a> LagProductBuilder<'a> {
    pub fn new(signal: &'a Signal, params: &PwvdParams) -> Result<Self> {
        let max_lag = params.max_lag();
        let fft_length = params.fft_length();
        if 2 * max_lag > fft_length {
            return Err(PwvdError::Computation(format!(
                "max lag {} does not fit FFT length {}",
                max_lag, fft_length
            )));
        }

        Ok(Self {
            interpolator: Interpolator::new(signal.samples(), params.interpolation_degree)?,
            taper: lag_taper(params.lag_window, max_lag),
            max_lag,
            fft_length,
        })
    }

    pub fn max_lag(&self) -> usize {
        self.max_lag
    }

    /// Write the lag product centered on sample `t` into `scratch`
    pub fn build(&self, t: usize, scratch: &mut LagScratch) {
        let lags = &mut scratch.lags;
        lags.fill(ZERO);

        lags[0] = self.interpolator.lag_product(t, 0) * self.taper[0];

        for lag in 1..=self.max_lag {
            let value = self.interpolator.lag_product(t, lag) * self.taper[lag];
            if 2 * lag == self.fft_length {
                // Lags +m and -m share this bin; their sum is 2 Re, stored averaged
                lags[lag] = Complex64::new(value.re, 0.0);
            } else {
                lags[lag] = value;
                lags[self.fft_length - lag] = value.conj();
            }
        }
    }
}
