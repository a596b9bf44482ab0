//! Pseudo Wigner-Ville distribution engine
//!
//! Evaluates the time instants `0, stride, 2 * stride, ... < N`. Each instant
//! goes through the lag-product builder (with interpolation) and the spectral
//! projector, and its column is written to `t / stride` of the output.
//!
//! With the `parallel` feature the instants are distributed over rayon
//! workers. Every worker owns its `LagScratch` and writes a disjoint column,
//! so the result is bit-identical to the sequential path.

use crate::config::{PwvdParams, PwvdRequest};
use crate::distribution::Distribution;
use crate::error::PwvdError;
use crate::lag::LagProductBuilder;
use crate::projector::SpectralProjector;
use crate::radix2::Radix2;
use crate::signal::Signal;
use crate::window::WindowType;
use crate::Result;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Computes distributions for one validated parameter set
#[derive(Debug, Clone)]
pub struct PwvdEngine {
    params: PwvdParams,
}

impl PwvdEngine {
    /// Create an engine; fails fast if the parameters break an invariant
    pub fn new(params: PwvdParams) -> Result<Self> {
        params.check()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &PwvdParams {
        &self.params
    }

    /// Compute the distribution of `signal`
    ///
    /// The signal length must match the length the parameters were
    /// normalized for. Either the full matrix is returned or an error; no
    /// partial result is ever produced.
    pub fn compute(&self, signal: &Signal) -> Result<Distribution> {
        let params = &self.params;
        if signal.len() != params.signal_length {
            return Err(PwvdError::Computation(format!(
                "signal has {} samples, parameters were normalized for {}",
                signal.len(),
                params.signal_length
            )));
        }

        let (rows, cols) = params.shape();
        let mut distribution = Distribution::zeroed(rows, cols, params.time_resolution)?;

        log::info!(
            "Computing PWVD: {} samples, window {}, stride {}, degree {}, FFT {} -> {}x{}",
            params.signal_length,
            params.window_length,
            params.time_resolution,
            params.interpolation_degree,
            params.fft_length(),
            rows,
            cols
        );

        if rows == 0 {
            return Ok(distribution);
        }

        let builder = LagProductBuilder::new(signal, params)?;
        let projector = SpectralProjector::new(params.fft_length());

        #[cfg(feature = "parallel")]
        self.assemble_parallel(&builder, &projector, distribution.as_mut_slice())?;
        #[cfg(not(feature = "parallel"))]
        self.assemble_sequential(&builder, &projector, distribution.as_mut_slice())?;

        log::info!("PWVD complete: {} instants", cols);

        Ok(distribution)
    }

    #[cfg_attr(feature = "parallel", allow(dead_code))]
    fn assemble_sequential(
        &self,
        builder: &LagProductBuilder,
        projector: &SpectralProjector,
        data: &mut [f64],
    ) -> Result<()> {
        let stride = self.params.time_resolution;
        let mut scratch = projector.make_scratch()?;

        for (col, column) in data.chunks_mut(projector.rows()).enumerate() {
            let t = col * stride;
            log::debug!("Instant {}/{} at sample {}", col + 1, self.params.cols(), t);
            builder.build(t, &mut scratch);
            projector.project(&mut scratch, column)?;
        }
        Ok(())
    }

    #[cfg(feature = "parallel")]
    fn assemble_parallel(
        &self,
        builder: &LagProductBuilder,
        projector: &SpectralProjector,
        data: &mut [f64],
    ) -> Result<()> {
        let stride = self.params.time_resolution;

        data.par_chunks_mut(projector.rows())
            .enumerate()
            .try_for_each_init(
                || projector.make_scratch(),
                |scratch, (col, column)| {
                    let scratch = scratch.as_mut().map_err(|e| e.clone())?;
                    builder.build(col * stride, scratch);
                    projector.project(scratch, column)
                },
            )
    }
}

/// Core entry point on already validated parameters
///
/// `interpolation_degree` is sized to a power of two (0 acts as 1) and the
/// FFT length to a power of two covering `window_length` (0 means
/// `window_length`). Nothing is clamped: a window or stride outside
/// `1..=N` is a contract breach and fails with `Computation`.
pub fn compute_pwvd(
    signal: &Signal,
    window_length: usize,
    time_stride: usize,
    interpolation_degree: usize,
    fft_length: usize,
) -> Result<Distribution> {
    let params = PwvdParams {
        signal_length: signal.len(),
        window_length,
        time_resolution: time_stride,
        interpolation_degree: Radix2::for_length(interpolation_degree)?.length,
        fft: Radix2::for_length(fft_length.max(window_length))?,
        lag_window: WindowType::Rectangular,
    };
    PwvdEngine::new(params)?.compute(signal)
}

/// Validate a request against `signal` and compute its distribution
pub fn analyze(signal: &Signal, request: &PwvdRequest) -> Result<Distribution> {
    let params = request.normalize(signal.len())?;
    PwvdEngine::new(params)?.compute(signal)
}
