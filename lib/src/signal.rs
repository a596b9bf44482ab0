//! Signal model
//!
//! A signal is an ordered sequence of complex samples. Real input is stored
//! with a zero imaginary part; the analytic form must be requested explicitly.

use crate::error::PwvdError;
use crate::Result;
use num_complex::Complex64;
use realfft::RealFftPlanner;
use rustfft::FftPlanner;

/// Sampled one-dimensional signal, real or complex
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    samples: Vec<Complex64>,
    complex: bool,
}

impl Signal {
    /// Real signal; the imaginary part is zero throughout
    pub fn from_real(samples: &[f64]) -> Self {
        Self {
            samples: samples.iter().map(|&re| Complex64::new(re, 0.0)).collect(),
            complex: false,
        }
    }

    /// Signal from separate real and optional imaginary parts
    pub fn from_parts(real: &[f64], imag: Option<&[f64]>) -> Result<Self> {
        match imag {
            None => Ok(Self::from_real(real)),
            Some(imag) => {
                if imag.len() != real.len() {
                    return Err(PwvdError::invalid(
                        "signal",
                        format!(
                            "imaginary part has {} samples, real part has {}",
                            imag.len(),
                            real.len()
                        ),
                    ));
                }
                Ok(Self {
                    samples: real
                        .iter()
                        .zip(imag)
                        .map(|(&re, &im)| Complex64::new(re, im))
                        .collect(),
                    complex: true,
                })
            }
        }
    }

    /// Complex signal taking ownership of the samples
    pub fn from_complex(samples: Vec<Complex64>) -> Self {
        Self {
            samples,
            complex: true,
        }
    }

    /// Analytic signal of a real sequence (FFT Hilbert transform)
    ///
    /// Negative-frequency bins are zeroed, positive bins doubled, DC and
    /// (for even lengths) Nyquist kept as they are. The real part of the
    /// result reproduces the input.
    pub fn analytic(samples: &[f64]) -> Result<Self> {
        let n = samples.len();
        if n == 0 {
            return Ok(Self::from_complex(Vec::new()));
        }

        let mut planner = RealFftPlanner::<f64>::new();
        let r2c = planner.plan_fft_forward(n);
        let mut input = r2c.make_input_vec();
        input.copy_from_slice(samples);
        let mut half_spectrum = r2c.make_output_vec();
        r2c.process(&mut input, &mut half_spectrum)
            .map_err(|e| PwvdError::Fft(e.to_string()))?;

        let mut spectrum = vec![Complex64::new(0.0, 0.0); n];
        for (k, &bin) in half_spectrum.iter().enumerate() {
            spectrum[k] = if k == 0 || 2 * k == n { bin } else { bin * 2.0 };
        }

        let mut fft_planner = FftPlanner::<f64>::new();
        let inverse = fft_planner.plan_fft_inverse(n);
        inverse.process(&mut spectrum);

        let scale = 1.0 / n as f64;
        for value in spectrum.iter_mut() {
            *value *= scale;
        }

        log::debug!("Analytic signal computed for {} samples", n);

        Ok(Self::from_complex(spectrum))
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Whether the signal carries an imaginary part
    pub fn is_complex(&self) -> bool {
        self.complex
    }

    pub fn samples(&self) -> &[Complex64] {
        &self.samples
    }

    pub fn sample(&self, index: usize) -> Option<Complex64> {
        self.samples.get(index).copied()
    }

    /// Real parts of all samples
    pub fn real(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.re).collect()
    }

    /// Total energy, sum of |x|^2
    pub fn energy(&self) -> f64 {
        self.samples.iter().map(|s| s.norm_sqr()).sum()
    }
}
