//! Interpolation and degree smoothing of the lag product
//!
//! Degree 1 works on the raw samples. Higher degrees first upsample the
//! whole signal by the degree with a finite windowed-sinc kernel, which makes
//! the half-sample lags exact grid points, and then average each lag product
//! over center offsets in [-1/2, +1/2] sample with trapezoid weights summing
//! to one.

use crate::error::PwvdError;
use crate::Result;
use num_complex::Complex64;
use std::f64::consts::PI;

const ZERO: Complex64 = Complex64::new(0.0, 0.0);

/// Coarse samples on each side of an interpolated point
pub const HALF_TAPS: usize = 16;

/// Windowed-sinc taps for the fractional offset `mu` in (0, 1)
///
/// Tap `j` weights the coarse sample at offset `j + 1 - HALF_TAPS` from the
/// preceding grid point. The taps sum to one.
fn sinc_taps(mu: f64) -> [f64; 2 * HALF_TAPS] {
    let mut taps = [0.0; 2 * HALF_TAPS];
    let half = HALF_TAPS as f64;

    for (j, tap) in taps.iter_mut().enumerate() {
        let d = (j as f64 + 1.0 - half) - mu;
        let sinc = (PI * d).sin() / (PI * d);
        // Nuttall window over (-HALF_TAPS, HALF_TAPS)
        let x = (d + half) / (2.0 * half);
        let window = 0.355768 - 0.487396 * (2.0 * PI * x).cos() + 0.144232 * (4.0 * PI * x).cos()
            - 0.012604 * (6.0 * PI * x).cos();
        *tap = sinc * window;
    }

    let sum: f64 = taps.iter().sum();
    for tap in taps.iter_mut() {
        *tap /= sum;
    }
    taps
}

/// Band-limited upsampling of a complex sequence by `factor`
///
/// Every `factor`-th output sample equals the corresponding input sample.
/// The points in between are interpolated from at most `2 * HALF_TAPS`
/// neighbours; samples outside the sequence count as zero, so nothing wraps
/// from one end to the other.
pub fn upsample(signal: &[Complex64], factor: usize) -> Result<Vec<Complex64>> {
    let n = signal.len();
    if factor <= 1 || n == 0 {
        return Ok(signal.to_vec());
    }

    let fine_len = n
        .checked_mul(factor)
        .ok_or(PwvdError::Allocation { rows: n, cols: factor })?;
    let mut fine: Vec<Complex64> = Vec::new();
    fine.try_reserve_exact(fine_len)
        .map_err(|_| PwvdError::Allocation { rows: n, cols: factor })?;

    let phases: Vec<[f64; 2 * HALF_TAPS]> = (1..factor)
        .map(|r| sinc_taps(r as f64 / factor as f64))
        .collect();

    for (i, &sample) in signal.iter().enumerate() {
        fine.push(sample);
        for taps in &phases {
            let first = (i + 1).saturating_sub(HALF_TAPS);
            let skipped = first + HALF_TAPS - 1 - i;
            let last = (i + HALF_TAPS).min(n - 1);
            let value = signal[first..=last]
                .iter()
                .zip(&taps[skipped..])
                .fold(ZERO, |acc, (&x, &w)| acc + x * w);
            fine.push(value);
        }
    }

    Ok(fine)
}

/// Produces lag products `K(t, m)` at the configured interpolation degree
pub struct Interpolator<'a> {
    signal: &'a [Complex64],
    degree: usize,
    fine: Vec<Complex64>,
    weights: Vec<f64>,
}

impl<'a> Interpolator<'a> {
    /// `degree` must already be a power of two
    pub fn new(signal: &'a [Complex64], degree: usize) -> Result<Self> {
        if !degree.is_power_of_two() {
            return Err(PwvdError::Computation(format!(
                "interpolation degree {} is not a power of two",
                degree
            )));
        }

        if degree == 1 {
            return Ok(Self {
                signal,
                degree,
                fine: Vec::new(),
                weights: vec![1.0],
            });
        }

        let fine = upsample(signal, degree)?;
        let step = 1.0 / degree as f64;
        let weights = (0..=degree)
            .map(|i| if i == 0 || i == degree { 0.5 * step } else { step })
            .collect();

        log::debug!(
            "Interpolator: degree {}, {} samples upsampled to {}",
            degree,
            signal.len(),
            fine.len()
        );

        Ok(Self {
            signal,
            degree,
            fine,
            weights,
        })
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Upsampled signal (empty for degree 1)
    pub fn upsampled(&self) -> &[Complex64] {
        &self.fine
    }

    /// Lag product at time `t` and non-negative lag `lag`
    ///
    /// Pairs that reach outside the signal contribute zero. The value for a
    /// negative lag is the conjugate of the positive one.
    pub fn lag_product(&self, t: usize, lag: usize) -> Complex64 {
        if self.degree == 1 {
            self.raw_product(t, lag)
        } else {
            self.smoothed_product(t, lag)
        }
    }

    /// `x[t + ceil(m/2)] * conj(x[t - floor(m/2)])`
    fn raw_product(&self, t: usize, lag: usize) -> Complex64 {
        let ahead = self.signal.get(t + (lag + 1) / 2);
        let behind = t.checked_sub(lag / 2).and_then(|i| self.signal.get(i));
        match (ahead, behind) {
            (Some(a), Some(b)) => a * b.conj(),
            _ => ZERO,
        }
    }

    fn smoothed_product(&self, t: usize, lag: usize) -> Complex64 {
        let half_degree = (self.degree / 2) as isize;
        let last = (self.signal.len().saturating_sub(1) * self.degree) as isize;
        let center = (t * self.degree) as isize;
        let half_lag = lag as isize * half_degree;

        let mut sum = ZERO;
        for (i, &weight) in self.weights.iter().enumerate() {
            let offset = i as isize - half_degree;
            let ahead = center + offset + half_lag;
            let behind = center + offset - half_lag;
            if behind < 0 || ahead > last {
                continue;
            }
            sum += self.fine[ahead as usize] * self.fine[behind as usize].conj() * weight;
        }
        sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn exponential(n: usize, cycles: f64) -> Vec<Complex64> {
        (0..n)
            .map(|i| Complex64::from_polar(1.0, 2.0 * PI * cycles * i as f64 / n as f64))
            .collect()
    }

    #[test]
    fn test_upsample_keeps_original_samples() {
        let signal: Vec<Complex64> = [0.5, -1.0, 2.0, 0.25, 1.5, -0.75]
            .iter()
            .enumerate()
            .map(|(i, &re)| Complex64::new(re, 0.1 * i as f64))
            .collect();

        for factor in [2, 4, 8] {
            let fine = upsample(&signal, factor).unwrap();
            assert_eq!(fine.len(), signal.len() * factor);
            for (i, &x) in signal.iter().enumerate() {
                assert!(
                    (fine[i * factor] - x).norm() < 1e-10,
                    "factor {} sample {}",
                    factor,
                    i
                );
            }
        }
    }

    #[test]
    fn test_upsample_exponential_interior() {
        let n = 128;
        let signal = exponential(n, 3.0);
        let fine = upsample(&signal, 4).unwrap();
        // Away from the edges the kernel sees only signal samples
        for i in (HALF_TAPS * 4)..((n - HALF_TAPS) * 4) {
            let expected = Complex64::from_polar(1.0, 2.0 * PI * 3.0 * i as f64 / (4 * n) as f64);
            assert!((fine[i] - expected).norm() < 1e-4, "fine sample {}", i);
        }
    }

    #[test]
    fn test_upsample_does_not_wrap() {
        let mut signal = vec![ZERO; 64];
        signal[63] = Complex64::new(1.0, 0.0);
        for factor in [2, 4, 8] {
            let fine = upsample(&signal, factor).unwrap();
            let reach = (63 - HALF_TAPS) * factor;
            assert!(fine[..reach].iter().all(|z| *z == ZERO), "factor {}", factor);
            assert!(fine[reach + 1..].iter().any(|z| z.norm() > 0.0));
        }
    }

    #[test]
    fn test_sinc_taps_sum_to_one() {
        for mu in [0.125, 0.25, 0.5, 0.75] {
            let taps = sinc_taps(mu);
            assert!((taps.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        }
        // Half-sample taps are mirror images
        let half = sinc_taps(0.5);
        for j in 0..HALF_TAPS {
            assert!((half[j] - half[2 * HALF_TAPS - 1 - j]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_degree_one_is_raw_product() {
        let signal: Vec<Complex64> = (0..6).map(|i| Complex64::new(i as f64, 1.0)).collect();
        let interp = Interpolator::new(&signal, 1).unwrap();
        assert!(interp.upsampled().is_empty());

        assert_eq!(interp.lag_product(2, 0), signal[2] * signal[2].conj());
        assert_eq!(interp.lag_product(2, 1), signal[3] * signal[2].conj());
        assert_eq!(interp.lag_product(2, 4), signal[4] * signal[0].conj());
        assert_eq!(interp.lag_product(2, 5), signal[5] * signal[0].conj());
        assert_eq!(interp.lag_product(2, 6), ZERO);
        assert_eq!(interp.lag_product(5, 1), ZERO);
        assert_eq!(interp.lag_product(0, 2), ZERO);
    }

    #[test]
    fn test_phase_advances_one_sample_per_lag() {
        let n = 64;
        let signal = exponential(n, 5.0);
        let omega = 2.0 * PI * 5.0 / n as f64;

        for degree in [1, 2, 4, 8] {
            let interp = Interpolator::new(&signal, degree).unwrap();
            for lag in 0..8 {
                let product = interp.lag_product(32, lag);
                let expected = Complex64::from_polar(1.0, omega * lag as f64);
                assert!(
                    (product - expected).norm() < 1e-4,
                    "degree {} lag {}: {} vs {}",
                    degree,
                    lag,
                    product,
                    expected
                );
            }
        }
    }

    #[test]
    fn test_zero_lag_is_real() {
        let signal: Vec<Complex64> = (0..16)
            .map(|i| Complex64::new((i as f64 * 0.7).sin(), (i as f64 * 0.3).cos()))
            .collect();
        for degree in [1, 2, 4] {
            let interp = Interpolator::new(&signal, degree).unwrap();
            for t in 0..signal.len() {
                let k0 = interp.lag_product(t, 0);
                assert_eq!(k0.im, 0.0);
                assert!(k0.re >= 0.0);
            }
        }
    }

    #[test]
    fn test_edges_contribute_nothing_outside() {
        let signal = exponential(16, 2.0);
        let interp = Interpolator::new(&signal, 2).unwrap();
        // Lag reaching past both edges
        assert_eq!(interp.lag_product(0, 8), ZERO);
        assert_eq!(interp.lag_product(15, 4), ZERO);
        // Partial smoothing support at the first sample
        let k0 = interp.lag_product(0, 0);
        let expected = 0.5 * signal[0].norm_sqr() + 0.25 * interp.upsampled()[1].norm_sqr();
        assert!((k0.re - expected).abs() < 1e-12, "k0 = {}", k0);
    }

    #[test]
    fn test_rejects_non_power_of_two() {
        let signal = exponential(8, 1.0);
        assert!(matches!(
            Interpolator::new(&signal, 3),
            Err(PwvdError::Computation(_))
        ));
    }
}
