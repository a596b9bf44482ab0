//! Lag window functions
//!
//! Tapers applied along the lag axis of the lag product. The rectangular
//! window gives the plain pseudo Wigner-Ville distribution; the tapered
//! windows trade frequency resolution for lower sidelobes.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Window function types available for the lag axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowType {
    /// Rectangular window (no tapering, default)
    #[default]
    Rectangular,
    /// Hanning window
    Hanning,
    /// Hamming window
    Hamming,
    /// Bartlett (triangular) window
    Bartlett,
}

impl fmt::Display for WindowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for WindowType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rectangular" | "rect" => Ok(WindowType::Rectangular),
            "hanning" | "hann" => Ok(WindowType::Hanning),
            "hamming" => Ok(WindowType::Hamming),
            "bartlett" => Ok(WindowType::Bartlett),
            _ => Err(format!(
                "Invalid window type: {} (valid: rectangular, hanning, hamming, bartlett)",
                s
            )),
        }
    }
}

impl WindowType {
    /// Get all available window types
    pub fn all() -> &'static [WindowType] {
        &[
            WindowType::Rectangular,
            WindowType::Hanning,
            WindowType::Hamming,
            WindowType::Bartlett,
        ]
    }

    /// Get the name of the window type
    pub fn name(&self) -> &'static str {
        match self {
            WindowType::Rectangular => "Rectangular",
            WindowType::Hanning => "Hanning",
            WindowType::Hamming => "Hamming",
            WindowType::Bartlett => "Bartlett",
        }
    }
}

/// Generate a symmetric window of the specified type and size
///
/// A window of size 1 is `[1.0]` for every type.
pub fn generate_window(window_type: WindowType, size: usize) -> Vec<f64> {
    let mut window = vec![1.0; size];
    if size < 2 {
        return window;
    }

    match window_type {
        WindowType::Rectangular => {}
        WindowType::Hanning => generate_hanning(&mut window),
        WindowType::Hamming => generate_hamming(&mut window),
        WindowType::Bartlett => generate_bartlett(&mut window),
    }

    window
}

fn generate_hanning(window: &mut [f64]) {
    let n = window.len();
    for (i, w) in window.iter_mut().enumerate() {
        *w = 0.5 * (1.0 - (2.0 * PI * i as f64 / (n - 1) as f64).cos());
    }
}

fn generate_hamming(window: &mut [f64]) {
    let n = window.len();
    for (i, w) in window.iter_mut().enumerate() {
        *w = 0.54 - 0.46 * (2.0 * PI * i as f64 / (n - 1) as f64).cos();
    }
}

fn generate_bartlett(window: &mut [f64]) {
    let n = window.len();
    let n_half = n / 2;

    for (i, w) in window.iter_mut().enumerate() {
        if i <= n_half {
            *w = 2.0 * i as f64 / (n - 1) as f64;
        } else {
            *w = 2.0 * (n - 1 - i) as f64 / (n - 1) as f64;
        }
    }
}

/// Lag weights for lags `0..=max_lag`
///
/// Taken from the right half of a symmetric window of `2 * max_lag + 3`
/// points without its end point, so the zero-lag weight is exactly 1 and
/// every admitted lag keeps a non-zero weight. Negative lags reuse the weight
/// of their mirror.
pub fn lag_taper(window_type: WindowType, max_lag: usize) -> Vec<f64> {
    let full = generate_window(window_type, 2 * max_lag + 3);
    let mut taper = full[max_lag + 1..2 * max_lag + 2].to_vec();
    // Guard against rounding in the cosine windows
    taper[0] = 1.0;
    taper
}

/// Calculate the coherent gain of a window (sum of window values)
pub fn coherent_gain(window: &[f64]) -> f64 {
    window.iter().sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_generation() {
        let size = 65;

        for &window_type in WindowType::all() {
            let window = generate_window(window_type, size);
            assert_eq!(window.len(), size);
            assert!(window.iter().all(|&w| w >= -1e-12));

            if window_type == WindowType::Rectangular {
                assert!(window.iter().all(|&w| (w - 1.0).abs() < 1e-10));
            }
        }
    }

    #[test]
    fn test_single_point_window() {
        for &window_type in WindowType::all() {
            assert_eq!(generate_window(window_type, 1), vec![1.0]);
            assert_eq!(lag_taper(window_type, 0), vec![1.0]);
        }
    }

    #[test]
    fn test_hanning_symmetry() {
        let window = generate_window(WindowType::Hanning, 33);

        for i in 0..window.len() / 2 {
            let left = window[i];
            let right = window[window.len() - 1 - i];
            assert!(
                (left - right).abs() < 1e-10,
                "Window not symmetric at position {}: {} != {}",
                i,
                left,
                right
            );
        }
    }

    #[test]
    fn test_lag_taper_shape() {
        for &window_type in WindowType::all() {
            let taper = lag_taper(window_type, 8);
            assert_eq!(taper.len(), 9);
            assert_eq!(taper[0], 1.0);
            // Non-increasing away from zero lag
            for pair in taper.windows(2) {
                assert!(pair[1] <= pair[0] + 1e-12, "{} taper increases", window_type);
            }
        }

        for &window_type in &[WindowType::Hanning, WindowType::Bartlett] {
            let taper = lag_taper(window_type, 4);
            assert!(taper[4] > 0.0, "{} drops the last lag", window_type);
        }
        let bartlett = lag_taper(WindowType::Bartlett, 3);
        for (w, e) in bartlett.iter().zip([1.0, 0.75, 0.5, 0.25]) {
            assert!((w - e).abs() < 1e-12);
        }
    }

    #[test]
    fn test_parse_window_type() {
        assert_eq!("hanning".parse::<WindowType>(), Ok(WindowType::Hanning));
        assert_eq!("RECT".parse::<WindowType>(), Ok(WindowType::Rectangular));
        assert!("kaiser".parse::<WindowType>().is_err());
        assert_eq!(WindowType::default(), WindowType::Rectangular);
    }

    #[test]
    fn test_coherent_gain() {
        let window = generate_window(WindowType::Rectangular, 16);
        assert!((coherent_gain(&window) - 16.0).abs() < 1e-12);
    }
}
