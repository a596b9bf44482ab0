//! Utility functions for test signals, formatting and summaries
//!
//! Helpers used by the client applications: synthetic signals, unit
//! conversion and human-readable descriptions of an analysis.

use crate::config::PwvdParams;
use crate::distribution::Distribution;
use crate::window::{coherent_gain, lag_taper};
use std::f64::consts::PI;

/// Real cosine of `frequency` Hz, `n` samples long
pub fn tone(n: usize, frequency: f64, sample_rate: f64) -> Vec<f64> {
    (0..n)
        .map(|i| (2.0 * PI * frequency * i as f64 / sample_rate).cos())
        .collect()
}

/// Real linear chirp sweeping from `f_start` to `f_end` Hz over `n` samples
pub fn linear_chirp(n: usize, f_start: f64, f_end: f64, sample_rate: f64) -> Vec<f64> {
    let duration = n as f64 / sample_rate;
    let rate = if duration > 0.0 {
        (f_end - f_start) / duration
    } else {
        0.0
    };
    (0..n)
        .map(|i| {
            let t = i as f64 / sample_rate;
            (2.0 * PI * (f_start * t + 0.5 * rate * t * t)).cos()
        })
        .collect()
}

/// Format a frequency value for display
pub fn format_frequency(freq_hz: f64) -> String {
    if freq_hz >= 1000.0 {
        format!("{:.2} kHz", freq_hz / 1000.0)
    } else {
        format!("{:.1} Hz", freq_hz)
    }
}

/// Format a time value for display
pub fn format_time(time_sec: f64) -> String {
    if time_sec >= 60.0 {
        let minutes = (time_sec / 60.0).floor();
        let seconds = time_sec % 60.0;
        format!("{:.0}m {:.1}s", minutes, seconds)
    } else {
        format!("{:.2}s", time_sec)
    }
}

/// Format duration in samples to time string
pub fn format_duration(samples: usize, sample_rate: f64) -> String {
    format_time(samples as f64 / sample_rate)
}

/// Frequency of distribution row `bin` for a given FFT length
pub fn bin_to_frequency(bin: usize, sample_rate: f64, fft_length: usize) -> f64 {
    bin as f64 * sample_rate / fft_length as f64
}

/// Nearest distribution row for `frequency`
pub fn frequency_to_bin(frequency: f64, sample_rate: f64, fft_length: usize) -> usize {
    (frequency * fft_length as f64 / sample_rate).round().max(0.0) as usize
}

/// DC gain of the lag taper as the lag buffer applies it, both lag sides
pub fn lag_window_gain(params: &PwvdParams) -> f64 {
    let taper = lag_taper(params.lag_window, params.max_lag());
    let one_side = coherent_gain(&taper) - taper[0];
    if 2 * params.max_lag() == params.fft_length() {
        // The outermost pair shares a single bin
        taper[0] + 2.0 * one_side - taper[params.max_lag()]
    } else {
        taper[0] + 2.0 * one_side
    }
}

/// Summary of a parameter set and, when available, its result
pub fn analysis_summary(
    params: &PwvdParams,
    distribution: Option<&Distribution>,
    sample_rate: Option<f64>,
) -> String {
    let mut summary = String::new();
    let sr = sample_rate.unwrap_or(1.0);

    summary.push_str(&format!("Signal: {} samples", params.signal_length));
    if let Some(sr) = sample_rate {
        summary.push_str(&format!(
            ", {} Hz, {}",
            sr,
            format_duration(params.signal_length, sr)
        ));
    }
    summary.push('\n');

    summary.push_str("PWVD Config:\n");
    summary.push_str(&format!("  Window length: {} samples\n", params.window_length));
    summary.push_str(&format!("  Max lag: {}\n", params.max_lag()));
    summary.push_str(&format!("  Time resolution: {} samples\n", params.time_resolution));
    summary.push_str(&format!(
        "  Interpolation degree: {}\n",
        params.interpolation_degree
    ));
    summary.push_str(&format!(
        "  FFT length: {} (order {})\n",
        params.fft_length(),
        params.window_order()
    ));
    summary.push_str(&format!(
        "  Lag window: {} (gain {:.2})\n",
        params.lag_window.name(),
        lag_window_gain(params)
    ));
    summary.push_str(&format!("  Output: {} x {}\n", params.rows(), params.cols()));

    if sample_rate.is_some() {
        summary.push_str(&format!(
            "  Bin spacing: {}\n",
            format_frequency(bin_to_frequency(1, sr, params.fft_length()))
        ));
        summary.push_str(&format!(
            "  Instant spacing: {:.2}ms\n",
            params.time_resolution as f64 / sr * 1000.0
        ));
    }

    if let Some(dist) = distribution {
        summary.push_str("Distribution:\n");
        if let Some((row, col, value)) = dist.find_peak() {
            let f = bin_to_frequency(row, sr, dist.fft_length());
            let t = dist.time_index(col) as f64 / sr;
            match sample_rate {
                Some(_) => summary.push_str(&format!(
                    "  Peak: {:.4} at {} / {}\n",
                    value,
                    format_frequency(f),
                    format_time(t)
                )),
                None => summary.push_str(&format!(
                    "  Peak: {:.4} at bin {} ({:.4} cycles/sample), sample {}\n",
                    value,
                    row,
                    f,
                    dist.time_index(col)
                )),
            }
        }
        let total: f64 = dist.as_slice().iter().sum();
        let negative = dist.as_slice().iter().filter(|&&v| v < 0.0).count();
        summary.push_str(&format!("  Total energy: {:.4}\n", total));
        summary.push_str(&format!(
            "  Negative cells: {} of {}\n",
            negative,
            dist.as_slice().len()
        ));
    }

    summary
}

/// Log resolution figures of a parameter set for audio at `sample_rate`
pub fn validate_params_for_audio(params: &PwvdParams, sample_rate: f64) {
    let bin_spacing = bin_to_frequency(1, sample_rate, params.fft_length());
    let lag_span = params.window_length as f64 / sample_rate;
    let instant_spacing = params.time_resolution as f64 / sample_rate;

    log::info!("PWVD validation:");
    log::info!("  Bin spacing: {}", format_frequency(bin_spacing));
    log::info!("  Nyquist frequency: {}", format_frequency(sample_rate / 2.0));
    log::info!("  Lag span: {:.2}ms", lag_span * 1000.0);

    if params.cols() > 10_000 {
        log::warn!(
            "{} time instants requested, consider a larger time resolution",
            params.cols()
        );
    }
    if instant_spacing > 0.1 {
        log::warn!(
            "Time resolution ({:.2}ms) is quite coarse",
            instant_spacing * 1000.0
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PwvdRequest;
    use crate::engine::analyze;
    use crate::signal::Signal;
    use crate::window::WindowType;

    #[test]
    fn test_tone_and_chirp() {
        let x = tone(8, 2000.0, 8000.0);
        let expected = [1.0, 0.0, -1.0, 0.0, 1.0, 0.0, -1.0, 0.0];
        for (a, b) in x.iter().zip(expected) {
            assert!((a - b).abs() < 1e-12);
        }

        let flat = linear_chirp(16, 500.0, 500.0, 8000.0);
        let reference = tone(16, 500.0, 8000.0);
        for (a, b) in flat.iter().zip(&reference) {
            assert!((a - b).abs() < 1e-12);
        }
        assert!(linear_chirp(0, 1.0, 2.0, 8000.0).is_empty());
    }

    #[test]
    fn test_chirp_frequency_rises() {
        let n = 1024;
        let sr = 1024.0;
        let real = linear_chirp(n, 50.0, 300.0, sr);
        let signal = Signal::analytic(&real).unwrap();
        let dist = analyze(&signal, &PwvdRequest::new(127, 64, 1, Some(256)))
            .unwrap()
            .with_sample_rate(sr);

        let early = dist.frequency_axis()[dist.peak_row(2).unwrap()];
        let late = dist.frequency_axis()[dist.peak_row(13).unwrap()];
        // Instantaneous frequency is 50 + 250 t
        assert!((early - (50.0 + 250.0 * 128.0 / sr)).abs() < 10.0, "early {}", early);
        assert!((late - (50.0 + 250.0 * 832.0 / sr)).abs() < 10.0, "late {}", late);
    }

    #[test]
    fn test_bin_conversion() {
        assert_eq!(bin_to_frequency(4, 8000.0, 64), 500.0);
        assert_eq!(frequency_to_bin(500.0, 8000.0, 64), 4);
        assert_eq!(frequency_to_bin(-10.0, 8000.0, 64), 0);
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_frequency(440.0), "440.0 Hz");
        assert_eq!(format_frequency(2500.0), "2.50 kHz");
        assert_eq!(format_time(1.5), "1.50s");
        assert_eq!(format_time(90.0), "1m 30.0s");
        assert_eq!(format_duration(4000, 8000.0), "0.50s");
    }

    #[test]
    fn test_summary() {
        let signal = Signal::analytic(&tone(64, 1000.0, 8000.0)).unwrap();
        let params = PwvdRequest::new(31, 4, 1, Some(64)).normalize(64).unwrap();
        let dist = analyze(&signal, &PwvdRequest::new(31, 4, 1, Some(64))).unwrap();

        let summary = analysis_summary(&params, Some(&dist), Some(8000.0));
        assert!(summary.contains("Window length: 31 samples"));
        assert!(summary.contains("FFT length: 64 (order 6)"));
        assert!(summary.contains("Output: 32 x 16"));
        assert!(summary.contains("Peak:"));
        assert!(summary.contains("Lag window: Rectangular (gain 31.00)"));

        let bare = analysis_summary(&params, None, None);
        assert!(!bare.contains("Distribution"));
        assert!(bare.contains("Rectangular"));
    }

    #[test]
    fn test_lag_window_gain_matches_dc_bin() {
        let signal = Signal::from_real(&[1.0; 64]);
        for &window_type in WindowType::all() {
            for (window, fft) in [(15, Some(16)), (16, Some(16)), (9, None)] {
                let request = PwvdRequest::new(window, 8, 1, fft).with_lag_window(window_type);
                let params = request.normalize(64).unwrap();
                let dist = analyze(&signal, &request).unwrap();
                // Interior instant t = 32
                let dc = dist.get(0, 4);
                assert!(
                    (lag_window_gain(&params) - dc).abs() < 1e-9,
                    "{} window {}: {} vs {}",
                    window_type,
                    window,
                    lag_window_gain(&params),
                    dc
                );
            }
        }
    }
}
