//! PWVD parameters and their validation
//!
//! `PwvdRequest` carries parameters as a loosely typed caller would supply
//! them. `normalize` applies the validation and coercion rules and produces
//! `PwvdParams`, the only parameter type the engine accepts.

use crate::error::PwvdError;
use crate::radix2::Radix2;
use crate::window::WindowType;
use crate::Result;

/// Parameters as requested by a caller, before validation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PwvdRequest {
    /// Lag window length in samples
    pub window_length: i64,
    /// Stride between evaluated time instants
    pub time_resolution: i64,
    /// Interpolation degree, rounded up to a power of two
    pub interpolation_degree: i64,
    /// FFT length, defaults to the window length when `None`
    pub fft_length: Option<i64>,
    /// Taper applied along the lag axis
    pub lag_window: WindowType,
}

impl Default for PwvdRequest {
    fn default() -> Self {
        Self {
            window_length: 127,
            time_resolution: 1,
            interpolation_degree: 1,
            fft_length: None,
            lag_window: WindowType::Rectangular,
        }
    }
}

impl PwvdRequest {
    pub fn new(
        window_length: i64,
        time_resolution: i64,
        interpolation_degree: i64,
        fft_length: Option<i64>,
    ) -> Self {
        Self {
            window_length,
            time_resolution,
            interpolation_degree,
            fft_length,
            lag_window: WindowType::Rectangular,
        }
    }

    pub fn with_lag_window(mut self, lag_window: WindowType) -> Self {
        self.lag_window = lag_window;
        self
    }

    /// Validate against a signal of `signal_length` samples
    ///
    /// A window longer than the signal is truncated with a warning and a
    /// short FFT length is raised to the window length silently. All other
    /// violations are errors.
    pub fn normalize(&self, signal_length: usize) -> Result<PwvdParams> {
        if signal_length < 2 {
            return Err(PwvdError::invalid(
                "signal",
                "input must be a vector of at least 2 samples",
            ));
        }
        let n = signal_length as i64;

        if self.window_length < 1 {
            return Err(PwvdError::invalid(
                "window_length",
                "window length must be greater than zero",
            ));
        }
        let window_length = if self.window_length > n {
            log::warn!(
                "Window length {} has been truncated to signal length {}",
                self.window_length,
                signal_length
            );
            signal_length
        } else {
            self.window_length as usize
        };

        if self.time_resolution < 1 {
            return Err(PwvdError::invalid(
                "time_resolution",
                "time resolution must be greater than zero",
            ));
        }
        if self.time_resolution > n {
            return Err(PwvdError::invalid(
                "time_resolution",
                "time resolution must be no greater than signal length",
            ));
        }

        let interpolation_degree =
            Radix2::for_length(self.interpolation_degree.max(0) as usize)?.length;

        let fft_length = self.fft_length.unwrap_or(window_length as i64);
        if fft_length < 0 {
            return Err(PwvdError::invalid(
                "fft_length",
                "FFT length must be greater than zero",
            ));
        }
        let fft_length = (fft_length as usize).max(window_length);

        Ok(PwvdParams {
            signal_length,
            window_length,
            time_resolution: self.time_resolution as usize,
            interpolation_degree,
            fft: Radix2::for_length(fft_length)?,
            lag_window: self.lag_window,
        })
    }
}

/// Validated, normalized parameters for one signal length
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PwvdParams {
    pub signal_length: usize,
    pub window_length: usize,
    pub time_resolution: usize,
    /// Power of two
    pub interpolation_degree: usize,
    /// Radix-2 FFT length and its order
    pub fft: Radix2,
    pub lag_window: WindowType,
}

impl PwvdParams {
    /// FFT length, a power of two
    pub fn fft_length(&self) -> usize {
        self.fft.length
    }

    pub fn window_order(&self) -> u32 {
        self.fft.order
    }

    /// Number of frequency rows (half the FFT length)
    pub fn rows(&self) -> usize {
        self.fft.length / 2
    }

    /// Number of evaluated time instants, `ceil(N / stride)`
    pub fn cols(&self) -> usize {
        self.signal_length.div_ceil(self.time_resolution)
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows(), self.cols())
    }

    /// Largest lag placed in the lag buffer
    pub fn max_lag(&self) -> usize {
        self.window_length / 2
    }

    /// Re-verify the invariants the engine relies on
    pub fn check(&self) -> Result<()> {
        let fail = |msg: String| Err(PwvdError::Computation(msg));

        if self.signal_length < 2 {
            return fail(format!("signal length {} below 2", self.signal_length));
        }
        if self.window_length < 1 || self.window_length > self.signal_length {
            return fail(format!(
                "window length {} outside 1..={}",
                self.window_length, self.signal_length
            ));
        }
        if self.time_resolution < 1 || self.time_resolution > self.signal_length {
            return fail(format!(
                "time resolution {} outside 1..={}",
                self.time_resolution, self.signal_length
            ));
        }
        if !self.interpolation_degree.is_power_of_two() {
            return fail(format!(
                "interpolation degree {} is not a power of two",
                self.interpolation_degree
            ));
        }
        if !self.fft.length.is_power_of_two()
            || self.fft.length != 1usize << self.fft.order
            || self.fft.length < self.window_length
        {
            return fail(format!(
                "FFT length {} (order {}) does not cover window length {}",
                self.fft.length, self.fft.order, self.window_length
            ));
        }
        Ok(())
    }
}

/// Commonly used parameter sets
pub mod presets {
    use super::*;

    /// Preset information structure
    pub struct PresetInfo {
        pub id: usize,
        pub name: &'static str,
        pub description: &'static str,
        pub request: PwvdRequest,
    }

    /// Default
    pub fn default() -> PwvdRequest {
        PwvdRequest::default()
    }

    /// Short window, every sample evaluated
    pub fn high_time_resolution() -> PwvdRequest {
        PwvdRequest::new(31, 1, 1, Some(128))
    }

    /// Long window with zero-padded FFT
    pub fn high_frequency_resolution() -> PwvdRequest {
        PwvdRequest::new(255, 4, 1, Some(512))
    }

    /// Interpolated and tapered, lower interference
    pub fn smooth() -> PwvdRequest {
        PwvdRequest::new(127, 2, 4, Some(256)).with_lag_window(WindowType::Hanning)
    }

    /// List all presets with detailed info
    pub fn list_presets() -> Vec<PresetInfo> {
        vec![
            PresetInfo {
                id: 0,
                name: "Default",
                description: "Window=127, Stride=1, Degree=1",
                request: default(),
            },
            PresetInfo {
                id: 1,
                name: "High Time Resolution",
                description: "Window=31, Stride=1, FFT=128",
                request: high_time_resolution(),
            },
            PresetInfo {
                id: 2,
                name: "High Frequency Resolution",
                description: "Window=255, Stride=4, FFT=512",
                request: high_frequency_resolution(),
            },
            PresetInfo {
                id: 3,
                name: "Smooth",
                description: "Window=127, Stride=2, Degree=4, Hanning lag window",
                request: smooth(),
            },
        ]
    }

    /// Get a preset by ID
    pub fn get_preset(id: usize) -> Option<PresetInfo> {
        list_presets().into_iter().find(|p| p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_window_length() {
        let params = PwvdRequest::new(8, 8, 1, None).normalize(8).unwrap();
        assert_eq!(params.fft_length(), 8);
        assert_eq!(params.window_order(), 3);
        assert_eq!(params.shape(), (4, 1));
        params.check().unwrap();
    }

    #[test]
    fn test_window_truncated_to_signal() {
        let params = PwvdRequest::new(100, 1, 1, None).normalize(20).unwrap();
        assert_eq!(params.window_length, 20);
        assert_eq!(params.fft_length(), 32);
    }

    #[test]
    fn test_fft_length_raised_then_sized() {
        let params = PwvdRequest::new(10, 1, 1, Some(3)).normalize(64).unwrap();
        assert_eq!(params.fft_length(), 16);
        assert_eq!(params.fft.order, 4);

        let params = PwvdRequest::new(10, 1, 1, Some(0)).normalize(64).unwrap();
        assert_eq!(params.fft_length(), 16);

        let params = PwvdRequest::new(10, 1, 1, Some(100)).normalize(64).unwrap();
        assert_eq!(params.fft_length(), 128);
        assert_eq!(params.rows(), 64);
    }

    #[test]
    fn test_degree_normalization() {
        for (requested, expected) in [(-3, 1), (0, 1), (1, 1), (2, 2), (3, 4), (5, 8), (8, 8)] {
            let params = PwvdRequest::new(4, 1, requested, None).normalize(16).unwrap();
            assert_eq!(params.interpolation_degree, expected, "degree {}", requested);
        }
    }

    #[test]
    fn test_column_count() {
        let params = PwvdRequest::new(4, 3, 1, None).normalize(10).unwrap();
        assert_eq!(params.cols(), 4);
        let params = PwvdRequest::new(4, 10, 1, None).normalize(10).unwrap();
        assert_eq!(params.cols(), 1);
        let params = PwvdRequest::new(4, 1, 1, None).normalize(10).unwrap();
        assert_eq!(params.cols(), 10);
    }

    #[test]
    fn test_rejections() {
        let cases = [
            (PwvdRequest::new(4, 1, 1, None), 1, "signal"),
            (PwvdRequest::new(0, 1, 1, None), 16, "window_length"),
            (PwvdRequest::new(4, 0, 1, None), 16, "time_resolution"),
            (PwvdRequest::new(4, 17, 1, None), 16, "time_resolution"),
            (PwvdRequest::new(4, 1, 1, Some(-1)), 16, "fft_length"),
        ];
        for (request, n, expected) in cases {
            match request.normalize(n) {
                Err(PwvdError::InvalidParameter { name, .. }) => assert_eq!(name, expected),
                other => panic!("expected rejection of {}, got {:?}", expected, other),
            }
        }
    }

    #[test]
    fn test_check_catches_contract_breach() {
        let mut params = PwvdRequest::new(8, 1, 1, None).normalize(32).unwrap();
        params.fft = Radix2 { length: 4, order: 2 };
        assert!(matches!(params.check(), Err(PwvdError::Computation(_))));

        let mut params = PwvdRequest::new(8, 1, 1, None).normalize(32).unwrap();
        params.interpolation_degree = 3;
        assert!(matches!(params.check(), Err(PwvdError::Computation(_))));
    }

    #[test]
    fn test_presets() {
        let presets = presets::list_presets();
        assert_eq!(presets.len(), 4);

        for preset in presets {
            let params = preset.request.normalize(1024).unwrap();
            params.check().unwrap();
            assert!(params.fft_length() >= params.window_length);
        }
        assert!(presets::get_preset(3).is_some());
        assert!(presets::get_preset(9).is_none());
    }
}
