//! Time-frequency distribution matrix
//!
//! Output of the engine: a real matrix of `rows` frequency bins by `cols`
//! time instants, stored column-major so each instant is one contiguous
//! slice. Row 0 is DC; row `rows - 1` lies just below Nyquist.

use crate::error::PwvdError;
use crate::Result;

/// Floor applied by `to_db` to non-positive values
pub const DB_FLOOR: f64 = -100.0;

/// Time-frequency energy distribution
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
    time_resolution: usize,
    sample_rate: Option<f64>,
}

impl Distribution {
    /// All-zero matrix; fails with `Allocation` if it cannot be obtained
    pub fn zeroed(rows: usize, cols: usize, time_resolution: usize) -> Result<Self> {
        let len = rows
            .checked_mul(cols)
            .ok_or(PwvdError::Allocation { rows, cols })?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| PwvdError::Allocation { rows, cols })?;
        data.resize(len, 0.0);

        Ok(Self {
            data,
            rows,
            cols,
            time_resolution,
            sample_rate: None,
        })
    }

    /// Attach a sample rate so the axes are reported in seconds and Hz
    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = Some(sample_rate);
        self
    }

    pub fn sample_rate(&self) -> Option<f64> {
        self.sample_rate
    }

    /// `(rows, cols)` = `(fft_length / 2, ceil(N / stride))`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// FFT length the rows were taken from
    pub fn fft_length(&self) -> usize {
        self.rows * 2
    }

    pub fn time_resolution(&self) -> usize {
        self.time_resolution
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[col * self.rows + row]
    }

    /// Frequency column of one time instant
    pub fn column(&self, col: usize) -> &[f64] {
        &self.data[col * self.rows..(col + 1) * self.rows]
    }

    pub fn column_mut(&mut self, col: usize) -> &mut [f64] {
        &mut self.data[col * self.rows..(col + 1) * self.rows]
    }

    /// Time evolution of one frequency bin
    pub fn row(&self, row: usize) -> Vec<f64> {
        (0..self.cols).map(|col| self.get(row, col)).collect()
    }

    /// Column-major data
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Sample index each column was computed at
    pub fn time_index(&self, col: usize) -> usize {
        col * self.time_resolution
    }

    /// Time axis in seconds, or in samples without a sample rate
    pub fn time_axis(&self) -> Vec<f64> {
        let scale = self.sample_rate.map_or(1.0, |sr| 1.0 / sr);
        (0..self.cols)
            .map(|col| self.time_index(col) as f64 * scale)
            .collect()
    }

    /// Frequency axis in Hz, or in cycles per sample without a sample rate
    pub fn frequency_axis(&self) -> Vec<f64> {
        let sr = self.sample_rate.unwrap_or(1.0);
        let fft_length = self.fft_length() as f64;
        (0..self.rows).map(|k| k as f64 * sr / fft_length).collect()
    }

    /// Row holding the largest value of a column
    pub fn peak_row(&self, col: usize) -> Option<usize> {
        if col >= self.cols {
            return None;
        }
        self.column(col)
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(row, _)| row)
    }

    /// Global maximum as `(row, col, value)`
    pub fn find_peak(&self) -> Option<(usize, usize, f64)> {
        self.data
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, &value)| (i % self.rows, i / self.rows, value))
    }

    /// Sum over frequency for each time instant
    pub fn time_marginal(&self) -> Vec<f64> {
        (0..self.cols)
            .map(|col| self.column(col).iter().sum())
            .collect()
    }

    /// Sum over time for each frequency bin
    pub fn frequency_marginal(&self) -> Vec<f64> {
        let mut marginal = vec![0.0; self.rows];
        for col in 0..self.cols {
            for (acc, &v) in marginal.iter_mut().zip(self.column(col)) {
                *acc += v;
            }
        }
        marginal
    }

    /// First conditional moment of frequency per instant, in axis units
    ///
    /// Negative values (interference) are excluded from the moment. Columns
    /// without positive energy report 0.
    pub fn instantaneous_frequency(&self) -> Vec<f64> {
        let axis = self.frequency_axis();
        (0..self.cols)
            .map(|col| {
                let column = self.column(col);
                let total: f64 = column.iter().map(|&v| v.max(0.0)).sum();
                if total <= 1e-30 {
                    return 0.0;
                }
                let moment: f64 = column
                    .iter()
                    .zip(&axis)
                    .map(|(&v, &f)| v.max(0.0) * f)
                    .sum();
                moment / total
            })
            .collect()
    }

    /// Energy in decibels, column-major, floored at `DB_FLOOR`
    pub fn to_db(&self, reference: f64) -> Vec<f64> {
        self.data
            .iter()
            .map(|&v| {
                if v > 0.0 {
                    (10.0 * (v / reference).log10()).max(DB_FLOOR)
                } else {
                    DB_FLOOR
                }
            })
            .collect()
    }
}

/// Render a distribution to an image
#[cfg(all(not(target_arch = "wasm32"), feature = "image"))]
pub mod image {
    use super::*;
    use ::image::{ImageBuffer, Rgb, RgbImage};
    use std::path::Path;
    use std::str::FromStr;

    /// Color map types for distribution rendering
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ColorMap {
        Viridis,
        Inferno,
        Grayscale,
        Jet,
    }

    impl FromStr for ColorMap {
        type Err = String;

        fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
            match s.to_ascii_lowercase().as_str() {
                "viridis" => Ok(ColorMap::Viridis),
                "inferno" => Ok(ColorMap::Inferno),
                "grayscale" | "gray" => Ok(ColorMap::Grayscale),
                "jet" => Ok(ColorMap::Jet),
                _ => Err(format!("Unknown colormap: {}", s)),
            }
        }
    }

    /// Convert a value (0.0 to 1.0) to RGB color using the specified colormap
    fn value_to_color(value: f64, colormap: ColorMap) -> Rgb<u8> {
        let v = value.clamp(0.0, 1.0);

        match colormap {
            ColorMap::Viridis => {
                let r = (v * v * v * 0.3 + v * 0.1) * 255.0;
                let g = (v.sqrt() * 0.8 + v * 0.2) * 255.0;
                let b = (v.powf(0.3) * 0.9 + v * 0.1) * 255.0;
                Rgb([r as u8, g as u8, b as u8])
            }
            ColorMap::Inferno => {
                let r = (v * v * v * 0.5 + v * v * 0.5) * 255.0;
                let g = (v * v * 0.8) * 255.0;
                let b = (v.powf(4.0)) * 255.0;
                Rgb([r as u8, g as u8, b as u8])
            }
            ColorMap::Grayscale => {
                let gray = (v * 255.0) as u8;
                Rgb([gray, gray, gray])
            }
            ColorMap::Jet => {
                let ramp = |center: f64| (1.5 - (4.0 * v - center).abs()).clamp(0.0, 1.0);
                let r = ramp(3.0);
                let g = ramp(2.0);
                let b = ramp(1.0);
                Rgb([(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8])
            }
        }
    }

    /// Options for distribution image generation
    pub struct DistributionImageOptions {
        /// Width of the output image in pixels
        pub width: u32,
        /// Height of the output image in pixels
        pub height: u32,
        pub colormap: ColorMap,
        /// Whether to use dB scale
        pub use_db_scale: bool,
        /// Dynamic range in dB (for dB scale)
        pub dynamic_range_db: f64,
        /// Reference value for dB conversion
        pub db_reference: f64,
    }

    impl Default for DistributionImageOptions {
        fn default() -> Self {
            Self {
                width: 800,
                height: 600,
                colormap: ColorMap::Viridis,
                use_db_scale: true,
                dynamic_range_db: 60.0,
                db_reference: 1.0,
            }
        }
    }

    /// Generate an image, time on x, frequency on y (DC at the bottom)
    pub fn generate_image(
        distribution: &Distribution,
        options: &DistributionImageOptions,
    ) -> RgbImage {
        let mut img = ImageBuffer::new(options.width, options.height);
        let (rows, cols) = distribution.shape();
        if rows == 0 || cols == 0 || options.width == 0 || options.height == 0 {
            return img;
        }

        let values = if options.use_db_scale {
            distribution.to_db(options.db_reference)
        } else {
            distribution.as_slice().to_vec()
        };

        let mut min_val = f64::INFINITY;
        let mut max_val = f64::NEG_INFINITY;
        for &val in &values {
            if val.is_finite() {
                min_val = min_val.min(val);
                max_val = max_val.max(val);
            }
        }

        if options.use_db_scale {
            min_val = min_val.max(max_val - options.dynamic_range_db);
        }

        let range = max_val - min_val;
        if range <= 0.0 || !range.is_finite() {
            return img;
        }

        let x_span = options.width.saturating_sub(1).max(1) as f64;
        let y_span = options.height.saturating_sub(1).max(1) as f64;

        for (x, y, pixel) in img.enumerate_pixels_mut() {
            let col = (x as f64 * (cols - 1) as f64 / x_span).round() as usize;
            let y_flipped = options.height - 1 - y;
            let row = (y_flipped as f64 * (rows - 1) as f64 / y_span).round() as usize;

            let value = values[col.min(cols - 1) * rows + row.min(rows - 1)];
            let normalized = (value - min_val) / range;
            *pixel = value_to_color(normalized, options.colormap);
        }

        img
    }

    /// Save a distribution to an image file
    pub fn save_image<P: AsRef<Path>>(
        distribution: &Distribution,
        path: P,
        options: &DistributionImageOptions,
    ) -> Result<()> {
        let img = generate_image(distribution, options);
        img.save(path.as_ref())
            .map_err(|e| PwvdError::Io(format!("Failed to save image: {}", e)))
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_distribution() -> Distribution {
        let mut dist = Distribution::zeroed(4, 3, 2).unwrap();
        for col in 0..3 {
            for (row, v) in dist.column_mut(col).iter_mut().enumerate() {
                *v = (row + 1) as f64 * if row == col + 1 { 10.0 } else { 1.0 };
            }
        }
        dist
    }

    #[test]
    fn test_layout_is_column_major() {
        let dist = sample_distribution();
        assert_eq!(dist.shape(), (4, 3));
        assert_eq!(dist.as_slice().len(), 12);
        assert_eq!(dist.get(1, 0), 20.0);
        assert_eq!(dist.column(0), &[1.0, 20.0, 3.0, 4.0]);
        assert_eq!(dist.row(2), vec![3.0, 30.0, 3.0]);
    }

    #[test]
    fn test_peaks() {
        let dist = sample_distribution();
        assert_eq!(dist.peak_row(0), Some(1));
        assert_eq!(dist.peak_row(1), Some(2));
        assert_eq!(dist.peak_row(2), Some(3));
        assert_eq!(dist.peak_row(3), None);
        assert_eq!(dist.find_peak(), Some((3, 2, 40.0)));
    }

    #[test]
    fn test_marginals() {
        let dist = sample_distribution();
        assert_eq!(dist.time_marginal(), vec![28.0, 37.0, 46.0]);
        assert_eq!(dist.frequency_marginal(), vec![3.0, 24.0, 36.0, 48.0]);
    }

    #[test]
    fn test_axes() {
        let dist = sample_distribution();
        assert_eq!(dist.time_axis(), vec![0.0, 2.0, 4.0]);
        assert_eq!(dist.frequency_axis(), vec![0.0, 0.125, 0.25, 0.375]);

        let dist = dist.with_sample_rate(8000.0);
        assert_eq!(dist.frequency_axis(), vec![0.0, 1000.0, 2000.0, 3000.0]);
        assert!((dist.time_axis()[2] - 4.0 / 8000.0).abs() < 1e-15);
    }

    #[test]
    fn test_instantaneous_frequency() {
        let mut dist = Distribution::zeroed(4, 2, 1).unwrap();
        dist.column_mut(0)[2] = 5.0;
        dist.column_mut(0)[0] = -3.0;
        let inst = dist.instantaneous_frequency();
        assert!((inst[0] - 0.25).abs() < 1e-12);
        assert_eq!(inst[1], 0.0);
    }

    #[test]
    fn test_db_conversion() {
        let mut dist = Distribution::zeroed(2, 1, 1).unwrap();
        dist.column_mut(0).copy_from_slice(&[100.0, -1.0]);
        assert_eq!(dist.to_db(1.0), vec![20.0, DB_FLOOR]);
    }

    #[test]
    fn test_allocation_overflow() {
        assert!(matches!(
            Distribution::zeroed(usize::MAX, 2, 1),
            Err(PwvdError::Allocation { .. })
        ));
    }
}
