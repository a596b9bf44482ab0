//! Wigner Library
//!
//! A library for computing the pseudo Wigner-Ville distribution (PWVD) of
//! real or complex discrete signals. Provides parameter validation, lag
//! product construction with optional interpolation, spectral projection and
//! the resulting time-frequency matrix, plus signal I/O for client tools.

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

pub mod config;
pub mod distribution;
pub mod engine;
pub mod error;
pub mod interpolate;
pub mod lag;
pub mod projector;
pub mod radix2;
pub mod signal;
pub mod signal_io;
pub mod utils;
pub mod window;

pub use config::{PwvdParams, PwvdRequest};
pub use distribution::Distribution;
pub use engine::{analyze, compute_pwvd, PwvdEngine};
pub use error::PwvdError;
pub use num_complex::Complex64;
pub use signal::Signal;
pub use window::WindowType;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library
///
/// Sets up logging and other initialization for the library.
/// For WASM targets, this will set up browser-specific error handling.
#[cfg_attr(feature = "wasm", wasm_bindgen)]
pub fn init() {
    #[cfg(feature = "wasm")]
    {
        console_error_panic_hook::set_once();
    }

    #[cfg(all(not(target_arch = "wasm32"), feature = "env_logger"))]
    {
        let _ = env_logger::try_init();
    }
}

/// Result type for PWVD operations
pub type Result<T> = std::result::Result<T, PwvdError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice() {
        init();
        init();
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_quarter_rate_through_public_api() {
        let signal = Signal::analytic(&[1.0, 0.0, -1.0, 0.0, 1.0, 0.0, -1.0, 0.0]).unwrap();
        let dist = analyze(&signal, &PwvdRequest::new(8, 8, 1, None)).unwrap();
        assert_eq!(dist.shape(), (4, 1));
        assert_eq!(dist.peak_row(0), Some(2));
    }
}
