use js_sys::{Float64Array, Uint8Array};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wigner_lib::{
    config::presets,
    signal_io::{channel_signal, read_audio_bytes},
    utils, Distribution, PwvdParams, PwvdRequest, Signal, WindowType,
};

type JsResult<T> = std::result::Result<T, String>;

// Set up panic hook for better error messages
fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

#[wasm_bindgen(start)]
pub fn start() {
    init_panic_hook();
    wigner_lib::init();
}

// Serde-compatible info structs for passing to JavaScript
#[derive(Serialize)]
struct ShapeJs {
    rows: usize,
    cols: usize,
}

#[derive(Serialize)]
struct ParamsJs {
    window_length: usize,
    time_resolution: usize,
    interpolation_degree: usize,
    fft_length: usize,
    lag_window: String,
}

impl From<&PwvdParams> for ParamsJs {
    fn from(params: &PwvdParams) -> Self {
        Self {
            window_length: params.window_length,
            time_resolution: params.time_resolution,
            interpolation_degree: params.interpolation_degree,
            fft_length: params.fft_length(),
            lag_window: params.lag_window.name().to_string(),
        }
    }
}

#[derive(Serialize)]
struct InfoJs {
    signal_length: Option<usize>,
    complex: bool,
    analytic: bool,
    sample_rate: Option<f64>,
    params: Option<ParamsJs>,
    shape: Option<ShapeJs>,
    peak: Option<(usize, usize, f64)>,
}

#[derive(Serialize)]
struct PresetJs {
    id: usize,
    name: &'static str,
    description: &'static str,
}

#[wasm_bindgen]
pub struct WasmPwvd {
    request: PwvdRequest,
    signal: Option<Signal>,
    sample_rate: Option<f64>,
    analytic: bool,
    distribution: Option<Distribution>,
}

impl Default for WasmPwvd {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl WasmPwvd {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            request: PwvdRequest::default(),
            signal: None,
            sample_rate: None,
            analytic: false,
            distribution: None,
        }
    }

    /// Set PWVD parameters; validation happens at compute time
    #[wasm_bindgen]
    pub fn set_params(
        &mut self,
        window_length: i32,
        time_resolution: i32,
        interpolation_degree: i32,
        fft_length: Option<i32>,
    ) {
        self.request = PwvdRequest::new(
            window_length as i64,
            time_resolution as i64,
            interpolation_degree as i64,
            fft_length.map(i64::from),
        )
        .with_lag_window(self.request.lag_window);
        self.distribution = None;
    }

    #[wasm_bindgen]
    pub fn set_lag_window(&mut self, window_type: &str) -> JsResult<()> {
        self.request.lag_window = window_type.parse::<WindowType>()?;
        self.distribution = None;
        Ok(())
    }

    /// Convert real input to its analytic signal before computing
    #[wasm_bindgen]
    pub fn set_analytic(&mut self, analytic: bool) {
        self.analytic = analytic;
        self.distribution = None;
    }

    #[wasm_bindgen]
    pub fn load_preset(&mut self, id: usize) -> JsResult<()> {
        let preset = presets::get_preset(id).ok_or_else(|| format!("Unknown preset: {}", id))?;
        self.request = preset.request;
        self.distribution = None;
        Ok(())
    }

    #[wasm_bindgen]
    pub fn get_presets(&self) -> JsValue {
        let presets: Vec<PresetJs> = presets::list_presets()
            .into_iter()
            .map(|p| PresetJs {
                id: p.id,
                name: p.name,
                description: p.description,
            })
            .collect();
        serde_wasm_bindgen::to_value(&presets).unwrap_or(JsValue::null())
    }

    /// Load samples, with an optional imaginary part of the same length
    #[wasm_bindgen]
    pub fn load_samples(
        &mut self,
        real: &Float64Array,
        imag: Option<Float64Array>,
        sample_rate: Option<f64>,
    ) -> JsResult<()> {
        let imag = imag.map(|a| a.to_vec());
        self.load_parts(&real.to_vec(), imag.as_deref(), sample_rate)
    }

    /// Decode an audio file (e.g. an upload) and load one channel
    #[wasm_bindgen]
    pub fn read_audio_bytes(&mut self, data: &Uint8Array, channel: usize) -> JsResult<()> {
        let (info, channels) = read_audio_bytes(data.to_vec()).map_err(|e| e.to_string())?;
        let signal = channel_signal(&channels, channel, false).map_err(|e| e.to_string())?;
        self.signal = Some(signal);
        self.sample_rate = Some(info.sample_rate as f64);
        self.distribution = None;
        Ok(())
    }

    /// Compute the distribution, returned column-major
    #[wasm_bindgen]
    pub fn compute(&mut self) -> JsResult<Float64Array> {
        self.compute_distribution()?;
        let data = self
            .distribution
            .as_ref()
            .map_or(&[][..], |d| d.as_slice());
        Ok(Float64Array::from(data))
    }

    /// Frequency column of one instant from the last result
    #[wasm_bindgen]
    pub fn get_column(&self, col: usize) -> JsResult<Float64Array> {
        let dist = self.distribution.as_ref().ok_or("No distribution computed")?;
        if col >= dist.cols() {
            return Err(format!("Column {} out of range", col));
        }
        Ok(Float64Array::from(dist.column(col)))
    }

    #[wasm_bindgen]
    pub fn frequency_axis(&self) -> Float64Array {
        let axis = self
            .distribution
            .as_ref()
            .map(|d| d.frequency_axis())
            .unwrap_or_default();
        Float64Array::from(&axis[..])
    }

    #[wasm_bindgen]
    pub fn shape(&self) -> JsValue {
        let shape = self.distribution.as_ref().map(|d| {
            let (rows, cols) = d.shape();
            ShapeJs { rows, cols }
        });
        serde_wasm_bindgen::to_value(&shape).unwrap_or(JsValue::null())
    }

    #[wasm_bindgen]
    pub fn info(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.collect_info()).unwrap_or(JsValue::null())
    }

    #[wasm_bindgen]
    pub fn get_analysis_summary(&self) -> String {
        match self.normalized() {
            Some(Ok(params)) => {
                utils::analysis_summary(&params, self.distribution.as_ref(), self.sample_rate)
            }
            Some(Err(e)) => format!("Invalid parameters: {}", e),
            None => "No signal loaded".to_string(),
        }
    }
}

impl WasmPwvd {
    fn load_parts(
        &mut self,
        real: &[f64],
        imag: Option<&[f64]>,
        sample_rate: Option<f64>,
    ) -> JsResult<()> {
        let signal = Signal::from_parts(real, imag).map_err(|e| e.to_string())?;
        self.signal = Some(signal);
        self.sample_rate = sample_rate;
        self.distribution = None;
        Ok(())
    }

    fn prepared_signal(&self) -> JsResult<Signal> {
        let signal = self.signal.as_ref().ok_or("No signal loaded")?;
        if self.analytic && !signal.is_complex() {
            Signal::analytic(&signal.real()).map_err(|e| e.to_string())
        } else {
            Ok(signal.clone())
        }
    }

    fn normalized(&self) -> Option<wigner_lib::Result<PwvdParams>> {
        self.signal
            .as_ref()
            .map(|s| self.request.normalize(s.len()))
    }

    fn compute_distribution(&mut self) -> JsResult<()> {
        let signal = self.prepared_signal()?;
        let mut dist =
            wigner_lib::analyze(&signal, &self.request).map_err(|e| e.to_string())?;
        if let Some(sr) = self.sample_rate {
            dist = dist.with_sample_rate(sr);
        }
        log::info!("Computed {}x{} distribution", dist.rows(), dist.cols());
        self.distribution = Some(dist);
        Ok(())
    }

    fn collect_info(&self) -> InfoJs {
        InfoJs {
            signal_length: self.signal.as_ref().map(Signal::len),
            complex: self.signal.as_ref().is_some_and(Signal::is_complex),
            analytic: self.analytic,
            sample_rate: self.sample_rate,
            params: self
                .normalized()
                .and_then(|p| p.ok())
                .as_ref()
                .map(ParamsJs::from),
            shape: self.distribution.as_ref().map(|d| {
                let (rows, cols) = d.shape();
                ShapeJs { rows, cols }
            }),
            peak: self.distribution.as_ref().and_then(Distribution::find_peak),
        }
    }
}
