//! Wigner-Ville CLI
//!
//! Command-line interface for the Wigner library.
//! Runs a one-shot analysis when an output is requested on the command line,
//! otherwise provides an interactive shell for loading signals, tuning
//! parameters and inspecting pseudo Wigner-Ville distributions.

use std::path::Path;
use std::process;

use clap::{Arg, ArgAction, ArgMatches, Command};
use log::LevelFilter;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use wigner_lib::{
    config::presets,
    signal_io::{self, AudioInfo},
    utils, Distribution, PwvdEngine, PwvdRequest, Signal, WindowType,
};

#[cfg(feature = "image")]
use wigner_lib::distribution::image::{save_image, ColorMap, DistributionImageOptions};

/// Application state
struct AppState {
    request: PwvdRequest,
    /// Signal as loaded or generated
    input: Option<Signal>,
    sample_rate: Option<f64>,
    /// Convert real input to its analytic signal before computing
    analytic: bool,
    channel: usize,
    current_file: Option<String>,
    distribution: Option<Distribution>,
}

impl AppState {
    fn new() -> Self {
        Self {
            request: PwvdRequest::default(),
            input: None,
            sample_rate: None,
            analytic: false,
            channel: 0,
            current_file: None,
            distribution: None,
        }
    }

    /// Signal handed to the engine
    fn prepared_signal(&self) -> wigner_lib::Result<Option<Signal>> {
        match &self.input {
            Some(signal) if self.analytic && !signal.is_complex() => {
                Signal::analytic(&signal.real()).map(Some)
            }
            Some(signal) => Ok(Some(signal.clone())),
            None => Ok(None),
        }
    }

    fn set_input(&mut self, signal: Signal, sample_rate: Option<f64>) {
        self.input = Some(signal);
        self.sample_rate = sample_rate;
        self.distribution = None;
    }
}

fn is_text_file(path: &str) -> bool {
    matches!(
        Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("txt" | "dat" | "csv")
    )
}

/// Load a text or audio signal; audio yields its sample rate
fn load_signal(path: &str, channel: usize) -> wigner_lib::Result<(Signal, Option<AudioInfo>)> {
    if is_text_file(path) {
        let signal = signal_io::read_text_signal(path)?;
        Ok((signal, None))
    } else {
        let (info, channels) = signal_io::read_audio_file(path)?;
        let signal = signal_io::channel_signal(&channels, channel, false)?;
        Ok((signal, Some(info)))
    }
}

fn compute(state: &mut AppState) -> wigner_lib::Result<()> {
    let signal = match state.prepared_signal()? {
        Some(signal) => signal,
        None => {
            println!("No signal loaded. Use 'load' or 'generate' first.");
            return Ok(());
        }
    };

    let params = state.request.normalize(signal.len())?;
    if let Some(sr) = state.sample_rate {
        utils::validate_params_for_audio(&params, sr);
    }

    let mut distribution = PwvdEngine::new(params)?.compute(&signal)?;
    if let Some(sr) = state.sample_rate {
        distribution = distribution.with_sample_rate(sr);
    }

    println!(
        "{}",
        utils::analysis_summary(&params, Some(&distribution), state.sample_rate)
    );
    state.distribution = Some(distribution);
    Ok(())
}

fn print_config(state: &AppState) {
    let request = &state.request;
    println!("Current PWVD Configuration:");
    println!("  Window length: {}", request.window_length);
    println!("  Time resolution: {}", request.time_resolution);
    println!("  Interpolation degree: {}", request.interpolation_degree);
    match request.fft_length {
        Some(n) => println!("  FFT length: {}", n),
        None => println!("  FFT length: window length"),
    }
    println!("  Lag window: {}", request.lag_window);
    println!("  Analytic: {}", if state.analytic { "on" } else { "off" });
    println!("  Channel: {}", state.channel);
}

/// Print the help message showing available commands
fn print_help() {
    println!("Available commands:");
    println!("  load <filename>                    - Load an audio file or a text signal (.txt/.dat/.csv)");
    println!("  generate tone <freq> <samples> <rate>          - Generate a cosine test signal");
    println!("  generate chirp <f0> <f1> <samples> <rate>      - Generate a linear chirp");
    println!("  save <filename>                    - Save the real part of the signal as WAV");
    println!("  config                             - Show current PWVD configuration");
    println!("  set window <length>                - Set lag window length in samples");
    println!("  set stride <samples>               - Set time resolution");
    println!("  set degree <n>                     - Set interpolation degree (rounded to a power of two)");
    println!("  set fft <length|auto>              - Set FFT length (auto = window length)");
    println!("  set lag_window <type>              - Set lag taper (rectangular, hanning, hamming, bartlett)");
    println!("  set analytic <on|off>              - Convert real input to its analytic signal");
    println!("  set channel <n>                    - Channel used by the next audio load");
    println!("  preset <n>                         - Load a configuration preset");
    println!("  presets                            - List available presets");
    println!("  compute                            - Compute the distribution");
    println!("  info                               - Show information about signal and result");
    println!("  peak [column]                      - Show the global or per-column peak");
    println!("  image <filename> [colormap] [width] [height] [linear|db] - Render the distribution");
    println!("  csv <filename>                     - Save the distribution as CSV");
    println!("  help                               - Show this help message");
    println!("  quit                               - Exit the program");
    println!();
    println!("Examples:");
    println!("  generate tone 1000 4096 8000");
    println!("  set analytic on");
    println!("  set window 255");
    println!("  set stride 16");
    println!("  compute");
    println!("  image wvd.png inferno 1024 768 db");
}

fn parse_set(param: &str, value: &str, state: &mut AppState) {
    let parse_int = |value: &str| value.parse::<i64>().ok();

    match param {
        "window" => match parse_int(value) {
            Some(n) => {
                state.request.window_length = n;
                println!("Window length set to {}", n);
            }
            None => println!("Invalid window length: {}", value),
        },
        "stride" => match parse_int(value) {
            Some(n) => {
                state.request.time_resolution = n;
                println!("Time resolution set to {}", n);
            }
            None => println!("Invalid time resolution: {}", value),
        },
        "degree" => match parse_int(value) {
            Some(n) => {
                state.request.interpolation_degree = n;
                println!("Interpolation degree set to {}", n);
            }
            None => println!("Invalid interpolation degree: {}", value),
        },
        "fft" => {
            if value == "auto" {
                state.request.fft_length = None;
                println!("FFT length follows window length");
            } else {
                match parse_int(value) {
                    Some(n) => {
                        state.request.fft_length = Some(n);
                        println!("FFT length set to {}", n);
                    }
                    None => println!("Invalid FFT length: {}", value),
                }
            }
        }
        "lag_window" => match value.parse::<WindowType>() {
            Ok(window_type) => {
                state.request.lag_window = window_type;
                println!("Lag window set to {}", window_type);
            }
            Err(e) => println!("{}", e),
        },
        "analytic" => match value {
            "on" | "true" | "1" => {
                state.analytic = true;
                println!("Analytic conversion enabled");
            }
            "off" | "false" | "0" => {
                state.analytic = false;
                println!("Analytic conversion disabled");
            }
            _ => println!("Usage: set analytic <on|off>"),
        },
        "channel" => match value.parse::<usize>() {
            Ok(ch) => {
                state.channel = ch;
                println!("Channel set to {} (applies to the next load)", ch);
            }
            Err(_) => println!("Invalid channel: {}", value),
        },
        _ => {
            println!("Unknown parameter: {}", param);
            println!("Valid parameters: window, stride, degree, fft, lag_window, analytic, channel");
        }
    }
}

fn generate(parts: &[&str], state: &mut AppState) {
    let numbers: Vec<f64> = parts[2..].iter().filter_map(|p| p.parse().ok()).collect();
    if numbers.len() != parts.len() - 2 {
        println!("Invalid number in: {}", parts[2..].join(" "));
        return;
    }

    let (samples, sample_rate) = match (parts[1], numbers.as_slice()) {
        ("tone", &[freq, n, sr]) if n >= 2.0 && sr > 0.0 => {
            (utils::tone(n as usize, freq, sr), sr)
        }
        ("chirp", &[f0, f1, n, sr]) if n >= 2.0 && sr > 0.0 => {
            (utils::linear_chirp(n as usize, f0, f1, sr), sr)
        }
        _ => {
            println!("Usage: generate tone <freq> <samples> <rate>");
            println!("       generate chirp <f0> <f1> <samples> <rate>");
            return;
        }
    };

    println!(
        "Generated {} {} samples at {} Hz",
        samples.len(),
        parts[1],
        sample_rate
    );
    state.set_input(Signal::from_real(&samples), Some(sample_rate));
    state.current_file = None;
}

#[cfg(feature = "image")]
fn render_image(parts: &[&str], distribution: &Distribution) {
    let filename = parts[1];
    let colormap = match parts.get(2).map(|c| c.parse::<ColorMap>()) {
        Some(Ok(colormap)) => colormap,
        Some(Err(e)) => {
            println!("{}. Using viridis.", e);
            ColorMap::Viridis
        }
        None => ColorMap::Viridis,
    };
    let width = parts
        .get(3)
        .and_then(|w| w.parse::<u32>().ok())
        .unwrap_or(800);
    let height = parts
        .get(4)
        .and_then(|h| h.parse::<u32>().ok())
        .unwrap_or(600);
    let use_db_scale = !matches!(parts.get(5), Some(&"linear"));

    let options = DistributionImageOptions {
        width,
        height,
        colormap,
        use_db_scale,
        db_reference: distribution
            .find_peak()
            .map_or(1.0, |(_, _, v)| if v > 0.0 { v } else { 1.0 }),
        ..Default::default()
    };

    match save_image(distribution, filename, &options) {
        Ok(_) => println!("Saved {}x{} image to {}", width, height, filename),
        Err(e) => println!("Error saving image: {}", e),
    }
}

/// Process a user command; returns false to leave the shell
fn process_command(command: &str, state: &mut AppState) -> bool {
    let parts: Vec<&str> = command.split_whitespace().collect();

    if parts.is_empty() {
        return true;
    }

    match parts[0] {
        "load" => {
            if parts.len() != 2 {
                println!("Usage: load <filename>");
                return true;
            }

            let filename = parts[1];
            println!("Loading file: {}", filename);

            match load_signal(filename, state.channel) {
                Ok((signal, info)) => {
                    if let Some(info) = &info {
                        println!(
                            "Audio: {} channels, {} Hz, {}",
                            info.channels,
                            info.sample_rate,
                            utils::format_time(info.duration_seconds)
                        );
                    }
                    println!(
                        "Loaded {} {} samples",
                        signal.len(),
                        if signal.is_complex() { "complex" } else { "real" }
                    );
                    state.set_input(signal, info.map(|i| i.sample_rate as f64));
                    state.current_file = Some(filename.to_string());
                }
                Err(e) => println!("Error loading file: {}", e),
            }
        }

        "generate" => {
            if parts.len() < 2 {
                println!("Usage: generate <tone|chirp> ...");
                return true;
            }
            generate(&parts, state);
        }

        "save" => {
            if parts.len() != 2 {
                println!("Usage: save <filename>");
                return true;
            }
            let Some(signal) = &state.input else {
                println!("No signal loaded.");
                return true;
            };
            let sample_rate = state.sample_rate.unwrap_or(8000.0).round() as u32;
            match signal_io::write_signal_wav(parts[1], &signal.real(), sample_rate) {
                Ok(_) => println!("Signal saved to {}", parts[1]),
                Err(e) => println!("Error saving file: {}", e),
            }
        }

        "config" => print_config(state),

        "set" => {
            if parts.len() < 3 {
                println!("Usage: set <parameter> <value>");
                println!("Parameters: window, stride, degree, fft, lag_window, analytic, channel");
                return true;
            }
            parse_set(parts[1], parts[2], state);
        }

        "preset" => {
            if parts.len() != 2 {
                println!("Usage: preset <number>");
                return true;
            }

            match parts[1].parse::<usize>() {
                Ok(n) => {
                    if let Some(preset) = presets::get_preset(n) {
                        state.request = preset.request;
                        println!("Applied preset {}: {}", n, preset.name);
                        println!("{}", preset.description);
                    } else {
                        println!("Invalid preset number: {}", n);
                    }
                }
                Err(_) => println!("Invalid preset number: {}", parts[1]),
            }
        }

        "presets" => {
            println!("Available presets:");
            for preset in presets::list_presets() {
                println!("  {}: {} - {}", preset.id, preset.name, preset.description);
            }
        }

        "compute" => {
            if let Err(e) = compute(state) {
                println!("Error during computation: {}", e);
            }
        }

        "info" => {
            let Some(signal) = &state.input else {
                println!("No signal loaded");
                return true;
            };
            if let Some(file) = &state.current_file {
                println!("File: {}", file);
            }
            println!(
                "Signal: {} samples, {}, energy {:.4}",
                signal.len(),
                if signal.is_complex() { "complex" } else { "real" },
                signal.energy()
            );
            match state.request.normalize(signal.len()) {
                Ok(params) => println!(
                    "{}",
                    utils::analysis_summary(&params, state.distribution.as_ref(), state.sample_rate)
                ),
                Err(e) => println!("Current parameters are invalid: {}", e),
            }
        }

        "peak" => {
            let Some(dist) = &state.distribution else {
                println!("No distribution computed. Use 'compute' first.");
                return true;
            };
            let axis = dist.frequency_axis();
            match parts.get(1).map(|c| c.parse::<usize>()) {
                Some(Ok(col)) => match dist.peak_row(col) {
                    Some(row) => println!(
                        "Column {} (sample {}): peak at bin {} ({:.4}), value {:.4}",
                        col,
                        dist.time_index(col),
                        row,
                        axis[row],
                        dist.get(row, col)
                    ),
                    None => println!("Column {} out of range (0..{})", col, dist.cols()),
                },
                Some(Err(_)) => println!("Invalid column: {}", parts[1]),
                None => match dist.find_peak() {
                    Some((row, col, value)) => println!(
                        "Peak {:.4} at bin {} ({:.4}), column {} (sample {})",
                        value,
                        row,
                        axis[row],
                        col,
                        dist.time_index(col)
                    ),
                    None => println!("Distribution is empty"),
                },
            }
        }

        "image" => {
            #[cfg(feature = "image")]
            {
                if parts.len() < 2 {
                    println!("Usage: image <filename> [colormap] [width] [height] [linear|db]");
                    println!("  colormap: viridis, inferno, grayscale, jet (default: viridis)");
                    return true;
                }
                match &state.distribution {
                    Some(dist) => render_image(&parts, dist),
                    None => println!("No distribution computed. Use 'compute' first."),
                }
            }
            #[cfg(not(feature = "image"))]
            println!("Image support not compiled in");
        }

        "csv" => {
            if parts.len() != 2 {
                println!("Usage: csv <filename>");
                return true;
            }
            match &state.distribution {
                Some(dist) => match signal_io::save_distribution_csv(parts[1], dist) {
                    Ok(_) => println!("Distribution saved to {}", parts[1]),
                    Err(e) => println!("Error saving CSV: {}", e),
                },
                None => println!("No distribution computed. Use 'compute' first."),
            }
        }

        "help" => print_help(),

        "quit" | "exit" => return false,

        _ => {
            println!("Unknown command: {}", parts[0]);
            println!("Type 'help' for available commands");
        }
    }
    true
}

fn parse_number_arg(matches: &ArgMatches, id: &str) -> Option<i64> {
    let value = matches.get_one::<String>(id)?;
    match value.parse::<i64>() {
        Ok(n) => Some(n),
        Err(_) => {
            eprintln!("Invalid value for --{}: {}", id, value);
            process::exit(2);
        }
    }
}

fn apply_arguments(matches: &ArgMatches, state: &mut AppState) {
    if let Some(n) = parse_number_arg(matches, "window") {
        state.request.window_length = n;
    }
    if let Some(n) = parse_number_arg(matches, "stride") {
        state.request.time_resolution = n;
    }
    if let Some(n) = parse_number_arg(matches, "degree") {
        state.request.interpolation_degree = n;
    }
    if let Some(n) = parse_number_arg(matches, "fft") {
        state.request.fft_length = Some(n);
    }
    if let Some(name) = matches.get_one::<String>("lag-window") {
        match name.parse::<WindowType>() {
            Ok(window_type) => state.request.lag_window = window_type,
            Err(e) => {
                eprintln!("{}", e);
                process::exit(2);
            }
        }
    }
    if let Some(ch) = matches.get_one::<String>("channel") {
        match ch.parse::<usize>() {
            Ok(ch) => state.channel = ch,
            Err(_) => {
                eprintln!("Invalid channel: {}", ch);
                process::exit(2);
            }
        }
    }
    state.analytic = matches.get_flag("analytic");
}

/// Compute once and write the requested outputs
fn run_once(state: &mut AppState, matches: &ArgMatches) -> wigner_lib::Result<()> {
    compute(state)?;
    let Some(dist) = &state.distribution else {
        return Ok(());
    };

    if let Some(path) = matches.get_one::<String>("csv") {
        signal_io::save_distribution_csv(path, dist)?;
        println!("Distribution saved to {}", path);
    }

    #[cfg(feature = "image")]
    {
        if let Some(path) = matches.get_one::<String>("image") {
            render_image(&["image", path.as_str()], dist);
        }
    }
    #[cfg(not(feature = "image"))]
    {
        if matches.get_one::<String>("image").is_some() {
            eprintln!("Image support not compiled in");
        }
    }

    Ok(())
}

fn main() {
    let matches = Command::new("Wigner-Ville Analyzer")
        .version(wigner_lib::VERSION)
        .about("Pseudo Wigner-Ville time-frequency analysis tool")
        .arg(
            Arg::new("file")
                .help("Audio or text signal to load on startup")
                .value_name("FILE")
                .index(1),
        )
        .arg(
            Arg::new("window")
                .long("window")
                .short('w')
                .help("Lag window length in samples")
                .value_name("LENGTH"),
        )
        .arg(
            Arg::new("stride")
                .long("stride")
                .short('s')
                .help("Time resolution (stride between instants)")
                .value_name("SAMPLES"),
        )
        .arg(
            Arg::new("degree")
                .long("degree")
                .short('d')
                .help("Interpolation degree (rounded up to a power of two)")
                .value_name("N"),
        )
        .arg(
            Arg::new("fft")
                .long("fft")
                .short('f')
                .help("FFT length (defaults to the window length)")
                .value_name("LENGTH"),
        )
        .arg(
            Arg::new("lag-window")
                .long("lag-window")
                .help("Lag taper (rectangular, hanning, hamming, bartlett)")
                .value_name("TYPE"),
        )
        .arg(
            Arg::new("analytic")
                .long("analytic")
                .short('a')
                .help("Convert real input to its analytic signal")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("channel")
                .long("channel")
                .short('c')
                .help("Audio channel to analyze")
                .value_name("N"),
        )
        .arg(
            Arg::new("image")
                .long("image")
                .help("Render the distribution to an image and exit")
                .value_name("PNG"),
        )
        .arg(
            Arg::new("csv")
                .long("csv")
                .help("Write the distribution as CSV and exit")
                .value_name("CSV"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Increase log verbosity")
                .action(ArgAction::Count),
        )
        .get_matches();

    let level = match matches.get_count("verbose") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    // Logger is already installed; this sets up the rest
    wigner_lib::init();

    let mut state = AppState::new();
    apply_arguments(&matches, &mut state);

    let one_shot = matches.contains_id("image") || matches.contains_id("csv");

    if let Some(filename) = matches.get_one::<String>("file") {
        match load_signal(filename, state.channel) {
            Ok((signal, info)) => {
                println!("Loaded {} samples from {}", signal.len(), filename);
                state.set_input(signal, info.map(|i| i.sample_rate as f64));
                state.current_file = Some(filename.to_string());
            }
            Err(e) => {
                eprintln!("Error loading file: {}", e);
                if one_shot {
                    process::exit(1);
                }
            }
        }
    }

    if one_shot {
        if state.input.is_none() {
            eprintln!("An input file is required with --image or --csv");
            process::exit(2);
        }
        if let Err(e) = run_once(&mut state, &matches) {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
        return;
    }

    println!("Wigner-Ville Analyzer v{}", wigner_lib::VERSION);
    println!("Type 'help' for available commands\n");

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Failed to create readline: {}", e);
            process::exit(1);
        }
    };

    loop {
        match rl.readline("pwvd> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    rl.add_history_entry(trimmed).ok();
                    if !process_command(trimmed, &mut state) {
                        break;
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    println!("Goodbye!");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_compute_generated_tone() {
        let mut state = AppState::new();
        assert!(process_command("generate tone 1000 256 8000", &mut state));
        assert!(process_command("set window 63", &mut state));
        assert!(process_command("set stride 32", &mut state));
        assert!(process_command("set fft 64", &mut state));
        assert!(process_command("set analytic on", &mut state));
        assert!(process_command("compute", &mut state));

        let dist = state.distribution.as_ref().unwrap();
        assert_eq!(dist.shape(), (32, 8));
        // 1 kHz at 8 kHz with a 64-point FFT
        assert_eq!(dist.peak_row(4), Some(8));
    }

    #[test]
    fn test_invalid_values_leave_state() {
        let mut state = AppState::new();
        process_command("set window abc", &mut state);
        process_command("set lag_window kaiser", &mut state);
        assert_eq!(state.request, PwvdRequest::default());

        process_command("preset 1", &mut state);
        assert_eq!(state.request, presets::high_time_resolution());
        process_command("set fft auto", &mut state);
        assert_eq!(state.request.fft_length, None);
    }

    #[test]
    fn test_quit_and_text_detection() {
        let mut state = AppState::new();
        assert!(!process_command("quit", &mut state));
        assert!(process_command("compute", &mut state));
        assert!(state.distribution.is_none());

        assert!(is_text_file("signal.TXT"));
        assert!(is_text_file("x.csv"));
        assert!(!is_text_file("audio.wav"));
    }
}
