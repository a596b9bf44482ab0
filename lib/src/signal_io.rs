//! Signal input and output
//!
//! Audio files are decoded with Symphonia into one `f64` vector per channel.
//! Plain-text signals hold one sample per line, either `re` or `re im`
//! (whitespace or comma separated). Signals are written as 32-bit float WAV
//! through hound; distributions as CSV.

use crate::distribution::Distribution;
use crate::error::PwvdError;
use crate::signal::Signal;
use crate::Result;

#[cfg(not(target_arch = "wasm32"))]
use std::fs::File;
use std::io::{Cursor, Write};
#[cfg(not(target_arch = "wasm32"))]
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal as _};
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::conv::FromSample;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;

/// Audio metadata information
#[derive(Debug, Clone, PartialEq)]
pub struct AudioInfo {
    pub sample_rate: u32,
    pub channels: usize,
    pub duration_samples: usize,
    pub duration_seconds: f64,
}

impl AudioInfo {
    pub fn new(sample_rate: u32, channels: usize, duration_samples: usize) -> Self {
        let duration_seconds = if sample_rate > 0 {
            duration_samples as f64 / sample_rate as f64
        } else {
            0.0
        };
        Self {
            sample_rate,
            channels,
            duration_samples,
            duration_seconds,
        }
    }
}

fn decode_error(err: SymphoniaError) -> PwvdError {
    match err {
        SymphoniaError::IoError(e) => PwvdError::Io(e.to_string()),
        other => PwvdError::Decode(other.to_string()),
    }
}

fn is_end_of_stream(err: &SymphoniaError) -> bool {
    matches!(err, SymphoniaError::IoError(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
}

fn append_planes<S>(buffer: &AudioBuffer<S>, channels: &mut [Vec<f64>])
where
    S: Sample,
    f64: FromSample<S>,
{
    let count = buffer.spec().channels.count();
    for (c, out) in channels.iter_mut().enumerate().take(count) {
        out.extend(buffer.chan(c).iter().map(|&s| f64::from_sample(s)));
    }
}

/// Decode every packet of the default track
fn read_audio_stream(mss: MediaSourceStream) -> Result<(AudioInfo, Vec<Vec<f64>>)> {
    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(decode_error)?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| PwvdError::Decode("no default track found".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(decode_error)?;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| PwvdError::Decode("sample rate not specified".to_string()))?;
    let channels = track
        .codec_params
        .channels
        .ok_or_else(|| PwvdError::Decode("channels not specified".to_string()))?
        .count();

    let mut channel_buffers: Vec<Vec<f64>> = vec![Vec::new(); channels];

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(err) if is_end_of_stream(&err) => break,
            Err(err) => return Err(decode_error(err)),
        };

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(err) if is_end_of_stream(&err) => break,
            Err(err) => return Err(decode_error(err)),
        };

        match decoded {
            AudioBufferRef::F32(buffer) => append_planes(&*buffer, &mut channel_buffers),
            AudioBufferRef::F64(buffer) => append_planes(&*buffer, &mut channel_buffers),
            AudioBufferRef::U32(buffer) => append_planes(&*buffer, &mut channel_buffers),
            AudioBufferRef::U24(buffer) => append_planes(&*buffer, &mut channel_buffers),
            AudioBufferRef::U16(buffer) => append_planes(&*buffer, &mut channel_buffers),
            AudioBufferRef::U8(buffer) => append_planes(&*buffer, &mut channel_buffers),
            AudioBufferRef::S32(buffer) => append_planes(&*buffer, &mut channel_buffers),
            AudioBufferRef::S24(buffer) => append_planes(&*buffer, &mut channel_buffers),
            AudioBufferRef::S16(buffer) => append_planes(&*buffer, &mut channel_buffers),
            AudioBufferRef::S8(buffer) => append_planes(&*buffer, &mut channel_buffers),
        }
    }

    let duration_samples = channel_buffers.first().map_or(0, Vec::len);
    let info = AudioInfo::new(sample_rate, channels, duration_samples);

    log::info!(
        "Decoded audio: {} channels, {} Hz, {} samples",
        info.channels,
        info.sample_rate,
        info.duration_samples
    );

    Ok((info, channel_buffers))
}

/// Read audio file from filesystem path
#[cfg(not(target_arch = "wasm32"))]
pub fn read_audio_file<P: AsRef<Path>>(path: P) -> Result<(AudioInfo, Vec<Vec<f64>>)> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    read_audio_stream(mss)
}

/// Read audio data from byte buffer
pub fn read_audio_bytes(data: Vec<u8>) -> Result<(AudioInfo, Vec<Vec<f64>>)> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(data)), Default::default());
    read_audio_stream(mss)
}

/// Select one channel of decoded audio as a signal
pub fn channel_signal(channels: &[Vec<f64>], channel: usize, analytic: bool) -> Result<Signal> {
    let samples = channels.get(channel).ok_or_else(|| {
        PwvdError::invalid(
            "channel",
            format!("channel {} requested, audio has {}", channel, channels.len()),
        )
    })?;
    if analytic {
        Signal::analytic(samples)
    } else {
        Ok(Signal::from_real(samples))
    }
}

/// Parse a text signal: one `re` or `re im` sample per line
///
/// Blank lines and lines starting with `#` are skipped. The signal is
/// complex if any line carries an imaginary part.
pub fn parse_text_signal(text: &str) -> Result<Signal> {
    let mut real = Vec::new();
    let mut imag = Vec::new();
    let mut complex = false;

    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|f| !f.is_empty())
            .collect();
        let parse = |field: &str| {
            field.parse::<f64>().map_err(|e| {
                PwvdError::Decode(format!("line {}: '{}': {}", number + 1, field, e))
            })
        };

        match fields.as_slice() {
            [re] => {
                real.push(parse(re)?);
                imag.push(0.0);
            }
            [re, im] => {
                real.push(parse(re)?);
                imag.push(parse(im)?);
                complex = true;
            }
            _ => {
                return Err(PwvdError::Decode(format!(
                    "line {}: expected 1 or 2 values, found {}",
                    number + 1,
                    fields.len()
                )))
            }
        }
    }

    if complex {
        Signal::from_parts(&real, Some(&imag))
    } else {
        Ok(Signal::from_real(&real))
    }
}

/// Read a text signal from a file
#[cfg(not(target_arch = "wasm32"))]
pub fn read_text_signal<P: AsRef<Path>>(path: P) -> Result<Signal> {
    let text = std::fs::read_to_string(path)?;
    parse_text_signal(&text)
}

fn wav_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    }
}

fn write_wav<W: std::io::Write + std::io::Seek>(
    writer: W,
    samples: &[f64],
    sample_rate: u32,
) -> Result<()> {
    let io = |e: hound::Error| PwvdError::Io(e.to_string());
    let mut writer = WavWriter::new(writer, wav_spec(sample_rate)).map_err(io)?;
    for &sample in samples {
        writer.write_sample(sample as f32).map_err(io)?;
    }
    writer.finalize().map_err(io)
}

/// Write a mono real signal as a 32-bit float WAV file
#[cfg(not(target_arch = "wasm32"))]
pub fn write_signal_wav<P: AsRef<Path>>(path: P, samples: &[f64], sample_rate: u32) -> Result<()> {
    let file = std::io::BufWriter::new(File::create(path.as_ref())?);
    write_wav(file, samples, sample_rate)?;
    log::info!(
        "Saved {} samples at {} Hz to {}",
        samples.len(),
        sample_rate,
        path.as_ref().display()
    );
    Ok(())
}

/// Write a mono real signal as WAV in memory and return the bytes
pub fn write_signal_wav_bytes(samples: &[f64], sample_rate: u32) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    write_wav(&mut cursor, samples, sample_rate)?;
    Ok(cursor.into_inner())
}

/// Write a distribution as CSV, one line per frequency bin
///
/// The header holds the time axis; each line starts with the bin frequency.
pub fn write_distribution_csv<W: Write>(writer: &mut W, distribution: &Distribution) -> Result<()> {
    write!(writer, "frequency")?;
    for t in distribution.time_axis() {
        write!(writer, ",{}", t)?;
    }
    writeln!(writer)?;

    for (row, f) in distribution.frequency_axis().iter().enumerate() {
        write!(writer, "{}", f)?;
        for col in 0..distribution.cols() {
            write!(writer, ",{}", distribution.get(row, col))?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// Save a distribution as a CSV file
#[cfg(not(target_arch = "wasm32"))]
pub fn save_distribution_csv<P: AsRef<Path>>(path: P, distribution: &Distribution) -> Result<()> {
    let mut file = std::io::BufWriter::new(File::create(path.as_ref())?);
    write_distribution_csv(&mut file, distribution)?;
    file.flush()?;
    log::info!(
        "Saved {}x{} distribution to {}",
        distribution.rows(),
        distribution.cols(),
        path.as_ref().display()
    );
    Ok(())
}
