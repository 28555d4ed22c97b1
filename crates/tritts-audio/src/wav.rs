//! WAV file reading and writing for reference prompts and synthesized output.

use std::io::{Read, Seek, Write};
use std::path::Path;
use tritts_core::AudioError;

/// Decoded WAV contents as normalized f32 samples, interleaved by channel.
#[derive(Debug, Clone, PartialEq)]
pub struct WavData {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl WavData {
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    /// Average all channels into one.
    pub fn into_mono(self) -> WavData {
        let samples = downmix(&self.samples, self.channels);
        WavData {
            samples,
            sample_rate: self.sample_rate,
            channels: 1,
        }
    }

    /// Linearly resample each channel to `target_rate`.
    pub fn resampled(self, target_rate: u32) -> WavData {
        if self.sample_rate == target_rate {
            return self;
        }
        let samples = if self.channels <= 1 {
            resample(&self.samples, self.sample_rate, target_rate)
        } else {
            let channels = self.channels as usize;
            let per_channel: Vec<Vec<f32>> = (0..channels)
                .map(|c| {
                    let channel: Vec<f32> =
                        self.samples.iter().skip(c).step_by(channels).copied().collect();
                    resample(&channel, self.sample_rate, target_rate)
                })
                .collect();
            let frames = per_channel.iter().map(Vec::len).min().unwrap_or(0);
            (0..frames)
                .flat_map(|i| per_channel.iter().map(move |ch| ch[i]))
                .collect()
        };
        WavData {
            samples,
            sample_rate: target_rate,
            channels: self.channels,
        }
    }
}

pub fn read_wav_from<R: Read>(reader: R) -> Result<WavData, AudioError> {
    let mut wav_reader =
        hound::WavReader::new(reader).map_err(|e| AudioError::Read(e.to_string()))?;
    let spec = wav_reader.spec();
    if spec.channels == 0 {
        return Err(AudioError::UnsupportedFormat("zero channels".to_string()));
    }

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => wav_reader
            .samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AudioError::Read(e.to_string()))?,
        hound::SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                return Err(AudioError::UnsupportedFormat(format!(
                    "{}-bit integer samples",
                    spec.bits_per_sample
                )));
            }
            let scale = (1u64 << (spec.bits_per_sample - 1)) as f32;
            wav_reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| AudioError::Read(e.to_string()))?
        }
    };

    Ok(WavData {
        samples,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

pub fn read_wav(path: &Path) -> Result<WavData, AudioError> {
    let file = std::fs::File::open(path)
        .map_err(|e| AudioError::Read(format!("{}: {e}", path.display())))?;
    read_wav_from(std::io::BufReader::new(file))
}

/// Load a file as mono audio at `target_rate`, resampling if the file differs.
pub fn load_mono(path: &Path, target_rate: u32) -> Result<WavData, AudioError> {
    let wav = read_wav(path)?;
    tracing::debug!(
        path = %path.display(),
        sample_rate = wav.sample_rate,
        channels = wav.channels,
        frames = wav.frames(),
        "read audio file"
    );
    Ok(wav.into_mono().resampled(target_rate))
}

pub fn write_wav_to<W: Write + Seek>(
    writer: W,
    samples: &[f32],
    sample_rate: u32,
) -> Result<(), AudioError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut wav_writer =
        hound::WavWriter::new(writer, spec).map_err(|e| AudioError::Write(e.to_string()))?;
    for &s in samples {
        let s16 = (s * i16::MAX as f32).clamp(i16::MIN as f32, i16::MAX as f32) as i16;
        wav_writer
            .write_sample(s16)
            .map_err(|e| AudioError::Write(e.to_string()))?;
    }
    wav_writer
        .finalize()
        .map_err(|e| AudioError::Write(e.to_string()))
}

/// Write mono 16-bit PCM.
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), AudioError> {
    let file = std::fs::File::create(path)
        .map_err(|e| AudioError::Write(format!("{}: {e}", path.display())))?;
    write_wav_to(std::io::BufWriter::new(file), samples, sample_rate)
}

pub fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks_exact(channels as usize)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Simple linear interpolation resampling.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() || from_rate == 0 || to_rate == 0 {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio) as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = (source_pos.floor() as usize).min(samples.len() - 1);
            let fraction = (source_pos - source_idx as f64) as f32;

            if source_idx + 1 >= samples.len() {
                samples[source_idx]
            } else {
                let left = samples[source_idx];
                let right = samples[source_idx + 1];
                left + (right - left) * fraction
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn make_wav(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_read_int_wav_normalizes() {
        let data = make_wav(16000, 1, &[0, 16384, -16384, i16::MIN]);
        let wav = read_wav_from(Cursor::new(data)).unwrap();
        assert_eq!(wav.sample_rate, 16000);
        assert_eq!(wav.channels, 1);
        assert_eq!(wav.samples, vec![0.0, 0.5, -0.5, -1.0]);
    }

    #[test]
    fn test_read_float_wav() {
        let mut cursor = Cursor::new(Vec::new());
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 24000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for s in [0.25f32, -0.75] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let wav = read_wav_from(Cursor::new(cursor.into_inner())).unwrap();
        assert_eq!(wav.samples, vec![0.25, -0.75]);
        assert_eq!(wav.sample_rate, 24000);
    }

    #[test]
    fn test_stereo_into_mono_averages() {
        let data = make_wav(16000, 2, &[16384, 0, -16384, -16384]);
        let wav = read_wav_from(Cursor::new(data)).unwrap();
        assert_eq!(wav.frames(), 2);
        let mono = wav.into_mono();
        assert_eq!(mono.channels, 1);
        assert_eq!(mono.samples, vec![0.25, -0.5]);
    }

    #[test]
    fn test_invalid_wav_returns_error() {
        let result = read_wav_from(Cursor::new(b"not a wav file".to_vec()));
        assert!(matches!(result, Err(AudioError::Read(_))));
    }

    #[test]
    fn test_resample_identity_same_rate() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(resample(&samples, 16000, 16000), samples);
    }

    #[test]
    fn test_resample_downsample_length() {
        let samples = vec![0.0; 48000];
        assert_eq!(resample(&samples, 48000, 16000).len(), 16000);
    }

    #[test]
    fn test_resample_upsample_interpolates() {
        let samples = vec![0.0, 1.0];
        let out = resample(&samples, 8000, 16000);
        assert_eq!(out.len(), 4);
        assert_eq!(out[0], 0.0);
        assert!((out[1] - 0.5).abs() < 1e-6);
        assert_eq!(out[2], 1.0);
        assert_eq!(out[3], 1.0);
    }

    #[test]
    fn test_resampled_stereo_keeps_interleaving() {
        let wav = WavData {
            samples: vec![1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0],
            sample_rate: 32000,
            channels: 2,
        };
        let out = wav.resampled(16000);
        assert_eq!(out.channels, 2);
        assert_eq!(out.samples, vec![1.0, -1.0, 1.0, -1.0]);
    }

    #[test]
    fn test_write_then_read_preserves_shape() {
        let mut cursor = Cursor::new(Vec::new());
        let samples = vec![0.0, 0.5, -0.5, 2.0];
        write_wav_to(&mut cursor, &samples, 24000).unwrap();

        let wav = read_wav_from(Cursor::new(cursor.into_inner())).unwrap();
        assert_eq!(wav.sample_rate, 24000);
        assert_eq!(wav.channels, 1);
        assert_eq!(wav.samples.len(), 4);
        // Out-of-range input is clamped rather than wrapped
        assert!(wav.samples[3] > 0.99);
        assert!((wav.samples[1] - 0.5).abs() < 1e-3);
    }
}
