use anyhow::{Context, Result};
use hound::{WavReader, WavSpec};
use std::io::Cursor;

/// Header facts about a decoded PCM stream.
#[derive(Debug, Clone, Copy)]
pub struct PcmInfo {
    pub spec: WavSpec,
    /// Length in sample frames (per channel).
    pub frames: u32,
}

impl PcmInfo {
    pub fn seconds(&self) -> f64 {
        if self.spec.sample_rate == 0 {
            return 0.0;
        }
        f64::from(self.frames) / f64::from(self.spec.sample_rate)
    }
}

/// Inspect a WAV byte stream as produced by a decoder piping to stdout.
///
/// We only read the header. A decoder that exits cleanly but writes garbage (or nothing)
/// shows up here instead of as a confusing encoder error later.
pub fn inspect_wav(bytes: &[u8]) -> Result<PcmInfo> {
    let reader = WavReader::new(Cursor::new(bytes)).context("decoded stream is not WAV data")?;
    let spec = reader.spec();

    if spec.channels == 0 {
        anyhow::bail!("decoded WAV declares zero channels");
    }

    Ok(PcmInfo {
        spec,
        frames: reader.duration(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(frames: u32, rate: u32) -> anyhow::Result<Vec<u8>> {
        let spec = WavSpec {
            channels: 2,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut out = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut out, spec)?;
            for i in 0..frames {
                let s = (i % 100) as i16;
                writer.write_sample(s)?;
                writer.write_sample(-s)?;
            }
            writer.finalize()?;
        }
        Ok(out.into_inner())
    }

    #[test]
    fn reads_spec_and_length() -> anyhow::Result<()> {
        let info = inspect_wav(&tone(48_000, 48_000)?)?;
        assert_eq!(info.spec.channels, 2);
        assert_eq!(info.frames, 48_000);
        assert!((info.seconds() - 1.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn rejects_non_wav_bytes() {
        let err = inspect_wav(b"definitely not a riff").unwrap_err();
        assert!(format!("{err:#}").contains("not WAV data"));
    }
}
