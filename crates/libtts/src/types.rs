use crate::error::TTSResult;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::pin::Pin;

/// Stable identifier of a plugin, unique within a registry.
///
/// Ids conventionally carry a major version suffix (e.g. `kokoro_v1`) so that
/// several generations of one engine can be installed side by side.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginId(String);

impl PluginId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PluginId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PluginId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl AsRef<str> for PluginId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for PluginId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for PluginId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Container or encoding of the produced audio
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AudioFormat {
    /// Raw interleaved samples without any header
    #[default]
    LinearPcm,
    Wav,
    Mp3,
    Flac,
    Ogg,
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AudioFormat::LinearPcm => "Linear PCM",
            AudioFormat::Wav => "WAV",
            AudioFormat::Mp3 => "MP3",
            AudioFormat::Flac => "FLAC",
            AudioFormat::Ogg => "OGG",
        };
        f.write_str(name)
    }
}

/// Numeric representation of a single sample.
///
/// The serialized names follow FFmpeg's sample format letters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleType {
    #[serde(rename = "s")]
    SignedInt,
    #[serde(rename = "u")]
    UnsignedInt,
    #[serde(rename = "f")]
    Float,
}

/// Byte order of multi-byte samples
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ByteOrder {
    #[serde(rename = "le")]
    LittleEndian,
    #[serde(rename = "be")]
    BigEndian,
    /// Only meaningful for 8-bit samples
    #[serde(rename = "")]
    NotApplicable,
}

/// Output format a backend guarantees for every chunk it produces.
///
/// Constant for the lifetime of a backend instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioSpec {
    pub format: AudioFormat,
    /// Sample rate in Hz
    pub sample_rate: u32,
    pub sample_type: SampleType,
    /// Bits per sample
    pub sample_width: u16,
    pub byte_order: ByteOrder,
    /// Number of audio channels (1 for mono)
    pub channels: u16,
}

impl AudioSpec {
    /// Mono signed 16-bit little-endian linear PCM at the given rate.
    pub fn pcm_s16le_mono(sample_rate: u32) -> Self {
        Self {
            format: AudioFormat::LinearPcm,
            sample_rate,
            sample_type: SampleType::SignedInt,
            sample_width: 16,
            byte_order: ByteOrder::LittleEndian,
            channels: 1,
        }
    }

    /// Bytes occupied by one sample across all channels.
    pub fn bytes_per_frame(&self) -> usize {
        (self.sample_width as usize).div_ceil(8) * self.channels as usize
    }

    /// Playback duration of `byte_len` bytes of raw audio in this format.
    pub fn duration_ms(&self, byte_len: usize) -> u64 {
        let frame = self.bytes_per_frame();
        if frame == 0 || self.sample_rate == 0 {
            return 0;
        }
        let frames = byte_len / frame;
        (frames as f64 / self.sample_rate as f64 * 1000.0) as u64
    }
}

/// Lazy, single-use sequence of audio chunks produced by one conversion.
///
/// Dropping the stream cancels the conversion.
pub type AudioStream = Pin<Box<dyn Stream<Item = TTSResult<Bytes>> + Send>>;

/// Drain a conversion into one contiguous buffer.
///
/// Stops at the first failed chunk and returns its error.
pub async fn collect_audio(mut stream: AudioStream) -> TTSResult<Vec<u8>> {
    let mut audio = Vec::new();
    while let Some(chunk) = stream.next().await {
        audio.extend_from_slice(&chunk?);
    }
    Ok(audio)
}
