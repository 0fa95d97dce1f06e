//! Conversion from Kokoro samples to the plugin's wire format

use bytes::{BufMut, Bytes, BytesMut};

/// Scale factor from `[-1.0, 1.0]` floats to signed 16-bit integers
const I16_SCALE: f32 = 32767.0;

/// Convert float samples to signed 16-bit little-endian PCM.
///
/// Out-of-range samples are clipped.
pub fn samples_to_pcm_s16le(samples: &[f32]) -> Bytes {
    let mut buf = BytesMut::with_capacity(samples.len() * 2);
    for sample in samples {
        buf.put_i16_le((sample.clamp(-1.0, 1.0) * I16_SCALE) as i16);
    }
    buf.freeze()
}
