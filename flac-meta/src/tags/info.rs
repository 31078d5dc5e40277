//! C3: project container-level stream info into canonical fields (§4.3).

use crate::interfaces::StreamInfoData;
use crate::tags::TagMap;

/// Writes `SIZE`, `SECS`, `OFFSET`, `BITRATE`, `VBR_SCALE`, `RATE`,
/// `SAMPLESIZE`, `CHANNELS`, `LOSSLESS`, and (if present) `TAGVERSION`.
pub fn extract(tags: &mut TagMap, info: &StreamInfoData) {
    tags.set("SIZE", info.file_size as i64);
    tags.set("SECS", info.song_length_ms / 1000.0);
    tags.set("OFFSET", 0i64);
    tags.set("BITRATE", info.bitrate.floor() as i64);
    tags.set("VBR_SCALE", 1i64);
    tags.set("RATE", info.samplerate.unwrap_or(0) as i64);
    tags.set("SAMPLESIZE", info.bits_per_sample as i64);
    tags.set("CHANNELS", info.channels as i64);
    tags.set("LOSSLESS", true);
    if let Some(id3_version) = &info.id3_version {
        tags.set("TAGVERSION", format!("FLAC, {id3_version}"));
    }
}
