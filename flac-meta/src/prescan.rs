//! C8: the Stream Prescanner (§4.8) — spools the leading bytes of a
//! stream to a temp file so the container parser (which needs random
//! access, not a byte stream) can be invoked on a real path, then derives
//! a sanity-checked duration/bitrate estimate from the result.

use std::io::Write;
use std::path::Path;

use tracing::{debug, instrument};

use crate::error::{ContainerError, FlacMetaError};
use crate::interfaces::{self, Catalog, CatalogEntry, ContainerParser, StreamInfoData};
use crate::tags::TagMap;

/// How many bytes to accumulate before invoking the container parser
/// (§3 "Prescan State").
const PRESCAN_THRESHOLD: usize = 32 * 1024;

/// Per-stream prescan accumulator (§3 "Prescan State").
#[derive(Debug, Default)]
pub struct Prescanner {
    scanbuf: Vec<u8>,
}

impl Prescanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffered_len(&self) -> usize {
        self.scanbuf.len()
    }
}

/// Result of one `parse_stream` call (§4.8).
#[derive(Debug)]
pub enum PrescanOutcome {
    /// Sentinel `-1`: not enough data buffered yet.
    NeedMoreData,
    /// `nil`/`undefined`: the container parser couldn't find a samplerate.
    Unparseable,
    Info(StreamInfoData),
}

/// `parseStream(chunk, args, length)` (§4.8).
#[instrument(skip(state, chunk, container), err)]
pub fn parse_stream(
    state: &mut Prescanner,
    chunk: &[u8],
    length: Option<u64>,
    container: &dyn ContainerParser,
) -> Result<PrescanOutcome, FlacMetaError> {
    state.scanbuf.extend_from_slice(chunk);

    if state.scanbuf.len() < PRESCAN_THRESHOLD {
        return Ok(PrescanOutcome::NeedMoreData);
    }

    let mut spool = tempfile::NamedTempFile::new()?;
    spool.write_all(&state.scanbuf)?;
    spool.flush()?;

    let scan = match container.scan(spool.path()) {
        Ok(scan) => scan,
        Err(error) => {
            debug!(%error, "prescan spool could not be parsed");
            return Ok(PrescanOutcome::Unparseable);
        }
    };

    let mut info = scan.info;
    if info.samplerate.is_none() {
        return Ok(PrescanOutcome::Unparseable);
    }

    let buflen = state.scanbuf.len() as f64;
    let bytes_per_sample = (info.channels as f64) * (info.bits_per_sample as f64) / 8.0;
    if bytes_per_sample > 0.0 {
        let max_samples = (buflen - info.audio_offset as f64) * 8.0 / bytes_per_sample;
        let total_samples = info.total_samples.unwrap_or(-1);
        if total_samples < 0 || (total_samples as f64) > max_samples {
            debug!(total_samples, max_samples, "prescan duration estimate rejected as bogus");
            info.song_length_ms = 0.0;
            info.total_samples = Some(0);
        }
    }

    if let Some(length) = length {
        if info.song_length_ms > 0.0 {
            info.bitrate = 8000.0 * (length as f64 - info.audio_offset as f64) / info.song_length_ms;
        }
    }

    Ok(PrescanOutcome::Info(info))
}

/// `scanBitrate` (§4.8): always refuses to report a bitrate from a short
/// header, but persists the derived duration to the catalog as a side
/// effect.
#[instrument(skip(container, catalog))]
pub fn scan_bitrate(
    path: &Path,
    container: &dyn ContainerParser,
    catalog: &dyn Catalog,
) -> (i64, Option<f64>) {
    if let Ok(scan) = container.scan(path) {
        if scan.info.samplerate.is_some() {
            let mut attributes = TagMap::new();
            attributes.set("SECS", scan.info.song_length_ms / 1000.0);
            let url = interfaces::canonical_file_url(path);
            if let Err(error) = catalog.update_or_create(CatalogEntry {
                url,
                attributes,
                read_tags: false,
            }) {
                debug!(%error, "catalog rejected scanBitrate duration update");
            }
        }
    }
    (-1, None)
}

/// `findFrameBoundaries(fh, offset, timeSec)` (§4.8): delegates to the
/// container's frame-seek API with time converted to milliseconds.
pub fn find_frame_boundaries(
    path: &Path,
    container: &dyn ContainerParser,
    time_sec: f64,
) -> Result<u64, ContainerError> {
    let offset_ms = (time_sec * 1000.0).floor() as u64;
    container.find_frame(path, offset_ms)
}
