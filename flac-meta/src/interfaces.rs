//! Trait boundaries for the systems this module consumes but does not
//! implement (§6): the FLAC container parser, the cue-sheet text parser,
//! the catalog/database, and the ID3 tag mapper.
//!
//! Each trait ships at least one concrete, real implementation (so the
//! crate builds and exercises an end-to-end path without a host
//! application wired in) plus the test doubles used by the unit tests.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use crate::error::ContainerError;
use crate::tags::{TagMap, TagValue};

/// Stream-level info a container parser surfaces for a FLAC file (§6).
#[derive(Clone, Debug, Default)]
pub struct StreamInfoData {
    pub file_size: u64,
    pub song_length_ms: f64,
    pub bitrate: f64,
    /// `None` signals "no samplerate" (§4.6 step 1): the caller degrades to
    /// the empty result.
    pub samplerate: Option<u32>,
    pub bits_per_sample: u32,
    pub channels: u32,
    pub id3_version: Option<String>,
    pub audio_offset: u64,
    pub total_samples: Option<i64>,
}

/// One entry of the `ALLPICTURES` sequence (§4.4 strategy 1).
#[derive(Clone, Debug)]
pub struct PictureEntry {
    pub picture_type: i64,
    pub image_data: TagValue,
}

/// Everything a container scan surfaces for one file (§6).
#[derive(Clone, Debug, Default)]
pub struct ScanOutput {
    pub info: StreamInfoData,
    /// Raw, vendor-cased tags (Vorbis comments plus any info tags the
    /// adapter chooses to inject before handing off to the mapper).
    pub tags: TagMap,
    pub all_pictures: Vec<PictureEntry>,
    /// `APPLICATION` blocks, keyed by the 32-bit big-endian application id.
    pub application: BTreeMap<u32, Vec<u8>>,
    /// Lines of an embedded `CUESHEET` metadata block, if the container
    /// exposes one structurally rather than as a `CUESHEET` Vorbis comment.
    pub cuesheet_block: Option<Vec<String>>,
}

/// The FLAC container parser (consumed, §6): surfaces metadata blocks and
/// stream info, and can seek to a byte offset for a given playback time.
pub trait ContainerParser: Send + Sync {
    fn scan(&self, path: &Path) -> Result<ScanOutput, ContainerError>;

    /// Finds the byte offset of the frame containing `offset_ms`.
    fn find_frame(&self, path: &Path, offset_ms: u64) -> Result<u64, ContainerError>;
}

/// Metadata the cue parser (consumed, §6) returns for one track.
#[derive(Clone, Debug, Default)]
pub struct CueTrackMeta {
    pub uri: String,
    pub tracknum: u32,
    /// `TITLE`, `ARTIST`, `ALBUM`, and any other fields the cue parser
    /// recovers for this track.
    pub fields: TagMap,
}

/// The cue-sheet text parser (consumed, §6). Its grammar is out of scope;
/// only the narrow interface C5/C6 call through is specified here.
pub trait CueSheetParser: Send + Sync {
    /// Parses cue sheet `lines` (already including the synthetic
    /// `REM END <secs>` terminator appended by the caller) into a
    /// 1-indexed track metadata map.
    fn parse(&self, lines: &[String], dir: &Path, embedded: bool) -> BTreeMap<u32, CueTrackMeta>;

    /// Normalizes a track's URI fragment in place.
    fn process_anchor(&self, track: &mut CueTrackMeta);
}

/// A cue parser that never finds any tracks — the degrade-to-base-map path
/// (§4.6 step 5/6, §7 `BadCueSheet`) exercised when no real cue parser is
/// wired in.
#[derive(Default)]
pub struct NullCueSheetParser;

impl CueSheetParser for NullCueSheetParser {
    fn parse(&self, _lines: &[String], _dir: &Path, _embedded: bool) -> BTreeMap<u32, CueTrackMeta> {
        BTreeMap::new()
    }

    fn process_anchor(&self, _track: &mut CueTrackMeta) {}
}

/// A table-driven cue parser for tests: ignores the input lines and
/// returns a fixed map, so strategy D and the orchestrator's cue-handoff
/// can be exercised without a real cue grammar.
pub struct FixtureCueSheetParser {
    pub fixture: BTreeMap<u32, CueTrackMeta>,
}

impl CueSheetParser for FixtureCueSheetParser {
    fn parse(&self, _lines: &[String], _dir: &Path, _embedded: bool) -> BTreeMap<u32, CueTrackMeta> {
        self.fixture.clone()
    }

    fn process_anchor(&self, track: &mut CueTrackMeta) {
        if let Some((base, _frag)) = track.uri.split_once('#') {
            track.uri = base.to_string();
        }
    }
}

/// One persisted entry (§6 `updateOrCreate`).
#[derive(Clone, Debug)]
pub struct CatalogEntry {
    pub url: String,
    pub attributes: TagMap,
    pub read_tags: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog rejected entry for {url}")]
    Rejected { url: String },
}

/// The catalog/database (consumed, §6).
pub trait Catalog: Send + Sync {
    fn update_or_create(&self, entry: CatalogEntry) -> Result<(), CatalogError>;
}

/// A catalog that discards everything. Used when a host embeds this crate
/// purely for in-memory tag extraction and persists elsewhere.
#[derive(Default)]
pub struct NullCatalog;

impl Catalog for NullCatalog {
    fn update_or_create(&self, _entry: CatalogEntry) -> Result<(), CatalogError> {
        Ok(())
    }
}

/// An in-memory catalog for tests: records every entry it was asked to
/// persist so assertions can inspect them afterwards.
#[derive(Default)]
pub struct InMemoryCatalog {
    entries: Mutex<Vec<CatalogEntry>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<CatalogEntry> {
        self.entries.lock().expect("catalog mutex poisoned").clone()
    }
}

impl Catalog for InMemoryCatalog {
    fn update_or_create(&self, entry: CatalogEntry) -> Result<(), CatalogError> {
        self.entries
            .lock()
            .expect("catalog mutex poisoned")
            .push(entry);
        Ok(())
    }
}

/// The ID3 tag mapper (consumed, §4.2/§6): applied first, in
/// non-overwriting mode, when the container reports an ID3 version.
pub trait Id3Mapper: Send + Sync {
    fn map_tags(&self, tags: &mut TagMap, no_overwrite: bool);
}

/// The default: no ID3 passthrough tags are injected. A host embedding
/// this crate alongside a real ID3 reader supplies its own `Id3Mapper`.
#[derive(Default)]
pub struct NoopId3Mapper;

impl Id3Mapper for NoopId3Mapper {
    fn map_tags(&self, _tags: &mut TagMap, _no_overwrite: bool) {}
}

/// Builds the canonical `file://` URL for a track (§9.1): the
/// canonicalized absolute path, with `#` (the only character that would
/// be misread as a fragment separator) percent-encoded and nothing else.
pub(crate) fn canonical_file_url(path: &Path) -> String {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let rendered = canonical.to_string_lossy().replace('#', "%23");
    format!("file://{rendered}")
}
