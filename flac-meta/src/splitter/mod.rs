//! C5: track-splitter strategies (§4.5) — five pluggable conventions for
//! recovering per-track metadata from a FLAC file's embedded cue sheet,
//! tried in strict priority order until one reports a positive track count.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::interfaces::{CueSheetParser, Id3Mapper, StreamInfoData};
use crate::tags::{self, TagMap};

mod cddb;
mod cue_in_vc;
mod numbered_vc;
mod stacked;
mod xml;

/// The Track Table (§3): 1-based cue-sheet track index to canonical tags.
pub type TrackTable = BTreeMap<u32, TagMap>;

/// Everything a strategy needs to attempt a split, gathered once by the
/// orchestrator (§4.6) and threaded through unchanged.
pub struct StrategyContext<'a> {
    pub info: &'a StreamInfoData,
    /// Raw, vendor-cased FLAC tags (pre-C2), as surfaced by the container.
    pub raw_tags: &'a TagMap,
    /// The canonical base tag map (post C3+C4+C2), used only by the
    /// strategy fallback (§4.5 "Fallback").
    pub base_tags: &'a TagMap,
    /// `APPLICATION` blocks, keyed by 32-bit id (used by strategy A).
    pub application: &'a BTreeMap<u32, Vec<u8>>,
    pub cue_parser: &'a dyn CueSheetParser,
    pub id3_mapper: &'a dyn Id3Mapper,
    pub cue_dir: &'a Path,
}

/// A single track-splitter convention (§9 "five strategies as a
/// polymorphic dispatch").
pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Attempts to fill `tracks` with per-track metadata. Returns the
    /// number of track entries processed; `0` means "did not apply" and
    /// lets the dispatcher fall through to the next strategy.
    fn try_split(&self, ctx: &StrategyContext, tracks: &mut TrackTable) -> usize;
}

fn strategies() -> [&'static dyn Strategy; 5] {
    [
        &xml::XmlRdfStrategy,
        &numbered_vc::NumberedVcStrategy,
        &cddb::CddbStrategy,
        &cue_in_vc::CueInVcStrategy,
        &stacked::StackedVcStrategy,
    ]
}

/// Splits embedded cue-sheet text on newline boundaries, trimming
/// trailing whitespace from each line (§4.6 step 5, reused by strategy D).
pub(crate) fn split_cuesheet_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.trim_end().to_string())
        .collect()
}

/// Fills `info` into a throwaway [`TagMap`] so it can be merged via
/// `fill_missing_from`/`merge_winner`, as several strategies do with
/// "container info" (§4.5 strategies A and C).
pub(crate) fn info_as_tagmap(info: &StreamInfoData) -> TagMap {
    let mut map = TagMap::new();
    tags::info::extract(&mut map, info);
    map
}

/// Runs each strategy in order, short-circuiting on the first positive
/// count, then the fallback described at the end of §4.5.
pub fn split(ctx: &StrategyContext, tracks: &mut TrackTable) -> usize {
    for strategy in strategies() {
        let count = strategy.try_split(ctx, tracks);
        if count > 0 {
            debug!(strategy = strategy.name(), count, "track splitter matched");
            return count;
        }
    }

    if !ctx.base_tags.is_empty() && !tracks.is_empty() {
        debug!("no splitter strategy matched; falling back to the standard tag map");
        for track in tracks.values_mut() {
            track.fill_missing_from(ctx.base_tags);
        }
        return tracks.len();
    }

    0
}
