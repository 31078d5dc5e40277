//! C6: the `get_tag` orchestrator (§4.6) — wires C1-scanned container
//! output through C3/C2/C4 to a base tag map, then through C5 when the
//! file carries an embedded cue sheet.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::UNIX_EPOCH;

use tracing::{instrument, warn};

use crate::error::FlacMetaError;
use crate::interfaces::{
    self, Catalog, CatalogEntry, ContainerParser, CueSheetParser, CueTrackMeta, Id3Mapper,
};
use crate::splitter::{self, StrategyContext, TrackTable};
use crate::tags::{self, TagMap};

/// Runs the full C6 pipeline for one file.
///
/// `anchor` is the fragment identifier naming a single embedded track
/// (§4.6 input); when it matches a track's URI, that track's map is
/// returned in place of the whole-file/playlist map.
#[instrument(skip(container, cue_parser, catalog, id3_mapper), err)]
pub fn get_tag(
    path: &Path,
    anchor: Option<&str>,
    container: &dyn ContainerParser,
    cue_parser: &dyn CueSheetParser,
    catalog: &dyn Catalog,
    id3_mapper: &dyn Id3Mapper,
) -> Result<TagMap, FlacMetaError> {
    let scan = container.scan(path)?;

    // Step 1: no samplerate means the container couldn't make sense of
    // the stream at all; degrade to the empty result (§7 `InvalidContainer`).
    if scan.info.samplerate.is_none() {
        return Ok(TagMap::new());
    }

    // Step 2: base tag map via C3 (info), C2 (rename/coerce), C4 (artwork).
    let raw_tags = scan.tags.clone();
    let mut base = scan.tags.clone();
    tags::info::extract(&mut base, &scan.info);
    tags::mapper::apply(&mut base, id3_mapper);
    tags::artwork::resolve(&mut base, &scan, None);

    // Step 3/4: detect an embedded cue sheet; single-track file otherwise.
    let cue_lines = scan.cuesheet_block.clone().or_else(|| {
        raw_tags
            .get("CUESHEET")
            .and_then(|v| v.as_str())
            .map(splitter::split_cuesheet_lines)
    });
    let Some(mut lines) = cue_lines else {
        return Ok(base);
    };

    // Step 5.
    let secs = scan.info.song_length_ms / 1000.0;
    lines.push(format!("    REM END {secs}"));
    base.set("FILENAME", path.display().to_string());

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut cue_tracks: BTreeMap<u32, CueTrackMeta> = cue_parser.parse(&lines, dir, false);
    if cue_tracks.is_empty() {
        return Ok(base);
    }

    let mut tracks: TrackTable = BTreeMap::new();
    for (index, meta) in &cue_tracks {
        let mut track = TagMap::new();
        track.set("URI", meta.uri.clone());
        track.set("TRACKNUM", meta.tracknum as i64);
        track.merge_winner(&meta.fields);
        tracks.insert(*index, track);
    }

    // Step 6.
    let ctx = StrategyContext {
        info: &scan.info,
        raw_tags: &raw_tags,
        base_tags: &base,
        application: &scan.application,
        cue_parser,
        id3_mapper,
        cue_dir: dir,
    };
    let processed = splitter::split(&ctx, &mut tracks);
    if processed == 0 {
        warn!(path = %path.display(), "no track-splitter strategy matched an embedded cue sheet");
        return Ok(base);
    }

    // Step 7: mark the base map as a playlist.
    base.set("CT", "fec");
    base.set("AUDIO", false);
    let playlist_title = tracks
        .get(&1)
        .and_then(|t| t.get("ALBUM"))
        .cloned()
        .or_else(|| base.get("ALBUM").cloned());
    if let Some(title) = playlist_title {
        base.set("TITLE", title);
    }

    // Step 8: canonical URL, mtime, per-track bookkeeping, persistence.
    let file_url = interfaces::canonical_file_url(path);
    let mtime = file_mtime_secs(path);
    let mut result = base.clone();

    for (index, track) in tracks.iter_mut() {
        track.set("AGE", mtime as i64);
        let fs = track
            .get("SIZE")
            .and_then(|v| v.as_int())
            .or_else(|| base.get("SIZE").and_then(|v| v.as_int()))
            .unwrap_or(0);
        track.set("FS", fs);
        track.set("VIRTUAL", true);

        if let Some(meta) = cue_tracks.get_mut(index) {
            cue_parser.process_anchor(meta);
            track.set("URI", meta.uri.clone());
        }

        let uri = track
            .get("URI")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        if let Err(error) = catalog.update_or_create(CatalogEntry {
            url: uri.clone(),
            attributes: track.clone(),
            read_tags: false,
        }) {
            warn!(%error, track = *index, "catalog rejected track entry");
        }

        if let Some(anchor) = anchor {
            if uri == format!("{file_url}#{anchor}") {
                result = track.clone();
            }
        }
    }

    Ok(result)
}

/// `getCoverArt` (§6): artwork retrieval forced to artwork-retaining mode
/// regardless of the process-wide `AUDIO_SCAN_NO_ARTWORK` toggle.
#[instrument(skip(container), err)]
pub fn get_cover_art(
    path: &Path,
    container: &dyn ContainerParser,
) -> Result<Option<crate::tags::TagValue>, FlacMetaError> {
    let scan = container.scan(path)?;
    let mut tags = scan.tags.clone();
    tags::artwork::resolve(&mut tags, &scan, Some(false));
    Ok(tags.remove("ARTWORK"))
}

fn file_mtime_secs(path: &Path) -> u64 {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
