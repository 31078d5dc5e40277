//! Strategy D: a cue sheet carried as the text value of a `CUESHEET`
//! Vorbis comment, rather than a FLAC `CUESHEET_BLOCK` (§4.5).

use tracing::warn;

use super::{info_as_tagmap, split_cuesheet_lines, Strategy, StrategyContext, TrackTable};
use crate::tags::mapper;

pub struct CueInVcStrategy;

impl Strategy for CueInVcStrategy {
    fn name(&self) -> &'static str {
        "cue_in_vorbis_comment"
    }

    fn try_split(&self, ctx: &StrategyContext, tracks: &mut TrackTable) -> usize {
        let Some(cuesheet) = ctx.raw_tags.get("CUESHEET").and_then(|v| v.as_str()) else {
            return 0;
        };

        let secs = ctx.info.song_length_ms / 1000.0;
        let mut lines = split_cuesheet_lines(cuesheet);
        lines.push(format!("    REM END {secs}"));

        let cue_result = ctx.cue_parser.parse(&lines, ctx.cue_dir, true);
        if cue_result.is_empty() {
            return 0;
        }

        let info_map = info_as_tagmap(ctx.info);
        let mut top_level = ctx.raw_tags.clone();
        top_level.remove("CUESHEET");

        let keys: Vec<u32> = tracks.keys().copied().collect();
        let mut processed = 0usize;

        for key in keys {
            let Some(meta) = cue_result.get(&key) else {
                warn!(track = key, "no cue metadata for existing track, skipping");
                continue;
            };
            let existing = tracks.get(&key).cloned().unwrap_or_default();
            let mut merged = info_map.clone();
            merged.merge_winner(&meta.fields);
            merged.merge_winner(&existing);
            merged.fill_missing_from(&top_level);
            mapper::apply(&mut merged, ctx.id3_mapper);
            tracks.insert(key, merged);
            processed += 1;
        }

        processed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::{CueTrackMeta, NoopId3Mapper, StreamInfoData};
    use crate::splitter::StrategyContext;
    use crate::tags::TagMap;
    use std::collections::BTreeMap;
    use std::path::Path;

    struct StubCueParser {
        fixture: BTreeMap<u32, CueTrackMeta>,
    }

    impl crate::interfaces::CueSheetParser for StubCueParser {
        fn parse(
            &self,
            _lines: &[String],
            _dir: &Path,
            _embedded: bool,
        ) -> BTreeMap<u32, CueTrackMeta> {
            self.fixture.clone()
        }

        fn process_anchor(&self, _track: &mut CueTrackMeta) {}
    }

    #[test]
    fn merges_cue_metadata_with_existing_track_winning() {
        let info = StreamInfoData {
            song_length_ms: 120_000.0,
            ..Default::default()
        };
        let mut raw_tags = TagMap::new();
        raw_tags.set(
            "CUESHEET",
            "FILE \"album.flac\" WAVE\n  TRACK 01 AUDIO\n    TITLE \"Cue Title\"\n",
        );
        let base_tags = TagMap::new();
        let application = BTreeMap::new();

        let mut fixture = BTreeMap::new();
        let mut fields = TagMap::new();
        fields.set("TITLE", "Cue Title");
        fields.set("ARTIST", "Cue Artist");
        fixture.insert(
            1,
            CueTrackMeta {
                uri: "file:///album.flac#1".into(),
                tracknum: 1,
                fields,
            },
        );
        let cue_parser = StubCueParser { fixture };
        let id3_mapper = NoopId3Mapper;
        let dir = Path::new(".");

        let ctx = StrategyContext {
            info: &info,
            raw_tags: &raw_tags,
            base_tags: &base_tags,
            application: &application,
            cue_parser: &cue_parser,
            id3_mapper: &id3_mapper,
            cue_dir: dir,
        };

        let mut tracks = crate::splitter::TrackTable::new();
        let mut existing = TagMap::new();
        existing.set("TITLE", "Already Set Title");
        tracks.insert(1, existing);

        let count = CueInVcStrategy.try_split(&ctx, &mut tracks);
        assert_eq!(count, 1);
        assert_eq!(
            tracks[&1].get("TITLE").unwrap().as_str(),
            Some("Already Set Title")
        );
        assert_eq!(
            tracks[&1].get("ARTIST").unwrap().as_str(),
            Some("Cue Artist")
        );
        assert!(!tracks[&1].contains("CUESHEET"));
    }

    #[test]
    fn no_cuesheet_tag_returns_zero() {
        let info = StreamInfoData::default();
        let raw_tags = TagMap::new();
        let base_tags = TagMap::new();
        let application = BTreeMap::new();
        let cue_parser = StubCueParser {
            fixture: BTreeMap::new(),
        };
        let id3_mapper = NoopId3Mapper;
        let dir = Path::new(".");
        let ctx = StrategyContext {
            info: &info,
            raw_tags: &raw_tags,
            base_tags: &base_tags,
            application: &application,
            cue_parser: &cue_parser,
            id3_mapper: &id3_mapper,
            cue_dir: dir,
        };
        let mut tracks = crate::splitter::TrackTable::new();
        tracks.insert(1, TagMap::new());
        assert_eq!(CueInVcStrategy.try_split(&ctx, &mut tracks), 0);
    }
}
