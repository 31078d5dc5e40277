//! Strategy B: numbered Vorbis comments, e.g. `TITLE(1)`, `ARTIST[2]`
//! (§4.5). A tag key is "grouped" when it ends in a bracketed index; the
//! base name before the bracket is the canonical key, and the number
//! selects which track it belongs to.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

use super::{Strategy, StrategyContext, TrackTable};
use crate::tags::{mapper, TagMap};

pub struct NumberedVcStrategy;

fn grouped_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*(.+?)\s*[(\[{<](\d+)[)\]}>]\s*$").unwrap())
}

fn grouped(key: &str) -> Option<(String, u32)> {
    let caps = grouped_key_re().captures(key)?;
    let name = caps[1].to_uppercase();
    let index: u32 = caps[2].parse().ok()?;
    Some((name, index))
}

impl Strategy for NumberedVcStrategy {
    fn name(&self) -> &'static str {
        "numbered_vorbis_comments"
    }

    fn try_split(&self, ctx: &StrategyContext, tracks: &mut TrackTable) -> usize {
        let titletags = ctx
            .raw_tags
            .iter()
            .filter(|(k, _)| grouped(k).is_some_and(|(name, _)| name == "TITLE"))
            .count();

        if titletags == 0 {
            return 0;
        }

        let cuetracks = tracks.len();
        if titletags != cuetracks {
            warn!(
                titletags,
                cuetracks, "numbered Vorbis comment count does not match cue track count"
            );
            return 0;
        }

        let mut per_track: BTreeMap<u32, TagMap> = BTreeMap::new();
        let mut defaults = TagMap::new();

        for (key, value) in ctx.raw_tags.iter() {
            match grouped(key) {
                Some((base, index)) => {
                    per_track.entry(index).or_default().set(base, value.clone());
                }
                None => defaults.set(key, value.clone()),
            }
        }

        for index in 1..=titletags as u32 {
            let mut track = defaults.clone();
            if let Some(values) = per_track.get(&index) {
                track.merge_winner(values);
            }
            track.set_if_absent("TRACKNUM", index as i64);
            mapper::apply(&mut track, ctx.id3_mapper);
            tracks.entry(index).or_default().merge_winner(&track);
        }

        titletags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::{NoopId3Mapper, NullCueSheetParser, StreamInfoData};
    use std::collections::BTreeMap as StdBTreeMap;
    use std::path::Path;

    fn ctx<'a>(
        info: &'a StreamInfoData,
        raw_tags: &'a TagMap,
        base_tags: &'a TagMap,
        application: &'a StdBTreeMap<u32, Vec<u8>>,
        cue_parser: &'a NullCueSheetParser,
        id3_mapper: &'a NoopId3Mapper,
        dir: &'a Path,
    ) -> StrategyContext<'a> {
        StrategyContext {
            info,
            raw_tags,
            base_tags,
            application,
            cue_parser,
            id3_mapper,
            cue_dir: dir,
        }
    }

    #[test]
    fn splits_grouped_tags_and_defaults() {
        let info = StreamInfoData::default();
        let mut raw_tags = TagMap::new();
        raw_tags.set("TITLE(1)", "First");
        raw_tags.set("TITLE(2)", "Second");
        raw_tags.set("ARTIST[1]", "Solo Artist");
        raw_tags.set("ALBUM", "Shared Album");
        let base_tags = TagMap::new();
        let application = StdBTreeMap::new();
        let cue_parser = NullCueSheetParser;
        let id3_mapper = NoopId3Mapper;
        let dir = Path::new(".");
        let context = ctx(
            &info,
            &raw_tags,
            &base_tags,
            &application,
            &cue_parser,
            &id3_mapper,
            dir,
        );

        let mut tracks = TrackTable::new();
        tracks.insert(1, TagMap::new());
        tracks.insert(2, TagMap::new());

        let count = NumberedVcStrategy.try_split(&context, &mut tracks);
        assert_eq!(count, 2);
        assert_eq!(tracks[&1].get("TITLE").unwrap().as_str(), Some("First"));
        assert_eq!(tracks[&1].get("ARTIST").unwrap().as_str(), Some("Solo Artist"));
        assert_eq!(tracks[&1].get("ALBUM").unwrap().as_str(), Some("Shared Album"));
        assert_eq!(tracks[&2].get("TITLE").unwrap().as_str(), Some("Second"));
        assert_eq!(tracks[&2].get("TRACKNUM").unwrap().as_int(), Some(2));
    }

    #[test]
    fn mismatched_counts_return_zero() {
        let info = StreamInfoData::default();
        let mut raw_tags = TagMap::new();
        raw_tags.set("TITLE(1)", "First");
        let base_tags = TagMap::new();
        let application = StdBTreeMap::new();
        let cue_parser = NullCueSheetParser;
        let id3_mapper = NoopId3Mapper;
        let dir = Path::new(".");
        let context = ctx(
            &info,
            &raw_tags,
            &base_tags,
            &application,
            &cue_parser,
            &id3_mapper,
            dir,
        );
        let mut tracks = TrackTable::new();
        tracks.insert(1, TagMap::new());
        tracks.insert(2, TagMap::new());
        assert_eq!(NumberedVcStrategy.try_split(&context, &mut tracks), 0);
    }

    #[test]
    fn no_grouped_title_returns_zero() {
        let info = StreamInfoData::default();
        let raw_tags = TagMap::new();
        let base_tags = TagMap::new();
        let application = StdBTreeMap::new();
        let cue_parser = NullCueSheetParser;
        let id3_mapper = NoopId3Mapper;
        let dir = Path::new(".");
        let context = ctx(
            &info,
            &raw_tags,
            &base_tags,
            &application,
            &cue_parser,
            &id3_mapper,
            dir,
        );
        let mut tracks = TrackTable::new();
        assert_eq!(NumberedVcStrategy.try_split(&context, &mut tracks), 0);
    }
}
