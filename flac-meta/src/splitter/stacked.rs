//! Strategy E: stacked Vorbis comments (§4.5). Present as a stub in the
//! core, same as the upstream behavior it mirrors: a conforming
//! implementation may leave this disabled entirely.

use super::{Strategy, StrategyContext, TrackTable};

pub struct StackedVcStrategy;

impl Strategy for StackedVcStrategy {
    fn name(&self) -> &'static str {
        "stacked_vorbis_comments"
    }

    fn try_split(&self, _ctx: &StrategyContext, _tracks: &mut TrackTable) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::{NoopId3Mapper, NullCueSheetParser, StreamInfoData};
    use crate::tags::TagMap;
    use std::collections::BTreeMap;
    use std::path::Path;

    #[test]
    fn always_returns_zero() {
        let info = StreamInfoData::default();
        let raw_tags = TagMap::new();
        let base_tags = TagMap::new();
        let application = BTreeMap::new();
        let cue_parser = NullCueSheetParser;
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
        let mut tracks = TrackTable::new();
        tracks.insert(1, TagMap::new());
        assert_eq!(StackedVcStrategy.try_split(&ctx, &mut tracks), 0);
    }
}
