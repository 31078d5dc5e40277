//! Strategy C: CDDB-style `DTITLE`/`TTITLEn` tags (§4.5), the convention
//! left behind by older CD-ripping tools.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use super::{info_as_tagmap, Strategy, StrategyContext, TrackTable};
use crate::tags::{mapper, TagMap};

pub struct CddbStrategy;

fn ttitle_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^TTITLE(\d+)$").unwrap())
}

impl Strategy for CddbStrategy {
    fn name(&self) -> &'static str {
        "cddb"
    }

    fn try_split(&self, ctx: &StrategyContext, tracks: &mut TrackTable) -> usize {
        let mut defaults = ctx.raw_tags.clone();

        let Some(dtitle) = defaults.remove("DTITLE") else {
            return 0;
        };
        if let Some(text) = dtitle.as_str() {
            if let Some((artist, album)) = text.split_once('/') {
                defaults.set("ARTIST", artist.trim());
                defaults.set("ALBUM", album.trim());
            }
        }
        defaults.rename("DGENRE", "GENRE");
        defaults.rename("DYEAR", "YEAR");

        let ttitle_keys: Vec<String> = defaults
            .iter()
            .filter(|(k, _)| ttitle_re().is_match(k))
            .map(|(k, _)| k.clone())
            .collect();

        let mut per_track: BTreeMap<u32, TagMap> = BTreeMap::new();
        let mut processed = 0usize;

        for key in ttitle_keys {
            let Some(caps) = ttitle_re().captures(&key) else {
                continue;
            };
            let Ok(n) = caps[1].parse::<u32>() else {
                continue;
            };
            let value = defaults.remove(&key).expect("key came from defaults");

            let mut track = TagMap::new();
            if let Some(text) = value.as_str() {
                if let Some((artist, title)) = text.split_once(" / ") {
                    track.set("ARTIST", artist.trim());
                    track.set("TITLE", title.trim());
                } else {
                    track.set("TITLE", text);
                }
            }
            track.set("TRACKNUM", n as i64);
            per_track.insert(n, track);
            processed += 1;
        }

        if processed == 0 {
            return 0;
        }

        defaults.fill_missing_from(&info_as_tagmap(ctx.info));

        for (n, track) in per_track {
            let entry = tracks.entry(n).or_default();
            let mut merged = defaults.clone();
            merged.merge_winner(&track);
            entry.merge_winner(&merged);
            mapper::apply(entry, ctx.id3_mapper);
        }

        processed
    }
}
