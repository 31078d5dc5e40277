//! C2: rename vendor tag keys to the canonical vocabulary and coerce a
//! handful of fields to their canonical types (§4.2).

use regex::Regex;
use std::sync::OnceLock;

use crate::interfaces::Id3Mapper;
use crate::tags::{TagMap, TagValue};

/// Exact vendor→canonical rename table from §4.2. Order doesn't matter:
/// every source key is distinct and renames never chain into each other.
const RENAMES: &[(&str, &str)] = &[
    ("TRACKNUMBER", "TRACKNUM"),
    ("DISCNUMBER", "DISC"),
    ("DISCTOTAL", "DISCC"),
    ("TOTALDISCS", "DISCC"),
    ("URL", "URLTAG"),
    ("DESCRIPTION", "COMMENT"),
    ("ORIGINALYEAR", "YEAR"),
    ("UNSYNCEDLYRICS", "LYRICS"),
    ("REPLAY GAIN", "REPLAYGAIN_TRACK_GAIN"),
    ("PEAK LEVEL", "REPLAYGAIN_TRACK_PEAK"),
    ("DISC #", "DISC"),
    ("ALBUM ARTIST", "ALBUMARTIST"),
    ("MUSICBRAINZ_SORTNAME", "ARTISTSORT"),
    ("MUSICBRAINZ_ALBUMARTIST", "ALBUMARTIST"),
    ("MUSICBRAINZ_ALBUMARTISTID", "MUSICBRAINZ_ALBUMARTIST_ID"),
    ("MUSICBRAINZ_ALBUMID", "MUSICBRAINZ_ALBUM_ID"),
    ("MUSICBRAINZ_ALBUMSTATUS", "MUSICBRAINZ_ALBUM_STATUS"),
    ("MUSICBRAINZ_ALBUMTYPE", "RELEASETYPE"),
    ("MUSICBRAINZ_ALBUM_TYPE", "RELEASETYPE"),
    ("MUSICBRAINZ_ARTISTID", "MUSICBRAINZ_ARTIST_ID"),
    ("MUSICBRAINZ_TRACKID", "MUSICBRAINZ_ID"),
    ("MUSICBRAINZ_TRMID", "MUSICBRAINZ_TRM_ID"),
];

fn year_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{4}").unwrap())
}

/// Applies the full C2 pipeline: ID3 coexistence, renames, date handling,
/// BPM coercion. Idempotent: a second call is a no-op.
pub fn apply(tags: &mut TagMap, id3_mapper: &dyn Id3Mapper) {
    apply_id3_coexistence(tags, id3_mapper);
    apply_renames(tags);
    apply_date_handling(tags);
    apply_bpm_coercion(tags);
}

fn apply_id3_coexistence(tags: &mut TagMap, id3_mapper: &dyn Id3Mapper) {
    if tags.contains("TAGVERSION") {
        id3_mapper.map_tags(tags, true);
    }
}

fn apply_renames(tags: &mut TagMap) {
    for (from, to) in RENAMES {
        tags.rename(from, to);
    }
}

fn apply_date_handling(tags: &mut TagMap) {
    if tags.contains("YEAR") {
        return;
    }
    let Some(date) = tags.get("DATE") else {
        return;
    };
    let scalar = match date {
        TagValue::List(values) => values.iter().min().cloned(),
        other => Some(other.display_string()),
    };
    if let TagValue::List(_) = date {
        if let Some(smallest) = &scalar {
            tags.set("DATE", smallest.clone());
        }
    }
    if let Some(text) = scalar {
        if let Some(m) = year_pattern().find(&text) {
            if let Ok(year) = m.as_str().parse::<i64>() {
                tags.set("YEAR", year);
            }
        }
    }
}

fn apply_bpm_coercion(tags: &mut TagMap) {
    let Some(bpm) = tags.get("BPM") else {
        return;
    };
    let truncated = match bpm {
        TagValue::Int(i) => Some(*i),
        TagValue::Str(s) => s.trim().parse::<f64>().ok().map(|f| f.trunc() as i64),
        _ => None,
    };
    if let Some(value) = truncated {
        tags.set("BPM", value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::NoopId3Mapper;

    fn apply_default(tags: &mut TagMap) {
        apply(tags, &NoopId3Mapper);
    }

    #[test]
    fn renames_move_value_and_remove_source() {
        let mut tags = TagMap::new();
        tags.set("TRACKNUMBER", "5");
        tags.set("DISCNUMBER", "1");
        tags.set("ALBUM ARTIST", "Various");
        apply_default(&mut tags);
        assert!(!tags.contains("TRACKNUMBER"));
        assert!(!tags.contains("DISCNUMBER"));
        assert!(!tags.contains("ALBUM ARTIST"));
        assert_eq!(tags.get("TRACKNUM").unwrap().as_str(), Some("5"));
        assert_eq!(tags.get("DISC").unwrap().as_str(), Some("1"));
        assert_eq!(tags.get("ALBUMARTIST").unwrap().as_str(), Some("Various"));
    }

    #[test]
    fn date_extracts_year_when_year_absent() {
        let mut tags = TagMap::new();
        tags.set("DATE", "2003-05-01");
        apply_default(&mut tags);
        assert_eq!(tags.get("YEAR").unwrap().as_int(), Some(2003));
    }

    #[test]
    fn date_list_collapses_to_smallest_then_extracts_year() {
        let mut tags = TagMap::new();
        tags.set(
            "DATE",
            TagValue::List(vec!["2010-01-01".into(), "1999-06-01".into()]),
        );
        apply_default(&mut tags);
        assert_eq!(
            tags.get("DATE").unwrap().as_str(),
            Some("1999-06-01")
        );
        assert_eq!(tags.get("YEAR").unwrap().as_int(), Some(1999));
    }

    #[test]
    fn existing_year_is_not_overwritten_by_date() {
        let mut tags = TagMap::new();
        tags.set("YEAR", 2020i64);
        tags.set("DATE", "1990-01-01");
        apply_default(&mut tags);
        assert_eq!(tags.get("YEAR").unwrap().as_int(), Some(2020));
    }

    #[test]
    fn bpm_truncates_to_integer() {
        let mut tags = TagMap::new();
        tags.set("BPM", "128.7");
        apply_default(&mut tags);
        assert_eq!(tags.get("BPM").unwrap().as_int(), Some(128));
    }

    #[test]
    fn mapper_is_idempotent() {
        let mut tags = TagMap::new();
        tags.set("TRACKNUMBER", "5");
        tags.set("DATE", "2003-05-01");
        tags.set("BPM", "99.9");
        apply_default(&mut tags);
        let once = tags.clone();
        apply_default(&mut tags);
        assert_eq!(tags, once);
    }

    struct InjectingId3Mapper;
    impl Id3Mapper for InjectingId3Mapper {
        fn map_tags(&self, tags: &mut TagMap, no_overwrite: bool) {
            if !(no_overwrite && tags.contains("TITLE")) {
                tags.set("TITLE", "From ID3");
            }
            tags.set_if_absent("COMMENT", "id3 comment");
        }
    }

    #[test]
    fn id3_pass_runs_first_and_never_overwrites_when_flagged() {
        let mut tags = TagMap::new();
        tags.set("TAGVERSION", "FLAC, ID3v2.3");
        tags.set("TITLE", "Flac Title");
        apply(&mut tags, &InjectingId3Mapper);
        assert_eq!(tags.get("TITLE").unwrap().as_str(), Some("Flac Title"));
        assert_eq!(tags.get("COMMENT").unwrap().as_str(), Some("id3 comment"));
    }

    #[test]
    fn id3_pass_is_skipped_without_tagversion() {
        let mut tags = TagMap::new();
        apply(&mut tags, &InjectingId3Mapper);
        assert!(!tags.contains("TITLE"));
    }
}
