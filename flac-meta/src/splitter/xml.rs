//! Strategy A: embedded MusicBrainz-style XML/RDF, carried in an
//! `APPLICATION` block with id `1885693293` (`"PEEM"`, §4.5).
//!
//! Parsed with regexes rather than a real XML parser — the payload is a
//! narrow, fixed dialect and the corpus this strategy targets is not
//! well-formed enough to trust to a strict parser anyway.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use super::{info_as_tagmap, Strategy, StrategyContext, TrackTable};
use crate::tags::TagMap;

const PEEM_APPLICATION_ID: u32 = 1_885_693_293;

pub struct XmlRdfStrategy;

fn album_list_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<mm:albumList>(.*?)</mm:albumList>").unwrap()
    })
}

fn single_album_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<mm:Album\s+rdf:about="([^"]+)""#).unwrap())
}

fn dc_title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<dc:title>([^<]*)</dc:title>").unwrap())
}

fn dc_creator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<dc:creator\s+rdf:resource="([^"]+)""#).unwrap())
}

fn release_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<mm:ReleaseDate>.*?<dc:date>([^<]*)</dc:date>").unwrap()
    })
}

fn track_list_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<mm:trackList>\s*<rdf:Seq>(.*?)</rdf:Seq>").unwrap()
    })
}

fn seq_item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<rdf:li\s+rdf:resource="([^"]+)""#).unwrap())
}

fn artist_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)<mm:Artist\s+rdf:about="([^"]+)"[^>]*>(.*?)</mm:Artist>"#).unwrap()
    })
}

fn sort_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<mm:sortName>([^<]*)</mm:sortName>").unwrap())
}

fn year_digits_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{4}").unwrap())
}

fn album_body(doc: &str, uri: &str) -> Option<String> {
    let pattern = format!(
        r#"(?s)<mm:Album\s+rdf:about="{}"[^>]*>(.*?)</mm:Album>"#,
        regex::escape(uri)
    );
    Regex::new(&pattern)
        .ok()?
        .captures(doc)
        .map(|c| c[1].to_string())
}

struct ArtistInfo {
    artist: Option<String>,
    artistsort: Option<String>,
}

fn build_artist_lookup(doc: &str) -> HashMap<String, ArtistInfo> {
    let mut lookup = HashMap::new();
    for caps in artist_re().captures_iter(doc) {
        let uri = caps[1].to_string();
        let body = &caps[2];
        let artist = dc_title_re().captures(body).map(|c| c[1].to_string());
        let artistsort = sort_name_re().captures(body).map(|c| c[1].to_string());
        lookup.insert(uri, ArtistInfo { artist, artistsort });
    }
    lookup
}

impl Strategy for XmlRdfStrategy {
    fn name(&self) -> &'static str {
        "xml_rdf"
    }

    fn try_split(&self, ctx: &StrategyContext, tracks: &mut TrackTable) -> usize {
        let Some(raw) = ctx.application.get(&PEEM_APPLICATION_ID) else {
            return 0;
        };
        let doc = String::from_utf8_lossy(raw);

        let album_uris: Vec<String> = if let Some(list) = album_list_re().captures(&doc) {
            single_album_re()
                .captures_iter(&list[1])
                .map(|c| c[1].to_string())
                .collect()
        } else if let Some(single) = single_album_re().captures(&doc) {
            vec![single[1].to_string()]
        } else {
            Vec::new()
        };

        if album_uris.is_empty() {
            return 0;
        }

        let artist_lookup = build_artist_lookup(&doc);
        let info_map = info_as_tagmap(ctx.info);

        let mut cuesheet_track: u32 = 0;
        let mut processed: usize = 0;

        for album_uri in &album_uris {
            let Some(body) = album_body(&doc, album_uri) else {
                continue;
            };

            let mut album_tags = TagMap::new();
            if let Some(c) = dc_title_re().captures(&body) {
                album_tags.set("ALBUM", c[1].to_string());
            }
            let artistid = dc_creator_re().captures(&body).map(|c| c[1].to_string());
            if let Some(id) = &artistid {
                album_tags.set("ARTISTID", id.clone());
            }
            if let Some(c) = release_date_re().captures(&body) {
                if let Some(m) = year_digits_re().find(&c[1]) {
                    if let Ok(year) = m.as_str().parse::<i64>() {
                        album_tags.set("YEAR", year);
                    }
                }
            }

            let track_uris: Vec<String> = track_list_re()
                .captures(&body)
                .map(|seq| {
                    seq_item_re()
                        .captures_iter(&seq[1])
                        .map(|c| c[1].to_string())
                        .collect()
                })
                .unwrap_or_default();

            for (position, _track_uri) in track_uris.iter().enumerate() {
                cuesheet_track += 1;
                let Some(track_map) = tracks.get_mut(&cuesheet_track) else {
                    continue;
                };
                processed += 1;
                track_map.set("TRACKNUM", (position + 1) as i64);
                track_map.merge_winner(&album_tags);
                if let Some(id) = &artistid {
                    if let Some(artist) = artist_lookup.get(id) {
                        if let Some(a) = &artist.artist {
                            track_map.set("ARTIST", a.clone());
                        }
                        if let Some(s) = &artist.artistsort {
                            track_map.set("ARTISTSORT", s.clone());
                        }
                    }
                }
                track_map.fill_missing_from(&info_map);
                crate::tags::mapper::apply(track_map, ctx.id3_mapper);
            }
        }

        if processed == 0 {
            warn!("XML/RDF application block present but no tracklist entries found");
        } else {
            debug!(processed, "XML/RDF strategy processed tracks");
        }
        processed
    }
}
