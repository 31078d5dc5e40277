//! C4: pick cover art from one of three vendor storage conventions (§4.4).

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

use crate::interfaces::ScanOutput;
use crate::tags::{TagMap, TagValue};

/// Escient's "app block" application id (§6).
const ESCIENT_ARTWORK: u32 = 1_163_084_622;

const ENV_NO_ARTWORK: &str = "AUDIO_SCAN_NO_ARTWORK";

fn no_artwork_mode() -> bool {
    std::env::var(ENV_NO_ARTWORK)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn pick_standard_picture(scan: &ScanOutput) -> Option<TagValue> {
    if scan.all_pictures.is_empty() {
        return None;
    }
    let mut sorted = scan.all_pictures.clone();
    sorted.sort_by_key(|p| p.picture_type);
    sorted
        .iter()
        .find(|p| p.picture_type == 3)
        .or_else(|| sorted.first())
        .map(|p| p.image_data.clone())
}

/// Sets `ARTWORK` (and `COVER_LENGTH`) on `tags` from the first applicable
/// source, or leaves both unset if none apply. `no_artwork_override` lets
/// callers (tests, or `getCoverArt`'s "forced to false locally") bypass the
/// process-wide environment toggle; `None` falls back to reading it.
pub fn resolve(tags: &mut TagMap, scan: &ScanOutput, no_artwork_override: Option<bool>) {
    let no_artwork = no_artwork_override.unwrap_or_else(no_artwork_mode);

    if let Some(data) = pick_standard_picture(scan) {
        debug!("artwork resolved from ALLPICTURES");
        apply_artwork(tags, data, no_artwork);
        return;
    }

    if let Some(encoded) = tags.remove("COVERART") {
        if let Some(s) = encoded.as_str() {
            match STANDARD.decode(s.trim()) {
                Ok(bytes) => {
                    debug!("artwork resolved from COVERART");
                    apply_artwork(tags, TagValue::Bytes(bytes), no_artwork);
                }
                Err(error) => {
                    debug!(%error, "COVERART base64 decode failed, artwork left absent");
                }
            }
        }
        return;
    }

    if let Some(data) = scan.application.get(&ESCIENT_ARTWORK) {
        if data.len() >= 4 && &data[0..4] == b"PIC1" {
            debug!("artwork resolved from Escient app block");
            apply_artwork(tags, TagValue::Bytes(data[4..].to_vec()), no_artwork);
        }
    }
}

fn apply_artwork(tags: &mut TagMap, data: TagValue, no_artwork: bool) {
    let real_len = data.byte_len() as i64;
    if no_artwork {
        tags.set("ARTWORK", real_len);
    } else {
        tags.set("ARTWORK", data);
    }
    tags.set("COVER_LENGTH", real_len);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::PictureEntry;
    use std::collections::BTreeMap;

    fn scan_with_pictures(pictures: Vec<PictureEntry>) -> ScanOutput {
        ScanOutput {
            all_pictures: pictures,
            ..Default::default()
        }
    }

    #[test]
    fn prefers_front_cover_type_3() {
        let scan = scan_with_pictures(vec![
            PictureEntry {
                picture_type: 4,
                image_data: TagValue::Bytes(vec![1, 2, 3]),
            },
            PictureEntry {
                picture_type: 3,
                image_data: TagValue::Bytes(vec![9, 9]),
            },
        ]);
        let mut tags = TagMap::new();
        resolve(&mut tags, &scan, Some(false));
        assert_eq!(tags.get("ARTWORK").unwrap().as_bytes(), Some(&[9u8, 9][..]));
        assert_eq!(tags.get("COVER_LENGTH").unwrap().as_int(), Some(2));
    }

    #[test]
    fn falls_back_to_first_picture_when_no_front_cover() {
        let scan = scan_with_pictures(vec![PictureEntry {
            picture_type: 6,
            image_data: TagValue::Bytes(vec![1, 2, 3, 4]),
        }]);
        let mut tags = TagMap::new();
        resolve(&mut tags, &scan, Some(false));
        assert_eq!(tags.get("COVER_LENGTH").unwrap().as_int(), Some(4));
    }

    #[test]
    fn coverart_base64_decodes() {
        let mut tags = TagMap::new();
        tags.set("COVERART", STANDARD.encode(b"hello"));
        let scan = ScanOutput::default();
        resolve(&mut tags, &scan, Some(false));
        assert_eq!(tags.get("ARTWORK").unwrap().as_bytes(), Some(&b"hello"[..]));
        assert!(!tags.contains("COVERART"));
    }

    #[test]
    fn coverart_bad_base64_leaves_artwork_absent_without_error() {
        let mut tags = TagMap::new();
        tags.set("COVERART", "not valid base64!!");
        let scan = ScanOutput::default();
        resolve(&mut tags, &scan, Some(false));
        assert!(!tags.contains("ARTWORK"));
        assert!(!tags.contains("COVERART"));
    }

    #[test]
    fn escient_app_block_strips_pic1_prefix() {
        let mut application = BTreeMap::new();
        let mut payload = b"PIC1".to_vec();
        payload.extend_from_slice(b"rest-of-image");
        application.insert(ESCIENT_ARTWORK, payload);
        let scan = ScanOutput {
            application,
            ..Default::default()
        };
        let mut tags = TagMap::new();
        resolve(&mut tags, &scan, Some(false));
        assert_eq!(
            tags.get("ARTWORK").unwrap().as_bytes(),
            Some(&b"rest-of-image"[..])
        );
    }

    #[test]
    fn no_artwork_mode_stores_length_instead_of_bytes() {
        let scan = scan_with_pictures(vec![PictureEntry {
            picture_type: 3,
            image_data: TagValue::Bytes(vec![0u8; 10]),
        }]);
        let mut tags = TagMap::new();
        resolve(&mut tags, &scan, Some(true));
        assert_eq!(tags.get("ARTWORK").unwrap().as_int(), Some(10));
        assert_eq!(tags.get("COVER_LENGTH").unwrap().as_int(), Some(10));
    }
}
