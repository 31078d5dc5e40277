//! Default [`ContainerParser`] backed by `metaflac`.
//!
//! The container parser itself is an out-of-scope collaborator (§1, §6):
//! this adapter only projects `metaflac::Tag` blocks into the shapes
//! [`crate::interfaces::ScanOutput`] expects, the way `flac-tracksplit`'s
//! `Track::from_tags` projects `symphonia` tags into its own `Track` type.

use std::path::Path;

use metaflac::{Block, BlockType, Tag};
use tracing::{instrument, warn};

use crate::error::ContainerError;
use crate::interfaces::{ContainerParser, PictureEntry, ScanOutput, StreamInfoData};
use crate::tags::{TagMap, TagValue};

#[derive(Default)]
pub struct MetaflacContainerParser;

impl MetaflacContainerParser {
    pub fn new() -> Self {
        Self
    }
}

impl ContainerParser for MetaflacContainerParser {
    #[instrument(skip(self), err)]
    fn scan(&self, path: &Path) -> Result<ScanOutput, ContainerError> {
        let file_size = std::fs::metadata(path)
            .map_err(|source| ContainerError::Open {
                path: path.to_path_buf(),
                source,
            })?
            .len();

        let tag = Tag::read_from_path(path).map_err(|_| ContainerError::Unparseable {
            path: path.to_path_buf(),
        })?;

        let streaminfo = tag.get_blocks(BlockType::StreamInfo).find_map(|b| match b {
            Block::StreamInfo(si) => Some(si),
            _ => None,
        });

        let Some(si) = streaminfo else {
            return Err(ContainerError::Unparseable {
                path: path.to_path_buf(),
            });
        };

        let song_length_ms = if si.sample_rate > 0 {
            (si.total_samples as f64) * 1000.0 / (si.sample_rate as f64)
        } else {
            0.0
        };
        let bitrate = if song_length_ms > 0.0 {
            (file_size as f64) * 8.0 / (song_length_ms / 1000.0)
        } else {
            0.0
        };

        let info = StreamInfoData {
            file_size,
            song_length_ms,
            bitrate,
            samplerate: Some(si.sample_rate),
            bits_per_sample: si.bits_per_sample as u32,
            channels: si.channels as u32,
            id3_version: None,
            audio_offset: 0,
            total_samples: Some(si.total_samples as i64),
        };

        let mut tags = TagMap::new();
        if let Some(vc) = tag.vorbis_comments() {
            for (key, values) in &vc.comments {
                if values.len() == 1 {
                    tags.set(key, values[0].clone());
                } else {
                    tags.set(key, TagValue::List(values.clone()));
                }
            }
        }

        let all_pictures = tag
            .pictures()
            .map(|pic| PictureEntry {
                picture_type: pic.picture_type as u8 as i64,
                image_data: TagValue::Bytes(pic.data.clone()),
            })
            .collect();

        let mut application = std::collections::BTreeMap::new();
        for block in tag.get_blocks(BlockType::Application) {
            if let Block::Application(app) = block {
                if app.id.len() == 4 {
                    let id = u32::from_be_bytes([app.id[0], app.id[1], app.id[2], app.id[3]]);
                    application.insert(id, app.data.clone());
                } else {
                    warn!(len = app.id.len(), "APPLICATION block id is not 4 bytes");
                }
            }
        }

        // Structured CUESHEET metadata blocks are rare in the wild compared
        // to the textual CUESHEET Vorbis comment every worked example in
        // this module's spec actually uses; we standardize on the latter
        // and leave this `None` rather than guess at a binary-to-text
        // rendering. See DESIGN.md.
        let cuesheet_block = None;

        Ok(ScanOutput {
            info,
            tags,
            all_pictures,
            application,
            cuesheet_block,
        })
    }

    fn find_frame(&self, path: &Path, offset_ms: u64) -> Result<u64, ContainerError> {
        // Without a frame index, approximate by linear interpolation over
        // the stream's total byte length and duration. A real container
        // parser would consult a SEEKTABLE or bisect the frame stream; this
        // adapter exists only so `find_frame` has some working default.
        let scan = self.scan(path)?;
        if scan.info.song_length_ms <= 0.0 {
            return Ok(0);
        }
        let fraction = (offset_ms as f64 / scan.info.song_length_ms).clamp(0.0, 1.0);
        Ok((scan.info.file_size as f64 * fraction) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_an_open_error() {
        let parser = MetaflacContainerParser::new();
        let err = parser.scan(Path::new("/nonexistent/does-not-exist.flac"));
        assert!(matches!(err, Err(ContainerError::Open { .. })));
    }
}
