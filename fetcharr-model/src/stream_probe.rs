use serde::{Deserialize, Serialize};

use crate::ids::MediaItemId;

/// §4.E stream probe fact set for one video stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoStreamFacts {
    pub index: i32,
    pub codec: String,
    pub width: i32,
    pub height: i32,
    pub framerate: Option<f64>,
    pub bitrate: Option<i64>,
    pub hdr_type: Option<String>,
    pub color_space: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioStreamFacts {
    pub index: i32,
    pub codec: String,
    pub language: Option<String>,
    pub channels: i32,
    pub is_default: bool,
    pub is_forced: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleStreamFacts {
    pub index: i32,
    pub codec: String,
    pub language: Option<String>,
    pub is_external: bool,
    pub is_default: bool,
    pub is_forced: bool,
}

/// §4.E `StreamProbe`: the fact set extracted from one media file. Keyed by
/// `(media_item_id, file_path)` and replaced wholesale on each probe run —
/// there is no merge across runs, only full replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StreamProbe {
    pub media_item_id: MediaItemId,
    pub file_path: String,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub video_streams: Vec<VideoStreamFacts>,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub audio_streams: Vec<AudioStreamFacts>,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub subtitle_streams: Vec<SubtitleStreamFacts>,
    pub probed_at: chrono::DateTime<chrono::Utc>,
}

impl StreamProbe {
    pub fn new(
        media_item_id: MediaItemId,
        file_path: impl Into<String>,
        video_streams: Vec<VideoStreamFacts>,
        audio_streams: Vec<AudioStreamFacts>,
        subtitle_streams: Vec<SubtitleStreamFacts>,
    ) -> Self {
        Self {
            media_item_id,
            file_path: file_path.into(),
            video_streams,
            audio_streams,
            subtitle_streams,
            probed_at: chrono::Utc::now(),
        }
    }

    /// The stream a Kodi-style player would treat as the primary video, i.e.
    /// the highest-resolution non-attached-picture video stream.
    pub fn primary_video(&self) -> Option<&VideoStreamFacts> {
        self.video_streams.iter().max_by_key(|s| s.width as i64 * s.height as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_video_is_the_highest_resolution_stream() {
        let probe = StreamProbe::new(
            MediaItemId::new(),
            "/movies/Example/file.mkv",
            vec![
                VideoStreamFacts { index: 0, codec: "mjpeg".into(), width: 120, height: 90, framerate: None, bitrate: None, hdr_type: None, color_space: None },
                VideoStreamFacts { index: 1, codec: "hevc".into(), width: 3840, height: 2160, framerate: Some(23.976), bitrate: Some(25_000_000), hdr_type: Some("hdr10".into()), color_space: Some("bt2020nc".into()) },
            ],
            vec![],
            vec![],
        );

        assert_eq!(probe.primary_video().unwrap().index, 1);
    }
}
