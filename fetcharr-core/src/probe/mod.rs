//! §4.E stream probe: shells out to `ffprobe` and turns its JSON stream
//! listing into a fact set. Idempotent and keyed by `(media_item_id,
//! file_path)`; each run fully replaces the prior result rather than
//! merging into it. Grounded on the teacher's
//! `metadata/hdr_metadata.rs`, which drives `ffprobe -show_streams
//! -print_format json` as a subprocess and walks the resulting `Value`
//! rather than linking a decoder library — the spec explicitly treats
//! ffprobe invocation mechanics as an external-boundary detail, so the
//! subprocess-plus-JSON shape is kept rather than pulling in `ffmpeg-next`.

use std::path::Path;
use std::process::Stdio;

use serde_json::Value;
use tokio::process::Command;

use fetcharr_model::{AudioStreamFacts, MediaItemId, StreamProbe, SubtitleStreamFacts, VideoStreamFacts};

use crate::error::{CoreError, Result};

/// Name of the `ffprobe` binary on `PATH`; not configurable because the
/// spec treats the probe as a fixed external boundary, not a tunable.
const FFPROBE_BIN: &str = "ffprobe";

pub struct StreamProber;

impl StreamProber {
    pub fn new() -> Self {
        Self
    }

    pub async fn probe(&self, media_item_id: MediaItemId, file_path: &Path) -> Result<StreamProbe> {
        let path_str = file_path.to_str().ok_or_else(|| CoreError::Validation("file path is not valid UTF-8".to_string()))?;

        let output = Command::new(FFPROBE_BIN)
            .args(["-v", "quiet", "-print_format", "json", "-show_streams"])
            .arg(path_str)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(CoreError::Io)?;

        if !output.status.success() {
            return Err(CoreError::Integrity(format!("ffprobe exited with {}", output.status)));
        }

        let json: Value = serde_json::from_slice(&output.stdout)?;
        Ok(parse_probe(media_item_id, path_str, &json))
    }
}

impl Default for StreamProber {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_probe(media_item_id: MediaItemId, file_path: &str, json: &Value) -> StreamProbe {
    let mut video_streams = Vec::new();
    let mut audio_streams = Vec::new();
    let mut subtitle_streams = Vec::new();

    let Some(streams) = json.get("streams").and_then(Value::as_array) else {
        return StreamProbe::new(media_item_id, file_path, video_streams, audio_streams, subtitle_streams);
    };

    for stream in streams {
        let index = stream.get("index").and_then(Value::as_i64).unwrap_or_default() as i32;
        let codec = stream.get("codec_name").and_then(Value::as_str).unwrap_or("unknown").to_string();
        let language = stream
            .get("tags")
            .and_then(|t| t.get("language"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let disposition = stream.get("disposition");
        let is_default = disposition.and_then(|d| d.get("default")).and_then(Value::as_i64).unwrap_or(0) == 1;
        let is_forced = disposition.and_then(|d| d.get("forced")).and_then(Value::as_i64).unwrap_or(0) == 1;

        match stream.get("codec_type").and_then(Value::as_str) {
            Some("video") => {
                let is_attached_pic = disposition.and_then(|d| d.get("attached_pic")).and_then(Value::as_i64).unwrap_or(0) == 1;
                if is_attached_pic {
                    continue;
                }
                let width = stream.get("width").and_then(Value::as_i64).unwrap_or_default() as i32;
                let height = stream.get("height").and_then(Value::as_i64).unwrap_or_default() as i32;
                video_streams.push(VideoStreamFacts {
                    index,
                    codec,
                    width,
                    height,
                    framerate: parse_framerate(stream.get("avg_frame_rate").and_then(Value::as_str)),
                    bitrate: stream.get("bit_rate").and_then(Value::as_str).and_then(|s| s.parse().ok()),
                    hdr_type: classify_hdr(stream),
                    color_space: stream.get("color_space").and_then(Value::as_str).map(str::to_string),
                });
            }
            Some("audio") => {
                audio_streams.push(AudioStreamFacts {
                    index,
                    codec,
                    language,
                    channels: stream.get("channels").and_then(Value::as_i64).unwrap_or_default() as i32,
                    is_default,
                    is_forced,
                });
            }
            Some("subtitle") => {
                subtitle_streams.push(SubtitleStreamFacts {
                    index,
                    codec,
                    language,
                    is_external: false,
                    is_default,
                    is_forced,
                });
            }
            _ => {}
        }
    }

    StreamProbe::new(media_item_id, file_path, video_streams, audio_streams, subtitle_streams)
}

fn parse_framerate(raw: Option<&str>) -> Option<f64> {
    let raw = raw?;
    let (num, den) = raw.split_once('/')?;
    let num: f64 = num.parse().ok()?;
    let den: f64 = den.parse().ok()?;
    if den == 0.0 { None } else { Some(num / den) }
}

/// HDR classification from `color_transfer`/side-data, the same fields the
/// teacher's `HdrMetadataExtractor` reads.
fn classify_hdr(stream: &Value) -> Option<String> {
    let transfer = stream.get("color_transfer").and_then(Value::as_str)?;
    match transfer {
        "smpte2084" => Some("hdr10".to_string()),
        "arib-std-b67" => Some("hlg".to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_video_audio_and_subtitle_streams() {
        let raw = json!({
            "streams": [
                {"index": 0, "codec_type": "video", "codec_name": "hevc", "width": 3840, "height": 2160, "avg_frame_rate": "24000/1001", "bit_rate": "25000000", "color_transfer": "smpte2084", "disposition": {"default": 1}},
                {"index": 1, "codec_type": "audio", "codec_name": "eac3", "channels": 6, "tags": {"language": "eng"}, "disposition": {"default": 1}},
                {"index": 2, "codec_type": "subtitle", "codec_name": "subrip", "tags": {"language": "eng"}, "disposition": {"forced": 1}},
            ]
        });

        let probe = parse_probe(MediaItemId::new(), "/movies/x.mkv", &raw);

        assert_eq!(probe.video_streams.len(), 1);
        assert_eq!(probe.video_streams[0].hdr_type.as_deref(), Some("hdr10"));
        assert_eq!(probe.audio_streams[0].language.as_deref(), Some("eng"));
        assert!(probe.subtitle_streams[0].is_forced);
    }

    #[test]
    fn attached_picture_streams_are_excluded_from_video_streams() {
        let raw = json!({
            "streams": [
                {"index": 0, "codec_type": "video", "codec_name": "mjpeg", "width": 120, "height": 90, "disposition": {"attached_pic": 1}},
            ]
        });

        let probe = parse_probe(MediaItemId::new(), "/movies/x.mkv", &raw);
        assert!(probe.video_streams.is_empty());
    }

    #[test]
    fn malformed_framerate_is_ignored_rather_than_panicking() {
        assert_eq!(parse_framerate(Some("0/0")), None);
        assert_eq!(parse_framerate(Some("not-a-rate")), None);
        assert_eq!(parse_framerate(Some("24000/1001")), Some(24000.0 / 1001.0));
    }
}
