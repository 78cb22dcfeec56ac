//! §4.F step 1 file classification. Grounded on the teacher's
//! `scanner.rs::MediaScanner::is_video_file`, which classifies by a
//! lower-cased extension list; generalized from "video or not" to the
//! full `{video, image, subtitle, nfo, trailer, unknown}` taxonomy the
//! directory-scan phase needs.

use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Video,
    Image,
    Subtitle,
    Nfo,
    Trailer,
    Unknown,
}

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "webm", "flv", "wmv", "m4v", "mpg", "mpeg", "3gp", "ogv", "ts", "mts", "m2ts"];
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "tbn"];
const SUBTITLE_EXTENSIONS: &[&str] = &["srt", "sub", "ass", "ssa", "vtt"];

pub fn classify(path: &Path) -> FileKind {
    let Some(ext) = path.extension().and_then(|e| e.to_str()).map(str::to_lowercase) else {
        return FileKind::Unknown;
    };

    if ext == "nfo" {
        return FileKind::Nfo;
    }
    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        return if is_trailer_filename(path) { FileKind::Trailer } else { FileKind::Video };
    }
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return FileKind::Image;
    }
    if SUBTITLE_EXTENSIONS.contains(&ext.as_str()) {
        return FileKind::Subtitle;
    }
    FileKind::Unknown
}

fn is_trailer_filename(path: &Path) -> bool {
    path.file_stem().and_then(|s| s.to_str()).map(str::to_lowercase).is_some_and(|stem| stem.ends_with("-trailer") || stem.contains("trailer"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn classifies_by_extension() {
        assert_eq!(classify(&PathBuf::from("Movie.mkv")), FileKind::Video);
        assert_eq!(classify(&PathBuf::from("poster.jpg")), FileKind::Image);
        assert_eq!(classify(&PathBuf::from("Movie.en.srt")), FileKind::Subtitle);
        assert_eq!(classify(&PathBuf::from("movie.nfo")), FileKind::Nfo);
        assert_eq!(classify(&PathBuf::from("README.txt")), FileKind::Unknown);
    }

    #[test]
    fn trailer_suffixed_video_files_are_classified_as_trailers() {
        assert_eq!(classify(&PathBuf::from("Movie-trailer.mp4")), FileKind::Trailer);
    }
}
