//! yt-dlp integration: listing and per-item downloads

use crate::core::backend::MediaSource;
use crate::error::{HoardError, Result};
use crate::types::{Config, MediaKind, PlaylistItem};
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;
use tokio::process::Command;

/// Field separator in listing output
const LISTING_DELIMITER: char = '\t';

/// Output template; the `[id]` part lets artifacts be found again
const OUTPUT_TEMPLATE: &str = "%(title)s [%(id)s].%(ext)s";

static ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("Invalid regex"));

/// File extension yt-dlp gives an `--audio-format`, or `None` when it is not
/// fixed (`best` keeps the source container) or the format is unknown
pub fn audio_extension(format: &str) -> Option<&'static str> {
    match format.trim().to_ascii_lowercase().as_str() {
        "mp3" => Some("mp3"),
        "aac" | "m4a" | "alac" => Some("m4a"),
        "opus" => Some("opus"),
        "vorbis" => Some("ogg"),
        "flac" => Some("flac"),
        "wav" => Some("wav"),
        _ => None,
    }
}

/// Build YouTube URL from video ID
pub fn build_video_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Arguments for the metadata-only listing of `url`
pub fn build_listing_args(url: &str) -> Vec<String> {
    vec![
        "--flat-playlist".into(),
        "--no-warnings".into(),
        "--print".into(),
        format!("%(id)s{}%(title)s", LISTING_DELIMITER),
        "--".into(),
        url.into(),
    ]
}

/// Parse one listing line.
///
/// `Ok(None)` for blank lines, `Err(reason)` for malformed ones.
pub fn parse_listing_line(line: &str) -> std::result::Result<Option<PlaylistItem>, String> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Ok(None);
    }

    let (id, title) = match line.split_once(LISTING_DELIMITER) {
        Some((id, title)) => (id.trim(), Some(title.trim())),
        None => (line.trim(), None),
    };

    if !ID_PATTERN.is_match(id) {
        return Err(format!("invalid identifier {:?}", id));
    }

    let item = match title {
        Some(t) if !t.is_empty() && t != "NA" => PlaylistItem::with_title(id, t),
        _ => PlaylistItem::new(id),
    };
    Ok(Some(item))
}

/// Parse full listing output, dropping malformed lines with a warning
pub fn parse_listing(stdout: &str) -> Vec<PlaylistItem> {
    stdout
        .lines()
        .enumerate()
        .filter_map(|(n, line)| match parse_listing_line(line) {
            Ok(item) => item,
            Err(reason) => {
                tracing::warn!("skipping listing line {}: {}", n + 1, reason);
                None
            }
        })
        .collect()
}

/// Download settings taken from the config
#[derive(Debug, Clone)]
pub struct YtDlpSettings {
    pub audio_format: String,
    pub audio_quality: String,
    pub video_format: String,
    pub rate_limit: String,
    /// Keep the thumbnail next to the audio so it can be embedded later
    pub write_thumbnail: bool,
}

impl YtDlpSettings {
    pub fn from_config(config: &Config, embed_cover: bool) -> Self {
        Self {
            audio_format: config.audio_format.clone(),
            audio_quality: config.audio_quality.clone(),
            video_format: config.video_format.clone(),
            rate_limit: config.rate_limit.clone(),
            write_thumbnail: embed_cover,
        }
    }
}

/// Arguments for downloading a single item
pub fn build_download_args(
    kind: MediaKind,
    settings: &YtDlpSettings,
    item_url: &str,
    output_dir: &Path,
) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();

    match kind {
        MediaKind::Audio => {
            args.extend([
                "-f".into(),
                "bestaudio".into(),
                "--extract-audio".into(),
                "--audio-format".into(),
                settings.audio_format.clone(),
                "--audio-quality".into(),
                settings.audio_quality.clone(),
            ]);
            if settings.write_thumbnail {
                args.extend([
                    "--write-thumbnail".into(),
                    "--convert-thumbnails".into(),
                    "jpg".into(),
                ]);
            }
        }
        MediaKind::Video => {
            args.extend([
                "-f".into(),
                settings.video_format.clone(),
                "--merge-output-format".into(),
                "mp4".into(),
            ]);
            if !settings.rate_limit.is_empty() {
                args.extend(["--limit-rate".into(), settings.rate_limit.clone()]);
            }
        }
    }

    let output_template = output_dir.join(OUTPUT_TEMPLATE);
    args.extend([
        "--no-playlist".into(),
        "-o".into(),
        output_template.to_string_lossy().into_owned(),
        "--".into(),
        item_url.into(),
    ]);

    args
}

/// yt-dlp executable plus the settings it downloads with
pub struct YtDlp {
    path: PathBuf,
    settings: YtDlpSettings,
}

impl YtDlp {
    pub fn new(path: impl Into<PathBuf>, settings: YtDlpSettings) -> Self {
        Self {
            path: path.into(),
            settings,
        }
    }
}

#[async_trait]
impl MediaSource for YtDlp {
    async fn enumerate(&self, url: &str) -> Vec<PlaylistItem> {
        let output = Command::new(&self.path)
            .args(build_listing_args(url))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match output {
            Ok(o) => o,
            Err(e) => {
                tracing::warn!("failed to start yt-dlp for listing: {}", e);
                return Vec::new();
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(
                "yt-dlp listing exited with {:?}: {}",
                output.status.code(),
                stderr.trim()
            );
        }

        // Partial listings are still usable
        parse_listing(&String::from_utf8_lossy(&output.stdout))
    }

    async fn fetch(&self, item: &PlaylistItem, kind: MediaKind, output_dir: &Path) -> Result<()> {
        let url = build_video_url(&item.id);
        let args = build_download_args(kind, &self.settings, &url, output_dir);

        let status = Command::new(&self.path)
            .args(&args)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| HoardError::Spawn(format!("Failed to start yt-dlp: {}", e)))?;

        if !status.success() {
            return Err(HoardError::ToolFailed {
                tool: "yt-dlp".into(),
                code: status.code(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> YtDlpSettings {
        YtDlpSettings::from_config(&Config::default(), true)
    }

    #[test]
    fn test_build_video_url() {
        assert_eq!(
            build_video_url("dQw4w9WgXcQ"),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }

    #[test]
    fn listing_args_request_id_and_title() {
        let args = build_listing_args("https://www.youtube.com/playlist?list=PL1");
        assert_eq!(args[0], "--flat-playlist");
        assert!(args.contains(&"%(id)s\t%(title)s".to_string()));
        assert_eq!(args.last().unwrap(), "https://www.youtube.com/playlist?list=PL1");
    }

    #[test]
    fn url_starting_with_dash_is_not_an_option() {
        let args = build_listing_args("--exec=rm");
        let n = args.len();
        assert_eq!(args[n - 2], "--");
        assert_eq!(args[n - 1], "--exec=rm");

        let args = build_download_args(MediaKind::Video, &settings(), "-x", Path::new("/v"));
        let n = args.len();
        assert_eq!(&args[n - 2..], ["--", "-x"]);
    }

    #[test]
    fn audio_formats_map_to_their_extensions() {
        assert_eq!(audio_extension("mp3"), Some("mp3"));
        assert_eq!(audio_extension("vorbis"), Some("ogg"));
        assert_eq!(audio_extension("alac"), Some("m4a"));
        assert_eq!(audio_extension("AAC"), Some("m4a"));
        assert_eq!(audio_extension("best"), None);
        assert_eq!(audio_extension("wma"), None);
    }

    #[test]
    fn parses_id_and_title() {
        let item = parse_listing_line("abc_123-XY\tSome Song (Live)\r").unwrap().unwrap();
        assert_eq!(item.id, "abc_123-XY");
        assert_eq!(item.title.as_deref(), Some("Some Song (Live)"));
    }

    #[test]
    fn bare_identifier_is_accepted() {
        let item = parse_listing_line("dQw4w9WgXcQ").unwrap().unwrap();
        assert_eq!(item, PlaylistItem::new("dQw4w9WgXcQ"));
    }

    #[test]
    fn na_title_is_absent() {
        let item = parse_listing_line("abc\tNA").unwrap().unwrap();
        assert_eq!(item.title, None);
        assert_eq!(item.label(), "abc");
    }

    #[test]
    fn malformed_lines_are_rejected() {
        assert!(parse_listing_line("ERROR: [youtube] unavailable").is_err());
        assert!(parse_listing_line("\tjust a title").is_err());
        assert_eq!(parse_listing_line("   ").unwrap(), None);
    }

    #[test]
    fn listing_keeps_order_and_drops_garbage() {
        let stdout = "AAA\tFirst\nnot an id!\n\nBBB\tSecond\nCCC\n";
        let ids: Vec<String> = parse_listing(stdout).into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["AAA", "BBB", "CCC"]);
    }

    #[test]
    fn empty_listing_is_empty() {
        assert!(parse_listing("").is_empty());
    }

    #[test]
    fn audio_args_extract_and_keep_thumbnail() {
        let args = build_download_args(
            MediaKind::Audio,
            &settings(),
            "https://www.youtube.com/watch?v=abc",
            Path::new("/music"),
        );
        let joined = args.join(" ");
        assert!(joined.contains("-f bestaudio --extract-audio --audio-format mp3 --audio-quality 0"));
        assert!(joined.contains("--write-thumbnail --convert-thumbnails jpg"));
        assert!(!joined.contains("--limit-rate"));
        assert!(args.contains(&"/music/%(title)s [%(id)s].%(ext)s".to_string()));
        assert_eq!(args.last().unwrap(), "https://www.youtube.com/watch?v=abc");
    }

    #[test]
    fn audio_args_without_cover() {
        let settings = YtDlpSettings::from_config(&Config::default(), false);
        let args = build_download_args(MediaKind::Audio, &settings, "u", Path::new("/m"));
        assert!(!args.contains(&"--write-thumbnail".to_string()));
    }

    #[test]
    fn video_args_merge_mp4_with_rate_limit() {
        let args = build_download_args(MediaKind::Video, &settings(), "u", Path::new("/v"));
        let joined = args.join(" ");
        assert!(joined.contains("--merge-output-format mp4"));
        assert!(joined.contains("--limit-rate 2M"));
        assert!(joined.contains("--no-playlist"));
        assert!(!joined.contains("--extract-audio"));
    }
}
