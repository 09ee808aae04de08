//! yt-dlp subprocess driver
//!
//! yt-dlp runs as an async child process. Progress lines are parsed from its
//! output and the final info dictionary is printed as JSON once the file has
//! been moved into place. A file over `--max-filesize` is skipped with a clean
//! exit, so the announced size and the skip notice are watched for too.

use crate::error::{DownloadError, DownloadResult};
use crate::platform::{MediaKind, Platform};
use crate::progress::{self, ProgressSender};
use serde::Deserialize;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Number of stderr lines kept for error reports
const STDERR_TAIL_LINES: usize = 5;

/// Metadata yt-dlp reports for a finished download
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaInfo {
    pub id: Option<String>,
    pub title: Option<String>,
    pub webpage_url: Option<String>,
    pub view_count: Option<u64>,
    pub duration: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub uploader: Option<String>,
    pub ext: Option<String>,
    /// Final location after post-processing
    pub filepath: Option<PathBuf>,
    #[serde(rename = "_filename")]
    pub filename: Option<PathBuf>,
}

impl MediaInfo {
    /// Path of the downloaded file
    pub fn path(&self) -> Option<&Path> {
        self.filepath.as_deref().or(self.filename.as_deref())
    }

    /// Title, or a placeholder
    pub fn title_or_default(&self) -> &str {
        self.title.as_deref().unwrap_or("Unknown Title")
    }
}

/// Handle to the yt-dlp binary
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: String,
    max_filesize: u64,
}

impl YtDlp {
    /// Create a driver for `program`, refusing files above `max_filesize` bytes
    pub fn new(program: impl Into<String>, max_filesize: u64) -> Self {
        Self {
            program: program.into(),
            max_filesize,
        }
    }

    /// Build the full argument list for one download
    pub fn build_args(&self, url: &str, dir: &Path, platform: Platform, kind: MediaKind) -> Vec<String> {
        let mut args: Vec<String> = platform
            .ytdlp_args(kind)
            .into_iter()
            .map(String::from)
            .collect();

        args.extend(
            [
                "--no-playlist",
                "--newline",
                "--progress",
                "--no-warnings",
                "--no-simulate",
                "--concurrent-fragments",
                "10",
                "--print",
                "before_dl:%(filesize,filesize_approx)j",
                "--print",
                "after_move:%()j",
            ]
            .into_iter()
            .map(String::from),
        );
        args.push("--max-filesize".to_string());
        args.push(self.max_filesize.to_string());
        args.push("-o".to_string());
        args.push(dir.join("%(id)s.%(ext)s").to_string_lossy().into_owned());
        args.push("--".to_string());
        args.push(url.to_string());
        args
    }

    /// Download `url` into `dir`, publishing progress as it goes
    ///
    /// # Errors
    /// Fails when yt-dlp cannot start, exits unsuccessfully, or produces no file
    pub async fn download(
        &self,
        url: &str,
        dir: &Path,
        platform: Platform,
        kind: MediaKind,
        progress: &ProgressSender,
    ) -> DownloadResult<MediaInfo> {
        tracing::info!("Downloading {} {:?} from: {}", platform, kind, url);

        let mut child = Command::new(&self.program)
            .args(self.build_args(url, dir, platform, kind))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| DownloadError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or(DownloadError::NoOutput)?;
        let stderr = child.stderr.take().ok_or(DownloadError::NoOutput)?;
        let mut out_lines = BufReader::new(stdout).lines();
        let mut err_lines = BufReader::new(stderr).lines();

        let mut info: Option<MediaInfo> = None;
        let mut expected_size: Option<u64> = None;
        let mut skipped_size: Option<Option<u64>> = None;
        let mut stderr_tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
        let (mut out_done, mut err_done) = (false, false);

        while !(out_done && err_done) {
            let line = tokio::select! {
                line = out_lines.next_line(), if !out_done => match line? {
                    Some(line) => line,
                    None => {
                        out_done = true;
                        continue;
                    }
                },
                line = err_lines.next_line(), if !err_done => match line? {
                    Some(line) => line,
                    None => {
                        err_done = true;
                        continue;
                    }
                },
            };

            match classify_line(&line) {
                OutputLine::Progress(p) => {
                    let _ = progress.send(Some(p));
                }
                OutputLine::ExpectedSize(size) => expected_size = Some(size),
                OutputLine::Oversize(size) => skipped_size = Some(size),
                OutputLine::Info(parsed) => info = Some(*parsed),
                OutputLine::Other => {
                    if !line.trim().is_empty() {
                        if stderr_tail.len() == STDERR_TAIL_LINES {
                            stderr_tail.pop_front();
                        }
                        stderr_tail.push_back(line);
                    }
                }
            }
        }

        let status = child.wait().await?;
        if !status.success() {
            let stderr = stderr_tail.into_iter().collect::<Vec<_>>().join("\n");
            tracing::error!("yt-dlp failed for {}: {}", url, stderr);
            return Err(DownloadError::ToolFailed {
                program: self.program.clone(),
                status: status.to_string(),
                stderr,
            });
        }

        let Some(info) = info else {
            // yt-dlp exits cleanly when --max-filesize makes it skip the file
            let oversize = skipped_size
                .map(|size| size.or(expected_size).unwrap_or(self.max_filesize))
                .or(expected_size.filter(|size| *size > self.max_filesize));
            if let Some(size) = oversize {
                tracing::warn!("yt-dlp skipped {}: {} bytes over the limit", url, size);
                return Err(DownloadError::TooLarge {
                    size,
                    limit: self.max_filesize,
                });
            }
            return Err(DownloadError::NoOutput);
        };

        match info.path() {
            Some(path) if tokio::fs::try_exists(path).await.unwrap_or(false) => {
                tracing::info!("Downloaded {} to {}", info.title_or_default(), path.display());
                Ok(info)
            }
            _ => Err(DownloadError::NoOutput),
        }
    }
}

/// What one line of yt-dlp output carries
#[derive(Debug)]
enum OutputLine {
    Progress(progress::Progress),
    /// Size announced by the `before_dl` print
    ExpectedSize(u64),
    /// The file was skipped for exceeding `--max-filesize`
    Oversize(Option<u64>),
    Info(Box<MediaInfo>),
    Other,
}

fn classify_line(line: &str) -> OutputLine {
    if let Some(p) = progress::parse_ytdlp_line(line) {
        return OutputLine::Progress(p);
    }

    let trimmed = line.trim();
    if let Some(pos) = trimmed.find("larger than max-filesize") {
        return OutputLine::Oversize(parse_skipped_size(&trimmed[pos..]));
    }

    if trimmed.starts_with('{') {
        return match serde_json::from_str::<MediaInfo>(trimmed) {
            Ok(info) => OutputLine::Info(Box::new(info)),
            Err(e) => {
                tracing::warn!("Unparseable yt-dlp info line: {}", e);
                OutputLine::Other
            }
        };
    }

    match trimmed.parse::<f64>() {
        Ok(size) if size.is_finite() && size >= 0.0 => OutputLine::ExpectedSize(size as u64),
        _ => OutputLine::Other,
    }
}

/// Size from `larger than max-filesize (123 bytes > 100 bytes)`
fn parse_skipped_size(text: &str) -> Option<u64> {
    let inner = text.split_once('(')?.1;
    inner.split_whitespace().next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args_ends_with_url() {
        let ytdlp = YtDlp::new("yt-dlp", 50 * 1024 * 1024);
        let args = ytdlp.build_args(
            "https://youtu.be/In8bfGnXavw",
            Path::new("temp/1_2"),
            Platform::YouTube,
            MediaKind::Video,
        );

        assert_eq!(args.last().map(String::as_str), Some("https://youtu.be/In8bfGnXavw"));
        assert_eq!(args[args.len() - 2], "--");
        assert!(args.iter().any(|a| a == "after_move:%()j"));
        assert!(args.iter().any(|a| a == "before_dl:%(filesize,filesize_approx)j"));
        assert!(args.iter().any(|a| a == "52428800"));
        assert!(args.iter().any(|a| a.ends_with("%(id)s.%(ext)s")));
    }

    #[test]
    fn test_parse_info_line() {
        let line = r#"{"id": "abc", "title": "Clip", "view_count": 1200, "duration": 75.4, "width": 1280, "height": 720, "webpage_url": "https://www.tiktok.com/@u/video/1", "filepath": "temp/1_2/abc.mp4", "_filename": "temp/1_2/abc.mp4"}"#;

        let OutputLine::Info(info) = classify_line(line) else {
            panic!("info line not recognised");
        };
        assert_eq!(info.title_or_default(), "Clip");
        assert_eq!(info.view_count, Some(1200));
        assert_eq!(info.height, Some(720));
        assert_eq!(info.path(), Some(Path::new("temp/1_2/abc.mp4")));
    }

    #[test]
    fn test_classify_progress_and_size_lines() {
        assert!(matches!(
            classify_line("[download]  10.0% of 1.00MiB at 1.00KiB/s ETA 00:01"),
            OutputLine::Progress(p) if p.total == Some(1024 * 1024)
        ));
        assert!(matches!(classify_line("73400320"), OutputLine::ExpectedSize(73400320)));
        assert!(matches!(classify_line("1234.5"), OutputLine::ExpectedSize(1234)));
        assert!(matches!(classify_line("null"), OutputLine::Other));
        assert!(matches!(
            classify_line("[download] File is larger than max-filesize (73400320 bytes > 52428800 bytes). Aborting."),
            OutputLine::Oversize(Some(73400320))
        ));
        assert!(matches!(
            classify_line("[download] File is larger than max-filesize. Aborting."),
            OutputLine::Oversize(None)
        ));
    }

    #[cfg(unix)]
    mod fake_binary {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        const LIMIT: u64 = 50 * 1024 * 1024;

        fn test_dir(name: &str) -> PathBuf {
            let dir = std::env::temp_dir().join(format!("ytdlp-test-{}-{}", name, std::process::id()));
            let _ = std::fs::remove_dir_all(&dir);
            std::fs::create_dir_all(&dir).unwrap();
            dir
        }

        /// Write an executable shell script standing in for yt-dlp
        fn fake_ytdlp(dir: &Path, body: &str) -> YtDlp {
            let script = dir.join("yt-dlp");
            std::fs::write(&script, format!("#!/bin/sh\n{}\n", body)).unwrap();
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
            YtDlp::new(script.to_string_lossy().into_owned(), LIMIT)
        }

        async fn run(ytdlp: &YtDlp, dir: &Path, progress: &ProgressSender) -> DownloadResult<MediaInfo> {
            loop {
                let result = ytdlp
                    .download("https://youtu.be/abc", dir, Platform::YouTube, MediaKind::Video, progress)
                    .await;
                match result {
                    // ETXTBSY while another test still holds a script open for writing
                    Err(DownloadError::Spawn { ref source, .. }) if source.raw_os_error() == Some(26) => {
                        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                    }
                    other => return other,
                }
            }
        }

        #[tokio::test]
        async fn test_download_reads_info_and_stderr_progress() {
            let dir = test_dir("success");
            let media = dir.join("abc.mp4");
            let ytdlp = fake_ytdlp(
                &dir,
                &format!(
                    "echo '[download]  50.0% of 2.00KiB at 1.00KiB/s ETA 00:01' >&2\n\
                     echo 2048\n\
                     printf 'data' > '{path}'\n\
                     echo '{{\"id\": \"abc\", \"title\": \"Clip\", \"filepath\": \"{path}\"}}'",
                    path = media.display()
                ),
            );
            let (tx, rx) = progress::channel();

            let info = run(&ytdlp, &dir, &tx).await.unwrap();
            assert_eq!(info.title_or_default(), "Clip");
            assert_eq!(info.path(), Some(media.as_path()));
            let last = rx.borrow().unwrap();
            assert_eq!(last.total, Some(2048));
            assert_eq!(last.downloaded, 1024);

            std::fs::remove_dir_all(&dir).unwrap();
        }

        #[tokio::test]
        async fn test_download_failure_carries_stderr_tail() {
            let dir = test_dir("failure");
            let ytdlp = fake_ytdlp(
                &dir,
                "echo '[youtube] abc: Downloading webpage' >&2\n\
                 echo 'ERROR: [youtube] abc: Private video' >&2\n\
                 exit 1",
            );
            let (tx, _rx) = progress::channel();

            match run(&ytdlp, &dir, &tx).await {
                Err(DownloadError::ToolFailed { stderr, status, .. }) => {
                    assert!(stderr.contains("Private video"), "stderr was {:?}", stderr);
                    assert!(status.contains('1'));
                }
                other => panic!("expected ToolFailed, got {:?}", other),
            }

            std::fs::remove_dir_all(&dir).unwrap();
        }

        #[tokio::test]
        async fn test_download_missing_file_is_no_output() {
            let dir = test_dir("missing");
            let ytdlp = fake_ytdlp(
                &dir,
                &format!(
                    "echo '{{\"id\": \"abc\", \"filepath\": \"{}\"}}'",
                    dir.join("gone.mp4").display()
                ),
            );
            let (tx, _rx) = progress::channel();

            assert!(matches!(run(&ytdlp, &dir, &tx).await, Err(DownloadError::NoOutput)));

            std::fs::remove_dir_all(&dir).unwrap();
        }

        #[tokio::test]
        async fn test_download_skipped_for_max_filesize_is_too_large() {
            let dir = test_dir("oversize");
            let ytdlp = fake_ytdlp(
                &dir,
                "echo NA\n\
                 echo '[download] File is larger than max-filesize (73400320 bytes > 52428800 bytes). Aborting.' >&2\n\
                 exit 0",
            );
            let (tx, _rx) = progress::channel();

            match run(&ytdlp, &dir, &tx).await {
                Err(DownloadError::TooLarge { size, limit }) => {
                    assert_eq!(size, 73400320);
                    assert_eq!(limit, LIMIT);
                }
                other => panic!("expected TooLarge, got {:?}", other),
            }

            std::fs::remove_dir_all(&dir).unwrap();
        }

        #[tokio::test]
        async fn test_download_announced_size_over_limit_is_too_large() {
            let dir = test_dir("announced");
            let ytdlp = fake_ytdlp(&dir, "echo 60000000.0\nexit 0");
            let (tx, _rx) = progress::channel();

            match run(&ytdlp, &dir, &tx).await {
                Err(DownloadError::TooLarge { size, limit }) => {
                    assert_eq!(size, 60_000_000);
                    assert_eq!(limit, LIMIT);
                }
                other => panic!("expected TooLarge, got {:?}", other),
            }

            std::fs::remove_dir_all(&dir).unwrap();
        }

        #[tokio::test]
        async fn test_download_silent_exit_is_no_output() {
            let dir = test_dir("silent");
            let ytdlp = fake_ytdlp(&dir, "echo 1024\nexit 0");
            let (tx, _rx) = progress::channel();

            assert!(matches!(run(&ytdlp, &dir, &tx).await, Err(DownloadError::NoOutput)));

            std::fs::remove_dir_all(&dir).unwrap();
        }
    }

    #[test]
    fn test_info_defaults() {
        let info: MediaInfo = serde_json::from_str(r#"{"_filename": "x.mp4", "view_count": null}"#).unwrap();
        assert_eq!(info.title_or_default(), "Unknown Title");
        assert_eq!(info.path(), Some(Path::new("x.mp4")));
        assert_eq!(info.view_count, None);
    }
}
