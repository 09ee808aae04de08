//! ffmpeg helpers

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Output path used for a remuxed copy of `input`
pub fn remux_target(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    input.with_file_name(format!("{}_fixed.mp4", stem))
}

/// Copy streams into a fresh mp4 container to repair duration/seek metadata
///
/// Returns the remuxed file, or `input` unchanged when ffmpeg is missing or fails.
pub async fn remux(program: &str, input: &Path) -> PathBuf {
    let output = remux_target(input);

    let status = Command::new(program)
        .arg("-y")
        .args(["-loglevel", "error", "-i"])
        .arg(input)
        .args(["-c", "copy", "-movflags", "+faststart"])
        .arg(&output)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .status()
        .await;

    match status {
        Ok(s) if s.success() && tokio::fs::try_exists(&output).await.unwrap_or(false) => {
            if let Err(e) = tokio::fs::remove_file(input).await {
                tracing::warn!("Failed to remove {}: {}", input.display(), e);
            }
            output
        }
        Ok(s) => {
            tracing::warn!("ffmpeg remux of {} exited with {}", input.display(), s);
            input.to_path_buf()
        }
        Err(e) => {
            tracing::warn!("Failed to start {}: {}", program, e);
            input.to_path_buf()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remux_target() {
        assert_eq!(
            remux_target(Path::new("temp/1_2/abc.mp4")),
            PathBuf::from("temp/1_2/abc_fixed.mp4")
        );
        assert_eq!(
            remux_target(Path::new("clip.webm")),
            PathBuf::from("clip_fixed.mp4")
        );
    }

    #[tokio::test]
    async fn test_remux_missing_binary_keeps_input() {
        let input = Path::new("does-not-matter.mp4");
        let result = remux("definitely-not-an-ffmpeg-binary", input).await;
        assert_eq!(result, input);
    }
}
