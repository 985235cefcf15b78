//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// One FFmpeg input with its preceding arguments.
#[derive(Debug, Clone)]
struct Input {
    /// Arguments placed before this input's `-i`
    args: Vec<String>,
    /// Input path, or a pipe spec such as `pipe:0`
    source: String,
}

/// Builder for FFmpeg invocations.
///
/// Supports multiple inputs (raw frame pipe plus audio file) and keeps the
/// argument order FFmpeg requires: global flags, per-input flags, inputs,
/// output flags, output path.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    inputs: Vec<Input>,
    output: PathBuf,
    global_args: Vec<String>,
    output_args: Vec<String>,
    overwrite: bool,
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new command writing to `output`.
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            inputs: Vec::new(),
            output: output.as_ref().to_path_buf(),
            global_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add arguments placed before all inputs (e.g. hwaccel hints).
    pub fn global_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.global_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add a file input with its preceding arguments.
    pub fn input<I, S>(mut self, args: I, path: impl AsRef<Path>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.push(Input {
            args: args.into_iter().map(Into::into).collect(),
            source: path.as_ref().to_string_lossy().to_string(),
        });
        self
    }

    /// Add a stdin pipe input with its preceding arguments.
    pub fn pipe_input<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.push(Input {
            args: args.into_iter().map(Into::into).collect(),
            source: "pipe:0".to_string(),
        });
        self
    }

    /// Add a single output argument.
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Build the full argument list.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-v".to_string());
        args.push(self.log_level.clone());
        args.push("-hide_banner".to_string());

        args.extend(self.global_args.clone());

        for input in &self.inputs {
            args.extend(input.args.clone());
            args.push("-i".to_string());
            args.push(input.source.clone());
        }

        args.extend(self.output_args.clone());
        args.push(self.output.to_string_lossy().to_string());

        args
    }

    /// Whether one of the inputs reads from stdin.
    #[cfg(test)]
    fn has_pipe_input(&self) -> bool {
        self.inputs.iter().any(|i| i.source == "pipe:0")
    }

    /// Run to completion with no stdin, capturing stderr.
    ///
    /// Only spawn/IO failures surface here; callers map a non-zero exit to
    /// their own error variant via the returned [`std::process::Output`].
    pub async fn output(&self) -> MediaResult<std::process::Output> {
        check_ffmpeg()?;

        let args = self.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let output = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        Ok(output)
    }

    /// Spawn with stdin piped for raw frame streaming.
    pub fn spawn_piped(&self) -> MediaResult<tokio::process::Child> {
        check_ffmpeg()?;

        let args = self.build_args();
        debug!("Spawning FFmpeg (piped): ffmpeg {}", args.join(" "));

        let child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        Ok(child)
    }
}

/// Check that FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check that FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_order() {
        let cmd = FfmpegCommand::new("out.mp4")
            .global_args(["-hwaccel", "cuda"])
            .pipe_input(["-f", "rawvideo", "-r", "15"])
            .input(Vec::<String>::new(), "audio.mp3")
            .output_args(["-c:v", "libx264"]);

        let args = cmd.build_args();
        let hwaccel = args.iter().position(|a| a == "-hwaccel").unwrap();
        let pipe = args.iter().position(|a| a == "pipe:0").unwrap();
        let audio = args.iter().position(|a| a == "audio.mp3").unwrap();
        let codec = args.iter().position(|a| a == "-c:v").unwrap();

        assert!(hwaccel < pipe);
        assert!(pipe < audio);
        assert!(audio < codec);
        assert_eq!(args.last().unwrap(), "out.mp4");
        assert!(cmd.has_pipe_input());
    }

    #[test]
    fn test_overwrite_flag_present() {
        let args = FfmpegCommand::new("out.mp4").build_args();
        assert_eq!(args[0], "-y");
        assert!(args.contains(&"-hide_banner".to_string()));
    }

    #[test]
    fn test_rawvideo_args_precede_their_input() {
        let cmd = FfmpegCommand::new("out.mp4").pipe_input(["-f", "rawvideo", "-pix_fmt", "rgb24"]);
        let args = cmd.build_args();
        let fmt = args.iter().position(|a| a == "rawvideo").unwrap();
        let pipe = args.iter().position(|a| a == "pipe:0").unwrap();
        assert!(fmt < pipe);
        assert_eq!(args[pipe - 1], "-i");
    }
}
