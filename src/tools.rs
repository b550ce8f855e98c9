//! Wrappers around the two external binaries a job may run.
//!
//! - `vgmstream` decodes game audio (HCA/ADX) to WAV on stdout.
//! - `ffmpeg` transcodes anything to the configured web format.
//!
//! Both calls are blocking. A non-zero exit becomes `Error::ToolFailure` with the tool's
//! stderr attached, so the scheduler can log it verbatim.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tracing::debug;

use crate::category::Category;
use crate::config::Config;
use crate::scratch::ScratchDir;
use crate::wav::inspect_wav;
use crate::{Error, Result};

/// Something a tool reads: a file on disk or an in-memory buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaInput {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// Borrowed decoder input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaRef<'a> {
    Path(&'a Path),
    Bytes(&'a [u8]),
}

/// One element of ffmpeg's input argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputArg {
    /// Passed through verbatim (`-i`, `-f`, ...).
    Flag(String),
    /// A file or buffer. Buffers are piped on stdin and appear as `-`.
    Media(MediaInput),
}

impl InputArg {
    pub fn flag(flag: impl Into<String>) -> Self {
        Self::Flag(flag.into())
    }

    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Media(MediaInput::Path(path.into()))
    }

    pub fn bytes(bytes: Vec<u8>) -> Self {
        Self::Media(MediaInput::Bytes(bytes))
    }
}

/// How to encode one category's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSpec {
    /// Extension including the leading dot.
    pub extension: String,
    pub extra_args: Vec<String>,
}

impl OutputSpec {
    pub fn for_category(config: &Config, category: Category) -> Self {
        Self {
            extension: config.extension_for(category).to_owned(),
            extra_args: config.extra_args_for(category).to_vec(),
        }
    }

    /// `base` with its extension replaced by ours. Idempotent.
    pub fn output_path(&self, base: &Path) -> PathBuf {
        base.with_extension(self.extension.trim_start_matches('.'))
    }
}

/// The external tools plus the scratch space they share.
#[derive(Debug, Clone)]
pub struct Toolchain {
    vgmstream: PathBuf,
    ffmpeg: PathBuf,
    scratch: ScratchDir,
}

impl Toolchain {
    pub fn new(
        vgmstream: impl Into<PathBuf>,
        ffmpeg: impl Into<PathBuf>,
        scratch: ScratchDir,
    ) -> Self {
        Self {
            vgmstream: vgmstream.into(),
            ffmpeg: ffmpeg.into(),
            scratch,
        }
    }

    pub fn from_config(config: &Config, scratch: ScratchDir) -> Self {
        Self::new(&config.vgmstream_path, &config.ffmpeg_path, scratch)
    }

    pub fn scratch(&self) -> &ScratchDir {
        &self.scratch
    }

    /// Decode game audio to WAV bytes.
    ///
    /// A buffer input is staged in a scratch `.hca` file, which is gone by the time we return.
    pub fn decode_to_pcm(&self, input: MediaRef<'_>) -> Result<Vec<u8>> {
        let staged;
        let path = match input {
            MediaRef::Path(path) => path,
            MediaRef::Bytes(bytes) => {
                let mut tmp = self.scratch.file(".hca")?;
                tmp.write_all(bytes)
                    .and_then(|()| tmp.flush())
                    .map_err(|e| Error::io(tmp.path(), e))?;
                staged = tmp;
                staged.path()
            }
        };

        let mut cmd = Command::new(&self.vgmstream);
        cmd.arg("-p").arg(path);
        let output = run(cmd, "vgmstream", None)?;

        let info = inspect_wav(&output.stdout).map_err(|e| Error::ToolFailure {
            tool: "vgmstream".to_owned(),
            status: output.status.to_string(),
            stderr: format!("{e:#}"),
        })?;
        debug!(
            input = %path.display(),
            channels = info.spec.channels,
            sample_rate = info.spec.sample_rate,
            seconds = info.seconds(),
            "decoded to pcm"
        );

        Ok(output.stdout)
    }

    /// Run ffmpeg over `inputs`, writing `output` (extension taken from `spec`).
    ///
    /// At most one `MediaInput::Bytes` may appear: stdin is the only pipe we feed.
    pub fn transcode(&self, inputs: Vec<InputArg>, spec: &OutputSpec, output: &Path) -> Result<()> {
        let buffers = inputs
            .iter()
            .filter(|arg| matches!(arg, InputArg::Media(MediaInput::Bytes(_))))
            .count();
        if buffers > 1 {
            return Err(Error::Usage(format!(
                "{buffers} in-memory buffers passed to ffmpeg; at most one is supported"
            )));
        }

        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-y", "-hide_banner", "-loglevel", "error"]);

        let mut stdin = None;
        for arg in inputs {
            match arg {
                InputArg::Flag(flag) => {
                    cmd.arg(flag);
                }
                InputArg::Media(MediaInput::Path(path)) => {
                    cmd.arg(path);
                }
                InputArg::Media(MediaInput::Bytes(bytes)) => {
                    cmd.arg("-");
                    stdin = Some(bytes);
                }
            }
        }

        cmd.args(&spec.extra_args).arg(spec.output_path(output));
        run(cmd, "ffmpeg", stdin)?;
        Ok(())
    }
}

/// Spawn `cmd`, optionally feeding `stdin`, and collect its output.
fn run(mut cmd: Command, tool: &str, stdin: Option<Vec<u8>>) -> Result<Output> {
    debug!(tool, command = ?cmd, "running external tool");

    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    cmd.stdin(if stdin.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    });

    let spawn_err = |e: io::Error| Error::ToolFailure {
        tool: tool.to_owned(),
        status: "failed to start".to_owned(),
        stderr: e.to_string(),
    };
    let mut child = cmd.spawn().map_err(spawn_err)?;

    let output = match (stdin, child.stdin.take()) {
        (Some(bytes), Some(mut pipe)) => std::thread::scope(|s| {
            // Feed stdin from a second thread so a chatty child can't deadlock us on
            // a full stdout/stderr pipe.
            let writer = s.spawn(move || pipe.write_all(&bytes));
            let output = child.wait_with_output();
            match writer.join() {
                // The child may legitimately stop reading early; its exit status decides.
                Ok(Err(e)) if e.kind() != io::ErrorKind::BrokenPipe => {
                    debug!(tool, error = %e, "stdin write failed")
                }
                Err(_) => debug!(tool, "stdin writer panicked"),
                _ => {}
            }
            output
        }),
        _ => child.wait_with_output(),
    }
    .map_err(spawn_err)?;

    if !output.status.success() {
        return Err(Error::ToolFailure {
            tool: tool.to_owned(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_owned(),
        });
    }

    Ok(output)
}
