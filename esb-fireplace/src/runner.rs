//! Protocol runner.
//!
//! Spawns a solution, feeds it the puzzle input and judges its output. The
//! stdin writer and the stdout reader run concurrently with the wait for the
//! process so that neither pipe can fill up and deadlock the other.

use std::borrow::Cow;
use std::io;
use std::path::Path;
use std::process::Stdio;

use esb_core::protocol::MAX_OUTPUT_LINES;
use esb_core::{classify, ExecutionResult, InputSource, Invocation, Part};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Sink};
use tokio::process::{ChildStdin, ChildStdout, Command};

use crate::error::{FireplaceError, FireplaceResult};

/// Executes invocations, echoing excess output to `W`.
///
/// Output within the protocol's two lines is never echoed. Once a solution
/// writes a third line (usually debug prints) everything read so far is
/// flushed to the echo sink, and later lines are streamed as they arrive.
/// Echoing is best effort and never affects the result.
pub struct Runner<W = Sink> {
    echo: W,
}

impl Runner<Sink> {
    /// A runner that discards excess output.
    pub fn new() -> Self {
        Self {
            echo: tokio::io::sink(),
        }
    }
}

impl Default for Runner<Sink> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: AsyncWrite + Unpin + Send> Runner<W> {
    /// A runner that echoes excess output to `echo`.
    pub fn with_echo(echo: W) -> Self {
        Self { echo }
    }

    /// Get the echo sink back.
    pub fn into_echo(self) -> W {
        self.echo
    }

    /// Run one invocation to completion and judge it.
    ///
    /// There is no deadline. Dropping the returned future kills the child, so
    /// callers that need one can wrap the call in `tokio::time::timeout`.
    pub async fn exec(&mut self, invocation: &Invocation) -> FireplaceResult<ExecutionResult> {
        let Some(program) = invocation.command.first() else {
            return Err(FireplaceError::EmptyCommand);
        };

        let input: Cow<'_, [u8]> = match &invocation.input {
            InputSource::Text(text) => Cow::Borrowed(text.as_bytes()),
            InputSource::File(path) => {
                if !is_file(path).await {
                    tracing::warn!(path = %path.display(), "puzzle input not found");
                    return Ok(ExecutionResult::input_missing());
                }
                let data = tokio::fs::read(path)
                    .await
                    .map_err(|source| FireplaceError::ReadInput {
                        path: path.clone(),
                        source,
                    })?;
                Cow::Owned(data)
            }
        };

        let argv = invocation.command_line();
        let mut child = Command::new(program)
            .args(&argv[1..])
            .current_dir(&invocation.cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| FireplaceError::Spawn {
                program: program.clone(),
                source,
            })?;

        tracing::debug!(
            pid = ?child.id(),
            cmd = ?argv,
            cwd = %invocation.cwd.display(),
            input_bytes = input.len(),
            "solution spawned"
        );

        let stdin = child.stdin.take().ok_or(FireplaceError::MissingPipe("stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or(FireplaceError::MissingPipe("stdout"))?;

        let ((), output, status) = tokio::try_join!(
            write_input(stdin, &input),
            drain_output(stdout, &mut self.echo),
            async { child.wait().await.map_err(FireplaceError::Wait) },
        )?;

        let Ok(output) = String::from_utf8(output) else {
            tracing::info!("solution output is not valid UTF-8");
            return Ok(ExecutionResult::protocol_violation());
        };

        let result = classify(status.code(), &output);
        tracing::debug!(
            exit_code = ?status.code(),
            output_bytes = output.len(),
            status = %result.status(),
            "solution finished"
        );

        Ok(result)
    }
}

/// Run `command` on in-memory input text.
pub async fn exec_protocol(
    command: &[String],
    part: Part,
    args: Option<&[String]>,
    cwd: &Path,
    input_text: &str,
) -> FireplaceResult<ExecutionResult> {
    let mut invocation = Invocation::new(
        command.iter().cloned(),
        part,
        cwd,
        InputSource::Text(input_text.to_string()),
    );
    if let Some(args) = args {
        invocation = invocation.with_args(args.iter().cloned());
    }
    Runner::new().exec(&invocation).await
}

/// Run `command` on the contents of `input_path`.
///
/// Returns an `InputMissing` result without spawning anything when the file
/// does not exist.
pub async fn exec_protocol_from_file(
    command: &[String],
    part: Part,
    args: Option<&[String]>,
    cwd: &Path,
    input_path: &Path,
) -> FireplaceResult<ExecutionResult> {
    let mut invocation = Invocation::new(
        command.iter().cloned(),
        part,
        cwd,
        InputSource::File(input_path.to_path_buf()),
    );
    if let Some(args) = args {
        invocation = invocation.with_args(args.iter().cloned());
    }
    Runner::new().exec(&invocation).await
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

/// Write the whole input and close stdin so the child sees EOF.
async fn write_input(mut stdin: ChildStdin, input: &[u8]) -> FireplaceResult<()> {
    match stdin.write_all(input).await {
        Ok(()) => {}
        // The child is free to exit without reading its input
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            tracing::debug!("solution closed stdin before consuming the input");
            return Ok(());
        }
        Err(e) => return Err(FireplaceError::Stdin(e)),
    }
    drop(stdin);
    Ok(())
}

/// Read stdout to EOF, echoing lines past the protocol limit.
async fn drain_output<W: AsyncWrite + Unpin>(
    stdout: ChildStdout,
    echo: &mut W,
) -> FireplaceResult<Vec<u8>> {
    let mut reader = BufReader::new(stdout);
    let mut captured = Vec::new();
    let mut line = Vec::new();
    let mut lines = 0usize;
    let mut echoing = true;

    loop {
        line.clear();
        let n = reader
            .read_until(b'\n', &mut line)
            .await
            .map_err(FireplaceError::Stdout)?;
        if n == 0 {
            break;
        }
        captured.extend_from_slice(&line);
        lines += 1;

        let pending: &[u8] = if lines == MAX_OUTPUT_LINES + 1 {
            &captured
        } else if lines > MAX_OUTPUT_LINES + 1 {
            &line
        } else {
            continue;
        };
        if echoing {
            if let Err(e) = echo.write_all(pending).await {
                tracing::warn!("echo sink failed, output will no longer be echoed: {}", e);
                echoing = false;
            }
        }
    }

    if echoing && lines > MAX_OUTPUT_LINES {
        if let Err(e) = echo.flush().await {
            tracing::warn!("failed to flush echo sink: {}", e);
        }
    }

    Ok(captured)
}
