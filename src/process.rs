use crate::error::{Error, Result};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::process::{Command, Output, Stdio};
use tracing::debug;

/// Launches external tools. Every call blocks until the child exits.
pub trait CommandRunner {
    /// Run with the terminal attached so the tool's own progress is visible.
    fn run(&self, program: &str, args: &[String]) -> Result<()>;

    /// Run with stdout captured, optionally feeding `stdin` to the child.
    fn run_captured(
        &self,
        program: &str,
        args: &[String],
        stdin: Option<&[u8]>,
    ) -> Result<Vec<u8>>;

    /// Feed `stdin` to the child and wait for it to exit, discarding stdout.
    ///
    /// Output is never piped: clipboard owners like `xclip` fork a background
    /// process that keeps inherited handles open after the parent exits.
    fn run_with_stdin(&self, program: &str, args: &[String], stdin: &[u8]) -> Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<()> {
        debug!(program, ?args, "Running command");
        let status = Command::new(program)
            .args(args)
            .status()
            .map_err(|source| spawn_error(program, source))?;

        if !status.success() {
            return Err(Error::Process {
                program: program.to_string(),
                code: status.code(),
                stderr: String::new(),
            });
        }
        Ok(())
    }

    fn run_captured(
        &self,
        program: &str,
        args: &[String],
        stdin: Option<&[u8]>,
    ) -> Result<Vec<u8>> {
        debug!(program, ?args, stdin_bytes = stdin.map(<[u8]>::len), "Running command");
        let mut child = Command::new(program)
            .args(args)
            .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| spawn_error(program, source))?;

        if let Some(input) = stdin {
            // Dropping the handle closes the pipe so the child sees EOF.
            if let Some(mut pipe) = child.stdin.take() {
                pipe.write_all(input).map_err(|source| spawn_error(program, source))?;
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|source| spawn_error(program, source))?;
        check_output(program, output)
    }

    fn run_with_stdin(&self, program: &str, args: &[String], stdin: &[u8]) -> Result<()> {
        debug!(program, ?args, stdin_bytes = stdin.len(), "Running command");
        let mut stderr_file = tempfile::tempfile().map_err(|source| spawn_error(program, source))?;
        let stderr_handle = stderr_file
            .try_clone()
            .map_err(|source| spawn_error(program, source))?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr_handle))
            .spawn()
            .map_err(|source| spawn_error(program, source))?;

        if let Some(mut pipe) = child.stdin.take() {
            pipe.write_all(stdin).map_err(|source| spawn_error(program, source))?;
        }

        let status = child.wait().map_err(|source| spawn_error(program, source))?;
        if !status.success() {
            return Err(Error::Process {
                program: program.to_string(),
                code: status.code(),
                stderr: read_stderr(&mut stderr_file),
            });
        }
        Ok(())
    }
}

fn read_stderr(file: &mut File) -> String {
    let mut stderr = String::new();
    if file.seek(SeekFrom::Start(0)).is_ok() {
        let mut bytes = Vec::new();
        if file.read_to_end(&mut bytes).is_ok() {
            stderr = String::from_utf8_lossy(&bytes).trim().to_string();
        }
    }
    stderr
}

fn spawn_error(program: &str, source: std::io::Error) -> Error {
    Error::Spawn {
        program: program.to_string(),
        source,
    }
}

fn check_output(program: &str, output: Output) -> Result<Vec<u8>> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Process {
            program: program.to_string(),
            code: output.status.code(),
            stderr: stderr.trim().to_string(),
        });
    }
    Ok(output.stdout)
}
