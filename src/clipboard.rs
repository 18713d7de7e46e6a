use crate::error::{Error, Result};
use crate::process::CommandRunner;
use arboard::Clipboard;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Reads and writes clipboard text. One backend is chosen at startup.
pub trait ClipboardBackend {
    fn name(&self) -> &str;
    fn write_text(&self, text: &str) -> Result<()>;
    fn read_text(&self) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipboardKind {
    #[default]
    Auto,
    Windows,
    Macos,
    Xclip,
    /// In-process access through `arboard`, no external utility.
    Native,
}

impl ClipboardKind {
    /// Replace `Auto` with the utility native to the running platform.
    pub fn resolve(self) -> Self {
        match self {
            ClipboardKind::Auto => Self::detect(),
            other => other,
        }
    }

    pub fn detect() -> Self {
        match std::env::consts::OS {
            "windows" => ClipboardKind::Windows,
            "macos" => ClipboardKind::Macos,
            _ => ClipboardKind::Xclip,
        }
    }
}

pub fn select_backend<'a>(
    kind: ClipboardKind,
    runner: &'a dyn CommandRunner,
) -> Box<dyn ClipboardBackend + 'a> {
    let kind = kind.resolve();
    debug!(?kind, "Selected clipboard backend");
    match kind {
        ClipboardKind::Native => Box::new(NativeClipboard),
        ClipboardKind::Windows => Box::new(CommandClipboard::new(ClipboardTool::Windows, runner)),
        ClipboardKind::Macos => Box::new(CommandClipboard::new(ClipboardTool::Pasteboard, runner)),
        ClipboardKind::Xclip | ClipboardKind::Auto => {
            Box::new(CommandClipboard::new(ClipboardTool::Xclip, runner))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardTool {
    /// `clip` to write (UTF-16LE on stdin), PowerShell `Get-Clipboard` to read.
    Windows,
    /// `pbcopy` / `pbpaste`.
    Pasteboard,
    /// `xclip -selection clipboard`.
    Xclip,
}

impl ClipboardTool {
    fn write_command(self) -> (&'static str, Vec<String>) {
        match self {
            ClipboardTool::Windows => ("clip", Vec::new()),
            ClipboardTool::Pasteboard => ("pbcopy", Vec::new()),
            ClipboardTool::Xclip => ("xclip", strings(&["-selection", "clipboard"])),
        }
    }

    fn read_command(self) -> (&'static str, Vec<String>) {
        match self {
            ClipboardTool::Windows => (
                "powershell",
                strings(&[
                    "-NoProfile",
                    "-Command",
                    "[Console]::OutputEncoding = [Text.Encoding]::UTF8; Get-Clipboard -Raw",
                ]),
            ),
            ClipboardTool::Pasteboard => ("pbpaste", Vec::new()),
            ClipboardTool::Xclip => ("xclip", strings(&["-selection", "clipboard", "-o"])),
        }
    }

    fn encode(self, text: &str) -> Vec<u8> {
        match self {
            ClipboardTool::Windows => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
            ClipboardTool::Pasteboard | ClipboardTool::Xclip => text.as_bytes().to_vec(),
        }
    }

    fn decode(self, bytes: &[u8]) -> String {
        let text = String::from_utf8_lossy(bytes);
        match self {
            // PowerShell may prefix a BOM and always appends a newline.
            ClipboardTool::Windows => text
                .trim_start_matches('\u{feff}')
                .trim_end_matches(['\r', '\n'])
                .to_string(),
            ClipboardTool::Pasteboard | ClipboardTool::Xclip => text.into_owned(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Clipboard access through a platform utility run as a subprocess.
pub struct CommandClipboard<'a> {
    tool: ClipboardTool,
    runner: &'a dyn CommandRunner,
}

impl<'a> CommandClipboard<'a> {
    pub fn new(tool: ClipboardTool, runner: &'a dyn CommandRunner) -> Self {
        Self { tool, runner }
    }
}

impl ClipboardBackend for CommandClipboard<'_> {
    fn name(&self) -> &str {
        self.tool.write_command().0
    }

    fn write_text(&self, text: &str) -> Result<()> {
        let (program, args) = self.tool.write_command();
        let input = self.tool.encode(text);
        debug!(program, bytes = input.len(), "Writing clipboard");
        self.runner.run_with_stdin(program, &args, &input)
    }

    fn read_text(&self) -> Result<String> {
        let (program, args) = self.tool.read_command();
        let output = self.runner.run_captured(program, &args, None)?;
        debug!(program, bytes = output.len(), "Read clipboard");
        Ok(self.tool.decode(&output))
    }
}

/// In-process clipboard via `arboard`.
///
/// On Linux, clipboard contents only persist while the owning process runs,
/// so prefer `xclip` there when the bundle must outlive `clipin copy`.
pub struct NativeClipboard;

impl ClipboardBackend for NativeClipboard {
    fn name(&self) -> &str {
        "native"
    }

    fn write_text(&self, text: &str) -> Result<()> {
        let mut clipboard = Clipboard::new().map_err(native_error)?;
        clipboard.set_text(text).map_err(native_error)?;
        Ok(())
    }

    fn read_text(&self) -> Result<String> {
        let mut clipboard = Clipboard::new().map_err(native_error)?;
        clipboard.get_text().map_err(native_error)
    }
}

fn native_error(err: arboard::Error) -> Error {
    Error::Process {
        program: "native clipboard".to_string(),
        code: None,
        stderr: err.to_string(),
    }
}
