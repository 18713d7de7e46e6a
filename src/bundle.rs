//! Text bundle carrying wheel files through the clipboard.
//!
//! The wire format is line oriented:
//!
//! ```text
//! ===CLIPINSTALL_PACKAGE===
//! Package: requests==2.32.3
//! INCLUDE_DEPS: false
//! FILE: requests-2.32.3-py3-none-any.whl
//! SIZE: 64928
//! DATA: UEsDBBQAAAAIAK...
//! ---NEXT---
//! FILE: ...
//! ===END===
//! ```

use crate::error::{Error, Result};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use std::collections::HashSet;
use std::path::{Component, Path};
use tracing::{debug, warn};

pub const HEADER: &str = "===CLIPINSTALL_PACKAGE===";
pub const FOOTER: &str = "===END===";
pub const SEPARATOR: &str = "---NEXT---";

const PACKAGE_KEY: &str = "Package:";
const REQ_KEY: &str = "REQ:";
const INCLUDE_DEPS_KEY: &str = "INCLUDE_DEPS:";
const FILE_KEY: &str = "FILE:";
const SIZE_KEY: &str = "SIZE:";
const DATA_KEY: &str = "DATA:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub filename: String,
    /// Advisory length from the `SIZE:` line. Never enforced on decode.
    pub size: Option<u64>,
    pub data: Vec<u8>,
}

impl FileEntry {
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        let size = Some(data.len() as u64);
        Self {
            filename: filename.into(),
            size,
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bundle {
    pub package_spec: Option<String>,
    pub include_deps: bool,
    pub files: Vec<FileEntry>,
}

impl Bundle {
    pub fn new(package_spec: impl Into<String>, include_deps: bool) -> Self {
        Self {
            package_spec: Some(package_spec.into()),
            include_deps,
            files: Vec::new(),
        }
    }

    pub fn push_file(&mut self, filename: impl Into<String>, data: Vec<u8>) {
        self.files.push(FileEntry::new(filename, data));
    }

    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.data.len() as u64).sum()
    }

    /// Serialize into clipboard text. Entries keep their insertion order and
    /// the separator only sits between consecutive entries.
    pub fn encode(&self) -> String {
        let mut lines = vec![HEADER.to_string()];

        if let Some(spec) = &self.package_spec {
            lines.push(format!("{PACKAGE_KEY} {spec}"));
        }
        lines.push(format!("{INCLUDE_DEPS_KEY} {}", self.include_deps));

        for (idx, file) in self.files.iter().enumerate() {
            if idx > 0 {
                lines.push(SEPARATOR.to_string());
            }
            lines.push(format!("{FILE_KEY} {}", file.filename));
            lines.push(format!("{SIZE_KEY} {}", file.data.len()));
            lines.push(format!("{DATA_KEY} {}", BASE64.encode(&file.data)));
        }

        lines.push(FOOTER.to_string());
        lines.join("\n")
    }

    pub fn decode(text: &str) -> Result<Self> {
        let Some((_, body)) = text.split_once(HEADER) else {
            return Err(Error::format("missing header"));
        };
        let body = body.split_once(FOOTER).map_or(body, |(inner, _)| inner);

        let (package_spec, include_deps) = read_metadata(body);

        let mut files: Vec<FileEntry> = Vec::new();
        let mut seen = HashSet::new();
        for block in body.split(SEPARATOR) {
            if let Some(entry) = parse_block(block)? {
                if !seen.insert(entry.filename.clone()) {
                    return Err(Error::format(format!(
                        "duplicate file in bundle: {}",
                        entry.filename
                    )));
                }
                files.push(entry);
            }
        }

        if files.is_empty() {
            return Err(Error::format("no wheels found in clipboard data"));
        }

        Ok(Self {
            package_spec,
            include_deps,
            files,
        })
    }
}

fn value_after<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    line.strip_prefix(key).map(str::trim)
}

fn read_metadata(body: &str) -> (Option<String>, bool) {
    let mut package_spec = None;
    let mut include_deps = None;

    for line in body.lines().map(str::trim) {
        if package_spec.is_none() {
            let spec = value_after(line, PACKAGE_KEY).or_else(|| value_after(line, REQ_KEY));
            if let Some(spec) = spec {
                if !spec.is_empty() {
                    package_spec = Some(spec.to_string());
                }
                continue;
            }
        }
        if include_deps.is_none() {
            if let Some(flag) = value_after(line, INCLUDE_DEPS_KEY) {
                include_deps = Some(flag.eq_ignore_ascii_case("true"));
            }
        }
    }

    (package_spec, include_deps.unwrap_or(false))
}

fn parse_block(block: &str) -> Result<Option<FileEntry>> {
    let mut filename = None;
    let mut size = None;
    let mut payload = None;

    for line in block.lines().map(str::trim) {
        if let Some(value) = value_after(line, FILE_KEY) {
            filename = filename.or(Some(value));
        } else if let Some(value) = value_after(line, SIZE_KEY) {
            size = size.or_else(|| value.parse::<u64>().ok());
        } else if let Some(value) = value_after(line, DATA_KEY) {
            payload = payload.or(Some(value));
        }
    }

    let (Some(filename), Some(payload)) = (
        filename.filter(|f| !f.is_empty()),
        payload.filter(|p| !p.is_empty()),
    ) else {
        debug!(?filename, "Skipping incomplete bundle entry");
        return Ok(None);
    };

    validate_filename(filename)?;

    let data = BASE64
        .decode(payload)
        .map_err(|e| Error::format(format!("invalid base64 payload for {filename}: {e}")))?;

    if let Some(expected) = size {
        if expected != data.len() as u64 {
            warn!(
                filename,
                expected,
                actual = data.len(),
                "SIZE does not match decoded payload"
            );
        }
    }

    Ok(Some(FileEntry {
        filename: filename.to_string(),
        size,
        data,
    }))
}

/// A bare file name: one normal path component with no drive prefix.
fn validate_filename(filename: &str) -> Result<()> {
    let mut components = Path::new(filename).components();
    let single_normal = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single_normal || filename.contains(['/', '\\', ':', '\0']) {
        return Err(Error::format(format!(
            "file name must not contain path components: {filename}"
        )));
    }
    Ok(())
}
