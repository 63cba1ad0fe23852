//! Physical files handed to the engine by the file discovery collaborator.

use std::{
    fs,
    hash::{Hash, Hasher},
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};
use regex::Regex;
use tracing::warn;

use crate::{configuration::Configuration, error::Error, formats::ResourceFormat};

/// One file of a project: where it is, which project it belongs to, and how to read it.
#[derive(Debug, Clone)]
pub struct ProjectFile {
    file_path: PathBuf,
    project_name: String,
    relative_path: String,
    is_winforms_designer_resource: bool,
}

impl PartialEq for ProjectFile {
    fn eq(&self, other: &Self) -> bool {
        self.file_path == other.file_path
    }
}

impl Eq for ProjectFile {}

impl Hash for ProjectFile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.file_path.hash(state);
    }
}

impl ProjectFile {
    pub fn new(
        file_path: impl Into<PathBuf>,
        project_name: impl Into<String>,
        relative_path: impl Into<String>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            project_name: project_name.into(),
            relative_path: relative_path.into(),
            is_winforms_designer_resource: false,
        }
    }

    /// Marks the file as owned by the WinForms designer, which regenerates it and drops comments.
    pub fn with_winforms_designer_resource(mut self, value: bool) -> Self {
        self.is_winforms_designer_resource = value;
        self
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    /// Lower-case extension including the leading dot, e.g. `.cs`.
    pub fn extension(&self) -> String {
        self.file_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_ascii_lowercase()))
            .unwrap_or_default()
    }

    pub fn format(&self) -> Option<ResourceFormat> {
        ResourceFormat::from_path(&self.file_path)
    }

    pub fn is_resource_file(&self) -> bool {
        self.format().is_some()
    }

    /// Generated code files such as `Resources.Designer.cs`.
    pub fn is_designer_file(&self) -> bool {
        self.file_path
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|s| s.to_ascii_lowercase().ends_with(".designer"))
    }

    pub fn is_winforms_designer_resource(&self) -> bool {
        self.is_winforms_designer_resource
    }

    pub fn exists(&self) -> bool {
        self.file_path.is_file()
    }

    /// Reads the whole file, detecting a UTF-8/UTF-16 byte order mark.
    pub fn read_text(&self) -> Result<FileText, Error> {
        let bytes = fs::read(&self.file_path)?;
        Ok(FileText::decode(&bytes))
    }

    /// Writes `text` back in the encoding it was read with.
    pub fn write_text(&self, text: &str, encoding: TextEncoding) -> std::io::Result<()> {
        if let Some(parent) = self.file_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.file_path, encoding.encode(text))
    }

    /// Reads the file line by line with BOM-aware decoding.
    ///
    /// Without a BOM the bytes are decoded as UTF-8, replacing invalid sequences.
    pub fn read_lines(&self) -> Result<Vec<String>, Error> {
        let file = fs::File::open(&self.file_path)?;
        let decoder = encoding_rs_io::DecodeReaderBytesBuilder::new()
            .encoding(Some(UTF_8))
            .bom_override(true)
            .build(file);
        BufReader::new(decoder)
            .lines()
            .collect::<Result<Vec<_>, _>>()
            .map_err(Error::Io)
    }
}

/// Byte-level encoding of a text file, preserved across load and save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Utf8Bom,
    Utf16Le,
    Utf16Be,
}

impl TextEncoding {
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            TextEncoding::Utf8 => text.as_bytes().to_vec(),
            TextEncoding::Utf8Bom => {
                let mut bytes = vec![0xEF, 0xBB, 0xBF];
                bytes.extend_from_slice(text.as_bytes());
                bytes
            }
            TextEncoding::Utf16Le => {
                let mut bytes = vec![0xFF, 0xFE];
                bytes.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
                bytes
            }
            TextEncoding::Utf16Be => {
                let mut bytes = vec![0xFE, 0xFF];
                bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
                bytes
            }
        }
    }
}

/// Decoded file content plus the encoding it came in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileText {
    pub text: String,
    pub encoding: TextEncoding,
}

impl FileText {
    pub fn decode(bytes: &[u8]) -> Self {
        let (encoding, bom_length) = match Encoding::for_bom(bytes) {
            Some((encoding, length)) => (encoding, length),
            None => (UTF_8, 0),
        };
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_length..]);
        let encoding = if encoding == UTF_16LE {
            TextEncoding::Utf16Le
        } else if encoding == UTF_16BE {
            TextEncoding::Utf16Be
        } else if bom_length > 0 {
            TextEncoding::Utf8Bom
        } else {
            TextEncoding::Utf8
        };
        FileText {
            text: text.into_owned(),
            encoding,
        }
    }
}

/// Decides which files are scanned for code references and which are loaded at all.
pub trait FileFilter: Send + Sync {
    fn is_source_file(&self, file: &ProjectFile) -> bool;
    fn include_file(&self, file: &ProjectFile) -> bool;
}

/// Excludes resource and generated files from scanning, and anything whose
/// project-relative path matches the configured exclusion pattern.
#[derive(Debug, Clone, Default)]
pub struct DefaultFileFilter {
    exclusion: Option<Regex>,
}

impl DefaultFileFilter {
    pub fn new(configuration: &Configuration) -> Self {
        let exclusion = configuration
            .file_exclusion_filter
            .as_deref()
            .filter(|pattern| !pattern.trim().is_empty())
            .and_then(|pattern| match Regex::new(pattern) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    warn!("ignoring invalid file exclusion filter `{}`: {}", pattern, e);
                    None
                }
            });
        Self { exclusion }
    }
}

impl FileFilter for DefaultFileFilter {
    fn is_source_file(&self, file: &ProjectFile) -> bool {
        !file.is_resource_file() && !file.is_designer_file()
    }

    fn include_file(&self, file: &ProjectFile) -> bool {
        match &self.exclusion {
            Some(regex) => !regex.is_match(&file.relative_path().replace('\\', "/")),
            None => true,
        }
    }
}
