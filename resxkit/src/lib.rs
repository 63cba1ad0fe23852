#![forbid(unsafe_code)]
//! Resource file toolkit for RESX, RESW and XLIFF string tables.
//!
//! Groups the culture variants of a resource file into one logical table, keeps the
//! table in sync with the files on disk, validates translations against the neutral
//! text and finds where keys are used in source code.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use resxkit::{Configuration, DefaultFileFilter, ProjectFile, ResourceContext, ResourceManager};
//!
//! let configuration = Configuration::default();
//! let filter = Arc::new(DefaultFileFilter::new(&configuration));
//! let mut manager = ResourceManager::new(ResourceContext::new(configuration), filter);
//!
//! manager.load(vec![
//!     ProjectFile::new("App/Resources.resx", "App", "Resources.resx"),
//!     ProjectFile::new("App/Resources.de.resx", "App", "Resources.de.resx"),
//! ]);
//! for entity in manager.entities() {
//!     for entry in entity.entries() {
//!         println!("{}: {:?}", entry.key(), entry.annotations(&"de".parse()?));
//!     }
//! }
//! manager.save()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Supported Formats
//!
//! - **`.resx`**: .NET resource files, one file per culture (`Resources.de.resx`)
//! - **`.resw`**: UWP resource files, one directory per culture (`de-DE/Resources.resw`)
//! - **`.xlf`**: XLIFF 1.2, translations in `<target>` elements
//!
//! Unedited parts of a document are written back byte for byte.

pub mod access;
pub mod changes;
pub mod code_reference;
pub mod comment;
pub mod configuration;
pub mod context;
pub mod culture;
pub mod entity;
pub mod entry;
pub mod error;
pub mod formats;
pub mod language;
pub mod manager;
pub mod project_file;
pub mod rules;
pub mod snapshot;
pub mod table;
pub mod xml;

// Re-export most used types for easy consumption
pub use crate::{
    access::{AllowAll, EditGate},
    changes::{ChangeBatcher, ResourceChange, Throttle},
    code_reference::{CodeReference, CodeReferenceResults, CodeReferenceTracker, ReferenceTarget},
    comment::{CommentMetadata, TranslationState},
    configuration::{
        CodeReferenceConfigItem, Configuration, DuplicateKeyHandling, SortingComparison,
    },
    context::ResourceContext,
    culture::CultureKey,
    entity::{EntityIdentity, ResourceEntity},
    entry::{EntryId, EntryView},
    error::Error,
    formats::ResourceFormat,
    language::ResourceLanguage,
    manager::{LoadBatch, LoadSummary, ResourceManager},
    project_file::{DefaultFileFilter, FileFilter, ProjectFile, TextEncoding},
    snapshot::Snapshot,
    table::{ImportSummary, export_table, export_to_string, import_table},
};
