//! Tab separated export and import of the entry table.
//!
//! The first row is a header: `Project`, `File`, `Key`, then a `Value` and a `Comment`
//! column per culture (`Value.de`, `Comment.de`, ...; the neutral culture has no
//! suffix). `File` is the entity directory and base name joined with `/`.
//!
//! Comments are exported without their metadata tokens and imported through
//! [`ResourceEntity::set_comment`], so tokens already stored in the file survive.

use std::{
    collections::BTreeMap,
    io::{Read, Write},
};

use tracing::{debug, warn};

use crate::{
    culture::CultureKey,
    entity::{EntityIdentity, ResourceEntity},
    error::Error,
    manager::ResourceManager,
};

const PROJECT: &str = "Project";
const FILE: &str = "File";
const KEY: &str = "Key";
const VALUE: &str = "Value";
const COMMENT: &str = "Comment";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Value,
    Comment,
}

fn column_name(kind: Column, culture: &CultureKey) -> String {
    let prefix = match kind {
        Column::Value => VALUE,
        Column::Comment => COMMENT,
    };
    match culture {
        CultureKey::Neutral => prefix.to_string(),
        culture => format!("{}.{}", prefix, culture.tag()),
    }
}

fn parse_column(name: &str) -> Option<Result<(Column, CultureKey), Error>> {
    let (kind, rest) = if let Some(rest) = name.strip_prefix(VALUE) {
        (Column::Value, rest)
    } else if let Some(rest) = name.strip_prefix(COMMENT) {
        (Column::Comment, rest)
    } else {
        return None;
    };
    match rest {
        "" => Some(Ok((kind, CultureKey::Neutral))),
        rest => {
            let tag = rest.strip_prefix('.')?;
            Some(CultureKey::parse(tag).map(|culture| (kind, culture)))
        }
    }
}

fn file_column(entity: &ResourceEntity) -> String {
    match entity.directory_name() {
        "" => entity.base_name().to_string(),
        directory => format!("{}/{}", directory, entity.base_name()),
    }
}

fn identity_from_columns(project: &str, file: &str) -> EntityIdentity {
    match file.rsplit_once('/') {
        Some((directory, base)) => EntityIdentity::new(project, base, directory),
        None => EntityIdentity::new(project, file, ""),
    }
}

/// Writes every entry of `entities` for the given cultures.
pub fn export_table<'a, W: Write>(
    entities: impl IntoIterator<Item = &'a ResourceEntity>,
    cultures: &[CultureKey],
    writer: W,
) -> Result<(), Error> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(writer);

    let mut header = vec![PROJECT.to_string(), FILE.to_string(), KEY.to_string()];
    for culture in cultures {
        header.push(column_name(Column::Value, culture));
        header.push(column_name(Column::Comment, culture));
    }
    wtr.write_record(&header).map_err(Error::CsvParse)?;

    for entity in entities {
        let file = file_column(entity);
        for entry in entity.entries() {
            let mut row = vec![
                entity.project_name().to_string(),
                file.clone(),
                entry.key().to_string(),
            ];
            for culture in cultures {
                row.push(entry.value(culture).unwrap_or_default().to_string());
                row.push(entry.comment(culture).unwrap_or_default().to_string());
            }
            wtr.write_record(&row).map_err(Error::CsvParse)?;
        }
    }

    wtr.flush().map_err(Error::Io)?;
    Ok(())
}

/// Exports every entity of `manager` for all of its cultures.
pub fn export_to_string(manager: &ResourceManager) -> Result<String, Error> {
    let cultures: Vec<CultureKey> = manager.cultures().into_iter().collect();
    let mut buffer = Vec::new();
    export_table(manager.entities(), &cultures, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| Error::DataMismatch(e.to_string()))
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub rows: usize,
    pub added_keys: usize,
    pub changed_cells: usize,
    pub skipped_rows: usize,
}

/// Applies a table to the loaded entities.
///
/// Unknown entities and cultures the entity does not have are skipped. Missing keys are
/// added. Stops at the first rejected edit.
pub fn import_table<R: Read>(manager: &mut ResourceManager, reader: R) -> Result<ImportSummary, Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(reader);
    let mut records = rdr.records();

    let Some(header) = records.next() else {
        return Ok(ImportSummary::default());
    };
    let header = header.map_err(Error::CsvParse)?;
    let position = |name: &str| header.iter().position(|h| h == name);
    let (Some(project_index), Some(file_index), Some(key_index)) =
        (position(PROJECT), position(FILE), position(KEY))
    else {
        return Err(Error::DataMismatch(format!(
            "table header must contain `{}`, `{}` and `{}` columns",
            PROJECT, FILE, KEY
        )));
    };

    let mut columns: BTreeMap<usize, (Column, CultureKey)> = BTreeMap::new();
    for (index, name) in header.iter().enumerate() {
        match parse_column(name) {
            Some(Ok(column)) => {
                columns.insert(index, column);
            }
            Some(Err(e)) => warn!("ignoring column `{}`: {}", name, e),
            None => {}
        }
    }

    let mut summary = ImportSummary::default();
    for record in records {
        let record = record.map_err(Error::CsvParse)?;
        summary.rows += 1;
        let cell = |index: usize| record.get(index).unwrap_or_default();

        let identity = identity_from_columns(cell(project_index), cell(file_index));
        let Some(entity) = manager.entity_mut(&identity) else {
            warn!("no resource `{}` for row {}", identity, summary.rows);
            summary.skipped_rows += 1;
            continue;
        };
        let key = cell(key_index);
        let id = match entity.entry_by_key(key) {
            Some(entry) => entry.id(),
            None => match entity.add(key)? {
                Some(id) => {
                    summary.added_keys += 1;
                    id
                }
                None => {
                    summary.skipped_rows += 1;
                    continue;
                }
            },
        };

        for (&index, (kind, culture)) in &columns {
            let Some(text) = record.get(index) else {
                continue;
            };
            if entity.language(culture).is_none() {
                debug!("{} has no `{}` language", identity, culture.display_name());
                continue;
            }
            let changed = match kind {
                Column::Value => entity.set_value(id, culture, Some(text))?,
                Column::Comment => entity.set_comment(id, culture, text)?,
            };
            if changed {
                summary.changed_cells += 1;
            }
        }
    }
    Ok(summary)
}
