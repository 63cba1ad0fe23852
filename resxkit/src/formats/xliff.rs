//! Support for XLIFF 1.2 documents.
//!
//! Units are `<trans-unit id="..">` elements under `xliff/file/body`. The neutral file
//! keeps its text in `<source>`, culture files in `<target>`; comments live in `<note>`.
//! Nested `<group>` elements are not indexed.

use indoc::formatdoc;

use super::NodeSchema;
use crate::culture::CultureKey;

pub const SOURCE_SCHEMA: NodeSchema = NodeSchema {
    container: &["file", "body"],
    item: "trans-unit",
    key_attribute: "id",
    value: "source",
    comment: "note",
    value_required: false,
    typed_attributes: &[],
};

pub const TARGET_SCHEMA: NodeSchema = NodeSchema {
    value: "target",
    ..SOURCE_SCHEMA
};

pub fn empty_document(culture: &CultureKey, source_language: &str) -> String {
    let target = match culture {
        CultureKey::Neutral => String::new(),
        CultureKey::Specific(id) => format!(" target-language=\"{}\"", id),
    };
    formatdoc! {r#"
        <?xml version="1.0" encoding="utf-8"?>
        <xliff version="1.2" xmlns="urn:oasis:names:tc:xliff:document:1.2">
          <file datatype="xml" source-language="{source_language}"{target} original="resources">
            <body>
            </body>
          </file>
        </xliff>
    "#}
}
