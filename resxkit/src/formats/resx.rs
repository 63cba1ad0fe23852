//! Support for `.resx` / `.resw` documents.
//!
//! String resources are `<data name=".." xml:space="preserve">` elements directly below
//! `<root>`, holding a required `<value>` and an optional `<comment>`. Data elements with
//! a `type` or `mimetype` attribute are binary/typed resources and are left alone.

use indoc::indoc;

use super::NodeSchema;

pub const SCHEMA: NodeSchema = NodeSchema {
    container: &[],
    item: "data",
    key_attribute: "name",
    value: "value",
    comment: "comment",
    value_required: true,
    typed_attributes: &["type", "mimetype"],
};

/// Written when a new culture file is created.
pub const EMPTY_DOCUMENT: &str = indoc! {r#"
    <?xml version="1.0" encoding="utf-8"?>
    <root>
      <resheader name="resmimetype">
        <value>text/microsoft-resx</value>
      </resheader>
      <resheader name="version">
        <value>2.0</value>
      </resheader>
      <resheader name="reader">
        <value>System.Resources.ResXResourceReader, System.Windows.Forms, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089</value>
      </resheader>
      <resheader name="writer">
        <value>System.Resources.ResXResourceWriter, System.Windows.Forms, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089</value>
      </resheader>
    </root>
"#};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::XmlDocument;

    #[test]
    fn test_empty_document_has_no_string_items() {
        let document = XmlDocument::parse(EMPTY_DOCUMENT).unwrap();
        let container = SCHEMA.container(&document).unwrap();
        assert!(container.is("root"));
        assert!(SCHEMA.item_positions(container).is_empty());
    }

    #[test]
    fn test_new_item_layout() {
        let item = SCHEMA.new_item("Greeting", "\n  ");
        assert_eq!(item.attribute("name").as_deref(), Some("Greeting"));
        assert_eq!(item.attribute("xml:space").as_deref(), Some("preserve"));
        assert_eq!(item.element("value").unwrap().text().unwrap(), "");
    }
}
