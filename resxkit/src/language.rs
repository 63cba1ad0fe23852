//! One physical resource document (one culture) of an entity.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use tracing::{debug, warn};

use crate::{
    configuration::{DuplicateKeyHandling, SortingComparison},
    context::ResourceContext,
    culture::CultureKey,
    entity::EntityIdentity,
    error::Error,
    formats::{NodeSchema, ResourceFormat},
    project_file::{FileText, ProjectFile, TextEncoding},
    xml::{XmlDocument, XmlElement, XmlNode},
};

/// Keys starting with this prefix belong to the forms designer and are not entries.
const DESIGNER_KEY_PREFIX: &str = ">>";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Node {
    text: Option<String>,
    comment: Option<String>,
}

impl Node {
    fn is_empty(&self) -> bool {
        self.text.as_deref().unwrap_or("").is_empty()
            && self.comment.as_deref().unwrap_or("").is_empty()
    }
}

/// Key/value/comment view of one document with node-level editing.
#[derive(Debug)]
pub struct ResourceLanguage {
    file: ProjectFile,
    culture: CultureKey,
    format: ResourceFormat,
    schema: NodeSchema,
    entity: EntityIdentity,
    context: ResourceContext,
    document: XmlDocument,
    keys: Vec<String>,
    nodes: HashMap<String, Node>,
    file_content: String,
    encoding: TextEncoding,
    dirty: bool,
    is_saving: Arc<AtomicBool>,
}

impl ResourceLanguage {
    /// Reads and parses `file`.
    pub fn load(
        file: ProjectFile,
        culture: CultureKey,
        entity: EntityIdentity,
        context: &ResourceContext,
    ) -> Result<Self, Error> {
        let text = file
            .read_text()
            .map_err(|e| Error::load(file.file_path(), e.to_string()))?;
        Self::from_content(file, culture, entity, text, context)
    }

    /// Builds a language from already decoded file content.
    pub fn from_content(
        file: ProjectFile,
        culture: CultureKey,
        entity: EntityIdentity,
        content: FileText,
        context: &ResourceContext,
    ) -> Result<Self, Error> {
        let path = file.file_path().to_path_buf();
        let format = file
            .format()
            .ok_or_else(|| Error::load(&path, "not a resource file"))?;
        let schema = format.schema(&culture);

        let mut document =
            XmlDocument::parse(&content.text).map_err(|e| Error::load(&path, e.to_string()))?;
        if document.root().is_none() {
            return Err(Error::load(&path, "missing root element"));
        }
        let renamed = resolve_duplicate_keys(&mut document, &schema, context, &path)?;
        let (keys, nodes) = index_nodes(&document, &schema).map_err(|message| Error::load(&path, message))?;

        debug!(
            "loaded {} ({} keys, culture `{}`)",
            path.display(),
            keys.len(),
            culture.display_name()
        );

        Ok(Self {
            file,
            culture,
            format,
            schema,
            entity,
            context: context.clone(),
            document,
            keys,
            nodes,
            file_content: content.text,
            encoding: content.encoding,
            dirty: renamed,
            is_saving: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn file(&self) -> &ProjectFile {
        &self.file
    }

    pub fn culture(&self) -> &CultureKey {
        &self.culture
    }

    pub fn format(&self) -> ResourceFormat {
        self.format
    }

    /// Keys in document order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.nodes.get(key)?.text.as_deref()
    }

    pub fn comment(&self, key: &str) -> Option<&str> {
        self.nodes.get(key)?.comment.as_deref()
    }

    /// Content as last read from or written to disk.
    pub fn file_content(&self) -> &str {
        &self.file_content
    }

    pub fn has_changes(&self) -> bool {
        self.dirty
    }

    pub fn is_saving(&self) -> bool {
        self.is_saving.load(Ordering::SeqCst)
    }

    /// Flag raised while [`save`](Self::save) writes, for file watchers to ignore the write.
    pub fn saving_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.is_saving)
    }

    /// True if both were read from the same file with the same content.
    pub fn is_same_content(&self, other: &ResourceLanguage) -> bool {
        self.file.file_path() == other.file.file_path() && self.file_content == other.file_content
    }

    pub fn can_edit(&self) -> bool {
        self.context.can_edit(&self.entity, &self.culture)
    }

    fn ensure_editable(&self) -> Result<(), Error> {
        if self.can_edit() {
            Ok(())
        } else {
            Err(Error::EditRejected {
                entity: self.entity.to_string(),
                culture: self.culture.display_name(),
            })
        }
    }

    /// Sets the text of `key`, creating the node when needed.
    ///
    /// Returns `false` without touching anything when the value is unchanged.
    pub fn set_value(&mut self, key: &str, value: Option<&str>) -> Result<bool, Error> {
        let current = self.nodes.get(key).cloned();
        let unchanged = match (&current, value) {
            (None, None) => true,
            (None, Some(_)) => false,
            (Some(node), None) => node.text.as_deref().unwrap_or("").is_empty(),
            (Some(node), Some(value)) => node.text.as_deref() == Some(value),
        };
        if unchanged {
            return Ok(false);
        }
        self.ensure_editable()?;

        let node = Node {
            text: Some(value.unwrap_or_default().to_string()),
            comment: current.and_then(|n| n.comment),
        };
        self.write_node(key, node)
    }

    /// Sets the raw comment of `key`; an empty comment removes the comment element.
    pub fn set_comment(&mut self, key: &str, comment: Option<&str>) -> Result<bool, Error> {
        let comment = comment.filter(|c| !c.is_empty());
        if self.comment(key) == comment {
            return Ok(false);
        }
        let current = self.nodes.get(key).cloned();
        if current.is_none() && comment.is_none() {
            return Ok(false);
        }
        self.ensure_editable()?;

        let node = Node {
            text: current.and_then(|n| n.text),
            comment: comment.map(str::to_string),
        };
        self.write_node(key, node)
    }

    /// Brings the document in line with `node`, touching only the children that differ.
    fn write_node(&mut self, key: &str, mut node: Node) -> Result<bool, Error> {
        let previous = self.nodes.get(key).cloned();
        let remove_empty = !self.culture.is_neutral()
            && self.context.configuration().remove_empty_entries
            && node.is_empty();

        if remove_empty {
            if previous.is_none() {
                return Ok(false);
            }
            self.delete_node(key)?;
            return Ok(true);
        }

        let schema = self.schema;
        let container = self.container_mut()?;
        let (position, previous) = match (schema.find_item(container, key), previous) {
            (Some(position), previous) => (position, previous.unwrap_or_default()),
            (None, _) => {
                let indent = item_indent(container, &schema);
                container.append_element(schema.new_item(key, &indent), &indent);
                let position = schema
                    .find_item(container, key)
                    .ok_or_else(|| Error::DataMismatch(format!("failed to insert `{}`", key)))?;
                node.text.get_or_insert_with(String::new);
                let fresh = Node {
                    text: Some(String::new()),
                    comment: None,
                };
                (position, fresh)
            }
        };

        let node_indent = container.indentation_of(position).unwrap_or("\n").to_string();
        let child_indent = format!("{}  ", node_indent);
        let Some(item) = container.children_mut()[position].as_element_mut() else {
            return Err(Error::DataMismatch(format!("`{}` is not an element", key)));
        };

        if node.text != previous.text {
            match &node.text {
                Some(text) => set_child_text(item, schema.value, text, &child_indent, Some("source")),
                None => {
                    item.remove_element(schema.value);
                }
            }
        }
        if node.comment != previous.comment {
            match &node.comment {
                Some(comment) => set_child_text(item, schema.comment, comment, &child_indent, None),
                None => {
                    item.remove_element(schema.comment);
                }
            }
        }

        if !self.nodes.contains_key(key) {
            self.keys.push(key.to_string());
        }
        self.nodes.insert(key.to_string(), node);
        self.dirty = true;
        Ok(true)
    }

    /// Renames a key. `Ok(false)` if `old` is missing or `new` already exists.
    pub fn rename_key(&mut self, old: &str, new: &str) -> Result<bool, Error> {
        self.ensure_editable()?;
        if !self.nodes.contains_key(old) || self.nodes.contains_key(new) {
            return Ok(false);
        }
        let schema = self.schema;
        let container = self.container_mut()?;
        let Some(position) = schema.find_item(container, old) else {
            return Ok(false);
        };
        if let Some(item) = container.children_mut()[position].as_element_mut() {
            item.set_attribute(schema.key_attribute, new);
        }

        if let Some(node) = self.nodes.remove(old) {
            self.nodes.insert(new.to_string(), node);
        }
        for key in self.keys.iter_mut().filter(|k| *k == old) {
            *key = new.to_string();
        }
        self.dirty = true;
        Ok(true)
    }

    /// Deletes the node backing `key`.
    pub fn remove_key(&mut self, key: &str) -> Result<bool, Error> {
        if !self.nodes.contains_key(key) {
            return Ok(false);
        }
        self.ensure_editable()?;
        self.delete_node(key)?;
        Ok(true)
    }

    fn delete_node(&mut self, key: &str) -> Result<(), Error> {
        let schema = self.schema;
        let container = self.container_mut()?;
        if let Some(position) = schema.find_item(container, key) {
            container.remove_child_with_indent(position);
        }
        self.nodes.remove(key);
        self.keys.retain(|k| k != key);
        self.dirty = true;
        Ok(())
    }

    /// Reorders the string nodes by key within the slots they occupy.
    pub fn sort_nodes(&mut self, comparison: SortingComparison) -> Result<bool, Error> {
        if comparison == SortingComparison::None {
            return Ok(false);
        }
        let schema = self.schema;
        let container = self.container()?;
        let positions = schema.item_positions(container);
        let mut items: Vec<(String, XmlElement)> = positions
            .iter()
            .filter_map(|&p| container.children()[p].as_element())
            .map(|e| (schema.key_of(e).unwrap_or_default(), e.clone()))
            .collect();
        let before: Vec<String> = items.iter().map(|(k, _)| k.clone()).collect();
        items.sort_by(|(a, _), (b, _)| comparison.compare(a, b));
        if items.iter().map(|(k, _)| k).eq(before.iter()) {
            return Ok(false);
        }
        self.ensure_editable()?;

        let container = self.container_mut()?;
        let children = container.children_mut();
        for (&position, (_, item)) in positions.iter().zip(items) {
            children[position] = XmlNode::Element(item);
        }
        self.rebuild_key_order()?;
        self.dirty = true;
        Ok(true)
    }

    /// Moves the node of `key` right after the node of `after`, or in front of all
    /// string nodes when `after` is `None`.
    pub fn move_node_after(&mut self, key: &str, after: Option<&str>) -> Result<bool, Error> {
        if !self.nodes.contains_key(key) || after.is_some_and(|a| !self.nodes.contains_key(a) || a == key) {
            return Ok(false);
        }
        let mut desired: Vec<&String> = self.keys.iter().filter(|k| *k != key).collect();
        let insert_at = match after {
            Some(after) => desired.iter().position(|k| *k == after).map_or(0, |p| p + 1),
            None => 0,
        };
        let moved = key.to_string();
        desired.insert(insert_at, &moved);
        if desired.iter().copied().eq(self.keys.iter()) {
            return Ok(false);
        }
        self.ensure_editable()?;

        let schema = self.schema;
        let container = self.container_mut()?;
        let Some(position) = schema.find_item(container, key) else {
            return Ok(false);
        };
        let removed = container.remove_child_with_indent(position);
        let indent = removed
            .iter()
            .find_map(XmlNode::as_whitespace)
            .map(str::to_string)
            .unwrap_or_else(|| item_indent(container, &schema));
        let Some(element) = removed.into_iter().find_map(|n| match n {
            XmlNode::Element(e) => Some(e),
            XmlNode::Event(_) => None,
        }) else {
            return Ok(false);
        };

        match after.and_then(|a| schema.find_item(container, a)) {
            Some(anchor) => container.insert_element(Some(anchor), element, &indent),
            None => match schema.item_positions(container).first() {
                Some(&first) => {
                    let children = container.children_mut();
                    children.insert(first, XmlNode::whitespace(&indent));
                    children.insert(first, XmlNode::Element(element));
                }
                None => container.append_element(element, &indent),
            },
        }

        self.rebuild_key_order()?;
        self.dirty = true;
        Ok(true)
    }

    /// Copies comments of `old` onto keys that have none here.
    ///
    /// The forms designer regenerates its resource files and drops comments on the way.
    pub fn copy_comments_from(&mut self, old: &ResourceLanguage) -> Result<(), Error> {
        let carried: Vec<(String, String)> = self
            .keys
            .iter()
            .filter(|k| self.comment(k).is_none())
            .filter_map(|k| old.comment(k).map(|c| (k.clone(), c.to_string())))
            .collect();
        for (key, comment) in carried {
            let node = Node {
                text: self.nodes.get(&key).and_then(|n| n.text.clone()),
                comment: Some(comment),
            };
            self.write_node(&key, node)?;
        }
        Ok(())
    }

    /// Writes the document if its content differs from what is on disk.
    pub fn save(&mut self) -> Result<bool, Error> {
        let content = self.document.render()?;
        if content == self.file_content {
            self.dirty = false;
            return Ok(false);
        }

        self.is_saving.store(true, Ordering::SeqCst);
        let result = self.file.write_text(&content, self.encoding);
        self.is_saving.store(false, Ordering::SeqCst);
        result.map_err(|e| Error::save(self.file.file_path(), e))?;

        debug!("saved {}", self.file.file_path().display());
        self.file_content = content;
        self.dirty = false;
        Ok(true)
    }

    /// Current rendering of the document.
    pub fn render(&self) -> Result<String, Error> {
        self.document.render()
    }

    fn container(&self) -> Result<&XmlElement, Error> {
        self.schema
            .container(&self.document)
            .ok_or_else(|| Error::load(self.file.file_path(), "missing item container"))
    }

    fn container_mut(&mut self) -> Result<&mut XmlElement, Error> {
        let path = self.file.file_path().to_path_buf();
        self.schema
            .container_mut(&mut self.document)
            .ok_or_else(|| Error::load(path, "missing item container"))
    }

    fn rebuild_key_order(&mut self) -> Result<(), Error> {
        let schema = self.schema;
        let container = self.container()?;
        let keys: Vec<String> = schema
            .item_positions(container)
            .into_iter()
            .filter_map(|p| container.children()[p].as_element())
            .filter_map(|e| schema.key_of(e))
            .filter(|k| self.nodes.contains_key(k))
            .collect();
        self.keys = keys;
        Ok(())
    }
}

/// Renames duplicate and empty keys in source order.
///
/// The first occurrence of a key keeps its name, later ones become `Key_Duplicate[n]`,
/// empty keys become `_Empty[n]`; `n` starts at 1 and skips names already in use.
pub fn deduplicate_keys(keys: &[String]) -> Vec<String> {
    let mut used: HashSet<String> = keys.iter().filter(|k| !k.is_empty()).cloned().collect();
    let mut seen: HashSet<&str> = HashSet::new();

    keys.iter()
        .map(|key| {
            if !key.is_empty() && seen.insert(key.as_str()) {
                return key.clone();
            }
            let base = if key.is_empty() {
                "_Empty".to_string()
            } else {
                format!("{}_Duplicate", key)
            };
            (1..)
                .map(|n| format!("{}[{}]", base, n))
                .find(|candidate| used.insert(candidate.clone()))
                .unwrap_or(base)
        })
        .collect()
}

fn resolve_duplicate_keys(
    document: &mut XmlDocument,
    schema: &NodeSchema,
    context: &ResourceContext,
    path: &std::path::Path,
) -> Result<bool, Error> {
    let container = schema
        .container_mut(document)
        .ok_or_else(|| Error::load(path, "missing item container"))?;

    let positions: Vec<usize> = schema
        .item_positions(container)
        .into_iter()
        .filter(|&p| {
            container.children()[p]
                .as_element()
                .and_then(|e| schema.key_of(e))
                .is_none_or(|k| !k.starts_with(DESIGNER_KEY_PREFIX))
        })
        .collect();
    let keys: Vec<String> = positions
        .iter()
        .map(|&p| {
            container.children()[p]
                .as_element()
                .and_then(|e| schema.key_of(e))
                .unwrap_or_default()
        })
        .collect();

    let resolved = deduplicate_keys(&keys);
    if resolved == keys {
        return Ok(false);
    }

    if context.configuration().duplicate_key_handling == DuplicateKeyHandling::Fail {
        let mut seen = HashSet::new();
        let offending: Vec<String> = keys
            .iter()
            .zip(&resolved)
            .filter(|(original, renamed)| original != renamed)
            .map(|(original, _)| original.clone())
            .filter(|key| seen.insert(key.clone()))
            .collect();
        return Err(Error::DuplicateKeys {
            path: path.to_path_buf(),
            keys: offending,
        });
    }

    for ((position, original), renamed) in positions.iter().zip(&keys).zip(&resolved) {
        if original != renamed {
            warn!(
                "{}: renamed duplicate key `{}` to `{}`",
                path.display(),
                original,
                renamed
            );
            if let Some(item) = container.children_mut()[*position].as_element_mut() {
                item.set_attribute(schema.key_attribute, renamed);
            }
        }
    }
    Ok(true)
}

type NodeIndex = (Vec<String>, HashMap<String, Node>);

fn index_nodes(document: &XmlDocument, schema: &NodeSchema) -> Result<NodeIndex, String> {
    let container = schema.container(document).ok_or_else(|| {
        format!(
            "missing `{}` element",
            schema.container.join("/")
        )
    })?;

    let mut keys = Vec::new();
    let mut nodes = HashMap::new();
    for position in schema.item_positions(container) {
        let Some(item) = container.children()[position].as_element() else {
            continue;
        };
        let key = schema.key_of(item).unwrap_or_default();
        if key.starts_with(DESIGNER_KEY_PREFIX) {
            continue;
        }
        let text = match item.element(schema.value) {
            Some(value) => Some(value.text().map_err(|e| e.to_string())?),
            None if schema.value_required => {
                return Err(format!("`{}` has no `{}` element", key, schema.value));
            }
            None => None,
        };
        let comment = match item.element(schema.comment) {
            Some(comment) => Some(comment.text().map_err(|e| e.to_string())?),
            None => None,
        };
        keys.push(key.clone());
        nodes.insert(key, Node { text, comment });
    }
    Ok((keys, nodes))
}

/// Indentation of the last element in `container`, or a default by nesting depth.
fn item_indent(container: &XmlElement, schema: &NodeSchema) -> String {
    container
        .children()
        .iter()
        .rposition(|n| n.as_element().is_some())
        .and_then(|p| container.indentation_of(p))
        .map(str::to_string)
        .unwrap_or_else(|| format!("\n{}", "  ".repeat(schema.container.len() + 1)))
}

/// Sets the text of child `name`, creating it after `after` (or last) when missing.
fn set_child_text(item: &mut XmlElement, name: &str, text: &str, indent: &str, after: Option<&str>) {
    if let Some(child) = item.element_mut(name) {
        child.set_text(text);
        return;
    }
    let child = XmlElement::new(name).with_text(text);
    let anchor = after.and_then(|a| {
        item.children()
            .iter()
            .position(|n| n.as_element().is_some_and(|e| e.is(a)))
    });
    match anchor {
        Some(anchor) => item.insert_element(Some(anchor), child, indent),
        None => item.append_element(child, indent),
    }
}
