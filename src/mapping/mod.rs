// Mapping document model
//
// A mapping document pairs each media path with editable metadata. It is the
// unit operators review between generation and reconciliation, so load/save
// keeps entry order and any keys this crate does not understand.

pub mod generate;
pub mod source;

#[cfg(test)]
mod tests;

use std::fs;
use std::io::Write;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;

use crate::constants::TEMP_FILE_PREFIX;
use crate::error::{MapperError, Result};

/// One performer reference attached to a media path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformerEntry {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
    /// Carried through untouched; not used for resolution
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "String::is_empty")]
    pub disambiguation: String,
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl PerformerEntry {
    pub fn placeholder() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.name.is_empty() && self.url.is_empty()
    }
}

/// Full mapping entry: scene metadata plus performers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneRecord {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub date: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default)]
    pub performers: Vec<PerformerEntry>,
    #[serde(default, deserialize_with = "optional_text", skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, deserialize_with = "optional_text", skip_serializing_if = "Option::is_none")]
    pub studio: Option<String>,
    #[serde(default, deserialize_with = "optional_text_list", skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl SceneRecord {
    pub fn with_performers(performers: Vec<PerformerEntry>) -> Self {
        Self {
            performers,
            ..Self::default()
        }
    }
}

/// A mapping entry is either a full scene record or a bare performer list.
///
/// The persisted form tells them apart by shape (sequence vs. keyed record);
/// that check happens once here, at the decode boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MappingEntry {
    PerformerOnly(Vec<PerformerEntry>),
    Scene(SceneRecord),
}

impl MappingEntry {
    pub fn performers(&self) -> &[PerformerEntry] {
        match self {
            MappingEntry::PerformerOnly(performers) => performers,
            MappingEntry::Scene(record) => &record.performers,
        }
    }

    pub fn performers_mut(&mut self) -> &mut Vec<PerformerEntry> {
        match self {
            MappingEntry::PerformerOnly(performers) => performers,
            MappingEntry::Scene(record) => &mut record.performers,
        }
    }

    pub fn scene(&self) -> Option<&SceneRecord> {
        match self {
            MappingEntry::Scene(record) => Some(record),
            MappingEntry::PerformerOnly(_) => None,
        }
    }

    pub fn is_performer_only(&self) -> bool {
        matches!(self, MappingEntry::PerformerOnly(_))
    }
}

/// Ordered media path -> entry map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingDocument {
    entries: IndexMap<String, MappingEntry>,
}

impl MappingDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a document. A missing file is an empty document.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let text = fs::read_to_string(path)?;
        let mut doc = Self::from_yaml(&text)?;
        doc.ensure_placeholders();
        Ok(doc)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        // An empty file (or a bare `---`) decodes to null
        let value: Value = serde_yaml::from_str(text)?;
        if value.is_null() {
            return Ok(Self::new());
        }

        // Entries decode one at a time so a bad one is named by its path
        let raw: IndexMap<String, Value> = serde_yaml::from_value(value)?;
        let mut entries = IndexMap::with_capacity(raw.len());
        for (path, value) in raw {
            let entry = serde_yaml::from_value(value)
                .map_err(|source| MapperError::MappingEntry { path: path.clone(), source })?;
            entries.insert(path, entry);
        }
        Ok(Self { entries })
    }

    pub fn to_yaml(&self) -> Result<String> {
        if self.entries.is_empty() {
            return Ok("{}\n".to_string());
        }
        Ok(serde_yaml::to_string(self)?)
    }

    /// Write to a temp file next to `path`, then rename over it
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = self.to_yaml()?;

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_FILE_PREFIX)
            .suffix(".tmp")
            .tempfile_in(dir)?;
        tmp.write_all(text.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| MapperError::Io(e.error))?;

        Ok(())
    }

    /// Give every entry with an empty performer list one placeholder
    pub fn ensure_placeholders(&mut self) {
        for entry in self.entries.values_mut() {
            let performers = entry.performers_mut();
            if performers.is_empty() {
                performers.push(PerformerEntry::placeholder());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn get(&self, path: &str) -> Option<&MappingEntry> {
        self.entries.get(path)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut MappingEntry> {
        self.entries.get_mut(path)
    }

    /// Append a new entry. Existing paths are left alone; returns whether it was added.
    pub fn insert_new(&mut self, path: impl Into<String>, entry: MappingEntry) -> bool {
        let path = path.into();
        if self.entries.contains_key(&path) {
            return false;
        }
        self.entries.insert(path, entry);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MappingEntry)> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut MappingEntry)> {
        self.entries.iter_mut()
    }

    pub fn paths(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }
}

/// Hand-edited scalars like `title: 1984` or `name: 311` arrive as numbers
/// or bools; they are kept as their text.
fn scalar_text<E: serde::de::Error>(value: Value) -> std::result::Result<Option<String>, E> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Sequence(_) | Value::Mapping(_) => Err(E::custom("expected a text value, found a collection")),
        Value::Tagged(tagged) => scalar_text(tagged.value),
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?)?.unwrap_or_default())
}

fn optional_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    scalar_text(Value::deserialize(deserializer)?)
}

/// A bare scalar counts as a one-tag list; null items are dropped
fn optional_text_list<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Sequence(items) => {
            let mut tags = Vec::with_capacity(items.len());
            for item in items {
                if let Some(tag) = scalar_text::<D::Error>(item)? {
                    tags.push(tag);
                }
            }
            Ok(Some(tags))
        }
        other => Ok(scalar_text::<D::Error>(other)?.map(|tag| vec![tag])),
    }
}
