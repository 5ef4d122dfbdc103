use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use log::debug;
use serde_derive::{Deserialize, Serialize};

use super::classifier::prepare_pattern;
use super::config::RecognizerConfig;
use super::error::LookupError;
use super::geometry::Pattern;

type RawEntry = (String, usize, Pattern);

/// One reference character: `["字", 6, [[[x, y], ...], ...]]` on the wire.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(from = "RawEntry", into = "RawEntry")]
pub struct DatasetEntry {
    pub label: String,
    /// Drives the stroke-count prefilter. Expected, but not required, to equal `pattern.len()`.
    pub stroke_count: usize,
    pub pattern: Pattern,
}

impl DatasetEntry {
    pub fn new(label: impl Into<String>, stroke_count: usize, pattern: Pattern) -> DatasetEntry {
        DatasetEntry {
            label: label.into(),
            stroke_count,
            pattern,
        }
    }
}

impl From<RawEntry> for DatasetEntry {
    fn from((label, stroke_count, pattern): RawEntry) -> Self {
        DatasetEntry {
            label,
            stroke_count,
            pattern,
        }
    }
}

impl From<DatasetEntry> for RawEntry {
    fn from(entry: DatasetEntry) -> Self {
        (entry.label, entry.stroke_count, entry.pattern)
    }
}

/// Ordered reference table. Recognition only ever reads it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct Dataset {
    entries: Vec<DatasetEntry>,
}

impl Dataset {
    pub fn new(entries: Vec<DatasetEntry>) -> Dataset {
        Dataset { entries }
    }

    pub fn entries(&self) -> &[DatasetEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, ix: usize) -> Option<&DatasetEntry> {
        self.entries.get(ix)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DatasetEntry> {
        self.entries.iter()
    }

    pub fn from_json_str(json: &str) -> Result<Dataset, LookupError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Dataset, LookupError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn to_json_string(&self) -> Result<String, LookupError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_bincode_reader<R: Read>(reader: R) -> Result<Dataset, LookupError> {
        Ok(bincode::deserialize_from(reader)?)
    }

    pub fn write_bincode<W: Write>(&self, writer: W) -> Result<(), LookupError> {
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    /// Loads a `.bin` file as bincode and anything else as JSON.
    pub fn open(path: impl AsRef<Path>) -> Result<Dataset, LookupError> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let res = match path.extension().and_then(|ext| ext.to_str()) {
            Some("bin") => Dataset::from_bincode_reader(reader)?,
            _ => Dataset::from_json_reader(reader)?,
        };
        debug!("loaded {} dataset entries from {}", res.len(), path.display());
        Ok(res)
    }

    /// Copy with every reference pattern moment-normalized and resampled the way inputs are.
    pub fn prepare(&self, config: &RecognizerConfig) -> Dataset {
        let entries = self
            .entries
            .iter()
            .map(|entry| DatasetEntry {
                label: entry.label.clone(),
                stroke_count: entry.stroke_count,
                pattern: prepare_pattern(&entry.pattern, config),
            })
            .collect();
        Dataset { entries }
    }

    /// Indexes of entries whose declared stroke count differs from their pattern's.
    pub fn stroke_count_mismatches(&self) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.stroke_count != entry.pattern.len())
            .map(|(ix, _)| ix)
            .collect()
    }
}

impl std::ops::Index<usize> for Dataset {
    type Output = DatasetEntry;

    fn index(&self, ix: usize) -> &DatasetEntry {
        &self.entries[ix]
    }
}

impl FromIterator<DatasetEntry> for Dataset {
    fn from_iter<I: IntoIterator<Item = DatasetEntry>>(iter: I) -> Self {
        Dataset {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a DatasetEntry;
    type IntoIter = std::slice::Iter<'a, DatasetEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
