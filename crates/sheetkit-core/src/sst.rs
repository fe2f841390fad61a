//! Runtime shared string table.
//!
//! The [`SharedStringTable`] provides an efficient in-memory index for looking
//! up and inserting shared strings. It bridges the gap between the XML-level
//! [`sheetkit_xml::shared_strings::Sst`] and the high-level cell API.

use std::collections::HashMap;

use sheetkit_xml::shared_strings::{Si, Sst, T};

use crate::rich_text::{rich_text_to_plain, runs_to_si, xml_to_run, RichTextRun};

/// One slot in the shared string table.
///
/// `plain` always holds the slot's flattened text (what `get()` returns and
/// what a formula or display reads); `rich` additionally holds the
/// per-run formatting when the slot was created from or set to rich text,
/// so that structure survives a read/write round trip instead of being
/// flattened to plain text.
struct Entry {
    plain: String,
    rich: Option<Vec<RichTextRun>>,
}

/// Runtime shared string table for efficient string lookup and insertion.
///
/// Maintains both an ordered list of strings (for index-based lookup) and a
/// reverse hash map (for deduplication when inserting plain strings).
/// Indices are stable: clearing a slot nulls its text but never removes or
/// reuses the slot, since cells elsewhere in the workbook may still
/// reference it by index.
pub struct SharedStringTable {
    entries: Vec<Entry>,
    index_map: HashMap<String, usize>,
}

impl SharedStringTable {
    /// Create a new, empty shared string table.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index_map: HashMap::new(),
        }
    }

    /// Build from an XML [`Sst`] struct.
    ///
    /// Plain-text items use the `t` field directly. Rich-text items keep
    /// their runs structurally (available via [`get_rich_text`]) in
    /// addition to a flattened plain-text projection.
    pub fn from_sst(sst: &Sst) -> Self {
        let mut table = Self::new();

        for si in &sst.items {
            let idx = table.entries.len();
            if let Some(ref t) = si.t {
                let text = t.value.clone();
                table.index_map.entry(text.clone()).or_insert(idx);
                table.entries.push(Entry {
                    plain: text,
                    rich: None,
                });
            } else {
                let runs: Vec<RichTextRun> = si.r.iter().map(xml_to_run).collect();
                let plain = rich_text_to_plain(&runs);
                table.entries.push(Entry {
                    plain,
                    rich: Some(runs),
                });
            }
        }

        table
    }

    /// Convert back to an XML [`Sst`] struct.
    pub fn to_sst(&self) -> Sst {
        let items: Vec<Si> = self
            .entries
            .iter()
            .map(|entry| match &entry.rich {
                Some(runs) => runs_to_si(runs),
                None => Si {
                    t: Some(T {
                        xml_space: if entry.plain.starts_with(' ')
                            || entry.plain.ends_with(' ')
                            || entry.plain.contains("  ")
                            || entry.plain.contains('\n')
                            || entry.plain.contains('\t')
                        {
                            Some("preserve".to_string())
                        } else {
                            None
                        },
                        value: entry.plain.clone(),
                    }),
                    r: vec![],
                },
            })
            .collect();

        let len = items.len() as u32;
        Sst {
            xmlns: sheetkit_xml::namespaces::SPREADSHEET_ML.to_string(),
            count: Some(len),
            unique_count: Some(len),
            items,
        }
    }

    /// Get a string's flattened plain text by its index.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|e| e.plain.as_str())
    }

    /// Get the rich text runs at the given index, if that slot holds rich
    /// text rather than a plain string.
    pub fn get_rich_text(&self, index: usize) -> Option<Vec<RichTextRun>> {
        self.entries.get(index).and_then(|e| e.rich.clone())
    }

    /// Add a plain string, returning its index.
    ///
    /// If the string already exists, the existing index is returned (dedup).
    pub fn add(&mut self, s: &str) -> usize {
        if let Some(&idx) = self.index_map.get(s) {
            return idx;
        }
        let idx = self.entries.len();
        self.entries.push(Entry {
            plain: s.to_string(),
            rich: None,
        });
        self.index_map.insert(s.to_string(), idx);
        idx
    }

    /// Add a rich text value (a sequence of independently-formatted runs),
    /// returning its index. Rich text entries are not deduplicated against
    /// each other or against plain strings: each call appends a new slot.
    pub fn add_rich_text(&mut self, runs: &[RichTextRun]) -> usize {
        let idx = self.entries.len();
        let plain = rich_text_to_plain(runs);
        self.entries.push(Entry {
            plain,
            rich: Some(runs.to_vec()),
        });
        idx
    }

    /// Returns `true` if a plain string equal to `s` is already registered.
    pub fn exists(&self, s: &str) -> bool {
        self.index_map.contains_key(s)
    }

    /// Clear the string at the given index: its text becomes empty but the
    /// slot and its index remain, since other cells may still reference it.
    /// A cleared index is never reused for a different string.
    pub fn clear(&mut self, index: usize) {
        if let Some(entry) = self.entries.get(index) {
            if let Some(&mapped) = self.index_map.get(&entry.plain) {
                if mapped == index {
                    let key = entry.plain.clone();
                    self.index_map.remove(&key);
                }
            }
        }
        if let Some(entry) = self.entries.get_mut(index) {
            entry.plain.clear();
            entry.rich = None;
        }
    }

    /// Total number of slots, including cleared ones. Equal to [`len`] --
    /// exposed separately since `count` matches the vocabulary used
    /// elsewhere for indexed tables (see [`crate::style`]).
    ///
    /// [`len`]: SharedStringTable::len
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Number of slots (including cleared ones, which keep their index).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table contains no slots.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SharedStringTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetkit_xml::shared_strings::{Si, Sst, R, T};

    #[test]
    fn test_sst_new_is_empty() {
        let table = SharedStringTable::new();
        assert!(table.is_empty());
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn test_sst_add_returns_index() {
        let mut table = SharedStringTable::new();
        assert_eq!(table.add("hello"), 0);
        assert_eq!(table.add("world"), 1);
        assert_eq!(table.add("foo"), 2);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_sst_add_deduplicates() {
        let mut table = SharedStringTable::new();
        assert_eq!(table.add("hello"), 0);
        assert_eq!(table.add("world"), 1);
        assert_eq!(table.add("hello"), 0); // duplicate -> same index
        assert_eq!(table.len(), 2); // only 2 unique strings
    }

    #[test]
    fn test_sst_get() {
        let mut table = SharedStringTable::new();
        table.add("alpha");
        table.add("beta");

        assert_eq!(table.get(0), Some("alpha"));
        assert_eq!(table.get(1), Some("beta"));
        assert_eq!(table.get(2), None);
    }

    #[test]
    fn test_sst_from_xml_and_back() {
        let xml_sst = Sst {
            xmlns: sheetkit_xml::namespaces::SPREADSHEET_ML.to_string(),
            count: Some(3),
            unique_count: Some(3),
            items: vec![
                Si {
                    t: Some(T {
                        xml_space: None,
                        value: "Name".to_string(),
                    }),
                    r: vec![],
                },
                Si {
                    t: Some(T {
                        xml_space: None,
                        value: "Age".to_string(),
                    }),
                    r: vec![],
                },
                Si {
                    t: Some(T {
                        xml_space: None,
                        value: "City".to_string(),
                    }),
                    r: vec![],
                },
            ],
        };

        let table = SharedStringTable::from_sst(&xml_sst);
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(0), Some("Name"));
        assert_eq!(table.get(1), Some("Age"));
        assert_eq!(table.get(2), Some("City"));

        // Convert back
        let back = table.to_sst();
        assert_eq!(back.items.len(), 3);
        assert_eq!(back.items[0].t.as_ref().unwrap().value, "Name");
        assert_eq!(back.items[1].t.as_ref().unwrap().value, "Age");
        assert_eq!(back.items[2].t.as_ref().unwrap().value, "City");
        assert_eq!(back.count, Some(3));
        assert_eq!(back.unique_count, Some(3));
    }

    #[test]
    fn test_sst_from_xml_rich_text() {
        let xml_sst = Sst {
            xmlns: sheetkit_xml::namespaces::SPREADSHEET_ML.to_string(),
            count: Some(1),
            unique_count: Some(1),
            items: vec![Si {
                t: None,
                r: vec![
                    R {
                        r_pr: None,
                        t: T {
                            xml_space: None,
                            value: "Bold".to_string(),
                        },
                    },
                    R {
                        r_pr: None,
                        t: T {
                            xml_space: None,
                            value: " Normal".to_string(),
                        },
                    },
                ],
            }],
        };

        let table = SharedStringTable::from_sst(&xml_sst);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(0), Some("Bold Normal"));

        // Rich text structure survives: two runs, not flattened.
        let runs = table.get_rich_text(0).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "Bold");
        assert_eq!(runs[1].text, " Normal");
    }

    #[test]
    fn test_sst_default() {
        let table = SharedStringTable::default();
        assert!(table.is_empty());
    }

    #[test]
    fn test_sst_add_rich_text_not_deduplicated() {
        let mut table = SharedStringTable::new();
        let runs = vec![RichTextRun {
            text: "Hi".to_string(),
            font: None,
            size: None,
            bold: true,
            italic: false,
            color: None,
        }];
        let idx1 = table.add_rich_text(&runs);
        let idx2 = table.add_rich_text(&runs);
        assert_ne!(idx1, idx2);
        assert_eq!(table.get(idx1), Some("Hi"));
        assert!(table.get_rich_text(idx1).is_some());
    }

    #[test]
    fn test_sst_exists() {
        let mut table = SharedStringTable::new();
        table.add("hello");
        assert!(table.exists("hello"));
        assert!(!table.exists("world"));
    }

    #[test]
    fn test_sst_clear_retains_index_and_count() {
        let mut table = SharedStringTable::new();
        let k = table.add("Hello");
        table.add("World");
        let count_before = table.count();

        table.clear(k);

        assert_eq!(table.get(k), Some(""));
        assert_eq!(table.count(), count_before);
        assert!(!table.exists("Hello"));
    }

    #[test]
    fn test_sst_clear_then_readd_does_not_alias_old_index() {
        let mut table = SharedStringTable::new();
        let k = table.add("Hello");
        table.clear(k);

        // Re-adding "Hello" must not resurrect the cleared slot.
        let new_idx = table.add("Hello");
        assert_ne!(new_idx, k);
        assert_eq!(table.get(k), Some(""));
        assert_eq!(table.get(new_idx), Some("Hello"));
    }

    #[test]
    fn test_sst_get_or_create_dedup_scenario() {
        // getOrCreateIndex dedups repeated strings; clear() empties the
        // slot without shrinking the table or reusing its index.
        let mut table = SharedStringTable::new();
        let k = table.add("Hello");
        let k2 = table.add("World");
        let k3 = table.add("Hello");
        assert_eq!(k3, k);
        assert_ne!(k2, k);

        let count_before = table.count();
        table.clear(k);
        assert_eq!(table.get(k), Some(""));
        assert_eq!(table.count(), count_before);
    }
}
