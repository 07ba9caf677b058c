use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use super::deserializers::{deserialize_node_id, deserialize_storage_time};
use crate::error::{Error, Result};
use crate::models::BookmarkEntry;
use crate::utils::paths::validate_file_size;

/// Bookmark files beyond this are not something a browser writes
const MAX_BOOKMARKS_FILE_BYTES: u64 = 64 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Url,
    Folder,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookmarkNode {
    #[serde(deserialize_with = "deserialize_node_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub children: Vec<BookmarkNode>,
    #[serde(default, deserialize_with = "deserialize_storage_time")]
    pub date_added: Option<DateTime<Utc>>,
}

impl BookmarkNode {
    fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    fn to_entry(&self, parent_id: Option<&str>) -> BookmarkEntry {
        BookmarkEntry {
            id: self.id.clone(),
            title: self.name.clone(),
            url: if self.kind == NodeKind::Url { self.url.clone() } else { None },
            is_folder: self.is_folder(),
            parent_id: parent_id.map(str::to_string),
            date_added: self.date_added,
        }
    }

    fn find(&self, id: &str) -> Option<&BookmarkNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }
}

#[derive(Debug, Default, Deserialize)]
struct Roots {
    bookmark_bar: Option<BookmarkNode>,
    other: Option<BookmarkNode>,
    synced: Option<BookmarkNode>,
}

#[derive(Debug, Deserialize)]
struct BookmarkFile {
    #[serde(default)]
    roots: Roots,
}

/// The three bookmark roots, in the order the browser shows them.
#[derive(Debug, Clone, Default)]
pub struct BookmarkTree {
    pub roots: Vec<BookmarkNode>,
}

impl BookmarkTree {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let file: BookmarkFile = serde_json::from_str(json)?;
        Ok(Self::from_file(file))
    }

    fn from_file(file: BookmarkFile) -> Self {
        let Roots { bookmark_bar, other, synced } = file.roots;
        Self { roots: [bookmark_bar, other, synced].into_iter().flatten().collect() }
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// Load `<profile>/Bookmarks`; a profile without the file has no bookmarks
pub fn load_bookmarks(path: &Path) -> Result<BookmarkTree> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("no bookmarks file at {}", path.display());
            return Ok(BookmarkTree::default());
        }
        Err(e) => return Err(e.into()),
    };
    validate_file_size(&file, path, MAX_BOOKMARKS_FILE_BYTES)?;

    let parsed: BookmarkFile = serde_json::from_reader(BufReader::new(file))
        .map_err(|source| Error::Bookmarks { path: path.to_path_buf(), source })?;
    Ok(BookmarkTree::from_file(parsed))
}

/// Every node depth-first, or only the direct children of `folder_id`
///
/// An id that names no folder yields an empty list.
pub fn flatten(tree: &BookmarkTree, folder_id: Option<&str>) -> Vec<BookmarkEntry> {
    let mut out = Vec::new();
    match folder_id {
        None => {
            for root in &tree.roots {
                walk(root, None, &mut out);
            }
        }
        Some(id) => {
            if let Some(folder) = tree.roots.iter().find_map(|r| r.find(id)).filter(|n| n.is_folder()) {
                out.extend(folder.children.iter().map(|child| child.to_entry(Some(folder.id.as_str()))));
            }
        }
    }
    out
}

fn walk(node: &BookmarkNode, parent_id: Option<&str>, out: &mut Vec<BookmarkEntry>) {
    out.push(node.to_entry(parent_id));
    for child in &node.children {
        walk(child, Some(node.id.as_str()), out);
    }
}

/// URL bookmarks whose title or URL contains `query`, ignoring case
pub fn search(tree: &BookmarkTree, query: &str) -> Vec<BookmarkEntry> {
    let needle = query.to_lowercase();
    flatten(tree, None)
        .into_iter()
        .filter(|entry| {
            entry.url.as_deref().is_some_and(|url| {
                url.to_lowercase().contains(&needle) || entry.title.to_lowercase().contains(&needle)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const SAMPLE: &str = r#"{
        "checksum": "abc",
        "roots": {
            "bookmark_bar": {
                "id": "1", "name": "Bookmarks bar", "type": "folder", "date_added": "13303449600000000",
                "children": [
                    {"id": "4", "name": "Rust Lang", "type": "url", "url": "https://www.rust-lang.org/"},
                    {"id": "5", "name": "Work", "type": "folder", "children": [
                        {"id": "6", "name": "Tracker", "type": "url", "url": "https://issues.example.com/"}
                    ]}
                ]
            },
            "other": {"id": "2", "name": "Other bookmarks", "type": "folder", "children": [
                {"id": "7", "name": "docs", "type": "url", "url": "https://DOCS.rs/"}
            ]},
            "synced": {"id": "3", "name": "Mobile bookmarks", "type": "folder", "children": []}
        },
        "version": 1
    }"#;

    fn tree() -> BookmarkTree {
        BookmarkTree::from_json(SAMPLE).unwrap()
    }

    #[test]
    fn test_flatten_all_depth_first() {
        let ids: Vec<_> = flatten(&tree(), None).into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["1", "4", "5", "6", "2", "7", "3"]);
    }

    #[test]
    fn test_flatten_sets_parents_and_folder_flags() {
        let entries = flatten(&tree(), None);
        assert_eq!(entries[0].parent_id, None);
        assert!(entries[0].is_folder);
        assert!(entries[0].date_added.is_some());
        assert_eq!(entries[3].parent_id.as_deref(), Some("5"));
        assert_eq!(entries[3].url.as_deref(), Some("https://issues.example.com/"));
        assert!(!entries[3].is_folder);
    }

    #[test]
    fn test_flatten_folder_direct_children_only() {
        let ids: Vec<_> = flatten(&tree(), Some("1")).into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["4", "5"]);
        let nested: Vec<_> = flatten(&tree(), Some("5")).into_iter().map(|e| e.id).collect();
        assert_eq!(nested, vec!["6"]);
    }

    #[test]
    fn test_flatten_unknown_or_url_folder_is_empty() {
        assert!(flatten(&tree(), Some("999")).is_empty());
        assert!(flatten(&tree(), Some("4")).is_empty());
        assert!(flatten(&tree(), Some("3")).is_empty());
    }

    #[test]
    fn test_search_urls_only_case_insensitive() {
        let ids: Vec<_> = search(&tree(), "DOCS").into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["7"]);
        let ids: Vec<_> = search(&tree(), "rust").into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["4"]);
        // "Work" is a folder, never a search hit
        assert!(search(&tree(), "work").is_empty());
    }

    #[test]
    fn test_missing_file_is_empty_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let tree = load_bookmarks(&tmp.path().join("Bookmarks")).unwrap();
        assert!(tree.is_empty());
        assert!(flatten(&tree, None).is_empty());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("Bookmarks");
        fs::write(&path, "{ not json").unwrap();
        let err = load_bookmarks(&path).unwrap_err();
        assert!(matches!(err, Error::Bookmarks { .. }));
    }

    #[test]
    fn test_missing_roots_is_empty() {
        let tree = BookmarkTree::from_json(r#"{"version": 1}"#).unwrap();
        assert!(tree.is_empty());
    }
}
