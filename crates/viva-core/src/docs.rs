use crate::model::ReferencePointer;
use std::path::{Path, PathBuf};

/// Section title that resolves to the whole document instead of one section.
pub const EVERYTHING: &str = "EVERYTHING";

/// Read-only documentation corpus: a directory of markdown files addressed
/// by file stem and `##` heading text.
#[derive(Debug, Clone)]
pub struct DocStore {
    root: PathBuf,
}

impl DocStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn document_path(&self, document_id: &str) -> PathBuf {
        self.root.join(format!("{document_id}.md"))
    }

    /// Returns the text between the `## <title>` heading and the next `## `
    /// heading (or end of file). `EVERYTHING` returns the whole file.
    ///
    /// Fails silently: a missing file or absent heading resolves to `None`.
    /// The format gives no way to tell "no such section" from a malformed
    /// reference, so callers must tolerate an empty match.
    pub fn section(&self, document_id: &str, section_title: &str) -> Option<String> {
        let raw = std::fs::read_to_string(self.document_path(document_id)).ok()?;
        if section_title == EVERYTHING {
            return Some(raw);
        }
        extract_section(&raw, section_title)
    }

    /// Concatenates every resolved reference into a single context string.
    /// Unresolvable pointers contribute nothing.
    pub fn resolve(&self, references: &[ReferencePointer]) -> String {
        let mut context = String::new();
        for reference in references {
            match self.section(&reference.document_id, &reference.section_title) {
                Some(section) => context.push_str(&section),
                None => tracing::warn!(
                    document = %reference.document_id,
                    section = %reference.section_title,
                    "reference did not resolve to any section"
                ),
            }
        }
        context
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn extract_section(raw: &str, section_title: &str) -> Option<String> {
    let heading = format!("## {section_title}");
    let mut content = Vec::new();
    let mut inside = false;
    for line in raw.lines() {
        if !inside {
            if line.trim().contains(&heading) {
                inside = true;
            }
            continue;
        }
        if line.starts_with("## ") {
            break;
        }
        content.push(line);
    }
    if content.is_empty() {
        return None;
    }
    Some(content.join("\n").trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DOC: &str = "# Brief\n\nintro text\n\n## Tiles\n\nA tile renders output.\nTiles have positions.\n\n## Tables\n\nTables hold columns.\n";

    fn store_with_doc() -> (tempfile::TempDir, DocStore) {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("brief.md")).unwrap();
        file.write_all(DOC.as_bytes()).unwrap();
        let store = DocStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn extracts_section_up_to_next_heading() {
        let (_dir, store) = store_with_doc();
        let section = store.section("brief", "Tiles").unwrap();
        assert_eq!(section, "A tile renders output.\nTiles have positions.");
    }

    #[test]
    fn last_section_runs_to_end_of_file() {
        let (_dir, store) = store_with_doc();
        let section = store.section("brief", "Tables").unwrap();
        assert_eq!(section, "Tables hold columns.");
    }

    #[test]
    fn everything_returns_document_verbatim() {
        let (_dir, store) = store_with_doc();
        assert_eq!(store.section("brief", EVERYTHING).unwrap(), DOC);
    }

    #[test]
    fn missing_section_resolves_to_none() {
        let (_dir, store) = store_with_doc();
        assert!(store.section("brief", "Nope").is_none());
    }

    #[test]
    fn missing_file_resolves_to_none() {
        let (_dir, store) = store_with_doc();
        assert!(store.section("absent", "Tiles").is_none());
    }

    #[test]
    fn resolve_concatenates_and_skips_unresolvable() {
        let (_dir, store) = store_with_doc();
        let refs = vec![
            ReferencePointer {
                document_id: "brief".into(),
                section_title: "Tiles".into(),
            },
            ReferencePointer {
                document_id: "absent".into(),
                section_title: "Tiles".into(),
            },
            ReferencePointer {
                document_id: "brief".into(),
                section_title: "Tables".into(),
            },
        ];
        let context = store.resolve(&refs);
        assert!(context.contains("A tile renders output."));
        assert!(context.contains("Tables hold columns."));
    }
}
