//! Result records produced by the extraction engine

use std::path::{Path, PathBuf};

/// Summary and artifact references for one extraction
///
/// Produced by the extraction engine and handed to the job store, which owns
/// the referenced files from then on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultRecord {
    /// Display name of the original input (usually the file stem)
    pub source_name: String,

    /// Number of pages in the source document
    pub page_count: u32,

    /// Number of pages on which at least one table was found
    pub pages_with_tables: u32,

    /// Total number of tables extracted
    pub table_count: u32,

    /// Table titles in order of appearance
    pub extracted_titles: Vec<String>,

    /// Generated files, unique and in production order
    artifact_paths: Vec<PathBuf>,

    /// Directory containing the artifacts, reclaimed as a whole on eviction
    pub output_directory: Option<PathBuf>,
}

impl ResultRecord {
    /// Create an empty record for the given source
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            ..Default::default()
        }
    }

    /// Set the page/table counters
    pub fn with_counts(mut self, page_count: u32, pages_with_tables: u32, table_count: u32) -> Self {
        self.page_count = page_count;
        self.pages_with_tables = pages_with_tables;
        self.table_count = table_count;
        self
    }

    /// Append an extracted title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.extracted_titles.push(title.into());
        self
    }

    /// Append an artifact path (duplicates are ignored)
    pub fn with_artifact(mut self, path: impl Into<PathBuf>) -> Self {
        self.push_artifact(path);
        self
    }

    /// Set the output directory
    pub fn with_output_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_directory = Some(dir.into());
        self
    }

    /// Append an artifact path in place; returns false if it was already present
    pub fn push_artifact(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        if self.artifact_paths.contains(&path) {
            return false;
        }
        self.artifact_paths.push(path);
        true
    }

    /// Generated files in production order
    pub fn artifact_paths(&self) -> &[PathBuf] {
        &self.artifact_paths
    }

    /// Whether the extraction produced any files
    pub fn has_artifacts(&self) -> bool {
        !self.artifact_paths.is_empty()
    }

    /// Base names of the artifacts, in production order
    pub fn artifact_names(&self) -> Vec<String> {
        self.artifact_paths
            .iter()
            .filter_map(|p| artifact_name(p))
            .collect()
    }

    /// First artifact whose base name equals `name`
    pub fn find_artifact(&self, name: &str) -> Option<&Path> {
        self.artifact_paths
            .iter()
            .find(|p| artifact_name(p).as_deref() == Some(name))
            .map(PathBuf::as_path)
    }
}

/// Base name of an artifact path, if it has a valid UTF-8 one
pub fn artifact_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let record = ResultRecord::new("invoice")
            .with_counts(3, 2, 3)
            .with_title("Revenue")
            .with_title("Costs")
            .with_artifact("/out/invoice/page2_table1.csv")
            .with_output_directory("/out/invoice");

        assert_eq!(record.source_name, "invoice");
        assert_eq!(record.page_count, 3);
        assert_eq!(record.pages_with_tables, 2);
        assert_eq!(record.table_count, 3);
        assert_eq!(record.extracted_titles, vec!["Revenue", "Costs"]);
        assert_eq!(record.artifact_paths().len(), 1);
        assert_eq!(record.output_directory, Some(PathBuf::from("/out/invoice")));
    }

    #[test]
    fn test_duplicate_artifacts_ignored() {
        let mut record = ResultRecord::new("doc");
        assert!(record.push_artifact("/out/a.csv"));
        assert!(!record.push_artifact("/out/a.csv"));
        assert!(record.push_artifact("/other/a.csv"));
        assert_eq!(record.artifact_paths().len(), 2);
    }

    #[test]
    fn test_artifact_names_keep_order() {
        let record = ResultRecord::new("doc")
            .with_artifact("/out/page3_table1.csv")
            .with_artifact("/out/page2_table1.csv");

        assert_eq!(
            record.artifact_names(),
            vec!["page3_table1.csv", "page2_table1.csv"]
        );
    }

    #[test]
    fn test_find_artifact_by_base_name() {
        let record = ResultRecord::new("doc")
            .with_artifact("/out/x/page1_table1.csv")
            .with_artifact("/out/y/page1_table2.csv");

        assert_eq!(
            record.find_artifact("page1_table2.csv"),
            Some(Path::new("/out/y/page1_table2.csv"))
        );
        assert!(record.find_artifact("x/page1_table1.csv").is_none());
        assert!(record.find_artifact("missing.csv").is_none());
    }

    #[test]
    fn test_has_artifacts() {
        assert!(!ResultRecord::new("empty").has_artifacts());
        assert!(ResultRecord::new("one").with_artifact("/a.csv").has_artifacts());
    }
}
