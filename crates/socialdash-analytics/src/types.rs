use serde::Serialize;
use socialdash_core::{PostRecord, DERIVED_COLUMNS};

/// The uploaded table: input column names plus one typed row per post.
///
/// `R` tracks how far the row has travelled through the pipeline:
/// [`PostRecord`] after ingestion, [`EngagedPost`] after the derived-metric
/// step and [`AnalyzedPost`] after clustering.
#[derive(Debug, Clone, PartialEq)]
pub struct PostTable<R> {
    /// Input column names in header order, derived columns excluded.
    pub columns: Vec<String>,
    pub rows: Vec<R>,
}

impl<R> PostTable<R> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A post with `total_engagement` appended.
#[derive(Debug, Clone, PartialEq)]
pub struct EngagedPost {
    pub post: PostRecord,
    pub total_engagement: u64,
}

/// A post with both derived columns appended.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedPost {
    pub post: PostRecord,
    pub total_engagement: u64,
    /// Cluster label in `0..3`; labels carry no performance ordering.
    pub performance_cluster: u8,
}

impl AsRef<PostRecord> for EngagedPost {
    fn as_ref(&self) -> &PostRecord {
        &self.post
    }
}

impl AsRef<PostRecord> for AnalyzedPost {
    fn as_ref(&self) -> &PostRecord {
        &self.post
    }
}

/// String rendering of analyzed rows, shared by the explorer display and the
/// CSV export so both always agree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableView {
    /// Build a view over `rows` in the given order, appending the derived
    /// columns after the input columns.
    #[must_use]
    pub fn from_rows<'a, I>(input_columns: &[String], rows: I) -> Self
    where
        I: IntoIterator<Item = &'a AnalyzedPost>,
    {
        let columns = input_columns
            .iter()
            .cloned()
            .chain(DERIVED_COLUMNS.iter().map(|c| (*c).to_string()))
            .collect();

        let rows = rows
            .into_iter()
            .map(|row| {
                let mut cells = row.post.cells.clone();
                cells.push(row.total_engagement.to_string());
                cells.push(row.performance_cluster.to_string());
                cells
            })
            .collect();

        Self { columns, rows }
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}
