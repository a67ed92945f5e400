//! Component tallying and summary statistics.
//!
//! Records are buffered in an [`Accumulator`] for the whole scan. The
//! column vocabulary is only known once every file has been seen, so the
//! table is materialized afterwards in [`SetupTable::build`].

use crate::models::{RankedEntry, SetupRecord, SkippedFile, SummaryStats};
use std::collections::BTreeMap;

/// Metadata columns, in output order.
pub const METADATA_COLUMNS: [&str; 11] = [
    "filename",
    "name",
    "verified",
    "collection",
    "author",
    "source_link",
    "description",
    "category",
    "version",
    "created_at",
    "total_components",
];

/// Total references per component identifier across all records.
///
/// Sparse: identifiers never referenced are absent rather than zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentTally {
    counts: BTreeMap<String, u64>,
}

impl ComponentTally {
    pub fn add(&mut self, counts: &BTreeMap<String, u64>) {
        for (id, count) in counts {
            *self.counts.entry(id.clone()).or_insert(0) += count;
        }
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Identifiers in lexicographic order.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    /// Identifiers ranked by usage.
    pub fn ranked(&self, limit: usize) -> Vec<RankedEntry> {
        rank_counts(self.counts.iter().map(|(id, count)| (id.as_str(), *count)), limit)
    }
}

/// Run-scoped state: every parsed record plus the running tally.
#[derive(Debug, Default)]
pub struct Accumulator {
    records: Vec<SetupRecord>,
    skipped: Vec<SkippedFile>,
    tally: ComponentTally,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_record(&mut self, record: SetupRecord) {
        self.tally.add(&record.component_counts);
        self.records.push(record);
    }

    pub fn add_skipped(&mut self, skipped: SkippedFile) {
        self.skipped.push(skipped);
    }

    pub fn records(&self) -> &[SetupRecord] {
        &self.records
    }

    pub fn skipped(&self) -> &[SkippedFile] {
        &self.skipped
    }

    pub fn tally(&self) -> &ComponentTally {
        &self.tally
    }
}

impl Extend<SetupRecord> for Accumulator {
    fn extend<T: IntoIterator<Item = SetupRecord>>(&mut self, iter: T) {
        for record in iter {
            self.add_record(record);
        }
    }
}

/// Fully materialized output table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupTable {
    /// Metadata column names followed by one column per component.
    pub header: Vec<String>,
    /// Component identifiers, in column order.
    pub components: Vec<String>,
    /// One row per record, same width as `header`.
    pub rows: Vec<Vec<String>>,
}

impl SetupTable {
    /// Materialize rows from every buffered record.
    ///
    /// Component columns are sorted lexicographically; rows are sorted by
    /// filename, then name. Identical input gives an identical table.
    pub fn build(acc: &Accumulator, column_prefix: &str) -> Self {
        let components: Vec<String> = acc.tally().identifiers().map(String::from).collect();

        let header = METADATA_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(components.iter().map(|id| format!("{}{}", column_prefix, id)))
            .collect();

        let mut records: Vec<&SetupRecord> = acc.records().iter().collect();
        records.sort_by(|a, b| a.filename.cmp(&b.filename).then_with(|| a.name.cmp(&b.name)));

        let rows = records
            .into_iter()
            .map(|record| {
                let mut row = metadata_cells(record);
                row.extend(components.iter().map(|id| {
                    record
                        .component_counts
                        .get(id)
                        .copied()
                        .unwrap_or(0)
                        .to_string()
                }));
                row
            })
            .collect();

        Self {
            header,
            components,
            rows,
        }
    }
}

fn metadata_cells(record: &SetupRecord) -> Vec<String> {
    vec![
        record.filename.clone(),
        record.name.clone(),
        record.verified.to_string(),
        record.collection.clone(),
        record.author.clone(),
        record.source_link.clone(),
        record.description.clone(),
        record.category.clone(),
        record.version.clone(),
        record.created_at.clone(),
        record.total_components.to_string(),
    ]
}

/// Limits for the ranked lists in the summary.
#[derive(Debug, Clone, Copy)]
pub struct SummaryLimits {
    pub authors: usize,
    pub collections: usize,
    pub components: usize,
}

impl Default for SummaryLimits {
    fn default() -> Self {
        Self {
            authors: 5,
            collections: 5,
            components: 10,
        }
    }
}

/// Compute summary statistics over everything the accumulator holds.
pub fn summarize(acc: &Accumulator, limits: SummaryLimits) -> SummaryStats {
    let records = acc.records();
    let processed = records.len();
    let skipped = acc.skipped().len();
    let verified = records.iter().filter(|r| r.verified).count();

    let verification_rate = if processed == 0 {
        0.0
    } else {
        verified as f64 / processed as f64
    };

    let sizes: Vec<usize> = records.iter().map(|r| r.total_components).collect();
    let avg_components = if sizes.is_empty() {
        0.0
    } else {
        sizes.iter().sum::<usize>() as f64 / sizes.len() as f64
    };

    let authors = label_counts(records.iter().map(|r| r.author.as_str()));
    let collections = label_counts(records.iter().map(|r| r.collection.as_str()));

    SummaryStats {
        processed,
        skipped,
        total_files: processed + skipped,
        verified,
        verification_rate,
        distinct_collections: collections.len(),
        distinct_authors: authors.len(),
        top_authors: rank_counts(authors.iter().map(|(l, c)| (*l, *c)), limits.authors),
        top_collections: rank_counts(
            collections.iter().map(|(l, c)| (*l, *c)),
            limits.collections,
        ),
        unique_components: acc.tally().len(),
        top_components: acc.tally().ranked(limits.components),
        avg_components,
        max_components: sizes.iter().copied().max().unwrap_or(0),
        min_components: sizes.iter().copied().min().unwrap_or(0),
    }
}

/// Frequency of each non-blank label.
fn label_counts<'a>(labels: impl Iterator<Item = &'a str>) -> BTreeMap<&'a str, u64> {
    let mut counts = BTreeMap::new();
    for label in labels.map(str::trim).filter(|l| !l.is_empty()) {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// Sort by descending count, ties by ascending label, and keep `limit`.
pub fn rank_counts<'a>(counts: impl Iterator<Item = (&'a str, u64)>, limit: usize) -> Vec<RankedEntry> {
    let mut ranked: Vec<(&str, u64)> = counts.filter(|(_, count)| *count > 0).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(limit);
    ranked
        .into_iter()
        .map(|(label, count)| RankedEntry::new(label, count))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(filename: &str, author: &str, verified: bool, components: &[&str]) -> SetupRecord {
        let mut counts = BTreeMap::new();
        for c in components {
            *counts.entry(c.to_string()).or_insert(0) += 1;
        }
        SetupRecord {
            filename: filename.to_string(),
            name: filename.trim_end_matches(".json").to_string(),
            verified,
            collection: String::new(),
            author: author.to_string(),
            source_link: String::new(),
            description: String::new(),
            category: String::new(),
            version: String::new(),
            created_at: String::new(),
            total_components: components.len(),
            component_counts: counts,
        }
    }

    fn column(table: &SetupTable, name: &str) -> Vec<String> {
        let idx = table.header.iter().position(|h| h == name).unwrap();
        table.rows.iter().map(|row| row[idx].clone()).collect()
    }

    #[test]
    fn test_tally_accumulates_across_records() {
        let mut acc = Accumulator::new();
        acc.add_record(record("a.json", "alice", true, &["lens", "lens", "camera"]));
        acc.add_record(record("b.json", "bob", false, &["camera"]));

        assert_eq!(acc.tally().len(), 2);
        assert_eq!(
            acc.tally().ranked(10),
            vec![RankedEntry::new("camera", 2), RankedEntry::new("lens", 2)]
        );
        assert_eq!(acc.tally().identifiers().collect::<Vec<_>>(), vec!["camera", "lens"]);
    }

    #[test]
    fn test_table_columns_and_counts() {
        let mut acc = Accumulator::new();
        // Inserted out of order; rows come back sorted by filename.
        acc.add_record(record("b.json", "bob", false, &["camera"]));
        acc.add_record(record("a.json", "alice", true, &["lens", "lens", "camera"]));
        acc.add_skipped(SkippedFile {
            filename: "c.json".to_string(),
            reason: "invalid JSON".to_string(),
        });

        let table = SetupTable::build(&acc, "component_");

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.components, vec!["camera", "lens"]);
        assert_eq!(
            &table.header[METADATA_COLUMNS.len()..],
            &["component_camera", "component_lens"]
        );
        assert_eq!(column(&table, "filename"), vec!["a.json", "b.json"]);
        assert_eq!(column(&table, "component_lens"), vec!["2", "0"]);
        assert_eq!(column(&table, "component_camera"), vec!["1", "1"]);
        assert_eq!(column(&table, "verified"), vec!["true", "false"]);
        assert_eq!(column(&table, "total_components"), vec!["3", "1"]);
        assert!(table.rows.iter().all(|row| row.len() == table.header.len()));
    }

    #[test]
    fn test_table_is_deterministic() {
        let records = vec![
            record("z.json", "zoe", true, &["b", "a"]),
            record("m.json", "max", false, &["c"]),
            record("a.json", "amy", true, &["a"]),
        ];

        let mut forward = Accumulator::new();
        forward.extend(records.clone());
        let mut backward = Accumulator::new();
        backward.extend(records.into_iter().rev());

        assert_eq!(
            SetupTable::build(&forward, ""),
            SetupTable::build(&backward, "")
        );
    }

    #[test]
    fn test_empty_table_has_metadata_header() {
        let table = SetupTable::build(&Accumulator::new(), "component_");
        assert_eq!(table.header.len(), METADATA_COLUMNS.len());
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_summarize_scenario() {
        let mut acc = Accumulator::new();
        acc.add_record(record("a.json", "alice", true, &["lens", "lens", "camera"]));
        acc.add_record(record("b.json", "bob", false, &["camera"]));
        acc.add_skipped(SkippedFile {
            filename: "c.json".to_string(),
            reason: "invalid JSON".to_string(),
        });

        let stats = summarize(&acc, SummaryLimits::default());
        assert_eq!(stats.processed, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.total_files, 3);
        assert_eq!(stats.verified, 1);
        assert_eq!(stats.verification_rate, 0.5);
        assert_eq!(stats.distinct_authors, 2);
        assert_eq!(stats.distinct_collections, 0);
        assert!(stats.top_collections.is_empty());
        assert_eq!(stats.unique_components, 2);
        assert_eq!(stats.avg_components, 2.0);
        assert_eq!(stats.max_components, 3);
        assert_eq!(stats.min_components, 1);
        // lens and camera both appear twice; tie broken alphabetically
        assert_eq!(
            stats.top_components,
            vec![RankedEntry::new("camera", 2), RankedEntry::new("lens", 2)]
        );
    }

    #[test]
    fn test_summarize_no_records() {
        let stats = summarize(&Accumulator::new(), SummaryLimits::default());
        assert_eq!(stats.processed, 0);
        assert_eq!(stats.verification_rate, 0.0);
        assert_eq!(stats.avg_components, 0.0);
        assert_eq!(stats.max_components, 0);
        assert!(stats.top_authors.is_empty());
    }

    #[test]
    fn test_rank_counts_ties_and_limit() {
        let ranked = rank_counts(
            [("carol", 2), ("alice", 3), ("bob", 2), ("dave", 1), ("eve", 0)].into_iter(),
            3,
        );
        assert_eq!(
            ranked,
            vec![
                RankedEntry::new("alice", 3),
                RankedEntry::new("bob", 2),
                RankedEntry::new("carol", 2),
            ]
        );
    }

    #[test]
    fn test_blank_authors_are_not_ranked() {
        let mut acc = Accumulator::new();
        acc.add_record(record("a.json", "", true, &[]));
        acc.add_record(record("b.json", "  ", true, &[]));
        acc.add_record(record("c.json", "bob", true, &[]));

        let stats = summarize(&acc, SummaryLimits::default());
        assert_eq!(stats.distinct_authors, 1);
        assert_eq!(stats.top_authors, vec![RankedEntry::new("bob", 1)]);
    }
}
