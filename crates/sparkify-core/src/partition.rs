//! Hive-style partition handling for written tables.
//!
//! Output tables are laid out as `col=value/...` directories below the table
//! prefix. The extractor recovers the partition directory of each written
//! object so a run can report (and tests can check) which partitions exist.

use std::collections::BTreeSet;

/// Partition value written for nulls, matching the Hive/Spark convention.
pub const HIVE_DEFAULT_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

/// Extracts ordered partition values from object paths.
///
/// # Examples
///
/// ```
/// use sparkify_core::PartitionExtractor;
///
/// let extractor = PartitionExtractor::new(vec!["year".into(), "month".into()]);
/// let values = extractor.extract("year=2018/month=11/part-0.parquet").unwrap();
/// assert_eq!(values, vec![("year".to_string(), "2018".to_string()),
///                         ("month".to_string(), "11".to_string())]);
///
/// // Objects outside the partition layout are not matched
/// assert!(extractor.extract("_SUCCESS").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct PartitionExtractor {
    columns: Vec<String>,
}

impl PartitionExtractor {
    /// Create an extractor for the given partition columns, outermost first.
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    /// Partition columns, outermost first.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Extract partition values from a relative object path.
    ///
    /// Returns `None` unless the path starts with one `col=value` segment per
    /// configured column, in order. With no configured columns every path
    /// yields an empty partition.
    pub fn extract(&self, path: &str) -> Option<Vec<(String, String)>> {
        let mut segments = path.split('/');
        let mut values = Vec::with_capacity(self.columns.len());

        for column in &self.columns {
            let segment = segments.next()?;
            let (key, value) = segment.split_once('=')?;
            if key != column {
                return None;
            }
            values.push((key.to_string(), value.to_string()));
        }

        // The partition directories must be followed by a file name
        segments.next()?;
        Some(values)
    }

    /// Distinct partition directories (e.g. `year=2018/month=11`) among paths.
    ///
    /// Paths that do not follow the partition layout (such as `_SUCCESS`
    /// markers) are skipped.
    pub fn partition_dirs<'a, I>(&self, paths: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        if self.columns.is_empty() {
            return BTreeSet::new();
        }

        paths
            .into_iter()
            .filter_map(|path| self.extract(path))
            .map(|values| {
                values
                    .iter()
                    .map(|(key, value)| format!("{key}={value}"))
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor(columns: &[&str]) -> PartitionExtractor {
        PartitionExtractor::new(columns.iter().map(|c| c.to_string()).collect())
    }

    #[test]
    fn test_extract_nested_partitions() {
        let values = extractor(&["year", "artist_id"])
            .extract("year=2000/artist_id=ARJIE2Y1187B994AB7/part-0.parquet")
            .unwrap();

        assert_eq!(
            values,
            vec![
                ("year".to_string(), "2000".to_string()),
                ("artist_id".to_string(), "ARJIE2Y1187B994AB7".to_string()),
            ]
        );
    }

    #[test]
    fn test_extract_rejects_wrong_column_order() {
        assert!(
            extractor(&["year", "month"])
                .extract("month=11/year=2018/part-0.parquet")
                .is_none()
        );
    }

    #[test]
    fn test_extract_requires_file_below_partition() {
        assert!(extractor(&["year"]).extract("year=2018").is_none());
    }

    #[test]
    fn test_extract_unpartitioned() {
        let values = extractor(&[]).extract("part-0.parquet").unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn test_partition_dirs_dedups_and_skips_markers() {
        let paths = [
            "_SUCCESS",
            "year=2018/month=11/part-0.parquet",
            "year=2018/month=11/part-1.parquet",
            "year=2018/month=12/part-0.parquet",
        ];

        let dirs = extractor(&["year", "month"]).partition_dirs(paths);

        assert_eq!(
            dirs.into_iter().collect::<Vec<_>>(),
            vec!["year=2018/month=11", "year=2018/month=12"]
        );
    }

    #[test]
    fn test_partition_dirs_default_partition() {
        let path = format!("year={HIVE_DEFAULT_PARTITION}/month={HIVE_DEFAULT_PARTITION}/p.parquet");
        let dirs = extractor(&["year", "month"]).partition_dirs([path.as_str()]);
        assert_eq!(dirs.len(), 1);
    }

    #[test]
    fn test_partition_dirs_unpartitioned_is_empty() {
        assert!(extractor(&[]).partition_dirs(["part-0.parquet"]).is_empty());
    }
}
