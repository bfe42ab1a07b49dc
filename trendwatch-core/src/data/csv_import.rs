//! CSV directory provider.
//!
//! Reads `{dir}/{ticker}.csv` with a `date,open,high,low,close` header.
//! Extra columns (volume, adj_close) are ignored.

use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::provider::{DataError, DataProvider, DataSource, FetchResult};
use crate::domain::Bar;

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

/// Provider backed by one CSV file per ticker.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{ticker}.csv"))
    }

    /// Read every row of a file, sorted by date.
    pub fn read_file(path: &Path) -> Result<Vec<Bar>, DataError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| DataError::Csv(format!("{}: {e}", path.display())))?;

        let mut bars = Vec::new();
        for row in reader.deserialize::<CsvRow>() {
            let row = row.map_err(|e| DataError::Csv(format!("{}: {e}", path.display())))?;
            bars.push(Bar::new(row.date, row.open, row.high, row.low, row.close));
        }
        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv_import"
    }

    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let path = self.path_for(ticker);
        if !path.exists() {
            return Err(DataError::MissingFile {
                symbol: ticker.to_string(),
                path: path.display().to_string(),
            });
        }

        let bars: Vec<Bar> = Self::read_file(&path)?
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect();

        if bars.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: ticker.to_string(),
            });
        }

        Ok(FetchResult {
            ticker: ticker.to_string(),
            bars,
            source: DataSource::CsvImport,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn reads_and_filters_by_range() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("ETEL.CA.csv"),
            "date,open,high,low,close,volume\n\
             2024-03-05,10,11,9.5,10.5,1000\n\
             2024-03-04,9.8,10.2,9.6,10.0,900\n\
             2024-03-06,10.5,10.9,10.1,10.7,1200\n",
        )
        .unwrap();

        let provider = CsvProvider::new(dir.path());
        let result = provider.fetch("ETEL.CA", date(4), date(5)).unwrap();
        assert_eq!(result.source, DataSource::CsvImport);
        assert_eq!(result.bars.len(), 2);
        assert_eq!(result.bars[0].date, date(4));
        assert_eq!(result.bars[1].close, 10.5);
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = CsvProvider::new(dir.path())
            .fetch("NOPE.CA", date(1), date(30))
            .unwrap_err();
        assert!(matches!(err, DataError::MissingFile { .. }));
    }

    #[test]
    fn malformed_row_is_a_csv_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("BAD.csv"),
            "date,open,high,low,close\n2024-03-04,abc,1,1,1\n",
        )
        .unwrap();
        let err = CsvProvider::new(dir.path())
            .fetch("BAD", date(1), date(30))
            .unwrap_err();
        assert!(matches!(err, DataError::Csv(_)));
    }
}
