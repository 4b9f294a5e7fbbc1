//! Loaders for the customer feed and the dated daily sales feeds.

use std::path::Path;

use chrono::NaiveDate;
use log::{info, warn};

use crate::error::Error;
use crate::record::{Customer, Sale};
use crate::store::Store;

/// What a load pass did, reported to the operator at the end of the run.
/// Missing files are expected for sparse date ranges; skipped rows are not.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub rows_loaded: u64,
    pub rows_skipped: u64,
    pub files_missing: u64,
}

impl LoadSummary {
    pub fn clean(&self) -> bool {
        self.rows_skipped == 0
    }
}

impl std::ops::AddAssign<LoadSummary> for LoadSummary {
    fn add_assign(&mut self, rhs: LoadSummary) {
        self.rows_loaded += rhs.rows_loaded;
        self.rows_skipped += rhs.rows_skipped;
        self.files_missing += rhs.files_missing;
    }
}

/// The expected file name for one day's sales feed.
pub fn daily_file_name(date: NaiveDate) -> String {
    format!("{}-SalesData.csv", date.format("%Y-%m-%d"))
}

/// Load the customer feed. Insertion order follows source row order; a row
/// rejected by the store (duplicate id) or failing to parse is skipped and its
/// siblings continue. The whole file commits as one transaction.
pub fn load_customers(store: &Store, path: &Path) -> Result<LoadSummary, Error> {
    let mut summary = LoadSummary::default();
    let reader = csv::Reader::from_path(path).map_err(|source| Error::Source {
        path: path.to_owned(),
        source,
    })?;

    store.begin()?;
    for (row, line) in reader.into_deserialize::<Customer>().zip(2..) {
        match row.map_err(Error::RowParse) {
            Ok(customer) => match store.insert_customer(&customer) {
                Ok(()) => summary.rows_loaded += 1,
                Err(err) => {
                    warn!("{}:{line}: {err}", path.display());
                    summary.rows_skipped += 1;
                }
            },
            Err(err) => {
                warn!("{}:{line}: {err}", path.display());
                summary.rows_skipped += 1;
            }
        }
    }
    store.commit()?;

    info!(
        "{}: {} customers loaded, {} skipped",
        path.display(),
        summary.rows_loaded,
        summary.rows_skipped
    );
    Ok(summary)
}

/// Load every daily sales file between `start` and `end` inclusive, walking
/// actual calendar dates so ranges crossing a month boundary visit every day.
/// Absent files are logged and counted, never fatal; files outside the range
/// are never opened.
pub fn load_sales(
    store: &Store,
    dir: &Path,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<LoadSummary, Error> {
    let mut summary = LoadSummary::default();
    for day in start.iter_days().take_while(|day| *day <= end) {
        let path = dir.join(daily_file_name(day));
        if !path.exists() {
            warn!("{} not found, skipping", path.display());
            summary.files_missing += 1;
            continue;
        }
        summary += load_sales_file(store, &path)?;
    }
    Ok(summary)
}

/// Load one daily file, one transaction per file. A row that fails to parse
/// or is rejected by the store is skipped; the rest of the file continues.
fn load_sales_file(store: &Store, path: &Path) -> Result<LoadSummary, Error> {
    let mut summary = LoadSummary::default();
    let reader = csv::Reader::from_path(path).map_err(|source| Error::Source {
        path: path.to_owned(),
        source,
    })?;

    store.begin()?;
    for (row, line) in reader.into_deserialize::<Sale>().zip(2..) {
        match row.map_err(Error::RowParse) {
            Ok(sale) => match store.insert_sale(&sale) {
                Ok(_) => summary.rows_loaded += 1,
                Err(err) => {
                    warn!("{}:{line}: {err}", path.display());
                    summary.rows_skipped += 1;
                }
            },
            Err(err) => {
                warn!("{}:{line}: {err}", path.display());
                summary.rows_skipped += 1;
            }
        }
    }
    store.commit()?;

    info!(
        "{}: {} sales loaded, {} skipped",
        path.display(),
        summary.rows_loaded,
        summary.rows_skipped
    );
    Ok(summary)
}

#[cfg(test)]
mod test {
    use super::*;

    macro_rules! inline_csv {
        ($line:literal) => {
            $line
        };
        ($line:literal, $($lines:literal),+ $(,)?) => {
            concat!($line, "\n", inline_csv!($($lines),+))
        };
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn write_file(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    fn sales_csv() -> &'static str {
        inline_csv!(
            "CustomerID,Purchase Date,Purchased Items,Total Amount",
            "1,2024-01-02,Widget,1500$",
            "1,2024-01-02,Gizmo,250$",
        )
    }

    #[test]
    fn daily_file_name_pads_two_digit_days() {
        assert_eq!(daily_file_name(date("2024-01-05")), "2024-01-05-SalesData.csv");
        assert_eq!(daily_file_name(date("2024-01-15")), "2024-01-15-SalesData.csv");
    }

    #[test]
    fn sparse_range_loads_only_files_present() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "2024-01-02-SalesData.csv", sales_csv());
        // Out of range, must never be opened.
        write_file(dir.path(), "2024-01-09-SalesData.csv", sales_csv());

        let store = Store::open_in_memory().unwrap();
        let summary =
            load_sales(&store, dir.path(), date("2024-01-01"), date("2024-01-03")).unwrap();

        assert_eq!(
            summary,
            LoadSummary {
                rows_loaded: 2,
                rows_skipped: 0,
                files_missing: 2,
            }
        );
    }

    #[test]
    fn range_crossing_month_boundary_visits_every_day() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "2024-01-31-SalesData.csv", sales_csv());
        write_file(dir.path(), "2024-02-01-SalesData.csv", sales_csv());

        let store = Store::open_in_memory().unwrap();
        let summary =
            load_sales(&store, dir.path(), date("2024-01-30"), date("2024-02-02")).unwrap();

        assert_eq!(summary.rows_loaded, 4);
        assert_eq!(summary.files_missing, 2);
    }

    #[test]
    fn bad_sales_row_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "2024-01-02-SalesData.csv",
            inline_csv!(
                "CustomerID,Purchase Date,Purchased Items,Total Amount",
                "1,2024-01-02,Widget,1500$",
                "1,not a date,Gizmo,250$",
                "1,2024-01-02,Gadget,nope",
                "1,2024-01-02,Doohickey,3100$",
            ),
        );

        let store = Store::open_in_memory().unwrap();
        let summary =
            load_sales(&store, dir.path(), date("2024-01-02"), date("2024-01-02")).unwrap();

        assert_eq!(summary.rows_loaded, 2);
        assert_eq!(summary.rows_skipped, 2);
        assert!(!summary.clean());
    }

    #[test]
    fn duplicate_customer_is_skipped_and_reported() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "customers.csv",
            inline_csv!("ID,name,sex,age", "1,Ann,F,30", "1,Ann again,F,30", "2,Bob,M,41"),
        );

        let store = Store::open_in_memory().unwrap();
        let summary = load_customers(&store, &dir.path().join("customers.csv")).unwrap();

        assert_eq!(summary.rows_loaded, 2);
        assert_eq!(summary.rows_skipped, 1);
    }

    #[test]
    fn missing_customer_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open_in_memory().unwrap();
        let result = load_customers(&store, &dir.path().join("nope.csv"));
        assert!(matches!(result, Err(Error::Source { .. })));
    }
}
