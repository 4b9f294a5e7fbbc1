//! Aggregate sales reports computed from the joined view.
//!
//! Everything here is pure: the loaders and the store feed in
//! [JoinedRecord]s, and the six tables come out as plain data for the
//! rendering collaborators (charts, HTML) to consume. Each table also has a
//! CSV dump for the operator.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use fpdec::{Decimal, DivRounded};

use crate::core::{Amount, AmountBand, CustomerId, SaleDate};
use crate::record::JoinedRecord;

/// A joined row after the clean step: sex and age dropped, amount bucketed
/// into its band. Dates and amounts are already typed at ingestion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CleanRecord {
    pub customer: CustomerId,
    pub name: String,
    pub date: SaleDate,
    pub item: String,
    pub amount: Amount,
    pub band: AmountBand,
}

pub fn clean(rows: &[JoinedRecord]) -> Vec<CleanRecord> {
    rows.iter()
        .map(|row| CleanRecord {
            customer: row.customer,
            name: row.name.clone(),
            date: row.date,
            item: row.item.clone(),
            amount: row.amount,
            band: AmountBand::classify(row.amount),
        })
        .collect()
}

/// A date × column count matrix: one row per observed date, one column per
/// label, cell = number of matching records. Missing combinations are 0.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CrossTab {
    columns: Vec<String>,
    rows: Vec<(SaleDate, Vec<u64>)>,
}

impl CrossTab {
    fn tally(columns: Vec<String>, pairs: impl IntoIterator<Item = (SaleDate, String)>) -> Self {
        let index: HashMap<&str, usize> = columns
            .iter()
            .enumerate()
            .map(|(i, col)| (col.as_str(), i))
            .collect();
        let mut by_date: BTreeMap<SaleDate, Vec<u64>> = BTreeMap::new();
        for (date, column) in pairs {
            by_date.entry(date).or_insert_with(|| vec![0; index.len()])[index[column.as_str()]] +=
                1;
        }
        Self {
            columns,
            rows: by_date.into_iter().collect(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Dates observed in the input, ascending.
    pub fn dates(&self) -> impl Iterator<Item = SaleDate> + '_ {
        self.rows.iter().map(|(date, _)| *date)
    }

    pub fn count(&self, date: SaleDate, column: &str) -> u64 {
        let Some(col) = self.columns.iter().position(|c| c == column) else {
            return 0;
        };
        self.rows
            .iter()
            .find(|(d, _)| *d == date)
            .map_or(0, |(_, counts)| counts[col])
    }

    /// Column-wise mean over all observed dates, zero cells included. Empty
    /// input yields a mean of 0 per column.
    pub fn column_means(&self) -> Vec<(String, f64)> {
        let days = self.rows.len();
        self.columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                let total: u64 = self.rows.iter().map(|(_, counts)| counts[i]).sum();
                let mean = if days == 0 {
                    0.0
                } else {
                    total as f64 / days as f64
                };
                (column.clone(), mean)
            })
            .collect()
    }

    /// Serialize the matrix to CSV, first column the date.
    pub fn dump_csv<W: std::io::Write>(&self, writer: &mut csv::Writer<W>) -> csv::Result<()> {
        let mut header = vec!["date".to_owned()];
        header.extend(self.columns.iter().cloned());
        writer.write_record(&header)?;
        for (date, counts) in &self.rows {
            let mut record = vec![date.to_string()];
            record.extend(counts.iter().map(u64::to_string));
            writer.write_record(&record)?;
        }
        Ok(())
    }
}

/// Total spend per customer name, descending; ties broken by name ascending,
/// truncated to the top five.
pub fn top_customers_by_spend(rows: &[CleanRecord]) -> Vec<(String, Amount)> {
    let mut totals: BTreeMap<&str, Amount> = BTreeMap::new();
    for row in rows {
        *totals.entry(row.name.as_str()).or_default() += row.amount;
    }
    let mut ranked: Vec<(String, Amount)> = totals
        .into_iter()
        .map(|(name, total)| (name.to_owned(), total))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(5);
    ranked
}

/// Occurrence count per purchased item, descending; ties broken by item
/// ascending. The full ranked list is returned, callers truncate as needed.
pub fn product_frequency(rows: &[CleanRecord]) -> Vec<(String, u64)> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for row in rows {
        *counts.entry(row.item.as_str()).or_default() += 1;
    }
    let mut ranked: Vec<(String, u64)> = counts
        .into_iter()
        .map(|(item, count)| (item.to_owned(), count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

/// Count of each purchased item per calendar date.
pub fn daily_product_trend(rows: &[CleanRecord]) -> CrossTab {
    let items: BTreeSet<&str> = rows.iter().map(|row| row.item.as_str()).collect();
    CrossTab::tally(
        items.into_iter().map(str::to_owned).collect(),
        rows.iter().map(|row| (row.date, row.item.clone())),
    )
}

/// Count of sales per amount band per calendar date. All five band columns
/// are always present, sold in or not.
pub fn daily_band_counts(rows: &[CleanRecord]) -> CrossTab {
    CrossTab::tally(
        AmountBand::ALL.iter().map(|b| b.label().to_owned()).collect(),
        rows.iter().map(|row| (row.date, row.band.label().to_owned())),
    )
}

/// Per-customer spend divided by the number of distinct purchase dates in the
/// whole dataset (a deliberate simplification: the divisor is global, not
/// per customer), rounded to two places, ascending by average then name.
pub fn average_daily_spend_per_customer(rows: &[CleanRecord]) -> Vec<(String, Amount)> {
    let days: BTreeSet<SaleDate> = rows.iter().map(|row| row.date).collect();
    if days.is_empty() {
        return Vec::new();
    }
    let divisor = Decimal::from(days.len() as i64);

    let mut totals: BTreeMap<&str, Amount> = BTreeMap::new();
    for row in rows {
        *totals.entry(row.name.as_str()).or_default() += row.amount;
    }
    let mut averages: Vec<(String, Amount)> = totals
        .into_iter()
        .map(|(name, total)| (name.to_owned(), Amount(total.0.div_rounded(divisor, 2))))
        .collect();
    averages.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    averages
}

/// The six aggregate tables produced by one run.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    pub top_customers: Vec<(String, Amount)>,
    pub product_counts: Vec<(String, u64)>,
    pub daily_trend: CrossTab,
    pub average_per_product: Vec<(String, f64)>,
    pub average_per_band: Vec<(String, f64)>,
    pub average_spend_per_customer: Vec<(String, Amount)>,
}

impl Report {
    pub fn build(joined: &[JoinedRecord]) -> Self {
        let rows = clean(joined);
        let daily_trend = daily_product_trend(&rows);
        let average_per_product = daily_trend.column_means();
        let average_per_band = daily_band_counts(&rows).column_means();
        Self {
            top_customers: top_customers_by_spend(&rows),
            product_counts: product_frequency(&rows),
            daily_trend,
            average_per_product,
            average_per_band,
            average_spend_per_customer: average_daily_spend_per_customer(&rows),
        }
    }

    pub fn dump_top_customers_csv<W: std::io::Write>(
        &self,
        writer: &mut csv::Writer<W>,
    ) -> csv::Result<()> {
        dump_pairs(writer, ["name", "total amount"], &self.top_customers)
    }

    pub fn dump_product_counts_csv<W: std::io::Write>(
        &self,
        writer: &mut csv::Writer<W>,
    ) -> csv::Result<()> {
        dump_pairs(writer, ["item", "count"], &self.product_counts)
    }

    pub fn dump_average_per_product_csv<W: std::io::Write>(
        &self,
        writer: &mut csv::Writer<W>,
    ) -> csv::Result<()> {
        dump_pairs(writer, ["item", "average daily sales"], &self.average_per_product)
    }

    pub fn dump_average_per_band_csv<W: std::io::Write>(
        &self,
        writer: &mut csv::Writer<W>,
    ) -> csv::Result<()> {
        dump_pairs(writer, ["amount band", "average daily sales"], &self.average_per_band)
    }

    pub fn dump_average_spend_csv<W: std::io::Write>(
        &self,
        writer: &mut csv::Writer<W>,
    ) -> csv::Result<()> {
        dump_pairs(
            writer,
            ["name", "average daily spend"],
            &self.average_spend_per_customer,
        )
    }
}

fn dump_pairs<W: std::io::Write, V: std::fmt::Display>(
    writer: &mut csv::Writer<W>,
    header: [&str; 2],
    rows: &[(String, V)],
) -> csv::Result<()> {
    writer.write_record(header)?;
    for (key, value) in rows {
        let value = value.to_string();
        writer.write_record([key.as_str(), value.as_str()])?;
    }
    Ok(())
}
