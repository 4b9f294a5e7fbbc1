//! Row types for the two source feeds and the joined view.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::core::{Amount, CustomerId, SaleDate};

/// One row of the customer feed (columns `ID,name,sex,age`). Created once per
/// source row at load time; never updated or deleted.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Customer {
    #[serde(rename = "ID")]
    pub id: CustomerId,
    pub name: String,
    pub sex: String,
    pub age: u32,
}

/// One row of a daily sales feed (columns
/// `CustomerID,Purchase Date,Purchased Items,Total Amount`). The store assigns
/// the sale id on insert. The customer reference is not enforced.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Sale {
    #[serde(rename = "CustomerID")]
    pub customer: CustomerId,
    #[serde(rename = "Purchase Date")]
    #[serde_as(as = "DisplayFromStr")]
    pub date: SaleDate,
    #[serde(rename = "Purchased Items")]
    pub item: String,
    #[serde(rename = "Total Amount")]
    #[serde_as(as = "DisplayFromStr")]
    pub amount: Amount,
}

/// A sale with its referenced customer's attributes attached, as produced by
/// the inner join. Derived, never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinedRecord {
    pub customer: CustomerId,
    pub name: String,
    pub sex: String,
    pub age: u32,
    pub date: SaleDate,
    pub item: String,
    pub amount: Amount,
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;
    use fpdec::{Dec, Decimal};

    macro_rules! inline_csv {
        ($line:literal) => {
            $line
        };
        ($line:literal, $($lines:literal),+ $(,)?) => {
            concat!($line, "\n", inline_csv!($($lines),+))
        };
    }

    #[test]
    fn customer_row_deserializes() {
        let input = inline_csv!("ID,name,sex,age", "1,Ann,F,30");
        let mut reader = csv::Reader::from_reader(input.as_bytes());
        let rows: Vec<Customer> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(
            rows,
            vec![Customer {
                id: CustomerId(1),
                name: "Ann".to_owned(),
                sex: "F".to_owned(),
                age: 30,
            }]
        );
    }

    #[test]
    fn sale_row_strips_currency_symbol() {
        let input = inline_csv!(
            "CustomerID,Purchase Date,Purchased Items,Total Amount",
            "1,2024-01-01,Widget,1500$",
        );
        let mut reader = csv::Reader::from_reader(input.as_bytes());
        let rows: Vec<Sale> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(
            rows,
            vec![Sale {
                customer: CustomerId(1),
                date: SaleDate(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
                item: "Widget".to_owned(),
                amount: Amount(Dec!(1500)),
            }]
        );
    }

    #[test]
    fn sale_row_with_bad_amount_is_an_error() {
        let input = inline_csv!(
            "CustomerID,Purchase Date,Purchased Items,Total Amount",
            "1,2024-01-01,Widget,n/a",
        );
        let mut reader = csv::Reader::from_reader(input.as_bytes());
        let rows: Vec<Result<Sale, _>> = reader.deserialize().collect();
        assert!(rows[0].is_err());
    }
}
