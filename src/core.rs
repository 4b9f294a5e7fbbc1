//! Core types used throughout the ingestion and reporting pipeline.

use chrono::NaiveDate;
use fpdec::{Dec, Decimal};
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Customers are identified by caller-supplied integer ids, unique within the
/// Customer table. SQLite integers are 64-bit, so we store them as such.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize,
)]
#[serde(transparent)]
pub struct CustomerId(pub i64);

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Sales are identified by store-assigned ids, monotonically increasing in
/// insertion order. Never present in source files.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize,
)]
#[serde(transparent)]
pub struct SaleId(pub i64);

impl std::fmt::Display for SaleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Transaction totals are exact decimals. Source files carry one trailing
/// currency symbol (e.g. `1500$`), which [FromStr](std::str::FromStr) strips
/// before parsing; the symbol is never stored or displayed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(pub Decimal);

impl Amount {
    pub const ZERO: Self = Self(Dec!(0));
}

impl std::str::FromStr for Amount {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let digits = raw
            .strip_suffix(|c: char| !c.is_ascii_digit())
            .unwrap_or(raw);
        digits
            .parse()
            .map(Self)
            .map_err(|_| ParseError::BadAmount(s.to_owned()))
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::ops::Add<Amount> for Amount {
    type Output = Self;

    fn add(self, rhs: Amount) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign<Amount> for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        *self = *self + rhs;
    }
}

/// Purchase dates as they appear inside the daily files. Source data mixes ISO
/// `2024-01-03` with US-style `1/3/2024`, so parsing tries both.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SaleDate(pub NaiveDate);

impl std::str::FromStr for SaleDate {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(raw, "%m/%d/%Y"))
            .map(Self)
            .map_err(|_| ParseError::BadDate(s.to_owned()))
    }
}

impl std::fmt::Display for SaleDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Fixed currency bands used to bucket transaction totals for distribution
/// analysis. Bands are half-open `[lo, hi)`; the top band is open-ended so
/// every amount classifies somewhere.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AmountBand {
    UnderOneK,
    OneToTwoK,
    TwoToThreeK,
    ThreeToFourK,
    OverFourK,
}

impl AmountBand {
    pub const ALL: [Self; 5] = [
        Self::UnderOneK,
        Self::OneToTwoK,
        Self::TwoToThreeK,
        Self::ThreeToFourK,
        Self::OverFourK,
    ];

    pub fn classify(amount: Amount) -> Self {
        if amount.0 < Dec!(1000) {
            Self::UnderOneK
        } else if amount.0 < Dec!(2000) {
            Self::OneToTwoK
        } else if amount.0 < Dec!(3000) {
            Self::TwoToThreeK
        } else if amount.0 < Dec!(4000) {
            Self::ThreeToFourK
        } else {
            Self::OverFourK
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::UnderOneK => "under $1k",
            Self::OneToTwoK => "$1k-$2k",
            Self::TwoToThreeK => "$2k-$3k",
            Self::ThreeToFourK => "$3k-$4k",
            Self::OverFourK => "$4k+",
        }
    }
}

impl std::fmt::Display for AmountBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
