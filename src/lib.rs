pub mod core;
pub use crate::core::*;

pub mod error;
pub use crate::error::*;

pub mod ingest;
pub use crate::ingest::*;

pub mod record;
pub use crate::record::*;

pub mod report;
pub use crate::report::*;

pub mod store;
pub use crate::store::*;
