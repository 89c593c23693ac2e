//! File-mapping ledger
//!
//! Durable record tying each stored upload's object key back to the file the
//! client sent. The ledger is a single JSON document kept on local disk and
//! rewritten whole on every change.

pub mod document;
pub mod ledger;

pub use document::{LedgerDocument, MappingRecord};
pub use ledger::{FileMappingLedger, LedgerError, LedgerResult};
