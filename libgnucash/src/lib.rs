//! libgnucash - A reader for GnuCash XML books
//! ---
//!
//! Decodes the XML serialization of a GnuCash double-entry ledger (plain or
//! gzip-compressed, as GnuCash writes it to disk) into an immutable object graph:
//! a [`Book`] holding commodities, a chart of accounts, balanced transactions,
//! a price list and typed metadata slots.
//!
//! ```no_run
//! use std::path::Path;
//!
//! let book = libgnucash::parse_file(Path::new("household.gnucash"), None)?;
//! for (account, _children, splits) in book.walk() {
//!     println!("{} ({} splits)", book.fullname(account), splits.len());
//! }
//! # Ok::<(), libgnucash::GnucashError>(())
//! ```

extern crate pest;
#[macro_use]
extern crate pest_derive;

/// Chart of accounts nodes and the [`AccountType`][account::AccountType] enum.
pub mod account;

/// Exact rational numbers, GnuCash's `gnc_numeric`.
pub mod amount;

/// The decoded book and its relational accessors.
pub mod book;

/// Commodities and commodity references.
pub mod commodity;

mod date;
mod dispatch;

/// Identity-keyed lookup tables built while decoding.
///
/// The main structure is [`CrossRef`][index::CrossRef], owned by exactly one
/// [`Book`]: account GUIDs and synthesized commodity keys resolve through it,
/// first registration wins.
pub mod index;

/// Our main parser entrypoints.
pub mod parser;

pub mod price;
pub mod slot;
pub mod transaction;

/// Breadth-first walk over the account tree.
pub mod walk;

/// Owned element tree over the quick-xml tokenizer.
pub mod xml;

pub use account::{Account, AccountType};
pub use amount::Numeric;
pub use book::Book;
pub use commodity::Commodity;
pub use date::parse_date;
pub use index::{AccountId, CommodityId, PriceId, SplitId, TransactionId};
pub use parser::{parse, parse_file, parse_reader, Options};
pub use price::Price;
pub use slot::{Slot, SlotValue};
pub use transaction::{ReconcileState, Split, Transaction};
pub use walk::Walk;

use thiserror::Error;

/// Every way a decode can fail. None of them leave a partial [`Book`] behind.
#[derive(Debug, Error)]
pub enum GnucashError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("format error: {0}")]
    Format(String),

    #[error("integrity error: {0}")]
    Integrity(String),

    #[error("malformed number `{0}'")]
    MalformedNumber(String),

    #[error("malformed date `{0}'")]
    MalformedDate(String),

    #[error("unknown slot type `{0}'")]
    UnknownSlotType(String),

    #[error("unresolved {kind} reference `{key}'")]
    Reference { kind: &'static str, key: String },

    #[error("{element} version `{version}' is not supported")]
    UnsupportedVersion {
        element: &'static str,
        version: String,
    },
}

pub type Result<T> = std::result::Result<T, GnucashError>;

pub(crate) fn format_err(msg: impl Into<String>) -> GnucashError {
    GnucashError::Format(msg.into())
}
