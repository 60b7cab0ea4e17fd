#![forbid(unsafe_code)]
//! Runtime gettext MO catalog reader for Rust.
//!
//! Reads compiled binary translation catalogs (the MO format) and resolves
//! message identifiers to localized strings, with plural-form selection,
//! disambiguation contexts, and POSIX locale fallback. Works independently
//! of the host platform's localization facilities.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use mocat::{CacheMode, Catalog, FileSource};
//!
//! let source = FileSource::open("locale/de/LC_MESSAGES/app.mo")?;
//! let mut catalog = Catalog::open(source, CacheMode::InMemory)?;
//!
//! assert_eq!(catalog.translate("Unknown key"), "Unknown key");
//! let label = catalog.plural_translate("One file", "{} files", 3);
//! let verb = catalog.context_translate("menu", "Open");
//! # Ok::<(), mocat::Error>(())
//! ```
//!
//! Or let a [`TextDomains`] registry pick the catalog file from a locale
//! specifier:
//!
//! ```rust,no_run
//! use mocat::{CacheMode, TextDomains};
//!
//! let mut domains = TextDomains::new(CacheMode::InMemory);
//! domains.set_locale("sr_CS.UTF-8@latin");
//! domains.bind("app", "/usr/share/locale");
//! domains.set_default_domain("app");
//! let greeting = domains.gettext("Hello");
//! ```
//!
//! # Design
//!
//! - Lookups are total: when no valid catalog or entry is available the
//!   input comes back unchanged (or the grammatical default for plurals).
//!   The `try_*` methods expose real I/O failures for callers that care.
//! - Plural rules from the catalog metadata are compiled by a small
//!   built-in expression parser; nothing is ever evaluated as code.
//! - Catalogs load lazily behind an explicit, idempotent
//!   [`Catalog::load`]; once loaded the state is immutable.

pub mod catalog;
pub mod domain;
pub mod error;
pub mod locale;
pub mod plural;
pub mod source;

// Re-export most used types for easy consumption
pub use crate::{
    catalog::{ByteOrder, CacheMode, Catalog, CatalogHeader},
    domain::TextDomains,
    error::Error,
    locale::locale_candidates,
    plural::PluralRule,
    source::{ByteSource, FileSource, MemorySource},
};
