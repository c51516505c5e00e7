//! Firmware catalog - WHENCE.yaml model, loading, and querying
//!
//! The catalog is the shared read-only input of every fwcutter operation.
//! It is loaded once per invocation and never mutated afterwards; commands
//! receive it by reference rather than through any process-wide state.
//!
//! # Overview
//!
//! ```text
//! WHENCE.yaml
//!     │
//!     ▼
//! Catalog::from_file        ← format version gate, per-entry file
//!     │                       uniqueness, index construction
//!     ▼
//! Catalog::select(query)    ← AND across dimensions, OR within one
//!     │
//!     ├── validate::check   ← integrity + source tree findings
//!     ├── Installer         ← copy, compress, link
//!     └── Catalog::list     ← sorted field projection
//! ```

mod loader;
mod model;
mod query;

pub use loader::SUPPORTED_FORMAT_VERSION;
pub use model::{Catalog, Entry, File, License, Metadata, RESERVED_LICENSES};
pub use query::{ListField, Query};
