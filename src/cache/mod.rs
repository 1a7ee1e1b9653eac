//! Persistent transform cache
//!
//! Provides content-addressed caching of transform results keyed by a
//! fingerprint of the source bytes and the transform parameters.
//! Entries are immutable once written.
//!
//! # Layout
//!
//! | Path | Contents |
//! |------|----------|
//! | `<dir>/<sha1-hex>.json.gzip` | gzip-compressed JSON of one result |
//! | `<dir>/.<name>.<uuid>.tmp` | in-flight write, renamed when complete |
//!
//! The cache knows nothing about icon keys or transform semantics.

pub mod fingerprint;
pub mod store;

pub use fingerprint::{Fingerprint, ENTRY_SUFFIX};
pub use store::ContentCache;
