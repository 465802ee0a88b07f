//! Virtual path types for pvfs.
//!
//! Pipeline paths are written against a named connection instead of a
//! concrete backend: `pvfs://<connection>/<path>`. This crate owns the value
//! side of that scheme and has **no internal pvfs dependencies**. It is a pure
//! leaf crate that the filesystem crate builds on.
//!
//! ```text
//! pvfs://                          scheme root (no connection)
//! pvfs://My Connection/            connection root
//! pvfs://My Connection/a/b%20c     path inside a connection
//!        └──── opaque ───┘└─ percent-encoded ─┘
//! ```
//!
//! # Key Types
//!
//! |------------------------|---------------------------------------------|
//! | Item                   | Purpose                                     |
//! |------------------------|---------------------------------------------|
//! | [`VirtualPath`]        | Immutable `pvfs://` name                    |
//! | [`VirtualPathParser`]  | Raw URI string → [`VirtualPath`]            |
//! | [`NodeKind`]           | File or folder, carried on a path           |
//! | [`FileKind`]           | What a handle reports, including Imaginary  |
//! | [`path`]               | Separator algebra shared by both crates     |
//! |------------------------|---------------------------------------------|

pub mod error;
pub mod kind;
pub mod parser;
pub mod path;
pub mod virtual_path;

// Re-export primary types at crate root for convenience.
pub use error::PathError;
pub use kind::{FileKind, NodeKind};
pub use parser::{VirtualPathParser, is_pvfs_uri};
pub use virtual_path::{SCHEME, SCHEME_PREFIX, VirtualPath};
