//! Connection-backed virtual filesystem.
//!
//! Resolves `pvfs://<connection>/<path>` URIs to handles on concrete backing
//! filesystems. Key components:
//!
//! - [`VirtualFileSystem`] - Turns virtual paths into backing handles
//! - [`VirtualFileHandle`] - Lazily-resolving handle that delegates to its backing handle
//! - [`FileHandle`] - Capability trait shared by virtual and backing handles
//! - [`ConnectionRegistry`] / [`BackingFileSystemManager`] - Injected collaborators
//! - [`ConnectivityTester`] - Decides whether a connection definition is usable
//! - [`MemoryFileSystem`] - In-memory backend (for scratch, testing)
//!
//! ## Design Decisions
//!
//! - **Lazy resolution**: Handles are created without I/O and bind to a
//!   backing handle on first use. A missing connection reads as
//!   [`FileKind::Imaginary`], not an error.
//! - **Identity stays virtual**: A resolved handle and every child listed
//!   from it report `pvfs://` URIs, never backend URIs.
//! - **Synchronous**: Backends do blocking I/O through `std::io` traits.

pub mod backends;
pub mod config;
pub mod connectivity;
mod error;
pub mod filesystem;
pub mod handle;
pub mod ops;
pub mod provider;
pub mod router;
pub mod types;

pub use backends::MemoryFileSystem;
pub use config::{FileSystemOptions, PvfsConfig};
pub use connectivity::{ConnectivityTester, ReachabilityProbe, TestOptions};
pub use error::{VfsError, VfsResult};
pub use filesystem::VirtualFileSystem;
pub use handle::VirtualFileHandle;
pub use ops::{FileHandle, RandomAccessContent, copy_tree, move_tree};
pub use provider::{
    BackingFileSystemManager, ConnectionDescriptor, ConnectionRegistry, StaticConnectionRegistry,
};
pub use router::{SchemeInfo, SchemeRouter};
pub use types::{AccessMode, Capability, CopySelector, FileContent};

pub use pvfs_types::{FileKind, NodeKind, PathError, VirtualPath, VirtualPathParser};
