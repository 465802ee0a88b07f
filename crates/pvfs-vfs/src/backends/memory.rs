//! In-memory backing filesystem.
//!
//! Used for scratch connections and testing. All data is ephemeral. Any URI
//! of the form `<scheme>://<path>` is accepted; each scheme gets its own
//! always-present root folder.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::SystemTime;

use parking_lot::RwLock;
use pvfs_types::FileKind;

use crate::config::FileSystemOptions;
use crate::ops::{self, FileHandle, RandomAccessContent};
use crate::provider::BackingFileSystemManager;
use crate::types::{AccessMode, Capability, CopySelector, FileContent};
use crate::{VfsError, VfsResult};

/// Option key that makes resolved handles read-only.
pub const READ_ONLY_OPTION: &str = "read_only";

const SCHEME_SEPARATOR: &str = "://";

/// Entry in the memory filesystem.
#[derive(Debug, Clone)]
enum Entry {
    File { data: Vec<u8>, modified: SystemTime },
    Folder { modified: SystemTime },
}

impl Entry {
    fn kind(&self) -> FileKind {
        match self {
            Entry::File { .. } => FileKind::File,
            Entry::Folder { .. } => FileKind::Folder,
        }
    }

    fn folder() -> Self {
        Entry::Folder {
            modified: SystemTime::now(),
        }
    }

    fn empty_file() -> Self {
        Entry::File {
            data: Vec::new(),
            modified: SystemTime::now(),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    /// Keyed by normalized URI without trailing separator.
    entries: RwLock<BTreeMap<String, Entry>>,
    closes: AtomicUsize,
}

/// In-memory filesystem.
///
/// Cheap to clone; clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    inner: Arc<Inner>,
}

impl MemoryFileSystem {
    /// Create a new empty in-memory filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// A writable handle for `uri`.
    pub fn handle(&self, uri: &str) -> VfsResult<MemoryHandle> {
        let (scheme, segments) = split_uri(uri)?;
        Ok(MemoryHandle {
            fs: Arc::clone(&self.inner),
            scheme,
            segments,
            read_only: false,
            listed: None,
        })
    }

    /// Number of `close` calls made on handles of this filesystem.
    pub fn close_calls(&self) -> usize {
        self.inner.closes.load(Ordering::SeqCst)
    }

    /// Number of stored files and folders (scheme roots excluded).
    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BackingFileSystemManager for MemoryFileSystem {
    fn resolve(&self, uri: &str, options: &FileSystemOptions) -> VfsResult<Arc<dyn FileHandle>> {
        let mut handle = self.handle(uri)?;
        handle.read_only = options.get_bool(READ_ONLY_OPTION);
        Ok(Arc::new(handle))
    }
}

/// Split `scheme://a/b/` into `("scheme", ["a", "b"])`.
fn split_uri(uri: &str) -> VfsResult<(String, Vec<String>)> {
    let (scheme, path) = uri
        .split_once(SCHEME_SEPARATOR)
        .filter(|(scheme, _)| !scheme.is_empty())
        .ok_or_else(|| VfsError::unsupported(format!("not a backend uri: {uri}")))?;
    Ok((scheme.to_string(), split_segments(path)))
}

fn split_segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Handle on a [`MemoryFileSystem`] location.
#[derive(Debug, Clone)]
pub struct MemoryHandle {
    fs: Arc<Inner>,
    scheme: String,
    segments: Vec<String>,
    read_only: bool,
    /// Kind seen when this handle came out of a listing.
    listed: Option<FileKind>,
}

impl MemoryHandle {
    /// Same location, read-only.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    fn key(&self) -> String {
        key_for(&self.scheme, &self.segments)
    }

    /// Prefix shared by every key under this location.
    fn descendant_prefix(&self) -> String {
        if self.is_root() {
            format!("{}{SCHEME_SEPARATOR}", self.scheme)
        } else {
            format!("{}/", self.key())
        }
    }

    fn with_segments(&self, segments: Vec<String>) -> Self {
        Self {
            fs: Arc::clone(&self.fs),
            scheme: self.scheme.clone(),
            segments,
            read_only: self.read_only,
            listed: None,
        }
    }

    fn check_writable(&self) -> VfsResult<()> {
        if self.read_only {
            Err(VfsError::ReadOnly)
        } else {
            Ok(())
        }
    }

    fn kind_in(&self, entries: &BTreeMap<String, Entry>) -> FileKind {
        if self.is_root() {
            return FileKind::Folder;
        }
        entries
            .get(&self.key())
            .map(Entry::kind)
            .unwrap_or(FileKind::Imaginary)
    }

    /// Ensure all parent folders exist.
    fn ensure_parents(&self, entries: &mut BTreeMap<String, Entry>) -> VfsResult<()> {
        for depth in 1..self.segments.len() {
            let key = key_for(&self.scheme, &self.segments[..depth]);
            match entries.get(&key) {
                Some(Entry::Folder { .. }) => {}
                Some(Entry::File { .. }) => return Err(VfsError::not_a_folder(key)),
                None => {
                    entries.insert(key, Entry::folder());
                }
            }
        }
        Ok(())
    }

    fn child_keys(&self, entries: &BTreeMap<String, Entry>) -> Vec<String> {
        let prefix = self.descendant_prefix();
        entries
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter(|(k, _)| !k[prefix.len()..].contains('/'))
            .map(|(k, _)| k.clone())
            .collect()
    }

    fn require_folder(&self, entries: &BTreeMap<String, Entry>) -> VfsResult<()> {
        match self.kind_in(entries) {
            FileKind::Folder => Ok(()),
            FileKind::File => Err(VfsError::not_a_folder(self.key())),
            FileKind::Imaginary => Err(VfsError::not_found(self.key())),
        }
    }

    /// Create the file if missing (truncating when asked) and return its key.
    fn open_for_write(&self, truncate: bool) -> VfsResult<String> {
        self.check_writable()?;
        if self.is_root() {
            return Err(VfsError::is_a_folder(self.key()));
        }

        let key = self.key();
        let mut entries = self.fs.entries.write();
        self.ensure_parents(&mut entries)?;
        match entries.get_mut(&key) {
            Some(Entry::Folder { .. }) => return Err(VfsError::is_a_folder(key)),
            Some(Entry::File { data, modified }) => {
                if truncate {
                    data.clear();
                    *modified = SystemTime::now();
                }
            }
            None => {
                entries.insert(key.clone(), Entry::empty_file());
            }
        }
        Ok(key)
    }
}

fn key_for(scheme: &str, segments: &[String]) -> String {
    format!("{scheme}{SCHEME_SEPARATOR}{}", segments.join("/"))
}

impl FileHandle for MemoryHandle {
    fn uri(&self) -> String {
        self.key()
    }

    fn base_name(&self) -> String {
        self.segments.last().cloned().unwrap_or_default()
    }

    fn listed_kind(&self) -> Option<FileKind> {
        self.listed
    }

    fn kind(&self) -> VfsResult<FileKind> {
        Ok(self.kind_in(&self.fs.entries.read()))
    }

    fn content(&self) -> VfsResult<FileContent> {
        if self.is_root() {
            return Ok(FileContent::new(0));
        }
        let key = self.key();
        match self.fs.entries.read().get(&key) {
            Some(Entry::File { data, modified }) => {
                Ok(FileContent::new(data.len() as u64).with_last_modified(*modified))
            }
            Some(Entry::Folder { modified }) => Ok(FileContent::new(0).with_last_modified(*modified)),
            None => Err(VfsError::not_found(key)),
        }
    }

    fn capabilities(&self) -> VfsResult<BTreeSet<Capability>> {
        let mut caps: BTreeSet<Capability> = [
            Capability::Read,
            Capability::RandomAccessRead,
            Capability::ListChildren,
            Capability::LastModified,
        ]
        .into_iter()
        .collect();

        if !self.read_only {
            caps.extend([
                Capability::Write,
                Capability::Append,
                Capability::RandomAccessWrite,
                Capability::CreateFolder,
                Capability::Delete,
                Capability::Rename,
            ]);
        }
        Ok(caps)
    }

    fn input_stream(&self) -> VfsResult<Box<dyn Read + Send>> {
        let key = self.key();
        match self.fs.entries.read().get(&key) {
            Some(Entry::File { data, .. }) => Ok(Box::new(Cursor::new(data.clone()))),
            Some(Entry::Folder { .. }) => Err(VfsError::is_a_folder(key)),
            None if self.is_root() => Err(VfsError::is_a_folder(key)),
            None => Err(VfsError::not_found(key)),
        }
    }

    fn output_stream(&self, append: bool) -> VfsResult<Box<dyn Write + Send>> {
        let key = self.open_for_write(!append)?;
        Ok(Box::new(MemoryWriter {
            fs: Arc::clone(&self.fs),
            key,
        }))
    }

    fn random_access(&self, mode: AccessMode) -> VfsResult<Box<dyn RandomAccessContent>> {
        let key = if mode.is_writable() {
            self.open_for_write(false)?
        } else {
            self.key()
        };

        let data = match self.fs.entries.read().get(&key) {
            Some(Entry::File { data, .. }) => data.clone(),
            Some(Entry::Folder { .. }) => return Err(VfsError::is_a_folder(key)),
            None => return Err(VfsError::not_found(key)),
        };

        Ok(Box::new(MemoryRandomAccess {
            fs: Arc::clone(&self.fs),
            key,
            cursor: Cursor::new(data),
            writable: mode.is_writable(),
            dirty: false,
        }))
    }

    fn child(&self, name: &str) -> VfsResult<Option<Arc<dyn FileHandle>>> {
        let child = self.child_handle(name)?;
        let entries = self.fs.entries.read();
        self.require_folder(&entries)?;
        if child.kind_in(&entries).exists() {
            Ok(Some(Arc::new(child)))
        } else {
            Ok(None)
        }
    }

    fn children(&self) -> VfsResult<Vec<Arc<dyn FileHandle>>> {
        let entries = self.fs.entries.read();
        self.require_folder(&entries)?;
        Ok(self
            .child_keys(&entries)
            .into_iter()
            .map(|key| {
                let mut segments = self.segments.clone();
                segments.push(key.rsplit('/').next().unwrap_or_default().to_string());
                let mut child = self.with_segments(segments);
                child.listed = entries.get(&key).map(Entry::kind);
                Arc::new(child) as Arc<dyn FileHandle>
            })
            .collect())
    }

    fn resolve_child(&self, name: &str) -> VfsResult<Arc<dyn FileHandle>> {
        Ok(Arc::new(self.child_handle(name)?))
    }

    fn create_file(&self) -> VfsResult<()> {
        self.open_for_write(false).map(|_| ())
    }

    fn create_folder(&self) -> VfsResult<()> {
        self.check_writable()?;
        if self.is_root() {
            return Ok(());
        }

        let key = self.key();
        let mut entries = self.fs.entries.write();
        self.ensure_parents(&mut entries)?;
        match entries.get(&key) {
            Some(Entry::Folder { .. }) => Ok(()),
            Some(Entry::File { .. }) => Err(VfsError::already_exists(key)),
            None => {
                entries.insert(key, Entry::folder());
                Ok(())
            }
        }
    }

    fn delete(&self) -> VfsResult<bool> {
        self.check_writable()?;
        if self.is_root() {
            return Err(VfsError::permission_denied("cannot remove root"));
        }

        let key = self.key();
        let mut entries = self.fs.entries.write();
        match entries.get(&key) {
            None => Ok(false),
            Some(Entry::Folder { .. }) if !self.child_keys(&entries).is_empty() => {
                Err(VfsError::folder_not_empty(key))
            }
            Some(_) => {
                entries.remove(&key);
                Ok(true)
            }
        }
    }

    fn delete_all(&self) -> VfsResult<u64> {
        self.check_writable()?;
        let prefix = self.descendant_prefix();
        let mut entries = self.fs.entries.write();

        let mut doomed: Vec<String> = entries
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .map(|(k, _)| k.clone())
            .collect();
        if !self.is_root() && entries.contains_key(&self.key()) {
            doomed.push(self.key());
        }

        for key in &doomed {
            entries.remove(key);
        }
        Ok(doomed.len() as u64)
    }

    fn copy_from(&self, source: &dyn FileHandle, selector: CopySelector) -> VfsResult<()> {
        self.check_writable()?;
        ops::copy_tree(source, self, selector).map(|_| ())
    }

    fn move_to(&self, dest: &dyn FileHandle) -> VfsResult<()> {
        self.check_writable()?;
        ops::move_tree(self, dest)
    }

    fn refresh(&self) -> VfsResult<()> {
        Ok(())
    }

    fn close(&self) -> VfsResult<()> {
        self.fs.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl MemoryHandle {
    fn child_handle(&self, name: &str) -> VfsResult<MemoryHandle> {
        let extra = split_segments(name);
        if extra.is_empty() {
            return Err(VfsError::other(format!("empty child name under {}", self.key())));
        }
        let mut segments = self.segments.clone();
        segments.extend(extra);
        Ok(self.with_segments(segments))
    }
}

/// Appends straight into the stored file.
struct MemoryWriter {
    fs: Arc<Inner>,
    key: String,
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut entries = self.fs.entries.write();
        match entries.get_mut(&self.key) {
            Some(Entry::File { data, modified }) => {
                data.extend_from_slice(buf);
                *modified = SystemTime::now();
                Ok(buf.len())
            }
            Some(Entry::Folder { .. }) => Err(VfsError::is_a_folder(self.key.clone()).into()),
            None => Err(VfsError::not_found(self.key.clone()).into()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Works on a private copy; writes land in the store on flush or drop.
struct MemoryRandomAccess {
    fs: Arc<Inner>,
    key: String,
    cursor: Cursor<Vec<u8>>,
    writable: bool,
    dirty: bool,
}

impl Read for MemoryRandomAccess {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl Seek for MemoryRandomAccess {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.cursor.seek(pos)
    }
}

impl Write for MemoryRandomAccess {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.writable {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("opened read-only: {}", self.key),
            ));
        }
        let n = self.cursor.write(buf)?;
        self.dirty = true;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let mut entries = self.fs.entries.write();
        match entries.get_mut(&self.key) {
            Some(Entry::File { data, modified }) => {
                data.clone_from(self.cursor.get_ref());
                *modified = SystemTime::now();
                self.dirty = false;
                Ok(())
            }
            _ => Err(VfsError::not_found(self.key.clone()).into()),
        }
    }
}

impl Drop for MemoryRandomAccess {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
