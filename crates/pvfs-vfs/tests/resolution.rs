//! Integration tests for virtual path resolution and handle delegation.
//!
//! All tests run against a `MemoryFileSystem` standing in for the backends:
//!
//! - `My Connection` → `s3://bucket/base` (rooted)
//! - `scratch` → `test://`
//!
//! Anything else is an unregistered connection.

use std::io::{Read, Seek, SeekFrom, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pvfs_vfs::backends::READ_ONLY_OPTION;
use pvfs_vfs::{
    AccessMode, BackingFileSystemManager, Capability, ConnectionDescriptor, CopySelector,
    FileHandle, FileKind, FileSystemOptions, MemoryFileSystem, NodeKind, PathError, PvfsConfig,
    StaticConnectionRegistry, VfsError, VfsResult, VirtualFileHandle, VirtualFileSystem,
};

// ============================================================================
// Shared test setup
// ============================================================================

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn registry() -> StaticConnectionRegistry {
    StaticConnectionRegistry::with_connections([
        ConnectionDescriptor::new("My Connection", "s3").with_root_path("bucket/base"),
        ConnectionDescriptor::new("scratch", "test"),
    ])
}

fn seeded_memory() -> MemoryFileSystem {
    let mem = MemoryFileSystem::new();
    mem.handle("s3://bucket/base/dir/a b.txt")
        .unwrap()
        .write_all(b"hello")
        .unwrap();
    mem.handle("s3://bucket/base/dir/c.txt")
        .unwrap()
        .write_all(b"c")
        .unwrap();
    mem.handle("s3://bucket/base/dir/sub")
        .unwrap()
        .create_folder()
        .unwrap();
    mem
}

fn setup() -> (MemoryFileSystem, Arc<VirtualFileSystem>) {
    init_tracing();
    let mem = seeded_memory();
    let vfs = VirtualFileSystem::new(
        Arc::new(registry()),
        Arc::new(mem.clone()),
        FileSystemOptions::new(),
    );
    (mem, vfs)
}

fn setup_with_options(options: FileSystemOptions) -> Arc<VirtualFileSystem> {
    init_tracing();
    VirtualFileSystem::new(Arc::new(registry()), Arc::new(seeded_memory()), options)
}

/// Every content and mutation operation a virtual handle forwards.
const FORWARDED_OPS: &[&str] = &[
    "content",
    "capabilities",
    "input_stream",
    "output_stream",
    "random_access",
    "child",
    "children",
    "create_file",
    "create_folder",
    "delete",
    "delete_all",
    "refresh",
    "copy_from",
    "move_to",
];

/// Mutations a read-only backend must refuse.
const MUTATING_OPS: &[&str] = &[
    "output_stream",
    "random_access",
    "create_file",
    "create_folder",
    "delete",
    "delete_all",
    "copy_from",
    "move_to",
];

/// Run one operation on `h`, discarding its value. `peer` is the other side
/// of copy/move.
fn run_op(h: &VirtualFileHandle, op: &str, peer: &VirtualFileHandle) -> VfsResult<()> {
    match op {
        "content" => h.content().map(drop),
        "capabilities" => h.capabilities().map(drop),
        "input_stream" => h.input_stream().map(drop),
        "output_stream" => h.output_stream(false).map(drop),
        "random_access" => h.random_access(AccessMode::ReadWrite).map(drop),
        "child" => h.child("x").map(drop),
        "children" => h.children().map(drop),
        "create_file" => h.create_file(),
        "create_folder" => h.create_folder(),
        "delete" => h.delete().map(drop),
        "delete_all" => h.delete_all().map(drop),
        "refresh" => h.refresh(),
        "copy_from" => h.copy_from(peer, CopySelector::All),
        "move_to" => h.move_to(peer),
        other => panic!("unknown operation {other}"),
    }
}

/// Backend that is never reachable.
#[derive(Debug)]
struct FailingManager;

impl BackingFileSystemManager for FailingManager {
    fn resolve(&self, uri: &str, _: &FileSystemOptions) -> VfsResult<Arc<dyn FileHandle>> {
        Err(VfsError::other(format!("backend down: {uri}")))
    }
}

/// Counts resolutions on the way through to a memory backend.
#[derive(Debug)]
struct CountingManager {
    inner: MemoryFileSystem,
    calls: AtomicUsize,
}

impl BackingFileSystemManager for CountingManager {
    fn resolve(&self, uri: &str, options: &FileSystemOptions) -> VfsResult<Arc<dyn FileHandle>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.resolve(uri, options)
    }
}

// ============================================================================
// Unresolvable handles
// ============================================================================

#[test]
fn test_unregistered_connection_is_imaginary() {
    let (_, vfs) = setup();
    let h = vfs.open("pvfs://nope/a.txt").unwrap();

    assert_eq!(h.kind().unwrap(), FileKind::Imaginary);
    assert!(!h.exists().unwrap());
    assert!(!h.is_resolved());
}

#[test]
fn test_unregistered_connection_content_ops_fail() {
    let (_, vfs) = setup();
    let h = vfs.open("pvfs://nope/a.txt").unwrap();

    assert!(matches!(h.content(), Err(VfsError::NotFound(_))));
    assert!(matches!(h.input_stream(), Err(VfsError::NotFound(_))));
    assert!(matches!(h.output_stream(false), Err(VfsError::NotFound(_))));
    assert!(matches!(h.children(), Err(VfsError::NotFound(_))));
    assert!(matches!(h.delete(), Err(VfsError::NotFound(_))));
    assert!(h.read_all().unwrap_err().is_not_found());
}

#[test]
fn test_every_forwarded_op_fails_not_found_when_unresolvable() {
    let (_, vfs) = setup();
    let h = vfs.open("pvfs://nope/a.txt").unwrap();
    let peer = vfs.open("pvfs://scratch/peer.txt").unwrap();

    for op in FORWARDED_OPS {
        let result = run_op(&h, op, &peer);
        assert!(matches!(result, Err(VfsError::NotFound(_))), "{op}: {result:?}");
    }
    assert!(!h.is_resolved());
}

#[test]
fn test_close_unresolved_is_noop() {
    let (mem, vfs) = setup();
    let h = vfs.open("pvfs://nope/a.txt").unwrap();
    h.close().unwrap();
    assert_eq!(mem.close_calls(), 0);
}

#[test]
fn test_scheme_root_has_no_backing() {
    let (_, vfs) = setup();
    let root = vfs.open("pvfs://").unwrap();
    assert_eq!(root.kind().unwrap(), FileKind::Imaginary);
    assert!(root.parent().is_none());
}

#[test]
fn test_unreachable_backend_is_imaginary() {
    init_tracing();
    let vfs = VirtualFileSystem::new(
        Arc::new(registry()),
        Arc::new(FailingManager),
        FileSystemOptions::new(),
    );
    let h = vfs.open("pvfs://My Connection/dir/c.txt").unwrap();

    assert_eq!(h.kind().unwrap(), FileKind::Imaginary);
    assert!(!h.exists().unwrap());
    assert!(matches!(h.content(), Err(VfsError::NotFound(_))));
    assert!(!h.is_resolved());
}

// ============================================================================
// Resolution and delegation
// ============================================================================

#[test]
fn test_resolve_and_read() {
    let (_, vfs) = setup();
    let h = vfs.open("pvfs://My Connection/dir/a%20b.txt").unwrap();

    assert_eq!(h.kind().unwrap(), FileKind::File);
    assert!(h.is_resolved());
    assert_eq!(h.read_all().unwrap(), b"hello");
    assert_eq!(h.content().unwrap().size, 5);
    assert_eq!(h.base_name(), "a b.txt");
}

#[test]
fn test_identity_stays_virtual() {
    let (_, vfs) = setup();
    let uri = "pvfs://My Connection/dir/a%20b.txt";
    let h = vfs.open(uri).unwrap();

    assert_eq!(h.original_uri(), uri);
    assert_eq!(h.public_uri(), uri);
    h.kind().unwrap();
    assert_eq!(h.original_uri(), uri);
    assert_eq!(h.public_uri(), uri);
    assert_eq!(FileHandle::uri(&h), uri);
}

#[test]
fn test_resolution_happens_once() {
    init_tracing();
    let manager = Arc::new(CountingManager {
        inner: seeded_memory(),
        calls: AtomicUsize::new(0),
    });
    let vfs = VirtualFileSystem::new(
        Arc::new(registry()),
        Arc::clone(&manager) as Arc<dyn BackingFileSystemManager>,
        FileSystemOptions::new(),
    );

    let h = vfs.open("pvfs://My Connection/dir/c.txt").unwrap();
    assert_eq!(manager.calls.load(Ordering::SeqCst), 0);

    h.kind().unwrap();
    h.read_all().unwrap();
    h.content().unwrap();
    assert_eq!(manager.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_write_through_virtual_handle() {
    let (mem, vfs) = setup();
    let h = vfs.open("pvfs://scratch/new/file.txt").unwrap();
    assert!(!h.exists().unwrap());

    h.write_all(b"written").unwrap();
    assert!(h.exists().unwrap());
    assert_eq!(
        mem.handle("test://new/file.txt").unwrap().read_all().unwrap(),
        b"written"
    );
}

#[test]
fn test_read_only_backend_errors_forwarded() {
    let vfs = setup_with_options(FileSystemOptions::new().with(READ_ONLY_OPTION, "true"));
    let peer = vfs.open("pvfs://scratch/peer.txt").unwrap();

    for op in MUTATING_OPS {
        let h = vfs.open("pvfs://My Connection/dir/c.txt").unwrap();
        let result = run_op(&h, op, &peer);
        assert!(matches!(result, Err(VfsError::ReadOnly)), "{op}: {result:?}");
        assert!(h.is_resolved(), "{op}");
    }

    let h = vfs.open("pvfs://My Connection/dir/c.txt").unwrap();
    for op in ["content", "capabilities", "input_stream", "refresh"] {
        run_op(&h, op, &peer).unwrap();
    }
    assert!(!h.capabilities().unwrap().contains(&Capability::Write));
    assert_eq!(h.read_all().unwrap(), b"c");
}

#[test]
fn test_mutations_forwarded() {
    let (mem, vfs) = setup();

    let caps = vfs.open("pvfs://scratch/x").unwrap().capabilities().unwrap();
    assert!(caps.contains(&Capability::Write));
    assert!(caps.contains(&Capability::ListChildren));

    let file = vfs.open("pvfs://scratch/made/new.txt").unwrap();
    file.create_file().unwrap();
    file.refresh().unwrap();
    assert_eq!(
        mem.handle("test://made/new.txt").unwrap().kind().unwrap(),
        FileKind::File
    );

    let folder = vfs.open("pvfs://scratch/made/folder").unwrap();
    folder.create_folder().unwrap();
    assert_eq!(folder.kind().unwrap(), FileKind::Folder);

    let made = vfs.open("pvfs://scratch/made").unwrap();
    assert_eq!(made.delete_all().unwrap(), 3);
    assert!(!made.exists().unwrap());
    assert!(!mem.handle("test://made/new.txt").unwrap().exists().unwrap());
}

#[test]
fn test_random_access_forwarded() {
    let (mem, vfs) = setup();
    let h = vfs.open("pvfs://scratch/ra.bin").unwrap();

    {
        let mut ra = h.random_access(AccessMode::ReadWrite).unwrap();
        ra.write_all(b"0123456789").unwrap();
        ra.seek(SeekFrom::Start(2)).unwrap();
        ra.write_all(b"ab").unwrap();
    }
    assert_eq!(
        mem.handle("test://ra.bin").unwrap().read_all().unwrap(),
        b"01ab456789"
    );

    let mut ra = h.random_access(AccessMode::Read).unwrap();
    ra.seek(SeekFrom::End(-3)).unwrap();
    let mut tail = String::new();
    ra.read_to_string(&mut tail).unwrap();
    assert_eq!(tail, "789");
}

#[test]
fn test_backing_errors_propagate_unchanged() {
    let (_, vfs) = setup();

    let dir = vfs.open("pvfs://My Connection/dir/").unwrap();
    assert!(matches!(dir.input_stream(), Err(VfsError::IsAFolder(_))));
    assert!(matches!(dir.delete(), Err(VfsError::FolderNotEmpty(_))));

    let file = vfs.open("pvfs://My Connection/dir/c.txt").unwrap();
    assert!(matches!(file.children(), Err(VfsError::NotAFolder(_))));
}

#[test]
fn test_close_delegates_once_resolved() {
    let (mem, vfs) = setup();
    let h = vfs.open("pvfs://My Connection/dir/c.txt").unwrap();
    h.exists().unwrap();
    h.close().unwrap();
    assert_eq!(mem.close_calls(), 1);
}

// ============================================================================
// Traversal
// ============================================================================

#[test]
fn test_children_report_virtual_uris() {
    let (_, vfs) = setup();
    let dir = vfs.open("pvfs://My Connection/dir").unwrap();
    let prefix = format!("{}/", dir.public_uri());

    let children = dir.children().unwrap();
    let uris: Vec<_> = children.iter().map(VirtualFileHandle::public_uri).collect();
    assert_eq!(
        uris,
        vec![
            "pvfs://My Connection/dir/a%20b.txt",
            "pvfs://My Connection/dir/c.txt",
            "pvfs://My Connection/dir/sub",
        ]
    );

    for child in &children {
        assert!(child.public_uri().starts_with(&prefix));
        assert!(child.is_resolved());
    }

    let sub = &children[2];
    assert_eq!(sub.virtual_path().kind(), NodeKind::Folder);
    assert_eq!(sub.kind().unwrap(), FileKind::Folder);
    assert_eq!(children[0].read_all().unwrap(), b"hello");
}

#[test]
fn test_child_lookup() {
    let (_, vfs) = setup();
    let dir = vfs.open("pvfs://My Connection/dir").unwrap();

    let child = dir.child("a b.txt").unwrap().unwrap();
    assert_eq!(child.public_uri(), "pvfs://My Connection/dir/a%20b.txt");
    assert!(dir.child("missing").unwrap().is_none());
}

#[test]
fn test_child_rejects_nested_names() {
    let (_, vfs) = setup();
    let dir = vfs.open("pvfs://My Connection/dir").unwrap();

    assert!(matches!(
        dir.child("sub/x"),
        Err(VfsError::InvalidPath(PathError::InvalidSegment(_)))
    ));
    assert!(matches!(
        dir.child(""),
        Err(VfsError::InvalidPath(PathError::EmptySegment(_)))
    ));
    assert!(!dir.is_resolved());
}

#[test]
fn test_opened_and_listed_child_share_identity() {
    let (mem, vfs) = setup();
    mem.handle("test://dir/file(1).txt")
        .unwrap()
        .write_all(b"x")
        .unwrap();

    let dir = vfs.open("pvfs://scratch/dir").unwrap();
    let listed = dir
        .children()
        .unwrap()
        .into_iter()
        .find(|c| c.base_name() == "file(1).txt")
        .unwrap();
    let looked_up = dir.child("file(1).txt").unwrap().unwrap();
    let opened = vfs.open("pvfs://scratch/dir/file(1).txt").unwrap();

    assert_eq!(listed.virtual_path(), opened.virtual_path());
    assert_eq!(looked_up.virtual_path(), opened.virtual_path());
    assert_eq!(listed.public_uri(), opened.public_uri());
    assert_eq!(opened.read_all().unwrap(), b"x");
}

#[test]
fn test_resolve_child_without_io() {
    let (_, vfs) = setup();
    let dir = vfs.open("pvfs://nope/dir").unwrap();

    let child = dir.resolve_child("new file").unwrap();
    assert_eq!(child.original_uri(), "pvfs://nope/dir/new%20file");
    assert!(!child.is_resolved());
    assert!(!dir.is_resolved());
}

#[test]
fn test_parent_reports_virtual_uri() {
    let (_, vfs) = setup();
    let file = vfs.open("pvfs://My Connection/dir/c.txt").unwrap();
    file.exists().unwrap();

    let parent = file.parent().unwrap();
    assert_eq!(parent.public_uri(), "pvfs://My Connection/dir");
    assert!(!parent.is_resolved());
    assert_eq!(parent.kind().unwrap(), FileKind::Folder);

    let conn_root = vfs.open("pvfs://My Connection/").unwrap();
    assert_eq!(conn_root.parent().unwrap().public_uri(), "pvfs://");
}

#[test]
fn test_connections_listing() {
    let (_, vfs) = setup();
    let uris: Vec<_> = vfs.connections().iter().map(|h| h.public_uri()).collect();
    assert_eq!(uris, vec!["pvfs://My Connection/", "pvfs://scratch/"]);
}

// ============================================================================
// Downstream URIs
// ============================================================================

#[test]
fn test_ael_safe_uri_rewrites_s3() {
    let (_, vfs) = setup();
    let h = vfs.open("pvfs://My Connection/dir/c.txt").unwrap();
    h.exists().unwrap();
    assert_eq!(h.ael_safe_uri().unwrap(), "s3a://bucket/base/dir/c.txt");
}

#[test]
fn test_ael_safe_uri_other_schemes_unchanged() {
    let (_, vfs) = setup();
    let h = vfs.open("pvfs://scratch/bucket").unwrap();
    h.exists().unwrap();
    assert_eq!(h.ael_safe_uri().unwrap(), "test://bucket");
}

#[test]
fn test_ael_safe_uri_requires_resolution() {
    let (_, vfs) = setup();
    let h = vfs.open("pvfs://nope/x").unwrap();
    assert!(matches!(h.ael_safe_uri(), Err(VfsError::Unsupported(_))));

    let fresh = vfs.open("pvfs://scratch/x").unwrap();
    assert!(matches!(fresh.ael_safe_uri(), Err(VfsError::Unsupported(_))));
}

// ============================================================================
// Copy and move between virtual handles
// ============================================================================

#[test]
fn test_copy_between_connections() {
    let (mem, vfs) = setup();
    let src = vfs.open("pvfs://My Connection/dir").unwrap();
    let dest = vfs.open("pvfs://scratch/copy").unwrap();
    assert!(!src.is_resolved());
    assert!(!dest.is_resolved());

    dest.copy_from(&src, CopySelector::All).unwrap();
    assert!(dest.is_resolved());

    assert_eq!(
        mem.handle("test://copy/a b.txt").unwrap().read_all().unwrap(),
        b"hello"
    );
    assert_eq!(
        mem.handle("test://copy/sub").unwrap().kind().unwrap(),
        FileKind::Folder
    );
}

#[test]
fn test_move_between_connections() {
    let (_, vfs) = setup();
    let src = vfs.open("pvfs://My Connection/dir/c.txt").unwrap();
    let dest = vfs.open("pvfs://scratch/moved.txt").unwrap();
    assert!(!dest.is_resolved());

    src.move_to(&dest).unwrap();

    assert!(dest.is_resolved());
    assert!(!src.exists().unwrap());
    assert_eq!(dest.read_all().unwrap(), b"c");
}

#[test]
fn test_move_to_unregistered_destination_keeps_source() {
    let (_, vfs) = setup();
    let src = vfs.open("pvfs://My Connection/dir/c.txt").unwrap();
    let dest = vfs.open("pvfs://nope/moved.txt").unwrap();

    assert!(matches!(src.move_to(&dest), Err(VfsError::NotFound(_))));
    assert!(!dest.is_resolved());
    assert_eq!(src.read_all().unwrap(), b"c");
}

#[test]
fn test_copy_from_unregistered_source() {
    let (_, vfs) = setup();
    let src = vfs.open("pvfs://nope/a.txt").unwrap();
    let dest = vfs.open("pvfs://scratch/copy.txt").unwrap();

    assert!(matches!(
        dest.copy_from(&src, CopySelector::All),
        Err(VfsError::NotFound(_))
    ));
    assert!(!dest.exists().unwrap());
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_from_config() {
    init_tracing();
    let config = PvfsConfig::from_toml_str(
        r#"
[options]
read_only = "true"

[[connection]]
name = "data"
scheme = "s3"
root_path = "bucket/base"
"#,
    )
    .unwrap();

    let vfs = VirtualFileSystem::from_config(&config, Arc::new(seeded_memory()));
    let h = vfs.open("pvfs://data/dir/c.txt").unwrap();
    assert_eq!(h.read_all().unwrap(), b"c");
    assert!(matches!(h.write_all(b"nope"), Err(VfsError::ReadOnly)));
}

#[test]
fn test_handles_are_thread_safe() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<VirtualFileHandle>();
    assert_send_sync::<VirtualFileSystem>();

    let (_, vfs) = setup();
    let h = Arc::new(vfs.open("pvfs://My Connection/dir/c.txt").unwrap());
    let threads: Vec<_> = (0..4)
        .map(|_| {
            let h = Arc::clone(&h);
            std::thread::spawn(move || h.read_all().unwrap())
        })
        .collect();
    for t in threads {
        assert_eq!(t.join().unwrap(), b"c");
    }
}
