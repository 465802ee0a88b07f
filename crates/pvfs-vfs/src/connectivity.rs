//! Connection testing before a connection is trusted.
//!
//! A connection passes when its backend answers and its root-path setting is
//! acceptable. The only I/O is the backend probe, which each connection type
//! supplies.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::provider::{ConnectionDescriptor, is_blank};

/// Backend-specific reachability check.
pub trait ReachabilityProbe: Send + Sync {
    fn backend_reachable(&self, descriptor: &ConnectionDescriptor) -> bool;
}

impl<F> ReachabilityProbe for F
where
    F: Fn(&ConnectionDescriptor) -> bool + Send + Sync,
{
    fn backend_reachable(&self, descriptor: &ConnectionDescriptor) -> bool {
        self(descriptor)
    }
}

/// Knobs for [`ConnectivityTester::test`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestOptions {
    /// Accept a connection even when it has a root path configured.
    #[serde(default)]
    pub ignore_root_path: bool,
}

impl TestOptions {
    pub fn ignoring_root_path() -> Self {
        Self {
            ignore_root_path: true,
        }
    }
}

/// Decides whether a connection definition is usable.
#[derive(Debug, Clone)]
pub struct ConnectivityTester<P> {
    probe: P,
}

impl<P: ReachabilityProbe> ConnectivityTester<P> {
    pub fn new(probe: P) -> Self {
        Self { probe }
    }

    /// Test a connection.
    ///
    /// An unreachable backend always fails. A reachable one fails only if it
    /// supports root paths, has a non-blank root path set, and the caller did
    /// not ask to ignore root paths. A configured domain changes nothing.
    pub fn test(&self, descriptor: &ConnectionDescriptor, options: &TestOptions) -> bool {
        if !self.probe.backend_reachable(descriptor) {
            debug!(connection = %descriptor.name, "backend unreachable");
            return false;
        }

        let root_path_ok = options.ignore_root_path
            || !descriptor.supports_root_path
            || is_blank(descriptor.root_path.as_deref());

        if !root_path_ok {
            debug!(
                connection = %descriptor.name,
                root_path = ?descriptor.root_path,
                "root path set on connection"
            );
        }
        root_path_ok
    }
}
