// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identity of objects written to a scene output.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-unique identity of a writable object.
///
/// Write state is keyed by identity, not by name: two objects sharing a
/// user name are still distinct entries.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ObjectId(pub u64);

impl ObjectId {
    /// Mint an id never returned before in this process.
    pub fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// File dialect an object belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    /// Native Inventor files.
    #[default]
    Inventor,
    /// VRML 1.0.
    Vrml1,
    /// VRML 2.0 (VRML97).
    Vrml2,
}

impl Dialect {
    /// Legacy dialects always keep user names when written.
    pub fn is_legacy(self) -> bool {
        matches!(self, Self::Vrml1 | Self::Vrml2)
    }
}

/// An object the write-reference machinery can track and name.
pub trait WriteObject {
    /// Stable identity.
    fn object_id(&self) -> ObjectId;

    /// User-assigned name; empty when unnamed.
    fn name(&self) -> &str;

    /// Dialect the object belongs to.
    fn dialect(&self) -> Dialect {
        Dialect::Inventor
    }
}
