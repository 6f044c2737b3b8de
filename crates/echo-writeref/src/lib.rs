// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Write-reference bookkeeping for scene serialization.
//!
//! Before a scene graph is written, a counting pass records how many times
//! each object will be emitted for a given output target. The write pass
//! then asks a [`ReferenceNamer`] for a DEF/USE token per occurrence and
//! decrements the count; when it reaches zero the object's record and
//! reference id are released.
//!
//! State is kept per output target ([`WriterefCounter`]). Copying an output
//! context shares its records but not its reference ids. The process-wide
//! [`WriterefRegistry`] maps targets to their state.

mod config;
mod counter;
mod naming;
mod object;
mod record;
mod registry;

pub use config::WriterConfig;
pub use counter::{RefId, WriterefCounter};
pub use naming::{
    DefNameTable, DefNames, NamingPolicy, RefToken, ReferenceNamer, DEFAULT_PREFIX,
    PRESERVE_NAMES_ENV,
};
pub use object::{Dialect, ObjectId, WriteObject};
pub use record::{RecordTable, WriteRecord};
pub use registry::{lock_counter, OutputId, RegistryError, SharedCounter, WriterefRegistry};
