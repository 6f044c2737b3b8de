// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene output errors.

use thiserror::Error;

use echo_writeref::RegistryError;

/// Failure creating an output target or flushing it to a sink.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The write-reference registry rejected the target.
    #[error("writeref registry: {0}")]
    Registry(#[from] RegistryError),
    /// The sink failed while receiving written bytes.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
