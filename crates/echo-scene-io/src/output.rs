// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Output target for scene writes.

use std::io::Write;

use echo_field::{ByteOrder, FieldOutput, Format};
use echo_writeref::{
    lock_counter, DefNames, OutputId, ReferenceNamer, SharedCounter, WriterConfig,
    WriterefRegistry,
};
use tracing::{debug, warn};

use crate::WriteError;

/// Header line for native ASCII files.
pub const ASCII_HEADER: &str = "#Inventor V2.1 ascii";
/// Header line for native binary files.
pub const BINARY_HEADER: &str = "#Inventor V2.1 binary";

/// A write target: byte stream plus the per-target write state.
///
/// Creating an output registers its state with the process-wide
/// [`WriterefRegistry`]; dropping it deregisters the state and, when
/// configured, reports records that were never released.
pub struct SceneOutput {
    pub(crate) id: OutputId,
    pub(crate) stream: FieldOutput,
    pub(crate) counter: SharedCounter,
    pub(crate) namer: ReferenceNamer,
    pub(crate) defs: DefNames,
    pub(crate) header: String,
    pub(crate) header_written: bool,
    config: WriterConfig,
}

impl std::fmt::Debug for SceneOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneOutput")
            .field("id", &self.id)
            .field("format", &self.stream.format())
            .field("namer", &self.namer)
            .field("written", &self.stream.as_bytes().len())
            .finish_non_exhaustive()
    }
}

impl SceneOutput {
    /// ASCII output with the default writer configuration.
    pub fn ascii() -> Result<Self, WriteError> {
        Self::new(Format::Ascii, WriterConfig::default())
    }

    /// Binary output in `order` with the default writer configuration.
    pub fn binary(order: ByteOrder) -> Result<Self, WriteError> {
        Self::new(Format::Binary(order), WriterConfig::default())
    }

    /// Output in `format` configured by `config`.
    pub fn new(format: Format, config: WriterConfig) -> Result<Self, WriteError> {
        let id = OutputId::fresh();
        let counter = WriterefRegistry::global().create(id, None)?;
        Ok(Self::assemble(id, format, counter, config, DefNames::new()))
    }

    fn assemble(
        id: OutputId,
        format: Format,
        counter: SharedCounter,
        config: WriterConfig,
        defs: DefNames,
    ) -> Self {
        let header = if format.is_binary() {
            BINARY_HEADER
        } else {
            ASCII_HEADER
        };
        Self {
            id,
            stream: FieldOutput::new(format),
            counter,
            namer: config.namer(),
            defs,
            header: header.to_owned(),
            header_written: false,
            config,
        }
    }

    /// A new target with the same format and configuration that shares
    /// this target's write records and starts from a snapshot of its
    /// reference ids and active DEF names. Its stream starts empty.
    pub fn copy_context(&self) -> Result<Self, WriteError> {
        let id = OutputId::fresh();
        let counter = WriterefRegistry::global().create(id, Some(self.id))?;
        let mut copy = Self::assemble(
            id,
            self.stream.format(),
            counter,
            self.config.clone(),
            self.defs.clone(),
        );
        copy.header.clone_from(&self.header);
        copy.header_written = self.header_written;
        debug!(output = %id, source = %self.id, "output context copied");
        Ok(copy)
    }

    /// Identity in the registry.
    pub fn id(&self) -> OutputId {
        self.id
    }

    /// Stream encoding.
    pub fn format(&self) -> Format {
        self.stream.format()
    }

    /// Write state for this target.
    pub fn counter(&self) -> &SharedCounter {
        &self.counter
    }

    /// Namer resolved for this target.
    pub fn namer(&self) -> &ReferenceNamer {
        &self.namer
    }

    /// Replace the header line written before the first scene.
    pub fn set_header(&mut self, header: impl Into<String>) {
        self.header = header.into();
    }

    /// Header line written before the first scene.
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        self.stream.as_bytes()
    }

    /// Written ASCII text; `None` for non-UTF-8 output.
    pub fn as_str(&self) -> Option<&str> {
        self.stream.as_str()
    }

    /// Take the written bytes, leaving the stream empty.
    pub fn take_bytes(&mut self) -> Vec<u8> {
        let format = self.stream.format();
        std::mem::replace(&mut self.stream, FieldOutput::new(format)).into_bytes()
    }

    /// Move the written bytes into `sink`.
    pub fn flush_to(&mut self, sink: &mut impl Write) -> Result<(), WriteError> {
        sink.write_all(&self.take_bytes())?;
        sink.flush()?;
        Ok(())
    }

    pub(crate) fn write_header(&mut self) {
        if self.header_written {
            return;
        }
        self.stream.write_str(&self.header);
        self.stream.write_str("\n");
        if !self.stream.is_binary() {
            self.stream.write_str("\n");
        }
        self.header_written = true;
    }
}

impl Drop for SceneOutput {
    fn drop(&mut self) {
        if self.config.report_leaks {
            let mut counter = lock_counter(&self.counter);
            if counter.is_last_sharer() {
                let leaked = counter.debug_cleanup();
                if leaked > 0 {
                    warn!(output = %self.id, leaked, "write records leaked");
                }
            }
        }
        if let Err(err) = WriterefRegistry::global().destruct(self.id) {
            debug!(output = %self.id, %err, "output already deregistered");
        }
    }
}
