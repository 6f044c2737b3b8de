// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Two-pass scene writer.
//!
//! The counting pass walks the DAG and records, per node, how many times it
//! will be emitted. The write pass emits each node once in full (`DEF` when
//! it is referenced again later) and `USE` for every later occurrence.
//!
//! # ASCII layout
//!
//! ```text
//! DEF name Type {
//!   field value
//!   Child {}
//! }
//! USE name
//! ```
//!
//! # Binary layout
//!
//! Words are length-prefixed strings padded to 4 bytes; counts are `int32`.
//!
//! ```text
//! USE-node  := "USE" name
//! full-node := ["DEF" name] type field-count (field-name values)* child-count full-node|USE-node*
//! ```

use echo_field::FieldOutput;
use echo_writeref::{lock_counter, DefNames, RefToken, ReferenceNamer, WriterefCounter};
use tracing::{instrument, trace};

use crate::{SceneNode, SceneOutput};

/// Writes scene graphs to a [`SceneOutput`].
#[derive(Debug)]
pub struct WriteAction<'o> {
    out: &'o mut SceneOutput,
}

impl<'o> WriteAction<'o> {
    /// Action writing to `out`.
    pub fn new(out: &'o mut SceneOutput) -> Self {
        Self { out }
    }

    /// Count references under `root`, then write it.
    ///
    /// Every record the counting pass creates is released by the end of the
    /// write pass, so applying the action again writes complete `DEF`s
    /// again.
    #[instrument(skip_all, fields(output = %self.out.id, root = %root.id()))]
    pub fn apply(&mut self, root: &SceneNode) {
        self.out.write_header();
        let SceneOutput {
            stream,
            counter,
            namer,
            defs,
            ..
        } = &mut *self.out;
        let mut counter = lock_counter(counter);
        count_references(&mut counter, root);
        defs.clear();
        let mut pass = WritePass {
            stream,
            counter: &mut counter,
            namer,
            defs,
        };
        pass.write_node(root);
        trace!(bytes = pass.stream.as_bytes().len(), "write pass finished");
    }
}

/// Increment the writeref of `node` and mark it reachable; descend only on
/// the first visit.
fn count_references(counter: &mut WriterefCounter, node: &SceneNode) {
    let id = node.id();
    let writeref = counter.get_writeref(id) + 1;
    counter.set_writeref(node, writeref);
    counter.set_in_graph(node, true);
    if writeref == 1 {
        for child in node.children() {
            count_references(counter, child);
        }
    }
}

struct WritePass<'a> {
    stream: &'a mut FieldOutput,
    counter: &'a mut WriterefCounter,
    namer: &'a ReferenceNamer,
    defs: &'a mut DefNames,
}

impl WritePass<'_> {
    fn write_node(&mut self, node: &SceneNode) {
        let token = self.namer.write_name(node, self.counter, self.defs);
        if let RefToken::Use(name) = &token {
            self.write_use(name);
            self.counter.decrement_writeref(node);
            return;
        }
        self.write_header(node, &token);
        self.counter.decrement_writeref(node);

        if self.stream.is_binary() {
            self.write_body_binary(node);
        } else {
            self.write_body_ascii(node);
        }
    }

    fn write_use(&mut self, name: &str) {
        if self.stream.is_binary() {
            self.stream.write_word("USE");
            self.stream.write_word(name);
        } else {
            self.stream.write_indent();
            self.stream.write_str("USE ");
            self.stream.write_str(name);
            self.stream.write_str("\n");
        }
    }

    fn write_header(&mut self, node: &SceneNode, token: &RefToken) {
        let binary = self.stream.is_binary();
        if !binary {
            self.stream.write_indent();
        }
        if let Some(name) = token.name() {
            self.stream.write_word("DEF");
            if !binary {
                self.stream.write_str(" ");
            }
            self.stream.write_word(name);
            if !binary {
                self.stream.write_str(" ");
            }
        }
        self.stream.write_word(node.type_name());
    }

    fn write_body_ascii(&mut self, node: &SceneNode) {
        if node.fields().is_empty() && node.children().is_empty() {
            self.stream.write_str(" {}\n");
            return;
        }
        self.stream.write_str(" {\n");
        self.stream.increment_indent();
        for field in node.fields() {
            self.stream.write_indent();
            self.stream.write_str(field.name());
            self.stream.write_str(" ");
            field.lock().write_value(self.stream);
            self.stream.write_str("\n");
        }
        for child in node.children() {
            self.write_node(child);
        }
        self.stream.decrement_indent();
        self.stream.write_indent();
        self.stream.write_str("}\n");
    }

    fn write_body_binary(&mut self, node: &SceneNode) {
        self.stream.write_i32(count(node.fields().len()));
        for field in node.fields() {
            self.stream.write_word(field.name());
            field.lock().write_value(self.stream);
        }
        self.stream.write_i32(count(node.children().len()));
        for child in node.children() {
            self.write_node(child);
        }
    }
}

fn count(len: usize) -> i32 {
    i32::try_from(len).unwrap_or(i32::MAX)
}

/// Convenience: write `root` into `out` with a fresh [`WriteAction`].
pub fn write_scene(out: &mut SceneOutput, root: &SceneNode) {
    WriteAction::new(out).apply(root);
}
