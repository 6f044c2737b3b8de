// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene graph output for Echo.
//!
//! A [`SceneNode`] DAG is written to a [`SceneOutput`] by a [`WriteAction`].
//! Nodes reachable along several paths are written once with `DEF` and
//! referenced afterwards with `USE`; names come from the output's
//! [`echo_writeref::ReferenceNamer`].
//!
//! ```
//! use std::sync::Arc;
//! use echo_scene_io::{SceneNode, SceneOutput, WriteAction};
//!
//! let shared = SceneNode::builder("Cube").name("box").build();
//! let root = SceneNode::builder("Separator")
//!     .child(Arc::clone(&shared))
//!     .child(shared)
//!     .build();
//!
//! let mut out = SceneOutput::ascii()?;
//! WriteAction::new(&mut out).apply(&root);
//! assert!(out.as_str().is_some_and(|s| s.contains("USE box")));
//! # Ok::<(), echo_scene_io::WriteError>(())
//! ```

mod error;
mod node;
mod output;
mod write;

pub use error::WriteError;
pub use node::{SceneNode, SceneNodeBuilder};
pub use output::{SceneOutput, ASCII_HEADER, BINARY_HEADER};
pub use write::{write_scene, WriteAction};
