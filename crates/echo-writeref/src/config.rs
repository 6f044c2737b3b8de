// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Writer configuration.

use serde::{Deserialize, Serialize};

use crate::naming::{NamingPolicy, ReferenceNamer, DEFAULT_PREFIX};

/// Settings that shape how scene outputs name shared objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Forced naming policy; `None` defers to the process default
    /// (see [`NamingPolicy::process_default`]).
    pub policy: Option<NamingPolicy>,
    /// Separator between a name and its reference id.
    pub ref_prefix: String,
    /// Sweep and log leaked write records when an output is dropped.
    pub report_leaks: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            policy: None,
            ref_prefix: DEFAULT_PREFIX.to_owned(),
            report_leaks: cfg!(debug_assertions),
        }
    }
}

impl WriterConfig {
    /// Policy after applying the process default.
    pub fn resolved_policy(&self) -> NamingPolicy {
        self.policy.unwrap_or_else(NamingPolicy::process_default)
    }

    /// Namer for one output target.
    pub fn namer(&self) -> ReferenceNamer {
        ReferenceNamer::new(self.resolved_policy(), self.ref_prefix.clone())
    }
}
