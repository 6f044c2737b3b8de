// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! DEF/USE token selection for shared objects.

use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::{Dialect, RefId, WriteObject, WriterefCounter};

/// Separator between a user name and its reference id.
pub const DEFAULT_PREFIX: &str = "+";

/// Environment variable that switches the process to
/// [`NamingPolicy::PreserveNames`] when set to a non-zero integer.
pub const PRESERVE_NAMES_ENV: &str = "ECHO_PRESERVE_OUTPUT_NAMES";

/// How shared objects are named in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingPolicy {
    /// Every multiply-referenced object gets `name<prefix><id>`.
    #[default]
    Default,
    /// Keep bare user names where no collision with an active DEF exists.
    PreserveNames,
}

impl NamingPolicy {
    /// Interpret the environment override: a non-zero integer selects
    /// [`PreserveNames`](Self::PreserveNames); anything else, or no value,
    /// selects [`Default`](Self::Default).
    pub fn from_env_value(value: Option<&str>) -> Self {
        let on = value
            .and_then(|v| v.trim().parse::<i64>().ok())
            .is_some_and(|v| v != 0);
        if on {
            Self::PreserveNames
        } else {
            Self::Default
        }
    }

    /// Process-wide policy, read from [`PRESERVE_NAMES_ENV`] on first use
    /// and cached thereafter.
    pub fn process_default() -> Self {
        static CACHED: OnceLock<NamingPolicy> = OnceLock::new();
        *CACHED.get_or_init(|| {
            Self::from_env_value(std::env::var(PRESERVE_NAMES_ENV).ok().as_deref())
        })
    }

    /// Policy applied to an object of `dialect`: legacy dialects always
    /// preserve names.
    pub fn for_dialect(self, dialect: Dialect) -> Self {
        if dialect.is_legacy() {
            Self::PreserveNames
        } else {
            self
        }
    }
}

/// Names currently DEF'd and not yet released by their last `USE`.
pub trait DefNameTable {
    /// Returns `true` if `name` is active.
    fn lookup_def_name(&self, name: &str) -> bool;
    /// Mark `name` active.
    fn add_def_name(&mut self, name: &str);
    /// Release `name`.
    fn remove_def_name(&mut self, name: &str);
}

/// Set-backed [`DefNameTable`].
#[derive(Debug, Clone, Default)]
pub struct DefNames {
    active: HashSet<String>,
}

impl DefNames {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of active names.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Returns `true` when no names are active.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Release every name.
    pub fn clear(&mut self) {
        self.active.clear();
    }
}

impl DefNameTable for DefNames {
    fn lookup_def_name(&self, name: &str) -> bool {
        self.active.contains(name)
    }

    fn add_def_name(&mut self, name: &str) {
        self.active.insert(name.to_owned());
    }

    fn remove_def_name(&mut self, name: &str) {
        self.active.remove(name);
    }
}

/// What to emit in front of an object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RefToken {
    /// First write under this name: `DEF <name> <body>`.
    Def(String),
    /// Reference to an earlier DEF: `USE <name>`.
    Use(String),
    /// First write of an unnamed, singly-referenced object: body only.
    Anonymous,
}

impl RefToken {
    /// The write name, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Def(name) | Self::Use(name) => Some(name),
            Self::Anonymous => None,
        }
    }

    /// Returns `true` for [`RefToken::Use`].
    pub fn is_use(&self) -> bool {
        matches!(self, Self::Use(_))
    }
}

impl fmt::Display for RefToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Def(name) => write!(f, "DEF {name}"),
            Self::Use(name) => write!(f, "USE {name}"),
            Self::Anonymous => Ok(()),
        }
    }
}

/// Chooses the token for each object written to one output target.
///
/// The policy is fixed when the namer is built; only the legacy-dialect
/// override is checked per object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceNamer {
    policy: NamingPolicy,
    prefix: String,
}

impl Default for ReferenceNamer {
    fn default() -> Self {
        Self::new(NamingPolicy::process_default(), DEFAULT_PREFIX)
    }
}

impl ReferenceNamer {
    /// Namer with an explicit policy and prefix.
    pub fn new(policy: NamingPolicy, prefix: impl Into<String>) -> Self {
        Self {
            policy,
            prefix: prefix.into(),
        }
    }

    /// Policy for objects of non-legacy dialects.
    pub fn policy(&self) -> NamingPolicy {
        self.policy
    }

    /// Separator between name and id.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn suffixed(&self, name: &str, refid: RefId) -> String {
        match refid {
            RefId::NoSuffix => name.to_owned(),
            RefId::Id(id) => format!("{name}{}{id}", self.prefix),
        }
    }

    /// Token for the next write of `obj`.
    ///
    /// Must be called before the object's writeref is decremented for this
    /// write: "multiref" means the object will still be used after this
    /// occurrence.
    pub fn write_name<O: WriteObject + ?Sized>(
        &self,
        obj: &O,
        counter: &mut WriterefCounter,
        defs: &mut dyn DefNameTable,
    ) -> RefToken {
        let id = obj.object_id();
        let name = obj.name();
        let multiref = counter.has_multiple_write_refs(id);
        let refid = counter.find_reference(id);

        match self.policy.for_dialect(obj.dialect()) {
            NamingPolicy::Default => match refid {
                Some(refid) => RefToken::Use(self.suffixed(name, refid)),
                None if multiref => {
                    let refid = counter.add_reference(id);
                    RefToken::Def(self.suffixed(name, RefId::Id(refid)))
                }
                None => first_write(name),
            },
            NamingPolicy::PreserveNames => match refid {
                Some(refid) => {
                    let writename = self.suffixed(name, refid);
                    if !multiref {
                        defs.remove_def_name(&writename);
                    }
                    RefToken::Use(writename)
                }
                None => {
                    let taken = defs.lookup_def_name(name);
                    if !taken && (!multiref || !name.is_empty()) {
                        if multiref {
                            defs.add_def_name(name);
                        }
                        counter.set_reference(id, RefId::NoSuffix);
                        if multiref {
                            RefToken::Def(name.to_owned())
                        } else {
                            first_write(name)
                        }
                    } else {
                        let refid = counter.add_reference(id);
                        let writename = self.suffixed(name, RefId::Id(refid));
                        defs.add_def_name(&writename);
                        RefToken::Def(writename)
                    }
                }
            },
        }
    }
}

fn first_write(name: &str) -> RefToken {
    if name.is_empty() {
        RefToken::Anonymous
    } else {
        RefToken::Def(name.to_owned())
    }
}
