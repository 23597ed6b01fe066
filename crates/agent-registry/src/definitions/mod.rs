//! Built-in agent definitions.
//!
//! Adding a definition means adding a module here and one line to
//! [`BUILTIN`]; the loader does not change.

mod advanced;
mod basic;
mod custom;

use crate::definition::DefinitionFn;

/// Compiled-in registration table, in catalog order
pub static BUILTIN: &[(&str, DefinitionFn)] = &[
    ("basic", basic::definition),
    ("advanced", advanced::definition),
    ("custom", custom::definition),
];
