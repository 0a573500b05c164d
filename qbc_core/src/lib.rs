//! Runtime library for compiled QBasic programs.
//!
//! A compiled module (see [`program`]) is a flat, labelled statement list
//! whose instructions the [`executor`] trampoline interprets against a
//! [`host::Host`]. Built-in functions, the array object, PRINT/INPUT
//! semantics, and numeric coercion all live here so the compiler stays
//! platform-agnostic.

pub mod array;
pub mod builtins;
pub mod error;
pub mod executor;
pub mod host;
pub mod input;
pub mod print;
pub mod program;
pub mod types;
pub mod value;

pub mod prelude {
    pub use crate::error::RuntimeError;
    pub use crate::executor::{ExecOutcome, Executor};
    pub use crate::host::{Host, StdHost, TestHost};
    pub use crate::program::{parse_module_source, CompiledModule, Loc};
    pub use crate::types::TypeSpec;
    pub use crate::value::Value;
}
