//! LLVM IR code generator.
//!
//! Mirrors `codegen/` split (`state`/`program`/`types`/
//! `control_flow`/`runtime`) with this language's own concerns layered on
//! top: monomorphization, vtables, closures, RAII/drop insertion, derive
//! macros, and `try`/`!` propagation. The generator is single-pass over
//! declarations with a monomorphization worklist drained to a fixpoint
//! after the initial pass.

mod builtins;
mod cheader;
mod closures;
mod control_flow;
mod debug_info;
mod derive;
mod drop;
mod error;
mod mangle;
mod monomorphize;
mod operators;
mod program;
mod runtime_decls;
mod state;
mod try_op;
mod types;
mod vtable;

pub use cheader::generate_c_header;
pub use error::{CodeGenError, CodeGenErrorKind};
pub use program::codegen_module;
pub use state::CodeGen;
