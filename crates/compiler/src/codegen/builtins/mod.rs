//! FFI/runtime intrinsic lowering, split by
//! category the way the runtime catalogue in `runtime_decls` is grouped.
//! Each category module exposes one `try_gen_builtin_*` that recognizes
//! the handful of free-function names it owns and lowers a call to them
//! directly to the matching runtime symbol (marking it needed so
//! `runtime_decls::emit_runtime_decls` declares it); anything it doesn't
//! recognize falls through to the next category, and finally to a plain
//! user/monomorphized function call in `program.rs`.

mod assert;
mod atomic;
mod collections;
mod io;
mod math;
mod mem;
mod string;
mod sync;

use crate::sem::ty::TypeRef;

use super::state::{CodeGen, Val};

pub fn try_gen_builtin(cg: &mut CodeGen, name: &str, args: &[Val], arg_tys: &[TypeRef]) -> Option<Val> {
    io::try_gen(cg, name, args)
        .or_else(|| mem::try_gen(cg, name, args))
        .or_else(|| atomic::try_gen(cg, name, args, arg_tys))
        .or_else(|| collections::try_gen(cg, name, args))
        .or_else(|| sync::try_gen(cg, name, args))
        .or_else(|| assert::try_gen(cg, name, args))
        .or_else(|| math::try_gen(cg, name, args))
        .or_else(|| string::try_gen(cg, name, args))
}
