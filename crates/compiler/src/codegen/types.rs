//! Type lowering table. Maps a semantic [`Type`] to its
//! LLVM textual type. Aggregates (structs, enums, tuples, closures, `dyn`
//! values) are named types resolved through the generator's monomorphized
//! type map so recursive definitions only need to be emitted once.

use std::rc::Rc;

use crate::sem::ty::{FloatWidth, IntWidth, Type, TypeRef};

use super::mangle::mangle_generic;

/// The LLVM type a [`Type`] lowers to when it appears in a value position
/// (parameter, local, return, aggregate field). `Unit` lowers to `{}` here
/// (the zero-size singleton struct) -- callers choosing a *return* type
/// must special-case `Unit`/`Never` to `void`, since `void` is not a type
/// any value can have ( type table: "`Unit` -> void at return
/// positions, `{}` in aggregates").
pub fn llvm_type(ty: &Type) -> String {
    match ty {
        Type::SInt(w) | Type::UInt(w) => format!("i{}", w.bits()),
        Type::Float(FloatWidth::F32) => "float".to_string(),
        Type::Float(FloatWidth::F64) => "double".to_string(),
        Type::Bool => "i1".to_string(),
        Type::Char => "i32".to_string(),
        Type::Str => "ptr".to_string(),
        Type::Unit => "{}".to_string(),
        Type::Never => "void".to_string(),
        Type::Array(elem, n) => format!("[{} x {}]", n, llvm_type(elem)),
        Type::Slice(_) => "{ ptr, i64 }".to_string(),
        Type::Tuple(elems) => {
            let parts: Vec<String> = elems.iter().map(|e| llvm_type(e)).collect();
            format!("{{ {} }}", parts.join(", "))
        }
        Type::Function { .. } => "ptr".to_string(),
        Type::Closure { .. } => "{ ptr, ptr }".to_string(),
        Type::Named { name, args, .. } => {
            format!("%struct.{}", mangle_generic(name, args))
        }
        Type::Reference { .. } | Type::Pointer { .. } => "ptr".to_string(),
        Type::Generic(_) | Type::Var(_) | Type::ConstGeneric(_) => {
            // Should never reach codegen unresolved; fall back to a
            // pointer-sized opaque slot rather than panicking so a stray
            // unresolved variable degrades to a diagnostic at the call
            // site instead of aborting the whole module.
            "ptr".to_string()
        }
        Type::ConstValue(_, inner) => llvm_type(inner),
        Type::DynBehavior { name, .. } => format!("%dyn.{}", name),
        Type::ImplBehavior { .. } => {
            // Resolved to the concrete implementing type by the caller
            // before this function is reached; see
            // `CodeGen::concrete_impl_type`.
            "ptr".to_string()
        }
    }
}

/// The return-position lowering: `Unit`/`Never` become `void`.
pub fn llvm_return_type(ty: &Type) -> String {
    match ty {
        Type::Unit => "void".to_string(),
        Type::Never => "void".to_string(),
        other => llvm_type(other),
    }
}

/// Whether a type is returned/passed as an aggregate (by value, needing
/// `alloca` + `load`/`store` rather than living directly in an SSA
/// register). Primitives, pointers, and references are not aggregates;
/// everything else is.
pub fn is_aggregate(ty: &Type) -> bool {
    matches!(
        ty,
        Type::Array(..)
            | Type::Slice(_)
            | Type::Tuple(_)
            | Type::Named { .. }
            | Type::Closure { .. }
            | Type::DynBehavior { .. }
    )
}

pub fn int_width_bits(ty: &Type) -> Option<u32> {
    match ty {
        Type::SInt(w) | Type::UInt(w) => Some(w.bits()),
        Type::Bool => Some(1),
        Type::Char => Some(32),
        _ => None,
    }
}

pub fn is_signed(ty: &Type) -> bool {
    matches!(ty, Type::SInt(_))
}

pub fn unit_type() -> TypeRef {
    Rc::new(Type::Unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_lower_directly() {
        assert_eq!(llvm_type(&Type::SInt(IntWidth::W32)), "i32");
        assert_eq!(llvm_type(&Type::Bool), "i1");
        assert_eq!(llvm_type(&Type::Str), "ptr");
    }

    #[test]
    fn unit_is_void_at_return_but_empty_struct_inline() {
        assert_eq!(llvm_return_type(&Type::Unit), "void");
        assert_eq!(llvm_type(&Type::Unit), "{}");
    }

    #[test]
    fn slice_is_fat_pointer() {
        assert_eq!(
            llvm_type(&Type::Slice(std::rc::Rc::new(Type::SInt(IntWidth::W32)))),
            "{ ptr, i64 }"
        );
    }

    #[test]
    fn named_generic_lowers_to_mangled_struct() {
        let t = Type::Named {
            name: "Box".to_string(),
            module_path: vec![],
            args: vec![std::rc::Rc::new(Type::SInt(IntWidth::W32))],
        };
        assert_eq!(llvm_type(&t), "%struct.Box__I32");
    }
}
