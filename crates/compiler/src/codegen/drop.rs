//! RAII / drop insertion.
//!
//! A type is droppable if some `impl Drop for T` exists in the module
//! being compiled. The registry lives on `CodeGen` (keyed by the type's
//! declaring-module path plus its name, so two distinct same-named types
//! in different modules don't share drop-ability) and is populated once,
//! early in `program::codegen_module`, by scanning all `impl`
//! declarations before any function body is emitted -- `type_implements_drop`
//! is consulted from `CodeGen::bind_local` on every `let`/`var`/parameter
//! binding, so the registry must be complete before the first statement
//! is lowered.

use crate::sem::ty::{Type, TypeRef};

use super::state::CodeGen;

/// Record that `(module_path, type_name)` has a user `Drop` implementation.
/// Called once per compiled module, before codegen of any function body.
pub fn register_drop_impl(cg: &mut CodeGen, module_path: Vec<String>, type_name: &str) {
    cg.drop_impls.insert((module_path, type_name.to_string()));
}

pub fn type_implements_drop(cg: &CodeGen, ty: &TypeRef) -> bool {
    match ty.as_ref() {
        Type::Named { name, module_path, .. } => {
            cg.drop_impls.contains(&(module_path.clone(), name.clone()))
        }
        _ => false,
    }
}

/// Emit a call to the place's `drop` method, guarded by nothing --
/// callers are responsible for only invoking this on places whose
/// ownership hasn't been moved out from under them (the borrow checker
/// already rejects double-drops at the source level; this just lowers
/// the call the checker has already proven safe).
pub fn emit_drop_call(cg: &mut super::state::CodeGen, ptr: &str, ty: &TypeRef) {
    if let Type::Named { name, .. } = ty.as_ref() {
        let mangled = super::mangle::mangle_generic(name, &[]);
        let drop_fn = format!("@{}__drop", mangled);
        cg.emit_line(format!("  call void {}(ptr {})", drop_fn, ptr));
    }
}

/// Emit drops, in reverse declaration order, for every droppable local
/// bound directly in `scope`: drop order is the reverse of declaration
/// order, matching lexical scope exit.
pub fn emit_scope_drops(cg: &mut super::state::CodeGen, scope: &super::state::Scope) {
    for (ptr, ty) in scope.drop_list.iter().rev() {
        emit_drop_call(cg, ptr, ty);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn unregistered_named_type_is_not_droppable() {
        let cg = CodeGen::new();
        let t: TypeRef = Rc::new(Type::Named {
            name: "Widget".to_string(),
            module_path: vec![],
            args: vec![],
        });
        assert!(!type_implements_drop(&cg, &t));
    }

    #[test]
    fn registered_named_type_is_droppable() {
        let mut cg = CodeGen::new();
        register_drop_impl(&mut cg, vec![], "Widget");
        let t: TypeRef = Rc::new(Type::Named {
            name: "Widget".to_string(),
            module_path: vec![],
            args: vec![],
        });
        assert!(type_implements_drop(&cg, &t));
    }

    #[test]
    fn same_name_in_different_modules_is_distinct() {
        let mut cg = CodeGen::new();
        register_drop_impl(&mut cg, vec!["a".to_string()], "Widget");
        let in_a: TypeRef = Rc::new(Type::Named {
            name: "Widget".to_string(),
            module_path: vec!["a".to_string()],
            args: vec![],
        });
        let in_b: TypeRef = Rc::new(Type::Named {
            name: "Widget".to_string(),
            module_path: vec!["b".to_string()],
            args: vec![],
        });
        assert!(type_implements_drop(&cg, &in_a));
        assert!(!type_implements_drop(&cg, &in_b));
    }
}
