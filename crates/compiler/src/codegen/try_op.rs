//! Postfix `!` / try-operator lowering.
//!
//! `expr!` on an `Outcome[T,E]` unwraps `Ok(T)` to `T`, or on `Err(e)`
//! runs every pending scope's drops and returns `Err(e)` from the
//! enclosing function (whose own return type must be a compatible
//! `Outcome`/`Maybe`, checked by the semantic pass before codegen ever
//! sees this node). `Maybe[T]` behaves the same way with `Just`/`Nothing`
//! in place of `Ok`/`Err`.
//!
//! Both closed enums share the tag-then-payload representation every
//! generated enum uses: `{ i32 tag, T0 payload }`, tag `0` for the first
//! declared variant (`Ok`/`Just`) and `1` for the second
//! (`Err`/`Nothing`).

use crate::sem::ty::TypeRef;

use super::drop::emit_scope_drops;
use super::state::{CodeGen, Val};
use super::types::llvm_type;

pub enum TryKind {
    Outcome,
    Maybe,
}

/// Lower `scrutinee!`. `scrutinee_ptr` is a pointer to the already
/// materialized `Outcome`/`Maybe` value; `payload_ty`/`error_ty` are the
/// `Ok`/`Err` (or `Just`/unit) payload types; `enclosing_ret_ty` is the
/// function's declared return type, used to build the early-return
/// value with the original enum's shape.
pub fn codegen_try(
    cg: &mut CodeGen,
    kind: TryKind,
    scrutinee_ptr: &str,
    enum_llty: &str,
    payload_ty: &TypeRef,
    error_ty: Option<&TypeRef>,
) -> Val {
    let tag_ptr = cg.next_temp();
    cg.emit_line(format!("  {} = getelementptr {}, ptr {}, i32 0, i32 0", tag_ptr, enum_llty, scrutinee_ptr));
    let tag = cg.next_temp();
    cg.emit_line(format!("  {} = load i32, ptr {}", tag, tag_ptr));
    let is_ok = cg.next_temp();
    cg.emit_line(format!("  {} = icmp eq i32 {}, 0", is_ok, tag));

    let ok_label = cg.next_block_label("try.ok");
    let err_label = cg.next_block_label("try.err");
    let cont_label = cg.next_block_label("try.cont");
    cg.emit_line(format!("  br i1 {}, label %{}, label %{}", is_ok, ok_label, err_label));

    cg.emit_line(format!("{}:", err_label));
    for scope in cg.scope_snapshot() {
        emit_scope_drops(cg, &scope);
    }
    match kind {
        TryKind::Outcome => {
            let err_llty = error_ty.map(llvm_type).unwrap_or_else(|| "{}".to_string());
            let payload_ptr = cg.next_temp();
            cg.emit_line(format!(
                "  {} = getelementptr {}, ptr {}, i32 0, i32 1",
                payload_ptr, enum_llty, scrutinee_ptr
            ));
            let err_val = cg.next_temp();
            cg.emit_line(format!("  {} = load {}, ptr {}", err_val, err_llty, payload_ptr));
            let ret_slot = cg.next_temp();
            cg.emit_line(format!("  {} = alloca {}", ret_slot, enum_llty));
            let ret_tag_ptr = cg.next_temp();
            cg.emit_line(format!("  {} = getelementptr {}, ptr {}, i32 0, i32 0", ret_tag_ptr, enum_llty, ret_slot));
            cg.emit_line(format!("  store i32 1, ptr {}", ret_tag_ptr));
            let ret_payload_ptr = cg.next_temp();
            cg.emit_line(format!("  {} = getelementptr {}, ptr {}, i32 0, i32 1", ret_payload_ptr, enum_llty, ret_slot));
            cg.emit_line(format!("  store {} {}, ptr {}", err_llty, err_val, ret_payload_ptr));
            let ret_val = cg.next_temp();
            cg.emit_line(format!("  {} = load {}, ptr {}", ret_val, enum_llty, ret_slot));
            cg.emit_line(format!("  ret {} {}", enum_llty, ret_val));
        }
        TryKind::Maybe => {
            let ret_slot = cg.next_temp();
            cg.emit_line(format!("  {} = alloca {}", ret_slot, enum_llty));
            let ret_tag_ptr = cg.next_temp();
            cg.emit_line(format!("  {} = getelementptr {}, ptr {}, i32 0, i32 0", ret_tag_ptr, enum_llty, ret_slot));
            cg.emit_line(format!("  store i32 1, ptr {}", ret_tag_ptr));
            let ret_val = cg.next_temp();
            cg.emit_line(format!("  {} = load {}, ptr {}", ret_val, enum_llty, ret_slot));
            cg.emit_line(format!("  ret {} {}", enum_llty, ret_val));
        }
    }

    cg.emit_line(format!("{}:", ok_label));
    let payload_llty = llvm_type(payload_ty);
    let payload_ptr = cg.next_temp();
    cg.emit_line(format!(
        "  {} = getelementptr {}, ptr {}, i32 0, i32 1",
        payload_ptr, enum_llty, scrutinee_ptr
    ));
    let payload_val = cg.next_temp();
    cg.emit_line(format!("  {} = load {}, ptr {}", payload_val, payload_llty, payload_ptr));
    cg.emit_line(format!("  br label %{}", cont_label));

    cg.emit_line(format!("{}:", cont_label));
    Val::new(payload_llty, payload_val)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sem::ty::{IntWidth, Type};
    use std::rc::Rc;

    #[test]
    fn try_on_outcome_branches_on_tag() {
        let mut cg = CodeGen::new();
        cg.push_scope();
        let payload_ty: TypeRef = Rc::new(Type::SInt(IntWidth::W32));
        let error_ty: TypeRef = Rc::new(Type::Str);
        codegen_try(
            &mut cg,
            TryKind::Outcome,
            "%scrutinee",
            "%struct.Outcome__I32__Str",
            &payload_ty,
            Some(&error_ty),
        );
        cg.pop_scope();
        let out = cg.finished_output().to_string();
        assert!(out.contains("icmp eq i32"));
        assert!(out.contains("ret "));
    }
}
