//! Atomic intrinsics: `atomic::fetch_add`,
//! `atomic::load`, `atomic::store`, `atomic::compare_exchange`,
//! `atomic::swap`, and the three fence variants. Width (`i32`/`i64`) is
//! picked from the pointee type of the first argument.

use crate::sem::ty::{IntWidth, Type, TypeRef};

use super::super::state::{CodeGen, Val};

fn width_suffix(arg_tys: &[TypeRef]) -> &'static str {
    match arg_tys.first().map(|t| t.as_ref()) {
        Some(Type::Pointer { inner, .. }) | Some(Type::Reference { inner, .. }) => match inner.as_ref() {
            Type::SInt(IntWidth::W64) | Type::UInt(IntWidth::W64) => "i64",
            _ => "i32",
        },
        _ => "i32",
    }
}

pub fn try_gen(cg: &mut CodeGen, name: &str, args: &[Val], arg_tys: &[TypeRef]) -> Option<Val> {
    let suffix = width_suffix(arg_tys);
    let llty = suffix;
    match name {
        "atomic_fetch_add" => {
            let symbol = format!("atomic_fetch_add_{}", suffix);
            cg.mark_needed(symbol.clone());
            let t = cg.next_temp();
            cg.emit_line(format!("  {} = call {} @{}({}, {})", t, llty, symbol, args[0].operand(), args[1].operand()));
            Some(Val::new(llty, t))
        }
        "atomic_fetch_sub" => {
            let symbol = format!("atomic_fetch_sub_{}", suffix);
            cg.mark_needed(symbol.clone());
            let t = cg.next_temp();
            cg.emit_line(format!("  {} = call {} @{}({}, {})", t, llty, symbol, args[0].operand(), args[1].operand()));
            Some(Val::new(llty, t))
        }
        "atomic_load" => {
            let symbol = format!("atomic_load_{}", suffix);
            cg.mark_needed(symbol.clone());
            let t = cg.next_temp();
            cg.emit_line(format!("  {} = call {} @{}({})", t, llty, symbol, args[0].operand()));
            Some(Val::new(llty, t))
        }
        "atomic_store" => {
            let symbol = format!("atomic_store_{}", suffix);
            cg.mark_needed(symbol.clone());
            cg.emit_line(format!("  call void @{}({}, {})", symbol, args[0].operand(), args[1].operand()));
            Some(Val::unit())
        }
        "atomic_compare_exchange" => {
            let symbol = format!("atomic_compare_exchange_{}", suffix);
            cg.mark_needed(symbol.clone());
            let t = cg.next_temp();
            cg.emit_line(format!(
                "  {} = call i1 @{}({}, {}, {})",
                t, symbol, args[0].operand(), args[1].operand(), args[2].operand()
            ));
            Some(Val::new("i1", t))
        }
        "atomic_swap" => {
            let symbol = format!("atomic_swap_{}", suffix);
            cg.mark_needed(symbol.clone());
            let t = cg.next_temp();
            cg.emit_line(format!("  {} = call {} @{}({}, {})", t, llty, symbol, args[0].operand(), args[1].operand()));
            Some(Val::new(llty, t))
        }
        "atomic_fence" => {
            cg.mark_needed("atomic_fence");
            cg.emit_line("  call void @atomic_fence()");
            Some(Val::unit())
        }
        "atomic_fence_acquire" => {
            cg.mark_needed("atomic_fence_acquire");
            cg.emit_line("  call void @atomic_fence_acquire()");
            Some(Val::unit())
        }
        "atomic_fence_release" => {
            cg.mark_needed("atomic_fence_release");
            cg.emit_line("  call void @atomic_fence_release()");
            Some(Val::unit())
        }
        _ => None,
    }
}
