//! `dyn Behavior` vtable synthesis and dispatch. A `%dyn.Behavior` value
//! is the fat pointer `{ ptr data, ptr vtable }`; the vtable is a
//! constant array of function pointers, one per behavior method in
//! declaration order, so the slot index for a given method is stable
//! across every `impl` of that behavior.

use super::mangle::mangle_generic;
use super::state::{CodeGen, Val};
use super::types::llvm_type;
use crate::sem::ty::TypeRef;

/// Emit the `%dyn.Behavior = type { ptr, ptr }` definition on first use.
pub fn ensure_dyn_type(cg: &mut CodeGen, behavior_name: &str) {
    if cg.emitted_dyn_types.insert(behavior_name.to_string()) {
        cg.type_defs
            .push_str(&format!("%dyn.{} = type {{ ptr, ptr }}\n", behavior_name));
    }
}

/// Emit the `@vtable.Type.Behavior` constant for one `impl Behavior for
/// Type`, given the method names in the behavior's declaration order and
/// the mangled symbol implementing each on `Type`. A method the impl
/// doesn't override but that has a default body in the behavior
/// declaration is filled in with the default's mangled symbol by the
/// caller before this is invoked.
pub fn emit_vtable(cg: &mut CodeGen, type_name: &str, behavior_name: &str, method_symbols: &[String]) -> String {
    let key = format!("{}.{}", type_name, behavior_name);
    let vtable_name = format!("@vtable.{}", key);
    if !cg.emitted_vtables.insert(key) {
        return vtable_name;
    }
    let entries: Vec<String> = method_symbols.iter().map(|s| format!("ptr @{}", s)).collect();
    cg.vtable_defs.push_str(&format!(
        "{} = internal constant [{} x ptr] [{}]\n",
        vtable_name,
        method_symbols.len(),
        entries.join(", ")
    ));
    vtable_name
}

/// Build a `%dyn.Behavior` fat-pointer value from a concrete data pointer
/// and the behavior's vtable for that concrete type.
pub fn build_dyn_value(cg: &mut CodeGen, behavior_name: &str, data_ptr: &str, vtable_symbol: &str) -> Val {
    ensure_dyn_type(cg, behavior_name);
    let agg1 = cg.next_temp();
    cg.emit_line(format!(
        "  {} = insertvalue %dyn.{} undef, ptr {}, 0",
        agg1, behavior_name, data_ptr
    ));
    let agg2 = cg.next_temp();
    cg.emit_line(format!(
        "  {} = insertvalue %dyn.{} {}, ptr {}, 1",
        agg2, behavior_name, agg1, vtable_symbol
    ));
    Val::new(format!("%dyn.{}", behavior_name), agg2)
}

/// Lower a call through a `dyn Behavior` value: load the vtable slot at
/// `method_index`, then call through it with the data pointer as the
/// receiver argument.
pub fn call_dyn_method(
    cg: &mut CodeGen,
    behavior_name: &str,
    dyn_val: &Val,
    method_index: usize,
    args: &[Val],
    param_tys: &[TypeRef],
    ret_ty: &TypeRef,
) -> Val {
    let data_ptr = cg.next_temp();
    cg.emit_line(format!(
        "  {} = extractvalue %dyn.{} {}, 0",
        data_ptr, behavior_name, dyn_val.text
    ));
    let vtable_ptr = cg.next_temp();
    cg.emit_line(format!(
        "  {} = extractvalue %dyn.{} {}, 1",
        vtable_ptr, behavior_name, dyn_val.text
    ));
    let slot_ptr = cg.next_temp();
    cg.emit_line(format!(
        "  {} = getelementptr ptr, ptr {}, i32 {}",
        slot_ptr, vtable_ptr, method_index
    ));
    let method_ptr = cg.next_temp();
    cg.emit_line(format!("  {} = load ptr, ptr {}", method_ptr, slot_ptr));

    let ret_llty = llvm_type(ret_ty);
    let mut param_list = vec!["ptr".to_string()];
    param_list.extend(param_tys.iter().map(llvm_type));
    let mut arg_list = vec![format!("ptr {}", data_ptr)];
    arg_list.extend(args.iter().map(|v| v.operand()));
    let sig = format!("{} ({})", ret_llty, param_list.join(", "));

    if matches!(ret_ty.as_ref(), crate::sem::ty::Type::Unit | crate::sem::ty::Type::Never) {
        cg.emit_line(format!("  call {} {}({})", ret_llty, method_ptr, arg_list.join(", ")));
        return Val::unit();
    }
    let t = cg.next_temp();
    cg.emit_line(format!("  {} = call {} {}({})", t, sig, method_ptr, arg_list.join(", ")));
    Val::new(ret_llty, t)
}

pub fn mangled_vtable_entry(type_name: &str, type_args: &[TypeRef], method_name: &str) -> String {
    format!("{}__{}", mangle_generic(type_name, type_args), method_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dyn_type_is_only_emitted_once() {
        let mut cg = CodeGen::new();
        ensure_dyn_type(&mut cg, "Shape");
        ensure_dyn_type(&mut cg, "Shape");
        assert_eq!(cg.type_defs.matches("%dyn.Shape").count(), 1);
    }

    #[test]
    fn vtable_entries_preserve_declaration_order() {
        let mut cg = CodeGen::new();
        let name = emit_vtable(
            &mut cg,
            "Circle",
            "Shape",
            &["Circle__area".to_string(), "Circle__perimeter".to_string()],
        );
        assert_eq!(name, "@vtable.Circle.Shape");
        assert!(cg.vtable_defs.contains("@Circle__area"));
        let area_pos = cg.vtable_defs.find("Circle__area").unwrap();
        let perim_pos = cg.vtable_defs.find("Circle__perimeter").unwrap();
        assert!(area_pos < perim_pos);
    }
}
