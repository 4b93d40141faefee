//! Closure lowering.
//!
//! A closure value is the pair `{ ptr fn, ptr env }`. The environment is
//! a heap-allocated struct holding one field per captured name (by value
//! for `move` closures, by reference otherwise); the function pointer's
//! first parameter is always the environment pointer, hidden from the
//! closure's declared parameter list. A closure that captures nothing
//! coerces to a plain function pointer at call sites that expect one,
//! since its env pointer is never dereferenced.

use crate::sem::ty::TypeRef;

use super::mangle::mangle_generic;
use super::state::{CodeGen, Val};
use super::types::llvm_type;

/// One captured variable: its source name, its pointer in the enclosing
/// function, and its type.
pub struct Capture {
    pub name: String,
    pub ptr: String,
    pub ty: TypeRef,
}

/// Emit the environment struct type (if not already emitted) and the
/// `malloc` + field stores that build one instance, returning its
/// pointer.
pub fn build_environment(cg: &mut CodeGen, closure_id: usize, captures: &[Capture]) -> String {
    let type_name = format!("closure.env.{}", closure_id);
    if captures.is_empty() {
        return "null".to_string();
    }
    if cg.emitted_types.insert(type_name.clone()) {
        let fields: Vec<String> = captures.iter().map(|c| llvm_type(&c.ty)).collect();
        cg.type_defs.push_str(&format!(
            "%struct.{} = type {{ {} }}\n",
            type_name,
            fields.join(", ")
        ));
    }
    cg.mark_needed("mem_alloc");
    let size_ptr = cg.next_temp();
    cg.emit_line(format!(
        "  {} = getelementptr %struct.{}, ptr null, i32 1",
        size_ptr, type_name
    ));
    let size = cg.next_temp();
    cg.emit_line(format!("  {} = ptrtoint ptr {} to i64", size, size_ptr));
    let env = cg.next_temp();
    cg.emit_line(format!("  {} = call ptr @mem_alloc(i64 {})", env, size));
    for (idx, cap) in captures.iter().enumerate() {
        let field_ptr = cg.next_temp();
        cg.emit_line(format!(
            "  {} = getelementptr %struct.{}, ptr {}, i32 0, i32 {}",
            field_ptr, type_name, env, idx
        ));
        let llty = llvm_type(&cap.ty);
        let loaded = cg.next_temp();
        cg.emit_line(format!("  {} = load {}, ptr {}", loaded, llty, cap.ptr));
        cg.emit_line(format!("  store {} {}, ptr {}", llty, loaded, field_ptr));
    }
    env
}

/// Build a `{ ptr, ptr }` closure value from a function symbol and an
/// already-built environment pointer.
pub fn build_closure_value(cg: &mut CodeGen, fn_symbol: &str, env_ptr: &str) -> Val {
    let agg1 = cg.next_temp();
    cg.emit_line(format!(
        "  {} = insertvalue {{ ptr, ptr }} undef, ptr {}, 0",
        agg1, fn_symbol
    ));
    let agg2 = cg.next_temp();
    cg.emit_line(format!(
        "  {} = insertvalue {{ ptr, ptr }} {}, ptr {}, 1",
        agg2, agg1, env_ptr
    ));
    Val::new("{ ptr, ptr }", agg2)
}

/// Call a closure value: extract the fn pointer and env pointer, then
/// call through the pointer with the env prepended to the argument list.
pub fn call_closure(cg: &mut CodeGen, closure_val: &Val, args: &[Val], param_tys: &[TypeRef], ret_ty: &TypeRef) -> Val {
    let fn_ptr = cg.next_temp();
    cg.emit_line(format!("  {} = extractvalue {{ ptr, ptr }} {}, 0", fn_ptr, closure_val.text));
    let env_ptr = cg.next_temp();
    cg.emit_line(format!("  {} = extractvalue {{ ptr, ptr }} {}, 1", env_ptr, closure_val.text));

    let ret_llty = llvm_type(ret_ty);
    let mut param_list = vec!["ptr".to_string()];
    param_list.extend(param_tys.iter().map(|t| llvm_type(t)));
    let mut arg_list = vec![format!("ptr {}", env_ptr)];
    arg_list.extend(args.iter().map(|v| v.operand()));

    let sig = format!("{} ({})", ret_llty, param_list.join(", "));
    if matches!(ret_ty.as_ref(), crate::sem::ty::Type::Unit | crate::sem::ty::Type::Never) {
        cg.emit_line(format!("  call {} {}({})", ret_llty, fn_ptr, arg_list.join(", ")));
        return Val::unit();
    }
    let t = cg.next_temp();
    cg.emit_line(format!(
        "  {} = call {} {}({})",
        t, sig, fn_ptr, arg_list.join(", ")
    ));
    Val::new(ret_llty, t)
}

pub fn mangled_closure_fn_name(enclosing: &str, closure_id: usize) -> String {
    mangle_generic(&format!("{}.closure.{}", enclosing, closure_id), &[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_capture_list_needs_no_environment() {
        let mut cg = CodeGen::new();
        let env = build_environment(&mut cg, 0, &[]);
        assert_eq!(env, "null");
    }

    #[test]
    fn closure_value_is_built_as_fat_pointer_pair() {
        let mut cg = CodeGen::new();
        let v = build_closure_value(&mut cg, "@foo.closure.0", "null");
        assert_eq!(v.llty, "{ ptr, ptr }");
    }
}
