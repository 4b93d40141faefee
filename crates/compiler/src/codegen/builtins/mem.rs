//! Raw memory intrinsics: `mem::alloc`,
//! `mem::free`, `mem::copy`, `mem::zero`, etc.

use super::super::state::{CodeGen, Val};

const NAMES: &[(&str, &str)] = &[
    ("mem_alloc", "mem_alloc"),
    ("mem_free", "mem_free"),
    ("mem_copy", "mem_copy"),
    ("mem_move", "mem_move"),
    ("mem_set", "mem_set"),
    ("mem_zero", "mem_zero"),
    ("mem_compare", "mem_compare"),
    ("mem_eq", "mem_eq"),
    ("mem_realloc", "mem_realloc"),
];

pub fn try_gen(cg: &mut CodeGen, name: &str, args: &[Val]) -> Option<Val> {
    let (_, symbol) = NAMES.iter().find(|(n, _)| *n == name)?;
    cg.mark_needed(*symbol);
    let operands: Vec<String> = args.iter().map(|v| v.operand()).collect();
    let sym = super::super::runtime_decls::lookup(symbol)?;
    let returns_void = sym.decl.starts_with("declare void");
    if returns_void {
        cg.emit_line(format!("  call void @{}({})", symbol, operands.join(", ")));
        Some(Val::unit())
    } else {
        let ret_ty = if sym.decl.starts_with("declare ptr") {
            "ptr"
        } else if sym.decl.starts_with("declare i1") {
            "i1"
        } else if sym.decl.starts_with("declare i64") {
            "i64"
        } else {
            "i32"
        };
        let t = cg.next_temp();
        cg.emit_line(format!("  {} = call {} @{}({})", t, ret_ty, symbol, operands.join(", ")));
        Some(Val::new(ret_ty, t))
    }
}
