//! `Str` helper intrinsics backing interpolation, concatenation, and
//! formatting.

use super::super::state::{CodeGen, Val};

pub fn try_gen(cg: &mut CodeGen, name: &str, args: &[Val]) -> Option<Val> {
    match name {
        "str_concat" => {
            cg.mark_needed("str_concat");
            let t = cg.next_temp();
            cg.emit_line(format!("  {} = call ptr @str_concat({}, {})", t, args[0].operand(), args[1].operand()));
            Some(Val::new("ptr", t))
        }
        "str_len" => {
            cg.mark_needed("str_len");
            let t = cg.next_temp();
            cg.emit_line(format!("  {} = call i64 @str_len({})", t, args[0].operand()));
            Some(Val::new("i64", t))
        }
        "str_eq" => {
            cg.mark_needed("str_eq");
            let t = cg.next_temp();
            cg.emit_line(format!("  {} = call i1 @str_eq({}, {})", t, args[0].operand(), args[1].operand()));
            Some(Val::new("i1", t))
        }
        "str_hash" => {
            cg.mark_needed("str_hash");
            let t = cg.next_temp();
            cg.emit_line(format!("  {} = call i64 @str_hash({})", t, args[0].operand()));
            Some(Val::new("i64", t))
        }
        "str_from_i64" | "str_from_f64" | "str_from_bool" => {
            cg.mark_needed(name);
            let t = cg.next_temp();
            cg.emit_line(format!("  {} = call ptr @{}({})", t, name, args[0].operand()));
            Some(Val::new("ptr", t))
        }
        _ => None,
    }
}
