//! `print`/`println`/`panic` lowering.

use super::super::state::{CodeGen, Val};

pub fn try_gen(cg: &mut CodeGen, name: &str, args: &[Val]) -> Option<Val> {
    match name {
        "print" => {
            cg.mark_needed("print");
            cg.emit_line(format!("  call void @print(ptr {})", args.first()?.text));
            Some(Val::unit())
        }
        "println" => {
            cg.mark_needed("println");
            cg.emit_line(format!("  call void @println(ptr {})", args.first()?.text));
            Some(Val::unit())
        }
        "panic" => {
            cg.mark_needed("panic");
            cg.emit_line(format!("  call void @panic(ptr {})", args.first()?.text));
            cg.emit_line("  unreachable");
            Some(Val::new("void", ""))
        }
        _ => None,
    }
}
