//! Polling-queue intrinsics backing the `async`/event-loop primitives:
//! `poll::create`, `poll::add`, `poll::wait`, etc. Named "collections"
//! because the readiness queue sits alongside the other non-growable
//! runtime-owned handles this module lowers.

use super::super::state::{CodeGen, Val};

pub fn try_gen(cg: &mut CodeGen, name: &str, args: &[Val]) -> Option<Val> {
    match name {
        "tml_poll_create" => {
            cg.mark_needed("tml_poll_create");
            let t = cg.next_temp();
            cg.emit_line(format!("  {} = call ptr @tml_poll_create()", t));
            Some(Val::new("ptr", t))
        }
        "tml_poll_destroy" => {
            cg.mark_needed("tml_poll_destroy");
            cg.emit_line(format!("  call void @tml_poll_destroy({})", args.first()?.operand()));
            Some(Val::unit())
        }
        "tml_poll_add" | "tml_poll_modify" | "tml_poll_remove" => {
            cg.mark_needed(name);
            let operands: Vec<String> = args.iter().map(|v| v.operand()).collect();
            let t = cg.next_temp();
            cg.emit_line(format!("  {} = call i32 @{}({})", t, name, operands.join(", ")));
            Some(Val::new("i32", t))
        }
        "tml_poll_wait" => {
            cg.mark_needed("tml_poll_wait");
            let operands: Vec<String> = args.iter().map(|v| v.operand()).collect();
            let t = cg.next_temp();
            cg.emit_line(format!("  {} = call i32 @tml_poll_wait({})", t, operands.join(", ")));
            Some(Val::new("i32", t))
        }
        _ => None,
    }
}
