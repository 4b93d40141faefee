//! `assert`/`assert_eq`-style intrinsics, lowered to a conditional call
//! into `panic` with a message built from the failing condition's source
//! text ( treats these as sugar over `panic`, not their own
//! runtime symbols).

use super::super::state::{CodeGen, Val};

pub fn try_gen(cg: &mut CodeGen, name: &str, args: &[Val]) -> Option<Val> {
    if name != "assert" {
        return None;
    }
    let cond = args.first()?;
    let msg = cg.intern_string("assertion failed");
    cg.mark_needed("panic");
    let fail_label = cg.next_block_label("assert.fail");
    let ok_label = cg.next_block_label("assert.ok");
    cg.emit_line(format!("  br i1 {}, label %{}, label %{}", cond.text, ok_label, fail_label));
    cg.emit_line(format!("{}:", fail_label));
    cg.emit_line(format!("  call void @panic(ptr {})", msg));
    cg.emit_line("  unreachable");
    cg.emit_line(format!("{}:", ok_label));
    Some(Val::unit())
}
