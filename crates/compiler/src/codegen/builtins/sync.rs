//! Concurrency primitives: threads, channels,
//! mutexes, wait groups, and spinlocks.

use super::super::state::{CodeGen, Val};

pub fn try_gen(cg: &mut CodeGen, name: &str, args: &[Val]) -> Option<Val> {
    match name {
        "thread_spawn" => {
            cg.mark_needed("thread_spawn");
            let t = cg.next_temp();
            cg.emit_line(format!(
                "  {} = call ptr @thread_spawn({}, {})",
                t, args[0].operand(), args[1].operand()
            ));
            Some(Val::new("ptr", t))
        }
        "thread_join" => {
            cg.mark_needed("thread_join");
            cg.emit_line(format!("  call void @thread_join({})", args[0].operand()));
            Some(Val::unit())
        }
        "thread_yield" => {
            cg.mark_needed("thread_yield");
            cg.emit_line("  call void @thread_yield()");
            Some(Val::unit())
        }
        "thread_sleep" => {
            cg.mark_needed("thread_sleep");
            cg.emit_line(format!("  call void @thread_sleep({})", args[0].operand()));
            Some(Val::unit())
        }
        "thread_id" => {
            cg.mark_needed("thread_id");
            let t = cg.next_temp();
            cg.emit_line(format!("  {} = call i64 @thread_id()", t));
            Some(Val::new("i64", t))
        }
        "channel_create" => {
            cg.mark_needed("channel_create");
            let t = cg.next_temp();
            cg.emit_line(format!("  {} = call ptr @channel_create({})", t, args[0].operand()));
            Some(Val::new("ptr", t))
        }
        "channel_send" => {
            cg.mark_needed("channel_send");
            cg.emit_line(format!("  call void @channel_send({}, {})", args[0].operand(), args[1].operand()));
            Some(Val::unit())
        }
        "channel_recv" | "channel_try_recv" => {
            cg.mark_needed(name);
            let t = cg.next_temp();
            cg.emit_line(format!("  {} = call ptr @{}({})", t, name, args[0].operand()));
            Some(Val::new("ptr", t))
        }
        "channel_close" => {
            cg.mark_needed("channel_close");
            cg.emit_line(format!("  call void @channel_close({})", args[0].operand()));
            Some(Val::unit())
        }
        "mutex_create" => {
            cg.mark_needed("mutex_create");
            let t = cg.next_temp();
            cg.emit_line(format!("  {} = call ptr @mutex_create()", t));
            Some(Val::new("ptr", t))
        }
        "mutex_lock" => {
            cg.mark_needed("mutex_lock");
            cg.emit_line(format!("  call void @mutex_lock({})", args[0].operand()));
            Some(Val::unit())
        }
        "mutex_unlock" => {
            cg.mark_needed("mutex_unlock");
            cg.emit_line(format!("  call void @mutex_unlock({})", args[0].operand()));
            Some(Val::unit())
        }
        "mutex_trylock" => {
            cg.mark_needed("mutex_trylock");
            let t = cg.next_temp();
            cg.emit_line(format!("  {} = call i1 @mutex_trylock({})", t, args[0].operand()));
            Some(Val::new("i1", t))
        }
        "waitgroup_create" => {
            cg.mark_needed("waitgroup_create");
            let t = cg.next_temp();
            cg.emit_line(format!("  {} = call ptr @waitgroup_create()", t));
            Some(Val::new("ptr", t))
        }
        "waitgroup_add" => {
            cg.mark_needed("waitgroup_add");
            cg.emit_line(format!("  call void @waitgroup_add({}, {})", args[0].operand(), args[1].operand()));
            Some(Val::unit())
        }
        "waitgroup_done" => {
            cg.mark_needed("waitgroup_done");
            cg.emit_line(format!("  call void @waitgroup_done({})", args[0].operand()));
            Some(Val::unit())
        }
        "waitgroup_wait" => {
            cg.mark_needed("waitgroup_wait");
            cg.emit_line(format!("  call void @waitgroup_wait({})", args[0].operand()));
            Some(Val::unit())
        }
        "spin_lock" => {
            cg.mark_needed("spin_lock");
            cg.emit_line(format!("  call void @spin_lock({})", args[0].operand()));
            Some(Val::unit())
        }
        "spin_unlock" => {
            cg.mark_needed("spin_unlock");
            cg.emit_line(format!("  call void @spin_unlock({})", args[0].operand()));
            Some(Val::unit())
        }
        "spin_trylock" => {
            cg.mark_needed("spin_trylock");
            let t = cg.next_temp();
            cg.emit_line(format!("  {} = call i1 @spin_trylock({})", t, args[0].operand()));
            Some(Val::new("i1", t))
        }
        _ => None,
    }
}
