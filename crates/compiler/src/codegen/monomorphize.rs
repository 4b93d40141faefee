//! The monomorphization worklist.
//!
//! `require_struct_instantiation`/`require_enum_instantiation`/
//! `require_func_instantiation` canonicalize a `(base, type_args)` pair to
//! a mangled name; if it hasn't been seen before, a pending record is
//! queued. The record is inserted *before* the definition is emitted so a
//! recursive or mutually-recursive instantiation sees itself already
//! queued rather than looping forever.

use std::collections::HashSet;

use crate::sem::ty::TypeRef;

use super::mangle::mangle_generic;

#[derive(Debug, Clone)]
pub struct InstantiationRecord {
    pub base_name: String,
    pub type_args: Vec<TypeRef>,
    pub mangled_name: String,
}

/// Tracks which mangled names have already been queued, so requesting the
/// same instantiation twice is a no-op, plus the FIFO work queues for each
/// of the three instantiable kinds.
#[derive(Debug, Default)]
pub struct Worklist {
    seen_structs: HashSet<String>,
    seen_enums: HashSet<String>,
    seen_funcs: HashSet<String>,
    pub pending_structs: Vec<InstantiationRecord>,
    pub pending_enums: Vec<InstantiationRecord>,
    pub pending_funcs: Vec<InstantiationRecord>,
}

impl Worklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require_struct(&mut self, base: &str, args: &[TypeRef]) -> String {
        let mangled = mangle_generic(base, args);
        if self.seen_structs.insert(mangled.clone()) {
            self.pending_structs.push(InstantiationRecord {
                base_name: base.to_string(),
                type_args: args.to_vec(),
                mangled_name: mangled.clone(),
            });
        }
        mangled
    }

    pub fn require_enum(&mut self, base: &str, args: &[TypeRef]) -> String {
        let mangled = mangle_generic(base, args);
        if self.seen_enums.insert(mangled.clone()) {
            self.pending_enums.push(InstantiationRecord {
                base_name: base.to_string(),
                type_args: args.to_vec(),
                mangled_name: mangled.clone(),
            });
        }
        mangled
    }

    pub fn require_func(&mut self, base: &str, args: &[TypeRef]) -> String {
        let mangled = mangle_generic(base, args);
        if self.seen_funcs.insert(mangled.clone()) {
            self.pending_funcs.push(InstantiationRecord {
                base_name: base.to_string(),
                type_args: args.to_vec(),
                mangled_name: mangled.clone(),
            });
        }
        mangled
    }

    pub fn drain_structs(&mut self) -> Vec<InstantiationRecord> {
        std::mem::take(&mut self.pending_structs)
    }

    pub fn drain_enums(&mut self) -> Vec<InstantiationRecord> {
        std::mem::take(&mut self.pending_enums)
    }

    pub fn drain_funcs(&mut self) -> Vec<InstantiationRecord> {
        std::mem::take(&mut self.pending_funcs)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending_structs.is_empty() || !self.pending_enums.is_empty() || !self.pending_funcs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sem::ty::{IntWidth, Type};
    use std::rc::Rc;

    #[test]
    fn first_request_queues_a_record() {
        let mut w = Worklist::new();
        let args = vec![Rc::new(Type::SInt(IntWidth::W32)) as TypeRef];
        let mangled = w.require_struct("Box", &args);
        assert_eq!(mangled, "Box__I32");
        assert_eq!(w.pending_structs.len(), 1);
    }

    #[test]
    fn repeated_request_does_not_requeue() {
        let mut w = Worklist::new();
        let args = vec![Rc::new(Type::SInt(IntWidth::W32)) as TypeRef];
        w.require_struct("Box", &args);
        w.drain_structs();
        w.require_struct("Box", &args);
        assert!(w.pending_structs.is_empty());
    }

    #[test]
    fn non_generic_still_dedupes() {
        let mut w = Worklist::new();
        w.require_func("main", &[]);
        w.drain_funcs();
        w.require_func("main", &[]);
        assert!(w.pending_funcs.is_empty());
    }
}
