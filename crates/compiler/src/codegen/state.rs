//! Codegen state and core types.
//!
//! One [`CodeGen`] generates IR for one module. `output` accumulates
//! function definitions in emission order; globals, runtime declarations,
//! and type definitions are assembled into the final preamble by
//! `program::codegen_module` once the body of the module is done.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::rc::Rc;

use crate::sem::ty::{Type, TypeRef};

use super::monomorphize::Worklist;

/// An LLVM value: its type and the text referring to it (an SSA register
/// like `%7` or a literal like `42`). Operands are serialized as
/// `"{llty} {text}"` wherever an instruction needs a typed operand.
#[derive(Debug, Clone)]
pub struct Val {
    pub llty: String,
    pub text: String,
}

impl Val {
    pub fn new(llty: impl Into<String>, text: impl Into<String>) -> Self {
        Val {
            llty: llty.into(),
            text: text.into(),
        }
    }

    pub fn operand(&self) -> String {
        format!("{} {}", self.llty, self.text)
    }

    pub fn unit() -> Self {
        Val::new("{}", "zeroinitializer")
    }
}

/// One local variable's codegen-time binding: the `alloca`'d slot holding
/// its value, its semantic type, and whether it was declared `mut`
/// (needed to reject a store codegen would otherwise happily emit for an
/// immutable `let` -- the borrow checker already rejected that program,
/// but defense in depth costs nothing here).
#[derive(Debug, Clone)]
pub struct Local {
    pub ptr: String,
    pub ty: TypeRef,
    pub mutable: bool,
}

/// One lexical scope's locals, paired with the per-scope list of
/// owned heap-like values to be dropped on every exit path.
#[derive(Debug, Default, Clone)]
pub struct Scope {
    pub locals: HashMap<String, Local>,
    pub drop_list: Vec<(String, TypeRef)>,
}

/// Which loop-exit labels a `break`/`continue` inside the current loop
/// nest should branch to.
#[derive(Debug, Clone)]
pub struct LoopLabels {
    pub name: Option<String>,
    pub break_label: String,
    pub continue_label: String,
}

pub struct CodeGen {
    /// Finished function definitions, in emission order.
    pub(super) output: String,
    /// String literal globals (deduped by content).
    pub(super) string_constants: HashMap<String, String>,
    pub(super) string_globals: String,
    pub(super) temp_counter: usize,
    pub(super) block_counter: usize,
    pub(super) string_counter: usize,
    pub(super) closure_counter: usize,
    /// Symbols referenced by emitted code and therefore required in the
    /// preamble.
    pub(super) needed_runtime: HashSet<String>,
    pub worklist: Worklist,
    /// Mangled struct/enum/tuple/closure type names already emitted, so a
    /// recursive instantiation doesn't redefine `%struct.Foo` twice.
    pub(super) emitted_types: HashSet<String>,
    pub(super) type_defs: String,
    /// `%dyn.Behavior` type definitions, emitted on first use.
    pub(super) emitted_dyn_types: HashSet<String>,
    /// `@vtable.Type.Behavior` constants, emitted on first
    /// `impl Behavior for Type`.
    pub(super) emitted_vtables: HashSet<String>,
    pub(super) vtable_defs: String,
    /// Lexical scope stack for local bindings and their drop lists.
    pub(super) scopes: Vec<Scope>,
    pub(super) loop_stack: Vec<LoopLabels>,
    pub(super) current_ret_ty: TypeRef,
    pub(super) current_self_ty: Option<TypeRef>,
    pub(super) in_lowlevel: bool,
    pub(super) suite_prefix: String,
    pub(super) force_internal_linkage: bool,
    pub(super) emit_debug_info: bool,
    pub(super) coverage_enabled: bool,
    /// Accumulates DWARF metadata nodes.
    pub(super) debug_metadata: String,
    pub(super) debug_counter: usize,
    pub(super) di_file_id: Option<usize>,
    pub(super) di_cu_id: Option<usize>,
    /// Struct/enum/union field layouts, keyed by mangled name, populated
    /// as each instantiation is emitted so later field-access codegen can
    /// look up an index without re-deriving it from the AST.
    pub(super) layouts: HashMap<String, Vec<(String, TypeRef)>>,
    /// Enum variant tag assignment, keyed by mangled enum name.
    pub(super) enum_variants: HashMap<String, Vec<(String, Vec<TypeRef>)>>,
    /// Union variant tag assignment, keyed by mangled union name. Unlike
    /// `enum_variants`'s positional payload, each variant's fields are
    /// named.
    pub(super) union_variants: HashMap<String, Vec<(String, Vec<(String, TypeRef)>)>>,
    /// Types with a user `Drop` implementation, keyed by declaring-module
    /// path plus name so same-named types in different modules don't
    /// share drop-ability.
    pub(super) drop_impls: HashSet<(Vec<String>, String)>,
}

impl Default for CodeGen {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeGen {
    pub fn new() -> Self {
        CodeGen {
            output: String::new(),
            string_constants: HashMap::new(),
            string_globals: String::new(),
            temp_counter: 0,
            block_counter: 0,
            string_counter: 0,
            closure_counter: 0,
            needed_runtime: HashSet::new(),
            worklist: Worklist::new(),
            emitted_types: HashSet::new(),
            type_defs: String::new(),
            emitted_dyn_types: HashSet::new(),
            emitted_vtables: HashSet::new(),
            vtable_defs: String::new(),
            scopes: Vec::new(),
            loop_stack: Vec::new(),
            current_ret_ty: Rc::new(Type::Unit),
            current_self_ty: None,
            in_lowlevel: false,
            suite_prefix: String::new(),
            force_internal_linkage: false,
            emit_debug_info: false,
            coverage_enabled: false,
            debug_metadata: String::new(),
            debug_counter: 0,
            di_file_id: None,
            di_cu_id: None,
            layouts: HashMap::new(),
            enum_variants: HashMap::new(),
            union_variants: HashMap::new(),
            drop_impls: HashSet::new(),
        }
    }

    pub fn next_temp(&mut self) -> String {
        let id = self.temp_counter;
        self.temp_counter += 1;
        format!("%t{}", id)
    }

    pub fn next_debug_id(&mut self) -> usize {
        self.debug_counter += 1;
        self.debug_counter
    }

    pub fn next_block_label(&mut self, hint: &str) -> String {
        let id = self.block_counter;
        self.block_counter += 1;
        format!("{}.{}", hint, id)
    }

    pub fn mark_needed(&mut self, symbol: impl Into<String>) {
        self.needed_runtime.insert(symbol.into());
    }

    pub fn needed_runtime_symbols(&self) -> &HashSet<String> {
        &self.needed_runtime
    }

    /// Intern a string literal as a global constant, returning its
    /// pointer-producing reference text (`@.str.N`). Deduplicated by
    /// content so the same literal appearing twice shares one global.
    pub fn intern_string(&mut self, content: &str) -> String {
        if let Some(existing) = self.string_constants.get(content) {
            return existing.clone();
        }
        let id = self.string_counter;
        self.string_counter += 1;
        let name = format!("@.str.{}", id);
        let bytes = content.as_bytes();
        let len = bytes.len() + 1;
        let escaped: String = bytes.iter().map(|b| format!("\\{:02X}", b)).collect();
        let _ = writeln!(
            self.string_globals,
            "{} = private unnamed_addr constant [{} x i8] c\"{}\\00\"",
            name, len, escaped
        );
        self.string_constants.insert(content.to_string(), name.clone());
        name
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn pop_scope(&mut self) -> Scope {
        self.scopes.pop().expect("pop_scope with no open scope")
    }

    pub fn bind_local(&mut self, name: impl Into<String>, ptr: String, ty: TypeRef, mutable: bool) {
        let owns_drop = super::drop::type_implements_drop(self, &ty);
        let name = name.into();
        if owns_drop {
            self.scopes
                .last_mut()
                .expect("at least one scope open")
                .drop_list
                .push((ptr.clone(), ty.clone()));
        }
        self.scopes
            .last_mut()
            .expect("at least one scope open")
            .locals
            .insert(name, Local { ptr, ty, mutable });
    }

    /// Snapshot of every open scope, innermost first -- used to emit
    /// drops along a non-local exit path (`return`/`break`/`continue`/
    /// the try operator's error arm) without actually popping the real
    /// scope stack, since control falls through to more code afterward
    /// in the surrounding block.
    pub fn scope_snapshot(&self) -> Vec<Scope> {
        self.scopes.iter().rev().cloned().collect()
    }

    pub fn lookup_local(&self, name: &str) -> Option<&Local> {
        for scope in self.scopes.iter().rev() {
            if let Some(l) = scope.locals.get(name) {
                return Some(l);
            }
        }
        None
    }

    pub fn push_loop(&mut self, label: &LoopLabels) {
        self.loop_stack.push(label.clone());
    }

    pub fn pop_loop(&mut self) {
        self.loop_stack.pop();
    }

    pub fn current_loop(&self, label: Option<&str>) -> Option<&LoopLabels> {
        match label {
            Some(l) => self.loop_stack.iter().rev().find(|ll| ll.name.as_deref() == Some(l)),
            None => self.loop_stack.last(),
        }
    }

    pub fn emit_line(&mut self, line: impl AsRef<str>) {
        self.output.push_str(line.as_ref());
        self.output.push('\n');
    }

    pub fn finished_output(&self) -> &str {
        &self.output
    }
}
