//! Abstract syntax tree: five themed node families (types, patterns,
//! expressions, statements, declarations) plus the OOP overlay.
//!
//! Every node owns its children exclusively (`Box`/`Vec`, no shared
//! structure) and carries a [`crate::source::Span`].

pub mod decls;
pub mod exprs;
pub mod oop;
pub mod patterns;
pub mod stmts;
pub mod types;

pub use decls::{Decl, DeclKind, ModuleAst, Visibility};
pub use exprs::{Expr, ExprKind};
pub use oop::{ClassDecl, InterfaceDecl};
pub use patterns::{Pattern, PatternKind};
pub use stmts::{Stmt, StmtKind};
pub use types::{TypeKind, TypeNode};
