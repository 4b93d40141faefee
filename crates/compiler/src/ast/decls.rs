//! Top-level and nested declaration nodes.

use super::exprs::Expr;
use super::oop::{ClassDecl, InterfaceDecl};
use super::types::TypeNode;
use crate::source::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Private,
    Protected,
    Public,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decorator {
    pub name: String,
    pub args: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenericParam {
    pub name: String,
    pub bounds: Vec<TypeNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstParam {
    pub name: String,
    pub ty: TypeNode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    pub type_param: String,
    pub bound: TypeNode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncParam {
    pub name: String,
    pub ty: TypeNode,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncSignature {
    pub name: String,
    pub generics: Vec<GenericParam>,
    pub const_generics: Vec<ConstParam>,
    pub params: Vec<FuncParam>,
    /// `None` means the declared return type is `Unit`.
    pub ret: Option<TypeNode>,
    pub where_clauses: Vec<WhereClause>,
    pub is_async: bool,
    pub is_lowlevel: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub sig: FuncSignature,
    /// `None` for a signature-only declaration (behavior method without a
    /// default body, interface method).
    pub body: Option<Expr>,
    pub visibility: Visibility,
    pub decorators: Vec<Decorator>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub name: String,
    pub ty: TypeNode,
    pub visibility: Visibility,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub name: String,
    pub generics: Vec<GenericParam>,
    pub const_generics: Vec<ConstParam>,
    pub fields: Vec<StructField>,
    pub visibility: Visibility,
    pub decorators: Vec<Decorator>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumVariant {
    pub name: String,
    /// Positional payload types; empty for a unit variant.
    pub payload: Vec<TypeNode>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub name: String,
    pub generics: Vec<GenericParam>,
    pub const_generics: Vec<ConstParam>,
    pub variants: Vec<EnumVariant>,
    pub visibility: Visibility,
    pub decorators: Vec<Decorator>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionVariant {
    pub name: String,
    /// Named fields carried by this variant; empty for a unit variant.
    /// Unlike `EnumVariant`'s positional payload, a union variant's
    /// fields are named (`Get { response_chan: I32 }`).
    pub fields: Vec<StructField>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionDecl {
    pub name: String,
    pub generics: Vec<GenericParam>,
    pub const_generics: Vec<ConstParam>,
    pub variants: Vec<UnionVariant>,
    pub visibility: Visibility,
    pub decorators: Vec<Decorator>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssociatedTypeDecl {
    pub name: String,
    pub bound: Option<TypeNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorDecl {
    pub name: String,
    pub generics: Vec<GenericParam>,
    pub associated_types: Vec<AssociatedTypeDecl>,
    pub methods: Vec<FuncDecl>,
    pub visibility: Visibility,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImplDecl {
    pub generics: Vec<GenericParam>,
    /// `None` for an inherent impl.
    pub behavior: Option<TypeNode>,
    pub self_ty: TypeNode,
    pub where_clauses: Vec<WhereClause>,
    pub methods: Vec<FuncDecl>,
    pub assoc_type_bindings: Vec<(String, TypeNode)>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeAliasDecl {
    pub name: String,
    pub generics: Vec<GenericParam>,
    pub target: TypeNode,
    pub visibility: Visibility,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstDecl {
    pub name: String,
    pub ty: TypeNode,
    pub value: Expr,
    pub visibility: Visibility,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UseTree {
    /// `use a::b::c` or `use a::b::c as d`.
    Single {
        path: Vec<String>,
        alias: Option<String>,
    },
    /// `use a::b::*`.
    Glob { path: Vec<String> },
    /// `use a::b::{c, d as e}`.
    Group {
        prefix: Vec<String>,
        items: Vec<UseTree>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct UseDecl {
    pub tree: UseTree,
    pub visibility: Visibility,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModDecl {
    pub name: String,
    /// `Some` for an inline `mod name { .. }`; `None` for a file-backed
    /// `mod name` forward declaration resolved by the module loader.
    pub items: Option<Vec<Decl>>,
    pub visibility: Visibility,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecoratorDecl {
    pub name: String,
    pub params: Vec<FuncParam>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclKind {
    Func(FuncDecl),
    Struct(StructDecl),
    Enum(EnumDecl),
    /// A closed sum type like `enum`, but each variant carries *named*
    /// fields (`Get { response_chan: I32 }`) rather than a positional
    /// payload tuple. Lowers the same way `enum` does: a tag plus a
    /// shared payload area sized to the widest variant.
    Union(UnionDecl),
    Behavior(BehaviorDecl),
    Impl(ImplDecl),
    TypeAlias(TypeAliasDecl),
    Const(ConstDecl),
    Use(UseDecl),
    Mod(ModDecl),
    DecoratorDef(DecoratorDecl),
    Class(ClassDecl),
    Interface(InterfaceDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decl {
    pub kind: DeclKind,
    pub span: Span,
}

impl Decl {
    pub fn new(kind: DeclKind, span: Span) -> Self {
        Decl { kind, span }
    }
}

/// A parsed source file: an ordered list of top-level declarations plus
/// module-level metadata.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModuleAst {
    pub module_doc: Vec<String>,
    pub decls: Vec<Decl>,
}
