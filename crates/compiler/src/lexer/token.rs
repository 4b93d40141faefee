//! Token kinds and values produced by the lexer.

use crate::source::Span;

/// Numeric base of an integer literal, preserved so the type checker can
/// honor explicit width suffixes and so diagnostics can report the right
/// radix for "invalid digit" errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntBase {
    Decimal,
    Hex,
    Binary,
    Octal,
}

/// All possible token kinds in TML. Every keyword, operator and delimiter
/// is its own variant — no stringly-typed catch-all — mirroring the
/// `TokenKind` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Eof,

    // Literals
    IntLiteral,
    FloatLiteral,
    StringLiteral,
    RawStringLiteral,
    CharLiteral,
    BoolLiteral,
    NullLiteral,

    // Interpolated strings
    InterpStringStart,
    InterpStringMiddle,
    InterpStringEnd,

    // Template literals (backtick-delimited, produce a `Text` type)
    TemplateLiteralStart,
    TemplateLiteralMiddle,
    TemplateLiteralEnd,

    Identifier,

    // Keywords — declarations
    KwFunc,
    KwType,
    KwUnion,
    KwBehavior,
    KwImpl,
    KwMod,
    KwNamespace,
    KwUse,
    KwPub,
    KwDecorator,
    KwCrate,
    KwSuper,

    // Keywords — variables
    KwLet,
    KwVar,
    KwConst,

    // Keywords — control flow
    KwIf,
    KwThen,
    KwElse,
    KwWhen,
    KwLoop,
    KwWhile,
    KwFor,
    KwIn,
    KwTo,
    KwThrough,
    KwBreak,
    KwContinue,
    KwReturn,

    // Keywords — logical operators (word forms)
    KwAnd,
    KwOr,
    KwNot,

    // Keywords — bitwise operators (word forms)
    KwXor,
    KwShl,
    KwShr,

    // Keywords — types
    KwThis,
    KwThisType,
    KwAs,
    KwIs,

    // Keywords — memory
    KwMut,
    KwRef,
    KwLife,
    KwVolatile,

    // Keywords — closures
    KwDo,
    KwMove,

    // Keywords — other
    KwAsync,
    KwAwait,
    KwWith,
    KwWhere,
    KwDyn,
    KwLowlevel,
    KwQuote,

    // Keywords — OOP (C#-style)
    KwClass,
    KwInterface,
    KwExtends,
    KwImplements,
    KwOverride,
    KwVirtual,
    KwAbstract,
    KwSealed,
    KwBase,
    KwProtected,
    KwPrivate,
    KwStatic,
    KwNew,
    KwProp,
    KwThrow,

    // Operators — arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    StarStar,
    PlusPlus,
    MinusMinus,

    // Operators — comparison
    EqEq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,

    // Operators — bitwise
    BitAnd,
    BitOr,
    BitXor,
    BitNot,
    Shl,
    Shr,

    // Operators — logical symbols
    AndAnd,
    OrOr,

    // Operators — assignment
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
    ShlAssign,
    ShrAssign,

    // Operators — other
    Arrow,
    FatArrow,
    Dot,
    DotDot,
    DotDotEq,
    Colon,
    ColonColon,
    Question,
    Bang,
    At,
    Pipe,
    Dollar,
    DollarBrace,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Semi,

    // Special
    Newline,
    Error,

    // Documentation comments
    DocComment,
    ModuleDocComment,
}

impl TokenKind {
    /// Keywords that double as "contextual" words — `to`/`through` read as
    /// identifiers in some grammar positions are not included here; this
    /// table is purely lexical.
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        use TokenKind::*;
        Some(match s {
            "func" => KwFunc,
            "type" => KwType,
            "union" => KwUnion,
            "behavior" => KwBehavior,
            "impl" => KwImpl,
            "mod" => KwMod,
            "namespace" => KwNamespace,
            "use" => KwUse,
            "pub" => KwPub,
            "decorator" => KwDecorator,
            "crate" => KwCrate,
            "super" => KwSuper,
            "let" => KwLet,
            "var" => KwVar,
            "const" => KwConst,
            "if" => KwIf,
            "then" => KwThen,
            "else" => KwElse,
            "when" => KwWhen,
            "loop" => KwLoop,
            "while" => KwWhile,
            "for" => KwFor,
            "in" => KwIn,
            "to" => KwTo,
            "through" => KwThrough,
            "break" => KwBreak,
            "continue" => KwContinue,
            "return" => KwReturn,
            "and" => KwAnd,
            "or" => KwOr,
            "not" => KwNot,
            "xor" => KwXor,
            "shl" => KwShl,
            "shr" => KwShr,
            "this" => KwThis,
            "This" => KwThisType,
            "as" => KwAs,
            "is" => KwIs,
            "mut" => KwMut,
            "ref" => KwRef,
            "life" => KwLife,
            "volatile" => KwVolatile,
            "do" => KwDo,
            "move" => KwMove,
            "async" => KwAsync,
            "await" => KwAwait,
            "with" => KwWith,
            "where" => KwWhere,
            "dyn" => KwDyn,
            "lowlevel" | "unsafe" => KwLowlevel,
            "quote" => KwQuote,
            "class" => KwClass,
            "interface" => KwInterface,
            "extends" => KwExtends,
            "implements" => KwImplements,
            "override" => KwOverride,
            "virtual" => KwVirtual,
            "abstract" => KwAbstract,
            "sealed" => KwSealed,
            "base" => KwBase,
            "protected" => KwProtected,
            "private" => KwPrivate,
            "static" => KwStatic,
            "new" => KwNew,
            "prop" => KwProp,
            "throw" => KwThrow,
            "true" | "false" => BoolLiteral,
            "null" => NullLiteral,
            _ => return None,
        })
    }
}

/// Tagged literal payload carried by literal tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Int {
        value: i128,
        base: IntBase,
        suffix: Option<String>,
    },
    Float {
        value: f64,
        suffix: Option<String>,
    },
    Str(String),
    Char(char),
    Bool(bool),
    Null,
    None,
}

/// A single token: its kind, source span, raw lexeme slice, and literal
/// payload (if any).
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub lexeme: String,
    pub value: LiteralValue,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span, lexeme: impl Into<String>) -> Self {
        Token {
            kind,
            span,
            lexeme: lexeme.into(),
            value: LiteralValue::None,
        }
    }

    pub fn with_value(mut self, value: LiteralValue) -> Self {
        self.value = value;
        self
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}
