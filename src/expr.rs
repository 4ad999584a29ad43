//! Generic SQL expression tree produced by the front end.
//!
//! The tree only records how the text was tokenized and associated. It
//! carries no SQL-domain meaning: `~~` is just a binary operator here, and
//! `similar_escape(...)` is just a function call.

use itertools::Itertools;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOperator {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Concat,
    /// `~`
    RegexMatch,
    /// `~*`
    RegexIMatch,
    /// `!~`
    RegexNotMatch,
    /// `!~*`
    RegexNotIMatch,
    /// `~~`
    PgLike,
    /// `~~*`
    PgILike,
    /// `!~~`
    PgNotLike,
    /// `!~~*`
    PgNotILike,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Or => "OR",
            Self::And => "AND",
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::Concat => "||",
            Self::RegexMatch => "~",
            Self::RegexIMatch => "~*",
            Self::RegexNotMatch => "!~",
            Self::RegexNotIMatch => "!~*",
            Self::PgLike => "~~",
            Self::PgILike => "~~*",
            Self::PgNotLike => "!~~",
            Self::PgNotILike => "!~~*",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    Minus,
    Plus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CastSyntax {
    /// `CAST(expr AS type)`
    Function,
    /// `expr::type`
    DoubleColon,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuoteStyle {
    None,
    Double,
    Backtick,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ident {
    pub value: String,
    pub quote: QuoteStyle,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Null,
    Boolean(bool),
    /// Numeric literal, kept as written.
    Number(String),
    String {
        value: String,
        charset: Option<String>,
    },
    /// Possibly qualified name, outermost qualifier first.
    Identifier(Vec<Ident>),
    Unary {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },
    IsNull {
        operand: Box<Expr>,
        negated: bool,
    },
    InList {
        operand: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },
    Like {
        operand: Box<Expr>,
        pattern: Box<Expr>,
        negated: bool,
    },
    SimilarTo {
        operand: Box<Expr>,
        pattern: Box<Expr>,
        negated: bool,
    },
    Cast {
        expr: Box<Expr>,
        data_type: String,
        syntax: CastSyntax,
    },
    Function {
        name: String,
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Self {
        Self::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOperator, operand: Expr) -> Self {
        Self::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn cast(expr: Expr, data_type: impl Into<String>, syntax: CastSyntax) -> Self {
        Self::Cast {
            expr: Box::new(expr),
            data_type: data_type.into(),
            syntax,
        }
    }

    /// Peels off any number of cast wrappers.
    pub fn strip_casts(&self) -> &Expr {
        let mut expr = self;
        while let Expr::Cast { expr: inner, .. } = expr {
            expr = inner.as_ref();
        }
        expr
    }

    /// Short description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Expr::Null => "NULL".to_owned(),
            Expr::Boolean(true) => "boolean TRUE".to_owned(),
            Expr::Boolean(false) => "boolean FALSE".to_owned(),
            Expr::Number(n) => format!("number {}", n),
            Expr::String { value, .. } => format!("string '{}'", value),
            Expr::Identifier(parts) => format!(
                "identifier {}",
                parts.iter().map(|part| part.value.as_str()).join(".")
            ),
            Expr::Unary { op, .. } => format!("unary {:?}", op),
            Expr::Binary { op, .. } => format!("operator {}", op.symbol()),
            Expr::IsNull { negated: false, .. } => "IS NULL".to_owned(),
            Expr::IsNull { negated: true, .. } => "IS NOT NULL".to_owned(),
            Expr::InList { negated: false, .. } => "IN".to_owned(),
            Expr::InList { negated: true, .. } => "NOT IN".to_owned(),
            Expr::Like { negated: false, .. } => "LIKE".to_owned(),
            Expr::Like { negated: true, .. } => "NOT LIKE".to_owned(),
            Expr::SimilarTo { negated: false, .. } => "SIMILAR TO".to_owned(),
            Expr::SimilarTo { negated: true, .. } => "NOT SIMILAR TO".to_owned(),
            Expr::Cast { data_type, .. } => format!("cast to {}", data_type),
            Expr::Function { name, .. } => format!("function {}", name),
        }
    }
}
