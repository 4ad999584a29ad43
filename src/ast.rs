//! Canonical, dialect-independent constraint model.

use std::fmt;

use itertools::Itertools;
use num_bigint::BigInt;

pub type Identifier = String;
pub type TableName = Identifier;
pub type ColumnName = Identifier;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Literal {
    Integer(BigInt),
    String(String),
    Null,
}

impl Literal {
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(n) => write!(f, "{}", n),
            Literal::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Literal::Null => f.write_str("NULL"),
        }
    }
}

/// A column reference. Names are kept exactly as they were written.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Column {
    pub table: Option<TableName>,
    pub name: ColumnName,
}

impl Column {
    pub fn new(name: impl Into<ColumnName>) -> Self {
        Self {
            table: None,
            name: name.into(),
        }
    }

    pub fn with_table(table: impl Into<TableName>, name: impl Into<ColumnName>) -> Self {
        Self {
            table: Some(table.into()),
            name: name.into(),
        }
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{}.{}", table, self.name),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Comparator {
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    EqualsTo,
}

impl Comparator {
    /// The operator token, identical in SQL and SMT-LIB.
    pub fn symbol(self) -> &'static str {
        match self {
            Comparator::LessThan => "<",
            Comparator::LessThanOrEqual => "<=",
            Comparator::GreaterThan => ">",
            Comparator::GreaterThanOrEqual => ">=",
            Comparator::EqualsTo => "=",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A parsed `CHECK` expression.
///
/// Trees are compared structurally, so two spellings of the same constraint
/// are equal once the parser has normalized them. Conjunctions and
/// disjunctions stay binary and lean left: `a OR b OR c` is
/// `Or(Or(a, b), c)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Condition {
    Literal(Literal),
    Column(Column),
    Comparison {
        left: Box<Condition>,
        op: Comparator,
        right: Box<Condition>,
    },
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
    In {
        column: Column,
        values: Vec<Condition>,
    },
    Like {
        column: Column,
        pattern: String,
    },
    SimilarTo {
        column: Column,
        pattern: String,
    },
    IsNull(Column),
    IsNotNull(Column),
}

impl Condition {
    pub fn comparison(left: Condition, op: Comparator, right: Condition) -> Self {
        Self::Comparison {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn and(left: Condition, right: Condition) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Condition, right: Condition) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }

    pub fn like(column: Column, pattern: impl Into<String>) -> Self {
        Self::Like {
            column,
            pattern: pattern.into(),
        }
    }

    pub fn similar_to(column: Column, pattern: impl Into<String>) -> Self {
        Self::SimilarTo {
            column,
            pattern: pattern.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Condition::Literal(_) => "literal",
            Condition::Column(_) => "column",
            Condition::Comparison { .. } => "comparison",
            Condition::And(..) => "AND",
            Condition::Or(..) => "OR",
            Condition::In { .. } => "IN",
            Condition::Like { .. } => "LIKE",
            Condition::SimilarTo { .. } => "SIMILAR TO",
            Condition::IsNull(_) => "IS NULL",
            Condition::IsNotNull(_) => "IS NOT NULL",
        }
    }

    /// Whether this node is an operand rather than a predicate.
    pub fn is_operand(&self) -> bool {
        matches!(self, Condition::Literal(_) | Condition::Column(_))
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_operand() {
            write!(f, "{}", self)
        } else {
            write!(f, "({})", self)
        }
    }
}

impl From<Literal> for Condition {
    fn from(literal: Literal) -> Self {
        Condition::Literal(literal)
    }
}

impl From<Column> for Condition {
    fn from(column: Column) -> Self {
        Condition::Column(column)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Literal(literal) => write!(f, "{}", literal),
            Condition::Column(column) => write!(f, "{}", column),
            Condition::Comparison { left, op, right } => {
                left.fmt_operand(f)?;
                write!(f, " {} ", op)?;
                right.fmt_operand(f)
            }
            Condition::And(left, right) => {
                left.fmt_operand(f)?;
                f.write_str(" AND ")?;
                right.fmt_operand(f)
            }
            Condition::Or(left, right) => {
                left.fmt_operand(f)?;
                f.write_str(" OR ")?;
                right.fmt_operand(f)
            }
            Condition::In { column, values } => {
                write!(f, "{} IN ({})", column, values.iter().join(", "))
            }
            Condition::Like { column, pattern } => {
                write!(f, "{} LIKE {}", column, Literal::String(pattern.clone()))
            }
            Condition::SimilarTo { column, pattern } => {
                write!(f, "{} SIMILAR TO {}", column, Literal::String(pattern.clone()))
            }
            Condition::IsNull(column) => write!(f, "{} IS NULL", column),
            Condition::IsNotNull(column) => write!(f, "{} IS NOT NULL", column),
        }
    }
}

/// A `CHECK` constraint that could not be parsed or encoded.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UnsupportedConstraint {
    pub table_name: TableName,
    pub raw_text: String,
}
