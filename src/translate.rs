//! Lowering of the generic expression tree into canonical conditions.

use std::cell::Cell;

use num_bigint::BigInt;

use crate::ast::{Column, Comparator, Condition, Literal};
use crate::dialect::Dialect;
use crate::error::ParseError;
use crate::expr::{BinaryOperator, CastSyntax, Expr, Ident, QuoteStyle, UnaryOperator};
use crate::parser::parse_expression;

const SIMILAR_ESCAPE: &str = "similar_escape";
const SIMILAR_TO_ESCAPE: &str = "similar_to_escape";

/// How deep predicates may nest inside each other. `AND`/`OR` chains are
/// walked in a loop and only count once.
const MAX_DEPTH: usize = 128;

/// Parses the body of a `CHECK` clause written in `dialect`.
pub fn parse_condition(text: &str, dialect: Dialect) -> Result<Condition, ParseError> {
    let expr = parse_expression(text)?;
    let condition = Translator::new(dialect).condition(&expr)?;

    if condition.is_operand() {
        return Err(ParseError::unsupported(format!(
            "{} is not a boolean condition",
            condition
        )));
    }

    tracing::debug!(%dialect, sql = text, %condition, "parsed check condition");
    Ok(condition)
}

struct Translator {
    dialect: Dialect,
    depth: Cell<usize>,
}

impl Translator {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            depth: Cell::new(0),
        }
    }

    fn condition(&self, expr: &Expr) -> Result<Condition, ParseError> {
        let depth = self.depth.get() + 1;
        if depth > MAX_DEPTH {
            return Err(ParseError::unsupported(format!(
                "condition nested deeper than {}",
                MAX_DEPTH
            )));
        }

        self.depth.set(depth);
        let condition = self.lower(expr);
        self.depth.set(depth - 1);
        condition
    }

    fn lower(&self, expr: &Expr) -> Result<Condition, ParseError> {
        match expr {
            Expr::Binary {
                op: op @ (BinaryOperator::Or | BinaryOperator::And),
                ..
            } => self.connective(expr, *op),

            Expr::Binary { left, op, right } => self.binary(left, *op, right),

            Expr::IsNull { operand, negated } => {
                let column = self.column(operand)?;
                Ok(if *negated {
                    Condition::IsNotNull(column)
                } else {
                    Condition::IsNull(column)
                })
            }

            Expr::InList {
                operand,
                list,
                negated: false,
            } => {
                let column = self.column(operand)?;
                let values = list
                    .iter()
                    .map(|value| self.literal(value).map(Condition::Literal))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Condition::In { column, values })
            }

            Expr::Like {
                operand,
                pattern,
                negated: false,
            } => Ok(Condition::like(self.column(operand)?, self.pattern(pattern)?)),

            Expr::SimilarTo {
                operand,
                pattern,
                negated: false,
            } => Ok(Condition::similar_to(
                self.column(operand)?,
                self.pattern(pattern)?,
            )),

            Expr::Cast { .. } => {
                self.check_casts(expr)?;
                match expr.strip_casts() {
                    inner @ (Expr::Identifier(_)
                    | Expr::Null
                    | Expr::Number(_)
                    | Expr::String { .. }
                    | Expr::Unary { .. }) => self.condition(inner),
                    inner => Err(ParseError::unsupported(format!(
                        "cast of {}",
                        inner.describe()
                    ))),
                }
            }

            Expr::Identifier(parts) => self.column_ref(parts).map(Condition::Column),

            Expr::Null | Expr::Number(_) | Expr::String { .. } => {
                self.literal(expr).map(Condition::Literal)
            }

            Expr::Unary {
                op: UnaryOperator::Minus | UnaryOperator::Plus,
                ..
            } => self.literal(expr).map(Condition::Literal),

            Expr::Boolean(_)
            | Expr::Unary {
                op: UnaryOperator::Not,
                ..
            }
            | Expr::InList { negated: true, .. }
            | Expr::Like { negated: true, .. }
            | Expr::SimilarTo { negated: true, .. }
            | Expr::Function { .. } => Err(ParseError::unsupported(expr.describe())),
        }
    }

    /// Lowers a left-leaning `AND` or `OR` chain without recursing down its
    /// spine.
    fn connective(&self, expr: &Expr, op: BinaryOperator) -> Result<Condition, ParseError> {
        let join: fn(Condition, Condition) -> Condition = match op {
            BinaryOperator::Or => Condition::or,
            _ => Condition::and,
        };

        let mut rights = vec![];
        let mut first = expr;
        while let Expr::Binary {
            left,
            op: next,
            right,
        } = first
        {
            if *next != op {
                break;
            }
            rights.push(right.as_ref());
            first = left.as_ref();
        }

        let mut condition = self.condition(first)?;
        for right in rights.into_iter().rev() {
            condition = join(condition, self.condition(right)?);
        }
        Ok(condition)
    }

    fn binary(&self, left: &Expr, op: BinaryOperator, right: &Expr) -> Result<Condition, ParseError> {
        let comparator = match op {
            BinaryOperator::PgLike if self.dialect.postgres_operators() => {
                return Ok(Condition::like(self.column(left)?, self.pattern(right)?));
            }
            BinaryOperator::RegexMatch if self.dialect.postgres_operators() => {
                return Ok(Condition::similar_to(
                    self.column(left)?,
                    self.desugared_similar_to(right)?,
                ));
            }
            BinaryOperator::Lt => Comparator::LessThan,
            BinaryOperator::LtEq => Comparator::LessThanOrEqual,
            BinaryOperator::Gt => Comparator::GreaterThan,
            BinaryOperator::GtEq => Comparator::GreaterThanOrEqual,
            BinaryOperator::Eq => Comparator::EqualsTo,
            op => {
                return Err(ParseError::unsupported(format!(
                    "operator {} in {} condition",
                    op.symbol(),
                    self.dialect
                )))
            }
        };

        Ok(Condition::comparison(
            self.condition(left)?,
            comparator,
            self.condition(right)?,
        ))
    }

    /// Postgres stores `x SIMILAR TO p` as `x ~ similar_escape(p, NULL)`, or
    /// `x ~ similar_to_escape(p)` from version 13 on.
    fn desugared_similar_to(&self, right: &Expr) -> Result<String, ParseError> {
        let (name, args) = match right {
            Expr::Function { name, args } => (name, args.as_slice()),
            _ => return Err(ParseError::unsupported("operator ~ (regular expression match)")),
        };

        if name.eq_ignore_ascii_case(SIMILAR_ESCAPE) {
            match args {
                [pattern, escape] => {
                    if !self.is_null(escape)? {
                        return Err(ParseError::unsupported(
                            "SIMILAR TO with an escape character",
                        ));
                    }
                    self.pattern(pattern)
                }
                _ => Err(ParseError::unsupported(format!(
                    "{} with {} arguments",
                    SIMILAR_ESCAPE,
                    args.len()
                ))),
            }
        } else if name.eq_ignore_ascii_case(SIMILAR_TO_ESCAPE) {
            match args {
                [pattern] => self.pattern(pattern),
                _ => Err(ParseError::unsupported("SIMILAR TO with an escape character")),
            }
        } else {
            Err(ParseError::unsupported(format!(
                "operator ~ applied to function {}",
                name
            )))
        }
    }

    fn is_null(&self, expr: &Expr) -> Result<bool, ParseError> {
        self.check_casts(expr)?;
        Ok(matches!(expr.strip_casts(), Expr::Null))
    }

    fn column(&self, expr: &Expr) -> Result<Column, ParseError> {
        self.check_casts(expr)?;
        match expr.strip_casts() {
            Expr::Identifier(parts) => self.column_ref(parts),
            other => Err(ParseError::unsupported(format!(
                "{} where a column was expected",
                other.describe()
            ))),
        }
    }

    fn column_ref(&self, parts: &[Ident]) -> Result<Column, ParseError> {
        for part in parts {
            if part.quote == QuoteStyle::Backtick && !self.dialect.backtick_identifiers() {
                return Err(ParseError::unsupported(format!(
                    "backtick-quoted identifier in {} condition",
                    self.dialect
                )));
            }
        }

        match parts {
            [name] => Ok(Column::new(name.value.clone())),
            [table, name] => Ok(Column::with_table(table.value.clone(), name.value.clone())),
            _ => Err(ParseError::unsupported(format!(
                "column reference with {} parts",
                parts.len()
            ))),
        }
    }

    fn pattern(&self, expr: &Expr) -> Result<String, ParseError> {
        match self.literal(expr)? {
            Literal::String(pattern) => Ok(pattern),
            other => Err(ParseError::unsupported(format!(
                "pattern {} is not a string",
                other
            ))),
        }
    }

    fn literal(&self, expr: &Expr) -> Result<Literal, ParseError> {
        let mut expr = expr;
        let mut signed = false;
        let mut negative = false;
        loop {
            self.check_casts(expr)?;
            match expr.strip_casts() {
                Expr::Unary {
                    op: op @ (UnaryOperator::Minus | UnaryOperator::Plus),
                    operand,
                } => {
                    signed = true;
                    negative ^= *op == UnaryOperator::Minus;
                    expr = operand.as_ref();
                }
                _ => break,
            }
        }

        match (self.unsigned_literal(expr.strip_casts())?, negative) {
            (Literal::Integer(n), true) => Ok(Literal::Integer(-n)),
            (literal, _) if signed && !matches!(literal, Literal::Integer(_)) => Err(
                ParseError::unsupported(format!("signed {}", literal)),
            ),
            (literal, _) => Ok(literal),
        }
    }

    fn unsigned_literal(&self, expr: &Expr) -> Result<Literal, ParseError> {
        match expr {
            Expr::Null => Ok(Literal::Null),
            Expr::Number(text) => parse_integer(text).map(Literal::Integer),
            Expr::String { value, charset } => {
                if charset.is_some() && !self.dialect.charset_introducers() {
                    return Err(ParseError::unsupported(format!(
                        "charset introducer in {} condition",
                        self.dialect
                    )));
                }
                Ok(Literal::String(value.clone()))
            }
            other => Err(ParseError::unsupported(format!(
                "{} where a literal was expected",
                other.describe()
            ))),
        }
    }

    /// `::type` is only understood by dialects that speak Postgres.
    fn check_casts(&self, expr: &Expr) -> Result<(), ParseError> {
        let mut expr = expr;
        while let Expr::Cast {
            expr: inner,
            data_type,
            syntax,
        } = expr
        {
            if *syntax == CastSyntax::DoubleColon && !self.dialect.postgres_operators() {
                return Err(ParseError::unsupported(format!(
                    "::{} cast in {} condition",
                    data_type, self.dialect
                )));
            }
            expr = inner.as_ref();
        }
        Ok(())
    }
}

fn parse_integer(text: &str) -> Result<BigInt, ParseError> {
    if text.contains(|c: char| matches!(c, '.' | 'e' | 'E')) {
        return Err(ParseError::unsupported(format!("decimal literal {}", text)));
    }
    text.parse()
        .map_err(|_| ParseError::InvalidNumber(text.to_owned()))
}
