use std::borrow::BorrowMut;

use pest::Parser as _;
use pest_derive::Parser;

use crate::error::ParseError;
use crate::expr::{BinaryOperator, CastSyntax, Expr, Ident, QuoteStyle, UnaryOperator};

#[derive(Parser)]
#[grammar = "condition.pest"]
struct Parser;

type Pair<'a> = pest::iterators::Pair<'a, Rule>;
type Pairs<'a> = pest::iterators::Pairs<'a, Rule>;

/// Deepest bracket nesting handed to the grammar, which recurses once per level.
pub const MAX_NESTING: usize = 24;

/// Most operators one expression may hold. Every operator can add a level to
/// the tree, so this also bounds how deep it gets.
pub const MAX_OPERATORS: usize = 4096;

/// Tokenizes and associates a SQL boolean expression.
pub fn parse_expression(code: &str) -> Result<Expr, ParseError> {
    check_nesting(code)?;

    let pairs = Parser::parse(Rule::condition, code)?;
    let operators = pairs
        .clone()
        .flatten()
        .filter(|pair| is_operator(pair.as_rule()))
        .count();
    if operators > MAX_OPERATORS {
        return Err(ParseError::unsupported(format!(
            "expression with {} operators (at most {})",
            operators, MAX_OPERATORS
        )));
    }

    let condition = pairs
        .into_iter()
        .next()
        .ok_or_else(|| ParseError::malformed("empty parse"))?;
    convert_expr(expect_next_rule(condition.into_inner(), Rule::expr)?)
}

/// Counts parentheses outside of string literals and quoted identifiers.
fn check_nesting(code: &str) -> Result<(), ParseError> {
    let mut depth = 0usize;
    let mut quote = None;

    for c in code.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' | '`' => quote = Some(c),
                '(' => {
                    depth += 1;
                    if depth > MAX_NESTING {
                        return Err(ParseError::unsupported(format!(
                            "parentheses nested deeper than {}",
                            MAX_NESTING
                        )));
                    }
                }
                ')' => depth = depth.saturating_sub(1),
                _ => {}
            },
        }
    }

    Ok(())
}

fn is_operator(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::kw_or
            | Rule::kw_and
            | Rule::kw_not
            | Rule::is_null_test
            | Rule::comparison_op
            | Rule::in_list
            | Rule::like_pattern
            | Rule::similar_pattern
            | Rule::pattern_op
            | Rule::additive_op
            | Rule::term_op
            | Rule::sign
            | Rule::pg_cast
            | Rule::cast_call
            | Rule::function_call
    )
}

fn expect_next_rule<'a, P: BorrowMut<Pairs<'a>>>(
    mut pairs: P,
    rule: Rule,
) -> Result<Pair<'a>, ParseError> {
    match pairs.borrow_mut().next() {
        Some(pair) if pair.as_rule() == rule => Ok(pair),
        Some(pair) => Err(ParseError::malformed(format!(
            "expected {:?}, found {:?}",
            rule,
            pair.as_rule()
        ))),
        None => Err(ParseError::malformed(format!("missing {:?}", rule))),
    }
}

fn expect_next<'a, P: BorrowMut<Pairs<'a>>>(mut pairs: P) -> Result<Pair<'a>, ParseError> {
    pairs
        .borrow_mut()
        .next()
        .ok_or_else(|| ParseError::malformed("missing operand"))
}

fn convert_expr(pair: Pair) -> Result<Expr, ParseError> {
    match pair.as_rule() {
        Rule::expr
        | Rule::and_expr
        | Rule::comparison
        | Rule::operation
        | Rule::additive
        | Rule::term => fold_binary(pair),
        Rule::not_expr => convert_not(pair),
        Rule::is_expr => convert_is(pair),
        Rule::predicate => convert_predicate(pair),
        Rule::unary => convert_unary(pair),
        Rule::postfix => convert_postfix(pair),
        Rule::null_literal => Ok(Expr::Null),
        Rule::boolean_literal => Ok(Expr::Boolean(pair.as_str().eq_ignore_ascii_case("true"))),
        Rule::number => Ok(Expr::Number(pair.as_str().to_owned())),
        Rule::string_literal => convert_string(pair),
        Rule::cast_call => convert_cast_call(pair),
        Rule::function_call => convert_function_call(pair),
        Rule::column_ref => convert_column_ref(pair),
        rule => Err(ParseError::malformed(format!("unexpected {:?}", rule))),
    }
}

/// `operand (op operand)*`, folded to the left.
fn fold_binary(pair: Pair) -> Result<Expr, ParseError> {
    let mut pairs = pair.into_inner();
    let mut left = convert_expr(expect_next(&mut pairs)?)?;

    while let Some(op) = pairs.next() {
        let op = convert_binary_operator(&op)?;
        let right = convert_expr(expect_next(&mut pairs)?)?;
        left = Expr::binary(left, op, right);
    }

    Ok(left)
}

fn convert_binary_operator(pair: &Pair) -> Result<BinaryOperator, ParseError> {
    let op = match (pair.as_rule(), pair.as_str()) {
        (Rule::kw_or, _) => BinaryOperator::Or,
        (Rule::kw_and, _) => BinaryOperator::And,
        (_, "=") => BinaryOperator::Eq,
        (_, "<>") | (_, "!=") => BinaryOperator::NotEq,
        (_, "<") => BinaryOperator::Lt,
        (_, "<=") => BinaryOperator::LtEq,
        (_, ">") => BinaryOperator::Gt,
        (_, ">=") => BinaryOperator::GtEq,
        (_, "+") => BinaryOperator::Plus,
        (_, "-") => BinaryOperator::Minus,
        (_, "*") => BinaryOperator::Multiply,
        (_, "/") => BinaryOperator::Divide,
        (_, "%") => BinaryOperator::Modulo,
        (_, "||") => BinaryOperator::Concat,
        (_, "~") => BinaryOperator::RegexMatch,
        (_, "~*") => BinaryOperator::RegexIMatch,
        (_, "!~") => BinaryOperator::RegexNotMatch,
        (_, "!~*") => BinaryOperator::RegexNotIMatch,
        (_, "~~") => BinaryOperator::PgLike,
        (_, "~~*") => BinaryOperator::PgILike,
        (_, "!~~") => BinaryOperator::PgNotLike,
        (_, "!~~*") => BinaryOperator::PgNotILike,
        (rule, text) => {
            return Err(ParseError::malformed(format!(
                "unknown operator {:?} ({:?})",
                text, rule
            )))
        }
    };
    Ok(op)
}

fn convert_not(pair: Pair) -> Result<Expr, ParseError> {
    let mut negations = 0;
    let mut operand = None;
    for pair in pair.into_inner() {
        match pair.as_rule() {
            Rule::kw_not => negations += 1,
            _ => operand = Some(convert_expr(pair)?),
        }
    }

    let mut expr = operand.ok_or_else(|| ParseError::malformed("NOT without operand"))?;
    for _ in 0..negations {
        expr = Expr::unary(UnaryOperator::Not, expr);
    }
    Ok(expr)
}

fn convert_is(pair: Pair) -> Result<Expr, ParseError> {
    let mut pairs = pair.into_inner();
    let operand = convert_expr(expect_next(&mut pairs)?)?;

    match pairs.next() {
        None => Ok(operand),
        Some(test) => {
            let negated = test.into_inner().any(|pair| pair.as_rule() == Rule::kw_not);
            Ok(Expr::IsNull {
                operand: Box::new(operand),
                negated,
            })
        }
    }
}

fn convert_predicate(pair: Pair) -> Result<Expr, ParseError> {
    let mut pairs = pair.into_inner();
    let operand = Box::new(convert_expr(expect_next(&mut pairs)?)?);

    let suffix = match pairs.next() {
        None => return Ok(*operand),
        Some(suffix) => suffix,
    };
    let rule = suffix.as_rule();

    let mut negated = false;
    let mut operands = vec![];
    for pair in suffix.into_inner() {
        match pair.as_rule() {
            Rule::kw_not => negated = true,
            Rule::kw_in | Rule::kw_like | Rule::kw_similar | Rule::kw_to => {}
            _ => operands.push(convert_expr(pair)?),
        }
    }

    match rule {
        Rule::in_list => Ok(Expr::InList {
            operand,
            list: operands,
            negated,
        }),
        Rule::like_pattern | Rule::similar_pattern => {
            let pattern = match <[Expr; 1]>::try_from(operands) {
                Ok([pattern]) => Box::new(pattern),
                Err(_) => return Err(ParseError::malformed("pattern match without a pattern")),
            };
            if rule == Rule::like_pattern {
                Ok(Expr::Like {
                    operand,
                    pattern,
                    negated,
                })
            } else {
                Ok(Expr::SimilarTo {
                    operand,
                    pattern,
                    negated,
                })
            }
        }
        rule => Err(ParseError::malformed(format!("unexpected {:?}", rule))),
    }
}

fn convert_unary(pair: Pair) -> Result<Expr, ParseError> {
    let mut signs = vec![];
    let mut operand = None;
    for pair in pair.into_inner() {
        match pair.as_rule() {
            Rule::sign if pair.as_str() == "-" => signs.push(UnaryOperator::Minus),
            Rule::sign => signs.push(UnaryOperator::Plus),
            _ => operand = Some(convert_expr(pair)?),
        }
    }

    let mut expr = operand.ok_or_else(|| ParseError::malformed("sign without operand"))?;
    for op in signs.into_iter().rev() {
        expr = Expr::unary(op, expr);
    }
    Ok(expr)
}

fn convert_postfix(pair: Pair) -> Result<Expr, ParseError> {
    let mut pairs = pair.into_inner();
    let mut expr = convert_expr(expect_next(&mut pairs)?)?;

    for cast in pairs {
        let type_name = expect_next_rule(cast.into_inner(), Rule::type_name)?;
        expr = Expr::cast(expr, type_name.as_str(), CastSyntax::DoubleColon);
    }

    Ok(expr)
}

fn convert_string(pair: Pair) -> Result<Expr, ParseError> {
    let mut charset = None;
    let mut value = None;
    for pair in pair.into_inner() {
        match pair.as_rule() {
            Rule::charset => charset = Some(pair.as_str().to_owned()),
            Rule::string_body => value = Some(pair.as_str().replace("''", "'")),
            rule => return Err(ParseError::malformed(format!("unexpected {:?}", rule))),
        }
    }

    Ok(Expr::String {
        value: value.ok_or_else(|| ParseError::malformed("string without body"))?,
        charset,
    })
}

fn convert_cast_call(pair: Pair) -> Result<Expr, ParseError> {
    let mut pairs = pair.into_inner();
    expect_next_rule(&mut pairs, Rule::kw_cast)?;
    let expr = convert_expr(expect_next_rule(&mut pairs, Rule::expr)?)?;
    expect_next_rule(&mut pairs, Rule::kw_as)?;
    let type_name = expect_next_rule(&mut pairs, Rule::type_name)?;

    Ok(Expr::cast(expr, type_name.as_str(), CastSyntax::Function))
}

fn convert_function_call(pair: Pair) -> Result<Expr, ParseError> {
    let mut pairs = pair.into_inner();
    let name = expect_next_rule(&mut pairs, Rule::function_name)?
        .as_str()
        .to_owned();
    let args = pairs.map(convert_expr).collect::<Result<Vec<_>, _>>()?;

    Ok(Expr::Function { name, args })
}

fn convert_column_ref(pair: Pair) -> Result<Expr, ParseError> {
    let parts = pair
        .into_inner()
        .map(convert_identifier)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Expr::Identifier(parts))
}

fn convert_identifier(pair: Pair) -> Result<Ident, ParseError> {
    let ident = match pair.as_rule() {
        Rule::bare_identifier => Ident {
            value: pair.as_str().to_owned(),
            quote: QuoteStyle::None,
        },
        Rule::quoted_identifier => Ident {
            value: expect_next_rule(pair.into_inner(), Rule::quoted_body)?
                .as_str()
                .replace("\"\"", "\""),
            quote: QuoteStyle::Double,
        },
        Rule::backtick_identifier => Ident {
            value: expect_next_rule(pair.into_inner(), Rule::backtick_body)?
                .as_str()
                .replace("``", "`"),
            quote: QuoteStyle::Backtick,
        },
        rule => return Err(ParseError::malformed(format!("unexpected {:?}", rule))),
    };
    Ok(ident)
}
