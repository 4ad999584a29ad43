//! SMT-LIB2 script builder.
//!
//! Only a top-level comparison between a column and a column or integer is
//! lowered. Every declared constant is an `Int`; strings and reals are not
//! modelled yet, so a comparison against a string literal is rejected
//! rather than encoded with the wrong sort.

use std::{fs, path::Path};

use num_bigint::{BigInt, Sign};

use crate::ast::{Column, Condition, Literal};
use crate::error::{EncodeError, Error, Result};

/// Logic declared at the top of every script.
pub const LOGIC: &str = "QF_SLIA";

/// Accumulates one script. Declarations and assertions are emitted in the
/// order their conditions were accepted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Smt2Writer {
    variables: Vec<String>,
    assertions: Vec<String>,
}

impl Smt2Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn assertions(&self) -> &[String] {
        &self.assertions
    }

    pub fn is_empty(&self) -> bool {
        self.assertions.is_empty()
    }

    /// Adds `condition` to the script, returning whether it could be encoded.
    /// A rejected condition leaves the script untouched.
    pub fn accept(&mut self, condition: &Condition) -> bool {
        match self.try_accept(condition) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(%condition, error = %err, "condition rejected by SMT2 encoder");
                false
            }
        }
    }

    pub fn try_accept(&mut self, condition: &Condition) -> Result<(), EncodeError> {
        let (left, op, right) = match condition {
            Condition::Comparison { left, op, right } => (left, op, right),
            other => return Err(EncodeError::UnsupportedShape(other.kind())),
        };

        let variable = match left.as_ref() {
            Condition::Column(column) => symbol(column)?,
            other => return Err(EncodeError::UnsupportedOperand(other.to_string())),
        };
        let (value, right_variable) = match right.as_ref() {
            Condition::Column(column) => {
                let symbol = symbol(column)?;
                (symbol.clone(), Some(symbol))
            }
            Condition::Literal(Literal::Integer(n)) => (int_term(n), None),
            other => return Err(EncodeError::UnsupportedOperand(other.to_string())),
        };

        let assertion = format!("({} {} {})", op.symbol(), variable, value);
        tracing::debug!(%assertion, "encoded assertion");

        self.declare(variable);
        if let Some(variable) = right_variable {
            self.declare(variable);
        }
        self.assertions.push(assertion);

        Ok(())
    }

    fn declare(&mut self, variable: String) {
        if !self.variables.contains(&variable) {
            self.variables.push(variable);
        }
    }

    pub fn render(&self) -> String {
        let mut s = String::new();

        s.push_str(&format!("(set-logic {})\n", LOGIC));
        for variable in &self.variables {
            s.push_str(&format!("(declare-const {} Int)\n", variable));
        }
        for assertion in &self.assertions {
            s.push_str(&format!("(assert {})\n", assertion));
        }
        s.push_str("(check-sat)\n");
        for variable in &self.variables {
            s.push_str(&format!("(get-value ({}))\n", variable));
        }

        s
    }

    /// Writes the rendered script to `path` as UTF-8.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.render()).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!(
            path = %path.display(),
            variables = self.variables.len(),
            assertions = self.assertions.len(),
            "wrote SMT-LIB script"
        );
        Ok(())
    }
}

/// Reserved words of SMT-LIB 2.6. They are not symbols unless quoted.
const RESERVED_WORDS: &[&str] = &[
    "!", "_", "as", "BINARY", "DECIMAL", "exists", "forall", "HEXADECIMAL", "let", "match",
    "NUMERAL", "par", "STRING",
];

/// Functions the `QF_SLIA` theories already define. `|f|` and `f` are the
/// same symbol, so a column with one of these names cannot be declared at all.
const THEORY_SYMBOLS: &[&str] = &[
    "true", "false", "not", "=>", "and", "or", "xor", "=", "distinct", "ite", "-", "+", "*",
    "div", "mod", "abs", "<=", "<", ">=", ">", "str.++", "str.len", "str.<", "str.<=",
    "str.at", "str.substr", "str.prefixof", "str.suffixof", "str.contains", "str.indexof",
    "str.replace", "str.replace_all", "str.is_digit", "str.to_code", "str.from_code",
    "str.to_int", "str.from_int", "str.to_re", "str.in_re", "re.none", "re.all", "re.allchar",
    "re.++", "re.union", "re.inter", "re.*", "re.+", "re.opt", "re.range", "re.comp",
    "re.diff", "re.loop", "re.^",
];

/// Column names go out verbatim when they are simple symbols, and between
/// bars otherwise.
fn symbol(column: &Column) -> Result<String, EncodeError> {
    let name = column.render();

    if THEORY_SYMBOLS.contains(&name.as_str()) || name.contains(|c: char| c == '|' || c == '\\')
    {
        return Err(EncodeError::UnsupportedOperand(format!("column {}", name)));
    }

    let simple = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(is_simple_symbol_char)
        && !RESERVED_WORDS.contains(&name.as_str());
    if simple {
        Ok(name)
    } else {
        Ok(format!("|{}|", name))
    }
}

fn is_simple_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "~!@$%^&*_-+=<>.?/".contains(c)
}

fn int_term(n: &BigInt) -> String {
    match n.sign() {
        Sign::Minus => format!("(- {})", n.magnitude()),
        _ => n.to_string(),
    }
}
