use std::path::Path;

use crate::ast::{Condition, TableName, UnsupportedConstraint};
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::smt2::Smt2Writer;
use crate::translate::parse_condition;

/// A raw `CHECK` expression as reported by schema extraction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableCheckExpression {
    pub table_name: TableName,
    pub sql_check_expression: String,
    pub dialect: Dialect,
}

impl TableCheckExpression {
    pub fn new(
        table_name: impl Into<TableName>,
        sql_check_expression: impl Into<String>,
        dialect: Dialect,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            sql_check_expression: sql_check_expression.into(),
            dialect,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedConstraint {
    pub table_name: TableName,
    pub condition: Condition,
}

/// Feeds check expressions through the parser and into a single script.
///
/// Constraints that cannot be parsed or encoded are kept as
/// [`UnsupportedConstraint`]s; they never stop the rest of the batch.
#[derive(Clone, Debug, Default)]
pub struct ConstraintRegistry {
    writer: Smt2Writer,
    encoded: Vec<EncodedConstraint>,
    unsupported: Vec<UnsupportedConstraint>,
}

impl ConstraintRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// On failure the constraint has already been recorded as unsupported;
    /// the error only reports why.
    pub fn register(&mut self, check: &TableCheckExpression) -> Result<()> {
        match self.encode(check) {
            Ok(condition) => {
                self.encoded.push(EncodedConstraint {
                    table_name: check.table_name.clone(),
                    condition,
                });
                Ok(())
            }
            Err(err) => {
                tracing::warn!(
                    table = %check.table_name,
                    dialect = %check.dialect,
                    sql = %check.sql_check_expression,
                    error = %err,
                    "unsupported check constraint"
                );
                self.unsupported.push(UnsupportedConstraint {
                    table_name: check.table_name.clone(),
                    raw_text: check.sql_check_expression.clone(),
                });
                Err(err)
            }
        }
    }

    /// Registers every check and returns how many were encoded.
    pub fn register_all<'a, I>(&mut self, checks: I) -> usize
    where
        I: IntoIterator<Item = &'a TableCheckExpression>,
    {
        checks
            .into_iter()
            .filter(|check| self.register(check).is_ok())
            .count()
    }

    fn encode(&mut self, check: &TableCheckExpression) -> Result<Condition> {
        let condition = parse_condition(&check.sql_check_expression, check.dialect)?;
        self.writer.try_accept(&condition)?;
        Ok(condition)
    }

    pub fn encoded(&self) -> &[EncodedConstraint] {
        &self.encoded
    }

    pub fn unsupported(&self) -> &[UnsupportedConstraint] {
        &self.unsupported
    }

    pub fn writer(&self) -> &Smt2Writer {
        &self.writer
    }

    pub fn render(&self) -> String {
        self.writer.render()
    }

    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        self.writer.write_to_file(path)
    }
}
