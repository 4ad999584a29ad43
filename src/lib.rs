pub mod ast;
pub mod dialect;
pub mod error;
pub mod expr;
pub mod parser;
pub mod registry;
pub mod smt2;
pub mod translate;


pub use ast::{Column, Comparator, Condition, Literal, UnsupportedConstraint};
pub use dialect::Dialect;
pub use error::{EncodeError, Error, ParseError};
pub use parser::parse_expression;
pub use registry::{ConstraintRegistry, EncodedConstraint, TableCheckExpression};
pub use smt2::Smt2Writer;
pub use translate::parse_condition;
