use std::{fmt, str::FromStr};

use thiserror::Error;

/// Database family a constraint's text was extracted from.
///
/// H2 and Derby fold unquoted identifiers to upper case, Postgres to lower
/// case and MySQL keeps them as declared. The parser never folds case
/// itself; the dialect only decides which vendor spellings are accepted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Dialect {
    #[default]
    H2,
    Derby,
    MySql,
    Postgres,
    /// Standard syntax only, best effort.
    Other,
}

impl Dialect {
    pub const ALL: [Dialect; 5] = [
        Dialect::H2,
        Dialect::Derby,
        Dialect::MySql,
        Dialect::Postgres,
        Dialect::Other,
    ];

    /// `~~`, `~ similar_escape(...)` and `::type` casts.
    pub fn postgres_operators(self) -> bool {
        matches!(self, Dialect::H2 | Dialect::Postgres)
    }

    /// `` `name` `` identifiers.
    pub fn backtick_identifiers(self) -> bool {
        matches!(self, Dialect::MySql)
    }

    /// `_utf8mb4'text'` string literals.
    pub fn charset_introducers(self) -> bool {
        matches!(self, Dialect::MySql)
    }

    pub fn name(self) -> &'static str {
        match self {
            Dialect::H2 => "h2",
            Dialect::Derby => "derby",
            Dialect::MySql => "mysql",
            Dialect::Postgres => "postgres",
            Dialect::Other => "other",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown dialect {0:?} (expected h2, derby, mysql, postgres or other)")]
pub struct UnknownDialect(pub String);

impl FromStr for Dialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "h2" => Ok(Dialect::H2),
            "derby" => Ok(Dialect::Derby),
            "mysql" => Ok(Dialect::MySql),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "other" => Ok(Dialect::Other),
            _ => Err(UnknownDialect(s.to_owned())),
        }
    }
}
