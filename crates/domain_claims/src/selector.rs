//! Batch selector filter grammar
//!
//! A minimal `field operator value` grammar used by the bulk review
//! operation to build its working set, e.g.
//! `status: = calculated, start_date: <= 2024-01-01`. Tokens are separated
//! by spaces, commas or colons; double-quoted values preserve embedded
//! separators. Every parsed triple becomes a clause tolerant of missing
//! data: a record matches when the field is absent or the comparison holds.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::indemnification::{Indemnification, IndemnificationStatus};

/// Errors raised while parsing a selector string
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("unknown operator: {0}")]
    UnknownOperator(String),

    #[error("operator {operator} is not valid for field {field}")]
    OperatorNotSupported { field: String, operator: String },

    #[error("invalid date literal: {0}")]
    InvalidDate(String),

    #[error("invalid amount literal: {0}")]
    InvalidAmount(String),

    #[error("invalid status literal: {0}")]
    InvalidStatus(String),

    #[error("dangling tokens: expected field, operator, value triples")]
    DanglingTokens,
}

/// Searchable indemnification fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Status,
    StartDate,
    EndDate,
    Amount,
}

impl Field {
    fn parse(token: &str) -> Result<Self, SelectorError> {
        match token {
            "status" => Ok(Field::Status),
            "start_date" => Ok(Field::StartDate),
            "end_date" => Ok(Field::EndDate),
            "amount" => Ok(Field::Amount),
            other => Err(SelectorError::UnknownField(other.to_string())),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Field::Status => "status",
            Field::StartDate => "start_date",
            Field::EndDate => "end_date",
            Field::Amount => "amount",
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Operator {
    fn parse(token: &str) -> Result<Self, SelectorError> {
        match token {
            "=" => Ok(Operator::Eq),
            "!=" => Ok(Operator::Ne),
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Le),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Ge),
            other => Err(SelectorError::UnknownOperator(other.to_string())),
        }
    }

    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Operator::Eq => ordering == Ordering::Equal,
            Operator::Ne => ordering != Ordering::Equal,
            Operator::Lt => ordering == Ordering::Less,
            Operator::Le => ordering != Ordering::Greater,
            Operator::Gt => ordering == Ordering::Greater,
            Operator::Ge => ordering != Ordering::Less,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
        };
        write!(f, "{}", symbol)
    }
}

/// Typed right-hand side of a clause
#[derive(Debug, Clone, PartialEq, Eq)]
enum FilterValue {
    Status(IndemnificationStatus),
    Date(NaiveDate),
    Amount(Decimal),
}

/// One `field operator value` triple
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    field: Field,
    operator: Operator,
    value: FilterValue,
}

impl Clause {
    fn build(field: Field, operator: Operator, raw: &str) -> Result<Self, SelectorError> {
        let value = match field {
            Field::Status => {
                if !matches!(operator, Operator::Eq | Operator::Ne) {
                    return Err(SelectorError::OperatorNotSupported {
                        field: field.name().to_string(),
                        operator: operator.to_string(),
                    });
                }
                FilterValue::Status(parse_status(raw)?)
            }
            Field::StartDate | Field::EndDate => FilterValue::Date(
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| SelectorError::InvalidDate(raw.to_string()))?,
            ),
            Field::Amount => FilterValue::Amount(
                raw.parse()
                    .map_err(|_| SelectorError::InvalidAmount(raw.to_string()))?,
            ),
        };
        Ok(Self {
            field,
            operator,
            value,
        })
    }

    /// Missing data passes: `(field IS NULL) OR (field operator value)`
    pub fn matches(&self, indemnification: &Indemnification) -> bool {
        match (&self.field, &self.value) {
            (Field::Status, FilterValue::Status(wanted)) => {
                let equal = indemnification.status == *wanted;
                match self.operator {
                    Operator::Eq => equal,
                    Operator::Ne => !equal,
                    _ => false,
                }
            }
            (Field::StartDate, FilterValue::Date(wanted)) => {
                match indemnification.start_date {
                    None => true,
                    Some(actual) => self.operator.accepts(actual.cmp(wanted)),
                }
            }
            (Field::EndDate, FilterValue::Date(wanted)) => match indemnification.end_date {
                None => true,
                Some(actual) => self.operator.accepts(actual.cmp(wanted)),
            },
            (Field::Amount, FilterValue::Amount(wanted)) => self
                .operator
                .accepts(indemnification.amount.amount().cmp(wanted)),
            // field/value pairs are matched at construction
            _ => false,
        }
    }
}

fn parse_status(raw: &str) -> Result<IndemnificationStatus, SelectorError> {
    match raw {
        "calculated" => Ok(IndemnificationStatus::Calculated),
        "validated" => Ok(IndemnificationStatus::Validated),
        "rejected" => Ok(IndemnificationStatus::Rejected),
        "paid" => Ok(IndemnificationStatus::Paid),
        other => Err(SelectorError::InvalidStatus(other.to_string())),
    }
}

/// A parsed filter: the conjunction of its clauses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    clauses: Vec<Clause>,
}

impl Selector {
    /// Parses a selector string into ordered clauses
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let tokens = tokenize(input);
        if tokens.len() % 3 != 0 {
            return Err(SelectorError::DanglingTokens);
        }
        let mut clauses = Vec::with_capacity(tokens.len() / 3);
        for triple in tokens.chunks(3) {
            let field = Field::parse(&triple[0])?;
            let operator = Operator::parse(&triple[1])?;
            clauses.push(Clause::build(field, operator, &triple[2])?);
        }
        Ok(Self { clauses })
    }

    /// True when every clause accepts the record
    pub fn matches(&self, indemnification: &Indemnification) -> bool {
        self.clauses
            .iter()
            .all(|clause| clause.matches(indemnification))
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }
}

/// Splits on spaces, commas and colons; double quotes delimit values that
/// keep embedded separators
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for ch in input.chars() {
        match ch {
            '"' => {
                if in_quotes {
                    tokens.push(std::mem::take(&mut current));
                }
                in_quotes = !in_quotes;
            }
            ' ' | ':' | ',' if !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}
