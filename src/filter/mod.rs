//! Filter expression parsing and matching
//!
//! A filter is a whitespace-separated list of clauses. Each clause compares
//! one record field with a value, and all clauses are combined with a single
//! logic (AND unless the filter says `OR`).
//!
//! # Syntax
//!
//! ```text
//! field=value              Equal (values are compared in canonical form)
//! field!=value             Not equal
//! field~text               Contains, case-insensitive
//! field!~text              Does not contain
//! field>v  field<v         Ordered by memory size, duration, number, then text
//! field>=v field<=v        Strict comparison OR equality
//! field=~pattern           Regular expression match
//! field in (a,b,c)         Exact match against any list item
//! field not in (a,b,c)     Negation of `in`
//! AND / OR / && / ||       Logic for the whole filter (cannot be mixed)
//! ```
//!
//! Values may be quoted (`name='job one'`). Unquoted values are coerced to
//! integers, floats, booleans, memory sizes (`4G`, binary units), scheduler
//! times (`2:30:00`, `1-00:00:00`) or durations (`30m`, `1h30m`) before they
//! are compared, and kept as text otherwise.
//!
//! # Examples
//!
//! ```text
//! state=running                           # Running jobs
//! state in (running,pending) user=alice   # Alice's active jobs
//! mem>=4G cpus>8                          # Large jobs
//! time>1-00:00:00 OR timelimit>2d         # Long runners
//! name=~'^train-[0-9]+$'                  # Jobs with a numbered name
//! ```
//!
//! A record that lacks a referenced field never matches that clause, not
//! even a negated one such as `!=` or `not in`.

pub mod error;
pub mod field;
pub mod matcher;
pub mod operator;
pub mod parser;
pub mod split;
pub mod value;

pub use error::FilterParseError;
pub use field::{DEFAULT_ALIASES, FieldAliases};
pub use matcher::{CompiledFilter, Record};
pub use operator::FilterOperator;
pub use parser::{
    Expression, ExpressionValue, Filter, FilterParser, Logic, default_parser, parse_expression,
    parse_filter,
};
pub use split::split_respecting_quotes;
pub use value::{Scalar, ScalarKind, coerce_value};
