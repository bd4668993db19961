use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison operators understood by the filter language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    Greater,
    Less,
    GreaterOrEqual,
    LessOrEqual,
    RegexMatch,
    InList,
    NotInList,
}

/// Symbolic operators in detection order.
///
/// Longer operators come before any operator that is a substring of them.
pub const SYMBOL_OPERATORS: [(&str, FilterOperator); 9] = [
    ("!=", FilterOperator::NotEquals),
    ("!~", FilterOperator::NotContains),
    (">=", FilterOperator::GreaterOrEqual),
    ("<=", FilterOperator::LessOrEqual),
    ("=~", FilterOperator::RegexMatch),
    ("=", FilterOperator::Equals),
    ("~", FilterOperator::Contains),
    (">", FilterOperator::Greater),
    ("<", FilterOperator::Less),
];

/// Padded text of the word operator for "not in"
pub const NOT_IN: &str = " not in ";
/// Padded text of the word operator for "in"
pub const IN: &str = " in ";

impl FilterOperator {
    /// Operator text as written in a filter string
    pub fn symbol(&self) -> &'static str {
        match self {
            FilterOperator::Equals => "=",
            FilterOperator::NotEquals => "!=",
            FilterOperator::Contains => "~",
            FilterOperator::NotContains => "!~",
            FilterOperator::Greater => ">",
            FilterOperator::Less => "<",
            FilterOperator::GreaterOrEqual => ">=",
            FilterOperator::LessOrEqual => "<=",
            FilterOperator::RegexMatch => "=~",
            FilterOperator::InList => "in",
            FilterOperator::NotInList => "not in",
        }
    }

    /// Whether the operator takes a parenthesized value list
    pub fn is_list(&self) -> bool {
        matches!(self, FilterOperator::InList | FilterOperator::NotInList)
    }

    /// Whether the operator is the negation of another operator
    pub fn is_negated(&self) -> bool {
        matches!(
            self,
            FilterOperator::NotEquals | FilterOperator::NotContains | FilterOperator::NotInList
        )
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
