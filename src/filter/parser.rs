use super::error::FilterParseError;
use super::field::FieldAliases;
use super::operator::{FilterOperator, IN, NOT_IN, SYMBOL_OPERATORS};
use super::split::{find_unquoted, split_respecting_quotes};
use super::value::{Scalar, coerce_value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// How the expressions of a filter are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Logic {
    #[default]
    And,
    Or,
}

impl Logic {
    /// Recognize a standalone combinator clause (`AND`, `&&`, `or`, `||`, ...)
    pub fn from_combinator(token: &str) -> Option<Self> {
        match token {
            "&&" => Some(Logic::And),
            "||" => Some(Logic::Or),
            t if t.eq_ignore_ascii_case("and") => Some(Logic::And),
            t if t.eq_ignore_ascii_case("or") => Some(Logic::Or),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Logic::And => "AND",
            Logic::Or => "OR",
        }
    }
}

impl FromStr for Logic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Logic::from_combinator(s.trim())
            .ok_or_else(|| format!("Unknown logic '{}'. Valid values are: AND, OR", s))
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// The right-hand side of an expression
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionValue {
    Scalar(Scalar),
    /// Items of an `in (...)` / `not in (...)` list, trimmed but not unquoted
    List(Vec<String>),
}

impl fmt::Display for ExpressionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpressionValue::List(items) => write!(f, "({})", items.join(",")),
            ExpressionValue::Scalar(scalar) => {
                let text = scalar.to_string();
                if needs_quotes(&text) {
                    let quote = if text.contains('"') { '\'' } else { '"' };
                    write!(f, "{quote}{text}{quote}")
                } else {
                    f.write_str(&text)
                }
            }
        }
    }
}

/// Text that would split, change operator or lose characters when read back
fn needs_quotes(text: &str) -> bool {
    text.is_empty()
        || text.contains([' ', '\t', '\'', '"', '(', ')'])
        || SYMBOL_OPERATORS
            .iter()
            .any(|(symbol, _)| text.contains(symbol))
}

/// A single comparison, e.g. `State = running`
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    /// Canonical record key
    pub field: String,
    pub operator: FilterOperator,
    pub value: ExpressionValue,
}

impl Expression {
    pub fn new(
        field: impl Into<String>,
        operator: FilterOperator,
        value: ExpressionValue,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// The scalar operand, if this is not a list expression
    pub fn scalar(&self) -> Option<&Scalar> {
        match &self.value {
            ExpressionValue::Scalar(scalar) => Some(scalar),
            ExpressionValue::List(_) => None,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operator.is_list() {
            write!(f, "{} {} {}", self.field, self.operator, self.value)
        } else {
            write!(f, "{}{}{}", self.field, self.operator, self.value)
        }
    }
}

/// A parsed filter: expressions combined with a single logic
#[derive(Debug, Clone, Default)]
pub struct Filter {
    pub expressions: Vec<Expression>,
    pub logic: Logic,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Two filters are equal when their expressions and logic are; labels are ignored
impl PartialEq for Filter {
    fn eq(&self, other: &Self) -> bool {
        self.logic == other.logic && self.expressions == other.expressions
    }
}

impl Filter {
    /// Create an empty filter, which matches every record
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a filter string with the built-in field aliases
    pub fn parse(s: &str) -> Result<Self, FilterParseError> {
        default_parser().parse(s)
    }

    pub fn from_expressions(expressions: Vec<Expression>, logic: Logic) -> Self {
        Self {
            expressions,
            logic,
            ..Self::default()
        }
    }

    pub fn with_logic(mut self, logic: Logic) -> Self {
        self.logic = logic;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.expressions.len()
    }
}

impl FromStr for Filter {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Filter::parse(s)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = match self.logic {
            Logic::And => " ".to_string(),
            Logic::Or => format!(" {} ", self.logic),
        };
        let parts: Vec<String> = self.expressions.iter().map(|e| e.to_string()).collect();
        f.write_str(&parts.join(&separator))?;
        // OR is only implied by a separator between two expressions
        if self.logic == Logic::Or && parts.len() < 2 {
            if !parts.is_empty() {
                f.write_str(" ")?;
            }
            f.write_str(self.logic.keyword())?;
        }
        Ok(())
    }
}

/// Parses filter strings against an explicit alias table
#[derive(Debug, Clone, Default)]
pub struct FilterParser {
    aliases: FieldAliases,
    default_logic: Logic,
}

impl FilterParser {
    pub fn new(aliases: FieldAliases) -> Self {
        Self {
            aliases,
            default_logic: Logic::And,
        }
    }

    /// Logic used when the filter string has no explicit combinator
    pub fn with_default_logic(mut self, logic: Logic) -> Self {
        self.default_logic = logic;
        self
    }

    pub fn aliases(&self) -> &FieldAliases {
        &self.aliases
    }

    /// Parse a whole filter string
    ///
    /// Clauses are separated by whitespace. A standalone `AND` or `OR`
    /// (or `&&` / `||`) sets the logic for the whole filter; using both is an
    /// error. Any invalid clause fails the whole parse.
    pub fn parse(&self, s: &str) -> Result<Filter, FilterParseError> {
        let mut expressions = Vec::new();
        let mut logic: Option<Logic> = None;

        for clause in split_respecting_quotes(s) {
            if let Some(combinator) = Logic::from_combinator(clause) {
                match logic {
                    Some(existing) if existing != combinator => {
                        return Err(FilterParseError::MixedLogic {
                            clause: clause.to_string(),
                        });
                    }
                    _ => logic = Some(combinator),
                }
                continue;
            }
            expressions.push(self.parse_expression(clause)?);
        }

        Ok(Filter::from_expressions(
            expressions,
            logic.unwrap_or(self.default_logic),
        ))
    }

    /// Parse a single clause such as `mem>=4G` or `state in (running,pending)`
    pub fn parse_expression(&self, clause: &str) -> Result<Expression, FilterParseError> {
        let clause = clause.trim();

        if let Some(idx) = find_unquoted(clause, NOT_IN) {
            return self.parse_list(clause, idx, NOT_IN.len(), FilterOperator::NotInList);
        }
        if let Some(idx) = find_unquoted(clause, IN) {
            return self.parse_list(clause, idx, IN.len(), FilterOperator::InList);
        }

        for (symbol, operator) in SYMBOL_OPERATORS {
            match find_unquoted(clause, symbol) {
                Some(idx) if idx > 0 => {
                    let field = self.field_name(clause, clause[..idx].trim())?;
                    let raw = strip_matching_quotes(clause[idx + symbol.len()..].trim());
                    let value = coerce_value(raw);
                    log::debug!(
                        "parsed clause '{}' as {} {} {:?} ({})",
                        clause,
                        field,
                        operator,
                        raw,
                        value.kind()
                    );
                    return Ok(Expression::new(
                        field,
                        operator,
                        ExpressionValue::Scalar(value),
                    ));
                }
                _ => {}
            }
        }

        Err(FilterParseError::NoOperator {
            clause: clause.to_string(),
        })
    }

    fn parse_list(
        &self,
        clause: &str,
        idx: usize,
        op_len: usize,
        operator: FilterOperator,
    ) -> Result<Expression, FilterParseError> {
        let invalid = || FilterParseError::InvalidList {
            clause: clause.to_string(),
        };

        let left = clause[..idx].trim();
        let right = clause[idx + op_len..].trim();
        if left.is_empty() || right.is_empty() {
            return Err(invalid());
        }

        let inner = right.strip_prefix('(').unwrap_or(right);
        let inner = inner.strip_suffix(')').unwrap_or(inner);
        if inner.trim().is_empty() {
            return Err(invalid());
        }

        let items: Vec<String> = inner.split(',').map(|s| s.trim().to_string()).collect();
        let field = self.field_name(clause, left)?;
        log::debug!(
            "parsed clause '{}' as {} {} {:?}",
            clause,
            field,
            operator,
            items
        );
        Ok(Expression::new(field, operator, ExpressionValue::List(items)))
    }

    fn field_name(&self, clause: &str, field: &str) -> Result<String, FilterParseError> {
        let reason = if field.contains(['\'', '"']) {
            "field names cannot be quoted"
        } else if field.contains(char::is_whitespace) {
            "field names cannot contain whitespace"
        } else {
            return Ok(self.aliases.normalize(field));
        };
        Err(FilterParseError::InvalidClause {
            clause: clause.to_string(),
            reason: reason.to_string(),
        })
    }
}

/// Remove one layer of matching surrounding quotes
fn strip_matching_quotes(s: &str) -> &str {
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// Parser using the built-in alias table and AND logic
pub fn default_parser() -> &'static FilterParser {
    static DEFAULT_PARSER: LazyLock<FilterParser> = LazyLock::new(FilterParser::default);
    &DEFAULT_PARSER
}

/// Parse a filter string with the built-in field aliases
pub fn parse_filter(s: &str) -> Result<Filter, FilterParseError> {
    default_parser().parse(s)
}

/// Parse one clause with the built-in field aliases
pub fn parse_expression(clause: &str) -> Result<Expression, FilterParseError> {
    default_parser().parse_expression(clause)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::value::ScalarKind;

    #[test]
    fn test_parse_simple_equals() {
        let expr = parse_expression("state=running").unwrap();
        assert_eq!(expr.field, "State");
        assert_eq!(expr.operator, FilterOperator::Equals);
        assert_eq!(expr.value, ExpressionValue::Scalar(Scalar::from("running")));
    }

    #[test]
    fn test_operator_priority() {
        let cases = [
            ("a!=1", FilterOperator::NotEquals),
            ("a!~x", FilterOperator::NotContains),
            ("a>=1", FilterOperator::GreaterOrEqual),
            ("a<=1", FilterOperator::LessOrEqual),
            ("a=~^x", FilterOperator::RegexMatch),
            ("a=1", FilterOperator::Equals),
            ("a~x", FilterOperator::Contains),
            ("a>1", FilterOperator::Greater),
            ("a<1", FilterOperator::Less),
        ];
        for (clause, expected) in cases {
            let expr = parse_expression(clause).unwrap();
            assert_eq!(expr.operator, expected, "clause {clause}");
            assert_eq!(expr.field, "A", "clause {clause}");
        }
    }

    #[test]
    fn test_operator_at_start_is_skipped() {
        // `=` sits at index 0, so the later `~` wins
        let expr = parse_expression("=a~b").unwrap();
        assert_eq!(expr.operator, FilterOperator::Contains);
        assert_eq!(expr.field, "=a");
        assert!(matches!(
            parse_expression("=value"),
            Err(FilterParseError::NoOperator { .. })
        ));
    }

    #[test]
    fn test_value_quotes_stripped_once() {
        let expr = parse_expression("name='job one'").unwrap();
        assert_eq!(expr.scalar(), Some(&Scalar::from("job one")));
        let expr = parse_expression(r#"name="'x'""#).unwrap();
        assert_eq!(expr.scalar(), Some(&Scalar::from("'x'")));
        let expr = parse_expression("name='x\"").unwrap();
        assert_eq!(expr.scalar(), Some(&Scalar::from("'x\"")));
    }

    #[test]
    fn test_quoted_value_is_still_coerced() {
        let expr = parse_expression("cpus='8'").unwrap();
        assert_eq!(expr.scalar().map(Scalar::kind), Some(ScalarKind::Integer));
    }

    #[test]
    fn test_operator_inside_quotes_is_ignored() {
        let expr = parse_expression("name='a!=b'").unwrap();
        assert_eq!(expr.operator, FilterOperator::Equals);
        assert_eq!(expr.scalar(), Some(&Scalar::from("a!=b")));
    }

    #[test]
    fn test_parse_in_lists() {
        let expr = parse_expression("state in (running, pending)").unwrap();
        assert_eq!(expr.field, "State");
        assert_eq!(expr.operator, FilterOperator::InList);
        assert_eq!(
            expr.value,
            ExpressionValue::List(vec!["running".into(), "pending".into()])
        );

        let expr = parse_expression("user not in ('bob',alice)").unwrap();
        assert_eq!(expr.operator, FilterOperator::NotInList);
        assert_eq!(
            expr.value,
            ExpressionValue::List(vec!["'bob'".into(), "alice".into()])
        );
    }

    #[test]
    fn test_in_list_without_parentheses() {
        let expr = parse_expression("state in running").unwrap();
        assert_eq!(expr.value, ExpressionValue::List(vec!["running".into()]));
    }

    #[test]
    fn test_invalid_in_lists() {
        for clause in ["state in ()", "state not in ( )"] {
            assert!(
                matches!(
                    parse_expression(clause),
                    Err(FilterParseError::InvalidList { .. })
                ),
                "clause {clause:?}"
            );
        }
    }

    #[test]
    fn test_quoted_or_spaced_field_is_rejected() {
        let err = parse_filter("'job name'=x").unwrap_err();
        assert!(matches!(err, FilterParseError::InvalidClause { .. }));
        assert_eq!(err.clause(), "'job name'=x");
        assert!(err.to_string().contains("cannot be quoted"));

        let err = parse_expression("job name in (a,b)").unwrap_err();
        assert!(err.to_string().contains("whitespace"));
    }

    #[test]
    fn test_parse_filter_defaults_to_and() {
        let filter = parse_filter("state=running user=alice").unwrap();
        assert_eq!(filter.len(), 2);
        assert_eq!(filter.logic, Logic::And);
    }

    #[test]
    fn test_parse_filter_with_combinators() {
        let filter = parse_filter("state=running OR state=pending").unwrap();
        assert_eq!(filter.len(), 2);
        assert_eq!(filter.logic, Logic::Or);

        let filter = parse_filter("a=1 && b=2").unwrap();
        assert_eq!(filter.logic, Logic::And);

        let err = parse_filter("a=1 or b=2 and c=3").unwrap_err();
        assert_eq!(
            err,
            FilterParseError::MixedLogic {
                clause: "and".into()
            }
        );
    }

    #[test]
    fn test_parse_filter_fails_atomically() {
        let err = parse_filter("state=running bogus user=alice").unwrap_err();
        assert_eq!(err.clause(), "bogus");
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_custom_aliases_and_default_logic() {
        let parser = FilterParser::new(FieldAliases::from_pairs([("gpu", "TresPerNode")]))
            .with_default_logic(Logic::Or);
        let filter = parser.parse("gpu=2 state=running").unwrap();
        assert_eq!(filter.logic, Logic::Or);
        assert_eq!(filter.expressions[0].field, "TresPerNode");
        assert_eq!(filter.expressions[1].field, "State");
        // Built-in aliases are not implied by a custom table
        let filter = parser.parse("nodes=n01").unwrap();
        assert_eq!(filter.expressions[0].field, "Nodes");
    }

    #[test]
    fn test_display_renders_filter_text() {
        let filter = parse_filter("state in (a,b) name='job one' mem>4G").unwrap();
        assert_eq!(filter.to_string(), r#"State in (a,b) Name="job one" Memory>4G"#);
        let filter = parse_filter("a=1 OR b=2").unwrap();
        assert_eq!(filter.to_string(), "A=1 OR B=2");
        assert_eq!(parse_filter("a=1 OR").unwrap().to_string(), "A=1 OR");
        assert_eq!(parse_filter("name='a!=b'").unwrap().to_string(), r#"Name="a!=b""#);
        assert_eq!(parse_filter("load>3.0").unwrap().to_string(), "Load>3.0");
    }

    #[test]
    fn test_labels_do_not_affect_equality() {
        let a = parse_filter("state=running").unwrap().with_name("running");
        let b = parse_filter("state=running").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.name.as_deref(), Some("running"));
    }

    #[test]
    fn test_logic_from_str() {
        assert_eq!("or".parse::<Logic>(), Ok(Logic::Or));
        assert_eq!(" AND ".parse::<Logic>(), Ok(Logic::And));
        assert!("xor".parse::<Logic>().is_err());
    }
}
