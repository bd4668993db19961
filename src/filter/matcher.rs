use super::operator::FilterOperator;
use super::parser::{Expression, ExpressionValue, Filter, Logic};
use super::value::Scalar;
use regex::Regex;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Anything a filter can be evaluated against
///
/// A record exposes named fields as [`Scalar`] values. Fields the record
/// does not have return `None`, and any expression on such a field is false.
pub trait Record {
    fn field(&self, name: &str) -> Option<Cow<'_, Scalar>>;
}

impl<R: Record + ?Sized> Record for &R {
    fn field(&self, name: &str) -> Option<Cow<'_, Scalar>> {
        (**self).field(name)
    }
}

impl Record for HashMap<String, Scalar> {
    fn field(&self, name: &str) -> Option<Cow<'_, Scalar>> {
        self.get(name).map(Cow::Borrowed)
    }
}

impl Record for BTreeMap<String, Scalar> {
    fn field(&self, name: &str) -> Option<Cow<'_, Scalar>> {
        self.get(name).map(Cow::Borrowed)
    }
}

impl Record for HashMap<String, String> {
    fn field(&self, name: &str) -> Option<Cow<'_, Scalar>> {
        self.get(name).map(|v| Cow::Owned(Scalar::String(v.clone())))
    }
}

impl Record for BTreeMap<String, String> {
    fn field(&self, name: &str) -> Option<Cow<'_, Scalar>> {
        self.get(name).map(|v| Cow::Owned(Scalar::String(v.clone())))
    }
}

/// Where a regex-match expression gets its pattern from
enum Pattern<'a> {
    /// Compile the expression value on every evaluation
    Fresh,
    /// Use a pattern compiled up front; `None` means it did not compile
    Compiled(Option<&'a Regex>),
}

impl Expression {
    /// Evaluate this expression against a record
    pub fn evaluate<R: Record + ?Sized>(&self, record: &R) -> bool {
        self.evaluate_with(record, Pattern::Fresh)
    }

    fn evaluate_with<R: Record + ?Sized>(&self, record: &R, pattern: Pattern<'_>) -> bool {
        let Some(actual) = record.field(&self.field) else {
            log::trace!("field '{}' missing, '{}' is false", self.field, self);
            return false;
        };

        let expected: Cow<'_, Scalar> = match &self.value {
            ExpressionValue::Scalar(scalar) => Cow::Borrowed(scalar),
            ExpressionValue::List(_) => Cow::Owned(Scalar::String(self.value.to_string())),
        };

        let result = match self.operator {
            FilterOperator::Equals => equals(&actual, &expected),
            FilterOperator::NotEquals => !equals(&actual, &expected),
            FilterOperator::Contains => contains(&actual, &expected),
            FilterOperator::NotContains => !contains(&actual, &expected),
            FilterOperator::Greater => greater(&actual, &expected),
            FilterOperator::Less => less(&actual, &expected),
            FilterOperator::GreaterOrEqual => {
                greater(&actual, &expected) || equals(&actual, &expected)
            }
            FilterOperator::LessOrEqual => less(&actual, &expected) || equals(&actual, &expected),
            FilterOperator::RegexMatch => regex_match(&actual, &expected, pattern),
            FilterOperator::InList => in_list(&actual, &self.value),
            FilterOperator::NotInList => !in_list(&actual, &self.value),
        };

        log::trace!("'{}' against {:?} is {}", self, actual, result);
        result
    }
}

impl Filter {
    /// Decide whether a record matches this filter
    ///
    /// An empty filter matches everything. `OR` needs one matching
    /// expression, `AND` needs all of them.
    pub fn evaluate<R: Record + ?Sized>(&self, record: &R) -> bool {
        combine(self.logic, self.expressions.iter(), |expr| {
            expr.evaluate(record)
        })
    }

    /// Records that match this filter, in their original order
    pub fn filter_records<'a, R: Record>(&self, records: &'a [R]) -> Vec<&'a R> {
        let compiled = self.compile();
        records
            .iter()
            .filter(|record| compiled.evaluate(*record))
            .collect()
    }

    /// Compile every regex pattern once for repeated evaluation
    pub fn compile(&self) -> CompiledFilter<'_> {
        let patterns = self
            .expressions
            .iter()
            .map(|expr| {
                if expr.operator != FilterOperator::RegexMatch {
                    return None;
                }
                let source = match &expr.value {
                    ExpressionValue::Scalar(scalar) => scalar.to_string(),
                    list => list.to_string(),
                };
                match Regex::new(&source) {
                    Ok(re) => Some(re),
                    Err(err) => {
                        log::warn!(
                            "pattern '{}' for field '{}' does not compile, it will never match: {}",
                            source,
                            expr.field,
                            err
                        );
                        None
                    }
                }
            })
            .collect();

        CompiledFilter {
            filter: self,
            patterns,
        }
    }
}

/// A filter with its regex patterns compiled
///
/// Evaluates exactly like [`Filter::evaluate`].
#[derive(Debug)]
pub struct CompiledFilter<'a> {
    filter: &'a Filter,
    patterns: Vec<Option<Regex>>,
}

impl CompiledFilter<'_> {
    pub fn filter(&self) -> &Filter {
        self.filter
    }

    pub fn evaluate<R: Record + ?Sized>(&self, record: &R) -> bool {
        combine(
            self.filter.logic,
            self.filter.expressions.iter().zip(&self.patterns),
            |(expr, pattern)| expr.evaluate_with(record, Pattern::Compiled(pattern.as_ref())),
        )
    }
}

fn combine<I, F>(logic: Logic, mut items: I, mut eval: F) -> bool
where
    I: ExactSizeIterator,
    F: FnMut(I::Item) -> bool,
{
    if items.len() == 0 {
        return true;
    }
    match logic {
        Logic::Or => items.any(&mut eval),
        Logic::And => items.all(&mut eval),
    }
}

fn equals(actual: &Scalar, expected: &Scalar) -> bool {
    actual.canonical() == expected.canonical()
}

fn contains(actual: &Scalar, expected: &Scalar) -> bool {
    actual
        .to_string()
        .to_lowercase()
        .contains(&expected.to_string().to_lowercase())
}

fn greater(actual: &Scalar, expected: &Scalar) -> bool {
    compare(actual, expected) == Ordering::Greater
}

fn less(actual: &Scalar, expected: &Scalar) -> bool {
    compare(actual, expected) == Ordering::Less
}

/// Order two values: memory sizes, then durations, then numbers, then text
fn compare(actual: &Scalar, expected: &Scalar) -> Ordering {
    if let (Some(a), Some(b)) = (actual.memory_bytes(), expected.memory_bytes()) {
        return a.cmp(&b);
    }
    if let (Some(a), Some(b)) = (actual.duration(), expected.duration()) {
        return a.cmp(&b);
    }
    if let (Some(a), Some(b)) = (actual.as_f64(), expected.as_f64()) {
        if let Some(ordering) = a.partial_cmp(&b) {
            return ordering;
        }
    }
    actual.to_string().cmp(&expected.to_string())
}

fn regex_match(actual: &Scalar, expected: &Scalar, pattern: Pattern<'_>) -> bool {
    match pattern {
        Pattern::Compiled(Some(re)) => re.is_match(&actual.to_string()),
        Pattern::Compiled(None) => false,
        Pattern::Fresh => Regex::new(&expected.to_string())
            .map(|re| re.is_match(&actual.to_string()))
            .unwrap_or(false),
    }
}

fn in_list(actual: &Scalar, value: &ExpressionValue) -> bool {
    match value {
        ExpressionValue::List(items) => {
            let actual = actual.to_string();
            items.iter().any(|item| *item == actual)
        }
        ExpressionValue::Scalar(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::parser::parse_filter;
    use std::time::Duration;

    fn record(pairs: &[(&str, Scalar)]) -> HashMap<String, Scalar> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = Filter::new();
        assert!(filter.evaluate(&record(&[])));
        assert!(filter.evaluate(&record(&[("State", "failed".into())])));
        assert!(filter.compile().evaluate(&record(&[])));
    }

    #[test]
    fn test_equals_uses_canonical_forms() {
        let filter = parse_filter("time=2:30:00").unwrap();
        assert!(filter.evaluate(&record(&[("TimeUsed", "02:30:00".into())])));
        let filter = parse_filter("mem=4096M").unwrap();
        assert!(filter.evaluate(&record(&[("Memory", "4G".into())])));
        let filter = parse_filter("cpus=4").unwrap();
        assert!(filter.evaluate(&record(&[("CPUs", Scalar::Integer(4))])));
    }

    #[test]
    fn test_contains_is_case_insensitive() {
        let filter = parse_filter("name~TRAIN").unwrap();
        assert!(filter.evaluate(&record(&[("Name", "bert-training".into())])));
        let filter = parse_filter("name!~train").unwrap();
        assert!(!filter.evaluate(&record(&[("Name", "Bert-Training".into())])));
    }

    #[test]
    fn test_ordering_prefers_memory_then_duration_then_numbers() {
        let filter = parse_filter("mem>512M").unwrap();
        assert!(filter.evaluate(&record(&[("Memory", "1G".into())])));
        assert!(filter.evaluate(&record(&[("Memory", Scalar::Memory(1 << 30))])));

        let filter = parse_filter("time<1h").unwrap();
        assert!(filter.evaluate(&record(&[("TimeUsed", "00:45:00".into())])));
        assert!(!filter.evaluate(&record(&[(
            "TimeUsed",
            Scalar::ClusterDuration(Duration::from_secs(7_200))
        )])));

        let filter = parse_filter("priority>9").unwrap();
        assert!(filter.evaluate(&record(&[("Priority", "10".into())])));
    }

    #[test]
    fn test_ordering_falls_back_to_text() {
        let filter = parse_filter("name>m").unwrap();
        assert!(filter.evaluate(&record(&[("Name", "zeta".into())])));
        assert!(!filter.evaluate(&record(&[("Name", "alpha".into())])));
    }

    #[test]
    fn test_regex_match_and_bad_pattern() {
        let filter = parse_filter(r"name=~^job-\d+$").unwrap();
        assert!(filter.evaluate(&record(&[("Name", "job-42".into())])));
        assert!(!filter.evaluate(&record(&[("Name", "job-x".into())])));

        let filter = parse_filter("name=~(unclosed").unwrap();
        assert!(!filter.evaluate(&record(&[("Name", "(unclosed".into())])));
        assert!(!filter.compile().evaluate(&record(&[("Name", "(unclosed".into())])));
    }

    #[test]
    fn test_compiled_pattern_with_spaces_is_not_quoted() {
        let filter = parse_filter("name=~'^job one'").unwrap();
        let rec = record(&[("Name", "job one done".into())]);
        assert!(filter.evaluate(&rec));
        assert!(filter.compile().evaluate(&rec));
    }

    #[test]
    fn test_in_list_with_scalar_value() {
        let in_expr = Expression::new(
            "State",
            FilterOperator::InList,
            ExpressionValue::Scalar("running".into()),
        );
        let not_in_expr = Expression::new(
            "State",
            FilterOperator::NotInList,
            ExpressionValue::Scalar("running".into()),
        );
        let rec = record(&[("State", "running".into())]);
        assert!(!in_expr.evaluate(&rec));
        assert!(not_in_expr.evaluate(&rec));
    }

    #[test]
    fn test_or_logic_short_circuits_on_first_match() {
        let filter = parse_filter("state=running OR state=pending").unwrap();
        assert!(filter.evaluate(&record(&[("State", "pending".into())])));
        assert!(!filter.evaluate(&record(&[("State", "failed".into())])));
    }

    #[test]
    fn test_compiled_filter_agrees_with_filter() {
        let filter = parse_filter(r"name=~^a.* state in (running,pending) mem>=1G").unwrap();
        let compiled = filter.compile();
        let records = [
            record(&[
                ("Name", "alpha".into()),
                ("State", "running".into()),
                ("Memory", "1G".into()),
            ]),
            record(&[
                ("Name", "beta".into()),
                ("State", "running".into()),
                ("Memory", "2G".into()),
            ]),
            record(&[("Name", "alpha".into()), ("State", "pending".into())]),
        ];
        for rec in &records {
            assert_eq!(compiled.evaluate(rec), filter.evaluate(rec));
        }
        assert_eq!(filter.filter_records(&records).len(), 1);
    }

    #[test]
    fn test_string_maps_are_records() {
        let rec: BTreeMap<String, String> =
            [("State".to_string(), "running".to_string())].into();
        assert!(parse_filter("state=running").unwrap().evaluate(&rec));
    }
}
