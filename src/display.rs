use crate::filter::{ExpressionValue, Filter};
use crate::record::JsonRecord;
use colored::Colorize;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use serde_json::json;
use std::collections::BTreeSet;
use std::fmt::Write as _;

/// Table with the house style and a bold header row
pub fn create_styled_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
    table
}

/// Render matched records as a table
///
/// With no explicit columns every field seen in the records is shown, in
/// key order. Fields a record lacks are left blank.
pub fn format_records_table(records: &[&JsonRecord], columns: &[String]) -> String {
    if records.is_empty() {
        return format!("{}\n", "No records match the filter.".yellow());
    }

    let columns: Vec<String> = if columns.is_empty() {
        records
            .iter()
            .flat_map(|r| r.fields().keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    } else {
        columns.to_vec()
    };

    let headers: Vec<&str> = columns.iter().map(String::as_str).collect();
    let mut table = create_styled_table(&headers);
    for record in records {
        table.add_row(
            columns
                .iter()
                .map(|col| {
                    Cell::new(
                        record
                            .fields()
                            .get(col)
                            .map(|v| v.to_string())
                            .unwrap_or_default(),
                    )
                })
                .collect::<Vec<_>>(),
        );
    }

    let mut out = String::new();
    let _ = writeln!(out, "{table}");
    let _ = writeln!(
        out,
        "{} matching record{}",
        records.len().to_string().green().bold(),
        if records.len() == 1 { "" } else { "s" }
    );
    out
}

/// Render matched records as JSON lines, using each record's original object
pub fn format_records_json(records: &[&JsonRecord]) -> String {
    let mut out = String::new();
    for record in records {
        let _ = writeln!(out, "{}", record.raw());
    }
    out
}

/// Describe how a filter string was split and parsed
pub fn format_explain_text(clauses: &[&str], filter: &Filter) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "CLAUSES".bold());
    for (idx, clause) in clauses.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", idx + 1, clause);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{} {}", "LOGIC".bold(), filter.logic);

    if filter.is_empty() {
        let _ = writeln!(out, "{}", "Empty filter, every record matches.".yellow());
        return out;
    }

    let mut table = create_styled_table(&["#", "Field", "Operator", "Value", "Type"]);
    for (idx, expr) in filter.expressions.iter().enumerate() {
        let kind = match &expr.value {
            ExpressionValue::Scalar(scalar) => scalar.kind().to_string(),
            ExpressionValue::List(items) => format!("list[{}]", items.len()),
        };
        table.add_row(vec![
            Cell::new(idx + 1),
            Cell::new(&expr.field),
            Cell::new(expr.operator.symbol()),
            Cell::new(expr.value.to_string()),
            Cell::new(kind),
        ]);
    }
    let _ = writeln!(out, "{table}");
    out
}

pub fn format_explain_json(clauses: &[&str], filter: &Filter) -> String {
    let expressions: Vec<_> = filter
        .expressions
        .iter()
        .map(|expr| match &expr.value {
            ExpressionValue::Scalar(scalar) => json!({
                "field": expr.field,
                "operator": expr.operator,
                "value": scalar.to_string(),
                "kind": scalar.kind().name(),
            }),
            ExpressionValue::List(items) => json!({
                "field": expr.field,
                "operator": expr.operator,
                "value": items,
                "kind": "list",
            }),
        })
        .collect();

    serde_json::to_string_pretty(&json!({
        "clauses": clauses,
        "logic": filter.logic,
        "expressions": expressions,
    }))
    .unwrap_or_else(|_| "{\"error\":\"failed to serialize explanation\"}".to_string())
}
