//! Scan filter expressions.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use coffer_core::owner::RecordFilter;

use super::item::filter_value;

/// A filter rendered as a DynamoDB filter expression with its placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpression {
    /// Expression text, conditions joined with `AND`.
    pub expression: String,
    /// `#fN` placeholders to attribute names.
    pub names: HashMap<String, String>,
    /// `:fNvM` placeholders to values.
    pub values: HashMap<String, AttributeValue>,
}

/// Render `filter`, `None` when it has no conditions.
///
/// Equality becomes `#f IN (:v, ..)`, inequality `NOT (#f IN (:v, ..))`.
/// Conditions with an empty value list are skipped.
pub fn build(filter: &RecordFilter) -> Option<FilterExpression> {
    let mut out = FilterExpression {
        expression: String::new(),
        names: HashMap::new(),
        values: HashMap::new(),
    };
    let mut clauses = Vec::new();
    let mut index = 0usize;

    let conditions = filter
        .equal
        .iter()
        .map(|(field, values)| (false, field, values))
        .chain(
            filter
                .not_equal
                .iter()
                .map(|(field, values)| (true, field, values)),
        );

    for (negate, field, values) in conditions {
        if values.is_empty() {
            continue;
        }
        let name_ph = format!("#f{index}");
        let value_phs: Vec<String> = values
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let ph = format!(":f{index}v{i}");
                out.values.insert(ph.clone(), filter_value(field, value));
                ph
            })
            .collect();
        out.names.insert(name_ph.clone(), field.clone());

        let membership = format!("{name_ph} IN ({})", value_phs.join(", "));
        clauses.push(if negate {
            format!("NOT ({membership})")
        } else {
            membership
        });
        index += 1;
    }

    if clauses.is_empty() {
        return None;
    }
    out.expression = clauses.join(" AND ");
    Some(out)
}
