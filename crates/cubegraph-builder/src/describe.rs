//! Markdown descriptions for dimension and measure components

use cubegraph_model::{DimensionDef, MeasureDef};

/// Describe a dimension: its SQL, else its `case` expression, else nothing
pub fn dimension_description(dimension: &DimensionDef) -> String {
    if let Some(sql) = &dimension.sql {
        return sql_block(sql);
    }

    if let Some(case) = &dimension.case {
        let text = serde_json::to_string_pretty(case).unwrap_or_else(|_| case.to_string());
        return format!("```json\n{}\n```", text);
    }

    String::new()
}

/// Describe a measure: its SQL, else its type tag
pub fn measure_description(measure: &MeasureDef) -> String {
    match &measure.sql {
        Some(sql) => sql_block(sql),
        None => measure.measure_type.clone(),
    }
}

fn sql_block(sql: &str) -> String {
    format!("```sql\n{}\n```", sql.trim())
}
