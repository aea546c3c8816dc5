//! UPDATE 的 SET 子句和 INSERT 的取值占位符

use crate::column::{Column, ColumnList};
use crate::error::{DmlError, Result};
use crate::escape::{escape_identifier, escape_literal};

/// 源端时间戳统一以 UTC 作为中间时区
const INTERMEDIATE_TIMEZONE: &str = "+00:00";

/// 单列的取值占位符：普通列为 `?`，带时区转换的列为 `convert_tz(?, '<tz>', '+00:00')`
pub(crate) fn column_placeholder(column: &Column) -> String {
    match &column.timezone_conversion {
        Some(tz) => format!(
            "convert_tz(?, '{}', '{}')",
            escape_literal(&tz.to_timezone),
            INTERMEDIATE_TIMEZONE
        ),
        None => "?".to_string(),
    }
}

/// 按列顺序生成取值占位符
pub fn columns_prepared_values(columns: &ColumnList) -> Vec<String> {
    columns.columns().iter().map(column_placeholder).collect()
}

/// 生成 `col1=?, col2=convert_tz(?, ...)` 形式的 SET 子句
pub fn set_prepared_clause(columns: &ColumnList) -> Result<String> {
    if columns.is_empty() {
        return Err(DmlError::EmptyColumns(
            "got 0 columns in set clause".to_string(),
        ));
    }
    let tokens: Vec<String> = columns
        .columns()
        .iter()
        .map(|column| {
            format!(
                "{}={}",
                escape_identifier(&column.name),
                column_placeholder(column)
            )
        })
        .collect();
    Ok(tokens.join(", "))
}
