//! 按唯一键分块扫描整表时使用的查询
//!
//! 全量复制以唯一键的字典序推进：先取唯一键的最小值与最大值，再逐块查询下一块的结束位置，
//! 最后用起止两个范围比较选出一块数据。

use crate::column::ColumnList;
use crate::comparison::{range_prepared_comparison, ComparisonSign};
use crate::error::{DmlError, Result};
use crate::escape::escape_identifier;
use crate::value::BindValue;

/// 带绑定参数的查询
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkQuery {
    pub sql: String,
    pub args: Vec<BindValue>,
}

fn escaped_names(columns: &ColumnList, what: &str) -> Result<Vec<String>> {
    if columns.is_empty() {
        return Err(DmlError::EmptyColumns(format!("got 0 {} columns", what)));
    }
    Ok(columns
        .columns()
        .iter()
        .map(|c| escape_identifier(&c.name))
        .collect())
}

fn order_by(names: &[String], descending: bool) -> String {
    let direction = if descending { "DESC" } else { "ASC" };
    names
        .iter()
        .map(|name| format!("{} {}", name, direction))
        .collect::<Vec<_>>()
        .join(", ")
}

/// 唯一键在 `(start, end]`（或 `[start, end]`）之间的范围条件
fn bounded_range(
    unique_key: &ColumnList,
    range_start_args: &[BindValue],
    range_end_args: &[BindValue],
    include_start: bool,
) -> Result<ChunkQuery> {
    let names = unique_key.names();
    let start_sign = if include_start {
        ComparisonSign::GreaterThanOrEquals
    } else {
        ComparisonSign::GreaterThan
    };
    let start = range_prepared_comparison(names.as_slice(), range_start_args, start_sign)?;
    let end = range_prepared_comparison(names.as_slice(), range_end_args, ComparisonSign::LessThanOrEquals)?;
    let mut args = start.args;
    args.extend(end.args);
    Ok(ChunkQuery {
        sql: format!("{} AND {}", start.sql, end.sql),
        args,
    })
}

fn unique_key_edge_query(
    database: &str,
    table: &str,
    unique_key: &ColumnList,
    descending: bool,
) -> Result<String> {
    let names = escaped_names(unique_key, "unique key")?;
    Ok(format!(
        "SELECT {} FROM {}.{} ORDER BY {} LIMIT 1",
        names.join(", "),
        escape_identifier(database),
        escape_identifier(table),
        order_by(&names, descending)
    ))
}

/// 唯一键的最小值
pub fn unique_key_min_values_query(
    database: &str,
    table: &str,
    unique_key: &ColumnList,
) -> Result<String> {
    unique_key_edge_query(database, table, unique_key, false)
}

/// 唯一键的最大值
pub fn unique_key_max_values_query(
    database: &str,
    table: &str,
    unique_key: &ColumnList,
) -> Result<String> {
    unique_key_edge_query(database, table, unique_key, true)
}

/// 查询下一块的结束位置：从起点开始第 `chunk_size` 行的唯一键
pub fn unique_key_range_end_query(
    database: &str,
    table: &str,
    unique_key: &ColumnList,
    range_start_args: &[BindValue],
    range_end_args: &[BindValue],
    chunk_size: u64,
    include_start: bool,
) -> Result<ChunkQuery> {
    if chunk_size == 0 {
        return Err(DmlError::EmptyOperand(format!(
            "chunk size must be positive for {}.{}",
            database, table
        )));
    }
    let names = escaped_names(unique_key, "unique key")?;
    let range = bounded_range(unique_key, range_start_args, range_end_args, include_start)?;
    let sql = format!(
        "SELECT /* dmlplus chunk end */ {} FROM {}.{} WHERE {} ORDER BY {} LIMIT 1 OFFSET {}",
        names.join(", "),
        escape_identifier(database),
        escape_identifier(table),
        range.sql,
        order_by(&names, false),
        chunk_size - 1
    );
    tracing::trace!(sql = %sql, "built chunk end query");
    Ok(ChunkQuery {
        sql,
        args: range.args,
    })
}

/// 读取一块数据的共享列
pub fn range_select_query(
    database: &str,
    table: &str,
    columns: &ColumnList,
    unique_key: &ColumnList,
    range_start_args: &[BindValue],
    range_end_args: &[BindValue],
    include_start: bool,
) -> Result<ChunkQuery> {
    let names = escaped_names(columns, "selected")?;
    let key_names = escaped_names(unique_key, "unique key")?;
    let range = bounded_range(unique_key, range_start_args, range_end_args, include_start)?;
    let sql = format!(
        "SELECT {} FROM {}.{} WHERE {} ORDER BY {}",
        names.join(", "),
        escape_identifier(database),
        escape_identifier(table),
        range.sql,
        order_by(&key_names, false)
    );
    tracing::trace!(sql = %sql, "built chunk select query");
    Ok(ChunkQuery {
        sql,
        args: range.args,
    })
}
