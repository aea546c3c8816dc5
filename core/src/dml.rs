//! 行变更 DML 构建
//!
//! 调用方只需要提供一份按整表列顺序排列的行镜像，以及表列、共享列、唯一键列等元数据；
//! 每一列在行镜像中的位置都通过 `ColumnList::ordinal` 在表列中查找，构建器内部完成全部下标换算。
//!
//! 生成的语句是直接拼接的文本：标识符来自可信的表结构元数据，并不针对注入做加固。

use crate::column::{Column, ColumnList};
use crate::comparison::{value_comparison, ComparisonSign};
use crate::error::{DmlError, Result};
use crate::escape::{escape_identifier, escape_literal};
use crate::set_clause::{column_placeholder, set_prepared_clause};
use crate::value::BindValue;
use std::collections::HashSet;

/// `REPLACE INTO` 语句，参数长度等于表列数
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub sql: String,
    pub args: Vec<BindValue>,
}

/// 单行 `UPDATE` 语句
///
/// `shared_args` 绑定 SET 子句的占位符，`unique_key_args` 绑定 WHERE 子句的占位符，
/// 执行时需要按子句出现的顺序拼接，见 [`UpdateStatement::bind_args`]。
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub sql: String,
    pub shared_args: Vec<BindValue>,
    pub unique_key_args: Vec<BindValue>,
}

impl UpdateStatement {
    /// SET 参数在前，WHERE 参数在后
    pub fn bind_args(&self) -> Vec<BindValue> {
        let mut args = Vec::with_capacity(self.shared_args.len() + self.unique_key_args.len());
        args.extend_from_slice(&self.shared_args);
        args.extend_from_slice(&self.unique_key_args);
        args
    }
}

/// 按整行匹配的 `DELETE` 语句
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    pub sql: String,
    pub unique_key_args: Vec<BindValue>,
}

fn qualified_table(database: &str, table: &str) -> String {
    format!("{}.{}", escape_identifier(database), escape_identifier(table))
}

fn check_row_width(args: &[BindValue], table_columns: &ColumnList, what: &str) -> Result<()> {
    if args.len() != table_columns.len() {
        return Err(DmlError::ArityMismatch(format!(
            "{} count {} differs from table column count {}",
            what,
            args.len(),
            table_columns.len()
        )));
    }
    Ok(())
}

fn check_shared_columns(
    table_columns: &ColumnList,
    shared_columns: &ColumnList,
    mapped_shared_columns: &ColumnList,
) -> Result<()> {
    if !shared_columns.is_subset_of(table_columns) {
        return Err(DmlError::SchemaMismatch(
            "shared columns is not a subset of table columns".to_string(),
        ));
    }
    if shared_columns.is_empty() {
        return Err(DmlError::EmptyColumns("no shared columns found".to_string()));
    }
    if mapped_shared_columns.len() != shared_columns.len() {
        return Err(DmlError::ArityMismatch(format!(
            "got {} mapped shared columns for {} shared columns",
            mapped_shared_columns.len(),
            shared_columns.len()
        )));
    }
    Ok(())
}

/// NULL 原样返回，其余值经过列的类型转换
fn converted_arg(column: &Column, value: &BindValue) -> BindValue {
    if value.is_null() {
        BindValue::Null
    } else {
        column.convert_arg(value.clone())
    }
}

/// binary 列的内联字面量：`cast('<value>' as <type>)`
fn cast_literal(column: &Column, value: &BindValue) -> String {
    let literal = match value {
        BindValue::String(_) | BindValue::Bytes(_) | BindValue::DateTime(_) => value.to_sql_literal(),
        other => format!("'{}'", escape_literal(&other.to_sql_literal())),
    };
    format!("cast({} as {})", literal, column.column_type)
}

/// 为一组列生成 WHERE 比较，返回比较片段和 `?` 占位符对应的参数
///
/// - NULL：`IS NULL`
/// - binary 列：内联 `cast(...)` 字面量，不占用绑定参数
/// - 其他：`= ?`，值追加到参数列表
fn row_match_comparisons<'a>(
    columns: impl IntoIterator<Item = &'a Column>,
    table_columns: &ColumnList,
    args: &[BindValue],
) -> Result<(Vec<String>, Vec<BindValue>)> {
    let mut comparisons = Vec::new();
    let mut unique_key_args = Vec::new();
    for column in columns {
        let ordinal = table_columns.ordinal(&column.name).ok_or_else(|| {
            DmlError::SchemaMismatch(format!(
                "key column '{}' is not a table column",
                column.name
            ))
        })?;
        // 类型信息以表列为准
        let table_column = &table_columns.columns()[ordinal];
        let value = &args[ordinal];
        let comparison = if value.is_null() {
            value_comparison(&table_column.name, "NULL", ComparisonSign::Is)?
        } else if table_column.is_binary() {
            let arg = table_column.convert_arg(value.clone());
            value_comparison(
                &table_column.name,
                &cast_literal(table_column, &arg),
                ComparisonSign::Equals,
            )?
        } else {
            unique_key_args.push(table_column.convert_arg(value.clone()));
            value_comparison(&table_column.name, "?", ComparisonSign::Equals)?
        };
        comparisons.push(comparison);
    }
    Ok((comparisons, unique_key_args))
}

/// 构建 `REPLACE INTO`（按键覆盖已有行）
///
/// 语句总是覆盖目标表的全部列；共享列只用于校验以及目标端列名映射。
pub fn build_insert(
    database: &str,
    table: &str,
    table_columns: &ColumnList,
    shared_columns: &ColumnList,
    mapped_shared_columns: &ColumnList,
    args: &[BindValue],
) -> Result<InsertStatement> {
    check_row_width(args, table_columns, "args")?;
    check_shared_columns(table_columns, shared_columns, mapped_shared_columns)?;

    let mut names = Vec::with_capacity(table_columns.len());
    let mut placeholders = Vec::with_capacity(table_columns.len());
    let mut insert_args = Vec::with_capacity(table_columns.len());
    let mut seen = HashSet::with_capacity(table_columns.len());
    for (ordinal, column) in table_columns.columns().iter().enumerate() {
        let name = match shared_columns.ordinal(&column.name) {
            Some(i) => &mapped_shared_columns.columns()[i].name,
            None => &column.name,
        };
        // 映射后的列名不能与未共享列的原名冲突
        if !seen.insert(name.as_str()) {
            return Err(DmlError::SchemaMismatch(format!(
                "column '{}' appears more than once in insert into {}.{}",
                name, database, table
            )));
        }
        names.push(escape_identifier(name));
        placeholders.push(column_placeholder(column));
        insert_args.push(converted_arg(column, &args[ordinal]));
    }

    let sql = format!(
        "REPLACE INTO {} ({}) VALUES ({})",
        qualified_table(database, table),
        names.join(", "),
        placeholders.join(", ")
    );
    tracing::debug!(database, table, args = insert_args.len(), "built replace statement");
    tracing::trace!(sql = %sql);
    Ok(InsertStatement {
        sql,
        args: insert_args,
    })
}

/// 构建单行 `UPDATE`
///
/// SET 子句来自映射后的共享列，取值来自 `value_args`；WHERE 子句来自唯一键列，取值来自 `where_args`。
/// 语句固定追加 `LIMIT 1`，每次最多影响一行目标数据。
#[allow(clippy::too_many_arguments)]
pub fn build_update(
    database: &str,
    table: &str,
    table_columns: &ColumnList,
    shared_columns: &ColumnList,
    mapped_shared_columns: &ColumnList,
    unique_key_columns: &ColumnList,
    value_args: &[BindValue],
    where_args: &[BindValue],
) -> Result<UpdateStatement> {
    check_row_width(value_args, table_columns, "value args")?;
    check_row_width(where_args, table_columns, "where args")?;
    check_shared_columns(table_columns, shared_columns, mapped_shared_columns)?;
    if unique_key_columns.is_empty() {
        return Err(DmlError::EmptyColumns(format!(
            "no unique key columns for update of {}.{}",
            database, table
        )));
    }

    let mut shared_args = Vec::with_capacity(shared_columns.len());
    for column in shared_columns.columns() {
        let ordinal = table_columns.ordinal(&column.name).ok_or_else(|| {
            DmlError::SchemaMismatch(format!("shared column '{}' is not a table column", column.name))
        })?;
        shared_args.push(converted_arg(
            &table_columns.columns()[ordinal],
            &value_args[ordinal],
        ));
    }

    let set_clause = set_prepared_clause(mapped_shared_columns)?;
    let (comparisons, unique_key_args) =
        row_match_comparisons(unique_key_columns.columns(), table_columns, where_args)?;

    let sql = format!(
        "UPDATE {} SET {} WHERE ({}) LIMIT 1",
        qualified_table(database, table),
        set_clause,
        comparisons.join(" AND ")
    );
    tracing::debug!(
        database,
        table,
        shared_args = shared_args.len(),
        unique_key_args = unique_key_args.len(),
        "built update statement"
    );
    tracing::trace!(sql = %sql);
    Ok(UpdateStatement {
        sql,
        shared_args,
        unique_key_args,
    })
}

/// 构建 `DELETE`，按整行镜像匹配（每一列都参与比较，不假定存在唯一键）
pub fn build_delete(
    database: &str,
    table: &str,
    table_columns: &ColumnList,
    args: &[BindValue],
) -> Result<DeleteStatement> {
    check_row_width(args, table_columns, "args")?;
    if table_columns.is_empty() {
        return Err(DmlError::EmptyColumns(format!(
            "no columns for delete from {}.{}",
            database, table
        )));
    }

    let (comparisons, unique_key_args) =
        row_match_comparisons(table_columns.columns(), table_columns, args)?;

    let sql = format!(
        "DELETE FROM {} WHERE ({})",
        qualified_table(database, table),
        comparisons.join(" AND ")
    );
    tracing::debug!(database, table, args = unique_key_args.len(), "built delete statement");
    tracing::trace!(sql = %sql);
    Ok(DeleteStatement {
        sql,
        unique_key_args,
    })
}
