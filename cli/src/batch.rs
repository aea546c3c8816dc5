//! 变更批次文件解析与语句渲染

use anyhow::{Context, Result};
use dmlplus::{build_delete, build_insert, build_update, BindValue, Column, ColumnList};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Read;
use std::path::Path;

/// 一张表上的一批行变更
#[derive(Debug, Deserialize)]
pub struct ChangeBatch {
    pub database: String,
    pub table: String,
    /// 表的全部列，按物理顺序
    pub columns: Vec<Column>,
    /// 源端与目标端共有的列，缺省为全部列
    #[serde(default)]
    pub shared_columns: Option<Vec<String>>,
    /// 共享列在目标端的列名，缺省与共享列相同
    #[serde(default)]
    pub mapped_columns: Option<Vec<String>>,
    #[serde(default)]
    pub unique_key: Vec<String>,
    pub changes: Vec<RowChange>,
}

/// 单行变更，行镜像总是覆盖全部列
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum RowChange {
    Insert {
        row: Vec<BindValue>,
    },
    Update {
        before: Vec<BindValue>,
        after: Vec<BindValue>,
    },
    Delete {
        row: Vec<BindValue>,
    },
}

/// 渲染后的语句
#[derive(Debug, Serialize)]
pub struct RenderedStatement {
    pub kind: &'static str,
    pub sql: String,
    /// 已按占位符出现顺序排列
    pub args: Vec<BindValue>,
}

struct TableSchema {
    columns: ColumnList,
    shared: ColumnList,
    mapped: ColumnList,
    unique_key: ColumnList,
}

impl ChangeBatch {
    /// 从文件读取，`-` 表示标准输入
    pub fn load(path: &Path) -> Result<Self> {
        let content = if path == Path::new("-") {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read change batch from stdin")?;
            buf
        } else {
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read change batch {:?}", path))?
        };
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Invalid change batch JSON")
    }

    fn schema(&self) -> Result<TableSchema> {
        let columns = ColumnList::new(self.columns.clone()).context("Invalid table columns")?;
        let shared = match &self.shared_columns {
            Some(names) => columns.project(names.as_slice()).context("Invalid shared columns")?,
            None => columns.clone(),
        };
        let mapped = match &self.mapped_columns {
            Some(names) => shared.mapped(names.as_slice()).context("Invalid mapped columns")?,
            None => shared.clone(),
        };
        let unique_key = columns
            .project(self.unique_key.as_slice())
            .context("Invalid unique key")?;
        Ok(TableSchema {
            columns,
            shared,
            mapped,
            unique_key,
        })
    }

    /// 按变更顺序生成语句
    pub fn render(&self) -> Result<Vec<RenderedStatement>> {
        let schema = self.schema()?;
        let mut statements = Vec::with_capacity(self.changes.len());
        for (i, change) in self.changes.iter().enumerate() {
            let statement = self
                .render_change(&schema, change)
                .with_context(|| format!("Failed to build statement for change #{}", i + 1))?;
            statements.push(statement);
        }
        tracing::info!(
            database = %self.database,
            table = %self.table,
            statements = statements.len(),
            "rendered change batch"
        );
        Ok(statements)
    }

    fn render_change(&self, schema: &TableSchema, change: &RowChange) -> Result<RenderedStatement> {
        let statement = match change {
            RowChange::Insert { row } => {
                let stmt = build_insert(
                    &self.database,
                    &self.table,
                    &schema.columns,
                    &schema.shared,
                    &schema.mapped,
                    row,
                )?;
                RenderedStatement {
                    kind: "insert",
                    sql: stmt.sql,
                    args: stmt.args,
                }
            }
            RowChange::Update { before, after } => {
                let stmt = build_update(
                    &self.database,
                    &self.table,
                    &schema.columns,
                    &schema.shared,
                    &schema.mapped,
                    &schema.unique_key,
                    after,
                    before,
                )?;
                let args = stmt.bind_args();
                RenderedStatement {
                    kind: "update",
                    sql: stmt.sql,
                    args,
                }
            }
            RowChange::Delete { row } => {
                let stmt = build_delete(&self.database, &self.table, &schema.columns, row)?;
                RenderedStatement {
                    kind: "delete",
                    sql: stmt.sql,
                    args: stmt.unique_key_args,
                }
            }
        };
        Ok(statement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BATCH: &str = r#"{
        "database": "shop",
        "table": "orders",
        "columns": [
            {"name": "id", "type": "bigint unsigned"},
            {"name": "uuid", "type": "binary(2)"},
            {"name": "note", "type": "varchar(64)"},
            {"name": "paid_at", "type": "datetime", "timezone": "+08:00"}
        ],
        "shared_columns": ["id", "note", "paid_at"],
        "mapped_columns": ["id", "remark", "paid_at"],
        "unique_key": ["id", "uuid"],
        "changes": [
            {"op": "insert", "row": [1, "ab", "hello", null]},
            {"op": "update", "before": [1, "ab", "hello", null], "after": [1, "ab", "bye", "2024-01-01 00:00:00"]},
            {"op": "delete", "row": [1, "ab", null, null]}
        ]
    }"#;

    #[test]
    fn test_render_batch() {
        let batch = ChangeBatch::parse(BATCH).unwrap();
        let statements = batch.render().unwrap();
        assert_eq!(statements.len(), 3);

        assert_eq!(statements[0].kind, "insert");
        assert_eq!(
            statements[0].sql,
            "REPLACE INTO `shop`.`orders` (`id`, `uuid`, `remark`, `paid_at`) VALUES (?, ?, ?, convert_tz(?, '+08:00', '+00:00'))"
        );
        assert_eq!(statements[0].args.len(), 4);

        assert_eq!(
            statements[1].sql,
            "UPDATE `shop`.`orders` SET `id`=?, `remark`=?, `paid_at`=convert_tz(?, '+08:00', '+00:00') WHERE ((`id` = ?) AND (`uuid` = cast('ab' as binary(2)))) LIMIT 1"
        );
        assert_eq!(
            statements[1].args,
            vec![
                BindValue::Int64(1),
                BindValue::from("bye"),
                BindValue::from("2024-01-01 00:00:00"),
                BindValue::Int64(1),
            ]
        );

        assert_eq!(statements[2].kind, "delete");
        assert!(statements[2].sql.contains("(`note` IS NULL)"));
        assert_eq!(statements[2].args, vec![BindValue::Int64(1)]);
    }

    #[test]
    fn test_render_reports_failing_change() {
        let batch = ChangeBatch::parse(
            r#"{
                "database": "db",
                "table": "t",
                "columns": [{"name": "id", "type": "int"}],
                "unique_key": ["id"],
                "changes": [
                    {"op": "insert", "row": [1]},
                    {"op": "delete", "row": [1, 2]}
                ]
            }"#,
        )
        .unwrap();
        let err = batch.render().unwrap_err();
        assert!(format!("{:#}", err).contains("change #2"));
    }

    #[test]
    fn test_unknown_unique_key_column() {
        let batch = ChangeBatch::parse(
            r#"{
                "database": "db",
                "table": "t",
                "columns": [{"name": "id", "type": "int"}],
                "unique_key": ["code"],
                "changes": []
            }"#,
        )
        .unwrap();
        assert!(batch.render().is_err());
    }
}
