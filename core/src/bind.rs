//! 将构建结果绑定到 sqlx 查询
//!
//! 这里只负责把 `BindValue` 按顺序附加到 `sqlx::query` 上，执行语句由调用方决定。

use crate::chunk::ChunkQuery;
use crate::dml::{DeleteStatement, InsertStatement, UpdateStatement};
use crate::value::BindValue;
use sqlx::mysql::MySqlArguments;
use sqlx::query::Query;
use sqlx::MySql;

pub type MySqlQuery<'q> = Query<'q, MySql, MySqlArguments>;

/// 绑定单个值，NULL 以带类型的 `None` 绑定
pub fn bind_value(query: MySqlQuery<'_>, value: BindValue) -> MySqlQuery<'_> {
    match value {
        BindValue::Null => query.bind(Option::<String>::None),
        BindValue::Bool(b) => query.bind(b),
        BindValue::Int64(i) => query.bind(i),
        BindValue::Int32(i) => query.bind(i),
        BindValue::Int16(i) => query.bind(i),
        BindValue::UInt64(u) => query.bind(u),
        BindValue::Float64(f) => query.bind(f),
        BindValue::Float32(f) => query.bind(f),
        BindValue::Decimal(d) => query.bind(d),
        BindValue::String(s) => query.bind(s),
        BindValue::Bytes(b) => query.bind(b),
        BindValue::DateTime(dt) => query.bind(dt),
    }
}

/// 按顺序绑定全部参数
pub fn bind_all<'q, I>(query: MySqlQuery<'q>, args: I) -> MySqlQuery<'q>
where
    I: IntoIterator<Item = BindValue>,
{
    args.into_iter().fold(query, bind_value)
}

impl InsertStatement {
    pub fn query(&self) -> MySqlQuery<'_> {
        bind_all(sqlx::query(&self.sql), self.args.iter().cloned())
    }
}

impl UpdateStatement {
    /// SET 参数在前，WHERE 参数在后
    pub fn query(&self) -> MySqlQuery<'_> {
        bind_all(sqlx::query(&self.sql), self.bind_args())
    }
}

impl DeleteStatement {
    pub fn query(&self) -> MySqlQuery<'_> {
        bind_all(sqlx::query(&self.sql), self.unique_key_args.iter().cloned())
    }
}

impl ChunkQuery {
    pub fn query(&self) -> MySqlQuery<'_> {
        bind_all(sqlx::query(&self.sql), self.args.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{Column, ColumnList};
    use crate::dml::build_update;
    use sqlx::Execute;

    #[test]
    fn test_update_query_keeps_sql() {
        let columns = ColumnList::new(vec![Column::new("id", "int"), Column::new("name", "text")])
            .unwrap();
        let key = columns.project(&["id"]).unwrap();
        let shared = columns.project(&["name"]).unwrap();
        let stmt = build_update(
            "db",
            "t",
            &columns,
            &shared,
            &shared,
            &key,
            &[BindValue::Int64(1), BindValue::from("b")],
            &[BindValue::Int64(1), BindValue::from("a")],
        )
        .unwrap();
        let query = stmt.query();
        assert_eq!(query.sql(), stmt.sql);
    }
}
