//! 行级变更到 MySQL DML 的合成
//!
//! 根据表结构元数据和完整的行镜像生成 `REPLACE INTO` / `UPDATE` / `DELETE` 语句、
//! WHERE 比较条件以及多列分块扫描的范围条件，并返回按占位符顺序排列的绑定参数。
//! 构建过程是纯函数，不持有状态，也不访问数据库。

#[cfg(feature = "mysql")]
pub mod bind;
pub mod chunk;
pub mod column;
pub mod comparison;
pub mod dml;
pub mod error;
pub mod escape;
pub mod set_clause;
pub mod value;

pub use chunk::{
    range_select_query, unique_key_max_values_query, unique_key_min_values_query,
    unique_key_range_end_query, ChunkQuery,
};
pub use column::{Column, ColumnList, TimezoneConversion};
pub use comparison::{
    equals_comparison, equals_prepared_comparison, range_comparison, range_prepared_comparison,
    value_comparison, Comparison, ComparisonSign,
};
pub use dml::{
    build_delete, build_insert, build_update, DeleteStatement, InsertStatement, UpdateStatement,
};
pub use error::{DmlError, Result};
pub use escape::{escape_identifier, escape_literal, unescape_literal};
pub use set_clause::{columns_prepared_values, set_prepared_clause};
pub use value::BindValue;
