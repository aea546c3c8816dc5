use thiserror::Error;

/// DML 构建错误
///
/// 所有错误均在本地检测并直接返回给调用方，构建器本身不会重试，也不会访问数据库。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DmlError {
    /// 比较表达式所需的列名或值为空
    #[error("Empty operand: {0}")]
    EmptyOperand(String),
    /// 并行切片（列/值/参数）长度不一致
    #[error("Arity mismatch: {0}")]
    ArityMismatch(String),
    /// 共享列（或唯一键列）不是表列的子集
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),
    /// 操作需要至少一列，但列表为空
    #[error("Empty columns: {0}")]
    EmptyColumns(String),
    /// 同一个列名在列表中出现多次
    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),
}

pub type Result<T> = std::result::Result<T, DmlError>;
