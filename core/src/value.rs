use crate::escape::escape_literal;
use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// 行镜像中的一个值
///
/// `Null` 表示 SQL NULL；其余变体都是“有值”的分支，只有这些分支才会经过列的类型转换。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BindValue {
    Null,
    Bool(bool),
    Int64(i64),
    UInt64(u64),
    Float64(f64),
    String(String),
    Bytes(Vec<u8>),
    #[serde(skip_deserializing)]
    Int32(i32),
    #[serde(skip_deserializing)]
    Int16(i16),
    #[serde(skip_deserializing)]
    Float32(f32),
    #[serde(skip_deserializing)]
    Decimal(BigDecimal),
    #[serde(skip_deserializing)]
    DateTime(NaiveDateTime),
}

impl BindValue {
    pub fn is_null(&self) -> bool {
        matches!(self, BindValue::Null)
    }

    /// 渲染为可直接嵌入 SQL 的字面量
    ///
    /// 字符串类的值经过 `escape_literal` 转义后加单引号；非 UTF-8 的字节串使用十六进制字面量 `X'..'`。
    pub fn to_sql_literal(&self) -> String {
        match self {
            BindValue::Null => "NULL".to_string(),
            BindValue::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
            BindValue::Int64(i) => i.to_string(),
            BindValue::Int32(i) => i.to_string(),
            BindValue::Int16(i) => i.to_string(),
            BindValue::UInt64(u) => u.to_string(),
            BindValue::Float64(f) => float_literal(*f),
            BindValue::Float32(f) => float_literal(*f as f64),
            BindValue::Decimal(d) => d.to_string(),
            BindValue::String(s) => format!("'{}'", escape_literal(s)),
            BindValue::DateTime(dt) => format!("'{}'", dt.format("%Y-%m-%d %H:%M:%S%.f")),
            BindValue::Bytes(bytes) => match std::str::from_utf8(bytes) {
                Ok(s) => format!("'{}'", escape_literal(s)),
                Err(_) => hex_literal(bytes),
            },
        }
    }
}

/// MySQL 没有 NaN / 无穷大字面量，非有限值按字符串引用
fn float_literal(f: f64) -> String {
    if f.is_finite() {
        f.to_string()
    } else {
        format!("'{}'", f)
    }
}

fn hex_literal(bytes: &[u8]) -> String {
    let mut sql = String::with_capacity(bytes.len() * 2 + 3);
    sql.push_str("X'");
    for b in bytes {
        // 写入 String 不会失败
        let _ = write!(sql, "{:02X}", b);
    }
    sql.push('\'');
    sql
}

impl From<String> for BindValue {
    fn from(s: String) -> Self {
        BindValue::String(s)
    }
}

impl From<&str> for BindValue {
    fn from(s: &str) -> Self {
        BindValue::String(s.to_string())
    }
}

impl From<i64> for BindValue {
    fn from(i: i64) -> Self {
        BindValue::Int64(i)
    }
}

impl From<i32> for BindValue {
    fn from(i: i32) -> Self {
        BindValue::Int32(i)
    }
}

impl From<i16> for BindValue {
    fn from(i: i16) -> Self {
        BindValue::Int16(i)
    }
}

impl From<u64> for BindValue {
    fn from(u: u64) -> Self {
        BindValue::UInt64(u)
    }
}

impl From<f64> for BindValue {
    fn from(f: f64) -> Self {
        BindValue::Float64(f)
    }
}

impl From<f32> for BindValue {
    fn from(f: f32) -> Self {
        BindValue::Float32(f)
    }
}

impl From<bool> for BindValue {
    fn from(b: bool) -> Self {
        BindValue::Bool(b)
    }
}

impl From<Vec<u8>> for BindValue {
    fn from(bytes: Vec<u8>) -> Self {
        BindValue::Bytes(bytes)
    }
}

impl From<BigDecimal> for BindValue {
    fn from(d: BigDecimal) -> Self {
        BindValue::Decimal(d)
    }
}

impl From<NaiveDateTime> for BindValue {
    fn from(dt: NaiveDateTime) -> Self {
        BindValue::DateTime(dt)
    }
}

impl<T: Into<BindValue>> From<Option<T>> for BindValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(BindValue::Null, Into::into)
    }
}
