//! 列元数据
//!
//! 行镜像总是按照整张表的列顺序排列。共享列、映射列和唯一键列都只是表列的子集或改名视图，
//! 构建器通过 `ColumnList::ordinal` 把它们翻译回行镜像中的下标，而不是依赖调用方传入的顺序。

use crate::error::{DmlError, Result};
use crate::value::BindValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 时区转换指令，只作用于 INSERT/UPDATE 的取值部分
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimezoneConversion {
    pub to_timezone: String,
}

/// 单个列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// MySQL 列类型，例如 `binary(16)`、`int unsigned`
    #[serde(rename = "type", default)]
    pub column_type: String,
    #[serde(default, rename = "timezone", with = "timezone_field")]
    pub timezone_conversion: Option<TimezoneConversion>,
}

/// 配置文件里时区只写成字符串
mod timezone_field {
    use super::TimezoneConversion;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<TimezoneConversion>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(tz) => serializer.serialize_some(&tz.to_timezone),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<TimezoneConversion>, D::Error> {
        let tz = Option::<String>::deserialize(deserializer)?;
        Ok(tz.map(|to_timezone| TimezoneConversion { to_timezone }))
    }
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            timezone_conversion: None,
        }
    }

    /// 设置时区转换目标
    pub fn with_timezone(mut self, to_timezone: impl Into<String>) -> Self {
        self.timezone_conversion = Some(TimezoneConversion {
            to_timezone: to_timezone.into(),
        });
        self
    }

    fn base_type(&self) -> String {
        let lower = self.column_type.trim().to_lowercase();
        lower
            .split(|c: char| c == '(' || c.is_whitespace())
            .next()
            .unwrap_or_default()
            .to_string()
    }

    /// `binary(N)` 家族：比较时需要按列声明的宽度在服务端求值
    pub fn is_binary(&self) -> bool {
        self.column_type.trim().to_lowercase().starts_with("binary")
    }

    pub fn is_unsigned_integer(&self) -> bool {
        self.integer_bits().is_some() && self.column_type.to_lowercase().contains("unsigned")
    }

    pub fn is_textual(&self) -> bool {
        matches!(
            self.base_type().as_str(),
            "char"
                | "varchar"
                | "tinytext"
                | "text"
                | "mediumtext"
                | "longtext"
                | "enum"
                | "set"
                | "json"
        )
    }

    fn integer_bits(&self) -> Option<u32> {
        match self.base_type().as_str() {
            "tinyint" => Some(8),
            "smallint" => Some(16),
            "mediumint" => Some(24),
            "int" | "integer" => Some(32),
            "bigint" => Some(64),
            _ => None,
        }
    }

    /// 按列类型规整一个非 NULL 的值
    ///
    /// - 无符号整数列：负数按列宽重新解释为无符号数（binlog 中无符号列以有符号形式出现）
    /// - 文本列：合法 UTF-8 的字节串转为字符串
    /// - 其他值原样返回
    pub fn convert_arg(&self, value: BindValue) -> BindValue {
        if self.is_unsigned_integer() {
            let signed = match value {
                BindValue::Int64(i) => Some(i),
                BindValue::Int32(i) => Some(i as i64),
                BindValue::Int16(i) => Some(i as i64),
                _ => None,
            };
            if let (Some(i), Some(bits)) = (signed, self.integer_bits()) {
                if i < 0 {
                    let mask = if bits == 64 { u64::MAX } else { (1u64 << bits) - 1 };
                    return BindValue::UInt64((i as u64) & mask);
                }
            }
            return value;
        }
        if self.is_textual() {
            if let BindValue::Bytes(bytes) = value {
                return match String::from_utf8(bytes) {
                    Ok(s) => BindValue::String(s),
                    Err(e) => BindValue::Bytes(e.into_bytes()),
                };
            }
        }
        value
    }
}

/// 有序列集合，顺序即表的物理列顺序
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnList {
    columns: Vec<Column>,
    ordinals: HashMap<String, usize>,
}

impl ColumnList {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut ordinals = HashMap::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            if ordinals.insert(column.name.clone(), i).is_some() {
                return Err(DmlError::DuplicateColumn(format!(
                    "column '{}' appears more than once",
                    column.name
                )));
            }
        }
        Ok(Self { columns, ordinals })
    }

    /// 只有列名、没有类型信息的列集合
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        Self::new(
            names
                .iter()
                .map(|name| Column::new(name.as_ref(), ""))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn ordinal(&self, name: &str) -> Option<usize> {
        self.ordinals.get(name).copied()
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.ordinal(name).map(|i| &self.columns[i])
    }

    /// 当前集合的每个列名都存在于 `other` 中
    pub fn is_subset_of(&self, other: &ColumnList) -> bool {
        self.columns.iter().all(|c| other.ordinals.contains_key(&c.name))
    }

    /// 按给定列名从当前集合中取出共享列
    pub fn project<S: AsRef<str>>(&self, names: &[S]) -> Result<ColumnList> {
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let column = self.get(name).ok_or_else(|| {
                DmlError::SchemaMismatch(format!("column '{}' is not a table column", name))
            })?;
            columns.push(column.clone());
        }
        ColumnList::new(columns)
    }

    /// 目标端改名后的列集合，保留源列的类型和时区设置
    pub fn mapped<S: AsRef<str>>(&self, names: &[S]) -> Result<ColumnList> {
        if names.len() != self.len() {
            return Err(DmlError::ArityMismatch(format!(
                "got {} mapped names for {} columns",
                names.len(),
                self.len()
            )));
        }
        let columns = self
            .columns
            .iter()
            .zip(names)
            .map(|(column, name)| Column {
                name: name.as_ref().to_string(),
                ..column.clone()
            })
            .collect();
        ColumnList::new(columns)
    }
}
