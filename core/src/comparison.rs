//! 比较表达式构建
//!
//! 生成的都是带括号的布尔表达式片段，可以继续用 AND / OR 组合成完整的 WHERE 子句。
//! 值以文本形式传入（可以是占位符 `?`、字面量或表达式），构建器不决定使用哪一种。

use crate::error::{DmlError, Result};
use crate::escape::escape_identifier;
use crate::value::BindValue;
use std::fmt;

/// 比较运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonSign {
    /// <
    LessThan,
    /// <=
    LessThanOrEquals,
    /// =
    Equals,
    /// is，用于 `IS NULL`
    Is,
    /// >=
    GreaterThanOrEquals,
    /// >
    GreaterThan,
    /// !=
    NotEquals,
}

impl ComparisonSign {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ComparisonSign::LessThan => "<",
            ComparisonSign::LessThanOrEquals => "<=",
            ComparisonSign::Equals => "=",
            ComparisonSign::Is => "IS",
            ComparisonSign::GreaterThanOrEquals => ">=",
            ComparisonSign::GreaterThan => ">",
            ComparisonSign::NotEquals => "!=",
        }
    }

    /// 拆分为严格比较和“是否包含等于”
    fn split_inclusive(self) -> (ComparisonSign, bool) {
        match self {
            ComparisonSign::LessThanOrEquals => (ComparisonSign::LessThan, true),
            ComparisonSign::GreaterThanOrEquals => (ComparisonSign::GreaterThan, true),
            other => (other, false),
        }
    }
}

impl fmt::Display for ComparisonSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// 一个布尔表达式片段及其按出现顺序排列的绑定参数
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub sql: String,
    pub args: Vec<BindValue>,
}

/// `(column sign value)`
pub fn value_comparison(column: &str, value: &str, sign: ComparisonSign) -> Result<String> {
    if column.is_empty() {
        return Err(DmlError::EmptyOperand(
            "empty column in value comparison".to_string(),
        ));
    }
    if value.is_empty() {
        return Err(DmlError::EmptyOperand(format!(
            "empty value for column '{}' in value comparison",
            column
        )));
    }
    Ok(format!("({} {} {})", escape_identifier(column), sign, value))
}

/// 逐列相等比较，用 AND 连接
pub fn equals_comparison<C, V>(columns: &[C], values: &[V]) -> Result<String>
where
    C: AsRef<str>,
    V: AsRef<str>,
{
    if columns.is_empty() {
        return Err(DmlError::ArityMismatch(
            "got 0 columns in equals comparison".to_string(),
        ));
    }
    if columns.len() != values.len() {
        return Err(DmlError::ArityMismatch(format!(
            "got {} columns but {} values in equals comparison",
            columns.len(),
            values.len()
        )));
    }
    let comparisons = columns
        .iter()
        .zip(values)
        .map(|(column, value)| {
            value_comparison(column.as_ref(), value.as_ref(), ComparisonSign::Equals)
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(format!("({})", comparisons.join(" AND ")))
}

/// 所有值都是 `?` 占位符的相等比较
pub fn equals_prepared_comparison<C: AsRef<str>>(columns: &[C]) -> Result<String> {
    let values = vec!["?"; columns.len()];
    equals_comparison(columns, values.as_slice())
}

/// 多列有序范围比较（按元组字典序）
///
/// 对第 i 列生成 “前 i 列相等 AND 第 i 列严格比较”，再用 OR 连接全部 n 项；
/// 当运算符包含等于（`<=` / `>=`）时，额外追加一项所有列都相等的条件，以包含游标所在行本身。
///
/// 返回的参数与片段结构一一对应：第 i 项追加第 0..i 列的值和第 i 列的值；
/// 包含等于时再追加一遍完整的值元组。
pub fn range_comparison<C, V>(
    columns: &[C],
    values: &[V],
    args: &[BindValue],
    sign: ComparisonSign,
) -> Result<Comparison>
where
    C: AsRef<str>,
    V: AsRef<str>,
{
    if columns.is_empty() {
        return Err(DmlError::EmptyColumns(
            "got 0 columns in range comparison".to_string(),
        ));
    }
    if columns.len() != values.len() {
        return Err(DmlError::ArityMismatch(format!(
            "got {} columns but {} values in range comparison",
            columns.len(),
            values.len()
        )));
    }
    if columns.len() != args.len() {
        return Err(DmlError::ArityMismatch(format!(
            "got {} columns but {} args in range comparison",
            columns.len(),
            args.len()
        )));
    }

    let (strict_sign, include_equals) = sign.split_inclusive();
    let mut comparisons = Vec::with_capacity(columns.len() + 1);
    let mut exploded_args = Vec::new();

    for (i, column) in columns.iter().enumerate() {
        let range = value_comparison(column.as_ref(), values[i].as_ref(), strict_sign)?;
        if i > 0 {
            let equalities = equals_comparison(&columns[..i], &values[..i])?;
            comparisons.push(format!("({} AND {})", equalities, range));
            exploded_args.extend_from_slice(&args[..i]);
        } else {
            comparisons.push(range);
        }
        exploded_args.push(args[i].clone());
    }

    if include_equals {
        comparisons.push(equals_comparison(columns, values)?);
        exploded_args.extend_from_slice(args);
    }

    Ok(Comparison {
        sql: format!("({})", comparisons.join(" OR ")),
        args: exploded_args,
    })
}

/// 所有值都是 `?` 占位符的范围比较，返回的参数可以直接按顺序绑定
pub fn range_prepared_comparison<C: AsRef<str>>(
    columns: &[C],
    args: &[BindValue],
    sign: ComparisonSign,
) -> Result<Comparison> {
    let values = vec!["?"; columns.len()];
    range_comparison(columns, values.as_slice(), args, sign)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(sql: &str) -> String {
        sql.replace('`', "")
    }

    fn placeholders(sql: &str) -> usize {
        sql.matches('?').count()
    }

    #[test]
    fn test_value_comparison() {
        let sql = value_comparison("age", "?", ComparisonSign::GreaterThan).unwrap();
        assert_eq!(sql, "(`age` > ?)");
        let sql = value_comparison("deleted_at", "NULL", ComparisonSign::Is).unwrap();
        assert_eq!(normalize(&sql), "(deleted_at IS NULL)");
    }

    #[test]
    fn test_value_comparison_empty_operand() {
        assert!(matches!(
            value_comparison("", "?", ComparisonSign::Equals),
            Err(DmlError::EmptyOperand(_))
        ));
        assert!(matches!(
            value_comparison("id", "", ComparisonSign::Equals),
            Err(DmlError::EmptyOperand(_))
        ));
    }

    #[test]
    fn test_equals_comparison() {
        let sql = equals_comparison(&["a", "b"], &["1", "'x'"]).unwrap();
        assert_eq!(normalize(&sql), "((a = 1) AND (b = 'x'))");
        let sql = equals_prepared_comparison(&["id"]).unwrap();
        assert_eq!(sql, "((`id` = ?))");
    }

    #[test]
    fn test_equals_comparison_arity() {
        assert!(matches!(
            equals_comparison(&["a", "b"], &["1"]),
            Err(DmlError::ArityMismatch(_))
        ));
        let empty: [&str; 0] = [];
        assert!(matches!(
            equals_comparison(&empty, &empty),
            Err(DmlError::ArityMismatch(_))
        ));
    }

    #[test]
    fn test_range_comparison_single_column() {
        let range = range_comparison(&["id"], &["?"], &[BindValue::Int64(9)], ComparisonSign::GreaterThan)
            .unwrap();
        assert_eq!(normalize(&range.sql), "((id > ?))");
        assert_eq!(range.args, vec![BindValue::Int64(9)]);
    }

    #[test]
    fn test_range_comparison_greater_or_equals() {
        let range = range_comparison(
            &["a", "b"],
            &["5", "10"],
            &[BindValue::Int64(5), BindValue::Int64(10)],
            ComparisonSign::GreaterThanOrEquals,
        )
        .unwrap();
        assert_eq!(
            normalize(&range.sql),
            "((a > 5) OR (((a = 5)) AND (b > 10)) OR ((a = 5) AND (b = 10)))"
        );
        let args: Vec<BindValue> = [5, 5, 10, 5, 10].into_iter().map(BindValue::Int64).collect();
        assert_eq!(range.args, args);
    }

    #[test]
    fn test_range_comparison_strict_three_columns() {
        let range = range_prepared_comparison(
            &["a", "b", "c"],
            &[BindValue::from(1i64), BindValue::from("k"), BindValue::from(3i64)],
            ComparisonSign::LessThan,
        )
        .unwrap();
        assert_eq!(
            normalize(&range.sql),
            "((a < ?) OR (((a = ?)) AND (b < ?)) OR (((a = ?) AND (b = ?)) AND (c < ?)))"
        );
        assert_eq!(placeholders(&range.sql), range.args.len());
        assert_eq!(
            range.args,
            vec![
                BindValue::from(1i64),
                BindValue::from(1i64),
                BindValue::from("k"),
                BindValue::from(1i64),
                BindValue::from("k"),
                BindValue::from(3i64),
            ]
        );
    }

    #[test]
    fn test_range_prepared_comparison_inclusive_args_match_placeholders() {
        let range = range_prepared_comparison(
            &["a", "b"],
            &[BindValue::from(1i64), BindValue::from(2i64)],
            ComparisonSign::LessThanOrEquals,
        )
        .unwrap();
        assert!(range.sql.ends_with("OR ((`a` = ?) AND (`b` = ?)))"));
        assert_eq!(placeholders(&range.sql), range.args.len());
    }

    #[test]
    fn test_range_comparison_errors() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            range_comparison(&empty, &empty, &[], ComparisonSign::GreaterThan),
            Err(DmlError::EmptyColumns(_))
        ));
        assert!(matches!(
            range_comparison(&["a", "b"], &["?"], &[BindValue::Null], ComparisonSign::GreaterThan),
            Err(DmlError::ArityMismatch(_))
        ));
        assert!(matches!(
            range_comparison(&["a"], &["?"], &[], ComparisonSign::GreaterThan),
            Err(DmlError::ArityMismatch(_))
        ));
        assert!(matches!(
            range_comparison(&["a"], &[""], &[BindValue::Null], ComparisonSign::GreaterThanOrEquals),
            Err(DmlError::EmptyOperand(_))
        ));
    }
}
