//! 标识符与字符串字面量转义
//!
//! 注意：这里的转义并不是通用的 SQL 注入防护。标识符应当只来自可信的表结构元数据，
//! 字面量转义只保证生成的语句在文本上是合法的 MySQL。

/// 使用反引号包裹标识符（库名、表名、列名）
///
/// 如果传入的名称本身已经是带引号的记号（`` `name` `` 或 `"name"`），先去掉引号再重新包裹，
/// 因此对同一个名称重复调用得到的结果相同。
pub fn escape_identifier(name: &str) -> String {
    format!("`{}`", unquote(name).unwrap_or_else(|| name.to_string()))
}

/// 去掉标识符外层的引号，不是带引号的记号时返回 `None`
fn unquote(name: &str) -> Option<String> {
    let bytes = name.as_bytes();
    if bytes.len() < 2 || bytes[0] != bytes[bytes.len() - 1] {
        return None;
    }
    let inner = &name[1..name.len() - 1];
    match bytes[0] {
        // 反引号内为原样文本
        b'`' if !inner.contains('`') => Some(inner.to_string()),
        b'"' => {
            let unescaped = unescape_literal(inner);
            (!unescaped.contains('"')).then_some(unescaped)
        }
        _ => None,
    }
}

/// 转义字符串字面量中的控制字符和引号
///
/// 只扫描一遍输入，特殊字符（`NUL`、`\n`、`\r`、`\`、`'`、`"`、`0x1A`）替换为两个字符的转义序列，
/// 其余字节（包括多字节 UTF-8 序列）原样保留。
pub fn escape_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    let mut last = 0;
    for (i, b) in value.bytes().enumerate() {
        let esc = match b {
            0 => "\\0",
            b'\n' => "\\n",
            b'\r' => "\\r",
            b'\\' => "\\\\",
            b'\'' => "\\'",
            b'"' => "\\\"",
            0x1a => "\\Z",
            _ => continue,
        };
        // 特殊字符都是 ASCII，切片边界一定落在字符边界上
        escaped.push_str(&value[last..i]);
        escaped.push_str(esc);
        last = i + 1;
    }
    escaped.push_str(&value[last..]);
    escaped
}

/// `escape_literal` 的逆操作
///
/// 无法识别的转义序列保持原样。
pub fn unescape_literal(value: &str) -> String {
    let mut unescaped = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => unescaped.push('\0'),
            Some('n') => unescaped.push('\n'),
            Some('r') => unescaped.push('\r'),
            Some('Z') => unescaped.push('\u{1a}'),
            Some(c @ ('\\' | '\'' | '"')) => unescaped.push(c),
            Some(other) => {
                unescaped.push('\\');
                unescaped.push(other);
            }
            None => unescaped.push('\\'),
        }
    }
    unescaped
}
