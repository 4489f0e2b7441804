//! 值格式化：把 `SqlValue` 按列类型渲染成 SQL 字面量。
//!
//! 字符串的转义交给 [`Escaper`]（通常由执行层提供），这里只负责决定是否加引号
//! 以及数值、布尔、日期等类型的字面量形式。

use std::fmt;

use time::macros::format_description;

use crate::column_type::ColumnType;
use crate::datasource::DboSource;
use crate::flavor::Flavor;
use crate::value::{SqlDateTime, SqlValue, is_deferred_marker};

/// 字符串转义原语：返回转义后的内容，不含外围引号。
pub trait Escaper: dyn_clone::DynClone + fmt::Debug + Send + Sync {
    fn escape(&self, raw: &str) -> String;
}

dyn_clone::clone_trait_object!(Escaper);

/// 按方言规则转义的默认实现。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlavorEscaper {
    flavor: Flavor,
}

impl FlavorEscaper {
    pub fn new(flavor: Flavor) -> Self {
        Self { flavor }
    }
}

impl Escaper for FlavorEscaper {
    fn escape(&self, raw: &str) -> String {
        let mut out = String::with_capacity(raw.len() + 2);
        match self.flavor {
            Flavor::MySQL => {
                for ch in raw.chars() {
                    match ch {
                        '\u{0000}' => out.push_str("\\0"),
                        '\u{0008}' => out.push_str("\\b"),
                        '\n' => out.push_str("\\n"),
                        '\r' => out.push_str("\\r"),
                        '\t' => out.push_str("\\t"),
                        '\u{001a}' => out.push_str("\\Z"),
                        '\'' => out.push_str("\\'"),
                        '"' => out.push_str("\\\""),
                        '\\' => out.push_str("\\\\"),
                        _ => out.push(ch),
                    }
                }
            }
            Flavor::PostgreSQL | Flavor::SQLite | Flavor::SQLServer => {
                for ch in raw.chars() {
                    if ch == '\'' {
                        out.push('\'');
                    }
                    out.push(ch);
                }
            }
        }
        out
    }
}

/// `[+-]?(0|[1-9]\d*)`
pub fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    match digits.as_bytes() {
        [] => false,
        [b'0'] => true,
        [b'0', ..] => false,
        bytes => bytes.iter().all(u8::is_ascii_digit),
    }
}

/// `[+-]?(0|[1-9]\d*)(\.\d+)?([eE][+-]?\d+)?`
pub fn is_float_literal(s: &str) -> bool {
    let (mantissa, exponent) = match s.find(['e', 'E']) {
        Some(i) => (&s[..i], Some(&s[i + 1..])),
        None => (s, None),
    };
    if let Some(exp) = exponent {
        let exp = exp.strip_prefix(['+', '-']).unwrap_or(exp);
        if exp.is_empty() || !exp.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
    }
    match mantissa.split_once('.') {
        Some((int, frac)) => {
            is_integer_literal(int)
                && !frac.is_empty()
                && frac.bytes().all(|b| b.is_ascii_digit())
        }
        None => is_integer_literal(mantissa),
    }
}

fn looks_float(v: &SqlValue) -> bool {
    match v {
        SqlValue::F64(_) => true,
        SqlValue::String(s) => {
            let s = s.trim();
            !is_integer_literal(s) && is_float_literal(s)
        }
        _ => false,
    }
}

fn looks_integer(v: &SqlValue) -> bool {
    match v {
        SqlValue::I64(_) | SqlValue::U64(_) => true,
        SqlValue::String(s) => is_integer_literal(s.trim()),
        _ => false,
    }
}

/// 根据值本身推断逻辑类型。
pub fn introspect_type(v: &SqlValue) -> ColumnType {
    match v {
        SqlValue::Bool(_) => ColumnType::Boolean,
        SqlValue::F64(_) => ColumnType::Float,
        SqlValue::I64(_) | SqlValue::U64(_) => ColumnType::Integer,
        SqlValue::Bytes(_) => ColumnType::Binary,
        SqlValue::DateTime(SqlDateTime::Date(_)) => ColumnType::Date,
        SqlValue::DateTime(SqlDateTime::Time(_)) => ColumnType::Time,
        SqlValue::DateTime(SqlDateTime::DateTime(_)) => ColumnType::Datetime,
        SqlValue::String(s) if s.chars().count() > 255 => ColumnType::Text,
        _ => ColumnType::String,
    }
}

/// 列表的类型推断：含浮点即 float，全部为整数即 integer，否则 string。
pub fn introspect_list_type(values: &[SqlValue]) -> ColumnType {
    if values.iter().any(looks_float) {
        return ColumnType::Float;
    }
    if !values.is_empty() && values.iter().all(|v| looks_integer(v) || looks_float(v)) {
        return ColumnType::Integer;
    }
    ColumnType::String
}

/// 布尔真值：空串与 `"0"` 为假，其余非空字符串（包括 `"false"`）为真。
pub fn truthy(v: &SqlValue) -> bool {
    match v {
        SqlValue::Null => false,
        SqlValue::Bool(b) => *b,
        SqlValue::I64(n) => *n != 0,
        SqlValue::U64(n) => *n != 0,
        SqlValue::F64(n) => *n != 0.0,
        SqlValue::String(s) => !(s.is_empty() || s == "0"),
        SqlValue::Bytes(b) => !b.is_empty(),
        SqlValue::DateTime(_) | SqlValue::Identifier(_) | SqlValue::Expression(_) => true,
    }
}

fn float_literal(n: f64) -> Option<String> {
    n.is_finite().then(|| n.to_string())
}

fn push_hex(out: &mut String, data: &[u8]) {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    for &b in data {
        out.push(HEX[((b >> 4) & 0xF) as usize] as char);
        out.push(HEX[(b & 0xF) as usize] as char);
    }
}

fn format_temporal(v: &SqlDateTime, column: &ColumnType) -> Option<String> {
    let date = format_description!("[year]-[month]-[day]");
    let clock = format_description!("[hour]:[minute]:[second]");
    let full = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

    match (v, column) {
        (SqlDateTime::Date(d), _) => d.format(date).ok(),
        (SqlDateTime::Time(t), _) => t.format(clock).ok(),
        (SqlDateTime::DateTime(dt), ColumnType::Date) => dt.date().format(date).ok(),
        (SqlDateTime::DateTime(dt), ColumnType::Time) => dt.time().format(clock).ok(),
        (SqlDateTime::DateTime(dt), _) => dt.format(full).ok(),
    }
}

impl DboSource {
    /// 把值渲染为 SQL 字面量；`column` 为空时根据值推断类型。
    pub fn value(&self, v: &SqlValue, column: Option<&ColumnType>) -> String {
        let inferred;
        let column = match column {
            Some(c) => c,
            None => {
                inferred = introspect_type(v);
                &inferred
            }
        };

        match v {
            SqlValue::Null => return "NULL".to_string(),
            SqlValue::Identifier(name) => return self.name(name),
            SqlValue::Expression(sql) => return sql.clone(),
            SqlValue::String(s) if is_deferred_marker(s) => return s.to_string(),
            _ => {}
        }

        match column {
            ColumnType::Boolean => {
                if truthy(v) {
                    "'1'".to_string()
                } else {
                    "'0'".to_string()
                }
            }
            ColumnType::Binary => match v {
                SqlValue::Bytes(data) => self.binary_literal(data),
                other => self.quote_plain(other),
            },
            c if c.is_integer() => match v {
                SqlValue::String(s) if s.is_empty() => "NULL".to_string(),
                SqlValue::String(s) if is_integer_literal(s) => s.to_string(),
                SqlValue::I64(n) => n.to_string(),
                SqlValue::U64(n) => n.to_string(),
                SqlValue::Bool(b) => u8::from(*b).to_string(),
                SqlValue::F64(n) => match float_literal(*n) {
                    Some(lit) => lit,
                    None => self.quote_plain(v),
                },
                other => self.quote_plain(other),
            },
            c if c.is_float() => match v {
                SqlValue::String(s) if s.is_empty() => "NULL".to_string(),
                SqlValue::String(s) if is_float_literal(s) => s.to_string(),
                SqlValue::I64(n) => n.to_string(),
                SqlValue::U64(n) => n.to_string(),
                SqlValue::F64(n) => match float_literal(*n) {
                    Some(lit) => lit,
                    None => self.quote_plain(v),
                },
                other => self.quote_plain(other),
            },
            c if c.is_temporal() => match v {
                SqlValue::String(s) if s.is_empty() => "NULL".to_string(),
                SqlValue::DateTime(dt) => match format_temporal(dt, c) {
                    Some(lit) => format!("'{lit}'"),
                    None => "NULL".to_string(),
                },
                other => self.quote_plain(other),
            },
            _ => self.quote_plain(v),
        }
    }

    /// 列表逐个格式化；未给出类型时整个列表共用一次推断结果。
    pub fn values(&self, values: &[SqlValue], column: Option<&ColumnType>) -> Vec<String> {
        let inferred;
        let column = match column {
            Some(c) => c,
            None => {
                inferred = introspect_list_type(values);
                &inferred
            }
        };
        values.iter().map(|v| self.value(v, Some(column))).collect()
    }

    /// 布尔真值判断。
    pub fn boolean(&self, v: &SqlValue) -> bool {
        truthy(v)
    }

    /// 按字符串加引号并转义。
    pub fn quote_string(&self, s: &str) -> String {
        format!("'{}'", self.escape(s))
    }

    fn quote_plain(&self, v: &SqlValue) -> String {
        let text = match v {
            SqlValue::Bool(true) => "1".to_string(),
            SqlValue::Bool(false) => String::new(),
            SqlValue::I64(n) => n.to_string(),
            SqlValue::U64(n) => n.to_string(),
            SqlValue::F64(n) => n.to_string(),
            SqlValue::String(s) => s.to_string(),
            SqlValue::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            SqlValue::DateTime(dt) => {
                return match format_temporal(dt, &ColumnType::Datetime) {
                    Some(lit) => format!("'{lit}'"),
                    None => "NULL".to_string(),
                };
            }
            SqlValue::Null => return "NULL".to_string(),
            SqlValue::Identifier(name) => return self.name(name),
            SqlValue::Expression(sql) => return sql.clone(),
        };
        self.quote_string(&text)
    }

    fn binary_literal(&self, data: &[u8]) -> String {
        if data.is_empty() {
            return "NULL".to_string();
        }
        let mut out = String::with_capacity(data.len() * 2 + 12);
        match self.flavor() {
            Flavor::MySQL | Flavor::SQLite => {
                out.push_str("X'");
                push_hex(&mut out, data);
                out.push('\'');
            }
            Flavor::PostgreSQL => {
                out.push_str("'\\x");
                push_hex(&mut out, data);
                out.push_str("'::bytea");
            }
            Flavor::SQLServer => {
                out.push_str("0x");
                push_hex(&mut out, data);
            }
        }
        out
    }
}
