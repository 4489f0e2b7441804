//! SQL 值类型。

use std::borrow::Cow;

/// 延迟主键占位符：关联查询在父记录取回后才把主键值代入。
pub const DEFERRED_ID_MARKER: &str = "{$__cakeID__$}";
/// 延迟外键占位符：belongsTo 外部查询使用。
pub const DEFERRED_FOREIGN_KEY_MARKER: &str = "{$__cakeForeignKey__$}";

/// 判断一个字符串是否为延迟占位符（格式化时原样透传）。
pub fn is_deferred_marker(s: &str) -> bool {
    s == DEFERRED_ID_MARKER || s == DEFERRED_FOREIGN_KEY_MARKER
}

/// 可以出现在 SQL 字面量位置的值。
///
/// `Identifier` 与 `Expression` 不是数据：前者按标识符加引号，后者原样输出。
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    String(Cow<'static, str>),
    Bytes(Vec<u8>),
    DateTime(SqlDateTime),
    Identifier(String),
    Expression(String),
}

/// 日期/时间值，格式化时再根据列类型选择输出形式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDateTime {
    Date(time::Date),
    Time(time::Time),
    DateTime(time::PrimitiveDateTime),
}

impl SqlValue {
    /// 将 `Option<T>` 映射为 `SqlValue`：`None => Null`，`Some(v) => v.into()`。
    pub fn from_option<T: Into<SqlValue>>(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }

    /// 引用另一个标识符（如 `User.id`），格式化时按标识符加引号。
    pub fn identifier(name: impl Into<String>) -> Self {
        Self::Identifier(name.into())
    }

    /// 原样输出的 SQL 片段。
    pub fn expression(sql: impl Into<String>) -> Self {
        Self::Expression(sql.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// 字符串值的内容；非字符串返回 `None`。
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<()> for SqlValue {
    fn from(_: ()) -> Self {
        Self::Null
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i8> for SqlValue {
    fn from(v: i8) -> Self {
        Self::I64(v as i64)
    }
}

impl From<i16> for SqlValue {
    fn from(v: i16) -> Self {
        Self::I64(v as i64)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        Self::I64(v as i64)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}

impl From<u16> for SqlValue {
    fn from(v: u16) -> Self {
        Self::U64(v as u64)
    }
}

impl From<u32> for SqlValue {
    fn from(v: u32) -> Self {
        Self::U64(v as u64)
    }
}

impl From<u64> for SqlValue {
    fn from(v: u64) -> Self {
        Self::U64(v)
    }
}

impl From<f32> for SqlValue {
    fn from(v: f32) -> Self {
        Self::F64(v as f64)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        Self::F64(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::String(Cow::Owned(v))
    }
}

impl From<&'static str> for SqlValue {
    fn from(v: &'static str) -> Self {
        Self::String(Cow::Borrowed(v))
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<time::Date> for SqlValue {
    fn from(v: time::Date) -> Self {
        Self::DateTime(SqlDateTime::Date(v))
    }
}

impl From<time::Time> for SqlValue {
    fn from(v: time::Time) -> Self {
        Self::DateTime(SqlDateTime::Time(v))
    }
}

impl From<time::PrimitiveDateTime> for SqlValue {
    fn from(v: time::PrimitiveDateTime) -> Self {
        Self::DateTime(SqlDateTime::DateTime(v))
    }
}

impl From<time::OffsetDateTime> for SqlValue {
    fn from(v: time::OffsetDateTime) -> Self {
        Self::DateTime(SqlDateTime::DateTime(time::PrimitiveDateTime::new(
            v.date(),
            v.time(),
        )))
    }
}
