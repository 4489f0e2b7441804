//! 条件表达式模型：布尔常量、原始 SQL、AND 列表与键值映射。
//!
//! 映射的键可以是布尔运算符（`OR`、`AND`、`NOT`、`XOR`、`AND NOT`、`OR NOT`、`||`、`&&`，
//! 不区分大小写），对应一个嵌套组；也可以是 `"<字段> <运算符>"`，对应一个值、值列表或嵌套组。

use crate::value::SqlValue;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `true` 编译为 `1 = 1`，`false` 编译为 `0 = 1`。
    Bool(bool),
    /// 原始 SQL 片段，只对其中的限定名加引号。
    Raw(String),
    /// 以 AND 连接的成员。
    List(Vec<Expr>),
    /// 有序键值对，成员之间以 AND 连接。
    Map(Vec<(String, Operand)>),
}

/// 映射条目的右值。
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Value(SqlValue),
    Values(Vec<SqlValue>),
    Group(Expr),
}

impl Default for Expr {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl Expr {
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw(sql.into())
    }

    /// 空映射，配合 [`Expr::with`] 逐条追加。
    pub fn map() -> Self {
        Self::Map(Vec::new())
    }

    pub fn all<I, E>(items: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// 追加一个键值条目；非映射表达式会与新条目组成 AND 列表。
    pub fn with(self, key: impl Into<String>, value: impl Into<Operand>) -> Self {
        let entry = (key.into(), value.into());
        match self {
            Self::Map(mut entries) => {
                entries.push(entry);
                Self::Map(entries)
            }
            other if other.is_empty() => Self::Map(vec![entry]),
            other => Self::List(vec![other, Self::Map(vec![entry])]),
        }
    }

    pub fn or(group: impl Into<Expr>) -> Self {
        Self::Map(vec![("OR".to_string(), Operand::Group(group.into()))])
    }

    pub fn and(group: impl Into<Expr>) -> Self {
        Self::Map(vec![("AND".to_string(), Operand::Group(group.into()))])
    }

    pub fn not(group: impl Into<Expr>) -> Self {
        Self::Map(vec![("NOT".to_string(), Operand::Group(group.into()))])
    }

    pub fn xor(group: impl Into<Expr>) -> Self {
        Self::Map(vec![("XOR".to_string(), Operand::Group(group.into()))])
    }

    /// 没有任何成员（空列表、空映射或空白字符串）。
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Bool(_) => false,
            Self::Raw(s) => s.trim().is_empty(),
            Self::List(items) => items.iter().all(Expr::is_empty),
            Self::Map(entries) => entries.is_empty(),
        }
    }

    /// 以 AND 合并多个表达式，跳过空表达式；只剩一个时原样返回。
    pub fn merge<I: IntoIterator<Item = Expr>>(parts: I) -> Self {
        let mut items: Vec<Expr> = parts.into_iter().filter(|e| !e.is_empty()).collect();
        match items.len() {
            0 => Self::default(),
            1 => items.remove(0),
            _ => Self::List(items),
        }
    }
}

impl From<&str> for Expr {
    fn from(v: &str) -> Self {
        Self::Raw(v.to_string())
    }
}

impl From<String> for Expr {
    fn from(v: String) -> Self {
        Self::Raw(v)
    }
}

impl From<bool> for Expr {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl<T: Into<SqlValue>> From<T> for Operand {
    fn from(v: T) -> Self {
        Self::Value(v.into())
    }
}

impl<T: Into<SqlValue>> From<Vec<T>> for Operand {
    fn from(v: Vec<T>) -> Self {
        Self::Values(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<SqlValue>, const N: usize> From<[T; N]> for Operand {
    fn from(v: [T; N]) -> Self {
        Self::Values(v.into_iter().map(Into::into).collect())
    }
}

impl From<Expr> for Operand {
    fn from(v: Expr) -> Self {
        Self::Group(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn with_builds_ordered_map() {
        let e = Expr::map().with("a", 1).with("b", vec![1, 2]);
        assert_eq!(
            e,
            Expr::Map(vec![
                ("a".to_string(), Operand::Value(SqlValue::I64(1))),
                (
                    "b".to_string(),
                    Operand::Values(vec![SqlValue::I64(1), SqlValue::I64(2)])
                ),
            ])
        );
    }

    #[test]
    fn merge_skips_empty_parts() {
        let merged = Expr::merge([Expr::default(), Expr::raw("x = 1"), Expr::raw("  ")]);
        assert_eq!(merged, Expr::raw("x = 1"));
        assert!(Expr::merge([Expr::map()]).is_empty());
    }

    #[test]
    fn bytes_stay_a_single_value() {
        let op: Operand = vec![0x01_u8, 0x02].into();
        assert_eq!(op, Operand::Value(SqlValue::Bytes(vec![1, 2])));
    }
}
