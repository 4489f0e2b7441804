//! 逻辑列类型：与方言无关的类型名，值格式化与 DDL 生成都以它为准。

use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown column type `{0}`")]
pub struct UnknownColumnType(pub String);

/// 逻辑列类型。
///
/// `Set`/`Enum` 保存完整声明（如 `set('a','b')`），格式化时总是按字符串加引号。
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ColumnType {
    Integer,
    BigInteger,
    SmallInteger,
    TinyInteger,
    Float,
    Decimal,
    Boolean,
    String,
    Text,
    Uuid,
    Date,
    Datetime,
    Timestamp,
    Time,
    Binary,
    Set(String),
    Enum(String),
}

impl ColumnType {
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::Integer | Self::BigInteger | Self::SmallInteger | Self::TinyInteger
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float | Self::Decimal)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            Self::Date | Self::Datetime | Self::Timestamp | Self::Time
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Integer => "integer",
            Self::BigInteger => "biginteger",
            Self::SmallInteger => "smallinteger",
            Self::TinyInteger => "tinyinteger",
            Self::Float => "float",
            Self::Decimal => "decimal",
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Text => "text",
            Self::Uuid => "uuid",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Timestamp => "timestamp",
            Self::Time => "time",
            Self::Binary => "binary",
            Self::Set(def) | Self::Enum(def) => def,
        }
    }
}

impl FromStr for ColumnType {
    type Err = UnknownColumnType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lower = trimmed.to_ascii_lowercase();
        let ty = match lower.as_str() {
            "integer" | "int" => Self::Integer,
            "biginteger" => Self::BigInteger,
            "smallinteger" => Self::SmallInteger,
            "tinyinteger" => Self::TinyInteger,
            "float" => Self::Float,
            "decimal" => Self::Decimal,
            "boolean" => Self::Boolean,
            "string" => Self::String,
            "text" => Self::Text,
            "uuid" => Self::Uuid,
            "date" => Self::Date,
            "datetime" => Self::Datetime,
            "timestamp" => Self::Timestamp,
            "time" => Self::Time,
            "binary" => Self::Binary,
            _ if lower.starts_with("set(") && lower.ends_with(')') => {
                Self::Set(trimmed.to_string())
            }
            _ if lower.starts_with("enum(") && lower.ends_with(')') => {
                Self::Enum(trimmed.to_string())
            }
            _ => return Err(UnknownColumnType(trimmed.to_string())),
        };
        Ok(ty)
    }
}

impl TryFrom<String> for ColumnType {
    type Error = UnknownColumnType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ColumnType> for String {
    fn from(value: ColumnType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
