//! SQL Flavor（方言）：控制标识符引号、LIMIT 语法、行锁、原生列类型等行为。

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::column_type::ColumnType;

/// 数据源支持的 SQL 方言。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize)]
pub enum Flavor {
    #[default]
    MySQL,
    PostgreSQL,
    SQLite,
    SQLServer,
}

static DEFAULT_FLAVOR: AtomicU8 = AtomicU8::new(Flavor::MySQL as u8);
static DEFAULT_FLAVOR_LOCK: Mutex<()> = Mutex::new(());

impl Flavor {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::MySQL,
            1 => Self::PostgreSQL,
            2 => Self::SQLite,
            3 => Self::SQLServer,
            _ => Self::MySQL,
        }
    }

    fn to_u8(self) -> u8 {
        self as u8
    }
}

/// 获取当前全局默认 Flavor，`DataSourceConfig::default()` 使用它。
pub fn default_flavor() -> Flavor {
    Flavor::from_u8(DEFAULT_FLAVOR.load(Ordering::Relaxed))
}

/// 设置全局默认 Flavor，返回旧值。
pub fn set_default_flavor(flavor: Flavor) -> Flavor {
    let old = DEFAULT_FLAVOR.swap(flavor.to_u8(), Ordering::Relaxed);
    Flavor::from_u8(old)
}

/// 修改全局默认 Flavor 的 RAII guard（会持有一个全局锁，避免并行测试互相干扰）。
pub struct DefaultFlavorGuard {
    _lock: MutexGuard<'static, ()>,
    old: Flavor,
}

impl Drop for DefaultFlavorGuard {
    fn drop(&mut self) {
        set_default_flavor(self.old);
    }
}

/// 在一个作用域内临时设置 DefaultFlavor，并保证退出作用域后自动恢复。
pub fn set_default_flavor_scoped(flavor: Flavor) -> DefaultFlavorGuard {
    let lock = DEFAULT_FLAVOR_LOCK
        .lock()
        .unwrap_or_else(|e| e.into_inner());
    let old = set_default_flavor(flavor);
    DefaultFlavorGuard { _lock: lock, old }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MySQL => "MySQL",
            Self::PostgreSQL => "PostgreSQL",
            Self::SQLite => "SQLite",
            Self::SQLServer => "SQLServer",
        };
        f.write_str(s)
    }
}

/// 方言里某个逻辑列类型对应的原生类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeType {
    pub name: &'static str,
    /// 未声明长度时使用的默认长度。
    pub limit: Option<&'static str>,
}

const fn native(name: &'static str, limit: Option<&'static str>) -> NativeType {
    NativeType { name, limit }
}

impl Flavor {
    /// 标识符起始引号。
    pub fn start_quote(self) -> char {
        match self {
            Self::MySQL => '`',
            Self::PostgreSQL | Self::SQLite => '"',
            Self::SQLServer => '[',
        }
    }

    /// 标识符结束引号。
    pub fn end_quote(self) -> char {
        match self {
            Self::MySQL => '`',
            Self::PostgreSQL | Self::SQLite => '"',
            Self::SQLServer => ']',
        }
    }

    /// 为单个标识符片段加引号，不做任何拆分。
    pub fn quote(self, name: &str) -> String {
        let (start, end) = (self.start_quote(), self.end_quote());
        let mut out = String::with_capacity(name.len() + 2);
        out.push(start);
        out.push_str(name);
        out.push(end);
        out
    }

    /// 行锁子句，不支持时返回 `None`。
    pub fn lock_hint(self) -> Option<&'static str> {
        match self {
            Self::MySQL | Self::PostgreSQL => Some("FOR UPDATE"),
            Self::SQLite | Self::SQLServer => None,
        }
    }

    /// 渲染 LIMIT/OFFSET 子句；`limit` 为 0 时不产生子句。
    pub fn limit(self, limit: u64, offset: u64) -> Option<String> {
        if limit == 0 {
            return None;
        }

        let sql = match self {
            Self::MySQL | Self::SQLite => {
                if offset > 0 {
                    format!("LIMIT {offset}, {limit}")
                } else {
                    format!("LIMIT {limit}")
                }
            }
            Self::PostgreSQL => {
                if offset > 0 {
                    format!("LIMIT {limit} OFFSET {offset}")
                } else {
                    format!("LIMIT {limit}")
                }
            }
            Self::SQLServer => format!("OFFSET {offset} ROWS FETCH NEXT {limit} ROWS ONLY"),
        };
        Some(sql)
    }

    /// 逻辑列类型到原生类型的映射；`set(...)`/`enum(...)` 直接使用声明本身。
    pub fn native_type(self, ty: &ColumnType) -> Option<NativeType> {
        use ColumnType::*;

        let t = match (self, ty) {
            (_, Set(_) | Enum(_)) => return None,

            (Self::MySQL, String) => native("varchar", Some("255")),
            (Self::MySQL, Text) => native("text", None),
            (Self::MySQL, Integer) => native("int", Some("11")),
            (Self::MySQL, BigInteger) => native("bigint", Some("20")),
            (Self::MySQL, SmallInteger) => native("smallint", Some("6")),
            (Self::MySQL, TinyInteger) => native("tinyint", Some("4")),
            (Self::MySQL, Float) => native("float", None),
            (Self::MySQL, Decimal) => native("decimal", None),
            (Self::MySQL, Boolean) => native("tinyint", Some("1")),
            (Self::MySQL, Binary) => native("blob", None),
            (Self::MySQL, Uuid) => native("char", Some("36")),

            (Self::PostgreSQL, String) => native("varchar", Some("255")),
            (Self::PostgreSQL, Text) => native("text", None),
            (Self::PostgreSQL, Integer) => native("integer", None),
            (Self::PostgreSQL, BigInteger) => native("bigint", None),
            (Self::PostgreSQL, SmallInteger | TinyInteger) => native("smallint", None),
            (Self::PostgreSQL, Float) => native("float", None),
            (Self::PostgreSQL, Decimal) => native("decimal", None),
            (Self::PostgreSQL, Boolean) => native("boolean", None),
            (Self::PostgreSQL, Binary) => native("bytea", None),
            (Self::PostgreSQL, Datetime) => native("timestamp", None),
            (Self::PostgreSQL, Uuid) => native("uuid", None),

            (Self::SQLite, String) => native("varchar", Some("255")),
            (Self::SQLite, Text) => native("text", None),
            (Self::SQLite, Integer) => native("integer", None),
            (Self::SQLite, BigInteger) => native("bigint", None),
            (Self::SQLite, SmallInteger) => native("smallint", None),
            (Self::SQLite, TinyInteger) => native("tinyint", None),
            (Self::SQLite, Float) => native("float", None),
            (Self::SQLite, Decimal) => native("decimal", None),
            (Self::SQLite, Boolean) => native("boolean", None),
            (Self::SQLite, Binary) => native("blob", None),
            (Self::SQLite, Uuid) => native("char", Some("36")),

            (Self::SQLServer, String) => native("nvarchar", Some("255")),
            (Self::SQLServer, Text) => native("nvarchar", Some("MAX")),
            (Self::SQLServer, Integer) => native("int", None),
            (Self::SQLServer, BigInteger) => native("bigint", None),
            (Self::SQLServer, SmallInteger) => native("smallint", None),
            (Self::SQLServer, TinyInteger) => native("tinyint", None),
            (Self::SQLServer, Float) => native("float", None),
            (Self::SQLServer, Decimal) => native("decimal", None),
            (Self::SQLServer, Boolean) => native("bit", None),
            (Self::SQLServer, Binary) => native("varbinary", Some("MAX")),
            (Self::SQLServer, Date | Time | Timestamp) => native("datetime", None),
            (Self::SQLServer, Uuid) => native("uniqueidentifier", None),

            (_, Datetime) => native("datetime", None),
            (_, Timestamp) => native("timestamp", None),
            (_, Date) => native("date", None),
            (_, Time) => native("time", None),
        };
        Some(t)
    }

    /// 整数主键列追加的定义（自增等）。
    pub fn primary_key_suffix(self) -> &'static str {
        match self {
            Self::MySQL => "NOT NULL AUTO_INCREMENT",
            Self::PostgreSQL => "NOT NULL",
            Self::SQLite => "PRIMARY KEY AUTOINCREMENT",
            Self::SQLServer => "IDENTITY (1, 1) NOT NULL",
        }
    }

    /// 普通索引能否写在 `CREATE TABLE` 的列定义里。
    pub fn supports_inline_indexes(self) -> bool {
        matches!(self, Self::MySQL)
    }

    /// 清空表的语句模板。
    pub fn truncate(self, table: &str) -> String {
        match self {
            Self::MySQL | Self::SQLServer => format!("TRUNCATE TABLE {table}"),
            Self::PostgreSQL => format!("TRUNCATE TABLE {table} RESTART IDENTITY"),
            Self::SQLite => format!("DELETE FROM {table}"),
        }
    }
}
