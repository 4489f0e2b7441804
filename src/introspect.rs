//! 把驱动返回的原生元数据（`DESCRIBE`/`SHOW FULL COLUMNS` 行、`SHOW INDEX` 行）
//! 归一化为 [`Column`] 与 [`Index`]，供差异比较使用。

use indexmap::IndexMap;

use crate::column_type::ColumnType;
use crate::schema::{Column, Index, IndexType, KeyRole, SchemaError, Table};

/// 解析后的原生列类型。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeColumn {
    pub ty: ColumnType,
    pub length: Option<String>,
    pub unsigned: bool,
}

/// 解析 `int(11) unsigned`、`varchar(255)`、`enum('a','b')` 这类原生类型。
pub fn parse_native_type(native: &str) -> NativeColumn {
    let native = native.trim();
    let lower = native.to_ascii_lowercase();
    let unsigned = lower.contains("unsigned");

    let (base, args) = match lower.split_once('(') {
        Some((base, rest)) => (
            base.trim().to_string(),
            rest.rsplit_once(')').map(|(inner, _)| inner.trim().to_string()),
        ),
        None => (
            lower.split_whitespace().next().unwrap_or("").to_string(),
            None,
        ),
    };
    let declaration = || native.split_whitespace().collect::<Vec<_>>().join(" ");

    let (ty, length) = match base.as_str() {
        "date" | "time" | "datetime" | "timestamp" => {
            let ty = base.parse().unwrap_or(ColumnType::Datetime);
            (ty, None)
        }
        "boolean" | "bool" => (ColumnType::Boolean, None),
        "tinyint" if args.as_deref() == Some("1") => (ColumnType::Boolean, None),
        b if b.contains("bigint") => (ColumnType::BigInteger, args),
        b if b.contains("tinyint") => (ColumnType::TinyInteger, args),
        b if b.contains("smallint") => (ColumnType::SmallInteger, args),
        b if b.contains("int") => (ColumnType::Integer, args),
        b if b.contains("char") || b == "tinytext" => (ColumnType::String, args),
        b if b.contains("text") => (ColumnType::Text, None),
        b if b.contains("blob") || b == "binary" || b == "varbinary" => {
            (ColumnType::Binary, None)
        }
        b if b.contains("float") || b.contains("double") => (ColumnType::Float, args),
        b if b.contains("decimal") || b.contains("numeric") => (ColumnType::Decimal, args),
        "enum" => (ColumnType::Enum(declaration()), None),
        "set" => (ColumnType::Set(declaration()), None),
        _ => (ColumnType::Text, None),
    };

    NativeColumn {
        ty,
        length,
        unsigned,
    }
}

/// `SHOW FULL COLUMNS` 的一行。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnRow {
    pub field: String,
    pub native_type: String,
    /// `YES` / `NO`
    pub null: String,
    /// `PRI` / `UNI` / `MUL` / 空
    pub key: String,
    pub default: Option<String>,
    pub collation: Option<String>,
    pub comment: Option<String>,
}

pub fn normalize_column(row: &ColumnRow) -> Column {
    let native = parse_native_type(&row.native_type);
    let key = match row.key.to_ascii_uppercase().as_str() {
        "PRI" => Some(KeyRole::Primary),
        "UNI" => Some(KeyRole::Unique),
        "MUL" => Some(KeyRole::Index),
        _ => None,
    };
    let collate = row.collation.clone().filter(|c| !c.is_empty());
    let charset = collate
        .as_deref()
        .and_then(|c| c.split_once('_'))
        .map(|(charset, _)| charset.to_string());

    Column {
        ty: native.ty,
        length: native.length,
        null: row.null.eq_ignore_ascii_case("YES"),
        default: row.default.clone(),
        key,
        unsigned: native.unsigned,
        charset,
        collate,
        comment: row.comment.clone().filter(|c| !c.is_empty()),
    }
}

/// `SHOW INDEX` 的一行；同一索引的多列按 `seq_in_index` 排列。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexRow {
    pub key_name: String,
    pub column_name: String,
    pub non_unique: bool,
    pub index_type: String,
    pub sub_part: Option<u32>,
    pub seq_in_index: u32,
}

/// 按索引名聚合（保持首次出现的顺序），列按序号排序。
pub fn normalize_index_rows(rows: &[IndexRow]) -> IndexMap<String, Index> {
    let mut grouped: IndexMap<String, Vec<&IndexRow>> = IndexMap::new();
    for row in rows {
        grouped.entry(row.key_name.clone()).or_default().push(row);
    }

    grouped
        .into_iter()
        .map(|(name, mut parts)| {
            parts.sort_by_key(|r| r.seq_in_index);
            let first = parts[0];
            let mut index = Index::new(parts.iter().map(|r| r.column_name.clone()));
            index.unique = !first.non_unique;
            index.kind = match first.index_type.to_ascii_uppercase().as_str() {
                "FULLTEXT" => Some(IndexType::Fulltext),
                "SPATIAL" => Some(IndexType::Spatial),
                _ => None,
            };
            for part in &parts {
                if let Some(len) = part.sub_part {
                    index.length.insert(part.column_name.clone(), len);
                }
            }
            (name, index)
        })
        .collect()
}

/// 由列与索引行组装一张表并校验。
pub fn table_from_rows(
    name: &str,
    columns: &[ColumnRow],
    indexes: &[IndexRow],
) -> Result<Table, SchemaError> {
    let mut table = Table::new(name);
    for row in columns {
        table.columns.insert(row.field.clone(), normalize_column(row));
    }
    table.indexes = normalize_index_rows(indexes);
    table.validate()?;
    Ok(table)
}
