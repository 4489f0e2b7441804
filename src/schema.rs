//! 表结构快照：列、索引与表参数。可由 `serde` 读写，是差异比较与迁移 SQL 的输入。

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::column_type::{ColumnType, UnknownColumnType};
use crate::flavor::Flavor;

/// 保留的主键索引名。
pub const PRIMARY: &str = "PRIMARY";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error(transparent)]
    UnknownType(#[from] UnknownColumnType),
    #[error("table name must not be empty")]
    EmptyTableName,
    #[error("table `{0}` has a column with an empty name")]
    EmptyColumnName(String),
    #[error("table `{0}` has no columns")]
    NoColumns(String),
    #[error("index `{index}` on table `{table}` references unknown column `{column}`")]
    UnknownIndexColumn {
        table: String,
        index: String,
        column: String,
    },
    #[error("table `{0}` declares both a PRIMARY index and primary-flagged columns that disagree")]
    ConflictingPrimaryKey(String),
    #[error("unknown table `{0}`")]
    UnknownTable(String),
    #[error("{flavor} cannot {operation} on table `{table}`")]
    Unsupported {
        flavor: Flavor,
        operation: &'static str,
        table: String,
    },
    #[error("malformed schema: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyRole {
    Primary,
    Unique,
    Index,
}

fn default_true() -> bool {
    true
}

fn is_true(v: &bool) -> bool {
    *v
}

fn is_false(v: &bool) -> bool {
    !*v
}

/// 列定义。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    #[serde(rename = "type")]
    pub ty: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub null: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<KeyRole>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub unsigned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Column {
    pub fn new(ty: ColumnType) -> Self {
        Self {
            ty,
            length: None,
            null: true,
            default: None,
            key: None,
            unsigned: false,
            charset: None,
            collate: None,
            comment: None,
        }
    }

    pub fn length(mut self, length: impl ToString) -> Self {
        self.length = Some(length.to_string());
        self
    }

    pub fn not_null(mut self) -> Self {
        self.null = false;
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn key(mut self, key: KeyRole) -> Self {
        self.key = Some(key);
        self
    }

    /// 主键列：非空且标记为 primary。
    pub fn primary(self) -> Self {
        self.not_null().key(KeyRole::Primary)
    }

    pub fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    pub fn collate(mut self, collate: impl Into<String>) -> Self {
        self.collate = Some(collate.into());
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn is_primary(&self) -> bool {
        self.key == Some(KeyRole::Primary)
    }

    /// 列定义是否不同。`key` 不参与比较，键的变化由索引差异表达。
    pub fn differs_from(&self, other: &Column) -> bool {
        self.ty != other.ty
            || self.length != other.length
            || self.null != other.null
            || self.default != other.default
            || self.unsigned != other.unsigned
            || self.charset != other.charset
            || self.collate != other.collate
            || self.comment != other.comment
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexType {
    Fulltext,
    Spatial,
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(c) => vec![c],
        OneOrMany::Many(cs) => cs,
    })
}

/// 索引定义。`column` 在 JSON 中可以是单个字符串或数组。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    #[serde(deserialize_with = "one_or_many")]
    pub column: Vec<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub unique: bool,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<IndexType>,
    /// 前缀索引长度。
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub length: IndexMap<String, u32>,
}

impl Index {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            column: columns.into_iter().map(Into::into).collect(),
            unique: false,
            kind: None,
            length: IndexMap::new(),
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn kind(mut self, kind: IndexType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn prefix_length(mut self, column: impl Into<String>, length: u32) -> Self {
        self.length.insert(column.into(), length);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl TableParameters {
    pub fn is_empty(&self) -> bool {
        self.charset.is_none()
            && self.collate.is_none()
            && self.engine.is_none()
            && self.comment.is_none()
    }
}

/// 表结构。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: IndexMap<String, Column>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub indexes: IndexMap<String, Index>,
    #[serde(default, skip_serializing_if = "TableParameters::is_empty")]
    pub parameters: TableParameters,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: IndexMap::new(),
            indexes: IndexMap::new(),
            parameters: TableParameters::default(),
        }
    }

    pub fn column(mut self, name: impl Into<String>, column: Column) -> Self {
        self.columns.insert(name.into(), column);
        self
    }

    pub fn index(mut self, name: impl Into<String>, index: Index) -> Self {
        self.indexes.insert(name.into(), index);
        self
    }

    pub fn parameters(mut self, parameters: TableParameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// 标记为主键的列，按声明顺序。
    pub fn primary_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|(_, c)| c.is_primary())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// 实际生效的索引：存在 `PRIMARY` 索引时以其为准，否则由主键列合成一个。
    /// `PRIMARY` 总是唯一索引。
    pub fn effective_indexes(&self) -> IndexMap<String, Index> {
        let mut out = IndexMap::with_capacity(self.indexes.len() + 1);
        if !self.indexes.contains_key(PRIMARY) {
            let primary = self.primary_columns();
            if !primary.is_empty() {
                out.insert(PRIMARY.to_string(), Index::new(primary).unique());
            }
        }
        for (name, index) in &self.indexes {
            let index = if name == PRIMARY {
                index.clone().unique()
            } else {
                index.clone()
            };
            out.insert(name.clone(), index);
        }
        out
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::EmptyTableName);
        }
        if self.columns.is_empty() {
            return Err(SchemaError::NoColumns(self.name.clone()));
        }
        if self.columns.keys().any(|c| c.trim().is_empty()) {
            return Err(SchemaError::EmptyColumnName(self.name.clone()));
        }
        for (name, index) in &self.indexes {
            if let Some(missing) = index
                .column
                .iter()
                .find(|c| !self.columns.contains_key(c.as_str()))
            {
                return Err(SchemaError::UnknownIndexColumn {
                    table: self.name.clone(),
                    index: name.clone(),
                    column: missing.clone(),
                });
            }
        }
        if let Some(primary) = self.indexes.get(PRIMARY) {
            let flagged = self.primary_columns();
            if !flagged.is_empty() && flagged != primary.column {
                return Err(SchemaError::ConflictingPrimaryKey(self.name.clone()));
            }
        }
        Ok(())
    }
}

/// 一组表的快照，保持声明顺序。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub tables: IndexMap<String, Table>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: Table) -> Self {
        self.tables.insert(table.name.clone(), table);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// 从 `{"tables": {"name": {...}}}` 形式的 JSON 读取并校验。
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let mut schema: Schema =
            serde_json::from_str(json).map_err(|e| SchemaError::Malformed(e.to_string()))?;
        for (name, table) in schema.tables.iter_mut() {
            if table.name.is_empty() {
                table.name = name.clone();
            }
        }
        schema.validate()?;
        Ok(schema)
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        self.tables.values().try_for_each(Table::validate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn users() -> Table {
        Table::new("users")
            .column("id", Column::new(ColumnType::Integer).primary())
            .column("name", Column::new(ColumnType::String).length(50).not_null())
    }

    #[test]
    fn primary_index_is_synthesized_from_columns() {
        let indexes = users().effective_indexes();
        assert_eq!(indexes.keys().collect::<Vec<_>>(), vec!["PRIMARY"]);
        assert_eq!(indexes[PRIMARY].column, vec!["id".to_string()]);
    }

    #[test]
    fn validate_reports_unknown_index_column() {
        let t = users().index("bad", Index::new(["missing"]));
        assert_eq!(
            t.validate(),
            Err(SchemaError::UnknownIndexColumn {
                table: "users".into(),
                index: "bad".into(),
                column: "missing".into(),
            })
        );
    }

    #[test]
    fn validate_rejects_conflicting_primary() {
        let t = users().index(PRIMARY, Index::new(["name"]).unique());
        assert_eq!(
            t.validate(),
            Err(SchemaError::ConflictingPrimaryKey("users".into()))
        );
    }

    #[test]
    fn from_json_accepts_single_index_column_and_rejects_unknown_type() {
        let json = r#"{"tables": {"posts": {
            "name": "",
            "columns": {
                "id": {"type": "integer", "null": false, "key": "primary"},
                "title": {"type": "string", "length": "100"}
            },
            "indexes": {"title_idx": {"column": "title"}}
        }}}"#;
        let schema = Schema::from_json(json).unwrap();
        let posts = schema.get("posts").unwrap();
        assert_eq!(posts.name, "posts");
        assert_eq!(posts.indexes["title_idx"].column, vec!["title".to_string()]);
        assert!(!posts.columns["id"].null);

        let bad = r#"{"tables": {"t": {"name": "t", "columns": {"x": {"type": "geometry"}}}}}"#;
        assert!(matches!(
            Schema::from_json(bad),
            Err(SchemaError::Malformed(_))
        ));
    }

    #[test]
    fn key_changes_do_not_count_as_column_changes() {
        let a = Column::new(ColumnType::Integer);
        let b = a.clone().key(KeyRole::Index);
        assert!(!a.differs_from(&b));
        assert!(a.differs_from(&b.not_null()));
    }
}
