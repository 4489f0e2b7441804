//! 表结构差异：比较两个快照，得到建表、删表与逐表的列/索引/参数变化。

use indexmap::IndexMap;

use crate::schema::{
    Column, Index, KeyRole, PRIMARY, Schema, SchemaError, Table, TableParameters,
};

/// 新增列及其位置；`after` 为空表示放在最前。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedColumn {
    pub column: Column,
    pub after: Option<String>,
}

/// 单表的变化。索引删除与新增各自以 `PRIMARY` 打头。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableDiff {
    pub add: IndexMap<String, AddedColumn>,
    pub drop: Vec<String>,
    /// 列名到新定义。
    pub change: IndexMap<String, Column>,
    pub add_indexes: IndexMap<String, Index>,
    pub drop_indexes: Vec<String>,
    /// 表参数有任何变化时为新快照的全部参数。
    pub parameters: Option<TableParameters>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableChange {
    Create(Table),
    Drop(Table),
    Alter(TableDiff),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDiff {
    pub tables: IndexMap<String, TableChange>,
}

impl SchemaDiff {
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// 把差异应用到旧快照上，得到新快照。
    pub fn apply(&self, schema: &Schema) -> Result<Schema, SchemaError> {
        let mut out = schema.clone();
        for (name, change) in &self.tables {
            match change {
                TableChange::Create(table) => {
                    out.tables.insert(name.clone(), table.clone());
                }
                TableChange::Drop(_) => {
                    out.tables
                        .shift_remove(name)
                        .ok_or_else(|| SchemaError::UnknownTable(name.clone()))?;
                }
                TableChange::Alter(diff) => {
                    let table = out
                        .tables
                        .get_mut(name)
                        .ok_or_else(|| SchemaError::UnknownTable(name.clone()))?;
                    *table = diff.apply(table);
                }
            }
        }
        Ok(out)
    }
}

impl TableDiff {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty()
            && self.drop.is_empty()
            && self.change.is_empty()
            && self.add_indexes.is_empty()
            && self.drop_indexes.is_empty()
            && self.parameters.is_none()
    }

    pub fn apply(&self, table: &Table) -> Table {
        let mut out = table.clone();

        for name in &self.drop {
            out.columns.shift_remove(name);
        }
        for (name, column) in &self.change {
            if let Some(existing) = out.columns.get_mut(name) {
                *existing = column.clone();
            }
        }
        for (name, added) in &self.add {
            let at = match &added.after {
                Some(after) => out
                    .columns
                    .get_index_of(after)
                    .map_or(out.columns.len(), |i| i + 1),
                None => 0,
            };
            out.columns.shift_insert(at, name.clone(), added.column.clone());
        }

        for name in &self.drop_indexes {
            out.indexes.shift_remove(name);
            if name == PRIMARY {
                for column in out.columns.values_mut() {
                    if column.is_primary() {
                        column.key = None;
                    }
                }
            }
        }
        for (name, index) in &self.add_indexes {
            if name == PRIMARY {
                for (column_name, column) in out.columns.iter_mut() {
                    if index.column.contains(column_name) {
                        column.key = Some(KeyRole::Primary);
                    } else if column.is_primary() {
                        column.key = None;
                    }
                }
                // 前缀长度与索引类型无法记在列上
                if index.kind.is_none() && index.length.is_empty() {
                    continue;
                }
            }
            out.indexes.insert(name.clone(), index.clone());
        }

        if let Some(parameters) = &self.parameters {
            out.parameters = parameters.clone();
        }
        out
    }
}

impl Table {
    /// 与新版本比较；`self` 为旧版本。
    pub fn compare(&self, new: &Table) -> TableDiff {
        let mut diff = TableDiff::default();

        let mut previous: Option<&String> = None;
        for (name, column) in &new.columns {
            match self.columns.get(name) {
                None => {
                    diff.add.insert(
                        name.clone(),
                        AddedColumn {
                            column: column.clone(),
                            after: previous.cloned(),
                        },
                    );
                }
                Some(old) if old.differs_from(column) => {
                    diff.change.insert(name.clone(), column.clone());
                }
                Some(_) => {}
            }
            previous = Some(name);
        }
        diff.drop = self
            .columns
            .keys()
            .filter(|name| !new.columns.contains_key(*name))
            .cloned()
            .collect();

        let old_indexes = self.effective_indexes();
        let new_indexes = new.effective_indexes();
        let mut dropped: Vec<String> = old_indexes
            .iter()
            .filter(|(name, index)| new_indexes.get(*name) != Some(*index))
            .map(|(name, _)| name.clone())
            .collect();
        dropped.sort_by_key(|name| name != PRIMARY);
        diff.drop_indexes = dropped;

        let mut added: Vec<(&String, &Index)> = new_indexes
            .iter()
            .filter(|(name, index)| old_indexes.get(*name) != Some(*index))
            .collect();
        added.sort_by_key(|(name, _)| name.as_str() != PRIMARY);
        diff.add_indexes = added
            .into_iter()
            .map(|(name, index)| (name.clone(), index.clone()))
            .collect();

        if self.parameters != new.parameters {
            diff.parameters = Some(new.parameters.clone());
        }
        diff
    }
}

impl Schema {
    /// 与新快照比较；`self` 为旧快照。自身比较得到空差异。
    pub fn compare(&self, new: &Schema) -> SchemaDiff {
        let mut tables = IndexMap::new();

        for (name, table) in &new.tables {
            match self.tables.get(name) {
                None => {
                    tables.insert(name.clone(), TableChange::Create(table.clone()));
                }
                Some(old) => {
                    let diff = old.compare(table);
                    if !diff.is_empty() {
                        tables.insert(name.clone(), TableChange::Alter(diff));
                    }
                }
            }
        }
        for (name, table) in &self.tables {
            if !new.tables.contains_key(name) {
                tables.insert(name.clone(), TableChange::Drop(table.clone()));
            }
        }

        tracing::debug!(changed = tables.len(), "compared schema snapshots");
        SchemaDiff { tables }
    }
}
