//! 表结构 SQL：CREATE TABLE、DROP TABLE 与按方言渲染的 ALTER TABLE。

use indexmap::IndexMap;

use crate::column_type::ColumnType;
use crate::datasource::DboSource;
use crate::flavor::Flavor;
use crate::schema::{
    Column, Index, IndexType, PRIMARY, Schema, SchemaError, Table, TableParameters,
};
use crate::schema_diff::{SchemaDiff, TableChange, TableDiff};
use crate::statement::{Clauses, StatementKind};
use crate::value::SqlValue;

/// 索引渲染结果：写在表定义内的条目与需要单独执行的语句。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSql {
    pub inline: Vec<String>,
    pub statements: Vec<String>,
}

fn is_integer_primary(column: &Column) -> bool {
    column.is_primary() && matches!(column.ty, ColumnType::Integer | ColumnType::BigInteger)
}

/// 主键仅由一个整数列组成时返回该列名；复合主键不自增。
fn auto_increment_column<'a, 'b>(
    primary: Option<&'a Index>,
    lookup: impl Fn(&str) -> Option<&'b Column>,
) -> Option<&'a str> {
    let [name] = primary?.column.as_slice() else {
        return None;
    };
    let column = lookup(name.as_str())?;
    matches!(column.ty, ColumnType::Integer | ColumnType::BigInteger).then_some(name.as_str())
}

impl DboSource {
    /// 列类型部分，如 `varchar(50)`、`int(11) unsigned`。
    fn column_type_sql(&self, column: &Column) -> String {
        let flavor = self.flavor();
        let Some(native) = flavor.native_type(&column.ty) else {
            return column.ty.as_str().to_string();
        };

        let sized = flavor == Flavor::MySQL
            || matches!(
                column.ty,
                ColumnType::String | ColumnType::Decimal | ColumnType::Float
            );
        let length = column
            .length
            .as_deref()
            .filter(|_| sized)
            .or(native.limit);

        let mut out = native.name.to_string();
        if let Some(length) = length {
            out.push_str(&format!("({length})"));
        }
        if flavor == Flavor::MySQL && column.unsigned && column.ty.is_numeric() {
            out.push_str(" unsigned");
        }
        out
    }

    fn default_literal(&self, column: &Column, default: &str) -> String {
        if matches!(column.ty, ColumnType::Timestamp | ColumnType::Datetime)
            && default.eq_ignore_ascii_case("CURRENT_TIMESTAMP")
        {
            return "CURRENT_TIMESTAMP".to_string();
        }
        self.value(&SqlValue::from(default.to_string()), Some(&column.ty))
    }

    /// 单个列定义。整数主键列按单列主键渲染为自增列。
    pub fn build_column(&self, name: &str, column: &Column) -> String {
        self.column_sql(name, column, is_integer_primary(column))
    }

    fn column_sql(&self, name: &str, column: &Column, auto_increment: bool) -> String {
        let flavor = self.flavor();
        let quoted = self.name(name);

        if auto_increment {
            return match flavor {
                Flavor::PostgreSQL if column.ty == ColumnType::BigInteger => {
                    format!("{quoted} bigserial {}", flavor.primary_key_suffix())
                }
                Flavor::PostgreSQL => format!("{quoted} serial {}", flavor.primary_key_suffix()),
                Flavor::SQLite => format!("{quoted} integer {}", flavor.primary_key_suffix()),
                _ => format!(
                    "{quoted} {} {}",
                    self.column_type_sql(column),
                    flavor.primary_key_suffix()
                ),
            };
        }

        let mut out = format!("{quoted} {}", self.column_type_sql(column));
        if flavor == Flavor::MySQL {
            if let Some(charset) = &column.charset {
                out.push_str(&format!(" CHARACTER SET {charset}"));
            }
            if let Some(collate) = &column.collate {
                out.push_str(&format!(" COLLATE {collate}"));
            }
        }

        let default = column
            .default
            .as_deref()
            .filter(|d| !(d.is_empty() && column.ty.is_numeric()));
        if column.is_primary() {
            out.push_str(" NOT NULL");
        } else if let Some(default) = default {
            out.push_str(&format!(" DEFAULT {}", self.default_literal(column, default)));
            if !column.null {
                out.push_str(" NOT NULL");
            }
        } else if column.null && column.ty == ColumnType::Timestamp {
            out.push_str(" NULL");
        } else if column.null {
            out.push_str(" DEFAULT NULL");
        } else {
            out.push_str(" NOT NULL");
        }

        if flavor == Flavor::MySQL
            && let Some(comment) = &column.comment
        {
            out.push_str(&format!(" COMMENT {}", self.quote_string(comment)));
        }
        out
    }

    fn index_columns(&self, index: &Index) -> String {
        index
            .column
            .iter()
            .map(|c| {
                let quoted = self.name(c);
                match index.length.get(c) {
                    Some(len) if self.flavor() == Flavor::MySQL => format!("{quoted}({len})"),
                    _ => quoted,
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// 索引定义。MySQL 全部内联；其他方言仅主键内联，其余为 `CREATE INDEX` 语句。
    pub fn build_index(&self, table: &str, indexes: &IndexMap<String, Index>) -> IndexSql {
        let mut out = IndexSql::default();
        let full_table = self.table_name(table, None, None);

        for (name, index) in indexes {
            let columns = self.index_columns(index);
            if name == PRIMARY {
                out.inline.push(format!("PRIMARY KEY ({columns})"));
                continue;
            }
            if self.flavor().supports_inline_indexes() {
                let mut def = String::new();
                if index.unique {
                    def.push_str("UNIQUE ");
                }
                match index.kind {
                    Some(IndexType::Fulltext) => def.push_str("FULLTEXT "),
                    Some(IndexType::Spatial) => def.push_str("SPATIAL "),
                    None => {}
                }
                def.push_str(&format!("KEY {} ({columns})", self.name(name)));
                out.inline.push(def);
            } else {
                let unique = if index.unique { "UNIQUE " } else { "" };
                out.statements.push(format!(
                    "CREATE {unique}INDEX {} ON {full_table} ({columns});",
                    self.name(name)
                ));
            }
        }
        out
    }

    /// 表参数。只有 MySQL 支持，其他方言返回空。
    pub fn build_table_parameters(&self, parameters: &TableParameters) -> Vec<String> {
        if self.flavor() != Flavor::MySQL {
            return Vec::new();
        }
        let mut out = Vec::new();
        if let Some(charset) = &parameters.charset {
            out.push(format!("DEFAULT CHARSET={charset}"));
        }
        if let Some(collate) = &parameters.collate {
            out.push(format!("COLLATE={collate}"));
        }
        if let Some(engine) = &parameters.engine {
            out.push(format!("ENGINE={engine}"));
        }
        if let Some(comment) = &parameters.comment {
            out.push(format!("COMMENT={}", self.quote_string(comment)));
        }
        out
    }

    pub fn create_table(&self, table: &Table) -> Result<String, SchemaError> {
        table.validate()?;

        let mut indexes = table.effective_indexes();
        let auto = auto_increment_column(indexes.get(PRIMARY), |c| table.columns.get(c))
            .map(str::to_string);
        let columns: Vec<String> = table
            .columns
            .iter()
            .map(|(name, column)| self.column_sql(name, column, auto.as_ref() == Some(name)))
            .collect();

        // SQLite 的自增主键写在列定义上
        if self.flavor() == Flavor::SQLite && auto.is_some() {
            indexes.shift_remove(PRIMARY);
        }
        let index_sql = self.build_index(&table.name, &indexes);

        let clauses = Clauses {
            table: self.table_name(&table.name, None, None),
            columns,
            indexes: index_sql.inline,
            table_parameters: self.build_table_parameters(&table.parameters),
            ..Clauses::default()
        };
        let mut sql = self.render_statement(StatementKind::Schema, &clauses);
        for statement in index_sql.statements {
            sql.push('\n');
            sql.push_str(&statement);
        }
        Ok(sql)
    }

    /// 所有表（或指定的一张表）的建表语句，以空行分隔。
    pub fn create_schema(
        &self,
        schema: &Schema,
        table: Option<&str>,
    ) -> Result<String, SchemaError> {
        let tables = select_tables(schema, table)?;
        let statements = tables
            .into_iter()
            .map(|t| self.create_table(t))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(statements.join("\n\n"))
    }

    fn drop_table_sql(&self, name: &str) -> String {
        let table = self.table_name(name, None, None);
        match self.flavor() {
            Flavor::SQLServer => format!("DROP TABLE {table};"),
            _ => format!("DROP TABLE IF EXISTS {table};"),
        }
    }

    pub fn drop_schema(
        &self,
        schema: &Schema,
        table: Option<&str>,
    ) -> Result<String, SchemaError> {
        let tables = select_tables(schema, table)?;
        Ok(tables
            .into_iter()
            .map(|t| self.drop_table_sql(&t.name))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// 把差异渲染为迁移 SQL；指定 `table` 时只处理该表。
    pub fn alter_schema(
        &self,
        diff: &SchemaDiff,
        table: Option<&str>,
    ) -> Result<String, SchemaError> {
        if let Some(name) = table
            && !diff.tables.contains_key(name)
        {
            return Err(SchemaError::UnknownTable(name.to_string()));
        }

        let mut out = Vec::new();
        for (name, change) in &diff.tables {
            if table.is_some_and(|t| t != name) {
                continue;
            }
            match change {
                TableChange::Create(t) => out.push(self.create_table(t)?),
                TableChange::Drop(_) => out.push(self.drop_table_sql(name)),
                TableChange::Alter(d) => {
                    let sql = self.alter_table(name, d)?;
                    if !sql.is_empty() {
                        out.push(sql);
                    }
                }
            }
        }
        Ok(out.join("\n\n"))
    }

    /// 迁移中新增或修改的列。主键有变化时按新主键判断是否自增。
    fn diff_column_sql(&self, name: &str, column: &Column, diff: &TableDiff) -> String {
        let auto = match diff.add_indexes.get(PRIMARY) {
            Some(primary) => auto_increment_column(Some(primary), |_| Some(column)) == Some(name),
            None => is_integer_primary(column),
        };
        self.column_sql(name, column, auto)
    }

    fn alter_table(&self, name: &str, diff: &TableDiff) -> Result<String, SchemaError> {
        match self.flavor() {
            Flavor::MySQL => Ok(self.alter_table_mysql(name, diff)),
            Flavor::PostgreSQL => Ok(self.alter_table_postgres(name, diff)),
            Flavor::SQLServer => Ok(self.alter_table_sqlserver(name, diff)),
            Flavor::SQLite => self.alter_table_sqlite(name, diff),
        }
    }

    fn alter_table_mysql(&self, name: &str, diff: &TableDiff) -> String {
        let mut items = Vec::new();
        for (column, added) in &diff.add {
            let mut item = format!(
                "ADD {}",
                self.diff_column_sql(column, &added.column, diff)
            );
            if let Some(after) = &added.after {
                item.push_str(&format!(" AFTER {}", self.name(after)));
            }
            items.push(item);
        }
        for column in &diff.drop {
            items.push(format!("DROP {}", self.name(column)));
        }
        for (column, def) in &diff.change {
            items.push(format!(
                "CHANGE {} {}",
                self.name(column),
                self.diff_column_sql(column, def, diff)
            ));
        }
        for index in &diff.drop_indexes {
            if index == PRIMARY {
                items.push("DROP PRIMARY KEY".to_string());
            } else {
                items.push(format!("DROP KEY {}", self.name(index)));
            }
        }
        for def in self.build_index(name, &diff.add_indexes).inline {
            items.push(format!("ADD {def}"));
        }
        if let Some(parameters) = &diff.parameters {
            items.extend(self.build_table_parameters(parameters));
        }

        if items.is_empty() {
            return String::new();
        }
        format!(
            "ALTER TABLE {}\n\t{};",
            self.table_name(name, None, None),
            items.join(",\n\t")
        )
    }

    fn alter_table_postgres(&self, name: &str, diff: &TableDiff) -> String {
        let table = self.table_name(name, None, None);
        let mut items = Vec::new();
        let mut statements = Vec::new();

        for (column, added) in &diff.add {
            items.push(format!(
                "ADD COLUMN {}",
                self.diff_column_sql(column, &added.column, diff)
            ));
        }
        for column in &diff.drop {
            items.push(format!("DROP COLUMN {}", self.name(column)));
        }
        for (column, def) in &diff.change {
            let quoted = self.name(column);
            items.push(format!(
                "ALTER COLUMN {quoted} TYPE {}",
                self.column_type_sql(def)
            ));
            let nullable = if def.null { "DROP NOT NULL" } else { "SET NOT NULL" };
            items.push(format!("ALTER COLUMN {quoted} {nullable}"));
            match &def.default {
                Some(default) => items.push(format!(
                    "ALTER COLUMN {quoted} SET DEFAULT {}",
                    self.default_literal(def, default)
                )),
                None => items.push(format!("ALTER COLUMN {quoted} DROP DEFAULT")),
            }
        }
        for index in &diff.drop_indexes {
            if index == PRIMARY {
                items.push(format!("DROP CONSTRAINT {}", self.name(&format!("{name}_pkey"))));
            } else {
                statements.push(format!("DROP INDEX {};", self.name(index)));
            }
        }
        let added = self.build_index(name, &diff.add_indexes);
        items.extend(added.inline.into_iter().map(|def| format!("ADD {def}")));

        let mut out = Vec::new();
        if !items.is_empty() {
            out.push(format!("ALTER TABLE {table}\n\t{};", items.join(",\n\t")));
        }
        out.extend(statements);
        out.extend(added.statements);
        out.join("\n")
    }

    fn alter_table_sqlserver(&self, name: &str, diff: &TableDiff) -> String {
        let table = self.table_name(name, None, None);
        let mut out = Vec::new();

        for (column, added) in &diff.add {
            out.push(format!(
                "ALTER TABLE {table} ADD {};",
                self.diff_column_sql(column, &added.column, diff)
            ));
        }
        for column in &diff.drop {
            out.push(format!("ALTER TABLE {table} DROP COLUMN {};", self.name(column)));
        }
        for (column, def) in &diff.change {
            let nullable = if def.null { "NULL" } else { "NOT NULL" };
            out.push(format!(
                "ALTER TABLE {table} ALTER COLUMN {} {} {nullable};",
                self.name(column),
                self.column_type_sql(def)
            ));
        }
        for index in &diff.drop_indexes {
            if index == PRIMARY {
                out.push(format!(
                    "ALTER TABLE {table} DROP CONSTRAINT {};",
                    self.name(&format!("PK_{name}"))
                ));
            } else {
                out.push(format!("DROP INDEX {} ON {table};", self.name(index)));
            }
        }
        let added = self.build_index(name, &diff.add_indexes);
        out.extend(
            added
                .inline
                .into_iter()
                .map(|def| format!("ALTER TABLE {table} ADD {def};")),
        );
        out.extend(added.statements);
        out.join("\n")
    }

    fn alter_table_sqlite(&self, name: &str, diff: &TableDiff) -> Result<String, SchemaError> {
        let unsupported = |operation: &'static str| SchemaError::Unsupported {
            flavor: Flavor::SQLite,
            operation,
            table: name.to_string(),
        };
        if !diff.change.is_empty() {
            return Err(unsupported("change a column"));
        }
        if diff
            .drop_indexes
            .iter()
            .chain(diff.add_indexes.keys())
            .any(|i| i == PRIMARY)
        {
            return Err(unsupported("alter the primary key"));
        }

        let table = self.table_name(name, None, None);
        let mut out = Vec::new();
        for (column, added) in &diff.add {
            out.push(format!(
                "ALTER TABLE {table} ADD COLUMN {};",
                self.diff_column_sql(column, &added.column, diff)
            ));
        }
        for column in &diff.drop {
            out.push(format!("ALTER TABLE {table} DROP COLUMN {};", self.name(column)));
        }
        for index in &diff.drop_indexes {
            out.push(format!("DROP INDEX {};", self.name(index)));
        }
        out.extend(self.build_index(name, &diff.add_indexes).statements);
        Ok(out.join("\n"))
    }
}

fn select_tables<'a>(
    schema: &'a Schema,
    table: Option<&str>,
) -> Result<Vec<&'a Table>, SchemaError> {
    match table {
        Some(name) => schema
            .get(name)
            .map(|t| vec![t])
            .ok_or_else(|| SchemaError::UnknownTable(name.to_string())),
        None => Ok(schema.tables.values().collect()),
    }
}
