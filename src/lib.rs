//! dbo-sql：ORM 数据源的 SQL 生成、方言抽象与表结构差异计算库。

pub mod association;
pub mod bind;
pub mod column_type;
pub mod conditions;
#[cfg(test)]
mod conditions_tests;
pub mod datasource;
pub mod expr;
pub mod fields;
#[cfg(test)]
mod fields_tests;
pub mod finder;
pub mod flavor;
#[cfg(test)]
mod flavor_tests;
pub mod formatter;
#[cfg(test)]
mod formatter_tests;
pub mod introspect;
pub mod lexer;
pub mod macros;
pub mod method_cache;
pub mod migration;
#[cfg(test)]
mod migration_tests;
pub mod model;
pub mod quote;
pub mod schema;
pub mod schema_diff;
pub mod statement;
mod string_builder;
pub mod value;

pub use crate::association::{AssociatedQuery, AssociationError, AssociationQuery, ReadPlan};
pub use crate::column_type::{ColumnType, UnknownColumnType};
pub use crate::datasource::{DataSourceConfig, DboSource};
pub use crate::expr::{Expr, Operand};
pub use crate::fields::Order;
pub use crate::finder::{Finder, FinderError, FinderKind, parse_finder};
pub use crate::flavor::{Flavor, default_flavor, set_default_flavor, set_default_flavor_scoped};
pub use crate::formatter::Escaper;
pub use crate::introspect::{ColumnRow, IndexRow, table_from_rows};
pub use crate::method_cache::{CachedValue, MethodCache};
pub use crate::migration::IndexSql;
pub use crate::model::{Association, AssociationKind, FieldSelection, Model, Models};
pub use crate::schema::{
    Column, Index, IndexType, KeyRole, PRIMARY, Schema, SchemaError, Table, TableParameters,
};
pub use crate::schema_diff::{AddedColumn, SchemaDiff, TableChange, TableDiff};
pub use crate::statement::{Clauses, Join, QueryData, StatementKind};
pub use crate::value::{
    DEFERRED_FOREIGN_KEY_MARKER, DEFERRED_ID_MARKER, SqlDateTime, SqlValue,
};
