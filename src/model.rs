//! 模型描述：表名、列、虚拟字段与关联声明。SQL 生成只读取这些描述，从不修改。

use heck::ToSnakeCase;
use indexmap::IndexMap;

use crate::column_type::ColumnType;
use crate::expr::Expr;
use crate::fields::Order;
use crate::schema::{Column, KeyRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssociationKind {
    BelongsTo,
    HasOne,
    HasMany,
    HasAndBelongsToMany,
}

impl AssociationKind {
    /// 通过 JOIN 合并到主查询的关联。
    pub fn is_joinable(self) -> bool {
        matches!(self, Self::BelongsTo | Self::HasOne)
    }
}

/// 关联查询选取的字段。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldSelection {
    /// 关联模型的全部列。
    #[default]
    All,
    /// 不选取任何字段（只用于连接或过滤）。
    Nothing,
    Only(Vec<String>),
}

/// 关联声明。未设置的外键、关联外键与中间表名在规划时按命名约定推导。
#[derive(Debug, Clone, PartialEq)]
pub struct Association {
    pub kind: AssociationKind,
    pub alias: String,
    /// 目标模型名称，在 [`Models`] 中查找。
    pub class_name: String,
    pub foreign_key: Option<String>,
    pub association_foreign_key: Option<String>,
    pub conditions: Expr,
    pub fields: FieldSelection,
    pub order: Vec<Order>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub page: Option<u64>,
    /// JOIN 类型，默认 `LEFT`。
    pub join_type: Option<String>,
    pub join_table: Option<String>,
    /// HABTM 中间表的模型别名。
    pub with: Option<String>,
    /// 外部查询时完全替代生成的 SQL。
    pub finder_query: Option<String>,
}

impl Association {
    pub fn new(kind: AssociationKind, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        Self {
            kind,
            class_name: alias.clone(),
            alias,
            foreign_key: None,
            association_foreign_key: None,
            conditions: Expr::default(),
            fields: FieldSelection::All,
            order: Vec::new(),
            limit: None,
            offset: None,
            page: None,
            join_type: None,
            join_table: None,
            with: None,
            finder_query: None,
        }
    }

    pub fn belongs_to(alias: impl Into<String>) -> Self {
        Self::new(AssociationKind::BelongsTo, alias)
    }

    pub fn has_one(alias: impl Into<String>) -> Self {
        Self::new(AssociationKind::HasOne, alias)
    }

    pub fn has_many(alias: impl Into<String>) -> Self {
        Self::new(AssociationKind::HasMany, alias)
    }

    pub fn has_and_belongs_to_many(alias: impl Into<String>) -> Self {
        Self::new(AssociationKind::HasAndBelongsToMany, alias)
    }

    pub fn class_name(mut self, name: impl Into<String>) -> Self {
        self.class_name = name.into();
        self
    }

    pub fn foreign_key(mut self, fk: impl Into<String>) -> Self {
        self.foreign_key = Some(fk.into());
        self
    }

    pub fn association_foreign_key(mut self, fk: impl Into<String>) -> Self {
        self.association_foreign_key = Some(fk.into());
        self
    }

    pub fn conditions(mut self, conditions: impl Into<Expr>) -> Self {
        self.conditions = conditions.into();
        self
    }

    pub fn fields(mut self, fields: FieldSelection) -> Self {
        self.fields = fields;
        self
    }

    pub fn order<O: Into<Order>>(mut self, order: impl IntoIterator<Item = O>) -> Self {
        self.order = order.into_iter().map(Into::into).collect();
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn join_type(mut self, join_type: impl Into<String>) -> Self {
        self.join_type = Some(join_type.into());
        self
    }

    pub fn join_table(mut self, table: impl Into<String>) -> Self {
        self.join_table = Some(table.into());
        self
    }

    pub fn with(mut self, join_alias: impl Into<String>) -> Self {
        self.with = Some(join_alias.into());
        self
    }

    pub fn finder_query(mut self, sql: impl Into<String>) -> Self {
        self.finder_query = Some(sql.into());
        self
    }

    /// 外键：显式声明优先，否则 belongsTo 取 `<目标>_id`，其余取 `<所属模型>_id`。
    pub fn resolved_foreign_key(&self, owner: &Model) -> String {
        match &self.foreign_key {
            Some(fk) => fk.clone(),
            None => match self.kind {
                AssociationKind::BelongsTo => format!("{}_id", self.class_name.to_snake_case()),
                _ => format!("{}_id", owner.name.to_snake_case()),
            },
        }
    }

    /// HABTM 中指向目标模型的外键。
    pub fn resolved_association_foreign_key(&self) -> String {
        self.association_foreign_key
            .clone()
            .unwrap_or_else(|| format!("{}_id", self.class_name.to_snake_case()))
    }

    /// HABTM 中间表名：默认把两张表名按字典序以 `_` 连接。
    pub fn resolved_join_table(&self, owner: &Model, link: &Model) -> String {
        if let Some(table) = &self.join_table {
            return table.clone();
        }
        let mut tables = [owner.table.as_str(), link.table.as_str()];
        tables.sort_unstable();
        tables.join("_")
    }
}

/// 由模型名推导表名：转为 snake_case 后对最后一个词取复数。
fn table_name_for(model: &str) -> String {
    let snake = model.to_snake_case();
    match snake.rsplit_once('_') {
        Some((head, last)) => format!("{head}_{}", pluralizer::pluralize(last, 2, false)),
        None => pluralizer::pluralize(&snake, 2, false),
    }
}

/// 模型描述。
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub name: String,
    pub alias: String,
    pub table: String,
    /// 覆盖数据源配置中的表前缀。
    pub table_prefix: Option<String>,
    /// 覆盖数据源配置中的 schema。
    pub schema_name: Option<String>,
    pub primary_key: String,
    pub columns: IndexMap<String, Column>,
    pub virtual_fields: IndexMap<String, String>,
    pub associations: Vec<Association>,
}

impl Model {
    /// 默认别名与名称相同，表名为 snake_case 的复数形式，主键为 `id`。
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            alias: name.clone(),
            table: table_name_for(&name),
            name,
            table_prefix: None,
            schema_name: None,
            primary_key: "id".to_string(),
            columns: IndexMap::new(),
            virtual_fields: IndexMap::new(),
            associations: Vec::new(),
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = Some(prefix.into());
        self
    }

    pub fn schema_name(mut self, schema: impl Into<String>) -> Self {
        self.schema_name = Some(schema.into());
        self
    }

    pub fn primary_key(mut self, pk: impl Into<String>) -> Self {
        self.primary_key = pk.into();
        self
    }

    pub fn column(mut self, name: impl Into<String>, column: Column) -> Self {
        self.columns.insert(name.into(), column);
        self
    }

    /// 快捷方式：按类型追加列，与主键同名的列自动标记为主键。
    pub fn typed_column(self, name: &str, ty: ColumnType) -> Self {
        let mut column = Column::new(ty);
        if name == self.primary_key {
            column = column.not_null().key(KeyRole::Primary);
        }
        self.column(name, column)
    }

    pub fn virtual_field(mut self, name: impl Into<String>, sql: impl Into<String>) -> Self {
        self.virtual_fields.insert(name.into(), sql.into());
        self
    }

    pub fn association(mut self, association: Association) -> Self {
        self.associations.push(association);
        self
    }

    /// 去掉本模型别名前缀；带其他别名前缀时返回 `None`。
    fn local_name<'a>(&self, field: &'a str) -> Option<&'a str> {
        match field.split_once('.') {
            Some((alias, name)) if alias == self.alias => Some(name),
            Some(_) => None,
            None => Some(field),
        }
    }

    pub fn is_virtual_field(&self, field: &str) -> bool {
        self.virtual_field_sql(field).is_some()
    }

    /// 虚拟字段的 SQL 表达式，接受 `name` 或 `Alias.name`。
    pub fn virtual_field_sql(&self, field: &str) -> Option<&str> {
        let name = self.local_name(field.trim())?;
        self.virtual_fields.get(name).map(String::as_str)
    }

    pub fn column_type(&self, field: &str) -> Option<&ColumnType> {
        let name = self.local_name(field.trim())?;
        self.columns.get(name).map(|c| &c.ty)
    }

    pub fn has_association_kind(&self, kind: AssociationKind) -> bool {
        self.associations.iter().any(|a| a.kind == kind)
    }
}

/// 模型注册表，关联规划时按名称查找目标模型。
#[derive(Debug, Clone, Default)]
pub struct Models {
    by_name: IndexMap<String, Model>,
}

impl Models {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, model: Model) -> &mut Self {
        self.by_name.insert(model.name.clone(), model);
        self
    }

    pub fn with(mut self, model: Model) -> Self {
        self.insert(model);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Model> {
        self.by_name.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn article() -> Model {
        Model::new("Article")
            .typed_column("id", ColumnType::Integer)
            .typed_column("title", ColumnType::String)
            .virtual_field("two", "1 + 1")
    }

    #[test]
    fn defaults_follow_conventions() {
        let m = Model::new("BlogPost");
        assert_eq!(m.table, "blog_posts");
        assert_eq!(m.alias, "BlogPost");
        let a = Association::has_many("Comment");
        assert_eq!(a.resolved_foreign_key(&m), "blog_post_id");
        let b = Association::belongs_to("Author").class_name("User");
        assert_eq!(b.resolved_foreign_key(&m), "user_id");
    }

    #[test]
    fn table_names_use_irregular_plurals() {
        assert_eq!(Model::new("Category").table, "categories");
        assert_eq!(Model::new("Person").table, "people");
        assert_eq!(Model::new("PostCategory").table, "post_categories");
        assert_eq!(Model::new("Tag").table, "tags");
    }

    #[test]
    fn column_and_virtual_lookup_respect_alias() {
        let m = article();
        assert_eq!(m.column_type("Article.id"), Some(&ColumnType::Integer));
        assert_eq!(m.column_type("title"), Some(&ColumnType::String));
        assert_eq!(m.column_type("Other.id"), None);
        assert!(m.is_virtual_field("Article.two"));
        assert!(m.is_virtual_field("two"));
        assert!(!m.is_virtual_field("Comment.two"));
    }

    #[test]
    fn habtm_join_table_is_sorted() {
        let owner = Model::new("Article");
        let link = Model::new("Tag");
        let a = Association::has_and_belongs_to_many("Tag");
        assert_eq!(a.resolved_join_table(&owner, &link), "articles_tags");
        assert_eq!(a.resolved_association_foreign_key(), "tag_id");
    }
}
