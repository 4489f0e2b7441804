//! 语句渲染：按语句类型的模板填充子句槽位，空槽位整体消失。

use indexmap::IndexMap;

use crate::datasource::DboSource;
use crate::expr::Expr;
use crate::fields::Order;
use crate::flavor::Flavor;
use crate::model::Model;
use crate::string_builder::StringBuilder;
use crate::value::SqlValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Schema,
}

const SELECT_TEMPLATE: &str =
    "SELECT {fields} FROM {table} {alias} {joins} {conditions} {group} {having} {order} {limit} {lock}";
const INSERT_TEMPLATE: &str = "INSERT INTO {table} ({fields}) VALUES {values}";
const UPDATE_TEMPLATE: &str = "UPDATE {table} {alias} {joins} SET {fields} {conditions}";
const DELETE_TEMPLATE: &str = "DELETE {target} FROM {table} {alias} {joins} {conditions}";

/// 渲染模板的子句槽位，内容均为已渲染好的 SQL 片段。
///
/// `alias` 需包含 `AS` 前缀（如 ``AS `Post` ``）；`values` 需包含外围括号。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clauses {
    pub fields: String,
    pub table: String,
    pub alias: String,
    /// DELETE 的目标别名。
    pub target: String,
    pub joins: String,
    pub conditions: String,
    pub group: String,
    pub having: String,
    pub order: String,
    pub limit: String,
    pub lock: String,
    pub values: String,
    pub columns: Vec<String>,
    pub indexes: Vec<String>,
    pub table_parameters: Vec<String>,
}

impl Clauses {
    fn slot(&self, name: &str) -> &str {
        match name {
            "fields" => &self.fields,
            "table" => &self.table,
            "alias" => &self.alias,
            "target" => &self.target,
            "joins" => &self.joins,
            "conditions" => &self.conditions,
            "group" => &self.group,
            "having" => &self.having,
            "order" => &self.order,
            "limit" => &self.limit,
            "lock" => &self.lock,
            "values" => &self.values,
            _ => "",
        }
    }
}

const SLOTS: [&str; 12] = [
    "fields",
    "table",
    "alias",
    "target",
    "joins",
    "conditions",
    "group",
    "having",
    "order",
    "limit",
    "lock",
    "values",
];

fn render_template(template: &str, clauses: &Clauses) -> String {
    let mut sb = StringBuilder::new();
    for word in template.split_whitespace() {
        if let Some(slot) = word.strip_prefix('{').and_then(|w| w.strip_suffix('}'))
            && !slot.contains(['{', '}'])
        {
            let value = clauses.slot(slot).trim();
            if !value.is_empty() {
                sb.write_leading(value);
            }
            continue;
        }
        let mut rendered = word.to_string();
        for slot in SLOTS {
            let placeholder = format!("{{{slot}}}");
            if rendered.contains(&placeholder) {
                rendered = rendered.replace(&placeholder, clauses.slot(slot).trim());
            }
        }
        sb.write_leading(&rendered);
    }
    sb.into_string()
}

/// JOIN 描述。`table` 以 `(` 开头（子查询）或已加引号时不再追加前缀与 schema。
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    /// `LEFT`、`INNER`、`CROSS` 等；为空时渲染为裸 `JOIN`。
    pub kind: Option<String>,
    pub table: String,
    pub alias: Option<String>,
    pub conditions: Expr,
}

impl Join {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            kind: None,
            table: table.into(),
            alias: None,
            conditions: Expr::default(),
        }
    }

    pub fn left(table: impl Into<String>) -> Self {
        Self::new(table).kind("LEFT")
    }

    pub fn inner(table: impl Into<String>) -> Self {
        Self::new(table).kind("INNER")
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn on(mut self, conditions: impl Into<Expr>) -> Self {
        self.conditions = conditions.into();
        self
    }
}

/// 查询描述，关联规划在它的副本上累积 JOIN 与字段。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryData {
    pub conditions: Expr,
    pub fields: Vec<String>,
    pub joins: Vec<Join>,
    pub order: Vec<Order>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub page: Option<u64>,
    pub group: Vec<String>,
    pub having: Option<Expr>,
    pub lock: bool,
    /// 以关联别名为键、调用方为该关联追加的条件。
    pub association_conditions: IndexMap<String, Expr>,
}

impl QueryData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conditions(mut self, conditions: impl Into<Expr>) -> Self {
        self.conditions = conditions.into();
        self
    }

    pub fn fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn join(mut self, join: Join) -> Self {
        self.add_join(join);
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

    pub fn group<S: Into<String>>(mut self, group: impl IntoIterator<Item = S>) -> Self {
        self.group = group.into_iter().map(Into::into).collect();
        self
    }

    pub fn having(mut self, having: impl Into<Expr>) -> Self {
        self.having = Some(having.into());
        self
    }

    pub fn lock(mut self, lock: bool) -> Self {
        self.lock = lock;
        self
    }

    pub fn association_conditions(
        mut self,
        alias: impl Into<String>,
        conditions: impl Into<Expr>,
    ) -> Self {
        self.association_conditions
            .insert(alias.into(), conditions.into());
        self
    }

    /// 追加 JOIN；同一别名已存在时忽略并返回 `false`。
    pub fn add_join(&mut self, join: Join) -> bool {
        let duplicate = join.alias.is_some()
            && self
                .joins
                .iter()
                .any(|j| j.alias.is_some() && j.alias == join.alias);
        if duplicate {
            return false;
        }
        self.joins.push(join);
        true
    }

    /// 实际偏移量：显式 `offset` 优先，否则由 `page` 与 `limit` 推出。
    pub fn effective_offset(&self) -> Option<u64> {
        if self.offset.is_some() {
            return self.offset;
        }
        match (self.page, self.limit) {
            (Some(page), Some(limit)) if page > 1 => Some((page - 1) * limit),
            _ => None,
        }
    }
}

impl DboSource {
    /// 按模板渲染一条语句。
    pub fn render_statement(&self, kind: StatementKind, clauses: &Clauses) -> String {
        match kind {
            StatementKind::Select => render_template(SELECT_TEMPLATE, clauses),
            StatementKind::Insert => render_template(INSERT_TEMPLATE, clauses),
            StatementKind::Update => render_template(UPDATE_TEMPLATE, clauses),
            StatementKind::Delete => render_template(DELETE_TEMPLATE, clauses),
            StatementKind::Schema => {
                let body: Vec<&str> = clauses
                    .columns
                    .iter()
                    .chain(&clauses.indexes)
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .collect();
                let params: Vec<&str> = clauses
                    .table_parameters
                    .iter()
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .collect();
                let mut sql = format!(
                    "CREATE TABLE {} (\n\t{}\n)",
                    clauses.table.trim(),
                    body.join(",\n\t")
                );
                if !params.is_empty() {
                    sql.push(' ');
                    sql.push_str(&params.join(" "));
                }
                sql.push(';');
                sql
            }
        }
    }

    /// 表名加前缀、schema 与引号。表名已含 `.` 时不追加 schema。
    pub fn table_name(&self, table: &str, prefix: Option<&str>, schema: Option<&str>) -> String {
        let prefix = prefix.unwrap_or(&self.config().prefix);
        let table = format!("{prefix}{table}");
        let schema = schema.or(self.config().schema_name.as_deref());
        match schema {
            Some(s) if !s.is_empty() && !table.contains('.') => {
                format!("{}.{}", self.name(s), self.name(&table))
            }
            _ => self.name(&table),
        }
    }

    /// 模型的完整表名；模型上的前缀与 schema 覆盖数据源配置。
    pub fn full_table_name(&self, model: &Model) -> String {
        self.table_name(
            &model.table,
            model.table_prefix.as_deref(),
            model.schema_name.as_deref(),
        )
    }

    /// `limit` 为空或 0 时返回空串。
    pub fn limit(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        limit
            .and_then(|l| self.flavor().limit(l, offset.unwrap_or(0)))
            .map(|sql| format!(" {sql}"))
            .unwrap_or_default()
    }

    pub fn locking_hint(&self, lock: bool) -> String {
        match self.flavor().lock_hint() {
            Some(hint) if lock => format!(" {hint}"),
            _ => String::new(),
        }
    }

    pub fn build_join_statement(&self, join: &Join) -> String {
        let decorated =
            join.table.starts_with('(') || join.table.starts_with(self.flavor().start_quote());
        let table = if decorated {
            join.table.clone()
        } else {
            self.table_name(&join.table, None, None)
        };
        let alias = join
            .alias
            .as_deref()
            .map(|a| format!("AS {}", self.name(a)))
            .unwrap_or_default();
        let kind = join.kind.as_deref().unwrap_or("").trim();

        let mut sb = StringBuilder::new();
        if !kind.is_empty() {
            sb.write_leading(kind);
        }
        sb.write_leading("JOIN");
        sb.write_leading(&table);
        if !alias.is_empty() {
            sb.write_leading(&alias);
        }
        if !kind.eq_ignore_ascii_case("CROSS") && !join.conditions.is_empty() {
            let on = self.conditions(&join.conditions, true, false, None);
            sb.write_leading(&format!("ON ({})", on.trim()));
        }
        sb.into_string()
    }

    /// 组装完整的 SELECT。`fields` 为空时选取 `*`。
    pub fn build_statement(
        &self,
        query: &QueryData,
        table: &str,
        alias: &str,
        model: Option<&Model>,
    ) -> String {
        let joins: Vec<String> = query
            .joins
            .iter()
            .map(|j| self.build_join_statement(j))
            .collect();
        let fields = if query.fields.is_empty() {
            "*".to_string()
        } else {
            query.fields.join(", ")
        };
        let clauses = Clauses {
            fields,
            table: table.to_string(),
            alias: format!("AS {}", self.name(alias)),
            joins: joins.join(" "),
            conditions: self.conditions(&query.conditions, true, true, model),
            group: self.group(&query.group, model),
            having: self.having(query.having.as_ref(), true, model),
            order: self.order(&query.order, "ASC", model),
            limit: self.limit(query.limit, query.effective_offset()),
            lock: self.locking_hint(query.lock),
            ..Clauses::default()
        };
        self.render_statement(StatementKind::Select, &clauses)
    }

    /// 单行 INSERT，值按模型列类型格式化。
    pub fn insert_sql(&self, model: &Model, row: &[(&str, SqlValue)]) -> String {
        let fields: Vec<String> = row.iter().map(|(f, _)| self.name(f)).collect();
        let values: Vec<String> = row
            .iter()
            .map(|(f, v)| self.value(v, model.column_type(f)))
            .collect();
        let clauses = Clauses {
            table: self.full_table_name(model),
            fields: fields.join(", "),
            values: format!("({})", values.join(", ")),
            ..Clauses::default()
        };
        self.render_statement(StatementKind::Insert, &clauses)
    }

    /// 多行 INSERT；`rows` 中每一行的值顺序与 `fields` 一致。
    pub fn insert_multi_sql(
        &self,
        model: &Model,
        fields: &[&str],
        rows: &[Vec<SqlValue>],
    ) -> String {
        let holders: Vec<String> = rows
            .iter()
            .map(|row| {
                let values: Vec<String> = row
                    .iter()
                    .zip(fields)
                    .map(|(v, f)| self.value(v, model.column_type(f)))
                    .collect();
                format!("({})", values.join(", "))
            })
            .collect();
        let clauses = Clauses {
            table: self.full_table_name(model),
            fields: self.name_all(fields).join(", "),
            values: holders.join(", "),
            ..Clauses::default()
        };
        self.render_statement(StatementKind::Insert, &clauses)
    }

    /// UPDATE。MySQL 在有条件时使用别名并以别名限定字段；其他方言去掉别名前缀。
    pub fn update_sql(
        &self,
        model: &Model,
        values: &[(&str, SqlValue)],
        conditions: &Expr,
    ) -> String {
        let aliased = self.flavor() == Flavor::MySQL && !conditions.is_empty();
        let quoted_alias = self.flavor().quote(&model.alias);
        let local_prefix = format!("{}.", model.alias);
        let quoted_prefix = format!("{quoted_alias}.");

        let fields: Vec<String> = values
            .iter()
            .map(|(field, value)| {
                let quoted = if aliased && !field.contains('.') {
                    self.name(&format!("{}.{field}", model.alias))
                } else if !aliased && field.contains('.') {
                    let local = field
                        .replace(&quoted_prefix, "")
                        .replace(&local_prefix, "");
                    self.name(&local)
                } else {
                    self.name(field)
                };
                format!("{quoted} = {}", self.value(value, model.column_type(field)))
            })
            .collect();

        let clauses = Clauses {
            table: self.full_table_name(model),
            alias: if aliased {
                format!("AS {quoted_alias}")
            } else {
                String::new()
            },
            fields: fields.join(", "),
            conditions: self.unaliased_conditions(model, conditions, aliased),
            ..Clauses::default()
        };
        self.render_statement(StatementKind::Update, &clauses)
    }

    /// DELETE。MySQL 形如 ``DELETE `Post` FROM `posts` AS `Post` WHERE …``。
    pub fn delete_sql(&self, model: &Model, conditions: &Expr) -> String {
        let aliased = self.flavor() == Flavor::MySQL && !conditions.is_empty();
        let (target, alias) = if aliased {
            let quoted = self.name(&model.alias);
            (quoted.clone(), format!("AS {quoted}"))
        } else {
            (String::new(), String::new())
        };
        let clauses = Clauses {
            target,
            table: self.full_table_name(model),
            alias,
            conditions: self.unaliased_conditions(model, conditions, aliased),
            ..Clauses::default()
        };
        self.render_statement(StatementKind::Delete, &clauses)
    }

    /// 不使用别名时去掉条件中的 `` `Alias`. `` 前缀。
    fn unaliased_conditions(&self, model: &Model, conditions: &Expr, aliased: bool) -> String {
        let sql = self.conditions(conditions, true, true, Some(model));
        if aliased {
            return sql;
        }
        sql.replace(&format!("{}.", self.flavor().quote(&model.alias)), "")
    }

    pub fn truncate_sql(&self, model: &Model) -> String {
        self.flavor().truncate(&self.full_table_name(model))
    }
}
