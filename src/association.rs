//! 关联查询规划：belongsTo/hasOne 合并为 JOIN，hasMany/HABTM 生成带延迟占位符的独立查询。
//!
//! 规划函数只读取模型与关联描述，所有合并都发生在查询描述的新副本上。

use thiserror::Error;

use crate::datasource::DboSource;
use crate::expr::{Expr, Operand};
use crate::model::{Association, AssociationKind, FieldSelection, Model, Models};
use crate::statement::{Join, QueryData};
use crate::value::{DEFERRED_FOREIGN_KEY_MARKER, DEFERRED_ID_MARKER, SqlValue};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssociationError {
    #[error("association `{alias}` refers to unknown model `{model}`")]
    UnknownModel { alias: String, model: String },
    #[error("association `{alias}` declares an empty foreign key")]
    MissingForeignKey { alias: String },
}

/// 单个关联的规划结果。
#[derive(Debug, Clone, PartialEq)]
pub enum AssociationQuery {
    /// 合并进主查询后的查询描述。
    Joined(QueryData),
    /// 需要单独执行的 SQL，可能含延迟占位符。
    Standalone(String),
}

/// 为 hasMany/HABTM 生成的后续查询。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociatedQuery {
    pub alias: String,
    pub kind: AssociationKind,
    pub sql: String,
}

/// 一次读取的完整规划。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadPlan {
    pub sql: String,
    pub associated: Vec<AssociatedQuery>,
}

fn foreign_key(model: &Model, assoc: &Association) -> Result<String, AssociationError> {
    let fk = assoc.resolved_foreign_key(model);
    if fk.trim().is_empty() {
        return Err(AssociationError::MissingForeignKey {
            alias: assoc.alias.clone(),
        });
    }
    Ok(fk)
}

fn single(key: String, value: impl Into<Operand>) -> Expr {
    Expr::Map(vec![(key, value.into())])
}

/// 丢掉引用主模型别名的原始 SQL 成员；外部查询中主模型不在 FROM 里。
fn strip_owner_references(expr: Expr, owner_alias: &str) -> Expr {
    match expr {
        Expr::List(items) => Expr::List(
            items
                .into_iter()
                .map(|item| strip_owner_references(item, owner_alias))
                .filter(|item| !item.is_empty())
                .collect(),
        ),
        Expr::Raw(sql) if sql.contains(&format!("{owner_alias}.")) => Expr::default(),
        other => other,
    }
}

impl DboSource {
    /// 关联的连接约束。
    ///
    /// - hasOne：``Alias.fk = Model.pk``，外部查询时为 ``Alias.fk = {$__cakeID__$}``；
    /// - belongsTo：``Model.fk = Alias.pk``，外部查询时为 ``Alias.pk = {$__cakeForeignKey__$}``；
    /// - hasMany：``Alias.fk = ({$__cakeID__$})``；
    /// - HABTM：``Join.fk = ({$__cakeID__$})`` 与关联外键对目标主键的等值条件。
    pub fn get_constraint(
        &self,
        model: &Model,
        link: &Model,
        assoc: &Association,
        join_alias: &str,
        external: bool,
    ) -> Result<Expr, AssociationError> {
        let fk = foreign_key(model, assoc)?;
        let alias = &assoc.alias;
        let expr = match assoc.kind {
            AssociationKind::HasOne if external => {
                single(format!("{alias}.{fk}"), DEFERRED_ID_MARKER)
            }
            AssociationKind::HasOne => single(
                format!("{alias}.{fk}"),
                SqlValue::identifier(format!("{}.{}", model.alias, model.primary_key)),
            ),
            AssociationKind::BelongsTo if external => single(
                format!("{alias}.{}", link.primary_key),
                DEFERRED_FOREIGN_KEY_MARKER,
            ),
            AssociationKind::BelongsTo => single(
                format!("{}.{fk}", model.alias),
                SqlValue::identifier(format!("{alias}.{}", link.primary_key)),
            ),
            AssociationKind::HasMany => single(
                format!("{alias}.{fk}"),
                vec![SqlValue::from(DEFERRED_ID_MARKER)],
            ),
            AssociationKind::HasAndBelongsToMany => Expr::Map(vec![
                (
                    format!("{join_alias}.{fk}"),
                    Operand::Values(vec![SqlValue::from(DEFERRED_ID_MARKER)]),
                ),
                (
                    format!("{join_alias}.{}", assoc.resolved_association_foreign_key()),
                    Operand::from(SqlValue::identifier(format!(
                        "{alias}.{}",
                        link.primary_key
                    ))),
                ),
            ]),
        };
        Ok(expr)
    }

    /// 主模型的字段列表；存在 hasMany/HABTM 关联时确保包含主键，供后续查询回填。
    pub fn prepare_fields(&self, model: &Model, query: &QueryData) -> Vec<String> {
        if query.fields.is_empty() {
            return self.fields(model, None, &[], true);
        }
        let mut fields = self.fields(model, None, &query.fields, true);
        let needs_key = model.has_association_kind(AssociationKind::HasMany)
            || model.has_association_kind(AssociationKind::HasAndBelongsToMany);
        if needs_key {
            let pk = self.name(&format!("{}.{}", model.alias, model.primary_key));
            if !fields.contains(&pk) {
                fields.push(pk);
            }
        }
        fields
    }

    fn association_fields(&self, link: &Model, assoc: &Association) -> Vec<String> {
        match &assoc.fields {
            FieldSelection::Nothing => Vec::new(),
            FieldSelection::All => self.fields(link, Some(&assoc.alias), &[], true),
            FieldSelection::Only(list) => self.fields(link, Some(&assoc.alias), list, true),
        }
    }

    /// 为一个关联生成查询。`query` 是主查询当前的描述，不会被修改。
    pub fn generate_association_query(
        &self,
        model: &Model,
        link: &Model,
        assoc: &Association,
        query: &QueryData,
        external: bool,
    ) -> Result<AssociationQuery, AssociationError> {
        if external && let Some(sql) = &assoc.finder_query {
            return Ok(AssociationQuery::Standalone(sql.clone()));
        }

        let is_self = model.name == link.name;
        let caller_conditions = query
            .association_conditions
            .get(&assoc.alias)
            .cloned()
            .unwrap_or_default();
        let offset = assoc.offset.or_else(|| match (assoc.page, assoc.limit) {
            (Some(page), Some(limit)) if page > 1 => Some((page - 1) * limit),
            _ => None,
        });

        match assoc.kind {
            AssociationKind::BelongsTo | AssociationKind::HasOne => {
                let constraint = self.get_constraint(model, link, assoc, &assoc.alias, external)?;
                let mut conditions =
                    Expr::merge([constraint, assoc.conditions.clone(), caller_conditions]);
                if external && !is_self {
                    conditions = strip_owner_references(conditions, &model.alias);
                }

                if external {
                    let standalone = QueryData {
                        conditions,
                        fields: self.association_fields(link, assoc),
                        order: assoc.order.clone(),
                        limit: assoc.limit,
                        offset,
                        ..QueryData::default()
                    };
                    let sql = self.build_statement(
                        &standalone,
                        &self.full_table_name(link),
                        &assoc.alias,
                        Some(link),
                    );
                    return Ok(AssociationQuery::Standalone(sql));
                }

                let mut joined = query.clone();
                let join = Join {
                    kind: Some(assoc.join_type.clone().unwrap_or_else(|| "LEFT".to_string())),
                    table: self.full_table_name(link),
                    alias: Some(assoc.alias.clone()),
                    conditions,
                };
                if joined.add_join(join) {
                    joined.fields.extend(self.association_fields(link, assoc));
                    joined.order.extend(assoc.order.iter().cloned());
                }
                Ok(AssociationQuery::Joined(joined))
            }
            AssociationKind::HasMany => {
                let fk = foreign_key(model, assoc)?;
                let mut fields = match &assoc.fields {
                    FieldSelection::Only(list) => {
                        self.fields(link, Some(&assoc.alias), list, true)
                    }
                    _ => self.fields(link, Some(&assoc.alias), &[], true),
                };
                let fk_field = self.name(&format!("{}.{fk}", assoc.alias));
                if !fields.contains(&fk_field) {
                    fields.push(fk_field);
                }

                let constraint = self.get_constraint(model, link, assoc, &assoc.alias, true)?;
                let standalone = QueryData {
                    conditions: Expr::merge([
                        constraint,
                        assoc.conditions.clone(),
                        caller_conditions,
                    ]),
                    fields,
                    order: assoc.order.clone(),
                    limit: assoc.limit,
                    offset,
                    ..QueryData::default()
                };
                tracing::debug!(alias = %assoc.alias, "planned hasMany query");
                Ok(AssociationQuery::Standalone(self.build_statement(
                    &standalone,
                    &self.full_table_name(link),
                    &assoc.alias,
                    Some(link),
                )))
            }
            AssociationKind::HasAndBelongsToMany => {
                let join_table = assoc.resolved_join_table(model, link);
                let prefix = model
                    .table_prefix
                    .as_deref()
                    .unwrap_or(&self.config().prefix);
                let join_alias = match &assoc.with {
                    Some(with) => with.clone(),
                    None => format!("{prefix}{join_table}"),
                };

                let mut fields = self.association_fields(link, assoc);
                if let Some(with) = &assoc.with {
                    fields.push(self.name(&format!("{with}.*")));
                }

                let constraint = self.get_constraint(model, link, assoc, &join_alias, true)?;
                let join = Join {
                    kind: None,
                    table: join_table,
                    alias: assoc.with.clone(),
                    conditions: constraint,
                };
                let standalone = QueryData {
                    conditions: Expr::merge([assoc.conditions.clone(), caller_conditions]),
                    fields,
                    joins: vec![join],
                    order: assoc.order.clone(),
                    limit: assoc.limit,
                    offset,
                    ..QueryData::default()
                };
                tracing::debug!(alias = %assoc.alias, join = %join_alias, "planned HABTM query");
                Ok(AssociationQuery::Standalone(self.build_statement(
                    &standalone,
                    &self.full_table_name(link),
                    &assoc.alias,
                    Some(link),
                )))
            }
        }
    }

    /// 主查询：按给定描述渲染模型自身的 SELECT。
    pub fn build_association_query(&self, model: &Model, query: &QueryData) -> String {
        self.build_statement(query, &self.full_table_name(model), &model.alias, Some(model))
    }

    /// 完整读取规划：字段加引号、生成关联 JOIN（调用方 JOIN 排在其后）、生成后续查询。
    pub fn read_query(
        &self,
        model: &Model,
        models: &Models,
        query: &QueryData,
    ) -> Result<ReadPlan, AssociationError> {
        // 调用方给出字段时，未声明字段的关联不再追加字段
        let bypass = !query.fields.is_empty();
        let mut current = query.clone();
        current.fields = self.prepare_fields(model, query);
        let caller_joins = std::mem::take(&mut current.joins);
        let mut associated = Vec::new();

        for assoc in &model.associations {
            let link = models
                .get(&assoc.class_name)
                .ok_or_else(|| AssociationError::UnknownModel {
                    alias: assoc.alias.clone(),
                    model: assoc.class_name.clone(),
                })?;

            if assoc.kind.is_joinable() {
                let effective;
                let assoc = if bypass && assoc.fields == FieldSelection::All {
                    effective = assoc.clone().fields(FieldSelection::Nothing);
                    &effective
                } else {
                    assoc
                };
                if let AssociationQuery::Joined(joined) =
                    self.generate_association_query(model, link, assoc, &current, false)?
                {
                    current = joined;
                }
            } else if let AssociationQuery::Standalone(sql) =
                self.generate_association_query(model, link, assoc, &current, true)?
            {
                associated.push(AssociatedQuery {
                    alias: assoc.alias.clone(),
                    kind: assoc.kind,
                    sql,
                });
            }
        }

        for join in caller_joins {
            current.add_join(join);
        }

        let sql = self.build_association_query(model, &current);
        tracing::debug!(
            model = %model.name,
            joins = current.joins.len(),
            associated = associated.len(),
            "planned read query"
        );
        Ok(ReadPlan { sql, associated })
    }

    /// 用父记录主键替换 `{$__cakeID__$}`；多个主键时把 `= (` 改写为 `IN (`。
    ///
    /// 没有父记录时返回 `None`，后续查询无需执行。
    pub fn fill_deferred_ids(&self, sql: &str, ids: &[SqlValue]) -> Option<String> {
        if ids.is_empty() {
            return None;
        }
        let formatted = self.values(ids, None).join(", ");
        let filled = sql.replace(DEFERRED_ID_MARKER, &formatted);
        if ids.len() > 1 {
            Some(filled.replace(&format!("= ({formatted}"), &format!("IN ({formatted}")))
        } else {
            Some(filled)
        }
    }

    /// 用外键值替换 `{$__cakeForeignKey__$}`。
    pub fn fill_deferred_foreign_key(&self, sql: &str, value: &SqlValue) -> String {
        sql.replace(DEFERRED_FOREIGN_KEY_MARKER, &self.value(value, None))
    }
}
