//! SELECT 字段列表、ORDER BY、GROUP BY 与聚合函数片段的构造。

use crate::datasource::DboSource;
use crate::lexer::split_top_level;
use crate::method_cache::CachedValue;
use crate::model::Model;
use crate::quote::is_identifier;

/// 排序项。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Order {
    /// 字段或逗号分隔的字段列表，可带 `ASC`/`DESC` 后缀。
    Field(String),
    /// 字段与显式方向。
    Directed(String, String),
    /// 原样输出的 SQL 表达式。
    Expression(String),
}

impl Order {
    pub fn asc(field: impl Into<String>) -> Self {
        Self::Directed(field.into(), "ASC".to_string())
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::Directed(field.into(), "DESC".to_string())
    }

    pub fn expression(sql: impl Into<String>) -> Self {
        Self::Expression(sql.into())
    }
}

impl From<&str> for Order {
    fn from(v: &str) -> Self {
        Self::Field(v.to_string())
    }
}

impl From<String> for Order {
    fn from(v: String) -> Self {
        Self::Field(v)
    }
}

impl From<(&str, &str)> for Order {
    fn from((field, dir): (&str, &str)) -> Self {
        Self::Directed(field.to_string(), dir.to_string())
    }
}

/// 形如 `(a, b)` 的括号内逗号，此时整体不按逗号拆分。
fn has_grouped_comma(s: &str) -> bool {
    match (s.find('('), s.rfind(')')) {
        (Some(open), Some(close)) if open < close => s[open + 1..close].contains(','),
        _ => false,
    }
}

/// 拆出 `" ASC"`/`" DESC"` 及其后的全部内容。
fn split_direction(key: &str) -> Option<(&str, &str)> {
    let lower = key.to_ascii_lowercase();
    let at = [" asc", " desc"]
        .iter()
        .filter_map(|d| lower.find(d))
        .min()?;
    Some((&key[..at], key[at..].trim()))
}

fn is_numeric_path(s: &str) -> bool {
    s.split('.')
        .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
}

/// `FN(...)` 形式：括号前有内容且括号闭合。
fn is_call(s: &str) -> bool {
    s.find('(')
        .is_some_and(|open| open > 0 && s[open..].contains(')'))
}

fn dedup(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

impl DboSource {
    /// 构造 SELECT 字段列表。
    ///
    /// `requested` 为空、包含 `*` 或 `Alias.*` 时取模型的全部列与虚拟字段；
    /// 虚拟字段总是追加在末尾，渲染为 `(<expr>) AS <Alias><sep><name>`。
    pub fn fields(
        &self,
        model: &Model,
        alias: Option<&str>,
        requested: &[String],
        quote: bool,
    ) -> Vec<String> {
        let alias = alias.unwrap_or(&model.alias);
        let columns: Vec<&String> = model.columns.keys().collect();
        let args = (
            alias,
            &model.name,
            &model.alias,
            &model.table,
            &columns,
            &model.virtual_fields,
            requested,
            quote,
        );
        self.cache_method("fields", &args, || {
            CachedValue::List(self.build_fields(model, alias, requested, quote))
        })
        .into_list()
    }

    fn build_fields(
        &self,
        model: &Model,
        alias: &str,
        requested: &[String],
        quote: bool,
    ) -> Vec<String> {
        let flavor = self.flavor();
        let mut fields: Vec<String> = requested
            .iter()
            .flat_map(|f| split_top_level(f, flavor))
            .collect();

        let all_fields = fields.is_empty()
            || fields
                .iter()
                .any(|f| f == "*" || *f == format!("{}.*", model.alias));

        let virtual_names: Vec<String> = if all_fields {
            if fields.is_empty() {
                fields = model.columns.keys().cloned().collect();
            }
            model.virtual_fields.keys().cloned().collect()
        } else {
            let mut names = Vec::new();
            fields.retain(|f| {
                if model.is_virtual_field(f) {
                    names.push(f.rsplit('.').next().unwrap_or(f).to_string());
                    false
                } else {
                    true
                }
            });
            names
        };

        let virtual_fields: Vec<String> = virtual_names
            .iter()
            .filter_map(|name| {
                let sql = model.virtual_fields.get(name)?;
                let column = format!("{alias}{}{name}", self.separator());
                Some(if quote {
                    format!("({}) AS {}", self.quote_fields(sql), self.name(&column))
                } else {
                    format!("({sql}) AS {column}")
                })
            })
            .collect();

        if !quote {
            fields.extend(virtual_fields);
            return dedup(fields);
        }

        let mut out: Vec<String> = fields
            .iter()
            .map(|field| self.quote_select_field(alias, field))
            .collect();
        out.extend(virtual_fields);
        dedup(out)
    }

    fn quote_select_field(&self, alias: &str, field: &str) -> String {
        let field = field.trim();
        if field == "*" || field.eq_ignore_ascii_case("count(*)") {
            return field.to_string();
        }
        if field.starts_with('(') && field.to_ascii_uppercase().contains(") AS ") {
            return field.to_string();
        }
        if is_call(field) {
            return self.quote_call_field(alias, field);
        }

        let (prepend, field) = match field.strip_prefix("DISTINCT") {
            Some(rest) => ("DISTINCT ", rest.trim()),
            None => ("", field),
        };

        let quoted = if !field.contains('.') {
            if field.contains([' ', '(']) {
                self.name(field)
            } else {
                self.name(&format!("{alias}.{field}"))
            }
        } else if field.contains(',') || is_numeric_path(field) {
            field.to_string()
        } else {
            self.name(field)
        };
        format!("{prepend}{quoted}")
    }

    /// 函数调用字段：单个裸参数补上别名，其余只给限定名加引号。
    fn quote_call_field(&self, alias: &str, field: &str) -> String {
        if let Some(open) = field.find('(')
            && let Some(len) = field[open..].find(')')
        {
            let inner = &field[open + 1..open + len];
            if is_identifier(inner) {
                return format!(
                    "{}({}){}",
                    &field[..open],
                    self.name(&format!("{alias}.{inner}")),
                    self.quote_fields(&field[open + len + 1..])
                );
            }
        }
        self.quote_fields(field)
    }

    /// ORDER BY 子句；未带方向的项使用 `direction`。没有排序项时返回空串。
    pub fn order(&self, items: &[Order], direction: &str, model: Option<&Model>) -> String {
        let mut pending: Vec<Order> = items.to_vec();
        pending.reverse();
        let mut result = Vec::new();

        while let Some(item) = pending.pop() {
            let (key, dir) = match item {
                Order::Expression(sql) => {
                    result.push(sql);
                    continue;
                }
                Order::Field(key) => (key, direction.to_string()),
                Order::Directed(key, dir) => (key, dir),
            };
            if key.trim().is_empty() {
                continue;
            }
            if key.contains(',') && !has_grouped_comma(&key) {
                for part in key.split(',').rev() {
                    pending.push(Order::Directed(part.trim().to_string(), dir.clone()));
                }
                continue;
            }

            let (key, dir) = match split_direction(&key) {
                Some((k, d)) => (k.trim().to_string(), d.to_string()),
                None => (key.trim().to_string(), dir),
            };
            if key.is_empty() {
                continue;
            }

            let mut key = match model.and_then(|m| m.virtual_field_sql(&key)) {
                Some(sql) => format!("({})", self.quote_fields(sql)),
                None => key,
            };
            if key.find('.').is_some_and(|at| at > 0) {
                key = self.quote_fields(&key);
            }
            if !key.contains(char::is_whitespace) && !key.contains('.') {
                key = self.name(&key);
            }
            result.push(format!("{key} {}", dir.trim()).trim_end().to_string());
        }

        if result.is_empty() {
            String::new()
        } else {
            format!(" ORDER BY {}", result.join(", "))
        }
    }

    /// GROUP BY 子句；虚拟字段替换为带括号的表达式。
    pub fn group(&self, items: &[String], model: Option<&Model>) -> String {
        let flavor = self.flavor();
        let fields: Vec<String> = items
            .iter()
            .flat_map(|f| split_top_level(f, flavor))
            .map(|f| match model.and_then(|m| m.virtual_field_sql(&f)) {
                Some(sql) => format!("({sql})"),
                None => f,
            })
            .collect();
        if fields.is_empty() {
            return String::new();
        }
        format!(" GROUP BY {}", self.quote_fields(&fields.join(", ")))
    }

    /// 聚合片段 `FUNC(<field>) AS <alias>`。
    ///
    /// `count` 默认 `COUNT(*) AS count`；其他函数的别名默认取字段的最后一段。
    pub fn calculate(&self, model: &Model, func: &str, params: &[&str]) -> String {
        let is_count = func.eq_ignore_ascii_case("count");
        let field = params.first().copied().unwrap_or("*");
        let alias = match params.get(1) {
            Some(alias) => alias.to_string(),
            None if is_count => "count".to_string(),
            None if field == "*" => func.to_ascii_lowercase(),
            None => field.rsplit('.').next().unwrap_or(field).to_string(),
        };

        let arg = match model.virtual_field_sql(field) {
            Some(sql) => self.quote_fields(sql),
            None => self.name(field),
        };
        format!(
            "{}({arg}) AS {}",
            func.to_ascii_uppercase(),
            self.name(&alias)
        )
    }
}
