//! 条件编译：把 [`Expr`] 编译为 WHERE/HAVING/ON 子句文本。
//!
//! 规则要点：
//! - 映射/列表的成员以 AND 连接；布尔键的多成员组渲染为 `((a) OR (b))`，
//!   `NOT` 组渲染为 `(NOT (a) AND NOT (b))`，单成员组不加括号（`NOT` 除外）。
//! - 值为列表时生成 `IN (...)`/`NOT IN (...)`；单元素且无运算符时生成 `field = (v)`；
//!   空列表与 NULL 生成 `IS NULL`/`IS NOT NULL`。
//! - 键中的 `?`/`:N` 占位符个数与值列表长度一致时按位置代入。

use crate::bind::{bind_placeholders, count_placeholders};
use crate::datasource::DboSource;
use crate::expr::{Expr, Operand};
use crate::lexer::{TokenKind, tokenize};
use crate::model::Model;
use crate::value::SqlValue;

const BOOLEAN_KEYS: [&str; 8] = ["and", "or", "not", "and not", "or not", "xor", "||", "&&"];
const WORD_OPERATORS: [&str; 10] = [
    "like",
    "ilike",
    "rlike",
    "or",
    "not",
    "in",
    "between",
    "regexp",
    "similar to",
    "is",
];
const CLAUSE_PREFIXES: [&str; 4] = ["where ", "group by ", "having ", "order by "];

fn is_boolean_key(key: &str) -> bool {
    let k = key.trim().to_ascii_lowercase();
    BOOLEAN_KEYS.contains(&k.as_str())
}

/// 运算符是否可识别：以关键字运算符或比较符号开头。
fn is_known_operator(op: &str) -> bool {
    let op = op.trim();
    if op.starts_with(['<', '>', '=', '!']) {
        return true;
    }
    let lower = op.to_ascii_lowercase();
    WORD_OPERATORS.iter().any(|w| {
        lower == *w
            || lower
                .strip_prefix(w)
                .is_some_and(|rest| rest.starts_with(char::is_whitespace))
    })
}

/// 单元素列表是否应走 `field = (v)` 形式：键不以 NOT、IN、!=、<> 结尾。
fn is_plain_membership_key(key: &str) -> bool {
    let upper = key.trim_end().to_ascii_uppercase();
    let Some((_, last)) = upper.rsplit_once(char::is_whitespace) else {
        return true;
    };
    !matches!(last, "NOT" | "IN" | "!=" | "<>")
}

fn starts_with_clause(sql: &str) -> bool {
    let lower = sql.trim_start().to_ascii_lowercase();
    CLAUSE_PREFIXES.iter().any(|p| lower.starts_with(p))
}

enum Formatted {
    Single(String),
    List(Vec<String>),
}

/// 一次编译过程的上下文。
struct Compiler<'a> {
    db: &'a DboSource,
    quote: bool,
    model: Option<&'a Model>,
}

impl Compiler<'_> {
    fn raw(&self, sql: &str) -> String {
        if self.quote {
            self.db.quote_fields(sql)
        } else {
            sql.to_string()
        }
    }

    fn field(&self, field: &str) -> String {
        if !self.quote {
            return field.to_string();
        }
        let complex = field.contains(['(', ')', '|']) || field.contains("->");
        if complex || field.contains(char::is_whitespace) {
            self.db.quote_fields(field)
        } else {
            self.db.name(field)
        }
    }

    /// 编译成员列表（尚未用 AND 连接）。
    fn members(&self, expr: &Expr) -> Vec<String> {
        match expr {
            Expr::Bool(true) => vec!["1 = 1".to_string()],
            Expr::Bool(false) => vec!["0 = 1".to_string()],
            Expr::Raw(sql) => {
                let sql = sql.trim();
                if sql.is_empty() {
                    Vec::new()
                } else {
                    vec![self.raw(sql)]
                }
            }
            Expr::List(items) => items.iter().filter_map(|item| self.member(item)).collect(),
            Expr::Map(entries) => entries
                .iter()
                .filter_map(|(key, value)| self.entry(key, value))
                .collect(),
        }
    }

    /// 列表中的单个元素：嵌套列表/映射视为隐式 AND 组。
    fn member(&self, item: &Expr) -> Option<String> {
        match item {
            Expr::Bool(_) | Expr::Raw(_) => self.members(item).into_iter().next(),
            Expr::List(_) | Expr::Map(_) => self.group("AND", self.members(item)),
        }
    }

    fn group(&self, key: &str, members: Vec<String>) -> Option<String> {
        let keyword = key.trim().to_ascii_uppercase();
        let negated = keyword.contains("NOT");
        let connector = if keyword == "NOT" {
            "AND NOT".to_string()
        } else {
            keyword
        };

        match members.len() {
            0 => None,
            1 if negated => Some(format!("NOT ({})", members[0])),
            1 => members.into_iter().next(),
            _ => {
                let not = if negated { "NOT " } else { "" };
                Some(format!(
                    "({not}({}))",
                    members.join(&format!(") {connector} ("))
                ))
            }
        }
    }

    fn entry(&self, key: &str, value: &Operand) -> Option<String> {
        if is_boolean_key(key) {
            let members = match value {
                Operand::Group(expr) => self.members(expr),
                Operand::Value(SqlValue::String(sql)) => vec![self.raw(sql)],
                Operand::Value(other) => vec![self.db.value(other, None)],
                Operand::Values(items) => items
                    .iter()
                    .map(|v| match v {
                        SqlValue::String(sql) => self.raw(sql),
                        other => self.db.value(other, None),
                    })
                    .collect(),
            };
            return self.group(key, members);
        }

        match value {
            Operand::Group(expr) => {
                let members = self.members(expr);
                match members.len() {
                    0 => None,
                    1 => members.into_iter().next(),
                    _ => Some(format!("({})", members.join(") AND ("))),
                }
            }
            Operand::Values(items) if !items.is_empty() => {
                let (questions, named) = count_placeholders(key, self.db.flavor());
                let bound = questions == items.len() || named == items.len();
                if !bound && items.len() == 1 && is_plain_membership_key(key) {
                    return Some(self.single_membership(key, &items[0]));
                }
                Some(self.parse_key(key, value))
            }
            _ => Some(self.parse_key(key, value)),
        }
    }

    /// `field = (v)`：单元素列表保持括号形式，便于之后替换为多值。
    fn single_membership(&self, key: &str, item: &SqlValue) -> String {
        let field = key.trim();
        let field = field.strip_suffix('=').map(str::trim_end).unwrap_or(field);
        let ty = self.model.and_then(|m| m.column_type(field));
        let value = self
            .db
            .values(std::slice::from_ref(item), ty)
            .join(", ");
        match self.model.and_then(|m| m.virtual_field_sql(field)) {
            Some(sql) => format!("({}) = ({value})", self.raw(sql)),
            None => format!("{} = ({value})", self.field(field)),
        }
    }

    /// 拆分键中的字段与运算符：先按第一个顶层空白或比较符号，运算符无法识别时改按最后一个空白。
    fn split_key<'k>(&self, key: &'k str) -> (&'k str, &'k str) {
        let key = key.trim();
        let tokens = tokenize(key, self.db.flavor());
        let mut depth = 0usize;
        let mut split = None;
        let mut last_space = None;

        for tok in &tokens {
            match tok.kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => depth = depth.saturating_sub(1),
                TokenKind::Whitespace if depth == 0 => {
                    if split.is_none() {
                        split = Some(tok.start);
                    }
                    last_space = Some(tok.start);
                }
                TokenKind::Operator
                    if depth == 0
                        && split.is_none()
                        && tok.text.chars().all(|c| matches!(c, '<' | '>' | '=' | '!')) =>
                {
                    split = Some(tok.start);
                }
                _ => {}
            }
        }

        let Some(at) = split else {
            return (key, "");
        };
        let (field, op) = (key[..at].trim(), key[at..].trim());
        if !is_known_operator(op)
            && op.contains(char::is_whitespace)
            && let Some(last) = last_space
            && last > at
        {
            return (key[..last].trim(), key[last..].trim());
        }
        (field, op)
    }

    fn parse_key(&self, key: &str, value: &Operand) -> String {
        let (questions, named) = count_placeholders(key, self.db.flavor());
        let bound = questions > 0 || (matches!(value, Operand::Values(_)) && named > 0);
        let (field, operator) = self.split_key(key);

        if operator.eq_ignore_ascii_case("not") {
            let inner = Expr::Map(vec![(field.to_string(), value.clone())]);
            return self
                .group("NOT", self.members(&inner))
                .unwrap_or_else(|| "1 = 1".to_string());
        }

        let virtual_sql = self.model.and_then(|m| m.virtual_field_sql(field));
        let ty = self.model.and_then(|m| m.column_type(field));
        let is_null = matches!(value, Operand::Value(SqlValue::Null))
            || matches!(value, Operand::Values(items) if items.is_empty());

        let formatted = match value {
            Operand::Value(v) => Formatted::Single(self.db.value(v, ty)),
            Operand::Values(items) if items.is_empty() => Formatted::Single("NULL".to_string()),
            Operand::Values(items) => Formatted::List(self.db.values(items, ty)),
            Operand::Group(expr) => {
                let members = self.members(expr);
                Formatted::Single(format!("({})", members.join(" AND ")))
            }
        };

        let rendered_field = match virtual_sql {
            Some(sql) => format!("({})", self.raw(sql)),
            None => self.field(field),
        };

        if bound {
            let values = match formatted {
                Formatted::Single(v) => vec![v],
                Formatted::List(items) => items,
            };
            let template = format!("{rendered_field} {operator}");
            return bind_placeholders(template.trim_end(), &values, self.db.flavor());
        }

        let mut operator = operator.to_string();
        if !is_known_operator(&operator) {
            let implicit = if matches!(formatted, Formatted::List(_)) {
                "IN"
            } else {
                "="
            };
            if !operator.is_empty() {
                tracing::warn!(key, operator = %operator, "unrecognized condition operator");
            }
            operator = format!("{operator} {implicit}").trim().to_string();
        }

        let upper = operator.to_ascii_uppercase();
        let value = match formatted {
            Formatted::List(items) if items.len() == 2 && upper.ends_with("BETWEEN") => {
                return format!("{rendered_field} {operator} {} AND {}", items[0], items[1]);
            }
            Formatted::List(items) => {
                match upper.as_str() {
                    "=" => operator = "IN".to_string(),
                    "!=" | "<>" => operator = "NOT IN".to_string(),
                    _ => {}
                }
                format!("({})", items.join(", "))
            }
            Formatted::Single(v) => {
                if is_null || v == "NULL" {
                    match upper.as_str() {
                        "=" | "IN" => operator = "IS".to_string(),
                        "!=" | "<>" | "NOT IN" => operator = "IS NOT".to_string(),
                        _ => {}
                    }
                }
                v
            }
        };

        format!("{rendered_field} {operator} {value}")
    }
}

impl DboSource {
    /// 编译条件。`quote` 控制是否给标识符加引号；`clause` 为真时加 `" WHERE "` 前缀。
    ///
    /// `true`、空表达式编译为 `1 = 1`，`false` 编译为 `0 = 1`。
    pub fn conditions(
        &self,
        expr: &Expr,
        quote: bool,
        clause: bool,
        model: Option<&Model>,
    ) -> String {
        self.compile_with_prefix(expr, quote, if clause { " WHERE " } else { "" }, model)
    }

    /// HAVING 子句；条件为空时返回空串。
    pub fn having(&self, expr: Option<&Expr>, quote: bool, model: Option<&Model>) -> String {
        match expr {
            Some(e) if !e.is_empty() => self.compile_with_prefix(e, quote, " HAVING ", model),
            _ => String::new(),
        }
    }

    /// 编译为成员列表（未连接），空组被丢弃。
    pub fn condition_keys_to_string(
        &self,
        expr: &Expr,
        quote: bool,
        model: Option<&Model>,
    ) -> Vec<String> {
        Compiler {
            db: self,
            quote,
            model,
        }
        .members(expr)
    }

    fn compile_with_prefix(
        &self,
        expr: &Expr,
        quote: bool,
        prefix: &str,
        model: Option<&Model>,
    ) -> String {
        if let Expr::Raw(sql) = expr
            && starts_with_clause(sql)
        {
            let sql = sql.trim();
            return if quote {
                format!(" {}", self.quote_fields(sql))
            } else {
                format!(" {sql}")
            };
        }

        let members = self.condition_keys_to_string(expr, quote, model);
        if members.is_empty() {
            return format!("{prefix}1 = 1");
        }
        format!("{prefix}{}", members.join(" AND "))
    }
}
