//! 标识符引号处理：`name()` 处理单个标识符表达式，`quote_fields()` 处理自由 SQL 片段。

use crate::datasource::DboSource;
use crate::lexer::{TokenKind, matching_paren, tokenize};
use crate::method_cache::CachedValue;

/// `[\w-]+`，且不以数字开头。
pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

/// `Model.field` 形式（两段及以上，每段都是标识符）。
pub(crate) fn is_qualified(s: &str) -> bool {
    let mut parts = s.split('.');
    let first = parts.next().is_some_and(is_identifier);
    let mut rest = 0usize;
    for part in parts {
        if !is_word(part) {
            return false;
        }
        rest += 1;
    }
    first && rest > 0
}

/// `DISTINCT <expr>` 中的 `<expr>`，关键字不区分大小写。
fn strip_distinct(data: &str) -> Option<&str> {
    let (head, rest) = data.split_once(char::is_whitespace)?;
    let rest = rest.trim();
    (head.eq_ignore_ascii_case("DISTINCT") && !rest.is_empty()).then_some(rest)
}

impl DboSource {
    /// 为标识符表达式加引号，结果会被方法缓存记忆。
    ///
    /// 支持 `field`、`Model.field`、`Model.*`、`FN(args)`、`expr AS alias`、
    /// `Model.field alias`；已加引号的输入原样返回，因此 `name(name(x)) == name(x)`。
    pub fn name(&self, data: &str) -> String {
        self.cache_method("name", data, || {
            CachedValue::Text(self.quote_identifier(data))
        })
        .into_text()
    }

    pub fn name_all<S: AsRef<str>>(&self, data: &[S]) -> Vec<String> {
        data.iter().map(|s| self.name(s.as_ref())).collect()
    }

    fn quote_identifier(&self, data: &str) -> String {
        let flavor = self.flavor();
        let start = flavor.start_quote();
        let data = data.trim();

        if data.is_empty() || data == "*" || data.starts_with(start) {
            return data.to_string();
        }
        if is_word(data) {
            return flavor.quote(data);
        }
        if let Some(rest) = strip_distinct(data) {
            return format!("DISTINCT {}", self.name(rest));
        }

        if let Some((head, rest)) = data.split_once('.')
            && is_word(head)
        {
            if rest == "*" {
                return format!("{}.*", flavor.quote(head));
            }
            let plain = !rest.is_empty()
                && !rest.contains(|c: char| {
                    c.is_whitespace()
                        || matches!(c, '*' | '(' | ')' | '\'' | ',')
                        || (c == '"' && start != '"')
                });
            if plain {
                return data
                    .split('.')
                    .map(|part| {
                        if part.starts_with(start) {
                            part.to_string()
                        } else {
                            flavor.quote(part)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(".");
            }
        }

        if let Some(call) = self.quote_call(data) {
            return call;
        }

        if let Some((expr, alias)) = self.split_alias(data) {
            return format!("{} AS {}", self.name(expr), self.name(alias));
        }

        if data
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == ' ')
        {
            return flavor.quote(data);
        }

        data.to_string()
    }

    /// `FN(args)`：函数名保留，参数为函数调用时递归，否则只给限定名加引号。
    fn quote_call(&self, data: &str) -> Option<String> {
        let tokens: Vec<_> = tokenize(data, self.flavor());
        let first = tokens.first()?;
        let open = tokens.get(1)?;
        if first.kind != TokenKind::Ident || open.kind != TokenKind::LParen {
            return None;
        }
        let close = matching_paren(&tokens, 1)?;
        if close != tokens.len() - 1 {
            return None;
        }

        let inner = data[open.end()..tokens[close].start].trim();
        let args = if inner.is_empty() {
            String::new()
        } else if let Some(nested) = self.quote_call(inner) {
            nested
        } else if is_identifier(inner) {
            self.flavor().quote(inner)
        } else {
            self.quote_fields(inner)
        };
        Some(format!("{}({})", first.text, args))
    }

    /// 拆分 `expr AS alias` 或 `Model.field alias`（无 AS 时要求左侧为限定名或函数调用）。
    fn split_alias<'a>(&self, data: &'a str) -> Option<(&'a str, &'a str)> {
        let tokens = tokenize(data, self.flavor());
        let mut depth = 0usize;
        let mut as_at = None;
        for (i, tok) in tokens.iter().enumerate() {
            match tok.kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => depth = depth.saturating_sub(1),
                TokenKind::Ident if depth == 0 && tok.text.eq_ignore_ascii_case("as") => {
                    let spaced = i > 0
                        && tokens[i - 1].kind == TokenKind::Whitespace
                        && tokens
                            .get(i + 1)
                            .is_some_and(|t| t.kind == TokenKind::Whitespace);
                    if spaced {
                        as_at = Some(i);
                    }
                }
                _ => {}
            }
        }

        let alias_ok = |alias: &str| {
            is_identifier(alias) || alias.starts_with(self.flavor().start_quote())
        };

        if let Some(i) = as_at {
            let expr = data[..tokens[i].start].trim();
            let alias = data[tokens[i].end()..].trim();
            if !expr.is_empty() && alias_ok(alias) {
                return Some((expr, alias));
            }
            return None;
        }

        let last = tokens.last()?;
        let before = tokens.len().checked_sub(2).map(|i| tokens[i])?;
        if last.kind != TokenKind::Ident || before.kind != TokenKind::Whitespace {
            return None;
        }
        let expr = data[..before.start].trim();
        if is_qualified(expr) || self.quote_call(expr).is_some() {
            return Some((expr, last.text));
        }
        None
    }

    /// 在自由 SQL 片段中给限定名（`Model.field`、`Model.*`）、JSON 箭头前的字段
    /// 以及 `<已引号表达式> AS alias` 的别名加引号；字符串、数字与关键字保持不变。
    pub fn quote_fields(&self, fragment: &str) -> String {
        let flavor = self.flavor();
        let tokens = tokenize(fragment, flavor);
        let mut out = String::with_capacity(fragment.len() + 8);
        // 最近两个非空白 token 的类型与文本，用于识别 `<quoted> AS alias`。
        let mut prev: Option<(TokenKind, &str)> = None;
        let mut prev2: Option<(TokenKind, &str)> = None;
        let mut i = 0usize;

        let next_significant = |from: usize| {
            tokens[from..]
                .iter()
                .find(|t| t.kind != TokenKind::Whitespace)
                .copied()
        };

        while i < tokens.len() {
            let tok = tokens[i];
            let mut emitted_kind = tok.kind;

            match tok.kind {
                TokenKind::Ident | TokenKind::QuotedIdent => {
                    let mut j = i;
                    let mut parts = vec![tok];
                    while let (Some(dot), Some(part)) = (tokens.get(j + 1), tokens.get(j + 2)) {
                        let part_ok = matches!(part.kind, TokenKind::Ident | TokenKind::QuotedIdent)
                            || (part.kind == TokenKind::Operator && part.text == "*");
                        if dot.kind != TokenKind::Dot || !part_ok {
                            break;
                        }
                        parts.push(*part);
                        j += 2;
                    }
                    let is_call = tokens
                        .get(j + 1)
                        .is_some_and(|t| t.kind == TokenKind::LParen);

                    if parts.len() > 1 && !is_call {
                        let quoted: Vec<String> = parts
                            .iter()
                            .map(|p| match p.kind {
                                TokenKind::Ident => flavor.quote(p.text),
                                _ => p.text.to_string(),
                            })
                            .collect();
                        out.push_str(&quoted.join("."));
                        emitted_kind = TokenKind::QuotedIdent;
                        i = j + 1;
                    } else if tok.kind == TokenKind::Ident
                        && next_significant(i + 1)
                            .is_some_and(|t| t.kind == TokenKind::Operator && t.text.starts_with("->"))
                    {
                        out.push_str(&flavor.quote(tok.text));
                        emitted_kind = TokenKind::QuotedIdent;
                        i += 1;
                    } else if tok.kind == TokenKind::Ident
                        && is_identifier(tok.text)
                        && prev.is_some_and(|(k, t)| k == TokenKind::Ident && t.eq_ignore_ascii_case("as"))
                        && prev2.is_some_and(|(k, _)| matches!(k, TokenKind::QuotedIdent | TokenKind::RParen))
                    {
                        out.push_str(&flavor.quote(tok.text));
                        emitted_kind = TokenKind::QuotedIdent;
                        i += 1;
                    } else {
                        out.push_str(tok.text);
                        i += 1;
                    }
                }
                _ => {
                    out.push_str(tok.text);
                    i += 1;
                }
            }

            if emitted_kind != TokenKind::Whitespace {
                prev2 = prev;
                prev = Some((emitted_kind, tok.text));
            }
        }

        out
    }
}
