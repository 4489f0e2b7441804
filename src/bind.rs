//! 条件键里的占位符绑定：`?` 按顺序、`:N` 按下标替换为已格式化的值。
//!
//! 基于 [`tokenize`] 的 token 流，字符串与带引号的标识符中的占位符保持原样；
//! `::` 类型转换不会被当作命名占位符。

use crate::flavor::Flavor;
use crate::lexer::{Token, TokenKind, tokenize};

enum Placeholder {
    Question,
    Named(usize),
}

/// 引号之外的占位符及其在原文中的字节区间。
fn placeholders(template: &str, flavor: Flavor) -> Vec<(Placeholder, usize, usize)> {
    let tokens = tokenize(template, flavor);
    let mut out = Vec::new();

    for (i, tok) in tokens.iter().enumerate() {
        if tok.kind != TokenKind::Operator {
            continue;
        }
        match tok.text {
            "?" => out.push((Placeholder::Question, tok.start, tok.end())),
            ":" => {
                if let Some((n, end)) = named_index(tok, tokens.get(i + 1)) {
                    out.push((Placeholder::Named(n), tok.start, end));
                }
            }
            _ => {}
        }
    }
    out
}

/// `:` 之后紧跟的整数构成 `:N`。
fn named_index(colon: &Token<'_>, next: Option<&Token<'_>>) -> Option<(usize, usize)> {
    let next = next.filter(|t| t.kind == TokenKind::Number && t.start == colon.end())?;
    let n = next.text.parse().ok()?;
    Some((n, next.end()))
}

/// 统计引号外的占位符数量：`(问号个数, 不同的 :N 个数)`。
pub fn count_placeholders(template: &str, flavor: Flavor) -> (usize, usize) {
    let mut questions = 0usize;
    let mut named: Vec<usize> = Vec::new();
    for (ph, _, _) in placeholders(template, flavor) {
        match ph {
            Placeholder::Question => questions += 1,
            Placeholder::Named(n) => {
                if !named.contains(&n) {
                    named.push(n);
                }
            }
        }
    }
    (questions, named.len())
}

/// 用 `values` 替换占位符；缺少的值保留原占位符。
pub fn bind_placeholders(template: &str, values: &[String], flavor: Flavor) -> String {
    let mut out = String::with_capacity(template.len() + values.len() * 8);
    let mut next = 0usize;
    let mut from = 0usize;

    for (ph, start, end) in placeholders(template, flavor) {
        out.push_str(&template[from..start]);
        let value = match ph {
            Placeholder::Question => {
                next += 1;
                values.get(next - 1)
            }
            Placeholder::Named(n) => values.get(n),
        };
        out.push_str(value.map_or(&template[start..end], String::as_str));
        from = end;
    }
    out.push_str(&template[from..]);
    out
}
