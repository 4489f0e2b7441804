//! SQL 片段词法分析：把字段/条件文本切分为带类型的 token，供引号处理与拆分使用。
//!
//! 只做切分，不做语法校验；无法识别的字符作为单字符 `Operator` 输出。

use crate::flavor::Flavor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Whitespace,
    /// 裸标识符或关键字（含 `-`，如 `pt-br`）。
    Ident,
    /// 已加引号的标识符。
    QuotedIdent,
    Number,
    /// 字符串字面量（含引号）。
    Str,
    LParen,
    RParen,
    Comma,
    Dot,
    Operator,
    /// `{$__cakeID__$}` 这类占位符。
    Marker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub start: usize,
}

impl Token<'_> {
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    start_quote: char,
    end_quote: char,
}

impl<'a> Lexer<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat_while(&mut self, f: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !f(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn ident_tail(&mut self) {
        loop {
            self.eat_while(is_ident_continue);
            match (self.peek(), self.peek_at(1)) {
                (Some('-'), Some(next)) if is_ident_continue(next) => {
                    self.pos += 1;
                }
                _ => break,
            }
        }
    }

    fn quoted(&mut self, close: char, backslash: bool) {
        while let Some(c) = self.bump() {
            if backslash && c == '\\' {
                self.bump();
                continue;
            }
            if c == close {
                if self.peek() == Some(close) {
                    self.pos += close.len_utf8();
                    continue;
                }
                return;
            }
        }
    }

    fn number(&mut self) -> TokenKind {
        self.eat_while(|c| c.is_ascii_digit());
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
            self.eat_while(|c| c.is_ascii_digit());
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let signed = matches!(self.peek_at(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                self.pos += digit_at;
                self.eat_while(|c| c.is_ascii_digit());
            }
        }
        if self.peek().is_some_and(is_ident_continue) {
            self.ident_tail();
            return TokenKind::Ident;
        }
        TokenKind::Number
    }

    fn next_kind(&mut self, c: char) -> TokenKind {
        match c {
            c if c.is_whitespace() => {
                self.eat_while(char::is_whitespace);
                TokenKind::Whitespace
            }
            c if c == self.start_quote || c == '`' => {
                let close = if c == self.start_quote {
                    self.end_quote
                } else {
                    '`'
                };
                self.quoted(close, false);
                TokenKind::QuotedIdent
            }
            '\'' | '"' => {
                self.quoted(c, true);
                TokenKind::Str
            }
            c if c.is_ascii_digit() => self.number(),
            c if is_ident_start(c) => {
                self.ident_tail();
                TokenKind::Ident
            }
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '{' if self.peek() == Some('$') => {
                if let Some(end) = self.src[self.pos..].find('}') {
                    self.pos += end + 1;
                } else {
                    self.pos = self.src.len();
                }
                TokenKind::Marker
            }
            '-' if self.peek() == Some('>') => {
                self.pos += 1;
                if self.peek() == Some('>') {
                    self.pos += 1;
                }
                TokenKind::Operator
            }
            '<' | '>' | '=' | '!' => {
                self.eat_while(|c| matches!(c, '<' | '>' | '='));
                TokenKind::Operator
            }
            '|' | '&' | ':' => {
                if self.peek() == Some(c) {
                    self.pos += 1;
                }
                TokenKind::Operator
            }
            _ => TokenKind::Operator,
        }
    }
}

/// 按方言的引号规则切分 SQL 片段。
pub fn tokenize(input: &str, flavor: Flavor) -> Vec<Token<'_>> {
    let mut lexer = Lexer {
        src: input,
        pos: 0,
        start_quote: flavor.start_quote(),
        end_quote: flavor.end_quote(),
    };
    let mut tokens = Vec::new();

    while let Some(c) = lexer.bump() {
        let start = lexer.pos - c.len_utf8();
        let kind = lexer.next_kind(c);
        tokens.push(Token {
            kind,
            text: &input[start..lexer.pos],
            start,
        });
    }

    tokens
}

/// 在括号深度为 0 的逗号处拆分，丢弃空片段。
pub fn split_top_level(input: &str, flavor: Flavor) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut from = 0usize;

    for tok in tokenize(input, flavor) {
        match tok.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => depth = depth.saturating_sub(1),
            TokenKind::Comma if depth == 0 => {
                parts.push(input[from..tok.start].trim().to_string());
                from = tok.end();
            }
            _ => {}
        }
    }
    parts.push(input[from..].trim().to_string());
    parts.retain(|p| !p.is_empty());
    parts
}

/// 找到与 `open` 位置左括号匹配的右括号下标（token 下标）。
pub fn matching_paren(tokens: &[Token<'_>], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, tok) in tokens.iter().enumerate().skip(open) {
        match tok.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
