// Custom filter expressions over task records.
//
// A small lexer and recursive-descent parser for boolean expressions with
// implicit AND, explicit OR (|), NOT (-) and parentheses:
//
//   A B       -> A AND B
//   A | B     -> A OR B
//   -A        -> NOT A
//   (A | B) C -> (A OR B) AND C
//   "foo bar" -> exact phrase
//
// Terms are evaluated by `matches_primitive`: #tag, !priority, date fields
// (due:<2024-05-01, start:>=today, done:2024-01-02), is:/status: filters,
// path:, section: and plain substring search.

use crate::model::item::{DateKind, Priority, Status, TaskRecord};
use crate::model::status::{StatusOrder, classify};
use chrono::{NaiveDate, TimeDelta};
use std::cmp::Ordering;
use std::str::FromStr;

#[derive(Debug, Clone)]
enum Expr {
    Term(String),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    fn matches(&self, task: &TaskRecord, today: NaiveDate) -> bool {
        match self {
            Expr::Term(s) => s.is_empty() || task.matches_primitive(s, today),
            Expr::And(a, b) => a.matches(task, today) && b.matches(task, today),
            Expr::Or(a, b) => a.matches(task, today) || b.matches(task, today),
            Expr::Not(a) => !a.matches(task, today),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
enum Token {
    Text(String),
    Or,
    LParen,
    RParen,
    Not,
}

fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                tokens.push(Token::LParen);
                chars.next();
            }
            ')' => {
                tokens.push(Token::RParen);
                chars.next();
            }
            '|' => {
                tokens.push(Token::Or);
                chars.next();
            }
            '-' => {
                chars.next();
                // Only an attached dash negates; a lone one is text.
                match chars.peek() {
                    Some(&n) if n == '(' || !(n.is_whitespace() || n == ')' || n == '|') => {
                        tokens.push(Token::Not)
                    }
                    _ => tokens.push(Token::Text("-".to_string())),
                }
            }
            _ => {
                let mut term = String::new();
                let mut in_quote = false;
                let mut escaped = false;
                while let Some(&c) = chars.peek() {
                    if escaped {
                        term.push(c);
                        escaped = false;
                    } else if c == '\\' {
                        escaped = true;
                    } else if c == '"' {
                        in_quote = !in_quote;
                        term.push(c);
                    } else if !in_quote && (c.is_whitespace() || matches!(c, '(' | ')' | '|')) {
                        break;
                    } else {
                        term.push(c);
                    }
                    chars.next();
                }
                if escaped {
                    term.push('\\');
                }
                if !term.is_empty() {
                    tokens.push(Token::Text(term));
                }
            }
        }
    }
    tokens
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn parse(&mut self) -> Expr {
        if self.tokens.is_empty() {
            return Expr::Term(String::new());
        }
        self.parse_or()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn parse_or(&mut self) -> Expr {
        let mut left = self.parse_and();
        while let Some(Token::Or) = self.peek() {
            self.advance();
            let right = self.parse_and();
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        left
    }

    fn parse_and(&mut self) -> Expr {
        let mut left = self.parse_unary();
        while let Some(token) = self.peek() {
            if matches!(token, Token::Or | Token::RParen) {
                break;
            }
            let right = self.parse_unary();
            left = Expr::And(Box::new(left), Box::new(right));
        }
        left
    }

    fn parse_unary(&mut self) -> Expr {
        if let Some(Token::Not) = self.peek() {
            self.advance();
            return Expr::Not(Box::new(self.parse_primary()));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Expr {
        match self.peek().cloned() {
            Some(Token::LParen) => {
                self.advance();
                let expr = self.parse_or();
                if let Some(Token::RParen) = self.peek() {
                    self.advance();
                }
                expr
            }
            Some(Token::Text(t)) => {
                self.advance();
                Expr::Term(t)
            }
            _ => {
                // Stray ')' or a dangling operator: skip it so parsing always advances.
                self.advance();
                Expr::Term(String::new())
            }
        }
    }
}

fn split_op(s: &str) -> (&'static str, &str) {
    for op in ["<=", ">=", "<", ">"] {
        if let Some(rest) = s.strip_prefix(op) {
            return (op, rest);
        }
    }
    ("=", s)
}

fn apply_op<T: Ord>(op: &str, value: T, target: T) -> bool {
    let ord = value.cmp(&target);
    match op {
        "<" => ord == Ordering::Less,
        ">" => ord == Ordering::Greater,
        "<=" => ord != Ordering::Greater,
        ">=" => ord != Ordering::Less,
        _ => ord == Ordering::Equal,
    }
}

fn resolve_date(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    match s {
        "today" => return Some(today),
        "tomorrow" => return today.succ_opt(),
        "yesterday" => return today.pred_opt(),
        _ => {}
    }
    if let Some(d) = crate::model::parser::parse_date(s) {
        return Some(d);
    }
    let days = if let Some(n) = s.strip_suffix('d') {
        n.parse::<i64>().ok()
    } else if let Some(n) = s.strip_suffix('w') {
        n.parse::<i64>().ok().and_then(|w| w.checked_mul(7))
    } else {
        None
    };
    today.checked_add_signed(TimeDelta::try_days(days?)?)
}

impl TaskRecord {
    /// Evaluates a filter expression; relative dates resolve against `today`.
    pub fn matches_query_on(&self, query: &str, today: NaiveDate) -> bool {
        if query.trim().is_empty() {
            return true;
        }
        let mut parser = Parser::new(tokenize(query));
        parser.parse().matches(self, today)
    }

    fn matches_primitive(&self, part: &str, today: NaiveDate) -> bool {
        let part = part.trim();
        let unquoted = if part.len() >= 2 && part.starts_with('"') && part.ends_with('"') {
            &part[1..part.len() - 1]
        } else {
            part
        };
        let lower = unquoted.to_lowercase();

        // --- Tag ---
        if let Some(tag) = lower.strip_prefix('#')
            && !tag.is_empty()
        {
            return self
                .tags
                .iter()
                .any(|t| t.trim_start_matches('#').to_lowercase().contains(tag));
        }

        // --- Priority (!high, !<=medium, !none) ---
        if let Some(rest) = lower.strip_prefix('!') {
            let (op, name) = split_op(rest);
            if name == "none" {
                return match op {
                    "=" => self.priority.is_none(),
                    _ => apply_op(op, Priority::rank(self.priority), Priority::rank(None)),
                };
            }
            if let Ok(target) = Priority::from_str(name) {
                // Lower rank is more urgent, so "<" reads as "more urgent than".
                return apply_op(op, Priority::rank(self.priority), Priority::rank(Some(target)));
            }
        }

        // --- Date fields (due:<today, start:>=2024-01-01, done:2024-05-02!) ---
        if let Some((field, value)) = lower.split_once(':')
            && let Ok(kind) = DateKind::from_str(field)
        {
            let (value, include_none) = match value.strip_suffix('!') {
                Some(v) => (v, true),
                None => (value, false),
            };
            let (op, date_str) = split_op(value);
            if let Some(target) = resolve_date(date_str, today) {
                return match self.date(kind) {
                    Some(d) => apply_op(op, d, target),
                    None => include_none,
                };
            }
        }

        // --- Status ---
        if let Some(name) = lower
            .strip_prefix("is:")
            .or_else(|| lower.strip_prefix("status:"))
        {
            match name {
                "done" | "completed" => return self.completed,
                "open" | "active" => return !self.completed,
                "dated" => return self.has_dates(),
                "undated" => return !self.has_dates(),
                "recurring" => return self.recurrence.is_some(),
                _ => {
                    if let Ok(status) = Status::from_str(name) {
                        return classify(self, today, &StatusOrder::default()) == status;
                    }
                }
            }
        }

        if let Some(p) = lower.strip_prefix("path:") {
            return self.path.to_lowercase().contains(p);
        }
        if let Some(h) = lower.strip_prefix("section:") {
            return self
                .section
                .as_ref()
                .is_some_and(|s| s.heading.to_lowercase().contains(h));
        }

        // --- Fallback: text ---
        self.display_text.to_lowercase().contains(&lower)
            || self.path.to_lowercase().contains(&lower)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&lower))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_operators() {
        let tokens = tokenize("-(a | \"b c\") d");
        assert_eq!(
            tokens,
            vec![
                Token::Not,
                Token::LParen,
                Token::Text("a".to_string()),
                Token::Or,
                Token::Text("\"b c\"".to_string()),
                Token::RParen,
                Token::Text("d".to_string()),
            ]
        );
    }

    #[test]
    fn test_stray_paren_does_not_hang() {
        let mut parser = Parser::new(tokenize(") a"));
        let _ = parser.parse();
    }

    #[test]
    fn test_resolve_relative_dates() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(resolve_date("today", today), Some(today));
        assert_eq!(
            resolve_date("2w", today),
            NaiveDate::from_ymd_opt(2024, 1, 29)
        );
        assert_eq!(resolve_date("soon", today), None);
    }

    #[test]
    fn test_resolve_out_of_range_offsets() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(resolve_date("1000000000d", today), None);
        assert_eq!(resolve_date("-1000000000d", today), None);
        assert_eq!(resolve_date("9223372036854775807w", today), None);
        assert_eq!(resolve_date("tomorrow", NaiveDate::MAX), None);
    }
}
