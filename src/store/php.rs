//! PHP array catalog encoding (`return ['key' => 'value'];`).
//!
//! Nested groups such as `'auth' => ['failed' => '...']` are flattened to
//! dotted keys (`auth.failed`) on load and rebuilt on save. Leading
//! `declare(...);` statements are skipped.

use crate::catalog::Catalog;

/// Encoded shape of one array entry
enum Node<'a> {
    Leaf(&'a str),
    Group(Vec<(&'a str, Node<'a>)>),
}

pub(crate) fn encode(catalog: &Catalog) -> String {
    let mut root = Vec::new();
    for (key, value) in catalog.iter() {
        let path: Vec<&str> = if nests(catalog, key) {
            key.split('.').collect()
        } else {
            vec![key]
        };
        insert_path(&mut root, &path, value);
    }

    let mut out = String::from("<?php\n\nreturn [\n");
    write_entries(&mut out, &root, 1);
    out.push_str("];\n");
    out
}

/// A dotted key is written as a nested group unless a segment is empty or
/// one of its prefixes is itself a key.
fn nests(catalog: &Catalog, key: &str) -> bool {
    key.contains('.')
        && key.split('.').all(|segment| !segment.is_empty())
        && key
            .match_indices('.')
            .all(|(i, _)| !catalog.contains_key(&key[..i]))
}

fn insert_path<'a>(nodes: &mut Vec<(&'a str, Node<'a>)>, path: &[&'a str], value: &'a str) {
    match path {
        [] => {}
        [name] => nodes.push((*name, Node::Leaf(value))),
        [head, rest @ ..] => {
            let existing = nodes
                .iter()
                .position(|(name, node)| name == head && matches!(node, Node::Group(_)));
            let index = match existing {
                Some(index) => index,
                None => {
                    nodes.push((*head, Node::Group(Vec::new())));
                    nodes.len() - 1
                }
            };
            if let Node::Group(children) = &mut nodes[index].1 {
                insert_path(children, rest, value);
            }
        }
    }
}

fn write_entries(out: &mut String, nodes: &[(&str, Node<'_>)], depth: usize) {
    let indent = "    ".repeat(depth);
    for (name, node) in nodes {
        out.push_str(&indent);
        out.push_str(&quote(name));
        out.push_str(" => ");
        match node {
            Node::Leaf(value) => out.push_str(&quote(value)),
            Node::Group(children) => {
                out.push_str("[\n");
                write_entries(out, children, depth + 1);
                out.push_str(&indent);
                out.push(']');
            }
        }
        out.push_str(",\n");
    }
}

/// Single-quoted PHP literal, as `var_export` writes it
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\\' || c == '\'' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

pub(crate) fn decode(source: &str) -> Result<Catalog, String> {
    let mut parser = Parser {
        chars: source.char_indices().peekable(),
        source,
    };
    parser.parse_file()
}

struct Parser<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    source: &'a str,
}

impl Parser<'_> {
    fn parse_file(&mut self) -> Result<Catalog, String> {
        self.skip_trivia();
        self.eat_keyword("<?php")?;
        self.skip_trivia();
        while self.at_keyword("declare") {
            self.skip_statement()?;
            self.skip_trivia();
        }
        self.eat_keyword("return")?;
        self.skip_trivia();

        let mut catalog = Catalog::new();
        self.parse_array("", &mut catalog)?;

        self.skip_trivia();
        if !self.eat_char(';') {
            return Err(self.error("expected ';' after array"));
        }
        Ok(catalog)
    }

    /// Entries of one array literal, keys prefixed with `prefix.` when nested
    fn parse_array(&mut self, prefix: &str, catalog: &mut Catalog) -> Result<(), String> {
        let close = self.open_array()?;
        loop {
            self.skip_trivia();
            if self.eat_char(close) {
                return Ok(());
            }
            let key = self.parse_string()?;
            let key = if prefix.is_empty() {
                key
            } else {
                format!("{}.{}", prefix, key)
            };
            self.skip_trivia();
            self.eat_keyword("=>")?;
            self.skip_trivia();
            if self.at("[") || self.at_keyword("array") {
                self.parse_array(&key, catalog)?;
            } else {
                let value = self.parse_string()?;
                catalog.insert(key, value);
            }
            self.skip_trivia();
            if self.eat_char(',') {
                continue;
            }
            self.skip_trivia();
            if self.eat_char(close) {
                return Ok(());
            }
            return Err(self.error("expected ',' or end of array"));
        }
    }

    /// Consumes `[` or `array(` and returns the matching closer
    fn open_array(&mut self) -> Result<char, String> {
        if self.eat_char('[') {
            return Ok(']');
        }
        self.eat_keyword("array")?;
        self.skip_trivia();
        if !self.eat_char('(') {
            return Err(self.error("expected '(' after array"));
        }
        Ok(')')
    }

    /// Everything up to and including the next `;`
    fn skip_statement(&mut self) -> Result<(), String> {
        for (_, c) in self.chars.by_ref() {
            if c == ';' {
                return Ok(());
            }
        }
        Err("unterminated statement before return".to_string())
    }

    fn parse_string(&mut self) -> Result<String, String> {
        match self.chars.next() {
            Some((_, '\'')) => self.parse_single_quoted(),
            Some((_, '"')) => self.parse_double_quoted(),
            Some((pos, c)) => Err(format!("expected string at byte {}, found '{}'", pos, c)),
            None => Err("unexpected end of file, expected string".to_string()),
        }
    }

    fn parse_single_quoted(&mut self) -> Result<String, String> {
        let mut out = String::new();
        while let Some((_, c)) = self.chars.next() {
            match c {
                '\'' => return Ok(out),
                '\\' => match self.chars.peek() {
                    Some(&(_, next)) if next == '\'' || next == '\\' => {
                        out.push(next);
                        self.chars.next();
                    }
                    _ => out.push('\\'),
                },
                _ => out.push(c),
            }
        }
        Err("unterminated string".to_string())
    }

    fn parse_double_quoted(&mut self) -> Result<String, String> {
        let mut out = String::new();
        while let Some((_, c)) = self.chars.next() {
            match c {
                '"' => return Ok(out),
                '\\' => {
                    let escaped = match self.chars.peek() {
                        Some(&(_, 'n')) => Some('\n'),
                        Some(&(_, 't')) => Some('\t'),
                        Some(&(_, 'r')) => Some('\r'),
                        Some(&(_, 'v')) => Some('\u{0B}'),
                        Some(&(_, 'f')) => Some('\u{0C}'),
                        Some(&(_, 'e')) => Some('\u{1B}'),
                        Some(&(_, '0')) => Some('\0'),
                        Some(&(_, '\\')) => Some('\\'),
                        Some(&(_, '"')) => Some('"'),
                        Some(&(_, '$')) => Some('$'),
                        _ => None,
                    };
                    match escaped {
                        Some(e) => {
                            out.push(e);
                            self.chars.next();
                        }
                        None => out.push('\\'),
                    }
                }
                _ => out.push(c),
            }
        }
        Err("unterminated string".to_string())
    }

    /// Whitespace and `//`, `#`, `/* */` comments
    fn skip_trivia(&mut self) {
        loop {
            if self.at("//") || self.at("#") {
                self.skip_line();
            } else if self.at("/*") {
                self.skip_block_comment();
            } else if matches!(self.chars.peek(), Some(&(_, c)) if c.is_whitespace()) {
                self.chars.next();
            } else {
                return;
            }
        }
    }

    fn skip_line(&mut self) {
        for (_, c) in self.chars.by_ref() {
            if c == '\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self) {
        self.chars.next();
        self.chars.next();
        while self.chars.peek().is_some() {
            if self.at("*/") {
                self.chars.next();
                self.chars.next();
                return;
            }
            self.chars.next();
        }
    }

    fn at(&mut self, s: &str) -> bool {
        match self.chars.peek() {
            Some(&(start, _)) => self.source[start..].starts_with(s),
            None => false,
        }
    }

    fn eat_char(&mut self, expected: char) -> bool {
        if matches!(self.chars.peek(), Some(&(_, c)) if c == expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    /// Case-insensitive lookahead
    fn at_keyword(&mut self, keyword: &str) -> bool {
        match self.chars.peek() {
            Some(&(start, _)) => self.source[start..]
                .get(..keyword.len())
                .is_some_and(|s| s.eq_ignore_ascii_case(keyword)),
            None => false,
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> Result<(), String> {
        if !self.at_keyword(keyword) {
            return Err(self.error(&format!("expected '{}'", keyword)));
        }
        for _ in keyword.chars() {
            self.chars.next();
        }
        Ok(())
    }

    fn error(&mut self, message: &str) -> String {
        match self.chars.peek() {
            Some(&(pos, _)) => format!("{} at byte {}", message, pos),
            None => format!("{} at end of file", message),
        }
    }
}
