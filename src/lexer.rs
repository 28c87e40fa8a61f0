// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::error::{ParseError, Position};
use crate::*;

use core::cmp;
use core::fmt::{self, Debug, Formatter};
use core::iter::Peekable;
use core::str::CharIndices;

use anyhow::{bail, Result};

#[derive(Clone)]
struct SourceInternal {
    pub file: String,
    pub contents: String,
    pub lines: Vec<(u32, u32)>,
}

/// Mapping or field text together with its name and line table.
#[derive(Clone)]
pub struct Source {
    src: Rc<SourceInternal>,
}

impl cmp::PartialEq for Source {
    fn eq(&self, other: &Source) -> bool {
        Rc::as_ptr(&self.src) == Rc::as_ptr(&other.src)
    }
}

impl cmp::Eq for Source {}

impl Debug for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        self.src.file.fmt(f)
    }
}

impl Source {
    pub fn from_contents(file: String, contents: String) -> Result<Source> {
        let max_size = u32::MAX as usize - 2; // Account for rows, cols possibly starting at 1, EOF etc.
        if contents.len() > max_size {
            bail!("{file} exceeds maximum allowed mapping size {max_size}");
        }
        let mut lines = vec![];
        let mut prev_ch = ' ';
        let mut prev_pos = 0u32;
        let mut start = 0u32;
        for (i, ch) in contents.char_indices() {
            if ch == '\n' {
                let end = match prev_ch {
                    '\r' => prev_pos,
                    _ => i as u32,
                };
                lines.push((start, end));
                start = i as u32 + 1;
            }
            prev_ch = ch;
            prev_pos = i as u32;
        }

        if (start as usize) < contents.len() || contents.is_empty() {
            lines.push((start, contents.len() as u32));
        } else {
            let s = contents.len() as u32;
            lines.push((s, s));
        }
        Ok(Self {
            src: Rc::new(SourceInternal {
                file,
                contents,
                lines,
            }),
        })
    }

    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Source> {
        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => bail!("Failed to read {}. {e}", path.as_ref().display()),
        };
        Self::from_contents(path.as_ref().to_string_lossy().to_string(), contents)
    }

    pub fn file(&self) -> &String {
        &self.src.file
    }

    pub fn contents(&self) -> &String {
        &self.src.contents
    }

    pub fn line(&self, idx: u32) -> &str {
        let idx = idx as usize;
        if idx < self.src.lines.len() {
            let (start, end) = self.src.lines[idx];
            &self.src.contents[start as usize..end as usize]
        } else {
            ""
        }
    }

    /// Renders `msg` under the offending source line with a caret at `col`.
    pub fn message(&self, line: u32, col: u32, kind: &str, msg: &str) -> String {
        if line == 0 || line as usize > self.src.lines.len() {
            return format!("{}: invalid line {} specified", self.src.file, line);
        }

        let line_str = format!("{line}");
        let line_num_width = line_str.len() + 1;
        let col_spaces = (col as usize).saturating_sub(1);

        format!(
            "\n--> {}:{}:{}\n{:<line_num_width$}|\n\
		{:<line_num_width$}| {}\n\
		{:<line_num_width$}| {:<col_spaces$}^\n\
		{}: {}",
            self.src.file,
            line,
            col,
            "",
            line,
            self.line(line - 1),
            "",
            "",
            kind,
            msg
        )
    }

    pub fn error(&self, offset: u32, line: u32, col: u32, msg: &str) -> ParseError {
        ParseError {
            offset,
            line,
            col,
            message: msg.to_string(),
        }
    }
}

/// Returns the one-based (line, column) of a byte offset within `source`.
///
/// Offsets past the end of the input are clamped to the end, and offsets that
/// fall inside a multi-byte character resolve to that character. Columns
/// count characters, not bytes.
pub fn line_and_col_of(source: &str, offset: usize) -> (usize, usize) {
    let mut offset = cmp::min(offset, source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    let prefix = &source[..offset];
    let line = prefix.bytes().filter(|b| *b == b'\n').count() + 1;
    let line_start = prefix.rfind('\n').map_or(0, |i| i + 1);
    let col = prefix[line_start..].chars().count() + 1;
    (line, col)
}

#[derive(Clone)]
pub struct Span {
    pub source: Source,
    pub line: u32,
    pub col: u32,
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn text(&self) -> &str {
        &self.source.contents()[self.start as usize..self.end as usize]
    }

    pub fn message(&self, kind: &str, msg: &str) -> String {
        self.source.message(self.line, self.col, kind, msg)
    }

    pub fn error(&self, msg: &str) -> ParseError {
        self.source.error(self.start, self.line, self.col, msg)
    }

    pub fn position(&self) -> Position {
        Position {
            offset: self.start,
            line: self.line,
            col: self.col,
        }
    }
}

impl Debug for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        let t = self.text().escape_debug().to_string();
        let max = 32;
        let (txt, trailer) = match t.char_indices().nth(max) {
            Some((idx, _)) => (&t[0..idx], "..."),
            None => (t.as_str(), ""),
        };

        f.write_fmt(format_args!(
            "{}:{}:{}:{}, \"{}{}\"",
            self.line, self.col, self.start, self.end, txt, trailer
        ))
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum TokenKind {
    Symbol,
    String,
    RawString,
    Number,
    Ident,
    Var,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token(pub TokenKind, pub Span);

#[derive(Clone)]
pub struct Lexer<'source> {
    source: Source,
    iter: Peekable<CharIndices<'source>>,
    line: u32,
    col: u32,
}

type LexResult<T> = core::result::Result<T, ParseError>;

impl<'source> Lexer<'source> {
    pub fn new(source: &'source Source) -> Self {
        Self {
            source: source.clone(),
            iter: source.contents().char_indices().peekable(),
            line: 1,
            col: 1,
        }
    }

    /// Creates a lexer that starts reading at byte `offset` of the source.
    pub fn new_at(source: &'source Source, offset: usize) -> Self {
        let mut lexer = Self::new(source);
        while lexer.peek().0 < offset {
            lexer.iter.next();
        }
        let (line, col) = line_and_col_of(source.contents(), offset);
        lexer.line = line as u32;
        lexer.col = col as u32;
        lexer
    }

    fn peek(&mut self) -> (usize, char) {
        match self.iter.peek() {
            Some((index, chr)) => (*index, *chr),
            _ => (self.source.contents().len(), '\x00'),
        }
    }

    fn peekahead(&mut self, n: usize) -> (usize, char) {
        match self.iter.clone().nth(n) {
            Some((index, chr)) => (index, chr),
            _ => (self.source.contents().len(), '\x00'),
        }
    }

    fn span(&self, line: u32, col: u32, start: usize, end: usize) -> Span {
        Span {
            source: self.source.clone(),
            line,
            col,
            start: start as u32,
            end: end as u32,
        }
    }

    fn error(&self, offset: usize, line: u32, col: u32, msg: &str) -> ParseError {
        self.source.error(offset as u32, line, col, msg)
    }

    fn read_ident(&mut self) -> LexResult<Token> {
        let start = self.peek().0;
        let col = self.col;
        loop {
            let ch = self.peek().1;
            if ch.is_ascii_alphanumeric() || ch == '_' {
                self.iter.next();
            } else {
                break;
            }
        }
        let end = self.peek().0;
        self.col += (end - start) as u32;
        Ok(Token(TokenKind::Ident, self.span(self.line, col, start, end)))
    }

    fn read_var(&mut self) -> LexResult<Token> {
        let (start, _) = self.peek();
        let col = self.col;
        self.iter.next();
        self.col += 1;
        let ch = self.peek().1;
        if !(ch.is_ascii_alphabetic() || ch == '_') {
            return Err(self.error(start, self.line, col, "expected variable name after `$`"));
        }
        let ident = self.read_ident()?;
        Ok(Token(
            TokenKind::Var,
            self.span(self.line, col, start, ident.1.end as usize),
        ))
    }

    fn read_digits(&mut self) {
        while self.peek().1.is_ascii_digit() {
            self.iter.next();
        }
    }

    // See https://www.json.org/json-en.html for number's grammar.
    // The sign is not part of the token; unary minus is an operator.
    fn read_number(&mut self) -> LexResult<Token> {
        let (start, chr) = self.peek();
        let col = self.col;
        self.iter.next();

        // Read integer part.
        if chr != '0' {
            self.read_digits();
        }

        // Read fraction part
        // . must be followed by at least 1 digit.
        if self.peek().1 == '.' && self.peekahead(1).1.is_ascii_digit() {
            self.iter.next(); // .
            self.read_digits();
        }

        // Read exponent part
        let ch = self.peek().1;
        if ch == 'e' || ch == 'E' {
            self.iter.next();
            if matches!(self.peek().1, '+' | '-') {
                self.iter.next();
            }
            self.read_digits();
        }

        let end = self.peek().0;
        self.col += (end - start) as u32;

        // A number cannot run straight into an identifier.
        let ch = self.peek().1;
        if ch == '_' || ch.is_ascii_alphanumeric() {
            return Err(self.error(end, self.line, self.col, "invalid number"));
        }

        // Ensure that the number is parsable in Rust.
        if let Err(e) = serde_json::from_str::<Value>(&self.source.contents()[start..end]) {
            let serde_msg = &e.to_string();
            let msg = match &serde_msg {
                m if m.contains("out of range") => "out of range",
                m if m.contains("invalid number") => "invalid number",
                m => m.as_str(),
            };
            return Err(self.error(start, self.line, col, &format!("invalid number: {msg}")));
        }

        Ok(Token(TokenKind::Number, self.span(self.line, col, start, end)))
    }

    fn read_raw_string(&mut self) -> LexResult<Token> {
        let (open, _) = self.peek();
        let (line, col) = (self.line, self.col);
        for _ in 0..3 {
            self.iter.next();
        }
        self.col += 3;
        let (start, _) = self.peek();
        loop {
            let (offset, ch) = self.peek();
            match ch {
                '"' if self.peekahead(1).1 == '"' && self.peekahead(2).1 == '"' => {
                    for _ in 0..3 {
                        self.iter.next();
                    }
                    self.col += 3;
                    return Ok(Token(
                        TokenKind::RawString,
                        self.span(line, col + 3, start, offset),
                    ));
                }
                '\x00' if offset >= self.source.contents().len() => {
                    return Err(self.error(open, line, col, "unmatched \"\"\""));
                }
                '\n' => {
                    self.line += 1;
                    self.col = 1;
                }
                _ => self.col += 1,
            }
            self.iter.next();
        }
    }

    fn read_string(&mut self, quote: char) -> LexResult<Token> {
        let (open, _) = self.peek();
        let (line, col) = (self.line, self.col);
        self.iter.next();
        self.col += 1;
        let (start, _) = self.peek();
        loop {
            let (offset, ch) = self.peek();
            match ch {
                c if c == quote => break,
                '\x00' if offset >= self.source.contents().len() => break,
                '\\' => {
                    self.iter.next();
                    self.col += 1;
                    let (_, ch) = self.peek();
                    self.iter.next();
                    self.col += 1;
                    match ch {
                        // json escape sequence
                        '"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' => (),
                        '\'' if quote == '\'' => (),
                        'u' => {
                            for _i in 0..4 {
                                let (offset, ch) = self.peek();
                                if !ch.is_ascii_hexdigit() {
                                    return Err(self.error(
                                        offset,
                                        self.line,
                                        self.col,
                                        "invalid hex escape sequence",
                                    ));
                                }
                                self.iter.next();
                                self.col += 1;
                            }
                        }
                        _ => {
                            return Err(self.error(
                                offset,
                                self.line,
                                self.col - 2,
                                "invalid escape sequence",
                            ))
                        }
                    }
                }
                _ => {
                    if !('\u{0020}'..='\u{10FFFF}').contains(&ch) {
                        return Err(self.error(
                            offset,
                            self.line,
                            self.col,
                            "invalid character in string",
                        ));
                    }
                    self.iter.next();
                    self.col += 1;
                }
            }
        }

        if self.peek().1 != quote {
            return Err(self.error(open, line, col, &format!("unmatched {quote}")));
        }

        let end = self.peek().0;
        self.iter.next();
        self.col += 1;

        Ok(Token(TokenKind::String, self.span(line, col + 1, start, end)))
    }

    fn skip_ws(&mut self) -> LexResult<()> {
        // Only the 4 json whitespace characters are recognized.
        // Additionally, comments are also skipped.
        'outer: loop {
            match self.peek().1 {
                ' ' | '\t' => self.col += 1,
                '\r' => {
                    if self.peekahead(1).1 != '\n' {
                        let at = self.peek().0;
                        return Err(self.error(
                            at,
                            self.line,
                            self.col,
                            "\\r must be followed by \\n",
                        ));
                    }
                }
                '\n' => {
                    self.col = 1;
                    self.line += 1;
                }
                '#' => {
                    self.iter.next();
                    loop {
                        match self.peek() {
                            (_, '\n') => continue 'outer,
                            (o, '\x00') if o >= self.source.contents().len() => continue 'outer,
                            _ => self.iter.next(),
                        };
                    }
                }
                _ => break,
            }
            self.iter.next();
        }
        Ok(())
    }

    fn symbol(&mut self, len: usize) -> LexResult<Token> {
        let (start, _) = self.peek();
        let col = self.col;
        for _ in 0..len {
            self.iter.next();
        }
        self.col += len as u32;
        let end = self.peek().0;
        Ok(Token(TokenKind::Symbol, self.span(self.line, col, start, end)))
    }

    pub fn next_token(&mut self) -> LexResult<Token> {
        self.skip_ws()?;

        let (start, chr) = self.peek();
        let col = self.col;
        let next = self.peekahead(1).1;

        match chr {
	    // grouping characters
	    '{' | '}' | '[' | ']' | '(' | ')' |
	    // arith operator
	    '+' | '*' | '/' | '%' |
	    // separators
	    ',' | ':' | '.' => self.symbol(1),
	    '-' if next == '>' => self.symbol(2),
	    '-' => self.symbol(1),
	    // = == =>
	    '=' if next == '=' || next == '>' => self.symbol(2),
	    '=' => self.symbol(1),
	    // < <= > >= ! !=
	    '<' | '>' | '!' if next == '=' => self.symbol(2),
	    '<' | '>' | '!' => self.symbol(1),
	    '&' if next == '&' => self.symbol(2),
	    '|' if next == '|' => self.symbol(2),
	    '|' => self.symbol(1),
	    '"' if next == '"' && self.peekahead(2).1 == '"' => self.read_raw_string(),
	    '"' | '\'' => self.read_string(chr),
	    '$' => self.read_var(),
	    '\x00' if start >= self.source.contents().len() => Ok(Token(
		TokenKind::Eof,
		self.span(self.line, col, start, start),
	    )),
	    _ if chr.is_ascii_digit() => self.read_number(),
	    _ if chr.is_ascii_alphabetic() || chr == '_' => self.read_ident(),
	    _ => Err(self.error(start, self.line, self.col, "invalid character"))
	}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_and_col_counts_newlines() {
        assert_eq!(line_and_col_of("a\nb\ncd", 4), (3, 1));
        assert_eq!(line_and_col_of("a\nb\ncd", 5), (3, 2));
        assert_eq!(line_and_col_of("a\nb\ncd", 0), (1, 1));
        assert_eq!(line_and_col_of("a\nb\ncd", 2), (2, 1));
    }

    #[test]
    fn line_and_col_clamps_past_end() {
        assert_eq!(line_and_col_of("a\nb\ncd", 600), (3, 3));
        assert_eq!(line_and_col_of("", 3), (1, 1));
    }

    #[test]
    fn line_and_col_counts_characters() {
        // 'é' is two bytes.
        assert_eq!(line_and_col_of("é = x", 2), (1, 2));
        assert_eq!(line_and_col_of("é = x", 3), (1, 3));
        // Inside a multi-byte character resolves to that character.
        assert_eq!(line_and_col_of("é", 1), (1, 1));
    }

    #[test]
    fn lexer_columns_agree_with_line_and_col_of() -> Result<()> {
        let text = "root.a = \"é\" +\n\t'x' # note\n  $v.b->c";
        let source = Source::from_contents("test".to_string(), text.to_string())?;
        let mut lexer = Lexer::new(&source);
        loop {
            let tok = lexer.next_token()?;
            // String spans start after the opening quote.
            let (line, col) = line_and_col_of(text, tok.1.start as usize);
            assert_eq!((tok.1.line as usize, tok.1.col as usize), (line, col), "{tok:?}");
            if tok.0 == TokenKind::Eof {
                break;
            }
        }
        Ok(())
    }
}
