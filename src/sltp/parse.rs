use super::{
    Assignment, EntryFormat, KeyStyle, ParseError, ParseErrorKind, Qualifier, TableFormat,
    ValueFormat,
};
use crate::encoding;
use crate::value::{LuaKey, LuaNumber, LuaTable, LuaValue};

type PResult<T> = Result<T, ParseError>;

pub(super) struct Parser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

/// A table whose closing brace has not been read yet.
#[derive(Default)]
struct OpenTable {
    table: LuaTable,
    format: TableFormat,
    positional: i64,
}

/// An entry whose value is still being parsed.
struct PendingEntry {
    key: LuaKey,
    lead: String,
    style: KeyStyle,
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

impl<'a> Parser<'a> {
    pub(super) fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
        }
    }

    pub(super) fn document(mut self) -> PResult<(LuaTable, Qualifier)> {
        let lead = self.trivia();
        let assignment = match self.peek() {
            Some(b) if is_ident_start(b) => {
                let name_start = self.pos;
                let name = self.identifier().to_string();
                if matches!(name.as_str(), "nil" | "true" | "false") {
                    return Err(self.error_at(
                        name_start,
                        ParseErrorKind::UnexpectedIdentifier(name),
                    ));
                }
                let pre_eq = self.trivia();
                self.expect(b'=', "`=`")?;
                let post_eq = self.trivia();
                Some(Assignment {
                    name,
                    pre_eq,
                    post_eq,
                })
            }
            _ => None,
        };

        self.expect_peek(b'{', "`{`")?;
        let (tree, root) = self.table()?;
        let trail = self.trivia();
        if self.pos < self.bytes.len() {
            return Err(self.error(ParseErrorKind::TrailingInput));
        }

        let qualifier = Qualifier {
            lead,
            assignment,
            root: Some(root),
            trail,
        };
        Ok((tree, qualifier))
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        self.error_at(self.pos, kind)
    }

    fn error_at(&self, offset: usize, kind: ParseErrorKind) -> ParseError {
        ParseError::at(self.src, offset, kind)
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        match self.src[self.pos..].chars().next() {
            Some(found) => self.error(ParseErrorKind::UnexpectedChar { found, expected }),
            None => self.error(ParseErrorKind::UnexpectedEof { expected }),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn expect_peek(&self, b: u8, expected: &'static str) -> PResult<()> {
        if self.peek() == Some(b) {
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect(&mut self, b: u8, expected: &'static str) -> PResult<()> {
        self.expect_peek(b, expected)?;
        self.pos += 1;
        Ok(())
    }

    /// Whitespace and `--` line comments, returned verbatim.
    fn trivia(&mut self) -> String {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.pos += 1;
            } else if b == b'-' && self.peek_at(1) == Some(b'-') {
                while let Some(c) = self.peek() {
                    if c == b'\n' {
                        break;
                    }
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
        self.src[start..self.pos].to_string()
    }

    fn identifier(&mut self) -> &'a str {
        let src = self.src;
        let start = self.pos;
        self.skip_while(is_ident_char);
        &src[start..self.pos]
    }

    fn skip_while(&mut self, pred: fn(u8) -> bool) -> usize {
        let start = self.pos;
        while self.peek().is_some_and(pred) {
            self.pos += 1;
        }
        self.pos - start
    }

    /// Parses a table and everything nested in it. Open tables live on an explicit stack, so
    /// nesting depth is limited by memory only.
    fn table(&mut self) -> PResult<(LuaTable, TableFormat)> {
        self.expect(b'{', "`{`")?;
        let mut root = OpenTable::default();
        let mut nested: Vec<(OpenTable, PendingEntry)> = Vec::new();

        loop {
            let lead = self.trivia();
            match self.peek() {
                Some(b'}') => {
                    self.pos += 1;
                    let Some((mut child, pending)) = nested.pop() else {
                        root.format.tail = lead;
                        return Ok((root.table, root.format));
                    };
                    child.format.tail = lead;
                    let parent = match nested.last_mut() {
                        Some((parent, _)) => parent,
                        None => &mut root,
                    };
                    self.finish_entry(
                        parent,
                        pending,
                        LuaValue::Table(child.table),
                        ValueFormat::Table(child.format),
                    )?;
                    continue;
                }
                None => return Err(self.unexpected("`}`")),
                _ => {}
            }

            let current = match nested.last_mut() {
                Some((current, _)) => current,
                None => &mut root,
            };
            let entry_start = self.pos;
            let (key, style) = match self.field_key()? {
                Some(keyed) => keyed,
                None => {
                    current.positional += 1;
                    (LuaKey::Int(current.positional), KeyStyle::Positional)
                }
            };
            if current.table.contains_key(&key) {
                return Err(self.error_at(entry_start, ParseErrorKind::DuplicateKey(key)));
            }

            let pending = PendingEntry { key, lead, style };
            if self.peek() == Some(b'{') {
                self.pos += 1;
                nested.push((OpenTable::default(), pending));
            } else {
                let (value, value_format) = self.scalar()?;
                self.finish_entry(current, pending, value, value_format)?;
            }
        }
    }

    /// Reads the separator after an entry's value and stores the entry in `table`.
    fn finish_entry(
        &mut self,
        table: &mut OpenTable,
        pending: PendingEntry,
        value: LuaValue,
        value_format: ValueFormat,
    ) -> PResult<()> {
        let pre_sep = self.trivia();
        let sep = match self.peek() {
            Some(c @ (b',' | b';')) => {
                self.pos += 1;
                Some(c as char)
            }
            Some(b'}') => None,
            _ => return Err(self.unexpected("`,`, `;` or `}`")),
        };

        table.format.entries.insert(
            pending.key.clone(),
            EntryFormat {
                lead: pending.lead,
                key: pending.style,
                value: value_format,
                pre_sep,
                sep,
            },
        );
        table.table.insert(pending.key, value);
        Ok(())
    }

    /// Parses `[key] =` or `name =`. Returns `None` (consuming nothing) for positional fields.
    fn field_key(&mut self) -> PResult<Option<(LuaKey, KeyStyle)>> {
        match self.peek() {
            Some(b'[') => {
                self.pos += 1;
                let raw_start = self.pos;
                self.trivia();
                let key = match self.peek() {
                    Some(b'"' | b'\'') => LuaKey::Str(self.string()?),
                    Some(b'-' | b'0'..=b'9' | b'.') => {
                        let start = self.pos;
                        match self.number()? {
                            LuaNumber::Integer(v) => LuaKey::Int(v),
                            LuaNumber::Float(_) => {
                                let text = self.src[start..self.pos].to_string();
                                return Err(
                                    self.error_at(start, ParseErrorKind::InvalidNumber(text))
                                );
                            }
                        }
                    }
                    _ => return Err(self.unexpected("a string or integer key")),
                };
                self.trivia();
                let raw = self.src[raw_start..self.pos].to_string();
                self.expect(b']', "`]`")?;
                let pre_eq = self.trivia();
                self.expect(b'=', "`=`")?;
                let post_eq = self.trivia();
                Ok(Some((
                    key,
                    KeyStyle::Bracketed {
                        raw,
                        pre_eq,
                        post_eq,
                    },
                )))
            }
            Some(b) if is_ident_start(b) => {
                let start = self.pos;
                let name = self.identifier();
                if matches!(name, "nil" | "true" | "false") {
                    self.pos = start;
                    return Ok(None);
                }
                let pre_eq = self.trivia();
                if self.peek() != Some(b'=') {
                    return Err(self.error_at(
                        start,
                        ParseErrorKind::UnexpectedIdentifier(name.to_string()),
                    ));
                }
                self.pos += 1;
                let post_eq = self.trivia();
                Ok(Some((LuaKey::Str(name.to_string()), KeyStyle::Bare { pre_eq, post_eq })))
            }
            _ => Ok(None),
        }
    }

    fn scalar(&mut self) -> PResult<(LuaValue, ValueFormat)> {
        let start = self.pos;
        let value = match self.peek() {
            Some(b'"' | b'\'') => LuaValue::String(self.string()?),
            Some(b'-' | b'0'..=b'9' | b'.') => LuaValue::Number(self.number()?),
            Some(b) if is_ident_start(b) => match self.identifier() {
                "nil" => LuaValue::Nil,
                "true" => LuaValue::Bool(true),
                "false" => LuaValue::Bool(false),
                other => {
                    return Err(self.error_at(
                        start,
                        ParseErrorKind::UnexpectedIdentifier(other.to_string()),
                    ));
                }
            },
            _ => return Err(self.unexpected("a value")),
        };
        let raw = self.src[start..self.pos].to_string();
        Ok((value.clone(), ValueFormat::Scalar { raw, value }))
    }

    fn number(&mut self) -> PResult<LuaNumber> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }

        let mut is_float = false;
        let mut valid;
        let is_hex = self.peek() == Some(b'0') && matches!(self.peek_at(1), Some(b'x' | b'X'));
        if is_hex {
            self.pos += 2;
            valid = self.skip_while(|b| b.is_ascii_hexdigit()) > 0;
        } else {
            let int_digits = self.skip_while(|b| b.is_ascii_digit());
            let mut frac_digits = 0;
            if self.peek() == Some(b'.') {
                is_float = true;
                self.pos += 1;
                frac_digits = self.skip_while(|b| b.is_ascii_digit());
            }
            valid = int_digits + frac_digits > 0;
            if matches!(self.peek(), Some(b'e' | b'E')) {
                is_float = true;
                self.pos += 1;
                if matches!(self.peek(), Some(b'+' | b'-')) {
                    self.pos += 1;
                }
                valid &= self.skip_while(|b| b.is_ascii_digit()) > 0;
            }
        }

        // A literal running straight into a name or another dot is malformed (`12abc`, `1.2.3`).
        if self.peek().is_some_and(|b| is_ident_char(b) || b == b'.') {
            valid = false;
            self.skip_while(|b| is_ident_char(b) || b == b'.');
        }

        let src = self.src;
        let text = &src[start..self.pos];
        let invalid = || ParseError::at(src, start, ParseErrorKind::InvalidNumber(text.to_string()));
        if !valid {
            return Err(invalid());
        }

        if is_hex {
            let (negative, digits) = match text.strip_prefix('-') {
                Some(rest) => (true, &rest[2..]),
                None => (false, &text[2..]),
            };
            let magnitude = i64::from_str_radix(digits, 16).map_err(|_| invalid())?;
            return Ok(LuaNumber::Integer(if negative { -magnitude } else { magnitude }));
        }
        if !is_float {
            if let Ok(v) = text.parse::<i64>() {
                return Ok(LuaNumber::Integer(v));
            }
        }
        // Integers beyond i64 become floats, as in Lua.
        text.parse::<f64>()
            .map(LuaNumber::Float)
            .map_err(|_| invalid())
    }

    fn string(&mut self) -> PResult<String> {
        let start = self.pos;
        let quote = self.bytes[self.pos];
        self.pos += 1;
        let mut out = String::new();

        loop {
            let Some(c) = self.src[self.pos..].chars().next() else {
                return Err(self.error_at(start, ParseErrorKind::UnterminatedString));
            };
            match c {
                '\n' | '\r' => {
                    return Err(self.error_at(start, ParseErrorKind::UnterminatedString));
                }
                '\\' => {
                    self.pos += 1;
                    self.escape(&mut out, start)?;
                }
                c if c as u32 == quote as u32 => {
                    self.pos += 1;
                    return Ok(out);
                }
                c => {
                    out.push(c);
                    self.pos += c.len_utf8();
                }
            }
        }
    }

    fn escape(&mut self, out: &mut String, string_start: usize) -> PResult<()> {
        let escape_start = self.pos;
        let Some(c) = self.src[self.pos..].chars().next() else {
            return Err(self.error_at(string_start, ParseErrorKind::UnterminatedString));
        };
        self.pos += c.len_utf8();
        let simple = match c {
            'n' => Some('\n'),
            't' => Some('\t'),
            'r' => Some('\r'),
            'a' => Some('\u{07}'),
            'b' => Some('\u{08}'),
            'f' => Some('\u{0C}'),
            'v' => Some('\u{0B}'),
            '\\' | '"' | '\'' => Some(c),
            _ => None,
        };
        if let Some(ch) = simple {
            out.push(ch);
            return Ok(());
        }

        let invalid = |p: &Self| {
            let text = p.src[escape_start..p.pos].to_string();
            p.error_at(escape_start - 1, ParseErrorKind::InvalidEscape(text))
        };

        match c {
            // Escaped line break: `\` + newline, any of \n, \r, \r\n, \n\r.
            '\n' | '\r' => {
                let other = if c == '\n' { b'\r' } else { b'\n' };
                if self.peek() == Some(other) {
                    self.pos += 1;
                }
                out.push('\n');
            }
            '0'..='9' => {
                let mut value = c.to_digit(10).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek() {
                        Some(d @ b'0'..=b'9') => {
                            value = value * 10 + u32::from(d - b'0');
                            self.pos += 1;
                        }
                        _ => break,
                    }
                }
                let byte = u8::try_from(value).map_err(|_| invalid(self))?;
                out.push(encoding::decode_byte(byte));
            }
            'x' => {
                let hex = self.src.get(self.pos..self.pos + 2).unwrap_or("");
                let byte = if hex.len() == 2 && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                    self.pos += 2;
                    u8::from_str_radix(hex, 16).map_err(|_| invalid(self))?
                } else {
                    return Err(invalid(self));
                };
                out.push(encoding::decode_byte(byte));
            }
            _ => return Err(invalid(self)),
        }
        Ok(())
    }
}
