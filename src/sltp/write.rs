use super::{EncodeError, EntryFormat, KeyPath, KeyStyle, Qualifier, TableFormat, ValueFormat};
use crate::value::{LuaKey, LuaNumber, LuaTable, LuaValue};
use std::fmt::Write as _;

const INDENT: &str = "    ";

/// A table being written. Tables nest on an explicit stack instead of the call stack, so
/// depth is limited by memory only.
struct Frame<'t> {
    entries: indexmap::map::Iter<'t, LuaKey, LuaValue>,
    /// `None` for tables written canonically.
    format: Option<&'t TableFormat>,
    depth: usize,
    positional: i64,
    template_lead: Option<&'t str>,
    /// Trivia that closed the table before new entries were appended after it.
    deferred_tail: &'t str,
    /// What follows the value of the entry being written.
    after: After<'t>,
}

#[derive(Clone, Copy)]
enum After<'t> {
    Formatted { entry: &'t EntryFormat, last: bool },
    Comma,
    CommaLine,
}

pub(super) struct Writer<'t> {
    out: String,
    path: Vec<&'t LuaKey>,
    stack: Vec<Frame<'t>>,
}

impl<'t> Writer<'t> {
    pub(super) fn new() -> Self {
        Self {
            out: String::new(),
            path: Vec::new(),
            stack: Vec::new(),
        }
    }

    pub(super) fn document(
        mut self,
        tree: &'t LuaTable,
        qualifier: &'t Qualifier,
    ) -> Result<String, EncodeError> {
        self.out.push_str(&qualifier.lead);
        if let Some(assignment) = &qualifier.assignment {
            self.out.push_str(&assignment.name);
            self.out.push_str(&assignment.pre_eq);
            self.out.push('=');
            self.out.push_str(&assignment.post_eq);
        }
        self.open(tree, qualifier.root.as_ref(), 0);
        self.drain()?;
        self.out.push_str(&qualifier.trail);
        Ok(self.out)
    }

    /// Write entries until every open table is closed.
    fn drain(&mut self) -> Result<(), EncodeError> {
        while let Some(frame) = self.stack.last_mut() {
            let Some((key, value)) = frame.entries.next() else {
                self.close();
                continue;
            };
            let last = frame.entries.len() == 0;
            let depth = frame.depth + 1;
            let out = &mut self.out;
            let value_format = match frame.format {
                None => {
                    indent(out, depth);
                    canonical_key(out, key);
                    frame.after = After::CommaLine;
                    None
                }
                Some(format) => match format.entries.get(key) {
                    Some(entry) => {
                        frame.template_lead = Some(entry.lead.as_str());
                        out.push_str(&entry.lead);
                        formatted_key(out, key, entry, &mut frame.positional);
                        frame.after = After::Formatted { entry, last };
                        Some(&entry.value)
                    }
                    None => {
                        match frame.template_lead {
                            Some(lead) => out.push_str(lead),
                            None => {
                                out.push('\n');
                                indent(out, depth);
                            }
                        }
                        canonical_key(out, key);
                        frame.after = After::Comma;
                        None
                    }
                },
            };
            self.path.push(key);
            self.value(value, value_format, depth)?;
        }
        Ok(())
    }

    fn open(&mut self, table: &'t LuaTable, format: Option<&'t TableFormat>, depth: usize) {
        let template_lead = format.and_then(|format| {
            table
                .keys()
                .find_map(|k| format.entries.get(k))
                .map(|e| e.lead.as_str())
        });
        self.out.push_str(if format.is_some() { "{" } else { "{\n" });
        self.stack.push(Frame {
            entries: table.iter(),
            format,
            depth,
            positional: 0,
            template_lead,
            deferred_tail: "",
            after: After::Comma,
        });
    }

    fn close(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        match frame.format {
            Some(format) => {
                self.out.push_str(frame.deferred_tail);
                self.out.push_str(&format.tail);
            }
            None => indent(&mut self.out, frame.depth),
        }
        self.out.push('}');
        if !self.stack.is_empty() {
            self.finish_entry();
        }
    }

    /// Writes a scalar in full, or opens a table on the stack.
    fn value(
        &mut self,
        value: &'t LuaValue,
        format: Option<&'t ValueFormat>,
        depth: usize,
    ) -> Result<(), EncodeError> {
        match (value, format) {
            (LuaValue::Table(t), Some(ValueFormat::Table(f))) => {
                self.open(t, Some(f), depth);
                return Ok(());
            }
            (v, Some(ValueFormat::Scalar { raw, value: original })) if v == original => {
                self.out.push_str(raw);
            }
            (LuaValue::Table(t), _) => {
                self.open(t, None, depth);
                return Ok(());
            }
            (LuaValue::Nil, _) => self.out.push_str("nil"),
            (LuaValue::Bool(v), _) => self.out.push_str(if *v { "true" } else { "false" }),
            (LuaValue::Number(LuaNumber::Integer(v)), _) => {
                let _ = write!(self.out, "{v}");
            }
            (LuaValue::Number(LuaNumber::Float(v)), _) => {
                if !v.is_finite() {
                    return Err(EncodeError::NonFinite {
                        path: KeyPath(&self.path).to_string(),
                        value: *v,
                    });
                }
                // ryu always emits a `.` or an exponent, so the literal re-decodes as a float.
                let mut buf = ryu::Buffer::new();
                self.out.push_str(buf.format_finite(*v));
            }
            (LuaValue::String(s), _) => write_string(&mut self.out, s),
        }
        self.finish_entry();
        Ok(())
    }

    /// Separator after the current entry of the innermost open table.
    fn finish_entry(&mut self) {
        self.path.pop();
        let Some(frame) = self.stack.last_mut() else {
            return;
        };
        match frame.after {
            After::Formatted { entry, last } => match entry.sep {
                Some(sep) => {
                    self.out.push_str(&entry.pre_sep);
                    self.out.push(sep);
                }
                None if last => self.out.push_str(&entry.pre_sep),
                None => {
                    self.out.push(',');
                    frame.deferred_tail = entry.pre_sep.as_str();
                }
            },
            After::Comma => self.out.push(','),
            After::CommaLine => self.out.push_str(",\n"),
        }
    }
}

fn formatted_key(out: &mut String, key: &LuaKey, entry: &EntryFormat, positional: &mut i64) {
    match &entry.key {
        // Positional only while the key still matches the implicit index.
        KeyStyle::Positional if *key == LuaKey::Int(*positional + 1) => {
            *positional += 1;
        }
        KeyStyle::Positional => canonical_key(out, key),
        KeyStyle::Bare { pre_eq, post_eq } => {
            if let LuaKey::Str(name) = key {
                out.push_str(name);
            }
            out.push_str(pre_eq);
            out.push('=');
            out.push_str(post_eq);
        }
        KeyStyle::Bracketed {
            raw,
            pre_eq,
            post_eq,
        } => {
            out.push('[');
            out.push_str(raw);
            out.push(']');
            out.push_str(pre_eq);
            out.push('=');
            out.push_str(post_eq);
        }
    }
}

fn canonical_key(out: &mut String, key: &LuaKey) {
    out.push('[');
    match key {
        LuaKey::Int(v) => {
            let _ = write!(out, "{v}");
        }
        LuaKey::Str(s) => write_string(out, s),
    }
    out.push_str("] = ");
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            // The host writes embedded newlines as an escaped line break.
            '\n' => out.push_str("\\\n"),
            '\r' => out.push_str("\\r"),
            c if (c as u32) < 0x20 || c == '\u{7F}' => {
                let _ = write!(out, "\\{:03}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
