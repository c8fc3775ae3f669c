//! Splits SQL text into code, string literals and quoted identifiers.
//!
//! Single-quoted literals (with `''` escapes), double-quoted and
//! backtick-quoted identifiers are recognised. Comments are plain code.
//! With [`Escapes::Backslash`] a `\` inside a single- or double-quoted run
//! escapes the next byte, as MySQL reads it by default.

/// How a backslash inside a quoted run is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escapes {
    Standard,
    Backslash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Code(&'a str),
    /// Body of a single-quoted literal, escapes left as written.
    Literal { body: &'a str, terminated: bool },
    /// A quoted identifier, quotes included.
    Quoted { text: &'a str, terminated: bool },
}

impl Segment<'_> {
    /// Writes the segment back exactly as it appeared in the source.
    pub fn write_to(&self, out: &mut String) {
        match self {
            Segment::Code(text) | Segment::Quoted { text, .. } => out.push_str(text),
            Segment::Literal { body, terminated } => {
                out.push('\'');
                out.push_str(body);
                if *terminated {
                    out.push('\'');
                }
            }
        }
    }

    /// False when the text ended before the closing quote.
    pub fn is_terminated(&self) -> bool {
        match self {
            Segment::Code(_) => true,
            Segment::Literal { terminated, .. } | Segment::Quoted { terminated, .. } => *terminated,
        }
    }
}

pub fn segments(sql: &str) -> Vec<Segment<'_>> {
    segments_with(sql, Escapes::Standard)
}

pub fn segments_with(sql: &str, escapes: Escapes) -> Vec<Segment<'_>> {
    let bytes = sql.as_bytes();
    let len = bytes.len();
    let backslash = escapes == Escapes::Backslash;
    let mut out = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < len {
        match bytes[i] {
            b'\'' => {
                if start < i {
                    out.push(Segment::Code(&sql[start..i]));
                }
                let body_start = i + 1;
                let mut j = body_start;
                let mut terminated = false;
                while j < len {
                    if backslash && bytes[j] == b'\\' {
                        j += 2;
                        continue;
                    }
                    if bytes[j] == b'\'' {
                        if j + 1 < len && bytes[j + 1] == b'\'' {
                            j += 2;
                            continue;
                        }
                        terminated = true;
                        break;
                    }
                    j += 1;
                }
                let j = j.min(len);
                out.push(Segment::Literal {
                    body: &sql[body_start..j],
                    terminated,
                });
                i = if terminated { j + 1 } else { j };
                start = i;
            }
            quote @ (b'"' | b'`') => {
                if start < i {
                    out.push(Segment::Code(&sql[start..i]));
                }
                let escaped = backslash && quote == b'"';
                let mut j = i + 1;
                while j < len && bytes[j] != quote {
                    j += if escaped && bytes[j] == b'\\' { 2 } else { 1 };
                }
                let terminated = j < len;
                let end = if terminated { j + 1 } else { len };
                out.push(Segment::Quoted {
                    text: &sql[i..end],
                    terminated,
                });
                i = end;
                start = i;
            }
            _ => i += 1,
        }
    }

    if start < len {
        out.push(Segment::Code(&sql[start..]));
    }
    out
}

/// Returns the text with literal bodies and quoted identifiers emptied,
/// or `None` when a quote is left open.
pub fn mask_quoted(sql: &str, escapes: Escapes) -> Option<String> {
    let mut out = String::with_capacity(sql.len());
    for segment in segments_with(sql, escapes) {
        if !segment.is_terminated() {
            return None;
        }
        match segment {
            Segment::Code(text) => out.push_str(text),
            Segment::Literal { .. } => out.push_str("''"),
            Segment::Quoted { text, .. } => {
                let quote = text.chars().next().unwrap_or('"');
                out.push(quote);
                out.push(quote);
            }
        }
    }
    Some(out)
}
