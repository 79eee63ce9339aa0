//! Line classification for plugin documents.
//!
//! The scanner only needs to know where table headers start. It tracks
//! strings, comments and bracket depth so that a `[` inside a multi-line
//! array or string is never mistaken for a header.

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Header {
    pub array: bool,
    pub path: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LineKind {
    Header(Header),
    Blank,
    Comment,
    Content,
}

#[derive(Debug)]
pub(crate) struct Line<'a> {
    /// 1-based
    pub number: usize,
    /// Line text including its line terminator
    pub text: &'a str,
    pub kind: LineKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Multiline {
    Basic,
    Literal,
}

pub(crate) fn scan(text: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut open: Option<Multiline> = None;
    let mut depth = 0usize;

    for (idx, raw) in text.split_inclusive('\n').enumerate() {
        let body = raw.trim_end_matches(['\n', '\r']);
        let kind = if open.is_none() && depth == 0 {
            classify(body)
        } else {
            LineKind::Content
        };
        if kind == LineKind::Content {
            scan_value(body, &mut open, &mut depth);
        }
        lines.push(Line {
            number: idx + 1,
            text: raw,
            kind,
        });
    }

    lines
}

fn classify(body: &str) -> LineKind {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        LineKind::Blank
    } else if trimmed.starts_with('#') {
        LineKind::Comment
    } else if trimmed.starts_with('[') {
        match parse_header(trimmed) {
            Some(header) => LineKind::Header(header),
            None => LineKind::Content,
        }
    } else {
        LineKind::Content
    }
}

fn scan_value(body: &str, open: &mut Option<Multiline>, depth: &mut usize) {
    let bytes = body.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if let Some(kind) = *open {
            match find_close(bytes, i, kind) {
                Some(end) => {
                    *open = None;
                    i = end;
                    continue;
                }
                None => return,
            }
        }

        match bytes[i] {
            b'#' => return,
            b'"' => {
                if bytes[i..].starts_with(b"\"\"\"") {
                    *open = Some(Multiline::Basic);
                    i += 3;
                } else {
                    i = skip_basic(bytes, i + 1);
                }
            }
            b'\'' => {
                if bytes[i..].starts_with(b"'''") {
                    *open = Some(Multiline::Literal);
                    i += 3;
                } else {
                    i = skip_literal(bytes, i + 1);
                }
            }
            b'[' | b'{' => {
                *depth += 1;
                i += 1;
            }
            b']' | b'}' => {
                *depth = depth.saturating_sub(1);
                i += 1;
            }
            _ => i += 1,
        }
    }
}

fn find_close(bytes: &[u8], mut i: usize, kind: Multiline) -> Option<usize> {
    let delim: &[u8] = match kind {
        Multiline::Basic => b"\"\"\"",
        Multiline::Literal => b"'''",
    };

    while i < bytes.len() {
        if kind == Multiline::Basic && bytes[i] == b'\\' {
            i += 2;
            continue;
        }
        if bytes[i..].starts_with(delim) {
            // up to two quotes directly before the delimiter belong to the content
            let mut end = i + 3;
            while end < bytes.len() && end < i + 5 && bytes[end] == delim[0] {
                end += 1;
            }
            return Some(end);
        }
        i += 1;
    }
    None
}

fn skip_basic(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn skip_literal(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

/// Parses `[a.b]` / `[[a."b c"]]` with an optional trailing comment.
pub(crate) fn parse_header(line: &str) -> Option<Header> {
    let (array, mut rest) = match line.strip_prefix("[[") {
        Some(r) => (true, r),
        None => (false, line.strip_prefix('[')?),
    };

    let mut path = Vec::new();
    loop {
        rest = rest.trim_start_matches([' ', '\t']);
        let (key, tail) = parse_key(rest)?;
        path.push(key);
        rest = tail.trim_start_matches([' ', '\t']);
        match rest.strip_prefix('.') {
            Some(r) => rest = r,
            None => break,
        }
    }

    let close = if array { "]]" } else { "]" };
    let tail = rest.strip_prefix(close)?.trim();
    if tail.is_empty() || tail.starts_with('#') {
        Some(Header { array, path })
    } else {
        None
    }
}

fn parse_key(s: &str) -> Option<(String, &str)> {
    if let Some(r) = s.strip_prefix('"') {
        let mut key = String::new();
        let mut chars = r.char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => return Some((key, &r[i + 1..])),
                '\\' => {
                    let (_, escaped) = chars.next()?;
                    key.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        other => other,
                    });
                }
                c => key.push(c),
            }
        }
        None
    } else if let Some(r) = s.strip_prefix('\'') {
        let end = r.find('\'')?;
        Some((r[..end].to_string(), &r[end + 1..]))
    } else {
        let end = s
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
            .unwrap_or(s.len());
        if end == 0 {
            return None;
        }
        Some((s[..end].to_string(), &s[end..]))
    }
}
