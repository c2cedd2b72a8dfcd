//! Minimal HTML tokenizer that keeps byte offsets into the source.
//!
//! It recognizes start/end tags (with quoted or unquoted attributes, where
//! quoted values may contain `>`), comments, doctype/processing declarations
//! and the literal bodies of `script`, `style`, `textarea` and `title`. Anything it cannot parse as markup is
//! reported as text, so every source byte belongs to exactly one token.

use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    /// ASCII-lowercased attribute name.
    pub name: String,
    /// Raw value (still entity-encoded); `None` for bare attributes.
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    /// ASCII-lowercased element name.
    pub name: String,
    pub attrs: Vec<Attr>,
    pub self_closing: bool,
    /// Whole tag, `<` through `>`.
    pub span: Range<usize>,
    /// Byte offset where new attributes go: the closing `>` or the `/` of `/>`.
    pub insert_at: usize,
}

impl StartTag {
    pub fn attr(&self, name: &str) -> Option<&Attr> {
        self.attrs.iter().find(|a| a.name.eq_ignore_ascii_case(name))
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .and_then(|a| a.value.as_deref())
            .is_some_and(|v| v.split_ascii_whitespace().any(|c| c == class))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Text(Range<usize>),
    /// Body of a raw-text or RCDATA element; never inspected.
    RawText(Range<usize>),
    Start(StartTag),
    End { name: String, span: Range<usize> },
    Comment(Range<usize>),
    Declaration(Range<usize>),
}

/// Elements whose content is text up to the matching end tag: raw text
/// (`script`, `style`) and RCDATA (`textarea`, `title`).
const RAW_TEXT_ELEMENTS: [&str; 4] = ["script", "style", "textarea", "title"];

pub fn tokenize(html: &str) -> Vec<Token> {
    Tokenizer {
        src: html.as_bytes(),
        out: Vec::new(),
        text_start: 0,
    }
    .run()
}

struct Tokenizer<'a> {
    src: &'a [u8],
    out: Vec<Token>,
    text_start: usize,
}

impl Tokenizer<'_> {
    fn run(mut self) -> Vec<Token> {
        let mut pos = 0;
        while let Some(lt) = find_byte(self.src, b'<', pos) {
            match self.markup_at(lt) {
                Some(next) => pos = next,
                None => pos = lt + 1,
            }
        }
        self.flush_text(self.src.len());
        self.out
    }

    fn flush_text(&mut self, end: usize) {
        if end > self.text_start {
            self.out.push(Token::Text(self.text_start..end));
        }
    }

    fn emit(&mut self, start: usize, token: Token, end: usize) -> usize {
        self.flush_text(start);
        self.out.push(token);
        self.text_start = end;
        end
    }

    /// Tries to read markup at `lt`; returns the offset after it.
    fn markup_at(&mut self, lt: usize) -> Option<usize> {
        let rest = &self.src[lt..];
        if rest.starts_with(b"<!--") {
            let end = find_seq(self.src, b"-->", lt + 4).map_or(self.src.len(), |i| i + 3);
            return Some(self.emit(lt, Token::Comment(lt..end), end));
        }
        if rest.starts_with(b"<!") || rest.starts_with(b"<?") {
            let end = find_byte(self.src, b'>', lt + 2).map_or(self.src.len(), |i| i + 1);
            return Some(self.emit(lt, Token::Declaration(lt..end), end));
        }
        if rest.starts_with(b"</") && rest.get(2).is_some_and(u8::is_ascii_alphabetic) {
            let name_end = scan_name(self.src, lt + 2);
            let name = lower(&self.src[lt + 2..name_end]);
            let end = find_byte(self.src, b'>', name_end)? + 1;
            return Some(self.emit(lt, Token::End { name, span: lt..end }, end));
        }
        if rest.get(1).is_some_and(u8::is_ascii_alphabetic) {
            let tag = parse_start_tag(self.src, lt)?;
            let end = tag.span.end;
            let raw = !tag.self_closing && RAW_TEXT_ELEMENTS.contains(&tag.name.as_str());
            let name = tag.name.clone();
            self.emit(lt, Token::Start(tag), end);
            if raw {
                return Some(self.skip_raw_text(&name, end));
            }
            return Some(end);
        }
        None
    }

    /// Emits the body of a raw-text element up to its closing tag.
    fn skip_raw_text(&mut self, name: &str, from: usize) -> usize {
        let close = format!("</{name}");
        let mut at = from;
        let body_end = loop {
            match find_seq_ci(self.src, close.as_bytes(), at) {
                Some(i) => {
                    let after = self.src.get(i + close.len()).copied();
                    if matches!(after, None | Some(b'>' | b'/') | Some(b' ' | b'\t' | b'\n' | b'\r' | b'\x0c')) {
                        break i;
                    }
                    at = i + 1;
                }
                None => break self.src.len(),
            }
        };
        if body_end > from {
            self.out.push(Token::RawText(from..body_end));
        }
        self.text_start = body_end;
        body_end
    }
}

/// Parses `<name attr=...>` starting at `lt`. `None` if the tag never closes.
fn parse_start_tag(src: &[u8], lt: usize) -> Option<StartTag> {
    let name_end = scan_name(src, lt + 1);
    let name = lower(&src[lt + 1..name_end]);
    let mut attrs = Vec::new();
    let mut i = name_end;

    loop {
        i = skip_ws(src, i);
        match src.get(i)? {
            b'>' => {
                return Some(StartTag {
                    name,
                    attrs,
                    self_closing: false,
                    span: lt..i + 1,
                    insert_at: i,
                });
            }
            b'/' if src.get(i + 1) == Some(&b'>') => {
                return Some(StartTag {
                    name,
                    attrs,
                    self_closing: true,
                    span: lt..i + 2,
                    insert_at: i,
                });
            }
            b'/' => {
                i += 1;
                continue;
            }
            _ => {}
        }

        let attr_start = i;
        while let Some(&b) = src.get(i) {
            if b.is_ascii_whitespace() || b == b'=' || b == b'>' || (b == b'/' && i > attr_start) {
                break;
            }
            i += 1;
        }
        if i == attr_start {
            // Stray character such as a lone quote.
            i += 1;
            continue;
        }
        let attr_name = lower(&src[attr_start..i]);

        let j = skip_ws(src, i);
        if src.get(j) != Some(&b'=') {
            attrs.push(Attr {
                name: attr_name,
                value: None,
            });
            continue;
        }

        let v = skip_ws(src, j + 1);
        let (value, next) = match src.get(v)? {
            q @ (b'"' | b'\'') => {
                let close = find_byte(src, *q, v + 1)?;
                (&src[v + 1..close], close + 1)
            }
            _ => {
                let mut k = v;
                while let Some(&b) = src.get(k) {
                    if b.is_ascii_whitespace() || b == b'>' {
                        break;
                    }
                    k += 1;
                }
                (&src[v..k], k)
            }
        };
        attrs.push(Attr {
            name: attr_name,
            value: Some(String::from_utf8_lossy(value).into_owned()),
        });
        i = next;
    }
}

fn scan_name(src: &[u8], mut i: usize) -> usize {
    while let Some(&b) = src.get(i) {
        if b.is_ascii_whitespace() || b == b'/' || b == b'>' {
            break;
        }
        i += 1;
    }
    i
}

fn skip_ws(src: &[u8], mut i: usize) -> usize {
    while src.get(i).is_some_and(u8::is_ascii_whitespace) {
        i += 1;
    }
    i
}

fn lower(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).to_ascii_lowercase()
}

fn find_byte(src: &[u8], needle: u8, from: usize) -> Option<usize> {
    src.get(from..)?
        .iter()
        .position(|&b| b == needle)
        .map(|p| p + from)
}

fn find_seq(src: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    src.get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

fn find_seq_ci(src: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    src.get(from..)?
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))
        .map(|p| p + from)
}
