//! Streaming tokenizer for the post markup vocabulary.
//!
//! The tokenizer is deliberately small: it understands open/close tags with attributes,
//! skips `<!...>` declarations and comments, and decodes the common HTML entities in text
//! and attribute values. Which tags *mean* something is decided by [`TagKind`].
use std::borrow::Cow;
use std::iter::FusedIterator;
use std::ops::Range;

use crate::error::ParseError;
use crate::error::ParseErrorKind;

const MAX_ENTITY_LEN: usize = 10;

/// The fixed tag vocabulary understood by the layout engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagKind {
    LineBreak,
    Link,
    Bold,
    Other,
}

impl TagKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "br" => Self::LineBreak,
            "a" => Self::Link,
            "strong" => Self::Bold,
            _ => Self::Other,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute<'a> {
    pub name: Cow<'a, str>,
    pub value: Cow<'a, str>,
}

/// Returns the value of the first attribute called `name`.
pub fn attr<'b>(attrs: &'b [Attribute<'_>], name: &str) -> Option<&'b str> {
    attrs
        .iter()
        .find(|a| a.name == name)
        .map(|a| a.value.as_ref())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event<'a> {
    Open {
        name: Cow<'a, str>,
        attrs: Vec<Attribute<'a>>,
    },
    Close {
        name: Cow<'a, str>,
    },
    Text(Cow<'a, str>),
}

impl Event<'_> {
    pub fn tag_kind(&self) -> Option<TagKind> {
        match self {
            Event::Open { name, .. } | Event::Close { name } => Some(TagKind::from_name(name)),
            Event::Text(_) => None,
        }
    }
}

enum Markup {
    Open,
    Close,
    Declaration,
    Literal,
}

fn markup_at(rest: &[u8]) -> Markup {
    match rest {
        [b'<', b'/', c, ..] if c.is_ascii_alphabetic() => Markup::Close,
        [b'<', b'!', ..] => Markup::Declaration,
        [b'<', c, ..] if c.is_ascii_alphabetic() => Markup::Open,
        _ => Markup::Literal,
    }
}

/// Lazily splits markup into `(byte offset, event)` pairs.
///
/// Text between two tags is always delivered as a single [`Event::Text`], even when a comment
/// sits in the middle of it. Tags left open at end of input are not an error. After the first
/// error the iterator is exhausted.
#[derive(Clone, Debug)]
pub struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
    done: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            done: false,
        }
    }

    /// Byte offset of the next unread input.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn next_event(&mut self) -> Result<Option<(usize, Event<'a>)>, ParseError> {
        let src = self.src;
        let mut text: Vec<Range<usize>> = Vec::new();

        while self.pos < src.len() {
            let start = self.pos;
            match markup_at(&src.as_bytes()[start..]) {
                Markup::Open | Markup::Close if !text.is_empty() => break,
                Markup::Open => return self.open_tag().map(|ev| Some((start, ev))),
                Markup::Close => return self.close_tag().map(|ev| Some((start, ev))),
                Markup::Declaration => self.skip_declaration(),
                Markup::Literal => {
                    let end = src.as_bytes()[start + 1..]
                        .iter()
                        .position(|&b| b == b'<')
                        .map_or(src.len(), |i| start + 1 + i);
                    match text.last_mut() {
                        Some(last) if last.end == start => last.end = end,
                        _ => text.push(start..end),
                    }
                    self.pos = end;
                }
            }
        }

        let Some(offset) = text.first().map(|r| r.start) else {
            return Ok(None);
        };
        let content = match text.as_slice() {
            [range] => decode_entities(&src[range.clone()]),
            ranges => Cow::Owned(
                ranges
                    .iter()
                    .map(|r| decode_entities(&src[r.clone()]))
                    .collect(),
            ),
        };
        Ok(Some((offset, Event::Text(content))))
    }

    fn open_tag(&mut self) -> Result<Event<'a>, ParseError> {
        let start = self.pos;
        self.pos += 1;
        let name = self.tag_name();
        let attrs = self.attributes(start)?;
        Ok(Event::Open { name, attrs })
    }

    fn close_tag(&mut self) -> Result<Event<'a>, ParseError> {
        let start = self.pos;
        self.pos += 2;
        let name = self.tag_name();
        self.skip_whitespace();
        match self.peek() {
            Some(b'>') => {
                self.pos += 1;
                Ok(Event::Close { name })
            }
            Some(b'/') if self.src.as_bytes().get(self.pos + 1) == Some(&b'>') => {
                self.pos += 2;
                Ok(Event::Close { name })
            }
            None => Err(ParseError::new(start, ParseErrorKind::UnterminatedTag)),
            Some(_) => Err(ParseError::new(
                start,
                ParseErrorKind::CloseTagAttributes(name.into_owned()),
            )),
        }
    }

    fn skip_declaration(&mut self) {
        let rest = &self.src[self.pos..];
        let consumed = if let Some(body) = rest.strip_prefix("<!--") {
            body.find("-->").map_or(rest.len(), |i| 4 + i + 3)
        } else {
            rest.find('>').map_or(rest.len(), |i| i + 1)
        };
        self.pos += consumed;
    }

    fn tag_name(&mut self) -> Cow<'a, str> {
        let src = self.src;
        let start = self.pos;
        let len = src.as_bytes()[start..]
            .iter()
            .position(|&b| b.is_ascii_whitespace() || b == b'/' || b == b'>')
            .unwrap_or(src.len() - start);
        self.pos = start + len;
        ascii_lowercase(&src[start..self.pos])
    }

    fn attributes(&mut self, tag_start: usize) -> Result<Vec<Attribute<'a>>, ParseError> {
        let mut attrs = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(ParseError::new(tag_start, ParseErrorKind::UnterminatedTag)),
                Some(b'>') => {
                    self.pos += 1;
                    return Ok(attrs);
                }
                Some(b'/') => self.pos += 1,
                Some(_) => {
                    let name = self.attribute_name();
                    self.skip_whitespace();
                    let value = if self.peek() == Some(b'=') {
                        self.pos += 1;
                        self.skip_whitespace();
                        self.attribute_value(tag_start)?
                    } else {
                        Cow::Borrowed("")
                    };
                    attrs.push(Attribute { name, value });
                }
            }
        }
    }

    fn attribute_name(&mut self) -> Cow<'a, str> {
        let src = self.src;
        let start = self.pos;
        // The first byte is always taken so a stray `=` cannot stall the scanner.
        let from = start + 1;
        let len = src.as_bytes()[from..]
            .iter()
            .position(|&b| b.is_ascii_whitespace() || matches!(b, b'=' | b'>' | b'/'))
            .unwrap_or(src.len() - from);
        self.pos = from + len;
        ascii_lowercase(&src[start..self.pos])
    }

    fn attribute_value(&mut self, tag_start: usize) -> Result<Cow<'a, str>, ParseError> {
        let src = self.src;
        let bytes = src.as_bytes();
        match self.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                let start = self.pos + 1;
                let Some(len) = bytes[start..].iter().position(|&b| b == quote) else {
                    return Err(ParseError::new(
                        tag_start,
                        ParseErrorKind::UnterminatedAttribute,
                    ));
                };
                self.pos = start + len + 1;
                Ok(decode_entities(&src[start..start + len]))
            }
            _ => {
                let start = self.pos;
                let len = bytes[start..]
                    .iter()
                    .position(|&b| b.is_ascii_whitespace() || b == b'>')
                    .unwrap_or(bytes.len() - start);
                self.pos = start + len;
                Ok(decode_entities(&src[start..self.pos]))
            }
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<(usize, Event<'a>), ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_event() {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl FusedIterator for Tokenizer<'_> {}

fn ascii_lowercase(s: &str) -> Cow<'_, str> {
    if s.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Owned(s.to_ascii_lowercase())
    } else {
        Cow::Borrowed(s)
    }
}

/// Decodes `&amp;`-style entities. Unknown or malformed entities are kept verbatim.
pub fn decode_entities(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .filter(|&end| end <= MAX_ENTITY_LEN)
            .and_then(|end| decode_entity(&tail[1..end]).map(|ch| (ch, end)));
        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Strips tags and decodes entities; `br` becomes `\n`.
pub fn plain_text(markup: &str) -> Result<String, ParseError> {
    let mut out = String::new();
    for token in Tokenizer::new(markup) {
        match token?.1 {
            Event::Text(text) => out.push_str(&text),
            Event::Open { name, .. } if TagKind::from_name(&name) == TagKind::LineBreak => {
                out.push('\n');
            }
            _ => {}
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(src: &str) -> Vec<Event<'_>> {
        Tokenizer::new(src)
            .map(|t| t.map(|(_, ev)| ev))
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    fn text(s: &str) -> Event<'_> {
        Event::Text(Cow::Borrowed(s))
    }

    #[test]
    fn text_between_tags_is_a_single_event() {
        let evs = events("a<strong>b c</strong>d");
        assert_eq!(evs.len(), 5);
        assert_eq!(evs[0], text("a"));
        assert_eq!(evs[1].tag_kind(), Some(TagKind::Bold));
        assert_eq!(evs[2], text("b c"));
        assert!(matches!(&evs[3], Event::Close { name } if name == "strong"));
        assert_eq!(evs[4], text("d"));
    }

    #[test]
    fn parses_quoted_and_bare_attributes() {
        let evs = events(r#"<a href="/b/res/1.html#2" class=post-reply-link data-num='2' hidden>"#);
        let Event::Open { name, attrs } = &evs[0] else {
            panic!("expected open tag, got {evs:?}");
        };
        assert_eq!(name, "a");
        assert_eq!(attr(attrs, "href"), Some("/b/res/1.html#2"));
        assert_eq!(attr(attrs, "class"), Some("post-reply-link"));
        assert_eq!(attr(attrs, "data-num"), Some("2"));
        assert_eq!(attr(attrs, "hidden"), Some(""));
    }

    #[test]
    fn tag_names_are_case_insensitive_and_self_closing_is_open() {
        let evs = events("<BR><br/><br />");
        assert_eq!(evs.len(), 3);
        assert!(
            evs.iter()
                .all(|e| matches!(e, Event::Open { .. }) && e.tag_kind() == Some(TagKind::LineBreak))
        );
    }

    #[test]
    fn unclosed_tags_at_end_of_input_are_fine() {
        let evs = events("<strong><a>x");
        assert_eq!(evs.len(), 3);
        assert_eq!(evs[2], text("x"));
    }

    #[test]
    fn close_tag_with_attributes_is_an_error() {
        let mut t = Tokenizer::new("ok</a href=x>tail");
        assert!(matches!(t.next(), Some(Ok((0, Event::Text(_))))));
        let err = t.next().unwrap().unwrap_err();
        assert_eq!(err.offset, 2);
        assert_eq!(err.kind, ParseErrorKind::CloseTagAttributes("a".to_string()));
        assert!(t.next().is_none());
    }

    #[test]
    fn unterminated_tag_is_an_error() {
        let err = Tokenizer::new("x <a href=y")
            .find_map(Result::err)
            .unwrap();
        assert_eq!(err, ParseError::new(2, ParseErrorKind::UnterminatedTag));

        let err = Tokenizer::new(r#"<a href="oops>text"#)
            .find_map(Result::err)
            .unwrap();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedAttribute);
    }

    #[test]
    fn stray_angle_brackets_are_text() {
        assert_eq!(events("a < b <3 </ x"), vec![text("a < b <3 </ x")]);
    }

    #[test]
    fn comments_are_skipped_without_splitting_text() {
        let evs = events("a<!-- note -->b<!DOCTYPE html>c");
        assert_eq!(evs, vec![Event::Text(Cow::Owned("abc".to_string()))]);
    }

    #[test]
    fn decodes_entities() {
        assert_eq!(
            decode_entities("&gt;&gt;123 &amp; &#1071;&#x44; &bogus; &"),
            ">>123 & ЯD &bogus; &"
        );
        assert!(matches!(decode_entities("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn reports_event_offsets() {
        let offsets: Vec<usize> = Tokenizer::new("ab<br>cd</x>")
            .map(|t| t.unwrap().0)
            .collect();
        assert_eq!(offsets, vec![0, 2, 6, 8]);
    }

    #[test]
    fn plain_text_strips_tags() {
        assert_eq!(
            plain_text("<strong>Re:</strong> &quot;hi&quot;<br>there").unwrap(),
            "Re: \"hi\"\nthere"
        );
    }
}
