//! WXML Markup Parser
//!
//! Drives the html5ever tokenizer directly and assembles a plain
//! `Element`/`Text`/`Comment` tree. The HTML tree builder is not used: WXML
//! has none of its insertion rules (implicit `<body>`, `<image>` renamed to
//! `<img>`, foster parenting, raw-text `<textarea>`).

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::{
    BufferQueue, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    static ref MUSTACHE_SPAN_RE: Regex = Regex::new(r"(?s)\{\{.+?\}\}").unwrap();
    static ref PLACEHOLDER_RE: Regex = Regex::new(r"__TZ_INTERP_(\d+)__").unwrap();
    static ref NAME_PLACEHOLDER_RE: Regex = Regex::new(r"tz__name_(\d+)__").unwrap();

    /// Tags that never have children, closed or not.
    static ref VOID_TAGS: HashSet<&'static str> = {
        let mut s = HashSet::new();
        s.insert("area");
        s.insert("base");
        s.insert("br");
        s.insert("col");
        s.insert("command");
        s.insert("embed");
        s.insert("hr");
        s.insert("img");
        s.insert("input");
        s.insert("keygen");
        s.insert("link");
        s.insert("meta");
        s.insert("param");
        s.insert("source");
        s.insert("track");
        s.insert("wbr");
        s
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// MARKUP TREE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupNode {
    Element(MarkupElement),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupElement {
    pub tag_name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<MarkupNode>,
    pub line: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub key: String,
    /// `None` for bare attributes such as `wx:else` (an empty value counts
    /// as bare).
    pub value: Option<String>,
}

impl MarkupNode {
    /// Comments and whitespace-only text carry nothing for the UI tree.
    pub fn is_significant(&self) -> bool {
        match self {
            MarkupNode::Element(_) => true,
            MarkupNode::Text(content) => !content.trim().is_empty(),
            MarkupNode::Comment(_) => false,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TOKEN SINK
// ═══════════════════════════════════════════════════════════════════════════════

struct TreeSink {
    interpolations: Vec<String>,
    names: Vec<String>,
    roots: Vec<MarkupNode>,
    open: Vec<MarkupElement>,
    text: String,
}

impl TreeSink {
    fn new(interpolations: Vec<String>, names: Vec<String>) -> Self {
        Self {
            interpolations,
            names,
            roots: Vec::new(),
            open: Vec::new(),
            text: String::new(),
        }
    }

    fn restore(&self, value: &str) -> String {
        PLACEHOLDER_RE
            .replace_all(value, |caps: &regex::Captures| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| self.interpolations.get(index))
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    fn restore_names(&self, text: &str) -> String {
        NAME_PLACEHOLDER_RE
            .replace_all(text, |caps: &regex::Captures| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| self.names.get(index))
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    fn append(&mut self, node: MarkupNode) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.roots.push(node),
        }
    }

    fn flush_text(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.text);
        let content = self.restore(&text);
        self.append(MarkupNode::Text(content));
    }

    fn close_top(&mut self) {
        if let Some(element) = self.open.pop() {
            self.append(MarkupNode::Element(element));
        }
    }

    fn start_tag(&mut self, tag: html5ever::tokenizer::Tag, line: u64) {
        let tag_name = self.restore_names(&tag.name);
        let attributes = tag
            .attrs
            .iter()
            .map(|attr| {
                let value = self.restore(&attr.value);
                Attribute {
                    key: self.restore_names(&attr.name.local),
                    value: if value.is_empty() { None } else { Some(value) },
                }
            })
            .collect();
        let element = MarkupElement {
            tag_name,
            attributes,
            children: Vec::new(),
            line,
        };
        if tag.self_closing || VOID_TAGS.contains(element.tag_name.as_str()) {
            self.append(MarkupNode::Element(element));
        } else {
            self.open.push(element);
        }
    }

    fn end_tag(&mut self, name: &str) {
        match self.open.iter().rposition(|el| el.tag_name == name) {
            Some(index) => {
                while self.open.len() > index {
                    self.close_top();
                }
            }
            None => debug!("ignoring unmatched closing tag </{}>", name),
        }
    }

    fn finish(mut self) -> Vec<MarkupNode> {
        self.flush_text();
        while !self.open.is_empty() {
            self.close_top();
        }
        self.roots
    }
}

impl TokenSink for TreeSink {
    type Handle = ();

    fn process_token(&mut self, token: Token, line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::CharacterTokens(chars) => self.text.push_str(&chars),
            Token::NullCharacterToken => {}
            Token::TagToken(tag) => {
                self.flush_text();
                match tag.kind {
                    TagKind::StartTag => self.start_tag(tag, line_number),
                    TagKind::EndTag => {
                        let name = self.restore_names(&tag.name);
                        self.end_tag(&name)
                    }
                }
            }
            Token::CommentToken(comment) => {
                self.flush_text();
                let content = self.restore(&comment);
                self.append(MarkupNode::Comment(content));
            }
            Token::ParseError(message) => {
                debug!("markup tokenizer recovered at line {}: {}", line_number, message);
            }
            Token::DoctypeToken(_) | Token::EOFToken => {}
        }
        TokenSinkResult::Continue
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PARSING
// ═══════════════════════════════════════════════════════════════════════════════

/// Replaces every `{{...}}` span with a placeholder so `<`/`>` inside an
/// expression never reach the tokenizer.
fn shield_interpolations(markup: &str) -> (String, Vec<String>) {
    let mut spans = Vec::new();
    let shielded = MUSTACHE_SPAN_RE
        .replace_all(markup, |caps: &regex::Captures| {
            let placeholder = format!("__TZ_INTERP_{}__", spans.len());
            spans.push(caps[0].to_string());
            placeholder
        })
        .into_owned();
    (shielded, spans)
}

fn shield_name(name: &str, names: &mut Vec<String>) -> String {
    if !name.chars().any(|c| c.is_ascii_uppercase()) {
        return name.to_string();
    }
    names.push(name.to_string());
    format!("tz__name_{}__", names.len() - 1)
}

/// Length of the tag starting at `tag[0] == '<'`, up to and excluding the
/// closing `>` outside quotes.
fn tag_len(tag: &str) -> usize {
    let mut quote = None;
    for (index, c) in tag.char_indices().skip(1) {
        match (quote, c) {
            (Some(open), c) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return index,
            _ => {}
        }
    }
    tag.len()
}

/// Shields the tag and attribute names of one tag, `<` to before `>`.
fn shield_tag(tag: &str, names: &mut Vec<String>) -> String {
    let is_name_end = |c: char| c.is_whitespace() || c == '/' || c == '>' || c == '=';
    let prefix = if tag.starts_with("</") { 2 } else { 1 };
    let mut out = tag[..prefix].to_string();
    let mut rest = &tag[prefix..];

    let end = rest.find(|c: char| c.is_whitespace() || c == '/').unwrap_or(rest.len());
    out.push_str(&shield_name(&rest[..end], names));
    rest = &rest[end..];

    while !rest.is_empty() {
        let skip = rest.find(|c: char| !c.is_whitespace() && c != '/').unwrap_or(rest.len());
        out.push_str(&rest[..skip]);
        rest = &rest[skip..];
        if rest.is_empty() {
            break;
        }

        let end = rest.find(is_name_end).unwrap_or(rest.len()).max(1);
        out.push_str(&shield_name(&rest[..end], names));
        rest = &rest[end..];

        let skip = rest.find(|c: char| !c.is_whitespace()).unwrap_or(rest.len());
        if !rest[skip..].starts_with('=') {
            continue;
        }
        let after_eq = skip + 1;
        let value_start = rest[after_eq..]
            .find(|c: char| !c.is_whitespace())
            .map_or(rest.len(), |i| after_eq + i);
        let value_end = match rest[value_start..].chars().next() {
            Some(quote @ ('"' | '\'')) => rest[value_start + 1..]
                .find(quote)
                .map_or(rest.len(), |i| value_start + 1 + i + 1),
            Some(_) => rest[value_start..]
                .find(char::is_whitespace)
                .map_or(rest.len(), |i| value_start + i),
            None => rest.len(),
        };
        out.push_str(&rest[..value_end]);
        rest = &rest[value_end..];
    }
    out
}

/// Replaces tag and attribute names holding uppercase letters with
/// lowercase placeholders, since the tokenizer folds names to lowercase.
fn shield_names(markup: &str) -> (String, Vec<String>) {
    let mut names = Vec::new();
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        rest = &rest[open..];

        if let Some(body) = rest.strip_prefix("<!--") {
            let end = body.find("-->").map_or(rest.len(), |i| 4 + i + 3);
            out.push_str(&rest[..end]);
            rest = &rest[end..];
            continue;
        }

        let name_start = if rest.starts_with("</") { 2 } else { 1 };
        if !rest[name_start..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            out.push('<');
            rest = &rest[1..];
            continue;
        }

        let end = tag_len(rest);
        out.push_str(&shield_tag(&rest[..end], &mut names));
        rest = &rest[end..];
    }
    out.push_str(rest);
    (out, names)
}

/// Parses WXML into its top-level nodes, comments and whitespace included.
pub fn parse_markup(markup: &str) -> Vec<MarkupNode> {
    let (shielded, interpolations) = shield_interpolations(markup.trim_end());
    let (shielded, names) = shield_names(&shielded);

    let mut tokenizer = Tokenizer::new(TreeSink::new(interpolations, names), TokenizerOpts::default());
    let mut queue = BufferQueue::default();
    queue.push_back(StrTendril::from_slice(&shielded));
    let _ = tokenizer.feed(&mut queue);
    tokenizer.end();

    tokenizer.sink.finish()
}
