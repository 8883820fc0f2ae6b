use anyhow::{anyhow, bail, Result};
use serde_json::Value;

use crate::params::{Param, Params};
use crate::value::number_value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    /// `{#path}`
    Section,
    /// `{?path}`
    Exists,
    /// `{^path}`
    NotExists,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Reference {
        path: String,
        filters: Vec<String>,
    },
    Section {
        kind: SectionKind,
        path: String,
        params: Params,
        block: Vec<Node>,
        else_block: Option<Vec<Node>>,
    },
    Helper {
        name: String,
        params: Params,
        block: Option<Vec<Node>>,
        else_block: Option<Vec<Node>>,
    },
}

enum Stop {
    Eof,
    Else,
    Close(String),
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

fn is_path_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '$' | '.' | '-')
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '$' | '-')
}

fn is_reference_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || matches!(ch, '_' | '$' | '.')
}

fn push_text(nodes: &mut Vec<Node>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Node::Text(last)) = nodes.last_mut() {
        last.push_str(text);
    } else {
        nodes.push(Node::Text(text.to_string()));
    }
}

fn special(name: &str) -> Option<&'static str> {
    match name {
        "n" => Some("\n"),
        "r" => Some("\r"),
        "s" => Some(" "),
        "lb" => Some("{"),
        "rb" => Some("}"),
        _ => None,
    }
}

pub(crate) fn parse(source: &str) -> Result<Vec<Node>> {
    let mut parser = Parser { src: source, pos: 0 };
    let (nodes, stop) = parser.sequence()?;
    match stop {
        Stop::Eof => Ok(nodes),
        Stop::Else => bail!("unexpected {{:else}} outside of a block"),
        Stop::Close(name) => bail!("unexpected closing tag {{/{name}}}"),
    }
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn eat(&mut self, expected: &str) -> bool {
        if self.rest().starts_with(expected) {
            self.pos += expected.len();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().map_or(false, char::is_whitespace) {
            self.bump();
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().map_or(false, &pred) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    fn expect(&mut self, expected: &str) -> Result<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(anyhow!("expected `{expected}` at offset {}", self.pos))
        }
    }

    fn sequence(&mut self) -> Result<(Vec<Node>, Stop)> {
        let mut nodes = Vec::new();
        loop {
            let Some(offset) = self.rest().find('{') else {
                push_text(&mut nodes, self.rest());
                self.pos = self.src.len();
                return Ok((nodes, Stop::Eof));
            };
            push_text(&mut nodes, &self.rest()[..offset]);
            self.pos += offset;
            let tag_start = self.pos;
            self.bump();

            match self.peek() {
                Some('!') => {
                    let end = self
                        .rest()
                        .find("!}")
                        .ok_or_else(|| anyhow!("unterminated comment at offset {tag_start}"))?;
                    self.pos += end + 2;
                }
                Some('~') => {
                    self.bump();
                    let name = self.take_while(|ch| ch.is_ascii_alphabetic());
                    match special(name) {
                        Some(text) if self.eat("}") => push_text(&mut nodes, text),
                        _ => {
                            self.pos = tag_start + 1;
                            push_text(&mut nodes, "{");
                        }
                    }
                }
                Some(':') => {
                    self.bump();
                    let name = self.take_while(|ch| ch.is_ascii_alphanumeric());
                    if name != "else" {
                        bail!("unsupported body `{{:{name}}}` at offset {tag_start}");
                    }
                    self.expect("}")?;
                    return Ok((nodes, Stop::Else));
                }
                Some('/') => {
                    self.bump();
                    let name = self.take_while(is_path_char).to_string();
                    self.skip_whitespace();
                    self.expect("}")?;
                    return Ok((nodes, Stop::Close(name)));
                }
                Some(sigil @ ('#' | '?' | '^')) => {
                    self.bump();
                    let kind = match sigil {
                        '#' => SectionKind::Section,
                        '?' => SectionKind::Exists,
                        _ => SectionKind::NotExists,
                    };
                    nodes.push(self.section(kind, tag_start)?);
                }
                Some('@') => {
                    self.bump();
                    nodes.push(self.helper(tag_start)?);
                }
                Some(ch) if is_reference_start(ch) => match self.reference() {
                    Some(node) => nodes.push(node),
                    None => {
                        self.pos = tag_start + 1;
                        push_text(&mut nodes, "{");
                    }
                },
                _ => push_text(&mut nodes, "{"),
            }
        }
    }

    fn reference(&mut self) -> Option<Node> {
        let path = self.take_while(is_path_char).to_string();
        let mut filters = Vec::new();
        while self.eat("|") {
            let filter = self.take_while(|ch| ch.is_ascii_alphanumeric());
            if filter.is_empty() {
                return None;
            }
            filters.push(filter.to_string());
        }
        if self.eat("}") {
            Some(Node::Reference { path, filters })
        } else {
            None
        }
    }

    /// Parses parameters up to `}` or `/}`; returns whether the tag self-closes.
    fn params(&mut self) -> Result<(Params, bool)> {
        let mut params = Params::new();
        loop {
            self.skip_whitespace();
            if self.eat("/}") {
                return Ok((params, true));
            }
            if self.eat("}") {
                return Ok((params, false));
            }
            let start = self.pos;
            let name = self.take_while(is_name_char);
            if name.is_empty() {
                bail!("malformed parameter at offset {start}");
            }
            self.expect("=")?;
            let param = self.param_value()?;
            params.insert(name, param);
        }
    }

    fn param_value(&mut self) -> Result<Param> {
        let start = self.pos;
        match self.peek() {
            Some('"') => {
                self.bump();
                let mut text = String::new();
                loop {
                    match self.bump() {
                        Some('\\') => match self.bump() {
                            Some(escaped) => text.push(escaped),
                            None => break,
                        },
                        Some('"') => return Ok(string_param(text)?),
                        Some(ch) => text.push(ch),
                        None => break,
                    }
                }
                bail!("unterminated string parameter at offset {start}")
            }
            Some(ch) if ch.is_ascii_digit() || ch == '-' => {
                let raw = self.take_while(|ch| ch.is_ascii_digit() || matches!(ch, '-' | '.'));
                let number: f64 = raw
                    .parse()
                    .map_err(|_| anyhow!("invalid number `{raw}` at offset {start}"))?;
                Ok(Param::Literal(number_value(number)))
            }
            Some(ch) if is_path_char(ch) => {
                Ok(Param::Path(self.take_while(is_path_char).to_string()))
            }
            _ => bail!("missing parameter value at offset {start}"),
        }
    }

    fn section(&mut self, kind: SectionKind, tag_start: usize) -> Result<Node> {
        let path = self.take_while(is_path_char).to_string();
        if path.is_empty() {
            bail!("section without a path at offset {tag_start}");
        }
        let (params, self_closing) = self.params()?;
        let (block, else_block) = if self_closing {
            (Vec::new(), None)
        } else {
            self.bodies(&path, tag_start)?
        };
        Ok(Node::Section {
            kind,
            path,
            params,
            block,
            else_block,
        })
    }

    fn helper(&mut self, tag_start: usize) -> Result<Node> {
        let name = self.take_while(is_name_char).to_string();
        if name.is_empty() {
            bail!("helper without a name at offset {tag_start}");
        }
        let (params, self_closing) = self.params()?;
        if self_closing {
            return Ok(Node::Helper {
                name,
                params,
                block: None,
                else_block: None,
            });
        }
        let (block, else_block) = self.bodies(&name, tag_start)?;
        Ok(Node::Helper {
            name,
            params,
            block: Some(block),
            else_block,
        })
    }

    fn bodies(&mut self, open: &str, tag_start: usize) -> Result<(Vec<Node>, Option<Vec<Node>>)> {
        let (block, stop) = self.sequence()?;
        let (else_block, stop) = match stop {
            Stop::Else => {
                let (nodes, stop) = self.sequence()?;
                if matches!(stop, Stop::Else) {
                    bail!("duplicate {{:else}} in `{open}` opened at offset {tag_start}");
                }
                (Some(nodes), stop)
            }
            other => (None, other),
        };
        match stop {
            Stop::Close(name) if name == open => Ok((block, else_block)),
            Stop::Close(name) => bail!(
                "mismatched closing tag {{/{name}}} for `{open}` opened at offset {tag_start}"
            ),
            _ => bail!("unclosed tag `{open}` opened at offset {tag_start}"),
        }
    }
}

fn string_param(text: String) -> Result<Param> {
    if !text.contains('{') {
        return Ok(Param::Literal(Value::String(text)));
    }
    let nodes = parse(&text)?;
    match nodes.as_slice() {
        [] => Ok(Param::Literal(Value::String(String::new()))),
        [Node::Text(plain)] => Ok(Param::Literal(Value::String(plain.clone()))),
        _ => Ok(Param::Template(nodes)),
    }
}
