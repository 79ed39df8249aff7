//! JSDoc comment parser.
//!
//! Works on the raw leading comment of anything [`Documented`]:
//! - text before the first tag → description
//! - `@tag value` lines, with continuation lines, → [`Tags`]
//! - `@example` blocks → dedented code
//! - `@param [{type}] name - description` → [`ParamTag`]
//!
//! Lines inside a ``` fence never start a tag.

use crate::source::Documented;
use regex::Regex;
use std::sync::LazyLock;

static RE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@([A-Za-z][\w-]*)(?:\s+(.*))?$").unwrap());

static RE_INLINE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{@(?:link|linkcode|linkplain)\s+([^\s|}]+)(?:\s*\|\s*|\s+)?([^}]*)\}").unwrap()
});

static RE_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(?:\{[^}]*\}\s*)?\[?([A-Za-z_$][\w$.]*)(?:=[^\]]*)?\]?\s+-\s+(.*)$").unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsDocTag {
    pub tag_name: String,
    pub value: String,
}

/// Tags in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags(Vec<JsDocTag>);

impl Tags {
    /// Value of a simple tag. Last occurrence wins.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|t| t.tag_name == name)
            .map(|t| t.value.as_str())
    }

    /// Every value of a repeatable tag, in source order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|t| t.tag_name == name)
            .map(|t| t.value.as_str())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|t| t.tag_name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamTag {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone)]
struct RawTag {
    name: String,
    /// Text after the tag name on the tag line, then each continuation line
    /// with markers stripped but indentation kept.
    lines: Vec<String>,
}

/// A parsed leading comment.
#[derive(Debug, Clone, Default)]
pub struct DocComment {
    raw: String,
    description: Vec<String>,
    tags: Vec<RawTag>,
}

impl DocComment {
    pub fn parse(raw: &str) -> Self {
        let mut doc = DocComment {
            raw: raw.to_string(),
            ..Default::default()
        };
        let mut in_fence = false;

        for line in body_lines(raw) {
            let trimmed = line.trim();
            if trimmed.starts_with("```") {
                in_fence = !in_fence;
            } else if !in_fence {
                if let Some(caps) = RE_TAG.captures(trimmed) {
                    doc.tags.push(RawTag {
                        name: caps[1].to_string(),
                        lines: vec![caps.get(2).map_or("", |m| m.as_str()).to_string()],
                    });
                    continue;
                }
            }
            match doc.tags.last_mut() {
                Some(tag) => tag.lines.push(line),
                None => doc.description.push(line),
            }
        }
        doc
    }

    pub fn of<N: Documented + ?Sized>(node: &N) -> Self {
        Self::parse(node.leading_comment().unwrap_or(""))
    }

    pub fn is_jsdoc(&self) -> bool {
        self.raw.starts_with("/**") && !self.raw.starts_with("/**/")
    }

    /// Pre-tag lines joined by single spaces.
    pub fn description(&self) -> String {
        let lines: Vec<&str> = self
            .description
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty() && !l.starts_with("```"))
            .collect();
        flatten_links(&lines.join(" ")).trim().to_string()
    }

    pub fn tags(&self) -> Tags {
        Tags(
            self.tags
                .iter()
                .map(|tag| JsDocTag {
                    tag_name: tag.name.clone(),
                    value: tag_value(&tag.lines),
                })
                .collect(),
        )
    }

    /// Every `@example` block, dedented.
    pub fn examples(&self) -> Vec<String> {
        self.tags
            .iter()
            .filter(|t| t.name == "example")
            .filter_map(|t| example_text(&t.lines))
            .collect()
    }

    pub fn params(&self) -> Vec<ParamTag> {
        self.tags
            .iter()
            .filter(|t| t.name == "param")
            .filter_map(|t| parse_param(&tag_value(&t.lines)))
            .collect()
    }

    /// `@param` values that do not have the `name - description` shape.
    pub fn unmatched_params(&self) -> Vec<String> {
        self.tags
            .iter()
            .filter(|t| t.name == "param")
            .map(|t| tag_value(&t.lines))
            .filter(|v| parse_param(v).is_none())
            .collect()
    }

    pub fn returns(&self) -> String {
        let tags = self.tags();
        tags.get("returns")
            .or_else(|| tags.get("return"))
            .unwrap_or("")
            .trim()
            .to_string()
    }
}

/// Split a comment into lines without its delimiters or leading `*`.
fn body_lines(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if let Some(line) = raw.strip_prefix("//") {
        let line = line.trim_start_matches('/');
        return vec![line.strip_prefix(' ').unwrap_or(line).to_string()];
    }
    let inner = raw.strip_prefix("/*").unwrap_or(raw);
    let inner = inner.strip_prefix('*').unwrap_or(inner);
    let inner = inner.strip_suffix("*/").unwrap_or(inner);

    inner
        .lines()
        .map(|line| {
            let start = line.trim_start();
            match start.strip_prefix('*') {
                Some(rest) => rest.strip_prefix(' ').unwrap_or(rest).to_string(),
                None => line.to_string(),
            }
        })
        .collect()
}

fn tag_value(lines: &[String]) -> String {
    let joined: Vec<&str> = lines.iter().map(|l| l.trim()).collect();
    flatten_links(joined.join("\n").trim()).trim().to_string()
}

/// `{@link target text}` → `text` (or `target` when there is no text).
fn flatten_links(text: &str) -> String {
    RE_INLINE_LINK
        .replace_all(text, |caps: &regex::Captures| {
            let label = caps.get(2).map_or("", |m| m.as_str()).trim();
            if label.is_empty() {
                caps[1].to_string()
            } else {
                label.to_string()
            }
        })
        .into_owned()
}

fn example_text(lines: &[String]) -> Option<String> {
    let caption = lines.first().map(|l| l.trim()).unwrap_or("");
    let body: Vec<&str> = lines
        .iter()
        .skip(1)
        .map(|l| l.trim_end())
        .filter(|l| !l.trim_start().starts_with("```"))
        .collect();

    let dedented = dedent(&body);
    match (caption.is_empty(), dedented.is_empty()) {
        (true, true) => None,
        (true, false) => Some(dedented),
        (false, true) => Some(caption.to_string()),
        (false, false) => Some(format!("{caption}\n{dedented}")),
    }
}

/// Strip leading/trailing blank lines and the common indentation.
pub fn dedent(lines: &[&str]) -> String {
    let first = lines.iter().position(|l| !l.trim().is_empty());
    let last = lines.iter().rposition(|l| !l.trim().is_empty());
    let (Some(first), Some(last)) = (first, last) else {
        return String::new();
    };
    let lines = &lines[first..=last];

    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|l| l.chars().skip(indent).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_param(value: &str) -> Option<ParamTag> {
    let caps = RE_PARAM.captures(value)?;
    Some(ParamTag {
        name: caps[1].to_string(),
        description: caps[2].trim().to_string(),
    })
}

// -- Node-level helpers -------------------------------------------------------

pub fn extract_raw_comment<N: Documented + ?Sized>(node: &N) -> String {
    node.leading_comment().unwrap_or("").to_string()
}

pub fn extract_tags<N: Documented + ?Sized>(node: &N) -> Tags {
    DocComment::of(node).tags()
}

pub fn extract_description<N: Documented + ?Sized>(node: &N) -> String {
    DocComment::of(node).description()
}

pub fn extract_example_tag<N: Documented + ?Sized>(node: &N) -> Option<String> {
    DocComment::of(node).examples().into_iter().next()
}

pub fn extract_example_tags<N: Documented + ?Sized>(node: &N) -> Vec<String> {
    DocComment::of(node).examples()
}

pub fn extract_param_tags<N: Documented + ?Sized>(node: &N) -> Vec<ParamTag> {
    DocComment::of(node).params()
}

pub fn extract_return_tag<N: Documented + ?Sized>(node: &N) -> String {
    DocComment::of(node).returns()
}

pub fn has_doc_comment<N: Documented + ?Sized>(node: &N) -> bool {
    DocComment::of(node).is_jsdoc()
}
