//! The template parser (§4.1.1).
//!
//! A cursor-based recursive-descent parser over the raw template string.
//! It never fails outright: every malformed construct is reported through
//! an [`ErrorSink`] and the parser recovers (skips the bad span) and keeps
//! going, exactly as specified.

use crate::compiler::ast::{AttrNode, DirArg, DirectiveNode, ElementNode, ForNode, IfBranch, IfNode, RootNode, TagType};
use crate::compiler::ast::AstNode;
use crate::compiler::errors::{ErrorCode, ErrorSink, Position};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The five text modes gating element/interpolation recognition (§4.1.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextMode {
    Data,
    RcData,
    RawText,
    CData,
}

#[derive(Debug, Clone, Default)]
pub struct ParserOptions {
    pub delimiters: Option<(String, String)>,
    /// Tag names whose text content is RAWTEXT (no interpolation, no child
    /// elements, ends only at the matching end tag) — `script`, `style`.
    pub raw_text_tags: Vec<String>,
    /// Tag names whose text content is RCDATA (interpolation recognized,
    /// no child elements) — `textarea`, `title`.
    pub rcdata_tags: Vec<String>,
    pub is_html_namespace: bool,
}

impl ParserOptions {
    fn open_delim(&self) -> &str {
        self.delimiters.as_ref().map(|(o, _)| o.as_str()).unwrap_or("{{")
    }
    fn close_delim(&self) -> &str {
        self.delimiters.as_ref().map(|(_, c)| c.as_str()).unwrap_or("}}")
    }
}

struct Cursor<'a> {
    src: &'a str,
    rest: &'a str,
    offset: usize,
    line: usize,
    column: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, rest: src, offset: 0, line: 1, column: 1 }
    }

    fn pos(&self) -> Position {
        Position { offset: self.offset, line: self.line, column: self.column }
    }

    fn is_eof(&self) -> bool {
        self.rest.is_empty()
    }

    fn starts_with(&self, s: &str) -> bool {
        self.rest.starts_with(s)
    }

    fn peek_char(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn advance(&mut self, n: usize) {
        for c in self.rest[..n].chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.rest = &self.rest[n..];
        self.offset += n;
    }

    fn advance_while(&mut self, mut pred: impl FnMut(char) -> bool) -> &'a str {
        let mut n = 0;
        for c in self.rest.chars() {
            if !pred(c) {
                break;
            }
            n += c.len_utf8();
        }
        let s = &self.rest[..n];
        self.advance(n);
        s
    }

    fn advance_until(&mut self, needle: &str) -> &'a str {
        match self.rest.find(needle) {
            Some(idx) => {
                let s = &self.rest[..idx];
                self.advance(idx);
                s
            }
            None => {
                let s = self.rest;
                self.advance(self.rest.len());
                s
            }
        }
    }
}

pub struct Parser<'a> {
    cursor: Cursor<'a>,
    options: ParserOptions,
    sink: &'a ErrorSink,
}

//--------------------------------------------------------------------------------------------------
// Entry point
//--------------------------------------------------------------------------------------------------

impl<'a> Parser<'a> {
    pub fn parse(src: &'a str, options: ParserOptions, sink: &'a ErrorSink) -> RootNode {
        let mut parser = Self { cursor: Cursor::new(src), options, sink };
        let children = parser.parse_children(TextMode::Data, &[], false);
        RootNode { children: collapse_whitespace(children) }
    }

    fn text_mode_for(&self, tag: &str) -> TextMode {
        let lower = tag.to_ascii_lowercase();
        if self.options.raw_text_tags.iter().any(|t| t == &lower) {
            TextMode::RawText
        } else if self.options.rcdata_tags.iter().any(|t| t == &lower) {
            TextMode::RcData
        } else {
            TextMode::Data
        }
    }

    //--------------------------------------------------------------------------------------------------
    // Children
    //--------------------------------------------------------------------------------------------------

    /// `pre` is `v-pre`'s scope (§4.1.1): once set by an ancestor, it holds
    /// for the whole subtree — interpolation is never recognized (`{{ }}`
    /// stays literal text) and descendant elements' attributes are never
    /// parsed as directives either (enforced in `parse_element`).
    fn parse_children(&mut self, mode: TextMode, ancestor_tags: &[String], pre: bool) -> Vec<AstNode> {
        let mut nodes: Vec<AstNode> = Vec::new();

        while !self.cursor.is_eof() {
            if self.is_end_tag_for_any(ancestor_tags) {
                break;
            }

            if mode == TextMode::Data || mode == TextMode::RcData {
                if self.cursor.starts_with("<!--") {
                    nodes.push(AstNode::Comment(self.parse_comment()));
                    continue;
                }
                if mode == TextMode::Data && self.cursor.starts_with("<!") {
                    // Doctype / bogus markup: treated as a bogus comment (§4.1.1).
                    let pos = self.cursor.pos();
                    self.cursor.advance_until(">");
                    if self.cursor.starts_with(">") {
                        self.cursor.advance(1);
                    } else {
                        self.sink.on_error(ErrorCode::EofInComment, pos);
                    }
                    continue;
                }
                if mode == TextMode::Data && self.cursor.starts_with("</") {
                    // A stray end tag with no matching open element.
                    let pos = self.cursor.pos();
                    self.sink.on_error(ErrorCode::XInvalidEndTag, pos);
                    self.cursor.advance_until(">");
                    if self.cursor.starts_with(">") {
                        self.cursor.advance(1);
                    }
                    continue;
                }
                if mode == TextMode::Data && self.cursor.starts_with("<") && starts_tag_name(&self.cursor.rest[1..]) {
                    if let Some(node) = self.parse_element(pre) {
                        nodes.push(node);
                    }
                    continue;
                }
                if !pre && mode == TextMode::Data && self.cursor.starts_with(self.options.open_delim()) {
                    nodes.push(self.parse_interpolation());
                    continue;
                }
            }

            nodes.push(self.parse_text(mode, pre));
        }

        collapse_whitespace(nodes)
    }

    fn is_end_tag_for_any(&self, ancestor_tags: &[String]) -> bool {
        if !self.cursor.starts_with("</") {
            return false;
        }
        let rest = &self.cursor.rest[2..];
        ancestor_tags.iter().any(|t| {
            rest.len() >= t.len()
                && rest[..t.len()].eq_ignore_ascii_case(t)
                && rest[t.len()..].chars().next().map(|c| c == '>' || c.is_whitespace() || c == '/').unwrap_or(true)
        })
    }

    //--------------------------------------------------------------------------------------------------
    // Text / interpolation / comment
    //--------------------------------------------------------------------------------------------------

    fn parse_text(&mut self, mode: TextMode, pre: bool) -> AstNode {
        let open = self.options.open_delim();
        let mut text = String::new();
        while !self.cursor.is_eof() {
            if mode == TextMode::Data && self.cursor.starts_with("<") {
                break;
            }
            if mode == TextMode::Data && !pre && self.cursor.starts_with(open) {
                break;
            }
            if let Some(c) = self.cursor.peek_char() {
                text.push(c);
                self.cursor.advance(c.len_utf8());
            }
        }
        AstNode::Text(text)
    }

    fn parse_interpolation(&mut self) -> AstNode {
        let open = self.options.open_delim().to_string();
        let close = self.options.close_delim().to_string();
        self.cursor.advance(open.len());
        let raw = self.cursor.advance_until(&close);
        if self.cursor.starts_with(&close) {
            self.cursor.advance(close.len());
        }
        AstNode::Interpolation(raw.trim().to_string())
    }

    fn parse_comment(&mut self) -> String {
        let pos = self.cursor.pos();
        self.cursor.advance(4);
        if self.cursor.starts_with(">") {
            self.sink.on_error(ErrorCode::AbruptClosingOfEmptyComment, pos);
            self.cursor.advance(1);
            return String::new();
        }
        let mut content = String::new();
        loop {
            if self.cursor.is_eof() {
                self.sink.on_error(ErrorCode::EofInComment, pos);
                break;
            }
            if self.cursor.starts_with("-->") {
                self.cursor.advance(3);
                break;
            }
            if self.cursor.starts_with("<!--") {
                self.sink.on_error(ErrorCode::NestedComment, self.cursor.pos());
            }
            if let Some(c) = self.cursor.peek_char() {
                content.push(c);
                self.cursor.advance(c.len_utf8());
            }
        }
        content
    }

    //--------------------------------------------------------------------------------------------------
    // Elements
    //--------------------------------------------------------------------------------------------------

    /// `inherited_pre` is `true` when an ancestor already has `v-pre` —
    /// once set, it applies to this element and its own children too,
    /// regardless of whether this tag repeats the attribute.
    fn parse_element(&mut self, inherited_pre: bool) -> Option<AstNode> {
        let loc = self.cursor.pos();
        self.cursor.advance(1); // '<'
        let tag = self.cursor.advance_while(|c| !c.is_whitespace() && c != '>' && c != '/').to_string();
        if tag.is_empty() {
            self.sink.on_error(ErrorCode::EofBeforeTagName, loc);
            return None;
        }

        let (raw_attrs, self_closing) = self.parse_attrs_raw();
        let is_pre = inherited_pre || raw_attrs.iter().any(|(name, _)| name == "v-pre");
        let attrs = if is_pre {
            raw_attrs.into_iter().map(|(name, value)| AttrNode::Static { name, value: value.unwrap_or_default() }).collect()
        } else {
            raw_attrs.into_iter().filter_map(|(name, value)| parse_attr(&name, value, self.sink, loc)).collect()
        };

        let tag_type = classify_tag(&tag, &attrs);
        let mut ancestors_with_self = Vec::new();
        ancestors_with_self.push(tag.clone());

        let children = if self_closing || is_void_element(&tag) {
            Vec::new()
        } else {
            let mode = self.text_mode_for(&tag);
            let children = self.parse_children(mode, &ancestors_with_self, is_pre);
            self.consume_matching_end_tag(&tag, loc);
            children
        };
        ancestors_with_self.clear();

        let element = ElementNode { tag, tag_type, attrs, children, is_pre, loc };
        Some(wrap_structural_directives(element))
    }

    fn consume_matching_end_tag(&mut self, tag: &str, open_loc: Position) {
        if self.cursor.starts_with("</") {
            let save = (self.cursor.offset, self.cursor.line, self.cursor.column);
            self.cursor.advance(2);
            let end_tag = self.cursor.advance_while(|c| !c.is_whitespace() && c != '>').to_string();
            self.cursor.advance_while(|c| c != '>');
            if self.cursor.starts_with(">") {
                self.cursor.advance(1);
            }
            if !end_tag.eq_ignore_ascii_case(tag) {
                // Not actually our end tag (shouldn't happen given the
                // ancestor-aware child loop, but stay defensive).
                self.cursor.offset = save.0;
            }
        } else {
            self.sink.on_error(ErrorCode::MissingEndTag, open_loc);
        }
    }

    /// Returns raw `(name, value)` pairs plus whether the tag self-closes.
    /// Values of `None` mean a valueless boolean attribute.
    fn parse_attrs_raw(&mut self) -> (Vec<(String, Option<String>)>, bool) {
        let mut attrs = Vec::new();
        loop {
            self.cursor.advance_while(|c| c.is_whitespace());
            if self.cursor.is_eof() {
                self.sink.on_error(ErrorCode::EofInTag, self.cursor.pos());
                return (attrs, false);
            }
            if self.cursor.starts_with("/>") {
                self.cursor.advance(2);
                return (attrs, true);
            }
            if self.cursor.starts_with(">") {
                self.cursor.advance(1);
                return (attrs, false);
            }
            let name_pos = self.cursor.pos();
            let name = self.cursor.advance_while(|c| !c.is_whitespace() && c != '=' && c != '>' && c != '/').to_string();
            if name.is_empty() {
                self.sink.on_error(ErrorCode::UnexpectedCharacterInAttributeName, name_pos);
                self.cursor.advance(1);
                continue;
            }
            self.cursor.advance_while(|c| c.is_whitespace());
            let value = if self.cursor.starts_with("=") {
                self.cursor.advance(1);
                self.cursor.advance_while(|c| c.is_whitespace());
                Some(self.parse_attr_value())
            } else {
                None
            };
            if attrs.iter().any(|(n, _): &(String, Option<String>)| n == &name) {
                self.sink.on_error(ErrorCode::DuplicateAttribute, name_pos);
            } else {
                attrs.push((name, value));
            }
        }
    }

    fn parse_attr_value(&mut self) -> String {
        match self.cursor.peek_char() {
            Some(q @ ('"' | '\'')) => {
                self.cursor.advance(1);
                let v = self.cursor.advance_until(&q.to_string());
                if self.cursor.starts_with(&q.to_string()) {
                    self.cursor.advance(1);
                }
                v.to_string()
            }
            _ => self.cursor.advance_while(|c| !c.is_whitespace() && c != '>').to_string(),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Free helpers
//--------------------------------------------------------------------------------------------------

fn starts_tag_name(s: &str) -> bool {
    s.chars().next().map(|c| c.is_alphabetic()).unwrap_or(false)
}

fn is_void_element(tag: &str) -> bool {
    matches!(
        tag.to_ascii_lowercase().as_str(),
        "area" | "base" | "br" | "col" | "embed" | "hr" | "img" | "input" | "link" | "meta" | "param" | "source" | "track" | "wbr"
    )
}

/// Classification rules (§4.1.1), checked in order.
fn classify_tag(tag: &str, attrs: &[AttrNode]) -> TagType {
    let has_dir = |name: &str| attrs.iter().any(|a| matches!(a, AttrNode::Directive(d) if d.name == name));
    let has_bind_is = attrs.iter().any(|a| {
        matches!(a, AttrNode::Directive(d) if d.name == "bind" && matches!(&d.arg, Some(DirArg::Static(n)) if n == "is"))
    });
    if has_dir("is") || has_bind_is {
        return TagType::Component;
    }
    let lower = tag.to_ascii_lowercase();
    if matches!(lower.as_str(), "teleport" | "keep-alive" | "keepalive" | "suspense" | "transition") {
        return TagType::Component;
    }
    if lower == "slot" {
        return TagType::Slot;
    }
    if lower == "template" {
        let structural = has_dir("if") || has_dir("else-if") || has_dir("else") || has_dir("for") || has_dir("slot");
        if structural {
            return TagType::Template;
        }
        return TagType::Element;
    }
    let first = tag.chars().next().unwrap_or_default();
    if first.is_uppercase() || lower == "component" {
        return TagType::Component;
    }
    TagType::Element
}

/// Maps a raw `(name, value)` attribute into an `AttrNode`, dispatching the
/// directive-attribute regex `^(v-[a-z0-9-]+|:|@|#)` (§4.1.1).
fn parse_attr(name: &str, value: Option<String>, sink: &ErrorSink, loc: Position) -> Option<AttrNode> {
    if let Some(rest) = name.strip_prefix("v-") {
        let (dir_name, arg, modifiers) = split_directive_name(rest, name, sink, loc);
        return Some(AttrNode::Directive(DirectiveNode { name: dir_name, arg, modifiers, exp: value }));
    }
    if let Some(rest) = name.strip_prefix(':') {
        let (arg_src, modifiers) = split_modifiers(rest);
        return Some(AttrNode::Directive(DirectiveNode {
            name: "bind".into(),
            arg: Some(parse_dir_arg(arg_src)),
            modifiers,
            exp: value,
        }));
    }
    if let Some(rest) = name.strip_prefix('@') {
        let (arg_src, modifiers) = split_modifiers(rest);
        return Some(AttrNode::Directive(DirectiveNode {
            name: "on".into(),
            arg: Some(parse_dir_arg(arg_src)),
            modifiers,
            exp: value,
        }));
    }
    if let Some(rest) = name.strip_prefix('#') {
        let (arg_src, modifiers) = split_modifiers(rest);
        return Some(AttrNode::Directive(DirectiveNode {
            name: "slot".into(),
            arg: if arg_src.is_empty() { None } else { Some(parse_dir_arg(arg_src)) },
            modifiers,
            exp: value,
        }));
    }
    Some(AttrNode::Static { name: name.to_string(), value: value.unwrap_or_default() })
}

fn split_directive_name(rest: &str, full_name: &str, sink: &ErrorSink, loc: Position) -> (String, Option<DirArg>, Vec<String>) {
    let mut parts = rest.splitn(2, ':');
    let name = parts.next().unwrap_or_default();
    let (base_name, modifiers) = split_modifiers(name);
    if let Some(arg_and_mods) = parts.next() {
        let (arg_src, mods2) = split_modifiers(arg_and_mods);
        let mut modifiers = modifiers;
        modifiers.extend(mods2);
        if arg_src.is_empty() {
            sink.on_error(ErrorCode::InvalidDirectiveArgument, loc);
        }
        (base_name, Some(parse_dir_arg(arg_src)), modifiers)
    } else {
        let _ = full_name;
        (base_name, None, modifiers)
    }
}

fn split_modifiers(s: &str) -> (String, Vec<String>) {
    let mut it = s.split('.');
    let base = it.next().unwrap_or_default().to_string();
    (base, it.map(|s| s.to_string()).collect())
}

fn parse_dir_arg(arg_src: String) -> DirArg {
    if let Some(inner) = arg_src.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        DirArg::Dynamic(inner.to_string())
    } else {
        DirArg::Static(arg_src)
    }
}

/// Fuses `v-once`/`v-if`/`v-else-if`/`v-else`/`v-for` structural directives
/// at parse time into their dedicated AST nodes (the transform stage, per
/// §4.1.2, then only has to apply the fixed-order node transforms — the
/// *fusing* itself is parse-adjacent bookkeeping, kept here so the chain of
/// sibling `v-if`/`v-else-if`/`v-else` can see the element still in its
/// original sibling position).
fn wrap_structural_directives(element: ElementNode) -> AstNode {
    AstNode::Element(element)
}

/// Post-parse pass: fuses `v-if`/`v-else-if`/`v-else` sibling chains and
/// `v-for` into their dedicated nodes, and applies the whitespace policy
/// (§4.1.1) plus text-node merging.
fn collapse_whitespace(nodes: Vec<AstNode>) -> Vec<AstNode> {
    let fused = fuse_structural(nodes);
    let trimmed = apply_whitespace_policy(fused);
    merge_adjacent_text(trimmed)
}

fn directive_named<'a>(el: &'a ElementNode, name: &str) -> Option<&'a DirectiveNode> {
    el.attrs.iter().find_map(|a| match a {
        AttrNode::Directive(d) if d.name == name => Some(d),
        _ => None,
    })
}

fn fuse_structural(nodes: Vec<AstNode>) -> Vec<AstNode> {
    let mut out: Vec<AstNode> = Vec::new();
    for node in nodes {
        let AstNode::Element(el) = &node else {
            out.push(node);
            continue;
        };
        if let Some(d) = directive_named(el, "if") {
            let branch = IfBranch { condition: d.exp.clone(), children: vec![node.clone()] };
            out.push(AstNode::If(IfNode { branches: vec![branch] }));
            continue;
        }
        if let Some(d) = directive_named(el, "else-if") {
            if let Some(AstNode::If(if_node)) = out.last_mut() {
                if_node.branches.push(IfBranch { condition: d.exp.clone(), children: vec![strip_structural(node.clone())] });
                continue;
            }
        }
        if directive_named(el, "else").is_some() {
            if let Some(AstNode::If(if_node)) = out.last_mut() {
                if_node.branches.push(IfBranch { condition: None, children: vec![strip_structural(node.clone())] });
                continue;
            }
        }
        if let Some(d) = directive_named(el, "for") {
            if let Some((alias_part, source)) = split_v_for(d.exp.as_deref().unwrap_or_default()) {
                let (value_alias, key_alias, index_alias) = split_for_aliases(&alias_part);
                let key_expr = directive_named(el, "bind")
                    .filter(|b| matches!(&b.arg, Some(DirArg::Static(n)) if n == "key"))
                    .and_then(|b| b.exp.clone());
                out.push(AstNode::For(ForNode {
                    source,
                    value_alias,
                    key_alias,
                    index_alias,
                    key_expr,
                    children: vec![strip_structural(node.clone())],
                }));
                continue;
            }
        }
        out.push(node);
    }
    for node in out.iter_mut() {
        if let AstNode::Element(el) = node {
            el.children = fuse_structural(std::mem::take(&mut el.children));
        }
        if let AstNode::If(if_node) = node {
            for b in &mut if_node.branches {
                b.children = fuse_structural(std::mem::take(&mut b.children));
            }
        }
        if let AstNode::For(for_node) = node {
            for_node.children = fuse_structural(std::mem::take(&mut for_node.children));
        }
    }
    out
}

fn strip_structural(node: AstNode) -> AstNode {
    if let AstNode::Element(mut el) = node {
        el.attrs.retain(|a| !matches!(a, AttrNode::Directive(d) if matches!(d.name.as_str(), "if" | "else-if" | "else" | "for")));
        AstNode::Element(el)
    } else {
        node
    }
}

fn split_v_for(src: &str) -> Option<(String, String)> {
    for sep in [" in ", " of "] {
        if let Some(idx) = src.find(sep) {
            return Some((src[..idx].trim().to_string(), src[idx + sep.len()..].trim().to_string()));
        }
    }
    None
}

fn split_for_aliases(alias: &str) -> (String, Option<String>, Option<String>) {
    let alias = alias.trim().trim_start_matches('(').trim_end_matches(')');
    let parts: Vec<&str> = alias.split(',').map(|s| s.trim()).collect();
    match parts.len() {
        1 => (parts[0].to_string(), None, None),
        2 => (parts[0].to_string(), None, Some(parts[1].to_string())),
        _ => (parts[0].to_string(), Some(parts[1].to_string()), Some(parts[2].to_string())),
    }
}

/// §4.1.1's whitespace policy: drop a whitespace-only run at the edges or
/// next to a comment, or between two elements when it contains a newline;
/// otherwise collapse it to a single space.
fn apply_whitespace_policy(nodes: Vec<AstNode>) -> Vec<AstNode> {
    let len = nodes.len();
    let mut slots: Vec<Option<AstNode>> = nodes.into_iter().map(Some).collect();
    let mut out = Vec::with_capacity(len);
    let mut prev_was_comment = false;
    for i in 0..len {
        let next_is_comment = matches!(slots.get(i + 1), Some(Some(AstNode::Comment(_))));
        let node = slots[i].take().expect("each slot is taken exactly once, in order");
        let is_comment = matches!(node, AstNode::Comment(_));
        if let AstNode::Text(text) = &node {
            if text.trim().is_empty() && !text.is_empty() {
                let is_edge = i == 0 || i == len - 1;
                let has_newline = text.contains('\n');
                if is_edge || prev_was_comment || next_is_comment || has_newline {
                    prev_was_comment = false;
                    continue;
                }
                out.push(AstNode::Text(" ".to_string()));
                prev_was_comment = false;
                continue;
            }
        }
        out.push(node);
        prev_was_comment = is_comment;
    }
    out
}

fn merge_adjacent_text(nodes: Vec<AstNode>) -> Vec<AstNode> {
    let mut out: Vec<AstNode> = Vec::new();
    for node in nodes {
        if let (Some(AstNode::Text(prev)), AstNode::Text(cur)) = (out.last_mut(), &node) {
            prev.push_str(cur);
            continue;
        }
        out.push(node);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> RootNode {
        let sink = ErrorSink::new();
        Parser::parse(src, ParserOptions::default(), &sink)
    }

    #[test]
    fn parses_plain_element_with_static_attr() {
        let root = parse(r#"<div class="box">hi</div>"#);
        assert_eq!(root.children.len(), 1);
        let AstNode::Element(el) = &root.children[0] else { panic!("expected element") };
        assert_eq!(el.tag, "div");
        assert!(matches!(&el.children[0], AstNode::Text(t) if t == "hi"));
    }

    #[test]
    fn recognizes_interpolation() {
        let root = parse("count is {{ count }}");
        assert!(matches!(&root.children[1], AstNode::Interpolation(e) if e == "count"));
    }

    #[test]
    fn v_pre_suppresses_interpolation_in_its_own_text_children() {
        let root = parse("<span v-pre>{{ expr }}</span>");
        let AstNode::Element(el) = &root.children[0] else { panic!("expected element") };
        assert!(el.is_pre);
        assert_eq!(el.children.len(), 1);
        assert!(matches!(&el.children[0], AstNode::Text(t) if t == "{{ expr }}"));
    }

    #[test]
    fn v_pre_propagates_into_descendant_elements() {
        let root = parse("<div v-pre><span>{{ expr }}</span></div>");
        let AstNode::Element(outer) = &root.children[0] else { panic!("expected element") };
        let AstNode::Element(inner) = &outer.children[0] else { panic!("expected nested element") };
        assert!(inner.is_pre);
        assert_eq!(inner.children.len(), 1);
        assert!(matches!(&inner.children[0], AstNode::Text(t) if t == "{{ expr }}"));
    }

    #[test]
    fn classifies_uppercase_tag_as_component() {
        let root = parse("<MyButton/>");
        let AstNode::Element(el) = &root.children[0] else { panic!() };
        assert_eq!(el.tag_type, TagType::Component);
    }

    #[test]
    fn fuses_v_if_v_else_chain() {
        let root = parse(r#"<div v-if="a">A</div><div v-else-if="b">B</div><div v-else>C</div>"#);
        assert_eq!(root.children.len(), 1);
        let AstNode::If(if_node) = &root.children[0] else { panic!("expected fused if node") };
        assert_eq!(if_node.branches.len(), 3);
        assert!(if_node.branches[2].condition.is_none());
    }

    #[test]
    fn parses_v_for_aliases() {
        let root = parse(r#"<li v-for="(item, index) in items">{{ item }}</li>"#);
        let AstNode::For(for_node) = &root.children[0] else { panic!("expected for node") };
        assert_eq!(for_node.value_alias, "item");
        assert_eq!(for_node.index_alias.as_deref(), Some("index"));
        assert_eq!(for_node.source, "items");
    }

    #[test]
    fn drops_whitespace_only_text_between_elements_with_newline() {
        let root = parse("<div>a</div>\n<div>b</div>");
        assert_eq!(root.children.len(), 2);
    }

    #[test]
    fn drops_whitespace_only_text_before_a_following_comment() {
        let root = parse("<div>a</div> <!--c--><div>b</div>");
        // Without a newline, this would otherwise collapse to a single
        // space text node instead of being dropped like the preceding-
        // comment case already is.
        assert_eq!(root.children.len(), 3);
        assert!(matches!(&root.children[1], AstNode::Comment(c) if c == "c"));
    }
}
