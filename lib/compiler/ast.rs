//! The parser's output tree (§4.1.1): untransformed source nodes, still
//! carrying raw directive/expression text.

use crate::compiler::errors::Position;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Element classification (§4.1.1's ordered classification rules).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagType {
    Element,
    Component,
    Slot,
    Template,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirArg {
    Static(String),
    /// `[expr]` dynamic argument form.
    Dynamic(String),
}

/// A parsed `v-xxx`/`:`/`@`/`#` attribute, before directive-transform dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveNode {
    pub name: String,
    pub arg: Option<DirArg>,
    pub modifiers: Vec<String>,
    pub exp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrNode {
    Static { name: String, value: String },
    Directive(DirectiveNode),
}

#[derive(Debug, Clone)]
pub struct ElementNode {
    pub tag: String,
    pub tag_type: TagType,
    pub attrs: Vec<AttrNode>,
    pub children: Vec<AstNode>,
    /// Attribute parsing was redone with directive interpretation off for
    /// this element and its subtree (§4.1.1's `v-pre` rewind rule).
    pub is_pre: bool,
    pub loc: Position,
}

#[derive(Debug, Clone)]
pub struct IfBranch {
    /// `None` marks the trailing `v-else` branch.
    pub condition: Option<String>,
    pub children: Vec<AstNode>,
}

#[derive(Debug, Clone)]
pub struct IfNode {
    pub branches: Vec<IfBranch>,
}

#[derive(Debug, Clone)]
pub struct ForNode {
    /// The iterable source expression (right of `in`/`of`).
    pub source: String,
    pub value_alias: String,
    pub key_alias: Option<String>,
    pub index_alias: Option<String>,
    /// `:key` binding on the `v-for` root, if present.
    pub key_expr: Option<String>,
    pub children: Vec<AstNode>,
}

#[derive(Debug, Clone)]
pub enum AstNode {
    Element(ElementNode),
    Text(String),
    Interpolation(String),
    Comment(String),
    If(IfNode),
    For(ForNode),
}

#[derive(Debug, Clone, Default)]
pub struct RootNode {
    pub children: Vec<AstNode>,
}
