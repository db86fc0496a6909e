//! The template compiler (§4.1): parse → transform → hoist, producing a
//! [`program::RenderProgram`] that `program::execute` interprets at render
//! time rather than Rust source to `rustc`.

pub mod ast;
pub mod codegen;
pub mod errors;
pub mod expr;
pub mod parser;
pub mod program;
pub mod transform;

use crate::component::ComponentDescriptor;
use errors::{CompilerError, ErrorSink};
use parser::{Parser, ParserOptions};
use program::RenderProgram;
use std::collections::HashMap;
use std::rc::Rc;
use transform::{transform_children_as_single, TransformCtx};

/// Compile-time configuration: the parser's text-mode tag lists plus the
/// registry of user components a `<PascalCase>`/`<kebab-case>` tag in the
/// template may resolve to (§4.1.1's component classification rule).
#[derive(Default)]
pub struct CompileOptions {
    pub raw_text_tags: Vec<String>,
    pub rcdata_tags: Vec<String>,
    pub components: HashMap<String, Rc<ComponentDescriptor>>,
}

pub fn compile(template: &str, options: &CompileOptions) -> Result<RenderProgram, Vec<CompilerError>> {
    let sink = ErrorSink::new();
    let parser_options = ParserOptions {
        delimiters: None,
        raw_text_tags: options.raw_text_tags.clone(),
        rcdata_tags: options.rcdata_tags.clone(),
        is_html_namespace: true,
    };
    let root = Parser::parse(template, parser_options, &sink);

    let registry = Rc::new(options.components.clone());
    let ctx = TransformCtx::new(&options.components, &sink);
    let transformed = transform_children_as_single(&root.children, &ctx);

    if sink.has_errors() {
        return Err(sink.into_errors());
    }

    let (root, hoists) = transform::hoist::hoist(transformed);
    Ok(RenderProgram { root, hoists, registry })
}
