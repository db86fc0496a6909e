//! Compile-time diagnostics (§4.1.1, §6.4). These are never thrown: every
//! malformed construct is collected through `onError` and the parser (or
//! transform) recovers and keeps going.

/// A closed set of diagnostic codes (§6.4). Not exhaustive of every corner
/// an HTML5 tokenizer distinguishes, but covers every construct this
/// parser actually recognizes and can fail on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    EofBeforeTagName,
    EofInTag,
    EofInComment,
    AbruptClosingOfEmptyComment,
    IncorrectlyClosedComment,
    NestedComment,
    MissingEndTag,
    UnexpectedCharacterInAttributeName,
    DuplicateAttribute,
    MissingAttributeValue,
    XInvalidEndTag,
    InvalidDirectiveArgument,
    InvalidVForExpression,
    InvalidVIfExpression,
    InvalidExpression,
    ElseWithNoAdjacentIf,
}

impl ErrorCode {
    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::EofBeforeTagName => "unexpected end of input before tag name",
            ErrorCode::EofInTag => "unexpected end of input inside a tag",
            ErrorCode::EofInComment => "unexpected end of input inside a comment",
            ErrorCode::AbruptClosingOfEmptyComment => "abrupt closing of empty comment",
            ErrorCode::IncorrectlyClosedComment => "incorrectly closed comment",
            ErrorCode::NestedComment => "nested <!-- inside a comment",
            ErrorCode::MissingEndTag => "missing end tag",
            ErrorCode::UnexpectedCharacterInAttributeName => "unexpected character in attribute name",
            ErrorCode::DuplicateAttribute => "duplicate attribute",
            ErrorCode::MissingAttributeValue => "missing attribute value",
            ErrorCode::XInvalidEndTag => "end tag does not match any open element",
            ErrorCode::InvalidDirectiveArgument => "invalid directive argument",
            ErrorCode::InvalidVForExpression => "v-for expression must be of the form \"item in expr\"",
            ErrorCode::InvalidVIfExpression => "v-else/v-else-if with no preceding v-if",
            ErrorCode::InvalidExpression => "could not parse expression",
            ErrorCode::ElseWithNoAdjacentIf => "v-else/v-else-if is not immediately preceded by a v-if/v-else-if sibling",
        }
    }
}

/// A single position in the original source, tracked by the parser cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerError {
    pub code: ErrorCode,
    pub pos: Position,
}

impl std::fmt::Display for CompilerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.pos.line, self.pos.column, self.code.message())
    }
}

/// Collects diagnostics as the parser/transform run; never aborts on its own.
#[derive(Default)]
pub struct ErrorSink {
    errors: std::cell::RefCell<Vec<CompilerError>>,
}

impl ErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_error(&self, code: ErrorCode, pos: Position) {
        self.errors.borrow_mut().push(CompilerError { code, pos });
    }

    pub fn into_errors(self) -> Vec<CompilerError> {
        self.errors.into_inner()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.borrow().is_empty()
    }
}
