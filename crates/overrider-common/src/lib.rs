mod span;
mod source;
mod diagnostic;

pub use span::Span;
pub use source::{is_cpp_path, SourceFile, SourceId, SourceMap};
pub use diagnostic::Diagnostic;
