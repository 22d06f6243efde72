//! C++ frontend: builds the class hierarchy model from source text.
//!
//! Only what the override refactoring queries is extracted: record
//! definitions, their base clauses, access labels, brace positions and
//! method declarations. Function bodies, templates and out-of-class
//! definitions are ignored.

mod parser;
mod lower;

pub use parser::parse;
pub use lower::{lower, LoweredFile};

use miette::Result;
use overrider_common::SourceFile;

/// Parse and lower one C++ file.
pub fn parse_file(source: &SourceFile) -> Result<LoweredFile> {
    let tree = parse(&source.content)?;
    lower(&tree, source)
}
