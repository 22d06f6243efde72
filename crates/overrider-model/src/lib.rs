//! Semantic model of a C++ class hierarchy.
//!
//! The refactoring only ever reads from this model. A host builds one
//! [`ClassGraph`] per snapshot of a source file (see `overrider-frontend-cpp`)
//! or implements [`SemanticModel`] on top of its own index.
//!
//! ```text
//! ClassGraphBuilder ──finish()──▶ ClassGraph: SemanticModel
//!                                   ├─ TypeNode (bases, methods, anchors)
//!                                   └─ MethodSignature (override edges)
//! ```

mod types;
mod method;
mod model;
mod graph;

pub use types::{Access, AccessSection, BaseSpecifier, ClassAnchors, RecordKind, TypeId, TypeNode};
pub use method::{DeclId, MethodDecl, MethodSignature, Param};
pub use model::SemanticModel;
pub use graph::{ClassGraph, ClassGraphBuilder};
