use crate::method::{DeclId, MethodSignature};
use crate::types::{TypeId, TypeNode};
use overrider_common::SourceId;
use rustc_hash::FxHashSet;

/// Query surface the refactoring needs from a host's semantic model.
///
/// Implementations hand out borrowed, immutable views; the model must stay
/// unchanged for as long as a refactoring holds on to it.
pub trait SemanticModel {
    /// The file all anchors of this model point into.
    fn source(&self) -> SourceId;

    /// `None` for ids the model does not know.
    fn type_node(&self, id: TypeId) -> Option<&TypeNode>;

    fn method(&self, id: DeclId) -> Option<&MethodSignature>;

    /// All type definitions, in declaration order.
    fn types(&self) -> Box<dyn Iterator<Item = &TypeNode> + '_>;

    /// Every method `id` overrides, directly or through a chain of
    /// overrides, in first-seen depth-first order. Does not include `id`.
    fn override_closure(&self, id: DeclId) -> Vec<DeclId> {
        let mut closure = Vec::new();
        let mut seen = FxHashSet::default();
        seen.insert(id);

        let mut stack: Vec<DeclId> = match self.method(id) {
            Some(m) => m.overrides.iter().rev().copied().collect(),
            None => return closure,
        };
        while let Some(next) = stack.pop() {
            if !seen.insert(next) {
                continue;
            }
            closure.push(next);
            if let Some(m) = self.method(next) {
                stack.extend(m.overrides.iter().rev().copied());
            }
        }
        closure
    }

    /// Unresolved or unknown types are never abstract.
    fn is_abstract(&self, id: TypeId) -> bool {
        self.type_node(id).is_some_and(|t| t.is_abstract)
    }

    fn type_by_name(&self, name: &str) -> Option<&TypeNode> {
        let name = name.trim_start_matches("::");
        self.types()
            .find(|t| t.qualified_name == name)
            .or_else(|| self.types().find(|t| t.name == name))
    }

    /// The innermost type whose header (`class Name : bases`) contains
    /// `offset`.
    fn type_at_offset(&self, offset: u32) -> Option<&TypeNode> {
        self.types()
            .filter(|t| t.anchors.header.contains(offset))
            .min_by_key(|t| t.anchors.header.len())
    }
}
