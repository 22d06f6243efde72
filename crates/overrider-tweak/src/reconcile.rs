use overrider_model::{DeclId, MethodSignature, SemanticModel, TypeNode};
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

/// Abstract obligations a class still has to override, in the order they
/// were collected.
#[derive(Debug, Clone, Default)]
pub struct ResidualSet<'m> {
    methods: Vec<&'m MethodSignature>,
}

impl<'m> ResidualSet<'m> {
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'m MethodSignature> + '_ {
        self.methods.iter().copied()
    }

    pub fn ids(&self) -> Vec<DeclId> {
        self.methods.iter().map(|m| m.id).collect()
    }

    pub fn names(&self) -> Vec<&'m str> {
        self.methods.iter().map(|m| m.name.as_str()).collect()
    }
}

impl<'a, 'm> IntoIterator for &'a ResidualSet<'m> {
    type Item = &'m MethodSignature;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, &'m MethodSignature>>;

    fn into_iter(self) -> Self::IntoIter {
        self.methods.iter().copied()
    }
}

/// Filter `abstract_methods` down to those `derived` does not override yet.
///
/// An obligation is satisfied only when the model records that one of
/// `derived`'s methods overrides it, directly or through a chain of
/// overrides; matching names or signature text do not count. The result
/// keeps the input order and holds each obligation once: repeats of the
/// same declaration, and declarations that override or are overridden by an
/// obligation already kept, are dropped.
pub fn reconcile<'m>(
    model: &'m dyn SemanticModel,
    abstract_methods: &[&'m MethodSignature],
    derived: &TypeNode,
) -> ResidualSet<'m> {
    let satisfied: FxHashSet<DeclId> = derived
        .methods
        .iter()
        .flat_map(|&m| model.override_closure(m))
        .collect();

    let mut covered: FxHashSet<DeclId> = FxHashSet::default();
    let mut methods = Vec::new();
    for &method in abstract_methods {
        if satisfied.contains(&method.id) {
            trace!(method = %method.name, "already overridden");
            continue;
        }
        let closure = model.override_closure(method.id);
        if covered.contains(&method.id) || closure.iter().any(|id| covered.contains(id)) {
            trace!(method = %method.name, "duplicate obligation");
            continue;
        }
        covered.insert(method.id);
        covered.extend(closure);
        methods.push(method);
    }

    debug!(
        class = %derived.qualified_name,
        obligations = abstract_methods.len(),
        satisfied = satisfied.len(),
        residual = methods.len(),
        "reconciled overrides"
    );
    ResidualSet { methods }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::collect_abstract_methods;
    use overrider_common::{SourceId, Span};
    use overrider_model::{Access, ClassGraph, ClassGraphBuilder, MethodDecl, Param, TypeId};

    fn decl(name: &str) -> MethodDecl {
        MethodDecl::new(name, "void", Span::point(SourceId::DETACHED, 0))
    }

    fn residual_names(graph: &ClassGraph, ty: TypeId) -> Vec<String> {
        let node = graph.type_node(ty).unwrap();
        let collected = collect_abstract_methods(graph, node);
        reconcile(graph, &collected, node)
            .iter()
            .map(|m| m.name.to_string())
            .collect()
    }

    #[test]
    fn test_nothing_overridden() {
        let mut b = ClassGraphBuilder::new(SourceId::DETACHED);
        let base = b.add_class("Base");
        b.add_method(base, decl("F1").pure());
        b.add_method(base, decl("F2").pure());
        let derived = b.add_class("Derived");
        b.add_base(derived, "Base", Access::Public, false);
        let graph = b.finish();

        assert_eq!(residual_names(&graph, derived), ["F1", "F2"]);
    }

    #[test]
    fn test_partial_override_keeps_order() {
        let mut b = ClassGraphBuilder::new(SourceId::DETACHED);
        let base = b.add_class("Base");
        b.add_method(base, decl("F1").pure());
        b.add_method(base, decl("F2").pure());
        b.add_method(base, decl("F3").pure());
        let derived = b.add_class("Derived");
        b.add_base(derived, "Base", Access::Public, false);
        b.add_method(derived, decl("F2"));
        let graph = b.finish();

        assert_eq!(residual_names(&graph, derived), ["F1", "F3"]);
    }

    #[test]
    fn test_near_miss_signature_does_not_satisfy() {
        let mut b = ClassGraphBuilder::new(SourceId::DETACHED);
        let base = b.add_class("Base");
        b.add_method(base, decl("F").param(Param::new("int", "x")).pure());
        let derived = b.add_class("Derived");
        b.add_base(derived, "Base", Access::Public, false);
        // Same name, different parameter type: hides, does not override.
        b.add_method(derived, decl("F").param(Param::new("unsigned int", "x")));
        let graph = b.finish();

        assert_eq!(residual_names(&graph, derived), ["F"]);
    }

    #[test]
    fn test_override_of_override_satisfies_root() {
        let mut b = ClassGraphBuilder::new(SourceId::DETACHED);
        let a = b.add_class("A");
        b.add_method(a, decl("F").pure());
        b.add_method(a, decl("G").pure());
        let mid = b.add_class("Mid");
        b.add_base(mid, "A", Access::Public, false);
        b.add_method(mid, decl("F").pure());
        let derived = b.add_class("Derived");
        b.add_base(derived, "Mid", Access::Public, false);
        b.add_method(derived, decl("F"));
        let graph = b.finish();

        // Mid::F and A::F are both satisfied by Derived::F.
        assert_eq!(residual_names(&graph, derived), ["G"]);
    }

    #[test]
    fn test_redeclared_pure_method_emitted_once() {
        let mut b = ClassGraphBuilder::new(SourceId::DETACHED);
        let a = b.add_class("A");
        b.add_method(a, decl("F").pure());
        let mid = b.add_class("Mid");
        b.add_base(mid, "A", Access::Public, false);
        let mid_f = b.add_method(mid, decl("F").pure());
        let derived = b.add_class("Derived");
        b.add_base(derived, "Mid", Access::Public, false);
        let graph = b.finish();

        let node = graph.type_node(derived).unwrap();
        let collected = collect_abstract_methods(&graph, node);
        assert_eq!(collected.len(), 2);
        let residual = reconcile(&graph, &collected, node);
        assert_eq!(residual.ids(), vec![mid_f]);
    }

    #[test]
    fn test_diamond_counted_once() {
        let mut b = ClassGraphBuilder::new(SourceId::DETACHED);
        let top = b.add_class("Top");
        b.add_method(top, decl("F").pure());
        let left = b.add_class("Left");
        b.add_base(left, "Top", Access::Public, true);
        b.add_method(left, decl("L").pure());
        let right = b.add_class("Right");
        b.add_base(right, "Top", Access::Public, true);
        let bottom = b.add_class("Bottom");
        b.add_base(bottom, "Left", Access::Public, false);
        b.add_base(bottom, "Right", Access::Public, false);
        let graph = b.finish();

        assert_eq!(residual_names(&graph, bottom), ["L", "F"]);
    }

    #[test]
    fn test_completeness_n_minus_k() {
        let mut b = ClassGraphBuilder::new(SourceId::DETACHED);
        let first = b.add_class("First");
        for name in ["A", "B", "C"] {
            b.add_method(first, decl(name).pure());
        }
        let second = b.add_class("Second");
        for name in ["D", "E"] {
            b.add_method(second, decl(name).pure());
        }
        let derived = b.add_class("Derived");
        b.add_base(derived, "First", Access::Public, false);
        b.add_base(derived, "Second", Access::Public, false);
        b.add_method(derived, decl("B"));
        b.add_method(derived, decl("E"));
        let graph = b.finish();

        // N = 5 obligations, K = 2 overridden (E overrides without the keyword).
        assert_eq!(residual_names(&graph, derived), ["A", "C", "D"]);
    }
}
