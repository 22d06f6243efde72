use crate::collect::collect_abstract_methods;
use crate::edit::Effect;
use crate::emit::{emit, EmitPolicy};
use crate::reconcile::{reconcile, ResidualSet};
use crate::selection::Selection;
use crate::tweak::Tweak;
use overrider_model::TypeNode;
use tracing::{debug, warn};

/// Declares every inherited pure-virtual method the selected class has not
/// overridden yet.
#[derive(Debug, Clone, Default)]
pub struct OverridePureVirtuals {
    policy: EmitPolicy,
}

impl OverridePureVirtuals {
    pub const ID: &'static str = "OverridePureVirtuals";

    pub fn new(policy: EmitPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &EmitPolicy {
        &self.policy
    }

    /// The selected class and its residual obligations, or `None` when the
    /// tweak does not apply: the selection is not a class, no base is
    /// abstract, or nothing is left to override.
    pub fn residual<'m>(&self, selection: &Selection<'m>) -> Option<(&'m TypeNode, ResidualSet<'m>)> {
        let model = selection.model;
        let derived = selection.selected_type()?;

        let has_abstract_base = derived.resolved_bases().any(|b| model.is_abstract(b));
        if !has_abstract_base {
            debug!(class = %derived.qualified_name, "no abstract base");
            return None;
        }

        let collected = collect_abstract_methods(model, derived);
        let residual = reconcile(model, &collected, derived);
        if residual.is_empty() {
            debug!(class = %derived.qualified_name, "all pure virtuals overridden");
            return None;
        }
        Some((derived, residual))
    }
}

impl Tweak for OverridePureVirtuals {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn title(&self) -> String {
        "Override pure virtual methods".to_string()
    }

    fn is_available(&self, selection: &Selection<'_>) -> bool {
        self.residual(selection).is_some()
    }

    fn apply(&self, selection: &Selection<'_>) -> Option<Effect> {
        let Some((derived, residual)) = self.residual(selection) else {
            warn!(?selection, "apply called on a selection the tweak does not support");
            return None;
        };
        emit(&residual, derived, selection.model.source(), &self.policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::SelectedNode;
    use crate::tweak::TweakRegistry;
    use overrider_common::{SourceId, Span};
    use overrider_model::{Access, ClassGraphBuilder, MethodDecl};

    fn decl(name: &str) -> MethodDecl {
        MethodDecl::new(name, "void", Span::point(SourceId::DETACHED, 0))
    }

    #[test]
    fn test_unavailable_on_non_class_selection() {
        let graph = ClassGraphBuilder::new(SourceId::DETACHED).finish();
        let tweak = OverridePureVirtuals::default();
        let selection = Selection::new(&graph, SelectedNode::Other);
        assert!(!tweak.is_available(&selection));
        assert_eq!(tweak.apply(&selection), None);
    }

    #[test]
    fn test_unavailable_without_abstract_base() {
        let mut b = ClassGraphBuilder::new(SourceId::DETACHED);
        let base = b.add_class("Base");
        b.add_method(base, decl("F").virtual_());
        let derived = b.add_class("Derived");
        b.add_base(derived, "Base", Access::Public, false);
        let graph = b.finish();

        let tweak = OverridePureVirtuals::default();
        assert!(!tweak.is_available(&Selection::of_type(&graph, derived)));
    }

    #[test]
    fn test_unavailable_when_everything_overridden() {
        let mut b = ClassGraphBuilder::new(SourceId::DETACHED);
        let base = b.add_class("Base");
        b.add_method(base, decl("F").pure());
        let derived = b.add_class("Derived");
        b.add_base(derived, "Base", Access::Public, false);
        b.add_method(derived, decl("F"));
        let graph = b.finish();

        let tweak = OverridePureVirtuals::default();
        assert!(!tweak.is_available(&Selection::of_type(&graph, derived)));
    }

    #[test]
    fn test_available_with_missing_override() {
        let mut b = ClassGraphBuilder::new(SourceId::DETACHED);
        let base = b.add_class("Base");
        b.add_method(base, decl("F").pure());
        let derived = b.add_class("Derived");
        b.add_base(derived, "Base", Access::Public, false);
        let graph = b.finish();

        let tweak = OverridePureVirtuals::default();
        let selection = Selection::of_type(&graph, derived);
        assert!(tweak.is_available(&selection));
        let (_, residual) = tweak.residual(&selection).unwrap();
        assert_eq!(residual.names(), ["F"]);
    }

    #[test]
    fn test_registry_lookup_and_availability() {
        let mut b = ClassGraphBuilder::new(SourceId::DETACHED);
        let base = b.add_class("Base");
        b.add_method(base, decl("F").pure());
        let derived = b.add_class("Derived");
        b.add_base(derived, "Base", Access::Public, false);
        let graph = b.finish();

        let mut registry = TweakRegistry::new();
        registry.register(Box::new(OverridePureVirtuals::default()));
        registry.register(Box::new(OverridePureVirtuals::default()));
        assert_eq!(registry.len(), 1);

        let tweak = registry.get(OverridePureVirtuals::ID).unwrap();
        assert_eq!(tweak.title(), "Override pure virtual methods");

        let on_derived = Selection::of_type(&graph, derived);
        assert_eq!(registry.available(&on_derived).len(), 1);
        let on_base = Selection::of_type(&graph, base);
        assert!(registry.available(&on_base).is_empty());
    }
}
