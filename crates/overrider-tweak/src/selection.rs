use overrider_model::{SemanticModel, TypeId, TypeNode};

/// What the user's cursor resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectedNode {
    Type(TypeId),
    /// Anything that is not a class definition.
    Other,
}

/// A selection inside one snapshot of a semantic model.
#[derive(Clone, Copy)]
pub struct Selection<'m> {
    pub model: &'m dyn SemanticModel,
    pub node: SelectedNode,
}

impl<'m> Selection<'m> {
    pub fn new(model: &'m dyn SemanticModel, node: SelectedNode) -> Self {
        Self { model, node }
    }

    pub fn of_type(model: &'m dyn SemanticModel, ty: TypeId) -> Self {
        Self::new(model, SelectedNode::Type(ty))
    }

    /// Select the class whose header contains `offset`.
    pub fn at_offset(model: &'m dyn SemanticModel, offset: u32) -> Self {
        let node = match model.type_at_offset(offset) {
            Some(ty) => SelectedNode::Type(ty.id),
            None => SelectedNode::Other,
        };
        Self::new(model, node)
    }

    /// The selected class, if the selection is one the model knows.
    pub fn selected_type(&self) -> Option<&'m TypeNode> {
        match self.node {
            SelectedNode::Type(id) => self.model.type_node(id),
            SelectedNode::Other => None,
        }
    }
}

impl std::fmt::Debug for Selection<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selection")
            .field("source", &self.model.source())
            .field("node", &self.node)
            .finish()
    }
}
