use overrider_model::{MethodSignature, SemanticModel, TypeId, TypeNode};
use tracing::{debug, trace, warn};

/// Every pure-virtual method declared anywhere in `root`'s base graph.
///
/// Bases are walked depth-first in declaration order, starting at `root`'s
/// direct bases; each visited type contributes its pure methods in
/// declaration order before its own bases are visited. `root` itself is not
/// included. A base reachable along several paths (diamond) is visited once
/// per path, so its methods may repeat; [`reconcile`](crate::reconcile)
/// deduplicates them. Bases the model cannot resolve are skipped.
pub fn collect_abstract_methods<'m>(
    model: &'m dyn SemanticModel,
    root: &TypeNode,
) -> Vec<&'m MethodSignature> {
    let mut collected = Vec::new();
    // Types on the current path, to cut cycles in a malformed graph.
    let mut path: Vec<TypeId> = vec![root.id];
    let mut stack: Vec<(TypeId, usize)> = Vec::new();
    push_bases(root, 1, &mut stack);

    while let Some((ty, depth)) = stack.pop() {
        path.truncate(depth);
        if path.contains(&ty) {
            warn!(class = %root.qualified_name, "cyclic base graph, skipping back edge");
            continue;
        }
        let Some(node) = model.type_node(ty) else {
            debug!(?ty, "base type not in model, skipping");
            continue;
        };
        path.push(ty);

        for &decl in &node.methods {
            match model.method(decl) {
                Some(method) if method.is_pure => {
                    trace!(owner = %node.qualified_name, method = %method.name, "pure virtual");
                    collected.push(method);
                }
                Some(_) => {}
                None => debug!(?decl, "method not in model, skipping"),
            }
        }
        push_bases(node, depth + 1, &mut stack);
    }

    debug!(
        class = %root.qualified_name,
        obligations = collected.len(),
        "collected abstract methods"
    );
    collected
}

/// Push resolved bases so that the first declared base is popped first.
fn push_bases(node: &TypeNode, depth: usize, stack: &mut Vec<(TypeId, usize)>) {
    for base in node.bases.iter().rev() {
        match base.resolved {
            Some(ty) => stack.push((ty, depth)),
            None => debug!(base = %base.spelled, "unresolved base, skipping"),
        }
    }
}
