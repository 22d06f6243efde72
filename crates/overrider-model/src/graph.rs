use crate::method::{DeclId, MethodDecl, MethodSignature};
use crate::model::SemanticModel;
use crate::types::{Access, BaseSpecifier, ClassAnchors, RecordKind, TypeId, TypeNode};
use overrider_common::{SourceId, Span};
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use tracing::{debug, trace};

/// Arena-backed [`SemanticModel`] for one source file.
#[derive(Debug, Clone)]
pub struct ClassGraph {
    source: SourceId,
    types: Vec<TypeNode>,
    methods: Vec<MethodSignature>,
}

impl ClassGraph {
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Methods declared by `ty`, in declaration order.
    pub fn methods_of(&self, ty: TypeId) -> impl Iterator<Item = &MethodSignature> + '_ {
        self.types
            .get(ty.0 as usize)
            .into_iter()
            .flat_map(|t| t.methods.iter())
            .filter_map(|&m| self.methods.get(m.0 as usize))
    }

    /// `ty` followed by every type reachable through resolved bases,
    /// depth-first, each listed once.
    fn hierarchy(&self, ty: TypeId) -> Vec<TypeId> {
        let mut order = Vec::new();
        let mut seen = FxHashSet::default();
        let mut stack = vec![ty];
        while let Some(next) = stack.pop() {
            if !seen.insert(next) {
                continue;
            }
            order.push(next);
            if let Some(node) = self.type_node(next) {
                let bases: Vec<TypeId> = node.resolved_bases().collect();
                stack.extend(bases.into_iter().rev());
            }
        }
        order
    }

    /// A type is abstract when some pure method in its hierarchy is not
    /// overridden by a non-pure method anywhere in that hierarchy.
    fn compute_abstract(&self, ty: TypeId) -> bool {
        let hierarchy = self.hierarchy(ty);
        let methods: Vec<&MethodSignature> = hierarchy
            .iter()
            .flat_map(|&t| self.methods_of(t))
            .collect();

        let implemented: FxHashSet<DeclId> = methods
            .iter()
            .filter(|m| !m.is_pure)
            .flat_map(|m| self.override_closure(m.id))
            .collect();

        methods
            .iter()
            .any(|m| m.is_pure && !implemented.contains(&m.id))
    }
}

impl SemanticModel for ClassGraph {
    fn source(&self) -> SourceId {
        self.source
    }

    fn type_node(&self, id: TypeId) -> Option<&TypeNode> {
        self.types.get(id.0 as usize)
    }

    fn method(&self, id: DeclId) -> Option<&MethodSignature> {
        self.methods.get(id.0 as usize)
    }

    fn types(&self) -> Box<dyn Iterator<Item = &TypeNode> + '_> {
        Box::new(self.types.iter())
    }
}

/// Incrementally describes classes, then links them into a [`ClassGraph`].
///
/// Bases are recorded by name and resolved in [`finish`](Self::finish), so
/// classes may be added in any order.
#[derive(Debug)]
pub struct ClassGraphBuilder {
    source: SourceId,
    types: Vec<TypeNode>,
    methods: Vec<MethodSignature>,
}

impl ClassGraphBuilder {
    pub fn new(source: SourceId) -> Self {
        Self {
            source,
            types: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn add_type(
        &mut self,
        name: impl Into<SmolStr>,
        qualified_name: impl Into<SmolStr>,
        kind: RecordKind,
        anchors: ClassAnchors,
    ) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(TypeNode {
            id,
            name: name.into(),
            qualified_name: qualified_name.into(),
            kind,
            bases: Vec::new(),
            methods: Vec::new(),
            is_abstract: false,
            anchors,
        });
        id
    }

    /// A top-level `class` without source anchors.
    pub fn add_class(&mut self, name: impl Into<SmolStr>) -> TypeId {
        let name = name.into();
        let anchors = ClassAnchors::new(Span::point(self.source, 0));
        self.add_type(name.clone(), name, RecordKind::Class, anchors)
    }

    pub fn add_base(&mut self, ty: TypeId, spelled: impl Into<SmolStr>, access: Access, is_virtual: bool) {
        self.types[ty.0 as usize].bases.push(BaseSpecifier {
            spelled: spelled.into(),
            access,
            is_virtual,
            resolved: None,
        });
    }

    pub fn add_method(&mut self, ty: TypeId, decl: MethodDecl) -> DeclId {
        let id = DeclId(self.methods.len() as u32);
        self.methods.push(MethodSignature {
            id,
            owner: ty,
            name: decl.name,
            return_type: decl.return_type,
            params: decl.params,
            is_const: decl.is_const,
            is_virtual: decl.is_virtual,
            is_pure: decl.is_pure,
            overrides: Vec::new(),
            span: decl.span,
        });
        self.types[ty.0 as usize].methods.push(id);
        id
    }

    pub fn anchors_mut(&mut self, ty: TypeId) -> &mut ClassAnchors {
        &mut self.types[ty.0 as usize].anchors
    }

    /// Resolve bases, link overrides and derive abstractness.
    pub fn finish(mut self) -> ClassGraph {
        self.resolve_bases();
        for ty in self.bases_first_order() {
            self.link_overrides(ty);
        }

        let mut graph = ClassGraph {
            source: self.source,
            types: self.types,
            methods: self.methods,
        };
        let abstract_flags: Vec<bool> = (0..graph.types.len())
            .map(|i| graph.compute_abstract(TypeId(i as u32)))
            .collect();
        for (node, is_abstract) in graph.types.iter_mut().zip(abstract_flags) {
            node.is_abstract = is_abstract;
        }
        debug!(
            types = graph.types.len(),
            methods = graph.methods.len(),
            "class graph built"
        );
        graph
    }

    fn resolve_bases(&mut self) {
        let mut by_qualified: FxHashMap<SmolStr, TypeId> = FxHashMap::default();
        let mut by_name: FxHashMap<SmolStr, TypeId> = FxHashMap::default();
        for node in &self.types {
            by_qualified.entry(node.qualified_name.clone()).or_insert(node.id);
            by_name.entry(node.name.clone()).or_insert(node.id);
        }

        for node in &mut self.types {
            let own_id = node.id;
            let scope = enclosing_scope(&node.qualified_name).to_string();
            for base in &mut node.bases {
                base.resolved = resolve_name(&base.spelled, &scope, &by_qualified, &by_name)
                    .filter(|&target| target != own_id);
                if base.resolved.is_none() {
                    debug!(class = %node.qualified_name, base = %base.spelled, "base does not resolve");
                }
            }
        }
    }

    /// Post-order over the base graph so every base is linked before the
    /// types deriving from it. Cycles (invalid C++) are cut at the back edge.
    fn bases_first_order(&self) -> Vec<TypeId> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            Active,
            Done,
        }

        let mut marks = vec![Mark::New; self.types.len()];
        let mut order = Vec::with_capacity(self.types.len());
        for root in 0..self.types.len() {
            if marks[root] != Mark::New {
                continue;
            }
            // (type, index of the next base to visit)
            let mut stack = vec![(root, 0usize)];
            marks[root] = Mark::Active;
            while let Some(top) = stack.last_mut() {
                let (ty, next) = *top;
                if next < self.types[ty].bases.len() {
                    top.1 += 1;
                    if let Some(base) = self.types[ty].bases[next].resolved {
                        let b = base.0 as usize;
                        if marks[b] == Mark::New {
                            marks[b] = Mark::Active;
                            stack.push((b, 0));
                        }
                    }
                } else {
                    marks[ty] = Mark::Done;
                    order.push(TypeId(ty as u32));
                    stack.pop();
                }
            }
        }
        order
    }

    fn link_overrides(&mut self, ty: TypeId) {
        let node = &self.types[ty.0 as usize];
        let mut links = Vec::new();
        for &decl in &node.methods {
            let method = &self.methods[decl.0 as usize];
            let mut found = Vec::new();
            let mut visited = FxHashSet::default();
            for base in node.resolved_bases() {
                self.find_overridden(base, method, &mut visited, &mut found);
            }
            if !found.is_empty() {
                links.push((decl, found));
            }
        }

        for (decl, found) in links {
            let method = &mut self.methods[decl.0 as usize];
            trace!(method = %method.name, overrides = found.len(), "override edges");
            method.is_virtual = true;
            method.overrides = found;
        }
    }

    /// Depth-first search below `ty` for virtual methods `method` overrides.
    /// A match stops the descent along that path; deeper matches are reached
    /// through the matched method's own override edges.
    fn find_overridden(
        &self,
        ty: TypeId,
        method: &MethodSignature,
        visited: &mut FxHashSet<TypeId>,
        found: &mut Vec<DeclId>,
    ) {
        if !visited.insert(ty) {
            return;
        }
        let node = &self.types[ty.0 as usize];
        let matched = node
            .methods
            .iter()
            .map(|&d| &self.methods[d.0 as usize])
            .find(|candidate| candidate.is_virtual && candidate.same_override_signature(method));
        match matched {
            Some(candidate) => {
                if !found.contains(&candidate.id) {
                    found.push(candidate.id);
                }
            }
            None => {
                for base in node.resolved_bases() {
                    self.find_overridden(base, method, visited, found);
                }
            }
        }
    }
}

/// `a::b::C` -> `a::b`.
fn enclosing_scope(qualified: &str) -> &str {
    qualified.rsplit_once("::").map(|(scope, _)| scope).unwrap_or("")
}

fn resolve_name(
    spelled: &str,
    scope: &str,
    by_qualified: &FxHashMap<SmolStr, TypeId>,
    by_name: &FxHashMap<SmolStr, TypeId>,
) -> Option<TypeId> {
    let spelled: String = spelled.split_whitespace().collect();
    // Instantiation-dependent bases are outside what the model tracks.
    if spelled.contains('<') {
        return None;
    }
    if let Some(absolute) = spelled.strip_prefix("::") {
        return by_qualified.get(absolute).copied();
    }

    // Innermost enclosing scope first, like unqualified lookup.
    let mut scope = scope;
    loop {
        let candidate = if scope.is_empty() {
            spelled.clone()
        } else {
            format!("{scope}::{spelled}")
        };
        if let Some(&id) = by_qualified.get(candidate.as_str()) {
            return Some(id);
        }
        if scope.is_empty() {
            break;
        }
        scope = enclosing_scope(scope);
    }

    let last = spelled.rsplit("::").next().unwrap_or(&spelled);
    by_name.get(last).copied()
}
