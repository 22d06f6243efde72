use miette::Result;
use overrider_common::{Diagnostic, SourceFile, Span};
use overrider_model::{
    Access, AccessSection, ClassAnchors, ClassGraph, ClassGraphBuilder, MethodDecl, Param,
    RecordKind, TypeId,
};
use smol_str::SmolStr;
use tracing::{debug, trace, warn};
use tree_sitter::{Node, Tree};

/// Upper bound on syntax-error diagnostics reported per file.
const MAX_SYNTAX_DIAGNOSTICS: usize = 10;

/// The model extracted from one file, plus non-fatal problems found on the way.
#[derive(Debug)]
pub struct LoweredFile {
    pub graph: ClassGraph,
    pub diagnostics: Vec<Diagnostic>,
}

/// Lower a tree-sitter Tree to a class graph.
pub fn lower(tree: &Tree, source: &SourceFile) -> Result<LoweredFile> {
    if source.content.len() > u32::MAX as usize {
        return Err(miette::miette!(
            "{} is too large to index ({} bytes)",
            source.path.display(),
            source.content.len()
        ));
    }

    let mut ctx = LoweringContext::new(source);
    let root = tree.root_node();
    ctx.lower_declarations(root);
    if root.has_error() {
        ctx.collect_syntax_errors(root);
    }
    Ok(ctx.finish())
}

/// Work items of the declaration walk.
enum Visit<'t> {
    Node(Node<'t>),
    /// Leave the innermost namespace or class scope.
    PopScope,
}

/// Nodes whose children may declare records at the same scope.
fn is_declaration_container(kind: &str) -> bool {
    matches!(
        kind,
        "translation_unit"
            | "declaration_list"
            | "linkage_specification"
            | "declaration"
            | "type_definition"
            | "preproc_if"
            | "preproc_ifdef"
            | "preproc_else"
            | "preproc_elif"
            | "preproc_elifdef"
            | "ERROR"
    )
}

fn push_children<'t>(node: Node<'t>, work: &mut Vec<Visit<'t>>) {
    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node.named_children(&mut cursor).collect();
    work.extend(children.into_iter().rev().map(Visit::Node));
}

struct LoweringContext<'a> {
    source: &'a SourceFile,
    builder: ClassGraphBuilder,
    diagnostics: Vec<Diagnostic>,
    /// Enclosing namespaces and classes.
    scope: Vec<SmolStr>,
}

impl<'a> LoweringContext<'a> {
    fn new(source: &'a SourceFile) -> Self {
        Self {
            source,
            builder: ClassGraphBuilder::new(source.id),
            diagnostics: Vec::new(),
            scope: Vec::new(),
        }
    }

    fn finish(self) -> LoweredFile {
        LoweredFile {
            graph: self.builder.finish(),
            diagnostics: self.diagnostics,
        }
    }

    fn span(&self, node: Node) -> Span {
        Span::new(self.source.id, node.start_byte() as u32, node.end_byte() as u32)
    }

    fn text(&self, node: Node) -> &'a str {
        let source: &'a SourceFile = self.source;
        node.utf8_text(source.content.as_bytes()).unwrap_or("")
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        let source: &'a SourceFile = self.source;
        source.content.get(start..end).unwrap_or("")
    }

    fn qualify(&self, name: &str) -> SmolStr {
        if self.scope.is_empty() {
            SmolStr::new(name)
        } else {
            SmolStr::new(format!("{}::{}", self.scope.join("::"), name))
        }
    }

    /// Walk the declarations of a file with an explicit work-list.
    /// Function bodies, templates and expressions are not entered.
    fn lower_declarations<'t>(&mut self, root: Node<'t>) {
        let mut work = vec![Visit::Node(root)];
        while let Some(item) = work.pop() {
            let node = match item {
                Visit::Node(node) => node,
                Visit::PopScope => {
                    self.scope.pop();
                    continue;
                }
            };
            match node.kind() {
                "class_specifier" | "struct_specifier" if node.child_by_field_name("body").is_some() => {
                    self.lower_record(node, &mut work);
                }
                "namespace_definition" => {
                    if let Some(name) = node.child_by_field_name("name") {
                        self.scope.push(SmolStr::new(normalize_type(self.text(name))));
                        work.push(Visit::PopScope);
                    }
                    if let Some(body) = node.child_by_field_name("body") {
                        work.push(Visit::Node(body));
                    }
                }
                "template_declaration" => {
                    trace!(span = ?self.span(node), "skipping template declaration");
                }
                kind if is_declaration_container(kind) => push_children(node, &mut work),
                _ => {}
            }
        }
    }

    /// Lower one record definition. Nested records are queued on `work`
    /// inside the record's scope.
    fn lower_record<'t>(&mut self, node: Node<'t>, work: &mut Vec<Visit<'t>>) {
        let kind = if node.kind() == "struct_specifier" {
            RecordKind::Struct
        } else {
            RecordKind::Class
        };
        let (Some(name_node), Some(body)) =
            (node.child_by_field_name("name"), node.child_by_field_name("body"))
        else {
            debug!(span = ?self.span(node), "skipping anonymous record");
            return;
        };

        let spelled = normalize_type(self.text(name_node));
        let name = spelled.rsplit("::").next().unwrap_or(&spelled).to_string();
        let qualified = self.qualify(&spelled);

        let mut anchors = ClassAnchors::new(Span::new(
            self.source.id,
            node.start_byte() as u32,
            body.start_byte() as u32,
        ));
        let mut cursor = body.walk();
        let body_children: Vec<Node<'t>> = body.children(&mut cursor).collect();
        anchors.open_brace = body_children
            .first()
            .filter(|n| n.kind() == "{" && !n.is_missing())
            .map(|n| n.start_byte() as u32);
        anchors.close_brace = body_children
            .last()
            .filter(|n| n.kind() == "}" && !n.is_missing())
            .map(|n| n.start_byte() as u32);

        let ty = self.builder.add_type(name, qualified.clone(), kind, anchors);
        debug!(class = %qualified, "lowering record");

        let mut cursor = node.walk();
        let base_clause = node
            .children(&mut cursor)
            .find(|c| c.kind() == "base_class_clause");
        if let Some(clause) = base_clause {
            self.lower_bases(ty, kind, clause);
        }

        let mut nested = Vec::new();
        for (i, child) in body_children.iter().enumerate() {
            match child.kind() {
                "access_specifier" => {
                    self.lower_access_label(ty, *child, body_children.get(i + 1).copied());
                }
                "field_declaration" | "declaration" => {
                    self.lower_member_declaration(ty, *child, &mut nested);
                }
                "function_definition" => {
                    if let Some(declarator) = child.child_by_field_name("declarator") {
                        let body = child.child_by_field_name("body");
                        self.lower_method(ty, *child, declarator, body);
                    }
                }
                _ => {}
            }
        }

        if !nested.is_empty() {
            self.scope.push(SmolStr::new(&spelled));
            work.push(Visit::PopScope);
            work.extend(nested.into_iter().rev().map(Visit::Node));
        }
    }

    fn lower_bases(&mut self, ty: TypeId, kind: RecordKind, clause: Node) {
        let mut access = None;
        let mut is_virtual = false;

        let mut cursor = clause.walk();
        for child in clause.children(&mut cursor) {
            match child.kind() {
                "access_specifier" => access = Access::from_keyword(self.text(child)),
                "virtual" => is_virtual = true,
                "," => {
                    access = None;
                    is_virtual = false;
                }
                "type_identifier" | "qualified_type_identifier" | "qualified_identifier"
                | "template_type" => {
                    let spelled = normalize_type(self.text(child));
                    let access = access.take().unwrap_or_else(|| kind.default_access());
                    trace!(base = %spelled, %access, is_virtual, "base specifier");
                    self.builder.add_base(ty, spelled, access, is_virtual);
                    is_virtual = false;
                }
                _ => {}
            }
        }
    }

    /// Record an `access-specifier :` label, anchored at its colon.
    fn lower_access_label(&mut self, ty: TypeId, label: Node, next: Option<Node>) {
        let text = self.text(label);
        let Some(access) = Access::from_keyword(text) else {
            return;
        };
        let colon = match text.rfind(':') {
            Some(pos) => Some(label.start_byte() + pos),
            None => next
                .filter(|n| n.kind() == ":" && !n.is_missing())
                .map(|n| n.start_byte()),
        };
        match colon {
            Some(colon) => self.builder.anchors_mut(ty).access_sections.push(AccessSection {
                access,
                colon: colon as u32,
            }),
            None => debug!(span = ?self.span(label), "access label without colon"),
        }
    }

    fn lower_member_declaration<'t>(&mut self, ty: TypeId, node: Node<'t>, nested: &mut Vec<Node<'t>>) {
        if let Some(type_node) = node.child_by_field_name("type") {
            if matches!(type_node.kind(), "class_specifier" | "struct_specifier")
                && type_node.child_by_field_name("body").is_some()
            {
                nested.push(type_node);
            }
        }

        let mut cursor = node.walk();
        let declarators: Vec<Node> = node.children_by_field_name("declarator", &mut cursor).collect();
        for declarator in declarators {
            self.lower_method(ty, node, declarator, None);
        }
    }

    /// Lower one member declarator if it declares a method. Fields,
    /// constructors, destructors and conversion operators are skipped.
    fn lower_method(&mut self, ty: TypeId, decl: Node, declarator: Node, body: Option<Node>) {
        let mut markers = String::new();
        let Some(function) = self.unwrap_function_declarator(declarator, &mut markers) else {
            return;
        };
        let Some(name_node) = function.child_by_field_name("declarator") else {
            return;
        };
        if !matches!(name_node.kind(), "field_identifier" | "identifier" | "operator_name") {
            trace!(kind = name_node.kind(), "not an overridable member");
            return;
        }
        let (Some(type_node), Some(params_node)) = (
            decl.child_by_field_name("type"),
            function.child_by_field_name("parameters"),
        ) else {
            return;
        };

        let prefix = self.slice(decl.start_byte(), type_node.start_byte());
        let tail_end = body.map(|b| b.start_byte()).unwrap_or(decl.end_byte());
        let tail = self.slice(params_node.end_byte(), tail_end);
        let specifiers = trailing_specifiers(tail);

        let mut cursor = function.walk();
        let trailing_return = function
            .children(&mut cursor)
            .find(|c| c.kind() == "trailing_return_type");
        let return_type = match trailing_return {
            Some(trailing) => normalize_type(self.text(trailing).trim_start_matches("->")),
            None => with_markers(self.qualified_type(decl, type_node), &markers),
        };

        let mut method = MethodDecl::new(normalize_type(self.text(name_node)), return_type, self.span(decl));
        method.params = self.lower_params(params_node);
        method.is_const = specifiers.contains(&"const");
        method.is_virtual = words(prefix).any(|w| w == "virtual");
        method.is_pure = body.is_none() && is_pure_clause(tail);
        if method.is_pure && !method.is_virtual {
            debug!(method = %method.name, "pure specifier on a non-virtual method");
        }

        trace!(
            method = %method.name,
            params = method.params.len(),
            is_pure = method.is_pure,
            "method"
        );
        self.builder.add_method(ty, method);
    }

    /// Walk through pointer/reference wrappers down to the function
    /// declarator, recording the wrappers as return-type markers.
    fn unwrap_function_declarator<'t>(&self, mut node: Node<'t>, markers: &mut String) -> Option<Node<'t>> {
        loop {
            match node.kind() {
                "function_declarator" => return Some(node),
                "pointer_declarator" => {
                    markers.push_str(&self.pointer_marker(node));
                    node = node.child_by_field_name("declarator")?;
                }
                "reference_declarator" => {
                    markers.push_str(self.reference_marker(node));
                    node = node.named_child(0)?;
                }
                "parenthesized_declarator" | "attributed_declarator" => node = node.named_child(0)?,
                _ => return None,
            }
        }
    }

    fn pointer_marker(&self, node: Node) -> String {
        let mut marker = String::from("*");
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "type_qualifier" {
                marker.push_str(self.text(child));
            }
        }
        marker
    }

    fn reference_marker(&self, node: Node) -> &'a str {
        match node.child(0).map(|c| self.text(c)) {
            Some("&&") => "&&",
            _ => "&",
        }
    }

    /// The declared type with its `const`/`volatile` qualifiers in front,
    /// wherever they were written.
    fn qualified_type(&self, decl: Node, type_node: Node) -> String {
        let mut qualifiers: Vec<&str> = Vec::new();
        let mut cursor = decl.walk();
        for child in decl.children(&mut cursor) {
            if child.kind() == "type_qualifier" {
                let q = self.text(child);
                if matches!(q, "const" | "volatile") && !qualifiers.contains(&q) {
                    qualifiers.push(q);
                }
            }
        }
        let base = normalize_type(self.text(type_node));
        if qualifiers.is_empty() {
            base
        } else {
            format!("{} {}", qualifiers.join(" "), base)
        }
    }

    fn lower_params(&self, list: Node) -> Vec<Param> {
        let mut params = Vec::new();
        let mut cursor = list.walk();
        for child in list.children(&mut cursor) {
            match child.kind() {
                "parameter_declaration" | "optional_parameter_declaration" => {
                    params.push(self.lower_param(child));
                }
                "variadic_parameter_declaration" => {
                    params.push(Param::unnamed(normalize_type(self.text(child))));
                }
                "..." => params.push(Param::unnamed("...")),
                _ => {}
            }
        }

        // `f(void)` declares no parameters.
        if params.len() == 1 && params[0].ty == "void" && params[0].name.is_empty() {
            params.clear();
        }
        params
    }

    fn lower_param(&self, node: Node) -> Param {
        let Some(type_node) = node.child_by_field_name("type") else {
            return Param::unnamed(normalize_type(self.text(node)));
        };
        let base = self.qualified_type(node, type_node);

        let mut markers = String::new();
        let mut current = node.child_by_field_name("declarator");
        while let Some(declarator) = current {
            match declarator.kind() {
                "identifier" => {
                    return Param::new(with_markers(base, &markers), self.text(declarator));
                }
                "pointer_declarator" | "abstract_pointer_declarator" => {
                    markers.push_str(&self.pointer_marker(declarator));
                    current = declarator.child_by_field_name("declarator");
                }
                "reference_declarator" | "abstract_reference_declarator" => {
                    markers.push_str(self.reference_marker(declarator));
                    current = declarator.named_child(0);
                }
                // Array parameters decay to pointers.
                "array_declarator" | "abstract_array_declarator" => {
                    markers.push('*');
                    current = declarator.child_by_field_name("declarator");
                }
                "parenthesized_declarator" => current = declarator.named_child(0),
                _ => {
                    // Function pointers and other shapes keep their written form.
                    let end = declarator.end_byte();
                    let written = normalize_type(self.slice(node.start_byte(), end));
                    return Param::unnamed(written);
                }
            }
        }
        Param::unnamed(with_markers(base, &markers))
    }

    fn collect_syntax_errors(&mut self, root: Node) {
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if self.diagnostics.len() >= MAX_SYNTAX_DIAGNOSTICS {
                return;
            }
            if node.is_error() || node.is_missing() {
                let span = self.span(node);
                let (line, col) = self.source.line_col(span.start);
                warn!(line = line + 1, col = col + 1, "syntax error");
                let message = if node.is_missing() {
                    format!("missing `{}`", node.kind())
                } else {
                    "syntax error".to_string()
                };
                self.diagnostics.push(
                    Diagnostic::warning(message)
                        .with_span(span)
                        .with_label("here")
                        .with_help("classes around this point may be reported incompletely"),
                );
                continue;
            }
            let mut cursor = node.walk();
            let broken: Vec<Node> = node
                .children(&mut cursor)
                .filter(|c| c.has_error() || c.is_missing())
                .collect();
            stack.extend(broken.into_iter().rev());
        }
    }
}

fn with_markers(base: String, markers: &str) -> String {
    if markers.is_empty() {
        base
    } else {
        format!("{base} {markers}")
    }
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
}

/// Keywords after a parameter list (`const`, `override`, `noexcept`, ...),
/// up to the pure specifier, body or trailing return type. Parenthesized
/// groups such as `noexcept(...)` are skipped.
fn trailing_specifiers(tail: &str) -> Vec<&str> {
    let bytes = tail.as_bytes();
    let mut found = Vec::new();
    let mut depth = 0usize;
    let mut start = None;

    for (i, &b) in bytes.iter().enumerate() {
        if b.is_ascii_alphanumeric() || b == b'_' {
            if start.is_none() && depth == 0 {
                start = Some(i);
            }
            continue;
        }
        if let Some(s) = start.take() {
            found.push(&tail[s..i]);
        }
        match b {
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b'=' | b'{' | b';' if depth == 0 => return found,
            b'-' if depth == 0 && bytes.get(i + 1) == Some(&b'>') => return found,
            _ => {}
        }
    }
    if let Some(s) = start {
        found.push(&tail[s..]);
    }
    found
}

/// Whether a declaration tail ends in `= 0`.
fn is_pure_clause(tail: &str) -> bool {
    let compact: String = tail.chars().filter(|c| !c.is_whitespace()).collect();
    compact.trim_end_matches(';').ends_with("=0")
}

/// Canonical spelling of a type: single spaces, none inside template
/// brackets or around `::`, `", "` between template arguments.
pub(crate) fn normalize_type(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let chars: Vec<char> = collapsed.chars().collect();
    let mut out = String::with_capacity(collapsed.len());

    for (i, &c) in chars.iter().enumerate() {
        match c {
            ' ' => {
                let prev = out.chars().last();
                let next = chars.get(i + 1).copied();
                if matches!(prev, None | Some(' ' | '<' | ':' | '('))
                    || matches!(next, Some('<' | '>' | ',' | ':' | ')'))
                {
                    continue;
                }
                out.push(' ');
            }
            ',' => out.push_str(", "),
            _ => out.push(c),
        }
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_type() {
        assert_eq!(normalize_type("unsigned   int"), "unsigned int");
        assert_eq!(normalize_type("std :: vector< int >"), "std::vector<int>");
        assert_eq!(normalize_type("std::map<int,std::string>"), "std::map<int, std::string>");
        assert_eq!(normalize_type("std::pair<int , int>"), "std::pair<int, int>");
    }

    #[test]
    fn test_trailing_specifiers() {
        assert_eq!(trailing_specifiers(" const override = 0;"), vec!["const", "override"]);
        assert_eq!(trailing_specifiers(" noexcept(sizeof(const int)) final"), vec!["noexcept", "final"]);
        assert_eq!(trailing_specifiers(" -> const int override"), Vec::<&str>::new());
        assert_eq!(trailing_specifiers(" const"), vec!["const"]);
    }

    #[test]
    fn test_is_pure_clause() {
        assert!(is_pure_clause(" = 0;"));
        assert!(is_pure_clause(" const override =0 ;"));
        assert!(!is_pure_clause(" = default;"));
        assert!(!is_pure_clause(" = 10;"));
        assert!(!is_pure_clause(";"));
    }
}
