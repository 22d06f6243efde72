use crate::edit::{Effect, TextEdit};
use crate::reconcile::ResidualSet;
use overrider_common::SourceId;
use overrider_model::{Access, MethodSignature, TypeNode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How each synthesized override is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StubStyle {
    /// `void F() override;`
    #[default]
    Declaration,
    /// `void F() override { static_assert(false, "`F` is unimplemented."); }`
    ///
    /// Fails the build until every stub is replaced.
    UnimplementedBody,
}

/// Which `public:` label receives the new members when there are several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicSection {
    First,
    #[default]
    Last,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitPolicy {
    pub style: StubStyle,
    pub public_section: PublicSection,
    /// Prefixed to every generated line.
    pub indent: String,
}

/// Where the generated members go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionAnchor {
    /// Right after the `:` of a `public:` label.
    PublicColon(u32),
    /// Right after the class's `{`.
    OpenBrace(u32),
    /// Right before the class's `}`.
    CloseBrace(u32),
}

impl InsertionAnchor {
    /// Byte offset at which text is inserted.
    pub fn offset(self) -> u32 {
        match self {
            InsertionAnchor::PublicColon(colon) => colon + 1,
            InsertionAnchor::OpenBrace(brace) => brace + 1,
            InsertionAnchor::CloseBrace(brace) => brace,
        }
    }
}

/// Pick the insertion anchor: a `public:` label, else the opening brace,
/// else the closing brace. `None` when the class has no usable anchor.
pub fn choose_anchor(derived: &TypeNode, policy: &EmitPolicy) -> Option<InsertionAnchor> {
    let anchors = &derived.anchors;
    let mut public = anchors
        .access_sections
        .iter()
        .filter(|s| s.access == Access::Public);
    let public = match policy.public_section {
        PublicSection::First => public.next(),
        PublicSection::Last => public.last(),
    };

    public
        .map(|s| InsertionAnchor::PublicColon(s.colon))
        .or_else(|| anchors.open_brace.map(InsertionAnchor::OpenBrace))
        .or_else(|| anchors.close_brace.map(InsertionAnchor::CloseBrace))
}

/// One override line, without indentation or line break.
pub fn render_method(method: &MethodSignature, style: StubStyle) -> String {
    let params: Vec<String> = method.params.iter().map(|p| p.to_string()).collect();
    let head = format!(
        "{} {}({}){} override",
        method.return_type,
        method.name,
        params.join(", "),
        if method.is_const { " const" } else { "" }
    );
    match style {
        StubStyle::Declaration => format!("{head};"),
        StubStyle::UnimplementedBody => format!(
            "{head} {{ static_assert(false, \"`{}` is unimplemented.\"); }}",
            method.name
        ),
    }
}

/// Render `residual` and place it in `derived`.
///
/// Returns a no-op effect for an empty residual set and `None` when the
/// class has no anchor to insert at. Otherwise the effect is exactly one
/// insertion; the rest of the file is left untouched.
pub fn emit(
    residual: &ResidualSet<'_>,
    derived: &TypeNode,
    source: SourceId,
    policy: &EmitPolicy,
) -> Option<Effect> {
    if residual.is_empty() {
        return Some(Effect::noop(source));
    }
    let Some(anchor) = choose_anchor(derived, policy) else {
        debug!(class = %derived.qualified_name, "no insertion anchor");
        return None;
    };

    let mut text = String::from("\n");
    for method in residual {
        text.push_str(&policy.indent);
        text.push_str(&render_method(method, policy.style));
        text.push('\n');
    }

    debug!(
        class = %derived.qualified_name,
        ?anchor,
        methods = residual.len(),
        "emitting overrides"
    );
    Some(Effect::single(source, TextEdit::insert(anchor.offset(), text)))
}
