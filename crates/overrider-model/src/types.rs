use crate::method::DeclId;
use overrider_common::Span;
use smol_str::SmolStr;
use std::fmt;

/// Identity of a class or struct definition within one model snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// C++ access specifier, used both for base specifiers and member sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Public,
    Protected,
    Private,
}

impl Access {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.trim().trim_end_matches(':').trim() {
            "public" => Some(Access::Public),
            "protected" => Some(Access::Protected),
            "private" => Some(Access::Private),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Access::Public => "public",
            Access::Protected => "protected",
            Access::Private => "private",
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// `class` or `struct`; decides the default member and base access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Class,
    Struct,
}

impl RecordKind {
    pub fn default_access(self) -> Access {
        match self {
            RecordKind::Class => Access::Private,
            RecordKind::Struct => Access::Public,
        }
    }
}

/// One entry of a base-class clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseSpecifier {
    /// The base name as written in the source.
    pub spelled: SmolStr,
    pub access: Access,
    /// `virtual` inheritance.
    pub is_virtual: bool,
    /// `None` when the name does not resolve to a definition in the model
    /// (incomplete type, template instantiation, another translation unit).
    pub resolved: Option<TypeId>,
}

/// An `access-specifier :` label inside a class body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessSection {
    pub access: Access,
    /// Byte offset of the `:` character.
    pub colon: u32,
}

/// Syntactic positions inside the class definition, as byte offsets into
/// the file the class was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassAnchors {
    /// From the `class`/`struct` keyword up to (excluding) the body.
    pub header: Span,
    /// Offset of the `{` character.
    pub open_brace: Option<u32>,
    /// Offset of the `}` character.
    pub close_brace: Option<u32>,
    /// Access labels in source order.
    pub access_sections: Vec<AccessSection>,
}

impl ClassAnchors {
    pub fn new(header: Span) -> Self {
        Self {
            header,
            open_brace: None,
            close_brace: None,
            access_sections: Vec::new(),
        }
    }
}

/// A class or struct definition.
#[derive(Debug, Clone)]
pub struct TypeNode {
    pub id: TypeId,
    pub name: SmolStr,
    /// Name including enclosing namespaces and classes, `::`-separated.
    pub qualified_name: SmolStr,
    pub kind: RecordKind,
    /// Direct bases in declaration order.
    pub bases: Vec<BaseSpecifier>,
    /// Declared methods in declaration order.
    pub methods: Vec<DeclId>,
    /// Derived transitively: some pure-virtual method reachable from this
    /// type has no implementation along the way.
    pub is_abstract: bool,
    pub anchors: ClassAnchors,
}

impl TypeNode {
    /// Resolved direct bases, skipping the unresolved ones.
    pub fn resolved_bases(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.bases.iter().filter_map(|b| b.resolved)
    }
}
