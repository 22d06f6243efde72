use crate::types::TypeId;
use overrider_common::Span;
use smol_str::SmolStr;
use std::fmt;

/// Declaration identity of a method.
///
/// Two methods with identical text but no override relationship have
/// different ids; comparing ids is the only way the refactoring decides
/// whether an obligation is met.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(pub(crate) u32);

impl DeclId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// A method parameter. `ty` is the type text as the model reports it,
/// qualifiers and pointer/reference markers included.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Param {
    pub ty: SmolStr,
    /// Empty for unnamed parameters.
    pub name: SmolStr,
}

impl Param {
    pub fn new(ty: impl Into<SmolStr>, name: impl Into<SmolStr>) -> Self {
        Self {
            ty: ty.into(),
            name: name.into(),
        }
    }

    pub fn unnamed(ty: impl Into<SmolStr>) -> Self {
        Self::new(ty, "")
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            f.write_str(&self.ty)
        } else {
            write!(f, "{} {}", self.ty, self.name)
        }
    }
}

/// A method as declared in the source, before the model links overrides.
#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub name: SmolStr,
    pub return_type: SmolStr,
    pub params: Vec<Param>,
    pub is_const: bool,
    /// Written with the `virtual` keyword.
    pub is_virtual: bool,
    /// Declared `= 0`.
    pub is_pure: bool,
    pub span: Span,
}

impl MethodDecl {
    /// A non-virtual, non-const method with no parameters.
    pub fn new(name: impl Into<SmolStr>, return_type: impl Into<SmolStr>, span: Span) -> Self {
        Self {
            name: name.into(),
            return_type: return_type.into(),
            params: Vec::new(),
            is_const: false,
            is_virtual: false,
            is_pure: false,
            span,
        }
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn constant(mut self) -> Self {
        self.is_const = true;
        self
    }

    pub fn virtual_(mut self) -> Self {
        self.is_virtual = true;
        self
    }

    /// `virtual ... = 0`.
    pub fn pure(mut self) -> Self {
        self.is_virtual = true;
        self.is_pure = true;
        self
    }
}

/// A method known to the model.
#[derive(Debug, Clone)]
pub struct MethodSignature {
    pub id: DeclId,
    pub owner: TypeId,
    pub name: SmolStr,
    pub return_type: SmolStr,
    pub params: Vec<Param>,
    pub is_const: bool,
    /// Explicitly `virtual`, or virtual because it overrides something.
    pub is_virtual: bool,
    pub is_pure: bool,
    /// Methods this one directly overrides.
    pub overrides: Vec<DeclId>,
    pub span: Span,
}

impl MethodSignature {
    /// Same name, parameter types and const-qualification: the C++ rule for
    /// one virtual function overriding another.
    pub fn same_override_signature(&self, other: &MethodSignature) -> bool {
        self.name == other.name
            && self.is_const == other.is_const
            && self.params.len() == other.params.len()
            && self
                .params
                .iter()
                .zip(&other.params)
                .all(|(a, b)| a.ty == b.ty)
    }

    /// `ret name(params) [const]`, used for listings.
    pub fn display_signature(&self) -> String {
        let params: Vec<String> = self.params.iter().map(|p| p.to_string()).collect();
        format!(
            "{} {}({}){}",
            self.return_type,
            self.name,
            params.join(", "),
            if self.is_const { " const" } else { "" }
        )
    }
}
