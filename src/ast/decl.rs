// Declaration model for bridge contracts
//
// A contract is a bridge declaration tying addressing metadata to up to two
// method-set declarations (push side, invoke side). Method sets inherit from
// ancestor sets, forming a DAG.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a method-set declaration.
///
/// Set identity keys graph traversal (visited tracking on diamonds) and
/// provenance reporting in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SetId(String);

impl SetId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SetId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A declared type, carried as Rust type-path text (e.g. `String`, `Vec<u8>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef(String);

impl TypeRef {
    pub fn new(ty: impl Into<String>) -> Self {
        Self(ty.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this type is cancellation plumbing rather than payload.
    ///
    /// Cancellation-typed trailing parameters are excluded from recorded and
    /// compared argument lists in generated fakes.
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        self.0
            .rsplit("::")
            .next()
            .is_some_and(|tail| tail.trim() == "CancellationToken")
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TypeRef {
    fn from(ty: &str) -> Self {
        Self::new(ty)
    }
}

/// Return kind of a declared method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReturnKind {
    /// Asynchronous, no result payload.
    UnitAsync,
    /// Asynchronous, resolving with a payload of the given type.
    ValueAsync(TypeRef),
    /// Synchronous declaration, with an optional payload type.
    ///
    /// Never legal on a validated contract; modeled so shape rules can
    /// report it and suggest the async wrapping fix.
    Sync(Option<TypeRef>),
}

impl ReturnKind {
    #[must_use]
    pub fn is_async(&self) -> bool {
        !matches!(self, Self::Sync(_))
    }

    /// Human-readable name used in shape diagnostics.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::UnitAsync => "Unit-Async".to_string(),
            Self::ValueAsync(ty) => format!("Value-Async({ty})"),
            Self::Sync(Some(ty)) => format!("synchronous {ty}"),
            Self::Sync(None) => "synchronous without payload".to_string(),
        }
    }
}

/// A named, typed method parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub ty: TypeRef,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: TypeRef::new(ty),
        }
    }
}

/// A method signature as declared in a method set (or, illegally, on a
/// bridge declaration itself).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodSig {
    pub name: String,
    pub params: Vec<ParamSpec>,
    pub returns: ReturnKind,
    /// The set that declared this signature; provenance for diagnostics.
    pub owner: SetId,
    /// Per-method marker forcing invoke classification. Absent means push
    /// when the role is not already fixed by the bridge side.
    pub invoke_override: bool,
}

impl MethodSig {
    pub fn new(name: impl Into<String>, owner: impl Into<SetId>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            returns: ReturnKind::UnitAsync,
            owner: owner.into(),
            invoke_override: false,
        }
    }

    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.params.push(ParamSpec::new(name, ty));
        self
    }

    #[must_use]
    pub fn returning(mut self, returns: ReturnKind) -> Self {
        self.returns = returns;
        self
    }

    #[must_use]
    pub fn invoke_override(mut self) -> Self {
        self.invoke_override = true;
        self
    }

    /// Canonical structural signature: name plus ordered parameter types.
    ///
    /// Return-kind differences alone do not distinguish two signatures.
    #[must_use]
    pub fn structural_key(&self) -> String {
        let params: Vec<&str> = self.params.iter().map(|p| p.ty.as_str()).collect();
        format!("{}({})", self.name, params.join(","))
    }
}

impl From<String> for SetId {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// A method-set declaration: signatures plus zero or more ancestor sets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodSetDecl {
    pub id: SetId,
    pub methods: Vec<MethodSig>,
    /// Ancestor sets in declaration order. Diamonds are permitted.
    pub ancestors: Vec<SetId>,
}

impl MethodSetDecl {
    pub fn new(id: impl Into<SetId>) -> Self {
        Self {
            id: id.into(),
            methods: Vec::new(),
            ancestors: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_method(mut self, method: MethodSig) -> Self {
        self.methods.push(method);
        self
    }

    #[must_use]
    pub fn with_ancestor(mut self, ancestor: impl Into<SetId>) -> Self {
        self.ancestors.push(ancestor.into());
        self
    }
}

/// The bridge declaration: addressing metadata plus references to the
/// push-role and invoke-role method sets. One-sided bridges are valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BridgeDecl {
    /// Identity of the bridge (its declared type name).
    pub id: String,
    /// Uri segment appended to the base uri when connecting. Required.
    pub route: String,
    /// Optional friendly name, surfaced in generated documentation.
    pub display_name: Option<String>,
    pub push_set: Option<SetId>,
    pub invoke_set: Option<SetId>,
    /// Signatures declared directly on the bridge. Always a structural
    /// violation; kept in the model so the validator can report each one
    /// with move-to-set fixes.
    pub own_methods: Vec<MethodSig>,
}

impl BridgeDecl {
    pub fn new(id: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            route: route.into(),
            display_name: None,
            push_set: None,
            invoke_set: None,
            own_methods: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_push_set(mut self, set: impl Into<SetId>) -> Self {
        self.push_set = Some(set.into());
        self
    }

    #[must_use]
    pub fn with_invoke_set(mut self, set: impl Into<SetId>) -> Self {
        self.invoke_set = Some(set.into());
        self
    }

    #[must_use]
    pub fn with_own_method(mut self, method: MethodSig) -> Self {
        self.own_methods.push(method);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_key_ignores_return_kind() {
        let a = MethodSig::new("Notify", "SetA")
            .with_param("user", "String")
            .returning(ReturnKind::UnitAsync);
        let b = MethodSig::new("Notify", "SetB")
            .with_param("who", "String")
            .returning(ReturnKind::ValueAsync(TypeRef::new("u64")));

        assert_eq!(a.structural_key(), b.structural_key());
    }

    #[test]
    fn test_structural_key_orders_parameter_types() {
        let a = MethodSig::new("Send", "S")
            .with_param("x", "String")
            .with_param("y", "u64");
        let b = MethodSig::new("Send", "S")
            .with_param("x", "u64")
            .with_param("y", "String");

        assert_ne!(a.structural_key(), b.structural_key());
    }

    #[test]
    fn test_cancellation_type_detection() {
        assert!(TypeRef::new("CancellationToken").is_cancellation());
        assert!(TypeRef::new("tokio_util::sync::CancellationToken").is_cancellation());
        assert!(!TypeRef::new("String").is_cancellation());
    }
}
