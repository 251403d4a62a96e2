//! Declaration model and marker discovery for bridge contracts.
//!
//! A contract is a small inheritance graph: a [`BridgeDecl`] carrying
//! addressing metadata references up to two [`MethodSetDecl`]s (push role,
//! invoke role), each of which may inherit signatures from ancestor sets.
//! Declarations are discovered from declarative markers into a
//! [`DeclRegistry`] before the compilation pipeline runs.

pub mod decl;
pub mod registry;

pub use decl::{BridgeDecl, MethodSetDecl, MethodSig, ParamSpec, ReturnKind, SetId, TypeRef};
pub use registry::{DeclRegistry, MarkedDecl};
