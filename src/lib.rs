//! Crosswire compiles declarative bridge contracts into strongly-typed
//! relay client bindings and matching test fakes.
//!
//! A contract is a small inheritance graph: a bridge declaration carrying
//! addressing metadata references up to two method-set declarations, one for
//! push methods (server-to-client, fire-and-forget) and one for invoke
//! methods (client-to-server request/response). Compilation is a pure
//! pipeline over that graph:
//!
//! 1. walk the ancestor DAG into ordered, provenance-tagged method lists;
//! 2. drop later duplicates by structural signature;
//! 3. check the structural rules, reporting every violation with fix
//!    suggestions;
//! 4. synthesize the client binding, its structural manifest, and a
//!    registration helper.
//!
//! The fake synthesizer consumes the manifest and produces a test double
//! whose push side is driven through [`runtime::EventChannel`], the async
//! coordination primitive letting tests await simulated events.

pub mod ast;
pub mod compiler;
pub mod runtime;

pub use ast::{
    BridgeDecl, DeclRegistry, MarkedDecl, MethodSetDecl, MethodSig, ParamSpec, ReturnKind, SetId,
    TypeRef,
};
pub use compiler::{
    apply_batch, apply_fix, synthesize, synthesize_fake, validate_contract, BindingManifest,
    ClientBinding, CompileOutput, Compiler, Diagnostic, DiagnosticCode, FakeBinding,
    FakeSynthError, FixKey, MethodRole, Severity, Synthesis, ValidatedContract,
};
pub use runtime::{ChannelError, EventChannel, FakeError};
