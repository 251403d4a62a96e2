//! Contract compilation pipeline
//!
//! The pipeline is a pure, synchronous function of its input graph:
//! walk → dedup → validate → synthesize. Synthesis output is memoized per
//! contract, keyed by a structural hash of the bridge declaration and its
//! reachable set subgraph, so an unchanged contract reuses prior output
//! bit-for-bit across recompilations.
//!
//! A violation in one contract never blocks unrelated contracts; a fake
//! synthesis failure skips only that one fake.

pub mod codegen;
pub mod dedup;
pub mod diagnostics;
pub mod fake_codegen;
pub mod fixes;
pub mod manifest;
pub mod validate;
pub mod walker;

pub use codegen::{aggregate_registration, synthesize, ClientBinding, Synthesis};
pub use dedup::{dedup_signatures, DroppedDuplicate};
pub use diagnostics::{
    Diagnostic, DiagnosticCode, DiagnosticCollector, FixKey, FixSuggestion, Severity, Subject,
};
pub use fake_codegen::{synthesize_fake, FakeBinding, FakeSynthError, FakeSynthesis};
pub use fixes::{apply_batch, apply_fix, FixError};
pub use manifest::{BindingManifest, MethodDescriptor};
pub use validate::{validate_contract, ValidatedContract, ValidationOutcome};
pub use walker::{flatten, FlatMethod, MethodRole, RoleContext};

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use proc_macro2::TokenStream;

use crate::ast::{BridgeDecl, DeclRegistry, SetId};

/// Outcome of compiling one bridge declaration.
#[derive(Debug)]
pub struct ContractOutcome {
    pub bridge: String,
    /// Synthesis output, or the full diagnostic set when validation failed.
    pub result: Result<Arc<Synthesis>, Vec<Diagnostic>>,
    /// Non-blocking diagnostics accompanying a successful compilation
    /// (duplicate-signature drops).
    pub notes: Vec<Diagnostic>,
}

/// Outcome of generating one requested fake.
#[derive(Debug)]
pub struct FakeOutcome {
    pub target: String,
    pub result: Result<FakeSynthesis, FakeSynthError>,
}

/// Output of a whole compilation pass.
#[derive(Debug)]
pub struct CompileOutput {
    pub contracts: Vec<ContractOutcome>,
    pub fakes: Vec<FakeOutcome>,
    /// Aggregate registration helper over every successful binding.
    pub aggregate: TokenStream,
}

/// The contract compiler, carrying the structural synthesis cache.
#[derive(Debug, Default)]
pub struct Compiler {
    cache: HashMap<u64, Arc<Synthesis>>,
}

impl Compiler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Structural cache key for a bridge: the declaration itself plus every
    /// reachable method set, hashed in deterministic traversal order.
    /// Structurally equal subgraphs produce equal keys regardless of which
    /// registry holds them.
    #[must_use]
    pub fn contract_key(registry: &DeclRegistry, decl: &BridgeDecl) -> u64 {
        let mut hasher = DefaultHasher::new();
        decl.hash(&mut hasher);

        let mut visited = HashSet::new();
        for root in [&decl.push_set, &decl.invoke_set].into_iter().flatten() {
            hash_subgraph(registry, root, &mut visited, &mut hasher);
        }

        hasher.finish()
    }

    /// Compile one bridge declaration, reusing cached synthesis when the
    /// contract's input subgraph is structurally unchanged.
    pub fn compile(
        &mut self,
        registry: &DeclRegistry,
        decl: &BridgeDecl,
    ) -> (Result<Arc<Synthesis>, Vec<Diagnostic>>, Vec<Diagnostic>) {
        let outcome = validate_contract(registry, decl);
        let Some(contract) = outcome.contract else {
            tracing::debug!(bridge = %decl.id, "contract failed validation");
            return (Err(outcome.diagnostics), Vec::new());
        };

        let key = Self::contract_key(registry, decl);
        let synthesis = match self.cache.get(&key) {
            Some(cached) => {
                tracing::debug!(bridge = %decl.id, key, "synthesis cache hit");
                Arc::clone(cached)
            }
            None => {
                tracing::debug!(bridge = %decl.id, key, "synthesizing binding");
                let fresh = Arc::new(synthesize(&contract));
                self.cache.insert(key, Arc::clone(&fresh));
                fresh
            }
        };

        (Ok(synthesis), outcome.diagnostics)
    }

    /// Compile every discovered bridge and generate every requested fake.
    pub fn compile_all(&mut self, registry: &DeclRegistry) -> CompileOutput {
        let contracts: Vec<ContractOutcome> = registry
            .bridges()
            .iter()
            .map(|decl| {
                let (result, notes) = self.compile(registry, decl);
                ContractOutcome {
                    bridge: decl.id.clone(),
                    result,
                    notes,
                }
            })
            .collect();

        let manifests: Vec<&BindingManifest> = contracts
            .iter()
            .filter_map(|c| c.result.as_ref().ok())
            .map(|s| &s.manifest)
            .collect();

        let fakes = registry
            .fake_targets()
            .iter()
            .map(|target| {
                let result = match manifests.iter().find(|m| &m.binding == target) {
                    Some(manifest) => synthesize_fake(manifest),
                    None => {
                        tracing::debug!(%target, "no synthesized binding for fake target");
                        Err(FakeSynthError::UnknownTarget {
                            target: target.clone(),
                        })
                    }
                };
                FakeOutcome {
                    target: target.clone(),
                    result,
                }
            })
            .collect();

        let bindings: Vec<&ClientBinding> = contracts
            .iter()
            .filter_map(|c| c.result.as_ref().ok())
            .map(|s| &s.binding)
            .collect();
        let aggregate = aggregate_registration(&bindings);

        CompileOutput {
            contracts,
            fakes,
            aggregate,
        }
    }
}

fn hash_subgraph(
    registry: &DeclRegistry,
    id: &SetId,
    visited: &mut HashSet<SetId>,
    hasher: &mut DefaultHasher,
) {
    if !visited.insert(id.clone()) {
        return;
    }
    let Some(set) = registry.set(id) else {
        id.hash(hasher);
        return;
    };
    set.hash(hasher);
    for ancestor in &set.ancestors {
        hash_subgraph(registry, ancestor, visited, hasher);
    }
}
