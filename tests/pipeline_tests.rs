//! Tests for the contract compilation pipeline
//!
//! Covers graph flattening, structural dedup, the three validation rules,
//! and the structural memoization of synthesis output.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::Arc;

use assert_matches::assert_matches;
use proptest::prelude::*;

use crosswire::compiler::{
    validate_contract, Compiler, DiagnosticCode, FixKey, MethodRole, Severity,
};
use crosswire::{BridgeDecl, DeclRegistry, MethodSetDecl, MethodSig, ReturnKind, SetId, TypeRef};

fn push_method(name: &str, owner: &str) -> MethodSig {
    MethodSig::new(name, owner).with_param("value", "String")
}

fn chat_registry() -> DeclRegistry {
    let mut registry = DeclRegistry::new();
    registry.register_set(
        MethodSetDecl::new("ChatEvents").with_method(push_method("UserJoined", "ChatEvents")),
    );
    registry.register_set(
        MethodSetDecl::new("ChatOps").with_method(
            MethodSig::new("SendMessage", "ChatOps").with_param("message", "String"),
        ),
    );
    registry.register_bridge(
        BridgeDecl::new("ChatBridge", "chat")
            .with_push_set("ChatEvents")
            .with_invoke_set("ChatOps"),
    );
    registry
}

#[test]
fn test_valid_contract_produces_both_lists() {
    let registry = chat_registry();
    let outcome = validate_contract(&registry, &registry.bridges()[0]);

    let contract = outcome.contract.expect("contract validates");
    assert_eq!(contract.push.len(), 1);
    assert_eq!(contract.invoke.len(), 1);
    assert_eq!(contract.push[0].role, MethodRole::Push);
    assert_eq!(contract.invoke[0].role, MethodRole::Invoke);
}

#[test]
fn test_inherited_duplicate_keeps_closest_declaration() {
    let mut registry = DeclRegistry::new();
    registry.register_set(
        MethodSetDecl::new("Base")
            .with_method(push_method("Notify", "Base"))
            .with_method(push_method("OnlyInBase", "Base")),
    );
    registry.register_set(
        MethodSetDecl::new("Derived")
            .with_method(push_method("Notify", "Derived"))
            .with_ancestor("Base"),
    );
    registry.register_bridge(BridgeDecl::new("B", "b").with_push_set("Derived"));

    let outcome = validate_contract(&registry, &registry.bridges()[0]);
    let contract = outcome.contract.expect("duplicates are not violations");

    assert_eq!(contract.push.len(), 2);
    assert_eq!(contract.push[0].sig.owner, SetId::new("Derived"));

    let notes: Vec<_> = outcome
        .diagnostics
        .iter()
        .filter(|d| d.code == DiagnosticCode::DuplicateSignatureDropped)
        .collect();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].severity, Severity::Note);
}

#[test]
fn test_diamond_inheritance_yields_single_entry() {
    let mut registry = DeclRegistry::new();
    registry.register_set(MethodSetDecl::new("Root").with_method(push_method("Shared", "Root")));
    registry.register_set(MethodSetDecl::new("Left").with_ancestor("Root"));
    registry.register_set(MethodSetDecl::new("Right").with_ancestor("Root"));
    registry.register_set(
        MethodSetDecl::new("Top")
            .with_ancestor("Left")
            .with_ancestor("Right"),
    );
    registry.register_bridge(BridgeDecl::new("B", "b").with_push_set("Top"));

    let outcome = validate_contract(&registry, &registry.bridges()[0]);
    let contract = outcome.contract.unwrap();
    assert_eq!(contract.push.len(), 1);
    // Traversal dedup, not signature dedup: no drop note is emitted.
    assert!(outcome.diagnostics.is_empty());
}

#[test]
fn test_empty_sets_yield_empty_lists() {
    let mut registry = DeclRegistry::new();
    registry.register_set(MethodSetDecl::new("Empty"));
    registry.register_bridge(BridgeDecl::new("B", "b").with_push_set("Empty"));

    let outcome = validate_contract(&registry, &registry.bridges()[0]);
    let contract = outcome.contract.expect("empty sets are not an error");
    assert!(contract.push.is_empty());
    assert!(contract.invoke.is_empty());
}

#[test]
fn test_push_shape_reports_every_violation() {
    let mut registry = DeclRegistry::new();
    registry.register_set(
        MethodSetDecl::new("Events")
            .with_method(
                MethodSig::new("CountA", "Events")
                    .returning(ReturnKind::ValueAsync(TypeRef::new("u64"))),
            )
            .with_method(
                MethodSig::new("CountB", "Events")
                    .returning(ReturnKind::ValueAsync(TypeRef::new("u64"))),
            )
            .with_method(MethodSig::new("Blocking", "Events").returning(ReturnKind::Sync(None)))
            .with_method(MethodSig::new("Fine", "Events")),
    );
    registry.register_bridge(BridgeDecl::new("B", "b").with_push_set("Events"));

    let outcome = validate_contract(&registry, &registry.bridges()[0]);
    assert!(outcome.contract.is_none());

    let violations = outcome.violations();
    assert_eq!(violations.len(), 3);
    assert!(violations
        .iter()
        .all(|d| d.code == DiagnosticCode::PushShape));
    assert!(violations[0].has_fix(FixKey::DropPayload));
    assert!(violations[2].has_fix(FixKey::WrapUnitAsync));
}

#[test]
fn test_bridge_method_reports_both_move_fixes() {
    let mut registry = DeclRegistry::new();
    registry.register_set(MethodSetDecl::new("Events"));
    registry.register_set(MethodSetDecl::new("Ops"));
    registry.register_bridge(
        BridgeDecl::new("ChatBridge", "chat")
            .with_push_set("Events")
            .with_invoke_set("Ops")
            .with_own_method(MethodSig::new("Stray", "ChatBridge")),
    );

    let outcome = validate_contract(&registry, &registry.bridges()[0]);
    let violations = outcome.violations();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].code, DiagnosticCode::MethodOnBridge);
    assert_eq!(violations[0].fixes.len(), 2);
    assert!(violations[0].has_fix(FixKey::MoveToPushSet));
    assert!(violations[0].has_fix(FixKey::MoveToInvokeSet));
}

#[test]
fn test_missing_route_blocks_contract() {
    let mut registry = DeclRegistry::new();
    registry.register_set(MethodSetDecl::new("Events"));
    registry.register_bridge(BridgeDecl::new("B", "  ").with_push_set("Events"));

    let outcome = validate_contract(&registry, &registry.bridges()[0]);
    assert!(outcome.contract.is_none());
    assert_matches!(
        outcome.violations()[0].code,
        DiagnosticCode::MissingRoute
    );
}

#[test]
fn test_unknown_set_reference_blocks_contract() {
    let mut registry = DeclRegistry::new();
    registry.register_bridge(BridgeDecl::new("B", "b").with_push_set("Ghost"));

    let outcome = validate_contract(&registry, &registry.bridges()[0]);
    assert!(outcome.contract.is_none());
    assert_matches!(
        outcome.violations()[0].code,
        DiagnosticCode::UnknownMethodSet
    );
}

#[test]
fn test_one_failing_contract_does_not_block_others() {
    let mut registry = chat_registry();
    registry.register_bridge(BridgeDecl::new("Broken", "").with_push_set("ChatEvents"));

    let mut compiler = Compiler::new();
    let output = compiler.compile_all(&registry);

    assert_eq!(output.contracts.len(), 2);
    assert!(output.contracts[0].result.is_ok());
    assert!(output.contracts[1].result.is_err());
}

#[test]
fn test_repeated_compilation_reuses_cached_synthesis() {
    let registry = chat_registry();
    let mut compiler = Compiler::new();

    let (first, _) = compiler.compile(&registry, &registry.bridges()[0]);
    let (second, _) = compiler.compile(&registry, &registry.bridges()[0]);

    assert!(Arc::ptr_eq(&first.unwrap(), &second.unwrap()));
}

#[test]
fn test_structural_twin_hits_the_cache() {
    let registry_a = chat_registry();
    // A distinct registry holding structurally equal declarations.
    let registry_b = chat_registry();

    let mut compiler = Compiler::new();
    let (from_a, _) = compiler.compile(&registry_a, &registry_a.bridges()[0]);
    let (from_b, _) = compiler.compile(&registry_b, &registry_b.bridges()[0]);

    assert!(Arc::ptr_eq(&from_a.unwrap(), &from_b.unwrap()));
}

#[test]
fn test_per_method_override_classifies_invoke() {
    let registry = DeclRegistry::from_markers([
        crosswire::MarkedDecl::MethodSet(
            MethodSetDecl::new("Mixed")
                .with_method(MethodSig::new("Notify", "Mixed"))
                .with_method(MethodSig::new("Query", "Mixed").invoke_override()),
        ),
    ]);

    let mut collector = crosswire::compiler::DiagnosticCollector::new();
    let flat = crosswire::compiler::flatten(
        &registry,
        &SetId::new("Mixed"),
        crosswire::compiler::RoleContext::PerMethod,
        &mut collector,
    );

    assert_eq!(flat[0].role, MethodRole::Push);
    assert_eq!(flat[1].role, MethodRole::Invoke);
}

// ============================================================================
// Determinism properties
// ============================================================================

fn arbitrary_sets() -> impl Strategy<Value = Vec<MethodSetDecl>> {
    // Chain of up to four sets, each carrying up to four methods drawn from a
    // small name/type pool so duplicates occur often.
    let method = (0..4u8, 0..3u8).prop_map(|(name, ty)| {
        let tys = ["String", "u64", "bool"];
        (format!("Method{name}"), tys[ty as usize].to_string())
    });
    proptest::collection::vec(proptest::collection::vec(method, 0..4), 1..4).prop_map(|sets| {
        sets.into_iter()
            .enumerate()
            .map(|(i, methods)| {
                let id = format!("Set{i}");
                let mut set = MethodSetDecl::new(id.clone());
                for (name, ty) in methods {
                    set = set.with_method(MethodSig::new(name, id.clone()).with_param("value", ty));
                }
                if i > 0 {
                    set = set.with_ancestor(format!("Set{}", i - 1));
                }
                set
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_deduplicated_lists_are_pairwise_distinct(sets in arbitrary_sets()) {
        let mut registry = DeclRegistry::new();
        let root = sets.last().unwrap().id.clone();
        for set in sets {
            registry.register_set(set);
        }
        registry.register_bridge(BridgeDecl::new("B", "b").with_push_set(root));

        let outcome = validate_contract(&registry, &registry.bridges()[0]);
        let contract = outcome.contract.unwrap();

        let keys: Vec<String> = contract.push.iter().map(|m| m.sig.structural_key()).collect();
        let mut deduped = keys.clone();
        deduped.sort();
        deduped.dedup();
        prop_assert_eq!(keys.len(), deduped.len());
    }

    #[test]
    fn prop_validation_is_deterministic(sets in arbitrary_sets()) {
        let mut registry = DeclRegistry::new();
        let root = sets.last().unwrap().id.clone();
        for set in sets {
            registry.register_set(set);
        }
        registry.register_bridge(BridgeDecl::new("B", "b").with_push_set(root));

        let first = validate_contract(&registry, &registry.bridges()[0]);
        let second = validate_contract(&registry, &registry.bridges()[0]);
        prop_assert_eq!(first.contract, second.contract);
        prop_assert_eq!(first.diagnostics, second.diagnostics);
    }
}
