// Contract validation
//
// Three structural rules over the flattened, deduplicated contract, all
// evaluated so every violation is reported in one pass:
//
//   A. the bridge declaration itself carries no method signatures;
//   B. every push-role method returns Unit-Async;
//   C. every invoke-role method is asynchronous.
//
// A contract with any error-severity diagnostic produces no output at all;
// there is no partial synthesis.

use crate::ast::{BridgeDecl, DeclRegistry, ReturnKind};

use super::dedup::{dedup_signatures, DroppedDuplicate};
use super::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticCollector, FixKey, Subject};
use super::walker::{flatten, FlatMethod, MethodRole, RoleContext};

/// A contract that passed every structural rule. The push and invoke lists
/// are deduplicated and pairwise distinct by structural signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedContract {
    pub decl: BridgeDecl,
    pub push: Vec<FlatMethod>,
    pub invoke: Vec<FlatMethod>,
}

/// Result of validating one contract: the contract when no violation was
/// found, plus the complete diagnostic set either way (informational
/// duplicate-drop notes accompany a successful validation).
#[derive(Debug)]
pub struct ValidationOutcome {
    pub contract: Option<ValidatedContract>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationOutcome {
    /// Error-severity diagnostics only.
    #[must_use]
    pub fn violations(&self) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == super::diagnostics::Severity::Error)
            .collect()
    }
}

/// Validate a bridge declaration against the registry.
pub fn validate_contract(registry: &DeclRegistry, decl: &BridgeDecl) -> ValidationOutcome {
    let mut collector = DiagnosticCollector::new();

    check_route(decl, &mut collector);
    check_bridge_methods(decl, &mut collector);

    let push = flatten_side(registry, decl, MethodRole::Push, &mut collector);
    let invoke = flatten_side(registry, decl, MethodRole::Invoke, &mut collector);

    check_push_shape(&push, &mut collector);
    check_invoke_shape(&invoke, &mut collector);

    let contract = if collector.has_errors() {
        None
    } else {
        Some(ValidatedContract {
            decl: decl.clone(),
            push,
            invoke,
        })
    };

    ValidationOutcome {
        contract,
        diagnostics: collector.take_diagnostics(),
    }
}

fn check_route(decl: &BridgeDecl, collector: &mut DiagnosticCollector) {
    if decl.route.trim().is_empty() {
        collector.add(
            Diagnostic::error(
                DiagnosticCode::MissingRoute,
                format!("bridge '{}' has an empty uri segment", decl.id),
            )
            .with_subject(Subject::container(decl.id.clone()))
            .with_note("the uri segment is appended to the base uri when connecting"),
        );
    }
}

/// Rule A: the bridge only references its method sets.
fn check_bridge_methods(decl: &BridgeDecl, collector: &mut DiagnosticCollector) {
    for sig in &decl.own_methods {
        let mut diagnostic = Diagnostic::error(
            DiagnosticCode::MethodOnBridge,
            format!(
                "method '{}' is declared directly on bridge '{}'",
                sig.name, decl.id
            ),
        )
        .with_subject(Subject::method(decl.id.clone(), sig.name.clone()));

        if let Some(push_set) = &decl.push_set {
            diagnostic = diagnostic.with_fix(
                FixKey::MoveToPushSet,
                format!("move '{}' to the push set '{push_set}'", sig.name),
            );
        }
        if let Some(invoke_set) = &decl.invoke_set {
            diagnostic = diagnostic.with_fix(
                FixKey::MoveToInvokeSet,
                format!("move '{}' to the invoke set '{invoke_set}'", sig.name),
            );
        }

        collector.add(diagnostic);
    }
}

fn flatten_side(
    registry: &DeclRegistry,
    decl: &BridgeDecl,
    role: MethodRole,
    collector: &mut DiagnosticCollector,
) -> Vec<FlatMethod> {
    let root = match role {
        MethodRole::Push => decl.push_set.as_ref(),
        MethodRole::Invoke => decl.invoke_set.as_ref(),
    };
    let Some(root) = root else {
        return Vec::new();
    };

    let flat = flatten(registry, root, RoleContext::Side(role), collector);
    let (kept, dropped) = dedup_signatures(flat);
    for drop in dropped {
        collector.add(duplicate_note(&drop));
    }
    kept
}

fn duplicate_note(drop: &DroppedDuplicate) -> Diagnostic {
    Diagnostic::note(
        DiagnosticCode::DuplicateSignatureDropped,
        format!(
            "duplicate signature '{}' from set '{}' dropped; '{}' declares it first",
            drop.dropped.sig.structural_key(),
            drop.dropped.sig.owner,
            drop.kept_owner
        ),
    )
    .with_subject(Subject::method(
        drop.dropped.sig.owner.as_str(),
        drop.dropped.sig.name.clone(),
    ))
}

/// Rule B: push methods are fire-and-forget and carry no result payload.
fn check_push_shape(push: &[FlatMethod], collector: &mut DiagnosticCollector) {
    for method in push {
        if method.sig.returns == ReturnKind::UnitAsync {
            continue;
        }

        let diagnostic = Diagnostic::error(
            DiagnosticCode::PushShape,
            format!(
                "push method '{}' on set '{}' returns {}; push methods must return Unit-Async",
                method.sig.name,
                method.sig.owner,
                method.sig.returns.describe()
            ),
        )
        .with_subject(Subject::method(
            method.sig.owner.as_str(),
            method.sig.name.clone(),
        ));

        let diagnostic = match &method.sig.returns {
            ReturnKind::ValueAsync(ty) => diagnostic.with_fix(
                FixKey::DropPayload,
                format!("drop the '{ty}' payload and return Unit-Async"),
            ),
            _ => diagnostic.with_fix(FixKey::WrapUnitAsync, "wrap the return in Unit-Async"),
        };

        collector.add(diagnostic);
    }
}

/// Rule C: invoke methods are asynchronous, with or without a payload.
fn check_invoke_shape(invoke: &[FlatMethod], collector: &mut DiagnosticCollector) {
    for method in invoke {
        let ReturnKind::Sync(payload) = &method.sig.returns else {
            continue;
        };

        let diagnostic = Diagnostic::error(
            DiagnosticCode::InvokeShape,
            format!(
                "invoke method '{}' on set '{}' is not asynchronous",
                method.sig.name, method.sig.owner
            ),
        )
        .with_subject(Subject::method(
            method.sig.owner.as_str(),
            method.sig.name.clone(),
        ));

        let diagnostic = match payload {
            Some(ty) => diagnostic.with_fix(
                FixKey::WrapValueAsync,
                format!("wrap the return in Value-Async({ty})"),
            ),
            None => diagnostic.with_fix(FixKey::WrapUnitAsync, "wrap the return in Unit-Async"),
        };

        collector.add(diagnostic);
    }
}
