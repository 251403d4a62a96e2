// Inheritance-graph flattening
//
// Depth-first walk over a method set and its ancestor DAG, producing an
// ordered, provenance-tagged method list. A visited set keyed on set identity
// keeps diamonds from being traversed twice; name collisions across distinct
// sets are the deduplicator's concern, not the walker's.

use std::collections::HashSet;

use crate::ast::{DeclRegistry, MethodSig, SetId};

use super::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticCollector, Subject};

/// Role of a flattened method, contextual to the contract being compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodRole {
    Push,
    Invoke,
}

/// How the walk assigns roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleContext {
    /// The root set occupies one side of a bridge declaration; every method
    /// it reaches takes that side's role.
    Side(MethodRole),
    /// The set is walked without a bridge side; each method classifies
    /// itself via its override marker, defaulting to push.
    PerMethod,
}

/// A flattened method with its contextual role. Provenance is the
/// signature's owning set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlatMethod {
    pub sig: MethodSig,
    pub role: MethodRole,
}

/// Flatten the inheritance graph rooted at `root` into an ordered method
/// list: the root's own methods first, then each ancestor in declaration
/// order, depth-first. Empty sets yield empty lists.
///
/// A reference to an unregistered set is reported through the collector and
/// that edge is skipped.
pub fn flatten(
    registry: &DeclRegistry,
    root: &SetId,
    context: RoleContext,
    collector: &mut DiagnosticCollector,
) -> Vec<FlatMethod> {
    let mut visited = HashSet::new();
    let mut out = Vec::new();
    visit(registry, root, context, &mut visited, &mut out, collector);
    out
}

fn visit(
    registry: &DeclRegistry,
    id: &SetId,
    context: RoleContext,
    visited: &mut HashSet<SetId>,
    out: &mut Vec<FlatMethod>,
    collector: &mut DiagnosticCollector,
) {
    if !visited.insert(id.clone()) {
        return;
    }

    let Some(set) = registry.set(id) else {
        collector.add(
            Diagnostic::error(
                DiagnosticCode::UnknownMethodSet,
                format!("method set '{id}' is referenced but was never declared"),
            )
            .with_subject(Subject::container(id.as_str()))
            .with_note("register the set or fix the reference"),
        );
        return;
    };

    for sig in &set.methods {
        let role = match context {
            RoleContext::Side(role) => role,
            RoleContext::PerMethod => {
                if sig.invoke_override {
                    MethodRole::Invoke
                } else {
                    MethodRole::Push
                }
            }
        };
        out.push(FlatMethod {
            sig: sig.clone(),
            role,
        });
    }

    for ancestor in &set.ancestors {
        visit(registry, ancestor, context, visited, out, collector);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{MethodSetDecl, MethodSig};

    fn registry_with(sets: Vec<MethodSetDecl>) -> DeclRegistry {
        let mut registry = DeclRegistry::new();
        for set in sets {
            registry.register_set(set);
        }
        registry
    }

    fn names(methods: &[FlatMethod]) -> Vec<&str> {
        methods.iter().map(|m| m.sig.name.as_str()).collect()
    }

    #[test]
    fn test_own_methods_precede_ancestors() {
        let registry = registry_with(vec![
            MethodSetDecl::new("Base").with_method(MethodSig::new("FromBase", "Base")),
            MethodSetDecl::new("Derived")
                .with_method(MethodSig::new("FromDerived", "Derived"))
                .with_ancestor("Base"),
        ]);

        let mut collector = DiagnosticCollector::new();
        let flat = flatten(
            &registry,
            &SetId::new("Derived"),
            RoleContext::Side(MethodRole::Push),
            &mut collector,
        );

        assert_eq!(names(&flat), ["FromDerived", "FromBase"]);
        assert!(!collector.has_errors());
    }

    #[test]
    fn test_diamond_visits_shared_ancestor_once() {
        let registry = registry_with(vec![
            MethodSetDecl::new("Root").with_method(MethodSig::new("Shared", "Root")),
            MethodSetDecl::new("Left")
                .with_method(MethodSig::new("FromLeft", "Left"))
                .with_ancestor("Root"),
            MethodSetDecl::new("Right")
                .with_method(MethodSig::new("FromRight", "Right"))
                .with_ancestor("Root"),
            MethodSetDecl::new("Top")
                .with_ancestor("Left")
                .with_ancestor("Right"),
        ]);

        let mut collector = DiagnosticCollector::new();
        let flat = flatten(
            &registry,
            &SetId::new("Top"),
            RoleContext::Side(MethodRole::Push),
            &mut collector,
        );

        assert_eq!(names(&flat), ["FromLeft", "Shared", "FromRight"]);
    }

    #[test]
    fn test_per_method_role_defaults_to_push() {
        let registry = registry_with(vec![MethodSetDecl::new("Mixed")
            .with_method(MethodSig::new("Plain", "Mixed"))
            .with_method(MethodSig::new("Forced", "Mixed").invoke_override())]);

        let mut collector = DiagnosticCollector::new();
        let flat = flatten(
            &registry,
            &SetId::new("Mixed"),
            RoleContext::PerMethod,
            &mut collector,
        );

        assert_eq!(flat[0].role, MethodRole::Push);
        assert_eq!(flat[1].role, MethodRole::Invoke);
    }

    #[test]
    fn test_unknown_set_reports_and_skips() {
        let registry = registry_with(vec![MethodSetDecl::new("Orphan")
            .with_method(MethodSig::new("Own", "Orphan"))
            .with_ancestor("Missing")]);

        let mut collector = DiagnosticCollector::new();
        let flat = flatten(
            &registry,
            &SetId::new("Orphan"),
            RoleContext::Side(MethodRole::Invoke),
            &mut collector,
        );

        assert_eq!(names(&flat), ["Own"]);
        assert!(collector.has_errors());
        assert_eq!(
            collector.diagnostics()[0].code,
            DiagnosticCode::UnknownMethodSet
        );
    }
}
