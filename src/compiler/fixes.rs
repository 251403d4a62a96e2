// Batch fix application
//
// Fixes are data: a diagnostic plus a chosen fix key. Applying a selection is
// a pure map from one declaration registry to another, independent of any
// editor surface. Unknown keys or subjects fail that selection without
// mutating anything.

use thiserror::Error;

use crate::ast::{DeclRegistry, MethodSig, ReturnKind, SetId};

use super::diagnostics::{Diagnostic, FixKey};

/// Reasons a fix selection cannot be applied.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FixError {
    #[error("diagnostic does not offer fix '{key}'")]
    FixNotOffered { key: FixKey },

    #[error("diagnostic has no method subject to rewrite")]
    MissingSubject,

    #[error("declaration '{name}' not found in the registry")]
    UnknownDeclaration { name: String },

    #[error("bridge '{bridge}' has no {side} set to move the method into")]
    MissingTargetSet {
        bridge: String,
        side: &'static str,
    },
}

/// Apply one fix, producing a rewritten registry. The input registry is
/// untouched.
pub fn apply_fix(
    registry: &DeclRegistry,
    diagnostic: &Diagnostic,
    key: FixKey,
) -> Result<DeclRegistry, FixError> {
    if !diagnostic.has_fix(key) {
        return Err(FixError::FixNotOffered { key });
    }
    let subject = diagnostic
        .subject
        .as_ref()
        .filter(|s| s.method.is_some())
        .ok_or(FixError::MissingSubject)?;
    let method = subject.method.clone().unwrap_or_default();

    let mut next = registry.clone();
    match key {
        FixKey::MoveToPushSet => move_bridge_method(&mut next, &subject.container, &method, true)?,
        FixKey::MoveToInvokeSet => {
            move_bridge_method(&mut next, &subject.container, &method, false)?;
        }
        FixKey::DropPayload | FixKey::WrapUnitAsync => {
            rewrite_return(&mut next, &subject.container, &method, |_| {
                ReturnKind::UnitAsync
            })?;
        }
        FixKey::WrapValueAsync => {
            rewrite_return(&mut next, &subject.container, &method, |previous| {
                match previous {
                    ReturnKind::Sync(Some(ty)) => ReturnKind::ValueAsync(ty),
                    other => other,
                }
            })?;
        }
    }
    Ok(next)
}

/// Apply a batch of selections in order, folding over the registry. The
/// result also carries per-selection failures; a failed selection leaves the
/// accumulated registry as it was.
pub fn apply_batch(
    registry: &DeclRegistry,
    selections: &[(Diagnostic, FixKey)],
) -> (DeclRegistry, Vec<FixError>) {
    let mut current = registry.clone();
    let mut failures = Vec::new();

    for (diagnostic, key) in selections {
        match apply_fix(&current, diagnostic, *key) {
            Ok(next) => current = next,
            Err(err) => failures.push(err),
        }
    }

    (current, failures)
}

fn move_bridge_method(
    registry: &mut DeclRegistry,
    bridge_id: &str,
    method: &str,
    to_push: bool,
) -> Result<(), FixError> {
    let side = if to_push { "push" } else { "invoke" };

    let bridge = registry
        .bridge_mut(bridge_id)
        .ok_or_else(|| FixError::UnknownDeclaration {
            name: bridge_id.to_string(),
        })?;

    let target: SetId = {
        let set = if to_push {
            bridge.push_set.as_ref()
        } else {
            bridge.invoke_set.as_ref()
        };
        set.cloned().ok_or(FixError::MissingTargetSet {
            bridge: bridge_id.to_string(),
            side,
        })?
    };

    let position = bridge
        .own_methods
        .iter()
        .position(|m| m.name == method)
        .ok_or_else(|| FixError::UnknownDeclaration {
            name: format!("{bridge_id}::{method}"),
        })?;
    let mut sig: MethodSig = bridge.own_methods.remove(position);
    sig.owner = target.clone();

    let set = registry
        .set_mut(&target)
        .ok_or_else(|| FixError::UnknownDeclaration {
            name: target.as_str().to_string(),
        })?;
    set.methods.push(sig);
    Ok(())
}

fn rewrite_return(
    registry: &mut DeclRegistry,
    set_id: &str,
    method: &str,
    rewrite: impl FnOnce(ReturnKind) -> ReturnKind,
) -> Result<(), FixError> {
    let set = registry
        .set_mut(&SetId::new(set_id))
        .ok_or_else(|| FixError::UnknownDeclaration {
            name: set_id.to_string(),
        })?;
    let sig = set
        .methods
        .iter_mut()
        .find(|m| m.name == method)
        .ok_or_else(|| FixError::UnknownDeclaration {
            name: format!("{set_id}::{method}"),
        })?;
    sig.returns = rewrite(sig.returns.clone());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BridgeDecl, MethodSetDecl, TypeRef};
    use crate::compiler::validate::validate_contract;

    fn registry_with_bridge_method() -> DeclRegistry {
        let mut registry = DeclRegistry::new();
        registry.register_set(MethodSetDecl::new("Events"));
        registry.register_set(MethodSetDecl::new("Ops"));
        registry.register_bridge(
            BridgeDecl::new("ChatBridge", "chat")
                .with_push_set("Events")
                .with_invoke_set("Ops")
                .with_own_method(MethodSig::new("Stray", "ChatBridge")),
        );
        registry
    }

    #[test]
    fn test_move_to_push_set_revalidates_clean() {
        let registry = registry_with_bridge_method();
        let outcome = validate_contract(&registry, &registry.bridges()[0]);
        let diagnostic = outcome.violations()[0].clone();

        let fixed = apply_fix(&registry, &diagnostic, FixKey::MoveToPushSet).unwrap();
        assert!(fixed.bridges()[0].own_methods.is_empty());
        assert_eq!(fixed.set(&SetId::new("Events")).unwrap().methods.len(), 1);

        let reoutcome = validate_contract(&fixed, &fixed.bridges()[0]);
        assert!(reoutcome.contract.is_some());
    }

    #[test]
    fn test_fix_must_be_offered() {
        let registry = registry_with_bridge_method();
        let outcome = validate_contract(&registry, &registry.bridges()[0]);
        let diagnostic = outcome.violations()[0].clone();

        let err = apply_fix(&registry, &diagnostic, FixKey::DropPayload).unwrap_err();
        assert_eq!(
            err,
            FixError::FixNotOffered {
                key: FixKey::DropPayload
            }
        );
    }

    #[test]
    fn test_wrap_value_async_infers_payload() {
        let mut registry = DeclRegistry::new();
        registry.register_set(
            MethodSetDecl::new("Ops").with_method(
                MethodSig::new("Fetch", "Ops")
                    .returning(ReturnKind::Sync(Some(TypeRef::new("String")))),
            ),
        );
        registry.register_bridge(BridgeDecl::new("B", "b").with_invoke_set("Ops"));

        let outcome = validate_contract(&registry, &registry.bridges()[0]);
        let diagnostic = outcome.violations()[0].clone();
        let (fixed, failures) =
            apply_batch(&registry, &[(diagnostic, FixKey::WrapValueAsync)]);

        assert!(failures.is_empty());
        let sig = &fixed.set(&SetId::new("Ops")).unwrap().methods[0];
        assert_eq!(sig.returns, ReturnKind::ValueAsync(TypeRef::new("String")));
    }
}
