// Structural-signature deduplication
//
// Two methods with the same (name, ordered parameter types) are duplicates;
// return-kind differences alone do not distinguish them. The first occurrence
// in traversal order wins: own declaration beats inherited, nearer ancestor
// beats farther. Drops are informational, never an error.

use std::collections::HashMap;

use crate::ast::SetId;

use super::walker::FlatMethod;

/// Record of a dropped later duplicate, kept for informational diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedDuplicate {
    /// The signature that was dropped.
    pub dropped: FlatMethod,
    /// The set whose earlier occurrence was kept.
    pub kept_owner: SetId,
}

/// Remove methods whose structural signature already occurred earlier in the
/// list. Output preserves order of first occurrence.
pub fn dedup_signatures(methods: Vec<FlatMethod>) -> (Vec<FlatMethod>, Vec<DroppedDuplicate>) {
    let mut kept: Vec<FlatMethod> = Vec::with_capacity(methods.len());
    let mut first_owner: HashMap<String, SetId> = HashMap::new();
    let mut dropped = Vec::new();

    for method in methods {
        let key = method.sig.structural_key();
        match first_owner.get(&key) {
            Some(owner) => {
                tracing::trace!(signature = %key, kept = %owner, "duplicate signature dropped");
                dropped.push(DroppedDuplicate {
                    dropped: method,
                    kept_owner: owner.clone(),
                });
            }
            None => {
                first_owner.insert(key, method.sig.owner.clone());
                kept.push(method);
            }
        }
    }

    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{MethodSig, ReturnKind, TypeRef};
    use crate::compiler::walker::MethodRole;

    fn flat(name: &str, owner: &str, param_ty: &str) -> FlatMethod {
        FlatMethod {
            sig: MethodSig::new(name, owner).with_param("value", param_ty),
            role: MethodRole::Push,
        }
    }

    #[test]
    fn test_first_occurrence_wins() {
        let (kept, dropped) = dedup_signatures(vec![
            flat("Notify", "Derived", "String"),
            flat("Notify", "Base", "String"),
        ]);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].sig.owner, SetId::new("Derived"));
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].kept_owner, SetId::new("Derived"));
    }

    #[test]
    fn test_return_kind_does_not_distinguish() {
        let mut a = flat("Get", "A", "u64");
        a.sig.returns = ReturnKind::UnitAsync;
        let mut b = flat("Get", "B", "u64");
        b.sig.returns = ReturnKind::ValueAsync(TypeRef::new("String"));

        let (kept, dropped) = dedup_signatures(vec![a, b]);
        assert_eq!(kept.len(), 1);
        assert_eq!(dropped.len(), 1);
    }

    #[test]
    fn test_distinct_parameter_types_kept() {
        let (kept, dropped) = dedup_signatures(vec![
            flat("Notify", "A", "String"),
            flat("Notify", "B", "u64"),
        ]);

        assert_eq!(kept.len(), 2);
        assert!(dropped.is_empty());
    }
}
