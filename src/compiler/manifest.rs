// Structural binding manifest
//
// Emitted alongside each generated client binding and consumed directly by
// the fake synthesizer. The manifest makes the binding's push/invoke surface
// explicit so fake generation is independent of how the binding was produced
// and never recovers roles from name patterns.

use serde::{Deserialize, Serialize};

use crate::ast::{ParamSpec, ReturnKind};

use super::validate::ValidatedContract;
use super::walker::FlatMethod;

/// One method on a realized binding surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    pub params: Vec<ParamSpec>,
    pub returns: ReturnKind,
}

impl MethodDescriptor {
    fn from_flat(method: &FlatMethod) -> Self {
        Self {
            name: method.sig.name.clone(),
            params: method.sig.params.clone(),
            returns: method.sig.returns.clone(),
        }
    }

    /// Payload parameters only: trailing cancellation-typed parameters are
    /// plumbing and excluded from recorded/compared argument lists.
    #[must_use]
    pub fn payload_params(&self) -> &[ParamSpec] {
        let mut end = self.params.len();
        while end > 0 && self.params[end - 1].ty.is_cancellation() {
            end -= 1;
        }
        &self.params[..end]
    }
}

/// Ordered push/invoke descriptors for one generated binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BindingManifest {
    /// Name of the generated binding type.
    pub binding: String,
    pub route: String,
    pub push: Vec<MethodDescriptor>,
    pub invoke: Vec<MethodDescriptor>,
}

impl BindingManifest {
    pub fn from_contract(contract: &ValidatedContract, binding: impl Into<String>) -> Self {
        Self {
            binding: binding.into(),
            route: contract.decl.route.clone(),
            push: contract.push.iter().map(MethodDescriptor::from_flat).collect(),
            invoke: contract
                .invoke
                .iter()
                .map(MethodDescriptor::from_flat)
                .collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
