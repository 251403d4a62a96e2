// Marker discovery registry
//
// Declarations are discovered once per compilation from declarative markers.
// Discovery is an explicit pre-pass populating this registry keyed by marker
// kind; the pipeline itself never inspects markers.

use std::collections::HashMap;

use super::decl::{BridgeDecl, MethodSetDecl, SetId};

/// A declaration carrying one of the three marker kinds.
#[derive(Debug, Clone)]
pub enum MarkedDecl {
    /// Bridge marker: required uri segment, optional display name, and the
    /// push/invoke set references.
    Bridge(BridgeDecl),
    /// Method-set marker. Referenced sets may be one-sided.
    MethodSet(MethodSetDecl),
    /// Compilation-scoped marker listing binding types to generate fakes for.
    FakeTargets(Vec<String>),
}

/// Registry of discovered declarations, populated before the pipeline runs.
#[derive(Debug, Clone, Default)]
pub struct DeclRegistry {
    bridges: Vec<BridgeDecl>,
    sets: HashMap<SetId, MethodSetDecl>,
    fake_targets: Vec<String>,
}

impl DeclRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect a marker stream into a registry.
    pub fn from_markers(markers: impl IntoIterator<Item = MarkedDecl>) -> Self {
        let mut registry = Self::new();
        for marker in markers {
            match marker {
                MarkedDecl::Bridge(bridge) => registry.register_bridge(bridge),
                MarkedDecl::MethodSet(set) => registry.register_set(set),
                MarkedDecl::FakeTargets(targets) => registry.register_fake_targets(targets),
            }
        }
        registry
    }

    pub fn register_bridge(&mut self, bridge: BridgeDecl) {
        self.bridges.push(bridge);
    }

    /// Register a method set. The first declaration of an id wins; a
    /// re-registration is dropped with a warning.
    pub fn register_set(&mut self, set: MethodSetDecl) {
        if self.sets.contains_key(&set.id) {
            tracing::warn!(set = %set.id, "duplicate method-set declaration ignored");
            return;
        }
        self.sets.insert(set.id.clone(), set);
    }

    pub fn register_fake_targets(&mut self, targets: Vec<String>) {
        self.fake_targets.extend(targets);
    }

    #[must_use]
    pub fn bridges(&self) -> &[BridgeDecl] {
        &self.bridges
    }

    #[must_use]
    pub fn set(&self, id: &SetId) -> Option<&MethodSetDecl> {
        self.sets.get(id)
    }

    #[must_use]
    pub fn set_mut(&mut self, id: &SetId) -> Option<&mut MethodSetDecl> {
        self.sets.get_mut(id)
    }

    #[must_use]
    pub fn bridge(&self, id: &str) -> Option<&BridgeDecl> {
        self.bridges.iter().find(|b| b.id == id)
    }

    #[must_use]
    pub fn bridge_mut(&mut self, id: &str) -> Option<&mut BridgeDecl> {
        self.bridges.iter_mut().find(|b| b.id == id)
    }

    #[must_use]
    pub fn fake_targets(&self) -> &[String] {
        &self.fake_targets
    }
}
