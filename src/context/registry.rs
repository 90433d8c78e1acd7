//! Table of global-system creators keyed by [`GlobalLinSysKind`].
//!
//! The registry is an ordinary value: the application builds one (usually with
//! [`LinSysRegistry::with_defaults`]), may register its own creators, and passes it to
//! wherever systems are created.

use crate::config::GlobalLinSysKind;
use crate::error::LinSysError;
use crate::linsys::{
    DirectFull, DirectStaticCond, GlobalLinSysHandle, IterativeSystem, LinSysSetup,
};
use log::debug;
use rustc_hash::FxHashMap;
use std::fmt;

pub type LinSysCreator = fn(LinSysSetup) -> Result<GlobalLinSysHandle, LinSysError>;

#[derive(Clone, Default)]
pub struct LinSysRegistry {
    creators: FxHashMap<GlobalLinSysKind, LinSysCreator>,
}

impl LinSysRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the four built-in variants.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(GlobalLinSysKind::DirectFull, DirectFull::create);
        registry.register(GlobalLinSysKind::DirectStaticCond, DirectStaticCond::create);
        registry.register(GlobalLinSysKind::IterativeFull, IterativeSystem::create);
        registry.register(GlobalLinSysKind::IterativeStaticCond, IterativeSystem::create);
        registry
    }

    /// Register `creator` for `kind`, returning the creator it replaces.
    pub fn register(
        &mut self,
        kind: GlobalLinSysKind,
        creator: LinSysCreator,
    ) -> Option<LinSysCreator> {
        self.creators.insert(kind, creator)
    }

    pub fn contains(&self, kind: GlobalLinSysKind) -> bool {
        self.creators.contains_key(&kind)
    }

    /// Registered kinds, in declaration order.
    pub fn kinds(&self) -> Vec<GlobalLinSysKind> {
        let mut kinds: Vec<_> = self.creators.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Build the system selected by `setup.options.kind`.
    pub fn create(&self, setup: LinSysSetup) -> Result<GlobalLinSysHandle, LinSysError> {
        let kind = setup.options.kind;
        let creator = self.creators.get(&kind).ok_or_else(|| {
            LinSysError::Configuration(format!("no creator registered for {kind}"))
        })?;
        debug!("creating {kind} system for {}", setup.key.kind());
        creator(setup)
    }
}

impl fmt::Debug for LinSysRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinSysRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_kind() {
        let registry = LinSysRegistry::with_defaults();
        assert_eq!(registry.kinds(), GlobalLinSysKind::ALL.to_vec());
    }

    #[test]
    fn register_replaces_previous_creator() {
        let mut registry = LinSysRegistry::new();
        assert!(!registry.contains(GlobalLinSysKind::DirectFull));
        assert!(registry
            .register(GlobalLinSysKind::DirectFull, DirectFull::create)
            .is_none());
        assert!(registry
            .register(GlobalLinSysKind::DirectFull, DirectStaticCond::create)
            .is_some());
        assert_eq!(registry.kinds(), vec![GlobalLinSysKind::DirectFull]);
    }
}
