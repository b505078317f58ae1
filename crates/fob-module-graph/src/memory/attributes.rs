//! Per-module attributes recorded by graph traversals.

use super::super::ModuleId;
use super::graph::ModuleGraph;
use crate::Result;

impl ModuleGraph {
    /// Module that first caused `id` to be included.
    pub fn issuer(&self, id: &ModuleId) -> Result<Option<ModuleId>> {
        let inner = self.inner.read();
        Ok(inner.mgm(id)?.issuer.clone())
    }

    pub fn set_issuer(&self, id: &ModuleId, issuer: Option<ModuleId>) -> Result<()> {
        let mut inner = self.inner.write();
        inner.mgm_mut(id)?.issuer = issuer;
        Ok(())
    }

    /// Set the issuer unless one is already recorded.
    pub fn set_issuer_if_unset(&self, id: &ModuleId, issuer: ModuleId) -> Result<bool> {
        let mut inner = self.inner.write();
        let mgm = inner.mgm_mut(id)?;
        if mgm.issuer.is_some() {
            return Ok(false);
        }
        mgm.issuer = Some(issuer);
        Ok(true)
    }

    pub fn pre_order_index(&self, id: &ModuleId) -> Result<Option<u32>> {
        let inner = self.inner.read();
        Ok(inner.mgm(id)?.pre_order_index)
    }

    pub fn set_pre_order_index_if_unset(&self, id: &ModuleId, index: u32) -> Result<bool> {
        let mut inner = self.inner.write();
        let slot = &mut inner.mgm_mut(id)?.pre_order_index;
        if slot.is_some() {
            return Ok(false);
        }
        *slot = Some(index);
        Ok(true)
    }

    pub fn post_order_index(&self, id: &ModuleId) -> Result<Option<u32>> {
        let inner = self.inner.read();
        Ok(inner.mgm(id)?.post_order_index)
    }

    pub fn set_post_order_index_if_unset(&self, id: &ModuleId, index: u32) -> Result<bool> {
        let mut inner = self.inner.write();
        let slot = &mut inner.mgm_mut(id)?.post_order_index;
        if slot.is_some() {
            return Ok(false);
        }
        *slot = Some(index);
        Ok(true)
    }

    /// Distance from the nearest entry point.
    pub fn depth(&self, id: &ModuleId) -> Result<Option<u32>> {
        let inner = self.inner.read();
        Ok(inner.mgm(id)?.depth)
    }

    /// Lower the depth; returns whether it changed.
    pub fn set_depth_if_lower(&self, id: &ModuleId, depth: u32) -> Result<bool> {
        let mut inner = self.inner.write();
        let slot = &mut inner.mgm_mut(id)?.depth;
        match *slot {
            Some(current) if current <= depth => Ok(false),
            _ => {
                *slot = Some(depth);
                Ok(true)
            }
        }
    }

    pub fn is_async(&self, id: &ModuleId) -> Result<bool> {
        let inner = self.inner.read();
        Ok(inner.mgm(id)?.is_async)
    }

    pub fn set_async(&self, id: &ModuleId) -> Result<bool> {
        let mut inner = self.inner.write();
        let mgm = inner.mgm_mut(id)?;
        let changed = !mgm.is_async;
        mgm.is_async = true;
        Ok(changed)
    }

    /// Whether every incoming connection of `id` is deferred.
    ///
    /// Async modules and modules without incoming connections are never
    /// deferred.
    pub fn is_deferred(&self, id: &ModuleId) -> Result<bool> {
        let inner = self.inner.read();
        if inner.mgm(id)?.is_async {
            return Ok(false);
        }
        let incoming = inner.incoming(id)?;
        Ok(!incoming.is_empty() && incoming.iter().all(|connection| connection.deferred))
    }

    /// Reasons why the module could not be merged.
    pub fn optimization_bailouts(&self, id: &ModuleId) -> Result<Vec<String>> {
        let inner = self.inner.read();
        Ok(inner.mgm(id)?.optimization_bailout.clone())
    }

    pub fn add_optimization_bailout(&self, id: &ModuleId, reason: impl Into<String>) -> Result<()> {
        let mut inner = self.inner.write();
        inner.mgm_mut(id)?.optimization_bailout.push(reason.into());
        Ok(())
    }
}
