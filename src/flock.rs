/*
 * Flock Registry Module
 *
 * A flock is a named group of agents sharing one FlockConfig. The registry
 * owns every flock's configuration and its member list; agents refer back to
 * their flock by FlockId, never by pointer. Flocks are created during
 * initialization and never removed, and member lists only grow.
 */

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{FlockError, Result};
use crate::params::FlockConfig;

/// Index of a flock in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlockId(pub usize);

impl fmt::Display for FlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Flock {
    id: FlockId,
    config: FlockConfig,
    // Agent indices in insertion order
    members: Vec<usize>,
}

impl Flock {
    pub fn id(&self) -> FlockId {
        self.id
    }

    pub fn config(&self) -> &FlockConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn members(&self) -> &[usize] {
        &self.members
    }

    /// Live member count. Always derived from the member list.
    pub fn num_boids(&self) -> usize {
        self.members.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FlockRegistry {
    flocks: Vec<Flock>,
}

impl FlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `config` and register a new, empty flock.
    pub fn create_flock(&mut self, config: FlockConfig) -> Result<FlockId> {
        config.validate()?;
        let id = FlockId(self.flocks.len());
        self.flocks.push(Flock {
            id,
            config,
            members: Vec::new(),
        });
        Ok(id)
    }

    pub fn add_member(&mut self, flock: FlockId, agent: usize) -> Result<()> {
        self.flock_mut(flock)?.members.push(agent);
        Ok(())
    }

    // Register a contiguous run of freshly spawned agents in one go
    pub fn add_members(&mut self, flock: FlockId, agents: std::ops::Range<usize>) -> Result<()> {
        self.flock_mut(flock)?.members.extend(agents);
        Ok(())
    }

    pub fn members(&self, flock: FlockId) -> Result<&[usize]> {
        Ok(self.get(flock)?.members())
    }

    pub fn get(&self, flock: FlockId) -> Result<&Flock> {
        self.flocks.get(flock.0).ok_or(FlockError::UnknownFlock(flock))
    }

    pub fn config(&self, flock: FlockId) -> Result<&FlockConfig> {
        Ok(self.get(flock)?.config())
    }

    /// Replace a flock's configuration between ticks.
    pub fn update_config(&mut self, flock: FlockId, config: FlockConfig) -> Result<()> {
        config.validate()?;
        self.flock_mut(flock)?.config = config;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.flocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Flock> {
        self.flocks.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = FlockId> + '_ {
        self.flocks.iter().map(Flock::id)
    }

    fn flock_mut(&mut self, flock: FlockId) -> Result<&mut Flock> {
        self.flocks.get_mut(flock.0).ok_or(FlockError::UnknownFlock(flock))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn members_keep_insertion_order() {
        let mut registry = FlockRegistry::new();
        let flock = registry.create_flock(FlockConfig::named("sparrows")).unwrap();

        registry.add_member(flock, 4).unwrap();
        registry.add_member(flock, 1).unwrap();
        registry.add_members(flock, 7..10).unwrap();

        assert_eq!(registry.members(flock).unwrap(), &[4, 1, 7, 8, 9]);
        assert_eq!(registry.get(flock).unwrap().num_boids(), 5);
    }

    #[test]
    fn unknown_flock_is_reported() {
        let mut registry = FlockRegistry::new();
        let missing = FlockId(3);
        assert!(matches!(
            registry.add_member(missing, 0),
            Err(FlockError::UnknownFlock(id)) if id == missing
        ));
        assert!(registry.members(missing).is_err());
    }

    #[test]
    fn invalid_config_does_not_register() {
        let mut registry = FlockRegistry::new();
        let config = FlockConfig {
            visibility: -1.0,
            ..FlockConfig::default()
        };
        assert!(registry.create_flock(config).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn update_config_validates() {
        let mut registry = FlockRegistry::new();
        let flock = registry.create_flock(FlockConfig::default()).unwrap();
        let bad = FlockConfig {
            weight_separation: -2.0,
            ..FlockConfig::default()
        };
        assert!(registry.update_config(flock, bad).is_err());
        assert_eq!(registry.config(flock).unwrap().weight_separation, 1.0);
    }
}
