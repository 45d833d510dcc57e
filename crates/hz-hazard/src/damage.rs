//! Ambient ship-damage sources: destroyed reactors leak radiation, damaged
//! engines burn.
//!
//! Ship modules are described by free-form ids in the content data
//! (`"reactor_core_mk2"`, `"ion_engine_port"`).  [`ModuleKind::classify`]
//! resolves an id once, when the module description is loaded; the per-tick
//! slice builder only ever matches on the enum.

use hz_core::{EntityId, Vec3};

/// Module categories that can emit ambient hazards.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModuleKind {
    Reactor,
    Engine,
    #[default]
    Other,
}

impl ModuleKind {
    /// Resolve a module description id.  Case-insensitive; call at data-load
    /// time, never per tick.
    pub fn classify(module_id: &str) -> Self {
        let id = module_id.to_ascii_lowercase();
        if id.contains("reactor") {
            ModuleKind::Reactor
        } else if id.contains("engine") || id.contains("thruster") {
            ModuleKind::Engine
        } else {
            ModuleKind::Other
        }
    }
}

/// A ship module whose state may make the space around it dangerous.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageSource {
    /// The ship (or wreck) carrying the module.
    pub entity:    EntityId,
    pub module:    ModuleKind,
    pub position:  Vec3,
    pub destroyed: bool,
    pub damaged:   bool,
    pub team_mask: u32,
}

/// The ambient hazard a damage source currently emits, if any.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum AmbientHazard {
    RadiationLeak,
    Fire,
}

impl DamageSource {
    /// Destroyed reactor → radiation leak; damaged or destroyed engine →
    /// fire; everything else is inert.
    pub fn ambient_hazard(&self) -> Option<AmbientHazard> {
        match self.module {
            ModuleKind::Reactor if self.destroyed => Some(AmbientHazard::RadiationLeak),
            ModuleKind::Engine if self.destroyed || self.damaged => Some(AmbientHazard::Fire),
            _ => None,
        }
    }
}
