//! Content managers.
//!
//! One manager per game-data domain. Each owns a config document, loaded by
//! name before the database exists, and rewrites its part of the database
//! once the host has loaded it. Managers run in ascending [`priority`]
//! order; ties keep registration order.
//!
//! [`priority`]: ContentManager::priority

pub mod bots;
pub mod containers;
pub mod death;
pub mod globals;
pub mod healing;
pub mod hideout;
pub mod items;
pub mod locale;
pub mod presets;
pub mod profiles;
pub mod quests;
pub mod start;
pub mod traders;
pub mod weapons;
pub mod wipe;

pub use bots::BotsManager;
pub use containers::ContainersManager;
pub use death::DeathManager;
pub use globals::GlobalsManager;
pub use healing::HealingManager;
pub use hideout::HideoutManager;
pub use items::ItemsManager;
pub use locale::LocaleManager;
pub use presets::PresetsManager;
pub use profiles::ProfilesManager;
pub use quests::QuestsManager;
pub use start::StartManager;
pub use traders::TradersManager;
pub use weapons::WeaponsManager;
pub use wipe::WipeManager;

use crate::config::{ConfigSource, ConfigTree};
use crate::context::Context;
use crate::db::Database;

/// Raid outcome bucket for post-raid rewards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Survive,
    Death,
}

impl Outcome {
    /// Classify a raid-end exit status; anything but an extraction is a death
    pub fn from_exit_status(status: Option<&str>) -> Self {
        match status {
            Some(s) if ["SURVIVED", "RUNNER", "TRANSIT"].iter().any(|e| s.eq_ignore_ascii_case(e)) => Outcome::Survive,
            _ => Outcome::Death,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Survive => "survive",
            Outcome::Death => "death",
        }
    }
}

/// Lifecycle hooks of a content manager.
///
/// `load_config` always runs; the other hooks only run when the loaded
/// config has `enabled: true`.
pub trait ContentManager {
    /// Short name used in logs, e.g. "Traders"
    fn name(&self) -> &'static str;

    /// Name of the config document, e.g. "TradersConfig"
    fn config_name(&self) -> &'static str;

    fn priority(&self) -> i32 {
        1
    }

    /// Take the loaded document and publish shared views into the context
    fn load_config(&mut self, tree: &ConfigTree, ctx: &mut Context);

    fn enabled(&self) -> bool;

    fn pre_load(&mut self, _source: &dyn ConfigSource, _ctx: &mut Context) {}

    fn post_db(&mut self, _db: &mut Database, _ctx: &mut Context) {}

    fn post_startup(&mut self, _db: &mut Database, _ctx: &mut Context) {}
}

/// Every manager, in registration order.
#[derive(Debug, Default)]
pub struct Managers {
    pub globals: GlobalsManager,
    pub containers: ContainersManager,
    pub death: DeathManager,
    pub wipe: WipeManager,
    pub start: StartManager,
    pub hideout: HideoutManager,
    pub traders: TradersManager,
    pub presets: PresetsManager,
    pub quests: QuestsManager,
    pub weapons: WeaponsManager,
    pub healing: HealingManager,
    pub profiles: ProfilesManager,
    pub items: ItemsManager,
    pub locale: LocaleManager,
    pub bots: BotsManager,
}

impl Managers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Managers sorted by priority, stable over registration order
    pub fn ordered_mut(&mut self) -> Vec<&mut dyn ContentManager> {
        let mut list: Vec<&mut dyn ContentManager> = vec![
            &mut self.globals,
            &mut self.containers,
            &mut self.death,
            &mut self.wipe,
            &mut self.start,
            &mut self.hideout,
            &mut self.traders,
            &mut self.presets,
            &mut self.quests,
            &mut self.weapons,
            &mut self.healing,
            &mut self.profiles,
            &mut self.items,
            &mut self.locale,
            &mut self.bots,
        ];
        list.sort_by_key(|m| m.priority());
        list
    }
}
