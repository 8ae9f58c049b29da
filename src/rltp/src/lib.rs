//! # rltp
//!
//! Rogue-lite progression for an extraction-shooter game server.
//!
//! This library provides functionality to:
//! - Rewrite the host database after it loads: trader assortments, synthetic
//!   quests, item presets, hideout crafting, bot loot, player profiles
//! - Run a permadeath loop on raid end: wipe and heal on death, then roll
//!   post-raid rewards into the stash
//! - Rewrite trader purchases so ammo is sold and stored in batches
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use rltp::{Context, Database, DebugFlags, DirConfigSource, Rltp};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::load_dir(Path::new("database"))?;
//! let source = DirConfigSource::new("config");
//!
//! let mut rltp = Rltp::new(Box::new(source), db, Context::new(DebugFlags::default(), Some(42)));
//! rltp.post_startup();
//!
//! rltp.database_mut().save_dir(Path::new("out"))?;
//! # Ok(())
//! # }
//! ```

pub mod backup;
pub mod config;
pub mod context;
pub mod db;
pub mod host;
pub mod ids;
pub mod inventory;
pub mod lifecycle;
pub mod locale;
pub mod managers;
pub mod presets;
pub mod reference;
pub mod routes;
pub mod unlocks;

// Re-export commonly used items
#[doc(inline)]
pub use config::{ConfigError, ConfigSource, ConfigTree, DirConfigSource, MemoryConfigSource};
#[doc(inline)]
pub use context::{AssortOverride, AssortOverrides, Context, DebugFlags, WeaponCatalog, WipeRules};
#[doc(inline)]
pub use db::{Database, DatabaseError, Item, PmcProfile};
#[doc(inline)]
pub use host::{FileProfileStore, MemoryProfileStore, ProfileStore, ProfileStoreError, Session};
#[doc(inline)]
pub use lifecycle::{Phase, Rltp};
#[doc(inline)]
pub use locale::LocaleOverlay;
#[doc(inline)]
pub use managers::{ContentManager, Managers, Outcome};
#[doc(inline)]
pub use presets::{PresetResolver, ResolvedPreset};
#[doc(inline)]
pub use routes::{dispatch, Exchange, Route};
#[doc(inline)]
pub use unlocks::{UnlockQueue, UnlockRequest};
