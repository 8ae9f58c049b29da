//! Raid-end handling and the ragfair-enter preset dump.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::start::RewardSources;
use super::{ContentManager, Managers, Outcome};
use crate::config::{lenient, ConfigTree};
use crate::context::Context;
use crate::db::{Database, Item, PmcProfile};
use crate::host::Session;
use crate::inventory;
use crate::reference::GAME_VERSION_PREFIX;

/// Equipment slots whose item trees are dumped
const DUMPED_SLOTS: [&str; 3] = ["FirstPrimaryWeapon", "SecondPrimaryWeapon", "Holster"];

/// Case templates whose contents are dumped
const DUMPED_CONTAINERS: [&str; 2] = ["5b6d9ce188a4501afc1b2b25", "5c0a840b86f7742ffa4f2482"];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeathConfig {
    #[serde(deserialize_with = "lenient::lenient")]
    pub enabled: bool,
}

#[derive(Debug, Default)]
pub struct DeathManager {
    config: DeathConfig,
}

impl DeathManager {
    /// Apply the raid outcome to a rogue-lite profile, then save it.
    ///
    /// A death wipes the stash and heals the player; every outcome runs the
    /// post-raid reward fill.
    pub fn handle_raid_end(
        &self,
        request: &Value,
        session: &mut Session<'_>,
        managers: &Managers,
        db: &Database,
        ctx: &mut Context,
    ) {
        if !self.enabled() {
            return;
        }
        let Some(results) = field(request, "results").filter(|r| r.is_object()) else {
            return;
        };
        let Some(game_version) = results_game_version(results).filter(|v| is_rogue_lite(v)) else {
            return;
        };
        let outcome = Outcome::from_exit_status(results.get("result").and_then(Value::as_str));
        debug!(outcome = outcome.as_str(), "raid ended");

        let Some(profile) = session.profile_mut() else {
            return;
        };
        let Context { presets, rng, .. } = ctx;

        if outcome == Outcome::Death {
            managers.wipe.on_player_died(profile, &db.templates, &mut *rng);
            managers.healing.on_player_died(profile);
        }

        let sources = RewardSources {
            hideout: &managers.hideout,
            profiles: &managers.profiles,
            templates: &db.templates,
        };
        managers
            .start
            .on_player_extracted(profile, outcome, game_version, &sources, presets, &mut *rng);

        session.save();
    }

    /// Print the player's weapons and case contents as preset entries
    pub fn handle_ragfair_find(&self, session: &mut Session<'_>, ctx: &Context) {
        if !self.enabled() || !ctx.debug.print_presets_on_flea_enter {
            return;
        }
        let Some(profile) = session.profile_mut() else {
            return;
        };
        for line in preset_dump(profile) {
            println!("{line}");
        }
    }
}

impl ContentManager for DeathManager {
    fn name(&self) -> &'static str {
        "Death"
    }

    fn config_name(&self) -> &'static str {
        "DeathConfig"
    }

    fn load_config(&mut self, tree: &ConfigTree, _ctx: &mut Context) {
        self.config = tree.project(self.config_name());
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }
}

/// Preset-config lines for the equipped weapons and the contents of known cases
pub fn preset_dump(profile: &PmcProfile) -> Vec<String> {
    let items = &profile.inventory.items;
    let mut lines = Vec::new();

    for slot in DUMPED_SLOTS {
        if let Some(root) = items.iter().find(|i| i.slot_is(slot)) {
            lines.push(format!("\"\": {},", tree_json(items, root)));
        }
    }

    for case_tpl in DUMPED_CONTAINERS {
        let cases = items
            .iter()
            .filter(|i| i.tpl.eq_ignore_ascii_case(case_tpl) && !i.id.trim().is_empty());
        for (index, case) in cases.enumerate() {
            for root in items.iter().filter(|i| i.parent_is(&case.id)) {
                lines.push(format!("\"Container_{index}\": {},", tree_json(items, root)));
            }
        }
    }

    lines
}

// Internal helper functions

/// A key looked up as given, then with a leading capital
fn field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key).or_else(|| {
        let mut chars = key.chars();
        let capitalized: String = chars
            .next()
            .map(|c| c.to_ascii_uppercase())
            .into_iter()
            .chain(chars)
            .collect();
        value.get(capitalized)
    })
}

fn results_game_version(results: &Value) -> Option<&str> {
    let profile = field(results, "profile")?;
    let info = profile.get("Info").or_else(|| profile.get("info"))?;
    info.get("GameVersion")
        .or_else(|| info.get("gameVersion"))
        .and_then(Value::as_str)
}

fn is_rogue_lite(game_version: &str) -> bool {
    !game_version.trim().is_empty()
        && game_version
            .get(..GAME_VERSION_PREFIX.len())
            .is_some_and(|p| p.eq_ignore_ascii_case(GAME_VERSION_PREFIX))
}

/// Serialized item tree with per-instance state stripped
fn tree_json(items: &[Item], root: &Item) -> String {
    let tree: Vec<Value> = inventory::item_tree(items, root)
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let mut value = serde_json::to_value(item).ok()?;
            if let Some(object) = value.as_object_mut() {
                strip_instance_state(object, index == 0);
            }
            Some(value)
        })
        .collect();
    Value::Array(tree).to_string()
}

fn strip_instance_state(item: &mut Map<String, Value>, is_root: bool) {
    if is_root {
        remove_key(item, "location");
    }
    let Some(upd_key) = item.keys().find(|k| k.eq_ignore_ascii_case("upd")).cloned() else {
        return;
    };
    let Some(upd) = item.get_mut(&upd_key).and_then(Value::as_object_mut) else {
        return;
    };
    remove_key(upd, "Repairable");
    remove_key(upd, "SpawnedInSession");
    if is_root {
        remove_key(upd, "sptPresetId");
    }
    if upd.is_empty() {
        item.remove(&upd_key);
    }
}

fn remove_key(object: &mut Map<String, Value>, key: &str) {
    if let Some(found) = object.keys().find(|k| k.eq_ignore_ascii_case(key)).cloned() {
        object.remove(&found);
    }
}
