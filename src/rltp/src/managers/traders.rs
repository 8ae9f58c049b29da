//! Trader assortments, prices and quest locks.
//!
//! Trader documents are listed by `traderConfigNames` and loaded from the
//! `Traders` directory during pre-load. Each enabled document is matched to a
//! trader by `traderId`; traders without a document get the top-level
//! defaults.
//!
//! Five traders sell ammo in batches: one listing is a stack of at most
//! [`AMMO_BATCH_SIZE`] rounds, priced per batch, with the buy restriction
//! counted in batches.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::ContentManager;
use crate::config::{lenient, ConfigSource, ConfigTree};
use crate::context::{AssortOverride, Context};
use crate::db::globals::HandbookPriceOverride;
use crate::db::trader::{BarterScheme, QUEST_ASSORT_STATES};
use crate::db::{Database, Item, Templates, Trader};
use crate::ids;
use crate::inventory;
use crate::reference::{
    is_ammo_batch_trader, AMMO_BATCH_SIZE, DOGTAG_BEAR, DOGTAG_USEC, HANDBOOK_OVERRIDE_PARENT, HIDEOUT, ROUBLES,
};
use crate::unlocks::UnlockRequest;

/// Resupply timestamp written by `resetTradersTimers`
pub const RESUPPLY_EPOCH: i64 = 1_631_486_713;

/// Quest id used by placeholder quest locks
pub const MOCK_QUEST_ID: &str = "123";

/// One payment line of a listing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PriceEntry {
    #[serde(rename = "templateId", deserialize_with = "lenient::string")]
    pub template_id: String,
    #[serde(deserialize_with = "lenient::opt_number")]
    pub count: Option<f64>,
}

/// A standalone item (`itemTemplateId`) or preset (`presetId`) listing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListingConfig {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub preset_id: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub item_template_id: Option<String>,
    #[serde(deserialize_with = "lenient::opt_int")]
    pub loyalty_level: Option<i64>,
    #[serde(deserialize_with = "lenient::opt_int")]
    pub count: Option<i64>,
    #[serde(deserialize_with = "lenient::vec")]
    pub price: Vec<PriceEntry>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub quest_id: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub quest_state: Option<String>,
}

impl ListingConfig {
    fn preset(&self) -> Option<&str> {
        non_blank(&self.preset_id)
    }

    fn template(&self) -> Option<&str> {
        non_blank(&self.item_template_id)
    }

    fn loyalty(&self) -> i64 {
        self.loyalty_level.unwrap_or(1)
    }
}

/// A per-trader document from the `Traders` directory
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct TraderConfig {
    #[serde(deserialize_with = "lenient::lenient")]
    pub enabled: bool,
    #[serde(deserialize_with = "lenient::string")]
    pub trader_id: String,
    #[serde(deserialize_with = "lenient::lenient")]
    pub clear_assort: bool,
    #[serde(deserialize_with = "lenient::lenient")]
    pub disable_sell: bool,
    #[serde(deserialize_with = "lenient::lenient")]
    pub disable_insurance: bool,
    #[serde(deserialize_with = "lenient::lenient")]
    pub lock_from_start: bool,
    #[serde(deserialize_with = "lenient::vec")]
    pub sellable_items: Vec<String>,
    #[serde(deserialize_with = "lenient::opt_number")]
    pub money_price_multiplier: Option<f64>,
    #[serde(deserialize_with = "lenient::vec")]
    pub items: Vec<ListingConfig>,
    #[serde(deserialize_with = "lenient::map")]
    pub categorized_items: IndexMap<String, Vec<ListingConfig>>,
}

impl TraderConfig {
    /// Top-level listings, then every category in document order
    pub fn listings(&self) -> impl Iterator<Item = &ListingConfig> {
        self.items
            .iter()
            .chain(self.categorized_items.values().flatten())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct TradersConfig {
    #[serde(deserialize_with = "lenient::lenient")]
    pub enabled: bool,
    #[serde(deserialize_with = "lenient::vec")]
    pub trader_config_names: Vec<String>,
    #[serde(deserialize_with = "lenient::lenient")]
    pub clear_assort: bool,
    #[serde(deserialize_with = "lenient::lenient")]
    pub disable_sell: bool,
    #[serde(deserialize_with = "lenient::lenient")]
    pub disable_insurance: bool,
    #[serde(deserialize_with = "lenient::lenient")]
    pub reset_traders_timers: bool,
    /// template id → handbook price
    #[serde(deserialize_with = "lenient::map")]
    pub sell_price_overrides: IndexMap<String, Value>,
}

#[derive(Debug, Default)]
pub struct TradersManager {
    config: TradersConfig,
    traders: Vec<TraderConfig>,
}

impl TradersManager {
    /// Enabled trader documents loaded during pre-load
    pub fn trader_configs(&self) -> &[TraderConfig] {
        &self.traders
    }

    fn set_trader_defaults(&self, trader: &mut Trader) {
        if self.config.clear_assort {
            clear_assort(trader);
        }
        if self.config.disable_sell {
            clear_items_buy(trader);
        }
        if self.config.disable_insurance {
            disable_insurance(trader);
        }
        if self.config.reset_traders_timers {
            trader.base.next_resupply = Some(RESUPPLY_EPOCH);
        }
        info!(trader = trader.nickname(), "trader default changes applied");
    }

    fn apply_sell_price_overrides(&self, db: &mut Database) {
        for (tpl, price) in &self.config.sell_price_overrides {
            if !ids::is_valid(tpl) {
                continue;
            }
            let Some(price) = lenient::as_int(price) else {
                continue;
            };
            db.server.item.handbook_price_override.insert(
                tpl.clone(),
                HandbookPriceOverride {
                    price: price as f64,
                    parent_id: HANDBOOK_OVERRIDE_PARENT.to_string(),
                },
            );
        }
    }
}

impl ContentManager for TradersManager {
    fn name(&self) -> &'static str {
        "Traders"
    }

    fn config_name(&self) -> &'static str {
        "TradersConfig"
    }

    fn priority(&self) -> i32 {
        3
    }

    fn load_config(&mut self, tree: &ConfigTree, _ctx: &mut Context) {
        self.config = tree.project(self.config_name());
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn pre_load(&mut self, source: &dyn ConfigSource, _ctx: &mut Context) {
        self.traders.clear();
        for name in self.config.trader_config_names.iter().map(|n| n.trim()) {
            if name.is_empty() {
                continue;
            }
            let tree = match source.load_trader(name) {
                Ok(Some(tree)) => tree,
                Ok(None) => {
                    warn!(config = name, "missing trader config");
                    continue;
                }
                Err(e) => {
                    error!(config = name, error = %e, "failed to load trader config");
                    continue;
                }
            };
            let config: TraderConfig = tree.project(name);
            if config.enabled {
                self.traders.push(config);
            }
        }
        debug!(count = self.traders.len(), "trader configs loaded");
    }

    fn post_db(&mut self, db: &mut Database, ctx: &mut Context) {
        let Database { templates, traders, .. } = db;
        let mut pass = AssortPass {
            templates,
            ctx: &mut *ctx,
            unlocks: Vec::new(),
        };

        for trader in traders.values_mut() {
            match self.traders.iter().find(|c| ids::same(&c.trader_id, trader.id())) {
                Some(config) => pass.set_trader(trader, config, self.config.reset_traders_timers),
                None => self.set_trader_defaults(trader),
            }
        }

        let unlocks = pass.unlocks;
        for request in unlocks {
            ctx.request_unlock(db, request);
        }

        self.apply_sell_price_overrides(db);
        info!("Traders changes applied");
    }
}

/// Empty every assortment table, keeping the three quest-lock buckets.
pub fn clear_assort(trader: &mut Trader) {
    let assort = trader.assort_mut();
    assort.items.clear();
    assort.barter_scheme.clear();
    assort.loyal_level_items.clear();

    if let Some(quest_assort) = trader.quest_assort.as_mut() {
        quest_assort.clear();
        for state in QUEST_ASSORT_STATES {
            quest_assort.insert(state.to_string(), IndexMap::new());
        }
    }
}

/// Stack size of a batch of ammo: the batch size capped by the template's max stack
pub fn ammo_batch_size(templates: &Templates, tpl: &str) -> i64 {
    AMMO_BATCH_SIZE
        .min(inventory::stack_max_size(templates, tpl, AMMO_BATCH_SIZE))
        .max(1)
}

/// Stack count of a listing.
///
/// Without a template the configured count is returned as is. Ammo at a
/// batching trader is sold in batches; everything else uses the configured
/// count, or 1.
pub fn resolve_stack_count(
    templates: &Templates,
    listing: &ListingConfig,
    tpl: Option<&str>,
    batching: bool,
) -> Option<i64> {
    let Some(tpl) = tpl.filter(|t| !t.trim().is_empty()) else {
        return listing.count;
    };
    if batching && inventory::is_ammo(templates, tpl) {
        return Some(ammo_batch_size(templates, tpl));
    }
    Some(listing.count.unwrap_or(1))
}

/// Buy restriction of a listing; counted in stacks for ammo.
pub fn resolve_buy_restriction(templates: &Templates, listing: &ListingConfig, tpl: Option<&str>, stack: i64) -> i64 {
    let Some(count) = listing.count else {
        return stack;
    };
    if stack > 0 && tpl.is_some_and(|t| inventory::is_ammo(templates, t)) {
        let stacks = (count as f64 / stack as f64).ceil() as i64;
        return stacks.max(1);
    }
    count.max(stack)
}

/// Payment basket of a listing.
///
/// Money prices of non-money items are scaled by `money_multiplier`; ammo
/// prices are scaled by the stack. Ammo paid in money rounds to nearest
/// (halves away from zero), everything else rounds up. Every line costs at
/// least 1; an empty basket becomes one rouble.
pub fn price_basket(
    templates: &Templates,
    listing: &ListingConfig,
    item_tpl: Option<&str>,
    stack: i64,
    money_multiplier: Option<f64>,
) -> Vec<BarterScheme> {
    let is_ammo = item_tpl.is_some_and(|t| inventory::is_ammo(templates, t));
    let item_is_money = item_tpl.is_some_and(inventory::is_money);
    let multiplier = money_multiplier.filter(|m| *m != 0.0);

    let mut basket: Vec<BarterScheme> = listing
        .price
        .iter()
        .filter(|p| ids::is_valid(&p.template_id))
        .map(|p| {
            let paid_in_money = inventory::is_money(&p.template_id);
            let mut count = p.count.unwrap_or(1.0);
            if let Some(multiplier) = multiplier {
                if paid_in_money && !item_is_money {
                    count *= multiplier;
                }
            }
            if is_ammo {
                count *= stack as f64;
            }
            let count = if is_ammo && paid_in_money {
                count.round()
            } else {
                count.ceil()
            };

            let mut line = BarterScheme::new(p.template_id.clone(), count.max(1.0));
            if ids::same(&p.template_id, DOGTAG_BEAR) {
                line.side = Some("Bear".to_string());
                line.level = Some(1);
            } else if ids::same(&p.template_id, DOGTAG_USEC) {
                line.side = Some("Usec".to_string());
                line.level = Some(1);
            }
            line
        })
        .collect();

    if basket.is_empty() {
        basket.push(BarterScheme::new(ROUBLES, 1.0));
    }
    basket
}

// Internal helper functions

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn clear_items_buy(trader: &mut Trader) {
    if let Some(items_buy) = trader.base.items_buy.as_mut() {
        items_buy.category.clear();
        items_buy.id_list.clear();
    }
}

fn disable_insurance(trader: &mut Trader) {
    if let Some(insurance) = trader.base.insurance.as_mut() {
        insurance.availability = false;
    }
}

fn set_stock(item: &mut Item, stack: i64, buy_restriction: i64) {
    let upd = item.upd.get_or_insert_with(Default::default);
    upd.stack_objects_count = Some(stack);
    upd.unlimited_count = Some(true);
    upd.buy_restriction_max = Some(buy_restriction);
    upd.buy_restriction_current = Some(0);
}

fn set_loyalty(trader: &mut Trader, root_id: &str, listing: &ListingConfig) {
    if ids::is_valid(root_id) {
        trader
            .assort_mut()
            .loyal_level_items
            .insert(root_id.to_string(), listing.loyalty());
    }
}

/// Lowercased quest state; anything unknown is "success"
fn quest_state(state: Option<&str>) -> String {
    let state = state.unwrap_or("success").to_lowercase();
    if QUEST_ASSORT_STATES.contains(&state.as_str()) {
        state
    } else {
        "success".to_string()
    }
}

/// State shared while one trader pass runs
struct AssortPass<'a> {
    templates: &'a Templates,
    ctx: &'a mut Context,
    unlocks: Vec<UnlockRequest>,
}

impl AssortPass<'_> {
    fn set_trader(&mut self, trader: &mut Trader, config: &TraderConfig, reset_timers: bool) {
        let batching = is_ammo_batch_trader(trader.id());

        if config.clear_assort {
            clear_assort(trader);
        }
        if config.disable_sell {
            clear_items_buy(trader);
        }
        if config.disable_insurance {
            disable_insurance(trader);
        }
        if config.lock_from_start {
            trader.base.unlocked_by_default = Some(false);
        }
        if reset_timers {
            trader.base.next_resupply = Some(RESUPPLY_EPOCH);
        }

        let sellable: Vec<String> = config
            .sellable_items
            .iter()
            .map(|s| s.trim())
            .filter(|s| ids::is_valid(s))
            .map(str::to_string)
            .collect();
        if !sellable.is_empty() {
            trader
                .base
                .items_buy
                .get_or_insert_with(Default::default)
                .id_list
                .extend(sellable);
        }

        let unconditional = self.ctx.debug.all_presets_unconditional;
        if unconditional {
            for preset_id in self.ctx.presets.all_preset_ids() {
                let listing = ListingConfig {
                    preset_id: Some(preset_id),
                    loyalty_level: Some(1),
                    ..Default::default()
                };
                self.add_preset(trader, config, &listing, batching);
            }
        }

        for listing in config.listings() {
            if !unconditional && listing.preset().is_some() {
                self.add_preset(trader, config, listing, batching);
            }
            if listing.template().is_some() {
                self.add_item(trader, config, listing, batching);
            }
        }

        self.apply_assort_limits(trader, config, batching);
        info!(trader = trader.nickname(), "trader changes applied");
    }

    fn add_item(&mut self, trader: &mut Trader, config: &TraderConfig, listing: &ListingConfig, batching: bool) {
        let Some(tpl) = listing.template().filter(|t| ids::is_valid(t)) else {
            return;
        };

        let root_id = ids::generate(&mut self.ctx.rng);
        let stack = resolve_stack_count(self.templates, listing, Some(tpl), batching).unwrap_or(1);
        let restriction = resolve_buy_restriction(self.templates, listing, Some(tpl), stack);

        let mut item = Item::new(root_id.clone(), tpl).with_parent(HIDEOUT, HIDEOUT);
        set_stock(&mut item, stack, restriction);
        trader.assort_mut().items.push(item);

        set_loyalty(trader, &root_id, listing);
        self.set_price(trader, config, listing, &root_id, Some(tpl), batching);
        self.set_quest_lock(trader, listing, &root_id, None);
    }

    fn add_preset(&mut self, trader: &mut Trader, config: &TraderConfig, listing: &ListingConfig, batching: bool) {
        let Some(preset_id) = listing.preset() else {
            return;
        };
        let ctx = &mut *self.ctx;
        let Some(preset) = ctx.presets.resolve(preset_id, Some(HIDEOUT), &mut ctx.rng) else {
            return;
        };
        if preset.items.is_empty() {
            return;
        }

        let root_tpl = preset.root().map(|r| r.tpl.clone());
        trader.assort_mut().items.extend(preset.items.iter().cloned());

        set_loyalty(trader, &preset.root_id, listing);
        self.set_count(trader, listing, &preset.root_id, root_tpl.as_deref(), batching);
        self.set_price(trader, config, listing, &preset.root_id, root_tpl.as_deref(), batching);
        self.set_quest_lock(trader, listing, &preset.root_id, Some(preset.items));
    }

    fn set_count(&self, trader: &mut Trader, listing: &ListingConfig, root_id: &str, tpl: Option<&str>, batching: bool) {
        if !ids::is_valid(root_id) {
            return;
        }
        let Some(stack) = resolve_stack_count(self.templates, listing, tpl, batching) else {
            return;
        };
        let restriction = resolve_buy_restriction(self.templates, listing, tpl, stack);
        if let Some(root) = trader
            .assort_mut()
            .items
            .iter_mut()
            .find(|i| ids::same(&i.id, root_id))
        {
            set_stock(root, stack, restriction);
        }
    }

    fn set_price(
        &self,
        trader: &mut Trader,
        config: &TraderConfig,
        listing: &ListingConfig,
        root_id: &str,
        tpl: Option<&str>,
        batching: bool,
    ) {
        if !ids::is_valid(root_id) {
            return;
        }

        let basket = if self.ctx.debug.minimum_prices {
            vec![BarterScheme::new(ROUBLES, 1.0)]
        } else {
            let tpl = tpl.or(listing.template());
            let stack = resolve_stack_count(self.templates, listing, tpl, batching).unwrap_or(1);
            price_basket(self.templates, listing, tpl, stack, config.money_price_multiplier)
        };

        trader
            .assort_mut()
            .barter_scheme
            .insert(root_id.to_string(), vec![basket]);
    }

    fn set_quest_lock(&mut self, trader: &mut Trader, listing: &ListingConfig, root_id: &str, preset_items: Option<Vec<Item>>) {
        if self.ctx.debug.no_questlocked_items {
            return;
        }
        let Some(quest_id) = non_blank(&listing.quest_id) else {
            return;
        };
        if self.ctx.debug.ignore_mock_questlocks && quest_id == MOCK_QUEST_ID {
            return;
        }
        let state = quest_state(listing.quest_state.as_deref());
        if !ids::is_valid(root_id) || !ids::is_valid(quest_id) {
            return;
        }

        trader
            .quest_assort
            .get_or_insert_with(IndexMap::new)
            .entry(state.clone())
            .or_default()
            .insert(root_id.to_string(), quest_id.to_string());

        let template_id = match preset_items {
            Some(_) => None,
            None => listing.item_template_id.clone(),
        };
        self.unlocks.push(UnlockRequest {
            quest_id: quest_id.to_string(),
            loyalty_level: listing.loyalty(),
            trader_id: trader.id().to_string(),
            item_id: root_id.to_string(),
            template_id,
            preset_items,
            quest_state: state,
        });
    }

    /// Re-stock ammo and medical listings and publish them as assort overrides
    fn apply_assort_limits(&mut self, trader: &mut Trader, config: &TraderConfig, batching: bool) {
        let mut overrides: IndexMap<String, AssortOverride> = IndexMap::new();
        for listing in config.listings() {
            let Some(tpl) = listing.template().filter(|t| ids::is_valid(t)) else {
                continue;
            };
            if !inventory::is_ammo(self.templates, tpl) && !inventory::is_medical(self.templates, tpl) {
                continue;
            }
            let stack = resolve_stack_count(self.templates, listing, Some(tpl), batching).unwrap_or(1);
            let restriction = resolve_buy_restriction(self.templates, listing, Some(tpl), stack);
            overrides.insert(
                tpl.to_ascii_lowercase(),
                AssortOverride {
                    stack_count: stack,
                    buy_restriction: restriction,
                },
            );
        }
        if overrides.is_empty() {
            return;
        }

        let Some(assort) = trader.assort.as_mut().filter(|a| !a.items.is_empty()) else {
            return;
        };
        for item in assort.items.iter_mut().filter(|i| i.parent_is(HIDEOUT)) {
            if let Some(limit) = overrides.get(&item.tpl.to_ascii_lowercase()) {
                set_stock(item, limit.stack_count, limit.buy_restriction);
            }
        }

        if self.ctx.debug.print_ammo_batch_debug {
            for (tpl, limit) in &overrides {
                debug!(
                    trader = trader.id(),
                    template = %tpl,
                    stack = limit.stack_count,
                    restriction = limit.buy_restriction,
                    "assort override"
                );
            }
        }
        self.ctx.assort_overrides.replace_trader(trader.id(), overrides);
    }
}
