//! Trader purchases of batched ammo.
//!
//! The host sizes a bought ammo stack by its own rules. When every buy
//! action of a request goes to an ammo batching trader, each new ammo item
//! of the response is resized to the batched quantity and split into
//! batch-sized stacks placed in the stash. If the stash cannot hold the
//! extra stacks the split is undone and one combined stack is kept. Ammo
//! bought straight into a magazine or chamber is clamped to its capacity.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::{info, warn};

use super::member;
use crate::context::{AssortOverride, AssortOverrides, Context};
use crate::db::{Database, Item, Templates, Trader, Upd};
use crate::host::Session;
use crate::ids;
use crate::inventory;
use crate::managers::traders::ammo_batch_size;
use crate::reference::is_ammo_batch_trader;

const RAGFAIR: &str = "ragfair";
const BUY_FROM_TRADER: &str = "buy_from_trader";
const TRADING_CONFIRM: &str = "TradingConfirm";

/// Nesting bound of the member search
const MAX_SEARCH_DEPTH: usize = 24;

const ACTION_KEYS: &[&str] = &["Action", "ActionType", "type"];
const TYPE_KEYS: &[&str] = &["type"];
const TRADER_KEYS: &[&str] = &["tid", "traderId"];
const ITEM_ID_KEYS: &[&str] = &["item_id", "itemId"];
const TEMPLATE_KEYS: &[&str] = &["item_template_id", "itemTemplateId", "tpl", "templateId"];
const COUNT_KEYS: &[&str] = &["count"];
const SCHEME_ID_KEYS: &[&str] = &["scheme_id", "schemeId"];
const SCHEME_ITEMS_KEYS: &[&str] = &["scheme_items", "schemeItems"];

/// Units of one template asked for across the buy actions of a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TradeCount {
    pub requested: i64,
    /// What the listings still allow; 0 when unknown
    pub max_allowed: i64,
}

impl TradeCount {
    /// Requested units, capped by the allowance when one is known
    pub fn effective(self) -> i64 {
        if self.requested <= 0 {
            return 0;
        }
        if self.max_allowed <= 0 {
            return self.requested;
        }
        self.requested.min(self.max_allowed)
    }
}

/// `/client/game/profile/items/moving`: batch the ammo of a trader purchase.
///
/// Returns the host's response unchanged unless some ammo stack was
/// rewritten. The live profile is updated in step with the response.
pub fn items_moving(
    request: &Value,
    output: String,
    session: &mut Session<'_>,
    db: &mut Database,
    ctx: &mut Context,
) -> String {
    if output.trim().is_empty() {
        return output;
    }
    let verbose = ctx.debug.print_ammo_batch_debug;

    let actions = buy_actions(request);
    if verbose {
        info!(actions = actions.len(), "ammo batch request parsed");
    }
    if !actions.first().is_some_and(|action| !action.is_ragfair()) {
        if verbose {
            info!("ammo batch skipped, request is not a trader purchase");
        }
        return output;
    }
    let allowed = batching_allowed(&actions, db);
    if verbose {
        info!(allowed, "ammo batch trader check");
    }
    if !allowed {
        return output;
    }

    let Ok(mut body) = serde_json::from_str::<Value>(&output) else {
        return output;
    };
    let Some(profile) = session.profile_mut() else {
        return output;
    };

    let trades = trade_counts(&actions, db, &ctx.assort_overrides);
    let templates = &db.templates;
    let entries = new_item_entries(&body);
    let output_counts = output_ammo_counts(&body, &entries, templates);
    if verbose {
        info!(entries = entries.len(), ammo_types = output_counts.len(), trade_types = trades.len(), "ammo batch output scanned");
    }

    let stash_id = profile.stash_id().map(str::to_string);
    let mut changed = false;
    let mut misses = 0;

    for (array_pointer, index) in entries {
        let item_pointer = format!("{array_pointer}/{index}");
        let Some(node) = body.pointer(&item_pointer) else {
            continue;
        };
        let Some(tpl) = node_template(node) else {
            continue;
        };
        if !inventory::is_ammo(templates, &tpl) || inventory::is_ammo_box(templates, &tpl) {
            continue;
        }

        let stack = ammo_batch_size(templates, &tpl);
        let current = node_stack_count(node).filter(|c| *c > 0).unwrap_or(1);
        let key = tpl.to_ascii_lowercase();
        let trade = match (trades.get(&key), output_counts.get(&key)) {
            (Some(trade), Some(seen)) if *seen <= 1 => trade.effective(),
            _ => 0,
        };
        let desired = if trade > 0 {
            current.max(trade * stack)
        } else if current < stack {
            current * stack
        } else {
            current
        };
        if desired == current && desired <= stack {
            continue;
        }

        let Some(item_id) = node
            .get("_id")
            .and_then(Value::as_str)
            .filter(|id| !id.trim().is_empty())
            .map(str::to_string)
        else {
            continue;
        };
        let items = &mut profile.inventory.items;
        let Some(position) = items.iter().position(|i| i.id.eq_ignore_ascii_case(&item_id)) else {
            misses += 1;
            continue;
        };

        let in_stash = stash_id.as_deref().is_some_and(|stash| items[position].parent_is(stash));
        if !in_stash {
            let capacity = container_capacity(items[position].parent_id.as_deref(), items, templates);
            if capacity > 0 && current > capacity {
                set_node_stack_count(&mut body, &item_pointer, capacity);
                items[position].set_stack_count(capacity);
                changed = true;
            }
            continue;
        }

        if desired <= stack {
            set_node_stack_count(&mut body, &item_pointer, desired);
            items[position].set_stack_count(desired);
            changed = true;
            continue;
        }

        let stacks = inventory::split_stacks(desired, stack);
        set_node_stack_count(&mut body, &item_pointer, stacks[0]);
        items[position].set_stack_count(stacks[0]);

        let original = items[position].clone();
        let Some(template_node) = body.pointer(&item_pointer).cloned() else {
            continue;
        };
        let mut extra_items = Vec::with_capacity(stacks.len() - 1);
        let mut extra_nodes = Vec::with_capacity(stacks.len() - 1);
        for &count in &stacks[1..] {
            let id = ids::generate(&mut ctx.rng);
            let mut item = Item::new(id.clone(), original.tpl.clone()).with_stack(count);
            item.parent_id = original.parent_id.clone();
            item.slot_id = original.slot_id.clone();
            extra_nodes.push(clone_node(&template_node, &id, count));
            extra_items.push(item);
        }
        let extra_ids: HashSet<String> = extra_items.iter().map(|i| i.id.clone()).collect();

        let Some(array_len) = body.pointer(&array_pointer).and_then(Value::as_array).map(Vec::len) else {
            continue;
        };
        if let Some(array) = body.pointer_mut(&array_pointer).and_then(Value::as_array_mut) {
            array.extend(extra_nodes);
        }
        profile.inventory.items.extend(extra_items);
        inventory::fill_locations(profile, templates);

        let placed: Vec<Option<Value>> = profile
            .inventory
            .items
            .iter()
            .filter(|i| extra_ids.contains(&i.id))
            .map(|i| i.location.as_ref().and_then(|l| serde_json::to_value(l).ok()))
            .collect();

        if placed.iter().any(Option::is_none) {
            profile.inventory.items.retain(|i| !extra_ids.contains(&i.id));
            if let Some(array) = body.pointer_mut(&array_pointer).and_then(Value::as_array_mut) {
                array.truncate(array_len);
            }
            set_node_stack_count(&mut body, &item_pointer, desired);
            if let Some(item) = profile.inventory.find_mut(&item_id) {
                item.set_stack_count(desired);
            }
            warn!(item = %item_id, count = desired, "not enough stash space to split ammo stack, leaving combined stack");
            changed = true;
            continue;
        }

        if let Some(array) = body.pointer_mut(&array_pointer).and_then(Value::as_array_mut) {
            for (node, location) in array[array_len..].iter_mut().zip(placed) {
                if let (Some(object), Some(location)) = (node.as_object_mut(), location) {
                    object.insert("location".to_string(), location);
                }
            }
        }
        changed = true;
    }

    if verbose {
        info!(changed, profile_item_misses = misses, "ammo batch done");
    }
    if !changed {
        return output;
    }
    serde_json::to_string(&body).unwrap_or(output)
}

// Internal helper functions

/// A buy action of an item event request
#[derive(Debug, Default)]
struct BuyAction<'a> {
    trader_id: Option<String>,
    item_id: Option<String>,
    template_id: Option<String>,
    count: i64,
    scheme_id: i64,
    scheme_items: Option<&'a Value>,
}

impl BuyAction<'_> {
    fn is_ragfair(&self) -> bool {
        self.trader_id.as_deref().is_some_and(|t| t.eq_ignore_ascii_case(RAGFAIR))
    }
}

fn buy_actions(request: &Value) -> Vec<BuyAction<'_>> {
    let Some(data) = member(request, "data").and_then(Value::as_array) else {
        return Vec::new();
    };
    data.iter()
        .filter(|action| action.is_object())
        .filter(|action| {
            is_buy_from_trader(
                string_member(action, ACTION_KEYS).as_deref(),
                string_member(action, TYPE_KEYS).as_deref(),
            )
        })
        .map(|action| BuyAction {
            trader_id: owner_trader(action).or_else(|| string_member(action, TRADER_KEYS)),
            item_id: string_member(action, ITEM_ID_KEYS),
            template_id: string_member(action, TEMPLATE_KEYS),
            count: int_member(action, COUNT_KEYS).unwrap_or(0),
            scheme_id: int_member(action, SCHEME_ID_KEYS).unwrap_or(0).max(0),
            scheme_items: SCHEME_ITEMS_KEYS.iter().find_map(|key| member(action, key)),
        })
        .collect()
}

fn is_buy_from_trader(action: Option<&str>, kind: Option<&str>) -> bool {
    let is = |value: Option<&str>, name: &str| value.is_some_and(|v| v.eq_ignore_ascii_case(name));
    is(action, BUY_FROM_TRADER) || is(kind, BUY_FROM_TRADER) || (is(action, TRADING_CONFIRM) && kind.is_none())
}

/// Trader id of a `ToOwner`/`FromOwner` block of type Trader
fn owner_trader(action: &Value) -> Option<String> {
    ["ToOwner", "FromOwner"].iter().find_map(|key| {
        let owner = member(action, key)?;
        let kind = string_member(owner, &["Type"])?;
        if !kind.eq_ignore_ascii_case("Trader") {
            return None;
        }
        string_member(owner, &["Id"])
    })
}

/// Batching applies when every resolvable buy goes to a batching trader
fn batching_allowed(actions: &[BuyAction<'_>], db: &Database) -> bool {
    let mut allowed = false;
    for action in actions {
        let trader_id = action.trader_id.clone().or_else(|| {
            action
                .item_id
                .as_deref()
                .filter(|id| ids::is_valid(id))
                .and_then(|id| find_listing(db, id))
                .map(|(trader, _)| trader)
        });
        let Some(trader_id) = trader_id else {
            continue;
        };
        if trader_id.eq_ignore_ascii_case(RAGFAIR) || !is_ammo_batch_trader(&trader_id) {
            return false;
        }
        allowed = true;
    }
    allowed
}

/// Trader key and index of the assort item with this id, across every trader
fn find_listing(db: &Database, item_id: &str) -> Option<(String, usize)> {
    db.traders.iter().find_map(|(key, trader)| {
        trader
            .assort
            .as_ref()?
            .items
            .iter()
            .position(|i| i.id.eq_ignore_ascii_case(item_id))
            .map(|index| (key.clone(), index))
    })
}

/// Requested units per template (lowercased).
///
/// Listings resolved along the way get their assort override re-applied.
fn trade_counts(
    actions: &[BuyAction<'_>],
    db: &mut Database,
    overrides: &AssortOverrides,
) -> HashMap<String, TradeCount> {
    let mut result: HashMap<String, TradeCount> = HashMap::new();

    for action in actions {
        let Some(item_id) = action.item_id.as_deref().filter(|id| !id.trim().is_empty()) else {
            continue;
        };
        if action.is_ragfair() {
            continue;
        }

        let count = action.count;
        let mut requested = count;
        let mut max_allowed = count;

        let mut tpl = action
            .template_id
            .as_deref()
            .unwrap_or(item_id)
            .to_string();
        let mut tpl_known = ids::is_valid(&tpl) && db.templates.item(&tpl).is_some();

        let mut listing = action.trader_id.as_deref().and_then(|trader_id| {
            let (key, trader) = db.traders.iter().find(|(key, _)| key.eq_ignore_ascii_case(trader_id))?;
            let items = &trader.assort.as_ref()?.items;
            let by_id = ids::is_valid(item_id)
                .then(|| items.iter().position(|i| i.id.eq_ignore_ascii_case(item_id)))
                .flatten();
            let index = by_id.or_else(|| {
                tpl_known
                    .then(|| {
                        items
                            .iter()
                            .position(|i| i.parent_is("hideout") && i.tpl.eq_ignore_ascii_case(&tpl))
                    })
                    .flatten()
            })?;
            Some((key.clone(), index))
        });
        if listing.is_none() && ids::is_valid(item_id) {
            listing = find_listing(db, item_id);
        }

        if let Some((trader_key, index)) = listing {
            if let Some(trader) = db.traders.get_mut(&trader_key) {
                let item = &mut trader.assort_mut().items[index];
                tpl.clone_from(&item.tpl);
                tpl_known = true;
                max_allowed = remaining_allowance(item, count);
                if let Some(limit) = overrides.get(&trader_key, &tpl) {
                    apply_override(item, limit);
                }
                let assort_id = item.id.clone();
                requested = requested.max(scheme_count(action, trader, &assort_id));
            }
        }

        if requested < 1 || !tpl_known {
            continue;
        }
        let entry = result.entry(tpl.to_ascii_lowercase()).or_default();
        entry.requested += requested;
        entry.max_allowed += max_allowed;
    }

    result
}

/// Units a listing still sells: the remaining buy restriction of unlimited
/// stock, else the stock itself, else the requested count
fn remaining_allowance(item: &Item, requested: i64) -> i64 {
    let upd = item.upd.as_ref();
    if upd.and_then(|u| u.unlimited_count) == Some(true) {
        let max = upd.and_then(|u| u.buy_restriction_max).unwrap_or(0);
        if max > 0 {
            let current = upd.and_then(|u| u.buy_restriction_current).unwrap_or(0);
            return (max - current).max(0);
        }
        return requested;
    }
    match item.stack_count() {
        Some(stack) if stack > 0 => stack,
        _ => requested,
    }
}

fn apply_override(item: &mut Item, limit: AssortOverride) {
    let upd = item.upd.get_or_insert_with(Upd::default);
    upd.stack_objects_count = Some(limit.stack_count);
    upd.unlimited_count = Some(true);
    upd.buy_restriction_max = Some(limit.buy_restriction);
    if upd.buy_restriction_current.unwrap_or(0) > limit.buy_restriction {
        upd.buy_restriction_current = Some(limit.buy_restriction);
    }
}

/// Stacks bought according to the money paid: total paid over the price of one stack
fn scheme_count(action: &BuyAction<'_>, trader: &Trader, assort_id: &str) -> i64 {
    let Some(scheme_items) = action.scheme_items else {
        return 0;
    };
    let paid: i64 = object_entries(scheme_items)
        .into_iter()
        .filter_map(|entry| int_member(entry, COUNT_KEYS))
        .filter(|count| *count > 0)
        .sum();
    if paid < 1 {
        return 0;
    }

    let Some(schemes) = trader.assort.as_ref().and_then(|assort| {
        assort
            .barter_scheme
            .iter()
            .find(|(id, _)| id.eq_ignore_ascii_case(assort_id))
            .map(|(_, schemes)| schemes)
    }) else {
        return 0;
    };
    let index = usize::try_from(action.scheme_id)
        .ok()
        .filter(|i| *i < schemes.len())
        .unwrap_or(0);
    let Some(scheme) = schemes.get(index).filter(|s| !s.is_empty()) else {
        return 0;
    };
    if !scheme.iter().all(|line| inventory::is_money(&line.tpl)) {
        return 0;
    }
    let price: i64 = scheme
        .iter()
        .map(|line| line.count.round() as i64)
        .filter(|count| *count > 0)
        .sum();
    if price < 1 {
        return 0;
    }
    (paid / price).max(1)
}

/// Object entries of an array, or the object children of a map, or the map itself
fn object_entries(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(entries) => entries.iter().filter(|e| e.is_object()).collect(),
        Value::Object(map) => {
            let children: Vec<&Value> = map.values().filter(|v| v.is_object()).collect();
            if children.is_empty() {
                vec![value]
            } else {
                children
            }
        }
        _ => Vec::new(),
    }
}

/// Depth-first, case-insensitive lookup: own members first, then children in order
fn find_deep<'v>(value: &'v Value, key: &str, depth: usize) -> Option<&'v Value> {
    if depth > MAX_SEARCH_DEPTH {
        return None;
    }
    match value {
        Value::Object(map) => {
            member(value, key).or_else(|| map.values().find_map(|child| find_deep(child, key, depth + 1)))
        }
        Value::Array(entries) => entries.iter().find_map(|child| find_deep(child, key, depth + 1)),
        _ => None,
    }
}

fn string_member(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        let text = match find_deep(value, key, 0)? {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        (!text.trim().is_empty()).then_some(text)
    })
}

fn int_member(value: &Value, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|key| int_value(find_deep(value, key, 0)?))
}

/// Integers, truncated floats, or integer text
fn int_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// (array pointer, index) of every object in an `items.new` array
fn new_item_entries(body: &Value) -> Vec<(String, usize)> {
    let mut arrays = Vec::new();
    collect_new_arrays(body, String::new(), &mut arrays);

    let mut entries = Vec::new();
    for pointer in arrays {
        if let Some(array) = body.pointer(&pointer).and_then(Value::as_array) {
            for (index, node) in array.iter().enumerate() {
                if node.is_object() {
                    entries.push((pointer.clone(), index));
                }
            }
        }
    }
    entries
}

fn collect_new_arrays(value: &Value, pointer: String, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let child_pointer = format!("{pointer}/{}", key.replace('~', "~0").replace('/', "~1"));
                if key.eq_ignore_ascii_case("items") && child.get("new").is_some_and(Value::is_array) {
                    out.push(format!("{child_pointer}/new"));
                }
                collect_new_arrays(child, child_pointer, out);
            }
        }
        Value::Array(entries) => {
            for (index, child) in entries.iter().enumerate() {
                collect_new_arrays(child, format!("{pointer}/{index}"), out);
            }
        }
        _ => {}
    }
}

/// How many new items of each ammo template (lowercased) the response holds
fn output_ammo_counts(body: &Value, entries: &[(String, usize)], templates: &Templates) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for (pointer, index) in entries {
        let Some(tpl) = body.pointer(&format!("{pointer}/{index}")).and_then(node_template) else {
            continue;
        };
        if inventory::is_ammo(templates, &tpl) && !inventory::is_ammo_box(templates, &tpl) {
            *counts.entry(tpl.to_ascii_lowercase()).or_insert(0) += 1;
        }
    }
    counts
}

fn node_template(node: &Value) -> Option<String> {
    ["_tpl", "tpl", "Template"]
        .iter()
        .find_map(|key| node.get(*key).and_then(Value::as_str))
        .filter(|tpl| !tpl.trim().is_empty())
        .map(str::to_string)
}

fn node_stack_count(node: &Value) -> Option<i64> {
    match node.get("upd") {
        Some(upd) if upd.is_object() => upd.get("StackObjectsCount").and_then(int_value).or(Some(1)),
        _ => Some(1),
    }
}

fn set_node_stack_count(body: &mut Value, pointer: &str, count: i64) {
    if let Some(node) = body.pointer_mut(pointer).and_then(Value::as_object_mut) {
        set_stack_in(node, count);
    }
}

fn set_stack_in(node: &mut serde_json::Map<String, Value>, count: i64) {
    let upd = node
        .entry("upd")
        .and_modify(|upd| {
            if !upd.is_object() {
                *upd = Value::Object(Default::default());
            }
        })
        .or_insert_with(|| Value::Object(Default::default()));
    if let Some(upd) = upd.as_object_mut() {
        upd.insert("StackObjectsCount".to_string(), Value::from(count));
    }
}

/// Copy of a response item with a new id and stack, without a location
fn clone_node(node: &Value, id: &str, count: i64) -> Value {
    let mut clone = node.clone();
    if let Some(object) = clone.as_object_mut() {
        object.insert("_id".to_string(), Value::from(id));
        object.remove("location");
        set_stack_in(object, count);
    }
    clone
}

/// Rounds a magazine or chamber holds; 0 for anything else
fn container_capacity(parent_id: Option<&str>, items: &[Item], templates: &Templates) -> i64 {
    let Some(parent) = parent_id.and_then(|id| items.iter().find(|i| i.id.eq_ignore_ascii_case(id))) else {
        return 0;
    };
    let Some(template) = templates.item(&parent.tpl) else {
        return 0;
    };
    let capacity = |slots: Option<&Vec<crate::db::template::Slot>>| {
        slots
            .into_iter()
            .flatten()
            .filter_map(|slot| slot.max_count)
            .map(|max| max.round() as i64)
            .find(|max| *max > 0)
            .unwrap_or(0)
    };
    match capacity(template.props.cartridges.as_ref()) {
        0 => capacity(template.props.chambers.as_ref()),
        cartridges => cartridges,
    }
}
