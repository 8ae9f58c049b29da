//! Deferred quest reward unlocks.
//!
//! Trader listings gated by a quest are queued here while the database is
//! being rewritten and attached to their quests once every quest exists.

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::db::quest::{QuestReward, RewardType, REWARD_FAIL, REWARD_STARTED, REWARD_SUCCESS};
use crate::db::{Database, Item};
use crate::ids;

/// "When quest Q reaches state S, unlock item I at trader T at loyalty level L."
#[derive(Debug, Clone, PartialEq)]
pub struct UnlockRequest {
    pub quest_id: String,
    pub loyalty_level: i64,
    pub trader_id: String,
    /// Assortment item id (the preset root for presets)
    pub item_id: String,
    pub template_id: Option<String>,
    /// Full item tree when the listing is a preset
    pub preset_items: Option<Vec<Item>>,
    /// Quest outcome: "started", "success" or "fail"
    pub quest_state: String,
}

#[derive(Debug, Default)]
pub struct UnlockQueue {
    ready: bool,
    pending: Vec<UnlockRequest>,
}

impl UnlockQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, request: UnlockRequest) {
        debug!(quest = %request.quest_id, item = %request.item_id, "unlock queued");
        self.pending.push(request);
    }

    /// Every quest now exists; later requests may be applied directly
    pub fn mark_ready(&mut self) {
        self.ready = true;
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take every queued request in submission order
    pub fn drain(&mut self) -> Vec<UnlockRequest> {
        std::mem::take(&mut self.pending)
    }
}

fn reward_bucket(state: &str) -> &'static str {
    match state {
        "success" => REWARD_SUCCESS,
        "started" => REWARD_STARTED,
        _ => REWARD_FAIL,
    }
}

/// Append an assortment-unlock reward to the request's quest.
///
/// Returns false when the quest or its reward bucket does not exist.
pub fn apply_unlock_reward(db: &mut Database, request: &UnlockRequest) -> bool {
    if !ids::is_valid(&request.quest_id) {
        warn!(quest = %request.quest_id, "invalid quest id in unlock request");
        return false;
    }
    let Some(quest) = db.templates.quest_mut(&request.quest_id) else {
        warn!(quest = %request.quest_id, "unlock request for unknown quest");
        return false;
    };

    let bucket = reward_bucket(&request.quest_state);
    let index = quest.next_reward_index(bucket);
    let reward_id = ids::sha24(&format!("{}reward{index}", quest.id));
    let Some(rewards) = quest.rewards.get_mut(bucket) else {
        warn!(quest = %request.quest_id, bucket, "quest has no reward list");
        return false;
    };

    let items = match &request.preset_items {
        Some(items) => items.clone(),
        None => {
            let tpl = request
                .template_id
                .clone()
                .filter(|t| ids::is_valid(t))
                .unwrap_or_default();
            vec![Item::new(request.item_id.clone(), tpl)]
        }
    };

    let mut reward = QuestReward::new(reward_id, RewardType::AssortmentUnlock, index)
        .with("availableInGameEditions", json!([]))
        .with("gameMode", json!(["regular", "pve"]))
        .with("isHidden", Value::Bool(false))
        .with("unknown", Value::Bool(false))
        .with("loyaltyLevel", json!(request.loyalty_level))
        .with("traderId", json!(request.trader_id));
    reward.target = Some(request.item_id.clone());
    reward.items = Some(items);
    rewards.push(reward);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Quest;

    const QUEST: &str = "aaaaaaaaaaaaaaaaaaaaaaaa";

    fn db_with_quest() -> Database {
        let mut db = Database::default();
        let quest: Quest = serde_json::from_value(json!({
            "_id": QUEST,
            "rewards": { "Started": [], "Success": [{ "id": "x", "type": "Item", "index": 2 }], "Fail": [] }
        }))
        .unwrap();
        db.templates.quests.insert(QUEST.to_string(), quest);
        db
    }

    fn request(state: &str) -> UnlockRequest {
        UnlockRequest {
            quest_id: QUEST.to_string(),
            loyalty_level: 2,
            trader_id: "54cb50c76803fa8b248b4571".to_string(),
            item_id: "bbbbbbbbbbbbbbbbbbbbbbbb".to_string(),
            template_id: Some("5449016a4bdc2d6f028b456f".to_string()),
            preset_items: None,
            quest_state: state.to_string(),
        }
    }

    #[test]
    fn test_queue_drains_in_order() {
        let mut queue = UnlockQueue::new();
        queue.push(request("success"));
        queue.push(request("fail"));
        assert_eq!(queue.len(), 2);
        assert!(!queue.is_ready());
        queue.mark_ready();
        let drained = queue.drain();
        assert_eq!(drained[0].quest_state, "success");
        assert_eq!(drained[1].quest_state, "fail");
        assert!(queue.is_empty());
    }

    #[test]
    fn test_apply_appends_assortment_unlock() {
        let mut db = db_with_quest();
        assert!(apply_unlock_reward(&mut db, &request("success")));

        let rewards = &db.templates.quests[QUEST].rewards[REWARD_SUCCESS];
        let reward = rewards.last().unwrap();
        assert!(reward.is(RewardType::AssortmentUnlock));
        assert_eq!(reward.index, 3);
        assert_eq!(reward.id, ids::sha24(&format!("{QUEST}reward3")));
        assert_eq!(reward.target.as_deref(), Some("bbbbbbbbbbbbbbbbbbbbbbbb"));
        assert_eq!(reward.extra["loyaltyLevel"], json!(2));
        let items = reward.items.as_ref().unwrap();
        assert_eq!(items[0].tpl, "5449016a4bdc2d6f028b456f");
    }

    #[test]
    fn test_apply_routes_by_state() {
        let mut db = db_with_quest();
        assert!(apply_unlock_reward(&mut db, &request("started")));
        assert!(apply_unlock_reward(&mut db, &request("whatever")));
        let quest = &db.templates.quests[QUEST];
        assert_eq!(quest.rewards[REWARD_STARTED].len(), 1);
        assert_eq!(quest.rewards[REWARD_FAIL].len(), 1);
    }

    #[test]
    fn test_unknown_quest_is_dropped() {
        let mut db = Database::default();
        assert!(!apply_unlock_reward(&mut db, &request("success")));
        let mut bad = request("success");
        bad.quest_id = "123".to_string();
        assert!(!apply_unlock_reward(&mut db, &bad));
    }
}
