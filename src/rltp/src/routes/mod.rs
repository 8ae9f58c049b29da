//! Request interceptors.
//!
//! Each intercepted route receives the decoded request, the player session
//! and the response body the host already built, and returns the body to
//! send. Handlers never fail: anything they cannot make sense of leaves the
//! response untouched.

mod items;
mod profile;
mod quests;
mod raid;

pub use items::{items_moving, TradeCount};
pub use profile::profile_status;
pub use quests::{quest_array, quest_list};
pub use raid::{raid_end, ragfair_find};

use serde_json::Value;

use crate::context::Context;
use crate::db::Database;
use crate::host::Session;
use crate::managers::Managers;

/// Intercepted host routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    RaidEnd,
    RagfairFind,
    ProfileStatus,
    QuestList,
    ItemsMoving,
}

impl Route {
    pub const ALL: [Route; 5] = [
        Route::RaidEnd,
        Route::RagfairFind,
        Route::ProfileStatus,
        Route::QuestList,
        Route::ItemsMoving,
    ];

    pub fn url(self) -> &'static str {
        match self {
            Route::RaidEnd => "/client/match/local/end",
            Route::RagfairFind => "/client/ragfair/find",
            Route::ProfileStatus => "/client/profile/status",
            Route::QuestList => "/client/quest/list",
            Route::ItemsMoving => "/client/game/profile/items/moving",
        }
    }

    /// Match a request url, ignoring any query string
    pub fn from_url(url: &str) -> Option<Self> {
        let path = url.split_once('?').map_or(url, |(path, _)| path);
        let path = path.trim_end_matches('/');
        Self::ALL.into_iter().find(|route| route.url() == path)
    }
}

/// A request together with the host's response body.
#[derive(Debug)]
pub struct Exchange<'a> {
    pub request: &'a Value,
    pub output: String,
}

/// Run the interceptor of `route` and return the response body to send
pub fn dispatch(
    route: Route,
    exchange: Exchange<'_>,
    session: &mut Session<'_>,
    managers: &Managers,
    db: &mut Database,
    ctx: &mut Context,
) -> String {
    let Exchange { request, output } = exchange;
    match route {
        Route::RaidEnd => raid_end(request, output, session, managers, db, ctx),
        Route::RagfairFind => ragfair_find(output, session, managers, ctx),
        Route::ProfileStatus => profile_status(output, session, managers, db),
        Route::QuestList => quest_list(output),
        Route::ItemsMoving => items_moving(request, output, session, db, ctx),
    }
}

// Internal helper functions

/// Case-insensitive member lookup, exact match first
pub(crate) fn member<'v>(value: &'v Value, key: &str) -> Option<&'v Value> {
    let map = value.as_object()?;
    map.get(key).or_else(|| {
        map.iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, child)| child)
    })
}
