//! Raid end and ragfair enter.

use serde_json::Value;

use crate::context::Context;
use crate::db::Database;
use crate::host::Session;
use crate::managers::Managers;

/// `/client/match/local/end`: apply the raid outcome, response unchanged
pub fn raid_end(
    request: &Value,
    output: String,
    session: &mut Session<'_>,
    managers: &Managers,
    db: &Database,
    ctx: &mut Context,
) -> String {
    managers.death.handle_raid_end(request, session, managers, db, ctx);
    output
}

/// `/client/ragfair/find`: optional preset dump, response unchanged
pub fn ragfair_find(output: String, session: &mut Session<'_>, managers: &Managers, ctx: &Context) -> String {
    managers.death.handle_ragfair_find(session, ctx);
    output
}
