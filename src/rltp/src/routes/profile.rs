use crate::db::Database;
use crate::host::Session;
use crate::managers::Managers;

/// `/client/profile/status`: repair the rogue-lite profile, response unchanged
pub fn profile_status(output: String, session: &mut Session<'_>, managers: &Managers, db: &Database) -> String {
    managers.profiles.handle_profile_status(session, db);
    output
}
