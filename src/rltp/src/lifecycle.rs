//! Lifecycle orchestration.
//!
//! [`Rltp`] owns every content manager, the shared [`Context`] and the
//! database, and drives them through three phases:
//!
//! 1. [`Phase::PreLoad`]: every manager loads its config document. Enabled
//!    managers then run their pre-load hook (extra documents, shared views).
//! 2. [`Phase::PostDbLoad`]: enabled managers rewrite the database in
//!    priority order. Queued unlock rewards are flushed at the end, once
//!    every quest exists.
//! 3. [`Phase::PostStartup`]: enabled managers turn off host systems.
//!
//! Live requests go through [`Rltp::handle`] afterwards.

use std::fmt;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{self, ConfigSource};
use crate::context::Context;
use crate::db::Database;
use crate::host::{ProfileStore, Session};
use crate::managers::Managers;
use crate::routes::{self, Route};

/// Host load points, in the order they happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    PreLoad,
    PostDbLoad,
    PostStartup,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::PreLoad => "pre-load",
            Phase::PostDbLoad => "post-db-load",
            Phase::PostStartup => "post-startup",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The whole pipeline.
pub struct Rltp {
    source: Box<dyn ConfigSource>,
    managers: Managers,
    ctx: Context,
    db: Database,
    completed: Option<Phase>,
}

impl Rltp {
    /// A pipeline over a loaded database, reading manager documents from `source`
    pub fn new(source: Box<dyn ConfigSource>, db: Database, ctx: Context) -> Self {
        Rltp {
            source,
            managers: Managers::new(),
            ctx,
            db,
            completed: None,
        }
    }

    /// Last phase that ran
    pub fn phase(&self) -> Option<Phase> {
        self.completed
    }

    pub fn managers(&self) -> &Managers {
        &self.managers
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.ctx
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn database_mut(&mut self) -> &mut Database {
        &mut self.db
    }

    pub fn into_database(self) -> Database {
        self.db
    }

    /// Load every config document and run the enabled pre-load hooks
    pub fn pre_load(&mut self) {
        if !self.begin(Phase::PreLoad) {
            return;
        }
        let source = self.source.as_ref();
        for manager in self.managers.ordered_mut() {
            let started = Instant::now();
            let tree = config::load_or_empty(source, manager.config_name());
            manager.load_config(&tree, &mut self.ctx);
            if manager.enabled() {
                manager.pre_load(source, &mut self.ctx);
            }
            debug!(manager = manager.name(), enabled = manager.enabled(), elapsed = ?started.elapsed(), "pre-load done");
        }
        self.finish(Phase::PreLoad);
    }

    /// Rewrite the database, then flush queued unlock rewards
    pub fn post_db_load(&mut self) {
        self.pre_load();
        if !self.begin(Phase::PostDbLoad) {
            return;
        }
        for manager in self.managers.ordered_mut() {
            if !manager.enabled() {
                continue;
            }
            let started = Instant::now();
            manager.post_db(&mut self.db, &mut self.ctx);
            debug!(manager = manager.name(), elapsed = ?started.elapsed(), "post-db-load done");
        }
        self.ctx.unlocks.mark_ready();
        self.ctx.flush_unlocks(&mut self.db);
        self.finish(Phase::PostDbLoad);
    }

    /// Run the enabled post-startup hooks
    pub fn post_startup(&mut self) {
        self.post_db_load();
        if !self.begin(Phase::PostStartup) {
            return;
        }
        for manager in self.managers.ordered_mut() {
            if !manager.enabled() {
                continue;
            }
            let started = Instant::now();
            manager.post_startup(&mut self.db, &mut self.ctx);
            debug!(manager = manager.name(), elapsed = ?started.elapsed(), "post-startup done");
        }
        self.finish(Phase::PostStartup);
    }

    /// Pass a routed request through its interceptor.
    ///
    /// `output` is the response body the host already built. Unknown routes
    /// return it unchanged.
    pub fn handle(
        &mut self,
        url: &str,
        request: &Value,
        session_id: &str,
        store: &mut dyn ProfileStore,
        output: String,
    ) -> String {
        let Some(route) = Route::from_url(url) else {
            debug!(url, "no interceptor for route");
            return output;
        };
        if self.completed != Some(Phase::PostStartup) {
            warn!(url, "request handled before startup finished");
        }
        let mut session = Session::new(session_id, store);
        routes::dispatch(
            route,
            routes::Exchange {
                request,
                output,
            },
            &mut session,
            &self.managers,
            &mut self.db,
            &mut self.ctx,
        )
    }

    // Internal helper functions

    /// Whether `phase` still has to run
    fn begin(&self, phase: Phase) -> bool {
        if self.completed.is_some_and(|done| done >= phase) {
            debug!(%phase, "phase already ran");
            return false;
        }
        info!(%phase, "running phase");
        true
    }

    fn finish(&mut self, phase: Phase) {
        self.completed = Some(phase);
    }
}
