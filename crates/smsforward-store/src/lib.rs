pub mod db;
pub mod error;
pub mod migrate;
pub mod paths;
pub mod repo;
pub mod watch;

use crate::error::Result;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

pub use error::{StoreError, StoreErrorKind};
pub use repo::RulesRepo;
pub use watch::RuleWatcher;

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = db::open(path)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = db::open_in_memory()?;
        Ok(Self { conn })
    }

    pub fn migrate(&self) -> Result<()> {
        migrate::run_migrations(&self.conn)
    }

    pub fn schema_version(&self) -> Result<i64> {
        migrate::schema_version(&self.conn)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn rules(&self) -> RulesRepo<'_> {
        RulesRepo::new(&self.conn)
    }

    pub fn watch_rule(&self, interval: Duration) -> RuleWatcher<'_> {
        RuleWatcher::new(self.rules(), interval)
    }
}
