use std::path::PathBuf;

use serde::Deserialize;

use crate::config::Config;
use crate::db::SqliteStore;
use crate::store::{FixtureStore, RecordStore};

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub config: Config,
    pub workspace: Option<PathBuf>,
    pub store: Option<Box<dyn RecordStore>>,
}

impl AppState {
    /// Starts on the demo students unless the config turns that off.
    pub fn new(config: Config) -> Self {
        let store: Option<Box<dyn RecordStore>> = if config.demo {
            Some(Box::new(FixtureStore::demo()))
        } else {
            None
        };
        Self {
            config,
            workspace: None,
            store,
        }
    }

    pub fn select_workspace(&mut self, path: PathBuf) -> anyhow::Result<()> {
        let store = SqliteStore::open(&path)?;
        tracing::info!(workspace = %path.display(), "workspace opened");
        self.workspace = Some(path);
        self.store = Some(Box::new(store));
        Ok(())
    }

    pub fn use_fixtures(&mut self) {
        tracing::info!("switched to demo students");
        self.workspace = None;
        self.store = Some(Box::new(FixtureStore::demo()));
    }

    pub fn backend_tag(&self) -> Option<&'static str> {
        self.store.as_ref().map(|s| s.backend_tag())
    }
}
