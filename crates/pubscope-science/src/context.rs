use pubscope_core::{AppConfig, Database, open_library};

use crate::autolearn::AutolearnDispatcher;
use crate::config::ScienceConfig;
use crate::error::Result;
use crate::resolver::Resolver;

/// Everything one command needs: the open library and the providers.
pub struct BibContext {
    db: Database,
    dispatcher: AutolearnDispatcher,
    app: AppConfig,
}

impl BibContext {
    /// Open the configured library and build the real providers.
    pub fn open(app: AppConfig, science: &ScienceConfig) -> Result<Self> {
        let db = open_library(&app.database_path())?;
        let dispatcher = AutolearnDispatcher::from_config(science)?;
        Ok(Self::with_parts(db, dispatcher, app))
    }

    pub fn with_parts(db: Database, dispatcher: AutolearnDispatcher, app: AppConfig) -> Self {
        Self {
            db,
            dispatcher,
            app,
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn dispatcher(&self) -> &AutolearnDispatcher {
        &self.dispatcher
    }

    pub fn config(&self) -> &AppConfig {
        &self.app
    }

    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.db, &self.dispatcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CallLog, FakeSources, fake_dispatcher};
    use pubscope_core::{PubRecord, RecordStore, init_library};
    use tempfile::TempDir;

    #[tokio::test]
    async fn context_resolves_against_its_library() {
        let dir = TempDir::new().unwrap();
        let mut app = AppConfig::default();
        app.set_library_path(dir.path().to_path_buf());

        let db = init_library(&app.database_path()).unwrap();
        let stored = db
            .create_publication(PubRecord {
                nicknames: vec!["first".into()],
                ..PubRecord::default()
            })
            .unwrap();

        let log = CallLog::default();
        let ctx = BibContext::with_parts(db, fake_dispatcher(&log, FakeSources::default()), app);
        let found = ctx.resolver().require_one("first", false).await.unwrap();
        assert_eq!(found.id, stored.id);
    }

    #[test]
    fn opening_an_uninitialized_library_fails() {
        let dir = TempDir::new().unwrap();
        let mut app = AppConfig::default();
        app.set_library_path(dir.path().join("missing"));

        assert!(BibContext::open(app, &ScienceConfig::default()).is_err());
    }
}
