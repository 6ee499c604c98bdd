use std::sync::Arc;

use crate::{config::AppConfig, db::OrmConn, mailer::Mailer};

#[derive(Clone)]
pub struct AppState {
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(orm: OrmConn, config: AppConfig, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            orm,
            config: Arc::new(config),
            mailer,
        }
    }
}
