pub mod api;
pub mod clients;
pub mod config;
pub mod db;
pub mod erp;
pub mod history;
pub mod mail;
pub mod orders;
pub mod suggestions;

pub use db::DbPool;

use config::Config;
use erp::ErpClient;
use history::HistoryClient;
use mail::Mailer;

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    pub mailer: Mailer,
    pub erp: ErpClient,
    pub history: HistoryClient,
}

impl AppState {
    pub fn new(config: Config, db: DbPool) -> Self {
        let mailer = Mailer::new(&config.mail);
        let erp = ErpClient::new(config.erp.endpoint.clone());
        let history = HistoryClient::new(&config.history);
        Self {
            config,
            db,
            mailer,
            erp,
            history,
        }
    }
}
