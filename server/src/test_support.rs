use vaultd_core::{
    config::{AppConfig, StoreBackend},
    db::Database,
};

use crate::state::{AppState, build_state};

pub(crate) fn setup_state() -> AppState {
    let mut config = AppConfig::default();
    config.store_backend = StoreBackend::Memory;

    let database = Database::connect(&config).expect("connect database");
    build_state(&database)
}

pub(crate) async fn seed_member(state: &AppState, vault: &str, user: &str) {
    state.membership.add(vault, user).await.expect("add member");
}
