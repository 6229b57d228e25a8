use vaultd_core::{db::Database, service::MembershipService};

#[derive(Clone)]
pub struct AppState {
    pub membership: MembershipService,
}

pub fn build_state(database: &Database) -> AppState {
    AppState {
        membership: MembershipService::new(database.membership_backend()),
    }
}
