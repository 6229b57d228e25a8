pub mod health_handlers;
pub mod member_handlers;
