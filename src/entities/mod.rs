pub mod prelude;

pub mod reset_links;
pub mod roles;
pub mod user_roles;
pub mod user_sessions;
pub mod users;
