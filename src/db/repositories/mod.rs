pub mod reset_link;
pub mod role;
pub mod session;
pub mod user;
