pub use super::reset_links::Entity as ResetLinks;
pub use super::roles::Entity as Roles;
pub use super::user_roles::Entity as UserRoles;
pub use super::user_sessions::Entity as UserSessions;
pub use super::users::Entity as Users;
