pub mod password_policy;
pub use password_policy::PasswordPolicy;

pub mod token;
pub use token::{Claims, TokenError, TokenIssuer};

pub mod user_service;
pub mod user_service_impl;
pub use user_service::{DirectoryError, RegisterRequest, UpdateRequest, UserService, UserView};
pub use user_service_impl::SeaOrmUserService;

pub mod reset_service;
pub mod reset_service_impl;
pub use reset_service::{ResetError, ResetLinkView, ResetService};
pub use reset_service_impl::SeaOrmResetService;
