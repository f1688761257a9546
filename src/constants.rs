pub const UNKNOWN_COUNTRY: &str = "UNKNOWN";

pub mod messages {

    pub const SUCCESS: &str = "SUCCESS";

    pub const INVALID_LINK: &str = "Link is not valid";
}

pub mod reset {

    /// Default validity window for a password reset link.
    pub const LINK_TTL_HOURS: i64 = 3;
}
