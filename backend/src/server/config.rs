//! HTTP server configuration object.

use std::net::SocketAddr;

use actix_web::cookie::{Key, SameSite};
use backend::outbound::calendar::CalendarConfig;
use backend::outbound::mpesa::MpesaConfig;
use backend::outbound::persistence::DbPool;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: DbPool,
    pub(crate) mpesa: Option<MpesaConfig>,
    pub(crate) calendar: Option<CalendarConfig>,
}

impl ServerConfig {
    /// Construct a server configuration from the mandatory pieces.
    #[must_use]
    pub fn new(
        key: Key,
        cookie_secure: bool,
        same_site: SameSite,
        bind_addr: SocketAddr,
        db_pool: DbPool,
    ) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            db_pool,
            mpesa: None,
            calendar: None,
        }
    }

    /// Attach Daraja credentials; without them paid flows answer 503.
    #[must_use]
    pub fn with_mpesa(mut self, config: Option<MpesaConfig>) -> Self {
        self.mpesa = config;
        self
    }

    /// Attach calendar credentials; without them sessions get no meet links.
    #[must_use]
    pub fn with_calendar(mut self, config: Option<CalendarConfig>) -> Self {
        self.calendar = config;
        self
    }
}
