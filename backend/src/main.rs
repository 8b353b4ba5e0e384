//! Backend entry point: reads the environment, builds the connection pool,
//! and wires the REST endpoints.

mod server;

use std::env;

use actix_web::cookie::{Key, SameSite};
use actix_web::web;
use reqwest::Url;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use backend::inbound::http::health::HealthState;
use backend::outbound::calendar::CalendarConfig;
use backend::outbound::mpesa::MpesaConfig;
use backend::outbound::persistence::{DbPool, PoolConfig};
use server::ServerConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MPESA_BASE_URL: &str = "https://sandbox.safaricom.co.ke";

fn session_key() -> std::io::Result<Key> {
    let key_path =
        env::var("SESSION_KEY_FILE").unwrap_or_else(|_| "/var/run/secrets/session_key".into());
    match std::fs::read(&key_path) {
        Ok(bytes) => Ok(Key::derive_from(&bytes)),
        Err(err) => {
            let allow_dev = env::var("SESSION_ALLOW_EPHEMERAL").ok().as_deref() == Some("1");
            if cfg!(debug_assertions) || allow_dev {
                warn!(path = %key_path, error = %err, "using temporary session key (dev only)");
                Ok(Key::generate())
            } else {
                Err(std::io::Error::other(format!(
                    "failed to read session key at {key_path}: {err}"
                )))
            }
        }
    }
}

fn mpesa_config() -> Option<MpesaConfig> {
    let consumer_key = env::var("MPESA_CONSUMER_KEY").ok()?;
    let consumer_secret = env::var("MPESA_CONSUMER_SECRET").ok()?;
    let passkey = env::var("MPESA_PASSKEY").ok()?;
    let shortcode = env::var("MPESA_SHORTCODE").ok()?;
    let base_url = env::var("MPESA_BASE_URL")
        .unwrap_or_else(|_| DEFAULT_MPESA_BASE_URL.to_owned());
    let base_url = match Url::parse(&base_url) {
        Ok(url) => url,
        Err(err) => {
            warn!(error = %err, "invalid MPESA_BASE_URL; mpesa disabled");
            return None;
        }
    };
    let app_url = env::var("APP_URL").unwrap_or_else(|_| "http://localhost:8080".to_owned());

    Some(MpesaConfig {
        consumer_key,
        consumer_secret,
        passkey,
        shortcode,
        callback_url: format!("{app_url}/api/v1/payments/mpesa/callback"),
        base_url,
    })
}

fn calendar_config() -> Option<CalendarConfig> {
    let client_email = env::var("GOOGLE_CLIENT_EMAIL").ok()?;
    let private_key_pem = env::var("GOOGLE_PRIVATE_KEY").ok()?.replace("\\n", "\n");
    let calendar_id = env::var("GOOGLE_CALENDAR_ID").unwrap_or_else(|_| "primary".to_owned());

    Some(CalendarConfig {
        client_email,
        private_key_pem,
        calendar_id,
    })
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(err) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %err, "tracing init failed");
    }

    let database_url = env::var("DATABASE_URL")
        .map_err(|_| std::io::Error::other("DATABASE_URL must be set"))?;
    let db_pool = DbPool::new(PoolConfig::new(database_url))
        .await
        .map_err(|err| std::io::Error::other(format!("database pool: {err}")))?;

    let key = session_key()?;
    let cookie_secure = env::var("SESSION_COOKIE_SECURE")
        .map(|v| v != "0")
        .unwrap_or(true);
    let bind_addr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_owned())
        .parse()
        .map_err(|err| std::io::Error::other(format!("invalid BIND_ADDR: {err}")))?;

    let config = ServerConfig::new(key, cookie_secure, SameSite::Lax, bind_addr, db_pool)
        .with_mpesa(mpesa_config())
        .with_calendar(calendar_config());

    let health_state = web::Data::new(HealthState::new());
    let server = server::create_server(health_state, config)?;
    server.await
}
