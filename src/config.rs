// Server configuration loaded from the environment (and `.env` when present)

use rust_decimal::Decimal;
use std::net::SocketAddr;
use std::str::FromStr;
use tracing::warn;

use crate::ledger::DEFAULT_STARTING_BALANCE;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Balance given to users created without an explicit one
    pub default_balance: Decimal,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            default_balance: DEFAULT_STARTING_BALANCE,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_vars(
            std::env::var("BIND_ADDR").ok().as_deref(),
            std::env::var("DEFAULT_BALANCE").ok().as_deref(),
        )
    }

    /// Unparseable values fall back to the defaults
    pub fn from_vars(bind_addr: Option<&str>, default_balance: Option<&str>) -> Self {
        let defaults = Self::default();

        let bind_addr = match bind_addr {
            Some(raw) => SocketAddr::from_str(raw.trim()).unwrap_or_else(|e| {
                warn!("⚠️  Invalid BIND_ADDR '{}' ({}), using {}", raw, e, DEFAULT_BIND_ADDR);
                defaults.bind_addr
            }),
            None => defaults.bind_addr,
        };

        let default_balance = match default_balance {
            Some(raw) => match Decimal::from_str(raw.trim()) {
                Ok(v) if v >= Decimal::ZERO => v,
                _ => {
                    warn!("⚠️  Invalid DEFAULT_BALANCE '{}', using {}", raw, DEFAULT_STARTING_BALANCE);
                    defaults.default_balance
                }
            },
            None => defaults.default_balance,
        };

        Self { bind_addr, default_balance }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_vars_parses_values() {
        let cfg = ServerConfig::from_vars(Some("127.0.0.1:3000"), Some("250.50"));
        assert_eq!(cfg.bind_addr, SocketAddr::from(([127, 0, 0, 1], 3000)));
        assert_eq!(cfg.default_balance, dec!(250.50));
    }

    #[test]
    fn test_from_vars_falls_back_on_garbage() {
        let cfg = ServerConfig::from_vars(Some("not-an-addr"), Some("-10"));
        assert_eq!(cfg.bind_addr.port(), 8080);
        assert_eq!(cfg.default_balance, DEFAULT_STARTING_BALANCE);

        let cfg = ServerConfig::from_vars(None, None);
        assert_eq!(cfg.bind_addr.to_string(), DEFAULT_BIND_ADDR);
    }
}
