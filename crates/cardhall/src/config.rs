//! Server configuration read from the environment.

use cardhall_room::RoomConfig;

/// Port used when neither `CARDHALL_ADDR` nor `PORT` is set.
pub const DEFAULT_PORT: u16 = 3000;

/// Everything the binary needs to start a server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `host:port` to listen on.
    pub bind_addr: String,
    pub room: RoomConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{DEFAULT_PORT}"),
            room: RoomConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Reads `CARDHALL_ADDR` (a full `host:port`), falling back to `PORT`
    /// on all interfaces, then to `0.0.0.0:3000`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("CARDHALL_ADDR").filter(|a| !a.trim().is_empty()) {
            config.bind_addr = addr.trim().to_owned();
        } else if let Some(port) = lookup("PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => config.bind_addr = format!("0.0.0.0:{port}"),
                Err(_) => {
                    tracing::warn!(%port, default = DEFAULT_PORT, "invalid PORT, using default");
                }
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_defaults_to_port_3000() {
        let config = ServerConfig::from_lookup(lookup(&[]));
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.room, RoomConfig::default());
    }

    #[test]
    fn test_from_lookup_uses_port() {
        let config = ServerConfig::from_lookup(lookup(&[("PORT", "8081")]));
        assert_eq!(config.bind_addr, "0.0.0.0:8081");
    }

    #[test]
    fn test_from_lookup_addr_wins_over_port() {
        let config =
            ServerConfig::from_lookup(lookup(&[("PORT", "8081"), ("CARDHALL_ADDR", "127.0.0.1:9000")]));
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
    }

    #[test]
    fn test_from_lookup_bad_port_falls_back() {
        let config = ServerConfig::from_lookup(lookup(&[("PORT", "not-a-port")]));
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
    }
}
