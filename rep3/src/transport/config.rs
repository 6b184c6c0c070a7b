use std::{
    fs::File,
    io::{self, BufReader},
    net::SocketAddr,
    path::Path,
};

use serde::Deserialize;

/// Configuration of networked multi-party transport.
#[derive(Clone, Debug, Deserialize)]
pub struct NetworkConfig {
    pub parties: Vec<NetworkPartyConfig>,
}

/// Details about party in networked multiparty protocol.
#[derive(Clone, Debug, Deserialize)]
pub struct NetworkPartyConfig {
    pub address: SocketAddr,
}

impl NetworkConfig {
    /// Load configuration from JSON file.
    pub fn load(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Configuration with all parties on consecutive loopback ports.
    pub fn loopback(base_port: u16, num_parties: usize) -> Self {
        NetworkConfig {
            parties: (0..num_parties)
                .map(|id| NetworkPartyConfig {
                    address: SocketAddr::from(([127, 0, 0, 1], base_port + id as u16)),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let raw = r#"{"parties": [
            {"address": "10.0.0.1:4000"},
            {"address": "10.0.0.2:4000"},
            {"address": "10.0.0.3:4000"}
        ]}"#;
        let config: NetworkConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.parties.len(), 3);
        assert_eq!(config.parties[1].address.port(), 4000);
    }

    #[test]
    fn test_loopback_config() {
        let config = NetworkConfig::loopback(37300, 3);
        assert_eq!(config.parties.len(), 3);
        assert_eq!(config.parties[2].address.port(), 37302);
        assert!(config.parties[0].address.ip().is_loopback());
    }
}
