use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    #[serde(default)]
    pub discount: DiscountConfig,
    #[serde(default = "default_trains")]
    pub trains: Vec<TrainSeed>,
    #[serde(default = "default_users")]
    pub users: Vec<UserSeed>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub server_url: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

/// Coupon table plus the purchase policy for it.
///
/// With `required = false` a purchase without a code pays the full price; a code that is
/// present but unknown is rejected either way.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscountConfig {
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub codes: HashMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainSeed {
    pub id: String,
    pub origin: String,
    pub destination: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub sections: usize,
    #[serde(default)]
    pub seats_per_section: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSeed {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

fn default_trains() -> Vec<TrainSeed> {
    vec![TrainSeed {
        id: "T1".to_string(),
        origin: "London".to_string(),
        destination: "France".to_string(),
        price: 20.0,
        sections: 2,
        seats_per_section: 20,
    }]
}

fn default_users() -> Vec<UserSeed> {
    vec![
        UserSeed {
            id: "1".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Smith".to_string(),
            email: "alicewonderland@gmail.com".to_string(),
        },
        UserSeed {
            id: "2".to_string(),
            first_name: "Bob".to_string(),
            last_name: "Johnson".to_string(),
            email: "bobthebuilder@gmail.com".to_string(),
        },
    ]
}

fn default_connect_timeout_secs() -> u64 {
    10
}

pub fn load_config<T: for<'de> Deserialize<'de>>(path: &str) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_server_config_gets_seed_defaults() {
        let config: ServerConfig = toml::from_str(r#"bind_addr = "127.0.0.1:8080""#).unwrap();
        assert!(!config.discount.required);
        assert!(config.discount.codes.is_empty());
        assert_eq!(config.trains.len(), 1);
        assert_eq!(config.trains[0].sections, 2);
        assert_eq!(config.trains[0].seats_per_section, 20);
        assert_eq!(config.users.len(), 2);
        assert_eq!(config.users[1].first_name, "Bob");
    }

    #[test]
    fn discount_table_and_trains_parse() {
        let raw = r#"
            bind_addr = "0.0.0.0:9000"

            [discount]
            required = true
            codes = { SPRING = 5.0, HALF = 10.0 }

            [[trains]]
            id = "T9"
            origin = "Paris"
            destination = "Berlin"
            price = 45.5
            sections = 3
            seats_per_section = 4
        "#;
        let config: ServerConfig = toml::from_str(raw).unwrap();
        assert!(config.discount.required);
        assert_eq!(config.discount.codes.get("HALF"), Some(&10.0));
        assert_eq!(config.trains.len(), 1);
        assert_eq!(config.trains[0].destination, "Berlin");
        assert_eq!(config.trains[0].seats_per_section, 4);
    }

    #[test]
    fn client_config_timeout_defaults() {
        let config: ClientConfig = toml::from_str(r#"server_url = "ws://127.0.0.1:8080""#).unwrap();
        assert_eq!(config.connect_timeout_secs, 10);
    }
}
