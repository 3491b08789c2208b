//! Simulator configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use guild_arcade::{
    game::{GameKind, dice::DICE_MAX_PLAYERS},
    lobby::config::MAX_BET,
};

/// Complete simulator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Guild whose wallets fund every lobby
    pub guild: u64,
    /// Number of lobbies to run
    pub lobbies: usize,
    /// Game every lobby plays, or `None` to rotate through all kinds
    pub kind: Option<GameKind>,
    /// Stake per human player
    pub bet: u64,
    /// Human players per lobby, host included
    pub humans: usize,
    /// Bots seated next to the humans (pet battles always seat exactly one)
    pub bots: usize,
    /// Balance every new wallet starts with
    pub starting_balance: u64,
    /// Seed for reproducible games
    pub seed: Option<u64>,
    /// Seconds before a running game is force-ended
    pub game_timeout_secs: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            guild: 1,
            lobbies: 3,
            kind: None,
            bet: 100,
            humans: 2,
            bots: 2,
            starting_balance: 1_000,
            seed: None,
            game_timeout_secs: 30,
        }
    }
}

impl SimConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `lobbies_override` - Optional lobby count (from CLI args)
    /// * `kind_override` - Optional game kind (from CLI args)
    /// * `seed_override` - Optional seed (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if `SIM_KIND` names no known game
    pub fn from_env(
        lobbies_override: Option<usize>,
        kind_override: Option<GameKind>,
        seed_override: Option<u64>,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let kind = match kind_override {
            Some(kind) => Some(kind),
            None => match std::env::var("SIM_KIND") {
                Ok(value) if value.eq_ignore_ascii_case("all") => None,
                Ok(value) => Some(value.parse().map_err(|reason| ConfigError::Invalid {
                    var: "SIM_KIND".to_string(),
                    reason,
                })?),
                Err(_) => None,
            },
        };

        let seed = seed_override.or_else(|| {
            std::env::var("SIM_SEED")
                .ok()
                .and_then(|v| v.parse().ok())
        });

        Ok(SimConfig {
            guild: parse_env_or("SIM_GUILD", defaults.guild),
            lobbies: lobbies_override
                .unwrap_or_else(|| parse_env_or("SIM_LOBBIES", defaults.lobbies)),
            kind,
            bet: parse_env_or("SIM_BET", defaults.bet),
            humans: parse_env_or("SIM_HUMANS", defaults.humans),
            bots: parse_env_or("SIM_BOTS", defaults.bots),
            starting_balance: parse_env_or("SIM_STARTING_BALANCE", defaults.starting_balance),
            seed,
            game_timeout_secs: parse_env_or("SIM_GAME_TIMEOUT_SECS", defaults.game_timeout_secs),
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lobbies == 0 {
            return Err(ConfigError::Invalid {
                var: "SIM_LOBBIES".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        if self.humans == 0 {
            return Err(ConfigError::Invalid {
                var: "SIM_HUMANS".to_string(),
                reason: "Must be at least 1 (the host)".to_string(),
            });
        }

        // Bunker needs three seats, dice caps the table
        if self.humans + self.bots < 3 {
            return Err(ConfigError::Invalid {
                var: "SIM_BOTS".to_string(),
                reason: "Humans and bots together must fill at least 3 seats".to_string(),
            });
        }

        if self.humans + self.bots > DICE_MAX_PLAYERS {
            return Err(ConfigError::Invalid {
                var: "SIM_BOTS".to_string(),
                reason: format!("Humans and bots together must be at most {DICE_MAX_PLAYERS}"),
            });
        }

        if self.bet > MAX_BET {
            return Err(ConfigError::Invalid {
                var: "SIM_BET".to_string(),
                reason: format!("Must be at most {MAX_BET}"),
            });
        }

        if self.bet > self.starting_balance {
            return Err(ConfigError::Invalid {
                var: "SIM_BET".to_string(),
                reason: format!(
                    "Cannot exceed the starting balance ({})",
                    self.starting_balance
                ),
            });
        }

        if self.game_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "SIM_GAME_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Game played by the `index`-th lobby
    pub fn kind_for(&self, index: usize) -> GameKind {
        self.kind
            .unwrap_or(GameKind::ALL[index % GameKind::ALL.len()])
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Invalid {
            var: "SIM_KIND".to_string(),
            reason: "unknown game kind 'poker'".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("SIM_KIND"));
        assert!(msg.contains("poker"));
    }

    #[test]
    fn test_config_validation_too_few_seats() {
        let config = SimConfig {
            humans: 1,
            bots: 1, // Invalid: bunker needs three seats
            ..SimConfig::default()
        };

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "SIM_BOTS"));
    }

    #[test]
    fn test_config_validation_bet_above_balance() {
        let config = SimConfig {
            bet: 2_000,
            starting_balance: 1_000,
            ..SimConfig::default()
        };

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "SIM_BET"));
    }

    #[test]
    fn test_config_validation_no_lobbies() {
        let config = SimConfig {
            lobbies: 0,
            ..SimConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_kind_rotation() {
        let config = SimConfig::default();
        assert_eq!(config.kind_for(0), GameKind::Dice);
        assert_eq!(config.kind_for(1), GameKind::Bunker);
        assert_eq!(config.kind_for(2), GameKind::PetsBattle);
        assert_eq!(config.kind_for(3), GameKind::Dice);

        let fixed = SimConfig {
            kind: Some(GameKind::Bunker),
            ..SimConfig::default()
        };
        assert_eq!(fixed.kind_for(2), GameKind::Bunker);
    }

    #[test]
    fn test_parse_env_or_falls_back() {
        assert_eq!(parse_env_or("GA_SIM_SURELY_UNSET_VARIABLE", 42u64), 42);
    }
}
