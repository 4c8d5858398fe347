use dotenvy::dotenv;
use std::env;
use std::ops::RangeInclusive;
use std::str::FromStr;

use bistro_core::DomainError;

#[derive(Debug, Clone)]
pub struct Config {
    pub password_min_length: usize,
    pub password_max_length: usize,
    pub group_name_min_length: usize,
    pub group_name_max_length: usize,
    pub http_protocol: String,
    pub domain: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            password_min_length: 8,
            password_max_length: 30,
            group_name_min_length: 1,
            group_name_max_length: 70,
            http_protocol: "http".to_string(),
            domain: "localhost:8000".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();
        let defaults = Self::default();

        Self {
            password_min_length: parse_var(
                "BISTRO_PASSWORD_MIN_LENGTH",
                defaults.password_min_length,
            ),
            password_max_length: parse_var(
                "BISTRO_PASSWORD_MAX_LENGTH",
                defaults.password_max_length,
            ),
            group_name_min_length: parse_var(
                "BISTRO_GROUP_NAME_MIN_LENGTH",
                defaults.group_name_min_length,
            ),
            group_name_max_length: parse_var(
                "BISTRO_GROUP_NAME_MAX_LENGTH",
                defaults.group_name_max_length,
            ),
            http_protocol: env::var("BISTRO_HTTP_PROTOCOL").unwrap_or(defaults.http_protocol),
            domain: env::var("BISTRO_DOMAIN").unwrap_or(defaults.domain),
        }
    }

    pub fn password_length(&self) -> RangeInclusive<usize> {
        self.password_min_length..=self.password_max_length
    }

    pub fn group_name_length(&self) -> RangeInclusive<usize> {
        self.group_name_min_length..=self.group_name_max_length
    }

    /// Lengths are counted in characters, not bytes.
    pub fn validate_password(&self, password: &str) -> Result<(), DomainError> {
        if !self.password_length().contains(&password.chars().count()) {
            return Err(DomainError::PasswordValidation {
                min: self.password_min_length,
                max: self.password_max_length,
            });
        }
        Ok(())
    }

    pub fn validate_group_name(&self, name: &str) -> Result<(), DomainError> {
        if !self.group_name_length().contains(&name.chars().count()) {
            return Err(DomainError::GroupNameValidation {
                min: self.group_name_min_length,
                max: self.group_name_max_length,
            });
        }
        Ok(())
    }

    pub fn verify_email_link(&self, user_id: i64) -> String {
        format!(
            "{}://{}/auth/verify-email/{}",
            self.http_protocol, self.domain, user_id
        )
    }
}

fn parse_var<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(val) => val.parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_length_bounds_are_inclusive() {
        let config = Config::default();

        assert!(config.validate_password("12345678").is_ok());
        assert!(config.validate_password(&"x".repeat(30)).is_ok());
        assert!(matches!(
            config.validate_password("1234567"),
            Err(DomainError::PasswordValidation { min: 8, max: 30 })
        ));
        assert!(config.validate_password(&"x".repeat(31)).is_err());
    }

    #[test]
    fn test_group_name_counts_characters() {
        let config = Config::default();

        assert!(config.validate_group_name("Ж").is_ok());
        assert!(config.validate_group_name(&"ж".repeat(70)).is_ok());
        assert!(matches!(
            config.validate_group_name(""),
            Err(DomainError::GroupNameValidation { min: 1, max: 70 })
        ));
    }

    #[test]
    fn test_verify_email_link() {
        let config = Config {
            http_protocol: "https".to_string(),
            domain: "bistro.example".to_string(),
            ..Config::default()
        };

        assert_eq!(
            config.verify_email_link(42),
            "https://bistro.example/auth/verify-email/42"
        );
    }
}
