//! Access configuration, supplied once at startup.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Recognised access options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
  /// Required email domain, without the `@`.
  pub domain:            String,
  /// Whether a whitelist entry is required to sign in.
  pub require_whitelist: bool,
  /// Logical name of the whitelist collection in the directory store.
  pub user_collection:   String,
}

impl Default for AccessConfig {
  fn default() -> Self {
    Self {
      domain:            "nr.ac.th".to_string(),
      require_whitelist: true,
      user_collection:   "users".to_string(),
    }
  }
}

impl AccessConfig {
  /// Normalise and check the configuration.
  ///
  /// A leading `@` on the domain is dropped. Empty domains and collection
  /// names are rejected: an empty domain would make the suffix check accept
  /// any address ending in `@`.
  pub fn validated(mut self) -> Result<Self> {
    self.domain = self.domain.trim().trim_start_matches('@').to_string();
    self.user_collection = self.user_collection.trim().to_string();

    if self.domain.is_empty() {
      return Err(Error::InvalidConfig("access.domain must not be empty".into()));
    }
    if self.user_collection.is_empty() {
      return Err(Error::InvalidConfig(
        "access.user_collection must not be empty".into(),
      ));
    }
    Ok(self)
  }

  /// The exact suffix an email address must end with.
  pub fn email_suffix(&self) -> String { format!("@{}", self.domain) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_enforce_the_whitelist() {
    let cfg = AccessConfig::default();
    assert_eq!(cfg.domain, "nr.ac.th");
    assert!(cfg.require_whitelist);
    assert_eq!(cfg.user_collection, "users");
  }

  #[test]
  fn leading_at_is_stripped() {
    let cfg = AccessConfig {
      domain: "@example.org".into(),
      ..AccessConfig::default()
    }
    .validated()
    .unwrap();
    assert_eq!(cfg.email_suffix(), "@example.org");
  }

  #[test]
  fn empty_domain_is_rejected() {
    let result = AccessConfig {
      domain: " @ ".into(),
      ..AccessConfig::default()
    }
    .validated();
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
  }

  #[test]
  fn partial_config_fills_defaults() {
    let cfg: AccessConfig =
      serde_json::from_str(r#"{"require_whitelist": false}"#).unwrap();
    assert!(!cfg.require_whitelist);
    assert_eq!(cfg.domain, "nr.ac.th");
  }
}
