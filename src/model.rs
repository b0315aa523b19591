//! Domain entities shared by the remote adapters and the local store.
//!
//! Each struct doubles as the wire representation and the stored record.
//! Older deployments of the backend expose prefixed column names
//! (`RAI_NAME`, `TEA_NAME`, ...); those spellings are accepted as explicit
//! aliases on the way in and never emitted on the way out.

use serde::{Deserialize, Serialize};

use crate::sync::Record;

/// A raid: the central event entity races and teams attach to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Raid {
  #[serde(default, alias = "RAI_ID", skip_serializing_if = "Option::is_none")]
  pub id: Option<i64>,
  #[serde(alias = "RAI_NAME")]
  pub name: String,
  #[serde(default, alias = "RAI_DESCRIPTION", skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(alias = "RAI_START_DATE")]
  pub start_date: String,
  #[serde(default, alias = "RAI_END_DATE", skip_serializing_if = "Option::is_none")]
  pub end_date: Option<String>,
  /// Venue, when one has been attached.
  #[serde(default, alias = "ADD_ID", skip_serializing_if = "Option::is_none")]
  pub address_id: Option<i64>,
  /// Organizing user.
  #[serde(default, alias = "USE_ID", skip_serializing_if = "Option::is_none")]
  pub manager_id: Option<i64>,
}

/// A race run within a raid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Race {
  #[serde(default, alias = "RAC_ID", skip_serializing_if = "Option::is_none")]
  pub id: Option<i64>,
  #[serde(alias = "RAI_ID")]
  pub raid_id: i64,
  #[serde(alias = "RAC_NAME")]
  pub name: String,
  #[serde(default, alias = "RAC_DISTANCE", skip_serializing_if = "Option::is_none")]
  pub distance_km: Option<f64>,
  #[serde(default, alias = "RAC_DIFFICULTY", skip_serializing_if = "Option::is_none")]
  pub difficulty: Option<String>,
}

/// A postal address, referenced by raids and clubs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
  #[serde(default, alias = "ADD_ID", skip_serializing_if = "Option::is_none")]
  pub id: Option<i64>,
  #[serde(alias = "ADD_STREET")]
  pub street: String,
  #[serde(alias = "ADD_CITY")]
  pub city: String,
  #[serde(alias = "ADD_POSTAL_CODE")]
  pub postal_code: String,
  #[serde(default, alias = "ADD_COUNTRY", skip_serializing_if = "Option::is_none")]
  pub country: Option<String>,
}

/// A sports club, with a responsible user and a registered address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Club {
  #[serde(default, alias = "CLU_ID", skip_serializing_if = "Option::is_none")]
  pub id: Option<i64>,
  #[serde(alias = "CLU_NAME")]
  pub name: String,
  #[serde(alias = "USE_ID")]
  pub responsible_id: i64,
  #[serde(alias = "ADD_ID")]
  pub address_id: i64,
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  #[serde(default, alias = "USE_ID", skip_serializing_if = "Option::is_none")]
  pub id: Option<i64>,
  #[serde(alias = "USE_EMAIL")]
  pub email: String,
  #[serde(alias = "USE_FIRST_NAME")]
  pub first_name: String,
  #[serde(alias = "USE_LAST_NAME")]
  pub last_name: String,
}

/// A team competing in races, managed by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
  #[serde(default, alias = "TEA_ID", skip_serializing_if = "Option::is_none")]
  pub id: Option<i64>,
  #[serde(alias = "TEA_NAME")]
  pub name: String,
  #[serde(alias = "USE_ID")]
  pub manager_id: i64,
  #[serde(default, alias = "CLU_ID", skip_serializing_if = "Option::is_none")]
  pub club_id: Option<i64>,
}

// ============================================================================
// Record implementations
// ============================================================================

impl Record for Raid {
  fn record_id(&self) -> Option<i64> {
    self.id
  }

  fn set_record_id(&mut self, id: i64) {
    self.id = Some(id);
  }

  fn kind() -> &'static str {
    "raid"
  }
}

impl Record for Race {
  fn record_id(&self) -> Option<i64> {
    self.id
  }

  fn set_record_id(&mut self, id: i64) {
    self.id = Some(id);
  }

  fn kind() -> &'static str {
    "race"
  }
}

impl Record for Address {
  fn record_id(&self) -> Option<i64> {
    self.id
  }

  fn set_record_id(&mut self, id: i64) {
    self.id = Some(id);
  }

  fn kind() -> &'static str {
    "address"
  }
}

impl Record for Club {
  fn record_id(&self) -> Option<i64> {
    self.id
  }

  fn set_record_id(&mut self, id: i64) {
    self.id = Some(id);
  }

  fn kind() -> &'static str {
    "club"
  }
}

impl Record for User {
  fn record_id(&self) -> Option<i64> {
    self.id
  }

  fn set_record_id(&mut self, id: i64) {
    self.id = Some(id);
  }

  fn kind() -> &'static str {
    "user"
  }
}

impl Record for Team {
  fn record_id(&self) -> Option<i64> {
    self.id
  }

  fn set_record_id(&mut self, id: i64) {
    self.id = Some(id);
  }

  fn kind() -> &'static str {
    "team"
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_prefixed_spellings_are_accepted() {
    let team: Team = serde_json::from_str(
      r#"{"TEA_ID": 3, "TEA_NAME": "Les Volcans", "USE_ID": 7, "CLU_ID": 2}"#,
    )
    .unwrap();

    assert_eq!(team.id, Some(3));
    assert_eq!(team.name, "Les Volcans");
    assert_eq!(team.manager_id, 7);
    assert_eq!(team.club_id, Some(2));
  }

  #[test]
  fn test_plain_spellings_are_accepted() {
    let team: Team =
      serde_json::from_str(r#"{"id": 3, "name": "Les Volcans", "manager_id": 7}"#).unwrap();

    assert_eq!(team.id, Some(3));
    assert_eq!(team.club_id, None);
  }

  #[test]
  fn test_serialization_emits_plain_names_and_skips_missing_id() {
    let raid = Raid {
      id: None,
      name: "Raid des Volcans".to_string(),
      description: None,
      start_date: "2026-06-12".to_string(),
      end_date: None,
      address_id: Some(4),
      manager_id: None,
    };

    let value = serde_json::to_value(&raid).unwrap();
    let object = value.as_object().unwrap();

    assert!(!object.contains_key("id"));
    assert!(!object.contains_key("RAI_NAME"));
    assert_eq!(object["name"], "Raid des Volcans");
    assert_eq!(object["address_id"], 4);
  }
}
