//! List variants.
//!
//! The dated task list and the undated habit list share one implementation;
//! this enum carries everything that differs between them.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Which of the two independent lists an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListVariant {
    /// Items carry an associated date and are shown per selected day.
    Tasks,
    /// Items carry no date and are always shown.
    Habits,
}

impl ListVariant {
    /// Fixed key of this list's blob in the key-value table.
    pub fn storage_key(self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::Habits => "habits",
        }
    }

    pub fn is_dated(self) -> bool {
        matches!(self, Self::Tasks)
    }

    pub fn as_str(self) -> &'static str {
        self.storage_key()
    }
}

impl Display for ListVariant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListVariant {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tasks" => Ok(Self::Tasks),
            "habits" => Ok(Self::Habits),
            other => Err(format!(
                "unsupported list variant `{other}`; expected tasks|habits"
            )),
        }
    }
}
