//! Scheduled to-do items and the importance partition view.
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::{JotError, Payload, Placement, Record, Result};

/// A todo as held in the store.
pub type Todo = Record<TodoBody>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    #[default]
    Relaxed,
    Important,
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Importance::Relaxed => write!(f, "relaxed"),
            Importance::Important => write!(f, "important"),
        }
    }
}

/// Todo content. `text` must not be blank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoBody {
    pub text: String,
    #[serde(rename = "important", default)]
    pub importance: Importance,
    #[serde(rename = "date", default, with = "iso_date")]
    pub scheduled_date: Option<NaiveDate>,
    #[serde(rename = "time", default, with = "iso_time")]
    pub scheduled_time: Option<NaiveTime>,
}

impl TodoBody {
    /// An unscheduled todo.
    pub fn new(text: impl Into<String>, importance: Importance) -> Self {
        Self {
            text: text.into(),
            importance,
            scheduled_date: None,
            scheduled_time: None,
        }
    }

    pub fn scheduled(mut self, date: Option<NaiveDate>, time: Option<NaiveTime>) -> Self {
        self.scheduled_date = date;
        self.scheduled_time = time;
        self
    }

    pub fn is_important(&self) -> bool {
        self.importance == Importance::Important
    }

    /// Date and time combined, when both are set.
    pub fn scheduled_at(&self) -> Option<NaiveDateTime> {
        match (self.scheduled_date, self.scheduled_time) {
            (Some(date), Some(time)) => Some(date.and_time(time)),
            _ => None,
        }
    }
}

impl Payload for TodoBody {
    const STORAGE_KEY: &'static str = "todos";
    const PLACEMENT: Placement = Placement::Tail;
    const KIND: &'static str = "todo";

    fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(JotError::ValidationFailed {
                message: "todo text is empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Todos split by importance, each side in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoPartition {
    pub important: Vec<Todo>,
    pub normal: Vec<Todo>,
}

/// Splits `todos` into important and normal partitions.
pub fn partition_todos(todos: &[Todo]) -> TodoPartition {
    let (important, normal): (Vec<Todo>, Vec<Todo>) = todos
        .iter()
        .cloned()
        .partition(|todo| todo.payload().is_important());
    TodoPartition { important, normal }
}

// Dates and times are written as plain ISO-8601. Reading also accepts full
// RFC 3339 timestamps, which older builds stored for both fields.
mod iso_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use crate::parse_date;

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDate>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match value {
            Some(date) => serializer.serialize_str(&date.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Option<NaiveDate>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| parse_date(&raw).map_err(de::Error::custom))
            .transpose()
    }
}

mod iso_time {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use crate::parse_time;

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveTime>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match value {
            Some(time) => serializer.serialize_str(&time.format("%H:%M:%S").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Option<NaiveTime>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| parse_time(&raw).map_err(de::Error::custom))
            .transpose()
    }
}
