//! Free-form notes.
use std::fmt;

use chrono::{Datelike, Local, Timelike};
use serde::{Deserialize, Serialize};

use crate::{JotError, Payload, Placement, Record, Result};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// A note as held in the store.
pub type Note = Record<NoteBody>;

/// Wall-clock components captured when a note is saved or edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamp {
    pub day: u32,
    /// 1-based month, persisted as its short name ("Oct")
    #[serde(with = "month_serde")]
    pub month: u32,
    pub hour: u32,
    pub minutes: u32,
}

impl Stamp {
    /// Captures the current local time.
    pub fn now() -> Self {
        let now = Local::now();
        Self {
            day: now.day(),
            month: now.month(),
            hour: now.hour(),
            minutes: now.minute(),
        }
    }

    fn month_name(&self) -> &'static str {
        month_name(self.month).unwrap_or("???")
    }
}

fn month_name(month: u32) -> Option<&'static str> {
    month
        .checked_sub(1)
        .and_then(|i| MONTHS.get(i as usize))
        .copied()
}

/// Writes the month as its short name. Reads either the name or a 1-based
/// number.
mod month_serde {
    use std::fmt;

    use serde::{de, Deserializer, Serializer};

    use super::{month_name, MONTHS};

    pub fn serialize<S: Serializer>(month: &u32, serializer: S) -> Result<S::Ok, S::Error> {
        match month_name(*month) {
            Some(name) => serializer.serialize_str(name),
            None => serializer.serialize_u32(*month),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        deserializer.deserialize_any(MonthVisitor)
    }

    struct MonthVisitor;

    impl<'de> de::Visitor<'de> for MonthVisitor {
        type Value = u32;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a month name like \"Oct\" or a month number")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u32, E> {
            u32::try_from(v).map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u32, E> {
            MONTHS
                .iter()
                .position(|name| name.eq_ignore_ascii_case(v.trim()))
                .map(|i| i as u32 + 1)
                .ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}, {}:{:02}",
            self.day,
            self.month_name(),
            self.hour,
            self.minutes
        )
    }
}

/// Note content. Either the title or the text may be empty, not both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteBody {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "time")]
    pub stamp: Stamp,
    #[serde(default)]
    pub text: String,
}

impl NoteBody {
    /// Creates a note body stamped with the current time.
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            stamp: Stamp::now(),
            text: text.into(),
        }
    }

    /// The message handed to a share sheet: title, newline, text.
    pub fn share_text(&self) -> String {
        format!("{}\n{}", self.title, self.text)
    }

    /// Case-insensitive substring match on title or text.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query) || self.text.to_lowercase().contains(&query)
    }
}

impl Payload for NoteBody {
    const STORAGE_KEY: &'static str = "notes";
    const PLACEMENT: Placement = Placement::Head;
    const KIND: &'static str = "note";

    fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() && self.text.trim().is_empty() {
            return Err(JotError::ValidationFailed {
                message: "note title and text are both empty".to_string(),
            });
        }
        Ok(())
    }
}
