use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    pub age: i32,
    /// Absent when the read path does not project the column.
    #[serde(default)]
    pub interesting_dates: Option<Vec<DateTime<Utc>>>,
}

impl Person {
    pub fn new(
        name: impl Into<String>,
        age: i32,
        interesting_dates: Option<Vec<DateTime<Utc>>>,
    ) -> Self {
        Self {
            name: name.into(),
            age,
            interesting_dates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_without_dates() {
        let person: Person = serde_json::from_str(r#"{"name": "Chris", "age": 29}"#).unwrap();
        assert_eq!(person, Person::new("Chris", 29, None));
    }
}
