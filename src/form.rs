//! The travel-requirements form.
//!
//! [`TravelForm`] holds raw user input; [`TravelForm::validate`] turns it
//! into the typed [`TravelRequirements`] body of `POST /plan_travel`.

use chrono::{Days, NaiveDate};
use itertools::Itertools;
use nonempty::NonEmpty;
use serde::Serialize;
use thiserror::Error;

/// Defaults for empty selections. These land in the backend's prompt, which
/// is written in Chinese, so they are sent as the backend expects them.
pub const DEFAULT_TRANSPORTATION: &str = "公共交通";
pub const DEFAULT_DIETARY: &str = "无特殊要求";

/// Days between the default start and end dates.
const DEFAULT_TRIP_DAYS: u64 = 7;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid date for {field}: {value}")]
    InvalidDate { field: &'static str, value: String },

    #[error("Budget must be a positive whole number, got: {0}")]
    InvalidBudget(String),

    #[error("End date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("Select at least one travel preference")]
    NoPreferences,
}

/// Raw form input, as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TravelForm {
    pub source: String,
    pub destination: String,
    pub start_date: String,
    pub end_date: String,
    pub budget: String,
    pub accommodation_type: String,
    pub preferences: Vec<String>,
    pub transportation_mode: Vec<String>,
    pub dietary_restrictions: Vec<String>,
}

impl TravelForm {
    /// Form with the dates pre-filled: departure tomorrow, return a week later.
    pub fn with_default_dates(today: NaiveDate) -> Self {
        let start = today + Days::new(1);
        let end = start + Days::new(DEFAULT_TRIP_DAYS);
        Self {
            start_date: start.format(DATE_FORMAT).to_string(),
            end_date: end.format(DATE_FORMAT).to_string(),
            ..Self::default()
        }
    }

    /// Change the start date, pulling the end date up if it would fall before it.
    pub fn set_start_date(&mut self, date: impl Into<String>) {
        self.start_date = date.into();
        self.clamp_end_date();
    }

    /// Move the end date up to the start date when it is earlier.
    pub fn clamp_end_date(&mut self) {
        if let (Ok(start), Ok(end)) = (parse_date(&self.start_date), parse_date(&self.end_date)) {
            if end < start {
                self.end_date = self.start_date.clone();
            }
        }
    }

    pub fn toggle_preference(&mut self, preference: &str) {
        toggle(&mut self.preferences, preference);
    }

    pub fn toggle_transportation(&mut self, mode: &str) {
        toggle(&mut self.transportation_mode, mode);
    }

    pub fn toggle_dietary(&mut self, restriction: &str) {
        toggle(&mut self.dietary_restrictions, restriction);
    }

    /// Check the form and build the request.
    ///
    /// # Example
    /// ```
    /// use travel_chat::form::TravelForm;
    ///
    /// let form = TravelForm {
    ///     source: "Beijing".into(),
    ///     destination: "Hangzhou".into(),
    ///     start_date: "2025-05-01".into(),
    ///     end_date: "2025-05-04".into(),
    ///     budget: "5000".into(),
    ///     accommodation_type: "hotel".into(),
    ///     preferences: vec!["food".into()],
    ///     ..TravelForm::default()
    /// };
    /// let requirements = form.validate().unwrap();
    /// assert_eq!(requirements.budget, 5000);
    /// assert_eq!(requirements.transportation_mode.head, "公共交通");
    /// ```
    pub fn validate(&self) -> Result<TravelRequirements, ValidationError> {
        let source = required("source", &self.source)?;
        let destination = required("destination", &self.destination)?;
        let start_raw = required("start_date", &self.start_date)?;
        let end_raw = required("end_date", &self.end_date)?;
        let budget_raw = required("budget", &self.budget)?;
        let accommodation_type = required("accommodation_type", &self.accommodation_type)?;

        let start_date = parse_date(&start_raw).map_err(|_| ValidationError::InvalidDate {
            field: "start_date",
            value: start_raw.clone(),
        })?;
        let end_date = parse_date(&end_raw).map_err(|_| ValidationError::InvalidDate {
            field: "end_date",
            value: end_raw.clone(),
        })?;
        if end_date < start_date {
            return Err(ValidationError::EndBeforeStart {
                start: start_date,
                end: end_date,
            });
        }

        let budget = budget_raw
            .parse::<u32>()
            .ok()
            .filter(|b| *b > 0)
            .ok_or_else(|| ValidationError::InvalidBudget(budget_raw.clone()))?;

        let preferences =
            NonEmpty::from_vec(cleaned(&self.preferences)).ok_or(ValidationError::NoPreferences)?;
        let transportation_mode = NonEmpty::from_vec(cleaned(&self.transportation_mode))
            .unwrap_or_else(|| NonEmpty::new(DEFAULT_TRANSPORTATION.to_string()));
        let dietary_restrictions = NonEmpty::from_vec(cleaned(&self.dietary_restrictions))
            .unwrap_or_else(|| NonEmpty::new(DEFAULT_DIETARY.to_string()));

        Ok(TravelRequirements {
            source,
            destination,
            start_date,
            end_date,
            budget,
            accommodation_type,
            preferences,
            transportation_mode,
            dietary_restrictions,
        })
    }
}

/// Validated body of `POST /plan_travel`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TravelRequirements {
    pub source: String,
    pub destination: String,

    /// Serialized as `YYYY-MM-DD`
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    /// Whole currency units
    pub budget: u32,
    pub accommodation_type: String,
    pub preferences: NonEmpty<String>,
    pub transportation_mode: NonEmpty<String>,
    pub dietary_restrictions: NonEmpty<String>,
}

impl TravelRequirements {
    /// Trip length in days, both ends included.
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

/// The Markdown summary shown as the user's message for a plan request.
pub fn format_travel_request(requirements: &TravelRequirements) -> String {
    format!(
        "🧳 **Travel planning request**\n\n\
         **Basics:**\n\
         - 📍 From: {}\n\
         - 🎯 To: {}\n\
         - 📅 Dates: {} to {}\n\
         - 💰 Budget: ¥{}\n\
         - 🏨 Accommodation: {}\n\n\
         **Preferences:** {}\n\
         **Transportation:** {}\n\
         **Dietary requirements:** {}",
        requirements.source,
        requirements.destination,
        requirements.start_date.format(DATE_FORMAT),
        requirements.end_date.format(DATE_FORMAT),
        requirements.budget,
        requirements.accommodation_type,
        requirements.preferences.iter().join(", "),
        requirements.transportation_mode.iter().join(", "),
        requirements.dietary_restrictions.iter().join(", "),
    )
}

fn parse_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
}

fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(value.to_string())
}

fn cleaned(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unique()
        .collect()
}

fn toggle(values: &mut Vec<String>, value: &str) {
    if let Some(pos) = values.iter().position(|v| v == value) {
        values.remove(pos);
    } else {
        values.push(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filled() -> TravelForm {
        TravelForm {
            source: "Beijing".to_string(),
            destination: "Xi'an".to_string(),
            start_date: "2025-05-01".to_string(),
            end_date: "2025-05-05".to_string(),
            budget: "8000".to_string(),
            accommodation_type: "boutique hotel".to_string(),
            preferences: vec!["history".to_string(), "food".to_string()],
            ..TravelForm::default()
        }
    }

    #[test]
    fn test_default_dates() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 30).unwrap();
        let form = TravelForm::with_default_dates(today);
        assert_eq!(form.start_date, "2025-01-31");
        assert_eq!(form.end_date, "2025-02-07");
    }

    #[test]
    fn test_start_date_pulls_end_date_up() {
        let mut form = filled();
        form.set_start_date("2025-05-10");
        assert_eq!(form.end_date, "2025-05-10");

        form.set_start_date("2025-05-02");
        assert_eq!(form.end_date, "2025-05-10");
    }

    #[test]
    fn test_validate_fills_defaults() {
        let requirements = filled().validate().unwrap();
        assert_eq!(requirements.budget, 8000);
        assert_eq!(requirements.days(), 5);
        assert_eq!(
            requirements.transportation_mode,
            NonEmpty::new(DEFAULT_TRANSPORTATION.to_string())
        );
        assert_eq!(
            requirements.dietary_restrictions,
            NonEmpty::new(DEFAULT_DIETARY.to_string())
        );
    }

    #[test]
    fn test_validate_errors() {
        let mut form = filled();
        form.destination = "  ".to_string();
        assert_eq!(form.validate(), Err(ValidationError::MissingField("destination")));

        let mut form = filled();
        form.budget = "0".to_string();
        assert_eq!(form.validate(), Err(ValidationError::InvalidBudget("0".to_string())));

        let mut form = filled();
        form.budget = "lots".to_string();
        assert!(matches!(form.validate(), Err(ValidationError::InvalidBudget(_))));

        let mut form = filled();
        form.preferences.clear();
        assert_eq!(form.validate(), Err(ValidationError::NoPreferences));

        let mut form = filled();
        form.end_date = "2025-04-30".to_string();
        assert!(matches!(form.validate(), Err(ValidationError::EndBeforeStart { .. })));

        let mut form = filled();
        form.start_date = "05/01/2025".to_string();
        assert!(matches!(
            form.validate(),
            Err(ValidationError::InvalidDate { field: "start_date", .. })
        ));
    }

    #[test]
    fn test_wire_format() {
        let mut form = filled();
        form.toggle_transportation("high-speed rail");
        let body = serde_json::to_value(form.validate().unwrap()).unwrap();

        assert_eq!(
            body,
            json!({
                "source": "Beijing",
                "destination": "Xi'an",
                "start_date": "2025-05-01",
                "end_date": "2025-05-05",
                "budget": 8000,
                "accommodation_type": "boutique hotel",
                "preferences": ["history", "food"],
                "transportation_mode": ["high-speed rail"],
                "dietary_restrictions": ["无特殊要求"]
            })
        );
    }

    #[test]
    fn test_toggle() {
        let mut form = TravelForm::default();
        form.toggle_preference("food");
        form.toggle_preference("art");
        form.toggle_preference("food");
        assert_eq!(form.preferences, vec!["art".to_string()]);
    }

    #[test]
    fn test_format_travel_request() {
        let summary = format_travel_request(&filled().validate().unwrap());
        assert!(summary.contains("From: Beijing"));
        assert!(summary.contains("2025-05-01 to 2025-05-05"));
        assert!(summary.contains("**Preferences:** history, food"));
        assert!(summary.contains("**Dietary requirements:** 无特殊要求"));
    }
}
