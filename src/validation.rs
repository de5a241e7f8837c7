use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::{Genre, MoviePatch, NewMovie};

pub const MIN_YEAR: i32 = 1888;
pub const DEFAULT_MAX_YEAR: i32 = 2024;

const MAX_TEXT_LEN: usize = 255;
const MAX_DURATION: i32 = 500;
const MAX_RATE: f64 = 10.0;
const MAX_GENRES: usize = 3;

const KNOWN_FIELDS: [&str; 8] =
    ["id", "title", "year", "director", "duration", "poster", "rate", "genre"];

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    Missing,
    WrongType,
    OutOfRange,
    NotInEnum,
    Length,
    InvalidUrl,
    UnknownField,
    Duplicate,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub reason: Reason,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, reason: Reason, message: impl Into<String>) -> Self {
        Self { field: field.to_string(), reason, message: message.into() }
    }
}

/// Every offending field of a rejected payload, in schema order.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn reason_for(&self, field: &str) -> Option<Reason> {
        self.0.iter().find(|e| e.field == field).map(|e| e.reason)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.iter().map(|e| e.field.as_str()).collect();
        write!(f, "invalid movie payload: {}", fields.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Schema checks for movie payloads. Pure: holds only the configured year cutoff.
#[derive(Clone, Copy, Debug)]
pub struct Validator {
    max_year: i32,
}

impl Default for Validator {
    fn default() -> Self {
        Self { max_year: DEFAULT_MAX_YEAR }
    }
}

impl Validator {
    pub fn new(max_year: i32) -> Self {
        Self { max_year }
    }

    /// Full-record validation. `rate` defaults to 0 when absent; a client `id` is ignored.
    pub fn validate_create(&self, payload: &Value) -> Result<NewMovie, ValidationErrors> {
        let (patch, mut errors) = self.check(payload)?;

        for (field, present) in [
            ("title", patch.title.is_some()),
            ("year", patch.year.is_some()),
            ("director", patch.director.is_some()),
            ("duration", patch.duration.is_some()),
            ("poster", patch.poster.is_some()),
            ("genre", patch.genre.is_some()),
        ] {
            let already_reported = errors.iter().any(|e| e.field == field);
            if !present && !already_reported {
                errors.push(FieldError::new(field, Reason::Missing, format!("{field} is required")));
            }
        }

        let (Some(title), Some(year), Some(director), Some(duration), Some(poster), Some(genre)) =
            (patch.title, patch.year, patch.director, patch.duration, patch.poster, patch.genre)
        else {
            return Err(ordered(errors));
        };
        if !errors.is_empty() {
            return Err(ordered(errors));
        }

        Ok(NewMovie {
            title,
            year,
            director,
            duration,
            poster,
            rate: patch.rate.unwrap_or(0.0),
            genre,
        })
    }

    /// Partial validation: every field optional, an empty object is a valid no-op.
    pub fn validate_update(&self, payload: &Value) -> Result<MoviePatch, ValidationErrors> {
        let (patch, errors) = self.check(payload)?;
        if errors.is_empty() { Ok(patch) } else { Err(ordered(errors)) }
    }

    fn check(&self, payload: &Value) -> Result<(MoviePatch, Vec<FieldError>), ValidationErrors> {
        let Some(object) = payload.as_object() else {
            return Err(ValidationErrors(vec![FieldError::new(
                "body",
                Reason::WrongType,
                "payload must be a JSON object",
            )]));
        };

        let mut errors = Vec::new();
        let mut patch = MoviePatch::default();

        patch.title = field(object, "title", &mut errors, text);
        patch.year = field(object, "year", &mut errors, |f, v| {
            integer(f, v, MIN_YEAR, self.max_year)
        });
        patch.director = field(object, "director", &mut errors, text);
        patch.duration = field(object, "duration", &mut errors, |f, v| {
            integer(f, v, 1, MAX_DURATION)
        });
        patch.poster = field(object, "poster", &mut errors, absolute_url);
        patch.rate = field(object, "rate", &mut errors, rating);
        patch.genre = field(object, "genre", &mut errors, genres);

        for key in object.keys() {
            if !KNOWN_FIELDS.contains(&key.as_str()) {
                errors.push(FieldError::new(key, Reason::UnknownField, format!("unknown field {key}")));
            }
        }

        Ok((patch, errors))
    }
}

fn field<T>(
    object: &Map<String, Value>,
    name: &str,
    errors: &mut Vec<FieldError>,
    parse: impl Fn(&str, &Value) -> Result<T, FieldError>,
) -> Option<T> {
    let value = object.get(name)?;
    match parse(name, value) {
        Ok(v) => Some(v),
        Err(err) => {
            errors.push(err);
            None
        },
    }
}

fn ordered(mut errors: Vec<FieldError>) -> ValidationErrors {
    let rank = |field: &str| {
        KNOWN_FIELDS.iter().position(|k| *k == field).unwrap_or(KNOWN_FIELDS.len())
    };
    errors.sort_by(|a, b| rank(&a.field).cmp(&rank(&b.field)).then_with(|| a.field.cmp(&b.field)));
    ValidationErrors(errors)
}

fn text(field: &str, value: &Value) -> Result<String, FieldError> {
    let Some(s) = value.as_str() else {
        return Err(FieldError::new(field, Reason::WrongType, format!("{field} must be a string")));
    };
    let len = s.chars().count();
    if len == 0 || len > MAX_TEXT_LEN {
        return Err(FieldError::new(
            field,
            Reason::Length,
            format!("{field} must be 1 to {MAX_TEXT_LEN} characters"),
        ));
    }
    Ok(s.to_string())
}

fn integer(field: &str, value: &Value, min: i32, max: i32) -> Result<i32, FieldError> {
    let wrong_type =
        || FieldError::new(field, Reason::WrongType, format!("{field} must be an integer"));
    let Some(n) = value.as_f64() else {
        return Err(wrong_type());
    };
    if n.fract() != 0.0 {
        return Err(wrong_type());
    }
    if n < f64::from(min) || n > f64::from(max) {
        return Err(FieldError::new(
            field,
            Reason::OutOfRange,
            format!("{field} must be between {min} and {max}"),
        ));
    }
    Ok(n as i32)
}

fn rating(field: &str, value: &Value) -> Result<f64, FieldError> {
    let Some(n) = value.as_f64().filter(|n| n.is_finite()) else {
        return Err(FieldError::new(field, Reason::WrongType, format!("{field} must be a number")));
    };
    if !(0.0..=MAX_RATE).contains(&n) {
        return Err(FieldError::new(
            field,
            Reason::OutOfRange,
            format!("{field} must be between 0 and {MAX_RATE}"),
        ));
    }
    Ok(n)
}

fn absolute_url(field: &str, value: &Value) -> Result<String, FieldError> {
    let Some(s) = value.as_str() else {
        return Err(FieldError::new(field, Reason::WrongType, format!("{field} must be a string")));
    };
    match url::Url::parse(s) {
        Ok(_) => Ok(s.to_string()),
        Err(err) => Err(FieldError::new(
            field,
            Reason::InvalidUrl,
            format!("{field} must be an absolute URL: {err}"),
        )),
    }
}

fn genres(field: &str, value: &Value) -> Result<Vec<Genre>, FieldError> {
    let Some(items) = value.as_array() else {
        return Err(FieldError::new(
            field,
            Reason::WrongType,
            format!("{field} must be an array of strings"),
        ));
    };
    if items.is_empty() || items.len() > MAX_GENRES {
        return Err(FieldError::new(
            field,
            Reason::Length,
            format!("{field} must contain 1 to {MAX_GENRES} values"),
        ));
    }

    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let Some(name) = item.as_str() else {
            return Err(FieldError::new(
                field,
                Reason::WrongType,
                format!("{field} must be an array of strings"),
            ));
        };
        let genre: Genre = name.parse().map_err(|_| {
            let allowed: Vec<&str> = Genre::ALL.iter().map(|g| g.as_str()).collect();
            FieldError::new(
                field,
                Reason::NotInEnum,
                format!("{name} is not one of {}", allowed.join(", ")),
            )
        })?;
        if out.contains(&genre) {
            return Err(FieldError::new(field, Reason::Duplicate, format!("{name} is listed twice")));
        }
        out.push(genre);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn arrival() -> Value {
        json!({
            "title": "Arrival",
            "year": 2016,
            "director": "Denis Villeneuve",
            "duration": 116,
            "poster": "https://example.com/a.jpg",
            "genre": ["Sci-Fi", "Drama"]
        })
    }

    #[test]
    fn create_defaults_rate_to_zero() {
        let movie = Validator::default().validate_create(&arrival()).unwrap();
        assert_eq!(movie.rate, 0.0);
        assert_eq!(movie.genre, vec![Genre::SciFi, Genre::Drama]);
    }

    #[test]
    fn create_reports_missing_title() {
        let mut payload = arrival();
        payload.as_object_mut().unwrap().remove("title");

        let err = Validator::default().validate_create(&payload).unwrap_err();
        assert_eq!(err.reason_for("title"), Some(Reason::Missing));
        assert_eq!(err.errors().len(), 1);
    }

    #[test]
    fn create_rejects_year_before_first_film() {
        let mut payload = arrival();
        payload["year"] = json!(1850);

        let err = Validator::default().validate_create(&payload).unwrap_err();
        assert_eq!(err.reason_for("year"), Some(Reason::OutOfRange));
    }

    #[test]
    fn year_cutoff_is_configurable() {
        let mut payload = arrival();
        payload["year"] = json!(2030);

        assert!(Validator::default().validate_create(&payload).is_err());
        assert!(Validator::new(2030).validate_create(&payload).is_ok());
    }

    #[test]
    fn create_collects_every_offending_field_in_schema_order() {
        let payload = json!({
            "title": "",
            "year": "2016",
            "director": "Someone",
            "duration": 0,
            "poster": "not a url",
            "rate": 11,
            "genre": ["Horror"],
            "studio": "A24"
        });

        let err = Validator::default().validate_create(&payload).unwrap_err();
        let got: Vec<(&str, Reason)> =
            err.errors().iter().map(|e| (e.field.as_str(), e.reason)).collect();
        assert_eq!(
            got,
            vec![
                ("title", Reason::Length),
                ("year", Reason::WrongType),
                ("duration", Reason::OutOfRange),
                ("poster", Reason::InvalidUrl),
                ("rate", Reason::OutOfRange),
                ("genre", Reason::NotInEnum),
                ("studio", Reason::UnknownField),
            ]
        );
    }

    #[test]
    fn integers_reject_fractions_but_accept_integral_floats() {
        let mut payload = arrival();
        payload["duration"] = json!(116.5);
        let err = Validator::default().validate_create(&payload).unwrap_err();
        assert_eq!(err.reason_for("duration"), Some(Reason::WrongType));

        payload["duration"] = json!(116.0);
        assert_eq!(Validator::default().validate_create(&payload).unwrap().duration, 116);
    }

    #[test]
    fn genre_set_bounds() {
        let v = Validator::default();
        let mut payload = arrival();

        payload["genre"] = json!([]);
        assert_eq!(v.validate_create(&payload).unwrap_err().reason_for("genre"), Some(Reason::Length));

        payload["genre"] = json!(["Drama", "Action", "Crime", "Fantasy"]);
        assert_eq!(v.validate_create(&payload).unwrap_err().reason_for("genre"), Some(Reason::Length));

        payload["genre"] = json!(["Drama", "Drama"]);
        assert_eq!(
            v.validate_create(&payload).unwrap_err().reason_for("genre"),
            Some(Reason::Duplicate)
        );

        payload["genre"] = json!("Drama");
        assert_eq!(
            v.validate_create(&payload).unwrap_err().reason_for("genre"),
            Some(Reason::WrongType)
        );
    }

    #[test]
    fn rate_bounds_are_inclusive() {
        let v = Validator::default();
        for rate in [0.0, 10.0, 7.3] {
            let mut payload = arrival();
            payload["rate"] = json!(rate);
            assert_eq!(v.validate_create(&payload).unwrap().rate, rate);
        }
    }

    #[test]
    fn update_accepts_empty_payload() {
        let patch = Validator::default().validate_update(&json!({})).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn update_keeps_only_present_fields() {
        let patch = Validator::default().validate_update(&json!({ "rate": 8.5 })).unwrap();
        assert_eq!(patch, MoviePatch { rate: Some(8.5), ..Default::default() });
    }

    #[test]
    fn update_ignores_client_id_and_rejects_unknown_fields() {
        let v = Validator::default();
        let patch = v.validate_update(&json!({ "id": "other", "title": "Dune" })).unwrap();
        assert_eq!(patch.title.as_deref(), Some("Dune"));

        let err = v.validate_update(&json!({ "budget": 10 })).unwrap_err();
        assert_eq!(err.reason_for("budget"), Some(Reason::UnknownField));
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let err = Validator::default().validate_update(&json!([1, 2])).unwrap_err();
        assert_eq!(err.reason_for("body"), Some(Reason::WrongType));
    }

    #[test]
    fn validation_is_deterministic() {
        let payload = json!({ "year": 3000, "genre": [] });
        let v = Validator::default();
        assert_eq!(v.validate_create(&payload), v.validate_create(&payload));
    }
}
