use super::ValidationErrors;
use crate::models::{Category, NewUser};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

pub const MIN_AGE: i64 = 8;
pub const MAX_AGE: i64 = 120;

lazy_static! {
    /// `local@domain.tld`, no whitespace, exactly one `@`
    static ref EMAIL_SHAPE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

type Check = fn(Option<&Value>) -> Result<(), String>;

/// A named predicate over one field of the payload.
struct Rule {
    field: &'static str,
    check: Check,
}

// Order matters only within a field: the first failing rule supplies the message.
const RULES: &[Rule] = &[
    Rule { field: "name", check: name_required },
    Rule { field: "email", check: email_required },
    Rule { field: "email", check: email_shape },
    Rule { field: "age", check: age_whole_number },
    Rule { field: "age", check: age_at_least_min },
    Rule { field: "age", check: age_at_most_max },
    Rule { field: "category", check: category_known },
];

/// Validates a sanitized payload and normalizes it into a [`NewUser`].
///
/// All rules are evaluated; on failure the returned [`ValidationErrors`] holds
/// one message per offending field. On success `name` is trimmed, `email` is
/// trimmed and lowercased, and `created_at` is set to `now`.
pub fn validate_user(payload: &Value, now: DateTime<Utc>) -> Result<NewUser, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    for rule in RULES {
        if errors.get(rule.field).is_some() {
            continue;
        }
        if let Err(message) = (rule.check)(field(payload, rule.field)) {
            errors.add(rule.field, message);
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let text = |name: &str| {
        field(payload, name)
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default()
    };

    Ok(NewUser {
        name: text("name").to_string(),
        email: text("email").to_lowercase(),
        age: field(payload, "age")
            .and_then(whole_number)
            .and_then(|age| i32::try_from(age).ok()),
        category: field(payload, "category")
            .and_then(Value::as_str)
            .and_then(|raw| raw.parse().ok()),
        created_at: now,
    })
}

/// Looks up a top-level field, treating explicit `null` as absent.
fn field<'a>(payload: &'a Value, name: &str) -> Option<&'a Value> {
    payload.get(name).filter(|value| !value.is_null())
}

fn non_blank(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn whole_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn name_required(value: Option<&Value>) -> Result<(), String> {
    non_blank(value)
        .map(|_| ())
        .ok_or_else(|| "Name is required".to_string())
}

fn email_required(value: Option<&Value>) -> Result<(), String> {
    non_blank(value)
        .map(|_| ())
        .ok_or_else(|| "Email is required".to_string())
}

fn email_shape(value: Option<&Value>) -> Result<(), String> {
    match non_blank(value) {
        Some(email) if !EMAIL_SHAPE.is_match(email) => {
            Err(format!("{} is not a valid email", email))
        }
        _ => Ok(()),
    }
}

fn age_whole_number(value: Option<&Value>) -> Result<(), String> {
    match value {
        Some(age) if whole_number(age).is_none() => Err("Age must be a whole number".to_string()),
        _ => Ok(()),
    }
}

fn age_at_least_min(value: Option<&Value>) -> Result<(), String> {
    match value.and_then(whole_number) {
        Some(age) if age < MIN_AGE => Err(format!("Age must be at least {}", MIN_AGE)),
        _ => Ok(()),
    }
}

fn age_at_most_max(value: Option<&Value>) -> Result<(), String> {
    match value.and_then(whole_number) {
        Some(age) if age > MAX_AGE => Err(format!("Age must be at most {}", MAX_AGE)),
        _ => Ok(()),
    }
}

fn category_known(value: Option<&Value>) -> Result<(), String> {
    let Some(value) = value else {
        return Ok(());
    };
    match value.as_str() {
        Some(raw) if raw.parse::<Category>().is_ok() => Ok(()),
        Some(raw) => Err(format!("{} is not a valid category", raw)),
        None => Err(format!("{} is not a valid category", value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn test_valid_payload_is_normalized() {
        let at = now();
        let user = validate_user(
            &json!({
                "name": "  Ada Lovelace ",
                "email": " Ada@Example.COM ",
                "age": 36,
                "category": "professional"
            }),
            at,
        )
        .unwrap();

        assert_eq!(user.name, "Ada Lovelace");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.age, Some(36));
        assert_eq!(user.category, Some(Category::Professional));
        assert_eq!(user.created_at, at);
    }

    #[test]
    fn test_optional_fields_may_be_absent_or_null() {
        let user =
            validate_user(&json!({ "name": "A", "email": "a@b.com", "age": null }), now()).unwrap();
        assert_eq!(user.age, None);
        assert_eq!(user.category, None);
    }

    #[test]
    fn test_empty_name_rejected() {
        let errors = validate_user(&json!({ "name": "", "email": "a@b.com" }), now()).unwrap_err();
        assert_eq!(errors.get("name"), Some("Name is required"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_missing_email_reports_required() {
        let errors = validate_user(&json!({ "name": "A" }), now()).unwrap_err();
        assert_eq!(errors.get("email"), Some("Email is required"));
    }

    #[test]
    fn test_malformed_email_reports_shape() {
        let errors = validate_user(&json!({ "name": "A", "email": "not-an-email" }), now())
            .unwrap_err();
        assert_eq!(errors.get("email"), Some("not-an-email is not a valid email"));

        for bad in ["a@b", "a b@c.com", "a@@b.com", "@b.com"] {
            let errors = validate_user(&json!({ "name": "A", "email": bad }), now()).unwrap_err();
            assert!(errors.get("email").is_some(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_age_bounds() {
        let young = validate_user(&json!({ "name": "A", "email": "a@b.com", "age": 7 }), now())
            .unwrap_err();
        assert_eq!(young.get("age"), Some("Age must be at least 8"));

        let old = validate_user(&json!({ "name": "A", "email": "a@b.com", "age": 121 }), now())
            .unwrap_err();
        assert_eq!(old.get("age"), Some("Age must be at most 120"));

        for ok in [8, 120] {
            assert!(
                validate_user(&json!({ "name": "A", "email": "a@b.com", "age": ok }), now())
                    .is_ok()
            );
        }
    }

    #[test]
    fn test_age_must_be_whole_number() {
        let errors =
            validate_user(&json!({ "name": "A", "email": "a@b.com", "age": 30.5 }), now())
                .unwrap_err();
        assert_eq!(errors.get("age"), Some("Age must be a whole number"));

        let errors =
            validate_user(&json!({ "name": "A", "email": "a@b.com", "age": "old" }), now())
                .unwrap_err();
        assert_eq!(errors.get("age"), Some("Age must be a whole number"));

        let user = validate_user(&json!({ "name": "A", "email": "a@b.com", "age": "42" }), now())
            .unwrap();
        assert_eq!(user.age, Some(42));
    }

    #[test]
    fn test_unknown_category_names_value() {
        let errors = validate_user(
            &json!({ "name": "A", "email": "a@b.com", "category": "wizard" }),
            now(),
        )
        .unwrap_err();
        assert_eq!(errors.get("category"), Some("wizard is not a valid category"));
    }

    #[test]
    fn test_all_violations_collected() {
        let errors = validate_user(
            &json!({ "name": " ", "email": "nope", "age": 200, "category": 3 }),
            now(),
        )
        .unwrap_err();

        assert_eq!(errors.len(), 4);
        assert_eq!(errors.get("name"), Some("Name is required"));
        assert_eq!(errors.get("email"), Some("nope is not a valid email"));
        assert_eq!(errors.get("age"), Some("Age must be at most 120"));
        assert_eq!(errors.get("category"), Some("3 is not a valid category"));
    }

    #[test]
    fn test_non_object_payload_reports_required_fields() {
        let errors = validate_user(&json!(["a", "b"]), now()).unwrap_err();
        assert_eq!(errors.get("name"), Some("Name is required"));
        assert_eq!(errors.get("email"), Some("Email is required"));
    }
}
