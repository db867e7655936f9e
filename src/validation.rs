use std::sync::LazyLock;

use regex::Regex;
use validator::{Validate, ValidationErrors};

use crate::error::{AppError, FieldErrors};
use crate::models::GuestInfo;

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9][0-9 ()\-]{6,19}$").expect("phone pattern compiles"));

static REFERENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]{8}$").expect("reference pattern compiles"));

pub fn is_booking_reference(candidate: &str) -> bool {
    REFERENCE_RE.is_match(candidate)
}

fn camel_case(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper = false;
    for c in snake.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

pub fn push(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors.entry(field.to_owned()).or_default().push(message.into());
}

/// Flatten `validator` output into the response shape, keys in camelCase
/// under `prefix`.
pub fn field_errors(prefix: &str, errors: &ValidationErrors) -> FieldErrors {
    let mut out = FieldErrors::new();
    for (field, errs) in errors.field_errors() {
        let name: &str = &field;
        let key = format!("{}{}", prefix, camel_case(name));
        for err in errs.iter() {
            let message = match &err.message {
                Some(m) => m.to_string(),
                None => format!("The {} field is invalid ({}).", key, err.code),
            };
            push(&mut out, &key, message);
        }
    }
    out
}

/// Move validation failures from `result` into `errors`; anything else is a
/// real failure and is returned as is.
pub fn absorb<T>(errors: &mut FieldErrors, result: Result<T, AppError>) -> Result<Option<T>, AppError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(AppError::Validation(found)) => {
            for (field, messages) in found {
                errors.entry(field).or_default().extend(messages);
            }
            Ok(None)
        }
        Err(other) => Err(other),
    }
}

pub fn finish(errors: FieldErrors) -> Result<(), AppError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

fn require(errors: &mut FieldErrors, key: &str, label: &str, value: &str) {
    if value.trim().is_empty() {
        push(errors, key, format!("The {} field is required.", label));
    }
}

/// Presence is checked here; `validator` only carries the format and length
/// rules, so each failure keeps its own message.
pub fn check_guest_info(info: &GuestInfo) -> Result<(), AppError> {
    let mut errors = match info.validate() {
        Ok(()) => FieldErrors::new(),
        Err(e) => field_errors("guestInfo.", &e),
    };
    require(&mut errors, "guestInfo.fullName", "full name", &info.full_name);
    require(&mut errors, "guestInfo.phone", "phone", &info.phone);
    require(&mut errors, "guestInfo.address", "address", &info.address);
    if !info.phone.trim().is_empty() && !PHONE_RE.is_match(info.phone.trim()) {
        push(
            &mut errors,
            "guestInfo.phone",
            "The phone must be a valid phone number.",
        );
    }
    finish(errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> GuestInfo {
        GuestInfo {
            full_name: "Maria Santos".into(),
            email: "maria@example.com".into(),
            phone: "+63 917 123 4567".into(),
            address: "12 Rizal Ave, Manila".into(),
            special_requests: Some("Late check-in".into()),
        }
    }

    #[test]
    fn camel_cases_field_names() {
        assert_eq!(camel_case("full_name"), "fullName");
        assert_eq!(camel_case("special_requests"), "specialRequests");
        assert_eq!(camel_case("email"), "email");
    }

    #[test]
    fn accepts_well_formed_guest() {
        assert!(check_guest_info(&info()).is_ok());
    }

    #[test]
    fn reports_every_bad_guest_field() {
        let mut bad = info();
        bad.full_name.clear();
        bad.email = "nope".into();
        bad.phone = "call me".into();
        match check_guest_info(&bad) {
            Err(AppError::Validation(errors)) => {
                assert!(errors.contains_key("guestInfo.fullName"));
                assert!(errors.contains_key("guestInfo.email"));
                assert!(errors.contains_key("guestInfo.phone"));
                assert!(!errors.contains_key("guestInfo.address"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn blank_and_overlong_fields_get_distinct_messages() {
        let mut bad = info();
        bad.full_name = "   ".into();
        bad.address = "x".repeat(501);
        match check_guest_info(&bad) {
            Err(AppError::Validation(errors)) => {
                assert_eq!(errors["guestInfo.fullName"], vec!["The full name field is required.".to_owned()]);
                assert_eq!(
                    errors["guestInfo.address"],
                    vec!["The address may not be greater than 500 characters.".to_owned()]
                );
            }
            other => panic!("unexpected {other:?}"),
        }

        let mut long_name = info();
        long_name.full_name = "M".repeat(300);
        match check_guest_info(&long_name) {
            Err(AppError::Validation(errors)) => assert_eq!(
                errors["guestInfo.fullName"],
                vec!["The full name may not be greater than 255 characters.".to_owned()]
            ),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn recognises_references() {
        assert!(is_booking_reference("AB12CD34"));
        assert!(!is_booking_reference("ab12cd34"));
        assert!(!is_booking_reference("AB12CD3"));
        assert!(!is_booking_reference("AB12CD34X"));
    }

    #[test]
    fn absorb_keeps_non_validation_errors() {
        let mut errors = FieldErrors::new();
        let kept = absorb::<()>(&mut errors, Err(AppError::field("adults", "too few"))).unwrap();
        assert!(kept.is_none());
        assert_eq!(errors["adults"], vec!["too few".to_owned()]);

        let real = absorb::<()>(&mut errors, Err(AppError::RoomNotFound(3)));
        assert!(matches!(real, Err(AppError::RoomNotFound(3))));
    }
}
