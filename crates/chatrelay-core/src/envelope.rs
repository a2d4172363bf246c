//! Uniform response envelope
//!
//! Every relay entry point answers with an [`Envelope`]. Errors are folded
//! into [`Envelope::Fail`] so nothing else crosses the module boundary.

use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Outcome tag as it appears on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseStatus {
    Success,
    Fail,
}

/// Success/failure envelope
///
/// Serializes as `{"status": "Success"|"Fail", "message": string|null, "data": T|null}`.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T> {
    Success(T),
    Fail(String),
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Envelope::Success(data)
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Envelope::Fail(message.into())
    }

    pub fn status(&self) -> ResponseStatus {
        match self {
            Envelope::Success(_) => ResponseStatus::Success,
            Envelope::Fail(_) => ResponseStatus::Fail,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Envelope::Success(data) => Some(data),
            Envelope::Fail(_) => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Envelope::Success(_) => None,
            Envelope::Fail(message) => Some(message),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Envelope<U> {
        match self {
            Envelope::Success(data) => Envelope::Success(f(data)),
            Envelope::Fail(message) => Envelope::Fail(message),
        }
    }
}

impl<T, E: fmt::Display> From<Result<T, E>> for Envelope<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Envelope::Success(data),
            Err(e) => Envelope::Fail(e.to_string()),
        }
    }
}

impl<T: Serialize> Serialize for Envelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Envelope", 3)?;
        state.serialize_field("status", &self.status())?;
        match self {
            Envelope::Success(data) => {
                state.serialize_field("message", &Option::<&str>::None)?;
                state.serialize_field("data", data)?;
            }
            Envelope::Fail(message) => {
                state.serialize_field("message", message)?;
                state.serialize_field("data", &Option::<&T>::None)?;
            }
        }
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_wire_shape() {
        let env = Envelope::success(json!({"url": "https://img"}));
        assert_eq!(
            serde_json::to_value(&env).unwrap(),
            json!({"status": "Success", "message": null, "data": {"url": "https://img"}})
        );
    }

    #[test]
    fn test_fail_wire_shape() {
        let env: Envelope<String> = Envelope::fail("Message is empty");
        assert_eq!(
            serde_json::to_value(&env).unwrap(),
            json!({"status": "Fail", "message": "Message is empty", "data": null})
        );
    }

    #[test]
    fn test_from_result() {
        let ok: Envelope<u32> = Ok::<_, String>(7).into();
        assert_eq!(ok.data(), Some(&7));

        let err: Envelope<u32> = Err::<u32, _>("boom").into();
        assert_eq!(err.message(), Some("boom"));
        assert_eq!(err.status(), ResponseStatus::Fail);
    }

    #[test]
    fn test_map_keeps_failure() {
        let env: Envelope<u32> = Envelope::fail("nope");
        let mapped = env.map(|n| n * 2);
        assert_eq!(mapped, Envelope::Fail("nope".to_string()));
    }
}
