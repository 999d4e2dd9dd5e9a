use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{MessageError, Result};

/// A request identifier: either a JSON integer or a JSON string.
///
/// The variant records which kind arrived on the wire so the response echoes
/// it back unchanged: `1` stays `1`, `"1"` stays `"1"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Id {
    Number(i64),
    Text(String),
}

impl Id {
    /// Decode an identifier from its raw JSON bytes.
    ///
    /// A leading `"` selects the string form; anything else must be an
    /// integer literal.
    pub fn decode(raw: &[u8]) -> Result<Self> {
        match raw.first() {
            None => Err(MessageError::EmptyId),
            Some(b'"') => Ok(Id::Text(serde_json::from_slice::<String>(raw)?)),
            Some(_) => Ok(Id::Number(serde_json::from_slice::<i64>(raw)?)),
        }
    }

    /// Encode the identifier as JSON bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Id::Number(_))
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Number(n) => write!(f, "{n}"),
            Id::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Id {
    fn from(value: i64) -> Self {
        Id::Number(value)
    }
}

impl From<i32> for Id {
    fn from(value: i32) -> Self {
        Id::Number(value.into())
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Id::Text(value.to_string())
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Id::Text(value)
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Id::Number(n) => serializer.serialize_i64(*n),
            Id::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(IdVisitor)
    }
}

struct IdVisitor;

impl Visitor<'_> for IdVisitor {
    type Value = Id;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or integer id")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Id, E> {
        Ok(Id::Number(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Id, E> {
        i64::try_from(v)
            .map(Id::Number)
            .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Id, E> {
        Ok(Id::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Id, E> {
        Ok(Id::Text(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_roundtrips_as_number() {
        let id = Id::decode(b"42").unwrap();
        assert_eq!(id, Id::Number(42));
        assert!(id.is_number());
        assert_eq!(id.encode().unwrap(), b"42");
    }

    #[test]
    fn negative_integer_roundtrips() {
        let id = Id::decode(b"-7").unwrap();
        assert_eq!(id.encode().unwrap(), b"-7");
    }

    #[test]
    fn string_roundtrips_as_string() {
        let id = Id::decode(br#""42""#).unwrap();
        assert_eq!(id, Id::Text("42".to_string()));
        assert!(!id.is_number());
        assert_eq!(id.encode().unwrap(), br#""42""#);
    }

    #[test]
    fn escaped_string_is_unescaped() {
        let id = Id::decode(br#""a\"b""#).unwrap();
        assert_eq!(id, Id::Text("a\"b".to_string()));
        assert_eq!(id.encode().unwrap(), br#""a\"b""#);
    }

    #[test]
    fn empty_input_rejected() {
        assert!(matches!(Id::decode(b""), Err(MessageError::EmptyId)));
    }

    #[test]
    fn non_integer_rejected() {
        assert!(matches!(Id::decode(b"1.5"), Err(MessageError::Json(_))));
        assert!(matches!(Id::decode(b"true"), Err(MessageError::Json(_))));
        assert!(matches!(Id::decode(br#""open"#), Err(MessageError::Json(_))));
    }

    #[test]
    fn serde_accepts_both_kinds_and_rejects_others() {
        assert_eq!(serde_json::from_str::<Id>("9").unwrap(), Id::Number(9));
        assert_eq!(
            serde_json::from_str::<Id>(r#""abc""#).unwrap(),
            Id::Text("abc".to_string())
        );
        assert!(serde_json::from_str::<Id>("2.5").is_err());
        assert!(serde_json::from_str::<Id>("[1]").is_err());
        assert!(serde_json::from_str::<Id>("18446744073709551615").is_err());
    }

    #[test]
    fn display_uses_textual_form() {
        assert_eq!(Id::from(3).to_string(), "3");
        assert_eq!(Id::from("req-3").to_string(), "req-3");
    }
}
