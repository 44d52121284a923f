use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, Serialize)]
pub struct Register<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub name: &'a str,
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct Login<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of `POST /passports`.
#[derive(Debug, Clone, Serialize)]
pub struct NewPassport<'a> {
    pub name: &'a str,
    #[serde(rename = "publicKey")]
    pub public_key: &'a str,
}

/// Body of `POST /passports/{id}/verify`.
#[derive(Debug, Clone, Serialize)]
pub struct Challenge<'a> {
    pub challenge: &'a str,
    pub signature: &'a str,
}

/// Body of `POST /messages`.
#[derive(Debug, Clone, Serialize)]
pub struct NewMessage<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub subject: &'a str,
    pub body: &'a str,
}

fn str_field<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(Value::as_str)
}

/// A passport as the server sent it.
///
/// Every field is kept as is, `id`, `name` and `publicKey` get accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Passport(pub Map<String, Value>);

impl Passport {
    pub fn id(&self) -> Option<&str> {
        str_field(&self.0, "id")
    }
    pub fn name(&self) -> Option<&str> {
        str_field(&self.0, "name")
    }
    pub fn public_key(&self) -> Option<&str> {
        str_field(&self.0, "publicKey")
    }
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// A message as the server sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Message(pub Map<String, Value>);

impl Message {
    pub fn id(&self) -> Option<&str> {
        str_field(&self.0, "id")
    }
    /// `from`
    pub fn sender(&self) -> Option<&str> {
        str_field(&self.0, "from")
    }
    /// `to`
    pub fn recipient(&self) -> Option<&str> {
        str_field(&self.0, "to")
    }
    pub fn subject(&self) -> Option<&str> {
        str_field(&self.0, "subject")
    }
    pub fn body(&self) -> Option<&str> {
        str_field(&self.0, "body")
    }
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// `token` of an auth response, if it is a string.
pub(crate) fn token_of(resp: &Value) -> Option<&str> {
    resp.as_object()
        .and_then(|fields| str_field(fields, "token"))
}

/// Result of a signature check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct Verification {
    pub valid: bool,
    /// Whatever else the server reports
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TryFrom<Map<String, Value>> for Verification {
    type Error = String;
    fn try_from(mut extra: Map<String, Value>) -> Result<Self, Self::Error> {
        let valid = extra
            .remove("valid")
            .and_then(|v| v.as_bool())
            .ok_or("expected boolean field `valid`")?;
        Ok(Verification { valid, extra })
    }
}

/// Trust score of a passport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct Trust {
    pub score: f64,
    /// Whatever else the server reports
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TryFrom<Map<String, Value>> for Trust {
    type Error = String;
    fn try_from(mut extra: Map<String, Value>) -> Result<Self, Self::Error> {
        let score = extra
            .remove("score")
            .and_then(|v| v.as_f64())
            .ok_or("expected numeric field `score`")?;
        Ok(Trust { score, extra })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{token_of, Message, NewPassport, Passport, Trust, Verification};

    #[test]
    fn passport_keeps_unknown_fields() {
        let raw = json!({
            "id": "ap_1",
            "name": "bot",
            "publicKey": "pk",
            "createdAt": "2024-01-01T00:00:00Z",
            "meta": { "tier": 2 }
        });

        let passport: Passport = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(passport.id(), Some("ap_1"));
        assert_eq!(passport.name(), Some("bot"));
        assert_eq!(passport.public_key(), Some("pk"));
        assert_eq!(serde_json::to_value(&passport).unwrap(), raw);
    }

    #[test]
    fn message_accessors() {
        let message: Message = serde_json::from_value(json!({
            "id": "m1",
            "from": "ap_a",
            "to": "ap_b",
            "subject": "Hi",
            "body": "Hello",
            "read": false
        }))
        .unwrap();

        assert_eq!(message.sender(), Some("ap_a"));
        assert_eq!(message.recipient(), Some("ap_b"));
        assert_eq!(message.subject(), Some("Hi"));
        assert_eq!(message.body(), Some("Hello"));
        assert_eq!(message.get("read"), Some(&json!(false)));
    }

    #[test]
    fn new_passport_uses_camel_case_key() {
        let body = NewPassport {
            name: "bot",
            public_key: "pk",
        };
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({ "name": "bot", "publicKey": "pk" })
        );
    }

    #[test]
    fn trust_keeps_extra_fields() {
        let trust: Trust =
            serde_json::from_value(json!({ "score": 0.95, "level": "high" })).unwrap();
        assert_eq!(trust.score, 0.95);
        assert_eq!(trust.extra.get("level"), Some(&json!("high")));
    }

    #[test]
    fn verification_and_trust_need_objects() {
        assert!(serde_json::from_value::<Verification>(json!([true])).is_err());
        assert!(serde_json::from_value::<Verification>(json!({ "valid": "yes" })).is_err());
        assert!(serde_json::from_value::<Trust>(json!([0.5])).is_err());
        assert!(serde_json::from_value::<Trust>(json!({ "level": "high" })).is_err());

        let verification: Verification =
            serde_json::from_value(json!({ "valid": false, "reason": "bad signature" })).unwrap();
        assert!(!verification.valid);
        assert_eq!(verification.extra.get("reason"), Some(&json!("bad signature")));
        assert!(verification.extra.get("valid").is_none());
    }

    #[test]
    fn token_must_be_a_string_field() {
        assert_eq!(token_of(&json!({ "token": "tok" })), Some("tok"));
        assert_eq!(token_of(&json!(["tok"])), None);
        assert_eq!(token_of(&json!({ "token": 123 })), None);
        assert_eq!(token_of(&json!("tok")), None);
        assert_eq!(token_of(&json!({})), None);
    }
}
