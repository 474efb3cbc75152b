use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Opaque customer identifier. Upstream directories send it either as a JSON
/// string or as a JSON integer; both normalize to the string form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct CustomerId(pub String);

impl CustomerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CustomerId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(value) => Self(value),
            RawId::Signed(value) => Self(value.to_string()),
            RawId::Unsigned(value) => Self(value.to_string()),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub role: String,
}

impl Customer {
    /// Uppercased first character of the display name, used as the avatar letter.
    pub fn initial(&self) -> Option<char> {
        self.name.trim_start().chars().next().and_then(|first| first.to_uppercase().next())
    }
}

#[cfg(test)]
mod tests {
    use super::{Customer, CustomerId};

    #[test]
    fn numeric_and_string_ids_decode_to_the_same_form() {
        let numeric: Customer =
            serde_json::from_str(r#"{"id":1,"name":"Alice","email":"a@x.io","role":"Admin"}"#)
                .expect("numeric id should decode");
        let text: Customer =
            serde_json::from_str(r#"{"id":"1","name":"Alice","email":"a@x.io","role":"Admin"}"#)
                .expect("string id should decode");

        assert_eq!(numeric.id, CustomerId("1".to_string()));
        assert_eq!(numeric, text);
    }

    #[test]
    fn missing_email_defaults_to_empty() {
        let customer: Customer =
            serde_json::from_str(r#"{"id":"c-9","name":"Bob","role":"Manager"}"#)
                .expect("customer without email should decode");

        assert!(customer.email.is_empty());
    }

    #[test]
    fn initial_is_uppercased_first_letter() {
        let customer = Customer {
            id: CustomerId("c-1".to_string()),
            name: " thomas".to_string(),
            email: String::new(),
            role: "Manager".to_string(),
        };
        assert_eq!(customer.initial(), Some('T'));

        let blank = Customer { name: String::new(), ..customer };
        assert_eq!(blank.initial(), None);
    }
}
