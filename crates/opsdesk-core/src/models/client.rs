use serde::{Deserialize, Serialize};

/// A customer of the office.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Client {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Client {
    /// "Acme Ltd (Dana Reyes)" when a contact is known, else the name.
    pub fn display_name(&self) -> String {
        match self.contact_name.as_deref().map(str::trim) {
            Some(contact) if !contact.is_empty() => format!("{} ({})", self.name, contact),
            _ => self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_client_without_optional_fields() {
        let client: Client = serde_json::from_str(r#"{"id": 7, "name": "Acme Ltd"}"#).unwrap();
        assert_eq!(client.id, Some(7));
        assert_eq!(client.display_name(), "Acme Ltd");
    }

    #[test]
    fn test_new_client_serializes_without_id() {
        let client = Client {
            name: "Acme Ltd".to_string(),
            contact_name: Some("Dana Reyes".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&client).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(client.display_name(), "Acme Ltd (Dana Reyes)");
    }
}
