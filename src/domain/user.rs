use serde::{Deserialize, Serialize};

/// Read-only profile row sourced from the backend's identity store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
}

impl UserProfile {
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_falls_back_to_email() {
        let named = UserProfile {
            id: "u-1".to_string(),
            email: "ana@example.com".to_string(),
            full_name: Some("Ana Lima".to_string()),
        };
        assert_eq!(named.display_name(), "Ana Lima");

        let unnamed = UserProfile {
            full_name: None,
            ..named.clone()
        };
        assert_eq!(unnamed.display_name(), "ana@example.com");

        let blank = UserProfile {
            full_name: Some(String::new()),
            ..named
        };
        assert_eq!(blank.display_name(), "ana@example.com");
    }
}
