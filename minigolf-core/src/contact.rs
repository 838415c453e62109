use chrono::{DateTime, Utc};
use minigolf_shared::Masked;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::validation;
use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ContactStatus {
    New,
    Read,
    Responded,
    Resolved,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::New => "New",
            ContactStatus::Read => "Read",
            ContactStatus::Responded => "Responded",
            ContactStatus::Resolved => "Resolved",
        }
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContactStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "New" => Ok(ContactStatus::New),
            "Read" => Ok(ContactStatus::Read),
            "Responded" => Ok(ContactStatus::Responded),
            "Resolved" => Ok(ContactStatus::Resolved),
            other => Err(CoreError::ValidationError(format!("Unknown contact status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    pub id: Uuid,
    pub name: String,
    pub email: Masked<String>,
    pub phone: Option<Masked<String>>,
    pub subject: String,
    pub message: String,
    pub status: ContactStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

impl ContactRequest {
    pub fn validate(&self) -> CoreResult<ContactSubmission> {
        Ok(ContactSubmission {
            id: Uuid::new_v4(),
            name: validation::required("name", self.name.as_deref())?,
            email: Masked(validation::email("email", self.email.as_deref())?),
            phone: validation::optional(self.phone.as_deref()).map(Masked),
            subject: validation::required("subject", self.subject.as_deref())?,
            message: validation::required("message", self.message.as_deref())?,
            status: ContactStatus::New,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_submission_starts_new() {
        let req = ContactRequest {
            name: Some("Sam".to_string()),
            email: Some("sam@example.com".to_string()),
            phone: None,
            subject: Some("Group rates".to_string()),
            message: Some("Do you offer birthday packages?".to_string()),
        };
        let submission = req.validate().unwrap();
        assert_eq!(submission.status, ContactStatus::New);
        assert_eq!(submission.phone, None);
    }

    #[test]
    fn test_message_is_required() {
        let req = ContactRequest {
            name: Some("Sam".to_string()),
            email: Some("sam@example.com".to_string()),
            subject: Some("Hi".to_string()),
            ..Default::default()
        };
        assert!(matches!(req.validate(), Err(CoreError::ValidationError(_))));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Responded".parse::<ContactStatus>().unwrap(), ContactStatus::Responded);
        assert!("Archived".parse::<ContactStatus>().is_err());
    }
}
