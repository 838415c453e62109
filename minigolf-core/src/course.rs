use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::session::OpenSession;
use crate::validation;
use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Easy" => Ok(Difficulty::Easy),
            "Medium" => Ok(Difficulty::Medium),
            "Hard" => Ok(Difficulty::Hard),
            other => Err(CoreError::ValidationError(format!("Unknown difficulty: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GolfCourse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub google_maps_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub features: Vec<String>,
    pub amenities: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CourseImage {
    pub id: Uuid,
    pub course_id: Uuid,
    pub url: String,
    pub caption: Option<String>,
    pub is_primary: bool,
    pub order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: Uuid,
    pub course_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub holes: i32,
    pub difficulty: Difficulty,
    /// Estimated play time in minutes.
    pub duration: i32,
    pub is_active: bool,
}

/// Course entry on the public directory page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseListing {
    #[serde(flatten)]
    pub course: GolfCourse,
    pub primary_image: Option<CourseImage>,
    pub tracks: Vec<Track>,
    pub upcoming_sessions: i64,
}

/// Course detail page: everything needed to start the booking flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: GolfCourse,
    pub images: Vec<CourseImage>,
    pub tracks: Vec<Track>,
    pub upcoming_sessions: Vec<OpenSession>,
}

/// How many upcoming sessions the course detail page previews.
pub const DETAIL_SESSION_PREVIEW: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub city: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackSummary {
    pub id: Uuid,
    pub name: String,
    pub holes: i32,
    pub difficulty: Difficulty,
}

impl From<&GolfCourse> for CourseSummary {
    fn from(course: &GolfCourse) -> Self {
        Self {
            id: course.id,
            name: course.name.clone(),
            slug: course.slug.clone(),
            city: course.city.clone(),
        }
    }
}

impl From<&Track> for TrackSummary {
    fn from(track: &Track) -> Self {
        Self {
            id: track.id,
            name: track.name.clone(),
            holes: track.holes,
            difficulty: track.difficulty,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewCourse {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub google_maps_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub features: Vec<String>,
    pub amenities: Vec<String>,
    pub images: Vec<NewCourseImage>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewCourseImage {
    pub url: String,
    pub caption: Option<String>,
    pub is_primary: bool,
    pub order: i32,
}

impl NewCourse {
    /// Normalize an admin-supplied course. The slug is derived from the name
    /// when none is given.
    pub fn validate(mut self) -> CoreResult<Self> {
        let name = validation::required("name", self.name.as_deref())?;
        let slug = match validation::optional(self.slug.as_deref()) {
            Some(s) => slugify(&s),
            None => slugify(&name),
        };
        if slug.is_empty() {
            return Err(CoreError::ValidationError("slug is required".to_string()));
        }
        if self.images.iter().any(|img| img.url.trim().is_empty()) {
            return Err(CoreError::ValidationError("image url is required".to_string()));
        }
        self.name = Some(name);
        self.slug = Some(slug);
        self.features.retain(|f| !f.trim().is_empty());
        self.amenities.retain(|a| !a.trim().is_empty());
        Ok(self)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrack {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub holes: i32,
    pub difficulty: Difficulty,
    pub duration: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl NewTrack {
    pub fn validate(self) -> CoreResult<Self> {
        let name = validation::required("name", Some(self.name.as_str()))?;
        if self.holes < 1 {
            return Err(CoreError::ValidationError("holes must be at least 1".to_string()));
        }
        if self.duration < 1 {
            return Err(CoreError::ValidationError("duration must be at least 1 minute".to_string()));
        }
        Ok(Self { name, ..self })
    }
}

/// Lowercase, drop anything but word characters and spaces, join words with `-`.
pub fn slugify(text: &str) -> String {
    let kept: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == ' ')
        .collect();
    kept.split(' ')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Pirate's Cove Adventure Golf"), "pirates-cove-adventure-golf");
        assert_eq!(slugify("  Kimball   Farm "), "kimball-farm");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_new_course_derives_slug() {
        let course = NewCourse {
            name: Some("  Kimball Farm Mini Golf ".to_string()),
            features: vec!["Ice Cream".to_string(), " ".to_string()],
            ..Default::default()
        }
        .validate()
        .unwrap();

        assert_eq!(course.name.as_deref(), Some("Kimball Farm Mini Golf"));
        assert_eq!(course.slug.as_deref(), Some("kimball-farm-mini-golf"));
        assert_eq!(course.features, vec!["Ice Cream".to_string()]);
    }

    #[test]
    fn test_new_course_requires_name() {
        let err = NewCourse::default().validate().unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn test_difficulty_round_trip_through_text() {
        for d in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            assert_eq!(d.as_str().parse::<Difficulty>().unwrap(), d);
        }
        assert!("Extreme".parse::<Difficulty>().is_err());
    }

    #[test]
    fn test_new_track_validation() {
        let track = NewTrack {
            name: "Blackbeard's Challenge".to_string(),
            description: None,
            holes: 0,
            difficulty: Difficulty::Medium,
            duration: 60,
            is_active: true,
        };
        assert!(track.validate().is_err());
    }
}
