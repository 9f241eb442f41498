//! The fixed allow-list of content documents the site stores.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentType {
    HeroBanner,
    HeroMedia,
    Services,
    Projects,
    News,
    Investment,
    Recruitment,
    AboutVideo,
}

impl ContentType {
    pub const ALL: [ContentType; 8] = [
        ContentType::HeroBanner,
        ContentType::HeroMedia,
        ContentType::Services,
        ContentType::Projects,
        ContentType::News,
        ContentType::Investment,
        ContentType::Recruitment,
        ContentType::AboutVideo,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::HeroBanner => "hero-banner",
            ContentType::HeroMedia => "hero-media",
            ContentType::Services => "services",
            ContentType::Projects => "projects",
            ContentType::News => "news",
            ContentType::Investment => "investment",
            ContentType::Recruitment => "recruitment",
            ContentType::AboutVideo => "about-video",
        }
    }

    /// File stem of the stored document; backups are named `{stem}_{timestamp}.json`.
    pub fn file_stem(self) -> String {
        format!("{}-data", self.as_str())
    }

    pub fn file_name(self) -> String {
        format!("{}.json", self.file_stem())
    }

    /// Key of the record array inside the document, for list-shaped content.
    pub fn collection_key(self) -> Option<&'static str> {
        match self {
            ContentType::HeroBanner => Some("banners"),
            ContentType::HeroMedia => Some("heroMedia"),
            ContentType::Services => Some("services"),
            ContentType::Projects => Some("projects"),
            ContentType::News => Some("articles"),
            ContentType::Investment => Some("investments"),
            ContentType::Recruitment => Some("jobs"),
            ContentType::AboutVideo => None,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ServiceError::InvalidType(s.to_string()))
    }
}
