//! The canonical, site-agnostic record every extractor produces.

use serde::{Deserialize, Serialize};

use super::Site;

/// Normalized description of one catalog item.
///
/// Lists are omitted from JSON when empty and optional fields when absent,
/// so a failed record serializes to `site`, `sid`, `success` and `error` only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub site: Site,
    pub sid: String,
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Canonical page of the item on its own site
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    /// Item type as the source names it (`Movie`, `TVSeries`, `动画`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Primary title group (original-language title)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub this_title: Vec<String>,

    /// Secondary title group (translated title plus sorted alternate names)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trans_title: Vec<String>,

    /// Alternate names, collation-sorted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aka: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<String>,

    /// Release dates, ascending by calendar date
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub release_dates: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episodes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_rating: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub official_site: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,

    /// Same item in a second catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_ref: Option<CrossRef>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ratings: Vec<Rating>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub credits: Vec<Credit>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Platforms a game ships on
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub awards: Option<String>,

    /// Hardware requirements of a game, pre-rendered as lines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub screenshots: Vec<String>,
}

/// A score from one rating provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub provider: Site,
    pub score: f64,
    pub votes: u64,
}

/// Identifier of the same item in another catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossRef {
    pub site: Site,
    pub id: String,
    pub link: String,
}

/// Role of a group of credited people or companies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Director,
    Writer,
    Cast,
    Creator,
    Developer,
    Publisher,
    Staff,
}

/// Credited names sharing one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credit {
    pub role: Role,

    /// Source-specific label for `Staff` credits (e.g. `音乐`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    pub names: Vec<String>,
}

impl Record {
    /// Start an empty record for `site`/`sid`; `success` stays false until
    /// the extractor finishes.
    pub fn new(site: Site, sid: impl Into<String>) -> Self {
        Self {
            site,
            sid: sid.into(),
            success: false,
            error: None,
            link: None,
            kind: None,
            this_title: Vec::new(),
            trans_title: Vec::new(),
            aka: Vec::new(),
            year: None,
            regions: Vec::new(),
            genres: Vec::new(),
            languages: Vec::new(),
            release_dates: Vec::new(),
            episodes: None,
            runtime: None,
            content_rating: None,
            official_site: None,
            poster: None,
            cross_ref: None,
            ratings: Vec::new(),
            credits: Vec::new(),
            tags: Vec::new(),
            platforms: Vec::new(),
            synopsis: None,
            awards: None,
            requirements: None,
            screenshots: Vec::new(),
        }
    }

    /// A failed record carrying only its identity and the error message.
    pub fn failure(site: Site, sid: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(site, sid)
        }
    }

    /// Mark the record as complete.
    pub fn succeed(mut self) -> Self {
        self.success = true;
        self.error = None;
        self
    }

    /// Rating reported by `provider`, if any.
    pub fn rating(&self, provider: Site) -> Option<&Rating> {
        self.ratings.iter().find(|r| r.provider == provider)
    }

    /// Names credited under `role`, empty when the role is missing.
    pub fn credited(&self, role: Role) -> &[String] {
        self.credits
            .iter()
            .find(|c| c.role == role)
            .map(|c| c.names.as_slice())
            .unwrap_or(&[])
    }

    /// Staff credits in the order they were added.
    pub fn staff(&self) -> impl Iterator<Item = &Credit> {
        self.credits.iter().filter(|c| c.role == Role::Staff)
    }

    /// Add a credit group, skipping empty name lists.
    pub fn push_credit(&mut self, role: Role, names: Vec<String>) {
        if !names.is_empty() {
            self.credits.push(Credit {
                role,
                label: None,
                names,
            });
        }
    }

    /// Add a labelled staff line, skipping empty values.
    pub fn push_staff(&mut self, label: impl Into<String>, names: Vec<String>) {
        if !names.is_empty() {
            self.credits.push(Credit {
                role: Role::Staff,
                label: Some(label.into()),
                names,
            });
        }
    }

    /// Record a rating.
    pub fn push_rating(&mut self, provider: Site, score: f64, votes: u64) {
        self.ratings.push(Rating {
            provider,
            score,
            votes,
        });
    }
}
