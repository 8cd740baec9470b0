//! Data models for the playlist editor

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::classifier;

/// Attribute keys written from entry fields rather than from `raw_attributes`
pub const TVG_ID: &str = "tvg-id";
pub const TVG_LOGO: &str = "tvg-logo";
pub const GROUP_TITLE: &str = "group-title";

/// Canonical spelling of a well-known key, matched without regard to case
pub fn well_known_key(key: &str) -> Option<&'static str> {
    [TVG_ID, TVG_LOGO, GROUP_TITLE]
        .into_iter()
        .find(|known| known.eq_ignore_ascii_case(key))
}

/// Group assigned when a descriptor carries no `group-title`
pub const DEFAULT_GROUP: &str = "Uncategorized";

/// Opaque entry identifier, never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(Uuid);

impl EntryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an id previously handed out (e.g. echoed back by the AI service)
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s.trim()).ok().map(Self)
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Content category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "TV")]
    Tv,
    Movie,
    Series,
    Other,
}

impl Category {
    pub const ALL: [Category; 4] = [Category::Tv, Category::Movie, Category::Series, Category::Other];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Tv => "TV",
            Category::Movie => "Movie",
            Category::Series => "Series",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Reachability state, only changed by the prober
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus {
    #[default]
    Unknown,
    Checking,
    Online,
    Offline,
}

impl StreamStatus {
    pub fn label(&self) -> &'static str {
        match self {
            StreamStatus::Unknown => "unknown",
            StreamStatus::Checking => "checking",
            StreamStatus::Online => "online",
            StreamStatus::Offline => "offline",
        }
    }
}

/// One playable stream
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    id: EntryId,
    pub name: String,
    pub url: String,
    group: String,
    pub logo: String,
    pub tvg_id: String,
    pub category: Category,
    pub status: StreamStatus,
    raw_attributes: IndexMap<String, String>,
}

impl Entry {
    /// Build a freshly parsed entry. The category is classified here and the
    /// well-known attributes are mirrored into `raw_attributes`.
    pub fn new(
        name: String,
        url: String,
        group: String,
        logo: String,
        tvg_id: String,
        raw_attributes: IndexMap<String, String>,
    ) -> Self {
        let category = classifier::classify(&url, &group, &name);
        let mut entry = Self {
            id: EntryId::new(),
            name,
            url,
            group,
            logo,
            tvg_id,
            category,
            status: StreamStatus::Unknown,
            raw_attributes,
        };
        entry.sync_attributes();
        entry
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn raw_attributes(&self) -> &IndexMap<String, String> {
        &self.raw_attributes
    }

    /// Reassign the group, keeping `group-title` in step
    pub fn set_group(&mut self, group: &str) {
        self.group = group.to_string();
        self.raw_attributes
            .insert(GROUP_TITLE.to_string(), self.group.clone());
    }

    /// Duplicate into `group` with a new id and a " (Copy)" suffix.
    /// The copy has never been probed, so its status starts over.
    pub fn copy_into(&self, group: &str) -> Self {
        let mut copy = self.clone();
        copy.id = EntryId::new();
        copy.name = format!("{} (Copy)", self.name);
        copy.status = StreamStatus::Unknown;
        copy.set_group(group);
        copy
    }

    /// Same entry apart from its id
    pub fn same_content(&self, other: &Entry) -> bool {
        self.name == other.name
            && self.url == other.url
            && self.group == other.group
            && self.logo == other.logo
            && self.tvg_id == other.tvg_id
            && self.category == other.category
            && self.status == other.status
            && self.raw_attributes == other.raw_attributes
    }

    fn sync_attributes(&mut self) {
        // Differently-cased spellings of a known key would export twice
        self.raw_attributes
            .retain(|key, _| !matches!(well_known_key(key), Some(known) if known != key));
        self.raw_attributes
            .insert(TVG_ID.to_string(), self.tvg_id.clone());
        self.raw_attributes
            .insert(TVG_LOGO.to_string(), self.logo.clone());
        self.raw_attributes
            .insert(GROUP_TITLE.to_string(), self.group.clone());
    }
}

/// Sort order for the entry table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOption {
    #[default]
    NameAsc,
    NameDesc,
    GroupAsc,
    UrlAsc,
}

impl SortOption {
    pub const ALL: [SortOption; 4] = [
        SortOption::NameAsc,
        SortOption::NameDesc,
        SortOption::GroupAsc,
        SortOption::UrlAsc,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SortOption::NameAsc => "Name (A-Z)",
            SortOption::NameDesc => "Name (Z-A)",
            SortOption::GroupAsc => "Group (A-Z)",
            SortOption::UrlAsc => "URL (A-Z)",
        }
    }
}
