use serde::{Deserialize, Serialize};

/// Level of an entity in the ad platform hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityLevel {
    Campaign,
    #[serde(alias = "ad_set")]
    Adset,
    Ad,
}

impl EntityLevel {
    /// The level directly above this one, if any.
    pub fn parent(self) -> Option<EntityLevel> {
        match self {
            EntityLevel::Campaign => None,
            EntityLevel::Adset => Some(EntityLevel::Campaign),
            EntityLevel::Ad => Some(EntityLevel::Adset),
        }
    }
}

impl std::fmt::Display for EntityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityLevel::Campaign => write!(f, "campaign"),
            EntityLevel::Adset => write!(f, "adset"),
            EntityLevel::Ad => write!(f, "ad"),
        }
    }
}

/// Identity of an evaluated entity. Ids are the platform's own string ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: String,
    pub level: EntityLevel,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl EntityRef {
    pub fn new(id: impl Into<String>, level: EntityLevel) -> Self {
        Self {
            id: id.into(),
            level,
            name: None,
            parent_id: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Name for log lines and reasoning text; falls back to the id.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}
