//! Private wire shapes for backend JSON, and their conversions into the
//! domain records from `curricle-shared`.
//!
//! The backend serializes SQLAlchemy rows fairly directly, so several fields
//! are nullable on the wire even where the domain treats them as plain
//! values (teaching aspects default to `false`, missing embeds are decode
//! errors).

use curricle_shared::{
    Category, CurricleError, Department, Institution, InstitutionDepartments, Result, Topic,
    TopicId, TopicSummary, Unit, UnitSummary, UnitTopic,
};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct UnitTopicsEnvelope {
    #[serde(default)]
    pub(crate) unit_topics: Vec<UnitTopicWire>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UnitsPageEnvelope {
    #[serde(default)]
    pub(crate) units: Vec<UnitWire>,
    pub(crate) total: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UnitEnvelope {
    pub(crate) unit: UnitWire,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TopicsPageEnvelope {
    #[serde(default)]
    pub(crate) topics: Vec<TopicSummaryWire>,
    pub(crate) total: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TopicEnvelope {
    pub(crate) topic: TopicWire,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InstitutionsEnvelope {
    #[serde(default)]
    pub(crate) institutions: Vec<InstitutionWire>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DepartmentsEnvelope {
    #[serde(default)]
    pub(crate) departments: Vec<DepartmentWire>,
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct UnitTopicWire {
    pub(crate) id: i64,
    #[serde(default)]
    pub(crate) alias: Option<String>,
    #[serde(default)]
    pub(crate) is_taught: Option<bool>,
    #[serde(default)]
    pub(crate) is_assessed: Option<bool>,
    #[serde(default)]
    pub(crate) is_applied: Option<bool>,
    /// Present when the request asked for `embed=topic`.
    #[serde(default)]
    pub(crate) topic: Option<TopicWire>,
    /// Present when the request asked for `embed=unit`.
    #[serde(default)]
    pub(crate) unit: Option<UnitWire>,
    /// Present when the request asked for `embed=contexts`.
    #[serde(default)]
    pub(crate) contexts: Vec<TopicWire>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TopicWire {
    pub(crate) id: i64,
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) categories: Vec<CategoryWire>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoryWire {
    pub(crate) id: i64,
    pub(crate) name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UnitWire {
    pub(crate) id: i64,
    pub(crate) code: String,
    #[serde(default)]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) level: Option<i64>,
    #[serde(default)]
    pub(crate) num_topics: Option<u64>,
}

/// Paged-topics row: `TopicSchema2` keeps only the referencing units.
#[derive(Debug, Deserialize)]
pub(crate) struct TopicSummaryWire {
    pub(crate) id: i64,
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) unit_topics: Vec<TopicUnitRefWire>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TopicUnitRefWire {
    #[serde(default)]
    pub(crate) unit: Option<UnitCodeWire>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UnitCodeWire {
    pub(crate) code: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InstitutionWire {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) uri: String,
    /// Only the grouped listing embeds departments.
    #[serde(default)]
    pub(crate) departments: Vec<DepartmentWire>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DepartmentWire {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) uri: String,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl TopicWire {
    pub(crate) fn into_topic(self) -> Topic {
        Topic {
            id: TopicId(self.id),
            name: self.name,
            categories: self
                .categories
                .into_iter()
                .map(|c| Category::from_catalog(c.id, c.name))
                .collect(),
        }
    }
}

impl UnitWire {
    pub(crate) fn into_unit(self) -> Unit {
        Unit {
            id: self.id,
            code: self.code,
            name: self.name,
            level: self.level,
        }
    }

    pub(crate) fn into_summary(self) -> UnitSummary {
        UnitSummary {
            num_topics: self.num_topics.unwrap_or(0),
            id: self.id,
            code: self.code,
            name: self.name,
            level: self.level,
        }
    }
}

impl UnitTopicWire {
    /// Convert a row fetched with `embed=topic,contexts`.
    pub(crate) fn into_unit_topic(self) -> Result<UnitTopic> {
        let topic = self
            .topic
            .ok_or_else(|| CurricleError::decode("unit_topic row missing embedded topic"))?;

        Ok(UnitTopic {
            id: self.id,
            alias: self.alias,
            is_taught: self.is_taught.unwrap_or(false),
            is_assessed: self.is_assessed.unwrap_or(false),
            is_applied: self.is_applied.unwrap_or(false),
            topic: topic.into_topic(),
            contexts: self
                .contexts
                .into_iter()
                .map(TopicWire::into_topic)
                .collect(),
        })
    }
}

impl TopicSummaryWire {
    pub(crate) fn into_summary(self) -> TopicSummary {
        TopicSummary {
            id: TopicId(self.id),
            name: self.name,
            unit_codes: self
                .unit_topics
                .into_iter()
                .filter_map(|r| r.unit.map(|u| u.code))
                .collect(),
        }
    }
}

impl InstitutionWire {
    pub(crate) fn into_institution(self) -> Institution {
        Institution {
            id: self.id,
            name: self.name,
            uri: self.uri,
        }
    }

    pub(crate) fn into_grouped(self) -> InstitutionDepartments {
        let departments = self
            .departments
            .iter()
            .map(DepartmentWire::to_department)
            .collect();
        InstitutionDepartments {
            institution: self.into_institution(),
            departments,
        }
    }
}

impl DepartmentWire {
    pub(crate) fn to_department(&self) -> Department {
        Department {
            id: self.id,
            name: self.name.clone(),
            uri: self.uri.clone(),
        }
    }
}
