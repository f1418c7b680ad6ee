//! Include/exclude topic queries over teaching aspects and unit levels.

use std::str::FromStr;

use serde_json::{Value, json};

use curricle_shared::{CurricleError, Result};

/// One way a unit can engage with a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aspect {
    Taught,
    Assessed,
    Applied,
}

impl Aspect {
    pub fn as_str(self) -> &'static str {
        match self {
            Aspect::Taught => "taught",
            Aspect::Assessed => "assessed",
            Aspect::Applied => "applied",
        }
    }
}

impl FromStr for Aspect {
    type Err = CurricleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "taught" => Ok(Aspect::Taught),
            "assessed" => Ok(Aspect::Assessed),
            "applied" => Ok(Aspect::Applied),
            other => Err(CurricleError::config(format!(
                "unknown aspect {other:?} (expected taught, assessed, or applied)"
            ))),
        }
    }
}

/// One filter line: links matching any of `aspects`, optionally limited to
/// units at the given `levels`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterLine {
    pub aspects: Vec<Aspect>,
    pub levels: Vec<i64>,
}

impl FromStr for FilterLine {
    type Err = CurricleError;

    /// Parse `taught,assessed:1,2`: comma-separated aspects, then an
    /// optional `:` and comma-separated unit levels.
    fn from_str(s: &str) -> Result<Self> {
        let (aspect_part, level_part) = match s.split_once(':') {
            Some((aspects, levels)) => (aspects, Some(levels)),
            None => (s, None),
        };

        let aspects = aspect_part
            .split(',')
            .filter(|p| !p.trim().is_empty())
            .map(str::parse)
            .collect::<Result<Vec<Aspect>>>()?;
        if aspects.is_empty() {
            return Err(CurricleError::config(
                "a filter line needs at least one aspect",
            ));
        }

        let levels = match level_part {
            None => Vec::new(),
            Some(part) => part
                .split(',')
                .filter(|p| !p.trim().is_empty())
                .map(|p| {
                    p.trim().parse::<i64>().map_err(|_| {
                        CurricleError::config(format!("invalid unit level {:?}", p.trim()))
                    })
                })
                .collect::<Result<Vec<i64>>>()?,
        };

        Ok(FilterLine { aspects, levels })
    }
}

impl FilterLine {
    // the backend keys the aspect list as "taught" whatever it holds
    fn to_value(&self) -> Value {
        json!({
            "taught": self.aspects.iter().map(|a| a.as_str()).collect::<Vec<_>>(),
            "levels": self.levels,
        })
    }
}

/// An include/exclude topic query. A topic matches when it satisfies every
/// include line and no exclude line; within a line, aspects are alternatives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicFilter {
    pub include: Vec<FilterLine>,
    pub exclude: Vec<FilterLine>,
}

impl TopicFilter {
    /// The POST body for `topics/filter`. Both keys are always present; the
    /// backend reads them unconditionally.
    pub fn to_body(&self) -> Value {
        json!({
            "include": self.include.iter().map(FilterLine::to_value).collect::<Vec<_>>(),
            "exclude": self.exclude.iter().map(FilterLine::to_value).collect::<Vec<_>>(),
        })
    }
}
