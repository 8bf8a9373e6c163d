//! Lifecycle stage of a plant, derived from its milestone dates.
//!
//! The stage is never stored: it depends on "today", so it has to be worked out
//! again every time the plants are read.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::models::Plant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    NotStarted,
    Seedling { week: i64 },
    Veg { week: i64 },
    Flower { week: i64 },
    Harvested,
}

impl Stage {
    pub fn week(&self) -> Option<i64> {
        match *self {
            Stage::Seedling { week } | Stage::Veg { week } | Stage::Flower { week } => Some(week),
            Stage::NotStarted | Stage::Harvested => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::NotStarted => f.write_str("Not Started"),
            Stage::Seedling { week } => write!(f, "Seedling Week {}", week),
            Stage::Veg { week } => write!(f, "Veg Week {}", week),
            Stage::Flower { week } => write!(f, "Flower Week {}", week),
            Stage::Harvested => f.write_str("Harvested"),
        }
    }
}

/// Week number counted from `since`, the day of the transition being week 1.
fn week_since(since: NaiveDate, today: NaiveDate) -> i64 {
    (today - since).num_days().div_euclid(7) + 1
}

/// A milestone only counts once it has been reached.
fn reached(date: Option<NaiveDate>, today: NaiveDate) -> Option<NaiveDate> {
    date.filter(|d| *d <= today)
}

/// Works out the stage of `plant` as seen on `today`.
///
/// Without a germination date the plant has not started. Otherwise the latest
/// milestone reached wins, and a plant that has reached none of them, germination
/// included, has not started either.
pub fn compute_stage(plant: &Plant, today: NaiveDate) -> Stage {
    let Some(germination) = plant.germination else {
        return Stage::NotStarted;
    };
    if reached(plant.harvest, today).is_some() {
        return Stage::Harvested;
    }
    if let Some(flip) = reached(plant.flip_flower, today) {
        return Stage::Flower {
            week: week_since(flip, today),
        };
    }
    if let Some(veg) = reached(plant.transplant_veg, today) {
        return Stage::Veg {
            week: week_since(veg, today),
        };
    }
    if germination > today {
        return Stage::NotStarted;
    }
    Stage::Seedling {
        week: week_since(germination, today),
    }
}

/// Reads a milestone date typed by hand or left over from a spreadsheet.
///
/// Accepts `YYYY-MM-DD`, optionally followed by a time. Anything else is `None`.
pub fn parse_milestone(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
}
