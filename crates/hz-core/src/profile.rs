//! Avoidance profiles (per agent class) and their CSV loader.
//!
//! # CSV format
//!
//! One row per profile.  Column order is free; columns are matched by header.
//!
//! ```csv
//! profile_id,name,lookahead_secs,break_formation_threshold,reaction_delay_secs,loose_spacing_min,loose_spacing_max,elasticity_rate,group_break_cooldown_secs
//! 0,fighter,4.0,0.8,0.15,6,14,3.0,2.0
//! 1,frigate,8.0,1.2,0.50,18,40,1.0,5.0
//! ```
//!
//! `profile_id` values must be dense (`0..n`, any order).  `name` is
//! optional and defaults to `profile_<id>`.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::{HzError, HzResult, ProfileId};

// ── AvoidanceProfile ──────────────────────────────────────────────────────────

/// Tuning for one agent class.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AvoidanceProfile {
    pub name: String,

    /// How far ahead (seconds) this class cares about predicted hazards.
    /// The slice forecast horizon is the max over all profiles present.
    pub lookahead_secs: f32,

    /// Cell risk at which urgency saturates to 1 and formation may break.
    pub break_formation_threshold: f32,

    /// Simulated perception latency.  0 disables the reaction ring buffer.
    pub reaction_delay_secs: f32,

    /// Formation spacing in `Hold`.
    pub loose_spacing_min: f32,

    /// Formation spacing in `Loose` and `Break`.
    pub loose_spacing_max: f32,

    /// Exponential rate (1/s) at which spacing approaches its target.
    pub elasticity_rate: f32,

    /// Minimum dwell after any formation transition before `Break` is allowed.
    pub group_break_cooldown_secs: f32,
}

impl Default for AvoidanceProfile {
    fn default() -> Self {
        Self {
            name:                      "default".to_owned(),
            lookahead_secs:            6.0,
            break_formation_threshold: 1.0,
            reaction_delay_secs:       0.0,
            loose_spacing_min:         10.0,
            loose_spacing_max:         25.0,
            elasticity_rate:           2.0,
            group_break_cooldown_secs: 3.0,
        }
    }
}

impl AvoidanceProfile {
    /// Reject values the pipeline cannot use.
    pub fn validate(&self) -> HzResult<()> {
        let non_negative = [
            ("lookahead_secs", self.lookahead_secs),
            ("reaction_delay_secs", self.reaction_delay_secs),
            ("loose_spacing_min", self.loose_spacing_min),
            ("loose_spacing_max", self.loose_spacing_max),
            ("elasticity_rate", self.elasticity_rate),
            ("group_break_cooldown_secs", self.group_break_cooldown_secs),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(HzError::Config(format!(
                    "profile {:?}: {field} must be finite and >= 0, got {value}",
                    self.name
                )));
            }
        }
        if !(self.break_formation_threshold > 0.0) || !self.break_formation_threshold.is_finite() {
            return Err(HzError::Config(format!(
                "profile {:?}: break_formation_threshold must be > 0, got {}",
                self.name, self.break_formation_threshold
            )));
        }
        if self.loose_spacing_min > self.loose_spacing_max {
            return Err(HzError::Config(format!(
                "profile {:?}: loose_spacing_min {} exceeds loose_spacing_max {}",
                self.name, self.loose_spacing_min, self.loose_spacing_max
            )));
        }
        Ok(())
    }
}

// ── ProfileTable ──────────────────────────────────────────────────────────────

/// Dense table of profiles indexed by `ProfileId`.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProfileTable {
    profiles: Vec<AvoidanceProfile>,
}

impl ProfileTable {
    /// Validate and wrap `profiles`; `profiles[i]` becomes `ProfileId(i)`.
    pub fn new(profiles: Vec<AvoidanceProfile>) -> HzResult<Self> {
        if profiles.len() > u16::MAX as usize {
            return Err(HzError::Config(format!("too many profiles: {}", profiles.len())));
        }
        for p in &profiles {
            p.validate()?;
        }
        Ok(Self { profiles })
    }

    /// A table holding only `profile`, as `ProfileId(0)`.
    pub fn single(profile: AvoidanceProfile) -> HzResult<Self> {
        Self::new(vec![profile])
    }

    #[inline]
    pub fn get(&self, id: ProfileId) -> Option<&AvoidanceProfile> {
        self.profiles.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProfileId, &AvoidanceProfile)> + '_ {
        self.profiles
            .iter()
            .enumerate()
            .map(|(i, p)| (ProfileId(i as u16), p))
    }

    /// Look up a profile id by name.
    pub fn find(&self, name: &str) -> Option<ProfileId> {
        self.profiles
            .iter()
            .position(|p| p.name == name)
            .map(|i| ProfileId(i as u16))
    }
}

// ── CSV loading ───────────────────────────────────────────────────────────────

const COL_ID: &str = "profile_id";
const COL_NAME: &str = "name";
const NUMERIC_COLUMNS: [&str; 7] = [
    "lookahead_secs",
    "break_formation_threshold",
    "reaction_delay_secs",
    "loose_spacing_min",
    "loose_spacing_max",
    "elasticity_rate",
    "group_break_cooldown_secs",
];

/// Load a [`ProfileTable`] from a CSV file.
pub fn load_profiles_csv(path: &Path) -> HzResult<ProfileTable> {
    let file = std::fs::File::open(path)?;
    load_profiles_reader(file)
}

/// Like [`load_profiles_csv`] but accepts any `Read` source.
///
/// Useful for tests (pass a `std::io::Cursor`) or embedded tables.
pub fn load_profiles_reader<R: Read>(reader: R) -> HzResult<ProfileTable> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let column = |name: &str| -> HzResult<usize> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| HzError::Parse(format!("missing column {name:?}")))
    };
    let id_col = column(COL_ID)?;
    let name_col = headers.iter().position(|h| h.trim() == COL_NAME);
    let numeric_cols: Vec<usize> = NUMERIC_COLUMNS
        .iter()
        .map(|name| column(*name))
        .collect::<HzResult<_>>()?;

    let mut by_id: HashMap<u16, AvoidanceProfile> = HashMap::new();

    for (row_idx, record) in csv_reader.records().enumerate() {
        let record = record?;
        let field = |col: usize| -> HzResult<&str> {
            record
                .get(col)
                .map(str::trim)
                .ok_or_else(|| HzError::Parse(format!("row {row_idx}: missing field {col}")))
        };

        let id: u16 = field(id_col)?
            .parse()
            .map_err(|e| HzError::Parse(format!("row {row_idx}: bad {COL_ID}: {e}")))?;

        let mut values = [0.0_f32; 7];
        for (slot, (&col, name)) in values.iter_mut().zip(numeric_cols.iter().zip(NUMERIC_COLUMNS)) {
            *slot = field(col)?
                .parse()
                .map_err(|e| HzError::Parse(format!("row {row_idx}: bad {name}: {e}")))?;
        }

        let name = match name_col {
            Some(col) if !field(col)?.is_empty() => field(col)?.to_owned(),
            _ => format!("profile_{id}"),
        };

        let profile = AvoidanceProfile {
            name,
            lookahead_secs:            values[0],
            break_formation_threshold: values[1],
            reaction_delay_secs:       values[2],
            loose_spacing_min:         values[3],
            loose_spacing_max:         values[4],
            elasticity_rate:           values[5],
            group_break_cooldown_secs: values[6],
        };

        if by_id.insert(id, profile).is_some() {
            return Err(HzError::Parse(format!("duplicate {COL_ID} {id}")));
        }
    }

    // ── Densify ───────────────────────────────────────────────────────────
    let mut profiles = Vec::with_capacity(by_id.len());
    for i in 0..by_id.len() as u16 {
        match by_id.remove(&i) {
            Some(p) => profiles.push(p),
            None => {
                return Err(HzError::Config(format!(
                    "{COL_ID} values must be dense from 0; {i} is missing"
                )));
            }
        }
    }

    ProfileTable::new(profiles)
}
