//! Bridge groups and the two automatically managed ones.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use strum_macros::{Display, EnumIter};

use crate::errors::Error;
use crate::light::bridge_order;
use crate::value::{DirtyValue, LightSet};

type Result<T> = std::result::Result<T, Error>;

/// Which distinguished group a tracking operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum GroupKind {
    /// Lights whose brightness follows the desired brightness
    Brightness,
    /// Lights whose color temperature follows the desired temperature
    Temperature,
}

/// A named collection of lights on the bridge.
///
/// Only the two distinguished groups are reconciled; other groups are kept
/// for name lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    name: String,
    number: String,
    pub(crate) lights: LightSet,
    pub(crate) brightness: DirtyValue<u8>,
    pub(crate) color_temp: DirtyValue<u16>,
}

/// One entry of `GET /groups`.
#[derive(Debug, Deserialize)]
struct GroupRecord {
    #[serde(default)]
    name: String,
    #[serde(default)]
    lights: Vec<String>,
}

impl Group {
    pub fn new(number: &str, name: &str, lights: BTreeSet<String>) -> Self {
        Group {
            name: name.to_string(),
            number: number.to_string(),
            lights: LightSet::new(lights),
            brightness: DirtyValue::empty(),
            color_temp: DirtyValue::empty(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bridge-local numeric id.
    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn lights(&self) -> &LightSet {
        &self.lights
    }

    pub fn brightness(&self) -> &DirtyValue<u8> {
        &self.brightness
    }

    pub fn color_temp(&self) -> &DirtyValue<u16> {
        &self.color_temp
    }

    /// Resource path of the group itself.
    pub fn path(&self) -> String {
        format!("/groups/{}", self.number)
    }

    /// Resource path of the group's action endpoint.
    pub fn action_path(&self) -> String {
        format!("/groups/{}/action", self.number)
    }

    /// Discard all acknowledgement state after the group was reloaded.
    pub(crate) fn reset_tracking(&mut self) {
        self.lights.reset(BTreeSet::new());
        self.brightness.reset(0);
        self.color_temp.reset(0);
    }

    /// Decode a `GET /groups` body, ordered by bridge number.
    pub(crate) fn from_listing(body: &Value) -> Result<Vec<Group>> {
        if !body.is_object() {
            return Err(Error::malformed_listing("groups"));
        }
        let records: HashMap<String, GroupRecord> =
            serde_json::from_value(body.clone()).map_err(Error::JsonLoad)?;

        let mut groups: Vec<Group> = records
            .into_iter()
            .map(|(number, record)| {
                Group::new(&number, &record.name, record.lights.into_iter().collect())
            })
            .collect();
        groups.sort_by(|a, b| bridge_order(&a.number, &b.number));
        Ok(groups)
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Group {} \"{}\" {}", self.number, self.name, self.lights)
    }
}
