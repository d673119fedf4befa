use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Longest plate a slot accepts, in characters.
pub const PLATE_MAX_LEN: usize = 6;

// ---------------------------------------------------------------------------
// SlotState
// ---------------------------------------------------------------------------

/// Occupancy state of a slot.
///
/// ```text
/// AVAILABLE --assign--> OCCUPIED --release--> AVAILABLE
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotState {
    #[default]
    Available,
    Occupied,
}

impl SlotState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::Occupied => "OCCUPIED",
        }
    }
}

impl std::fmt::Display for SlotState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Slot — the persisted record
// ---------------------------------------------------------------------------

/// A single parking space.
///
/// `state == AVAILABLE` holds exactly when `plate` is empty, `entry_time` is
/// unset and `pin` is empty. See [`Slot::check_invariant`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    /// Opaque key, filled in by the store on insert.
    #[serde(default)]
    pub id: String,

    /// Sequence-assigned slot number, starting at 1. Never reused.
    pub number: u32,

    #[serde(default)]
    pub state: SlotState,

    /// Plate of the parked vehicle; empty while available.
    #[serde(default)]
    pub plate: String,

    /// When the current occupancy started.
    #[serde(default)]
    pub entry_time: Option<DateTime<Utc>>,

    /// When the fee for the current occupancy was last computed.
    #[serde(default)]
    pub exit_time: Option<DateTime<Utc>>,

    /// PHC-format argon2 hash of `"{number}{plate}"`; empty while available.
    #[serde(default)]
    pub pin: String,
}

impl Slot {
    /// A fresh, available slot. The store assigns `id` on insert.
    pub fn available(number: u32) -> Self {
        Self {
            id: String::new(),
            number,
            state: SlotState::Available,
            plate: String::new(),
            entry_time: None,
            exit_time: None,
            pin: String::new(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.state == SlotState::Available
    }

    /// Start an occupancy. `pin` must already be hashed.
    pub fn occupy(&mut self, plate: &str, at: DateTime<Utc>, pin: String) {
        self.state = SlotState::Occupied;
        self.plate = plate.to_string();
        self.entry_time = Some(at);
        self.exit_time = None;
        self.pin = pin;
    }

    /// End the occupancy and clear everything tied to it.
    pub fn vacate(&mut self) {
        self.state = SlotState::Available;
        self.plate.clear();
        self.entry_time = None;
        self.exit_time = None;
        self.pin.clear();
    }

    /// Check the AVAILABLE/OCCUPIED consistency rules.
    pub fn check_invariant(&self) -> Result<(), String> {
        check_plate_len(&self.plate)?;
        match self.state {
            SlotState::Available => {
                if !self.plate.is_empty() {
                    return Err("an available slot cannot hold a plate".into());
                }
                if self.entry_time.is_some() || self.exit_time.is_some() {
                    return Err("an available slot cannot carry entry or exit times".into());
                }
                if !self.pin.is_empty() {
                    return Err("an available slot cannot carry a pin".into());
                }
            }
            SlotState::Occupied => {
                if self.plate.is_empty() {
                    return Err("an occupied slot needs a plate".into());
                }
                if self.entry_time.is_none() {
                    return Err("an occupied slot needs an entry time".into());
                }
                if self.pin.is_empty() {
                    return Err("an occupied slot needs a pin".into());
                }
            }
        }
        Ok(())
    }
}

/// Validate a plate offered for assignment.
pub fn validate_plate(plate: &str) -> Result<(), String> {
    if plate.trim().is_empty() {
        return Err("plate must not be empty".into());
    }
    check_plate_len(plate)
}

fn check_plate_len(plate: &str) -> Result<(), String> {
    if plate.chars().count() > PLATE_MAX_LEN {
        return Err(format!("plate must be at most {PLATE_MAX_LEN} characters"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// SlotView — what leaves the process
// ---------------------------------------------------------------------------

/// Read-side projection of a [`Slot`]. The pin hash never leaves the server;
/// `has_pin` tells the caller whether one is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotView {
    pub id: String,
    pub number: u32,
    pub state: SlotState,
    pub plate: String,
    pub entry_time: Option<DateTime<Utc>>,
    pub exit_time: Option<DateTime<Utc>>,
    pub has_pin: bool,
}

impl From<&Slot> for SlotView {
    fn from(slot: &Slot) -> Self {
        Self {
            id: slot.id.clone(),
            number: slot.number,
            state: slot.state,
            plate: slot.plate.clone(),
            entry_time: slot.entry_time,
            exit_time: slot.exit_time,
            has_pin: !slot.pin.is_empty(),
        }
    }
}

// ---------------------------------------------------------------------------
// Operation inputs / outputs
// ---------------------------------------------------------------------------

/// Body for `POST /slots/@assign`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub plate: String,
}

/// Confirmation of a successful assignment. Carries no fee and no pin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: String,
    pub number: u32,
}

/// Body for `PUT /slots/{id}`.
///
/// Absent fields are left alone. For the timestamps, an explicit `null`
/// clears the value. `id`, `number` and `pin` are accepted only so that a
/// full record can be sent back unchanged; changing them is rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotPatch {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub number: Option<u32>,

    #[serde(default)]
    pub state: Option<SlotState>,

    #[serde(default)]
    pub plate: Option<String>,

    #[serde(default, deserialize_with = "present")]
    pub entry_time: Option<Option<DateTime<Utc>>>,

    #[serde(default, deserialize_with = "present")]
    pub exit_time: Option<Option<DateTime<Utc>>>,

    #[serde(default)]
    pub pin: Option<String>,
}

/// Distinguish a field sent as `null` (`Some(None)`) from a missing one (`None`).
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn new_slot_is_consistent() {
        let slot = Slot::available(1);
        assert!(slot.is_available());
        assert!(slot.check_invariant().is_ok());
    }

    #[test]
    fn occupy_then_vacate_keeps_invariant() {
        let mut slot = Slot::available(3);
        slot.occupy("ABC123", at("2024-05-01T08:00:00Z"), "$argon2id$fake".into());
        assert_eq!(slot.state, SlotState::Occupied);
        assert!(slot.check_invariant().is_ok());

        slot.exit_time = Some(at("2024-05-01T09:00:00Z"));
        assert!(slot.check_invariant().is_ok());

        slot.vacate();
        assert_eq!(slot, Slot::available(3));
    }

    #[test]
    fn invariant_catches_half_cleared_slot() {
        let mut slot = Slot::available(1);
        slot.plate = "XYZ".into();
        assert!(slot.check_invariant().is_err());

        let mut slot = Slot::available(1);
        slot.state = SlotState::Occupied;
        slot.plate = "XYZ".into();
        slot.entry_time = Some(at("2024-05-01T08:00:00Z"));
        let err = slot.check_invariant().unwrap_err();
        assert!(err.contains("pin"), "got: {err}");
    }

    #[test]
    fn plate_rules() {
        assert!(validate_plate("ABC123").is_ok());
        assert!(validate_plate("ÑANDU1").is_ok(), "length counts characters, not bytes");
        assert!(validate_plate("ABC1234").is_err());
        assert!(validate_plate("").is_err());
        assert!(validate_plate("   ").is_err());
    }

    #[test]
    fn state_wire_format() {
        assert_eq!(serde_json::to_string(&SlotState::Available).unwrap(), "\"AVAILABLE\"");
        assert_eq!(serde_json::to_string(&SlotState::Occupied).unwrap(), "\"OCCUPIED\"");
    }

    #[test]
    fn view_hides_pin() {
        let mut slot = Slot::available(2);
        slot.id = "abc".into();
        slot.occupy("QWE987", at("2024-05-01T08:00:00Z"), "$argon2id$secret".into());

        let json = serde_json::to_value(SlotView::from(&slot)).unwrap();
        assert!(json.get("pin").is_none());
        assert_eq!(json["hasPin"], true);
        assert_eq!(json["state"], "OCCUPIED");
        assert_eq!(json["entryTime"], "2024-05-01T08:00:00Z");
    }

    #[test]
    fn patch_distinguishes_null_from_missing() {
        let patch: SlotPatch = serde_json::from_str(r#"{"exitTime": null}"#).unwrap();
        assert_eq!(patch.exit_time, Some(None));
        assert_eq!(patch.entry_time, None);

        let patch: SlotPatch =
            serde_json::from_str(r#"{"entryTime": "2024-05-01T08:00:00Z"}"#).unwrap();
        assert_eq!(patch.entry_time, Some(Some(at("2024-05-01T08:00:00Z"))));
    }
}
