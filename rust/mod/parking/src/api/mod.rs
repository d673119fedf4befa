mod slots;

use std::sync::Arc;

use axum::Router;

use crate::registry::SlotRegistry;

/// Build the parking module router.
///
/// Routes:
/// - `POST   /slots`               — create slot
/// - `GET    /slots`               — list slots
/// - `GET    /slots/@available`    — list available slots
/// - `POST   /slots/@assign`       — park a vehicle
/// - `GET    /slots/{id}`          — get slot
/// - `PUT    /slots/{id}`          — update slot
/// - `DELETE /slots/{id}`          — delete slot
/// - `GET    /slots/{id}/@fee`     — bill current occupancy
/// - `POST   /slots/{id}/@release` — end occupancy
pub fn router(registry: Arc<SlotRegistry>) -> Router {
    slots::router(registry)
}
