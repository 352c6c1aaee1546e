use charter_core::availability::{AvailabilityEntry, AvailabilitySlot};

/// Normalises one native availability entry. Capacity and booked counts pass through as-is.
pub fn to_slot(entry: &AvailabilityEntry) -> Option<AvailabilitySlot> {
    let starts_at = entry.starts_at()?;
    Some(AvailabilitySlot {
        id: entry.id.clone(),
        starts_at,
        capacity: entry.availability_count,
        booked: entry.booked_participants,
        available: !entry.unavailable && !entry.sold_out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(unavailable: bool, sold_out: bool) -> AvailabilityEntry {
        serde_json::from_value(json!({
            "id": "slot-1",
            "date": 1760745600000i64,
            "startTime": "09:00",
            "availabilityCount": 10,
            "bookedParticipants": 10,
            "unavailable": unavailable,
            "soldOut": sold_out
        }))
        .unwrap()
    }

    #[test]
    fn availability_requires_both_flags_clear() {
        assert!(to_slot(&entry(false, false)).unwrap().available);
        assert!(!to_slot(&entry(true, false)).unwrap().available);
        assert!(!to_slot(&entry(false, true)).unwrap().available);
    }

    #[test]
    fn counts_pass_through() {
        let slot = to_slot(&entry(false, false)).unwrap();
        assert_eq!(slot.capacity, 10);
        assert_eq!(slot.booked, 10);
    }
}
