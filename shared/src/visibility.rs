use crate::AssignmentStatus;

/// Region served by each courier. Drivers outside this table see nothing.
pub const DRIVER_REGIONS: [(i32, &str); 6] = [
    (1, "Центр"),
    (2, "Север"),
    (3, "Юг"),
    (4, "Восток"),
    (5, "Запад"),
    (6, "Пригород"),
];

pub fn driver_region(driver_id: i32) -> Option<&'static str> {
    DRIVER_REGIONS
        .iter()
        .find(|(id, _)| *id == driver_id)
        .map(|(_, region)| *region)
}

pub fn regions_match(a: &str, b: &str) -> bool {
    let a = a.trim();
    let b = b.trim();
    !a.is_empty() && a.to_lowercase() == b.to_lowercase()
}

/// Whether a driver should see a lead in their delivery list.
///
/// `status` is the lead's current assignment status; a lead with no
/// assignment yet counts as open.
pub fn is_visible_to_driver(driver_id: i32, lead_region: Option<&str>, status: Option<&str>) -> bool {
    let (Some(driver_region), Some(lead_region)) = (driver_region(driver_id), lead_region) else {
        return false;
    };

    if !regions_match(driver_region, lead_region) {
        return false;
    }

    !status.map(AssignmentStatus::parse).is_some_and(|s| s.is_closed())
}
