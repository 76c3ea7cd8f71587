use chrono::NaiveDateTime;
use speedcore::detection::Direction;

/// Builds the camera's image file name, e.g.
/// `20261019_081502_L2R_red_car_61_5km_per_h.jpg`.
pub fn image_file_name(
    timestamp: NaiveDateTime,
    direction: Direction,
    color: &str,
    object_type: &str,
    speed_kmh: f64,
) -> String {
    let speed = format!("{:.1}", speed_kmh).replace('.', "_");
    format!(
        "{}_{}_{}_{}_{}km_per_h.jpg",
        timestamp.format("%Y%m%d_%H%M%S"),
        direction,
        color,
        object_type,
        speed
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn file_name_follows_camera_layout() {
        let timestamp = NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(8, 15, 2)
            .unwrap();
        let name = image_file_name(timestamp, Direction::L2R, "red", "car", 61.54);
        assert_eq!(name, "20261019_081502_L2R_red_car_61_5km_per_h.jpg");
    }
}
