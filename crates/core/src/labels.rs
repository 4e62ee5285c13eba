//! Class id to human label lookup for the GTSRB traffic-sign classes.

use std::borrow::Cow;

/// Number of classes the bundled model was trained on.
pub const CLASS_COUNT: usize = 43;

/// GTSRB (German Traffic Sign Recognition Benchmark) labels, indexed by class id.
pub const GTSRB_LABELS: [&str; CLASS_COUNT] = [
    "Speed limit (20km/h)",
    "Speed limit (30km/h)",
    "Speed limit (50km/h)",
    "Speed limit (60km/h)",
    "Speed limit (70km/h)",
    "Speed limit (80km/h)",
    "End of speed limit (80km/h)",
    "Speed limit (100km/h)",
    "Speed limit (120km/h)",
    "No passing",
    "No passing veh over 3.5 tons",
    "Right-of-way at intersection",
    "Priority road",
    "Yield",
    "Stop",
    "No vehicles",
    "Veh > 3.5 tons prohibited",
    "No entry",
    "General caution",
    "Dangerous curve left",
    "Dangerous curve right",
    "Double curve",
    "Bumpy road",
    "Slippery road",
    "Road narrows on the right",
    "Road work",
    "Traffic signals",
    "Pedestrians",
    "Children crossing",
    "Bicycles crossing",
    "Beware of ice/snow",
    "Wild animals crossing",
    "End speed + passing limits",
    "Turn right ahead",
    "Turn left ahead",
    "Ahead only",
    "Go straight or right",
    "Go straight or left",
    "Keep right",
    "Keep left",
    "Roundabout mandatory",
    "End of no passing",
    "End no passing veh > 3.5 tons",
];

/// Resolve a model class id to its label.
///
/// Ids outside the table never fail; they are rendered as `Unknown (<id>)`
/// so a model exported with extra classes still produces usable output.
pub fn label_for(class_id: u32) -> Cow<'static, str> {
    match GTSRB_LABELS.get(class_id as usize) {
        Some(label) => Cow::Borrowed(*label),
        None => Cow::Owned(format!("Unknown ({class_id})")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_ids_resolve_to_table_entries() {
        assert_eq!(label_for(0), "Speed limit (20km/h)");
        assert_eq!(label_for(14), "Stop");
        assert_eq!(label_for(42), "End no passing veh > 3.5 tons");
    }

    #[test]
    fn unknown_id_is_synthesized() {
        assert_eq!(label_for(43), "Unknown (43)");
        assert_eq!(label_for(99), "Unknown (99)");
    }

    #[test]
    fn table_has_no_duplicates() {
        let mut sorted = GTSRB_LABELS.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), CLASS_COUNT);
    }
}
