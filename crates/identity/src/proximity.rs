//! Spatial association between identity re-checks

use camera_capture::Point;

/// Box centres closer than this (pixels) are treated as the same subject
pub const DEFAULT_PROXIMITY_RADIUS: f64 = 100.0;

/// Nearest tracked subject whose last centre is strictly within `radius`.
///
/// Only keeps an existing tracker continuous; it is not identity
/// verification and never yields a subject that was not passed in.
pub fn associate_by_proximity<K, I>(center: Point, subjects: I, radius: f64) -> Option<K>
where
    I: IntoIterator<Item = (K, Point)>,
{
    subjects
        .into_iter()
        .map(|(key, position)| (key, position.distance(&center)))
        .filter(|(_, distance)| *distance < radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(key, _)| key)
}
