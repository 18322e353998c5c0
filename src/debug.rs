use crate::math::Point3d;
#[cfg(feature = "debug")]
use serde_json::json;

#[cfg(feature = "debug")]
thread_local!(
    static DEBUG_FRAME: std::cell::RefCell<Vec<serde_json::Value>> = Default::default();
);

#[allow(unused)]
pub fn debug_line(name: &str, p1: Point3d, p2: Point3d) {
    #[cfg(feature = "debug")]
    DEBUG_FRAME.with(|frame| {
        frame.borrow_mut().push(json!({
            "type": "line",
            "name": name,
            "p1": [p1.x, p1.y, p1.z],
            "p2": [p2.x, p2.y, p2.z],
        }))
    })
}

#[allow(unused)]
pub fn debug_point(name: &str, point: Point3d) {
    #[cfg(feature = "debug")]
    DEBUG_FRAME.with(|frame| {
        frame.borrow_mut().push(json!({
            "type": "point",
            "name": name,
            "p": [point.x, point.y, point.z],
        }))
    })
}

/// Records a polyline as a chain of line segments.
#[allow(unused)]
pub fn debug_curve(name: &str, points: &[Point3d]) {
    for pair in points.windows(2) {
        debug_line(name, pair[0], pair[1]);
    }
}

/// Drains the debug geometry recorded on this thread.
#[cfg(feature = "debug")]
pub fn take_debug_frame() -> serde_json::Value {
    json!(DEBUG_FRAME.with(|frame| frame.take()))
}
