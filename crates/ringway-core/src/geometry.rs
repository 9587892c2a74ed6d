//! Polar helpers for ring and gate positions. Angles are in degrees.

/// Wrap an angle into `[0, 360)`.
pub fn wrap_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Signed shortest-arc difference from `from` to `to`, in `(-180, 180]`.
pub fn signed_arc(from: f64, to: f64) -> f64 {
    let diff = (to - from).rem_euclid(360.0);
    if diff > 180.0 { diff - 360.0 } else { diff }
}

/// Unsigned shortest-arc distance between two angles, in `[0, 180]`.
pub fn angular_distance(a: f64, b: f64) -> f64 {
    signed_arc(a, b).abs()
}

/// Turn `angle` toward `target` along the shorter arc by at most `max_step`
/// degrees, landing exactly on `target` once within `snap`.
pub fn turn_toward(angle: f64, target: f64, max_step: f64, snap: f64) -> f64 {
    let diff = signed_arc(angle, target);
    if diff.abs() < snap {
        return wrap_degrees(target);
    }
    let stepped = wrap_degrees(angle + diff.signum() * max_step.min(diff.abs()));
    if angular_distance(stepped, target) < snap {
        wrap_degrees(target)
    } else {
        stepped
    }
}

/// Move a scalar toward `target` by at most `max_step` without crossing it,
/// landing exactly on `target` once within `snap`.
pub fn approach(value: f64, target: f64, max_step: f64, snap: f64) -> f64 {
    let diff = target - value;
    if diff.abs() < snap {
        return target;
    }
    let stepped = value + diff.signum() * max_step.min(diff.abs());
    if (target - stepped).abs() < snap {
        target
    } else {
        stepped
    }
}
