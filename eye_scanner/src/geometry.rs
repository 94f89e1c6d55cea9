//! Spherical ⇄ Cartesian conversion.
//!
//! Elevation θ is measured from +Z, azimuth φ from +X towards +Y, both in
//! degrees. Distances are millimetres.

use eye_common::consts::FULL_CIRCLE_DEG;

/// Convert a spherical sample to `[x, y, z]`.
#[inline]
pub fn spherical_to_cartesian(elevation_deg: f64, azimuth_deg: f64, distance: f64) -> [f64; 3] {
    let theta = elevation_deg.to_radians();
    let phi = azimuth_deg.to_radians();
    let (sin_t, cos_t) = theta.sin_cos();
    let (sin_p, cos_p) = phi.sin_cos();
    [
        distance * sin_t * cos_p,
        distance * sin_t * sin_p,
        distance * cos_t,
    ]
}

/// Convert `[x, y, z]` back to `(elevation°, azimuth°, distance)`.
///
/// Azimuth is normalized to `[0, 360)`. The origin maps to `(0, 0, 0)`.
pub fn cartesian_to_spherical(x: f64, y: f64, z: f64) -> (f64, f64, f64) {
    let distance = (x * x + y * y + z * z).sqrt();
    if distance == 0.0 {
        return (0.0, 0.0, 0.0);
    }
    let elevation = (z / distance).clamp(-1.0, 1.0).acos().to_degrees();
    let mut azimuth = y.atan2(x).to_degrees().rem_euclid(FULL_CIRCLE_DEG);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if azimuth >= FULL_CIRCLE_DEG {
        azimuth = 0.0;
    }
    (elevation, azimuth, distance)
}
