//! Device orientation sensor
//!
//! Browsers report device orientation as three Euler angles in degrees:
//! `alpha` (compass heading around the vertical axis), `beta` (front/back
//! tilt) and `gamma` (left/right tilt). Without full 6-DOF tracking these
//! readings drive a rotation-only camera.

use glam::{EulerRot, Quat};
use serde::{Deserialize, Serialize};

/// A single orientation reading in degrees
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OrientationReading {
    pub alpha: f32,
    pub beta: f32,
    pub gamma: f32,
}

impl OrientationReading {
    pub fn new(alpha: f32, beta: f32, gamma: f32) -> Self {
        Self { alpha, beta, gamma }
    }
}

/// Orientation sensor state
///
/// The first reading after permission is granted becomes the reference
/// heading, so the camera starts out looking "forward" regardless of the
/// compass direction the device faces.
#[derive(Debug, Clone, Default)]
pub struct OrientationSensor {
    permitted: bool,
    current: OrientationReading,
    initial: Option<OrientationReading>,
}

impl OrientationSensor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sensor that accepts readings immediately
    pub fn permitted() -> Self {
        Self {
            permitted: true,
            ..Self::default()
        }
    }

    pub fn set_permission(&mut self, granted: bool) {
        self.permitted = granted;
    }

    pub fn is_permitted(&self) -> bool {
        self.permitted
    }

    /// Feed a new reading; ignored until permission is granted
    pub fn update(&mut self, reading: OrientationReading) {
        if !self.permitted {
            return;
        }

        self.current = reading;
        if self.initial.is_none() {
            self.initial = Some(reading);
        }
    }

    pub fn current(&self) -> OrientationReading {
        self.current
    }

    /// Camera rotation derived from the latest reading
    ///
    /// Applied in YXZ order: heading relative to the reference reading, tilt
    /// offset so an upright device looks along the horizon, then roll.
    /// Returns None before the first accepted reading.
    pub fn camera_rotation(&self) -> Option<Quat> {
        let initial = self.initial?;

        let yaw = (self.current.alpha - initial.alpha).to_radians();
        let pitch = self.current.beta.to_radians() - std::f32::consts::FRAC_PI_2;
        let roll = -self.current.gamma.to_radians();

        Some(Quat::from_euler(EulerRot::YXZ, yaw, pitch, roll))
    }

    /// Drop the reference heading so the next reading re-centres the camera
    pub fn recenter(&mut self) {
        self.initial = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_ignored_without_permission() {
        let mut sensor = OrientationSensor::new();
        sensor.update(OrientationReading::new(10.0, 90.0, 0.0));
        assert!(sensor.camera_rotation().is_none());

        sensor.set_permission(true);
        sensor.update(OrientationReading::new(10.0, 90.0, 0.0));
        assert!(sensor.camera_rotation().is_some());
    }

    #[test]
    fn test_upright_device_looks_forward() {
        let mut sensor = OrientationSensor::permitted();
        sensor.update(OrientationReading::new(123.0, 90.0, 0.0));

        let forward = sensor.camera_rotation().unwrap() * Vec3::NEG_Z;
        assert!((forward - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn test_heading_is_relative_to_first_reading() {
        let mut sensor = OrientationSensor::permitted();
        sensor.update(OrientationReading::new(200.0, 90.0, 0.0));
        sensor.update(OrientationReading::new(290.0, 90.0, 0.0));

        // +90 degrees of yaw turns -Z toward -X
        let forward = sensor.camera_rotation().unwrap() * Vec3::NEG_Z;
        assert!((forward - Vec3::NEG_X).length() < 1e-5);
    }

    #[test]
    fn test_recenter() {
        let mut sensor = OrientationSensor::permitted();
        sensor.update(OrientationReading::new(0.0, 90.0, 0.0));
        sensor.recenter();
        sensor.update(OrientationReading::new(45.0, 90.0, 0.0));

        let forward = sensor.camera_rotation().unwrap() * Vec3::NEG_Z;
        assert!((forward - Vec3::NEG_Z).length() < 1e-5);
    }
}
