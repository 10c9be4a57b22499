use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use serde::Deserialize;

/// Geometry-query handle for one sensor or ladder.
pub trait SensorGeometry {
    fn name(&self) -> &str;

    /// Maps a point from the sensor's local frame to the global frame.
    fn to_global(&self, local: &Point3<f64>) -> Point3<f64>;

    /// Whether a global point lies inside the sensor volume.
    fn is_inside(&self, global: &Point3<f64>) -> bool;
}

/// Axis-aligned box in its local frame, placed by a rigid transform.
#[derive(Clone, Debug)]
pub struct BoxSensor {
    name: String,
    placement: Isometry3<f64>,
    min: Point3<f64>,
    max: Point3<f64>,
}

impl BoxSensor {
    /// Box centred on the local origin with the given half extents.
    pub fn centered(name: impl Into<String>, placement: Isometry3<f64>, half: Vector3<f64>) -> Self {
        Self::with_bounds(name, placement, Point3::from(-half), Point3::from(half))
    }

    pub fn with_bounds(
        name: impl Into<String>,
        placement: Isometry3<f64>,
        min: Point3<f64>,
        max: Point3<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            placement,
            min,
            max,
        }
    }

    pub fn placement(&self) -> &Isometry3<f64> {
        &self.placement
    }

    pub fn bounds(&self) -> (Point3<f64>, Point3<f64>) {
        (self.min, self.max)
    }
}

impl SensorGeometry for BoxSensor {
    fn name(&self) -> &str {
        &self.name
    }

    fn to_global(&self, local: &Point3<f64>) -> Point3<f64> {
        self.placement.transform_point(local)
    }

    fn is_inside(&self, global: &Point3<f64>) -> bool {
        let local = self.placement.inverse_transform_point(global);
        (0..3).all(|i| local[i] >= self.min[i] && local[i] <= self.max[i])
    }
}

/// Serialized description of a box sensor.
#[derive(Clone, Debug, Deserialize)]
pub struct BoxSensorSpec {
    pub name: String,
    /// Global position of the local origin (mm).
    pub position: [f64; 3],
    /// Rotation angles about x, y, z (rad), applied in that order.
    #[serde(default)]
    pub rotation: [f64; 3],
    /// Local lower corner (mm).
    pub min: [f64; 3],
    /// Local upper corner (mm).
    pub max: [f64; 3],
}

impl From<&BoxSensorSpec> for BoxSensor {
    fn from(spec: &BoxSensorSpec) -> Self {
        let [rx, ry, rz] = spec.rotation;
        let rotation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), rz)
            * UnitQuaternion::from_axis_angle(&Vector3::y_axis(), ry)
            * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), rx);
        let placement = Isometry3::from_parts(Translation3::from(Vector3::from(spec.position)), rotation);
        BoxSensor::with_bounds(
            spec.name.clone(),
            placement,
            Point3::from(spec.min),
            Point3::from(spec.max),
        )
    }
}
