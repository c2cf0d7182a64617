// perch_sim/src/simulation/utils/serde_helpers.rs

pub mod vec3_from_array {
    use nalgebra::Vector3;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(vec: &Vector3<f64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq([vec.x, vec.y, vec.z].iter())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vector3<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let arr: [f64; 3] = Deserialize::deserialize(deserializer)?;
        Ok(Vector3::new(arr[0], arr[1], arr[2]))
    }
}

pub mod quat_from_euler_deg {
    use nalgebra::UnitQuaternion;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(quat: &UnitQuaternion<f64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let (roll, pitch, yaw) = quat.euler_angles();
        let arr = [roll.to_degrees(), pitch.to_degrees(), yaw.to_degrees()];
        serializer.collect_seq(arr.iter())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<UnitQuaternion<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        // [roll, pitch, yaw] in degrees
        let arr: [f64; 3] = Deserialize::deserialize(deserializer)?;
        Ok(UnitQuaternion::from_euler_angles(
            arr[0].to_radians(),
            arr[1].to_radians(),
            arr[2].to_radians(),
        ))
    }
}
