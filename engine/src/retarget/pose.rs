use {
    super::{
        binder::BoneHandleTable,
        joint::JointMap,
        snapshot::{Body, CameraSpacePoint, Vector4},
    },
    crate::scene::{set_global_iso, Global3},
    hecs::World,
    nalgebra as na,
};

pub const DEFAULT_AMPLIFICATION: f32 = 10.0;

/// How sensor orientation is turned into bone rotation.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum OrientationMode {
    /// Builds quaternion from `(x, y, z, x)`, putting `x` in place of `w`.
    Literal,

    /// Uses sensor quaternion `(x, y, z, w)` as is.
    Corrected,
}

impl Default for OrientationMode {
    fn default() -> Self {
        OrientationMode::Literal
    }
}

/// Outcome of posing one rig.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoseStats {
    pub written: usize,
    pub skipped_unmapped: usize,
    pub skipped_unresolved: usize,
    pub skipped_missing: usize,
    pub degenerate_rotations: usize,
}

impl PoseStats {
    pub fn skipped(&self) -> usize {
        self.skipped_unmapped + self.skipped_unresolved + self.skipped_missing
    }
}

/// Writes tracked joint poses onto bound bone nodes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoseApplier {
    amplification: f32,
    orientation: OrientationMode,
}

impl PoseApplier {
    pub fn new(amplification: f32, orientation: OrientationMode) -> Self {
        PoseApplier {
            amplification,
            orientation,
        }
    }

    /// Sensor space to scene space. Uniform scale, axes are kept.
    pub fn target_position(&self, p: CameraSpacePoint) -> na::Vector3<f32> {
        na::Vector3::from(p) * self.amplification
    }

    /// Returns `None` for orientations that cannot be normalized.
    pub fn target_rotation(
        &self,
        o: Vector4,
    ) -> Option<na::UnitQuaternion<f32>> {
        let q = match self.orientation {
            OrientationMode::Literal => na::Quaternion::new(o.x, o.x, o.y, o.z),
            OrientationMode::Corrected => na::Quaternion::new(o.w, o.x, o.y, o.z),
        };
        na::UnitQuaternion::try_new(q, f32::EPSILON)
    }

    /// Poses bones of one rig after `body`.
    ///
    /// Joints without canonical bone are skipped before the handle table
    /// is consulted. Joints without bound bone or without sensor data
    /// are skipped as well, the rest of the body is still posed.
    pub fn apply(
        &self,
        world: &World,
        body: &Body,
        handles: &BoneHandleTable,
        joint_map: &JointMap,
    ) -> PoseStats {
        let mut stats = PoseStats::default();

        for (index, entry) in joint_map.iter() {
            if entry.bone.is_none() {
                stats.skipped_unmapped += 1;
                continue;
            }

            let node = match handles.get(index) {
                Some(node) => node,
                None => {
                    stats.skipped_unresolved += 1;
                    continue;
                }
            };

            let (joint, orientation) = match (
                body.joints.get(&entry.joint),
                body.orientations.get(&entry.joint),
            ) {
                (Some(joint), Some(orientation)) => (joint, orientation),
                _ => {
                    stats.skipped_missing += 1;
                    continue;
                }
            };

            let translation = self.target_position(joint.position);

            let rotation = match self.target_rotation(orientation.orientation) {
                Some(rotation) => rotation,
                None => match world.get::<Global3>(node) {
                    Ok(global) => {
                        stats.degenerate_rotations += 1;
                        global.iso.rotation
                    }
                    Err(_) => {
                        stats.skipped_unresolved += 1;
                        continue;
                    }
                },
            };

            let iso = na::Isometry3::from_parts(translation.into(), rotation);
            match set_global_iso(world, node, iso) {
                Ok(()) => {
                    tracing::trace!(
                        "Joint {} -> {:?} at {:?}",
                        entry.joint,
                        node,
                        translation
                    );
                    stats.written += 1;
                }
                Err(err) => {
                    tracing::warn!(
                        "Bone {:?} of joint {} is gone: {}",
                        node,
                        entry.joint,
                        err
                    );
                    stats.skipped_unresolved += 1;
                }
            }
        }

        stats
    }
}

impl Default for PoseApplier {
    fn default() -> Self {
        PoseApplier::new(DEFAULT_AMPLIFICATION, OrientationMode::default())
    }
}
