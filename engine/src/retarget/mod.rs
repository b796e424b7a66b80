//! Drives humanoid rigs from tracked body skeletons.
//!
//! Each frame `SkeletonTracker` matches bodies reported by a `SkeletonSource`
//! against live rigs, spawns rigs for new bodies (binding their bones once
//! with `BoneBinder`), despawns rigs of lost bodies and poses every tracked
//! body's rig with `PoseApplier`.

pub mod binder;
pub mod joint;
pub mod pose;
pub mod rig;
pub mod snapshot;
pub mod system;
pub mod tracker;

pub use self::{
    binder::{BoneBinder, BoneHandleTable},
    joint::{HumanBone, JointMap, JointMapEntry, JointType},
    pose::{OrientationMode, PoseApplier, PoseStats},
    rig::{BoneDesc, Humanoid, HumanoidTemplate, RigHierarchy, RigTemplate},
    snapshot::{
        Body, CameraSpacePoint, Joint, JointOrientation, Recording,
        SkeletonSnapshot, SkeletonSource, TrackingState, Vector4,
    },
    system::RetargetSystem,
    tracker::{Reconciled, Registry, RigInstance, SkeletonTracker},
};
