use std::fmt;

/// Joints reported by a Kinect v2 style body tracker.
/// Discriminants follow the sensor's own numbering.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum JointType {
    SpineBase = 0,
    SpineMid = 1,
    Neck = 2,
    Head = 3,
    ShoulderLeft = 4,
    ElbowLeft = 5,
    WristLeft = 6,
    HandLeft = 7,
    ShoulderRight = 8,
    ElbowRight = 9,
    WristRight = 10,
    HandRight = 11,
    HipLeft = 12,
    KneeLeft = 13,
    AnkleLeft = 14,
    FootLeft = 15,
    HipRight = 16,
    KneeRight = 17,
    AnkleRight = 18,
    FootRight = 19,
    SpineShoulder = 20,
    HandTipLeft = 21,
    ThumbLeft = 22,
    HandTipRight = 23,
    ThumbRight = 24,
}

impl JointType {
    pub const COUNT: usize = 25;

    pub const ALL: [JointType; JointType::COUNT] = [
        JointType::SpineBase,
        JointType::SpineMid,
        JointType::Neck,
        JointType::Head,
        JointType::ShoulderLeft,
        JointType::ElbowLeft,
        JointType::WristLeft,
        JointType::HandLeft,
        JointType::ShoulderRight,
        JointType::ElbowRight,
        JointType::WristRight,
        JointType::HandRight,
        JointType::HipLeft,
        JointType::KneeLeft,
        JointType::AnkleLeft,
        JointType::FootLeft,
        JointType::HipRight,
        JointType::KneeRight,
        JointType::AnkleRight,
        JointType::FootRight,
        JointType::SpineShoulder,
        JointType::HandTipLeft,
        JointType::ThumbLeft,
        JointType::HandTipRight,
        JointType::ThumbRight,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            JointType::SpineBase => "SpineBase",
            JointType::SpineMid => "SpineMid",
            JointType::Neck => "Neck",
            JointType::Head => "Head",
            JointType::ShoulderLeft => "ShoulderLeft",
            JointType::ElbowLeft => "ElbowLeft",
            JointType::WristLeft => "WristLeft",
            JointType::HandLeft => "HandLeft",
            JointType::ShoulderRight => "ShoulderRight",
            JointType::ElbowRight => "ElbowRight",
            JointType::WristRight => "WristRight",
            JointType::HandRight => "HandRight",
            JointType::HipLeft => "HipLeft",
            JointType::KneeLeft => "KneeLeft",
            JointType::AnkleLeft => "AnkleLeft",
            JointType::FootLeft => "FootLeft",
            JointType::HipRight => "HipRight",
            JointType::KneeRight => "KneeRight",
            JointType::AnkleRight => "AnkleRight",
            JointType::FootRight => "FootRight",
            JointType::SpineShoulder => "SpineShoulder",
            JointType::HandTipLeft => "HandTipLeft",
            JointType::ThumbLeft => "ThumbLeft",
            JointType::HandTipRight => "HandTipRight",
            JointType::ThumbRight => "ThumbRight",
        }
    }
}

impl fmt::Display for JointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Canonical bones of a humanoid rig.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum HumanBone {
    Hips,
    LeftUpperLeg,
    RightUpperLeg,
    LeftLowerLeg,
    RightLowerLeg,
    LeftFoot,
    RightFoot,
    Spine,
    Chest,
    UpperChest,
    Neck,
    Head,
    LeftShoulder,
    RightShoulder,
    LeftUpperArm,
    RightUpperArm,
    LeftLowerArm,
    RightLowerArm,
    LeftHand,
    RightHand,
    LeftToes,
    RightToes,
    LeftEye,
    RightEye,
    Jaw,
    LeftThumbProximal,
    LeftThumbIntermediate,
    LeftThumbDistal,
    LeftIndexProximal,
    LeftIndexIntermediate,
    LeftIndexDistal,
    RightThumbProximal,
    RightThumbIntermediate,
    RightThumbDistal,
    RightIndexProximal,
    RightIndexIntermediate,
    RightIndexDistal,
}

/// One row of the joint map.
/// `bone` is `None` when the tracked joint has no counterpart on the rig.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
pub struct JointMapEntry {
    pub joint: JointType,
    #[serde(default)]
    pub bone: Option<HumanBone>,
}

impl JointMapEntry {
    pub const fn new(joint: JointType, bone: HumanBone) -> Self {
        JointMapEntry {
            joint,
            bone: Some(bone),
        }
    }

    pub const fn unmapped(joint: JointType) -> Self {
        JointMapEntry { joint, bone: None }
    }
}

/// Association of logical joint indices to tracked joints and rig bones.
///
/// Logical index is the position of an entry in the table.
/// Immutable once built, share it behind `Arc` between trackers.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct JointMap {
    entries: Box<[JointMapEntry]>,
}

const KINECT_V2: [JointMapEntry; 25] = [
    JointMapEntry::new(JointType::SpineBase, HumanBone::Hips),
    JointMapEntry::new(JointType::SpineMid, HumanBone::Spine),
    JointMapEntry::new(JointType::Neck, HumanBone::Neck),
    JointMapEntry::new(JointType::Head, HumanBone::Head),
    JointMapEntry::new(JointType::ShoulderLeft, HumanBone::LeftUpperArm),
    JointMapEntry::new(JointType::ElbowLeft, HumanBone::LeftLowerArm),
    JointMapEntry::new(JointType::WristLeft, HumanBone::LeftHand),
    JointMapEntry::new(JointType::HandLeft, HumanBone::LeftThumbProximal),
    JointMapEntry::new(JointType::ShoulderRight, HumanBone::RightUpperArm),
    JointMapEntry::new(JointType::ElbowRight, HumanBone::RightLowerArm),
    JointMapEntry::new(JointType::WristRight, HumanBone::RightHand),
    JointMapEntry::new(JointType::HandRight, HumanBone::RightThumbProximal),
    JointMapEntry::new(JointType::HipLeft, HumanBone::LeftUpperLeg),
    JointMapEntry::new(JointType::KneeLeft, HumanBone::LeftLowerLeg),
    JointMapEntry::new(JointType::AnkleLeft, HumanBone::LeftFoot),
    JointMapEntry::new(JointType::FootLeft, HumanBone::LeftToes),
    JointMapEntry::new(JointType::HipRight, HumanBone::RightUpperLeg),
    JointMapEntry::new(JointType::KneeRight, HumanBone::RightLowerLeg),
    JointMapEntry::new(JointType::AnkleRight, HumanBone::RightFoot),
    JointMapEntry::new(JointType::FootRight, HumanBone::RightToes),
    JointMapEntry::new(JointType::SpineShoulder, HumanBone::Chest),
    JointMapEntry::new(JointType::HandTipLeft, HumanBone::LeftIndexProximal),
    JointMapEntry::new(JointType::ThumbLeft, HumanBone::LeftThumbIntermediate),
    JointMapEntry::new(JointType::HandTipRight, HumanBone::RightIndexProximal),
    JointMapEntry::new(
        JointType::ThumbRight,
        HumanBone::RightThumbIntermediate,
    ),
];

impl JointMap {
    pub fn new(entries: impl Into<Box<[JointMapEntry]>>) -> Self {
        JointMap {
            entries: entries.into(),
        }
    }

    /// Full body table for Kinect v2 skeletons.
    pub fn kinect_v2() -> Self {
        JointMap::new(KINECT_V2.to_vec())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in logical index order.
    pub fn iter(
        &self,
    ) -> impl ExactSizeIterator<Item = (usize, &JointMapEntry)> + '_ {
        self.entries.iter().enumerate()
    }

    pub fn entry(&self, index: usize) -> Option<&JointMapEntry> {
        self.entries.get(index)
    }

    pub fn joint(&self, index: usize) -> Option<JointType> {
        self.entries.get(index).map(|entry| entry.joint)
    }

    pub fn bone(&self, index: usize) -> Option<HumanBone> {
        self.entries.get(index).and_then(|entry| entry.bone)
    }
}

impl Default for JointMap {
    fn default() -> Self {
        JointMap::kinect_v2()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinect_table_follows_sensor_order() {
        let map = JointMap::kinect_v2();
        assert_eq!(map.len(), 25);

        for (index, entry) in map.iter() {
            assert_eq!(entry.joint as usize, index);
            assert_eq!(JointType::ALL[index], entry.joint);
            assert!(entry.bone.is_some());
        }

        assert_eq!(map.bone(0), Some(HumanBone::Hips));
        assert_eq!(map.joint(3), Some(JointType::Head));
        assert_eq!(map.bone(20), Some(HumanBone::Chest));
        assert_eq!(map.bone(24), Some(HumanBone::RightThumbIntermediate));
        assert_eq!(map.joint(25), None);
    }

    #[test]
    fn display_matches_sensor_names() {
        assert_eq!(JointType::SpineBase.to_string(), "SpineBase");
        assert_eq!(JointType::HandTipRight.to_string(), "HandTipRight");
    }

    #[test]
    fn unmapped_entries_report_no_bone() {
        let map = JointMap::new(vec![
            JointMapEntry::new(JointType::Head, HumanBone::Head),
            JointMapEntry::unmapped(JointType::HandTipLeft),
        ]);
        assert_eq!(map.joint(1), Some(JointType::HandTipLeft));
        assert_eq!(map.bone(1), None);
    }

    #[test]
    fn parses_from_ron() {
        let map: JointMap = ron::de::from_str(
            "[(joint: Head, bone: Some(Head)), (joint: HandTipLeft)]",
        )
        .unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.bone(0), Some(HumanBone::Head));
        assert_eq!(map.bone(1), None);
    }
}
