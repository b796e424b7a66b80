use {
    super::{
        joint::JointMap,
        rig::{RigHierarchy, RigTemplate},
    },
    crate::scene::{reparent_normalized, Name},
    hecs::{Entity, World},
};

pub const DEFAULT_BONE_SCALE: f32 = 0.3;

/// Bone nodes of one rig instance indexed by logical joint index.
/// Slots of unmapped or unresolved joints stay empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoneHandleTable {
    handles: Box<[Option<Entity>]>,
}

impl BoneHandleTable {
    pub fn empty(len: usize) -> Self {
        BoneHandleTable {
            handles: vec![None; len].into_boxed_slice(),
        }
    }

    pub fn from_handles(handles: impl Into<Box<[Option<Entity>]>>) -> Self {
        BoneHandleTable {
            handles: handles.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Entity> {
        self.handles.get(index).copied().flatten()
    }

    /// Number of populated slots.
    pub fn bound(&self) -> usize {
        self.handles.iter().filter(|handle| handle.is_some()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Entity)> + '_ {
        self.handles
            .iter()
            .enumerate()
            .filter_map(|(index, handle)| Some((index, (*handle)?)))
    }
}

/// Resolves bone nodes of freshly instantiated rigs
/// and prepares them to be driven by tracked joints.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoneBinder {
    bone_scale: f32,
}

impl BoneBinder {
    pub fn new(bone_scale: f32) -> Self {
        BoneBinder { bone_scale }
    }

    /// Builds handle table for `rig`.
    ///
    /// Each resolved bone is renamed after its tracked joint,
    /// gets identity rotation and uniform `bone_scale`,
    /// and is attached directly to the rig root.
    pub fn bind<T>(
        &self,
        world: &mut World,
        rig: &RigHierarchy,
        template: &T,
        joint_map: &JointMap,
    ) -> BoneHandleTable
    where
        T: RigTemplate + ?Sized,
    {
        let mut table = BoneHandleTable::empty(joint_map.len());

        for (index, entry) in joint_map.iter() {
            let bone = match entry.bone {
                Some(bone) => bone,
                None => continue,
            };

            let node = match template.resolve_bone(world, rig, bone) {
                Some(node) => node,
                None => {
                    tracing::warn!(
                        "Rig has no {:?} bone for joint {}",
                        bone,
                        entry.joint
                    );
                    continue;
                }
            };

            if let Err(err) =
                reparent_normalized(world, node, rig.root, self.bone_scale)
            {
                tracing::warn!(
                    "Bone {:?} for joint {} is not a scene node: {}",
                    bone,
                    entry.joint,
                    err
                );
                continue;
            }

            if let Err(err) =
                world.insert_one(node, Name(entry.joint.to_string()))
            {
                tracing::warn!(
                    "Bone {:?} for joint {} cannot be renamed: {}",
                    bone,
                    entry.joint,
                    err
                );
                continue;
            }
            table.handles[index] = Some(node);
        }

        tracing::debug!(
            "Bound {} of {} joints",
            table.bound(),
            joint_map.len()
        );

        table
    }
}

impl Default for BoneBinder {
    fn default() -> Self {
        BoneBinder::new(DEFAULT_BONE_SCALE)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            retarget::{
                joint::{HumanBone, JointMapEntry, JointType},
                rig::{BoneDesc, HumanoidTemplate},
            },
            scene::{Global3, Local3},
        },
    };

    #[test]
    fn binds_every_mapped_joint_of_mannequin() {
        let mut world = World::new();
        let template = HumanoidTemplate::mannequin();
        let map = JointMap::kinect_v2();
        let rig = template.instantiate(&mut world);

        let table = BoneBinder::default().bind(&mut world, &rig, &template, &map);

        assert_eq!(table.len(), map.len());
        assert_eq!(table.bound(), map.len());

        for (index, node) in table.iter() {
            let joint = map.joint(index).unwrap();
            assert_eq!(world.get::<Name>(node).unwrap().as_str(), joint.name());

            let local = *world.get::<Local3>(node).unwrap();
            assert_eq!(local.parent, rig.root);
            assert!((local.scale.x - 0.3).abs() < 1e-6);
            assert!(local.iso.rotation.angle().abs() < 1e-6);
        }
    }

    #[test]
    fn bind_keeps_bone_world_position() {
        let mut world = World::new();
        let template = HumanoidTemplate::mannequin();
        let map = JointMap::kinect_v2();
        let rig = template.instantiate(&mut world);

        let head = template.resolve_bone(&world, &rig, HumanBone::Head).unwrap();
        let before = world.get::<Global3>(head).unwrap().position();

        let table = BoneBinder::new(1.0).bind(&mut world, &rig, &template, &map);

        assert_eq!(table.get(JointType::Head as usize), Some(head));
        let after = world.get::<Global3>(head).unwrap().position();
        assert!((after - before).norm() < 1e-5);
    }

    #[test]
    fn unmapped_and_missing_bones_leave_empty_slots() {
        let mut world = World::new();
        let template = HumanoidTemplate::new(
            "headless",
            vec![
                BoneDesc {
                    name: "hips".to_owned(),
                    human: Some(HumanBone::Hips),
                    parent: None,
                    offset: [0.0, 1.0, 0.0],
                },
                BoneDesc {
                    name: "neck".to_owned(),
                    human: Some(HumanBone::Neck),
                    parent: Some(0),
                    offset: [0.0, 0.5, 0.0],
                },
            ],
        )
        .unwrap();

        let map = JointMap::new(vec![
            JointMapEntry::new(JointType::SpineBase, HumanBone::Hips),
            JointMapEntry::unmapped(JointType::Neck),
            JointMapEntry::new(JointType::Head, HumanBone::Head),
        ]);

        let rig = template.instantiate(&mut world);
        let table = BoneBinder::default().bind(&mut world, &rig, &template, &map);

        assert_eq!(table.len(), 3);
        assert!(table.get(0).is_some());
        assert_eq!(table.get(1), None);
        assert_eq!(table.get(2), None);
        assert_eq!(table.bound(), 1);

        // Unmapped neck is left untouched.
        let neck = template.resolve_bone(&world, &rig, HumanBone::Neck).unwrap();
        assert_eq!(world.get::<Name>(neck).unwrap().as_str(), "neck");
        assert_ne!(world.get::<Local3>(neck).unwrap().parent, rig.root);
    }
}
