use {
    super::joint::HumanBone,
    crate::scene::{spawn_child, Global3, Local3, Name},
    ahash::AHashMap,
    hecs::{Entity, World},
    nalgebra as na,
    std::convert::TryFrom,
};

/// Entities spawned by one instantiation of a rig template.
#[derive(Clone, Debug)]
pub struct RigHierarchy {
    pub root: Entity,

    /// Every entity below `root`, despawned together with it.
    pub nodes: Box<[Entity]>,
}

impl RigHierarchy {
    /// Despawns root and all nodes.
    pub fn despawn(&self, world: &mut World) {
        for &node in self.nodes.iter() {
            let _ = world.despawn(node);
        }
        let _ = world.despawn(self.root);
    }
}

/// Source of rig instances.
pub trait RigTemplate {
    /// Spawns fresh copy of the rig into the world.
    fn instantiate(&self, world: &mut World) -> RigHierarchy;

    /// Finds bone node of the instance for canonical bone.
    fn resolve_bone(
        &self,
        world: &World,
        rig: &RigHierarchy,
        bone: HumanBone,
    ) -> Option<Entity>;
}

/// Component attached to humanoid rig roots.
/// Maps canonical bones to nodes of that instance.
#[derive(Clone, Debug, Default)]
pub struct Humanoid {
    bones: AHashMap<HumanBone, Entity>,
}

impl Humanoid {
    pub fn bone(&self, bone: HumanBone) -> Option<Entity> {
        self.bones.get(&bone).copied()
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoneDesc {
    pub name: String,

    #[serde(default)]
    pub human: Option<HumanBone>,

    /// Index of the parent bone. Must precede this bone.
    #[serde(default)]
    pub parent: Option<usize>,

    /// Translation relative to parent in bind pose.
    #[serde(default)]
    pub offset: [f32; 3],
}

impl BoneDesc {
    fn new(
        name: &str,
        human: Option<HumanBone>,
        parent: Option<usize>,
        offset: [f32; 3],
    ) -> Self {
        BoneDesc {
            name: name.to_owned(),
            human,
            parent,
            offset,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("Bone '{name}' refers to parent {parent} which does not precede it")]
    BadParent { name: String, parent: usize },

    #[error("Canonical bone {bone:?} is assigned to both '{first}' and '{second}'")]
    DuplicateBone {
        bone: HumanBone,
        first: String,
        second: String,
    },
}

#[derive(Clone, Debug, serde::Deserialize)]
struct HumanoidTemplateRepr {
    name: String,
    bones: Vec<BoneDesc>,
}

/// Humanoid rig described as flat list of bones.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(try_from = "HumanoidTemplateRepr")]
pub struct HumanoidTemplate {
    name: String,
    bones: Vec<BoneDesc>,
}

impl TryFrom<HumanoidTemplateRepr> for HumanoidTemplate {
    type Error = TemplateError;

    fn try_from(repr: HumanoidTemplateRepr) -> Result<Self, TemplateError> {
        HumanoidTemplate::new(repr.name, repr.bones)
    }
}

impl HumanoidTemplate {
    pub fn new(
        name: impl Into<String>,
        bones: Vec<BoneDesc>,
    ) -> Result<Self, TemplateError> {
        let mut seen = AHashMap::<HumanBone, usize>::default();

        for (index, bone) in bones.iter().enumerate() {
            if let Some(parent) = bone.parent {
                if parent >= index {
                    return Err(TemplateError::BadParent {
                        name: bone.name.clone(),
                        parent,
                    });
                }
            }

            if let Some(human) = bone.human {
                if let Some(&first) = seen.get(&human) {
                    return Err(TemplateError::DuplicateBone {
                        bone: human,
                        first: bones[first].name.clone(),
                        second: bone.name.clone(),
                    });
                }
                seen.insert(human, index);
            }
        }

        Ok(HumanoidTemplate {
            name: name.into(),
            bones,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bones(&self) -> &[BoneDesc] {
        &self.bones
    }

    /// Generic humanoid standing at origin, 1.8 units tall, facing +Z.
    /// Bone list is fixed and known to be valid.
    pub fn mannequin() -> Self {
        use HumanBone::*;

        let bones = vec![
            BoneDesc::new("hips", Some(Hips), None, [0.0, 1.0, 0.0]),
            BoneDesc::new("spine", Some(Spine), Some(0), [0.0, 0.1, 0.0]),
            BoneDesc::new("chest", Some(Chest), Some(1), [0.0, 0.2, 0.0]),
            BoneDesc::new("upper_chest", Some(UpperChest), Some(2), [0.0, 0.15, 0.0]),
            BoneDesc::new("neck", Some(Neck), Some(3), [0.0, 0.12, 0.0]),
            BoneDesc::new("head", Some(Head), Some(4), [0.0, 0.1, 0.0]),
            // Left arm.
            BoneDesc::new("shoulder.l", Some(LeftShoulder), Some(3), [0.05, 0.08, 0.0]),
            BoneDesc::new("upper_arm.l", Some(LeftUpperArm), Some(6), [0.12, 0.0, 0.0]),
            BoneDesc::new("lower_arm.l", Some(LeftLowerArm), Some(7), [0.28, 0.0, 0.0]),
            BoneDesc::new("hand.l", Some(LeftHand), Some(8), [0.25, 0.0, 0.0]),
            BoneDesc::new("thumb_1.l", Some(LeftThumbProximal), Some(9), [0.03, 0.0, 0.03]),
            BoneDesc::new("thumb_2.l", Some(LeftThumbIntermediate), Some(10), [0.03, 0.0, 0.01]),
            BoneDesc::new("index_1.l", Some(LeftIndexProximal), Some(9), [0.09, 0.0, 0.01]),
            // Right arm.
            BoneDesc::new("shoulder.r", Some(RightShoulder), Some(3), [-0.05, 0.08, 0.0]),
            BoneDesc::new("upper_arm.r", Some(RightUpperArm), Some(13), [-0.12, 0.0, 0.0]),
            BoneDesc::new("lower_arm.r", Some(RightLowerArm), Some(14), [-0.28, 0.0, 0.0]),
            BoneDesc::new("hand.r", Some(RightHand), Some(15), [-0.25, 0.0, 0.0]),
            BoneDesc::new("thumb_1.r", Some(RightThumbProximal), Some(16), [-0.03, 0.0, 0.03]),
            BoneDesc::new("thumb_2.r", Some(RightThumbIntermediate), Some(17), [-0.03, 0.0, 0.01]),
            BoneDesc::new("index_1.r", Some(RightIndexProximal), Some(16), [-0.09, 0.0, 0.01]),
            // Left leg.
            BoneDesc::new("upper_leg.l", Some(LeftUpperLeg), Some(0), [0.1, -0.05, 0.0]),
            BoneDesc::new("lower_leg.l", Some(LeftLowerLeg), Some(20), [0.0, -0.45, 0.0]),
            BoneDesc::new("foot.l", Some(LeftFoot), Some(21), [0.0, -0.42, 0.0]),
            BoneDesc::new("toes.l", Some(LeftToes), Some(22), [0.0, -0.06, 0.12]),
            // Right leg.
            BoneDesc::new("upper_leg.r", Some(RightUpperLeg), Some(0), [-0.1, -0.05, 0.0]),
            BoneDesc::new("lower_leg.r", Some(RightLowerLeg), Some(24), [0.0, -0.45, 0.0]),
            BoneDesc::new("foot.r", Some(RightFoot), Some(25), [0.0, -0.42, 0.0]),
            BoneDesc::new("toes.r", Some(RightToes), Some(26), [0.0, -0.06, 0.12]),
        ];

        HumanoidTemplate {
            name: "mannequin".to_owned(),
            bones,
        }
    }
}

impl RigTemplate for HumanoidTemplate {
    fn instantiate(&self, world: &mut World) -> RigHierarchy {
        let root = world.spawn((Global3::identity(), Name(self.name.clone())));

        let mut nodes = Vec::with_capacity(self.bones.len());
        let mut humanoid = Humanoid::default();

        for bone in &self.bones {
            let parent = match bone.parent {
                Some(parent) => nodes[parent],
                None => root,
            };

            let [x, y, z] = bone.offset;
            let node = spawn_child(
                world,
                Local3::from_translation(parent, na::Translation3::new(x, y, z)),
                Name(bone.name.clone()),
            );

            if let Some(human) = bone.human {
                humanoid.bones.insert(human, node);
            }
            nodes.push(node);
        }

        if let Err(err) = world.insert_one(root, humanoid) {
            tracing::warn!("Rig root {:?} is gone: {}", root, err);
        }

        tracing::debug!(
            "Instantiated rig '{}' with {} bones",
            self.name,
            nodes.len()
        );

        RigHierarchy {
            root,
            nodes: nodes.into_boxed_slice(),
        }
    }

    fn resolve_bone(
        &self,
        world: &World,
        rig: &RigHierarchy,
        bone: HumanBone,
    ) -> Option<Entity> {
        world.get::<Humanoid>(rig.root).ok()?.bone(bone)
    }
}

impl Default for HumanoidTemplate {
    fn default() -> Self {
        HumanoidTemplate::mannequin()
    }
}
