use {
    crate::engine::{System, SystemContext},
    ahash::AHashSet,
    bumpalo::collections::Vec as BVec,
    hecs::{Entity, EntityRef, World},
    nalgebra as na,
};

/// Transform relative to parent node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Local3 {
    pub parent: Entity,
    pub iso: na::Isometry3<f32>,
    pub scale: na::Vector3<f32>,
}

impl Local3 {
    pub fn identity(parent: Entity) -> Self {
        Local3 {
            parent,
            iso: na::Isometry3::identity(),
            scale: na::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn from_translation(parent: Entity, tr: na::Translation3<f32>) -> Self {
        Local3 {
            parent,
            iso: na::Isometry3::from_parts(tr, na::UnitQuaternion::identity()),
            scale: na::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = na::Vector3::new(scale, scale, scale);
        self
    }
}

/// World-space transform.
/// Scene roots carry only this component,
/// every other node has it recomputed from its `Local3`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Global3 {
    pub iso: na::Isometry3<f32>,
    pub skew: na::Matrix3<f32>,
}

impl Global3 {
    pub fn identity() -> Self {
        Global3 {
            iso: na::Isometry3::identity(),
            skew: na::Matrix3::identity(),
        }
    }

    pub fn from_iso(iso: na::Isometry3<f32>) -> Self {
        Global3 {
            iso,
            skew: na::Matrix3::identity(),
        }
    }

    pub fn from_iso_scale(
        iso: na::Isometry3<f32>,
        scale: &na::Vector3<f32>,
    ) -> Self {
        Global3 {
            iso,
            skew: na::Matrix3::from_diagonal(scale),
        }
    }

    pub fn position(&self) -> na::Point3<f32> {
        na::Point3::from(self.iso.translation.vector)
    }

    pub fn rotation(&self) -> na::UnitQuaternion<f32> {
        self.iso.rotation
    }

    pub fn append_iso_scale(
        &self,
        iso: &na::Isometry3<f32>,
        scale: &na::Vector3<f32>,
    ) -> Self {
        let total = self.to_homogeneous()
            * iso.to_homogeneous()
            * na::Matrix4::new_nonuniform_scaling(scale);
        let rotation = self.iso.rotation * iso.rotation;
        let inv_rotation = rotation.inverse().to_rotation_matrix();
        let translation = total.column(3).xyz();
        let rotskew = total.remove_column(3).remove_row(3);
        let skew = inv_rotation * rotskew;

        Global3 {
            iso: na::Isometry3 {
                translation: na::Translation3 {
                    vector: translation,
                },
                rotation,
            },
            skew,
        }
    }

    pub fn append_local(&self, local: &Local3) -> Self {
        self.append_iso_scale(&local.iso, &local.scale)
    }

    pub fn to_homogeneous(&self) -> na::Matrix4<f32> {
        self.iso.to_homogeneous() * self.skew.to_homogeneous()
    }
}

/// Human readable node name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Name(pub String);

impl Name {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Spawns a child node under `parent` and computes its global transform
/// immediately, so it is usable before `SceneSystem` runs.
pub fn spawn_child(world: &mut World, local: Local3, name: Name) -> Entity {
    let global = match world.get::<Global3>(local.parent) {
        Ok(parent) => parent.append_local(&local),
        Err(_) => Global3::identity().append_local(&local),
    };
    world.spawn((local, global, name))
}

/// Moves `entity` so that its world-space isometry becomes `iso`.
/// Parent is kept and its local transform is recalculated.
///
/// Parent's skew is not taken into account,
/// nodes are expected to be attached to unscaled parents.
pub fn set_global_iso(
    world: &World,
    entity: Entity,
    iso: na::Isometry3<f32>,
) -> Result<(), hecs::ComponentError> {
    let mut local = world.get_mut::<Local3>(entity)?;
    let parent_iso = match world.get::<Global3>(local.parent) {
        Ok(parent) => parent.iso,
        Err(_) => na::Isometry3::identity(),
    };
    local.iso = parent_iso.inverse() * iso;
    let scale = local.scale;
    drop(local);

    let mut global = world.get_mut::<Global3>(entity)?;
    *global = Global3::from_iso_scale(iso, &scale);
    Ok(())
}

/// Re-attaches `entity` to `parent` keeping its world-space translation.
/// Rotation is reset to identity and scale is replaced with `scale`.
pub fn reparent_normalized(
    world: &World,
    entity: Entity,
    parent: Entity,
    scale: f32,
) -> Result<(), hecs::ComponentError> {
    let translation = world.get::<Global3>(entity)?.iso.translation;
    let parent_global = match world.get::<Global3>(parent) {
        Ok(global) => *global,
        Err(_) => Global3::identity(),
    };

    let iso = na::Isometry3::from_parts(
        translation,
        na::UnitQuaternion::identity(),
    );
    let local = Local3 {
        parent,
        iso: parent_global.iso.inverse() * iso,
        scale: na::Vector3::new(scale, scale, scale),
    };

    *world.get_mut::<Local3>(entity)? = local;
    *world.get_mut::<Global3>(entity)? = parent_global.append_local(&local);
    Ok(())
}

/// Propagates `Local3` into `Global3` down the hierarchy.
pub struct SceneSystem;

impl System for SceneSystem {
    fn name(&self) -> &str {
        "Scene"
    }

    fn run(&mut self, ctx: SystemContext<'_>) {
        let mut updated = AHashSet::new();
        let mut despawn = BVec::new_in(ctx.bump);

        for (entity, local) in
            ctx.world.query::<&Local3>().with::<Global3>().iter()
        {
            if updated.contains(&entity) {
                continue;
            }

            let entity_ref = match ctx.world.entity(entity) {
                Ok(entity_ref) => entity_ref,
                Err(hecs::NoSuchEntity) => continue,
            };

            update_global(
                entity,
                entity_ref,
                local,
                ctx.world,
                &mut updated,
                &mut despawn,
            );
        }

        // Despawn entities whose parents are despawned.
        for entity in despawn {
            let _ = ctx.world.despawn(entity);
        }
    }
}

fn update_global<'a>(
    entity: Entity,
    entity_ref: EntityRef<'a>,
    local: &Local3,
    world: &'a World,
    updated: &mut AHashSet<Entity>,
    despawn: &mut BVec<'_, Entity>,
) -> Option<Global3> {
    updated.insert(entity);

    let parent_ref = match world.entity(local.parent) {
        Ok(parent_ref) => parent_ref,
        Err(hecs::NoSuchEntity) => {
            despawn.push(entity);
            return None;
        }
    };

    let parent_global = match parent_ref.get::<Local3>() {
        None => match parent_ref.get::<Global3>() {
            // Parent is root node.
            Some(parent_global) => Some(*parent_global),
            None => {
                tracing::warn!(
                    "Entity's ({:?}) parent is not in scene and shall be despawned",
                    entity
                );
                None
            }
        },
        Some(parent_local) => {
            if updated.contains(&local.parent) {
                parent_ref.get::<Global3>().map(|global| *global)
            } else {
                let parent_local = *parent_local;
                update_global(
                    local.parent,
                    parent_ref,
                    &parent_local,
                    world,
                    updated,
                    despawn,
                )
            }
        }
    };

    match parent_global {
        Some(parent_global) => {
            let global = parent_global.append_local(local);
            if let Some(mut global_ref) = entity_ref.get_mut::<Global3>() {
                *global_ref = global;
            }
            Some(global)
        }
        None => {
            despawn.push(entity);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, bumpalo::Bump};

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn spawn_child_composes_parent_transform() {
        let mut world = World::new();
        let root = world.spawn((Global3::from_iso(na::Isometry3::translation(
            1.0, 2.0, 3.0,
        )),));

        let child = spawn_child(
            &mut world,
            Local3::from_translation(root, na::Translation3::new(0.5, 0.0, 0.0)),
            Name("child".to_owned()),
        );

        let global = *world.get::<Global3>(child).unwrap();
        let p = global.position();
        assert!(close(p.x, 1.5) && close(p.y, 2.0) && close(p.z, 3.0));
        assert_eq!(world.get::<Name>(child).unwrap().as_str(), "child");
    }

    #[test]
    fn set_global_iso_keeps_parent_and_fixes_local() {
        let mut world = World::new();
        let root = world.spawn((Global3::from_iso(na::Isometry3::translation(
            0.0, 1.0, 0.0,
        )),));
        let node = spawn_child(&mut world, Local3::identity(root), Name("n".into()));

        set_global_iso(&world, node, na::Isometry3::translation(2.0, 3.0, 4.0))
            .unwrap();

        let local = *world.get::<Local3>(node).unwrap();
        assert_eq!(local.parent, root);
        assert!(close(local.iso.translation.vector.y, 2.0));

        let p = world.get::<Global3>(node).unwrap().position();
        assert!(close(p.x, 2.0) && close(p.y, 3.0) && close(p.z, 4.0));
    }

    #[test]
    fn reparent_keeps_translation_and_resets_rotation() {
        let mut world = World::new();
        let root = world.spawn((Global3::identity(),));
        let arm = spawn_child(
            &mut world,
            Local3 {
                parent: root,
                iso: na::Isometry3::new(
                    na::Vector3::new(0.0, 1.0, 0.0),
                    na::Vector3::new(0.0, 0.0, 1.0),
                ),
                scale: na::Vector3::new(1.0, 1.0, 1.0),
            },
            Name("arm".into()),
        );
        let hand = spawn_child(
            &mut world,
            Local3::from_translation(arm, na::Translation3::new(1.0, 0.0, 0.0)),
            Name("hand".into()),
        );
        let before = world.get::<Global3>(hand).unwrap().position();

        reparent_normalized(&world, hand, root, 0.3).unwrap();

        let local = *world.get::<Local3>(hand).unwrap();
        assert_eq!(local.parent, root);
        assert!(close(local.scale.x, 0.3));
        assert!(close(local.iso.rotation.angle(), 0.0));

        let after = world.get::<Global3>(hand).unwrap().position();
        assert!((after - before).norm() < 1e-5);
    }

    #[test]
    fn scene_system_propagates_and_despawns_orphans() {
        let mut world = World::new();
        let mut resources = crate::resources::Resources::new();
        let bump = Bump::new();

        let root = world.spawn((Global3::identity(),));
        let a = spawn_child(
            &mut world,
            Local3::from_translation(root, na::Translation3::new(1.0, 0.0, 0.0)),
            Name("a".into()),
        );
        let b = spawn_child(
            &mut world,
            Local3::from_translation(a, na::Translation3::new(0.0, 1.0, 0.0)),
            Name("b".into()),
        );

        *world.get_mut::<Global3>(root).unwrap() =
            Global3::from_iso(na::Isometry3::translation(0.0, 0.0, 5.0));

        SceneSystem.run(SystemContext {
            world: &mut world,
            resources: &mut resources,
            bump: &bump,
            frame: 0,
        });

        let p = world.get::<Global3>(b).unwrap().position();
        assert!(close(p.x, 1.0) && close(p.y, 1.0) && close(p.z, 5.0));

        world.despawn(a).unwrap();
        SceneSystem.run(SystemContext {
            world: &mut world,
            resources: &mut resources,
            bump: &bump,
            frame: 1,
        });
        assert!(!world.contains(b));
    }
}
