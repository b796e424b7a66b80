use {
    super::{
        binder::{BoneBinder, BoneHandleTable},
        joint::JointMap,
        pose::{PoseApplier, PoseStats},
        rig::{RigHierarchy, RigTemplate},
        snapshot::SkeletonSnapshot,
    },
    ahash::{AHashMap, AHashSet},
    hecs::{Entity, World},
    smallvec::SmallVec,
    std::sync::Arc,
};

/// Rig driven by one tracked body.
#[derive(Debug)]
pub struct RigInstance {
    hierarchy: RigHierarchy,
    bones: BoneHandleTable,
}

impl RigInstance {
    pub fn root(&self) -> Entity {
        self.hierarchy.root
    }

    pub fn hierarchy(&self) -> &RigHierarchy {
        &self.hierarchy
    }

    pub fn bones(&self) -> &BoneHandleTable {
        &self.bones
    }

    fn release(self, world: &mut World) {
        self.hierarchy.despawn(world);
    }
}

/// Live rigs keyed by body tracking id.
/// Removing an entry despawns its rig, call `clear` before dropping.
#[derive(Debug, Default)]
pub struct Registry {
    rigs: AHashMap<u64, RigInstance>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    pub fn len(&self) -> usize {
        self.rigs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rigs.is_empty()
    }

    pub fn contains(&self, tracking_id: u64) -> bool {
        self.rigs.contains_key(&tracking_id)
    }

    pub fn get(&self, tracking_id: u64) -> Option<&RigInstance> {
        self.rigs.get(&tracking_id)
    }

    /// Tracking ids of live rigs, sorted.
    pub fn ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.rigs.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    fn remove(&mut self, tracking_id: u64, world: &mut World) -> bool {
        match self.rigs.remove(&tracking_id) {
            Some(rig) => {
                rig.release(world);
                true
            }
            None => false,
        }
    }

    /// Despawns every rig.
    pub fn clear(&mut self, world: &mut World) {
        for (_, rig) in self.rigs.drain() {
            rig.release(world);
        }
    }
}

/// Lifecycle changes and pose totals of one frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reconciled {
    /// Tracking ids that got a new rig, sorted.
    pub created: SmallVec<[u64; 6]>,

    /// Tracking ids whose rig was despawned, sorted.
    pub destroyed: SmallVec<[u64; 6]>,

    /// Number of bodies posed.
    pub posed: usize,

    pub pose: PoseStats,

    /// `false` when the frame had no snapshot and nothing was done.
    pub had_snapshot: bool,
}

/// Keeps one rig per tracked body.
pub struct SkeletonTracker<T> {
    template: T,
    joint_map: Arc<JointMap>,
    binder: BoneBinder,
    applier: PoseApplier,
    registry: Registry,
}

impl<T> SkeletonTracker<T>
where
    T: RigTemplate,
{
    pub fn new(
        template: T,
        joint_map: Arc<JointMap>,
        binder: BoneBinder,
        applier: PoseApplier,
    ) -> Self {
        SkeletonTracker {
            template,
            joint_map,
            binder,
            applier,
            registry: Registry::new(),
        }
    }

    pub fn template(&self) -> &T {
        &self.template
    }

    pub fn joint_map(&self) -> &JointMap {
        &self.joint_map
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Brings rigs in sync with `snapshot` and poses them.
    ///
    /// Rigs of bodies that are no longer tracked are despawned first,
    /// then new bodies get rigs and every tracked body is posed.
    /// Missing snapshot leaves everything as is.
    pub fn reconcile(
        &mut self,
        world: &mut World,
        snapshot: Option<&SkeletonSnapshot>,
    ) -> Reconciled {
        let mut report = Reconciled::default();

        let snapshot = match snapshot {
            Some(snapshot) => snapshot,
            None => {
                tracing::trace!("No skeleton data this frame");
                return report;
            }
        };
        report.had_snapshot = true;

        let tracked: AHashSet<u64> =
            snapshot.tracked().map(|body| body.tracking_id).collect();

        let stale: Vec<u64> = self
            .registry
            .rigs
            .keys()
            .copied()
            .filter(|id| !tracked.contains(id))
            .collect();

        for id in stale {
            if self.registry.remove(id, world) {
                tracing::info!("Body {} lost, rig despawned", id);
                report.destroyed.push(id);
            }
        }

        for body in snapshot.tracked() {
            let id = body.tracking_id;

            if !self.registry.contains(id) {
                let hierarchy = self.template.instantiate(world);
                let bones = self.binder.bind(
                    world,
                    &hierarchy,
                    &self.template,
                    &self.joint_map,
                );
                tracing::info!(
                    "Body {} tracked, rig {:?} spawned with {} bound bones",
                    id,
                    hierarchy.root,
                    bones.bound()
                );
                self.registry
                    .rigs
                    .insert(id, RigInstance { hierarchy, bones });
                report.created.push(id);
            }

            if let Some(rig) = self.registry.rigs.get(&id) {
                let stats = self.applier.apply(
                    world,
                    body,
                    &rig.bones,
                    &self.joint_map,
                );
                report.posed += 1;
                report.pose.written += stats.written;
                report.pose.skipped_unmapped += stats.skipped_unmapped;
                report.pose.skipped_unresolved += stats.skipped_unresolved;
                report.pose.skipped_missing += stats.skipped_missing;
                report.pose.degenerate_rotations += stats.degenerate_rotations;
            }
        }

        report.created.sort_unstable();
        report.destroyed.sort_unstable();

        tracing::debug!(
            "Reconciled: {} live, {} created, {} destroyed, {} joints written",
            self.registry.len(),
            report.created.len(),
            report.destroyed.len(),
            report.pose.written
        );

        report
    }

    /// Despawns all rigs.
    pub fn clear(&mut self, world: &mut World) {
        self.registry.clear(world);
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::retarget::{
            joint::JointType,
            rig::HumanoidTemplate,
            snapshot::Body,
        },
    };

    fn tracker() -> SkeletonTracker<HumanoidTemplate> {
        SkeletonTracker::new(
            HumanoidTemplate::mannequin(),
            Arc::new(JointMap::kinect_v2()),
            BoneBinder::default(),
            PoseApplier::default(),
        )
    }

    #[test]
    fn missing_snapshot_is_noop() {
        let mut world = World::new();
        let mut tracker = tracker();

        tracker.reconcile(
            &mut world,
            Some(&SkeletonSnapshot::new(vec![Body::tracked(1)])),
        );
        let root = tracker.registry().get(1).unwrap().root();

        let report = tracker.reconcile(&mut world, None);
        assert!(!report.had_snapshot);
        assert_eq!(report, Reconciled::default());
        assert_eq!(tracker.registry().ids(), vec![1]);
        assert!(world.contains(root));
    }

    #[test]
    fn empty_snapshot_releases_everything() {
        let mut world = World::new();
        let mut tracker = tracker();

        tracker.reconcile(
            &mut world,
            Some(&SkeletonSnapshot::new(vec![Body::tracked(1), Body::tracked(2)])),
        );
        let report =
            tracker.reconcile(&mut world, Some(&SkeletonSnapshot::default()));

        assert_eq!(report.destroyed.as_slice(), &[1, 2]);
        assert!(tracker.registry().is_empty());
    }

    #[test]
    fn untracked_body_has_no_rig() {
        let mut world = World::new();
        let mut tracker = tracker();

        let mut ghost = Body::tracked(5);
        ghost.is_tracked = false;
        let snapshot = SkeletonSnapshot {
            bodies: vec![None, Some(ghost), Some(Body::tracked(6))],
        };

        let report = tracker.reconcile(&mut world, Some(&snapshot));
        assert_eq!(report.created.as_slice(), &[6]);
        assert!(!tracker.registry().contains(5));
    }

    #[test]
    fn continuing_body_keeps_its_rig() {
        let mut world = World::new();
        let mut tracker = tracker();
        let body = Body::tracked(3).with_joint(
            JointType::Head,
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        );
        let snapshot = SkeletonSnapshot::new(vec![body]);

        let first = tracker.reconcile(&mut world, Some(&snapshot));
        let root = tracker.registry().get(3).unwrap().root();
        let second = tracker.reconcile(&mut world, Some(&snapshot));

        assert_eq!(first.created.as_slice(), &[3]);
        assert!(second.created.is_empty());
        assert!(second.destroyed.is_empty());
        assert_eq!(second.posed, 1);
        assert_eq!(second.pose.written, 1);
        assert_eq!(second.pose.skipped_missing, 24);
        assert_eq!(tracker.registry().get(3).unwrap().root(), root);
    }

    #[test]
    fn duplicate_ids_in_one_frame_share_a_rig() {
        let mut world = World::new();
        let mut tracker = tracker();

        let report = tracker.reconcile(
            &mut world,
            Some(&SkeletonSnapshot::new(vec![Body::tracked(4), Body::tracked(4)])),
        );

        assert_eq!(report.created.as_slice(), &[4]);
        assert_eq!(report.posed, 2);
        assert_eq!(tracker.registry().len(), 1);
    }

    #[test]
    fn clear_despawns_all_rigs() {
        let mut world = World::new();
        let mut tracker = tracker();
        tracker.reconcile(
            &mut world,
            Some(&SkeletonSnapshot::new(vec![Body::tracked(1)])),
        );
        let rig = tracker.registry().get(1).unwrap().hierarchy().clone();

        tracker.clear(&mut world);

        assert!(tracker.registry().is_empty());
        assert!(!world.contains(rig.root));
        assert!(rig.nodes.iter().all(|&node| !world.contains(node)));
    }
}
