use {
    super::{
        binder::BoneBinder,
        joint::JointMap,
        pose::PoseApplier,
        rig::{HumanoidTemplate, RigTemplate},
        snapshot::SkeletonSource,
        tracker::{Reconciled, SkeletonTracker},
    },
    crate::{
        config::Config,
        engine::{System, SystemContext},
    },
    std::sync::Arc,
};

/// Polls skeleton source once per frame and keeps rigs in sync with it.
/// Last frame's `Reconciled` report is published into resources.
pub struct RetargetSystem<S, T> {
    source: S,
    tracker: SkeletonTracker<T>,
}

impl<S, T> RetargetSystem<S, T>
where
    S: SkeletonSource,
    T: RigTemplate,
{
    pub fn new(source: S, tracker: SkeletonTracker<T>) -> Self {
        RetargetSystem { source, tracker }
    }
}

impl<S> RetargetSystem<S, HumanoidTemplate>
where
    S: SkeletonSource,
{
    /// Builds system driving humanoid rigs as configured.
    pub fn from_config(source: S, config: &Config) -> Self {
        let template = config
            .template
            .clone()
            .unwrap_or_else(HumanoidTemplate::mannequin);

        let joint_map = config
            .joint_map
            .clone()
            .unwrap_or_else(JointMap::kinect_v2);

        let retarget = &config.retarget;
        let tracker = SkeletonTracker::new(
            template,
            Arc::new(joint_map),
            BoneBinder::new(retarget.bone_scale),
            PoseApplier::new(retarget.amplification, retarget.orientation),
        );

        RetargetSystem::new(source, tracker)
    }
}

impl<S, T> System for RetargetSystem<S, T>
where
    S: SkeletonSource,
    T: RigTemplate,
{
    fn name(&self) -> &str {
        "Retarget"
    }

    fn run(&mut self, ctx: SystemContext<'_>) {
        let snapshot = self.source.current_snapshot();
        let report = self.tracker.reconcile(ctx.world, snapshot);
        ctx.resources.insert::<Reconciled>(report);
    }
}
