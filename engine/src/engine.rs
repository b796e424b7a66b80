use {crate::resources::Resources, bumpalo::Bump, hecs::World};

/// Everything a system may touch during one frame.
pub struct SystemContext<'a> {
    pub world: &'a mut World,
    pub resources: &'a mut Resources,
    pub bump: &'a Bump,
    pub frame: u64,
}

pub trait System {
    fn name(&self) -> &str;

    fn run(&mut self, ctx: SystemContext<'_>);
}

impl<F> System for F
where
    F: FnMut(SystemContext<'_>),
{
    fn name(&self) -> &str {
        std::any::type_name::<F>()
    }

    fn run(&mut self, ctx: SystemContext<'_>) {
        self(ctx)
    }
}

/// Root data structure of the host.
/// Owns the scene and runs systems in insertion order once per frame.
pub struct Engine {
    pub world: World,
    pub resources: Resources,
    schedule: Vec<Box<dyn System>>,
    bump: Bump,
    frame: u64,
}

impl Engine {
    pub fn new() -> Self {
        Engine {
            world: World::new(),
            resources: Resources::new(),
            schedule: Vec::new(),
            bump: Bump::new(),
            frame: 0,
        }
    }

    /// Adds a system to this engine.
    pub fn add_system<S>(&mut self, system: S) -> &mut Self
    where
        S: System + 'static,
    {
        self.schedule.push(Box::new(system));
        self
    }

    /// Number of frames advanced so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Runs every system once.
    /// All work for the frame is complete when this returns.
    pub fn advance(&mut self) {
        let _span = tracing::debug_span!("frame", frame = self.frame).entered();

        for system in &mut self.schedule {
            tracing::trace!("Running system '{}'", system.name());
            system.run(SystemContext {
                world: &mut self.world,
                resources: &mut self.resources,
                bump: &self.bump,
                frame: self.frame,
            });
        }

        self.bump.reset();
        self.frame += 1;
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}
