use {
    super::joint::JointType,
    ahash::AHashMap,
    color_eyre::Report,
    eyre::WrapErr as _,
    nalgebra as na,
    std::path::Path,
};

/// Point in sensor space, meters.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CameraSpacePoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<CameraSpacePoint> for na::Vector3<f32> {
    fn from(p: CameraSpacePoint) -> Self {
        na::Vector3::new(p.x, p.y, p.z)
    }
}

/// Raw orientation as reported by the sensor.
/// Not guaranteed to be normalized.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Vector4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Vector4 {
    fn default() -> Self {
        Vector4 {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum TrackingState {
    NotTracked,
    Inferred,
    Tracked,
}

impl Default for TrackingState {
    fn default() -> Self {
        TrackingState::Tracked
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Joint {
    pub position: CameraSpacePoint,
    #[serde(default)]
    pub state: TrackingState,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct JointOrientation {
    pub orientation: Vector4,
}

/// One body slot of the sensor.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Body {
    pub tracking_id: u64,
    pub is_tracked: bool,
    #[serde(default)]
    pub joints: AHashMap<JointType, Joint>,
    #[serde(default)]
    pub orientations: AHashMap<JointType, JointOrientation>,
}

impl Body {
    pub fn tracked(tracking_id: u64) -> Self {
        Body {
            tracking_id,
            is_tracked: true,
            ..Body::default()
        }
    }

    pub fn with_joint(
        mut self,
        joint: JointType,
        position: [f32; 3],
        orientation: [f32; 4],
    ) -> Self {
        let [x, y, z] = position;
        let [ox, oy, oz, ow] = orientation;
        self.joints.insert(
            joint,
            Joint {
                position: CameraSpacePoint { x, y, z },
                state: TrackingState::Tracked,
            },
        );
        self.orientations.insert(
            joint,
            JointOrientation {
                orientation: Vector4 {
                    x: ox,
                    y: oy,
                    z: oz,
                    w: ow,
                },
            },
        );
        self
    }
}

/// Bodies reported for a single frame.
/// Slots may be empty, as sensors report a fixed number of them.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct SkeletonSnapshot {
    pub bodies: Vec<Option<Body>>,
}

impl SkeletonSnapshot {
    pub fn new(bodies: impl IntoIterator<Item = Body>) -> Self {
        SkeletonSnapshot {
            bodies: bodies.into_iter().map(Some).collect(),
        }
    }

    /// Bodies currently tracked, in slot order.
    pub fn tracked(&self) -> impl Iterator<Item = &Body> + '_ {
        self.bodies
            .iter()
            .filter_map(Option::as_ref)
            .filter(|body| body.is_tracked)
    }
}

/// Body tracking device.
pub trait SkeletonSource {
    /// Returns bodies for the current frame,
    /// or `None` if the sensor has nothing new.
    fn current_snapshot(&mut self) -> Option<&SkeletonSnapshot>;
}

/// Prerecorded sequence of frames, one frame per poll.
/// `None` frames emulate frames without sensor data.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Recording {
    frames: Vec<Option<SkeletonSnapshot>>,
    #[serde(skip)]
    cursor: usize,
}

impl Recording {
    pub fn new(frames: Vec<Option<SkeletonSnapshot>>) -> Self {
        Recording { frames, cursor: 0 }
    }

    #[tracing::instrument(skip(path))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Report> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .wrap_err_with(|| format!("Failed to open '{}'", path.display()))?;
        let recording: Recording = ron::de::from_reader(file)
            .wrap_err_with(|| format!("Failed to parse '{}'", path.display()))?;
        tracing::info!(
            "Loaded recording '{}' with {} frames",
            path.display(),
            recording.len()
        );
        Ok(recording)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.frames.len()
    }
}

impl SkeletonSource for Recording {
    fn current_snapshot(&mut self) -> Option<&SkeletonSnapshot> {
        let frame = self.frames.get(self.cursor)?;
        self.cursor += 1;
        frame.as_ref()
    }
}
