pub mod config;
pub mod engine;
pub mod resources;
pub mod retarget;
pub mod scene;

pub use self::{
    config::{Config, RetargetConfig},
    engine::{Engine, System, SystemContext},
    resources::Resources,
    scene::{Global3, Local3, Name, SceneSystem},
};
