use {
    crate::retarget::{
        binder::DEFAULT_BONE_SCALE,
        joint::JointMap,
        pose::{OrientationMode, DEFAULT_AMPLIFICATION},
        rig::HumanoidTemplate,
    },
    color_eyre::Report,
    eyre::WrapErr,
    std::path::PathBuf,
};

#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    pub retarget: RetargetConfig,

    /// Replaces built-in Kinect v2 joint map.
    pub joint_map: Option<JointMap>,

    /// Replaces built-in mannequin rig.
    pub template: Option<HumanoidTemplate>,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Deserialize)]
pub struct RetargetConfig {
    #[serde(default = "default_amplification")]
    pub amplification: f32,

    #[serde(default = "default_bone_scale")]
    pub bone_scale: f32,

    #[serde(default)]
    pub orientation: OrientationMode,
}

impl Default for RetargetConfig {
    fn default() -> Self {
        RetargetConfig {
            amplification: default_amplification(),
            bone_scale: default_bone_scale(),
            orientation: OrientationMode::default(),
        }
    }
}

fn default_amplification() -> f32 {
    DEFAULT_AMPLIFICATION
}

fn default_bone_scale() -> f32 {
    DEFAULT_BONE_SCALE
}

impl Config {
    pub fn load_default() -> Result<Self, Report> {
        // Load from predefined file path for desktop platforms.
        let path = std::env::var("PUPPETEER_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./cfg.ron"));

        if !path.exists() {
            tracing::info!(
                "No config at '{}', using defaults",
                path.display()
            );
            return Ok(Config::default());
        }

        Self::load(path)
    }

    #[tracing::instrument]
    pub fn load(path: PathBuf) -> Result<Self, Report> {
        let file = std::fs::File::open(&path)
            .wrap_err_with(|| format!("Failed to open '{}'", path.display()))?;
        let config = ron::de::from_reader(file).wrap_err_with(|| {
            format!("Failed to parse config '{}'", path.display())
        })?;
        Ok(config)
    }

    pub fn from_ron(source: &str) -> Result<Self, Report> {
        Ok(ron::de::from_str(source)?)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::retarget::joint::HumanBone};

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::from_ron("()").unwrap();
        assert_eq!(config.retarget, RetargetConfig::default());
        assert_eq!(config.retarget.amplification, 10.0);
        assert_eq!(config.retarget.bone_scale, 0.3);
        assert_eq!(config.retarget.orientation, OrientationMode::Literal);
        assert!(config.joint_map.is_none());
        assert!(config.template.is_none());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_ron(
            r#"(
                retarget: (amplification: 100.0, orientation: Corrected),
                joint_map: Some([(joint: Head, bone: Some(Head))]),
                template: Some((
                    name: "stick",
                    bones: [(name: "head", human: Some(Head))],
                )),
            )"#,
        )
        .unwrap();

        assert_eq!(config.retarget.amplification, 100.0);
        assert_eq!(config.retarget.bone_scale, 0.3);
        assert_eq!(config.retarget.orientation, OrientationMode::Corrected);
        assert_eq!(config.joint_map.unwrap().bone(0), Some(HumanBone::Head));
        assert_eq!(config.template.unwrap().name(), "stick");
    }

    #[test]
    fn invalid_template_is_rejected() {
        let result = Config::from_ron(
            r#"(template: Some((name: "bad", bones: [(name: "a", parent: Some(0))])))"#,
        );
        assert!(result.is_err());
    }
}
