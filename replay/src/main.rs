use {
    color_eyre::Report,
    eyre::WrapErr as _,
    puppeteer::{
        retarget::{Reconciled, Recording, RetargetSystem},
        Config, Engine, Global3, Name, SceneSystem,
    },
    tracing_error::ErrorLayer,
    tracing_subscriber::{fmt, prelude::*, EnvFilter},
};

fn main() -> Result<(), Report> {
    install_tracing();
    color_eyre::install()?;

    let config =
        Config::load_default().wrap_err("Failed to load replay config")?;
    tracing::info!("Config loaded: {:?}", config.retarget);

    let session = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "./session.ron".to_owned());
    let recording = Recording::load(&session)
        .wrap_err_with(|| format!("Failed to load session '{}'", session))?;
    let frames = recording.len();

    let mut engine = Engine::new();
    engine
        .add_system(RetargetSystem::from_config(recording, &config))
        .add_system(SceneSystem);

    for _ in 0..frames {
        engine.advance();

        match engine.resources.get::<Reconciled>() {
            Some(report) if report.had_snapshot => {
                tracing::info!(
                    "Frame {}: {} bodies posed, created {:?}, destroyed {:?}",
                    engine.frame(),
                    report.posed,
                    report.created,
                    report.destroyed
                );
            }
            _ => tracing::info!("Frame {}: no skeleton data", engine.frame()),
        }

        for (_, (global, name)) in
            engine.world.query::<(&Global3, &Name)>().iter()
        {
            let p = global.position();
            tracing::debug!(
                "  {:<16} ({:>7.3}, {:>7.3}, {:>7.3})",
                name.as_str(),
                p.x,
                p.y,
                p.z
            );
        }
    }

    Ok(())
}

fn install_tracing() {
    let fmt_layer = fmt::layer().with_target(false);
    let filter_layer = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .init();
}
