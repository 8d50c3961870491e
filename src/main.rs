use std::path::PathBuf;

use anyhow::Context;
use pgr_capture::acquisition::{
    AcquisitionPipeline, CameraSettings, NamingScheme, TiffCompression, TiffImageWriter,
    TriggerKind, WriterConfig,
};
use pgr_capture::logger;

use tracing::info;

fn main() -> anyhow::Result<()> {
    logger::init();

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => CameraSettings::from_path(&path)
            .with_context(|| format!("loading settings from {path}"))?,
        None => CameraSettings {
            num_images: 5,
            ..CameraSettings::default()
        },
    };
    let output_dir = PathBuf::from(args.next().unwrap_or_else(|| "capture".to_string()));

    info!("Starting pgr_capture against the simulated camera...");

    let session = settings.into_session()?;
    let num_images = session.num_images;
    let trigger = session.trigger;

    let mut pipeline = AcquisitionPipeline::simulated()?;
    pipeline.configure(session)?;
    pipeline.start()?;

    match trigger {
        TriggerKind::Software => pipeline.fire_all()?,
        TriggerKind::Hardware => {
            pipeline.wait_hardware_armed()?;
            for _ in 0..num_images {
                pipeline.driver_mut().simulate_hardware_pulse();
            }
        }
    }

    pipeline.retrieve_all()?;
    pipeline.convert_all()?;

    let writer = TiffImageWriter::new(
        WriterConfig::builder()
            .compression(TiffCompression::DeflateFast)
            .build(),
    );
    let record = pipeline
        .persist(&NamingScheme::new(&output_dir), &writer)
        .context("writing images")?;

    let record_path = output_dir.join("acquisition.json");
    record.write_json(&record_path)?;
    info!(
        "Wrote {} images and {}",
        record.files.len(),
        record_path.display()
    );
    info!("Relative capture times (ms): {:?}", record.relative_times_ms);

    pipeline.timings().log_summary();
    pipeline.stop()?;

    Ok(())
}
