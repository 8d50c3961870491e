use std::time::Duration;

use pgr_capture::acquisition::driver::{SensorSize, SimulatedCamera};
use pgr_capture::acquisition::{
    AcquisitionPipeline, CameraSettings, NamingScheme, PipelineState, TiffImageWriter,
};

#[test]
fn test_five_image_software_run_writes_tiffs_and_record() {
    let dir = tempfile::tempdir().unwrap();
    let settings = CameraSettings::from_json_str(
        r#"{"gain": 4.0, "exp_time_ms": 2.0, "use_roi": true, "use_roi_center": true,
            "roi_center": [160, 120], "roi_width": 64, "roi_height": 48, "num_images": 5}"#,
    )
    .unwrap();
    let camera = SimulatedCamera::new()
        .with_sensor(SensorSize::new(320, 240))
        .with_frame_interval(Duration::from_millis(20))
        .with_start_time(127.95)
        .with_stale_frames(2);

    let mut pipeline = AcquisitionPipeline::connect(camera, 0).unwrap();
    pipeline.configure(settings.into_session().unwrap()).unwrap();
    assert_eq!(pipeline.start().unwrap(), 2);
    pipeline.fire_all().unwrap();
    pipeline.retrieve_all().unwrap();
    pipeline.convert_all().unwrap();

    let record = pipeline
        .persist(&NamingScheme::new(dir.path().join("frames")), &TiffImageWriter::default())
        .unwrap();

    assert_eq!(pipeline.state(), PipelineState::Persisted);
    assert_eq!(record.files.len(), 5);
    assert_eq!(record.relative_times_ms.len(), 5);
    assert_eq!(record.relative_times_ms[0], 0.0);
    assert!(
        record
            .relative_times_ms
            .windows(2)
            .all(|pair| pair[1] >= pair[0])
    );
    // the camera's second counter wraps between the first and second frame
    assert!((record.relative_times_ms[4] - 80.0).abs() < 1e-3);

    for path in &record.files {
        let file = std::fs::File::open(path).unwrap();
        let mut decoder = tiff::decoder::Decoder::new(file).unwrap();
        assert_eq!(decoder.dimensions().unwrap(), (64, 48));
    }

    let record_path = dir.path().join("acquisition.json");
    record.write_json(&record_path).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&record_path).unwrap()).unwrap();
    assert_eq!(json["gain_db"], 4.0);
    assert_eq!(json["roi"]["kind"], "region");
    assert_eq!(json["roi"]["left"], 128);
    assert_eq!(json["roi"]["top"], 96);

    pipeline.stop().unwrap();
    assert!(!pipeline.driver().is_connected());
}

#[test]
fn test_simulated_pipeline_defaults_to_full_sensor() {
    let mut pipeline = AcquisitionPipeline::simulated().unwrap();
    pipeline
        .configure(
            CameraSettings::default()
                .into_session()
                .unwrap(),
        )
        .unwrap();
    pipeline.start().unwrap();
    pipeline.fire().unwrap();
    pipeline.retrieve_all().unwrap();

    let raw = pipeline.slots()[0].raw.as_ref().unwrap();
    assert_eq!((raw.cols, raw.rows), (1280, 960));
    assert_eq!(pipeline.record().unwrap().relative_times_ms, vec![0.0]);
}
