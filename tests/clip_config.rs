use std::sync::Mutex;

use tempfile::NamedTempFile;

use clipscan::ClipConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "CLIPSCAN_CONFIG",
        "CLIPSCAN_STRIDE",
        "CLIPSCAN_CONFIDENCE",
        "CLIPSCAN_PRE_ROLL_SECS",
        "CLIPSCAN_POST_ROLL_SECS",
        "CLIPSCAN_TARGET_CLASSES",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "scan_stride": 5,
        "confidence_threshold": 0.6,
        "pre_roll_seconds": 1.5,
        "post_roll_seconds": 3.0,
        "target_classes": [3, 4, 5]
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("CLIPSCAN_CONFIG", file.path());
    std::env::set_var("CLIPSCAN_STRIDE", "20");
    std::env::set_var("CLIPSCAN_TARGET_CLASSES", "1,2");

    let cfg = ClipConfig::load().expect("load config");

    assert_eq!(cfg.scan_stride, 20);
    assert_eq!(cfg.confidence_threshold, 0.6);
    assert_eq!(cfg.pre_roll_seconds, 1.5);
    assert_eq!(cfg.post_roll_seconds, 3.0);
    assert_eq!(cfg.target_classes, vec![1, 2]);

    clear_env();
}

#[test]
fn defaults_apply_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = ClipConfig::load().expect("load config");

    assert_eq!(cfg.scan_stride, 10);
    assert_eq!(cfg.confidence_threshold, 0.7);
    assert_eq!(cfg.pre_roll_seconds, 2.0);
    assert_eq!(cfg.post_roll_seconds, 2.0);

    clear_env();
}

#[test]
fn invalid_env_values_are_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("CLIPSCAN_STRIDE", "fast");
    assert!(ClipConfig::load().is_err());

    clear_env();
}
