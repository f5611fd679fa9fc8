use takedeck::config::{Config, SETTABLE_KEYS};
use takedeck::player::{PlaybackEngine, SilentOutput, StopPolicy};
use tempfile::TempDir;

#[test]
fn test_config_lifecycle() {
    // Create a temporary directory for test config
    let temp_dir = TempDir::new().unwrap();

    // Override the config path for testing
    unsafe {
        std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
    }

    assert!(!Config::exists().unwrap());
    assert!(
        Config::config_path()
            .unwrap()
            .starts_with(temp_dir.path().join("takedeck"))
    );

    // Missing file loads as defaults
    let loaded = Config::load().unwrap();
    assert_eq!(loaded, Config::new());

    Config::new().save().unwrap();
    assert!(Config::exists().unwrap());

    // Every settable key round-trips through the file
    let mut config = Config::load().unwrap();
    config.set_value("overlap_seconds", "0.1").unwrap();
    config.set_value("retain_position_on_pause", "true").unwrap();
    config.set_value("shuffle_seed", "42").unwrap();
    config.set_value("log_level", "INFO").unwrap();
    config.save().unwrap();

    let reloaded = Config::load().unwrap();
    assert_eq!(reloaded.overlap_seconds, 0.1);
    assert!(reloaded.retain_position_on_pause);
    assert_eq!(reloaded.shuffle_seed, Some(42));
    assert_eq!(reloaded.log_level, "info");
    assert_eq!(reloaded.log_level_filter(), log::LevelFilter::Info);

    // The engine honours the stored pause policy
    let engine = PlaybackEngine::from_config(&reloaded, Box::new(SilentOutput::new()));
    assert_eq!(engine.stop_policy(), StopPolicy::RetainPosition);
    assert_eq!(engine.clock_interval().as_millis(), 50);

    // Rejected values leave the file untouched
    let mut config = Config::load().unwrap();
    assert!(config.set_value("invalid_key", "value").is_err());
    assert!(config.set_value("tick_interval_ms", "0").is_err());
    assert!(!SETTABLE_KEYS.contains(&"invalid_key"));
    assert_eq!(Config::load().unwrap(), reloaded);
}
