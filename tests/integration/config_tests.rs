use dupscan::config::Config;
use dupscan::duplicates::ScanStrategy;
use dupscan::scanner::DigestAlgorithm;
use figment::providers::{Format, Serialized, Toml};
use figment::Figment;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_config_load_defaults() {
    // Use figment directly without Env to avoid interference from other tests
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .extract()
        .unwrap();
    assert_eq!(config.strategy, ScanStrategy::Pipelined);
    assert_eq!(config.digest, DigestAlgorithm::Crc32);
    assert_eq!(config.digest_threads, 4);
}

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
strategy = "hybrid"
digest = "blake3"
digest_threads = 8
follow_symlinks = true
"#,
    )
    .unwrap();

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&config_path))
        .extract()
        .unwrap();

    assert_eq!(config.strategy, ScanStrategy::Hybrid);
    assert_eq!(config.digest, DigestAlgorithm::Blake3);
    assert_eq!(config.digest_threads, 8);
    assert!(config.follow_symlinks);
    // Unset keys keep their defaults
    assert_eq!(config.traversal_threads, 4);
}

#[test]
fn test_config_env_overrides_file() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "traversal_threads = 2\nstrategy = \"hybrid\"\n").unwrap();

    std::env::set_var("DUPSCAN_TRAVERSAL_THREADS", "6");
    let config = Config::load_from(Some(&config_path)).unwrap();
    std::env::remove_var("DUPSCAN_TRAVERSAL_THREADS");

    assert_eq!(config.traversal_threads, 6);
    assert_eq!(config.strategy, ScanStrategy::Hybrid);
}

#[test]
fn test_config_invalid_value_is_error() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "strategy = \"fastest\"\n").unwrap();

    assert!(Config::load_from(Some(&config_path)).is_err());
}

#[test]
fn test_config_invalid_toml_is_error() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "this is = = not toml").unwrap();

    let result: Result<Config, _> = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&config_path))
        .extract();
    assert!(result.is_err());
}

#[test]
fn test_config_save_round_trip() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("nested").join("config.toml");
    let config = Config {
        strategy: ScanStrategy::Sequential,
        digest_threads: 2,
        ..Default::default()
    };

    config.save(&config_path).unwrap();
    let saved = fs::read_to_string(&config_path).unwrap();
    assert!(saved.contains("strategy = \"sequential\""));
    assert!(saved.contains("digest_threads = 2"));

    let loaded: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&config_path))
        .extract()
        .unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_finder_config_from_config() {
    let config = Config {
        digest: DigestAlgorithm::Blake3,
        traversal_threads: 3,
        digest_threads: 5,
        follow_symlinks: true,
        ..Default::default()
    };
    let finder = config.finder_config();
    assert_eq!(finder.digest, DigestAlgorithm::Blake3);
    assert_eq!(finder.traversal_threads, 3);
    assert_eq!(finder.digest_threads, 5);
    assert!(finder.follow_symlinks);
}
