use crate::AppConfig;
use figment::Jail;

#[test]
fn test_defaults_without_files() {
    Jail::expect_with(|_jail| {
        let config = AppConfig::load(".").map_err(|e| e.to_string())?;
        assert_eq!(config.app_env, "development");
        assert_eq!(config.store.name, "shop");
        assert_eq!(config.store.slow_query_threshold_ms, 100);
        assert_eq!(config.pagination.default_page_size, 20);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(!config.telemetry.json);
        Ok(())
    });
}

#[test]
fn test_environment_file_overrides_default() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "default.toml",
            r#"
                app_name = "shop-data"
                [pagination]
                default_page_size = 20
            "#,
        )?;
        jail.create_file(
            "production.toml",
            r#"
                app_env = "production"
                [telemetry]
                json = true
                log_level = "warn"
            "#,
        )?;
        jail.set_env("APP_ENV", "production");

        let config = AppConfig::load(".").map_err(|e| e.to_string())?;
        assert!(config.is_production());
        assert!(config.telemetry.json);
        assert_eq!(config.telemetry.log_level, "warn");
        assert_eq!(config.pagination.default_page_size, 20);
        Ok(())
    });
}

#[test]
fn test_env_vars_override_files() {
    Jail::expect_with(|jail| {
        jail.create_file("default.toml", "[store]\nslow_query_threshold_ms = 250")?;
        jail.set_env("SHOP_STORE__SLOW_QUERY_THRESHOLD_MS", "5");
        jail.set_env("SHOP_STORE__NAME", "catalog");

        let config = AppConfig::load(".").map_err(|e| e.to_string())?;
        assert_eq!(config.store.slow_query_threshold_ms, 5);
        assert_eq!(config.store.name, "catalog");
        Ok(())
    });
}

#[test]
fn test_negative_page_size_is_rejected() {
    Jail::expect_with(|jail| {
        jail.create_file("default.toml", "[pagination]\ndefault_page_size = -1")?;
        assert!(AppConfig::load(".").is_err());
        Ok(())
    });
}
