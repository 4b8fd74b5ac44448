//! Integration tests for the read-only mapping interface and typed
//! extraction.

use std::collections::BTreeMap;

use conflayer::{ConfigError, Configuration};
use serde::Deserialize;
use serde_json::{Value, json};

fn base() -> Value {
    json!({
        "foo": "bar",
        "logging": {
            "level": 5,
            "format": "some format",
            "handlers": {
                "handler1": "some config",
                "handler2": "other config"
            }
        },
        "items": [1, 2, 3],
        "is_enabled": false,
        "has_value": null
    })
}

fn config() -> Configuration {
    Configuration::new(base()).expect("base fixture is a mapping")
}

mod lookup_tests {
    use super::*;

    #[test]
    fn indexes_nested_values() {
        let config = config();
        assert_eq!(config["foo"], json!("bar"));
        assert_eq!(config["logging"]["level"], json!(5));
        assert_eq!(config["logging"]["handlers"]["handler1"], json!("some config"));
    }

    #[test]
    fn indexes_array_elements() {
        let config = config();
        assert_eq!(config["items"][0], json!(1));
        assert_eq!(config["items"][2], json!(3));
    }

    #[test]
    #[should_panic(expected = "unknown configuration key")]
    fn panics_on_unknown_keys() {
        let config = config();
        let _ = &config["does_not_exist"];
    }

    #[test]
    #[should_panic(expected = "cannot index non-mapping value")]
    fn panics_when_indexing_into_a_leaf() {
        let config = config();
        let _ = &config["items"]["item_foo"];
    }

    #[test]
    fn get_returns_none_for_unknown_keys() {
        let config = config();
        assert!(config.get("does_not_exist").is_none());
        assert_eq!(*config.get("foo").unwrap(), json!("bar"));
    }

    #[test]
    fn get_or_falls_back_for_unknown_keys() {
        let config = config();
        assert_eq!(config.get_or("foo", json!("fallback")), json!("bar"));
        assert_eq!(config.get_or("absent", json!("fallback")), json!("fallback"));
    }

    #[test]
    fn null_leaves_are_present_values() {
        let config = config();
        assert!(config.contains_key("has_value"));
        assert_eq!(config["has_value"], Value::Null);
        assert_eq!(config.get_or("has_value", json!("fallback")), Value::Null);
    }
}

mod iteration_tests {
    use super::*;

    #[test]
    fn len_counts_top_level_entries() {
        let config = config();
        assert_eq!(config.len(), 5);
        assert!(!config.is_empty());
    }

    #[test]
    fn keys_iterate_in_sorted_order() {
        let config = config();
        let keys: Vec<&str> = config.keys().collect();
        assert_eq!(keys, ["foo", "has_value", "is_enabled", "items", "logging"]);
    }

    #[test]
    fn iter_pairs_keys_with_nodes() {
        let config = config();
        let mappings: Vec<&str> = config
            .iter()
            .filter(|(_, node)| node.as_map().is_some())
            .map(|(key, _)| key)
            .collect();
        assert_eq!(mappings, ["logging"]);
        assert_eq!(config.values().count(), config.len());
    }

    #[test]
    fn contains_key_reports_top_level_entries() {
        let config = config();
        assert!(config.contains_key("logging"));
        assert!(!config.contains_key("level"));
    }
}

mod extraction_tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct AppConfig {
        foo: String,
        logging: LoggingConfig,
        items: Vec<i64>,
        is_enabled: bool,
        has_value: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    struct LoggingConfig {
        level: u8,
        format: String,
        handlers: BTreeMap<String, String>,
    }

    #[test]
    fn extracts_a_typed_configuration() -> anyhow::Result<()> {
        let config = config();
        let app: AppConfig = config.extract()?;

        assert_eq!(app.foo, "bar");
        assert_eq!(app.logging.level, 5);
        assert_eq!(app.logging.format, "some format");
        assert_eq!(app.logging.handlers.len(), 2);
        assert_eq!(app.items, [1, 2, 3]);
        assert!(!app.is_enabled);
        assert!(app.has_value.is_none());
        Ok(())
    }

    #[test]
    fn extraction_mismatch_is_a_serialization_error() {
        #[derive(Debug, Deserialize)]
        struct Wrong {
            #[allow(dead_code)]
            foo: u32,
        }

        let config = config();
        let err = config.extract::<Wrong>().unwrap_err();
        assert!(matches!(err, ConfigError::Serialize(_)));
    }

    #[test]
    fn to_value_round_trips_the_base() {
        let config = config();
        assert_eq!(config.to_value(), base());
    }
}
