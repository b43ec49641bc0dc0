// ABOUTME: Integration tests for configuration parsing and validation.
// ABOUTME: Tests YAML parsing, defaults, secret resolution, and desired-state conversion.

use cfrollout::config::*;
use cfrollout::foundry::AppState;
use cfrollout::lifecycle::LifecycleSpec;
use cfrollout::stability::ZeroInstancePolicy;
use cfrollout::types::LifecycleType;
use std::path::Path;
use std::time::Duration;

mod parsing {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let yaml = r#"
api:
  url: https://api.sys.example.com
apps:
  - name: web
    guid: 8C3A1F2E-0000-4000-8000-000000000001
"#;
        let config = Config::from_yaml(yaml).unwrap();
        let app = config.apps.first();
        assert_eq!(app.name, "web");
        assert_eq!(app.guid.as_str(), "8c3a1f2e-0000-4000-8000-000000000001");
        assert_eq!(app.lifecycle, LifecycleType::Buildpack);
        assert_eq!(app.state, AppState::Started);
        assert_eq!(app.zero_instances, ZeroInstancePolicy::Stable);
        assert!(!config.api.skip_ssl_validation);
    }

    #[test]
    fn parse_full_config() {
        let yaml = r#"
api:
  url: https://api.sys.example.com
  token: literal-token
  skip_ssl_validation: true

timeouts:
  stage: 20m
  deploy: 10m
  start: 5m
  poll_interval: 3s
  delay: 1s
  stabilize_interval: 4s
  not_found_checks: 4

retry:
  update_attempts: 7
  deployment_attempts: 2

apps:
  - name: web
    guid: a1
    lifecycle: buildpack
    buildpacks: [ruby_buildpack, nodejs_buildpack]
    stack: cflinuxfs4
    source_code_path: build/web.zip
    source_code_hash: 9f86d081
    environment:
      RAILS_ENV: production
    state: STOPPED
  - name: worker
    guid: b2
    lifecycle: docker
    docker_image: registry.example.com/team/worker:1.4
    docker_username: bot
    docker_password: hunter2
    zero_instances: pending
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert!(config.api.skip_ssl_validation);
        assert_eq!(config.timeouts.stage, Duration::from_secs(20 * 60));
        assert_eq!(config.timeouts.not_found_checks, 4);
        assert_eq!(config.retry.update_policy().max_attempts(), 7);
        assert_eq!(config.retry.deployment_policy().max_attempts(), 2);
        assert_eq!(config.apps.len(), 2);

        let worker = config.app("worker").unwrap();
        assert_eq!(worker.lifecycle, LifecycleType::Docker);
        assert_eq!(
            worker.docker_image.as_ref().map(|i| i.to_string()),
            Some("registry.example.com/team/worker:1.4".to_string())
        );
        assert_eq!(worker.zero_instances, ZeroInstancePolicy::Pending);

        let rollout = config.timeouts.rollout(worker.zero_instances);
        assert_eq!(rollout.stabilize_wait.poll_interval, Duration::from_secs(4));
        assert_eq!(rollout.deploy_wait.timeout, Duration::from_secs(10 * 60));
        assert_eq!(rollout.start_wait.not_found_checks, 4);
    }

    #[test]
    fn defaults_match_platform_tooling() {
        let timeouts = TimeoutsConfig::default();
        assert_eq!(timeouts.poll_interval, Duration::from_secs(5));
        assert_eq!(timeouts.delay, Duration::from_secs(5));
        assert_eq!(timeouts.stabilize_interval, Duration::from_secs(2));
        assert_eq!(timeouts.not_found_checks, 2);

        let retry = RetryConfig::default();
        assert_eq!(retry.update_attempts, 5);
        assert_eq!(retry.deployment_attempts, 3);
    }

    #[test]
    fn empty_app_list_is_rejected() {
        let yaml = r#"
api:
  url: https://api.sys.example.com
apps: []
"#;
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("at least one application"));
    }

    #[test]
    fn duplicate_app_names_are_rejected() {
        let yaml = r#"
api:
  url: https://api.sys.example.com
apps:
  - name: web
    guid: a1
  - name: web
    guid: b2
"#;
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("duplicate application name"));
    }

    #[test]
    fn app_names_cannot_escape_the_state_dir() {
        for name in ["../x", "a/b", "'..'", "'a\\b'", "''"] {
            let yaml = format!(
                "api:\n  url: https://api.sys.example.com\napps:\n  - name: {name}\n    guid: a1\n"
            );
            let err = Config::from_yaml(&yaml).unwrap_err();
            assert!(err.to_string().contains("application name"), "{name}: {err}");
        }
    }

    #[test]
    fn invalid_guid_is_rejected() {
        let yaml = r#"
api:
  url: https://api.sys.example.com
apps:
  - name: web
    guid: not-a-guid!
"#;
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn unknown_app_is_an_error() {
        let yaml = r#"
api:
  url: https://api.sys.example.com
apps:
  - name: web
    guid: a1
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert!(config.app("api").is_err());
        assert_eq!(config.select(None).unwrap().len(), 1);
    }
}

mod secrets {
    use super::*;

    #[test]
    fn token_defaults_to_cf_token_env() {
        let yaml = r#"
api:
  url: https://api.sys.example.com
apps:
  - name: web
    guid: a1
"#;
        let config = Config::from_yaml(yaml).unwrap();
        temp_env::with_var("CF_TOKEN", Some("from-env"), || {
            let session = config.api.session_config().unwrap();
            assert_eq!(session.token, "from-env");
        });
        temp_env::with_var_unset("CF_TOKEN", || {
            assert!(config.api.session_config().is_err());
        });
    }

    #[test]
    fn env_value_default_applies() {
        let value = EnvValue::FromEnv {
            var: "CFROLLOUT_TEST_UNSET".into(),
            default: Some("fallback".into()),
        };
        temp_env::with_var_unset("CFROLLOUT_TEST_UNSET", || {
            assert_eq!(value.resolve().unwrap(), "fallback");
        });
    }

    #[test]
    fn env_value_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("password");
        std::fs::write(&path, "s3cret\n").unwrap();

        let value = EnvValue::FromFile { file: path };
        assert_eq!(value.resolve().unwrap(), "s3cret");
    }

    #[test]
    fn environment_values_resolve_from_env() {
        let yaml = r#"
api:
  url: https://api.sys.example.com
apps:
  - name: web
    guid: a1
    environment:
      API_KEY:
        env: CFROLLOUT_TEST_API_KEY
"#;
        let config = Config::from_yaml(yaml).unwrap();
        temp_env::with_var("CFROLLOUT_TEST_API_KEY", Some("k-123"), || {
            let desired = config.apps.first().desired(Path::new("/srv")).unwrap();
            assert_eq!(desired.environment["API_KEY"], "k-123");
        });
    }
}

mod desired {
    use super::*;

    #[test]
    fn source_path_is_relative_to_project() {
        let yaml = r#"
api:
  url: https://api.sys.example.com
apps:
  - name: web
    guid: a1
    source_code_path: build/web.zip
"#;
        let config = Config::from_yaml(yaml).unwrap();
        let desired = config.apps.first().desired(Path::new("/srv/project")).unwrap();
        match desired.lifecycle {
            LifecycleSpec::Buildpack { source_path, .. } => {
                assert_eq!(source_path.unwrap(), Path::new("/srv/project/build/web.zip"))
            }
            other => panic!("expected buildpack lifecycle, got {other:?}"),
        }
    }

    #[test]
    fn docker_credentials_need_both_parts() {
        let yaml = r#"
api:
  url: https://api.sys.example.com
apps:
  - name: worker
    guid: b2
    lifecycle: docker
    docker_image: org/worker:1
    docker_username: bot
"#;
        let config = Config::from_yaml(yaml).unwrap();
        let err = config.apps.first().desired(Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("docker_password"));
    }

    #[test]
    fn docker_image_requires_docker_lifecycle() {
        let yaml = r#"
api:
  url: https://api.sys.example.com
apps:
  - name: worker
    guid: b2
    docker_image: org/worker:1
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert!(config.apps.first().desired(Path::new(".")).is_err());
    }
}

mod discovery {
    use super::*;

    #[test]
    fn discovers_alternate_locations() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".cfrollout")).unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILENAME_DIR),
            "api:\n  url: https://api.example.com\napps:\n  - name: web\n    guid: a1\n",
        )
        .unwrap();

        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.apps.first().name, "web");
    }

    #[test]
    fn missing_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::discover(dir.path()).unwrap_err();
        assert!(err.to_string().contains("configuration file not found"));
    }

    #[test]
    fn init_writes_parseable_template() {
        let dir = tempfile::tempdir().unwrap();
        init_config(dir.path(), Some("web"), Some("AB12"), None, false).unwrap();

        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.apps.first().guid.as_str(), "ab12");
        assert!(init_config(dir.path(), None, None, None, false).is_err());
        init_config(dir.path(), None, None, None, true).unwrap();
    }
}
