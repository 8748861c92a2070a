//! `portico validate`: check a configuration file without starting the gateway.
//!
//! A valid file is reported as the table of mounted routes it would serve.
//! `--format json` prints the same [`Report`] as one JSON object.

use serde::Serialize;

use crate::cli::{ValidateArgs, ValidateFormat};
use crate::config::model::Config;
use crate::config::sources::parse_config_str;
use crate::config::validation;
use crate::error::{PorticoError, ValidationError};

/// One mounted endpoint and where it forwards to.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct MountedRoute {
    pub path: String,
    pub service: String,
    pub target: String,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub valid: bool,
    pub mount_path: String,
    pub routes: Vec<MountedRoute>,
    pub unused_services: Vec<String>,
    pub errors: Vec<ValidationError>,
}

impl Report {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let errors = validation::validate(config).err().unwrap_or_default();
        let prefix = config.gateway.mount_prefix();

        let routes = if errors.is_empty() {
            config
                .endpoints
                .iter()
                .filter_map(|(endpoint, service)| {
                    let base = config.services.get(service)?;
                    Some(MountedRoute {
                        path: format!("{prefix}/{endpoint}"),
                        service: service.clone(),
                        target: format!("{}/{endpoint}", base.trim_end_matches('/')),
                    })
                })
                .collect()
        } else {
            Vec::new()
        };

        Self {
            valid: errors.is_empty(),
            mount_path: config.gateway.mount_path.clone(),
            routes,
            unused_services: config
                .unused_services()
                .into_iter()
                .map(String::from)
                .collect(),
            errors,
        }
    }
}

pub fn execute(args: &ValidateArgs) -> Result<(), PorticoError> {
    let path = &args.config;
    if !path.exists() {
        return Err(PorticoError::ConfigFileNotFound { path: path.clone() });
    }

    let content = std::fs::read_to_string(path)?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let config = parse_config_str(ext, &content, &path.display().to_string())?;
    let report = Report::new(&config);

    match args.format {
        ValidateFormat::Json => {
            let json = serde_json::to_string(&report).map_err(std::io::Error::other)?;
            println!("{json}");
        }
        ValidateFormat::Text if report.valid => {
            println!(
                "\u{2713} {}",
                validation::format_validation_report(&path.display().to_string(), &config)
            );
        }
        ValidateFormat::Text => {
            eprintln!(
                "\u{2717} {} has {} errors\n",
                path.display(),
                report.errors.len()
            );
            for error in &report.errors {
                eprintln!("{error}");
            }
        }
    }

    if report.valid {
        Ok(())
    } else {
        Err(PorticoError::ConfigValidation {
            errors: report.errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        let mut config = Config::default();
        config
            .services
            .insert("users".into(), "http://localhost:8080/users/".into());
        config
            .services
            .insert("billing".into(), "http://localhost:9000".into());
        config.endpoints.insert("login".into(), "users".into());
        config
    }

    #[test]
    fn valid_config_lists_mounted_routes() {
        let report = Report::new(&config());
        assert!(report.valid);
        assert!(report.errors.is_empty());
        assert_eq!(
            report.routes,
            vec![MountedRoute {
                path: "/api/login".into(),
                service: "users".into(),
                target: "http://localhost:8080/users/login".into(),
            }]
        );
        assert_eq!(report.unused_services, vec!["billing"]);
    }

    #[test]
    fn invalid_config_has_errors_and_no_routes() {
        let mut config = config();
        config.gateway.mount_path = "/".into();
        let report = Report::new(&config);
        assert!(!report.valid);
        assert!(report.routes.is_empty());
        assert_eq!(report.errors[0].key, "gateway.mount_path");
    }

    #[test]
    fn json_shape_uses_keyed_errors() {
        let mut config = config();
        config.endpoints.insert("checkout".into(), "orders".into());
        let json = serde_json::to_value(Report::new(&config)).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["mount_path"], "/api");
        assert_eq!(json["errors"][0]["key"], "endpoints.checkout");
        assert!(json["errors"][0]["suggestion"].is_null());
    }

    #[test]
    fn missing_file_is_reported() {
        let args = ValidateArgs {
            config: "does-not-exist.yaml".into(),
            format: ValidateFormat::Text,
        };
        assert!(matches!(
            execute(&args),
            Err(PorticoError::ConfigFileNotFound { .. })
        ));
    }
}
