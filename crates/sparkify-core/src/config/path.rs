//! Command-line arguments shared by the sparkify binaries.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Default)]
#[command(version, about = "Build the sparkify star schema from song and log JSON")]
pub struct CliArgs {
    /// Path to a YAML pipeline configuration (defaults are used when omitted)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to the INI credentials file (overrides `credentials_file` in the config)
    #[arg(long)]
    pub credentials: Option<PathBuf>,
}

/// Check if a path has a YAML extension.
pub fn is_yaml_file(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == "yaml" || ext == "yml")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments_is_valid() {
        let args = CliArgs::try_parse_from(["sparkify"]).unwrap();
        assert!(args.config.is_none());
        assert!(args.credentials.is_none());
    }

    #[test]
    fn test_config_and_credentials_flags() {
        let args =
            CliArgs::try_parse_from(["sparkify", "-c", "etl.yaml", "--credentials", "dl.cfg"])
                .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("etl.yaml")));
        assert_eq!(args.credentials, Some(PathBuf::from("dl.cfg")));
    }

    #[test]
    fn test_is_yaml_file() {
        assert!(is_yaml_file(std::path::Path::new("etl.yaml")));
        assert!(is_yaml_file(std::path::Path::new("etl.yml")));
        assert!(!is_yaml_file(std::path::Path::new("dl.cfg")));
    }
}
