//! INI file configuration adapter.

use crate::domain::error::PairtraderError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PairtraderError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(PairtraderError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("config file not found: {}", path.display()),
            )));
        }
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| PairtraderError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, PairtraderError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| PairtraderError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[pair]
etf = XLK
stock = MSFT

[strategy]
capital = 1000000
beta_window = 60
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(adapter.get_string("pair", "etf"), Some("XLK".to_string()));
        assert_eq!(adapter.get_string("pair", "stock"), Some("MSFT".to_string()));
        assert_eq!(adapter.get_string("strategy", "beta_window"), Some("60".to_string()));
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[strategy]\ncapital = 100\n").unwrap();
        assert_eq!(adapter.get_string("strategy", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn values_are_returned_unparsed() {
        let adapter =
            FileConfigAdapter::from_string("[strategy]\nbeta_window = abc\ntheta_entry = 2.25\n")
                .unwrap();
        assert_eq!(adapter.get_string("strategy", "beta_window"), Some("abc".to_string()));
        assert_eq!(adapter.get_string("strategy", "theta_entry"), Some("2.25".to_string()));
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[data]\ncsv_dir = /srv/prices\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("data", "csv_dir"),
            Some("/srv/prices".to_string())
        );
    }

    #[test]
    fn from_file_returns_io_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(PairtraderError::Io(_))));
    }
}
