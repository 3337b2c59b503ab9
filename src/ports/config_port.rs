//! Configuration access port trait.

/// Section/key lookup over a configuration source. Values come back as raw
/// strings; parsing and range checks belong to `config_validation`.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
}
