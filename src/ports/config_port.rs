//! Configuration access port trait.

/// Typed lookups of `[section] key` values. Missing or unparseable values
/// fall back to the supplied default.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;

    /// Non-negative integer; negative values fall back to `default`.
    fn get_usize(&self, section: &str, key: &str, default: usize) -> usize {
        usize::try_from(self.get_int(section, key, default as i64)).unwrap_or(default)
    }
}
