//! Runtime configuration.

/// Settings fixed when a runtime starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Arena capacity, in bytes.
    pub memory: usize,
    /// Columns available to each stack line.
    pub stack_width: usize,
    /// Show every stack entry on one line.
    pub flat_stack: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            memory: 64 * 1024,
            stack_width: 80,
            flat_stack: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Invalid { variable: &'static str, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Invalid { variable, value } => {
                write!(f, "invalid value for {variable}: {value:?}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

pub const MEMORY_VAR: &str = "RPLISH_MEMORY";
pub const WIDTH_VAR: &str = "RPLISH_WIDTH";

/// A byte count, with an optional `K` or `M` suffix.
fn parse_size(value: &str) -> Option<usize> {
    let value = value.trim();
    let (digits, scale) = match value.char_indices().last()? {
        (i, 'k' | 'K') => (&value[..i], 1024),
        (i, 'm' | 'M') => (&value[..i], 1024 * 1024),
        _ => (value, 1),
    };
    digits.parse::<usize>().ok()?.checked_mul(scale)
}

impl Config {
    /// Defaults, overridden by the environment.
    pub fn from_env() -> Result<Config, ConfigError> {
        Config::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
        let mut config = Config::default();
        if let Some(value) = var(MEMORY_VAR) {
            config.memory = parse_size(&value)
                .filter(|&m| m > 0 && m <= u32::MAX as usize)
                .ok_or(ConfigError::Invalid {
                    variable: MEMORY_VAR,
                    value,
                })?;
        }
        if let Some(value) = var(WIDTH_VAR) {
            config.stack_width = match value.trim().parse::<usize>() {
                Ok(w) if w >= 8 => w,
                _ => {
                    return Err(ConfigError::Invalid {
                        variable: WIDTH_VAR,
                        value,
                    })
                }
            };
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn sizes_take_suffixes() {
        assert_eq!(parse_size("4096"), Some(4096));
        assert_eq!(parse_size("16K"), Some(16 * 1024));
        assert_eq!(parse_size("2m"), Some(2 * 1024 * 1024));
        assert_eq!(parse_size("K"), None);
        assert_eq!(parse_size("lots"), None);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = Config::from_vars(vars(&[(MEMORY_VAR, "8K"), (WIDTH_VAR, "40")])).unwrap();
        assert_eq!(
            config,
            Config {
                memory: 8192,
                stack_width: 40,
                flat_stack: true,
            }
        );
        assert_eq!(Config::from_vars(vars(&[])).unwrap(), Config::default());
    }

    #[test]
    fn bad_values_are_reported() {
        match Config::from_vars(vars(&[(MEMORY_VAR, "0")])) {
            Err(ConfigError::Invalid { variable: MEMORY_VAR, .. }) => (),
            v => panic!("unexpected result: {v:?}"),
        }
        match Config::from_vars(vars(&[(WIDTH_VAR, "wide")])) {
            Err(ConfigError::Invalid { variable: WIDTH_VAR, .. }) => (),
            v => panic!("unexpected result: {v:?}"),
        };
    }
}
