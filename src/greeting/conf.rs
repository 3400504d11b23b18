//! Location-scoped configuration for the greeting handler.
//!
//! # Responsibilities
//! - Create the per-location config with its as-loaded defaults
//! - Declare the directive table (name + arity)
//! - Apply directives through their setters
//!
//! # Design Decisions
//! - Arity is checked by the compiler before a setter runs
//! - No parent/child merge: every location compiles on its own
//! - A compiled `RouteConfig` is never mutated

use thiserror::Error;

/// Errors raised while compiling location directives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid number of arguments in \"{directive}\" directive")]
    InvalidArgument { directive: String },

    #[error("invalid value \"{value}\" in \"{directive}\" directive, it must be \"on\" or \"off\"")]
    InvalidFlag { directive: String, value: String },

    #[error("unknown directive \"{0}\"")]
    UnknownDirective(String),

    #[error("\"{0}\" directive is duplicate")]
    Duplicate(String),

    #[error("empty directive")]
    Empty,
}

/// Number of arguments a directive accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Zero or one argument.
    NoArgsOrTake1,
    /// Exactly one `on`/`off` argument.
    Flag,
}

impl Arity {
    fn accepts(self, count: usize) -> bool {
        match self {
            Arity::NoArgsOrTake1 => count <= 1,
            Arity::Flag => count == 1,
        }
    }
}

type Setter = fn(&mut RouteConfig, &[&str]) -> Result<(), ConfigError>;

/// A directive understood by the greeting handler.
pub struct Command {
    pub name: &'static str,
    pub arity: Arity,
    set: Setter,
}

/// Directive table.
pub const COMMANDS: &[Command] = &[
    Command {
        name: "greeting_name",
        arity: Arity::NoArgsOrTake1,
        set: set_greeting_name,
    },
    Command {
        name: "enable_counter",
        arity: Arity::Flag,
        set: set_counter_enabled,
    },
];

/// Greeting configuration for one location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteConfig {
    /// Name to greet. Empty means not configured.
    pub greeting_name: String,
    /// `None` until `enable_counter` is seen.
    pub counter_enabled: Option<bool>,
}

impl RouteConfig {
    /// Fresh config with nothing set.
    pub fn create() -> Self {
        Self {
            greeting_name: String::new(),
            counter_enabled: None,
        }
    }

    /// Whether requests to this location can be served.
    pub fn is_serving(&self) -> bool {
        !self.greeting_name.is_empty()
    }

    /// Whether responses include the visit count.
    pub fn counts_visits(&self) -> bool {
        self.counter_enabled == Some(true)
    }

    /// Compile a list of directive lines into a config.
    ///
    /// Lines look like `greeting_name jo-qzy` or `enable_counter on;`.
    pub fn compile<S: AsRef<str>>(lines: &[S]) -> Result<Self, ConfigError> {
        let mut conf = Self::create();
        let mut seen: Vec<&'static str> = Vec::with_capacity(COMMANDS.len());

        for line in lines {
            let line = line.as_ref().trim().trim_end_matches(';');
            let mut words = line.split_ascii_whitespace();
            let name = words.next().ok_or(ConfigError::Empty)?;
            let args: Vec<&str> = words.collect();

            let command = COMMANDS
                .iter()
                .find(|c| c.name == name)
                .ok_or_else(|| ConfigError::UnknownDirective(name.to_string()))?;

            if seen.contains(&command.name) {
                return Err(ConfigError::Duplicate(command.name.to_string()));
            }
            seen.push(command.name);

            if !command.arity.accepts(args.len()) {
                return Err(ConfigError::InvalidArgument {
                    directive: command.name.to_string(),
                });
            }

            (command.set)(&mut conf, &args)?;
        }

        Ok(conf)
    }

    /// Check that `lines` compile, without the setters' log lines.
    ///
    /// Validation uses this; the log lines come from the compile that
    /// builds the served locations.
    pub fn check<S: AsRef<str>>(lines: &[S]) -> Result<(), ConfigError> {
        tracing::subscriber::with_default(tracing::subscriber::NoSubscriber::default(), || {
            Self::compile(lines).map(drop)
        })
    }
}

/// `greeting_name [value]`
pub fn set_greeting_name(conf: &mut RouteConfig, args: &[&str]) -> Result<(), ConfigError> {
    match args {
        [] => conf.greeting_name.clear(),
        [value] => conf.greeting_name = (*value).to_string(),
        _ => {
            return Err(ConfigError::InvalidArgument {
                directive: "greeting_name".to_string(),
            })
        }
    }

    tracing::info!(greeting_name = %conf.greeting_name, "greeting name configured");
    Ok(())
}

/// `enable_counter on|off`
pub fn set_counter_enabled(conf: &mut RouteConfig, args: &[&str]) -> Result<(), ConfigError> {
    let [value] = args else {
        return Err(ConfigError::InvalidArgument {
            directive: "enable_counter".to_string(),
        });
    };

    let enabled = if value.eq_ignore_ascii_case("on") {
        true
    } else if value.eq_ignore_ascii_case("off") {
        false
    } else {
        return Err(ConfigError::InvalidFlag {
            directive: "enable_counter".to_string(),
            value: (*value).to_string(),
        });
    };

    conf.counter_enabled = Some(enabled);
    tracing::info!(counter_enabled = enabled, "visit counter configured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_defaults() {
        let conf = RouteConfig::create();
        assert_eq!(conf.greeting_name, "");
        assert_eq!(conf.counter_enabled, None);
        assert!(!conf.is_serving());
        assert!(!conf.counts_visits());
    }

    #[test]
    fn test_compile_both_directives() {
        let conf = RouteConfig::compile(&["greeting_name jo-qzy", "enable_counter on;"]).unwrap();
        assert_eq!(conf.greeting_name, "jo-qzy");
        assert_eq!(conf.counter_enabled, Some(true));
        assert!(conf.counts_visits());
    }

    #[test]
    fn test_greeting_name_without_argument_is_empty() {
        let conf = RouteConfig::compile(&["greeting_name"]).unwrap();
        assert!(!conf.is_serving());
    }

    #[test]
    fn test_greeting_name_stored_verbatim() {
        let mut conf = RouteConfig::create();
        set_greeting_name(&mut conf, &["<b>Jo</b>"]).unwrap();
        assert_eq!(conf.greeting_name, "<b>Jo</b>");
    }

    #[test]
    fn test_too_many_arguments() {
        let err = RouteConfig::compile(&["greeting_name jo qzy"]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidArgument {
                directive: "greeting_name".into()
            }
        );

        let err = RouteConfig::compile(&["enable_counter"]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidArgument { .. }));
    }

    #[test]
    fn test_setter_rejects_extra_arguments() {
        let mut conf = RouteConfig::create();
        assert!(set_greeting_name(&mut conf, &["a", "b"]).is_err());
        assert!(set_counter_enabled(&mut conf, &["on", "off"]).is_err());
    }

    #[test]
    fn test_flag_values() {
        let conf = RouteConfig::compile(&["enable_counter OFF"]).unwrap();
        assert_eq!(conf.counter_enabled, Some(false));

        let err = RouteConfig::compile(&["enable_counter yes"]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFlag { .. }));
    }

    #[test]
    fn test_unknown_and_duplicate_directives() {
        let err = RouteConfig::compile(&["hello_world on"]).unwrap_err();
        assert_eq!(err, ConfigError::UnknownDirective("hello_world".into()));

        let err = RouteConfig::compile(&["greeting_name a", "greeting_name b"]).unwrap_err();
        assert_eq!(err, ConfigError::Duplicate("greeting_name".into()));

        let err = RouteConfig::compile(&["   "]).unwrap_err();
        assert_eq!(err, ConfigError::Empty);
    }
}
