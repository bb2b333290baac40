//! # Named flag sets and the combined flag namespace.
//!
//! A [`FlagSet`] is an ordered collection of [`Flag`]s contributed by one unit (or by the
//! group itself). The group merges every set into one namespace, parses the command line
//! against it and binds the parsed values back into each flag's [`Value`] handle.
//!
//! ## Rules
//! - Flags keep registration order (usage output is not sorted).
//! - Merging is **first-wins**: a flag whose long name already exists is skipped.
//! - A merged flag whose shorthand is already taken keeps only its long name.
//! - Only flags present on the command line are bound; the rest keep their defaults.

use std::fmt;
use std::sync::Arc;

use clap::builder::ValueParser;
use clap::{Arg, ArgAction, ArgMatches, Command};

use super::usage;
use super::value::{FlagValue, Value};

/// Id of the catch-all positional argument.
const POSITIONAL: &str = "__positional__";

/// Writes a parsed command-line value into a flag's [`Value`] handle.
type Binder = Arc<dyn Fn(&ArgMatches, &str) + Send + Sync>;

/// A single flag definition.
#[derive(Clone)]
pub struct Flag {
    pub(crate) long: String,
    pub(crate) short: Option<char>,
    pub(crate) usage: String,
    pub(crate) type_name: &'static str,
    pub(crate) default: Option<String>,
    pub(crate) hidden: bool,
    pub(crate) sensitive: bool,
    is_bool: bool,
    parser: ValueParser,
    binder: Binder,
}

impl Flag {
    /// Long flag name (without dashes).
    pub fn name(&self) -> &str {
        &self.long
    }

    /// Single character shorthand, if any.
    pub fn shorthand(&self) -> Option<char> {
        self.short
    }

    /// `true` if the flag is left out of usage output.
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// `true` if the flag's value must never be shown.
    pub fn is_sensitive(&self) -> bool {
        self.sensitive
    }

    fn to_arg(&self) -> Arg {
        let mut arg = Arg::new(self.long.clone())
            .long(self.long.clone())
            .value_parser(self.parser.clone())
            .action(ArgAction::Set);
        if let Some(short) = self.short {
            arg = arg.short(short);
        }
        if self.is_bool {
            arg = arg
                .num_args(0..=1)
                .require_equals(true)
                .default_missing_value("true");
        } else if matches!(self.type_name, "int" | "float") {
            arg = arg.allow_negative_numbers(true);
        }
        arg
    }

    fn bind(&self, matches: &ArgMatches) {
        (self.binder)(matches, &self.long);
    }
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flag")
            .field("long", &self.long)
            .field("short", &self.short)
            .field("type_name", &self.type_name)
            .field("hidden", &self.hidden)
            .field("sensitive", &self.sensitive)
            .finish()
    }
}

/// Errors raised while editing a [`FlagSet`].
#[non_exhaustive]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FlagSetError {
    /// No flag with this long name exists in the set.
    #[error("flag {0:?} does not exist")]
    UnknownFlag(String),
}

/// Ordered, named collection of flags.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use rungroup::FlagSet;
///
/// let mut fs = FlagSet::new("http server");
/// let addr = fs.string("listen", Some('l'), ":8080", "listen address");
/// let timeout = fs.duration("read-timeout", None, Duration::from_secs(5), "read timeout");
/// assert_eq!(addr.get(), ":8080");
/// assert_eq!(timeout.get(), Duration::from_secs(5));
/// assert!(fs.lookup("listen").is_some());
/// ```
#[derive(Clone, Debug)]
pub struct FlagSet {
    name: String,
    flags: Vec<Flag>,
}

impl FlagSet {
    /// Creates an empty set. The name titles the set's section in help output.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flags: Vec::new(),
        }
    }

    /// Name of the set.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Flags in registration order.
    pub fn flags(&self) -> &[Flag] {
        &self.flags
    }

    /// `true` if no flags are registered.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Looks a flag up by its long name.
    pub fn lookup(&self, long: &str) -> Option<&Flag> {
        self.flags.iter().find(|f| f.long == long)
    }

    /// Registers a flag of any [`FlagValue`] type.
    pub fn value<T: FlagValue>(
        &mut self,
        long: &str,
        short: Option<char>,
        default: T,
        usage: &str,
    ) -> Value<T> {
        self.register(long, short, default, usage, false)
    }

    /// Registers a string flag.
    pub fn string(&mut self, long: &str, short: Option<char>, default: &str, usage: &str) -> Value<String> {
        self.value(long, short, default.to_string(), usage)
    }

    /// Registers a string flag whose value (including the default) is masked in usage output.
    pub fn sensitive_string(
        &mut self,
        long: &str,
        short: Option<char>,
        default: &str,
        usage: &str,
    ) -> Value<String> {
        self.register(long, short, default.to_string(), usage, true)
    }

    /// Registers a boolean flag (`--flag`, `--flag=true`, `--flag=false`).
    pub fn bool(&mut self, long: &str, short: Option<char>, default: bool, usage: &str) -> Value<bool> {
        self.value(long, short, default, usage)
    }

    /// Registers a signed integer flag.
    pub fn int(&mut self, long: &str, short: Option<char>, default: i64, usage: &str) -> Value<i64> {
        self.value(long, short, default, usage)
    }

    /// Registers an unsigned integer flag.
    pub fn uint(&mut self, long: &str, short: Option<char>, default: u64, usage: &str) -> Value<u64> {
        self.value(long, short, default, usage)
    }

    /// Registers a floating point flag.
    pub fn float(&mut self, long: &str, short: Option<char>, default: f64, usage: &str) -> Value<f64> {
        self.value(long, short, default, usage)
    }

    /// Registers a duration flag using humantime syntax (`250ms`, `1m 30s`).
    pub fn duration(
        &mut self,
        long: &str,
        short: Option<char>,
        default: std::time::Duration,
        usage: &str,
    ) -> Value<std::time::Duration> {
        self.value(long, short, default, usage)
    }

    /// Hides a flag from usage output. It still parses.
    pub fn mark_hidden(&mut self, long: &str) -> Result<(), FlagSetError> {
        match self.flags.iter_mut().find(|f| f.long == long) {
            Some(flag) => {
                flag.hidden = true;
                Ok(())
            }
            None => Err(FlagSetError::UnknownFlag(long.to_string())),
        }
    }

    /// Merges another set's flags into this one, first-wins.
    ///
    /// Returns the long names of flags that were skipped because they already existed.
    pub fn merge(&mut self, other: &FlagSet) -> Vec<String> {
        let mut skipped = Vec::new();
        for flag in &other.flags {
            if !self.add_flag(flag.clone()) {
                skipped.push(flag.long.clone());
            }
        }
        skipped
    }

    /// Adds a single flag unless its long name is taken. Returns `false` when skipped.
    pub fn add_flag(&mut self, mut flag: Flag) -> bool {
        if self.lookup(&flag.long).is_some() {
            return false;
        }
        if flag
            .short
            .is_some_and(|s| self.flags.iter().any(|f| f.short == Some(s)))
        {
            flag.short = None;
        }
        self.flags.push(flag);
        true
    }

    /// Renders pflag-style usage lines for every visible flag.
    pub fn usages(&self) -> String {
        usage::render(&self.flags)
    }

    /// Parses `args` (first element is the binary name) and binds values into the flags.
    ///
    /// Returns the positional arguments.
    pub(crate) fn parse<I, T>(&self, args: I) -> Result<Vec<String>, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = self.command(false).try_get_matches_from(args)?;
        Ok(self.bind_all(&matches))
    }

    /// Parses `args` ignoring unknown flags and malformed values.
    pub(crate) fn parse_lenient<I, T>(&self, args: I) -> Vec<String>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        match self.command(true).try_get_matches_from(args) {
            Ok(matches) => self.bind_all(&matches),
            Err(_) => Vec::new(),
        }
    }

    fn command(&self, lenient: bool) -> Command {
        Command::new(self.name.clone())
            .disable_help_flag(true)
            .disable_version_flag(true)
            .disable_help_subcommand(true)
            .args_override_self(true)
            .ignore_errors(lenient)
            .args(self.flags.iter().map(Flag::to_arg))
            .arg(
                Arg::new(POSITIONAL)
                    .num_args(0..)
                    .action(ArgAction::Append)
                    .value_parser(clap::value_parser!(String)),
            )
    }

    fn bind_all(&self, matches: &ArgMatches) -> Vec<String> {
        for flag in &self.flags {
            flag.bind(matches);
        }
        matches
            .try_get_many::<String>(POSITIONAL)
            .ok()
            .flatten()
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default()
    }

    fn register<T: FlagValue>(
        &mut self,
        long: &str,
        short: Option<char>,
        default: T,
        usage: &str,
        sensitive: bool,
    ) -> Value<T> {
        let value = Value::new(default.clone());
        let target = value.clone();
        let binder: Binder = Arc::new(move |matches: &ArgMatches, id: &str| {
            if let Ok(Some(parsed)) = matches.try_get_one::<T>(id) {
                target.set(parsed.clone());
            }
        });
        let rendered = if sensitive {
            default.render_default().map(|_| format!("{:?}", usage::MASK))
        } else {
            default.render_default()
        };
        self.flags.push(Flag {
            long: long.to_string(),
            short,
            usage: usage.to_string(),
            type_name: T::TYPE_NAME,
            default: rendered,
            hidden: false,
            sensitive,
            is_bool: T::TYPE_NAME.is_empty(),
            parser: T::value_parser(),
            binder,
        });
        value
    }
}
