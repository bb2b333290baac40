//! # Config phase.
//!
//! ```text
//! run_config_with(args)
//!   ├─ latch configured (second call is a no-op)
//!   ├─ resolve name: cfg.name → basename(argv[0]); pre-parse "Common Service options" for -n
//!   ├─ Initializer::initialize   (slot cleared first)
//!   ├─ Namer::group_name(name)
//!   ├─ Configurable::flag_set    merged first-wins into the namespace
//!   ├─ parse args                 error → RunError::Flags
//!   ├─ --help | --version | --show-rungroup-units → print, RunError::BailEarly
//!   ├─ Configurable::validate    every unit, errors aggregated
//!   └─ Started
//! ```

use std::ffi::OsString;
use std::path::Path;

use colored::Colorize;

use crate::config::BINARY_NAME;
use crate::core::group::Group;
use crate::core::registry::Phase;
use crate::error::{RunError, ValidationErrors};
use crate::events::{Event, EventKind};
use crate::flags::{FlagSet, Value};
use crate::version;

/// Name of the flag set holding the group's own flags.
const RESERVED_SET: &str = "Common Service options";

/// Unit name reported for cleared config slots.
const DEREGISTERED: &str = "--deregistered--";

/// The group's own flags.
struct Reserved {
    set: FlagSet,
    name: Value<String>,
    version: Value<bool>,
    help: Value<bool>,
    list: Value<bool>,
}

impl Reserved {
    fn new(default_name: &str) -> Self {
        let mut set = FlagSet::new(RESERVED_SET);
        let name = set.string("name", Some('n'), default_name, "name of this service");
        let version = set.bool("version", Some('v'), false, "show version information and exit.");
        let help = set.bool("help", Some('h'), false, "show this help information and exit.");
        let list = set.bool("show-rungroup-units", None, false, "show run group units");
        // registered on the line above, so the lookup cannot miss
        let _ = set.mark_hidden("show-rungroup-units");
        Self {
            set,
            name,
            version,
            help,
            list,
        }
    }
}

impl Group {
    /// Runs the config phase with the process arguments.
    ///
    /// See [`run_config_with`](Self::run_config_with).
    pub fn run_config(&self) -> Result<(), RunError> {
        self.run_config_with(Vec::<OsString>::new())
    }

    /// Runs the config phase on its own, for applications that need wiring between
    /// configuration and [`run`](Self::run).
    ///
    /// `args` starts with the binary name; an empty iterator means the process arguments.
    /// Arguments need not be valid UTF-8; a positional or flag value that is not ends in
    /// [`RunError::Flags`].
    /// Only the first call does anything; later calls return `Ok(())`.
    ///
    /// # Errors
    /// - [`RunError::BailEarly`] after printing help, version or the unit listing
    /// - [`RunError::Flags`] if the command line does not parse
    /// - [`RunError::Validation`] with every validation failure, in registration order
    pub fn run_config_with<I, T>(&self, args: I) -> Result<(), RunError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        if !self.inner.registry.write().mark_configured() {
            return Ok(());
        }

        let mut args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        if args.is_empty() {
            args = std::env::args_os().collect();
        }

        let res = self.configure(args);
        if let Err(err) = &res {
            if !err.is_bail_early() {
                self.emit(Event::new(EventKind::UnexpectedExit).with_error(err.to_string()));
            }
        }
        res
    }

    /// Renders the `--help` output.
    ///
    /// Flag sections are only known once the config phase merged them.
    pub fn help_text(&self) -> String {
        let name = self.name();
        let help_text = self.inner.help_text.read().clone();

        let mut out = format!("{}\n", format!("Usage of {name}:").cyan().bold());
        if !help_text.is_empty() {
            out.push_str(&help_text);
            out.push('\n');
        }
        out.push_str(&format!("{}\n\n", "Flags:".cyan().bold()));
        for section in self.inner.sections.read().iter() {
            out.push_str(&format!(
                "{}\n{}\n",
                format!("* {}", section.name()).cyan(),
                section.usages()
            ));
        }
        out
    }

    fn configure(&self, args: Vec<OsString>) -> Result<(), RunError> {
        let argv0 = args
            .first()
            .map(|a| a.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut name = self.name();
        if name.is_empty() {
            name = Path::new(&argv0)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| argv0.clone());
        }
        *self.inner.help_text.write() = self.inner.cfg.help_text.replace(BINARY_NAME, &argv0);

        // only the group's own flags are known yet; everything else is ignored
        let reserved = Reserved::new(&name);
        reserved.set.parse_lenient(args.iter().cloned());
        let overridden = reserved.name.get();
        if !overridden.is_empty() {
            name = overridden;
        }
        *self.inner.name.write() = name.clone();

        self.initialize_pending();
        self.inform_namers(&name);

        let mut namespace = FlagSet::new(name.clone());
        namespace.merge(&reserved.set);
        let mut sections = vec![reserved.set.clone()];
        sections.extend(self.collect_flag_sets(&mut namespace));
        *self.inner.sections.write() = sections;

        let positional = namespace.parse(args)?;
        *self.inner.args.write() = positional;

        if reserved.help.get() {
            print!("{}", self.help_text());
            return Err(RunError::BailEarly);
        }
        if reserved.version.get() {
            version::show(&name, self.inner.cfg.version_or_default());
            return Err(RunError::BailEarly);
        }
        if reserved.list.get() {
            println!("{}", self.list_units());
            return Err(RunError::BailEarly);
        }

        self.validate()?;

        self.emit(Event::new(EventKind::Started).with_reason(format!(
            "{} started",
            version::render(&name, self.inner.cfg.version_or_default())
        )));
        Ok(())
    }

    fn inform_namers(&self, name: &str) {
        let total = self.inner.registry.read().len(Phase::Name);
        for idx in 0..total {
            let unit = self.slot(Phase::Name, idx);
            if let Some(namer) = unit.as_ref().and_then(|u| u.as_namer()) {
                namer.group_name(name);
            }
        }
    }

    /// Merges every configurable unit's flags into `namespace`, first-wins.
    ///
    /// Returns the contributed sets in registration order, for help output.
    fn collect_flag_sets(&self, namespace: &mut FlagSet) -> Vec<FlagSet> {
        let total = self.inner.registry.read().len(Phase::Config);
        let mut sets = Vec::new();
        for idx in 0..total {
            let Some(unit) = self.slot(Phase::Config, idx) else {
                self.emit(
                    Event::new(EventKind::FlagSetRegistered)
                        .with_unit(DEREGISTERED)
                        .with_item(idx + 1, total),
                );
                continue;
            };
            self.emit(
                Event::new(EventKind::FlagSetRegistered)
                    .with_unit(unit.name())
                    .with_item(idx + 1, total),
            );
            let Some(set) = unit.as_configurable().and_then(|c| c.flag_set()) else {
                continue;
            };
            for flag in namespace.merge(&set) {
                self.emit(
                    Event::new(EventKind::FlagIgnored)
                        .with_unit(unit.name())
                        .with_flag(flag),
                );
            }
            sets.push(set);
        }
        sets
    }

    fn validate(&self) -> Result<(), RunError> {
        let total = self.inner.registry.read().len(Phase::Config);
        let mut errs = ValidationErrors::default();
        for idx in 0..total {
            let Some(unit) = self.slot(Phase::Config, idx) else {
                self.emit(
                    Event::new(EventKind::DeregisteredSkipped)
                        .with_unit(DEREGISTERED)
                        .with_item(idx + 1, total)
                        .with_reason("validate"),
                );
                continue;
            };
            let Some(cfg) = unit.as_configurable() else {
                continue;
            };

            self.emit(
                Event::new(EventKind::ValidateStarting)
                    .with_unit(unit.name())
                    .with_item(idx + 1, total),
            );
            let res = cfg.validate();
            let mut done = Event::new(EventKind::ValidateFinished)
                .with_unit(unit.name())
                .with_item(idx + 1, total);
            if let Err(err) = res {
                done = done.with_error(format!("{err:#}"));
                errs.push(err);
            }
            self.emit(done);
        }

        if errs.is_empty() {
            Ok(())
        } else {
            Err(RunError::Validation(errs))
        }
    }
}
