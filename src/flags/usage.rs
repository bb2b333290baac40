//! pflag-style usage rendering.
//!
//! ```text
//!   -n, --name string   name of this service (default "api")
//!   -v, --version       show version information and exit.
//!       --token string  upstream token (default "********")
//! ```

use super::set::Flag;

/// Replacement shown for the value of sensitive flags.
pub(crate) const MASK: &str = "********";

/// Renders one line per visible flag, usage column aligned.
pub(crate) fn render(flags: &[Flag]) -> String {
    let lines: Vec<(String, String)> = flags
        .iter()
        .filter(|f| !f.hidden)
        .map(|f| (left_column(f), right_column(f)))
        .collect();
    let width = lines.iter().map(|(left, _)| left.len()).max().unwrap_or(0);

    let mut out = String::new();
    for (left, right) in lines {
        out.push_str(format!("{left:<width$}   {right}").trim_end());
        out.push('\n');
    }
    out
}

fn left_column(flag: &Flag) -> String {
    let mut left = match flag.short {
        Some(short) => format!("  -{short}, --{}", flag.long),
        None => format!("      --{}", flag.long),
    };
    if !flag.type_name.is_empty() {
        left.push(' ');
        left.push_str(flag.type_name);
    }
    left
}

fn right_column(flag: &Flag) -> String {
    match &flag.default {
        Some(default) => format!("{} (default {default})", flag.usage),
        None => flag.usage.clone(),
    }
}
