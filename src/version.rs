//! Version line printed by `--version` and logged on startup.

/// Renders `"<name> <version>"`.
pub(crate) fn render(name: &str, version: &str) -> String {
    format!("{name} {version}")
}

/// Prints the version line to stdout.
pub(crate) fn show(name: &str, version: &str) {
    println!("{}", render(name, version));
}
