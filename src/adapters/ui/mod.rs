pub mod banner;

/// Prints the welcome banner when stdout is a terminal.
/// Call once at startup (e.g. in main after tracing init).
pub fn init_ui() {
    use std::io::IsTerminal;
    if std::io::stdout().is_terminal() {
        banner::print_welcome();
    }
}
