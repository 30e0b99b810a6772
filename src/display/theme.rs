//! Consistent color theme and styling for terminal output.

use console::Style;
use std::io::IsTerminal;
use std::sync::LazyLock;

/// Global theme instance for consistent styling across the application.
pub static THEME: LazyLock<Theme> = LazyLock::new(Theme::default);

/// Color theme for terminal output.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Whether styles are applied at all
    pub enabled: bool,
    /// Error/failure indicators
    pub error: Style,
    /// Warning/caution indicators
    pub warning: Style,
    /// Headers and titles
    pub header: Style,
    /// Organization display names
    pub organization: Style,
    /// Folder display names
    pub folder: Style,
    /// Project display names
    pub project: Style,
    /// Dimmed/secondary text such as resource names
    pub dim: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            enabled: !Self::should_disable_colors(),
            ..Self::plain()
        }
    }
}

impl Theme {
    /// Theme that never emits escape codes
    pub fn plain() -> Self {
        Self {
            enabled: false,
            error: Style::new().red().bright(),
            warning: Style::new().yellow().bright(),
            header: Style::new().cyan().bold(),
            organization: Style::new().magenta().bold(),
            folder: Style::new().blue().bold(),
            project: Style::new().green(),
            dim: Style::new().dim(),
        }
    }

    /// Check if color output should be disabled.
    pub fn should_disable_colors() -> bool {
        std::env::var("NO_COLOR").is_ok() || !std::io::stdout().is_terminal()
    }

    /// Apply a style when colors are enabled.
    pub fn apply<T: std::fmt::Display>(&self, style: &Style, text: T) -> String {
        if self.enabled {
            style.apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Format an error message with X mark.
    pub fn error_with_icon(&self, text: &str) -> String {
        format!("{} {}", self.apply(&self.error, "✗"), self.apply(&self.error, text))
    }

    /// Format a warning message with warning sign.
    pub fn warning_with_icon(&self, text: &str) -> String {
        format!("{} {}", self.apply(&self.warning, "⚠"), self.apply(&self.warning, text))
    }
}
