use ratatui::style::Color;

/// Unified color theme for the application
pub struct Theme;

impl Theme {
    /// Primary branding color
    pub fn primary() -> Color {
        Color::Magenta
    }

    /// Borders and section titles
    pub fn secondary() -> Color {
        Color::Cyan
    }

    pub fn success() -> Color {
        Color::Green
    }

    /// Running timer
    pub fn active() -> Color {
        Color::LightGreen
    }

    /// Prompts and pending confirmations
    pub fn warn() -> Color {
        Color::Yellow
    }

    /// Failures and destructive actions
    pub fn danger() -> Color {
        Color::LightRed
    }

    pub fn favorite() -> Color {
        Color::Yellow
    }

    /// Selection/highlight
    pub fn highlight() -> Color {
        Color::Cyan
    }

    /// Selection marker/arrow
    pub fn selection_marker() -> Color {
        Color::Green
    }

    /// Dimmed/inactive text
    pub fn dim() -> Color {
        Color::DarkGray
    }

    pub fn text() -> Color {
        Color::White
    }

    /// Accent for numbers and totals
    pub fn accent() -> Color {
        Color::LightBlue
    }
}
