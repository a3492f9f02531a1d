//! Color constants for the terminal user interface.

use ratatui::style::Color;

/// Header and status bar background.
pub const INDIGO: Color = Color::Rgb(75, 0, 130);
/// Rows whose stopwatch is running.
pub const TIMER_GREEN: Color = Color::Rgb(0, 175, 95);
/// High priority labels.
pub const GOLD: Color = Color::Rgb(255, 215, 0);
/// Delete confirmation dialog.
pub const DARK_RED: Color = Color::Rgb(114, 0, 0);
