use colored::{ColoredString, Colorize};

/// The severity tags printed in front of every log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
	Message,
	Warning,
	Error,
	Debug,
}

/// Coloured tag for a log line. Kept out of the macros so callers do not need
/// `colored` in scope.
#[doc(hidden)]
pub fn tag(level: Level) -> ColoredString {
	match level {
		Level::Message => "[MESSAGE]".green(),
		Level::Warning => "[WARNING]".yellow(),
		Level::Error => "[ERROR]".red().bold(),
		Level::Debug => "[DEBUG MESSAGE]".blue(),
	}
}

#[macro_export]
macro_rules! message {
	($($arg:tt)*) => {
		eprintln!("{} {}", $crate::logging::messages::tag($crate::logging::messages::Level::Message), format!($($arg)*));
	};
}

#[macro_export]
macro_rules! warning {
	($($arg:tt)*) => {
		eprintln!("{} {}", $crate::logging::messages::tag($crate::logging::messages::Level::Warning), format!($($arg)*));
	};
}

#[macro_export]
macro_rules! error {
	($($arg:tt)*) => {
		eprintln!("{} {}", $crate::logging::messages::tag($crate::logging::messages::Level::Error), format!($($arg)*));
	};
}

#[macro_export]
macro_rules! debug_message {
	($($arg:tt)*) => {
		if cfg!(debug_assertions) {
			eprintln!("{} {}", $crate::logging::messages::tag($crate::logging::messages::Level::Debug), format!($($arg)*));
		}
	};
}

pub use crate::{debug_message, error, message, warning};
