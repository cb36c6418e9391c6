use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::sync::{
    RwLock,
    atomic::{AtomicU8, Ordering},
};

static MIN_LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);
static CONTEXT: RwLock<Option<String>> = RwLock::new(None);

///
/// Level
///

#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug, // least severe
    Info,
    Ok,
    Warn,
    Error, // most severe
}

impl Level {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Debug,
            1 => Self::Info,
            2 => Self::Ok,
            3 => Self::Warn,
            _ => Self::Error,
        }
    }
}

///
/// Topic
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[remain::sorted]
pub enum Topic {
    Config,
    Grant,
    Pipeline,
    Registry,
    Resolve,
    Tx,
}

#[macro_export]
macro_rules! log {
    // =========================================
    // (1) With topic (normal + trailing comma)
    // =========================================
    ($topic:expr, $level:ident, $fmt:expr $(, $arg:expr)* $(,)?) => {{
        $crate::log!(@inner Some($topic), $crate::log::Level::$level, $fmt $(, $arg)*);
    }};

    // =========================================
    // (2) No topic (normal + trailing comma)
    // =========================================
    ($level:ident, $fmt:expr $(, $arg:expr)* $(,)?) => {{
        $crate::log!(@inner None::<$crate::log::Topic>, $crate::log::Level::$level, $fmt $(, $arg)*);
    }};

    // =========================================
    // INTERNAL
    // =========================================
    (@inner $topic:expr, $level:expr, $fmt:expr $(, $arg:expr)*) => {{
        let level = $level;
        if $crate::log::__enabled(level) {
            let message = format!($fmt $(, $arg)*);
            $crate::log::__emit($topic, level, &message);
        }
    }};
}

/// Set the least severe level that still gets written.
pub fn set_min_level(level: Level) {
    MIN_LEVEL.store(level as u8, Ordering::Relaxed);
}

#[must_use]
pub fn min_level() -> Level {
    Level::from_u8(MIN_LEVEL.load(Ordering::Relaxed))
}

/// Label every subsequent line with the environment being provisioned.
pub fn set_context(label: impl Into<String>) {
    if let Ok(mut ctx) = CONTEXT.write() {
        *ctx = Some(label.into());
    }
}

///
/// Helpers
///

#[doc(hidden)]
#[must_use]
pub fn __enabled(level: Level) -> bool {
    level >= min_level()
}

#[doc(hidden)]
pub fn __emit(topic: Option<Topic>, level: Level, message: &str) {
    eprintln!("{}", __render(topic, level, message));
}

#[doc(hidden)]
#[must_use]
pub fn __render(topic: Option<Topic>, level: Level, message: &str) -> String {
    let ctx_raw = CONTEXT
        .read()
        .ok()
        .and_then(|ctx| ctx.clone())
        .unwrap_or_else(|| "...".to_string());
    let ctx_disp = ellipsize_middle(&ctx_raw, 13, 6, 6);
    let ctx_centered = format!("{ctx_disp:^13}");

    let final_msg = if let Some(t) = topic {
        format!("[{t}] {message}")
    } else {
        message.to_string()
    };

    let (color, reset) = match level {
        Level::Ok => ("\x1b[32m", "\x1b[0m"),
        Level::Info => ("\x1b[34m", "\x1b[0m"),
        Level::Warn => ("\x1b[33m", "\x1b[0m"),
        Level::Error => ("\x1b[31m", "\x1b[0m"),
        Level::Debug => ("", ""),
    };

    let label = format!("{color}{:^5}{reset}", level.to_string().to_uppercase());

    format!("{label}|{ctx_centered}| {final_msg}")
}

// keep `head` and `tail` chars of anything longer than `max`
fn ellipsize_middle(s: &str, max: usize, head: usize, tail: usize) -> String {
    let count = s.chars().count();
    if count <= max {
        return s.to_string();
    }

    let start: String = s.chars().take(head).collect();
    let end: String = s.chars().skip(count - tail).collect();

    format!("{start}…{end}")
}

///
/// TESTS
///
