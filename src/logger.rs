/// Run-wide output control for the batch loop.
///
/// One verbosity level instead of separate flags: 0 suppresses
/// everything but errors, 1 is the normal summary output, 2 adds the
/// per-file pipeline trace. Quiet always wins over verbose.
use std::sync::atomic::{AtomicU8, Ordering};

const LEVEL_QUIET: u8 = 0;
const LEVEL_NORMAL: u8 = 1;
const LEVEL_TRACE: u8 = 2;

static VERBOSITY: AtomicU8 = AtomicU8::new(LEVEL_NORMAL);

pub fn set_verbosity(quiet: bool, verbose: bool) {
    let level = if quiet {
        LEVEL_QUIET
    } else if verbose {
        LEVEL_TRACE
    } else {
        LEVEL_NORMAL
    };
    VERBOSITY.store(level, Ordering::Relaxed);
}

pub fn is_quiet() -> bool {
    VERBOSITY.load(Ordering::Relaxed) == LEVEL_QUIET
}

pub fn is_verbose() -> bool {
    VERBOSITY.load(Ordering::Relaxed) >= LEVEL_TRACE
}

/// Normal progress and summary lines.
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        if !$crate::logger::is_quiet() {
            println!($($arg)*);
        }
    };
}

/// Per-file pipeline trace: which chain ran, what it produced.
#[macro_export]
macro_rules! verbose {
    ($($arg:tt)*) => {
        if $crate::logger::is_verbose() {
            println!("🔍 {}", format!($($arg)*));
        }
    };
}

/// Failures always reach stderr, even under --quiet.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        eprintln!("❌ {}", format!($($arg)*));
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        if !$crate::logger::is_quiet() {
            eprintln!("⚠️  {}", format!($($arg)*));
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        set_verbosity(false, false);
        assert!(!is_quiet());
        assert!(!is_verbose());

        set_verbosity(false, true);
        assert!(is_verbose());

        // Quiet wins when both flags are set.
        set_verbosity(true, true);
        assert!(is_quiet());
        assert!(!is_verbose());

        set_verbosity(false, false);
    }
}
