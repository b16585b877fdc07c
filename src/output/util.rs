use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Sleeps in 50ms slices so a stop request ends the wait early.
pub fn sleep_interruptible(stop: &AtomicBool, ms: u64) {
    let mut remaining = ms;
    while remaining > 0 {
        if stop.load(Ordering::SeqCst) {
            return;
        }
        let step = remaining.min(50);
        std::thread::sleep(Duration::from_millis(step));
        remaining -= step;
    }
}

pub fn print_trace_line(line: &str) {
    const RESET: &str = "\x1b[0m";
    const TYPO: &str = "\x1b[31m";
    const FIX: &str = "\x1b[33m";

    if let Some(rest) = line.strip_prefix("Typo") {
        eprintln!("{TYPO}Typo{RESET}{rest}");
    } else if let Some(rest) = line.strip_prefix("Fix") {
        eprintln!("{FIX}Fix{RESET}{rest}");
    } else {
        eprintln!("{line}");
    }
}
