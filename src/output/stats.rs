//! Run statistics
//!
//! Counters gathered while folding per-thread outcomes, logged and printed
//! when the run ends.

use std::time::Duration;

/// Counters for one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    /// Thread URLs returned by discovery
    pub discovered: usize,

    /// Threads the extractor was run on
    pub attempted: usize,

    /// Threads that produced a post
    pub succeeded: usize,

    /// Threads skipped after a fetch or extraction failure
    pub failed: usize,

    /// Replies across all successful posts
    pub replies: usize,

    /// Posts and replies whose date came out null
    pub undated: usize,

    /// Wall-clock time from discovery to the end of extraction
    pub elapsed: Duration,
}

impl RunStats {
    /// Share of attempted threads that succeeded, in percent
    pub fn success_rate(&self) -> f64 {
        if self.attempted > 0 {
            (self.succeeded as f64 / self.attempted as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Prints run statistics to stdout
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &RunStats) {
    println!("=== Crawl Statistics ===\n");

    println!("Threads:");
    println!("  Discovered: {}", stats.discovered);
    println!("  Attempted: {}", stats.attempted);
    println!("  Succeeded: {}", stats.succeeded);
    println!("  Failed: {}", stats.failed);
    println!();

    println!("Content:");
    println!("  Replies collected: {}", stats.replies);
    println!("  Entries without a parseable date: {}", stats.undated);
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} threads extracted) in {:.1}s",
        stats.success_rate(),
        stats.succeeded,
        stats.attempted,
        stats.elapsed.as_secs_f64()
    );
}
