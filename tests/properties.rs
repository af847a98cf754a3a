//! Property tests for the detection core.
//!
//! The detectors are pure functions over immutable bar sequences, which
//! makes their contracts a natural fit for property testing.

use chartscan::prelude::*;
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
struct TestBar {
    o: f64,
    h: f64,
    l: f64,
    c: f64,
}

impl Ohlc for TestBar {
    fn open(&self) -> f64 {
        self.o
    }

    fn high(&self) -> f64 {
        self.h
    }

    fn low(&self) -> f64 {
        self.l
    }

    fn close(&self) -> f64 {
        self.c
    }
}

/// Bars that always satisfy the OHLC invariants:
/// low <= min(open, close), high >= max(open, close)
fn arb_bar() -> impl Strategy<Value = TestBar> {
    (
        1.0..200.0f64,
        1.0..200.0f64,
        0.0..10.0f64,
        0.0..10.0f64,
    )
        .prop_map(|(o, c, up, down)| TestBar {
            o,
            c,
            h: o.max(c) + up,
            l: (o.min(c) - down).max(0.01),
        })
}

fn arb_bars(max_len: usize) -> impl Strategy<Value = Vec<TestBar>> {
    prop::collection::vec(arb_bar(), 0..max_len)
}

proptest! {
    /// The two engulfing variants demand opposite candle colors, so no
    /// pair of bars may ever satisfy both.
    #[test]
    fn engulfing_variants_are_mutually_exclusive(
        prev in arb_bar(),
        curr in arb_bar(),
    ) {
        let bars = [prev, curr];
        let bull = PatternDetector::detect(&BullishEngulfingDetector::with_defaults(), &bars, 1);
        let bear = PatternDetector::detect(&BearishEngulfingDetector::with_defaults(), &bars, 1);
        prop_assert!(!(bull.is_some() && bear.is_some()));
    }

    /// A zero-range bar must not fire any single-bar pattern.
    #[test]
    fn flat_bars_never_fire_single_bar_patterns(price in 1.0..500.0f64) {
        let bars = [TestBar { o: price, h: price, l: price, c: price }];
        prop_assert!(PatternDetector::detect(&HammerDetector::with_defaults(), &bars, 0).is_none());
        prop_assert!(PatternDetector::detect(&ShootingStarDetector::with_defaults(), &bars, 0).is_none());
        prop_assert!(PatternDetector::detect(&SpinningTopDetector::with_defaults(), &bars, 0).is_none());
    }

    /// Scanning the same immutable sequence twice yields identical
    /// results: the core holds no hidden mutable state.
    #[test]
    fn scan_is_deterministic(bars in arb_bars(50)) {
        let scanner = ScannerBuilder::new().with_all_defaults().build().unwrap();
        let first = scanner.scan("SYM", &bars);
        let second = scanner.scan("SYM", &bars);

        prop_assert_eq!(first.strength, second.strength);
        prop_assert_eq!(first.labels.len(), second.labels.len());
        for (a, b) in first.labels.iter().zip(second.labels.iter()) {
            prop_assert_eq!(a.pattern_id, b.pattern_id);
            prop_assert_eq!(a.strength, b.strength);
            prop_assert_eq!(a.start_index, b.start_index);
            prop_assert_eq!(a.end_index, b.end_index);
        }
    }

    /// With at least two bars the scan strength is exactly the latest
    /// candle's body; with fewer it is zero and no labels fire.
    #[test]
    fn scan_strength_matches_todays_body(bars in arb_bars(50)) {
        let scanner = ScannerBuilder::new().with_all_defaults().build().unwrap();
        let result = scanner.scan("SYM", &bars);

        if bars.len() < 2 {
            prop_assert!(result.labels.is_empty());
            prop_assert_eq!(result.strength, 0.0);
        } else {
            let today = bars[bars.len() - 1];
            prop_assert_eq!(result.strength, (today.c - today.o).abs());
        }
    }

    /// Every fired label carries sane indices into the scanned window.
    #[test]
    fn fired_labels_point_into_the_sequence(bars in arb_bars(50)) {
        let scanner = ScannerBuilder::new().with_all_defaults().build().unwrap();
        let result = scanner.scan("SYM", &bars);

        for label in &result.labels {
            prop_assert!(label.start_index <= label.end_index);
            prop_assert!(label.end_index < bars.len());
            prop_assert!(label.strength >= 0.0 && label.strength <= 1.0);
        }
    }
}
