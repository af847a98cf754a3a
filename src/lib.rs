//! # chartscan - End-of-Day Pattern Scanner
//!
//! Candlestick and chart pattern detection for daily equity bar data.
//!
//! The crate classifies the most recent session of a chronological bar
//! sequence against a fixed set of reversal, indecision and breakout
//! patterns. Fetching, scheduling and report delivery live outside this
//! crate; callers hand in fully materialized bar sequences and consume
//! [`ScanResult`]s.
//!
//! ## Quick Start
//!
//! ```rust
//! use chartscan::prelude::*;
//!
//! // Define your OHLC data
//! struct Bar { o: f64, h: f64, l: f64, c: f64 }
//!
//! impl Ohlc for Bar {
//!     fn open(&self) -> f64 { self.o }
//!     fn high(&self) -> f64 { self.h }
//!     fn low(&self) -> f64 { self.l }
//!     fn close(&self) -> f64 { self.c }
//! }
//!
//! // Create a scanner with the default detector set
//! let scanner = ScannerBuilder::new()
//!     .with_all_defaults()
//!     .build()
//!     .unwrap();
//!
//! // Scan one symbol's daily bars
//! let bars: Vec<Bar> = vec![];
//! let result = scanner.scan("RELIANCE", &bars);
//! assert!(result.labels.is_empty());
//! ```

pub mod detectors;
pub mod params;

pub mod prelude {
    pub use crate::{
        // Detectors
        detectors::*,
        // Parameters
        params::{get_period, get_ratio, ParamMeta, ParamType, ParameterizedDetector},
        // Parallel
        scan_parallel,
        // Validation
        validate_bars,
        // Engine
        BuiltinDetector,
        // Types
        CandleExt,
        Direction,
        // Core traits
        DynPatternDetector,
        Ohlc,
        PatternDetector,
        // Errors
        PatternError,
        PatternId,
        PatternMatch,
        Period,
        Ratio,
        Result,
        ScanResult,
        Scanner,
        ScannerBuilder,
    };
}

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, PatternError>;

/// Errors that can occur while constructing detectors or validating data.
///
/// Detection itself never fails: a detector whose window is not satisfied
/// silently abstains.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PatternError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid OHLC at index {index}: {reason}")]
    InvalidOhlc { index: usize, reason: &'static str },
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Normalized value in range 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Ratio(f64);

impl Ratio {
    /// Create a new Ratio, validating the value is in [0.0, 1.0]
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(PatternError::InvalidValue(
                "Ratio cannot be NaN or infinite",
            ));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(PatternError::OutOfRange {
                field: "Ratio",
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self(value))
    }

    /// Create a Ratio from a compile-time constant (library internal use)
    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl serde::Serialize for Ratio {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Ratio {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Ratio::new(value).map_err(serde::de::Error::custom)
    }
}

/// Period in sessions (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(PatternError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl serde::Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLC TRAITS
// ============================================================

/// One session's open/high/low/close observation.
///
/// Callers own the bar type; the scanner only reads prices. Sequences
/// handed to the scanner must be chronological with no duplicate
/// sessions - that contract belongs to the data-fetch layer and is not
/// re-checked here.
pub trait Ohlc {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;

    /// Session timestamp, if the caller tracks one (epoch-based).
    fn timestamp(&self) -> Option<i64> {
        None
    }
}

/// Blanket impl for references to dyn Ohlc
impl Ohlc for &dyn Ohlc {
    fn open(&self) -> f64 {
        (*self).open()
    }

    fn high(&self) -> f64 {
        (*self).high()
    }

    fn low(&self) -> f64 {
        (*self).low()
    }

    fn close(&self) -> f64 {
        (*self).close()
    }

    fn timestamp(&self) -> Option<i64> {
        (*self).timestamp()
    }
}

/// Candle geometry derived from an [`Ohlc`] bar.
pub trait CandleExt: Ohlc {
    #[inline]
    fn body(&self) -> f64 {
        (self.close() - self.open()).abs()
    }

    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    #[inline]
    fn upper_wick(&self) -> f64 {
        self.high() - self.open().max(self.close())
    }

    #[inline]
    fn lower_wick(&self) -> f64 {
        self.open().min(self.close()) - self.low()
    }

    #[inline]
    fn is_bullish(&self) -> bool {
        self.close() > self.open()
    }

    #[inline]
    fn is_bearish(&self) -> bool {
        self.close() < self.open()
    }

    /// Midpoint of the real body.
    #[inline]
    fn body_midpoint(&self) -> f64 {
        (self.open() + self.close()) / 2.0
    }

    /// Body as ratio of range. Returns None on a zero-range bar, so
    /// callers never divide by a degenerate range.
    #[inline]
    fn body_ratio(&self) -> Option<f64> {
        let range = self.range();
        (range > f64::EPSILON).then(|| self.body() / range)
    }

    /// Validate OHLC data consistency
    fn validate(&self) -> Result<()> {
        if self.high() < self.low() {
            return Err(PatternError::InvalidOhlc {
                index: 0,
                reason: "high < low",
            });
        }
        if self.open().is_nan()
            || self.high().is_nan()
            || self.low().is_nan()
            || self.close().is_nan()
        {
            return Err(PatternError::InvalidOhlc {
                index: 0,
                reason: "NaN in OHLC",
            });
        }
        if self.open().is_infinite()
            || self.high().is_infinite()
            || self.low().is_infinite()
            || self.close().is_infinite()
        {
            return Err(PatternError::InvalidOhlc {
                index: 0,
                reason: "Infinite value in OHLC",
            });
        }
        Ok(())
    }
}

impl<T: Ohlc> CandleExt for T {}

/// Validate a full bar sequence, reporting the offending index.
///
/// The scanner does not call this on its own; the data-fetch layer may,
/// before handing bars over.
pub fn validate_bars<T: Ohlc>(bars: &[T]) -> Result<()> {
    for (i, bar) in bars.iter().enumerate() {
        bar.validate().map_err(|e| match e {
            PatternError::InvalidOhlc { reason, .. } => {
                PatternError::InvalidOhlc { index: i, reason }
            }
            other => other,
        })?;
    }
    Ok(())
}

// ============================================================
// PATTERN MATCH - result of detection (Copy, no allocations)
// ============================================================

/// Unique identifier for a pattern label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatternId(pub &'static str);

impl PatternId {
    /// Returns the string identifier
    #[inline]
    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Returns the typical/expected direction of this pattern.
    pub fn typical_direction(&self) -> Option<Direction> {
        match self.0 {
            "BULLISH_ENGULFING" | "PIERCING_LINE" | "HAMMER" | "RESISTANCE_BREAKOUT"
            | "TREND_LINE_BREAKOUT" | "CUP_AND_HANDLE" => Some(Direction::Bullish),
            "BEARISH_ENGULFING" | "SHOOTING_STAR" => Some(Direction::Bearish),
            "SPINNING_TOP" => Some(Direction::Neutral),
            _ => None,
        }
    }

    /// Returns true if this pattern typically signals bullish moves
    pub fn is_typically_bullish(&self) -> bool {
        matches!(self.typical_direction(), Some(Direction::Bullish))
    }

    /// Returns true if this pattern typically signals bearish moves
    pub fn is_typically_bearish(&self) -> bool {
        matches!(self.typical_direction(), Some(Direction::Bearish))
    }

    /// Returns true if this pattern has no directional bias
    pub fn is_neutral(&self) -> bool {
        matches!(self.typical_direction(), Some(Direction::Neutral))
    }
}

impl serde::Serialize for PatternId {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(self.0)
    }
}

/// Direction/bias of a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    Bullish,
    Neutral,
    Bearish,
}

impl Direction {
    #[inline]
    pub fn is_bullish(self) -> bool {
        matches!(self, Direction::Bullish)
    }

    #[inline]
    pub fn is_bearish(self) -> bool {
        matches!(self, Direction::Bearish)
    }
}

/// A fired pattern label - Copy, no allocations
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct PatternMatch {
    pub pattern_id: PatternId,
    pub direction: Direction,
    /// Quality/confidence contribution 0.0..=1.0
    pub strength: f64,
    pub start_index: usize,
    pub end_index: usize,
}

// ============================================================
// PATTERN DETECTOR TRAITS
// ============================================================

/// Category of pattern by the shape of its input window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternCategory {
    SingleBar,
    TwoBar,
    Window,
}

/// Additional metadata about a pattern
#[derive(Debug, Clone)]
pub struct PatternMetadata {
    pub name: &'static str,
    pub description: &'static str,
    pub category: PatternCategory,
}

/// Generic pattern detector trait - for concrete types
pub trait PatternDetector: Send + Sync {
    fn id(&self) -> PatternId;

    /// Minimum number of bars the detector needs before it can fire.
    /// With fewer bars it abstains; that is never an error.
    fn min_bars(&self) -> usize;

    fn detect<T: Ohlc>(&self, bars: &[T], index: usize) -> Option<PatternMatch>;

    fn validate_config(&self) -> Result<()> {
        Ok(())
    }

    fn metadata(&self) -> PatternMetadata {
        PatternMetadata {
            name: self.id().0,
            description: "",
            category: match self.min_bars() {
                1 => PatternCategory::SingleBar,
                2 => PatternCategory::TwoBar,
                _ => PatternCategory::Window,
            },
        }
    }
}

/// Object-safe pattern detector trait - for custom detectors
pub trait DynPatternDetector: Send + Sync {
    fn id(&self) -> PatternId;
    fn min_bars(&self) -> usize;
    fn detect(&self, bars: &[&dyn Ohlc], index: usize) -> Option<PatternMatch>;
    fn validate_config(&self) -> Result<()>;
}

impl<D: PatternDetector> DynPatternDetector for D {
    fn id(&self) -> PatternId {
        PatternDetector::id(self)
    }

    fn min_bars(&self) -> usize {
        PatternDetector::min_bars(self)
    }

    fn detect(&self, bars: &[&dyn Ohlc], index: usize) -> Option<PatternMatch> {
        PatternDetector::detect(self, bars, index)
    }

    fn validate_config(&self) -> Result<()> {
        PatternDetector::validate_config(self)
    }
}

// ============================================================
// BUILTIN DETECTORS - generated via macro
// ============================================================

use detectors::*;

/// Macro to generate BuiltinDetector enum without boilerplate
macro_rules! define_builtin_detectors {
    (
        $(
            $variant:ident($detector:ty)
        ),* $(,)?
    ) => {
        /// All builtin detectors - fast path via enum dispatch
        #[derive(Debug, Clone)]
        pub enum BuiltinDetector {
            $($variant($detector)),*
        }

        impl BuiltinDetector {
            #[inline]
            pub fn detect<T: Ohlc>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
                match self {
                    $(Self::$variant(d) => PatternDetector::detect(d, bars, index)),*
                }
            }

            #[inline]
            pub fn id(&self) -> PatternId {
                match self {
                    $(Self::$variant(d) => PatternDetector::id(d)),*
                }
            }

            #[inline]
            pub fn min_bars(&self) -> usize {
                match self {
                    $(Self::$variant(d) => PatternDetector::min_bars(d)),*
                }
            }

            pub fn validate_config(&self) -> Result<()> {
                match self {
                    $(Self::$variant(d) => PatternDetector::validate_config(d)),*
                }
            }
        }
    };
}

// Apply macro - the nine builtin labels, in scan evaluation order
define_builtin_detectors! {
    // Two-bar reversals (3)
    BullishEngulfing(BullishEngulfingDetector),
    BearishEngulfing(BearishEngulfingDetector),
    PiercingLine(PiercingLineDetector),

    // Single-bar (3)
    Hammer(HammerDetector),
    ShootingStar(ShootingStarDetector),
    SpinningTop(SpinningTopDetector),

    // Chart patterns over trailing windows (3)
    ResistanceBreakout(ResistanceBreakoutDetector),
    TrendLine(TrendLineDetector),
    CupAndHandle(CupAndHandleDetector),
}

// ============================================================
// SCANNER
// ============================================================

/// Scanner configuration
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    pub min_strength: Option<f64>,
    pub pattern_filter: Option<Vec<PatternId>>,
}

/// Scan outcome for one symbol's bar sequence.
///
/// `strength` is the latest candle's body size `|close - open|`; the
/// reporting layer sorts by it when batching deliveries. It is a ranking
/// key, not a probability.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ScanResult {
    pub symbol: String,
    /// Fired labels, in fixed evaluation order.
    pub labels: Vec<PatternMatch>,
    pub strength: f64,
}

/// End-of-day scan orchestrator.
///
/// Runs every registered detector against the most recent session of a
/// bar sequence and aggregates the fired labels. Registration order is
/// evaluation order.
pub struct Scanner {
    builtin: Vec<BuiltinDetector>,
    custom: Vec<Box<dyn DynPatternDetector>>,
    config: ScanConfig,
}

impl Scanner {
    /// Scan one symbol's chronological bar sequence.
    ///
    /// Fewer than 2 bars is a normal "no signal" outcome: the result
    /// carries no labels and zero strength. This method never fails.
    pub fn scan<T: Ohlc>(&self, symbol: &str, bars: &[T]) -> ScanResult {
        if bars.len() < 2 {
            return ScanResult {
                symbol: symbol.to_string(),
                labels: Vec::new(),
                strength: 0.0,
            };
        }

        let today = bars.len() - 1;
        let labels = self.scan_at(bars, today);
        let strength = bars[today].body();

        ScanResult {
            symbol: symbol.to_string(),
            labels,
            strength,
        }
    }

    /// Detect patterns at a single bar index (backdated checks).
    pub fn scan_at<T: Ohlc>(&self, bars: &[T], index: usize) -> Vec<PatternMatch> {
        if self.custom.is_empty() {
            self.scan_at_internal(bars, &[], index)
        } else {
            let bar_refs: Vec<&dyn Ohlc> = bars.iter().map(|b| b as &dyn Ohlc).collect();
            self.scan_at_internal(bars, &bar_refs, index)
        }
    }

    // ===========================================
    // Internal helpers
    // ===========================================

    fn scan_at_internal<T: Ohlc>(
        &self,
        bars: &[T],
        bar_refs: &[&dyn Ohlc],
        index: usize,
    ) -> Vec<PatternMatch> {
        let mut results = Vec::new();

        // Fast path: builtin detectors (enum dispatch, no vtable)
        for detector in &self.builtin {
            if index + 1 >= detector.min_bars() {
                if let Some(m) = detector.detect(bars, index) {
                    if self.should_include(&m) {
                        results.push(m);
                    }
                }
            }
        }

        // Slow path: custom detectors (vtable)
        if !self.custom.is_empty() && !bar_refs.is_empty() {
            for detector in &self.custom {
                if index + 1 >= detector.min_bars() {
                    if let Some(m) = detector.detect(bar_refs, index) {
                        if self.should_include(&m) {
                            results.push(m);
                        }
                    }
                }
            }
        }

        results
    }

    fn should_include(&self, m: &PatternMatch) -> bool {
        if let Some(min) = self.config.min_strength {
            if m.strength < min {
                return false;
            }
        }
        if let Some(ref filter) = self.config.pattern_filter {
            if !filter.contains(&m.pattern_id) {
                return false;
            }
        }
        true
    }

    fn validate(&self) -> Result<()> {
        for d in &self.builtin {
            d.validate_config()?;
        }
        for d in &self.custom {
            d.validate_config()?;
        }
        Ok(())
    }
}

// ============================================================
// BUILDER
// ============================================================

/// Builder for creating Scanner instances
pub struct ScannerBuilder {
    builtin: Vec<BuiltinDetector>,
    custom: Vec<Box<dyn DynPatternDetector>>,
    config: ScanConfig,
}

impl Default for ScannerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate an array of `BuiltinDetector` variants using `Default::default()` for each inner type.
macro_rules! builtin_defaults {
  ($($variant:ident),* $(,)?) => {
    [$(BuiltinDetector::$variant(Default::default())),*]
  };
}

impl ScannerBuilder {
    pub fn new() -> Self {
        Self {
            builtin: Vec::new(),
            custom: Vec::new(),
            config: ScanConfig::default(),
        }
    }

    /// Add all builtin patterns with default configurations.
    ///
    /// Registration follows the fixed evaluation order: two-bar
    /// reversals, single-bar patterns, resistance breakout, trend line,
    /// cup and handle.
    pub fn with_all_defaults(self) -> Self {
        self.with_two_bar_defaults()
            .with_single_bar_defaults()
            .with_chart_defaults()
    }

    /// Add only two-bar reversal patterns with defaults (3)
    pub fn with_two_bar_defaults(mut self) -> Self {
        self.builtin.extend(builtin_defaults![
            BullishEngulfing,
            BearishEngulfing,
            PiercingLine,
        ]);
        self
    }

    /// Add only single-bar patterns with defaults (3)
    pub fn with_single_bar_defaults(mut self) -> Self {
        self.builtin
            .extend(builtin_defaults![Hammer, ShootingStar, SpinningTop]);
        self
    }

    /// Add only trailing-window chart patterns with defaults (3)
    pub fn with_chart_defaults(mut self) -> Self {
        self.builtin.extend(builtin_defaults![
            ResistanceBreakout,
            TrendLine,
            CupAndHandle,
        ]);
        self
    }

    /// Add a builtin detector
    #[allow(clippy::should_implement_trait)]
    pub fn add(mut self, detector: BuiltinDetector) -> Self {
        self.builtin.push(detector);
        self
    }

    /// Add with config validation
    pub fn add_checked(mut self, detector: BuiltinDetector) -> Result<Self> {
        detector.validate_config()?;
        self.builtin.push(detector);
        Ok(self)
    }

    /// Add a custom detector (slow path)
    pub fn add_custom<D: DynPatternDetector + 'static>(mut self, detector: D) -> Self {
        self.custom.push(Box::new(detector));
        self
    }

    /// Set minimum per-label strength filter
    pub fn min_strength(mut self, strength: f64) -> Self {
        self.config.min_strength = Some(strength);
        self
    }

    /// Filter to specific patterns only
    pub fn only_patterns(mut self, ids: impl IntoIterator<Item = PatternId>) -> Self {
        self.config.pattern_filter = Some(ids.into_iter().collect());
        self
    }

    /// Build the scanner
    pub fn build(self) -> Result<Scanner> {
        let scanner = Scanner {
            builtin: self.builtin,
            custom: self.custom,
            config: self.config,
        };
        scanner.validate()?;
        Ok(scanner)
    }
}

// ============================================================
// PARALLEL SCANNING
// ============================================================

use rayon::prelude::*;

/// Parallel scanning of multiple instruments.
///
/// Each invocation reads an independent bar sequence, so no
/// synchronization is needed across symbols. Results come back in input
/// order; ranking by strength is the reporting layer's job.
pub fn scan_parallel<'a, T, I>(scanner: &Scanner, instruments: I) -> Vec<ScanResult>
where
    T: Ohlc + Sync + 'a,
    I: IntoParallelIterator<Item = (&'a str, &'a [T])>,
{
    instruments
        .into_par_iter()
        .map(|(symbol, bars)| scanner.scan(symbol, bars))
        .collect()
}

// ============================================================
// TESTS
// ============================================================
