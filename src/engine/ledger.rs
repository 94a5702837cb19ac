//! Deal ledger — bounded, multi-category store of qualifying deals.
//!
//! Each category is a [`BoundedIndex`]: an append-only sequence with its
//! own membership predicate and FIFO eviction past capacity. A deal is
//! offered to every category once, at insertion, and shared between them.
//!
//! The ledger is mutated through `&mut self` only. A concurrent caller must
//! wrap it in a mutex so append and truncate stay one step.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::model::profit::ProfitReport;
use crate::types::{Deal, LoadRecord};

/// Default per-category capacity.
pub const DEFAULT_CAPACITY: usize = 50;
/// Deals scoring at least this land in the Excellent category.
pub const EXCELLENT_SCORE: f64 = 90.0;
/// Loads paying at least this land in the HighValue category.
pub const HIGH_VALUE_RATE: f64 = 5000.0;
/// Net profit above which a deal passes the "profitable" view filter.
pub const PROFITABLE_NET_PROFIT: f64 = 500.0;
/// Score at or above which a deal passes the "efficient" view filter.
pub const EFFICIENT_SCORE: f64 = 85.0;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Maximum entries kept per category.
    pub capacity: usize,
    /// How many of the latest deals a ranking compares against.
    pub rank_window: usize,
    /// Age limit for the "recent" view filter.
    pub recent_window_secs: i64,
}

impl LedgerConfig {
    /// Age limit for the "recent" view filter. Saturates instead of
    /// panicking when the configured seconds exceed the representable range.
    pub fn recent_window(&self) -> Duration {
        Duration::try_seconds(self.recent_window_secs).unwrap_or(Duration::MAX)
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            rank_window: 10,
            recent_window_secs: 600,
        }
    }
}

// ---------------------------------------------------------------------------
// Bounded index
// ---------------------------------------------------------------------------

/// Append-only sequence capped at `capacity`, dropping its oldest entries
/// first. Only items accepted by `admits` are stored.
#[derive(Debug, Clone)]
pub struct BoundedIndex<T> {
    capacity: usize,
    admits: fn(&T) -> bool,
    entries: VecDeque<T>,
}

impl<T: Clone> BoundedIndex<T> {
    pub fn new(capacity: usize, admits: fn(&T) -> bool) -> Self {
        Self {
            capacity,
            admits,
            entries: VecDeque::with_capacity(capacity.saturating_add(1)),
        }
    }

    /// Append `item` if it belongs here, then trim to capacity.
    /// Returns whether the item was admitted.
    pub fn offer(&mut self, item: &T) -> bool {
        if !(self.admits)(item) {
            return false;
        }
        self.entries.push_back(item.clone());
        self.trim();
        true
    }

    /// Change the cap, dropping the oldest entries if it shrank.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.trim();
    }

    fn trim(&mut self) {
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Up to `k` newest entries, oldest first.
    pub fn last(&self, k: usize) -> impl Iterator<Item = &T> + '_ {
        let skip = self.entries.len().saturating_sub(k);
        self.entries.iter().skip(skip)
    }

    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, T> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

// ---------------------------------------------------------------------------
// Categories and view filters
// ---------------------------------------------------------------------------

/// One of the five named ledger sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DealCategory {
    All,
    Recent,
    Premium,
    Excellent,
    HighValue,
}

impl DealCategory {
    pub const ALL: &'static [DealCategory] = &[
        DealCategory::All,
        DealCategory::Recent,
        DealCategory::Premium,
        DealCategory::Excellent,
        DealCategory::HighValue,
    ];

    fn index(self) -> usize {
        match self {
            DealCategory::All => 0,
            DealCategory::Recent => 1,
            DealCategory::Premium => 2,
            DealCategory::Excellent => 3,
            DealCategory::HighValue => 4,
        }
    }

    /// Membership predicate, decided once per deal at insertion.
    fn admits(self) -> fn(&Arc<Deal>) -> bool {
        match self {
            DealCategory::All | DealCategory::Recent => admit_any,
            DealCategory::Premium => is_premium,
            DealCategory::Excellent => is_excellent,
            DealCategory::HighValue => is_high_value,
        }
    }
}

fn admit_any(_deal: &Arc<Deal>) -> bool {
    true
}

/// Every deal that reaches the ledger has already qualified, and
/// qualification is currently all Premium asks for.
fn is_premium(_deal: &Arc<Deal>) -> bool {
    true
}

fn is_excellent(deal: &Arc<Deal>) -> bool {
    deal.score >= EXCELLENT_SCORE
}

fn is_high_value(deal: &Arc<Deal>) -> bool {
    deal.load.total_rate >= HIGH_VALUE_RATE
}

impl fmt::Display for DealCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DealCategory::All => write!(f, "All"),
            DealCategory::Recent => write!(f, "Recent"),
            DealCategory::Premium => write!(f, "Premium"),
            DealCategory::Excellent => write!(f, "Excellent"),
            DealCategory::HighValue => write!(f, "HighValue"),
        }
    }
}

impl std::str::FromStr for DealCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "all" => Ok(DealCategory::All),
            "recent" => Ok(DealCategory::Recent),
            "premium" => Ok(DealCategory::Premium),
            "excellent" => Ok(DealCategory::Excellent),
            "highvalue" => Ok(DealCategory::HighValue),
            _ => Err(anyhow::anyhow!("Unknown deal category: {s}")),
        }
    }
}

/// Transient view filter applied at query time. Never mutates the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DealFilter {
    All,
    Profitable,
    Efficient,
    Recent,
}

impl DealFilter {
    pub fn matches(self, deal: &Deal, now: DateTime<Utc>, recent_window: Duration) -> bool {
        match self {
            DealFilter::All => true,
            DealFilter::Profitable => deal.report.net_profit > PROFITABLE_NET_PROFIT,
            DealFilter::Efficient => deal.score >= EFFICIENT_SCORE,
            DealFilter::Recent => now - deal.timestamp < recent_window,
        }
    }
}

// ---------------------------------------------------------------------------
// Ranking and analysis
// ---------------------------------------------------------------------------

/// Averages over a comparison window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowAverages {
    pub net_profit: f64,
    pub score: f64,
    pub rate_per_mile: f64,
}

impl WindowAverages {
    fn over<'a>(deals: impl ExactSizeIterator<Item = &'a Arc<Deal>>) -> Self {
        let n = deals.len();
        let (profit, score, rate) = deals.fold((0.0, 0.0, 0.0), |(p, s, r), d| {
            (p + d.report.net_profit, s + d.score, r + d.load.rate_per_mile)
        });
        if n == 0 {
            return Self {
                net_profit: 0.0,
                score: 0.0,
                rate_per_mile: 0.0,
            };
        }
        let n = n as f64;
        Self {
            net_profit: profit / n,
            score: score / n,
            rate_per_mile: rate / n,
        }
    }
}

/// Position of a deal among the latest entries of the All category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    /// 1-based, by descending score.
    pub rank: usize,
    pub window_size: usize,
    pub percentile: f64,
    pub averages: WindowAverages,
}

impl fmt::Display for Ranking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} of {} ({:.0}th pct) | avg net ${:.0} | avg score {:.1} | avg ${:.2}/mi",
            self.rank,
            self.window_size,
            self.percentile,
            self.averages.net_profit,
            self.averages.score,
            self.averages.rate_per_mile,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Advice {
    HighlyRecommended,
    Recommended,
    ConsiderCarefully,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketPosition {
    AboveMarket,
    MarketAverage,
    BelowMarket,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Medium => write!(f, "Medium"),
            RiskLevel::High => write!(f, "High"),
        }
    }
}

impl fmt::Display for Advice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advice::HighlyRecommended => write!(f, "Highly Recommended"),
            Advice::Recommended => write!(f, "Recommended"),
            Advice::ConsiderCarefully => write!(f, "Consider Carefully"),
        }
    }
}

impl fmt::Display for MarketPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketPosition::AboveMarket => write!(f, "Above Market"),
            MarketPosition::MarketAverage => write!(f, "Market Average"),
            MarketPosition::BelowMarket => write!(f, "Below Market"),
        }
    }
}

/// A deal measured against every deal currently in the All category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealAnalysis {
    /// Percent above (or below) the average net profit.
    pub profit_vs_average: f64,
    /// Percent above (or below) the average score.
    pub score_vs_average: f64,
    pub risk_level: RiskLevel,
    pub advice: Advice,
    pub market_position: MarketPosition,
}

fn percent_diff(value: f64, average: f64) -> f64 {
    if average == 0.0 {
        0.0
    } else {
        (value - average) / average * 100.0
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Per-category entry counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerCounts {
    pub all: usize,
    pub recent: usize,
    pub premium: usize,
    pub excellent: usize,
    pub high_value: usize,
}

pub struct DealLedger {
    config: LedgerConfig,
    categories: [BoundedIndex<Arc<Deal>>; 5],
}

impl Default for DealLedger {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}

impl DealLedger {
    pub fn new(config: LedgerConfig) -> Self {
        let index = |category: DealCategory| BoundedIndex::new(config.capacity, category.admits());
        Self {
            categories: [
                index(DealCategory::All),
                index(DealCategory::Recent),
                index(DealCategory::Premium),
                index(DealCategory::Excellent),
                index(DealCategory::HighValue),
            ],
            config,
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Adopt edited settings. A smaller capacity evicts the oldest entries
    /// of each category right away.
    pub fn apply_config(&mut self, config: LedgerConfig) {
        if config == self.config {
            return;
        }
        for index in self.categories.iter_mut() {
            if index.capacity() != config.capacity {
                index.set_capacity(config.capacity);
            }
        }
        info!(
            capacity = config.capacity,
            rank_window = config.rank_window,
            recent_window_secs = config.recent_window_secs,
            "Ledger settings updated"
        );
        self.config = config;
    }

    fn category(&self, category: DealCategory) -> &BoundedIndex<Arc<Deal>> {
        &self.categories[category.index()]
    }

    /// Snapshot a qualifying load as a deal and insert it.
    pub fn record(&mut self, load: LoadRecord, report: ProfitReport, score: f64) -> Arc<Deal> {
        self.insert(Deal::new(load, report, score))
    }

    /// Offer a deal to every category; each trims itself independently.
    pub fn insert(&mut self, deal: Deal) -> Arc<Deal> {
        let deal = Arc::new(deal);
        let mut joined = Vec::with_capacity(DealCategory::ALL.len());
        for &category in DealCategory::ALL {
            if self.categories[category.index()].offer(&deal) {
                joined.push(category);
            }
        }

        info!(
            deal_id = %deal.id,
            route = format!("{} → {}", deal.load.origin, deal.load.destination),
            score = deal.score,
            net_profit = format!("${:.2}", deal.report.net_profit),
            categories = ?joined,
            "Deal recorded"
        );

        deal
    }

    /// The newest `limit` deals of a category passing `filter`, oldest first.
    pub fn query(&self, category: DealCategory, filter: DealFilter, limit: usize) -> Vec<Arc<Deal>> {
        self.query_at(category, filter, limit, Utc::now())
    }

    /// [`query`](Self::query) against an explicit clock.
    pub fn query_at(
        &self,
        category: DealCategory,
        filter: DealFilter,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Vec<Arc<Deal>> {
        let window = self.config.recent_window();
        let deals: Vec<Arc<Deal>> = self
            .category(category)
            .last(limit)
            .filter(|deal| filter.matches(deal, now, window))
            .cloned()
            .collect();
        debug!(%category, ?filter, limit, returned = deals.len(), "Ledger queried");
        deals
    }

    /// Rank `deal` by score among the newest `window_size` deals of All.
    /// `None` when the deal is not inside that window.
    pub fn rank(&self, deal: &Deal, window_size: usize) -> Option<Ranking> {
        let mut window: Vec<&Arc<Deal>> = self.category(DealCategory::All).last(window_size).collect();
        if window.is_empty() {
            return None;
        }
        let averages = WindowAverages::over(window.iter().copied());

        window.sort_by(|a, b| b.score.total_cmp(&a.score));
        let rank = window.iter().position(|d| d.id == deal.id)? + 1;
        let total = window.len();

        Some(Ranking {
            rank,
            window_size: total,
            percentile: 100.0 - rank as f64 / total as f64 * 100.0,
            averages,
        })
    }

    /// Rank against the configured default window.
    pub fn rank_default(&self, deal: &Deal) -> Option<Ranking> {
        self.rank(deal, self.config.rank_window)
    }

    /// Compare a deal with the averages of the whole All category.
    /// `None` while the ledger is empty.
    pub fn analyze(&self, deal: &Deal) -> Option<DealAnalysis> {
        let all = self.category(DealCategory::All);
        if all.is_empty() {
            return None;
        }
        let averages = WindowAverages::over(all.iter());
        let profit = deal.report.net_profit;

        let risk_level = match deal.report.risk_assessment_score {
            Some(score) if score > 90.0 => RiskLevel::Low,
            Some(score) if score > 70.0 => RiskLevel::Medium,
            Some(_) => RiskLevel::High,
            None => RiskLevel::Low,
        };
        let advice = if profit > averages.net_profit * 1.2 {
            Advice::HighlyRecommended
        } else if profit > averages.net_profit {
            Advice::Recommended
        } else {
            Advice::ConsiderCarefully
        };
        let market_position = if deal.score >= averages.score * 1.1 {
            MarketPosition::AboveMarket
        } else if deal.score >= averages.score * 0.9 {
            MarketPosition::MarketAverage
        } else {
            MarketPosition::BelowMarket
        };

        Some(DealAnalysis {
            profit_vs_average: percent_diff(profit, averages.net_profit),
            score_vs_average: percent_diff(deal.score, averages.score),
            risk_level,
            advice,
            market_position,
        })
    }

    pub fn len(&self, category: DealCategory) -> usize {
        self.category(category).len()
    }

    pub fn counts(&self) -> LedgerCounts {
        LedgerCounts {
            all: self.len(DealCategory::All),
            recent: self.len(DealCategory::Recent),
            premium: self.len(DealCategory::Premium),
            excellent: self.len(DealCategory::Excellent),
            high_value: self.len(DealCategory::HighValue),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
