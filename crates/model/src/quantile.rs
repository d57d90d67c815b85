//! Quantile bucketing, turnover and rank autocorrelation.
//!
//! Buckets are numbered from 1 (lowest values) to `n_buckets`. Each bucket
//! `i` covers `(edges[i-1], edges[i]]`, with the first bucket also closed on
//! the left. Values outside the outer edges are left unassigned.

use std::collections::{BTreeMap, BTreeSet};

use ndarray::Array1;
use tracing::debug;
use xsection_math::{nan_mean, nan_quantiles, spearman};
use xsection_panel::ReturnPanel;
use xsection_primitives::{Date, FactorName, Horizon, Symbol};

use crate::{BinningConfig, JoinedCrossSection, ModelError, Quantiles, TransformedCrossSection};

/// Ascending bucket edges.
#[derive(Debug, Clone, PartialEq)]
pub struct BinEdges(Vec<f64>);

impl BinEdges {
    /// Use explicit edges.
    ///
    /// # Errors
    /// Returns `ModelError::Config` for fewer than two edges, a non-finite
    /// edge, or edges that are not strictly increasing.
    pub fn from_bins(bins: &[f64]) -> Result<Self, ModelError> {
        if bins.len() < 2 {
            return Err(ModelError::Config("bins need at least two edges".into()));
        }
        if let Some(edge) = bins.iter().find(|e| !e.is_finite()) {
            return Err(ModelError::Config(format!("bin edge {edge} is not finite")));
        }
        if let Some(pair) = bins.windows(2).find(|w| w[1] <= w[0]) {
            return Err(ModelError::Config(format!(
                "bin edges must be strictly increasing, got {} then {}",
                pair[0], pair[1]
            )));
        }
        Ok(Self(bins.to_vec()))
    }

    /// Edges at the quantile levels of the finite `values`.
    ///
    /// Level `0` and `1` map to the pooled minimum and maximum, so every
    /// finite value lands in a bucket.
    ///
    /// # Errors
    /// Returns `ModelError::Config` for invalid quantiles, no finite value,
    /// or duplicate edges.
    pub fn from_quantiles(values: &[f64], quantiles: &Quantiles) -> Result<Self, ModelError> {
        let levels = quantiles.levels()?;
        let edges = nan_quantiles(values, &levels);
        if edges.iter().any(|e| e.is_nan()) {
            return Err(ModelError::Config("no finite value to derive quantile edges from".into()));
        }
        if edges.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ModelError::Config(format!(
                "duplicate quantile edges at levels {levels:?}; use fewer quantiles or explicit bins"
            )));
        }
        Ok(Self(edges))
    }

    /// Edges for a binning configuration over the pooled `values`.
    ///
    /// # Errors
    /// Returns `ModelError::Config` for an invalid configuration or edges.
    pub fn from_config(config: &BinningConfig, values: &[f64]) -> Result<Self, ModelError> {
        config.validate()?;
        match (&config.bins, &config.quantiles) {
            (Some(bins), None) => Self::from_bins(bins),
            (None, Some(q)) => Self::from_quantiles(values, q),
            _ => Err(ModelError::Config("set exactly one of quantiles or bins".into())),
        }
    }

    /// Edge values.
    #[must_use]
    pub fn edges(&self) -> &[f64] {
        &self.0
    }

    /// Number of buckets.
    #[must_use]
    pub fn n_buckets(&self) -> usize {
        self.0.len() - 1
    }

    /// Bucket of `value`, if inside the outer edges.
    #[must_use]
    pub fn assign(&self, value: f64) -> Option<usize> {
        let first = *self.0.first()?;
        if !value.is_finite() || value < first {
            return None;
        }
        self.0[1..].iter().position(|&edge| value <= edge).map(|i| i + 1)
    }
}

/// Share of a bucket's members that were not in it `lag` sessions earlier.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketTurnover {
    /// Return horizon.
    pub horizon: Horizon,
    /// Session end date.
    pub session_end: Date,
    /// Bucket number.
    pub bucket: usize,
    /// Turnover in `[0, 1]`.
    pub turnover: f64,
}

/// Spearman correlation of bucket assignments with those `lag` sessions earlier.
#[derive(Debug, Clone, PartialEq)]
pub struct RankAutocorrelation {
    /// Return horizon.
    pub horizon: Horizon,
    /// Session end date.
    pub session_end: Date,
    /// Rank autocorrelation.
    pub autocorrelation: f64,
}

/// Mean excess return of one bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketReturn {
    /// Return horizon.
    pub horizon: Horizon,
    /// Session end date.
    pub session_end: Date,
    /// Bucket number.
    pub bucket: usize,
    /// Mean excess return in percent.
    pub mean_return: f64,
}

/// Top-minus-bottom bucket mean excess return.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantileSpread {
    /// Return horizon.
    pub horizon: Horizon,
    /// Session end date.
    pub session_end: Date,
    /// Spread in percent.
    pub spread: f64,
}

/// Quantile analytics of one factor.
#[derive(Debug, Clone)]
pub struct QuantileAnalytics {
    /// Factor name.
    pub factor: FactorName,
    /// Bucket edges used.
    pub edges: BinEdges,
    /// Turnover per (horizon, session, bucket).
    pub turnover: Vec<BucketTurnover>,
    /// Rank autocorrelation per (horizon, session).
    pub autocorrelation: Vec<RankAutocorrelation>,
    /// Mean return per (horizon, session, bucket).
    pub returns: Vec<BucketReturn>,
    /// Top-minus-bottom spread per (horizon, session).
    pub spread: Vec<QuantileSpread>,
}

type Assignment = BTreeMap<Symbol, usize>;

/// Bucket assignment and per-bucket mean returns of one joined cross-section.
fn bucket_session(
    edges: &BinEdges,
    joined: &JoinedCrossSection,
) -> (Assignment, BTreeMap<usize, f64>) {
    let mut assignment = Assignment::new();
    let mut members: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
    for ((symbol, &value), &er) in
        joined.symbols.iter().zip(joined.factor.iter()).zip(joined.excess_return.iter())
    {
        if let Some(bucket) = edges.assign(value) {
            assignment.insert(symbol.clone(), bucket);
            members.entry(bucket).or_default().push(er);
        }
    }
    let means = members.into_iter().map(|(b, ers)| (b, nan_mean(&ers))).collect();
    (assignment, means)
}

/// Turnover of every populated bucket of `current` against `previous`.
fn bucket_turnover(current: &Assignment, previous: &Assignment) -> BTreeMap<usize, f64> {
    let mut sizes: BTreeMap<usize, (usize, usize)> = BTreeMap::new();
    for (symbol, &bucket) in current {
        let entry = sizes.entry(bucket).or_default();
        entry.0 += 1;
        if previous.get(symbol) != Some(&bucket) {
            entry.1 += 1;
        }
    }
    sizes.into_iter().map(|(b, (size, new))| (b, new as f64 / size as f64)).collect()
}

/// Spearman correlation of the bucket numbers of symbols present in both.
fn rank_autocorrelation(current: &Assignment, previous: &Assignment) -> f64 {
    let (now, before): (Vec<f64>, Vec<f64>) = current
        .iter()
        .filter_map(|(symbol, &b)| previous.get(symbol).map(|&p| (b as f64, p as f64)))
        .unzip();
    spearman(&Array1::from_vec(now), &Array1::from_vec(before))
}

/// Bucket the standardized values of `factor` and measure turnover,
/// autocorrelation and bucket returns per horizon.
///
/// Edges come from `config` over the pooled standardized values of the
/// factor. Each session is joined with its returns before bucketing.
///
/// # Errors
/// Returns `ModelError::Config` for an invalid binning choice or edges.
pub fn analyze(
    factor: &FactorName,
    transformed: &[TransformedCrossSection],
    returns: &ReturnPanel,
    horizons: &[Horizon],
    config: &BinningConfig,
) -> Result<QuantileAnalytics, ModelError> {
    let mut sessions: Vec<&TransformedCrossSection> =
        transformed.iter().filter(|t| &t.factor == factor).collect();
    sessions.sort_by_key(|t| t.session_end);

    let pooled: Vec<f64> = sessions.iter().flat_map(|t| t.standardized.iter().copied()).collect();
    let edges = BinEdges::from_config(config, &pooled)?;
    let top = edges.n_buckets();

    let mut analytics = QuantileAnalytics {
        factor: factor.clone(),
        edges: edges.clone(),
        turnover: Vec::new(),
        autocorrelation: Vec::new(),
        returns: Vec::new(),
        spread: Vec::new(),
    };

    let horizons: BTreeSet<Horizon> = horizons.iter().copied().collect();
    for horizon in horizons {
        let mut history: Vec<(Date, Assignment)> = Vec::new();
        for t in &sessions {
            let Some(group) = returns.group(horizon, t.session_end) else { continue };
            let joined = JoinedCrossSection::join(t, false, |s| {
                group.get(s).map(|obs| (obs.excess_return, obs.weight))
            });
            let (assignment, means) = bucket_session(&edges, &joined);

            analytics.returns.extend(means.iter().map(|(&bucket, &mean_return)| BucketReturn {
                horizon,
                session_end: t.session_end,
                bucket,
                mean_return,
            }));
            if let (Some(hi), Some(lo)) = (means.get(&top), means.get(&1)) {
                analytics.spread.push(QuantileSpread {
                    horizon,
                    session_end: t.session_end,
                    spread: hi - lo,
                });
            }
            history.push((t.session_end, assignment));
        }

        for i in config.lag..history.len() {
            let (session_end, current) = &history[i];
            let previous = &history[i - config.lag].1;
            analytics.turnover.extend(bucket_turnover(current, previous).into_iter().map(
                |(bucket, turnover)| BucketTurnover { horizon, session_end: *session_end, bucket, turnover },
            ));
            analytics.autocorrelation.push(RankAutocorrelation {
                horizon,
                session_end: *session_end,
                autocorrelation: rank_autocorrelation(current, previous),
            });
        }
        debug!(%factor, %horizon, sessions = history.len(), "bucketed sessions");
    }
    Ok(analytics)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rstest::rstest;
    use xsection_primitives::ReturnRecord;

    use super::*;

    #[test]
    fn explicit_bins_assign_half_open_buckets() {
        let edges = BinEdges::from_bins(&[-1.0, 0.0, 1.0]).unwrap();
        assert_eq!(edges.n_buckets(), 2);
        assert_eq!(edges.assign(-1.0), Some(1));
        assert_eq!(edges.assign(0.0), Some(1));
        assert_eq!(edges.assign(0.5), Some(2));
        assert_eq!(edges.assign(1.0), Some(2));
        assert_eq!(edges.assign(1.5), None);
        assert_eq!(edges.assign(-1.5), None);
        assert_eq!(edges.assign(f64::NAN), None);
    }

    #[rstest]
    #[case(&[0.0, 0.0, 1.0])]
    #[case(&[1.0, 0.5])]
    #[case(&[0.0])]
    #[case(&[0.0, f64::INFINITY])]
    fn invalid_bins_are_config_errors(#[case] bins: &[f64]) {
        assert!(matches!(BinEdges::from_bins(bins), Err(ModelError::Config(_))));
    }

    #[test]
    fn quantile_edges_span_pooled_range() {
        let values: Vec<f64> = (1..=9).map(f64::from).collect();
        let edges = BinEdges::from_quantiles(&values, &Quantiles::Count(4)).unwrap();
        assert_eq!(edges.n_buckets(), 4);
        assert_eq!(edges.edges()[0], 1.0);
        assert_relative_eq!(edges.edges()[2], 5.0, epsilon = 1e-12);
        assert_eq!(edges.edges()[4], 9.0);

        // the lowest edge is closed, so the pooled minimum lands in bucket 1
        assert_eq!(edges.assign(1.0), Some(1));
        assert_eq!(edges.assign(9.0), Some(4));
        assert_eq!(edges.assign(0.5), None);
    }

    #[test]
    fn uneven_breakpoints_build_uneven_buckets() {
        let values: Vec<f64> = (1..=100).map(f64::from).collect();
        let quantiles = Quantiles::Breakpoints(vec![0.1, 0.5, 0.9]);
        let edges = BinEdges::from_quantiles(&values, &quantiles).unwrap();
        assert_eq!(edges.n_buckets(), 4);

        let mut counts = [0usize; 4];
        for &v in &values {
            counts[edges.assign(v).unwrap() - 1] += 1;
        }
        assert_eq!(counts, [10, 40, 40, 10]);
    }

    #[rstest]
    #[case(Quantiles::Count(5))]
    #[case(Quantiles::Breakpoints(vec![0.2, 0.4]))]
    fn duplicate_quantile_edges_are_config_errors(#[case] quantiles: Quantiles) {
        let values = [0.0, 0.0, 0.0, 0.0, 0.0, 1.0];
        let err = BinEdges::from_quantiles(&values, &quantiles).unwrap_err();
        assert!(matches!(err, ModelError::Config(_)));
        assert!(!err.is_recoverable());
    }

    #[rstest]
    #[case(Quantiles::Breakpoints(vec![0.5, 1.5]))]
    #[case(Quantiles::Count(0))]
    fn invalid_quantiles_are_config_errors(#[case] quantiles: Quantiles) {
        let values: Vec<f64> = (1..=9).map(f64::from).collect();
        assert!(matches!(BinEdges::from_quantiles(&values, &quantiles), Err(ModelError::Config(_))));
        assert!(matches!(
            BinEdges::from_quantiles(&[f64::NAN], &Quantiles::Count(2)),
            Err(ModelError::Config(_))
        ));
    }

    #[test]
    fn config_requires_exactly_one_choice() {
        let both = BinningConfig { quantiles: Some(Quantiles::Count(2)), bins: Some(vec![0.0, 1.0]), lag: 1 };
        assert!(BinEdges::from_config(&both, &[0.0, 1.0]).is_err());
        let neither = BinningConfig { quantiles: None, bins: None, lag: 1 };
        assert!(BinEdges::from_config(&neither, &[0.0, 1.0]).is_err());
    }

    fn assignment(pairs: &[(&str, usize)]) -> Assignment {
        pairs.iter().map(|(s, b)| (Symbol::from(*s), *b)).collect()
    }

    #[test]
    fn turnover_counts_new_members() {
        let previous = assignment(&[("A", 1), ("B", 1), ("C", 2), ("D", 2)]);
        let current = assignment(&[("A", 1), ("C", 1), ("B", 2), ("D", 2), ("E", 2)]);
        let turnover = bucket_turnover(&current, &previous);
        assert_relative_eq!(turnover[&1], 0.5);
        assert_relative_eq!(turnover[&2], 2.0 / 3.0);
    }

    #[test]
    fn stable_assignment_has_unit_autocorrelation() {
        let a = assignment(&[("A", 1), ("B", 2), ("C", 3)]);
        assert_relative_eq!(rank_autocorrelation(&a, &a), 1.0);
        let flipped = assignment(&[("A", 3), ("B", 2), ("C", 1)]);
        assert_relative_eq!(rank_autocorrelation(&flipped, &a), -1.0);
    }

    fn transformed(day: u32, values: &[(&str, f64)]) -> TransformedCrossSection {
        let values_arr = Array1::from_iter(values.iter().map(|(_, v)| *v));
        TransformedCrossSection {
            session_end: Date::from_ymd_opt(2024, 1, day).unwrap(),
            factor: "PAT_M".into(),
            symbols: values.iter().map(|(s, _)| Symbol::from(*s)).collect(),
            raw: values_arr.clone(),
            robust: values_arr.clone(),
            standardized: values_arr,
        }
    }

    #[test]
    fn analyze_two_sessions() {
        let panel = vec![
            transformed(10, &[("A", -1.0), ("B", -0.5), ("C", 0.5), ("D", 1.0)]),
            transformed(20, &[("A", 1.0), ("B", -0.5), ("C", 0.5), ("D", -1.0)]),
        ];
        let returns = ReturnPanel::from_records(panel.iter().flat_map(|t| {
            t.symbols.iter().zip(t.standardized.iter()).map(|(s, &v)| {
                ReturnRecord::new(s.clone(), t.session_end, Horizon(1), 2.0 * v, 1e9)
            })
        }));
        let config = BinningConfig { quantiles: None, bins: Some(vec![-1.0, 0.0, 1.0]), lag: 1 };

        let analytics = analyze(&"PAT_M".into(), &panel, &returns, &[Horizon(1)], &config).unwrap();

        assert_eq!(analytics.returns.len(), 4);
        assert_eq!(analytics.spread.len(), 2);
        assert_relative_eq!(analytics.spread[0].spread, 3.0);

        // A and D swap buckets; B and C stay
        assert_eq!(analytics.turnover.len(), 2);
        assert_relative_eq!(analytics.turnover[0].turnover, 0.5);
        assert_relative_eq!(analytics.turnover[1].turnover, 0.5);
        assert_eq!(analytics.autocorrelation.len(), 1);
        assert_relative_eq!(analytics.autocorrelation[0].autocorrelation, 0.0, epsilon = 1e-12);
    }

    fn monotone_panel(sign: f64) -> (Vec<TransformedCrossSection>, ReturnPanel) {
        let values: Vec<(String, f64)> =
            (0..10).map(|i| (format!("S{i}"), -2.25 + 0.5 * f64::from(i))).collect();
        let pairs: Vec<(&str, f64)> = values.iter().map(|(s, v)| (s.as_str(), *v)).collect();
        let panel: Vec<TransformedCrossSection> =
            [10, 20, 30].into_iter().map(|day| transformed(day, &pairs)).collect();
        let returns = ReturnPanel::from_records(panel.iter().flat_map(|t| {
            t.symbols.iter().zip(t.standardized.iter()).map(move |(s, &v)| {
                ReturnRecord::new(s.clone(), t.session_end, Horizon(1), sign * v, 1e9)
            })
        }));
        (panel, returns)
    }

    #[rstest]
    #[case(1.0)]
    #[case(-1.0)]
    fn spread_follows_factor_direction(#[case] sign: f64) {
        let (panel, returns) = monotone_panel(sign);
        let config = BinningConfig { quantiles: Some(Quantiles::Count(5)), bins: None, lag: 1 };

        let analytics = analyze(&"PAT_M".into(), &panel, &returns, &[Horizon(1)], &config).unwrap();

        assert_eq!(analytics.edges.n_buckets(), 5);
        assert_eq!(analytics.spread.len(), 3);
        for row in &analytics.spread {
            assert!(row.spread * sign > 0.0);
        }
        // every entity is bucketed, the minimum included
        let per_session = analytics.returns.iter().filter(|r| r.session_end == panel[0].session_end);
        assert_eq!(per_session.map(|r| r.bucket).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);

        // identical sessions keep every member in place
        assert!(analytics.turnover.iter().all(|r| r.turnover == 0.0));
        assert!(analytics.autocorrelation.iter().all(|r| (r.autocorrelation - 1.0).abs() < 1e-12));
    }
}
