//! Aggregate statistics over a record collection.

use serde::{Deserialize, Serialize};

use crate::record::InfluencerRecord;

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Totals and rate means over one record collection. Recomputed wholesale on
/// every run, never incrementally maintained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_influencers: usize,
    pub total_views: u64,
    pub total_followers: u64,
    pub avg_engagement_rate: f64,
    pub avg_cpm: f64,
    pub total_likes: u64,
    pub total_comments: u64,
    pub total_shares: u64,
}

impl Summary {
    /// Sums count fields and averages rate fields over the present values.
    /// A collection with no usable rate values reports 0.0.
    pub fn from_records(records: &[InfluencerRecord]) -> Summary {
        let rates: Vec<f64> = records.iter().filter_map(|r| r.engagement_rate).collect();
        let cpms: Vec<f64> = records.iter().filter_map(|r| r.estimated_cpm).collect();

        Summary {
            total_influencers: records.len(),
            total_views: records.iter().filter_map(|r| r.views_count).sum(),
            total_followers: records.iter().filter_map(|r| r.follower_count).sum(),
            avg_engagement_rate: mean(&rates),
            avg_cpm: mean(&cpms),
            total_likes: records.iter().filter_map(|r| r.likes_count).sum(),
            total_comments: records.iter().filter_map(|r| r.comments_count).sum(),
            total_shares: records.iter().filter_map(|r| r.shares_count).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_influencers == 0
    }
}

/// Merges two summaries: totals add, rate fields are weighted by each side's
/// record count. An empty side passes the other side's rates through
/// unchanged; two empty sides produce zero rates.
pub fn combine(regular: &Summary, sales: &Summary) -> Summary {
    let n_regular = regular.total_influencers;
    let n_sales = sales.total_influencers;

    let weighted = |a: f64, b: f64| {
        if n_regular > 0 && n_sales > 0 {
            (a * n_regular as f64 + b * n_sales as f64) / (n_regular + n_sales) as f64
        } else if n_regular > 0 {
            a
        } else if n_sales > 0 {
            b
        } else {
            0.0
        }
    };

    Summary {
        total_influencers: n_regular + n_sales,
        total_views: regular.total_views + sales.total_views,
        total_followers: regular.total_followers + sales.total_followers,
        avg_engagement_rate: weighted(regular.avg_engagement_rate, sales.avg_engagement_rate),
        avg_cpm: weighted(regular.avg_cpm, sales.avg_cpm),
        total_likes: regular.total_likes + sales.total_likes,
        total_comments: regular.total_comments + sales.total_comments,
        total_shares: regular.total_shares + sales.total_shares,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(rate: Option<f64>, cpm: Option<f64>, views: Option<u64>) -> InfluencerRecord {
        InfluencerRecord {
            engagement_rate: rate,
            estimated_cpm: cpm,
            views_count: views,
            ..Default::default()
        }
    }

    fn summary(count: usize, rate: f64, cpm: f64) -> Summary {
        Summary {
            total_influencers: count,
            avg_engagement_rate: rate,
            avg_cpm: cpm,
            ..Default::default()
        }
    }

    #[test]
    fn test_mean_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_from_records_skips_missing_values() {
        let records = vec![
            record(Some(0.10), Some(4.0), Some(1000)),
            record(None, None, None),
            record(Some(0.30), Some(8.0), Some(500)),
        ];
        let s = Summary::from_records(&records);

        assert_eq!(s.total_influencers, 3);
        assert_eq!(s.total_views, 1500);
        assert!((s.avg_engagement_rate - 0.20).abs() < 1e-12);
        assert!((s.avg_cpm - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_from_records_empty() {
        let s = Summary::from_records(&[]);
        assert!(s.is_empty());
        assert_eq!(s.avg_engagement_rate, 0.0);
        assert_eq!(s.total_views, 0);
    }

    #[test]
    fn test_combine_weights_rates_by_count() {
        let regular = summary(3, 0.10, 4.0);
        let sales = summary(1, 0.50, 8.0);
        let all = combine(&regular, &sales);

        assert_eq!(all.total_influencers, 4);
        // (0.10 * 3 + 0.50 * 1) / 4
        assert!((all.avg_engagement_rate - 0.20).abs() < 1e-12);
        assert!((all.avg_cpm - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_combine_empty_side_passes_rate_through() {
        let regular = summary(3, 0.10, 4.0);
        let sales = Summary::default();
        let all = combine(&regular, &sales);

        assert_eq!(all.total_influencers, 3);
        assert_eq!(all.avg_engagement_rate, 0.10);

        let flipped = combine(&sales, &regular);
        assert_eq!(flipped.avg_engagement_rate, 0.10);
    }

    #[test]
    fn test_combine_both_empty_is_zero() {
        let all = combine(&Summary::default(), &Summary::default());
        assert_eq!(all.total_influencers, 0);
        assert_eq!(all.avg_engagement_rate, 0.0);
    }

    #[test]
    fn test_combine_adds_totals() {
        let mut regular = summary(2, 0.1, 1.0);
        regular.total_views = 100;
        regular.total_likes = 10;
        let mut sales = summary(1, 0.2, 2.0);
        sales.total_views = 50;
        sales.total_likes = 5;

        let all = combine(&regular, &sales);
        assert_eq!(all.total_views, 150);
        assert_eq!(all.total_likes, 15);
    }
}
