use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::models::{MAX_RATING, MIN_RATING};

/// `numerator / denominator` 保留两位小数，.5 向上取整。
/// 用整数百分位计算，避免 4.225 这类恰好为一半的值
/// 被二进制浮点误差舍掉。
pub fn ratio2(numerator: i64, denominator: i64) -> f64 {
    if denominator <= 0 || numerator < 0 {
        return 0.0;
    }
    let hundredths = (200 * numerator + denominator) / (2 * denominator);
    hundredths as f64 / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct StarBucket {
    pub count: i64,
    pub percent: f64,
}

/// 已发布评价的平均分与 1..5 分布
#[derive(Debug, Clone, PartialEq)]
pub struct RatingSummary {
    pub average: f64,
    pub count: i64,
    pub count_formatted: String,
    /// 下标 0 为一星，下标 4 为五星
    pub stars: [StarBucket; 5],
}

impl RatingSummary {
    /// 由原始评分生成汇总。1..=5 之外的值计入总数和均值，
    /// 但不进入任何分桶；存储层保证不会出现这种值。
    pub fn from_ratings(ratings: &[i64], count_formatted: String) -> Self {
        let count = ratings.len() as i64;
        let mut stars = [StarBucket::default(); 5];

        if count == 0 {
            return Self {
                average: 0.0,
                count,
                count_formatted,
                stars,
            };
        }

        for r in ratings {
            if (MIN_RATING..=MAX_RATING).contains(r) {
                stars[(*r - MIN_RATING) as usize].count += 1;
            }
        }
        for bucket in stars.iter_mut() {
            bucket.percent = if bucket.count > 0 {
                ratio2(100 * bucket.count, count)
            } else {
                0.0
            };
        }

        let sum: i64 = ratings.iter().sum();
        Self {
            average: ratio2(sum, count),
            count,
            count_formatted,
            stars,
        }
    }

    pub fn star(&self, value: i64) -> Option<&StarBucket> {
        if (MIN_RATING..=MAX_RATING).contains(&value) {
            self.stars.get((value - MIN_RATING) as usize)
        } else {
            None
        }
    }
}

// {"average", "count", "countFormatted", "1".."5": {count, percent}}
impl Serialize for RatingSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(8))?;
        map.serialize_entry("average", &self.average)?;
        map.serialize_entry("count", &self.count)?;
        map.serialize_entry("countFormatted", &self.count_formatted)?;
        for (i, bucket) in self.stars.iter().enumerate() {
            map.serialize_entry(&(i as i64 + MIN_RATING).to_string(), bucket)?;
        }
        map.end()
    }
}
