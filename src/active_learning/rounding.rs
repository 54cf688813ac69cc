use crate::error::MondrianError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// Rule for turning continuous per-leaf shares into non-negative integers
/// that sum exactly to a requested total.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    JsonSchema,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
pub enum RoundingPolicy {
    /// Round every share down, then hand the leftover units to the largest
    /// fractional remainders. Ties go to the earlier leaf.
    #[default]
    #[serde(rename = "largest_remainder")]
    #[strum(to_string = "largest_remainder")]
    LargestRemainder,

    /// Highest-averages rule: each unit goes to the leaf maximising `share / (count + 1)`.
    #[serde(rename = "dhondt")]
    #[strum(to_string = "dhondt")]
    DHondt,
}

impl RoundingPolicy {
    /// Parses a policy name, failing with [`MondrianError::UnknownRoundingPolicy`].
    pub fn from_name(name: &str) -> Result<Self, MondrianError> {
        RoundingPolicy::from_str(name)
            .map_err(|_| MondrianError::UnknownRoundingPolicy(name.to_string()))
    }

    pub fn apportion(self, shares: &[f64], total: usize) -> Vec<usize> {
        if shares.is_empty() {
            return Vec::new();
        }
        match self {
            RoundingPolicy::LargestRemainder => largest_remainder(shares, total),
            RoundingPolicy::DHondt => dhondt(shares, total),
        }
    }
}

fn largest_remainder(shares: &[f64], total: usize) -> Vec<usize> {
    let mut counts: Vec<usize> = shares.iter().map(|s| s.max(0.0).floor() as usize).collect();
    let assigned: usize = counts.iter().sum();
    debug_assert!(assigned <= total, "floored shares exceed the total");

    let remainders: Vec<f64> = shares
        .iter()
        .zip(&counts)
        .map(|(s, &c)| s.max(0.0) - c as f64)
        .collect();

    let mut order: Vec<usize> = (0..shares.len()).collect();
    order.sort_by(|&a, &b| {
        remainders[b]
            .partial_cmp(&remainders[a])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });

    let remaining = total.saturating_sub(assigned);
    for &leaf in order.iter().cycle().take(remaining) {
        counts[leaf] += 1;
    }
    counts
}

fn dhondt(shares: &[f64], total: usize) -> Vec<usize> {
    let mut counts = vec![0usize; shares.len()];
    if shares.iter().all(|&s| s <= 0.0) {
        for leaf in (0..shares.len()).cycle().take(total) {
            counts[leaf] += 1;
        }
        return counts;
    }

    for _ in 0..total {
        let mut best = 0;
        let mut best_quotient = f64::NEG_INFINITY;
        for (leaf, (&share, &count)) in shares.iter().zip(&counts).enumerate() {
            let quotient = share.max(0.0) / (count + 1) as f64;
            if quotient > best_quotient {
                best = leaf;
                best_quotient = quotient;
            }
        }
        counts[best] += 1;
    }
    counts
}

/// Apportions `total` units by `proportions`, capping each bucket at
/// `capacity` and re-apportioning any overflow by remaining room. The result
/// sums to `total` unless the buckets cannot hold it, in which case every
/// bucket is filled to capacity.
pub fn apportion_with_capacity(
    proportions: &[f64],
    capacity: &[usize],
    total: usize,
    policy: RoundingPolicy,
) -> Vec<usize> {
    debug_assert_eq!(proportions.len(), capacity.len());

    let shares: Vec<f64> = proportions.iter().map(|p| p * total as f64).collect();
    let mut counts = policy.apportion(&shares, total);

    for _ in 0..=capacity.len() {
        let overflow = clamp_to_capacity(&mut counts, capacity);
        if overflow == 0 {
            break;
        }

        let room: Vec<usize> = capacity.iter().zip(&counts).map(|(c, n)| c - n).collect();
        let total_room: usize = room.iter().sum();
        if total_room == 0 {
            break;
        }

        let placed = overflow.min(total_room);
        let room_shares: Vec<f64> = room
            .iter()
            .map(|&r| r as f64 / total_room as f64 * placed as f64)
            .collect();
        for (count, extra) in counts.iter_mut().zip(policy.apportion(&room_shares, placed)) {
            *count += extra;
        }
    }

    clamp_to_capacity(&mut counts, capacity);
    let mut missing = total.saturating_sub(counts.iter().sum());
    for (count, &cap) in counts.iter_mut().zip(capacity) {
        if missing == 0 {
            break;
        }
        let add = (cap - *count).min(missing);
        *count += add;
        missing -= add;
    }
    counts
}

fn clamp_to_capacity(counts: &mut [usize], capacity: &[usize]) -> usize {
    let mut overflow = 0;
    for (count, &cap) in counts.iter_mut().zip(capacity) {
        if *count > cap {
            overflow += *count - cap;
            *count = cap;
        }
    }
    overflow
}
