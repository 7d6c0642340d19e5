//! Similarity classifier
//!
//! Decides whether two items may share a display slot. Resource amounts are
//! compared through coarse fill buckets so that independently simulated items
//! still stack when they look the same to the player.
//!
//! Buckets:
//!
//! | fill fraction     | bucket                          |
//! |-------------------|---------------------------------|
//! | ≈ 0               | 0                               |
//! | (0, 0.05)         | 5                               |
//! | [0.05, 0.95)      | `floor((p + 0.05) * 10) * 10`   |
//! | [0.95, 1)         | 95                              |
//! | ≈ 1               | 100                             |

use crate::item::ItemPayload;
use std::collections::{BTreeMap, BTreeSet};

/// Tolerance for the "provably empty" and "provably full" buckets
pub const BUCKET_EPSILON: f64 = 1e-6;

/// Map a fill fraction to its display bucket
pub fn bucket(percent: f64) -> u8 {
    if percent <= BUCKET_EPSILON {
        return 0;
    }
    if percent >= 1.0 - BUCKET_EPSILON {
        return 100;
    }
    if percent < 0.05 {
        return 5;
    }
    if percent >= 0.95 {
        return 95;
    }
    // The +0.05 shift before flooring is load-bearing for UI text
    (((percent + 0.05) * 10.0).floor() as u8) * 10
}

/// Resource name -> bucket for one payload
pub fn bucket_map(payload: &ItemPayload) -> BTreeMap<String, u8> {
    payload
        .resources
        .iter()
        .map(|r| (r.name.clone(), bucket(r.fraction())))
        .collect()
}

fn resource_names(payload: &ItemPayload) -> BTreeSet<&str> {
    payload.resources.iter().map(|r| r.name.as_str()).collect()
}

/// Same kind, same variant and the same set of resource names
pub fn same_kind(a: &ItemPayload, b: &ItemPayload) -> bool {
    a.kind == b.kind && a.variant == b.variant && resource_names(a) == resource_names(b)
}

/// [`same_kind`] and every resource falls into the same bucket
pub fn same_stack(a: &ItemPayload, b: &ItemPayload) -> bool {
    if !same_kind(a, b) {
        return false;
    }
    a.resources.iter().all(|ra| {
        b.resource(&ra.name)
            .map(|rb| bucket(ra.fraction()) == bucket(rb.fraction()))
            .unwrap_or(false)
    })
}
