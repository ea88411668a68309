//! Grouping VEVENT blocks into recurrence series.
//!
//! Two passes: the first buckets blocks by UID and sorts each into master or
//! exception; the second resolves every bucket on its own. Document order only
//! matters between blocks that collide (two masters, or two exceptions for the
//! same RECURRENCE-ID), where the later block wins.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::document::{CalendarDocument, EventBlock};

/// A master block plus the exceptions that override its instances.
#[derive(Debug, Clone)]
pub struct EventSeries<'a> {
    pub uid: String,
    pub master: &'a EventBlock,
    /// Keyed by the absolute instant of the RECURRENCE-ID each one replaces.
    pub exceptions: BTreeMap<DateTime<Utc>, &'a EventBlock>,
}

impl<'a> EventSeries<'a> {
    pub fn exception_for(&self, original_start: DateTime<Utc>) -> Option<&'a EventBlock> {
        self.exceptions.get(&original_start).copied()
    }
}

#[derive(Default)]
struct Bucket<'a> {
    masters: Vec<&'a EventBlock>,
    exceptions: Vec<&'a EventBlock>,
}

/// Group a document's blocks into series.
///
/// Blocks without a UID each form their own series. Buckets with no master are
/// discarded: an exception has no meaning without the rule it overrides.
/// `zone` resolves floating RECURRENCE-ID values.
pub fn group_series<'a>(document: &'a CalendarDocument, zone: &Tz) -> Vec<EventSeries<'a>> {
    let mut order: Vec<String> = Vec::new();
    let mut buckets: HashMap<String, Bucket<'a>> = HashMap::new();

    for (index, block) in document.events().iter().enumerate() {
        let key = match &block.uid {
            Some(uid) => uid.clone(),
            None => format!("#{}", index),
        };
        let bucket = buckets.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Bucket::default()
        });
        if block.is_exception() {
            bucket.exceptions.push(block);
        } else {
            bucket.masters.push(block);
        }
    }

    order
        .into_iter()
        .filter_map(|uid| {
            let bucket = buckets.remove(&uid)?;
            resolve_bucket(uid, bucket, zone)
        })
        .collect()
}

fn resolve_bucket<'a>(uid: String, bucket: Bucket<'a>, zone: &Tz) -> Option<EventSeries<'a>> {
    let Some(master) = bucket.masters.last().copied() else {
        debug!(uid = %uid, exceptions = bucket.exceptions.len(), "discarding series without master");
        return None;
    };

    let mut exceptions = BTreeMap::new();
    for exception in bucket.exceptions {
        let original = exception
            .recurrence_id
            .as_ref()
            .and_then(|rid| rid.resolve(zone));
        match original {
            Some(original) => {
                exceptions.insert(original.with_timezone(&Utc), exception);
            }
            None => debug!(uid = %uid, "ignoring exception with unresolvable RECURRENCE-ID"),
        }
    }

    Some(EventSeries {
        uid,
        master,
        exceptions,
    })
}
