//! Keyed upsert store for enriched business records.
//!
//! The orchestrator forwards records here when a request's persistence
//! flag is set; failures are logged at the call site and never fail the
//! owning task. [`MemoryStore`] is the in-process implementation; a
//! database-backed store implements the same trait.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Business;

/// A persistent store keyed by record identity.
#[async_trait]
pub trait UpsertStore: Send + Sync {
    /// Insert the record, or merge it into an existing record with the
    /// same id.
    async fn upsert(&self, record: &Business) -> Result<()>;
}

/// In-memory [`UpsertStore`] with field-merge semantics.
///
/// Non-empty incoming fields overwrite stored ones. Email and website are
/// special-cased: an incoming value only replaces a different stored value
/// when it is longer (the longer value has historically been the more
/// complete one).
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, Business>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().expect("store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Owned copy of the stored record with the given id, if any.
    pub fn get(&self, id: &str) -> Option<Business> {
        self.records
            .lock()
            .expect("store lock poisoned")
            .get(id)
            .cloned()
    }
}

#[async_trait]
impl UpsertStore for MemoryStore {
    async fn upsert(&self, record: &Business) -> Result<()> {
        let mut records = self.records.lock().expect("store lock poisoned");
        match records.get_mut(&record.id) {
            Some(existing) => {
                tracing::debug!(id = %record.id, "merging into existing record");
                merge_into(existing, record);
            }
            None => {
                records.insert(record.id.clone(), record.clone());
            }
        }
        Ok(())
    }
}

/// Merge an incoming record into a stored one.
fn merge_into(existing: &mut Business, incoming: &Business) {
    overwrite_if_present(&mut existing.business_name, &incoming.business_name);
    overwrite_if_present(&mut existing.real_category, &incoming.real_category);
    overwrite_if_present(&mut existing.category, &incoming.category);
    overwrite_if_present(&mut existing.address, &incoming.address);
    overwrite_if_present(&mut existing.city, &incoming.city);
    overwrite_if_present(&mut existing.state, &incoming.state);
    overwrite_if_present(&mut existing.postal_code, &incoming.postal_code);
    overwrite_if_present(&mut existing.country, &incoming.country);
    overwrite_if_present(&mut existing.phone, &incoming.phone);
    overwrite_if_present(&mut existing.maps_link, &incoming.maps_link);

    merge_longest(&mut existing.email, &incoming.email);
    merge_longest(&mut existing.website, &incoming.website);

    if incoming.latitude.is_some() {
        existing.latitude = incoming.latitude;
    }
    if incoming.longitude.is_some() {
        existing.longitude = incoming.longitude;
    }
    if incoming
        .details_link
        .as_deref()
        .is_some_and(|l| !l.is_empty())
    {
        existing.details_link = incoming.details_link.clone();
    }
}

fn overwrite_if_present(existing: &mut String, incoming: &str) {
    if !incoming.is_empty() {
        *existing = incoming.to_owned();
    }
}

/// Longest-string-wins update for email/website: a non-empty incoming
/// value is taken when nothing is stored, or when it differs and is
/// strictly longer than the stored value.
fn merge_longest(existing: &mut Option<String>, incoming: &Option<String>) {
    let Some(new) = incoming.as_deref().filter(|v| !v.is_empty()) else {
        return;
    };
    match existing.as_deref() {
        None | Some("") => *existing = Some(new.to_owned()),
        Some(old) if new != old && new.len() > old.len() => *existing = Some(new.to_owned()),
        Some(_) => {}
    }
}
