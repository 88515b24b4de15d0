// src/grouping.rs
//! Folds raw CT records into one group per issued certificate

use crate::identity::resolve_key;
use crate::labeler::label_entries;
use crate::time::parse_timestamp;
use crate::types::{CertificateGroup, RawRecord, SourceShape};
use std::collections::HashMap;
use tracing::debug;

/// Group records by identity key and label each group's members
///
/// Groups come out in first-seen order. The record that opens a group is its
/// representative: the group's name, issuer and validity dates are copied from
/// it. Records with no usable key each get a group of their own.
pub fn group_records(shape: SourceShape, records: Vec<RawRecord>) -> Vec<CertificateGroup> {
    let total = records.len();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut pending: Vec<(CertificateGroup, Vec<RawRecord>)> = Vec::new();
    let mut unkeyed = 0usize;

    for record in records {
        let key = match resolve_key(shape, &record) {
            Some(key) => key,
            None => {
                unkeyed += 1;
                format!("unkeyed:{}", unkeyed)
            }
        };

        if let Some(&pos) = index.get(&key) {
            let (group, members) = &mut pending[pos];
            merge_names(&mut group.dns_names, &record.dns_names);
            members.push(record);
        } else {
            index.insert(key.clone(), pending.len());
            pending.push((open_group(key, &record), vec![record]));
        }
    }

    if unkeyed > 0 {
        debug!("{} records had no identity key and were not deduplicated", unkeyed);
    }

    let groups: Vec<CertificateGroup> = pending
        .into_iter()
        .map(|(mut group, members)| {
            group.entries = label_entries(members);
            group
        })
        .collect();

    debug!(
        "Grouped {} {} records into {} certificates",
        total,
        shape,
        groups.len()
    );

    groups
}

fn open_group(key: String, representative: &RawRecord) -> CertificateGroup {
    let mut dns_names = Vec::new();
    merge_names(&mut dns_names, &representative.dns_names);

    CertificateGroup {
        key,
        common_name: representative.common_name.clone(),
        serial_number: representative.serial_number.clone(),
        issuer: representative.issuer.clone(),
        dns_names,
        not_before: representative.not_before.clone(),
        not_after: representative.not_after.clone(),
        not_before_time: representative.not_before.as_deref().and_then(parse_timestamp),
        not_after_time: representative.not_after.as_deref().and_then(parse_timestamp),
        entries: Vec::new(),
    }
}

fn merge_names(into: &mut Vec<String>, names: &[String]) {
    for name in names {
        if !into.contains(name) {
            into.push(name.clone());
        }
    }
}
