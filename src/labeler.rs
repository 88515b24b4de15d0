// src/labeler.rs
//! Pre-certificate / leaf labeling within one certificate group

use crate::types::{EntryLabel, LabeledEntry, RawRecord};

/// Label the members of one group, earliest logged first
///
/// Members are stably sorted by sequence token (records without a token go
/// last, in their original order). An explicit pre-certificate signal from the
/// source always wins. Without one, the earliest member of a multi-member group
/// is the pre-certificate and every other member is a leaf; a lone member is
/// labeled a leaf since a single observation cannot tell the two apart.
pub fn label_entries(mut members: Vec<RawRecord>) -> Vec<LabeledEntry> {
    members.sort_by_key(|r| (r.sequence.is_none(), r.sequence));

    let single = members.len() == 1;

    members
        .into_iter()
        .enumerate()
        .map(|(i, record)| {
            let label = match record.precert {
                Some(true) => EntryLabel::Precertificate,
                Some(false) => EntryLabel::LeafCertificate,
                None if !single && i == 0 => EntryLabel::Precertificate,
                None => EntryLabel::LeafCertificate,
            };
            LabeledEntry { label, record }
        })
        .collect()
}
