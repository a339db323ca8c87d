//! Segment-level message comparison

use era7_core::message::Message;

/// One changed field inside a changed segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    /// 1-based HL7 field number
    pub field: usize,
    pub left: String,
    pub right: String,
}

/// One entry of a message diff, at segment granularity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffEntry {
    /// Present in the right message only
    Added { segment_id: String, index: usize },
    /// Present in the left message only
    Removed { segment_id: String, index: usize },
    /// Same position and id, different field content
    FieldChanged {
        segment_id: String,
        index: usize,
        changes: Vec<FieldChange>,
    },
}

/// Compare two messages positionally
///
/// Segments are matched by index. A position held by the same id on
/// both sides compares field-by-field; a position where the ids differ
/// reports a removal plus an addition. Surplus trailing segments are
/// additions or removals.
pub fn diff(left: &Message, right: &Message) -> Vec<DiffEntry> {
    let mut entries = Vec::new();
    let common = left.segment_count().min(right.segment_count());

    for index in 0..common {
        let l = &left.segments()[index];
        let r = &right.segments()[index];

        if l.id() != r.id() {
            entries.push(DiffEntry::Removed {
                segment_id: l.id().to_string(),
                index,
            });
            entries.push(DiffEntry::Added {
                segment_id: r.id().to_string(),
                index,
            });
            continue;
        }

        let mut changes = Vec::new();
        let fields = l.field_count().max(r.field_count());
        for field_number in 1..=fields {
            let left_raw = l.field(field_number).raw();
            let right_raw = r.field(field_number).raw();
            if left_raw != right_raw {
                changes.push(FieldChange {
                    field: field_number,
                    left: left_raw.to_string(),
                    right: right_raw.to_string(),
                });
            }
        }
        if !changes.is_empty() {
            entries.push(DiffEntry::FieldChanged {
                segment_id: l.id().to_string(),
                index,
                changes,
            });
        }
    }

    for index in common..left.segment_count() {
        entries.push(DiffEntry::Removed {
            segment_id: left.segments()[index].id().to_string(),
            index,
        });
    }
    for index in common..right.segment_count() {
        entries.push(DiffEntry::Added {
            segment_id: right.segments()[index].id().to_string(),
            index,
        });
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use era7_parser::parse_message;

    const BASE: &str = "MSH|^~\\&|A|B|C|D|20240101||ADT^A01|M1|P|2.5\rPID|1||12345||Smith^John\rPV1|1|I";

    #[test]
    fn test_identical_messages() {
        let a = parse_message(BASE).unwrap();
        let b = parse_message(BASE).unwrap();
        assert!(diff(&a, &b).is_empty());
    }

    #[test]
    fn test_field_change() {
        let a = parse_message(BASE).unwrap();
        let b = parse_message(&BASE.replace("Smith^John", "Smith^Jane")).unwrap();

        let entries = diff(&a, &b);
        assert_eq!(entries.len(), 1);
        match &entries[0] {
            DiffEntry::FieldChanged {
                segment_id,
                index,
                changes,
            } => {
                assert_eq!(segment_id, "PID");
                assert_eq!(*index, 1);
                assert_eq!(changes.len(), 1);
                assert_eq!(changes[0].field, 5);
                assert_eq!(changes[0].left, "Smith^John");
                assert_eq!(changes[0].right, "Smith^Jane");
            }
            other => panic!("unexpected entry {:?}", other),
        }
    }

    #[test]
    fn test_added_segment() {
        let a = parse_message(BASE).unwrap();
        let b = parse_message(&format!("{}\rOBX|1|NM|WBC||7.5", BASE)).unwrap();

        let entries = diff(&a, &b);
        assert_eq!(
            entries,
            vec![DiffEntry::Added {
                segment_id: "OBX".to_string(),
                index: 3,
            }]
        );
    }

    #[test]
    fn test_removed_segment() {
        let a = parse_message(&format!("{}\rOBX|1|NM|WBC||7.5", BASE)).unwrap();
        let b = parse_message(BASE).unwrap();

        let entries = diff(&a, &b);
        assert_eq!(
            entries,
            vec![DiffEntry::Removed {
                segment_id: "OBX".to_string(),
                index: 3,
            }]
        );
    }

    #[test]
    fn test_id_mismatch_is_remove_plus_add() {
        let a = parse_message(BASE).unwrap();
        let b = parse_message(&BASE.replace("PV1|1|I", "NK1|1|Smith^Anne")).unwrap();

        let entries = diff(&a, &b);
        assert_eq!(entries.len(), 2);
        assert!(matches!(&entries[0], DiffEntry::Removed { segment_id, .. } if segment_id == "PV1"));
        assert!(matches!(&entries[1], DiffEntry::Added { segment_id, .. } if segment_id == "NK1"));
    }
}
