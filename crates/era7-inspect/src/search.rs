//! Text search over the tree

use era7_core::diagnostics::Location;
use era7_core::message::Message;

/// Options for [`search`]
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub case_sensitive: bool,
    /// Match decoded leaf text instead of raw wire text
    pub search_decoded: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            search_decoded: false,
        }
    }
}

/// One place the needle was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub location: Location,
    /// The full leaf value containing the match
    pub value: String,
}

/// Find every leaf whose text contains `needle`
///
/// Case-insensitive by default. Hits come back in message order with
/// fully qualified locations (`PID-5-1`, `OBX[2]-5`, ...).
pub fn search(message: &Message, needle: &str, options: &SearchOptions) -> Vec<SearchHit> {
    let mut hits = Vec::new();
    if needle.is_empty() {
        return hits;
    }

    let folded_needle = if options.case_sensitive {
        needle.to_string()
    } else {
        needle.to_lowercase()
    };

    let mut occurrences: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();

    for segment in message.segments() {
        let occurrence = occurrences.entry(segment.id()).or_insert(0);
        *occurrence += 1;
        let occurrence = *occurrence;

        for (field_index, field) in segment.fields().iter().enumerate() {
            let field_number = field_index + 1;
            for repetition in field.repetitions() {
                for (comp_index, component) in repetition.components().iter().enumerate() {
                    for subcomponent in component.subcomponents() {
                        let raw = subcomponent.raw();
                        let value = if options.search_decoded {
                            subcomponent
                                .decoded(message.delimiters())
                                .unwrap_or_else(|_| raw.to_string())
                        } else {
                            raw.to_string()
                        };

                        let haystack = if options.case_sensitive {
                            value.clone()
                        } else {
                            value.to_lowercase()
                        };
                        if !haystack.contains(&folded_needle) {
                            continue;
                        }

                        let mut location = Location::field(segment.id(), field_number)
                            .with_occurrence(occurrence);
                        // Components and repetitions only qualify the
                        // path when the field actually splits.
                        if repetition.component_count() > 1 || field.repetition_count() > 1 {
                            location = location.with_component(comp_index + 1);
                        }
                        hits.push(SearchHit { location, value });
                    }
                }
            }
        }
    }

    hits
}
