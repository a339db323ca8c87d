//! HL7 field, repetition, component, and subcomponent structures
//!
//! Leaves hold their raw on-wire (escaped) text; decoded values are
//! produced on demand through the [`EscapeCodec`]. A [`Field`] keeps
//! the raw text of the whole field and splits it into repetitions,
//! components, and subcomponents on first positional access, so lazily
//! parsed messages pay the split cost only for the fields a caller
//! actually touches. Out-of-range positional reads return a static
//! empty sentinel instead of an error, which lets callers probe
//! optional positions without existence checks.

use crate::delimiters::{Delimiters, STANDARD};
use crate::escape::EscapeCodec;
use crate::error::Result;
use once_cell::sync::OnceCell;

static EMPTY_SUBCOMPONENT: SubComponent = SubComponent { raw: String::new() };
static EMPTY_COMPONENT: Component = Component {
    subcomponents: Vec::new(),
};
static EMPTY_REPETITION: Repetition = Repetition {
    components: Vec::new(),
};
pub(crate) static EMPTY_FIELD: Field = Field {
    raw: String::new(),
    delimiters: STANDARD,
    reps: OnceCell::new(),
};

/// A subcomponent: the smallest unit of the hierarchy
///
/// Holds the raw escaped text exactly as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubComponent {
    raw: String,
}

impl SubComponent {
    /// Create from raw on-wire text
    pub fn from_raw<S: Into<String>>(raw: S) -> Self {
        Self { raw: raw.into() }
    }

    /// Create from decoded user text, escaping as needed
    pub fn from_value(value: &str, delimiters: &Delimiters) -> Self {
        Self {
            raw: EscapeCodec::new(*delimiters).encode(value),
        }
    }

    /// The raw (escaped) text
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The decoded text, with escape sequences resolved
    pub fn decoded(&self, delimiters: &Delimiters) -> Result<String> {
        EscapeCodec::new(*delimiters).decode(&self.raw)
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

/// A component: one or more subcomponents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    subcomponents: Vec<SubComponent>,
}

impl Component {
    /// Split raw component text on the subcomponent separator
    pub fn from_raw(raw: &str, delimiters: &Delimiters) -> Self {
        let subcomponents = if raw.is_empty() {
            vec![SubComponent::from_raw("")]
        } else {
            raw.split(delimiters.subcomponent_sep())
                .map(SubComponent::from_raw)
                .collect()
        };
        Self { subcomponents }
    }

    /// A component holding a single decoded value
    pub fn from_value(value: &str, delimiters: &Delimiters) -> Self {
        Self {
            subcomponents: vec![SubComponent::from_value(value, delimiters)],
        }
    }

    pub fn from_subcomponents(subcomponents: Vec<SubComponent>) -> Self {
        Self { subcomponents }
    }

    pub fn subcomponents(&self) -> &[SubComponent] {
        &self.subcomponents
    }

    /// Subcomponent by 0-based index; empty sentinel when out of range
    pub fn subcomponent(&self, index: usize) -> &SubComponent {
        self.subcomponents.get(index).unwrap_or(&EMPTY_SUBCOMPONENT)
    }

    pub fn subcomponent_count(&self) -> usize {
        self.subcomponents.len()
    }

    /// Raw text of the first subcomponent
    pub fn value(&self) -> &str {
        self.subcomponent(0).raw()
    }

    pub fn is_empty(&self) -> bool {
        self.subcomponents.iter().all(|s| s.is_empty())
    }

    /// Rejoin into raw component text
    pub fn encode(&self, delimiters: &Delimiters) -> String {
        let sep = delimiters.subcomponent_sep().to_string();
        self.subcomponents
            .iter()
            .map(|s| s.raw())
            .collect::<Vec<_>>()
            .join(&sep)
    }
}

/// One repetition of a field: one or more components
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repetition {
    components: Vec<Component>,
}

impl Repetition {
    /// Split raw repetition text on the component separator
    pub fn from_raw(raw: &str, delimiters: &Delimiters) -> Self {
        let components = if raw.is_empty() {
            vec![Component::from_raw("", delimiters)]
        } else {
            raw.split(delimiters.component_sep())
                .map(|c| Component::from_raw(c, delimiters))
                .collect()
        };
        Self { components }
    }

    /// A repetition holding a single decoded value
    pub fn from_value(value: &str, delimiters: &Delimiters) -> Self {
        Self {
            components: vec![Component::from_value(value, delimiters)],
        }
    }

    pub fn from_components(components: Vec<Component>) -> Self {
        Self { components }
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Component by 0-based index; empty sentinel when out of range
    pub fn component(&self, index: usize) -> &Component {
        self.components.get(index).unwrap_or(&EMPTY_COMPONENT)
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Raw text of the first subcomponent of the first component
    pub fn value(&self) -> &str {
        self.component(0).value()
    }

    pub fn is_empty(&self) -> bool {
        self.components.iter().all(|c| c.is_empty())
    }

    /// Rejoin into raw repetition text
    pub fn encode(&self, delimiters: &Delimiters) -> String {
        let sep = delimiters.component_sep().to_string();
        self.components
            .iter()
            .map(|c| c.encode(delimiters))
            .collect::<Vec<_>>()
            .join(&sep)
    }
}

/// A field: a non-empty ordered sequence of repetitions
///
/// The raw wire text is the source of truth; the repetition split is
/// computed at most once, on first access. Equality compares raw text.
#[derive(Debug, Clone)]
pub struct Field {
    raw: String,
    delimiters: Delimiters,
    reps: OnceCell<Vec<Repetition>>,
}

impl Field {
    /// Create from raw on-wire field text, deferring the split
    pub fn from_raw<S: Into<String>>(raw: S, delimiters: Delimiters) -> Self {
        Self {
            raw: raw.into(),
            delimiters,
            reps: OnceCell::new(),
        }
    }

    /// Create from raw text and split immediately
    pub fn from_raw_eager<S: Into<String>>(raw: S, delimiters: Delimiters) -> Self {
        let field = Self::from_raw(raw, delimiters);
        field.repetitions();
        field
    }

    /// Create from a single decoded value, escaping as needed
    pub fn from_value(value: &str, delimiters: Delimiters) -> Self {
        let raw = EscapeCodec::new(delimiters).encode(value);
        Self::from_raw(raw, delimiters)
    }

    /// Build from already-split repetitions, recomputing the raw text
    pub fn from_repetitions(repetitions: Vec<Repetition>, delimiters: Delimiters) -> Self {
        let sep = delimiters.repetition_sep().to_string();
        let raw = repetitions
            .iter()
            .map(|r| r.encode(&delimiters))
            .collect::<Vec<_>>()
            .join(&sep);
        let field = Self::from_raw(raw, delimiters);
        let _ = field.reps.set(repetitions);
        field
    }

    /// An empty field (one empty repetition after splitting)
    pub fn empty(delimiters: Delimiters) -> Self {
        Self::from_raw("", delimiters)
    }

    /// A field whose text is never split
    ///
    /// MSH-1 and MSH-2 carry delimiter characters literally; splitting
    /// them on those same characters would shred them. The atomic
    /// constructor pre-seeds the split with a single subcomponent
    /// holding the whole text.
    pub fn atomic<S: Into<String>>(raw: S, delimiters: Delimiters) -> Self {
        let raw = raw.into();
        let reps = vec![Repetition::from_components(vec![
            Component::from_subcomponents(vec![SubComponent::from_raw(raw.clone())]),
        ])];
        let field = Self::from_raw(raw, delimiters);
        let _ = field.reps.set(reps);
        field
    }

    /// The raw (escaped) wire text of the whole field
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    fn split(&self) -> Vec<Repetition> {
        if self.raw.is_empty() {
            vec![Repetition::from_raw("", &self.delimiters)]
        } else {
            self.raw
                .split(self.delimiters.repetition_sep())
                .map(|r| Repetition::from_raw(r, &self.delimiters))
                .collect()
        }
    }

    /// All repetitions, splitting on first call
    pub fn repetitions(&self) -> &[Repetition] {
        self.reps.get_or_init(|| self.split())
    }

    /// Repetition by 0-based index; empty sentinel when out of range
    pub fn repetition(&self, index: usize) -> &Repetition {
        self.repetitions().get(index).unwrap_or(&EMPTY_REPETITION)
    }

    pub fn repetition_count(&self) -> usize {
        self.repetitions().len()
    }

    /// Component of the primary repetition, 0-based
    pub fn component(&self, index: usize) -> &Component {
        self.repetition(0).component(index)
    }

    /// Subcomponent at a full path, all indices 0-based
    pub fn subcomponent(&self, rep: usize, comp: usize, sub: usize) -> &SubComponent {
        self.repetition(rep).component(comp).subcomponent(sub)
    }

    /// Raw text of the primary value (first rep, component, subcomponent)
    pub fn value(&self) -> &str {
        self.repetition(0).value()
    }

    /// Decoded text of the primary value
    pub fn decoded_value(&self) -> Result<String> {
        self.repetition(0).component(0).subcomponent(0).decoded(&self.delimiters)
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Whether the repetition split has happened yet
    pub fn is_split(&self) -> bool {
        self.reps.get().is_some()
    }
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Field {}

#[cfg(test)]
mod tests {
    use super::*;

    fn delims() -> Delimiters {
        Delimiters::STANDARD
    }

    #[test]
    fn test_subcomponent_raw_and_decoded() {
        let sc = SubComponent::from_raw("Smith\\F\\Jones");
        assert_eq!(sc.raw(), "Smith\\F\\Jones");
        assert_eq!(sc.decoded(&delims()).unwrap(), "Smith|Jones");
    }

    #[test]
    fn test_subcomponent_from_value_escapes() {
        let sc = SubComponent::from_value("A|B", &delims());
        assert_eq!(sc.raw(), "A\\F\\B");
    }

    #[test]
    fn test_component_split() {
        let comp = Component::from_raw("ID1&AssignAuth", &delims());
        assert_eq!(comp.subcomponent_count(), 2);
        assert_eq!(comp.subcomponent(0).raw(), "ID1");
        assert_eq!(comp.subcomponent(1).raw(), "AssignAuth");
    }

    #[test]
    fn test_empty_component_has_one_empty_subcomponent() {
        let comp = Component::from_raw("", &delims());
        assert_eq!(comp.subcomponent_count(), 1);
        assert!(comp.is_empty());
    }

    #[test]
    fn test_field_lazy_split() {
        let field = Field::from_raw("DOE^JOHN^A", delims());
        assert!(!field.is_split());
        assert_eq!(field.component(0).value(), "DOE");
        assert!(field.is_split());
        assert_eq!(field.component(1).value(), "JOHN");
        assert_eq!(field.component(2).value(), "A");
    }

    #[test]
    fn test_field_repetitions() {
        let field = Field::from_raw("Value1~Value2~Value3", delims());
        assert_eq!(field.repetition_count(), 3);
        assert_eq!(field.repetition(0).value(), "Value1");
        assert_eq!(field.repetition(2).value(), "Value3");
    }

    #[test]
    fn test_out_of_range_returns_empty_sentinel() {
        let field = Field::from_raw("A^B", delims());
        assert_eq!(field.repetition(5).value(), "");
        assert_eq!(field.component(9).value(), "");
        assert_eq!(field.subcomponent(3, 3, 3).raw(), "");
        // Repeated reads are idempotent
        assert_eq!(field.subcomponent(3, 3, 3).raw(), "");
    }

    #[test]
    fn test_field_subcomponent_path() {
        let field = Field::from_raw("ID1&Auth^ID2", delims());
        assert_eq!(field.subcomponent(0, 0, 1).raw(), "Auth");
        assert_eq!(field.subcomponent(0, 1, 0).raw(), "ID2");
    }

    #[test]
    fn test_empty_field() {
        let field = Field::empty(delims());
        assert!(field.is_empty());
        assert_eq!(field.repetition_count(), 1);
        assert_eq!(field.value(), "");
    }

    #[test]
    fn test_from_repetitions_roundtrip() {
        let reps = vec![
            Repetition::from_raw("A^B", &delims()),
            Repetition::from_raw("C", &delims()),
        ];
        let field = Field::from_repetitions(reps, delims());
        assert_eq!(field.raw(), "A^B~C");
    }

    #[test]
    fn test_from_value_escapes() {
        let field = Field::from_value("1+1=2|done", delims());
        assert_eq!(field.raw(), "1+1=2\\F\\done");
        assert_eq!(field.decoded_value().unwrap(), "1+1=2|done");
    }

    #[test]
    fn test_field_equality_is_raw_equality() {
        let a = Field::from_raw("X^Y", delims());
        let b = Field::from_raw("X^Y", delims());
        b.repetitions(); // one split, one not
        assert_eq!(a, b);
    }

    #[test]
    fn test_atomic_field_never_splits() {
        let field = Field::atomic("^~\\&", delims());
        assert_eq!(field.raw(), "^~\\&");
        assert_eq!(field.repetition_count(), 1);
        assert_eq!(field.value(), "^~\\&");
        assert_eq!(field.component(0).subcomponent_count(), 1);
    }

    #[test]
    fn test_custom_delimiter_split() {
        let d = Delimiters::new('#', '!', '@', '*', '%').unwrap();
        let field = Field::from_raw("A!B@C", d);
        assert_eq!(field.repetition_count(), 2);
        assert_eq!(field.repetition(0).component(1).value(), "B");
        assert_eq!(field.repetition(1).value(), "C");
    }
}
