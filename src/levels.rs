//! Eight-slot severity table with custom naming and validation.
//!
//! Slots left unfilled by custom input retain the built-in default name for
//! that index. All eight resulting names must be pairwise distinct
//! (case-sensitive), and none may shadow a method or field of the logger
//! they are installed onto.

use crate::errors::ConfigError;

/// Built-in severity names for indices 0-7. Lower indices are less severe.
pub const DEFAULT_LEVELS: [&str; 8] = [
    "debug", "info", "notice", "warning", "err", "crit", "alert", "emerg",
];

/// Number of severity slots in a table.
pub const LEVEL_COUNT: usize = 8;

/// One entry of a sequence-form custom level set.
#[derive(Clone, Debug, PartialEq)]
pub enum LevelSlot {
    /// A custom name; an empty string leaves the slot unfilled.
    Name(String),
    /// A finite number, stringified into the slot name.
    Number(f64),
    /// Explicitly unfilled; the default name is used.
    Empty,
}

impl From<&str> for LevelSlot {
    fn from(name: &str) -> Self {
        LevelSlot::Name(name.to_owned())
    }
}

impl From<String> for LevelSlot {
    fn from(name: String) -> Self {
        LevelSlot::Name(name)
    }
}

impl From<f64> for LevelSlot {
    fn from(value: f64) -> Self {
        LevelSlot::Number(value)
    }
}

impl From<i64> for LevelSlot {
    fn from(value: i64) -> Self {
        LevelSlot::Number(value as f64)
    }
}

/// Custom level input: either an ordered sequence of at most eight slots or
/// a name-to-index mapping.
#[derive(Clone, Debug)]
pub enum CustomLevels {
    /// Positional names; entries past index 7 are ignored.
    Seq(Vec<LevelSlot>),
    /// Name-to-index pairs; indices outside 0-7 are ignored.
    Map(Vec<(String, i64)>),
}

impl CustomLevels {
    /// Convenience constructor for the common all-names sequence form.
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CustomLevels::Seq(names.into_iter().map(|n| LevelSlot::Name(n.into())).collect())
    }
}

/// Either a level name or a numeric index used to address a table slot.
#[derive(Clone, Debug, PartialEq)]
pub enum LevelSpec {
    Name(String),
    Index(i64),
}

impl From<&str> for LevelSpec {
    fn from(value: &str) -> Self {
        LevelSpec::Name(value.to_owned())
    }
}

impl From<String> for LevelSpec {
    fn from(value: String) -> Self {
        LevelSpec::Name(value)
    }
}

impl From<usize> for LevelSpec {
    fn from(value: usize) -> Self {
        LevelSpec::Index(value as i64)
    }
}

impl From<u8> for LevelSpec {
    fn from(value: u8) -> Self {
        LevelSpec::Index(i64::from(value))
    }
}

impl From<i32> for LevelSpec {
    fn from(value: i32) -> Self {
        LevelSpec::Index(i64::from(value))
    }
}

/// Resolved severity table: exactly eight distinct names.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelTable {
    names: [String; LEVEL_COUNT],
}

impl LevelTable {
    /// Merge custom input over the built-in defaults.
    ///
    /// Sequence entries must be non-empty names or finite numbers; empty
    /// names and [`LevelSlot::Empty`] leave the default in place. Mapping
    /// entries with indices outside 0-7 are ignored. Fails when a slot name
    /// cannot be coerced or when two resulting names collide.
    pub fn normalize(custom: Option<CustomLevels>) -> Result<Self, ConfigError> {
        let mut slots: [Option<String>; LEVEL_COUNT] = Default::default();

        match custom {
            None => {}
            Some(CustomLevels::Map(pairs)) => {
                for (name, index) in pairs {
                    // An empty name leaves the slot unfilled, as in the
                    // sequence form.
                    if name.is_empty() {
                        continue;
                    }
                    if let Ok(index) = usize::try_from(index) {
                        if index < LEVEL_COUNT {
                            slots[index] = Some(name);
                        }
                    }
                }
            }
            Some(CustomLevels::Seq(entries)) => {
                for (index, entry) in entries.into_iter().take(LEVEL_COUNT).enumerate() {
                    slots[index] = match entry {
                        LevelSlot::Name(name) if name.is_empty() => None,
                        LevelSlot::Name(name) => Some(name),
                        LevelSlot::Number(n) if n.is_finite() => Some(n.to_string()),
                        LevelSlot::Number(n) => {
                            return Err(ConfigError::InvalidLevelName(n.to_string()))
                        }
                        LevelSlot::Empty => None,
                    };
                }
            }
        }

        let names: [String; LEVEL_COUNT] = std::array::from_fn(|index| {
            slots[index]
                .take()
                .unwrap_or_else(|| DEFAULT_LEVELS[index].to_owned())
        });

        for (index, name) in names.iter().enumerate() {
            if names[..index].contains(name) {
                return Err(ConfigError::DuplicateLevels);
            }
        }

        Ok(Self { names })
    }

    /// Reject level names that shadow a method or field of the host type.
    pub fn ensure_no_conflicts(&self, reserved: &[&str]) -> Result<(), ConfigError> {
        for name in &self.names {
            if reserved.contains(&name.as_str()) {
                return Err(ConfigError::LevelConflict(name.clone()));
            }
        }
        Ok(())
    }

    /// Resolve a name, an index, or a numeric string to its canonical index.
    pub fn number(&self, spec: &LevelSpec) -> Option<usize> {
        match spec {
            LevelSpec::Index(index) => in_range(*index),
            LevelSpec::Name(name) => match self.names.iter().position(|n| n == name) {
                Some(index) => Some(index),
                None => name.parse::<i64>().ok().and_then(in_range),
            },
        }
    }

    /// Name occupying the given slot.
    pub fn name(&self, index: usize) -> &str {
        &self.names[index]
    }

    /// All eight names, in slot order.
    pub fn names(&self) -> [String; LEVEL_COUNT] {
        self.names.clone()
    }
}

fn in_range(index: i64) -> Option<usize> {
    usize::try_from(index).ok().filter(|i| *i < LEVEL_COUNT)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;

    fn names_of(table: &LevelTable) -> Vec<String> {
        table.names().to_vec()
    }

    #[rstest]
    fn defaults_apply_without_custom_input() {
        let table = LevelTable::normalize(None).expect("defaults normalize");
        assert_eq!(names_of(&table), DEFAULT_LEVELS);

        let empty_seq = LevelTable::normalize(Some(CustomLevels::Seq(vec![]))).expect("empty seq");
        assert_eq!(names_of(&empty_seq), DEFAULT_LEVELS);

        let empty_map = LevelTable::normalize(Some(CustomLevels::Map(vec![]))).expect("empty map");
        assert_eq!(names_of(&empty_map), DEFAULT_LEVELS);
    }

    #[rstest]
    fn map_entries_with_invalid_indices_are_ignored() {
        let table = LevelTable::normalize(Some(CustomLevels::Map(vec![
            ("a".into(), 1),
            ("b".into(), 12),
            ("c".into(), -3),
        ])))
        .expect("normalize map");

        assert_eq!(table.name(0), DEFAULT_LEVELS[0]);
        assert_eq!(table.name(1), "a");
        assert_eq!(table.name(3), DEFAULT_LEVELS[3]);
    }

    #[rstest]
    fn map_entries_with_empty_names_leave_defaults() {
        let table = LevelTable::normalize(Some(CustomLevels::Map(vec![
            ("".into(), 2),
            ("named".into(), 4),
        ])))
        .expect("normalize map");

        assert_eq!(table.name(2), DEFAULT_LEVELS[2]);
        assert_eq!(table.name(4), "named");
    }

    #[rstest]
    fn sequence_fills_leading_slots_and_keeps_remaining_defaults() {
        let table = LevelTable::normalize(Some(CustomLevels::names(["tiny", "small"])))
            .expect("normalize seq");

        assert_eq!(table.name(0), "tiny");
        assert_eq!(table.name(1), "small");
        assert_eq!(table.name(2), DEFAULT_LEVELS[2]);
    }

    #[rstest]
    fn empty_slots_retain_defaults() {
        let table = LevelTable::normalize(Some(CustomLevels::Seq(vec![
            LevelSlot::Empty,
            LevelSlot::Name(String::new()),
            LevelSlot::from("third"),
        ])))
        .expect("normalize seq");

        assert_eq!(table.name(0), DEFAULT_LEVELS[0]);
        assert_eq!(table.name(1), DEFAULT_LEVELS[1]);
        assert_eq!(table.name(2), "third");
    }

    #[rstest]
    fn numeric_slots_are_stringified() {
        let table = LevelTable::normalize(Some(CustomLevels::Seq(vec![LevelSlot::from(230i64)])))
            .expect("normalize seq");
        assert_eq!(table.name(0), "230");
    }

    #[rstest]
    fn non_finite_numeric_slots_fail() {
        let err = LevelTable::normalize(Some(CustomLevels::Seq(vec![LevelSlot::from(f64::NAN)])))
            .expect_err("NaN slot must fail");
        assert!(matches!(err, ConfigError::InvalidLevelName(_)));
    }

    #[rstest]
    #[case::plain_strings(CustomLevels::names(["a", "b", "a"]))]
    #[case::coerced_number(CustomLevels::Seq(vec![LevelSlot::from("230"), LevelSlot::from(230i64)]))]
    #[case::collides_with_default(CustomLevels::Seq(vec![LevelSlot::from("info")]))]
    fn duplicate_names_fail(#[case] custom: CustomLevels) {
        let err = LevelTable::normalize(Some(custom)).expect_err("duplicates must fail");
        assert!(matches!(err, ConfigError::DuplicateLevels));
    }

    #[rstest]
    fn duplicate_check_is_case_sensitive() {
        let table =
            LevelTable::normalize(Some(CustomLevels::names(["A", "a"]))).expect("case sensitive");
        assert_eq!(table.name(0), "A");
        assert_eq!(table.name(1), "a");
    }

    #[rstest]
    fn conflicting_names_are_rejected() {
        let table = LevelTable::normalize(Some(CustomLevels::names(["end"]))).expect("normalize");
        let err = table
            .ensure_no_conflicts(&["log", "end"])
            .expect_err("reserved name must conflict");
        assert!(matches!(err, ConfigError::LevelConflict(name) if name == "end"));

        let ok = LevelTable::normalize(Some(CustomLevels::names(["fine"]))).expect("normalize");
        ok.ensure_no_conflicts(&["log", "end"])
            .expect("non-reserved name passes");
    }

    #[rstest]
    #[case::by_name(LevelSpec::from("warning"), Some(3))]
    #[case::by_index(LevelSpec::from(3usize), Some(3))]
    #[case::by_numeric_string(LevelSpec::from("3"), Some(3))]
    #[case::unknown_name(LevelSpec::from("nope"), None)]
    #[case::index_too_large(LevelSpec::from(8usize), None)]
    #[case::negative_index(LevelSpec::from(-1i32), None)]
    fn number_resolves_names_and_indices(
        #[case] spec: LevelSpec,
        #[case] expected: Option<usize>,
    ) {
        let table = LevelTable::normalize(None).expect("defaults");
        assert_eq!(table.number(&spec), expected);
    }

    proptest! {
        // Any subset of distinct custom names yields eight distinct names
        // with the unfilled slots equal to the built-in defaults.
        #[test]
        fn normalized_tables_have_eight_distinct_names(mask in proptest::array::uniform8(any::<bool>())) {
            let slots: Vec<LevelSlot> = mask
                .iter()
                .enumerate()
                .map(|(index, filled)| {
                    if *filled {
                        LevelSlot::Name(format!("custom_{index}"))
                    } else {
                        LevelSlot::Empty
                    }
                })
                .collect();

            let table = LevelTable::normalize(Some(CustomLevels::Seq(slots))).unwrap();
            let names = table.names();

            for (index, filled) in mask.iter().enumerate() {
                if *filled {
                    prop_assert_eq!(&names[index], &format!("custom_{}", index));
                } else {
                    prop_assert_eq!(&names[index], DEFAULT_LEVELS[index]);
                }
            }

            for (index, name) in names.iter().enumerate() {
                prop_assert!(!names[..index].contains(name));
            }
        }
    }
}
