/// Named map from item-name to a signed 32-bit value. Items may share a
/// value; both directions of the lookup are retained so that `name_of`
/// and direct name access both work.
#[derive(Debug)]
pub struct EnumSpec {
    pub name: String,
    /// Declaration order, preserved for `items()`/`values()` and for a
    /// deterministic `name_of` when several names share a value.
    items: Vec<(String, i32)>,
}

impl EnumSpec {
    pub fn new(name: impl Into<String>, items: Vec<(String, i32)>) -> Self {
        Self {
            name: name.into(),
            items,
        }
    }

    pub fn items(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|(n, _)| n.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = i32> + '_ {
        self.items.iter().map(|(_, v)| *v)
    }

    pub fn value_of(&self, name: &str) -> Option<i32> {
        self.items.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    /// Returns the first item name (in declaration order) carrying
    /// `value`, or `None` if no item has that value.
    pub fn name_of(&self, value: i32) -> Option<&str> {
        self.items
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(n, _)| n.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_implicit_and_explicit_values() {
        let spec = EnumSpec::new("Role", vec![("USER".into(), 1), ("ADMIN".into(), 2)]);
        assert_eq!(spec.value_of("USER"), Some(1));
        assert_eq!(spec.name_of(2), Some("ADMIN"));
    }

    #[test]
    fn first_declared_name_wins_on_shared_value() {
        let spec = EnumSpec::new(
            "Dup",
            vec![("A".into(), 1), ("B".into(), 1), ("C".into(), 2)],
        );
        assert_eq!(spec.name_of(1), Some("A"));
    }
}
