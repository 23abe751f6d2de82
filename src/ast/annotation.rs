/// A `( k = "v", k2, … )` annotation block. Valueless annotations (`k2`
/// above) are taken as boolean true by whoever consumes them; the AST
/// itself just records the raw key/value pairs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Annotation {
    pub entries: Vec<(String, Option<String>)>,
}

impl Annotation {
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
