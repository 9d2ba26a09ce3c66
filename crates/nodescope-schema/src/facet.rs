use std::fmt;

/// The two interpretations an envelope can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Facet {
    Runtime,
    State,
}

impl Facet {
    pub const ALL: [Facet; 2] = [Facet::Runtime, Facet::State];

    pub fn as_str(self) -> &'static str {
        match self {
            Facet::Runtime => "runtime",
            Facet::State => "state",
        }
    }

    /// File name a facet schema is loaded from.
    pub fn schema_file_name(self) -> &'static str {
        match self {
            Facet::Runtime => "runtime.schema.json",
            Facet::State => "state.schema.json",
        }
    }

    pub(crate) fn from_schema_file_name(file_name: &str) -> Option<Facet> {
        let lower = file_name.to_ascii_lowercase();
        Facet::ALL
            .into_iter()
            .find(|facet| facet.schema_file_name() == lower)
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_file_names() {
        assert_eq!(
            Facet::from_schema_file_name("runtime.schema.json"),
            Some(Facet::Runtime)
        );
        assert_eq!(
            Facet::from_schema_file_name("STATE.schema.json"),
            Some(Facet::State)
        );
        assert_eq!(Facet::from_schema_file_name("event.schema.json"), None);
    }
}
