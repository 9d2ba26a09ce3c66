use std::fmt;

use crate::message::DecodedMessage;

/// Where an aggregate's data came from. Bookkeeping only, never on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// A capture file uploaded by the user.
    Upload,
    /// A bundled or fetched sample capture.
    Sample,
    /// A live feed pushed by a running node.
    Live,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Upload => "upload",
            SourceKind::Sample => "sample",
            SourceKind::Live => "live",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Out-of-band `{type, name}` tag attached to decoded states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    pub kind: SourceKind,
    pub name: String,
}

impl Provenance {
    pub fn new(kind: SourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// Accumulated decode result.
///
/// `states` keeps stream order. `runtime` holds the most recent runtime message;
/// a later one replaces the earlier one outright.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate<R, S> {
    pub states: Vec<S>,
    pub runtime: Option<R>,
    pub provenance: Option<Provenance>,
}

impl<R, S> Default for Aggregate<R, S> {
    fn default() -> Self {
        Self {
            states: Vec::new(),
            runtime: None,
            provenance: None,
        }
    }
}

impl<R, S> Aggregate<R, S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one decoded message into the aggregate.
    pub fn absorb<M>(&mut self, message: M)
    where
        M: DecodedMessage<Runtime = R, State = S>,
    {
        let (runtime, state) = message.into_facets();
        if let Some(state) = state {
            self.states.push(state);
        }
        if let Some(runtime) = runtime {
            self.runtime = Some(runtime);
        }
    }

    /// Append a later aggregate (for example a per-chunk delta) onto this one.
    ///
    /// Keeps this aggregate's provenance unless it has none.
    pub fn merge(&mut self, later: Aggregate<R, S>) {
        self.states.extend(later.states);
        if later.runtime.is_some() {
            self.runtime = later.runtime;
        }
        if self.provenance.is_none() {
            self.provenance = later.provenance;
        }
    }

    pub fn set_provenance(&mut self, provenance: Provenance) {
        self.provenance = Some(provenance);
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.set_provenance(provenance);
        self
    }

    /// True when neither a state nor a runtime message has been absorbed.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty() && self.runtime.is_none()
    }
}
