use serde::{Deserialize, Serialize};

/// Two-state flag persisted as the literal strings `"True"` and `"False"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flag {
    /// Option enabled.
    True,
    /// Option disabled.
    False,
}

impl Flag {
    /// Returns `true` when the flag is set.
    pub fn is_set(self) -> bool {
        matches!(self, Flag::True)
    }
}

impl From<bool> for Flag {
    fn from(value: bool) -> Self {
        if value {
            Flag::True
        } else {
            Flag::False
        }
    }
}

/// What the user supplies to drive the annealing volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ComputeOption {
    /// A fixed sample volume goes into annealing.
    #[default]
    Volume,
    /// The annealing volume is solved from a requested cell count.
    Cells,
    /// The annealing volume covers up to four titration points.
    Titration,
}

/// Preparation scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PreparationProtocol {
    /// Small scale preparation.
    #[default]
    Small,
    /// Large scale preparation, always followed by long-term storage.
    Large,
}

/// Legacy binding computation selector, carried through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BindingComputation {
    /// Binding driven by volume.
    #[default]
    Volume,
    /// Binding driven by cell count.
    Cells,
}

/// Collection protocol used when magnetic beads are disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CollectionProtocol {
    /// Standard collection.
    #[default]
    Standard,
    /// Strobe collection.
    Strobe,
}

/// Protocol family used as part of the bucket key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProtocolType {
    /// Standard diffusion loading.
    Standard,
    /// Strobe loading.
    Strobe,
    /// Magnetic bead loading.
    MagBead,
}

impl ProtocolType {
    /// Resolves the effective protocol type: bead mode overrides the
    /// collection protocol.
    pub fn effective(mag_bead: bool, collection: CollectionProtocol) -> Self {
        if mag_bead {
            return ProtocolType::MagBead;
        }
        match collection {
            CollectionProtocol::Standard => ProtocolType::Standard,
            CollectionProtocol::Strobe => ProtocolType::Strobe,
        }
    }

    /// Returns the catalog spelling of the protocol type.
    pub fn as_str(self) -> &'static str {
        match self {
            ProtocolType::Standard => "Standard",
            ProtocolType::Strobe => "Strobe",
            ProtocolType::MagBead => "MagBead",
        }
    }
}

/// Selects between a catalog default and a user supplied value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Choice {
    /// Use the value derived from the bucket.
    #[default]
    Default,
    /// Use the accompanying custom input.
    Custom,
}

/// How much annealed sample goes into binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BindingPolymeraseOption {
    /// Bind the whole annealing reaction.
    #[default]
    Volume,
    /// Bind only what the requested cells need.
    Cells,
}

/// Selects the behaviour variant of the engine.
///
/// `Reference` reproduces the fixtures of the reference tool: every
/// sub-calculation runs, volumes below 10 keep two decimals and the legacy
/// bead insert size rules apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    /// Behaviour shipped to users.
    #[default]
    Production,
    /// Behaviour matching the reference tool's test fixtures.
    Reference,
}

impl RunMode {
    /// Returns `true` for the reference variant.
    pub fn is_reference(self) -> bool {
        matches!(self, RunMode::Reference)
    }
}
