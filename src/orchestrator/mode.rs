use std::fmt;

/// The orchestrator's two-valued recovery flag.
///
/// `Recovering` is set the moment an allow-listed trigger is confirmed and
/// guards the pause gate against re-firing while a sequence is in flight or
/// awaiting confirmation from a later status read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecoveryMode {
    #[default]
    Normal,
    Recovering,
}

impl RecoveryMode {
    pub fn is_recovering(&self) -> bool {
        matches!(self, Self::Recovering)
    }
}

impl fmt::Display for RecoveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Normal => "normal",
            Self::Recovering => "recovering",
        };
        write!(f, "{}", s)
    }
}
