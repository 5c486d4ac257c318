use serde::Serialize;

/// The three kinds of lookup the service performs.
///
/// Each class has its own cache and worker pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationClass {
    Search,
    Audio,
    Video,
}

impl OperationClass {
    pub const ALL: [OperationClass; 3] = [
        OperationClass::Search,
        OperationClass::Audio,
        OperationClass::Video,
    ];

    /// Stable name used as key prefix, log field and metric label.
    pub fn as_str(self) -> &'static str {
        match self {
            OperationClass::Search => "search",
            OperationClass::Audio => "audio",
            OperationClass::Video => "video",
        }
    }
}

impl std::fmt::Display for OperationClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
