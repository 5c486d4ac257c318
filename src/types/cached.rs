use serde::Serialize;

/// A lookup result tagged with whether it was served from cache.
///
/// Serializes flat: the value's own fields plus `"cached": bool`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cached<T> {
    #[serde(flatten)]
    pub value: T,
    pub cached: bool,
}

impl<T> Cached<T> {
    pub fn hit(value: T) -> Self {
        Self {
            value,
            cached: true,
        }
    }

    pub fn miss(value: T) -> Self {
        Self {
            value,
            cached: false,
        }
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}
