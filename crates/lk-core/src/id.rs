use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::model::ElementKind;

/// Global interner for element ids. Ids are compared on every pointer move,
/// so they are kept as 4-byte keys instead of strings.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Opaque, unique identifier of a canvas element.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(Spur);

impl ElementId {
    /// Intern a string as an element id, reusing the existing key if present.
    pub fn intern(s: &str) -> Self {
        ElementId(INTERNER.get_or_intern(s))
    }

    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Mint a fresh id named after the element kind, e.g. `rectangle_3`.
    /// Names already interned by loaded documents are skipped.
    pub fn mint(kind: ElementKind) -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        loop {
            let n = COUNTER.fetch_add(1, Ordering::Relaxed);
            let name = format!("{}_{n}", kind.as_str());
            if !INTERNER.contains(&name) {
                return Self::intern(&name);
            }
        }
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ElementId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ElementId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.is_empty() {
            return Err(serde::de::Error::custom("element id must not be empty"));
        }
        Ok(ElementId::intern(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = ElementId::intern("hero_image");
        let b = ElementId::intern("hero_image");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "hero_image");
    }

    #[test]
    fn minted_ids_carry_kind_and_never_collide() {
        let a = ElementId::mint(ElementKind::Frame);
        let b = ElementId::mint(ElementKind::Frame);
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("frame_"));

        // Pre-claim the next few names; minting must step past them.
        let taken: Vec<_> = (0..64).map(|n| ElementId::intern(&format!("star_{n}"))).collect();
        let fresh = ElementId::mint(ElementKind::Star);
        assert!(!taken.contains(&fresh));
    }

    #[test]
    fn empty_id_is_rejected() {
        assert!(serde_json::from_str::<ElementId>("\"\"").is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = ElementId::intern("logo");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"logo\"");
        let back: ElementId = serde_json::from_str("\"logo\"").unwrap();
        assert_eq!(back, id);
    }
}
