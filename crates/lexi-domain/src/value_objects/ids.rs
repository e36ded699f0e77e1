//! Strong-typed UUID identifiers for all domain entities.

/// Define a strong-typed UUID identifier for a domain entity.
///
/// Generates a newtype struct wrapping `uuid::Uuid` with `Display`,
/// `Serialize`/`Deserialize`, and a deterministic-from-name constructor
/// useful in tests and fixtures.
macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            derive_more::Display,
            derive_more::From,
            derive_more::Into,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[display("{_0}")]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Generate a new random UUID v4 identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Wrap an existing [`uuid::Uuid`].
            #[must_use]
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// The underlying [`uuid::Uuid`].
            #[must_use]
            pub fn as_uuid(&self) -> uuid::Uuid {
                self.0
            }

            /// Derive a deterministic v5 UUID from a human-readable name
            /// (used by tests and fixtures that need stable ids).
            #[must_use]
            pub fn from_name(name: &str) -> Self {
                let ns =
                    uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, stringify!($name).as_bytes());
                Self(uuid::Uuid::new_v5(&ns, name.as_bytes()))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Ok(Self(uuid::Uuid::parse_str(s)?))
            }
        }
    };
}

define_id!(JobId, "Strong typed identifier for a processing Job");
define_id!(ChunkId, "Strong typed identifier for a Chunk");
define_id!(HistoryId, "Strong typed identifier for a History entry");
define_id!(WordListId, "Strong typed identifier for a WordList");
define_id!(CoverageRunId, "Strong typed identifier for a CoverageRun");
define_id!(UserId, "Strong typed identifier for an owning user");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_name_is_deterministic_and_namespaced() {
        let a = JobId::from_name("alpha");
        let b = JobId::from_name("alpha");
        assert_eq!(a, b);

        let chunk = ChunkId::from_name("alpha");
        assert_ne!(a.as_uuid(), chunk.as_uuid());
    }

    #[test]
    fn roundtrips_through_display_and_from_str() {
        let id = JobId::new();
        let text = id.to_string();
        let parsed: JobId = text.parse().unwrap();
        assert_eq!(id, parsed);
    }
}
