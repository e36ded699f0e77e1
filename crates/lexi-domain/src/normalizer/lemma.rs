//! Lemmatization seam: the normalizer never hard-codes a specific French
//! POS+lemma model, it depends on this trait so infrastructure/providers can
//! plug one in.

/// A French part-of-speech-aware lemmatizer.
///
/// Implementations may be backed by an embedded model, a remote service, or
/// (in tests and as the ultimate fallback) nothing at all.
pub trait Lemmatizer: Send + Sync {
    /// Return the lemma for `token`, or `None` if the model has no entry
    /// (the caller falls back to the surface form).
    fn lemmatize(&self, token: &str) -> Option<String>;
}

/// Always falls back to the surface form. Used when no lemma model is
/// configured, and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct SurfaceFallbackLemmatizer;

impl Lemmatizer for SurfaceFallbackLemmatizer {
    fn lemmatize(&self, _token: &str) -> Option<String> {
        None
    }
}
