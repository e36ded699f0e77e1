use lexi_domain::entities::{Chunk, ChunkPayload, Job, JobState};
use lexi_domain::normalizer::{normalize_word, NormalizerConfig, SurfaceFallbackLemmatizer};
use lexi_domain::value_objects::{ProcessingSettings, UserId};

#[test]
fn job_and_chunk_lifecycles_compose() {
    let mut job = Job::new(UserId::new(), "roman.pdf", ProcessingSettings::default());
    let chunk = Chunk::new_pending(
        job.id,
        0,
        1,
        30,
        false,
        ChunkPayload::Inline("YWJj".to_owned()),
        2048,
    );

    job.begin_processing(1, Some("group-1".to_owned())).unwrap();
    assert_eq!(job.state, JobState::Processing);
    assert_eq!(chunk.job_id, job.id);
}

#[test]
fn normalizer_is_reachable_from_the_crate_root() {
    let outcomes = normalize_word(
        "1. L'Arbre",
        &NormalizerConfig::default(),
        &SurfaceFallbackLemmatizer,
    );
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].key, "arbre");
}
