//! Coverage Service: persistence and progress orchestration around the
//! pure Coverage Engine algorithms (C8, spec.md §4.8).

use std::sync::Arc;

use lexi_domain::entities::{
    ChunkState, CoverageAssignment, CoverageConfig, CoverageMode, CoverageRun, CoverageSourceType, JobState,
};
use lexi_domain::error::{Error, Result};
use lexi_domain::normalizer::{Lemmatizer, NormalizerConfig, SurfaceFallbackLemmatizer};
use lexi_domain::ports::repositories::{
    ChunkRepository, CoverageRepository, HistoryRepository, JobRepository, WordListRepository,
};
use lexi_domain::value_objects::CoverageRunId;

use crate::merge::merge_chunks_default;
use crate::use_cases::coverage_engine::{run_coverage_mode, run_filter_mode};

/// Orchestrates CoverageRuns: loads source sentences, invokes the pure
/// engine, and persists assignments and stats.
pub struct CoverageService {
    coverage_repo: Arc<dyn CoverageRepository>,
    word_list_repo: Arc<dyn WordListRepository>,
    job_repo: Arc<dyn JobRepository>,
    chunk_repo: Arc<dyn ChunkRepository>,
    history_repo: Arc<dyn HistoryRepository>,
}

impl CoverageService {
    /// Build a new CoverageService from its collaborators.
    #[must_use]
    pub fn new(
        coverage_repo: Arc<dyn CoverageRepository>,
        word_list_repo: Arc<dyn WordListRepository>,
        job_repo: Arc<dyn JobRepository>,
        chunk_repo: Arc<dyn ChunkRepository>,
        history_repo: Arc<dyn HistoryRepository>,
    ) -> Self {
        Self {
            coverage_repo,
            word_list_repo,
            job_repo,
            chunk_repo,
            history_repo,
        }
    }

    async fn load_sentences(&self, run: &CoverageRun) -> Result<Vec<String>> {
        match run.source_type {
            CoverageSourceType::Job => {
                let job_id = lexi_domain::value_objects::JobId::from_uuid(run.source_id);
                let mut chunks = self.chunk_repo.list_by_job(job_id).await?;
                chunks.sort_by_key(|c| c.chunk_index);
                if !chunks.iter().any(|c| c.state == ChunkState::Success) {
                    return Err(Error::invalid_argument("job has no successful chunks to cover"));
                }
                Ok(merge_chunks_default(&chunks))
            }
            CoverageSourceType::History => {
                let history_id = lexi_domain::value_objects::HistoryId::from_uuid(run.source_id);
                let history = self.history_repo.get(history_id).await?;
                Ok(history.sentences.into_iter().map(|s| s.normalized).collect())
            }
        }
    }

    /// Execute a CoverageRun to completion (called by the task dispatcher's
    /// worker path via [`crate::task_executor::CompositeExecutor`]).
    pub async fn run(&self, run_id: CoverageRunId) -> Result<()> {
        let mut run = self.coverage_repo.get_run(run_id).await?;
        if run.state != lexi_domain::entities::JobState::Pending {
            return Err(Error::invalid_transition("coverage run already started"));
        }
        run.begin(None);
        self.coverage_repo.update_run(&run).await?;

        let word_list = self.word_list_repo.get(run.word_list_id).await?;
        let sentences = match self.load_sentences(&run).await {
            Ok(s) => s,
            Err(err) => {
                run.fail();
                self.coverage_repo.update_run(&run).await?;
                return Err(err);
            }
        };

        let normalizer_config = NormalizerConfig {
            fold_diacritics: true,
            mode: word_list.matching_mode,
        };
        let lemmatizer: Box<dyn Lemmatizer> = Box::new(SurfaceFallbackLemmatizer);

        let (assignments, stats) = match (&run.mode, &run.config) {
            (CoverageMode::Coverage, CoverageConfig::Coverage(cfg)) => run_coverage_mode(
                &sentences,
                &word_list.word_keys,
                cfg,
                false,
                &normalizer_config,
                lemmatizer.as_ref(),
            ),
            (CoverageMode::Filter, CoverageConfig::Filter(cfg)) => {
                run_filter_mode(&sentences, &word_list.word_keys, cfg, &normalizer_config, lemmatizer.as_ref())
            }
            _ => {
                run.fail();
                self.coverage_repo.update_run(&run).await?;
                return Err(Error::invalid_argument("coverage run mode and config do not match"));
            }
        };

        self.coverage_repo.replace_assignments(run_id, &assignments).await?;
        run.complete(stats);
        self.coverage_repo.update_run(&run).await?;
        Ok(())
    }

    /// `swap`: coverage-mode only, reassign one word key to a different
    /// selected sentence (spec.md §6 `/coverage/runs/{id}/swap`).
    pub async fn swap(&self, run_id: CoverageRunId, word_key: &str, new_sentence_index: u32, new_sentence_text: String) -> Result<()> {
        let run = self.coverage_repo.get_run(run_id).await?;
        if run.mode != CoverageMode::Coverage {
            return Err(Error::invalid_argument("swap is only valid for coverage-mode runs"));
        }
        if run.state != JobState::Completed {
            return Err(Error::invalid_transition("coverage run is not complete"));
        }

        let mut assignments = self.coverage_repo.list_assignments(run_id, 0, u32::MAX).await?;
        let mut found = false;
        for a in &mut assignments {
            if let CoverageAssignment::Coverage { word_key: wk, sentence_index, sentence_text, conflicts, .. } = a {
                if wk == word_key {
                    *sentence_index = new_sentence_index;
                    *sentence_text = new_sentence_text.clone();
                    conflicts.clear();
                    found = true;
                }
            }
        }
        if !found {
            return Err(Error::not_found(format!("word key '{word_key}' in run {run_id}")));
        }
        self.coverage_repo.replace_assignments(run_id, &assignments).await?;
        Ok(())
    }
}

