//! Knowledge source orchestration.
//!
//! One chat request flows through here: query the pre-built index, filter for
//! relevance, fall back to a live crawl of the configured seed sites when the
//! index yields nothing, then compose the prompt and generate the answer.
//! Indexed retrieval is cheap and always tried first; crawling takes seconds
//! to minutes and runs only when the index comes up empty.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use url::Url;

use crate::core::config::AppConfig;
use crate::core::errors::ApiError;
use crate::llm::provider::GenerationProvider;
use crate::web::crawler::SiteCrawler;
use crate::web::extractor::ContentExtractor;
use crate::web::renderer::PageRenderer;

use super::chunker::{ChunkError, Chunker, PassageChunk, SourceKind};
use super::index::VectorIndex;
use super::prompt::{
    answer_prompt, combine_documents, condense_question_prompt, serialize_transcript,
    ConversationTurn,
};
use super::relevance::filter_relevant;

/// Response cap on returned source passages.
const MAX_SOURCE_DOCUMENTS: usize = 5;

#[derive(Debug)]
pub struct AnswerOutcome {
    pub text: String,
    pub sources: Vec<PassageChunk>,
}

struct CachedCrawl {
    fetched_at: Instant,
    chunks: Vec<PassageChunk>,
}

pub struct KnowledgePipeline {
    config: Arc<AppConfig>,
    index: Arc<dyn VectorIndex>,
    llm: Arc<dyn GenerationProvider>,
    renderer: Arc<dyn PageRenderer>,
    chunker: Chunker,
    extractor: ContentExtractor,
    seeds: Vec<Url>,
    /// Pre-filter fallback chunks per seed; each question runs its own
    /// relevance pass against the cached pages.
    crawl_cache: Mutex<HashMap<String, CachedCrawl>>,
}

impl KnowledgePipeline {
    pub fn new(
        config: Arc<AppConfig>,
        index: Arc<dyn VectorIndex>,
        llm: Arc<dyn GenerationProvider>,
        renderer: Arc<dyn PageRenderer>,
    ) -> Result<Self, ChunkError> {
        let chunker = Chunker::new(&config.chunking)?;
        let extractor = ContentExtractor::new(&config.extraction);
        // seeds were validated at startup; unparseable entries cannot reach here
        let seeds = config
            .crawl
            .seeds
            .iter()
            .filter_map(|s| Url::parse(s).ok())
            .collect();
        Ok(Self {
            config,
            index,
            llm,
            renderer,
            chunker,
            extractor,
            seeds,
            crawl_cache: Mutex::new(HashMap::new()),
        })
    }

    /// Answers one question. Any stage failure surfaces as a request-level
    /// error; partial results are never returned.
    pub async fn answer(
        &self,
        question: &str,
        history: &[ConversationTurn],
    ) -> Result<AnswerOutcome, ApiError> {
        let question = sanitize_question(question);

        let hits = self.index.search(&question).await?;
        tracing::debug!(hits = hits.len(), "index query returned");

        let indexed: Vec<PassageChunk> = hits
            .into_iter()
            .map(|p| PassageChunk {
                content: p.content,
                source: p.source,
                chunk_index: p.chunk_index,
                kind: SourceKind::Document,
            })
            .collect();

        let mut relevant = filter_relevant(&question, indexed, &self.config.relevance);

        if relevant.is_empty() {
            tracing::info!("index yielded no relevant passages, falling back to live crawl");
            let fallback = self.fallback_chunks().await;
            relevant = filter_relevant(&question, fallback, &self.config.relevance);
        }

        let standalone = self.standalone_question(&question, history).await?;
        let context = combine_documents(&relevant);
        let prompt = answer_prompt(&context, &standalone);
        tracing::debug!(
            context_chars = context.chars().count(),
            prompt_chars = prompt.chars().count(),
            "composing answer"
        );

        let text = self.llm.generate(&prompt).await?;

        relevant.truncate(MAX_SOURCE_DOCUMENTS);
        Ok(AnswerOutcome {
            text,
            sources: relevant,
        })
    }

    /// Rewrites a follow-up into a standalone question when history is
    /// present. Falls back to the original question if the rewrite comes
    /// back empty.
    async fn standalone_question(
        &self,
        question: &str,
        history: &[ConversationTurn],
    ) -> Result<String, ApiError> {
        if history.is_empty() || !self.config.llm.condense_questions {
            return Ok(question.to_string());
        }

        let transcript = serialize_transcript(history);
        let prompt = condense_question_prompt(&transcript, question);
        let rewritten = self.llm.generate(&prompt).await?;
        let rewritten = rewritten.trim();
        if rewritten.is_empty() {
            return Ok(question.to_string());
        }
        Ok(rewritten.to_string())
    }

    /// Crawls every configured seed and chunks the extracted pages, serving
    /// from the per-seed cache while it is fresh.
    async fn fallback_chunks(&self) -> Vec<PassageChunk> {
        let mut pooled = Vec::new();
        for seed in &self.seeds {
            if let Some(cached) = self.cached_chunks(seed).await {
                pooled.extend(cached);
                continue;
            }
            let chunks = self.crawl_seed(seed).await;
            self.store_in_cache(seed, &chunks).await;
            pooled.extend(chunks);
        }
        pooled
    }

    async fn crawl_seed(&self, seed: &Url) -> Vec<PassageChunk> {
        let crawler = SiteCrawler::new(Arc::clone(&self.renderer));
        let urls = crawler.crawl(seed, self.config.crawl.page_budget).await;
        tracing::info!(seed = %seed, pages = urls.len(), "crawl finished");

        let mut chunks = Vec::new();
        for url in urls {
            match self.renderer.render(&url).await {
                Ok(page) => {
                    let text = self.extractor.extract_text(&page.html);
                    chunks.extend(
                        self.chunker
                            .chunk(&text, url.as_str(), SourceKind::Web),
                    );
                }
                Err(err) => {
                    tracing::warn!(%url, error = %err, "extraction failed, skipping page");
                }
            }
        }
        chunks
    }

    async fn cached_chunks(&self, seed: &Url) -> Option<Vec<PassageChunk>> {
        let ttl = self.config.crawl.cache_ttl_secs;
        if ttl == 0 {
            return None;
        }
        let cache = self.crawl_cache.lock().await;
        let entry = cache.get(seed.as_str())?;
        if entry.fetched_at.elapsed() >= Duration::from_secs(ttl) {
            return None;
        }
        Some(entry.chunks.clone())
    }

    async fn store_in_cache(&self, seed: &Url, chunks: &[PassageChunk]) {
        if self.config.crawl.cache_ttl_secs == 0 {
            return;
        }
        let mut cache = self.crawl_cache.lock().await;
        cache.insert(
            seed.as_str().to_string(),
            CachedCrawl {
                fetched_at: Instant::now(),
                chunks: chunks.to_vec(),
            },
        );
    }
}

/// Newlines confuse the embedding service; collapse them before querying.
fn sanitize_question(question: &str) -> String {
    question.replace('\n', " ").trim().to_string()
}
