// linkshelf services
// Stateless pipelines (normalizer, favicon, ranking, suggestions) and the async service layer.

pub mod bookmark_service;
pub mod cache_rebuild;
pub mod favicon_pipeline;
pub mod image_validation;
pub mod page_fetcher;
pub mod ranking_aggregator;
pub mod scheduler;
pub mod score_combiner;
pub mod settings_engine;
pub mod suggestion_engine;
pub mod title_resolver;
pub mod url_normalizer;
