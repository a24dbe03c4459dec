use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_cors::Cors;
use actix_files as fs;
use actix_web::dev::{Server, Service};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::{middleware, web, App, HttpServer};
use chrono::{DateTime, Utc};
use log::info;
use reqwest::Client;

use crate::config::Settings;
use crate::core::cache::TtlCache;
use crate::core::error::ServiceResult;
use crate::core::events::EventHub;
use crate::core::metrics::PipelineMetrics;
use crate::core::orchestrator::{OrchestratorConfig, WorkflowOrchestrator};
use crate::core::store::Store;
use crate::services::ai::{
    CaptionTranscriber, ContentGenerator, LanguageModel, OpenAiChatModel, Transcriber, TranscriptionService,
    WhisperTranscriber,
};
use crate::services::analytics::AnalyticsService;
use crate::services::brand_voices::BrandVoiceService;
use crate::services::drafts::DraftService;
use crate::services::episodes::EpisodeService;
use crate::services::exports::{publishers_from_settings, ExportService};
use crate::services::pipeline::EpisodePipeline;
use crate::services::seo::SeoService;
use crate::web::handlers;
use crate::web::models::{json_error_handler, query_error_handler};
use crate::web::ws;

/// Largest accepted JSON body
const JSON_LIMIT: usize = 2 * 1024 * 1024;
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(300);

/// Shared application state for web handlers
pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: Arc<Store>,
    pub cache: Arc<TtlCache>,
    pub events: Arc<EventHub>,
    pub metrics: Arc<PipelineMetrics>,
    pub orchestrator: Arc<WorkflowOrchestrator>,
    pub episodes: Arc<EpisodeService>,
    pub transcripts: Arc<TranscriptionService>,
    pub drafts: Arc<DraftService>,
    pub brand_voices: Arc<BrandVoiceService>,
    pub seo: Arc<SeoService>,
    pub exports: Arc<ExportService>,
    pub analytics: Arc<AnalyticsService>,
    pub language_model: bool,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Wire every service from the settings
    pub fn new(settings: Settings) -> ServiceResult<Self> {
        let settings = Arc::new(settings);
        let client = Client::builder().timeout(PROVIDER_TIMEOUT).build()?;

        let llm: Option<Arc<dyn LanguageModel>> = OpenAiChatModel::from_settings(client.clone(), &settings.ai)
            .map(|model| Arc::new(model) as Arc<dyn LanguageModel>);
        let whisper: Option<Arc<dyn Transcriber>> = settings.ai.openai_api_key.as_ref().map(|key| {
            Arc::new(WhisperTranscriber::new(
                client.clone(),
                key.clone(),
                settings.ai.openai_base_url.clone(),
            )) as Arc<dyn Transcriber>
        });
        let publishers = publishers_from_settings(&client, &settings.cms);

        let store = Arc::new(Store::new());
        let cache = Arc::new(TtlCache::new(
            settings.cache.capacity,
            Duration::from_secs(settings.cache.default_ttl_secs),
        ));
        let events = Arc::new(EventHub::default());
        let metrics = Arc::new(PipelineMetrics::new()?);

        let generator = Arc::new(ContentGenerator::new(llm.clone()));
        let language_model = generator.has_language_model();
        let transcripts = Arc::new(TranscriptionService::new(
            Arc::clone(&store),
            Arc::clone(&events),
            Arc::clone(&settings),
            client,
            whisper,
            Arc::new(CaptionTranscriber),
            llm,
        ));
        let drafts = Arc::new(DraftService::new(Arc::clone(&store), Arc::clone(&cache), generator));
        let seo = Arc::new(SeoService::new(Arc::clone(&store), Arc::clone(&cache)));
        let pipeline = EpisodePipeline::new(
            Arc::clone(&store),
            Arc::clone(&events),
            Arc::clone(&transcripts),
            Arc::clone(&drafts),
            Arc::clone(&seo),
        );
        let orchestrator = Arc::new(WorkflowOrchestrator::new(
            Arc::clone(&store),
            Arc::clone(&events),
            Arc::clone(&metrics),
            Arc::new(pipeline),
            OrchestratorConfig::from(&settings.workflow),
        ));

        Ok(Self {
            episodes: Arc::new(EpisodeService::new(
                Arc::clone(&store),
                Arc::clone(&cache),
                Arc::clone(&settings),
            )),
            brand_voices: Arc::new(BrandVoiceService::new(Arc::clone(&store))),
            exports: Arc::new(ExportService::new(Arc::clone(&store), Arc::clone(&settings), publishers)),
            analytics: Arc::new(AnalyticsService::new(
                Arc::clone(&store),
                Arc::clone(&cache),
                Arc::clone(&metrics),
            )),
            settings,
            store,
            cache,
            events,
            metrics,
            orchestrator,
            transcripts,
            drafts,
            seo,
            language_model,
            started_at: Utc::now(),
        })
    }
}

/// Route table of the service
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(JSON_LIMIT)
            .error_handler(json_error_handler),
    )
    .app_data(web::QueryConfig::default().error_handler(query_error_handler))
    .route("/", web::get().to(handlers::system::index))
    .route("/health", web::get().to(handlers::system::health))
    .route("/metrics", web::get().to(handlers::system::metrics))
    .service(
        web::scope("/api/v1")
            // Users
            .route("/users/me", web::get().to(handlers::users::me))
            // Episodes
            .route("/episodes", web::get().to(handlers::episodes::list_episodes))
            .route("/episodes", web::post().to(handlers::episodes::create_episode))
            .route("/episodes/formats", web::get().to(handlers::episodes::allowed_formats))
            .route("/episodes/{id}", web::get().to(handlers::episodes::get_episode))
            .route("/episodes/{id}", web::put().to(handlers::episodes::update_episode))
            .route("/episodes/{id}", web::patch().to(handlers::episodes::update_episode))
            .route("/episodes/{id}", web::delete().to(handlers::episodes::delete_episode))
            .route("/episodes/{id}/upload-url", web::get().to(handlers::episodes::upload_url))
            .route("/episodes/{id}/audio", web::put().to(handlers::episodes::upload_audio))
            .route("/episodes/{id}/status", web::get().to(handlers::episodes::episode_status))
            // Transcripts
            .route("/episodes/{id}/transcribe", web::post().to(handlers::transcripts::transcribe))
            .route("/episodes/{id}/transcript", web::get().to(handlers::transcripts::get_for_episode))
            .route("/transcripts/{id}", web::get().to(handlers::transcripts::get_transcript))
            .route("/transcripts/{id}", web::put().to(handlers::transcripts::update_transcript))
            .route("/transcripts/{id}", web::delete().to(handlers::transcripts::delete_transcript))
            .route("/transcripts/{id}/segments", web::get().to(handlers::transcripts::list_segments))
            .route("/transcripts/{id}/segments", web::post().to(handlers::transcripts::add_segment))
            .route("/transcripts/{id}/retry", web::post().to(handlers::transcripts::retry))
            // Drafts
            .route("/episodes/{id}/drafts", web::post().to(handlers::drafts::create_draft))
            .route("/episodes/{id}/drafts/versions", web::get().to(handlers::drafts::versions))
            .route("/drafts", web::get().to(handlers::drafts::list_drafts))
            .route("/drafts/{id}", web::get().to(handlers::drafts::get_draft))
            .route("/drafts/{id}", web::put().to(handlers::drafts::update_draft))
            .route("/drafts/{id}", web::delete().to(handlers::drafts::delete_draft))
            .route("/drafts/{id}/regenerate", web::post().to(handlers::drafts::regenerate))
            .route("/drafts/{id}/revise", web::post().to(handlers::drafts::revise))
            // SEO
            .route("/drafts/{id}/seo", web::get().to(handlers::seo::get_seo))
            .route("/drafts/{id}/seo", web::put().to(handlers::seo::update_seo))
            .route("/drafts/{id}/seo/optimize", web::post().to(handlers::seo::optimize))
            .route("/drafts/{id}/seo/analyze", web::post().to(handlers::seo::analyze))
            .route("/drafts/{id}/seo/readability", web::get().to(handlers::seo::readability))
            .route("/drafts/{id}/seo/keywords", web::get().to(handlers::seo::keywords))
            .route("/drafts/{id}/seo/meta-tags", web::get().to(handlers::seo::meta_tags))
            .route("/drafts/{id}/seo/internal-links", web::get().to(handlers::seo::internal_links))
            .route("/drafts/{id}/seo/schema", web::get().to(handlers::seo::schema))
            // Exports
            .route("/drafts/{id}/exports", web::post().to(handlers::exports::create_export))
            .route("/exports", web::get().to(handlers::exports::list_exports))
            .route("/exports/{id}", web::get().to(handlers::exports::get_export))
            .route("/exports/{id}", web::delete().to(handlers::exports::delete_export))
            .route("/exports/{id}/status", web::get().to(handlers::exports::export_status))
            .route("/exports/{id}/retry", web::post().to(handlers::exports::retry_export))
            // Brand voices
            .route("/brand-voices", web::get().to(handlers::brand_voices::list_voices))
            .route("/brand-voices", web::post().to(handlers::brand_voices::create_voice))
            .route("/brand-voices/active", web::get().to(handlers::brand_voices::active_voices))
            .route("/brand-voices/{id}", web::get().to(handlers::brand_voices::get_voice))
            .route("/brand-voices/{id}", web::put().to(handlers::brand_voices::update_voice))
            .route("/brand-voices/{id}", web::delete().to(handlers::brand_voices::delete_voice))
            .route("/brand-voices/{id}/validate", web::post().to(handlers::brand_voices::validate_content))
            .route("/brand-voices/{id}/redact", web::post().to(handlers::brand_voices::redact_content))
            // Analytics
            .route("/analytics/summary", web::get().to(handlers::analytics::summary))
            .route("/analytics/top-content", web::get().to(handlers::analytics::top_content))
            .route("/analytics/metrics/{metric}", web::get().to(handlers::analytics::metrics_by_period))
            .route("/analytics/events", web::post().to(handlers::analytics::track_event))
            .route("/episodes/{id}/metrics", web::post().to(handlers::analytics::record_metric))
            .route("/episodes/{id}/metrics", web::get().to(handlers::analytics::list_metrics))
            .route("/drafts/{id}/performance", web::post().to(handlers::analytics::record_performance))
            .route("/drafts/{id}/performance", web::get().to(handlers::analytics::list_performance))
            // Pipeline
            .route("/pipeline/active", web::get().to(handlers::pipeline::active_runs))
            .route("/pipeline/episodes/{id}/start", web::post().to(handlers::pipeline::start))
            .route("/pipeline/episodes/{id}/status", web::get().to(handlers::pipeline::status))
            .route("/pipeline/episodes/{id}/cancel", web::post().to(handlers::pipeline::cancel))
            // WebSocket streams
            .route("/ws/episodes/{id}", web::get().to(ws::episode_stream))
            .route("/ws/users/{id}", web::get().to(ws::user_stream)),
    );
}

fn cors(origins: &[String]) -> Cors {
    if origins.iter().any(|o| o == "*") {
        return Cors::permissive();
    }
    let cors = Cors::default()
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
        .max_age(3600);
    origins.iter().fold(cors, |cors, origin| cors.allowed_origin(origin))
}

/// Bind the HTTP server; the returned server must be awaited to run
pub fn start_web_server(state: web::Data<AppState>) -> std::io::Result<Server> {
    let address = state.settings.bind_address();
    let upload_dir = state.settings.upload_dir();
    let export_dir = state.settings.export_dir();
    info!("Starting web server on http://{}", address);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors(&state.settings.allowed_origins))
            .wrap_fn(|req, srv| {
                let started = Instant::now();
                let metrics = req
                    .app_data::<web::Data<AppState>>()
                    .map(|state| Arc::clone(&state.metrics));
                let fut = srv.call(req);
                async move {
                    let mut res = fut.await?;
                    let elapsed = format!("{:.4}", started.elapsed().as_secs_f64());
                    if let Ok(value) = HeaderValue::from_str(&elapsed) {
                        res.headers_mut()
                            .insert(HeaderName::from_static("x-process-time"), value);
                    }
                    if let Some(metrics) = metrics {
                        metrics.record_http_status(res.status().as_u16());
                    }
                    Ok(res)
                }
            })
            .app_data(state.clone())
            // Static files
            .service(fs::Files::new("/media", upload_dir.clone()))
            .service(fs::Files::new("/files/exports", export_dir.clone()))
            .configure(configure)
    })
    .bind(address)?
    .run();
    Ok(server)
}
