//! # API Server Module
//!
//! ## Purpose
//! REST surface consumed by the presentation layer: query execution,
//! per-source load status, and the facet values backing the filter dropdowns.
//!
//! ## Input/Output Specification
//! - **Input**: HTTP requests with query text, source selector, filters
//! - **Output**: JSON responses with the synthesis and structured per-source
//!   result lists
//! - **Endpoints**: `POST /search`, `GET /health`, `GET /facets`, `GET /`
//!
//! ## Error Mapping
//! An embedding failure is the only fatal query error; it maps to 502 with
//! the user-facing French message. Everything else degrades inside the
//! pipeline and still returns 200.

use crate::errors::{Result, RetrievalError};
use crate::filters::FilterSet;
use crate::retrieval::SourceSelector;
use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// API server wrapping the shared application state
pub struct ApiServer {
    app_state: crate::AppState,
}

/// Search request payload
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub source: SourceSelector,
    #[serde(default)]
    pub filters: FilterSet,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub checked_at: DateTime<Utc>,
    pub sources: crate::index::SourceStatus,
}

/// Facet values for the filter dropdowns
#[derive(Debug, Serialize)]
pub struct FacetsResponse {
    pub code_names: Vec<String>,
    pub ministeres: Vec<String>,
    pub jurisdictions: Vec<&'static str>,
}

impl ApiServer {
    pub fn new(app_state: crate::AppState) -> Self {
        Self { app_state }
    }

    /// Run the API server
    pub async fn run(self) -> Result<()> {
        let bind_addr = format!(
            "{}:{}",
            self.app_state.config.server.host, self.app_state.config.server.port
        );
        let enable_cors = self.app_state.config.server.enable_cors;
        let app_state = self.app_state;

        tracing::info!("Starting API server on {}", bind_addr);

        let server = HttpServer::new(move || {
            let cors = if enable_cors {
                Cors::permissive()
            } else {
                Cors::default()
            };
            App::new()
                .wrap(cors)
                .app_data(web::Data::new(app_state.clone()))
                .route("/search", web::post().to(search_handler))
                .route("/health", web::get().to(health_handler))
                .route("/facets", web::get().to(facets_handler))
                .route("/", web::get().to(index_handler))
        })
        .bind(&bind_addr)
        .map_err(|e| RetrievalError::Internal {
            message: format!("Failed to bind server to {}: {}", bind_addr, e),
        })?
        .run();

        server.await.map_err(|e| RetrievalError::Internal {
            message: format!("Server error: {}", e),
        })?;

        Ok(())
    }
}

/// Search endpoint handler
async fn search_handler(
    app_state: web::Data<crate::AppState>,
    request: web::Json<SearchRequest>,
) -> ActixResult<HttpResponse> {
    match app_state
        .pipeline
        .run_query(&request.query, request.source, &request.filters)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => {
            tracing::error!(category = e.category(), error = %e, "query failed");
            Ok(HttpResponse::BadGateway().json(serde_json::json!({
                "error": e.to_string(),
            })))
        }
    }
}

/// Health check endpoint handler
async fn health_handler(app_state: web::Data<crate::AppState>) -> ActixResult<HttpResponse> {
    let sources = app_state.snapshot.status();
    let all_loaded =
        sources.articles && sources.jurisprudence && sources.circulaires && sources.reponses;

    let response = HealthResponse {
        status: if all_loaded {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        checked_at: Utc::now(),
        sources,
    };

    Ok(HttpResponse::Ok().json(response))
}

/// Facets endpoint handler
async fn facets_handler(app_state: web::Data<crate::AppState>) -> ActixResult<HttpResponse> {
    let response = FacetsResponse {
        code_names: app_state.snapshot.code_names(),
        ministeres: app_state.snapshot.ministeres(),
        jurisdictions: vec!["Cour de cassation", "Cour d'appel"],
    };
    Ok(HttpResponse::Ok().json(response))
}

/// Index page handler
async fn index_handler() -> ActixResult<HttpResponse> {
    let html = r#"
    <!DOCTYPE html>
    <html lang="fr">
    <head>
        <title>Recherche juridique française</title>
        <style>
            body { font-family: Arial, sans-serif; margin: 40px; }
            .header { color: #1e293b; }
            .endpoint { margin: 20px 0; padding: 15px; background: #f8fafc; border-radius: 5px; }
            .method { font-weight: bold; color: #2563eb; }
        </style>
    </head>
    <body>
        <h1 class="header">Recherche juridique française</h1>
        <p>Recherche sémantique dans 4 sources juridiques : articles de loi, jurisprudence, circulaires et réponses ministérielles.</p>

        <h2>Endpoints</h2>

        <div class="endpoint">
            <span class="method">POST</span> /search
            <p>Exécute une requête en langage naturel avec filtres optionnels.</p>
        </div>

        <div class="endpoint">
            <span class="method">GET</span> /health
            <p>État de chargement de chaque source.</p>
        </div>

        <div class="endpoint">
            <span class="method">GET</span> /facets
            <p>Valeurs disponibles pour les filtres (codes, ministères, juridictions).</p>
        </div>

        <h2>Exemple de requête</h2>
        <pre>{
  "query": "Quelles sont les conditions de la responsabilité civile délictuelle ?",
  "source": "Tous",
  "filters": { "date_from": 2000, "code_name": "Code civil" }
}</pre>
    </body>
    </html>
    "#;

    Ok(HttpResponse::Ok().content_type("text/html").body(html))
}
