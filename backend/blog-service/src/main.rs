/// Blog Service - HTTP server
use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use blog_service::handlers;
use blog_service::media::{CloudinaryStore, MediaStore};
use blog_service::middleware::RequestTimer;
use blog_service::openapi::ApiDoc;
use blog_service::Config;
use sqlx::postgres::PgPoolOptions;
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

async fn health(pool: web::Data<sqlx::PgPool>) -> HttpResponse {
    match sqlx::query("SELECT 1").execute(pool.get_ref()).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({"status": "ok"})),
        Err(err) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "degraded",
            "error": err.to_string(),
        })),
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug,sqlx=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting blog-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    if let Ok(public_key) = std::env::var("JWT_PUBLIC_KEY_PEM") {
        if let Err(err) = blog_service::auth::initialize_validation_key(&public_key) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("Failed to initialize JWT validation key: {err}"),
            ));
        }
    } else {
        tracing::warn!(
            "JWT_PUBLIC_KEY_PEM not set; authenticated endpoints will reject all requests"
        );
    }

    // Initialize database connection pool
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::Other,
                format!("Failed to connect to database: {e}"),
            )
        })?;

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Migration failed: {e}")))?;

    tracing::info!("Connected to database, migrations applied");

    let media_store: Arc<dyn MediaStore> = Arc::new(CloudinaryStore::new(&config.media));

    let http_bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", http_bind_address);

    HttpServer::new(move || {
        // Build CORS configuration
        let mut cors = Cors::default();
        for origin in config.cors.allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        let openapi_doc = ApiDoc::openapi();

        App::new()
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(web::Data::new(media_store.clone()))
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api/openapi.json", openapi_doc),
            )
            .route("/health", web::get().to(health))
            .service(
                web::scope("/api/posts")
                    .wrap(RequestTimer)
                    .route("", web::get().to(handlers::list_posts))
                    .route("", web::post().to(handlers::create_post))
                    // Fixed paths must register before the {post_id} routes.
                    .route("/user/me", web::get().to(handlers::my_posts))
                    .route("/upload-image", web::post().to(handlers::upload_image))
                    .route("/batch-delete", web::post().to(handlers::batch_delete_posts))
                    .route("/{post_id}", web::get().to(handlers::get_post))
                    .route("/{post_id}", web::put().to(handlers::update_post))
                    .route("/{post_id}", web::delete().to(handlers::delete_post)),
            )
    })
    .bind(&http_bind_address)?
    .workers(4)
    .run()
    .await
}
