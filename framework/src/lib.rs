#![deny(warnings, unused_imports, dead_code, clippy::all, clippy::pedantic)]

use actix_web::{
    App, HttpRequest, HttpResponse, HttpServer,
    body::MessageBody,
    dev::ServiceResponse,
    http::StatusCode,
    middleware::{DefaultHeaders, ErrorHandlerResponse, ErrorHandlers, Logger},
    web,
};
use include_dir::Dir;
use log::{debug, error, info};
use tera::{Context, Tera};

pub mod auth;
pub mod config;
pub mod error;
pub mod prelude;
pub mod rate_limiter;
pub mod structs;

pub use config::{Config, Env};

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
     script-src 'self'; \
     style-src 'self'; \
     font-src 'self'; \
     img-src 'self' data:; \
     frame-ancestors 'none'; \
     base-uri 'self'; \
     form-action 'self';";

const SECURITY_HEADERS: [(&str, &str); 4] = [
    ("Content-Security-Policy", CONTENT_SECURITY_POLICY),
    ("X-Content-Type-Options", "nosniff"),
    ("X-Frame-Options", "DENY"),
    ("Referrer-Policy", "strict-origin-when-cross-origin"),
];

pub struct AppData {
    pub tera: Tera,
    pub env: Env,
    pub jwt_secret: String,
}

impl AppData {
    #[must_use]
    pub fn new(tera: Tera, env: Env, jwt_secret: impl Into<String>) -> Self {
        Self {
            tera,
            env,
            jwt_secret: jwt_secret.into(),
        }
    }

    #[must_use]
    pub fn render(&self, template: &str) -> HttpResponse {
        self.render_template(template, &serde_json::json!({}))
    }

    #[must_use]
    pub fn render_tpl<T: serde::Serialize>(&self, template: &str, context: &T) -> HttpResponse {
        self.render_template(template, context)
    }

    /// Renders a view. `_` in the view name separates directories, so
    /// `admin_home` renders `admin/home`.
    #[must_use]
    pub fn render_template<T: serde::Serialize>(
        &self,
        template_name: &str,
        context_data: &T,
    ) -> HttpResponse {
        let context = match Context::from_serialize(context_data) {
            Ok(ctx) => ctx,
            Err(err) => {
                error!("Context serialization error: {err}");
                return HttpResponse::InternalServerError().finish();
            }
        };

        let template_name = template_path(template_name);
        match self.tera.render(&template_name, &context) {
            Ok(html) => HttpResponse::Ok().content_type("text/html").body(html),
            Err(err) => {
                error!("Template rendering error ({template_name}): {err}");
                HttpResponse::InternalServerError().finish()
            }
        }
    }
}

#[must_use]
pub fn template_path(view: &str) -> String {
    view.replace('_', "/")
}

type ConfigureFn = Box<dyn Fn(&mut web::ServiceConfig) + Send + Sync + 'static>;

pub struct FrameworkApp {
    dist_dir: &'static Dir<'static>,
    configure_fn: Option<ConfigureFn>,
}

impl FrameworkApp {
    #[must_use]
    pub fn new(dist_dir: &'static Dir<'static>) -> Self {
        Self {
            dist_dir,
            configure_fn: None,
        }
    }

    /// Register a route configuration function (like `services::configure`)
    #[must_use]
    pub fn configure<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut web::ServiceConfig) + Send + Sync + 'static,
    {
        self.configure_fn = Some(Box::new(f));
        self
    }

    /// Start the framework: loads env, logging, templates, and the HTTP server
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration, broken templates, or when the
    /// listener cannot bind.
    pub async fn run(self) -> std::io::Result<()> {
        config::load_env_file();
        let config = Config::from_env().map_err(std::io::Error::other)?;
        env_logger::init_from_env(
            env_logger::Env::new().default_filter_or(config.env.log_filter()),
        );

        info!("Starting application in {:?} mode...", config.env);

        let tera = load_templates(self.dist_dir).map_err(std::io::Error::other)?;
        let app_data = web::Data::new(AppData::new(
            tera,
            config.env.clone(),
            config.jwt_secret.clone(),
        ));

        let limit = rate_limiter::general_rate_limit(
            config.rate_limit_seconds,
            config.rate_limit_burst,
        )
        .ok_or_else(|| {
            std::io::Error::other("RATE_LIMIT_SECONDS and RATE_LIMIT_BURST must be > 0")
        })?;

        let dist_dir = self.dist_dir;
        let configure_fn = self.configure_fn.map(std::sync::Arc::new);

        info!("Listening on {}:{}", config.host, config.port);

        HttpServer::new(move || {
            let mut app = App::new()
                .app_data(app_data.clone())
                .wrap(error_handlers())
                .wrap(security_headers())
                .wrap(rate_limiter::rate_limiter(&limit))
                .wrap(Logger::default());

            if let Some(ref configure_fn) = configure_fn {
                let cf = configure_fn.clone();
                app = app.configure(move |cfg| (cf)(cfg));
            }

            app.configure(static_files(dist_dir))
        })
        .bind((config.host.as_str(), config.port))?
        .run()
        .await
    }
}

/// Registers every `*.html` file of `dir` (recursively) in one batch, so
/// templates may extend each other regardless of file order.
///
/// # Errors
///
/// Fails when a template does not parse or extends a missing parent.
pub fn load_templates(dir: &Dir) -> Result<Tera, tera::Error> {
    let mut templates = Vec::new();
    collect_templates(dir, &mut templates);

    let mut tera = Tera::default();
    tera.autoescape_on(vec![""]);
    tera.add_raw_templates(templates)?;
    Ok(tera)
}

fn collect_templates<'a>(dir: &'a Dir, templates: &mut Vec<(String, &'a str)>) {
    for file in dir.files() {
        if file.path().extension().is_none_or(|ext| ext != "html") {
            continue;
        }

        let path = file.path().to_string_lossy().replace('\\', "/");
        let name = if path == "index.html" {
            "index".to_string()
        } else if let Some(stripped) = path.strip_suffix("/index.html") {
            stripped.to_string()
        } else if let Some(stripped) = path.strip_suffix(".html") {
            stripped.to_string()
        } else {
            path
        };

        let Some(content) = file.contents_utf8() else {
            error!("Skipping template {name}: not valid UTF-8");
            continue;
        };
        debug!("Registering template: {name}");
        templates.push((name, content));
    }
    for subd in dir.dirs() {
        collect_templates(subd, templates);
    }
}

#[must_use]
pub fn security_headers() -> DefaultHeaders {
    SECURITY_HEADERS
        .into_iter()
        .fold(DefaultHeaders::new(), |headers, header| headers.add(header))
}

/// Renders error pages for the statuses the application produces.
#[must_use]
pub fn error_handlers<B>() -> ErrorHandlers<B>
where
    B: MessageBody + 'static,
{
    ErrorHandlers::new()
        .handler(StatusCode::INTERNAL_SERVER_ERROR, render_error_page)
        .handler(StatusCode::NOT_FOUND, render_error_page)
        .handler(StatusCode::UNAUTHORIZED, render_error_page)
}

/// Error page view for `status`. Signed-in callers get pages linking back
/// to their home, anonymous callers the `public_` variants.
#[must_use]
pub fn error_view(status: StatusCode, signed_in: bool) -> &'static str {
    match (status == StatusCode::UNAUTHORIZED, signed_in) {
        (true, true) => "noauth",
        (true, false) => "public_noauth",
        (false, true) => "error",
        (false, false) => "public_error",
    }
}

/// Serves `dist/static/` under `/static`.
#[must_use]
pub fn static_files(dist_dir: &'static Dir<'static>) -> impl Fn(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.route(
            "/static/{path:.*}",
            web::route().to(move |path: web::Path<String>, req: HttpRequest| {
                let filename = format!("static/{}", path.into_inner());
                async move { serve_from_dist(dist_dir, &filename, req.method().as_str()) }
            }),
        );
    }
}

fn serve_from_dist(
    dist_dir: &Dir<'_>,
    path: &str,
    method: &str,
) -> actix_web::Result<HttpResponse> {
    if method != "GET" && method != "HEAD" {
        return Ok(HttpResponse::MethodNotAllowed().finish());
    }

    let file = dist_dir
        .get_file(path)
        .ok_or_else(|| actix_web::error::ErrorNotFound("File not found"))?;

    let content_type = mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("application/octet-stream");

    Ok(HttpResponse::Ok()
        .content_type(content_type)
        .body(file.contents().to_vec()))
}

fn render_error_page<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>>
where
    B: MessageBody + 'static,
{
    let (req, res) = res.into_parts();
    let Some(data) = req.app_data::<web::Data<AppData>>().cloned() else {
        error!("AppData missing, cannot render error page for {}", res.status());
        return Ok(ErrorHandlerResponse::Response(
            ServiceResponse::new(req, res).map_into_left_body(),
        ));
    };
    let status = res.status();
    let template = error_view(status, auth::read_jwt(&req).is_ok());

    let error_msg = res.error().map(ToString::to_string);
    if let Some(ref msg) = error_msg {
        error!("Error [{status}] {}: {msg}", req.path());
    }

    let display_error = if data.env == Env::Dev {
        error_msg.unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown Error")
                .to_string()
        })
    } else {
        status
            .canonical_reason()
            .unwrap_or("An unexpected error occurred")
            .to_string()
    };

    let ctx = serde_json::json!({
        "status": status.as_u16(),
        "error": display_error,
    });

    let mut page = data.render_template(template, &ctx);
    *page.status_mut() = status;

    Ok(ErrorHandlerResponse::Response(
        ServiceResponse::new(req, page).map_into_right_body(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use include_dir::include_dir;

    static FIXTURES: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/tests/fixtures");

    #[test]
    fn view_names_map_to_directories() {
        assert_eq!(template_path("admin_home"), "admin/home");
        assert_eq!(template_path("home_userpage"), "home/userpage");
        assert_eq!(template_path("error"), "error");
    }

    #[test]
    fn error_view_depends_on_status_and_sign_in() {
        assert_eq!(error_view(StatusCode::UNAUTHORIZED, true), "noauth");
        assert_eq!(error_view(StatusCode::UNAUTHORIZED, false), "public_noauth");
        assert_eq!(error_view(StatusCode::NOT_FOUND, true), "error");
        assert_eq!(error_view(StatusCode::NOT_FOUND, false), "public_error");
        assert_eq!(
            error_view(StatusCode::INTERNAL_SERVER_ERROR, true),
            "error"
        );
    }

    #[test]
    fn templates_register_without_extension() {
        let tera = load_templates(&FIXTURES).unwrap();
        let names: Vec<&str> = tera.get_template_names().collect();

        assert!(names.contains(&"layout"));
        assert!(names.contains(&"index"));
        assert!(names.contains(&"greet/hello"));
        assert!(!names.iter().any(|name| name.starts_with("static")));
    }

    #[actix_web::test]
    async fn render_extends_layout_and_escapes() {
        let data = AppData::new(load_templates(&FIXTURES).unwrap(), Env::Prod, "secret");

        let res = data.render_tpl("greet_hello", &serde_json::json!({"name": "<b>x</b>"}));
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers().get("content-type").unwrap(), "text/html");

        let body = actix_web::body::to_bytes(res.into_body()).await.unwrap();
        let html = std::str::from_utf8(&body).unwrap();
        assert!(html.contains("<main>"));
        assert!(html.contains("Hello, &lt;b&gt;x&lt;&#x2F;b&gt;"));
    }

    #[test]
    fn missing_template_is_a_server_error() {
        let data = AppData::new(load_templates(&FIXTURES).unwrap(), Env::Prod, "secret");

        let res = data.render("does_not_exist");
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn static_files_only_answer_get_and_head() {
        let res = serve_from_dist(&FIXTURES, "static/site.css", "GET").unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers().get("content-type").unwrap(), "text/css");

        let res = serve_from_dist(&FIXTURES, "static/site.css", "POST").unwrap();
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);

        assert!(serve_from_dist(&FIXTURES, "static/missing.css", "GET").is_err());
    }
}
