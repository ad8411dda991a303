use std::io;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use ntex::http::header;
use ntex::web;
use ntex::web::HttpRequest;
use ntex_files::NamedFile;
use serde::Deserialize;
use spdlog::{error, info, warn};

use crate::auth::gate::{AuthDecision, AuthorizationGate};
use crate::auth::session_cookie::{expired_session_cookie, session_cookie};
use crate::auth::token_auth::TokenAuthenticator;
use crate::config::Config;
use crate::error::{BlogError, StorageError};
use crate::paginator::Paginator;
use crate::post_processor::{PostForm, PostProcessor};
use crate::query_string::QueryString;
use crate::storage::memory_store::MemoryStore;
use crate::storage::{PostRepository, TagRepository};
use crate::view::list_renderer::ListPosts;
use crate::view::{PageContext, Views};

/// Post content can reach 10k characters, percent-encoding can triple that.
const MAX_FORM_SIZE: usize = 64 * 1024;

pub struct AppState {
    blog_name: String,
    blog_title: String,
    page_size: u32,
    authenticator: Arc<TokenAuthenticator>,
    gate: AuthorizationGate,
    processor: PostProcessor,
    tags: Arc<dyn TagRepository>,
    views: Views,
    public_dir: PathBuf,
}

impl AppState {
    pub fn new(config: &Config,
               authenticator: TokenAuthenticator,
               posts: Arc<dyn PostRepository>,
               tags: Arc<dyn TagRepository>) -> io::Result<Self> {
        let views = Views::load()
            .map_err(|e| io::Error::new(ErrorKind::InvalidData, e.to_string()))?;
        let authenticator = Arc::new(authenticator);

        Ok(AppState {
            blog_name: config.blog.name.clone(),
            blog_title: config.blog.title.clone(),
            page_size: config.blog.page_size,
            gate: AuthorizationGate::new(authenticator.clone()),
            authenticator,
            processor: PostProcessor::new(posts, tags.clone(), config.utc_offset()?),
            tags,
            views,
            public_dir: config.paths.public_dir.clone(),
        })
    }

    fn page_context(&self, authenticated: bool) -> PageContext<'_> {
        PageContext {
            blog_name: &self.blog_name,
            blog_title: &self.blog_title,
            authenticated,
        }
    }
}

type AppStateRef = web::types::State<Arc<AppState>>;

#[derive(Deserialize)]
struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
struct PreviewForm {
    #[serde(default)]
    content: String,
}

fn html(body: String) -> web::HttpResponse {
    web::HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

fn json<T: serde::Serialize>(value: &T) -> web::HttpResponse {
    match serde_json::to_string(value) {
        Ok(body) => web::HttpResponse::Ok()
            .content_type("application/json")
            .body(body),
        Err(e) => {
            error!("Error serializing response: {}", e);
            web::HttpResponse::InternalServerError().finish()
        }
    }
}

fn redirect(location: &str) -> web::HttpResponse {
    web::HttpResponse::SeeOther()
        .header(header::LOCATION, location)
        .finish()
}

fn error_response(err: BlogError) -> web::HttpResponse {
    match err {
        BlogError::Validation(e) => web::HttpResponse::BadRequest()
            .body(e.to_string()),
        BlogError::Storage(StorageError::NotFound(what)) => web::HttpResponse::NotFound()
            .body(format!("{} not found", what)),
        BlogError::Storage(StorageError::DuplicateSlug(slug)) => web::HttpResponse::Conflict()
            .body(format!("A post with slug {} already exists", slug)),
        e => {
            error!("Request failed: {}", e);
            web::HttpResponse::InternalServerError()
                .body("Internal server error")
        }
    }
}

/// Write paths only go ahead for the author. Anyone else is sent to the root page.
fn require_author(req: &HttpRequest, state: &AppState) -> Result<String, web::HttpResponse> {
    match state.gate.check(req) {
        AuthDecision::Authenticated(username) => Ok(username),
        decision => {
            warn!("Unauthenticated {} {} ({:?}), redirecting", req.method(), req.path(), decision);
            Err(redirect("/"))
        }
    }
}

#[web::get("/")]
async fn index(req: HttpRequest, state: AppStateRef) -> web::HttpResponse {
    let authenticated = state.gate.check(&req).is_authenticated();
    let qs = QueryString::from(req.uri().query().unwrap_or_default());
    let tag = qs.get_tag();

    let posts = match state.processor.list_posts(tag).await {
        Ok(posts) => posts,
        Err(e) => return error_response(e),
    };
    let all_tags = match state.tags.list_tags().await {
        Ok(tags) => tags,
        Err(e) => return error_response(e.into()),
    };

    let paginator = Paginator::from(&posts, state.page_size);
    let cur_page = paginator.sanitize_page(qs.get_page());
    let page_posts = paginator.get_page(cur_page).unwrap_or_default();

    html(state.views.list.render(&state.page_context(authenticated), &ListPosts {
        posts: page_posts,
        cur_page,
        page_count: paginator.page_count(),
        tag_filter: tag,
        all_tags: &all_tags,
    }))
}

#[web::get("/post/{slug}")]
async fn view_post(req: HttpRequest, slug: web::types::Path<String>, state: AppStateRef) -> web::HttpResponse {
    let authenticated = state.gate.check(&req).is_authenticated();
    match state.processor.get_post(&slug).await {
        Ok(post) => html(state.views.post.render(&state.page_context(authenticated), &post)),
        Err(e) => error_response(e),
    }
}

#[web::get("/editor")]
async fn new_post_editor(req: HttpRequest, state: AppStateRef) -> web::HttpResponse {
    if let Err(resp) = require_author(&req, &state) {
        return resp;
    }
    html(state.views.editor.render(&state.page_context(true), None))
}

#[web::get("/editor/{slug}")]
async fn edit_post_editor(req: HttpRequest, slug: web::types::Path<String>, state: AppStateRef) -> web::HttpResponse {
    if let Err(resp) = require_author(&req, &state) {
        return resp;
    }
    match state.processor.get_post(&slug).await {
        Ok(post) => html(state.views.editor.render(&state.page_context(true), Some(&post))),
        Err(e) => error_response(e),
    }
}

#[web::post("/post/new")]
async fn create_post(req: HttpRequest, form: web::types::Form<PostForm>, state: AppStateRef) -> web::HttpResponse {
    if let Err(resp) = require_author(&req, &state) {
        return resp;
    }
    match state.processor.create_post(form.into_inner()).await {
        Ok(created) => redirect(&format!("/post/{}", created.post.slug)),
        Err(e) => error_response(e),
    }
}

#[web::post("/post/edit/{slug}")]
async fn edit_post(req: HttpRequest, slug: web::types::Path<String>, form: web::types::Form<PostForm>, state: AppStateRef) -> web::HttpResponse {
    if let Err(resp) = require_author(&req, &state) {
        return resp;
    }
    match state.processor.edit_post(&slug, form.into_inner()).await {
        Ok(edited) => redirect(&format!("/post/{}", edited.post.slug)),
        Err(e) => error_response(e),
    }
}

async fn remove_post(req: HttpRequest, slug: String, state: AppStateRef) -> web::HttpResponse {
    if let Err(resp) = require_author(&req, &state) {
        return resp;
    }
    match state.processor.delete_post(&slug).await {
        Ok(()) => redirect("/"),
        Err(e) => error_response(e),
    }
}

#[web::post("/post/delete/{slug}")]
async fn delete_post(req: HttpRequest, slug: web::types::Path<String>, state: AppStateRef) -> web::HttpResponse {
    remove_post(req, slug.into_inner(), state).await
}

#[web::delete("/post/delete/{slug}")]
async fn delete_post_method(req: HttpRequest, slug: web::types::Path<String>, state: AppStateRef) -> web::HttpResponse {
    remove_post(req, slug.into_inner(), state).await
}

/// Rendered HTML fragment for the editor preview. Nothing is stored.
#[web::post("/post/parse")]
async fn preview(req: HttpRequest, form: web::types::Form<PreviewForm>, state: AppStateRef) -> web::HttpResponse {
    if let Err(resp) = require_author(&req, &state) {
        return resp;
    }
    match state.processor.pipeline().render(&form.content) {
        Ok(rendered) => html(rendered),
        Err(e) => error_response(e.into()),
    }
}

#[web::get("/login")]
async fn login_page(state: AppStateRef) -> web::HttpResponse {
    html(state.views.login.render(&state.page_context(false), false))
}

#[web::post("/login")]
async fn login(form: web::types::Form<LoginForm>, state: AppStateRef) -> web::HttpResponse {
    if !state.authenticator.validate_credentials(&form.username, &form.password) {
        warn!("Failed login attempt for user {}", form.username);
        return web::HttpResponse::Unauthorized()
            .content_type("text/html; charset=utf-8")
            .body(state.views.login.render(&state.page_context(false), true));
    }

    let cookie = state.authenticator.issue_token()
        .and_then(|(token, expiry)| session_cookie(state.gate.cookie_name(), &token, expiry));
    let cookie = match cookie {
        Ok(cookie) => cookie,
        Err(e) => {
            error!("Could not issue a session for {}: {}", form.username, e);
            return web::HttpResponse::InternalServerError().body("Internal server error");
        }
    };

    info!("User {} logged in", form.username);
    web::HttpResponse::SeeOther()
        .header(header::SET_COOKIE, cookie)
        .header(header::LOCATION, "/")
        .finish()
}

#[web::get("/logout")]
async fn logout(state: AppStateRef) -> web::HttpResponse {
    web::HttpResponse::SeeOther()
        .header(header::SET_COOKIE, expired_session_cookie(state.gate.cookie_name()))
        .header(header::LOCATION, "/")
        .finish()
}

#[web::get("/tags")]
async fn list_tags(state: AppStateRef) -> web::HttpResponse {
    match state.tags.list_tags().await {
        Ok(tags) => json(&tags),
        Err(e) => error_response(e.into()),
    }
}

#[web::get("/tags/search/")]
async fn search_tags_without_prefix() -> web::HttpResponse {
    web::HttpResponse::BadRequest().body("A tag prefix is required")
}

#[web::get("/tags/search/{prefix}")]
async fn search_tags(prefix: web::types::Path<String>, state: AppStateRef) -> web::HttpResponse {
    if prefix.is_empty() {
        return web::HttpResponse::BadRequest().body("A tag prefix is required");
    }
    match state.tags.search_tags(&prefix).await {
        Ok(names) => json(&names),
        Err(e) => error_response(e.into()),
    }
}

#[web::get("/static/{file_name}")]
async fn static_files(path: web::types::Path<String>, state: AppStateRef) -> Result<NamedFile, web::Error> {
    if path.contains("..") || path.contains('/') || path.contains('\\') {
        return Err(web::error::ErrorUnauthorized("Access forbidden").into());
    }

    let file_path = state.public_dir.join(path.into_inner());
    Ok(NamedFile::open(file_path)?)
}

/// Every route the blog serves.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(index)
        .service(view_post)
        .service(new_post_editor)
        .service(edit_post_editor)
        .service(create_post)
        .service(edit_post)
        .service(delete_post)
        .service(delete_post_method)
        .service(preview)
        .service(login_page)
        .service(login)
        .service(logout)
        .service(list_tags)
        .service(search_tags_without_prefix)
        .service(search_tags)
        .service(static_files);
}

fn form_config() -> web::types::FormConfig {
    web::types::FormConfig::default().limit(MAX_FORM_SIZE)
}

pub async fn server_run(config: Config) -> io::Result<()> {
    let authenticator = TokenAuthenticator::new(config.auth_config())
        .map_err(|e| io::Error::new(ErrorKind::InvalidInput, format!("Invalid [auth] configuration: {}", e)))?;

    let offset = config.utc_offset()?;
    let store = match config.paths.data_file {
        Some(ref data_file) => MemoryStore::open(data_file, offset),
        None => {
            warn!("No data_file configured, posts will be lost on restart");
            Ok(MemoryStore::new(offset))
        }
    }.map_err(|e| io::Error::new(ErrorKind::InvalidData, format!("Error loading blog data: {}", e)))?;
    let store = Arc::new(store);

    let app_state = Arc::new(AppState::new(&config, authenticator, store.clone(), store)?);

    let bind_addr = config.server.address.clone();
    let bind_port = config.server.port;
    web::HttpServer::new(move || {
        web::App::new()
            .state(app_state.clone())
            .state(form_config())
            .configure(routes)
    })
        .bind((bind_addr, bind_port))?
        .run()
        .await
}
