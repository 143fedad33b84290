use crate::{
    AppData, AppError, AppResult, AuthUser, Claims, Data, Responder, Serialize, debug, get, json,
};

/// Administrator landing page.
pub const ADMIN_HOME: &str = "admin_home";
/// Landing page for everybody else.
pub const USER_HOME: &str = "home_userpage";

#[derive(Serialize)]
struct HomeContext<'a> {
    name: &'a str,
    role: String,
}

/// Picks the home view for the current user. Requires an authenticated user.
pub fn home_view(user: Option<&Claims>) -> Result<&'static str, AppError> {
    let claims = user.ok_or(AppError::Unauthenticated)?;

    let view = if claims.role().is_admin() {
        ADMIN_HOME
    } else {
        USER_HOME
    };

    debug!("user {} (usertype {:?}) -> {view}", claims.sub, claims.role().code());
    Ok(view)
}

#[get("/redirect")]
pub async fn redirect(data: Data<AppData>, user: Option<AuthUser>) -> AppResult {
    let claims = user.map(|u| u.claims);
    let view = home_view(claims.as_ref())?;

    let user = claims.as_ref().map(|c| HomeContext {
        name: &c.name,
        role: c.role().to_string(),
    });

    Ok(data.render_tpl(view, &json!({ "user": user })))
}

#[get("/")]
pub async fn index(data: Data<AppData>) -> impl Responder {
    data.render_tpl(USER_HOME, &json!({ "user": null }))
}
