use askama::Template;
use axum::{
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use cookie::Cookie;
use serde::Deserialize;
use tracing::error;

use crate::api::auth as auth_api;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error_message: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    email: String,
    password: String,
}

pub async fn login_page() -> Html<String> {
    let template = LoginTemplate {
        error_message: String::new(),
    };
    Html(template.render().unwrap())
}

pub async fn login_handler(Form(form): Form<LoginForm>) -> Response {
    println!("📝 login attempt: email={}", form.email);

    let tokens = match auth_api::login(&form.email, &form.password).await {
        Ok(tokens) => tokens,
        Err(e) => {
            error!("login failed: {}", e);
            let template = LoginTemplate {
                error_message: "Não foi possível entrar. Verifique e-mail e senha.".to_string(),
            };
            return Html(template.render().unwrap()).into_response();
        }
    };

    let mut access_cookie = Cookie::new("access_token", tokens.access_token.clone());
    access_cookie.set_path("/");
    access_cookie.set_http_only(true);
    access_cookie.set_same_site(cookie::SameSite::Lax);

    let mut refresh_cookie = Cookie::new("refresh_token", tokens.refresh_token);
    refresh_cookie.set_path("/");
    refresh_cookie.set_http_only(true);
    refresh_cookie.set_same_site(cookie::SameSite::Lax);

    let mut response = Redirect::to("/dashboard").into_response();
    response.headers_mut().append(
        header::SET_COOKIE,
        access_cookie.to_string().parse().unwrap(),
    );
    response.headers_mut().append(
        header::SET_COOKIE,
        refresh_cookie.to_string().parse().unwrap(),
    );
    response
}

pub async fn logout_handler() -> Response {
    let mut access_cookie = Cookie::new("access_token", "");
    access_cookie.set_path("/");
    access_cookie.set_http_only(true);
    access_cookie.set_same_site(cookie::SameSite::Lax);

    let mut refresh_cookie = Cookie::new("refresh_token", "");
    refresh_cookie.set_path("/");
    refresh_cookie.set_http_only(true);
    refresh_cookie.set_same_site(cookie::SameSite::Lax);

    let mut response = Redirect::to("/login").into_response();
    response.headers_mut().append(
        header::SET_COOKIE,
        access_cookie.to_string().parse().unwrap(),
    );
    response.headers_mut().append(
        header::SET_COOKIE,
        refresh_cookie.to_string().parse().unwrap(),
    );
    response
}
