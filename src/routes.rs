// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, ingredients, recipes, users},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, users, ingredients, recipes).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (stores, policy, config).
///
/// There is no auth middleware: handlers take an `Actor` and ask the access
/// policy, so anonymous requests reach the community listing.
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let user_routes = Router::new()
        .route("/me", get(users::get_me).put(users::update_me))
        .route("/me/password", put(users::change_password));

    let ingredient_routes = Router::new()
        .route(
            "/",
            get(ingredients::list_my_ingredients).post(ingredients::create_ingredient),
        )
        .route(
            "/{id}",
            get(ingredients::get_ingredient)
                .put(ingredients::update_ingredient)
                .delete(ingredients::delete_ingredient),
        );

    let recipe_routes = Router::new()
        .route(
            "/",
            get(recipes::list_my_recipes).post(recipes::create_recipe),
        )
        .route("/community", get(recipes::list_community_recipes))
        .route(
            "/{id}",
            get(recipes::get_recipe)
                .put(recipes::update_recipe)
                .delete(recipes::delete_recipe),
        )
        .route("/{id}/marks", post(recipes::mark_recipe));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/ingredients", ingredient_routes)
        .nest("/api/recipes", recipe_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
