use crate::{
    conversation::{
        conversation_dto::{ConversaResumo, CriarConversaRequest},
        conversation_handlers,
        conversation_models::ConversaResponse,
    },
    message::{
        message_dto::EnviarMensagemRequest,
        message_handlers,
        message_models::{MensagemResponse, TipoMensagem},
    },
    middleware::auth_middleware,
    state::AppState,
};
use axum::http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    Method,
};
use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::conversation::conversation_handlers::find_or_create_conversation,
        crate::conversation::conversation_handlers::get_conversations,
        crate::conversation::conversation_handlers::mark_conversation_read,
        crate::message::message_handlers::send_message,
        crate::message::message_handlers::get_history,
        crate::message::message_handlers::mark_message_read,
        crate::message::message_handlers::message_stream,
    ),
    components(
        schemas(
            CriarConversaRequest,
            ConversaResponse,
            ConversaResumo,
            EnviarMensagemRequest,
            MensagemResponse,
            TipoMensagem,
        )
    ),
    tags(
        (name = "conversas", description = "Conversation registry endpoints"),
        (name = "mensagens", description = "Message channel endpoints")
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            )
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list([
            "http://localhost:5173".parse().unwrap(),
            "http://localhost:8081".parse().unwrap(),
            "capacitor://localhost".parse().unwrap(),
            "ionic://localhost".parse().unwrap(),
        ]))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true);

    let conversa_routes = Router::new()
        .route(
            "/",
            post(conversation_handlers::find_or_create_conversation)
                .get(conversation_handlers::get_conversations),
        )
        .route("/:id/read", patch(conversation_handlers::mark_conversation_read))
        .route(
            "/:id/mensagens",
            post(message_handlers::send_message).get(message_handlers::get_history),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let mensagem_routes = Router::new()
        .route("/stream", get(message_handlers::message_stream))
        .route("/:id/read", patch(message_handlers::mark_message_read))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // WebSocket route
    let ws_routes = Router::new()
        .route("/ws", get(crate::websocket::ws_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api_routes = Router::new()
        .nest("/conversas", conversa_routes)
        .nest("/mensagens", mensagem_routes)
        .merge(ws_routes);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(state)
}
