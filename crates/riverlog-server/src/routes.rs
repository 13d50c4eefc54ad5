use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse};

use riverlog_api::middleware::Credential;
use riverlog_api::schema::RiverlogSchema;

/// `POST /graphql`. The bearer token rides along as request data and is
/// only checked by resolvers that need a caller.
pub async fn graphql(
    State(schema): State<RiverlogSchema>,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let req = req.into_inner().data(Credential::from_headers(&headers));
    schema.execute(req).await.into()
}

/// `GET /graphql`
pub async fn graphiql() -> impl IntoResponse {
    Html(
        GraphiQLSource::build()
            .endpoint("/graphql")
            .subscription_endpoint("/subscriptions")
            .finish(),
    )
}

pub async fn health() -> &'static str {
    "ok"
}
