use super::error::*;
use super::handler;
use crate::application_port::RequestAuthenticator;
use crate::domain_model::Principal;
use crate::server::Server;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, reject};

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let login = warp::post()
        .and(warp::path("login"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with(server.principal_directory.clone()))
        .and(with(server.credential_hasher.clone()))
        .and(with(server.rotation_service.clone()))
        .and(with(server.event_publisher.clone()))
        .and_then(handler::login);

    let refresh = warp::post()
        .and(warp::path("refresh"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with(server.rotation_service.clone()))
        .and(with(server.event_publisher.clone()))
        .and_then(handler::refresh);

    let logout = warp::post()
        .and(warp::path("logout"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with(server.rotation_service.clone()))
        .and(with(server.event_publisher.clone()))
        .and_then(handler::logout);

    let me = warp::get()
        .and(warp::path("me"))
        .and(warp::path::end())
        .and(with_authentication(server.request_authenticator.clone()))
        .and_then(handler::me);

    login.or(refresh).or(logout).or(me)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

/// Protected-route filter: a missing header is the same uniform 401 as an
/// invalid one.
fn with_authentication(
    authenticator: Arc<dyn RequestAuthenticator>,
) -> impl Filter<Extract = (Principal,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(
        move |header: Option<String>| {
            let authenticator = authenticator.clone();
            async move {
                let header =
                    header.ok_or_else(|| reject::custom(ApiErrorCode::InvalidToken))?;
                authenticator
                    .authenticate(&header)
                    .await
                    .map_err(ApiErrorCode::from)
                    .map_err(reject::custom)
            }
        },
    )
}
