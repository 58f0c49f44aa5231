//! API handlers for the bus-pass REST endpoints

pub mod analytics;
pub mod auth;
pub mod bookings;
pub mod buses;
pub mod health;
pub mod openapi;
pub mod payments;
pub mod rounds;
pub mod route_stops;
pub mod settings;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use axum_extra::extract::CookieJar;
use serde::Serialize;

use crate::{error::AppError, models::admin::AdminClaims, AppState};

/// Cookie carrying the admin JWT
pub const ADMIN_COOKIE: &str = "admin_token";

/// `{success: true, data}` envelope
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Extractor for an authenticated admin (bearer token or `admin_token` cookie)
pub struct AuthenticatedAdmin(pub AdminClaims);

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedAdmin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .or_else(|| {
                CookieJar::from_headers(&parts.headers)
                    .get(ADMIN_COOKIE)
                    .map(|cookie| cookie.value().to_string())
            })
            .ok_or_else(|| AppError::Authentication("Missing authentication token".to_string()))?;

        let claims = state.services.auth.validate(&token).await?;
        Ok(AuthenticatedAdmin(claims))
    }
}

/// Client IP used as the rate-limit key
#[derive(Debug, Clone, Copy)]
pub struct ClientIp(pub IpAddr);

#[async_trait]
impl FromRequestParts<AppState> for ClientIp {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        Ok(Self(client_ip(
            &parts.headers,
            peer,
            &state.config.server.trusted_proxies,
        )))
    }
}

/// Resolve the client address for a request arriving from `peer`.
///
/// Forwarding headers are only honoured when the peer is a trusted proxy.
/// `X-Forwarded-For` is walked from the right, skipping trusted hops, so a
/// client cannot pick its own address by prepending entries.
fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>, trusted: &[IpAddr]) -> IpAddr {
    let Some(peer) = peer else {
        return IpAddr::V4(Ipv4Addr::LOCALHOST);
    };
    if !trusted.contains(&peer) {
        return peer;
    }

    let forwarded = headers
        .get_all("X-Forwarded-For")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|ip| ip.trim().parse::<IpAddr>().ok())
        .collect::<Vec<_>>();
    if let Some(ip) = forwarded.iter().rev().find(|ip| !trusted.contains(ip)) {
        return *ip;
    }

    headers
        .get("X-Real-IP")
        .and_then(|v| v.to_str().ok())
        .and_then(|ip| ip.trim().parse::<IpAddr>().ok())
        .unwrap_or(peer)
}
