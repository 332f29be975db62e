use crate::{error::Error, service::PollService, store::Store};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::{
    body::{Body, Bytes},
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Method, Request, Response, StatusCode,
};
use model::Id;
use serde::{de::DeserializeOwned, Serialize};

/// Largest request body that we are willing to buffer.
const MAX_BODY_SIZE: usize = 4096;

pub type ResponseBody = Full<Bytes>;

/// Reasons for an unsuccessful response.
pub enum Rejection {
    /// Malformed request. Responds with an empty body.
    Status(StatusCode),
    /// Failed service call. Responds with the error message.
    Service(Error),
}

impl From<StatusCode> for Rejection {
    fn from(status: StatusCode) -> Self {
        Self::Status(status)
    }
}

impl From<Error> for Rejection {
    fn from(err: Error) -> Self {
        Self::Service(err)
    }
}

impl Rejection {
    fn into_response(self) -> Response<ResponseBody> {
        let (status, body) = match self {
            Self::Status(status) => (status, Full::default()),
            Self::Service(err) => (err.status(), Full::new(Bytes::from(err.to_string()))),
        };
        let mut res = Response::new(body);
        *res.status_mut() = status;
        res
    }
}

fn json<T: Serialize>(status: StatusCode, value: &T) -> Result<Response<ResponseBody>, Rejection> {
    let bytes = serde_json::to_vec(value).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let mut res = Response::new(Full::new(Bytes::from(bytes)));
    *res.status_mut() = status;
    assert!(res.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/json")).is_none());
    Ok(res)
}

async fn read_json<B, T>(body: B) -> Result<T, Rejection>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    T: DeserializeOwned,
{
    let bytes = Limited::new(body, MAX_BODY_SIZE)
        .collect()
        .await
        .map_err(|err| {
            if err.is::<LengthLimitError>() {
                StatusCode::PAYLOAD_TOO_LARGE
            } else {
                StatusCode::BAD_REQUEST
            }
        })?
        .to_bytes();
    Ok(serde_json::from_slice(&bytes).map_err(|_| StatusCode::BAD_REQUEST)?)
}

/// Extracts the voter identity. Authentication happens upstream, which forwards the
/// resolved user ID in the `X-User-Id` header.
fn extract_user(headers: &HeaderMap) -> Result<Id, StatusCode> {
    headers
        .get("X-User-Id")
        .ok_or(StatusCode::UNAUTHORIZED)?
        .to_str()
        .map_err(|_| StatusCode::UNAUTHORIZED)?
        .parse()
        .map_err(|_| StatusCode::UNAUTHORIZED)
}

pub async fn try_respond<S, B>(service: &PollService<S>, req: Request<B>) -> Result<Response<ResponseBody>, Rejection>
where
    S: Store,
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let (parts, body) = req.into_parts();
    log::debug!("{} {}", parts.method, parts.uri);

    let mut segments = parts.uri.path().split('/').filter(|segment| !segment.is_empty());
    let route = (segments.next(), segments.next(), segments.next(), segments.next());

    // Resources are addressed as `/polls`, `/polls/{id}`, and `/polls/{id}/votes`.
    let (id, votes) = match route {
        (Some("polls"), None, ..) => {
            return match parts.method {
                Method::GET => json(StatusCode::OK, &service.list_polls().await?),
                Method::POST => {
                    let req = read_json(body).await?;
                    json(StatusCode::CREATED, &service.create_poll(&req).await?)
                }
                _ => Err(StatusCode::METHOD_NOT_ALLOWED.into()),
            };
        }
        (Some("polls"), Some(id), None, _) => (id, false),
        (Some("polls"), Some(id), Some("votes"), None) => (id, true),
        _ => return Err(StatusCode::NOT_FOUND.into()),
    };

    let id: Id = id.parse().map_err(|_| StatusCode::NOT_FOUND)?;
    if votes {
        if parts.method != Method::POST {
            return Err(StatusCode::METHOD_NOT_ALLOWED.into());
        }
        let user = extract_user(&parts.headers)?;
        let vote = read_json(body).await?;
        return json(StatusCode::OK, &service.cast_vote(id, &vote, user).await?);
    }

    match parts.method {
        Method::GET => json(StatusCode::OK, &service.get_poll(id).await?),
        Method::PUT => {
            let req = read_json(body).await?;
            json(StatusCode::OK, &service.update_poll(id, &req).await?)
        }
        Method::DELETE => {
            service.delete_poll(id).await?;
            let mut res = Response::new(Full::default());
            *res.status_mut() = StatusCode::NO_CONTENT;
            Ok(res)
        }
        _ => Err(StatusCode::METHOD_NOT_ALLOWED.into()),
    }
}

/// Dispatches the request to the service. Never fails: errors become error responses.
pub async fn respond<S, B>(service: &PollService<S>, req: Request<B>) -> Response<ResponseBody>
where
    S: Store,
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    try_respond(service, req).await.unwrap_or_else(Rejection::into_response)
}
