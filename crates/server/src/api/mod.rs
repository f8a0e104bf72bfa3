pub mod admin;
pub mod live;
pub mod routes;
pub mod vehicles;

use axum::http::StatusCode;
use buswatch::Error;

pub(crate) fn error_status(err: &Error) -> StatusCode {
    match err {
        Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
