use std::fmt::{Debug, Display};
use std::io::Cursor;

use rocket::http::{Header, Status};
use rocket::response::Responder;
use rocket::{Request, Response};
use tracing::error;

pub(crate) struct HttpError<E> {
    error: E,
    status: Status,
}

impl<E> HttpError<E> {
    pub(crate) fn new(error: E) -> Self {
        HttpError {
            error,
            status: Status::InternalServerError,
        }
    }
}

impl<E> From<E> for HttpError<E>
where
    E: Display + Debug,
{
    fn from(error: E) -> Self {
        HttpError::new(error)
    }
}

impl<'r, 'o: 'r, E> Responder<'r, 'o> for HttpError<E>
where
    E: Display + Debug,
{
    fn respond_to(self, request: &'r Request) -> rocket::response::Result<'o> {
        let response_body = format!("{}: {}", self.status, self.error);
        error!(
            status = %self.status,
            uri = %request.uri(),
            error = ?self.error,
            "Responding with error"
        );
        Response::build()
            .status(self.status)
            .header(Header::new("Content-Type", "text/plain"))
            .sized_body(response_body.len(), Cursor::new(response_body))
            .ok()
    }
}

pub(crate) type JsonResult<T, E> = Result<rocket::serde::json::Json<T>, HttpError<E>>;

pub(crate) type AcceptedResult<E> = Result<rocket::response::status::Accepted<()>, HttpError<E>>;
