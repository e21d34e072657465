use std::fmt::Display;

use http::header::{InvalidHeaderName, InvalidHeaderValue};
use tokio::io;

pub fn error<E: Into<CustomError>>(data: E) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, data.into())
}

/// Malformed request on the wire.
#[derive(Debug)]
pub enum CustomError {
    RequestStatusLine(RequestStatusLine),
    Headers(Headers),
    Body(Body),
}

impl Display for CustomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for CustomError {}

#[derive(Debug)]
pub enum RequestStatusLine {
    MissingStatusLine,
    MissingMethod,
    MissingPath,
    MissingVersion,
    InvalidMethod,
}

impl From<RequestStatusLine> for CustomError {
    fn from(value: RequestStatusLine) -> Self {
        CustomError::RequestStatusLine(value)
    }
}

#[derive(Debug)]
pub enum Headers {
    InvalidName(InvalidHeaderName),
    InvalidValue(InvalidHeaderValue),
    UnexpectedEof,
}

impl From<Headers> for CustomError {
    fn from(value: Headers) -> Self {
        CustomError::Headers(value)
    }
}

#[derive(Debug)]
pub enum Body {
    TooLarge { length: usize, limit: usize },
    InvalidContentLength,
}

impl From<Body> for CustomError {
    fn from(value: Body) -> Self {
        CustomError::Body(value)
    }
}
