use serde::Serialize;

#[derive(Serialize)]
pub struct Response {
    pub success: bool,
    pub msg: String
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String
}

impl Response {
    pub fn ok(msg: &str) -> Response {
        Response { success: true, msg: msg.to_string() }
    }
}

impl ErrorResponse {
    pub fn err(error: &str) -> ErrorResponse {
        ErrorResponse { success: false, error: error.to_string() }
    }
}

macro_rules! login_fail {
    () => {
        return Ok(HttpResponse::Unauthorized().json(ErrorResponse::err("Unauthorized"))) }
}

macro_rules! forbidden {
    ($msg: expr) => {
        return Ok(HttpResponse::Forbidden().json(ErrorResponse::err($msg))) }
}

macro_rules! bad_request {
    ($msg: expr) => {
        return Ok(HttpResponse::BadRequest().json(ErrorResponse::err($msg))) }
}

macro_rules! not_found {
    ($msg: expr) => {
        return Ok(HttpResponse::NotFound().json(ErrorResponse::err($msg))) }
}

macro_rules! server_error {
    ($msg: expr) => {
        return Ok(HttpResponse::InternalServerError().json(ErrorResponse::err($msg))) }
}

pub(crate) use login_fail;
pub(crate) use forbidden;
pub(crate) use bad_request;
pub(crate) use not_found;
pub(crate) use server_error;
