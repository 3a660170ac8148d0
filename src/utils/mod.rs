pub mod api_response;
pub mod json_body;
pub mod logging;
pub mod notification;
