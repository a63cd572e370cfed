pub mod decorate_mr_request;
pub mod decorate_mr_response;
pub mod decorate_mr_route;
