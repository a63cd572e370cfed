pub mod decorate_mr;
