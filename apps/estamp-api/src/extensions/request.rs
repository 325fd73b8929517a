//! Request helper extensions.

use salvo::prelude::Request;

use crate::error::{ApiError, ApiResult};

pub(crate) trait RequestExt {
    /// Named path segment, or a validation error when absent.
    fn path_param(&self, key: &str) -> ApiResult<String>;
}

impl RequestExt for Request {
    fn path_param(&self, key: &str) -> ApiResult<String> {
        self.param::<String>(key)
            .ok_or_else(|| ApiError::validation(format!("missing path parameter \"{key}\"")))
    }
}
