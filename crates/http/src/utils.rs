/// Returns early with `$error` unless `$predicate` holds.
///
/// ```ignore
/// ensure!(self.header_count <= limits.max_headers, ParseError::TooManyHeaders { max_num: limits.max_headers });
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
