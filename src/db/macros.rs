//! Dispatch macro for the dialect-specific connection variants.

/// Generate match arms over `SqlxBackend` variants.
///
/// # Example
///
/// ```ignore
/// impl_backend_dispatch!(self, {
///     MySql(conn) => mysql::ping(conn).await,
///     SQLite(conn) => sqlite::ping(conn).await,
/// });
/// ```
#[macro_export]
macro_rules! impl_backend_dispatch {
    ($backend:expr, { $($variant:ident($c:ident) => $body:expr),+ $(,)? }) => {
        match $backend {
            $(
                $crate::db::backend::SqlxBackend::$variant($c) => $body,
            )+
        }
    };
}

pub use impl_backend_dispatch;
