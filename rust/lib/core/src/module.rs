use axum::Router;

/// A service module that contributes HTTP routes.
///
/// The binary entry point collects every module and nests its routes
/// under `/{name}`.
pub trait Module: Send + Sync {
    /// Module name, used for logging and the route prefix.
    fn name(&self) -> &str;

    /// Return the module's routes, to be nested under `/{name}`.
    fn routes(&self) -> Router;
}
