//! Common plumbing for the store bot, because some things
//! are just boilerplate and are nicer to keep out of the bot itself.

use std::future::Future;

pub mod useful_methods;

/// Initialize logging and start the `closure` in an async runtime.
///
/// Logging is enabled with the `default_filter` unless overridden
/// by environment variable `RUST_LOG`. This uses the crate
/// [pretty_env_logger][] internally, see its documentation for more details.
///
/// [pretty_env_logger]: https://docs.rs/pretty_env_logger
pub fn start_everything(default_filter: &str, closure: impl Future<Output = ()>) {
    let log_filter = std::env::var_os("RUST_LOG")
        .and_then(|x| x.into_string().ok())
        .unwrap_or_else(|| default_filter.to_string());

    // journald stamps lines on its own.
    let running_as_systemd_service = std::env::var_os("JOURNAL_STREAM").is_some();

    let mut builder = match running_as_systemd_service {
        true => pretty_env_logger::formatted_builder(),
        false => pretty_env_logger::formatted_timed_builder(),
    };

    builder.parse_filters(&log_filter);

    if builder.try_init().is_err() {
        log::error!("Tried to init logger twice!");
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("Failed to build the async runtime: {e}");
            return;
        }
    };

    runtime.block_on(closure);
}
