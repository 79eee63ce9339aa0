//! Built-in migrations, one module per outdated plugin (or family of plugins).

pub mod aggregators_minmax;
pub mod inputs_httpjson;
pub mod inputs_io;
pub mod inputs_socket_listeners;
pub mod outputs_influxdb;
pub mod outputs_wavefront;

use crate::rules::Registry;

/// Registers every built-in migration module
pub fn register_builtin(registry: &mut Registry) {
    inputs_httpjson::register(registry);
    inputs_io::register(registry);
    inputs_socket_listeners::register(registry);
    outputs_influxdb::register(registry);
    outputs_wavefront::register(registry);
    aggregators_minmax::register(registry);
}
