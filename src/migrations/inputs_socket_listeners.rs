use crate::document::{Block, Category};
use crate::rules::helpers::{replace, set_option, to_integer};
use crate::rules::{Decline, MigrationContext, MigrationOutcome, Registry, Rule, SchemaVersion};
use toml::{Table, Value};

const SINCE: SchemaVersion = SchemaVersion::new(1, 3, 0);

pub fn register(registry: &mut Registry) {
    registry.register(
        Category::Input,
        "tcp_listener",
        Rule::new("socket_listener", migrate_tcp_listener).since(SINCE),
    );
    registry.register(
        Category::Input,
        "udp_listener",
        Rule::new("socket_listener", migrate_udp_listener).since(SINCE),
    );
}

fn migrate_tcp_listener(
    block: &Block,
    _ctx: &MigrationContext<'_>,
) -> Result<MigrationOutcome, Decline> {
    to_socket_listener(block, "tcp")
}

fn migrate_udp_listener(
    block: &Block,
    _ctx: &MigrationContext<'_>,
) -> Result<MigrationOutcome, Decline> {
    to_socket_listener(block, "udp")
}

fn to_socket_listener(block: &Block, scheme: &str) -> Result<MigrationOutcome, Decline> {
    let mut options = Table::new();

    for (key, value) in block.options() {
        match key.as_str() {
            "service_address" => {
                let address = value.as_str().ok_or_else(|| {
                    Decline::new(format!("service_address: {} is not a string", value))
                })?;
                set_option(
                    &mut options,
                    "service_address",
                    Value::String(with_scheme(address, scheme)?),
                )?;
            }
            "allowed_pending_messages" => {
                return Err(Decline::new(
                    "allowed_pending_messages has no counterpart in socket_listener",
                ));
            }
            "max_tcp_connections" if scheme == "tcp" => {
                let n = to_integer(key, value)?;
                set_option(&mut options, "max_connections", Value::Integer(n))?;
            }
            "udp_buffer_size" if scheme == "udp" => {
                let n = to_integer(key, value)?;
                set_option(&mut options, "read_buffer_size", Value::Integer(n))?;
            }
            // ignored by the udp listener long before it was replaced
            "udp_packet_size" if scheme == "udp" => {}
            _ => set_option(&mut options, key, value.clone())?,
        }
    }

    if !options.contains_key("service_address") {
        return Err(Decline::new("no service_address configured"));
    }

    Ok(replace(Block::new(Category::Input, "socket_listener", options)))
}

fn with_scheme(address: &str, scheme: &str) -> Result<String, Decline> {
    match address.split_once("://") {
        None => Ok(format!("{}://{}", scheme, address)),
        Some((existing, _)) if existing == scheme => Ok(address.to_string()),
        Some(_) => Err(Decline::new(format!(
            "service_address {:?} is not a {} address",
            address, scheme
        ))),
    }
}
