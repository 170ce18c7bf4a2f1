//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> &'static str {
    r##"# hsi-stream configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[server]
# host = "0.0.0.0"
# port = 8000
# path = "/ws"

[producer]
# mode = "timer"          # timer (JSON vector frames) or serial (bare "0"/"1" labels)
# interval_ms = 100       # 10-10000, timer mode only
# vector = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
# text = "Message Sent"

[source]
# address = "/dev/ttyUSB0"   # device path or tcp://host:port
# baud_rate = 9600          # reported only; set the line speed with stty
# read_timeout_ms = 1000     # 10-60000
# poll_delay_ms = 10         # 1-1000
# threshold = 100            # readings above this emit "1"
# default_label = "0"        # emitted for unparseable records
# max_line_length = 256

[delivery]
# queue_capacity = 32        # 1-4096 frames per client
# overflow = "drop_oldest"   # drop_oldest, drop_newest, disconnect
# send_timeout_ms = 2000     # 10-60000

[logging]
# filter = "hsi_stream=info"
"##
}
