pub mod api;
pub mod core;

use log::LevelFilter;

/// 初始化日志；`RUST_LOG` 优先于命令行级别
pub fn init_logging(level: LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_millis()
        .try_init();
}
