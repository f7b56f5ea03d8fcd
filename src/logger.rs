// 日志初始化
//
// 使用 env_logger 输出到 stderr，可通过 RUST_LOG 覆盖默认级别

use once_cell::sync::OnceCell;
use std::io::Write;

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

// 初始化日志（重复调用无副作用）
pub fn init_logger() {
    LOGGER_INIT.get_or_init(|| {
        let default_level = if cfg!(debug_assertions) {
            "debug"
        } else {
            "info"
        };

        let result = env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(default_level),
        )
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init();

        // 宿主可能已安装自己的 logger
        if let Err(e) = result {
            eprintln!("[Logger] 初始化失败：{}", e);
        }
    });
}
